pub mod attendances;
pub mod clubs;
pub mod groups;
pub mod payments;
pub mod sessions;
pub mod students;
pub mod subscriptions;
pub mod users;
