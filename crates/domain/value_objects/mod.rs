pub mod attendances;
pub mod clubs;
pub mod enums;
pub mod payments;
pub mod schedules;
pub mod students;
pub mod subscriptions;
