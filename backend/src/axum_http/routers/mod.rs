pub mod attendance;
pub mod auth;
pub mod clubs;
pub mod groups;
pub mod payments;
pub mod schedule;
pub mod sessions;
pub mod students;
pub mod subscriptions;
pub mod webhooks;
