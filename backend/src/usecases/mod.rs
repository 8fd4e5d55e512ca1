pub mod access;
pub mod attendance;
pub mod auth;
pub mod clubs;
pub mod payments;
pub mod schedule;
pub mod sessions;
pub mod students;
pub mod subscription_ledger;
pub mod subscriptions;

#[cfg(test)]
pub(crate) mod test_support;
