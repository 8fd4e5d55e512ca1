pub mod attendance_statuses;
pub mod payment_methods;
pub mod payment_statuses;
pub mod subscription_statuses;
