use chrono::FixedOffset;

use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub stage: Stage,
    pub backend_server: BackendServer,
    pub database: Database,
    pub auth: AuthSecret,
    pub stripe: Stripe,
    pub club: ClubSettings,
    pub subscriptions: SubscriptionSettings,
    pub attendance: AttendanceSettings,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// MiB.
    pub body_limit: u64,
    /// Seconds.
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AuthSecret {
    pub jwt_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub secret_key: String,
    pub webhook_secret: String,
    pub webhook_tolerance_secs: i64,
}

#[derive(Debug, Clone)]
pub struct ClubSettings {
    pub default_currency: String,
    /// Wall-clock offset used to expand recurring schedules.
    pub utc_offset: FixedOffset,
}

#[derive(Debug, Clone)]
pub struct SubscriptionSettings {
    pub activation_days: i64,
    /// 0 disables the periodic expiry sweep.
    pub expiry_sweep_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AttendanceSettings {
    pub restore_credit_on_delete: bool,
}
