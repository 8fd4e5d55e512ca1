use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::FixedOffset;

use super::{
    config_model::{
        AttendanceSettings, AuthSecret, BackendServer, ClubSettings, Database, DotEnvyConfig,
        Stripe, SubscriptionSettings,
    },
    stage::Stage,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections: optional("DATABASE_MAX_CONNECTIONS", 10)?,
    };

    let auth = AuthSecret {
        jwt_secret: required("JWT_SECRET")?,
        access_ttl_secs: optional("JWT_ACCESS_TTL_SECS", 900)?,
        refresh_ttl_secs: optional("JWT_REFRESH_TTL_SECS", 604_800)?,
    };

    let stripe = Stripe {
        secret_key: required("STRIPE_SECRET_KEY")?,
        webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
        webhook_tolerance_secs: optional("STRIPE_WEBHOOK_TOLERANCE_SECS", 300)?,
    };

    let club = ClubSettings {
        default_currency: std::env::var("DEFAULT_CURRENCY")
            .unwrap_or_else(|_| "kzt".to_string())
            .trim()
            .to_lowercase(),
        utc_offset: parse_utc_offset(
            &std::env::var("CLUB_UTC_OFFSET").unwrap_or_else(|_| "+00:00".to_string()),
        )
        .context("CLUB_UTC_OFFSET is invalid")?,
    };

    let subscriptions = SubscriptionSettings {
        activation_days: optional("SUBSCRIPTION_ACTIVATION_DAYS", 90)?,
        expiry_sweep_secs: optional("SUBSCRIPTION_EXPIRY_SWEEP_SECS", 3600)?,
    };

    let attendance = AttendanceSettings {
        restore_credit_on_delete: optional("ATTENDANCE_RESTORE_CREDIT_ON_DELETE", false)?,
    };

    Ok(DotEnvyConfig {
        stage: get_stage(),
        backend_server,
        database,
        auth,
        stripe,
        club,
        subscriptions,
        attendance,
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = std::env::var("STAGE").unwrap_or("".to_string());
    Stage::try_from(&stage_str).unwrap_or_default()
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{} is invalid", key))
}

fn optional<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} is invalid", key)),
        _ => Ok(default),
    }
}

/// Accepts `+HH:MM`, `-HH:MM`, `Z` and `UTC`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).context("zero offset");
    }

    let (sign, rest) = match raw.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(anyhow!("offset must start with + or -: {}", raw)),
    };
    let (hours, minutes) = rest
        .split_once(':')
        .ok_or_else(|| anyhow!("offset must look like +HH:MM: {}", raw))?;
    let hours: i32 = hours.parse().context("offset hours")?;
    let minutes: i32 = minutes.parse().context("offset minutes")?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(anyhow!("offset out of range: {}", raw));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| anyhow!("offset out of range: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_club_offsets() {
        assert_eq!(
            parse_utc_offset("+05:00").unwrap(),
            FixedOffset::east_opt(5 * 3600).unwrap()
        );
        assert_eq!(
            parse_utc_offset("-03:30").unwrap(),
            FixedOffset::west_opt(3 * 3600 + 30 * 60).unwrap()
        );
        assert_eq!(parse_utc_offset("UTC").unwrap(), FixedOffset::east_opt(0).unwrap());
    }

    #[test]
    fn rejects_malformed_offsets() {
        assert!(parse_utc_offset("05:00").is_err());
        assert!(parse_utc_offset("+5").is_err());
        assert!(parse_utc_offset("+15:00").is_err());
    }
}
