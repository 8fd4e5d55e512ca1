use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::enums::subscription_statuses::SubscriptionStatus;

pub const MIN_TOTAL_SESSIONS: i32 = 1;
pub const MAX_TOTAL_SESSIONS: i32 = 100;

/// Owner-created subscription that skips the checkout flow.
#[derive(Debug, Clone, Deserialize)]
pub struct InsertSubscriptionModel {
    pub student_id: Uuid,
    pub group_id: Uuid,
    pub total_sessions: i32,
    pub price_minor: i64,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SubscriptionTerms {
    pub total_sessions: i32,
    pub price_minor: i64,
}

impl SubscriptionTerms {
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_TOTAL_SESSIONS..=MAX_TOTAL_SESSIONS).contains(&self.total_sessions) {
            return Err(format!(
                "total_sessions must be between {MIN_TOTAL_SESSIONS} and {MAX_TOTAL_SESSIONS}"
            ));
        }
        if self.price_minor < 0 {
            return Err("price must not be negative".to_string());
        }
        Ok(())
    }
}

/// `?status=` filter for subscription listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionListQuery {
    pub status: Option<String>,
}

impl SubscriptionListQuery {
    pub fn status(&self) -> Result<Option<SubscriptionStatus>, String> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => SubscriptionStatus::from_str(raw)
                .map(Some)
                .ok_or_else(|| format!("unknown subscription status {raw}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_session_counts() {
        let terms = SubscriptionTerms {
            total_sessions: 0,
            price_minor: 100,
        };
        assert!(terms.validate().is_err());

        let terms = SubscriptionTerms {
            total_sessions: 101,
            price_minor: 100,
        };
        assert!(terms.validate().is_err());
    }

    #[test]
    fn free_subscriptions_are_allowed() {
        let terms = SubscriptionTerms {
            total_sessions: 8,
            price_minor: 0,
        };
        assert!(terms.validate().is_ok());
    }

    #[test]
    fn list_query_parses_status_filter() {
        let query = SubscriptionListQuery {
            status: Some("active".to_string()),
        };
        assert_eq!(query.status(), Ok(Some(SubscriptionStatus::Active)));
        assert_eq!(SubscriptionListQuery::default().status(), Ok(None));

        let query = SubscriptionListQuery {
            status: Some("paused".to_string()),
        };
        assert!(query.status().is_err());
    }
}
