use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::subscription_statuses::SubscriptionStatus,
    infra::db::postgres::schema::subscriptions,
};

#[derive(Debug, Clone, PartialEq, Serialize, Identifiable, Selectable, Queryable, QueryableByName)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub student_id: Uuid,
    pub group_id: Uuid,
    pub total_sessions: i32,
    pub remaining_sessions: i32,
    pub price_minor: i64,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionEntity {
    /// Stored status. Rows written outside the ledger may carry values we do not know.
    pub fn status(&self) -> Option<SubscriptionStatus> {
        SubscriptionStatus::from_str(&self.status)
    }

    /// Whether this subscription can pay for a session held at `at`.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.status() == Some(SubscriptionStatus::Active)
            && self.remaining_sessions > 0
            && self.starts_at.is_none_or(|starts_at| starts_at <= at)
            && self.expires_at.is_none_or(|expires_at| expires_at >= at)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct InsertSubscriptionEntity {
    pub student_id: Uuid,
    pub group_id: Uuid,
    pub total_sessions: i32,
    pub remaining_sessions: i32,
    pub price_minor: i64,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: String,
}
