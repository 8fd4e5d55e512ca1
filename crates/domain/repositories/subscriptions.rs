use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
    errors::CoreResult,
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

/// Reads and inserts. Status and credit changes go through the ledger inside a unit of work.
#[automock]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn find_by_id(&self, subscription_id: Uuid) -> CoreResult<SubscriptionEntity>;

    async fn create(&self, subscription: InsertSubscriptionEntity) -> CoreResult<SubscriptionEntity>;

    /// Newest first.
    async fn list_by_student(&self, student_id: Uuid) -> CoreResult<Vec<SubscriptionEntity>>;
    async fn list_by_group(
        &self,
        group_id: Uuid,
        status: Option<SubscriptionStatus>,
    ) -> CoreResult<Vec<SubscriptionEntity>>;
    /// Subscriptions of every group in the club.
    async fn list_by_club(
        &self,
        club_id: Uuid,
        status: Option<SubscriptionStatus>,
    ) -> CoreResult<Vec<SubscriptionEntity>>;
    /// Ids of active subscriptions whose validity window closed before `now`.
    async fn list_lapsed_active(&self, now: DateTime<Utc>) -> CoreResult<Vec<Uuid>>;
}
