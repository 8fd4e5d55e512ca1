use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::{groups, subscriptions}},
};
use domain::{
    entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
    errors::{CoreError, CoreResult},
    repositories::subscriptions::SubscriptionRepository,
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn find_by_id(&self, subscription_id: Uuid) -> CoreResult<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        subscriptions::table
            .find(subscription_id)
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?
            .ok_or(CoreError::NotFound("subscription"))
    }

    async fn create(&self, subscription: InsertSubscriptionEntity) -> CoreResult<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = insert_into(subscriptions::table)
            .values(&subscription)
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)?;

        Ok(created)
    }

    async fn list_by_student(&self, student_id: Uuid) -> CoreResult<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = subscriptions::table
            .filter(subscriptions::student_id.eq(student_id))
            .order(subscriptions::created_at.desc())
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(rows)
    }

    async fn list_by_group(
        &self,
        group_id: Uuid,
        status: Option<SubscriptionStatus>,
    ) -> CoreResult<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = subscriptions::table
            .filter(subscriptions::group_id.eq(group_id))
            .select(SubscriptionEntity::as_select())
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(subscriptions::status.eq(status.as_str()));
        }

        let rows = query
            .order(subscriptions::created_at.desc())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(rows)
    }

    async fn list_by_club(
        &self,
        club_id: Uuid,
        status: Option<SubscriptionStatus>,
    ) -> CoreResult<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let club_groups = groups::table
            .filter(groups::club_id.eq(club_id))
            .select(groups::id);
        let mut query = subscriptions::table
            .filter(subscriptions::group_id.eq_any(club_groups))
            .select(SubscriptionEntity::as_select())
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(subscriptions::status.eq(status.as_str()));
        }

        let rows = query
            .order(subscriptions::created_at.desc())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(rows)
    }

    async fn list_lapsed_active(&self, now: DateTime<Utc>) -> CoreResult<Vec<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let ids = subscriptions::table
            .filter(subscriptions::status.eq(SubscriptionStatus::Active.as_str()))
            .filter(subscriptions::expires_at.lt(now))
            .order(subscriptions::expires_at.asc())
            .select(subscriptions::id)
            .load::<Uuid>(&mut conn)?;

        Ok(ids)
    }
}
