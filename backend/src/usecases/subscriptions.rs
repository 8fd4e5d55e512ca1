use std::sync::Arc;

use chrono::{DateTime, Utc};
use crates::domain::{
    entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
    errors::{CoreError, CoreResult},
    repositories::{
        clubs::ClubRepository, groups::GroupRepository, students::StudentRepository,
        subscriptions::SubscriptionRepository, unit_of_work::UnitOfWork,
    },
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus,
        subscriptions::{InsertSubscriptionModel, SubscriptionListQuery, SubscriptionTerms},
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{access::GroupAccess, subscription_ledger::SubscriptionLedger};

pub struct SubscriptionUseCase<St, G, C, Sub, U>
where
    St: StudentRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    Sub: SubscriptionRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    access: GroupAccess<G, C>,
    student_repo: Arc<St>,
    subscription_repo: Arc<Sub>,
    unit_of_work: Arc<U>,
}

impl<St, G, C, Sub, U> SubscriptionUseCase<St, G, C, Sub, U>
where
    St: StudentRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    Sub: SubscriptionRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    pub fn new(
        access: GroupAccess<G, C>,
        student_repo: Arc<St>,
        subscription_repo: Arc<Sub>,
        unit_of_work: Arc<U>,
    ) -> Self {
        Self {
            access,
            student_repo,
            subscription_repo,
            unit_of_work,
        }
    }

    /// Subscription sold at the desk: starts active with full credit.
    pub async fn create(
        &self,
        actor_id: Uuid,
        model: InsertSubscriptionModel,
    ) -> CoreResult<SubscriptionEntity> {
        SubscriptionTerms {
            total_sessions: model.total_sessions,
            price_minor: model.price_minor,
        }
        .validate()
        .map_err(CoreError::BadRequest)?;
        if let (Some(starts_at), Some(expires_at)) = (model.starts_at, model.expires_at) {
            if expires_at < starts_at {
                return Err(CoreError::BadRequest(
                    "expires_at must not be before starts_at".to_string(),
                ));
            }
        }

        let scope = self.access.ensure_staff(actor_id, model.group_id).await?;
        let student = self.student_repo.find_by_id(model.student_id).await?;
        if student.club_id != scope.club.id {
            warn!(student_id = %student.id, club_id = %scope.club.id, "subscriptions: student belongs to another club");
            return Err(CoreError::NotFound("student"));
        }

        let created = self
            .subscription_repo
            .create(InsertSubscriptionEntity {
                student_id: student.id,
                group_id: scope.group.id,
                total_sessions: model.total_sessions,
                remaining_sessions: model.total_sessions,
                price_minor: model.price_minor,
                starts_at: Some(model.starts_at.unwrap_or_else(Utc::now)),
                expires_at: model.expires_at,
                status: SubscriptionStatus::Active.as_str().to_string(),
            })
            .await
            .map_err(|err| {
                error!(student_id = %student.id, db_error = ?err, "subscriptions: failed to create subscription");
                err
            })?;

        info!(subscription_id = %created.id, %actor_id, "subscriptions: subscription created");
        Ok(created)
    }

    pub async fn get(&self, actor_id: Uuid, subscription_id: Uuid) -> CoreResult<SubscriptionEntity> {
        let subscription = self.subscription_repo.find_by_id(subscription_id).await?;
        self.access
            .ensure_staff(actor_id, subscription.group_id)
            .await?;
        Ok(subscription)
    }

    pub async fn cancel(
        &self,
        actor_id: Uuid,
        subscription_id: Uuid,
    ) -> CoreResult<SubscriptionEntity> {
        let subscription = self.subscription_repo.find_by_id(subscription_id).await?;
        self.access
            .ensure_owner(actor_id, subscription.group_id)
            .await?;

        let cancelled = self
            .unit_of_work
            .transaction(|tx| SubscriptionLedger::new(tx).cancel(subscription_id))?;

        info!(%subscription_id, %actor_id, "subscriptions: subscription cancelled");
        Ok(cancelled)
    }

    pub async fn list_by_student(
        &self,
        actor_id: Uuid,
        student_id: Uuid,
    ) -> CoreResult<Vec<SubscriptionEntity>> {
        let student = self.student_repo.find_by_id(student_id).await?;
        self.access
            .ensure_club_staff(actor_id, student.club_id)
            .await?;
        self.subscription_repo.list_by_student(student.id).await
    }

    pub async fn list_by_group(
        &self,
        actor_id: Uuid,
        group_id: Uuid,
        query: SubscriptionListQuery,
    ) -> CoreResult<Vec<SubscriptionEntity>> {
        let status = query.status().map_err(CoreError::BadRequest)?;
        self.access.ensure_staff(actor_id, group_id).await?;
        self.subscription_repo.list_by_group(group_id, status).await
    }

    /// Club-wide listing is for the owner only.
    pub async fn list_by_club(
        &self,
        actor_id: Uuid,
        club_id: Uuid,
        query: SubscriptionListQuery,
    ) -> CoreResult<Vec<SubscriptionEntity>> {
        let status = query.status().map_err(CoreError::BadRequest)?;
        self.access.ensure_club_owner(actor_id, club_id).await?;
        self.subscription_repo.list_by_club(club_id, status).await
    }

    /// Moves active subscriptions whose window closed before `now` to `expired`.
    /// Returns how many were expired.
    pub async fn expire_lapsed(&self, now: DateTime<Utc>) -> CoreResult<usize> {
        let candidates = self.subscription_repo.list_lapsed_active(now).await?;
        let mut expired = 0;

        for subscription_id in candidates {
            let outcome = self.unit_of_work.transaction(|tx| {
                let current = tx.lock_subscription(subscription_id)?;
                let still_lapsed = current.status() == Some(SubscriptionStatus::Active)
                    && current.expires_at.is_some_and(|expires_at| expires_at < now);
                if !still_lapsed {
                    return Ok(false);
                }
                SubscriptionLedger::new(tx).expire(subscription_id)?;
                Ok(true)
            });

            match outcome {
                Ok(true) => expired += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(%subscription_id, error = ?err, "subscriptions: failed to expire subscription")
                }
            }
        }

        if expired > 0 {
            info!(expired, "subscriptions: lapsed subscriptions expired");
        }
        Ok(expired)
    }
}
