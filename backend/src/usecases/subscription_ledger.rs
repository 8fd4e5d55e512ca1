//! Credit accounting and lifecycle for subscriptions.
//!
//! The ledger borrows a store that is already inside a transaction. Every operation locks
//! the row it touches, so callers compose several ledger calls with other writes and
//! commit them together.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use crates::domain::{
    entities::subscriptions::SubscriptionEntity,
    errors::{CoreError, CoreResult},
    repositories::unit_of_work::LedgerStore,
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct SubscriptionLedger<'s, S>
where
    S: LedgerStore + ?Sized,
{
    store: &'s mut S,
}

impl<'s, S> SubscriptionLedger<'s, S>
where
    S: LedgerStore + ?Sized,
{
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Locks the subscription that pays for a session of `group_id` held at `at`.
    ///
    /// Among several candidates the earliest start wins, undated ones last, then the
    /// oldest.
    pub fn find_eligible(
        &mut self,
        student_id: Uuid,
        group_id: Uuid,
        at: DateTime<Utc>,
    ) -> CoreResult<SubscriptionEntity> {
        self.store
            .lock_eligible_subscription(student_id, group_id, at)?
            .ok_or_else(|| {
                debug!(%student_id, %group_id, %at, "ledger: no eligible subscription");
                CoreError::NotFound("eligible subscription")
            })
    }

    /// Takes one credit. Reaching zero moves the subscription to `used` in the same write.
    pub fn decrement(&mut self, subscription_id: Uuid) -> CoreResult<SubscriptionEntity> {
        let updated = self
            .store
            .decrement_remaining(subscription_id)?
            .ok_or_else(|| {
                warn!(%subscription_id, "ledger: decrement rejected, no credit left or not active");
                CoreError::Conflict("subscription has no remaining sessions".to_string())
            })?;

        if updated.status() == Some(SubscriptionStatus::Used) {
            info!(%subscription_id, "ledger: last session consumed, subscription used");
        } else {
            debug!(
                %subscription_id,
                remaining = updated.remaining_sessions,
                "ledger: session consumed"
            );
        }
        Ok(updated)
    }

    /// Pending to active. Already active is a no-op.
    ///
    /// The window keeps whatever the row already has unless new bounds are given; a
    /// missing start defaults to now.
    pub fn activate(
        &mut self,
        subscription_id: Uuid,
        starts_at: Option<DateTime<Utc>>,
        expires_at: Option<DateTime<Utc>>,
    ) -> CoreResult<SubscriptionEntity> {
        let current = self.store.lock_subscription(subscription_id)?;
        let status = known_status(&current)?;

        if status == SubscriptionStatus::Active {
            debug!(%subscription_id, "ledger: already active");
            return Ok(current);
        }
        ensure_transition(status, SubscriptionStatus::Active)?;

        let starts_at = starts_at.or(current.starts_at).unwrap_or_else(Utc::now);
        let expires_at = expires_at.or(current.expires_at);
        let activated = self
            .store
            .set_active_window(subscription_id, starts_at, expires_at)?;

        info!(%subscription_id, %starts_at, ?expires_at, "ledger: subscription activated");
        Ok(activated)
    }

    pub fn cancel(&mut self, subscription_id: Uuid) -> CoreResult<SubscriptionEntity> {
        self.transition(subscription_id, SubscriptionStatus::Cancelled)
    }

    pub fn expire(&mut self, subscription_id: Uuid) -> CoreResult<SubscriptionEntity> {
        self.transition(subscription_id, SubscriptionStatus::Expired)
    }

    /// Gives one credit back. `None` when the subscription is not active or already full;
    /// terminal subscriptions are never reopened.
    pub fn restore_credit(
        &mut self,
        subscription_id: Uuid,
    ) -> CoreResult<Option<SubscriptionEntity>> {
        let restored = self.store.increment_remaining(subscription_id)?;
        match &restored {
            Some(subscription) => info!(
                %subscription_id,
                remaining = subscription.remaining_sessions,
                "ledger: credit restored"
            ),
            None => info!(%subscription_id, "ledger: credit not restored"),
        }
        Ok(restored)
    }

    fn transition(
        &mut self,
        subscription_id: Uuid,
        next: SubscriptionStatus,
    ) -> CoreResult<SubscriptionEntity> {
        let current = self.store.lock_subscription(subscription_id)?;
        let status = known_status(&current)?;
        ensure_transition(status, next)?;

        let updated = self.store.set_status(subscription_id, next)?;
        info!(%subscription_id, from = %status, to = %next, "ledger: status changed");
        Ok(updated)
    }
}

fn known_status(subscription: &SubscriptionEntity) -> CoreResult<SubscriptionStatus> {
    subscription.status().ok_or_else(|| {
        CoreError::Internal(anyhow!(
            "subscription {} has unknown status {:?}",
            subscription.id,
            subscription.status
        ))
    })
}

fn ensure_transition(from: SubscriptionStatus, to: SubscriptionStatus) -> CoreResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.as_str(),
            to: to.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::test_support::{MemoryState, MemoryUnitOfWork, subscription};
    use chrono::Duration;
    use crates::domain::{errors::ErrorKind, repositories::unit_of_work::UnitOfWork};

    fn seeded(subscriptions: Vec<SubscriptionEntity>) -> MemoryUnitOfWork {
        let mut state = MemoryState::default();
        for subscription in subscriptions {
            state.subscriptions.insert(subscription.id, subscription);
        }
        MemoryUnitOfWork::with_state(state)
    }

    #[test]
    fn decrement_to_zero_marks_used() {
        let sub = subscription(Uuid::new_v4(), Uuid::new_v4(), SubscriptionStatus::Active, 1, 8);
        let uow = seeded(vec![sub.clone()]);

        let updated = uow
            .transaction(|tx| SubscriptionLedger::new(tx).decrement(sub.id))
            .unwrap();

        assert_eq!(updated.remaining_sessions, 0);
        assert_eq!(updated.status(), Some(SubscriptionStatus::Used));
    }

    #[test]
    fn decrement_without_credit_is_a_conflict() {
        let mut sub = subscription(Uuid::new_v4(), Uuid::new_v4(), SubscriptionStatus::Used, 0, 8);
        sub.remaining_sessions = 0;
        let uow = seeded(vec![sub.clone()]);

        let err = uow
            .transaction(|tx| SubscriptionLedger::new(tx).decrement(sub.id))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(uow.snapshot().subscriptions[&sub.id].remaining_sessions, 0);
    }

    #[test]
    fn eligible_prefers_the_earliest_start_and_skips_undated_last() {
        let student = Uuid::new_v4();
        let group = Uuid::new_v4();
        let now = Utc::now();

        let mut undated = subscription(student, group, SubscriptionStatus::Active, 4, 8);
        undated.starts_at = None;
        let mut later = subscription(student, group, SubscriptionStatus::Active, 4, 8);
        later.starts_at = Some(now - Duration::days(1));
        let mut earlier = subscription(student, group, SubscriptionStatus::Active, 4, 8);
        earlier.starts_at = Some(now - Duration::days(10));
        let mut lapsed = subscription(student, group, SubscriptionStatus::Active, 4, 8);
        lapsed.starts_at = Some(now - Duration::days(30));
        lapsed.expires_at = Some(now - Duration::days(20));

        let uow = seeded(vec![undated, later, earlier.clone(), lapsed]);
        let found = uow
            .transaction(|tx| SubscriptionLedger::new(tx).find_eligible(student, group, now))
            .unwrap();

        assert_eq!(found.id, earlier.id);
    }

    #[test]
    fn eligible_ignores_other_groups_and_pending() {
        let student = Uuid::new_v4();
        let group = Uuid::new_v4();
        let other_group = subscription(student, Uuid::new_v4(), SubscriptionStatus::Active, 4, 8);
        let pending = subscription(student, group, SubscriptionStatus::Pending, 8, 8);
        let uow = seeded(vec![other_group, pending]);

        let err = uow
            .transaction(|tx| SubscriptionLedger::new(tx).find_eligible(student, group, Utc::now()))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn activate_is_idempotent_and_keeps_existing_window() {
        let mut sub = subscription(Uuid::new_v4(), Uuid::new_v4(), SubscriptionStatus::Pending, 8, 8);
        let expires = Utc::now() + Duration::days(90);
        sub.starts_at = None;
        sub.expires_at = Some(expires);
        let uow = seeded(vec![sub.clone()]);

        let activated = uow
            .transaction(|tx| SubscriptionLedger::new(tx).activate(sub.id, None, None))
            .unwrap();
        assert_eq!(activated.status(), Some(SubscriptionStatus::Active));
        assert!(activated.starts_at.is_some());
        assert_eq!(activated.expires_at, Some(expires));

        let again = uow
            .transaction(|tx| {
                SubscriptionLedger::new(tx).activate(sub.id, None, Some(expires + Duration::days(1)))
            })
            .unwrap();
        assert_eq!(again, activated);
    }

    #[test]
    fn cancel_follows_the_lifecycle() {
        let pending = subscription(Uuid::new_v4(), Uuid::new_v4(), SubscriptionStatus::Pending, 8, 8);
        let used = subscription(Uuid::new_v4(), Uuid::new_v4(), SubscriptionStatus::Used, 0, 8);
        let uow = seeded(vec![pending.clone(), used.clone()]);

        let cancelled = uow
            .transaction(|tx| SubscriptionLedger::new(tx).cancel(pending.id))
            .unwrap();
        assert_eq!(cancelled.status(), Some(SubscriptionStatus::Cancelled));

        let err = uow
            .transaction(|tx| SubscriptionLedger::new(tx).cancel(pending.id))
            .unwrap_err();
        assert!(err.is(ErrorKind::InvalidTransition));

        let err = uow
            .transaction(|tx| SubscriptionLedger::new(tx).cancel(used.id))
            .unwrap_err();
        assert!(err.is(ErrorKind::InvalidTransition));
    }

    #[test]
    fn expire_only_applies_to_active() {
        let pending = subscription(Uuid::new_v4(), Uuid::new_v4(), SubscriptionStatus::Pending, 8, 8);
        let active = subscription(Uuid::new_v4(), Uuid::new_v4(), SubscriptionStatus::Active, 3, 8);
        let uow = seeded(vec![pending.clone(), active.clone()]);

        assert!(
            uow.transaction(|tx| SubscriptionLedger::new(tx).expire(pending.id))
                .is_err()
        );
        let expired = uow
            .transaction(|tx| SubscriptionLedger::new(tx).expire(active.id))
            .unwrap();
        assert_eq!(expired.status(), Some(SubscriptionStatus::Expired));
        assert_eq!(expired.remaining_sessions, 3);
    }

    #[test]
    fn restore_credit_never_exceeds_total_or_reopens() {
        let full = subscription(Uuid::new_v4(), Uuid::new_v4(), SubscriptionStatus::Active, 8, 8);
        let used = subscription(Uuid::new_v4(), Uuid::new_v4(), SubscriptionStatus::Used, 0, 8);
        let partial = subscription(Uuid::new_v4(), Uuid::new_v4(), SubscriptionStatus::Active, 5, 8);
        let uow = seeded(vec![full.clone(), used.clone(), partial.clone()]);

        let outcome = uow
            .transaction(|tx| {
                let mut ledger = SubscriptionLedger::new(tx);
                Ok((
                    ledger.restore_credit(full.id)?,
                    ledger.restore_credit(used.id)?,
                    ledger.restore_credit(partial.id)?,
                ))
            })
            .unwrap();

        assert!(outcome.0.is_none());
        assert!(outcome.1.is_none());
        assert_eq!(outcome.2.map(|s| s.remaining_sessions), Some(6));
    }
}
