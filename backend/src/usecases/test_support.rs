//! In-memory unit of work and fixtures for use case tests.

use std::{collections::HashMap, sync::Mutex};

use chrono::{DateTime, Duration, Utc};
use crates::domain::{
    entities::{
        attendances::{AttendanceEntity, InsertAttendanceEntity},
        clubs::ClubEntity,
        groups::GroupEntity,
        payments::{InsertPaymentEntity, PaymentEntity},
        sessions::{InsertSessionEntity, SessionEntity},
        subscriptions::SubscriptionEntity,
    },
    errors::{CoreError, CoreResult},
    repositories::unit_of_work::{
        AttendanceStore, LedgerStore, PaymentStore, ScheduleStore, TxStore, UnitOfWork,
    },
    value_objects::{
        enums::{
            payment_methods::PaymentMethod, payment_statuses::PaymentStatus,
            subscription_statuses::SubscriptionStatus,
        },
        payments::ProviderMetadata,
    },
};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryState {
    pub subscriptions: HashMap<Uuid, SubscriptionEntity>,
    pub attendances: HashMap<Uuid, AttendanceEntity>,
    pub payments: HashMap<Uuid, PaymentEntity>,
    pub sessions: Vec<SessionEntity>,
}

/// Serialises transactions behind one mutex, works on a copy and publishes it on `Ok`.
#[derive(Default)]
pub(crate) struct MemoryUnitOfWork {
    state: Mutex<MemoryState>,
}

impl MemoryUnitOfWork {
    pub fn with_state(state: MemoryState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn snapshot(&self) -> MemoryState {
        self.state.lock().unwrap().clone()
    }
}

impl UnitOfWork for MemoryUnitOfWork {
    fn transaction<T, F>(&self, work: F) -> CoreResult<T>
    where
        F: FnOnce(&mut dyn TxStore) -> CoreResult<T>,
    {
        let mut committed = self.state.lock().unwrap();
        let mut working = committed.clone();
        let result = work(&mut MemoryTx {
            state: &mut working,
        });
        if result.is_ok() {
            *committed = working;
        }
        result
    }
}

pub(crate) struct MemoryTx<'a> {
    state: &'a mut MemoryState,
}

impl LedgerStore for MemoryTx<'_> {
    fn lock_subscription(&mut self, subscription_id: Uuid) -> CoreResult<SubscriptionEntity> {
        self.state
            .subscriptions
            .get(&subscription_id)
            .cloned()
            .ok_or(CoreError::NotFound("subscription"))
    }

    fn lock_eligible_subscription(
        &mut self,
        student_id: Uuid,
        group_id: Uuid,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<SubscriptionEntity>> {
        let mut candidates: Vec<&SubscriptionEntity> = self
            .state
            .subscriptions
            .values()
            .filter(|s| s.student_id == student_id && s.group_id == group_id && s.covers(at))
            .collect();
        candidates.sort_by_key(|s| (s.starts_at.is_none(), s.starts_at, s.created_at));
        Ok(candidates.first().map(|s| (*s).clone()))
    }

    fn decrement_remaining(
        &mut self,
        subscription_id: Uuid,
    ) -> CoreResult<Option<SubscriptionEntity>> {
        let Some(sub) = self.state.subscriptions.get_mut(&subscription_id) else {
            return Ok(None);
        };
        if sub.status() != Some(SubscriptionStatus::Active) || sub.remaining_sessions <= 0 {
            return Ok(None);
        }
        sub.remaining_sessions -= 1;
        if sub.remaining_sessions == 0 {
            sub.status = SubscriptionStatus::Used.as_str().to_string();
        }
        Ok(Some(sub.clone()))
    }

    fn increment_remaining(
        &mut self,
        subscription_id: Uuid,
    ) -> CoreResult<Option<SubscriptionEntity>> {
        let Some(sub) = self.state.subscriptions.get_mut(&subscription_id) else {
            return Ok(None);
        };
        if sub.status() != Some(SubscriptionStatus::Active)
            || sub.remaining_sessions >= sub.total_sessions
        {
            return Ok(None);
        }
        sub.remaining_sessions += 1;
        Ok(Some(sub.clone()))
    }

    fn set_status(
        &mut self,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) -> CoreResult<SubscriptionEntity> {
        let sub = self
            .state
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(CoreError::NotFound("subscription"))?;
        sub.status = status.as_str().to_string();
        Ok(sub.clone())
    }

    fn set_active_window(
        &mut self,
        subscription_id: Uuid,
        starts_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> CoreResult<SubscriptionEntity> {
        let sub = self
            .state
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(CoreError::NotFound("subscription"))?;
        sub.status = SubscriptionStatus::Active.as_str().to_string();
        sub.starts_at = Some(starts_at);
        sub.expires_at = expires_at;
        Ok(sub.clone())
    }
}

impl AttendanceStore for MemoryTx<'_> {
    fn attendance_exists(&mut self, session_id: Uuid, student_id: Uuid) -> CoreResult<bool> {
        Ok(self
            .state
            .attendances
            .values()
            .any(|a| a.session_id == session_id && a.student_id == student_id))
    }

    fn insert_attendance(
        &mut self,
        attendance: InsertAttendanceEntity,
    ) -> CoreResult<AttendanceEntity> {
        if self.attendance_exists(attendance.session_id, attendance.student_id)? {
            return Err(CoreError::Conflict(
                "duplicate key value violates unique constraint \"attendances_session_student_key\""
                    .to_string(),
            ));
        }
        let row = AttendanceEntity {
            id: Uuid::new_v4(),
            session_id: attendance.session_id,
            student_id: attendance.student_id,
            subscription_id: attendance.subscription_id,
            status: attendance.status,
            noted_by: attendance.noted_by,
            noted_at: attendance.noted_at,
        };
        self.state.attendances.insert(row.id, row.clone());
        Ok(row)
    }

    fn lock_attendance(&mut self, attendance_id: Uuid) -> CoreResult<AttendanceEntity> {
        self.state
            .attendances
            .get(&attendance_id)
            .cloned()
            .ok_or(CoreError::NotFound("attendance"))
    }

    fn delete_attendance(&mut self, attendance_id: Uuid) -> CoreResult<()> {
        self.state
            .attendances
            .remove(&attendance_id)
            .map(|_| ())
            .ok_or(CoreError::NotFound("attendance"))
    }
}

impl PaymentStore for MemoryTx<'_> {
    fn lock_payment_by_provider_ref(
        &mut self,
        provider_payment_id: &str,
    ) -> CoreResult<Option<PaymentEntity>> {
        Ok(self
            .state
            .payments
            .values()
            .find(|p| p.provider_payment_id.as_deref() == Some(provider_payment_id))
            .cloned())
    }

    fn lock_payment_by_payment_intent(
        &mut self,
        payment_intent: &str,
    ) -> CoreResult<Option<PaymentEntity>> {
        Ok(self
            .state
            .payments
            .values()
            .filter(|p| p.provider_metadata.payment_intent.as_deref() == Some(payment_intent))
            .min_by_key(|p| p.created_at)
            .cloned())
    }

    fn insert_payment(&mut self, payment: InsertPaymentEntity) -> CoreResult<PaymentEntity> {
        let row = PaymentEntity {
            id: Uuid::new_v4(),
            subscription_id: payment.subscription_id,
            amount_minor: payment.amount_minor,
            currency: payment.currency,
            method: payment.method,
            status: payment.status,
            provider_payment_id: payment.provider_payment_id,
            provider_metadata: serde_json::from_value(payment.provider_metadata)
                .unwrap_or_default(),
            paid_at: payment.paid_at,
            created_at: Utc::now(),
        };
        self.state.payments.insert(row.id, row.clone());
        Ok(row)
    }

    fn set_payment_status(
        &mut self,
        payment_id: Uuid,
        status: PaymentStatus,
        paid_at: Option<DateTime<Utc>>,
        metadata: &ProviderMetadata,
    ) -> CoreResult<PaymentEntity> {
        let payment = self
            .state
            .payments
            .get_mut(&payment_id)
            .ok_or(CoreError::NotFound("payment"))?;
        payment.status = status.as_str().to_string();
        payment.paid_at = paid_at;
        payment.provider_metadata = metadata.clone();
        Ok(payment.clone())
    }
}

impl ScheduleStore for MemoryTx<'_> {
    fn insert_sessions(
        &mut self,
        rows: &[InsertSessionEntity],
    ) -> CoreResult<Vec<SessionEntity>> {
        let now = Utc::now();
        let created: Vec<SessionEntity> = rows
            .iter()
            .map(|row| SessionEntity {
                id: Uuid::new_v4(),
                group_id: row.group_id,
                start_at: row.start_at,
                duration_minutes: row.duration_minutes,
                location: row.location.clone(),
                created_at: now,
            })
            .collect();
        self.state.sessions.extend(created.iter().cloned());
        Ok(created)
    }
}

impl TxStore for MemoryTx<'_> {
    fn savepoint(
        &mut self,
        work: &mut dyn FnMut(&mut dyn TxStore) -> CoreResult<()>,
    ) -> CoreResult<()> {
        let mut nested = self.state.clone();
        let result = work(&mut MemoryTx { state: &mut nested });
        if result.is_ok() {
            *self.state = nested;
        }
        result
    }
}

pub(crate) fn club(owner_user_id: Uuid) -> ClubEntity {
    ClubEntity {
        id: Uuid::new_v4(),
        owner_user_id,
        name: "Tigers".to_string(),
        currency: "kzt".to_string(),
        created_at: Utc::now(),
    }
}

pub(crate) fn group(club_id: Uuid, coach_user_id: Option<Uuid>) -> GroupEntity {
    GroupEntity {
        id: Uuid::new_v4(),
        club_id,
        title: "U10 Football".to_string(),
        coach_user_id,
        created_at: Utc::now(),
    }
}

pub(crate) fn session(group_id: Uuid, start_at: DateTime<Utc>) -> SessionEntity {
    SessionEntity {
        id: Uuid::new_v4(),
        group_id,
        start_at,
        duration_minutes: 60,
        location: None,
        created_at: Utc::now(),
    }
}

/// Active subscriptions start yesterday and run for another month.
pub(crate) fn subscription(
    student_id: Uuid,
    group_id: Uuid,
    status: SubscriptionStatus,
    remaining_sessions: i32,
    total_sessions: i32,
) -> SubscriptionEntity {
    let now = Utc::now();
    let (starts_at, expires_at) = match status {
        SubscriptionStatus::Pending => (None, None),
        _ => (
            Some(now - Duration::days(1)),
            Some(now + Duration::days(30)),
        ),
    };
    SubscriptionEntity {
        id: Uuid::new_v4(),
        student_id,
        group_id,
        total_sessions,
        remaining_sessions,
        price_minor: 2_000_000,
        starts_at,
        expires_at,
        status: status.as_str().to_string(),
        created_at: now - Duration::days(2),
    }
}

pub(crate) fn pending_stripe_payment(subscription_id: Uuid, checkout_session_id: &str) -> PaymentEntity {
    PaymentEntity {
        id: Uuid::new_v4(),
        subscription_id,
        amount_minor: 2_000_000,
        currency: "kzt".to_string(),
        method: PaymentMethod::Stripe.as_str().to_string(),
        status: PaymentStatus::Pending.as_str().to_string(),
        provider_payment_id: Some(checkout_session_id.to_string()),
        provider_metadata: ProviderMetadata {
            checkout_session_id: Some(checkout_session_id.to_string()),
            ..ProviderMetadata::default()
        },
        paid_at: None,
        created_at: Utc::now(),
    }
}
