//! Transaction-bound stores.
//!
//! Everything that must observe a row lock runs inside [`UnitOfWork::transaction`]. The
//! closure receives a [`TxStore`] bound to one open transaction: returning `Err` (or
//! panicking) rolls the whole unit back, and the connection never leaves the closure.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    entities::{
        attendances::{AttendanceEntity, InsertAttendanceEntity},
        payments::{InsertPaymentEntity, PaymentEntity},
        sessions::{InsertSessionEntity, SessionEntity},
        subscriptions::SubscriptionEntity,
    },
    errors::CoreResult,
    value_objects::{
        enums::{payment_statuses::PaymentStatus, subscription_statuses::SubscriptionStatus},
        payments::ProviderMetadata,
    },
};

pub trait LedgerStore {
    /// `SELECT ... FOR UPDATE` on one subscription.
    fn lock_subscription(&mut self, subscription_id: Uuid) -> CoreResult<SubscriptionEntity>;

    /// Earliest-starting active subscription with credit whose window contains `at`, locked.
    fn lock_eligible_subscription(
        &mut self,
        student_id: Uuid,
        group_id: Uuid,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<SubscriptionEntity>>;

    /// Guarded decrement. Flips the status to `used` in the same statement when the credit
    /// reaches zero. `None` when the guard did not match.
    fn decrement_remaining(&mut self, subscription_id: Uuid) -> CoreResult<Option<SubscriptionEntity>>;

    /// Guarded increment for active subscriptions below their total. `None` when the guard
    /// did not match.
    fn increment_remaining(&mut self, subscription_id: Uuid) -> CoreResult<Option<SubscriptionEntity>>;

    fn set_status(
        &mut self,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) -> CoreResult<SubscriptionEntity>;

    fn set_active_window(
        &mut self,
        subscription_id: Uuid,
        starts_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> CoreResult<SubscriptionEntity>;
}

pub trait AttendanceStore {
    fn attendance_exists(&mut self, session_id: Uuid, student_id: Uuid) -> CoreResult<bool>;

    fn insert_attendance(&mut self, attendance: InsertAttendanceEntity) -> CoreResult<AttendanceEntity>;

    fn lock_attendance(&mut self, attendance_id: Uuid) -> CoreResult<AttendanceEntity>;

    fn delete_attendance(&mut self, attendance_id: Uuid) -> CoreResult<()>;
}

pub trait PaymentStore {
    /// Locks the payment created for a provider checkout session.
    fn lock_payment_by_provider_ref(
        &mut self,
        provider_payment_id: &str,
    ) -> CoreResult<Option<PaymentEntity>>;

    /// Locks the payment whose metadata carries this provider payment intent.
    fn lock_payment_by_payment_intent(
        &mut self,
        payment_intent: &str,
    ) -> CoreResult<Option<PaymentEntity>>;

    fn insert_payment(&mut self, payment: InsertPaymentEntity) -> CoreResult<PaymentEntity>;

    fn set_payment_status(
        &mut self,
        payment_id: Uuid,
        status: PaymentStatus,
        paid_at: Option<DateTime<Utc>>,
        metadata: &ProviderMetadata,
    ) -> CoreResult<PaymentEntity>;
}

pub trait ScheduleStore {
    /// Inserts all rows with one multi-row statement.
    fn insert_sessions(&mut self, sessions: &[InsertSessionEntity]) -> CoreResult<Vec<SessionEntity>>;
}

pub trait TxStore: LedgerStore + AttendanceStore + PaymentStore + ScheduleStore {
    /// Runs `work` inside a savepoint. On `Err` only the savepoint's effects are rolled back and
    /// the surrounding transaction stays usable.
    fn savepoint(
        &mut self,
        work: &mut dyn FnMut(&mut dyn TxStore) -> CoreResult<()>,
    ) -> CoreResult<()>;
}

pub trait UnitOfWork: Send + Sync {
    fn transaction<T, F>(&self, work: F) -> CoreResult<T>
    where
        F: FnOnce(&mut dyn TxStore) -> CoreResult<T>;
}
