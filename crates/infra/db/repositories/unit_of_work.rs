use chrono::{DateTime, Utc};
use diesel::{dsl::exists, insert_into, prelude::*, select, sql_types::Text};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{attendances, payments, sessions, subscriptions},
    },
};
use domain::{
    entities::{
        attendances::{AttendanceEntity, InsertAttendanceEntity},
        payments::{InsertPaymentEntity, PaymentEntity, PaymentRow},
        sessions::{InsertSessionEntity, SessionEntity},
        subscriptions::SubscriptionEntity,
    },
    errors::{CoreError, CoreResult},
    repositories::unit_of_work::{
        AttendanceStore, LedgerStore, PaymentStore, ScheduleStore, TxStore, UnitOfWork,
    },
    value_objects::{
        enums::{payment_statuses::PaymentStatus, subscription_statuses::SubscriptionStatus},
        payments::ProviderMetadata,
    },
};

const DECREMENT_REMAINING_SQL: &str = r#"
UPDATE subscriptions
SET remaining_sessions = remaining_sessions - 1,
    status = CASE WHEN remaining_sessions - 1 = 0 THEN 'used' ELSE status END
WHERE id = $1
  AND remaining_sessions > 0
  AND status = 'active'
RETURNING *
"#;

const LOCK_PAYMENT_BY_INTENT_SQL: &str = r#"
SELECT *
FROM payments
WHERE provider_metadata ->> 'payment_intent' = $1
ORDER BY created_at ASC
LIMIT 1
FOR UPDATE
"#;

pub struct PgUnitOfWork {
    db_pool: Arc<PgPoolSquad>,
}

impl PgUnitOfWork {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

impl UnitOfWork for PgUnitOfWork {
    fn transaction<T, F>(&self, work: F) -> CoreResult<T>
    where
        F: FnOnce(&mut dyn TxStore) -> CoreResult<T>,
    {
        let mut pooled = Arc::clone(&self.db_pool).get()?;
        let conn: &mut PgConnection = &mut pooled;

        conn.transaction::<T, CoreError, _>(|conn| {
            let mut store = PgTxStore { conn };
            work(&mut store)
        })
    }
}

/// Store bound to one open transaction.
pub struct PgTxStore<'c> {
    conn: &'c mut PgConnection,
}

impl LedgerStore for PgTxStore<'_> {
    fn lock_subscription(&mut self, subscription_id: Uuid) -> CoreResult<SubscriptionEntity> {
        subscriptions::table
            .find(subscription_id)
            .select(SubscriptionEntity::as_select())
            .for_update()
            .first::<SubscriptionEntity>(self.conn)
            .optional()?
            .ok_or(CoreError::NotFound("subscription"))
    }

    fn lock_eligible_subscription(
        &mut self,
        student_id: Uuid,
        group_id: Uuid,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<SubscriptionEntity>> {
        let candidate = subscriptions::table
            .filter(subscriptions::student_id.eq(student_id))
            .filter(subscriptions::group_id.eq(group_id))
            .filter(subscriptions::status.eq(SubscriptionStatus::Active.as_str()))
            .filter(subscriptions::remaining_sessions.gt(0))
            .filter(
                subscriptions::starts_at
                    .is_null()
                    .or(subscriptions::starts_at.le(at)),
            )
            .filter(
                subscriptions::expires_at
                    .is_null()
                    .or(subscriptions::expires_at.ge(at)),
            )
            .order((
                subscriptions::starts_at.asc().nulls_last(),
                subscriptions::created_at.asc(),
            ))
            .select(SubscriptionEntity::as_select())
            .for_update()
            .first::<SubscriptionEntity>(self.conn)
            .optional()?;

        Ok(candidate)
    }

    fn decrement_remaining(&mut self, subscription_id: Uuid) -> CoreResult<Option<SubscriptionEntity>> {
        let updated = diesel::sql_query(DECREMENT_REMAINING_SQL)
            .bind::<diesel::sql_types::Uuid, _>(subscription_id)
            .get_result::<SubscriptionEntity>(self.conn)
            .optional()?;

        Ok(updated)
    }

    fn increment_remaining(&mut self, subscription_id: Uuid) -> CoreResult<Option<SubscriptionEntity>> {
        let updated = diesel::update(
            subscriptions::table
                .find(subscription_id)
                .filter(subscriptions::status.eq(SubscriptionStatus::Active.as_str()))
                .filter(subscriptions::remaining_sessions.lt(subscriptions::total_sessions)),
        )
        .set(subscriptions::remaining_sessions.eq(subscriptions::remaining_sessions + 1))
        .returning(SubscriptionEntity::as_returning())
        .get_result::<SubscriptionEntity>(self.conn)
        .optional()?;

        Ok(updated)
    }

    fn set_status(
        &mut self,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) -> CoreResult<SubscriptionEntity> {
        let updated = diesel::update(subscriptions::table.find(subscription_id))
            .set(subscriptions::status.eq(status.as_str()))
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(self.conn)?;

        Ok(updated)
    }

    fn set_active_window(
        &mut self,
        subscription_id: Uuid,
        starts_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> CoreResult<SubscriptionEntity> {
        let updated = diesel::update(subscriptions::table.find(subscription_id))
            .set((
                subscriptions::status.eq(SubscriptionStatus::Active.as_str()),
                subscriptions::starts_at.eq(Some(starts_at)),
                subscriptions::expires_at.eq(expires_at),
            ))
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(self.conn)?;

        Ok(updated)
    }
}

impl AttendanceStore for PgTxStore<'_> {
    fn attendance_exists(&mut self, session_id: Uuid, student_id: Uuid) -> CoreResult<bool> {
        let found = select(exists(
            attendances::table
                .filter(attendances::session_id.eq(session_id))
                .filter(attendances::student_id.eq(student_id)),
        ))
        .get_result::<bool>(self.conn)?;

        Ok(found)
    }

    fn insert_attendance(&mut self, attendance: InsertAttendanceEntity) -> CoreResult<AttendanceEntity> {
        let created = insert_into(attendances::table)
            .values(&attendance)
            .returning(AttendanceEntity::as_returning())
            .get_result::<AttendanceEntity>(self.conn)?;

        Ok(created)
    }

    fn lock_attendance(&mut self, attendance_id: Uuid) -> CoreResult<AttendanceEntity> {
        attendances::table
            .find(attendance_id)
            .select(AttendanceEntity::as_select())
            .for_update()
            .first::<AttendanceEntity>(self.conn)
            .optional()?
            .ok_or(CoreError::NotFound("attendance"))
    }

    fn delete_attendance(&mut self, attendance_id: Uuid) -> CoreResult<()> {
        let deleted = diesel::delete(attendances::table.find(attendance_id)).execute(self.conn)?;
        if deleted == 0 {
            return Err(CoreError::NotFound("attendance"));
        }
        Ok(())
    }
}

impl PaymentStore for PgTxStore<'_> {
    fn lock_payment_by_provider_ref(
        &mut self,
        provider_payment_id: &str,
    ) -> CoreResult<Option<PaymentEntity>> {
        let row = payments::table
            .filter(payments::provider_payment_id.eq(provider_payment_id))
            .select(PaymentRow::as_select())
            .for_update()
            .first::<PaymentRow>(self.conn)
            .optional()?;

        Ok(row.map(PaymentEntity::from))
    }

    fn lock_payment_by_payment_intent(
        &mut self,
        payment_intent: &str,
    ) -> CoreResult<Option<PaymentEntity>> {
        let row = diesel::sql_query(LOCK_PAYMENT_BY_INTENT_SQL)
            .bind::<Text, _>(payment_intent)
            .get_result::<PaymentRow>(self.conn)
            .optional()?;

        Ok(row.map(PaymentEntity::from))
    }

    fn insert_payment(&mut self, payment: InsertPaymentEntity) -> CoreResult<PaymentEntity> {
        let row = insert_into(payments::table)
            .values(&payment)
            .returning(PaymentRow::as_returning())
            .get_result::<PaymentRow>(self.conn)?;

        Ok(row.into())
    }

    fn set_payment_status(
        &mut self,
        payment_id: Uuid,
        status: PaymentStatus,
        paid_at: Option<DateTime<Utc>>,
        metadata: &ProviderMetadata,
    ) -> CoreResult<PaymentEntity> {
        let row = diesel::update(payments::table.find(payment_id))
            .set((
                payments::status.eq(status.as_str()),
                payments::paid_at.eq(paid_at),
                payments::provider_metadata.eq(metadata.to_json()),
            ))
            .returning(PaymentRow::as_returning())
            .get_result::<PaymentRow>(self.conn)?;

        Ok(row.into())
    }
}

impl ScheduleStore for PgTxStore<'_> {
    fn insert_sessions(&mut self, rows: &[InsertSessionEntity]) -> CoreResult<Vec<SessionEntity>> {
        let created = insert_into(sessions::table)
            .values(rows)
            .returning(SessionEntity::as_returning())
            .get_results::<SessionEntity>(self.conn)?;

        Ok(created)
    }
}

impl TxStore for PgTxStore<'_> {
    fn savepoint(
        &mut self,
        work: &mut dyn FnMut(&mut dyn TxStore) -> CoreResult<()>,
    ) -> CoreResult<()> {
        // Nested diesel transactions are emitted as SAVEPOINT / ROLLBACK TO SAVEPOINT.
        self.conn.transaction::<(), CoreError, _>(|conn| {
            let mut nested = PgTxStore { conn };
            work(&mut nested)
        })
    }
}
