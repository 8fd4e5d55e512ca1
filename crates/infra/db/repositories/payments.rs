use async_trait::async_trait;
use diesel::{insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::payments},
};
use domain::{
    entities::payments::{InsertPaymentEntity, PaymentEntity, PaymentRow},
    errors::{CoreError, CoreResult},
    repositories::payments::PaymentRepository,
};

pub struct PaymentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentRepository for PaymentPostgres {
    async fn find_by_id(&self, payment_id: Uuid) -> CoreResult<PaymentEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = payments::table
            .find(payment_id)
            .select(PaymentRow::as_select())
            .first::<PaymentRow>(&mut conn)
            .optional()?
            .ok_or(CoreError::NotFound("payment"))?;

        Ok(row.into())
    }

    async fn create(&self, payment: InsertPaymentEntity) -> CoreResult<PaymentEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = insert_into(payments::table)
            .values(&payment)
            .returning(PaymentRow::as_returning())
            .get_result::<PaymentRow>(&mut conn)?;

        Ok(row.into())
    }

    async fn list_by_subscription(&self, subscription_id: Uuid) -> CoreResult<Vec<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = payments::table
            .filter(payments::subscription_id.eq(subscription_id))
            .order(payments::created_at.desc())
            .select(PaymentRow::as_select())
            .load::<PaymentRow>(&mut conn)?;

        Ok(rows.into_iter().map(PaymentEntity::from).collect())
    }
}
