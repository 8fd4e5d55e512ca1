use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::payments::{InsertPaymentEntity, PaymentEntity},
    errors::CoreResult,
};

#[automock]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_id(&self, payment_id: Uuid) -> CoreResult<PaymentEntity>;
    async fn create(&self, payment: InsertPaymentEntity) -> CoreResult<PaymentEntity>;

    async fn list_by_subscription(&self, subscription_id: Uuid) -> CoreResult<Vec<PaymentEntity>>;
}
