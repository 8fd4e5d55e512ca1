use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::users::{InsertUserEntity, UserEntity},
    errors::CoreResult,
};

#[automock]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<UserEntity>>;
    async fn find_by_id(&self, user_id: Uuid) -> CoreResult<UserEntity>;
    /// `Conflict` when the email is already registered.
    async fn create(&self, user: InsertUserEntity) -> CoreResult<UserEntity>;
}
