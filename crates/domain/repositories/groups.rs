use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::groups::{GroupEntity, InsertGroupEntity},
    errors::CoreResult,
};

#[automock]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn find_by_id(&self, group_id: Uuid) -> CoreResult<GroupEntity>;
    async fn create(&self, group: InsertGroupEntity) -> CoreResult<GroupEntity>;
    async fn list_by_club(&self, club_id: Uuid) -> CoreResult<Vec<GroupEntity>>;
}
