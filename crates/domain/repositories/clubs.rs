use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::clubs::{ClubEntity, InsertClubEntity},
    errors::CoreResult,
};

#[automock]
#[async_trait]
pub trait ClubRepository: Send + Sync {
    async fn find_by_id(&self, club_id: Uuid) -> CoreResult<ClubEntity>;
    async fn create(&self, club: InsertClubEntity) -> CoreResult<ClubEntity>;
    async fn list_by_owner(&self, owner_user_id: Uuid) -> CoreResult<Vec<ClubEntity>>;
}
