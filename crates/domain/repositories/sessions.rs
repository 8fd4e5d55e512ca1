use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::sessions::{InsertSessionEntity, SessionEntity, UpdateSessionEntity},
    errors::CoreResult,
};

#[automock]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_id(&self, session_id: Uuid) -> CoreResult<SessionEntity>;
    async fn create(&self, session: InsertSessionEntity) -> CoreResult<SessionEntity>;
    /// Sessions starting in `[from, to)`, earliest first.
    async fn list_by_group(
        &self,
        group_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CoreResult<Vec<SessionEntity>>;
    async fn update(&self, session_id: Uuid, changes: UpdateSessionEntity) -> CoreResult<SessionEntity>;
    async fn delete(&self, session_id: Uuid) -> CoreResult<()>;
}
