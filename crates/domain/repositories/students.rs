use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::students::{InsertStudentEntity, StudentEntity},
    errors::CoreResult,
};

#[automock]
#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn find_by_id(&self, student_id: Uuid) -> CoreResult<StudentEntity>;
    async fn create(&self, student: InsertStudentEntity) -> CoreResult<StudentEntity>;
    /// Ordered by name.
    async fn list_by_club(&self, club_id: Uuid, limit: i64, offset: i64) -> CoreResult<Vec<StudentEntity>>;
}
