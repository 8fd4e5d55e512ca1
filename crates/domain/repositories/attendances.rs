use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::attendances::AttendanceEntity,
    errors::CoreResult,
    value_objects::enums::attendance_statuses::AttendanceStatus,
};

#[automock]
#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    async fn find_by_id(&self, attendance_id: Uuid) -> CoreResult<AttendanceEntity>;

    async fn exists(&self, session_id: Uuid, student_id: Uuid) -> CoreResult<bool>;

    async fn list_by_session(&self, session_id: Uuid) -> CoreResult<Vec<AttendanceEntity>>;
    /// Most recent first.
    async fn list_by_student(&self, student_id: Uuid, limit: i64) -> CoreResult<Vec<AttendanceEntity>>;

    async fn update_status(
        &self,
        attendance_id: Uuid,
        status: AttendanceStatus,
        noted_by: Uuid,
        noted_at: DateTime<Utc>,
    ) -> CoreResult<AttendanceEntity>;
}
