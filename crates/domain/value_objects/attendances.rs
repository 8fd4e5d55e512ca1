use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::attendance_statuses::AttendanceStatus;

#[derive(Debug, Clone, Deserialize)]
pub struct MarkAttendanceModel {
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkAttendanceModel {
    pub session_id: Uuid,
    pub attendances: Vec<BulkAttendanceItemModel>,
}

/// Student ids stay raw so a malformed id fails only its own item.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkAttendanceItemModel {
    pub student_id: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkAttendanceResult {
    pub student_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkAttendanceResult {
    pub fn recorded(student_id: String, attendance_id: Uuid) -> Self {
        Self {
            student_id,
            success: true,
            attendance_id: Some(attendance_id),
            error: None,
        }
    }

    pub fn failed(student_id: String, error: impl Into<String>) -> Self {
        Self {
            student_id,
            success: false,
            attendance_id: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAttendanceModel {
    pub status: AttendanceStatus,
}
