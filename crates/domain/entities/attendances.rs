use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infra::db::postgres::schema::attendances;

#[derive(Debug, Clone, PartialEq, Serialize, Identifiable, Selectable, Queryable)]
#[diesel(table_name = attendances)]
pub struct AttendanceEntity {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub status: String,
    pub noted_by: Uuid,
    pub noted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = attendances)]
pub struct InsertAttendanceEntity {
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub status: String,
    pub noted_by: Uuid,
    pub noted_at: DateTime<Utc>,
}
