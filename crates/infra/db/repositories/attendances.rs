use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{dsl::exists, prelude::*, select};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::attendances},
};
use domain::{
    entities::attendances::AttendanceEntity,
    errors::{CoreError, CoreResult},
    repositories::attendances::AttendanceRepository,
    value_objects::enums::attendance_statuses::AttendanceStatus,
};

pub struct AttendancePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AttendancePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AttendanceRepository for AttendancePostgres {
    async fn find_by_id(&self, attendance_id: Uuid) -> CoreResult<AttendanceEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        attendances::table
            .find(attendance_id)
            .select(AttendanceEntity::as_select())
            .first::<AttendanceEntity>(&mut conn)
            .optional()?
            .ok_or(CoreError::NotFound("attendance"))
    }

    async fn exists(&self, session_id: Uuid, student_id: Uuid) -> CoreResult<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let found = select(exists(
            attendances::table
                .filter(attendances::session_id.eq(session_id))
                .filter(attendances::student_id.eq(student_id)),
        ))
        .get_result::<bool>(&mut conn)?;

        Ok(found)
    }

    async fn list_by_session(&self, session_id: Uuid) -> CoreResult<Vec<AttendanceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = attendances::table
            .filter(attendances::session_id.eq(session_id))
            .order(attendances::noted_at.asc())
            .select(AttendanceEntity::as_select())
            .load::<AttendanceEntity>(&mut conn)?;

        Ok(rows)
    }

    async fn list_by_student(&self, student_id: Uuid, limit: i64) -> CoreResult<Vec<AttendanceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = attendances::table
            .filter(attendances::student_id.eq(student_id))
            .order(attendances::noted_at.desc())
            .limit(limit)
            .select(AttendanceEntity::as_select())
            .load::<AttendanceEntity>(&mut conn)?;

        Ok(rows)
    }

    async fn update_status(
        &self,
        attendance_id: Uuid,
        status: AttendanceStatus,
        noted_by: Uuid,
        noted_at: DateTime<Utc>,
    ) -> CoreResult<AttendanceEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(attendances::table.find(attendance_id))
            .set((
                attendances::status.eq(status.as_str()),
                attendances::noted_by.eq(noted_by),
                attendances::noted_at.eq(noted_at),
            ))
            .returning(AttendanceEntity::as_returning())
            .get_result::<AttendanceEntity>(&mut conn)
            .optional()?
            .ok_or(CoreError::NotFound("attendance"))
    }
}
