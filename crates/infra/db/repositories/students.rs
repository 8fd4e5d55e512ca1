use async_trait::async_trait;
use diesel::{insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::students},
};
use domain::{
    entities::students::{InsertStudentEntity, StudentEntity, StudentRow},
    errors::{CoreError, CoreResult},
    repositories::students::StudentRepository,
};

pub struct StudentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl StudentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl StudentRepository for StudentPostgres {
    async fn find_by_id(&self, student_id: Uuid) -> CoreResult<StudentEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = students::table
            .find(student_id)
            .select(StudentRow::as_select())
            .first::<StudentRow>(&mut conn)
            .optional()?
            .ok_or(CoreError::NotFound("student"))?;

        Ok(row.into())
    }

    async fn create(&self, student: InsertStudentEntity) -> CoreResult<StudentEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = insert_into(students::table)
            .values(&student)
            .returning(StudentRow::as_returning())
            .get_result::<StudentRow>(&mut conn)?;

        Ok(row.into())
    }

    async fn list_by_club(&self, club_id: Uuid, limit: i64, offset: i64) -> CoreResult<Vec<StudentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = students::table
            .filter(students::club_id.eq(club_id))
            .order((students::name.asc(), students::id.asc()))
            .limit(limit)
            .offset(offset)
            .select(StudentRow::as_select())
            .load::<StudentRow>(&mut conn)?;

        Ok(rows.into_iter().map(StudentEntity::from).collect())
    }
}
