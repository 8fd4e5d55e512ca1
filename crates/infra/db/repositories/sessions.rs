use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{delete, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::sessions},
};
use domain::{
    entities::sessions::{InsertSessionEntity, SessionEntity, UpdateSessionEntity},
    errors::{CoreError, CoreResult},
    repositories::sessions::SessionRepository,
};

pub struct SessionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SessionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SessionRepository for SessionPostgres {
    async fn find_by_id(&self, session_id: Uuid) -> CoreResult<SessionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        sessions::table
            .find(session_id)
            .select(SessionEntity::as_select())
            .first::<SessionEntity>(&mut conn)
            .optional()?
            .ok_or(CoreError::NotFound("session"))
    }

    async fn create(&self, session: InsertSessionEntity) -> CoreResult<SessionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = insert_into(sessions::table)
            .values(&session)
            .returning(SessionEntity::as_returning())
            .get_result::<SessionEntity>(&mut conn)?;

        Ok(created)
    }

    async fn list_by_group(
        &self,
        group_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CoreResult<Vec<SessionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = sessions::table
            .filter(sessions::group_id.eq(group_id))
            .filter(sessions::start_at.ge(from))
            .filter(sessions::start_at.lt(to))
            .order(sessions::start_at.asc())
            .select(SessionEntity::as_select())
            .load::<SessionEntity>(&mut conn)?;

        Ok(rows)
    }

    async fn update(&self, session_id: Uuid, changes: UpdateSessionEntity) -> CoreResult<SessionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(sessions::table.find(session_id))
            .set(&changes)
            .returning(SessionEntity::as_returning())
            .get_result::<SessionEntity>(&mut conn)
            .optional()?
            .ok_or(CoreError::NotFound("session"))
    }

    async fn delete(&self, session_id: Uuid) -> CoreResult<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = delete(sessions::table.find(session_id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(CoreError::NotFound("session"));
        }
        Ok(())
    }
}
