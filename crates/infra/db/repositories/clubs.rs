use async_trait::async_trait;
use diesel::{insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::clubs},
};
use domain::{
    entities::clubs::{ClubEntity, InsertClubEntity},
    errors::{CoreError, CoreResult},
    repositories::clubs::ClubRepository,
};

pub struct ClubPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ClubPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ClubRepository for ClubPostgres {
    async fn find_by_id(&self, club_id: Uuid) -> CoreResult<ClubEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        clubs::table
            .find(club_id)
            .select(ClubEntity::as_select())
            .first::<ClubEntity>(&mut conn)
            .optional()?
            .ok_or(CoreError::NotFound("club"))
    }

    async fn create(&self, club: InsertClubEntity) -> CoreResult<ClubEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = insert_into(clubs::table)
            .values(&club)
            .returning(ClubEntity::as_returning())
            .get_result::<ClubEntity>(&mut conn)?;

        Ok(created)
    }

    async fn list_by_owner(&self, owner_user_id: Uuid) -> CoreResult<Vec<ClubEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = clubs::table
            .filter(clubs::owner_user_id.eq(owner_user_id))
            .order(clubs::created_at.desc())
            .select(ClubEntity::as_select())
            .load::<ClubEntity>(&mut conn)?;

        Ok(rows)
    }
}
