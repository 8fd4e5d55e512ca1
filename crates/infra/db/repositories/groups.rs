use async_trait::async_trait;
use diesel::{insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::groups},
};
use domain::{
    entities::groups::{GroupEntity, InsertGroupEntity},
    errors::{CoreError, CoreResult},
    repositories::groups::GroupRepository,
};

pub struct GroupPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl GroupPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl GroupRepository for GroupPostgres {
    async fn find_by_id(&self, group_id: Uuid) -> CoreResult<GroupEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        groups::table
            .find(group_id)
            .select(GroupEntity::as_select())
            .first::<GroupEntity>(&mut conn)
            .optional()?
            .ok_or(CoreError::NotFound("group"))
    }

    async fn create(&self, group: InsertGroupEntity) -> CoreResult<GroupEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = insert_into(groups::table)
            .values(&group)
            .returning(GroupEntity::as_returning())
            .get_result::<GroupEntity>(&mut conn)?;

        Ok(created)
    }

    async fn list_by_club(&self, club_id: Uuid) -> CoreResult<Vec<GroupEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = groups::table
            .filter(groups::club_id.eq(club_id))
            .order(groups::title.asc())
            .select(GroupEntity::as_select())
            .load::<GroupEntity>(&mut conn)?;

        Ok(rows)
    }
}
