use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infra::db::postgres::schema::groups;

#[derive(Debug, Clone, Serialize, Identifiable, Selectable, Queryable)]
#[diesel(table_name = groups)]
pub struct GroupEntity {
    pub id: Uuid,
    pub club_id: Uuid,
    pub title: String,
    pub coach_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl GroupEntity {
    pub fn is_coached_by(&self, user_id: Uuid) -> bool {
        self.coach_user_id == Some(user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = groups)]
pub struct InsertGroupEntity {
    pub club_id: Uuid,
    pub title: String,
    pub coach_user_id: Option<Uuid>,
}
