use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infra::db::postgres::schema::clubs;

#[derive(Debug, Clone, Serialize, Identifiable, Selectable, Queryable)]
#[diesel(table_name = clubs)]
pub struct ClubEntity {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = clubs)]
pub struct InsertClubEntity {
    pub owner_user_id: Uuid,
    pub name: String,
    pub currency: String,
}
