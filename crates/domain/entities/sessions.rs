use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infra::db::postgres::schema::sessions;

#[derive(Debug, Clone, Serialize, Identifiable, Selectable, Queryable)]
#[diesel(table_name = sessions)]
pub struct SessionEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = sessions)]
pub struct InsertSessionEntity {
    pub group_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub location: Option<String>,
}

/// Partial update. `None` leaves the column as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, AsChangeset)]
#[diesel(table_name = sessions)]
pub struct UpdateSessionEntity {
    pub start_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub location: Option<String>,
}

impl UpdateSessionEntity {
    pub fn is_empty(&self) -> bool {
        self.start_at.is_none() && self.duration_minutes.is_none() && self.location.is_none()
    }
}
