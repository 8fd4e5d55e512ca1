use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{domain::value_objects::students::ParentContact, infra::db::postgres::schema::students};

#[derive(Debug, Clone, Serialize)]
pub struct StudentEntity {
    pub id: Uuid,
    pub club_id: Uuid,
    pub name: String,
    pub parent_contact: Option<ParentContact>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Raw row. The parent contact stays as JSON here and is decoded into [`ParentContact`].
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = students)]
pub struct StudentRow {
    pub id: Uuid,
    pub club_id: Uuid,
    pub name: String,
    pub parent_contact: Option<serde_json::Value>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StudentRow> for StudentEntity {
    fn from(value: StudentRow) -> Self {
        let parent_contact = value
            .parent_contact
            .and_then(|raw| serde_json::from_value(raw).ok());

        Self {
            id: value.id,
            club_id: value.club_id,
            name: value.name,
            parent_contact,
            notes: value.notes,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = students)]
pub struct InsertStudentEntity {
    pub club_id: Uuid,
    pub name: String,
    pub parent_contact: Option<serde_json::Value>,
    pub notes: Option<String>,
}
