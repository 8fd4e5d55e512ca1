use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{clubs::InsertClubEntity, groups::InsertGroupEntity};

#[derive(Debug, Clone, Deserialize)]
pub struct InsertClubModel {
    pub name: String,
    pub currency: String,
}

impl InsertClubModel {
    /// Trims the name and lowercases the ISO 4217 code.
    pub fn into_entity(self, owner_user_id: Uuid) -> Result<InsertClubEntity, String> {
        let name = self.name.trim().to_string();
        if !(3..=100).contains(&name.chars().count()) {
            return Err("name must be between 3 and 100 characters".to_string());
        }

        let currency = self.currency.trim().to_ascii_lowercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err("currency must be a three-letter code".to_string());
        }

        Ok(InsertClubEntity {
            owner_user_id,
            name,
            currency,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsertGroupModel {
    pub club_id: Uuid,
    pub title: String,
    pub coach_user_id: Option<Uuid>,
}

impl InsertGroupModel {
    pub fn into_entity(self) -> Result<InsertGroupEntity, String> {
        let title = self.title.trim().to_string();
        if !(2..=100).contains(&title.chars().count()) {
            return Err("title must be between 2 and 100 characters".to_string());
        }

        Ok(InsertGroupEntity {
            club_id: self.club_id,
            title,
            coach_user_id: self.coach_user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn club_currency_is_normalized() {
        let owner = Uuid::new_v4();
        let entity = InsertClubModel {
            name: "  Tigers Judo ".to_string(),
            currency: "KZT".to_string(),
        }
        .into_entity(owner)
        .unwrap();

        assert_eq!(entity.name, "Tigers Judo");
        assert_eq!(entity.currency, "kzt");
        assert_eq!(entity.owner_user_id, owner);
    }

    #[test]
    fn rejects_short_names_and_bad_currencies() {
        let short = InsertClubModel {
            name: "ab".to_string(),
            currency: "usd".to_string(),
        };
        assert!(short.into_entity(Uuid::nil()).is_err());

        let currency = InsertClubModel {
            name: "Tigers".to_string(),
            currency: "dollars".to_string(),
        };
        assert!(currency.into_entity(Uuid::nil()).is_err());
    }

    #[test]
    fn group_title_needs_two_characters() {
        let model = InsertGroupModel {
            club_id: Uuid::nil(),
            title: " a ".to_string(),
            coach_user_id: None,
        };
        assert!(model.into_entity().is_err());
    }
}
