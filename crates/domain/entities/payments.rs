use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    domain::value_objects::{
        enums::payment_statuses::PaymentStatus, payments::ProviderMetadata,
    },
    infra::db::postgres::schema::payments,
};

#[derive(Debug, Clone, Serialize)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub method: String,
    pub status: String,
    pub provider_payment_id: Option<String>,
    pub provider_metadata: ProviderMetadata,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PaymentEntity {
    pub fn status(&self) -> Option<PaymentStatus> {
        PaymentStatus::from_str(&self.status)
    }
}

/// Raw row used for Diesel queries. Provider metadata stays as JSON and is parsed into
/// [`ProviderMetadata`].
#[derive(Debug, Clone, Identifiable, Selectable, Queryable, QueryableByName)]
#[diesel(table_name = payments)]
pub struct PaymentRow {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub method: String,
    pub status: String,
    pub provider_payment_id: Option<String>,
    pub provider_metadata: serde_json::Value,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentRow> for PaymentEntity {
    fn from(value: PaymentRow) -> Self {
        let provider_metadata = match serde_json::from_value(value.provider_metadata) {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(
                    payment_id = %value.id,
                    error = %err,
                    "payments: stored provider metadata is malformed, dropping it"
                );
                ProviderMetadata::default()
            }
        };

        Self {
            id: value.id,
            subscription_id: value.subscription_id,
            amount_minor: value.amount_minor,
            currency: value.currency,
            method: value.method,
            status: value.status,
            provider_payment_id: value.provider_payment_id,
            provider_metadata,
            paid_at: value.paid_at,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub struct InsertPaymentEntity {
    pub subscription_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub method: String,
    pub status: String,
    pub provider_payment_id: Option<String>,
    pub provider_metadata: serde_json::Value,
    pub paid_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(provider_metadata: serde_json::Value) -> PaymentRow {
        PaymentRow {
            id: Uuid::new_v4(),
            subscription_id: Uuid::new_v4(),
            amount_minor: 1_500_000,
            currency: "kzt".to_string(),
            method: "stripe".to_string(),
            status: "succeeded".to_string(),
            provider_payment_id: Some("cs_test_1".to_string()),
            provider_metadata,
            paid_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn keeps_payment_intent_from_stored_metadata() {
        let entity = PaymentEntity::from(row(serde_json::json!({ "payment_intent": "pi_1" })));
        assert_eq!(entity.provider_metadata.payment_intent.as_deref(), Some("pi_1"));
    }

    #[test]
    fn malformed_metadata_falls_back_to_empty() {
        let entity = PaymentEntity::from(row(serde_json::json!(["not", "an", "object"])));
        assert_eq!(entity.provider_metadata.payment_intent, None);
        assert_eq!(entity.status(), Some(PaymentStatus::Succeeded));
    }
}
