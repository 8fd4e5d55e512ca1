use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::domain::value_objects::{students::ParentContact, subscriptions::SubscriptionTerms};

/// Typed view of the `provider_metadata` JSON column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ProviderMetadata {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckoutStudentModel {
    pub name: String,
    pub parent_contact: Option<ParentContact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequestModel {
    pub group_id: Uuid,
    pub student_id: Option<Uuid>,
    pub student: Option<CheckoutStudentModel>,
    pub subscription: SubscriptionTerms,
    pub success_url: String,
    pub cancel_url: String,
}

/// Who the checkout is for.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutStudent<'a> {
    Existing(Uuid),
    New(&'a CheckoutStudentModel),
}

impl CheckoutRequestModel {
    /// Field-level checks that need no storage access.
    pub fn validate(&self) -> Result<CheckoutStudent<'_>, String> {
        self.subscription.validate()?;
        validate_return_url("success_url", &self.success_url)?;
        validate_return_url("cancel_url", &self.cancel_url)?;

        match (self.student_id, self.student.as_ref()) {
            (Some(student_id), None) => Ok(CheckoutStudent::Existing(student_id)),
            (None, Some(student)) if student.name.trim().is_empty() => {
                Err("student name is required".to_string())
            }
            (None, Some(student)) => Ok(CheckoutStudent::New(student)),
            (Some(_), Some(_)) => Err("provide either student_id or student, not both".to_string()),
            (None, None) => Err("student_id or student is required".to_string()),
        }
    }
}

fn validate_return_url(field: &str, value: &str) -> Result<(), String> {
    let url = Url::parse(value).map_err(|_| format!("{field} must be an absolute URL"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("{field} must use http or https, got {other}")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub session_id: String,
    pub subscription_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManualPaymentModel {
    pub subscription_id: Uuid,
    pub amount_minor: i64,
    pub method: String,
    pub notes: Option<String>,
}

/// Provider events the reconciler understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEventKind {
    CheckoutCompleted,
    CheckoutExpired,
    ChargeRefunded,
    Unknown(String),
}

impl From<&str> for ProviderEventKind {
    fn from(value: &str) -> Self {
        match value {
            "checkout.session.completed" => ProviderEventKind::CheckoutCompleted,
            "checkout.session.expired" => ProviderEventKind::CheckoutExpired,
            "charge.refunded" => ProviderEventKind::ChargeRefunded,
            other => ProviderEventKind::Unknown(other.to_string()),
        }
    }
}

/// What a reconciliation step did to local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied,
    AlreadyProcessed,
    UnknownPayment,
    Ignored,
}
