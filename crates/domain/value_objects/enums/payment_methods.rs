use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Stripe,
    Cash,
    Manual,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Manual => "manual",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "stripe" => Some(PaymentMethod::Stripe),
            "cash" => Some(PaymentMethod::Cash),
            "manual" => Some(PaymentMethod::Manual),
            _ => None,
        }
    }

    /// Methods an owner may record by hand, outside the provider flow.
    pub fn is_offline(&self) -> bool {
        matches!(self, PaymentMethod::Cash | PaymentMethod::Manual)
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
