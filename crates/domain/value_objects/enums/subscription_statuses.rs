use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Pending,
    Active,
    Used,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Used => "used",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(SubscriptionStatus::Pending),
            "active" => Some(SubscriptionStatus::Active),
            "used" => Some(SubscriptionStatus::Used),
            "expired" => Some(SubscriptionStatus::Expired),
            "cancelled" => Some(SubscriptionStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Used | SubscriptionStatus::Expired | SubscriptionStatus::Cancelled
        )
    }

    /// Edges of the subscription lifecycle. Terminal states have none.
    pub fn can_transition_to(&self, next: SubscriptionStatus) -> bool {
        use SubscriptionStatus::*;

        matches!(
            (self, next),
            (Pending, Active) | (Pending, Cancelled) | (Active, Used) | (Active, Expired) | (Active, Cancelled)
        )
    }
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SubscriptionStatus; 5] = [
        SubscriptionStatus::Pending,
        SubscriptionStatus::Active,
        SubscriptionStatus::Used,
        SubscriptionStatus::Expired,
        SubscriptionStatus::Cancelled,
    ];

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for from in ALL.iter().filter(|status| status.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
    }

    #[test]
    fn pending_can_only_activate_or_cancel() {
        let allowed: Vec<_> = ALL
            .into_iter()
            .filter(|to| SubscriptionStatus::Pending.can_transition_to(*to))
            .collect();
        assert_eq!(
            allowed,
            vec![SubscriptionStatus::Active, SubscriptionStatus::Cancelled]
        );
    }

    #[test]
    fn active_can_be_consumed_expired_or_cancelled() {
        assert!(SubscriptionStatus::Active.can_transition_to(SubscriptionStatus::Used));
        assert!(SubscriptionStatus::Active.can_transition_to(SubscriptionStatus::Expired));
        assert!(SubscriptionStatus::Active.can_transition_to(SubscriptionStatus::Cancelled));
        assert!(!SubscriptionStatus::Active.can_transition_to(SubscriptionStatus::Pending));
    }

    #[test]
    fn parses_stored_values() {
        for status in ALL {
            assert_eq!(SubscriptionStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(SubscriptionStatus::from_str("canceled"), None);
    }
}
