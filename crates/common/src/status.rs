//! Externally visible order lifecycle.

use serde::{Deserialize, Serialize};

/// The processing outcome of one admitted order.
///
/// State transitions:
/// ```text
/// Processing ──┬──► Successful
///              └──► Unsuccessful
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Admitted; the saga has not reached a terminal step yet.
    #[default]
    Processing,

    /// Remote order confirmed and offer accepted (terminal state).
    Successful,

    /// Some saga step failed (terminal state).
    Unsuccessful,
}

impl OrderStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Successful | OrderStatus::Unsuccessful)
    }

    /// Returns true if a record in this state may be rewritten as `next`.
    ///
    /// `Processing` may be rewritten as anything (including itself, when the
    /// saga persists an updated snapshot); terminal states are final.
    pub fn can_transition_to(&self, _next: OrderStatus) -> bool {
        !self.is_terminal()
    }

    /// Returns the wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "processing",
            OrderStatus::Successful => "successful",
            OrderStatus::Unsuccessful => "unsuccessful",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(OrderStatus::Processing),
            "successful" => Ok(OrderStatus::Successful),
            "unsuccessful" => Ok(OrderStatus::Unsuccessful),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_processing() {
        assert_eq!(OrderStatus::default(), OrderStatus::Processing);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(OrderStatus::Successful.is_terminal());
        assert!(OrderStatus::Unsuccessful.is_terminal());
    }

    #[test]
    fn test_transitions() {
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Successful));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Unsuccessful));
        assert!(!OrderStatus::Successful.can_transition_to(OrderStatus::Unsuccessful));
        assert!(!OrderStatus::Successful.can_transition_to(OrderStatus::Successful));
        assert!(!OrderStatus::Unsuccessful.can_transition_to(OrderStatus::Processing));
    }

    #[test]
    fn test_display_and_parse() {
        for status in [
            OrderStatus::Processing,
            OrderStatus::Successful,
            OrderStatus::Unsuccessful,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("done".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&OrderStatus::Unsuccessful).unwrap();
        assert_eq!(json, "\"unsuccessful\"");
        let deserialized: OrderStatus = serde_json::from_str("\"successful\"").unwrap();
        assert_eq!(deserialized, OrderStatus::Successful);
    }
}
