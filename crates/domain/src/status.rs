//! Order and item status state machines.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// ```text
/// pending ──► preparing ──► ready ──► served ──► completed
///    │            │           │
///    └────────────┴───────────┴──► cancelled
/// ```
///
/// `completed` and `cancelled` are terminal. Every mutation path consults
/// the same transition table, so no entry point can bypass the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order has been taken, nothing sent to the kitchen yet.
    #[default]
    Pending,

    /// Kitchen is working on the order.
    Preparing,

    /// All dishes are ready to be brought out.
    Ready,

    /// Food is on the table.
    Served,

    /// Service finished (terminal).
    Completed,

    /// Order was cancelled before being served (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns the statuses this one may legally transition to.
    pub fn allowed_next(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Preparing, OrderStatus::Cancelled],
            OrderStatus::Preparing => &[OrderStatus::Ready, OrderStatus::Cancelled],
            OrderStatus::Ready => &[OrderStatus::Served, OrderStatus::Cancelled],
            OrderStatus::Served => &[OrderStatus::Completed],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    /// Returns true if `requested` is a legal next status.
    ///
    /// Requesting the current status is not legal: callers must be explicit,
    /// and a no-op "transition" would mask a lost race as success.
    pub fn can_transition_to(self, requested: OrderStatus) -> bool {
        self.allowed_next().contains(&requested)
    }

    /// Returns true if no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Returns the status name as used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Served => "served",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The status of a single order line as it moves through the kitchen.
///
/// Mirrors the order lifecycle without the `completed`/`cancelled` states;
/// a line that has been served has nothing left to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Served,
}

impl ItemStatus {
    /// Returns the statuses this one may legally transition to.
    pub fn allowed_next(self) -> &'static [ItemStatus] {
        match self {
            ItemStatus::Pending => &[ItemStatus::Preparing],
            ItemStatus::Preparing => &[ItemStatus::Ready],
            ItemStatus::Ready => &[ItemStatus::Served],
            ItemStatus::Served => &[],
        }
    }

    /// Returns true if `requested` is a legal next status.
    pub fn can_transition_to(self, requested: ItemStatus) -> bool {
        self.allowed_next().contains(&requested)
    }

    /// Returns true if no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemStatus::Served)
    }

    /// Returns the status name as used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Preparing => "preparing",
            ItemStatus::Ready => "ready",
            ItemStatus::Served => "served",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_statuses_are_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(ItemStatus::default(), ItemStatus::Pending);
    }

    #[test]
    fn order_transition_table() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Preparing));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Preparing.can_transition_to(Ready));
        assert!(Preparing.can_transition_to(Cancelled));
        assert!(Ready.can_transition_to(Served));
        assert!(Ready.can_transition_to(Cancelled));
        assert!(Served.can_transition_to(Completed));

        // No skipping ahead, no moving backwards.
        assert!(!Pending.can_transition_to(Ready));
        assert!(!Pending.can_transition_to(Served));
        assert!(!Served.can_transition_to(Preparing));
        assert!(!Served.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Served));
    }

    #[test]
    fn requesting_current_status_is_rejected() {
        use OrderStatus::*;
        for status in [Pending, Preparing, Ready, Served, Completed, Cancelled] {
            assert!(!status.can_transition_to(status));
        }
        for status in [
            ItemStatus::Pending,
            ItemStatus::Preparing,
            ItemStatus::Ready,
            ItemStatus::Served,
        ] {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn terminal_statuses_allow_nothing() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Completed.allowed_next().is_empty());
        assert!(OrderStatus::Cancelled.allowed_next().is_empty());
        assert!(!OrderStatus::Served.is_terminal());
    }

    #[test]
    fn item_transition_table() {
        use ItemStatus::*;

        assert!(Pending.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Served));
        assert!(Served.allowed_next().is_empty());
        assert!(Served.is_terminal());

        assert!(!Pending.can_transition_to(Ready));
        assert!(!Ready.can_transition_to(Preparing));
    }

    #[test]
    fn status_serialization_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Preparing).unwrap(),
            "\"preparing\""
        );
        assert_eq!(
            serde_json::to_string(&ItemStatus::Served).unwrap(),
            "\"served\""
        );

        let status: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
    }

    #[test]
    fn display_matches_wire_form() {
        assert_eq!(OrderStatus::Ready.to_string(), "ready");
        assert_eq!(ItemStatus::Preparing.to_string(), "preparing");
    }
}
