//! Order status state machine.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of a beer order.
///
/// Status transitions:
/// ```text
/// New ──┬──► Paid ──┬──► InProcess ──► Complete
///       │           │        │
///       ├───────────┼────────┘
///       │           │        │
///       └───────────┴────────┴──► Cancelled
/// ```
/// `New` may also go straight to `InProcess`. Staying put is always allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Order has been placed.
    #[default]
    New,

    /// Payment has been received.
    Paid,

    /// Order is being picked and shipped.
    InProcess,

    /// Order has been delivered (terminal state).
    Complete,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if an order in this status may be moved to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        *self == next
            || matches!(
                (self, next),
                (New, Paid | InProcess | Cancelled)
                    | (Paid, InProcess | Cancelled)
                    | (InProcess, Complete | Cancelled)
            )
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Complete | OrderStatus::Cancelled)
    }

    /// Returns the wire and column representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Paid => "PAID",
            OrderStatus::InProcess => "INPROCESS",
            OrderStatus::Complete => "COMPLETE",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(OrderStatus::New),
            "PAID" => Ok(OrderStatus::Paid),
            "INPROCESS" => Ok(OrderStatus::InProcess),
            "COMPLETE" => Ok(OrderStatus::Complete),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(DomainError::UnknownStatus(s.to_string())),
        }
    }
}
