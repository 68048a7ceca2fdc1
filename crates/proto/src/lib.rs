use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of an order as it moves through the kitchen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    /// Eligible for dispatch.
    Ready,
    /// Dispatched, still gathering a chef and tools.
    Waiting,
    /// Holding everything it needs and cooking.
    Active,
    /// Served, waiting to be cleared away.
    Done,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Ready => "READY",
            OrderState::Waiting => "WAITING",
            OrderState::Active => "ACTIVE",
            OrderState::Done => "DONE",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Done)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of a single order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: Uuid,
    pub name: String,
    pub state: OrderState,
    pub vip: bool,
    pub price: u32,
    /// Tools in acquisition order.
    pub required: Vec<String>,
    /// Tools currently granted to this order.
    pub held: Vec<String>,
    pub worker_slot: Option<usize>,
    pub jammed: bool,
    /// Cooking progress in percent, zero unless the order is active.
    pub progress: f32,
}

/// Read-only view of a gate's accounting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateInfo {
    pub name: String,
    pub capacity: usize,
    pub free: usize,
    pub waiting: usize,
}

impl GateInfo {
    /// Units currently handed out.
    pub fn in_use(&self) -> usize {
        self.capacity - self.free
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Important,
    Danger,
}

/// One line of the chronological event feed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventEntry {
    pub seq: u64,
    /// Milliseconds since the kitchen opened.
    pub at_ms: u64,
    pub level: EventLevel,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BusyLevel {
    Idle,
    Active,
    Busy,
}

impl BusyLevel {
    /// Classify the kitchen by the number of orders that are not `READY`.
    pub fn from_in_flight(in_flight: usize) -> Self {
        match in_flight {
            0 => BusyLevel::Idle,
            1 | 2 => BusyLevel::Active,
            _ => BusyLevel::Busy,
        }
    }
}

/// Everything a presentation layer needs to draw the kitchen.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KitchenSnapshot {
    /// `READY` orders first in dispatch order, then the in-flight ones.
    pub orders: Vec<OrderSummary>,
    /// The worker gate followed by the tool gates.
    pub gates: Vec<GateInfo>,
    /// Which order occupies each worker slot.
    pub stations: Vec<Option<Uuid>>,
    pub events: Vec<EventEntry>,
    pub auto_mode: bool,
    pub served: u64,
    pub earnings: u64,
    pub busy: BusyLevel,
}

impl KitchenSnapshot {
    pub fn order(&self, id: Uuid) -> Option<&OrderSummary> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn gate(&self, name: &str) -> Option<&GateInfo> {
        self.gates.iter().find(|g| g.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_state_serializes_in_upper_case() {
        let json = serde_json::to_string(&OrderState::Waiting).unwrap();
        assert_eq!(json, "\"WAITING\"");
        assert_eq!(OrderState::Done.to_string(), "DONE");
    }

    #[test]
    fn busy_level_thresholds() {
        assert_eq!(BusyLevel::from_in_flight(0), BusyLevel::Idle);
        assert_eq!(BusyLevel::from_in_flight(2), BusyLevel::Active);
        assert_eq!(BusyLevel::from_in_flight(3), BusyLevel::Busy);
    }

    #[test]
    fn gate_info_reports_units_in_use() {
        let info = GateInfo { name: "Chef".into(), capacity: 3, free: 1, waiting: 0 };
        assert_eq!(info.in_use(), 2);
    }
}
