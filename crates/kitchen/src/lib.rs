//! Resource-gate core of the rush-hour kitchen.
//!
//! Orders need a chef (one unit of a multi-unit worker gate) and a sequence
//! of single-unit tools before they can cook. Every gate hands units out
//! first come, first served; a tool request that waits too long jams the
//! station, which rolls the order back to the queue holding nothing.

pub mod config;
pub mod contention;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod gate;
pub mod kitchen;
pub mod menu;
pub mod order;
pub mod pool;
pub mod scheduler;
pub mod slots;

pub use config::{ContentionConfig, KitchenConfig};
pub use errors::KitchenError;
pub use gate::{Acquire, Gate, GrantTicket};
pub use kitchen::Kitchen;
pub use menu::{Recipe, standard_menu};
pub use order::Order;
pub use pool::ResourcePool;
pub use rush_hour_proto::{KitchenSnapshot, OrderState};

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use rush_hour_proto::OrderState;

    use crate::{errors::KitchenError, kitchen::Kitchen};

    /// Poll until the order reaches `state`, giving up after a minute of
    /// (paused) time. A served order that was already cleared away counts
    /// as `DONE`.
    pub(crate) async fn wait_for_state(kitchen: &Kitchen, id: uuid::Uuid, state: OrderState) {
        for _ in 0..6000 {
            match kitchen.order(id) {
                Ok(order) if order.state() == state => return,
                Err(KitchenError::OrderNotFound(_)) if state == OrderState::Done => return,
                Err(e) => panic!("order {} vanished while waiting for {}: {}", id, state, e),
                Ok(_) => tokio::time::sleep(Duration::from_millis(10)).await,
            }
        }
        panic!("order {} never reached {}", id, state);
    }

    /// Gate accounting holds and no order claims more than the gates hand out.
    pub(crate) fn assert_conserved(kitchen: &Kitchen) {
        let pool = kitchen.pool();
        let worker = pool.worker();
        assert_eq!(worker.free() + worker.held_count(), worker.capacity(), "worker gate");

        let orders = kitchen.snapshot().orders;
        let seated = orders.iter().filter(|o| o.worker_slot.is_some()).count();
        assert!(seated <= worker.held_count(), "more seated orders than chefs handed out");

        for gate in pool.tools() {
            assert_eq!(gate.free() + gate.held_count(), gate.capacity(), "{}", gate.name());
            let claimed = orders
                .iter()
                .filter(|o| o.held.iter().any(|r| r == gate.name()))
                .count();
            assert!(claimed <= gate.held_count(), "{} claimed by {} orders", gate.name(), claimed);
        }
    }
}
