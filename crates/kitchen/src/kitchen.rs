use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use rush_hour_proto::{BusyLevel, KitchenSnapshot, OrderState, OrderSummary};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::{
    config::KitchenConfig,
    errors::KitchenError,
    events::EventLog,
    menu::Recipe,
    order::{Order, OrderBook},
    pool::ResourcePool,
};

pub(crate) struct Shared {
    pub(crate) config: KitchenConfig,
    pub(crate) pool: ResourcePool,
    pub(crate) book: Mutex<OrderBook>,
    pub(crate) events: Mutex<EventLog>,
    pub(crate) auto_mode: AtomicBool,
    pub(crate) served: AtomicU64,
    pub(crate) earnings: AtomicU64,
    pub(crate) shutdown: CancellationToken,
}

/// Handle to one kitchen: its gates, its orders and everything that drives
/// them. Clones share the same kitchen.
///
/// Dispatching spawns tokio tasks, so the kitchen must be used from inside
/// a runtime. A current-thread runtime gives the cooperative, one step at a
/// time interleaving the allocation logic is written for.
#[derive(Clone)]
pub struct Kitchen {
    pub(crate) inner: Arc<Shared>,
}

impl Kitchen {
    pub fn new(config: KitchenConfig) -> Self {
        let pool = ResourcePool::from_config(&config);
        let mut events = EventLog::new(config.event_capacity);
        events.important("Kitchen is open for business!");

        Self {
            inner: Arc::new(Shared {
                book: Mutex::new(OrderBook::new(config.workers)),
                events: Mutex::new(events),
                pool,
                config,
                auto_mode: AtomicBool::new(false),
                served: AtomicU64::new(0),
                earnings: AtomicU64::new(0),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub(crate) fn book(&self) -> MutexGuard<'_, OrderBook> {
        self.inner.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn log(&self) -> MutexGuard<'_, EventLog> {
        self.inner.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.inner.config
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.inner.pool
    }

    /// Add an order for a menu item. Nothing is allocated until dispatch.
    pub fn create_order(&self, recipe: &str, vip: bool) -> Result<Order, KitchenError> {
        let recipe = self
            .inner
            .config
            .recipe(recipe)
            .ok_or_else(|| KitchenError::UnknownRecipe(recipe.to_string()))?
            .clone();
        self.create_custom_order(&recipe, vip)
    }

    /// Add an order for an ad hoc recipe. The order waits in `READY` even in
    /// auto mode; the assistant picks it up the next time a run finishes,
    /// jams, or auto mode is switched on.
    pub fn create_custom_order(&self, recipe: &Recipe, vip: bool) -> Result<Order, KitchenError> {
        self.inner.pool.validate(&recipe.resources)?;
        let order = self.book().insert(recipe, vip);
        self.log().info(format!(
            "New order: {}{}",
            order.name(),
            if order.is_vip() { " (VIP!)" } else { "" }
        ));
        Ok(order)
    }

    /// Current copy of an order.
    pub fn order(&self, id: Uuid) -> Result<Order, KitchenError> {
        self.book().get(id).cloned()
    }

    /// `READY` orders in the order they would be dispatched.
    pub fn queue(&self) -> Vec<Order> {
        self.book().ready().into_iter().cloned().collect()
    }

    pub fn served(&self) -> u64 {
        self.inner.served.load(Ordering::SeqCst)
    }

    pub fn earnings(&self) -> u64 {
        self.inner.earnings.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> KitchenSnapshot {
        let now = Instant::now();
        let (orders, stations, in_flight) = {
            let book = self.book();
            let mut orders: Vec<OrderSummary> = book.ready().iter().map(|o| o.summary(now)).collect();
            orders.extend(
                book.orders()
                    .iter()
                    .filter(|o| o.state() != OrderState::Ready)
                    .map(|o| o.summary(now)),
            );
            (orders, book.stations(), book.in_flight())
        };

        KitchenSnapshot {
            orders,
            gates: self.inner.pool.snapshot(),
            stations,
            events: self.log().entries(),
            auto_mode: self.is_auto_mode(),
            served: self.served(),
            earnings: self.earnings(),
            busy: BusyLevel::from_in_flight(in_flight),
        }
    }

    /// Stop every in-flight dispatch. The kitchen rejects new dispatches
    /// afterwards; build a new one to start over.
    ///
    /// Stopped runs keep whatever gate units they held, so the gates no
    /// longer add up once this returns. Read a final snapshot if needed,
    /// then drop the kitchen.
    pub fn shutdown(&self) {
        if !self.inner.shutdown.is_cancelled() {
            info!("kitchen shutting down");
            self.inner.shutdown.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rush_hour_proto::EventLevel;

    #[tokio::test]
    async fn create_order_validates_recipe_and_tools() {
        let kitchen = Kitchen::new(KitchenConfig::default());

        let order = kitchen.create_order("Super Burger", true).unwrap();
        assert_eq!(order.state(), OrderState::Ready);
        assert_eq!(order.price(), 100);
        assert_eq!(order.required(), ["Knife", "Stove"]);

        assert_eq!(
            kitchen.create_order("Fondue", false).unwrap_err(),
            KitchenError::UnknownRecipe("Fondue".into())
        );
        let odd = Recipe::new("Toast", 1000, 5, &["Toaster"]);
        assert_eq!(
            kitchen.create_custom_order(&odd, false).unwrap_err(),
            KitchenError::UnknownResource("Toaster".into())
        );
        assert_eq!(kitchen.queue().len(), 1);
    }

    fn double_boil() -> Recipe {
        Recipe::new("Double Boil", 1000, 10, &["Stove", "Stove"])
    }

    fn assert_untouched(kitchen: &Kitchen) {
        assert!(kitchen.queue().is_empty());
        for gate in kitchen.snapshot().gates {
            assert_eq!(gate.free, gate.capacity, "{} changed", gate.name);
            assert_eq!(gate.waiting, 0);
        }
    }

    #[tokio::test]
    async fn repeated_tool_is_rejected_on_a_single_unit_gate() {
        let kitchen = Kitchen::new(KitchenConfig::default());
        assert_eq!(kitchen.pool().tool("Stove").unwrap().capacity(), 1);

        assert_eq!(
            kitchen.create_custom_order(&double_boil(), false).unwrap_err(),
            KitchenError::DuplicateResource("Stove".into())
        );
        assert_untouched(&kitchen);
    }

    #[tokio::test]
    async fn repeated_tool_is_rejected_on_a_multi_unit_gate() {
        let config = KitchenConfig {
            tools: vec![("Stove".into(), 2), ("Knife".into(), 1)],
            ..KitchenConfig::default()
        };
        let kitchen = Kitchen::new(config);
        assert_eq!(kitchen.pool().tool("Stove").unwrap().capacity(), 2);

        assert_eq!(
            kitchen.create_custom_order(&double_boil(), true).unwrap_err(),
            KitchenError::DuplicateResource("Stove".into())
        );
        assert_untouched(&kitchen);
    }

    #[tokio::test]
    async fn creating_an_order_in_auto_mode_leaves_it_queued() {
        let kitchen = Kitchen::new(KitchenConfig::default());
        assert!(kitchen.toggle_auto_mode());

        let id = kitchen.create_order("Garden Salad", false).unwrap().id();
        assert_eq!(kitchen.order(id).unwrap().state(), OrderState::Ready);
        assert_eq!(kitchen.pool().worker().free(), 3);
        assert_eq!(kitchen.snapshot().order(id).unwrap().state, OrderState::Ready);
    }

    #[tokio::test]
    async fn snapshot_lists_gates_stations_and_events() {
        let kitchen = Kitchen::new(KitchenConfig::default());
        let plain = kitchen.create_order("Garden Salad", false).unwrap().id();
        let vip = kitchen.create_order("Pasta Deluxe", true).unwrap().id();

        let snap = kitchen.snapshot();
        assert_eq!(snap.orders.iter().map(|o| o.id).collect::<Vec<_>>(), vec![vip, plain]);
        assert_eq!(snap.order(vip).unwrap().price, 160);
        assert!(snap.order(Uuid::new_v4()).is_none());
        assert_eq!(snap.gate("Chef").unwrap().free, 3);
        assert_eq!(snap.gate("Stove").unwrap().capacity, 1);
        assert_eq!(snap.stations, vec![None, None, None]);
        assert_eq!(snap.busy, BusyLevel::Idle);
        assert!(!snap.auto_mode);
        assert_eq!(snap.events[0].level, EventLevel::Important);
        assert!(snap.events.iter().any(|e| e.message == "New order: Pasta Deluxe (VIP!)"));
    }

    #[tokio::test]
    async fn shutdown_rejects_further_dispatches() {
        let kitchen = Kitchen::new(KitchenConfig::default());
        let id = kitchen.create_order("Garden Salad", false).unwrap().id();

        kitchen.shutdown();
        assert!(kitchen.is_shut_down());
        assert_eq!(kitchen.dispatch(id).unwrap_err(), KitchenError::ShutDown);
        assert_eq!(kitchen.order(id).unwrap().state(), OrderState::Ready);
    }
}
