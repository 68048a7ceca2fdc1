use std::time::Duration;

use rush_hour_proto::{OrderState, OrderSummary};
use tokio::time::Instant;
use uuid::Uuid;

use crate::{errors::KitchenError, menu::Recipe, slots::SlotAllocator};

/// A unit of work that must hold a worker and a sequence of tools to cook.
#[derive(Clone, Debug)]
pub struct Order {
    id: Uuid,
    name: String,
    price: u32,
    prep_time: Duration,
    required: Vec<String>,
    held: Vec<String>,
    state: OrderState,
    vip: bool,
    worker_slot: Option<usize>,
    jammed: bool,
    created_at: Instant,
    seq: u64,
    started_at: Option<Instant>,
}

impl Order {
    fn new(recipe: &Recipe, vip: bool, seq: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: recipe.name.clone(),
            price: if vip { recipe.price * 2 } else { recipe.price },
            prep_time: recipe.prep_time,
            required: recipe.resources.clone(),
            held: Vec::new(),
            state: OrderState::Ready,
            vip,
            worker_slot: None,
            jammed: false,
            created_at: Instant::now(),
            seq,
            started_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> u32 {
        self.price
    }

    pub fn prep_time(&self) -> Duration {
        self.prep_time
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn held(&self) -> &[String] {
        &self.held
    }

    pub fn state(&self) -> OrderState {
        self.state
    }

    pub fn is_vip(&self) -> bool {
        self.vip
    }

    pub fn has_worker(&self) -> bool {
        self.worker_slot.is_some()
    }

    pub fn worker_slot(&self) -> Option<usize> {
        self.worker_slot
    }

    pub fn is_jammed(&self) -> bool {
        self.jammed
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Cooking progress in percent.
    pub fn progress(&self, now: Instant) -> f32 {
        match (self.state, self.started_at) {
            (OrderState::Active, Some(start)) if !self.prep_time.is_zero() => {
                let done = now.saturating_duration_since(start).as_secs_f32() / self.prep_time.as_secs_f32();
                (done * 100.0).min(100.0)
            }
            (state, _) if state.is_terminal() => 100.0,
            _ => 0.0,
        }
    }

    /// VIPs first, then oldest first.
    fn dispatch_key(&self) -> (bool, Instant, u64) {
        (!self.vip, self.created_at, self.seq)
    }

    pub fn summary(&self, now: Instant) -> OrderSummary {
        OrderSummary {
            id: self.id,
            name: self.name.clone(),
            state: self.state,
            vip: self.vip,
            price: self.price,
            required: self.required.clone(),
            held: self.held.clone(),
            worker_slot: self.worker_slot,
            jammed: self.jammed,
            progress: self.progress(now),
        }
    }

    /// Short form of the id for log lines.
    pub fn tag(&self) -> String {
        short_id(self.id)
    }
}

pub fn short_id(id: Uuid) -> String {
    id.to_string().split('-').next().unwrap_or("").to_string()
}

/// Every order the kitchen knows about, plus the worker slot arena.
///
/// All order mutation goes through here so that a state change and the
/// slot bookkeeping that goes with it happen in one step.
#[derive(Debug)]
pub struct OrderBook {
    orders: Vec<Order>,
    slots: SlotAllocator,
    next_seq: u64,
}

impl OrderBook {
    pub fn new(workers: usize) -> Self {
        Self {
            orders: Vec::new(),
            slots: SlotAllocator::new(workers),
            next_seq: 0,
        }
    }

    pub fn insert(&mut self, recipe: &Recipe, vip: bool) -> Order {
        let order = Order::new(recipe, vip, self.next_seq);
        self.next_seq += 1;
        self.orders.push(order.clone());
        order
    }

    pub fn get(&self, id: Uuid) -> Result<&Order, KitchenError> {
        self.orders
            .iter()
            .find(|o| o.id == id)
            .ok_or(KitchenError::OrderNotFound(id))
    }

    fn get_mut(&mut self, id: Uuid) -> Result<&mut Order, KitchenError> {
        self.orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(KitchenError::OrderNotFound(id))
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn stations(&self) -> Vec<Option<Uuid>> {
        self.slots.as_slice().to_vec()
    }

    /// The single commit point of a dispatch: `READY -> WAITING`.
    pub fn begin_dispatch(&mut self, id: Uuid) -> Result<&Order, KitchenError> {
        let order = self.get_mut(id)?;
        if order.state != OrderState::Ready {
            return Err(KitchenError::InvalidTransition { order: id, state: order.state });
        }
        order.state = OrderState::Waiting;
        Ok(&*order)
    }

    /// Undo a commit whose worker request could not even be made.
    pub fn abort_dispatch(&mut self, id: Uuid) {
        if let Ok(order) = self.get_mut(id)
            && order.state == OrderState::Waiting
            && order.worker_slot.is_none()
        {
            order.state = OrderState::Ready;
        }
    }

    /// Seat the order at the lowest free worker slot.
    pub fn assign_worker(&mut self, id: Uuid) -> Result<Option<usize>, KitchenError> {
        let order = self.orders.iter_mut().find(|o| o.id == id).ok_or(KitchenError::OrderNotFound(id))?;
        let index = self.slots.assign(id);
        order.worker_slot = index;
        Ok(index)
    }

    /// Free the order's worker slot. Returns false if it had none.
    pub fn release_worker(&mut self, id: Uuid) -> Result<bool, KitchenError> {
        let order = self.orders.iter_mut().find(|o| o.id == id).ok_or(KitchenError::OrderNotFound(id))?;
        let Some(index) = order.worker_slot.take() else {
            return Ok(false);
        };
        self.slots.release(index, id);
        Ok(true)
    }

    pub fn push_held(&mut self, id: Uuid, resource: &str) -> Result<(), KitchenError> {
        let order = self.get_mut(id)?;
        if !order.held.iter().any(|r| r == resource) {
            order.held.push(resource.to_string());
        }
        Ok(())
    }

    /// Empty the order's held list, most recently acquired first.
    pub fn take_held(&mut self, id: Uuid) -> Result<Vec<String>, KitchenError> {
        let order = self.get_mut(id)?;
        let mut held = std::mem::take(&mut order.held);
        held.reverse();
        Ok(held)
    }

    pub fn set_jammed(&mut self, id: Uuid, jammed: bool) -> Result<(), KitchenError> {
        self.get_mut(id)?.jammed = jammed;
        Ok(())
    }

    pub fn start_cooking(&mut self, id: Uuid, now: Instant) -> Result<(), KitchenError> {
        let order = self.get_mut(id)?;
        order.state = OrderState::Active;
        order.started_at = Some(now);
        Ok(())
    }

    pub fn set_state(&mut self, id: Uuid, state: OrderState) -> Result<(), KitchenError> {
        let order = self.get_mut(id)?;
        order.state = state;
        if state != OrderState::Active {
            order.started_at = None;
        }
        Ok(())
    }

    /// `READY` orders in dispatch order.
    pub fn ready(&self) -> Vec<&Order> {
        let mut ready: Vec<&Order> = self.orders.iter().filter(|o| o.state == OrderState::Ready).collect();
        ready.sort_by_key(|o| o.dispatch_key());
        ready
    }

    pub fn next_ready(&self) -> Option<Uuid> {
        self.orders
            .iter()
            .filter(|o| o.state == OrderState::Ready)
            .min_by_key(|o| o.dispatch_key())
            .map(|o| o.id)
    }

    /// Drop every `READY` order, returning their ids.
    pub fn clear_ready(&mut self) -> Vec<Uuid> {
        let removed = self
            .orders
            .iter()
            .filter(|o| o.state == OrderState::Ready)
            .map(|o| o.id)
            .collect();
        self.orders.retain(|o| o.state != OrderState::Ready);
        removed
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Order> {
        let pos = self.orders.iter().position(|o| o.id == id)?;
        Some(self.orders.remove(pos))
    }

    /// Orders that are not `READY`.
    pub fn in_flight(&self) -> usize {
        self.orders.iter().filter(|o| o.state != OrderState::Ready).count()
    }
}
