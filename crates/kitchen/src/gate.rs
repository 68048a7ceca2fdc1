use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rush_hour_proto::GateInfo;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

use crate::errors::KitchenError;

#[derive(Debug)]
struct Waiter {
    requester: Uuid,
    responder: oneshot::Sender<()>,
}

#[derive(Debug)]
struct GateState {
    free: usize,
    /// One entry per unit handed out. `free + holders.len() == capacity`.
    holders: Vec<Uuid>,
    waiters: VecDeque<Waiter>,
}

/// Outcome of [`Gate::acquire`].
#[derive(Debug)]
pub enum Acquire {
    /// A free unit was taken on the spot.
    Granted,
    /// No unit was free; the request sits at the tail of the wait queue.
    Queued(GrantTicket),
}

/// A queued request. Resolves once a releaser hands its unit over.
#[must_use = "a queued request keeps its place in line until cancelled"]
#[derive(Debug)]
pub struct GrantTicket {
    requester: Uuid,
    rx: oneshot::Receiver<()>,
}

impl GrantTicket {
    pub fn requester(&self) -> Uuid {
        self.requester
    }

    /// Wait for the handoff. Fails only if the gate dropped the request
    /// without granting it.
    pub async fn granted(&mut self) -> Result<(), KitchenError> {
        (&mut self.rx).await.map_err(|_| KitchenError::ShutDown)
    }
}

/// A counting semaphore with a FIFO wait queue and explicit cancellation.
///
/// Every mutation happens under one lock, so a handoff in [`Gate::release`]
/// and a [`Gate::cancel`] for the same request can never both succeed.
#[derive(Debug)]
pub struct Gate {
    name: String,
    capacity: usize,
    state: Mutex<GateState>,
}

impl Gate {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        assert!(capacity > 0, "gate capacity must be positive");
        Self {
            name: name.into(),
            capacity,
            state: Mutex::new(GateState {
                free: capacity,
                holders: Vec::with_capacity(capacity),
                waiters: VecDeque::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn free(&self) -> usize {
        self.lock().free
    }

    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    pub fn held_count(&self) -> usize {
        self.lock().holders.len()
    }

    /// Whether `requester` currently holds a unit of this gate.
    pub fn holds(&self, requester: Uuid) -> bool {
        self.lock().holders.contains(&requester)
    }

    /// Take a unit if one is free, otherwise join the back of the queue.
    pub fn acquire(&self, requester: Uuid) -> Acquire {
        let mut state = self.lock();
        if state.free > 0 {
            state.free -= 1;
            state.holders.push(requester);
            debug!(gate = %self.name, %requester, "unit granted");
            return Acquire::Granted;
        }

        let (tx, rx) = oneshot::channel();
        state.waiters.push_back(Waiter { requester, responder: tx });
        debug!(gate = %self.name, %requester, waiting = state.waiters.len(), "request queued");
        Acquire::Queued(GrantTicket { requester, rx })
    }

    /// Withdraw a pending request. Returns false if the request is not
    /// queued, either because it was already granted or never made.
    pub fn cancel(&self, requester: Uuid) -> bool {
        let mut state = self.lock();
        match state.waiters.iter().position(|w| w.requester == requester) {
            Some(pos) => {
                state.waiters.remove(pos);
                debug!(gate = %self.name, %requester, "request cancelled");
                true
            }
            None => false,
        }
    }

    /// Give back the unit held by `requester`.
    ///
    /// The unit goes straight to the longest waiter if there is one, and
    /// only returns to the free count when nobody is waiting. Returns the
    /// requester that received the handoff.
    pub fn release(&self, requester: Uuid) -> Result<Option<Uuid>, KitchenError> {
        let mut state = self.lock();
        let pos = state
            .holders
            .iter()
            .position(|h| *h == requester)
            .ok_or_else(|| KitchenError::NotHeld {
                resource: self.name.clone(),
                order: requester,
            })?;
        state.holders.swap_remove(pos);

        while let Some(waiter) = state.waiters.pop_front() {
            if waiter.responder.send(()).is_ok() {
                state.holders.push(waiter.requester);
                debug!(gate = %self.name, from = %requester, to = %waiter.requester, "unit handed off");
                return Ok(Some(waiter.requester));
            }
            // ticket dropped without cancelling, its run is gone
            debug!(gate = %self.name, requester = %waiter.requester, "skipping abandoned request");
        }

        state.free += 1;
        Ok(None)
    }

    pub fn info(&self) -> GateInfo {
        let state = self.lock();
        GateInfo {
            name: self.name.clone(),
            capacity: self.capacity,
            free: state.free,
            waiting: state.waiters.len(),
        }
    }
}
