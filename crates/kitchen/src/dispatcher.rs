use std::sync::atomic::Ordering;

use rush_hour_proto::OrderState;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    errors::KitchenError,
    gate::{Acquire, Gate, GrantTicket},
    kitchen::Kitchen,
    order::short_id,
};

impl Kitchen {
    /// Send a `READY` order to the kitchen.
    ///
    /// Anything other than a `READY` order is rejected before any state
    /// changes. On success the order is `WAITING`, its worker request has
    /// been placed, and the rest runs on a spawned task.
    pub fn dispatch(&self, id: Uuid) -> Result<(), KitchenError> {
        if self.is_shut_down() {
            return Err(KitchenError::ShutDown);
        }

        let tag = self.book().begin_dispatch(id)?.tag();
        self.log().info(format!("Order #{} sent to the kitchen.", tag));

        // taken here rather than in the task so a free worker is
        // spoken for as soon as dispatch returns
        let worker = self.inner.pool.worker().acquire(id);

        let kitchen = self.clone();
        let shutdown = self.inner.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => debug!("dispatch of {} stopped by shutdown", tag),
                result = kitchen.drive(id, worker) => {
                    if let Err(e) = result {
                        error!("dispatch of order {} aborted: {}", tag, e);
                    }
                }
            }
        });
        Ok(())
    }

    async fn drive(&self, id: Uuid, worker: Acquire) -> Result<(), KitchenError> {
        if let Acquire::Queued(mut ticket) = worker {
            if let Err(e) = ticket.granted().await {
                self.book().abort_dispatch(id);
                return Err(e);
            }
        }

        let (tag, required, slot) = {
            let mut book = self.book();
            let slot = book.assign_worker(id)?;
            let order = book.get(id)?;
            (order.tag(), order.required().to_vec(), slot)
        };
        match slot {
            Some(slot) => self.log().info(format!("Chef {} assigned to #{}. Gathering tools...", slot, tag)),
            None => error!("order {} holds a worker unit but no slot is free", tag),
        }

        let mut pending = None;
        for (i, resource) in required.iter().enumerate() {
            if i > 0 && !self.inner.config.pickup_delay.is_zero() {
                sleep(self.inner.config.pickup_delay).await;
            }

            let gate = self.inner.pool.tool(resource)?;
            match self.acquire_within(gate, id, &mut pending).await {
                Ok(()) => {
                    self.book().push_held(id, resource)?;
                    self.log().info(format!("#{} picked up the {}.", tag, resource));
                }
                Err(jam @ KitchenError::JamTimeout { .. }) => {
                    return self.rollback(id, &tag, jam, pending).await;
                }
                Err(e) => return Err(e),
            }
        }

        self.book().start_cooking(id, Instant::now())?;
        self.log().important(format!("Station #{} is cooking!", tag));
        let prep_time = self.book().get(id)?.prep_time();
        sleep(prep_time).await;

        self.serve(id, &tag)?;

        sleep(self.inner.config.removal_delay).await;
        self.book().remove(id);
        debug!("order {} cleared away", tag);
        Ok(())
    }

    /// Race one tool request against the jam timeout. On timeout the
    /// still-queued ticket is parked in `pending` so a late handoff has
    /// somewhere to land until rollback settles it.
    async fn acquire_within(
        &self,
        gate: &Gate,
        id: Uuid,
        pending: &mut Option<GrantTicket>,
    ) -> Result<(), KitchenError> {
        let mut ticket = match gate.acquire(id) {
            Acquire::Granted => return Ok(()),
            Acquire::Queued(ticket) => ticket,
        };

        let after = self.inner.config.jam_timeout;
        let outcome = timeout(after, ticket.granted()).await;
        match outcome {
            Ok(granted) => granted,
            Err(_elapsed) => {
                debug!(gate = %gate.name(), requester = %ticket.requester(), "request timed out, keeping ticket for rollback");
                *pending = Some(ticket);
                Err(KitchenError::JamTimeout { resource: gate.name().to_string(), after })
            }
        }
    }

    /// Put a jammed order back in the queue holding nothing.
    async fn rollback(
        &self,
        id: Uuid,
        tag: &str,
        jam: KitchenError,
        pending: Option<GrantTicket>,
    ) -> Result<(), KitchenError> {
        self.book().set_jammed(id, true)?;
        self.log().danger(format!("STATION JAM on #{}! {}. Resetting station...", tag, jam));
        sleep(self.inner.config.jam_reset_delay).await;

        let required = self.book().get(id)?.required().to_vec();
        for resource in &required {
            let gate = self.inner.pool.tool(resource)?;
            if gate.cancel(id) {
                debug!("#{} withdrew its request for {}", tag, resource);
            } else if gate.holds(id) {
                // covers grants that landed after the timeout fired
                self.book().push_held(id, resource)?;
            }
        }
        drop(pending);

        self.release_all(id)?;
        {
            let mut book = self.book();
            book.set_jammed(id, false)?;
            book.set_state(id, OrderState::Ready)?;
        }
        self.log().info(format!("#{} is back in the queue.", tag));
        self.schedule();
        Ok(())
    }

    fn serve(&self, id: Uuid, tag: &str) -> Result<(), KitchenError> {
        self.release_all(id)?;
        let price = {
            let mut book = self.book();
            book.set_state(id, OrderState::Done)?;
            book.get(id)?.price()
        };

        self.inner.served.fetch_add(1, Ordering::SeqCst);
        self.inner.earnings.fetch_add(u64::from(price), Ordering::SeqCst);
        self.log().important(format!("Order #{} served! Earned ${}", tag, price));
        self.schedule();
        Ok(())
    }

    /// Release every tool the order holds and its worker, each exactly once.
    fn release_all(&self, id: Uuid) -> Result<(), KitchenError> {
        let held = self.book().take_held(id)?;
        for resource in held {
            if let Some(next) = self.inner.pool.tool(&resource)?.release(id)? {
                debug!("{} passed from {} to {}", resource, short_id(id), short_id(next));
            }
        }

        self.book().release_worker(id)?;
        let worker = self.inner.pool.worker();
        if worker.holds(id) {
            worker.release(id)?;
        }
        Ok(())
    }
}
