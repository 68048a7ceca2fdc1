use std::sync::atomic::Ordering;

use tracing::{info, warn};

use crate::kitchen::Kitchen;

impl Kitchen {
    /// Flip auto mode. Turning it on immediately fills any free workers.
    pub fn toggle_auto_mode(&self) -> bool {
        let enabled = !self.inner.auto_mode.fetch_xor(true, Ordering::SeqCst);
        self.log().info(if enabled { "Assistant: On" } else { "Assistant: Off" });
        if enabled {
            self.schedule();
        }
        enabled
    }

    pub fn is_auto_mode(&self) -> bool {
        self.inner.auto_mode.load(Ordering::SeqCst)
    }

    /// In auto mode, dispatch `READY` orders (VIPs first, then oldest) for
    /// as long as a worker is free. Returns how many were started.
    pub(crate) fn schedule(&self) -> usize {
        if !self.is_auto_mode() || self.is_shut_down() {
            return 0;
        }

        let mut started = 0;
        while self.inner.pool.worker().free() > 0 {
            let Some(next) = self.book().next_ready() else {
                break;
            };
            // dispatch takes the worker unit synchronously, so the free
            // count drops before the next pass
            if let Err(e) = self.dispatch(next) {
                warn!("auto dispatch of order {} failed: {}", next, e);
                break;
            }
            started += 1;
        }

        if started > 0 {
            info!("assistant dispatched {} order(s)", started);
        }
        started
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rush_hour_proto::OrderState;
    use tokio::time::sleep;

    use crate::{config::KitchenConfig, kitchen::Kitchen, test_support::*};

    #[tokio::test(start_paused = true)]
    async fn vip_goes_first_once_a_worker_frees_up() {
        let config = KitchenConfig { workers: 1, ..KitchenConfig::default() };
        let kitchen = Kitchen::new(config);

        let first = kitchen.create_order("Garden Salad", false).unwrap().id();
        kitchen.dispatch(first).unwrap();

        let plain_a = kitchen.create_order("Pasta Deluxe", false).unwrap().id();
        let plain_b = kitchen.create_order("Pasta Deluxe", false).unwrap().id();
        let vip = kitchen.create_order("Pasta Deluxe", true).unwrap().id();

        assert!(kitchen.toggle_auto_mode());
        assert_eq!(kitchen.order(vip).unwrap().state(), OrderState::Ready);

        wait_for_state(&kitchen, first, OrderState::Done).await;
        sleep(Duration::from_millis(10)).await;

        assert_ne!(kitchen.order(vip).unwrap().state(), OrderState::Ready);
        assert_eq!(kitchen.order(plain_a).unwrap().state(), OrderState::Ready);
        assert_eq!(kitchen.order(plain_b).unwrap().state(), OrderState::Ready);

        // then oldest first among the rest
        wait_for_state(&kitchen, vip, OrderState::Done).await;
        sleep(Duration::from_millis(10)).await;
        assert_ne!(kitchen.order(plain_a).unwrap().state(), OrderState::Ready);
        assert_eq!(kitchen.order(plain_b).unwrap().state(), OrderState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn enabling_auto_mode_fills_every_free_worker() {
        let kitchen = Kitchen::new(KitchenConfig::default());
        let ids: Vec<_> = (0..5)
            .map(|_| kitchen.create_order("Garden Salad", false).unwrap().id())
            .collect();

        assert!(kitchen.toggle_auto_mode());
        assert_eq!(kitchen.pool().worker().free(), 0);
        assert_eq!(kitchen.pool().worker().waiting(), 0);
        let ready = ids
            .iter()
            .filter(|id| kitchen.order(**id).unwrap().state() == OrderState::Ready)
            .count();
        assert_eq!(ready, 2);

        for id in &ids {
            wait_for_state(&kitchen, *id, OrderState::Done).await;
        }
        assert_eq!(kitchen.served(), 5);
        assert_conserved(&kitchen);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_dispatch_still_works_in_auto_mode_and_toggle_flips_back() {
        let config = KitchenConfig { workers: 1, ..KitchenConfig::default() };
        let kitchen = Kitchen::new(config);
        let busy = kitchen.create_order("Pasta Deluxe", false).unwrap().id();
        kitchen.toggle_auto_mode();
        assert_eq!(kitchen.order(busy).unwrap().state(), OrderState::Waiting);

        let queued = kitchen.create_order("Garden Salad", false).unwrap().id();
        assert_eq!(kitchen.order(queued).unwrap().state(), OrderState::Ready);
        kitchen.dispatch(queued).unwrap();
        assert_eq!(kitchen.pool().worker().waiting(), 1);

        assert!(!kitchen.toggle_auto_mode());
        assert!(!kitchen.is_auto_mode());

        wait_for_state(&kitchen, queued, OrderState::Done).await;
        assert_conserved(&kitchen);
    }
}
