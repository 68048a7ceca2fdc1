use tokio::time::sleep;
use tracing::debug;
use uuid::Uuid;

use crate::{errors::KitchenError, kitchen::Kitchen};

impl Kitchen {
    /// Rush hour: clear the queue, then send in two orders that need the
    /// same two tools in opposite order, one shortly after the other.
    ///
    /// If each grabs its first tool before either reaches for its second,
    /// both wait on each other until the jam timeout rolls them back.
    pub fn trigger_contention_scenario(&self) -> Result<(Uuid, Uuid), KitchenError> {
        let settings = &self.inner.config.contention;
        let template = self
            .inner
            .config
            .recipe(&settings.template)
            .ok_or_else(|| KitchenError::UnknownRecipe(settings.template.clone()))?;
        let (x, y) = settings.tools.clone();
        self.inner.pool.validate([&x, &y])?;

        self.log().danger("RUSH HOUR!");
        let cleared = self.book().clear_ready();
        if !cleared.is_empty() {
            debug!("rush hour cleared {} queued order(s)", cleared.len());
        }

        let first = template.variant("Conflict Burger-A", vec![x.clone(), y.clone()]);
        let second = template.variant("Conflict Burger-B", vec![y, x]);
        let (a, b) = {
            let mut book = self.book();
            (book.insert(&first, false).id(), book.insert(&second, false).id())
        };
        self.log().info(format!("New order: {}", first.name));
        self.log().info(format!("New order: {}", second.name));

        let kitchen = self.clone();
        let shutdown = self.inner.shutdown.clone();
        let first_delay = settings.first_delay;
        let gap = settings.second_delay.saturating_sub(first_delay);
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = async {
                    sleep(first_delay).await;
                    if let Err(e) = kitchen.dispatch(a) {
                        debug!("rush hour order A not dispatched: {}", e);
                    }
                    sleep(gap).await;
                    if let Err(e) = kitchen.dispatch(b) {
                        debug!("rush hour order B not dispatched: {}", e);
                    }
                } => {}
            }
        });

        Ok((a, b))
    }
}
