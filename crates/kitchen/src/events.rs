use std::collections::VecDeque;

use rush_hour_proto::{EventEntry, EventLevel};
use tokio::time::Instant;
use tracing::{info, warn};

/// Bounded chronological feed of what happened in the kitchen.
///
/// Every entry is mirrored to `tracing` as it is recorded.
#[derive(Debug)]
pub struct EventLog {
    opened_at: Instant,
    next_seq: u64,
    capacity: usize,
    entries: VecDeque<EventEntry>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            opened_at: Instant::now(),
            next_seq: 0,
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, level: EventLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            EventLevel::Danger => warn!("{}", message),
            _ => info!("{}", message),
        }

        self.entries.push_back(EventEntry {
            seq: self.next_seq,
            at_ms: self.opened_at.elapsed().as_millis() as u64,
            level,
            message,
        });
        self.next_seq += 1;

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(EventLevel::Info, message);
    }

    pub fn important(&mut self, message: impl Into<String>) {
        self.push(EventLevel::Important, message);
    }

    pub fn danger(&mut self, message: impl Into<String>) {
        self.push(EventLevel::Danger, message);
    }

    /// Oldest first.
    pub fn entries(&self) -> Vec<EventEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keeps_order_and_drops_oldest_past_capacity() {
        let mut log = EventLog::new(2);
        log.info("one");
        log.important("two");
        log.danger("three");

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "two");
        assert_eq!(entries[0].level, EventLevel::Important);
        assert_eq!(entries[1].message, "three");
        assert_eq!(entries[1].seq, 2);
    }
}
