use std::time::Duration;

use crate::menu::{Recipe, standard_menu};

/// Settings for the contention ("rush hour") scenario.
#[derive(Clone, Debug)]
pub struct ContentionConfig {
    /// Menu entry both conflicting orders are cooked from.
    pub template: String,
    /// The two tools, requested as `[first, second]` by order A and
    /// `[second, first]` by order B.
    pub tools: (String, String),
    pub first_delay: Duration,
    pub second_delay: Duration,
}

impl Default for ContentionConfig {
    fn default() -> Self {
        Self {
            template: "Mega Pizza".to_string(),
            tools: ("Stove".to_string(), "Knife".to_string()),
            first_delay: Duration::from_millis(10),
            second_delay: Duration::from_millis(200),
        }
    }
}

#[derive(Clone, Debug)]
pub struct KitchenConfig {
    pub worker_gate: String,
    pub workers: usize,
    /// Tool gates by name and capacity.
    pub tools: Vec<(String, usize)>,
    pub menu: Vec<Recipe>,
    /// How long one tool request may wait before the station jams.
    pub jam_timeout: Duration,
    /// Pause between a jam and its rollback.
    pub jam_reset_delay: Duration,
    /// Time spent picking up a tool before reaching for the next one.
    pub pickup_delay: Duration,
    /// How long a served order stays visible.
    pub removal_delay: Duration,
    pub event_capacity: usize,
    pub contention: ContentionConfig,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            worker_gate: "Chef".to_string(),
            workers: 3,
            tools: vec![("Stove".to_string(), 1), ("Knife".to_string(), 1)],
            menu: standard_menu(),
            jam_timeout: Duration::from_secs(10),
            jam_reset_delay: Duration::from_millis(1500),
            pickup_delay: Duration::from_millis(300),
            removal_delay: Duration::from_millis(1500),
            event_capacity: 200,
            contention: ContentionConfig::default(),
        }
    }
}

impl KitchenConfig {
    pub fn recipe(&self, name: &str) -> Option<&Recipe> {
        self.menu.iter().find(|r| r.name == name)
    }
}
