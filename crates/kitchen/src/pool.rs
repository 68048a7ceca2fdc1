use std::{collections::BTreeMap, sync::Arc};

use rush_hour_proto::GateInfo;

use crate::{config::KitchenConfig, errors::KitchenError, gate::Gate};

/// The fixed set of gates in the kitchen: one multi-unit worker gate and
/// a gate per tool. Membership never changes after construction.
#[derive(Clone, Debug)]
pub struct ResourcePool {
    worker: Arc<Gate>,
    tools: BTreeMap<String, Arc<Gate>>,
}

impl ResourcePool {
    pub fn new(worker: Gate, tools: impl IntoIterator<Item = Gate>) -> Self {
        let tools = tools
            .into_iter()
            .map(|g| (g.name().to_string(), Arc::new(g)))
            .collect();
        Self { worker: Arc::new(worker), tools }
    }

    pub fn from_config(config: &KitchenConfig) -> Self {
        Self::new(
            Gate::new(config.worker_gate.clone(), config.workers),
            config.tools.iter().map(|(name, cap)| Gate::new(name.clone(), *cap)),
        )
    }

    pub fn worker(&self) -> &Arc<Gate> {
        &self.worker
    }

    /// Look up a tool gate by name.
    pub fn tool(&self, name: &str) -> Result<&Arc<Gate>, KitchenError> {
        self.tools
            .get(name)
            .ok_or_else(|| KitchenError::UnknownResource(name.to_string()))
    }

    /// Check that every name refers to a tool gate, and that no tool is
    /// named twice. An order holds at most one unit of each tool.
    pub fn validate<'a>(&self, names: impl IntoIterator<Item = &'a String>) -> Result<(), KitchenError> {
        let mut seen: Vec<&str> = Vec::new();
        for name in names {
            self.tool(name)?;
            if seen.contains(&name.as_str()) {
                return Err(KitchenError::DuplicateResource(name.clone()));
            }
            seen.push(name);
        }
        Ok(())
    }

    pub fn tools(&self) -> impl Iterator<Item = &Arc<Gate>> {
        self.tools.values()
    }

    /// Worker gate first, then the tools by name.
    pub fn snapshot(&self) -> Vec<GateInfo> {
        std::iter::once(self.worker.info())
            .chain(self.tools.values().map(|g| g.info()))
            .collect()
    }
}
