use std::time::Duration;

/// What an order is made of: how long it cooks, what it pays, and which
/// tools it picks up, in that order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recipe {
    pub name: String,
    pub prep_time: Duration,
    pub price: u32,
    pub resources: Vec<String>,
}

impl Recipe {
    pub fn new(name: impl Into<String>, prep_ms: u64, price: u32, resources: &[&str]) -> Self {
        Self {
            name: name.into(),
            prep_time: Duration::from_millis(prep_ms),
            price,
            resources: resources.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Same recipe under a different name and tool order.
    pub fn variant(&self, name: impl Into<String>, resources: Vec<String>) -> Self {
        Self {
            name: name.into(),
            resources,
            ..self.clone()
        }
    }
}

pub fn standard_menu() -> Vec<Recipe> {
    vec![
        Recipe::new("Super Burger", 5000, 50, &["Knife", "Stove"]),
        Recipe::new("Garden Salad", 3000, 30, &["Knife"]),
        Recipe::new("Pasta Deluxe", 7000, 80, &["Stove"]),
        Recipe::new("Mega Pizza", 8500, 100, &["Stove", "Knife"]),
        Recipe::new("Sushi Platter", 6500, 120, &["Knife"]),
    ]
}
