use std::time::Duration;

use rush_hour_proto::OrderState;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in the kitchen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KitchenError {
    #[error("order {order} cannot be dispatched while {state}")]
    InvalidTransition { order: Uuid, state: OrderState },

    #[error("order {order} does not hold a unit of {resource}")]
    NotHeld { resource: String, order: Uuid },

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("resource listed more than once: {0}")]
    DuplicateResource(String),

    #[error("unknown recipe: {0}")]
    UnknownRecipe(String),

    #[error("order not found: {0}")]
    OrderNotFound(Uuid),

    /// Recoverable: handled inside the dispatcher by rolling the order back.
    #[error("timed out after {after:?} waiting for {resource}")]
    JamTimeout { resource: String, after: Duration },

    #[error("kitchen has shut down")]
    ShutDown,
}
