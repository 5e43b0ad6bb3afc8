//! Settlement events.
//!
//! Collaborators such as notifications or reporting subscribe to these through [`EventHooks`]. The APIs publish an
//! event only after the corresponding transaction has been committed.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
