//! Dispatch pipeline for newly created notification records.
//!
//! Each event runs once through
//! [`EventIntake`](intake::EventIntake) →
//! [`RecipientResolver`](resolver::RecipientResolver) →
//! [`MessageBuilder`](builder::MessageBuilder) →
//! [`Deliverer`](deliverer::Deliverer), orchestrated by
//! [`DispatchPipeline`](processor::DispatchPipeline).

pub mod builder;
pub mod deliverer;
pub mod intake;
pub mod processor;
pub mod resolver;
pub mod store;

pub use deliverer::PushSender;
pub use processor::DispatchPipeline;
pub use store::ProfileStore;
