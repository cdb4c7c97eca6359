//! Service layer: relay protocol orchestration.
//!
//! [`Dispatcher`] interprets inbound events, updates the relay tables
//! and routes outbound events to the right channels.

pub mod dispatcher;

pub use dispatcher::Dispatcher;
