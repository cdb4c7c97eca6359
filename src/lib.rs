//! # ride-relay
//!
//! Real-time ride-coordination relay. Keeps track of which drivers and
//! riders are connected, associates them with in-progress bookings and
//! routes ride events (location, status, arrival, completion,
//! cancellation, emergency stop) between the right parties. Delivery is
//! best effort; nothing is persisted or acknowledged.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket /ws, REST /api/v1)
//!     │
//!     ├── WS Handler (ws/)         REST Handlers (api/)
//!     │
//!     ├── Dispatcher (service/)
//!     │
//!     └── RelayState (domain/)
//!           ├── ConnectionRegistry
//!           ├── BookingSessions
//!           └── RoomRouter
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod service;
pub mod ws;
