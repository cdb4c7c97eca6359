//! WebSocket layer: upgrade handler, connection loop and inbound frames.
//!
//! The endpoint at `/ws` carries JSON frames shaped
//! `{"event": "<name>", "data": <payload>}` in both directions.

pub mod connection;
pub mod handler;
pub mod messages;
