//! # chatd-gateway
//!
//! WebSocket transport in front of the presence coordination core. One
//! endpoint, `/ws`; JSON frames in both directions.

pub mod protocol;
pub mod server;

pub use protocol::ClientMessage;
pub use server::{create_app, create_gateway_state, run, GatewayError, GatewayState};
