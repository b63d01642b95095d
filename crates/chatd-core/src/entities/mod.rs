//! Domain entities

mod identity;
mod message;

pub use identity::{Credentials, Identity};
pub use message::ChatMessage;
