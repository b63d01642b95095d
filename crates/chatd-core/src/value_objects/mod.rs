//! Value objects - identifier newtypes used across the system

mod ids;

pub use ids::{ConnectionId, IdentityId, RoomName};
