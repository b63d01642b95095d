//! # chatd-core
//!
//! Domain layer for the chat coordination core: identities, rooms, messages,
//! domain errors, and the collaborator ports the core talks to. This crate
//! has zero dependencies on infrastructure (web framework, storage, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{ChatMessage, Credentials, Identity};
pub use error::{CollaboratorError, DomainError};
pub use traits::{CollabResult, IdentityDirectory, MessageStore};
pub use value_objects::{ConnectionId, IdentityId, RoomName};
