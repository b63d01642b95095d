//! Collaborator ports (traits) - interfaces to the world outside the core
//!
//! The coordination core defines what it needs from identity lookup and
//! message storage; infrastructure crates provide the implementations.

mod collaborators;

pub use collaborators::{CollabResult, IdentityDirectory, MessageStore};
