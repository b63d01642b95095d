//! # chatd-store
//!
//! In-process implementations of the collaborator ports defined in
//! `chatd-core`:
//!
//! - **Identity directory**: resolves handshake credentials to identities.
//!   [`TokenDirectory`] decodes self-describing tokens; [`StaticDirectory`]
//!   serves a fixed account table, mainly for tests.
//! - **Message store**: [`MemoryMessageStore`] keeps a bounded per-room
//!   history in memory.
//!
//! Both ports are async so a networked backend can replace these without
//! touching the coordination core.

pub mod directory;
pub mod messages;

pub use directory::{StaticDirectory, TokenDirectory};
pub use messages::MemoryMessageStore;
