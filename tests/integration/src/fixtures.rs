//! Test fixtures
//!
//! A fixed account table used across the integration tests.

use chatd_store::StaticDirectory;

/// Token resolving to the `u-alice` account
pub const ALICE_TOKEN: &str = "tok-alice";

/// Token resolving to the `u-bob` account
pub const BOB_TOKEN: &str = "tok-bob";

/// Token resolving to the `u-carol` account
pub const CAROL_TOKEN: &str = "tok-carol";

/// Token no account is registered under
pub const UNKNOWN_TOKEN: &str = "tok-nobody";

/// Directory with the three standard test accounts
pub fn standard_directory() -> StaticDirectory {
    StaticDirectory::new()
        .with_account(ALICE_TOKEN, "u-alice", "alice")
        .with_account(BOB_TOKEN, "u-bob", "bob")
        .with_account(CAROL_TOKEN, "u-carol", "carol")
}
