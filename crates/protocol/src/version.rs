//! Protocol versioning for daemon IPC communication.
//!
//! # Version History
//!
//! | Version | Changes |
//! |---------|---------|
//! | 1 | Initial protocol version (status, shutdown) |
//! | 2 | Added `Toggle` request, `last_event` in status |
//!
//! # Breaking Changes (require PROTOCOL_VERSION bump)
//!
//! - Removing fields from request/response types
//! - Changing field types
//! - Renaming fields without `#[serde(alias)]`
//! - Removing enum variants
//!
//! New optional fields with `#[serde(default)]` and new variants are safe
//! without a bump. `MIN_SUPPORTED_VERSION` stays one behind so a freshly
//! upgraded CLI can still talk to a daemon started before the upgrade.

/// Current protocol version. Bump when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 2;

/// Minimum protocol version this build can communicate with.
pub const MIN_SUPPORTED_VERSION: u32 = 1;
