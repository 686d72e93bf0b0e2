//! Integration tests for battle recording.
//!
//! These tests drive the whole stack the way a simulation does: events go
//! through a dispatcher to the recorder, the manager spools them, and
//! records are exported, imported and replayed from real files.

#[path = "../common/mod.rs"]
mod common;

mod formats;
mod lifecycle;
mod recovery;
