//! formulary: a terminal client for browsing formula records.
//!
//! The binary in `main.rs` wires these modules together; they are exposed
//! as a library so integration tests can drive the view controller with
//! fake collaborators.

pub mod app;
pub mod config;
pub mod feed;
pub mod identity;
pub mod records;
pub mod storage;
pub mod theme;
pub mod ui;
pub mod util;
