//! Automation primitives for UI-flow verification
//!
//! This crate defines the seam between a scenario and the browser that runs it:
//! - [`AutomationPort`]: the five step primitives plus URL fragment readout
//! - [`ActionError`]: the failure taxonomy every backend reports through
//! - [`MemoryPage`]: a scripted in-memory page used to exercise flows without a browser

pub mod errors;
pub mod memory;
mod primitives;
pub mod types;

pub use errors::*;
pub use memory::{ClickEffect, Element, MemoryPage, MemoryPageBuilder, OptionItem};
pub use primitives::*;
pub use types::*;
