//! Application-level orchestration.
//!
//! This module owns the sequence controller task and the scoped tick timer it drives.
//! UI/CLI layers talk to it only through [`UiCommand`] and `TimerEvent` channels.

mod controller;
mod ticker;

pub(crate) use controller::{run_controller, UiCommand};
