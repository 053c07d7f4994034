//! bspwm-specific implementations.
//!
//! This module provides concrete backends for the
//! [`WindowManager`](crate::traits::WindowManager) and
//! [`EventSource`](crate::traits::EventSource) traits, powered by the
//! `bspc` command-line client.
//!
//! Nothing outside this module should reference bspwm directly.

pub mod events;
pub mod tree;
pub mod wm;
