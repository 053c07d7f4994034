//! Commands and ids used throughout dapper.
//!
//! This module defines the vocabulary that all components share:
//! [`AppCommand`] is what a client asks for, [`WmEvent`] is what the window
//! manager reports, and [`NodeId`] / [`DesktopId`] / [`DesktopInfo`] are the
//! window-manager handles the binding state is keyed on.
//!
//! bspwm prints ids in two different bases: the event feed uses base 16
//! (`0x00C00003`), JSON query responses use base 10 (`12582915`).  Both
//! parse into the same typed value, so a window seen in the feed and the
//! same window seen in a tree dump compare equal.

use serde::Deserialize;
use std::fmt;

/// Desktop descriptor that bspwm resolves to the currently focused desktop.
pub const FOCUSED_DESKTOP: &str = "focused";

/// Flag that turns a focus/launch request into a pull.
pub const PULL_FLAG: &str = "--pull";

macro_rules! wm_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Parse a base-16 id as printed by the event feed.
            ///
            /// The `0x` prefix is optional.
            pub fn from_hex(s: &str) -> Option<Self> {
                let digits = s
                    .strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .unwrap_or(s);
                u32::from_str_radix(digits, 16).ok().map(Self)
            }

            /// Parse a base-10 id as found in JSON query responses.
            pub fn from_dec(s: &str) -> Option<Self> {
                s.parse::<u32>().ok().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{:08X}", self.0)
            }
        }
    };
}

wm_id!(
    /// A window (leaf node) id.
    NodeId
);

wm_id!(
    /// A desktop id.
    DesktopId
);

/// A parsed client request.
///
/// The wire form is `<app> [--pull]`, tokenised on single spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCommand {
    /// Name of the configured app.
    pub app: String,
    /// Bring the app's windows to the focused desktop instead of going to
    /// the app's desktop.
    pub pull: bool,
}

impl AppCommand {
    /// Parse a raw client message.
    ///
    /// Returns `None` for an empty message.  Tokens after the second one are
    /// ignored, as is a second token other than `--pull`.
    pub fn parse(message: &str) -> Option<Self> {
        let mut tokens = message.split(' ');
        let app = tokens.next().filter(|t| !t.is_empty())?;
        let pull = tokens.next() == Some(PULL_FLAG);
        Some(Self {
            app: app.to_string(),
            pull,
        })
    }

    /// The desktop the app's windows are gathered onto.
    pub fn target_desktop(&self) -> &str {
        if self.pull {
            FOCUSED_DESKTOP
        } else {
            &self.app
        }
    }
}

impl fmt::Display for AppCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pull {
            write!(f, "{} {}", self.app, PULL_FLAG)
        } else {
            write!(f, "{}", self.app)
        }
    }
}

/// A window-manager lifecycle event the daemon reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmEvent {
    /// A window appeared on `desktop`.
    NodeAdd { desktop: DesktopId, node: NodeId },
    /// A window was destroyed.
    NodeRemove { node: NodeId },
    /// A desktop was removed.
    DesktopRemove { desktop: DesktopId },
}

/// A desktop known to the window manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopInfo {
    pub id: DesktopId,
    /// Display name, unique per window manager in practice.
    pub name: String,
    /// Windows on this desktop, in pre-order of its layout tree.
    pub windows: Vec<NodeId>,
}
