#![forbid(unsafe_code)]

//! Modifier keys and cursor icons.
//!
//! Modifiers are sampled on every pointer sample, so a held key can change
//! which strategies apply without changing the phase of the gesture.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Modifier keys held during a pointer or keyboard interaction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Command/Meta key.
        const CMD   = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

impl Modifiers {
    /// Alt held: reparenting is disabled for this sample.
    #[inline]
    pub const fn alt(self) -> bool {
        self.contains(Self::ALT)
    }

    /// Shift held: axis lock for moves, aspect lock for resizes.
    #[inline]
    pub const fn shift(self) -> bool {
        self.contains(Self::SHIFT)
    }
}

/// Cursor the canvas should display while a strategy is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorIcon {
    #[default]
    Default,
    Move,
    Reparent,
    NotPermitted,
    ResizeNs,
    ResizeEw,
    ResizeNwse,
    ResizeNesw,
}
