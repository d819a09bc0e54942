#![forbid(unsafe_code)]

//! Core: canvas geometry, element paths, and modifier keys.
//!
//! # Role in Gesso
//! `gesso-core` is the leaf crate. Every other crate addresses elements with
//! [`ElementPath`], measures them with [`CanvasRect`], and reads held keys from
//! [`Modifiers`].

pub mod element_path;
pub mod geometry;
pub mod modifiers;

pub use element_path::{ElementPath, ElementPathParseError, unique_element_paths};
pub use geometry::{CanvasPoint, CanvasRect, CanvasVector, MaybeInfiniteRect, offset_point};
pub use modifiers::{CursorIcon, Modifiers};
