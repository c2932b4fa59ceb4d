//! Core logic – document model, geometry, and the section observer.
//!
//! Nothing in this module depends on any TUI or rendering crate.  Rendering
//! layers plug in through [`geometry::Surface`].

pub mod document;
pub mod geometry;
pub mod listener;
pub mod observer;
