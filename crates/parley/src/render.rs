//! Renderers that turn a transcript into something to look at.
//!
//! Both renderers go through the allow-list in
//! [`Markup`](parley_core::Markup), so nothing the assistant says can inject
//! markup of its own.

pub mod html;
pub mod terminal;
