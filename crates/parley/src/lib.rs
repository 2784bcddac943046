//! An out-of-the-box chat widget that talks to a remote assistant.
//!
//! The crate includes a CLI tool for chatting in the terminal. And you can
//! also use it as a library to bring a chat window into your own host apps,
//! rendering the transcript as HTML or as styled terminal text.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

pub mod render;
mod widget;

pub use parley_gemini_transport::{
    GeminiConfig, GeminiConfigBuilder, GeminiTransport,
};
pub use widget::{ChatWidget, ChatWidgetBuilder};

/// Re-exports of [`parley_core`] crate.
pub mod core {
    pub use parley_core::*;
}
