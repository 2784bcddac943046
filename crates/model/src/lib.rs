//! The boundary between a chat session and a remote assistant.
//!
//! This crate establishes a small protocol for the session controller to
//! talk to whatever endpoint answers the conversation, so that the
//! controller can switch between endpoints (or a fake one in tests)
//! without modifying the core codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod request;
mod transport;

pub use error::*;
pub use request::*;
pub use transport::*;
