//! Mock HTTP proxy.
//!
//! Answers requests from a directory of mock definitions and forwards
//! everything that no definition claims to the original destination.
//!
//! # Request flow
//!
//! 1. [`context::RequestContext`] is built from the inbound request.
//! 2. [`definition::DefinitionStore`] is scanned and [`matcher`] picks the
//!    first definition whose method and URL match.
//! 3. [`predicate`] renders each response key as a [`template`] and selects
//!    the first one that evaluates to `true`, or the `default` entry.
//! 4. [`response`] encodes the selected value.
//! 5. Without a usable definition, [`proxy`] forwards the request verbatim.

pub mod config;
pub mod context;
pub mod definition;
pub mod matcher;
pub mod predicate;
pub mod proxy;
pub mod response;
pub mod template;

pub use config::Config;
pub use context::RequestContext;
pub use definition::{DefinitionStore, MockDefinition, ResponseTable, ResponseValue};
pub use proxy::MockServer;
