//! Response construction: mock payloads and diagnostic bodies.

mod builder;
mod emitter;

pub use builder::{plain_text, ResponseBuilder, TEXT_PLAIN};
pub use emitter::{emit, EmitError, APPLICATION_JSON};
