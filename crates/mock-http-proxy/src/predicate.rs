//! Response selection by predicate evaluation.
//!
//! Every non-`default` key of a response table is a predicate template.
//! Keys are tried in declaration order; the first one that renders to a true
//! boolean selects its value. When none does, the `default` entry is used.

use crate::context::RequestContext;
use crate::definition::{ResponseTable, ResponseValue};
use crate::template::{parse_bool, Template, TemplateError};
use tracing::debug;

/// Neither a predicate nor a `default` entry matched the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("No mock matching")]
pub struct NoMatchingMock;

/// Render `expr` against `ctx` and interpret the output as a boolean.
pub fn evaluate_predicate(expr: &str, ctx: &RequestContext) -> Result<bool, TemplateError> {
    let rendered = Template::parse(expr)?.render(ctx)?;
    Ok(parse_bool(&rendered))
}

/// Pick the response value for a request.
///
/// A key that fails to parse or render counts as false and evaluation moves
/// on to the next key.
pub fn select_response<'a>(
    table: &'a ResponseTable,
    ctx: &RequestContext,
) -> Result<&'a ResponseValue, NoMatchingMock> {
    for (expr, value) in table.predicates() {
        match evaluate_predicate(expr, ctx) {
            Ok(true) => {
                debug!("Predicate matched: {}", expr);
                return Ok(value);
            }
            Ok(false) => {}
            Err(err) => debug!("Predicate {:?} failed: {}", expr, err),
        }
    }

    table.default_response().ok_or(NoMatchingMock)
}
