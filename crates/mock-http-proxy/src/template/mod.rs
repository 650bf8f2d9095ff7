//! Predicate template language.
//!
//! A small, sandboxed subset of the `{{ ... }}` action syntax used by Go
//! templates: field access into the request context, literals, comparison
//! and logic functions, pipes and `if`/`else` blocks. There is no I/O, no
//! variables and no loops.
//!
//! Rendering a predicate happens in three stages, each usable on its own:
//!
//! 1. [`Template::parse`] turns the source into a syntax tree.
//! 2. [`Template::render`] executes it against a [`RequestContext`].
//! 3. [`parse_bool`] interprets the rendered text as a boolean.
//!
//! # Example
//!
//! ```
//! use mock_http_proxy::context::RequestContext;
//! use mock_http_proxy::template::{parse_bool, Template};
//!
//! let mut ctx = RequestContext::default();
//! ctx.query.insert("id".to_string(), "5".to_string());
//!
//! let template = Template::parse(r#"{{if eq .Query.id "5"}}true{{end}}"#).unwrap();
//! let rendered = template.render(&ctx).unwrap();
//! assert!(parse_bool(&rendered));
//! ```
//!
//! # Functions
//!
//! | Function | Meaning |
//! |----------|---------|
//! | `eq a b [c...]` | `a` equals any of the remaining arguments |
//! | `ne a b` | `a` differs from `b` |
//! | `lt` `le` `gt` `ge` | ordering of two numbers or two strings |
//! | `and` `or` | first falsy / truthy argument, or the last one |
//! | `not a` | boolean negation of `a`'s truthiness |
//! | `index x k...` | object key or array index lookup |
//! | `len x` | length of a string, array or object |

mod coerce;
mod exec;
mod funcs;
mod lexer;
mod parser;

use crate::context::RequestContext;
use std::fmt;
use std::str::FromStr;

pub use coerce::{is_true, parse_bool, to_text, try_parse_bool};
pub use funcs::Func;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error("template: {pos}: {message}")]
    Parse { pos: usize, message: String },
    #[error("template: executing: {0}")]
    Exec(#[from] ExecError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecError {
    #[error("can't evaluate field {0}")]
    InvalidField(String),
    #[error("wrong number of args for {func}: want {want} got {got}")]
    ArgCount {
        func: &'static str,
        want: String,
        got: usize,
    },
    #[error("incompatible types for comparison in {0}")]
    IncompatibleTypes(&'static str),
    #[error("non-comparable type in {0}")]
    NotComparable(&'static str),
    #[error("can't index item of type {0}")]
    CannotIndex(&'static str),
    #[error("index out of range: {0}")]
    IndexOutOfRange(String),
    #[error("len of type {0}")]
    NoLength(&'static str),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    nodes: Vec<parser::Node>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let tokens = lexer::lex(source)?;
        let nodes = parser::parse(tokens, source.len())?;
        Ok(Self {
            source: source.to_string(),
            nodes,
        })
    }

    pub fn render(&self, ctx: &RequestContext) -> Result<String, TemplateError> {
        let mut out = String::new();
        exec::render_nodes(&self.nodes, ctx, &mut out)?;
        Ok(out)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::parse(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and render in one step.
pub fn render(source: &str, ctx: &RequestContext) -> Result<String, TemplateError> {
    Template::parse(source)?.render(ctx)
}
