//! Serialization of a selected response value.

use super::builder::ResponseBuilder;
use crate::definition::{MockDefinition, ResponseValue};
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, InvalidHeaderValue};
use hyper::{Response, StatusCode};

pub static APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid content type {content_type:?}: {source}")]
    ContentType {
        content_type: String,
        #[source]
        source: InvalidHeaderValue,
    },
}

/// Build the `200 OK` response for `value`.
///
/// An explicit content type on the definition always wins. Otherwise
/// structured values are sent as `application/json` and scalars carry no
/// content type.
pub fn emit(
    value: &ResponseValue,
    definition: &MockDefinition,
) -> Result<Response<Full<Bytes>>, EmitError> {
    let body = value.encode()?;
    let mut builder = ResponseBuilder::new(StatusCode::OK).body(body);

    if let Some(content_type) = definition.content_type() {
        let header =
            HeaderValue::from_str(content_type).map_err(|source| EmitError::ContentType {
                content_type: content_type.to_string(),
                source,
            })?;
        builder = builder.content_type(header);
    } else if value.is_structured() {
        builder = builder.content_type(APPLICATION_JSON.clone());
    }

    Ok(builder.build_full())
}
