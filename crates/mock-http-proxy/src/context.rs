//! Request context exposed to response predicates.

use hyper::{HeaderMap, Uri};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Read-only view of the inbound request used when rendering predicates.
///
/// Templates reach it through the roots `.Body`, `.Query` and `.Header`
/// (lowercase spellings are accepted too).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    /// Request body decoded as a JSON object; empty when absent or not an object
    pub body: Map<String, Value>,
    /// First value of each query parameter
    pub query: HashMap<String, String>,
    /// First value of each header, keyed by canonical name (`Content-Type`)
    pub header: HashMap<String, String>,
}

impl RequestContext {
    /// Build the context from request parts and the already collected body.
    pub fn from_parts(uri: &Uri, headers: &HeaderMap, body: &[u8]) -> Self {
        Self {
            body: decode_body(body),
            query: parse_query_string(uri.query()),
            header: first_header_values(headers),
        }
    }

    /// Resolve a field chain such as `["Query", "id"]`.
    ///
    /// Missing query parameters and headers resolve to an empty string,
    /// missing body fields to `null`. Returns `None` when the chain descends
    /// into something that is not an object, or the root is unknown.
    pub fn resolve(&self, path: &[String]) -> Option<Value> {
        let (root, rest) = match path.split_first() {
            Some(split) => split,
            None => return Some(self.to_value()),
        };

        match root.as_str() {
            "Body" | "body" => {
                let Some((first, tail)) = rest.split_first() else {
                    return Some(Value::Object(self.body.clone()));
                };
                let mut current = self.body.get(first.as_str());
                for segment in tail {
                    current = match current {
                        None | Some(Value::Null) => None,
                        Some(Value::Object(map)) => map.get(segment.as_str()),
                        Some(_) => return None,
                    };
                }
                Some(current.cloned().unwrap_or(Value::Null))
            }
            "Query" | "query" => resolve_string_map(&self.query, rest),
            "Header" | "header" => resolve_string_map(&self.header, rest),
            _ => None,
        }
    }

    /// The whole context as a JSON object.
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        root.insert("Body".to_string(), Value::Object(self.body.clone()));
        root.insert("Query".to_string(), string_map_value(&self.query));
        root.insert("Header".to_string(), string_map_value(&self.header));
        Value::Object(root)
    }
}

fn resolve_string_map(map: &HashMap<String, String>, rest: &[String]) -> Option<Value> {
    match rest {
        [] => Some(string_map_value(map)),
        [name] => Some(Value::String(map.get(name).cloned().unwrap_or_default())),
        _ => None,
    }
}

fn string_map_value(map: &HashMap<String, String>) -> Value {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    Value::Object(
        keys.into_iter()
            .map(|k| (k.clone(), Value::String(map[k].clone())))
            .collect(),
    )
}

/// Decode a request body as a JSON object. Failures yield an empty object.
pub fn decode_body(body: &[u8]) -> Map<String, Value> {
    if body.is_empty() {
        return Map::new();
    }
    match serde_json::from_slice::<Map<String, Value>>(body) {
        Ok(map) => map,
        Err(err) => {
            debug!("Request body is not a JSON object: {}", err);
            Map::new()
        }
    }
}

/// Parse a query string, keeping the first value of repeated parameters.
pub fn parse_query_string(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let Some(query) = query else {
        return params;
    };

    for pair in query.split('&') {
        if pair.is_empty() || pair.contains(';') {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let (Some(key), Some(value)) = (decode_component(key), decode_component(value)) else {
            continue;
        };
        params.entry(key).or_insert(value);
    }
    params
}

fn decode_component(component: &str) -> Option<String> {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|s| s.into_owned())
}

/// Collect headers by canonical name, keeping the first value of each.
pub fn first_header_values(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (name, value) in headers.iter() {
        map.entry(canonical_header_name(name.as_str()))
            .or_insert_with(|| String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    map
}

/// Canonical MIME header form: `x-request-id` becomes `X-Request-Id`.
pub fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join("-")
}
