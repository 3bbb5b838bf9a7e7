//! JSON schema builders for MCP tools.

use serde_json::{Map, Value};

/// Schema for tools that take a PDF `source` (local path or URL).
pub(crate) fn source_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "source".into(),
        non_empty_string_schema("Local file path or http(s) URL of the PDF"),
    );
    finalize_object_schema(properties, &["source"])
}

/// Schema for tools that take raw `text`.
pub(crate) fn text_input_schema(description: &str) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("text".into(), non_empty_string_schema(description));
    finalize_object_schema(properties, &["text"])
}

/// Schema for tools that compare a `response` with its `ground_truth`.
pub(crate) fn evaluation_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "ground_truth".into(),
        non_empty_string_schema("Trusted reference text"),
    );
    properties.insert(
        "response".into(),
        non_empty_string_schema("Text to check against the reference"),
    );
    finalize_object_schema(properties, &["ground_truth", "response"])
}

/// Schema for tools without arguments.
pub(crate) fn empty_object_schema() -> Map<String, Value> {
    finalize_object_schema(Map::new(), &[])
}

fn non_empty_string_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("string".into()));
    schema.insert("description".into(), Value::String(description.into()));
    schema.insert("minLength".into(), Value::Number(1.into()));
    Value::Object(schema)
}

fn finalize_object_schema(properties: Map<String, Value>, required: &[&str]) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert(
            "required".into(),
            Value::Array(
                required
                    .iter()
                    .map(|&key| Value::String(key.into()))
                    .collect(),
            ),
        );
    }
    schema.insert("additionalProperties".into(), Value::Bool(false));
    schema
}
