// src/finder/swagger.rs
// =============================================================================
// Turns a Swagger (OpenAPI v2) document into concrete HTTP requests.
//
// For every operation of every path we fill each declared parameter with a
// representative value and place it where the parameter says it lives:
//
//   path     -> substituted into "{name}" in the URL
//   query    -> appended as ?name=value / &name=value
//   formData -> "name=value&other=value" request body
//   header   -> request header
//   body     -> the request body itself (a JSON example for object schemas)
//
// Values come from, in order: the parameter's default, its schema (with
// #/definitions references expanded into example JSON), its items, its
// format, its type.
//
// Rust concepts:
// - serde derive for the fixed parts of the document, serde_json::Value
//   for free-form schemas
// - BTreeMap: headers come out in a stable order
// =============================================================================

use serde::Deserialize;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

const DEFINITION_PREFIX: &str = "#/definitions/";
const PARAMETER_PREFIX: &str = "#/parameters/";

// Nested $ref chains deeper than this are cut off (self-referencing models)
const MAX_SCHEMA_DEPTH: usize = 8;

const EXAMPLE_EMAIL: &str = "scout@example.com";
const EXAMPLE_DATE: &str = "1985-04-12T23:20:50.52Z";
const PLACEHOLDER: &str = "TODO";

#[derive(Debug, Error)]
pub enum SwaggerError {
    #[error("document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("document root is not an object")]
    NotAnObject,

    #[error("document declares no paths")]
    NoPaths,
}

// One synthesised request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiDescription {
    /// Upper-case HTTP method
    pub method: String,
    /// basePath + path, with path and query parameters filled in
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    base_path: String,
    paths: Option<Map<String, Value>>,
    #[serde(default)]
    definitions: Map<String, Value>,
    #[serde(default)]
    parameters: Map<String, Value>,
    #[serde(default)]
    consumes: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PathItem {
    #[serde(default)]
    parameters: Vec<Parameter>,
    get: Option<Operation>,
    put: Option<Operation>,
    post: Option<Operation>,
    delete: Option<Operation>,
    options: Option<Operation>,
    head: Option<Operation>,
    patch: Option<Operation>,
}

#[derive(Debug, Default, Deserialize)]
struct Operation {
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(default)]
    consumes: Vec<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct Parameter {
    #[serde(rename = "$ref")]
    reference: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(rename = "in", default)]
    location: String,
    default: Option<Value>,
    #[serde(rename = "type")]
    kind: Option<String>,
    format: Option<String>,
    schema: Option<Value>,
    items: Option<Value>,
}

// A parameter with its synthesised value
#[derive(Debug, Clone, PartialEq, Eq)]
struct Param {
    name: String,
    location: String,
    value: String,
}

// Returns true for responses that look like a Swagger 2 document
pub fn is_swagger(content_type: &str, body: &str) -> bool {
    content_type.starts_with("application/json") && body.contains("\"swagger\":")
}

pub fn find_apis(source: &[u8]) -> Result<Vec<ApiDescription>, SwaggerError> {
    let root: Value = serde_json::from_slice(source)?;
    if !root.is_object() {
        return Err(SwaggerError::NotAnObject);
    }

    let document: Document = serde_json::from_value(root)?;
    let paths = match &document.paths {
        Some(paths) if !paths.is_empty() => paths,
        _ => return Err(SwaggerError::NoPaths),
    };

    let synthesizer = Synthesizer::new(&document);
    let mut apis = Vec::new();

    for (path, item) in paths {
        // A malformed path item only loses that path
        let item: PathItem = match serde_json::from_value(item.clone()) {
            Ok(item) => item,
            Err(_) => continue,
        };
        let url = join_url_path(&document.base_path, path);

        let operations = [
            ("GET", &item.get),
            ("PUT", &item.put),
            ("POST", &item.post),
            ("DELETE", &item.delete),
            ("OPTIONS", &item.options),
            ("HEAD", &item.head),
            ("PATCH", &item.patch),
        ];

        for (method, operation) in operations {
            if let Some(operation) = operation {
                apis.push(synthesizer.describe(method, &url, &item.parameters, operation));
            }
        }
    }

    Ok(apis)
}

struct Synthesizer<'a> {
    definitions: &'a Map<String, Value>,
    // (definition name, depth) -> example JSON, filled on first use
    examples: RefCell<HashMap<(String, usize), String>>,
    // global parameter key -> synthesised parameter
    globals: HashMap<String, Param>,
    consumes: Option<&'a str>,
}

impl<'a> Synthesizer<'a> {
    fn new(document: &'a Document) -> Self {
        let mut synthesizer = Self {
            definitions: &document.definitions,
            examples: RefCell::default(),
            globals: HashMap::new(),
            consumes: document.consumes.first().map(String::as_str),
        };

        synthesizer.globals = document
            .parameters
            .iter()
            .filter_map(|(key, raw)| {
                let parameter: Parameter = serde_json::from_value(raw.clone()).ok()?;
                Some((key.clone(), synthesizer.param(&parameter)))
            })
            .collect();

        synthesizer
    }

    fn describe(
        &self,
        method: &str,
        url: &str,
        shared: &[Parameter],
        operation: &Operation,
    ) -> ApiDescription {
        let mut api = ApiDescription {
            method: method.to_string(),
            url: url.to_string(),
            headers: BTreeMap::new(),
            body: None,
        };

        if let Some(content_type) = operation
            .consumes
            .first()
            .map(String::as_str)
            .or(self.consumes)
        {
            api.headers
                .insert("Content-Type".to_string(), content_type.to_string());
        }

        let params: Vec<Param> = shared
            .iter()
            .chain(&operation.parameters)
            .filter_map(|parameter| self.resolve(parameter))
            .collect();

        // Operation-level parameters override path-level ones with the same
        // name and location
        let effective = params.iter().enumerate().filter(|(i, p)| {
            !params[i + 1..]
                .iter()
                .any(|later| later.name == p.name && later.location == p.location)
        });

        for (_, param) in effective {
            route(&mut api, param);
        }

        api
    }

    // Expands a $ref parameter or synthesises an inline one
    fn resolve(&self, parameter: &Parameter) -> Option<Param> {
        match &parameter.reference {
            Some(reference) => {
                let key = reference.strip_prefix(PARAMETER_PREFIX)?;
                self.globals.get(key).cloned()
            }
            None => Some(self.param(parameter)),
        }
    }

    fn param(&self, parameter: &Parameter) -> Param {
        Param {
            name: parameter.name.clone(),
            location: parameter.location.clone(),
            value: self.param_value(parameter),
        }
    }

    fn param_value(&self, parameter: &Parameter) -> String {
        if let Some(default) = &parameter.default {
            return match default {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
        }

        if let Some(schema) = &parameter.schema {
            return self.schema_example(schema, 0);
        }

        if let Some(items) = &parameter.items {
            if let Some(name) = definition_name(items) {
                return format!("[{}]", self.definition_example(name, 0));
            }
            if let Some(format) = str_field(items, "format") {
                return value_by_format(format, false);
            }
            return value_by_type(str_field(items, "type").unwrap_or_default(), false);
        }

        if let Some(format) = &parameter.format {
            return value_by_format(format, false);
        }

        parameter
            .kind
            .as_deref()
            .map(|kind| value_by_type(kind, false))
            .unwrap_or_default()
    }

    // Example JSON text for a schema; "" when nothing can be synthesised
    fn schema_example(&self, schema: &Value, depth: usize) -> String {
        if depth > MAX_SCHEMA_DEPTH {
            return "{}".to_string();
        }

        if let Some(name) = definition_name(schema) {
            return self.definition_example(name, depth + 1);
        }

        if let Some(example) = schema.get("example") {
            return example.to_string();
        }

        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            let fields: Vec<String> = properties
                .iter()
                .filter_map(|(name, property)| {
                    let value = self.schema_example(property, depth + 1);
                    (!value.is_empty()).then(|| format!("{}:{value}", Value::from(name.as_str())))
                })
                .collect();
            return format!("{{{}}}", fields.join(","));
        }

        if let Some(items) = schema.get("items") {
            return format!("[{}]", self.schema_example(items, depth + 1));
        }

        if let Some(format) = str_field(schema, "format") {
            return value_by_format(format, true);
        }

        match schema.get("type") {
            Some(Value::String(kind)) => value_by_type(kind, true),
            // JSON-schema style ["string", "null"]
            Some(Value::Array(kinds)) => kinds
                .first()
                .and_then(Value::as_str)
                .map(|kind| value_by_type(kind, true))
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    // Expands each (definition, depth) pair once; later references reuse it
    fn definition_example(&self, name: &str, depth: usize) -> String {
        let key = (name.to_string(), depth);
        let cached = self.examples.borrow().get(&key).cloned();
        if let Some(example) = cached {
            return example;
        }

        let example = match self.definitions.get(name) {
            Some(schema) => self.schema_example(schema, depth),
            None => String::new(),
        };
        self.examples.borrow_mut().insert(key, example.clone());
        example
    }
}

fn route(api: &mut ApiDescription, param: &Param) {
    match param.location.as_str() {
        "path" => {
            api.url = api
                .url
                .replace(&format!("{{{}}}", param.name), &param.value);
        }
        "query" => {
            let separator = if api.url.contains('?') { '&' } else { '?' };
            api.url = format!("{}{separator}{}={}", api.url, param.name, param.value);
        }
        "formData" => {
            let pair = format!("{}={}", param.name, param.value);
            api.body = Some(match api.body.take() {
                Some(body) if !body.is_empty() => format!("{body}&{pair}"),
                _ => pair,
            });
        }
        "header" => {
            api.headers.insert(param.name.clone(), param.value.clone());
        }
        _ => api.body = Some(param.value.clone()),
    }
}

// "#/definitions/User" -> "User"
fn definition_name(schema: &Value) -> Option<&str> {
    str_field(schema, "$ref")?.strip_prefix(DEFINITION_PREFIX)
}

fn str_field<'v>(value: &'v Value, field: &str) -> Option<&'v str> {
    value.get(field).and_then(Value::as_str)
}

// Joins basePath and a path template into one clean absolute path
fn join_url_path(base_path: &str, path: &str) -> String {
    let segments: Vec<&str> = base_path
        .split('/')
        .chain(path.split('/'))
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    format!("/{}", segments.join("/"))
}

// Representative literal for a primitive type.
// `quoted` = produce JSON text (strings in quotes).
fn value_by_type(kind: &str, quoted: bool) -> String {
    let text = |value: &str| {
        if quoted {
            Value::from(value).to_string()
        } else {
            value.to_string()
        }
    };

    match kind {
        "integer" => "1".to_string(),
        "number" => "1.0".to_string(),
        "boolean" => "true".to_string(),
        "array" => "[]".to_string(),
        "object" => "{}".to_string(),
        "string" => text("test"),
        "file" => text(PLACEHOLDER),
        _ => String::new(),
    }
}

// Representative literal for a format; unknown formats are tried as types
fn value_by_format(format: &str, quoted: bool) -> String {
    use base64::Engine;

    let text = |value: &str| {
        if quoted {
            Value::from(value).to_string()
        } else {
            value.to_string()
        }
    };

    match format {
        "int32" | "int64" => "1".to_string(),
        "float" | "double" => "1.0".to_string(),
        "byte" => text(&base64::engine::general_purpose::STANDARD.encode("test")),
        "binary" | "password" => text(PLACEHOLDER),
        "date" | "date-time" => text(EXAMPLE_DATE),
        "email" => text(EXAMPLE_EMAIL),
        other => value_by_type(other, quoted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apis(document: &str) -> Vec<ApiDescription> {
        find_apis(document.as_bytes()).unwrap()
    }

    #[test]
    fn test_integer_path_parameter() {
        let found = apis(
            r#"{
                "swagger": "2.0",
                "basePath": "/api",
                "paths": {
                    "/users/{id}": {
                        "get": {
                            "parameters": [
                                {"name": "id", "in": "path", "type": "integer", "required": true}
                            ]
                        }
                    }
                }
            }"#,
        );

        assert_eq!(
            found,
            vec![ApiDescription {
                method: "GET".to_string(),
                url: "/api/users/1".to_string(),
                headers: BTreeMap::new(),
                body: None,
            }]
        );
    }

    #[test]
    fn test_form_data_body() {
        let found = apis(
            r#"{
                "swagger": "2.0",
                "paths": {
                    "/login": {
                        "post": {
                            "consumes": ["application/x-www-form-urlencoded"],
                            "parameters": [
                                {"name": "a", "in": "formData", "type": "string"},
                                {"name": "b", "in": "formData", "type": "integer"}
                            ]
                        }
                    }
                }
            }"#,
        );

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].method, "POST");
        assert_eq!(found[0].url, "/login");
        assert_eq!(found[0].body.as_deref(), Some("a=test&b=1"));
        assert_eq!(
            found[0].headers.get("Content-Type").map(String::as_str),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn test_body_from_definition() {
        let found = apis(
            r##"{
                "swagger": "2.0",
                "basePath": "/v2",
                "consumes": ["application/json"],
                "paths": {
                    "/pet": {
                        "post": {
                            "parameters": [
                                {"name": "body", "in": "body", "schema": {"$ref": "#/definitions/Pet"}}
                            ]
                        }
                    }
                },
                "definitions": {
                    "Category": {
                        "properties": {"id": {"type": "integer", "format": "int64"}}
                    },
                    "Pet": {
                        "properties": {
                            "name": {"type": "string", "example": "doggie"},
                            "category": {"$ref": "#/definitions/Category"},
                            "tags": {"type": "array", "items": {"type": "string"}},
                            "born": {"type": "string", "format": "date-time"},
                            "owner": {"type": "string", "format": "email"}
                        }
                    }
                }
            }"##,
        );

        assert_eq!(found.len(), 1);
        let body = found[0].body.as_deref().unwrap();
        let parsed: Value = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!({
                "name": "doggie",
                "category": {"id": 1},
                "tags": ["test"],
                "born": "1985-04-12T23:20:50.52Z",
                "owner": "scout@example.com"
            })
        );
        assert_eq!(
            found[0].headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_query_header_and_shared_parameters() {
        let found = apis(
            r##"{
                "swagger": "2.0",
                "parameters": {
                    "pageSize": {"name": "size", "in": "query", "type": "integer"}
                },
                "paths": {
                    "/orgs/{org}/repos": {
                        "parameters": [
                            {"name": "org", "in": "path", "type": "string"},
                            {"name": "sort", "in": "query", "type": "string"}
                        ],
                        "get": {
                            "parameters": [
                                {"name": "sort", "in": "query", "type": "string", "default": "name"},
                                {"$ref": "#/parameters/pageSize"},
                                {"name": "X-Token", "in": "header", "type": "string", "format": "byte"}
                            ]
                        },
                        "delete": {}
                    }
                }
            }"##,
        );

        assert_eq!(found.len(), 2);

        let get = &found[0];
        assert_eq!(get.method, "GET");
        assert_eq!(get.url, "/orgs/test/repos?sort=name&size=1");
        assert_eq!(
            get.headers.get("X-Token").map(String::as_str),
            Some("dGVzdA==")
        );

        // Destructive operations are still described; callers decide
        assert_eq!(found[1].method, "DELETE");
        assert_eq!(found[1].url, "/orgs/test/repos?sort=test");
    }

    #[test]
    fn test_self_referencing_definition_terminates() {
        let found = apis(
            r##"{
                "swagger": "2.0",
                "paths": {
                    "/nodes": {
                        "put": {
                            "parameters": [
                                {"name": "body", "in": "body", "schema": {"$ref": "#/definitions/Node"}}
                            ]
                        }
                    }
                },
                "definitions": {
                    "Node": {
                        "properties": {"child": {"$ref": "#/definitions/Node"}}
                    }
                }
            }"##,
        );

        let body = found[0].body.as_deref().unwrap();
        assert!(serde_json::from_str::<Value>(body).is_ok());
    }

    #[test]
    fn test_shared_definitions_expand_once_per_depth() {
        let mut definitions = Map::new();
        for i in 0..12 {
            let child = serde_json::json!({"$ref": format!("#/definitions/D{}", i + 1)});
            definitions.insert(
                format!("D{i}"),
                serde_json::json!({
                    "properties": {"a": child, "b": child, "c": child, "d": child}
                }),
            );
        }
        let document: Document = serde_json::from_value(serde_json::json!({
            "swagger": "2.0",
            "paths": {},
            "definitions": definitions,
        }))
        .unwrap();

        let synthesizer = Synthesizer::new(&document);
        let example = synthesizer.schema_example(&serde_json::json!({"$ref": "#/definitions/D0"}), 0);

        assert!(serde_json::from_str::<Value>(&example).is_ok());
        // D0@1, D1@3, D2@5, D3@7 and the cut-off D4@9
        assert_eq!(synthesizer.examples.borrow().len(), 5);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(find_apis(b"not json"), Err(SwaggerError::Parse(_))));
        assert!(matches!(find_apis(b"[1, 2]"), Err(SwaggerError::NotAnObject)));
        assert!(matches!(
            find_apis(br#"{"swagger": "2.0"}"#),
            Err(SwaggerError::NoPaths)
        ));
    }

    #[test]
    fn test_is_swagger() {
        assert!(is_swagger("application/json;charset=UTF-8", r#"{"swagger":"2.0"}"#));
        assert!(!is_swagger("text/html", r#"{"swagger":"2.0"}"#));
        assert!(!is_swagger("application/json", r#"{"openapi":"3.0.0"}"#));
    }

    #[test]
    fn test_join_url_path() {
        assert_eq!(join_url_path("/", "/users"), "/users");
        assert_eq!(join_url_path("/api/", "/users/{id}"), "/api/users/{id}");
        assert_eq!(join_url_path("", "pets"), "/pets");
    }
}
