#![allow(non_snake_case)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An OpenAPI 3.x document as read from the source specification
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Document {
    #[serde(default)]
    pub openapi: String,
    #[serde(default)]
    pub info: Info,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

impl Document {
    /// Named schema definitions, if the document declares a components block
    pub fn schemas(&self) -> Option<&BTreeMap<String, Schema>> {
        self.components.as_ref().map(|c| &c.schemas)
    }
}

/// Information about the API
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Info {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Server object used for API endpoints
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub variables: BTreeMap<String, ServerVariable>,
}

/// Server variable for templated server URLs
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ServerVariable {
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty", default)]
    pub enum_values: Vec<String>,
    #[serde(default)]
    pub default: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Components object holding reusable schema definitions
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Components {
    #[serde(default)]
    pub schemas: BTreeMap<String, Schema>,
}

/// A single path item with its operations
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
}

impl PathItem {
    /// Declared operations paired with their lowercase method name
    pub fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        [
            ("get", &self.get),
            ("post", &self.post),
            ("put", &self.put),
            ("delete", &self.delete),
            ("patch", &self.patch),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }
}

/// An operation (endpoint) of the API
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Operation {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operationId: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requestBody: Option<RequestBody>,
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,
}

/// Request body object
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RequestBody {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

/// Media type object
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
}

/// API response
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Response {
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// The `type` keyword: a single name in OpenAPI 3.0, optionally a list in 3.1
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Union(Vec<String>),
}

impl SchemaType {
    /// The name shown to the UI. For unions the first non-null member wins.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Single(name) => Some(name.as_str()),
            Self::Union(names) => names
                .iter()
                .find(|n| n.as_str() != "null")
                .or_else(|| names.first())
                .map(String::as_str),
        }
    }

    /// True for a 3.1 union that lists `null`
    pub fn admits_null(&self) -> bool {
        match self {
            Self::Single(_) => false,
            Self::Union(names) => names.iter().any(|n| n == "null"),
        }
    }
}

/// `exclusiveMaximum`/`exclusiveMinimum`: a flag in OpenAPI 3.0, a bound in 3.1
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum ExclusiveBound {
    Flag(bool),
    Limit(f64),
}

/// Schema object
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Schema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub ref_: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,

    // Number validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multipleOf: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusiveMaximum: Option<ExclusiveBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusiveMinimum: Option<ExclusiveBound>,

    // String validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxLength: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minLength: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    // Array validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxItems: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minItems: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniqueItems: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    // Object validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxProperties: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minProperties: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub properties: BTreeMap<String, Schema>,

    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty", default)]
    pub enum_values: Vec<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readOnly: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writeOnly: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
}

impl Schema {
    /// Schema that only points at a named component
    pub fn reference(target: &str) -> Self {
        Self {
            ref_: Some(format!("#/components/schemas/{}", target)),
            ..Default::default()
        }
    }

    /// Name of the referenced component: the `$ref` suffix after the last `/`.
    /// Returns `None` when the schema is not a reference.
    pub fn ref_name(&self) -> Option<&str> {
        let reference = self.ref_.as_deref().filter(|r| !r.is_empty())?;
        let name = reference.rsplit('/').next().unwrap_or(reference);
        Some(name)
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_.as_ref().and_then(SchemaType::name)
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}
