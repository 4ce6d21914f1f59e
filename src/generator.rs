#![allow(non_snake_case)]

use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::{DocsConfig, DEFAULT_SERVER_DESCRIPTION};
use crate::models::{
    Document, ExclusiveBound, MediaType, Operation, Schema, SchemaType, Server,
};
use crate::params::{ParameterNode, ParameterTreeBuilder};
use crate::parser::CommentParser;

/// Version marker the knife4j front end expects
pub const OPENAPI_VERSION: &str = "3.0.1";

/// Converted documentation as served to the UI
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ApiDocs {
    pub openapi: String,
    pub info: DocInfo,
    pub servers: Vec<DocServer>,
    pub paths: BTreeMap<String, BTreeMap<String, DocOperation>>,
    pub components: DocComponents,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DocInfo {
    pub title: String,
    pub version: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DocServer {
    pub url: String,
    pub description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, DocServerVariable>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DocServerVariable {
    pub default: String,
    pub description: String,
    #[serde(rename = "enum")]
    pub enum_values: Vec<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DocOperation {
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operationId: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requestBody: Option<DocRequestBody>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reqParameters: Vec<ParameterNode>,
    pub responses: BTreeMap<String, DocResponse>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DocRequestBody {
    pub required: bool,
    pub content: BTreeMap<String, DocMediaType>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DocMediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<DocSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DocResponse {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, DocMediaType>>,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct DocComponents {
    pub schemas: BTreeMap<String, DocSchema>,
}

/// Schema in the served document.
///
/// The boolean flags are always written out: the UI tells an explicit
/// `false` apart from a missing key.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DocSchema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
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

    #[serde(skip_serializing_if = "Option::is_none")]
    pub multipleOf: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    pub exclusiveMaximum: ExclusiveBound,
    pub exclusiveMinimum: ExclusiveBound,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxLength: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minLength: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxItems: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minItems: Option<u64>,
    pub uniqueItems: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<DocSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxProperties: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minProperties: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, DocSchema>>,

    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub ref_: Option<String>,

    pub nullable: bool,
    pub readOnly: bool,
    pub writeOnly: bool,
    pub deprecated: bool,
}

/// Converts a loaded [`Document`] into the documentation the UI consumes
pub struct Generator<'a> {
    document: &'a Document,
    config: &'a DocsConfig,
    comments: CommentParser,
}

impl<'a> Generator<'a> {
    pub fn new(document: &'a Document, config: &'a DocsConfig) -> Self {
        Self {
            document,
            config,
            comments: CommentParser::new(),
        }
    }

    /// Build the converted document. The source document is left untouched.
    pub fn generate(&self) -> ApiDocs {
        let info = &self.document.info;
        let info_comment = self.comments.parse(info.description.as_deref().unwrap_or(""));

        let mut paths = BTreeMap::new();
        for (path, path_item) in &self.document.paths {
            let operations: BTreeMap<String, DocOperation> = path_item
                .operations()
                .map(|(method, op)| (method.to_string(), self.convert_operation(op)))
                .collect();
            debug!("Converted {} operations for {}", operations.len(), path);
            paths.insert(path.clone(), operations);
        }

        let schemas: BTreeMap<String, DocSchema> = self
            .document
            .schemas()
            .map(|schemas| {
                schemas
                    .iter()
                    .map(|(name, schema)| (name.clone(), convert_schema(schema)))
                    .collect()
            })
            .unwrap_or_default();

        ApiDocs {
            openapi: OPENAPI_VERSION.to_string(),
            info: DocInfo {
                title: info.title.clone(),
                version: info.version.clone(),
                name: self.config.server_name.clone(),
                description: info_comment.description(),
            },
            servers: self.convert_servers(),
            paths,
            components: DocComponents { schemas },
        }
    }

    fn convert_servers(&self) -> Vec<DocServer> {
        if self.document.servers.is_empty() {
            debug!(
                "No servers declared, using {}",
                self.config.default_server_url
            );
            return vec![DocServer {
                url: self.config.default_server_url.clone(),
                description: DEFAULT_SERVER_DESCRIPTION.to_string(),
                variables: BTreeMap::new(),
            }];
        }

        self.document.servers.iter().map(convert_server).collect()
    }

    fn convert_operation(&self, op: &Operation) -> DocOperation {
        let comment = self.comments.parse(op.description.as_deref().unwrap_or(""));

        let mut request_body = None;
        let mut req_parameters = Vec::new();

        if let Some(body) = &op.requestBody {
            // Only referenced body schemas get an expanded parameter tree
            let builder = ParameterTreeBuilder::new(self.document.schemas());
            for media_type in body.content.values() {
                if let Some(schema) = &media_type.schema {
                    if let Some(name) = schema.ref_name() {
                        req_parameters.push(builder.build(name, schema, body.required, "body"));
                    }
                }
            }

            request_body = Some(DocRequestBody {
                required: body.required,
                content: convert_content(&body.content),
            });
        }

        let responses = op
            .responses
            .iter()
            .map(|(code, response)| {
                (
                    code.clone(),
                    DocResponse {
                        description: response.description.clone(),
                        content: response.content.as_ref().map(convert_content),
                    },
                )
            })
            .collect();

        DocOperation {
            tags: op.tags.clone(),
            summary: op.summary.clone(),
            operationId: op.operationId.clone(),
            description: comment.description(),
            requestBody: request_body,
            reqParameters: req_parameters,
            responses,
        }
    }
}

fn convert_server(server: &Server) -> DocServer {
    DocServer {
        url: server.url.clone(),
        description: server.description.clone().unwrap_or_default(),
        variables: server
            .variables
            .iter()
            .map(|(name, variable)| {
                (
                    name.clone(),
                    DocServerVariable {
                        default: variable.default.clone(),
                        description: variable.description.clone().unwrap_or_default(),
                        enum_values: variable.enum_values.clone(),
                    },
                )
            })
            .collect(),
    }
}

fn convert_content(content: &BTreeMap<String, MediaType>) -> BTreeMap<String, DocMediaType> {
    content
        .iter()
        .map(|(content_type, media_type)| {
            (
                content_type.clone(),
                DocMediaType {
                    schema: media_type.schema.as_ref().map(convert_schema),
                    example: media_type.example.clone(),
                },
            )
        })
        .collect()
}

/// Copy a schema field by field, filling in the always-present flags
pub fn convert_schema(schema: &Schema) -> DocSchema {
    DocSchema {
        type_: schema.type_name().map(str::to_string),
        format: schema.format.clone(),
        title: schema.title.clone(),
        description: schema.description.clone(),
        default: schema.default.clone(),
        example: schema.example.clone(),
        multipleOf: schema.multipleOf,
        maximum: schema.maximum,
        minimum: schema.minimum,
        exclusiveMaximum: schema.exclusiveMaximum.unwrap_or(ExclusiveBound::Flag(false)),
        exclusiveMinimum: schema.exclusiveMinimum.unwrap_or(ExclusiveBound::Flag(false)),
        maxLength: schema.maxLength,
        minLength: schema.minLength,
        pattern: schema.pattern.clone(),
        maxItems: schema.maxItems,
        minItems: schema.minItems,
        uniqueItems: schema.uniqueItems.unwrap_or(false),
        items: schema.items.as_deref().map(|items| Box::new(convert_schema(items))),
        maxProperties: schema.maxProperties,
        minProperties: schema.minProperties,
        required: schema.required.clone(),
        enum_values: schema.enum_values.clone(),
        properties: if schema.properties.is_empty() {
            None
        } else {
            Some(
                schema
                    .properties
                    .iter()
                    .map(|(name, property)| (name.clone(), convert_schema(property)))
                    .collect(),
            )
        },
        ref_: schema.ref_.clone().filter(|r| !r.is_empty()),
        nullable: schema.nullable.unwrap_or(false)
            || schema.type_.as_ref().map_or(false, SchemaType::admits_null),
        readOnly: schema.readOnly.unwrap_or(false),
        writeOnly: schema.writeOnly.unwrap_or(false),
        deprecated: schema.deprecated.unwrap_or(false),
    }
}
