use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const API_DOCS_PATH: &str = "/v3/api-docs";
pub const SWAGGER_CONFIG_PATH: &str = "/v3/api-docs/swagger-config";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
pub const DEFAULT_SERVER_DESCRIPTION: &str = "Generated server url";

/// One entry of the swagger-config `urls` list
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwaggerResource {
    pub config_url: String,
    pub oauth2_redirect_url: String,
    pub url: String,
    pub validator_url: String,
    pub name: String,
    pub location: String,
    pub swagger_version: String,
    pub tag_sort: String,
    pub operation_sort: String,
}

impl SwaggerResource {
    /// The resource describing the document served under `relative_path`
    pub fn local(name: &str, relative_path: &str) -> Self {
        let api_docs = format!("{}{}", relative_path, API_DOCS_PATH);
        Self {
            config_url: format!("{}{}", relative_path, SWAGGER_CONFIG_PATH),
            oauth2_redirect_url: "/swagger-ui/oauth2-redirect.html".to_string(),
            url: api_docs.clone(),
            validator_url: String::new(),
            name: name.to_string(),
            location: api_docs,
            swagger_version: "3.0.3".to_string(),
            tag_sort: "order".to_string(),
            operation_sort: "order".to_string(),
        }
    }
}

/// Response body of the swagger-config route
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SwaggerConfig {
    pub urls: Vec<SwaggerResource>,
}

/// Settings for converting and serving a document
#[derive(Debug, Clone, PartialEq)]
pub struct DocsConfig {
    /// Display name used in `info.name` and the resource list
    pub server_name: String,
    /// Route prefix such as `/doc`; empty to serve from the root
    pub relative_path: String,
    /// Explicit resource list; `None` advertises only the local document
    pub resources: Option<Vec<SwaggerResource>>,
    /// Server advertised when the document declares none
    pub default_server_url: String,
}

impl DocsConfig {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            resources: None,
            relative_path: String::new(),
            default_server_url: DEFAULT_SERVER_URL.to_string(),
        }
    }

    /// Normalizes the prefix to `/segment` form with no trailing slash
    pub fn with_relative_path(mut self, relative_path: &str) -> Self {
        let trimmed = relative_path.trim().trim_matches('/');
        self.relative_path = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        };
        self
    }

    pub fn with_resources(mut self, resources: Vec<SwaggerResource>) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Resources listed by the swagger-config route
    pub fn resources(&self) -> Vec<SwaggerResource> {
        match &self.resources {
            Some(resources) => resources.clone(),
            None => vec![SwaggerResource::local(&self.server_name, &self.relative_path)],
        }
    }

    /// Resource list the UI shell loads before fetching documents
    pub fn swagger_config(&self) -> SwaggerConfig {
        SwaggerConfig {
            urls: self.resources(),
        }
    }

    /// Sets the fallback server, rejecting anything that is not an absolute URL
    pub fn with_default_server_url(mut self, server_url: &str) -> Result<Self> {
        let url = url::Url::parse(server_url)
            .context(format!("Invalid server URL: {}", server_url))?;
        let mut normalized = url.to_string();
        // Url renders a bare origin with a trailing slash
        if url.path() == "/" && !server_url.ends_with('/') {
            normalized.pop();
        }
        self.default_server_url = normalized;
        Ok(self)
    }
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self::new("default")
    }
}
