use actix_web::{dev::Server, middleware, web, App, HttpResponse, HttpServer};
use log::{error, info};
use std::net::TcpListener;

use crate::config::{DocsConfig, API_DOCS_PATH, SWAGGER_CONFIG_PATH};
use crate::generator::Generator;
use crate::models::Document;
use crate::parser::load_document;

/// Read-only state shared by every worker
pub struct DocsState {
    config: DocsConfig,
    // A document that failed to load is remembered as its error message
    document: Result<Document, String>,
}

impl DocsState {
    pub fn new(config: DocsConfig, document: Document) -> Self {
        Self {
            config,
            document: Ok(document),
        }
    }

    /// Load the document from raw bytes. A bad document does not stop the
    /// server; the documentation route reports the failure instead.
    pub fn from_bytes(config: DocsConfig, bytes: &[u8]) -> Self {
        let document = load_document(bytes).map_err(|e| {
            error!("Failed to load OpenAPI document: {}", e);
            e.to_string()
        });
        Self { config, document }
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_ok()
    }
}

/// Register the documentation routes under the configured prefix
pub fn configure(cfg: &mut web::ServiceConfig, state: web::Data<DocsState>) {
    let prefix = state.config.relative_path.clone();

    cfg.service(
        web::scope(&prefix)
            .app_data(state)
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
                    .add(("Access-Control-Allow-Headers", "Content-Type")),
            )
            .service(web::resource(API_DOCS_PATH).route(web::get().to(api_docs)))
            .service(web::resource(SWAGGER_CONFIG_PATH).route(web::get().to(swagger_config)))
            .service(web::resource("/doc.html").route(web::get().to(doc_page)))
            .service(web::resource("/").route(web::get().to(doc_page))),
    );
}

/// Bind the HTTP server without starting it
pub fn build_server(listener: TcpListener, state: web::Data<DocsState>) -> std::io::Result<Server> {
    let address = listener.local_addr()?;
    info!(
        "Serving documentation at http://{}{}/doc.html",
        address, state.config.relative_path
    );

    Ok(HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(middleware::Logger::default())
            .configure(move |cfg| configure(cfg, state))
    })
    .listen(listener)?
    .run())
}

async fn api_docs(state: web::Data<DocsState>) -> HttpResponse {
    match &state.document {
        Ok(document) => {
            let docs = Generator::new(document, &state.config).generate();
            HttpResponse::Ok().json(docs)
        }
        Err(message) => HttpResponse::InternalServerError()
            .content_type("text/plain; charset=utf-8")
            .body(format!("OpenAPI document not loaded: {}", message)),
    }
}

async fn swagger_config(state: web::Data<DocsState>) -> HttpResponse {
    HttpResponse::Ok().json(state.config.swagger_config())
}

async fn doc_page(state: web::Data<DocsState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_doc_page(&state.config))
}

/// Fill the UI page template for the configured service
pub fn render_doc_page(config: &DocsConfig) -> String {
    let config_url = format!("{}{}", config.relative_path, SWAGGER_CONFIG_PATH);
    DOC_PAGE_TEMPLATE
        .replace("{{title}}", &html_escape::encode_text(&config.server_name))
        .replace(
            "{{config_url}}",
            &html_escape::encode_double_quoted_attribute(&config_url),
        )
}

const DOC_PAGE_TEMPLATE: &str = r###"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{title}}</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5.21.0/swagger-ui.css">
    <style>
        body {
            margin: 0;
            padding: 0;
        }
        #swagger-ui {
            max-width: 1200px;
            margin: 0 auto;
        }
        .loading-indicator {
            text-align: center;
            padding: 20px;
            display: none;
        }
        .loading-indicator.visible {
            display: block;
        }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <div id="loading" class="loading-indicator">
        <h2>Loading API Documentation</h2>
        <p>If the documentation is large, this may take a moment...</p>
    </div>
    <script src="https://unpkg.com/swagger-ui-dist@5.21.0/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5.21.0/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            const loadingIndicator = document.getElementById('loading');
            loadingIndicator.classList.add('visible');

            const ui = SwaggerUIBundle({
                configUrl: "{{config_url}}",
                dom_id: "#swagger-ui",
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout",
                onComplete: function() {
                    loadingIndicator.classList.remove('visible');
                }
            });
            window.ui = ui;
        };
    </script>
</body>
</html>"###;
