use actix_web::web;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{debug, info, warn};
use std::{
    fs,
    net::TcpListener,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

use knife4rs::{
    config::DocsConfig,
    generator::Generator,
    parser::load_document_file,
    server::{build_server, DocsState},
};

/// Serve knife4j/swagger-ui documentation for an OpenAPI 3 document
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the documentation UI and the converted document over HTTP
    Serve {
        /// OpenAPI file, or a directory containing openapi.yaml/json
        #[arg(short, long, default_value = "./")]
        spec: String,

        /// Service name shown by the UI
        #[arg(short, long, default_value = "default")]
        name: String,

        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8000")]
        bind: String,

        /// Route prefix, e.g. /doc
        #[arg(long, default_value = "")]
        prefix: String,

        /// Server URL advertised when the document declares none
        #[arg(long = "server-url")]
        server_url: Option<String>,
    },

    /// Write the converted document as JSON
    Convert {
        /// OpenAPI file, or a directory containing openapi.yaml/json
        #[arg(short, long, default_value = "./")]
        spec: String,

        /// Service name shown by the UI
        #[arg(short, long, default_value = "default")]
        name: String,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<String>,

        /// Server URL advertised when the document declares none
        #[arg(long = "server-url")]
        server_url: Option<String>,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger with appropriate verbosity level
    let env = Env::default().filter_or("RUST_LOG", if cli.verbose { "debug" } else { "info" });
    env_logger::init_from_env(env);

    debug!("Starting knife4rs...");

    match cli.command {
        Commands::Serve { spec, name, bind, prefix, server_url } => {
            let spec_path = find_spec_file(&spec)?;
            let config = build_config(&name, &prefix, server_url.as_deref())?;

            debug!("Specification file: {:?}", spec_path);
            debug!("Route prefix: '{}'", config.relative_path);

            // A malformed document keeps the server up; the docs route reports it
            let bytes = fs::read(&spec_path)
                .context(format!("Failed to read file: {:?}", spec_path))?;
            let state = DocsState::from_bytes(config, &bytes);
            if !state.is_loaded() {
                warn!("Serving without a document, {:?} failed to parse", spec_path);
            }

            let listener = TcpListener::bind(&bind)
                .context(format!("Failed to bind {}", bind))?;
            build_server(listener, web::Data::new(state))?.await?;
        }
        Commands::Convert { spec, name, output, server_url } => {
            let spec_path = find_spec_file(&spec)?;
            let config = build_config(&name, "", server_url.as_deref())?;

            let document = load_document_file(&spec_path)?;
            let docs = Generator::new(&document, &config).generate();
            let json = serde_json::to_string_pretty(&docs)
                .context("Failed to serialize documentation to JSON")?;

            match output {
                Some(output) => {
                    fs::write(&output, json)
                        .context(format!("Failed to write to file: {:?}", output))?;
                    info!("Generated file: {:?}", output);
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

fn build_config(name: &str, prefix: &str, server_url: Option<&str>) -> Result<DocsConfig> {
    let config = DocsConfig::new(name).with_relative_path(prefix);
    match server_url {
        Some(url) => config.with_default_server_url(url),
        None => Ok(config),
    }
}

/// Resolves the specification file, searching directories for common names
fn find_spec_file(spec: &str) -> Result<PathBuf> {
    const CANDIDATES: [&str; 6] = [
        "openapi.yaml",
        "openapi.yml",
        "openapi.json",
        "swagger.yaml",
        "swagger.yml",
        "swagger.json",
    ];

    let path = Path::new(spec);
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if !path.is_dir() {
        anyhow::bail!("Specification not found: {}", spec);
    }

    // Prefer the shallowest match, then the order of CANDIDATES
    let mut found: Option<(usize, usize, PathBuf)> = None;
    for entry in WalkDir::new(path).max_depth(3).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if let Some(rank) = CANDIDATES.iter().position(|c| *c == file_name) {
            let key = (entry.depth(), rank);
            if found.as_ref().map_or(true, |(d, r, _)| key < (*d, *r)) {
                found = Some((key.0, key.1, entry.path().to_path_buf()));
            }
        }
    }

    match found {
        Some((_, _, spec_path)) => {
            debug!("Found specification file: {:?}", spec_path);
            Ok(spec_path)
        }
        None => anyhow::bail!("No OpenAPI document found under {}", spec),
    }
}
