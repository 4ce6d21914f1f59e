use anyhow::{Context, Result};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::{collections::BTreeMap, fs, path::Path};
use thiserror::Error;

use crate::models::Document;

// `@name value` or `@name: value`
static ANNOTATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*@([A-Za-z][\w.-]*)\s*(?:(?::\s*|\s+)(.*?))?\s*$").unwrap()
});

// `name: value` for the keys that are unambiguous in prose
static KEYED_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(description|summary|title|version|author|since|deprecated)\s*:\s*(.*?)\s*$",
    )
    .unwrap()
});

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Document is empty")]
    Empty,

    #[error("Document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Parse raw specification bytes into a [`Document`].
///
/// JSON is detected by a leading `{`; everything else goes through the YAML
/// parser. Either the whole document loads or an error is returned.
pub fn load_document(bytes: &[u8]) -> Result<Document, ParseError> {
    let text = std::str::from_utf8(bytes)?;
    let trimmed = text.trim_start_matches('\u{feff}').trim();

    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let document: Document = if trimmed.starts_with('{') {
        debug!("Parsing specification as JSON ({} bytes)", bytes.len());
        serde_json::from_str(trimmed)?
    } else {
        debug!("Parsing specification as YAML ({} bytes)", bytes.len());
        serde_yaml::from_str(trimmed)?
    };

    debug!(
        "Loaded document '{}' with {} paths",
        document.info.title,
        document.paths.len()
    );
    Ok(document)
}

/// Read and parse a specification file
pub fn load_document_file(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let bytes = fs::read(path).context(format!("Failed to read file: {:?}", path))?;
    let document =
        load_document(&bytes).context(format!("Failed to parse specification: {:?}", path))?;
    Ok(document)
}

/// Tags and residual text extracted from a free-text field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedComment {
    tags: BTreeMap<String, String>,
    text: String,
    // Input with only the `description` tag lines removed
    body: String,
}

impl ParsedComment {
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(&name.to_lowercase())
    }

    /// Value of a tag, or `None` when the text carries no such tag
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.tags.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Plain text left over once tag lines are removed
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.text.is_empty()
    }

    /// The `description` tag if present, otherwise the input text with any
    /// other tag lines left in place
    pub fn description(&self) -> Option<String> {
        match self.get_string("description") {
            Some(value) => Some(value.to_string()),
            None if !self.body.is_empty() => Some(self.body.clone()),
            None => None,
        }
    }
}

/// Splits description fields into annotation tags and plain text.
///
/// Unrecognized or malformed tag lines are kept as plain text.
#[derive(Debug, Clone, Default)]
pub struct CommentParser;

impl CommentParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, input: &str) -> ParsedComment {
        let mut parsed = ParsedComment::default();
        let mut text_lines = Vec::new();
        let mut body_lines = Vec::new();

        for line in input.lines() {
            let tag = if let Some(captures) = ANNOTATION_REGEX.captures(line) {
                Some((captures.get(1), captures.get(2)))
            } else {
                KEYED_TAG_REGEX
                    .captures(line)
                    .map(|captures| (captures.get(1), captures.get(2)))
            };

            match tag {
                Some((Some(name), value)) => {
                    let name = name.as_str().to_lowercase();
                    let value = value.map(|v| v.as_str()).unwrap_or("");
                    if name != "description" {
                        body_lines.push(line);
                    }

                    // Repeated tags accumulate line by line
                    parsed
                        .tags
                        .entry(name)
                        .and_modify(|existing| {
                            existing.push('\n');
                            existing.push_str(value);
                        })
                        .or_insert_with(|| value.to_string());
                }
                _ => {
                    text_lines.push(line);
                    body_lines.push(line);
                }
            }
        }

        parsed.text = text_lines.join("\n").trim().to_string();
        parsed.body = body_lines.join("\n").trim().to_string();
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SchemaType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_has_no_tags() {
        let parsed = CommentParser::new().parse("plain text");
        assert_eq!(parsed.tags().count(), 0);
        assert_eq!(parsed.text(), "plain text");
        assert!(!parsed.has_tag("description"));
        assert_eq!(parsed.get_string("description"), None);
    }

    #[test]
    fn test_description_tag_inside_text() {
        let parsed = CommentParser::new().parse(
            "Widget endpoints.\ndescription: Manage widgets in the catalog\nSee the wiki for more.",
        );
        assert!(parsed.has_tag("description"));
        assert_eq!(
            parsed.get_string("description"),
            Some("Manage widgets in the catalog")
        );
        assert_eq!(parsed.text(), "Widget endpoints.\nSee the wiki for more.");
    }

    #[test]
    fn test_annotation_style_tags() {
        let parsed = CommentParser::new().parse(
            "@description Creates a widget\n@author: jane\n@Deprecated\n@description second line",
        );
        assert_eq!(
            parsed.get_string("description"),
            Some("Creates a widget\nsecond line")
        );
        assert_eq!(parsed.get_string("AUTHOR"), Some("jane"));
        assert!(parsed.has_tag("deprecated"));
        assert_eq!(parsed.get_string("deprecated"), Some(""));
        assert_eq!(parsed.text(), "");
    }

    #[test]
    fn test_malformed_tags_are_plain_text() {
        let parsed = CommentParser::new().parse("@\n@ loose value\nnote: not a known key");
        assert_eq!(parsed.tags().count(), 0);
        assert_eq!(parsed.text(), "@\n@ loose value\nnote: not a known key");
    }

    #[test]
    fn test_description_falls_back_to_text() {
        let parser = CommentParser::new();
        assert_eq!(
            parser.parse("Just prose").description(),
            Some("Just prose".to_string())
        );
        assert_eq!(
            parser.parse("Just prose\nDescription: tagged").description(),
            Some("tagged".to_string())
        );
        assert_eq!(parser.parse("   ").description(), None);
    }

    #[test]
    fn test_description_fallback_keeps_other_keyed_lines() {
        let parsed = CommentParser::new()
            .parse("Lists widgets.\nVersion: 2 results are paged.\nTitle: case is ignored.");
        assert_eq!(parsed.get_string("version"), Some("2 results are paged."));
        assert_eq!(
            parsed.description().as_deref(),
            Some("Lists widgets.\nVersion: 2 results are paged.\nTitle: case is ignored.")
        );
    }

    #[test]
    fn test_annotation_colon_without_space() {
        let parsed = CommentParser::new().parse("@description:Creates a widget\n@since:1.4");
        assert_eq!(parsed.get_string("description"), Some("Creates a widget"));
        assert_eq!(parsed.get_string("since"), Some("1.4"));
        assert_eq!(parsed.text(), "");
    }

    #[test]
    fn test_load_yaml_document() {
        let yaml = br#"
openapi: 3.0.3
info:
  title: Widgets
  version: "1.2"
paths:
  /widgets:
    get:
      summary: List widgets
      responses:
        "200":
          description: ok
components:
  schemas:
    Widget:
      type: object
      required: [name]
      properties:
        name:
          type: string
"#;
        let doc = load_document(yaml).unwrap();
        assert_eq!(doc.openapi, "3.0.3");
        assert_eq!(doc.info.version, "1.2");
        let get = doc.paths["/widgets"].get.as_ref().unwrap();
        assert_eq!(get.summary.as_deref(), Some("List widgets"));
        assert_eq!(get.responses["200"].description, "ok");

        let widget = &doc.schemas().unwrap()["Widget"];
        assert_eq!(widget.type_, Some(SchemaType::Single("object".to_string())));
        assert!(widget.is_required("name"));
    }

    #[test]
    fn test_load_json_document() {
        let json =
            br#"  {"openapi": "3.1.0", "info": {"title": "T", "version": "1"}, "paths": {}}"#;
        let doc = load_document(json).unwrap();
        assert_eq!(doc.openapi, "3.1.0");
        assert!(doc.paths.is_empty());
        assert!(doc.components.is_none());
    }

    #[test]
    fn test_load_rejects_bad_input() {
        assert!(matches!(load_document(b""), Err(ParseError::Empty)));
        assert!(matches!(
            load_document(&[0xff, 0xfe, 0x00]),
            Err(ParseError::Encoding(_))
        ));
        assert!(matches!(
            load_document(b"{\"openapi\": "),
            Err(ParseError::Json(_))
        ));
        assert!(matches!(
            load_document(b"openapi: [unclosed"),
            Err(ParseError::Yaml(_))
        ));
        // A scalar is well-formed YAML but not a document
        assert!(matches!(
            load_document(b"just a string"),
            Err(ParseError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_document_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        let err = load_document_file(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));
    }
}
