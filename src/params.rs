//! Expansion of request body schemas into the parameter tree the UI renders.

use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::Schema;

/// Nesting bound for the parameter tree, on top of the ancestor check
pub const MAX_DEPTH: usize = 32;

/// One field of an expanded request body
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct ParameterNode {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub required: bool,
    #[serde(rename = "in")]
    pub location: String,
    pub children: Vec<ParameterNode>,
}

impl ParameterNode {
    /// Number of nodes in this subtree, itself included
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ParameterNode::count).sum::<usize>()
    }

    pub fn child(&self, name: &str) -> Option<&ParameterNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Look up the component a `$ref` points at.
///
/// Only the name after the last `/` is used; there is no chasing of
/// external files or reference chains.
pub fn resolve_ref<'a>(
    reference: &str,
    schemas: Option<&'a BTreeMap<String, Schema>>,
) -> Option<&'a Schema> {
    let name = reference.rsplit('/').next().unwrap_or(reference);
    let resolved = schemas.and_then(|s| s.get(name));
    if resolved.is_none() {
        debug!("Unresolved schema reference: {}", reference);
    }
    resolved
}

/// Builds [`ParameterNode`] trees against a fixed set of component schemas
pub struct ParameterTreeBuilder<'a> {
    schemas: Option<&'a BTreeMap<String, Schema>>,
    max_depth: usize,
}

impl<'a> ParameterTreeBuilder<'a> {
    pub fn new(schemas: Option<&'a BTreeMap<String, Schema>>) -> Self {
        Self {
            schemas,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Expand `schema` into a tree rooted at a node called `name`.
    ///
    /// Never fails: dangling references, cycles and the depth bound all end
    /// in a node without children.
    pub fn build(
        &self,
        name: &str,
        schema: &'a Schema,
        required: bool,
        location: &str,
    ) -> ParameterNode {
        let mut ancestors = Vec::new();
        self.build_node(name, schema, required, location, &mut ancestors)
    }

    fn build_node(
        &self,
        name: &str,
        schema: &'a Schema,
        required: bool,
        location: &str,
        ancestors: &mut Vec<&'a str>,
    ) -> ParameterNode {
        let schema_name = schema.ref_name();
        let target = match schema.ref_.as_deref().filter(|_| schema_name.is_some()) {
            Some(reference) => resolve_ref(reference, self.schemas),
            None => Some(schema),
        };

        let mut node = ParameterNode {
            name: name.to_string(),
            description: schema
                .description
                .clone()
                .or_else(|| target.and_then(|t| t.description.clone())),
            type_: schema
                .type_name()
                .or_else(|| target.and_then(Schema::type_name))
                .map(str::to_string),
            schema: schema_name.map(str::to_string),
            required,
            location: location.to_string(),
            children: Vec::new(),
        };

        let Some(target) = target else {
            return node;
        };

        if let Some(schema_name) = schema_name {
            if ancestors.contains(&schema_name) {
                warn!(
                    "Schema '{}' references itself through '{}', not expanding further",
                    schema_name, name
                );
                return node;
            }
        }

        if ancestors.len() >= self.max_depth {
            warn!("Parameter tree for '{}' exceeds depth {}", name, self.max_depth);
            return node;
        }

        // Inline roots have no name to guard on, but still count towards depth
        ancestors.push(schema_name.unwrap_or(""));

        for (property_name, property) in &target.properties {
            let property_required = target.is_required(property_name);

            let child = if property.ref_name().is_some() {
                self.build_node(property_name, property, property_required, location, ancestors)
            } else {
                ParameterNode {
                    name: property_name.clone(),
                    description: property.description.clone(),
                    type_: property.type_name().map(str::to_string),
                    schema: None,
                    required: property_required,
                    location: location.to_string(),
                    children: Vec::new(),
                }
            };
            node.children.push(child);
        }

        ancestors.pop();
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::load_document;
    use pretty_assertions::assert_eq;

    fn widget_components() -> BTreeMap<String, Schema> {
        let doc = load_document(
            br##"
openapi: 3.0.1
components:
  schemas:
    Widget:
      type: object
      description: A catalog widget
      required: [name, owner]
      properties:
        name:
          type: string
          description: Display name
        tag:
          type: string
        owner:
          $ref: "#/components/schemas/User"
        part:
          $ref: "#/components/schemas/Missing"
    User:
      type: object
      required: [id]
      properties:
        id:
          type: integer
        email:
          type: string
          format: email
        address:
          $ref: "#/components/schemas/Address"
    Address:
      type: object
      properties:
        city:
          type: string
"##,
        )
        .unwrap();
        doc.components.unwrap().schemas
    }

    #[test]
    fn test_resolve_ref() {
        let schemas = widget_components();
        let widget = resolve_ref("#/components/schemas/Widget", Some(&schemas)).unwrap();
        assert_eq!(widget.description.as_deref(), Some("A catalog widget"));
        assert!(resolve_ref("Widget", Some(&schemas)).is_some());
        assert!(resolve_ref("Missing", Some(&schemas)).is_none());
        assert!(resolve_ref("#/components/schemas/Widget", None).is_none());
    }

    #[test]
    fn test_build_nested_tree() {
        let schemas = widget_components();
        let root_schema = Schema::reference("Widget");
        let tree =
            ParameterTreeBuilder::new(Some(&schemas)).build("Widget", &root_schema, true, "body");

        assert_eq!(tree.schema.as_deref(), Some("Widget"));
        assert_eq!(tree.type_.as_deref(), Some("object"));
        assert_eq!(tree.description.as_deref(), Some("A catalog widget"));
        assert!(tree.required);
        assert_eq!(tree.location, "body");

        let names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["name", "owner", "part", "tag"]);

        let name = tree.child("name").unwrap();
        assert!(name.required);
        assert_eq!(name.type_.as_deref(), Some("string"));
        assert_eq!(name.description.as_deref(), Some("Display name"));
        assert!(!tree.child("tag").unwrap().required);

        let owner = tree.child("owner").unwrap();
        assert!(owner.required);
        assert_eq!(owner.schema.as_deref(), Some("User"));
        assert_eq!(owner.type_.as_deref(), Some("object"));
        assert!(owner.child("id").unwrap().required);
        assert!(!owner.child("email").unwrap().required);
        let address = owner.child("address").unwrap();
        assert_eq!(address.children.len(), 1);
        assert_eq!(address.children[0].location, "body");

        // Dangling reference keeps its node but has nothing under it
        let part = tree.child("part").unwrap();
        assert_eq!(part.schema.as_deref(), Some("Missing"));
        assert!(part.children.is_empty());
        assert_eq!(part.type_, None);

        // Root + Widget(4) + User(3) + Address(1)
        assert_eq!(tree.count(), 9);
    }

    #[test]
    fn test_missing_components_degrades_to_leaf() {
        let root_schema = Schema::reference("Widget");
        let tree = ParameterTreeBuilder::new(None).build("Widget", &root_schema, false, "body");
        assert_eq!(tree.schema.as_deref(), Some("Widget"));
        assert!(tree.children.is_empty());
    }

    #[test]
    fn test_inline_root_expands_properties_only() {
        let schemas = widget_components();
        let inline: Schema = serde_json::from_str(
            r##"{"type": "object", "required": ["a"], "properties": {
                "a": {"type": "string"},
                "b": {"type": "object", "properties": {"nested": {"type": "string"}}},
                "c": {"$ref": "#/components/schemas/Address"}
            }}"##,
        )
        .unwrap();
        let tree = ParameterTreeBuilder::new(Some(&schemas)).build("body", &inline, false, "body");

        assert_eq!(tree.schema, None);
        assert!(tree.child("a").unwrap().required);
        assert!(!tree.child("b").unwrap().required);
        // Inline objects are leaves; only references expand
        assert!(tree.child("b").unwrap().children.is_empty());
        assert_eq!(tree.child("c").unwrap().children.len(), 1);
    }

    #[test]
    fn test_self_reference_terminates() {
        let node: Schema = serde_json::from_str(
            r##"{"type": "object", "properties": {
                "value": {"type": "string"},
                "next": {"$ref": "#/components/schemas/Node"}
            }}"##,
        )
        .unwrap();
        let schemas = BTreeMap::from([("Node".to_string(), node)]);
        let root_schema = Schema::reference("Node");

        let tree =
            ParameterTreeBuilder::new(Some(&schemas)).build("Node", &root_schema, false, "body");
        let next = tree.child("next").unwrap();
        assert_eq!(next.schema.as_deref(), Some("Node"));
        assert!(next.children.is_empty());
        assert_eq!(tree.count(), 3);
    }

    #[test]
    fn test_mutual_reference_terminates() {
        let a: Schema = serde_json::from_str(
            r##"{"type": "object", "properties": {
                "id": {"type": "string"},
                "b": {"$ref": "#/components/schemas/B"}
            }}"##,
        )
        .unwrap();
        let b: Schema = serde_json::from_str(
            r##"{"type": "object", "properties": {
                "label": {"type": "string"},
                "a": {"$ref": "#/components/schemas/A"}
            }}"##,
        )
        .unwrap();
        let schemas = BTreeMap::from([("A".to_string(), a), ("B".to_string(), b)]);
        let root_schema = Schema::reference("A");

        let tree =
            ParameterTreeBuilder::new(Some(&schemas)).build("A", &root_schema, false, "body");
        let b = tree.child("b").unwrap();
        assert_eq!(b.schema.as_deref(), Some("B"));
        assert_eq!(b.children.len(), 2);

        let inner = b.child("a").unwrap();
        assert_eq!(inner.schema.as_deref(), Some("A"));
        assert_eq!(inner.type_.as_deref(), Some("object"));
        assert!(inner.children.is_empty());

        // A + id + b + b.a + b.label
        assert_eq!(tree.count(), 5);
    }

    #[test]
    fn test_depth_bound() {
        let schemas = widget_components();
        let root_schema = Schema::reference("Widget");
        let tree = ParameterTreeBuilder::new(Some(&schemas))
            .with_max_depth(1)
            .build("Widget", &root_schema, false, "body");

        let owner = tree.child("owner").unwrap();
        assert_eq!(owner.schema.as_deref(), Some("User"));
        assert!(owner.children.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let node = ParameterNode {
            name: "name".to_string(),
            type_: Some("string".to_string()),
            required: true,
            location: "body".to_string(),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            serde_json::json!({
                "name": "name",
                "type": "string",
                "required": true,
                "in": "body",
                "children": []
            })
        );
    }
}
