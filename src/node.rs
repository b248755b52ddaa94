//! A single tree element: a name, an optional scalar value, and an ordered
//! mapping of children.

use std::collections::BTreeMap;

use crate::error::Error;
use crate::value::{TypeTag, Value};

/// A tree element. Exactly one of `value` and a non-empty `children` may
/// hold data at a time — see invariant 1 in spec.md §3, enforced by every
/// caller in [`crate::tree`] rather than by this type itself (a plain data
/// holder keeps the invariant's proof localized to the handful of mutation
/// sites that can violate it).
///
/// `children` is a `BTreeMap` rather than an insertion-ordered map: iteration
/// order is explicitly not a client-visible contract (spec.md §9), and a
/// sorted map gives deterministic snapshot bytes and test output for free.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    value: Option<Value>,
    children: BTreeMap<String, Node>,
}

impl Node {
    /// An empty interior node named `name`.
    pub(crate) fn interior(name: String) -> Self {
        Node {
            name,
            value: None,
            children: BTreeMap::new(),
        }
    }

    /// A leaf node holding `value`.
    pub(crate) fn leaf(name: String, value: Value) -> Self {
        Node {
            name,
            value: Some(value),
            children: BTreeMap::new(),
        }
    }

    /// Reassemble a node from its parts, as done by the snapshot codec on
    /// load. Callers are responsible for upholding invariant 1.
    pub(crate) fn from_parts(name: String, value: Option<Value>, children: BTreeMap<String, Node>) -> Self {
        Node { name, value, children }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_leaf(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_interior(&self) -> bool {
        self.value.is_none()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn type_tag(&self) -> Option<TypeTag> {
        self.value.as_ref().map(Value::type_tag)
    }

    pub(crate) fn children(&self) -> &BTreeMap<String, Node> {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut BTreeMap<String, Node> {
        &mut self.children
    }

    pub(crate) fn set_value(&mut self, value: Value) {
        self.value = Some(value);
        self.children.clear();
    }

    /// Convert this node's subtree into its primitive view: a leaf becomes
    /// its scalar, an interior node becomes a nested JSON object obtained by
    /// recursively converting every child.
    pub(crate) fn to_primitive(&self) -> serde_json::Value {
        match &self.value {
            Some(v) => v.clone().into(),
            None => {
                let map = self
                    .children
                    .iter()
                    .map(|(k, child)| (k.clone(), child.to_primitive()))
                    .collect();
                serde_json::Value::Object(map)
            }
        }
    }

    /// Build a node (and, recursively, its children) from a primitive JSON
    /// value: an object becomes an interior node, anything else becomes a
    /// leaf via [`Value::try_from`]. JSON object keys are always strings, so
    /// the "non-string keys anywhere in the tree are rejected" rule from
    /// spec.md §4.1 is upheld by construction rather than by an explicit
    /// check.
    pub(crate) fn from_primitive(name: String, json: serde_json::Value) -> Result<Node, Error> {
        match json {
            serde_json::Value::Object(map) => {
                let mut node = Node::interior(name);
                for (key, child_json) in map {
                    let child = Node::from_primitive(key.clone(), child_json)?;
                    node.children.insert(key, child);
                }
                Ok(node)
            }
            scalar => Ok(Node::leaf(name, Value::try_from(scalar)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_detection() {
        let leaf = Node::leaf("value_node".into(), Value::Int(10));
        assert!(leaf.is_leaf());
        assert!(!leaf.is_interior());
    }

    #[test]
    fn interior_node_detection() {
        let mut interior = Node::interior("root".into());
        interior
            .children_mut()
            .insert("child".into(), Node::leaf("child".into(), Value::Str("dark".into())));
        assert!(!interior.is_leaf());
        assert!(interior.is_interior());
    }

    #[test]
    fn to_primitive_leaf() {
        let node = Node::leaf("theme".into(), Value::Str("dark".into()));
        assert_eq!(node.to_primitive(), serde_json::json!("dark"));
    }

    #[test]
    fn to_primitive_interior() {
        let mut root = Node::interior("root".into());
        root.children_mut()
            .insert("theme".into(), Node::leaf("theme".into(), Value::Str("dark".into())));
        assert_eq!(root.to_primitive(), serde_json::json!({"theme": "dark"}));
    }

    #[test]
    fn from_primitive_nested_dict() {
        let tree = Node::from_primitive("root".into(), serde_json::json!({"a": {"b": 10}})).unwrap();
        let a = tree.children().get("a").unwrap();
        let b = a.children().get("b").unwrap();
        assert_eq!(b.value(), Some(&Value::Int(10)));
    }
}
