//! The `Tree`: the single entry point for reading and mutating the
//! configuration tree. Owns the root [`Node`] and enforces every structural
//! invariant from spec.md §3 before any mutation lands.
//!
//! `set`/`delete` follow a strict **validate → log → mutate** contract: a
//! [`MutationHook`] (normally a [`crate::runtime::StorageRuntime`]) is given
//! a chance to durably record the operation after validation but before the
//! in-memory change, and any failure at either step leaves the tree
//! untouched. See spec.md §5 for the ordering guarantee this buys callers.

use std::rc::Rc;

use crate::error::Error;
use crate::node::Node;
use crate::value::Value;

/// An injected capability that `Tree` calls into immediately before a
/// validated mutation is applied. `StorageRuntime` is the only implementor
/// in this crate, but the trait keeps the tree/codec/WAL core ignorant of
/// the runtime's existence — tests can run a bare `Tree` with no hook at
/// all, exercising pure in-memory behavior.
pub trait MutationHook {
    fn before_set(&self, path: &str, value: &Value) -> Result<(), Error>;
    fn before_delete(&self, path: &str) -> Result<(), Error>;
}

/// The hierarchical configuration tree.
pub struct Tree {
    root: Node,
    strict_mode: bool,
    hook: Option<Rc<dyn MutationHook>>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// A fresh tree with an empty root and no attached runtime.
    pub fn new() -> Self {
        Tree {
            root: Node::interior("root".to_string()),
            strict_mode: false,
            hook: None,
        }
    }

    /// Attach a collaborator that will be invoked before every externally
    /// originated `set`/`delete`. Pass the same `Rc` you use to drive
    /// `start`/`checkpoint`/`shutdown` so the hook and the caller's handle
    /// share the runtime's `logging_enabled` state.
    pub fn attach_hook(&mut self, hook: Rc<dyn MutationHook>) {
        self.hook = Some(hook);
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn strict_mode(&self) -> bool {
        self.strict_mode
    }

    /// Toggle strict mode: when enabled, `set` on a path with missing
    /// intermediates fails instead of auto-creating them.
    pub fn set_strict_mode(&mut self, enabled: bool) {
        self.strict_mode = enabled;
    }

    /// Return the primitive view at `path`: a scalar for a leaf, a nested
    /// JSON object for an interior node.
    pub fn get(&self, path: &str) -> Result<serde_json::Value, Error> {
        let parts = split_path(path)?;
        let node = self
            .walk(&parts)
            .ok_or_else(|| Error::PathNotFound { path: path.to_string() })?;
        Ok(node.to_primitive())
    }

    /// Assign `value` at `path`, auto-creating interior nodes along the way
    /// unless strict mode is on. Fails with `node-structure` if the target
    /// currently has children.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<Value, Error> {
        self.set_impl(path, value.into(), false)
    }

    /// Remove the subtree at `path`. Returns `false` (not an error) if
    /// nothing was there to remove. Deleting `"root"` itself is forbidden.
    pub fn delete(&mut self, path: &str) -> Result<bool, Error> {
        self.delete_impl(path, false)
    }

    /// Replay-only entry point: applies the mutation without invoking the
    /// hook. Used exclusively by [`crate::wal::Wal::replay`] so that
    /// recovery never re-enters the write-ahead log.
    pub(crate) fn set_internal(&mut self, path: &str, value: Value) -> Result<Value, Error> {
        self.set_impl(path, value, true)
    }

    pub(crate) fn delete_internal(&mut self, path: &str) -> Result<bool, Error> {
        self.delete_impl(path, true)
    }

    /// Render the whole tree as a nested mapping; `{}` for an empty root.
    pub fn to_dict(&self) -> serde_json::Value {
        if self.root.children().is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            self.root.to_primitive()
        }
    }

    /// Replace the entire tree with one built from `data`. Destructive and
    /// never WAL-logged — used for bulk ingest, and internally by snapshot
    /// load.
    pub fn load_dict(&mut self, data: serde_json::Value) -> Result<(), Error> {
        let serde_json::Value::Object(map) = data else {
            return Err(Error::InvalidFormat {
                reason: "top-level configuration must be a mapping".to_string(),
            });
        };
        let mut root = Node::interior("root".to_string());
        for (key, child_json) in map {
            let child = Node::from_primitive(key.clone(), child_json)?;
            root.children_mut().insert(key, child);
        }
        self.root = root;
        log::debug!("tree: replaced root via load_dict");
        Ok(())
    }

    /// Replace the root wholesale, as the snapshot codec does on load. Not
    /// part of the public API: snapshot loading bypasses `load_dict`'s JSON
    /// detour since it already produces a `Node` tree directly.
    pub(crate) fn replace_root(&mut self, root: Node) {
        self.root = root;
    }

    fn set_impl(&mut self, path: &str, value: Value, internal: bool) -> Result<Value, Error> {
        let parts = split_path(path)?;
        if let Value::Float(f) = value {
            if !f.is_finite() {
                return Err(Error::InvalidFormat {
                    reason: format!("float value for `{path}` must be finite, got {f}"),
                });
            }
        }
        let strict = self.strict_mode;

        let mut node = &mut self.root;
        for part in &parts {
            if !node.children().contains_key(part) {
                if strict {
                    return Err(Error::StrictMode { path: path.to_string() });
                }
                node.children_mut()
                    .insert(part.clone(), Node::interior(part.clone()));
            }
            node = node.children_mut().get_mut(part).expect("just inserted or present");
        }

        if !node.children().is_empty() {
            return Err(Error::NodeStructure {
                path: path.to_string(),
                reason: "cannot assign a value to an interior node".to_string(),
            });
        }

        if !internal {
            if let Some(hook) = &self.hook {
                hook.before_set(path, &value)?;
            }
        }

        node.set_value(value.clone());
        log::debug!("tree: set `{path}` (internal={internal})");
        Ok(value)
    }

    fn delete_impl(&mut self, path: &str, internal: bool) -> Result<bool, Error> {
        let parts = split_path(path)?;

        if parts.len() == 1 && parts[0] == "root" {
            return Err(Error::NodeStructure {
                path: path.to_string(),
                reason: "the root node cannot be deleted".to_string(),
            });
        }

        let (last, parent_parts) = parts.split_last().expect("split_path never returns empty");

        let parent = match self.walk_mut(parent_parts) {
            Some(parent) => parent,
            None => return Ok(false),
        };

        if !parent.children().contains_key(last) {
            return Ok(false);
        }

        if !internal {
            if let Some(hook) = &self.hook {
                hook.before_delete(path)?;
            }
        }

        parent.children_mut().remove(last);
        log::debug!("tree: delete `{path}` (internal={internal})");
        Ok(true)
    }

    fn walk<'a>(&'a self, parts: &[String]) -> Option<&'a Node> {
        let mut node = &self.root;
        for part in parts {
            node = node.children().get(part)?;
        }
        Some(node)
    }

    fn walk_mut<'a>(&'a mut self, parts: &[String]) -> Option<&'a mut Node> {
        let mut node = &mut self.root;
        for part in parts {
            node = node.children_mut().get_mut(part)?;
        }
        Some(node)
    }
}

/// Normalize and split a dotted path: trim the whole string, split on `.`,
/// drop empty segments. Per-segment whitespace is the caller's
/// responsibility (see DESIGN.md for why this spec deliberately does not
/// trim individual segments).
pub(crate) fn split_path(path: &str) -> Result<Vec<String>, Error> {
    let parts: Vec<String> = path
        .trim()
        .split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if parts.is_empty() {
        return Err(Error::InvalidPath {
            path: path.to_string(),
            reason: "path must split into at least one non-empty segment".to_string(),
        });
    }

    Ok(parts)
}
