//! Mapping rules and per-type mapping tables
//!
//! A mapping rule is the per-field recipe producing a raw value:
//! a dot-path into the owner's source document, a synchronous closure,
//! or an asynchronous closure. All three converge on a [`Raw`] value
//! that the resolver then normalizes.
//!
//! Rules always receive the owner as an explicit receiver argument;
//! there is no implicit calling context.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Result;
use crate::projectable::Projectable;

/// Synchronous mapping closure over an owner of type `T`.
pub type SyncFn<T> = Arc<dyn Fn(&T) -> Result<Raw> + Send + Sync>;

/// Asynchronous mapping closure over an owner of type `T`.
pub type AsyncFn<T> = Arc<dyn for<'a> Fn(&'a T) -> BoxFuture<'a, Result<Raw>> + Send + Sync>;

/// The value a mapping rule produces, before normalization.
pub enum Raw {
    /// No value: the field is omitted from the output entirely.
    Absent,

    /// A plain JSON value, passed through unchanged. Non-projectable
    /// objects are opaque; the resolver never descends into them.
    Value(Value),

    /// A nested projectable, resolved recursively with the field's
    /// sub-template.
    Nested(Arc<dyn Projectable>),

    /// A sequence, resolved element-wise with the field's sub-template.
    Many(Vec<Raw>),
}

impl Raw {
    /// Wrap a projectable value for recursive resolution.
    pub fn nested(value: impl Projectable + 'static) -> Self {
        Raw::Nested(Arc::new(value))
    }

    /// Wrap an already-shared projectable.
    pub fn shared(value: Arc<dyn Projectable>) -> Self {
        Raw::Nested(value)
    }

    /// Wrap a sequence of raw values.
    pub fn many(items: impl IntoIterator<Item = Raw>) -> Self {
        Raw::Many(items.into_iter().collect())
    }

    /// Wrap a sequence of projectables.
    pub fn many_nested<P: Projectable + 'static>(items: impl IntoIterator<Item = P>) -> Self {
        Raw::Many(items.into_iter().map(Raw::nested).collect())
    }
}

impl From<Value> for Raw {
    fn from(value: Value) -> Self {
        Raw::Value(value)
    }
}

impl fmt::Debug for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Raw::Absent => f.write_str("Absent"),
            Raw::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Raw::Nested(_) => f.write_str("Nested(..)"),
            Raw::Many(items) => f.debug_tuple("Many").field(items).finish(),
        }
    }
}

/// The per-field recipe producing a raw value.
pub enum MappingRule<T> {
    /// Dot-delimited path, tolerantly traversed through the owner's
    /// source document. A missing node omits the field.
    Path(String),

    /// Synchronous closure invoked with the owner.
    Sync(SyncFn<T>),

    /// Asynchronous closure invoked with the owner and awaited.
    Async(AsyncFn<T>),
}

impl<T> Clone for MappingRule<T> {
    fn clone(&self) -> Self {
        match self {
            MappingRule::Path(path) => MappingRule::Path(path.clone()),
            MappingRule::Sync(f) => MappingRule::Sync(f.clone()),
            MappingRule::Async(f) => MappingRule::Async(f.clone()),
        }
    }
}

impl<T> fmt::Debug for MappingRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingRule::Path(path) => f.debug_tuple("Path").field(path).finish(),
            MappingRule::Sync(_) => f.write_str("Sync(..)"),
            MappingRule::Async(_) => f.write_str("Async(..)"),
        }
    }
}

/// An ordered table of field name → mapping rule.
///
/// Tables are immutable configuration: built once per type (typically
/// in a `Lazy` static) and only read during resolution. Field order is
/// declaration order and drives wildcard enumeration.
pub struct MappingTable<T> {
    entries: IndexMap<String, MappingRule<T>>,
}

impl<T> MappingTable<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Add a path rule (builder style).
    pub fn path(mut self, field: impl Into<String>, path: impl Into<String>) -> Self {
        self.entries
            .insert(field.into(), MappingRule::Path(path.into()));
        self
    }

    /// Add a synchronous closure rule (builder style).
    pub fn sync_fn(
        mut self,
        field: impl Into<String>,
        f: impl Fn(&T) -> Result<Raw> + Send + Sync + 'static,
    ) -> Self {
        self.entries
            .insert(field.into(), MappingRule::Sync(Arc::new(f)));
        self
    }

    /// Add an asynchronous closure rule (builder style).
    pub fn async_fn(
        mut self,
        field: impl Into<String>,
        f: impl for<'a> Fn(&'a T) -> BoxFuture<'a, Result<Raw>> + Send + Sync + 'static,
    ) -> Self {
        self.entries
            .insert(field.into(), MappingRule::Async(Arc::new(f)));
        self
    }

    /// Look up the rule for a field.
    pub fn get(&self, field: &str) -> Option<&MappingRule<T>> {
        self.entries.get(field)
    }

    /// Field names in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of rules in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no rules.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a child type's table from this one, threading every rule
    /// through an accessor from the child to its embedded parent.
    ///
    /// This is the shallow-union inheritance of mapping tables as
    /// explicit composition: the child table starts as a fresh copy of
    /// the parent's rules (path rules carry over verbatim and traverse
    /// the child's own source document; closures are rewrapped through
    /// `up`), and entries the child adds afterwards win on key
    /// collision while keeping the parent's position. The parent table
    /// is never mutated.
    pub fn inherit<C: 'static>(&self, up: fn(&C) -> &T) -> MappingTable<C>
    where
        T: 'static,
    {
        // Closure inference needs the higher-ranked signature spelled
        // out before the unsizing coercion into AsyncFn.
        fn higher_ranked<C, F>(f: F) -> F
        where
            F: for<'a> Fn(&'a C) -> BoxFuture<'a, Result<Raw>>,
        {
            f
        }

        let mut entries = IndexMap::with_capacity(self.entries.len());
        for (field, rule) in &self.entries {
            let mapped = match rule {
                MappingRule::Path(path) => MappingRule::Path(path.clone()),
                MappingRule::Sync(f) => {
                    let f = f.clone();
                    MappingRule::Sync(Arc::new(move |child: &C| f(up(child))) as SyncFn<C>)
                }
                MappingRule::Async(f) => {
                    let f = f.clone();
                    MappingRule::Async(Arc::new(higher_ranked(move |child: &C| f(up(child)))))
                }
            };
            entries.insert(field.clone(), mapped);
        }
        MappingTable { entries }
    }
}

impl<T> Default for MappingTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for MappingTable<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T> fmt::Debug for MappingTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(&self.entries).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;

    struct Meta {
        id: &'static str,
    }

    struct Doc {
        meta: Meta,
    }

    fn parent_table() -> MappingTable<Meta> {
        MappingTable::new()
            .path("id", "meta.id")
            .sync_fn("kind", |_meta| Ok(Raw::from(json!("parent-kind"))))
    }

    #[test]
    fn test_builder_keeps_declaration_order() {
        let table = parent_table();
        let keys: Vec<_> = table.keys().collect();
        assert_eq!(keys, vec!["id", "kind"]);
    }

    #[test]
    fn test_builder_override_replaces_rule_in_place() {
        let table = parent_table().path("id", "meta.other_id");
        assert_eq!(table.len(), 2);
        match table.get("id") {
            Some(MappingRule::Path(path)) => assert_eq!(path, "meta.other_id"),
            other => panic!("expected path rule, got {other:?}"),
        }
        // Overriding keeps the original position.
        assert_eq!(table.keys().next(), Some("id"));
    }

    #[test]
    fn test_inherit_unions_parent_rules() {
        let parent = parent_table();
        let child: MappingTable<Doc> = parent
            .inherit(|doc: &Doc| &doc.meta)
            .sync_fn("kind", |_doc| Ok(Raw::from(json!("child-kind"))))
            .path("extra", "extra");

        let keys: Vec<_> = child.keys().collect();
        assert_eq!(keys, vec!["id", "kind", "extra"]);

        // Child override wins; the parent table is untouched.
        let doc = Doc {
            meta: Meta { id: "m1" },
        };
        match child.get("kind") {
            Some(MappingRule::Sync(f)) => match f(&doc).unwrap() {
                Raw::Value(v) => assert_eq!(v, json!("child-kind")),
                other => panic!("unexpected raw: {other:?}"),
            },
            other => panic!("expected sync rule, got {other:?}"),
        }
        assert_eq!(parent.len(), 2);
        match parent.get("kind") {
            Some(MappingRule::Sync(f)) => match f(&doc.meta).unwrap() {
                Raw::Value(v) => assert_eq!(v, json!("parent-kind")),
                other => panic!("unexpected raw: {other:?}"),
            },
            other => panic!("expected sync rule, got {other:?}"),
        }
    }

    #[test]
    fn test_inherited_sync_rule_sees_parent_through_accessor() {
        let parent: MappingTable<Meta> =
            MappingTable::new().sync_fn("id", |meta: &Meta| Ok(Raw::from(json!(meta.id))));
        let child: MappingTable<Doc> = parent.inherit(|doc| &doc.meta);

        let doc = Doc {
            meta: Meta { id: "m42" },
        };
        match child.get("id") {
            Some(MappingRule::Sync(f)) => match f(&doc).unwrap() {
                Raw::Value(v) => assert_eq!(v, json!("m42")),
                other => panic!("unexpected raw: {other:?}"),
            },
            other => panic!("expected sync rule, got {other:?}"),
        }
    }

    #[test]
    fn test_inherited_async_rule_sees_parent_through_accessor() {
        let parent: MappingTable<Meta> = MappingTable::new().async_fn("id", |meta: &Meta| {
            async move { Ok(Raw::from(json!(meta.id))) }.boxed()
        });
        let child: MappingTable<Doc> = parent.inherit(|doc| &doc.meta);

        let doc = Doc {
            meta: Meta { id: "m7" },
        };
        match child.get("id") {
            Some(MappingRule::Async(f)) => match futures::executor::block_on(f(&doc)).unwrap() {
                Raw::Value(v) => assert_eq!(v, json!("m7")),
                other => panic!("unexpected raw: {other:?}"),
            },
            other => panic!("expected async rule, got {other:?}"),
        }
    }
}
