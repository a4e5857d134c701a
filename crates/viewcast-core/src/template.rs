//! Template model and the template-merge algorithm
//!
//! A template controls the shape of a projection's output. It is a
//! recursive value: booleans include or exclude a field, the wildcard
//! `"*"` includes every known field recursively, and nested objects
//! shape the projection of nested projectable values.
//!
//! # Example
//!
//! ```json
//! {
//!   "id": true,
//!   "owner": { "name": true, "last_seen_at": false },
//!   "*": true
//! }
//! ```

use indexmap::IndexMap;
use serde::de::{MapAccess, Unexpected, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// The wildcard directive: include every known field not explicitly
/// excluded, propagating into nested templates.
pub const WILDCARD: &str = "*";

/// Per-field templates of a template object, in declaration order.
pub type FieldTemplates = IndexMap<String, Template>;

/// A recursive include/exclude/wildcard specification.
///
/// Serialized form: JSON boolean ⇔ [`Template::Include`], the string
/// `"*"` ⇔ [`Template::Wildcard`], JSON object ⇔ [`Template::Fields`]
/// (key order preserved). Any other JSON value is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    /// `true` includes the field (nested projectables use their default
    /// template); `false` excludes it.
    Include(bool),

    /// Include every known field, recursively.
    Wildcard,

    /// Per-key inclusion/exclusion/nesting applied to a nested
    /// projectable's own fields. May carry the [`WILDCARD`] meta-key.
    Fields(FieldTemplates),
}

impl Template {
    /// Whether this template marks its field for inclusion.
    ///
    /// `Include(false)` is the only excluding form; an empty `Fields`
    /// object still includes.
    pub fn is_included(&self) -> bool {
        !matches!(self, Template::Include(false))
    }

    /// Parse a template from a JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(Error::Template)
    }

    /// Parse a template object from a JSON value, rejecting non-object
    /// forms. Used for per-type default templates, which are always
    /// objects.
    pub fn fields_from_value(value: serde_json::Value) -> Result<FieldTemplates> {
        match Self::from_value(value)? {
            Template::Fields(fields) => Ok(fields),
            other => Err(Error::declaration(format!(
                "default template must be an object, got {other:?}"
            ))),
        }
    }
}

impl From<bool> for Template {
    fn from(include: bool) -> Self {
        Template::Include(include)
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Template::Include(include) => serializer.serialize_bool(*include),
            Template::Wildcard => serializer.serialize_str(WILDCARD),
            Template::Fields(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TemplateVisitor;

        impl<'de> Visitor<'de> for TemplateVisitor {
            type Value = Template;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "a boolean, the wildcard string \"*\", or a template object")
            }

            fn visit_bool<E: serde::de::Error>(self, v: bool) -> std::result::Result<Template, E> {
                Ok(Template::Include(v))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<Template, E> {
                if v == WILDCARD {
                    Ok(Template::Wildcard)
                } else {
                    Err(E::invalid_value(Unexpected::Str(v), &self))
                }
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Template, A::Error> {
                let mut fields =
                    FieldTemplates::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, Template>()? {
                    fields.insert(key, value);
                }
                Ok(Template::Fields(fields))
            }
        }

        deserializer.deserialize_any(TemplateVisitor)
    }
}

/// Merge a requested template into a projectable's default template.
///
/// `field_names` is the full set of fields the projectable knows about
/// (its mapping-table keys, plus passthrough keys for ad hoc wrappers);
/// wildcard requests expand against it.
///
/// The result is always a newly allocated map; neither input is mutated.
///
/// - no request, or a bare boolean: a copy of the defaults;
/// - [`Template::Wildcard`]: defaults plus every known field, each set to
///   `"*"` (or, for fields whose default already nests an object, given a
///   `"*": true` entry) so inclusion recurses to arbitrary depth;
/// - a template object: shallow union, request entries winning — this is
///   how callers exclude defaults via `false` or add non-default fields;
/// - a request object carrying a truthy `"*"` key: shallow union, then every
///   known field not explicitly excluded receives the `"*"` sub-template,
///   nested into its own template when one was given. Only the request can
///   trigger this expansion; a `"*"` entry in the defaults is an ordinary key.
pub fn merge<'a, I>(
    defaults: &FieldTemplates,
    field_names: I,
    request: Option<&Template>,
) -> FieldTemplates
where
    I: IntoIterator<Item = &'a str>,
{
    match request {
        Some(Template::Wildcard) => {
            let mut merged = defaults.clone();
            for name in field_names {
                match merged.get_mut(name) {
                    Some(Template::Fields(nested)) => {
                        nested.insert(WILDCARD.to_string(), Template::Include(true));
                    }
                    _ => {
                        merged.insert(name.to_string(), Template::Wildcard);
                    }
                }
            }
            merged
        }
        Some(Template::Fields(request_fields)) => {
            let mut merged = defaults.clone();
            for (key, value) in request_fields {
                merged.insert(key.clone(), value.clone());
            }

            // Expansion is a request-side directive: a "*" entry coming
            // from the defaults survives the union untouched.
            let wildcard_sub = match request_fields.get(WILDCARD) {
                Some(sub) if sub.is_included() => Some(sub.clone()),
                _ => None,
            };
            if let Some(sub) = wildcard_sub {
                merged.shift_remove(WILDCARD);
                for name in field_names {
                    match merged.get_mut(name) {
                        // Explicit nested templates gain the sub-template as
                        // their own "*" entry; other explicit sub-keys are
                        // untouched.
                        Some(Template::Fields(nested)) => {
                            nested.insert(WILDCARD.to_string(), sub.clone());
                        }
                        // Explicit exclusions survive a wildcard request.
                        Some(Template::Include(false)) => {}
                        _ => {
                            merged.insert(
                                name.to_string(),
                                Template::Fields(FieldTemplates::from_iter([(
                                    WILDCARD.to_string(),
                                    sub.clone(),
                                )])),
                            );
                        }
                    }
                }
            }
            merged
        }
        _ => defaults.clone(),
    }
}
