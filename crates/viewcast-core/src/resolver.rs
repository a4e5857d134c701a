//! The projection resolver
//!
//! Stateless algorithm invoked by every projectable: merge the
//! requested template with the defaults, enumerate the resulting field
//! set, dispatch each field's mapping rule, normalize produced values
//! (recursing into nested projectables and sequences), and aggregate
//! everything into one plain JSON object under the active concurrency
//! policy.
//!
//! Output key order always matches merged-template enumeration order,
//! regardless of which asynchronous rules complete first; the first
//! field or element failure fails the whole call.

use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::{Map, Value};

use crate::concurrency::{Concurrency, ProjectOptions};
use crate::error::{Error, Result};
use crate::mapping::{MappingRule, Raw};
use crate::path::get_nested;
use crate::projectable::ViewModel;
use crate::template::{self, Template};

/// Resolve one projection over `owner`.
///
/// This is the building block behind
/// [`Projectable::project_with`](crate::projectable::Projectable::project_with);
/// it is public so custom wrappers can drive resolution directly.
pub async fn resolve<T: ViewModel>(
    owner: &T,
    request: Option<&Template>,
    options: ProjectOptions,
) -> Result<Value> {
    let defaults = owner.view_template();
    let table = owner.view_mappings();
    let passthrough = owner.passthrough();
    let request = request.or_else(|| owner.stored_request());

    // Fields eligible for wildcard inclusion: passthrough document keys
    // first, then mapping-table keys, first occurrence winning.
    let mut field_names: Vec<&str> = Vec::with_capacity(table.len());
    if let Some(Value::Object(doc)) = passthrough {
        field_names.extend(doc.keys().map(String::as_str));
    }
    for key in table.keys() {
        if !field_names.contains(&key) {
            field_names.push(key);
        }
    }

    let merged = template::merge(defaults, field_names.iter().copied(), request);

    // Path rules traverse the owner's source document: the passthrough
    // document when present, otherwise the owner serialized once per
    // call and only when an included field actually needs it.
    let needs_source = passthrough.is_none()
        && merged.iter().any(|(field, field_template)| {
            field_template.is_included()
                && matches!(table.get(field), Some(MappingRule::Path(_)))
        });
    let serialized: Option<Value> = if needs_source {
        Some(serde_json::to_value(owner).map_err(|e| {
            Error::declaration(format!("projection source unavailable: {e}"))
        })?)
    } else {
        None
    };
    let source: Option<&Value> = passthrough.or(serialized.as_ref());

    tracing::debug!(
        fields = merged.len(),
        concurrency = ?options.concurrency,
        "resolving projection"
    );

    let tasks: Vec<_> = merged
        .iter()
        .map(|(field, field_template)| {
            resolve_field(owner, passthrough, source, field, field_template, options)
        })
        .collect();
    let resolved = run_ordered(tasks, options.concurrency).await?;

    let mut output = Map::new();
    for ((field, _), value) in merged.iter().zip(resolved) {
        if let Some(value) = value {
            output.insert(field.clone(), value);
        }
    }
    Ok(Value::Object(output))
}

/// Resolve a single field to `Some(value)` or `None` (omit).
async fn resolve_field<T: ViewModel>(
    owner: &T,
    passthrough: Option<&Value>,
    source: Option<&Value>,
    field: &str,
    field_template: &Template,
    options: ProjectOptions,
) -> Result<Option<Value>> {
    if !field_template.is_included() {
        return Ok(None);
    }

    dispatch(owner, passthrough, source, field, field_template, options)
        .await
        .map_err(|e| Error::FieldResolution {
            field: field.to_string(),
            message: e.to_string(),
        })
}

/// Produce the field's raw value and normalize it.
async fn dispatch<T: ViewModel>(
    owner: &T,
    passthrough: Option<&Value>,
    source: Option<&Value>,
    field: &str,
    field_template: &Template,
    options: ProjectOptions,
) -> Result<Option<Value>> {
    // Own properties of a wrapped document pass through directly,
    // bypassing mapping dispatch.
    if let Some(Value::Object(doc)) = passthrough {
        if let Some(value) = doc.get(field) {
            return normalize(Raw::Value(value.clone()), field_template, options).await;
        }
    }

    // A truthy template entry with no rule is a silent omission.
    let Some(rule) = owner.view_mappings().get(field) else {
        return Ok(None);
    };

    let raw = match rule {
        MappingRule::Path(path) => match source.and_then(|doc| get_nested(doc, path)) {
            Some(value) => Raw::Value(value.clone()),
            None => Raw::Absent,
        },
        MappingRule::Sync(produce) => produce(owner)?,
        MappingRule::Async(produce) => produce(owner).await?,
    };

    tracing::trace!(field, "field value produced");
    normalize(raw, field_template, options).await
}

/// Normalize a raw value: recurse into nested projectables and
/// sequences, pass everything else through unchanged.
fn normalize<'a>(
    raw: Raw,
    field_template: &'a Template,
    options: ProjectOptions,
) -> BoxFuture<'a, Result<Option<Value>>> {
    async move {
        match raw {
            Raw::Absent => Ok(None),
            Raw::Value(value) => Ok(Some(value)),
            Raw::Nested(projectable) => projectable
                .project_with(Some(field_template), options)
                .await
                .map(Some),
            Raw::Many(items) => {
                let tasks: Vec<_> = items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| async move {
                        normalize(item, field_template, options).await.map_err(|e| {
                            Error::ElementResolution {
                                index,
                                message: e.to_string(),
                            }
                        })
                    })
                    .collect();
                let resolved = run_ordered(tasks, options.concurrency).await?;
                // A sequence keeps its length: absent elements become null.
                Ok(Some(Value::Array(
                    resolved
                        .into_iter()
                        .map(|value| value.unwrap_or(Value::Null))
                        .collect(),
                )))
            }
        }
    }
    .boxed()
}

/// Run the task list under the concurrency policy, resequencing results
/// into input order and failing fast on the first error.
async fn run_ordered<F, O>(tasks: Vec<F>, concurrency: Concurrency) -> Result<Vec<O>>
where
    F: std::future::Future<Output = Result<O>>,
{
    match concurrency {
        Concurrency::Serial => {
            let mut results = Vec::with_capacity(tasks.len());
            for task in tasks {
                results.push(task.await?);
            }
            Ok(results)
        }
        Concurrency::Unlimited => future::try_join_all(tasks).await,
        Concurrency::Bounded(limit) => {
            stream::iter(tasks)
                .buffered(limit.max(1))
                .try_collect()
                .await
        }
    }
}
