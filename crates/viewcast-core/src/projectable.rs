//! Projection capability traits
//!
//! [`ViewModel`] is the declarative capability: a type declares its
//! default template and mapping table (typically in per-type `Lazy`
//! statics so the declaration cost is paid once per type). Every
//! `ViewModel` automatically implements [`Projectable`], the
//! object-safe surface the resolver recurses through.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::concurrency::ProjectOptions;
use crate::error::Result;
use crate::mapping::MappingTable;
use crate::resolver;
use crate::template::{FieldTemplates, Template};

/// Declarative projection capability.
///
/// Implementations provide a default template (which fields are
/// included when no request template is given) and a mapping table
/// (how each field's value is produced). Both are immutable
/// configuration; resolution reads them but never mutates them.
///
/// # Example
///
/// ```rust,ignore
/// impl ViewModel for Asset {
///     fn view_template(&self) -> &FieldTemplates {
///         static TEMPLATE: Lazy<FieldTemplates> = Lazy::new(|| {
///             Template::fields_from_value(json!({"id": true, "name": true})).unwrap()
///         });
///         &TEMPLATE
///     }
///
///     fn view_mappings(&self) -> &MappingTable<Self> {
///         static MAPPINGS: Lazy<MappingTable<Asset>> = Lazy::new(|| {
///             MappingTable::new()
///                 .path("id", "doc.id")
///                 .path("name", "doc.name")
///         });
///         &MAPPINGS
///     }
/// }
/// ```
pub trait ViewModel: Serialize + Send + Sync + Sized + 'static {
    /// Fields included when no request template is supplied.
    fn view_template(&self) -> &FieldTemplates;

    /// How each field's value is produced.
    fn view_mappings(&self) -> &MappingTable<Self>;

    /// Document whose own properties pass through without a mapping
    /// rule. `None` for ordinary typed projectables; ad hoc wrappers
    /// return their wrapped document.
    fn passthrough(&self) -> Option<&Value> {
        None
    }

    /// Request template to use when `project` is called without one.
    /// Ad hoc wrappers return a stored wildcard request here.
    fn stored_request(&self) -> Option<&Template> {
        None
    }
}

/// Object-safe projection surface.
///
/// This is the single entry point of the engine and the type the
/// resolver recurses through when a mapping rule produces a nested
/// projectable value.
#[async_trait]
pub trait Projectable: Send + Sync {
    /// Resolve this value into its plain JSON representation with
    /// explicit options.
    ///
    /// `request` semantics: `None` or `Include(true)` use the default
    /// template; `Wildcard` and `Fields` merge per the template-merge
    /// algorithm. Nested projections inherit `options`.
    async fn project_with(
        &self,
        request: Option<&Template>,
        options: ProjectOptions,
    ) -> Result<Value>;

    /// Resolve with the process-wide default options.
    async fn project(&self, request: Option<&Template>) -> Result<Value> {
        self.project_with(request, ProjectOptions::default()).await
    }
}

#[async_trait]
impl<T: ViewModel> Projectable for T {
    async fn project_with(
        &self,
        request: Option<&Template>,
        options: ProjectOptions,
    ) -> Result<Value> {
        resolver::resolve(self, request, options).await
    }
}
