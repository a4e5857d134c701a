//! # viewcast-core
//!
//! Declarative projection of domain values into plain JSON view
//! objects.
//!
//! A type opts in by implementing [`ViewModel`]: it declares a default
//! [template](Template) (which fields appear when the caller asks for
//! nothing in particular) and a [mapping table](MappingTable) (how each
//! field's value is produced: a dot-path into the serialized source, a
//! synchronous closure, or an asynchronous closure). Every `ViewModel`
//! is automatically [`Projectable`], the object-safe trait the resolver
//! recurses through when fields yield nested projectables or sequences
//! of them.
//!
//! Callers shape the output per call with a request [`Template`]:
//! booleans include or exclude fields, `"*"` wildcards expand to every
//! known field and propagate depth-first, and nested maps recurse into
//! nested projections. Aggregation order is deterministic (output key
//! order follows the merged template) and governed by a
//! [`Concurrency`] policy, with a process-wide default configurable via
//! [`set_concurrency_limit`].
//!
//! ```rust,ignore
//! let view = video.project(Some(&Template::from_value(json!({
//!     "assets": {"owner": {"last_seen_at": true}}
//! }))?)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod concurrency;
pub mod error;
pub mod mapping;
pub mod path;
pub mod projectable;
pub mod resolver;
pub mod template;

pub use concurrency::{set_concurrency_limit, Concurrency, ProjectOptions};
pub use error::{Error, Result};
pub use mapping::{MappingRule, MappingTable, Raw};
pub use projectable::{Projectable, ViewModel};
pub use template::{FieldTemplates, Template, WILDCARD};
