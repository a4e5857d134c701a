//! # viewcast-adhoc
//!
//! Ad hoc projection on top of `viewcast-core`: wrap plain JSON
//! documents in an [`AdhocView`] so they project like typed view
//! models, and share in-flight projections through [`Deferred`].
//!
//! Own properties of a wrapped document pass through without mapping
//! rules; per-instance templates and mapping tables shape the output
//! and add derived fields.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod deferred;
pub mod view;

pub use deferred::{Deferred, DeferredResult};
pub use view::AdhocView;
