//! Deferred, shareable projections
//!
//! A [`Deferred`] starts a projection once and lets any number of
//! consumers await the same outcome. The result (or error) is memoized
//! behind a shared future, so the underlying mapping rules run exactly
//! once no matter how many times `wait` is called or how many clones
//! exist.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use viewcast_core::{Error, Projectable, Template};

use crate::view::AdhocView;

/// Outcome of a deferred projection. Errors are shared between all
/// waiters, hence the `Arc`.
pub type DeferredResult = std::result::Result<Value, Arc<Error>>;

/// A projection scheduled once, awaited many times.
#[derive(Clone)]
pub struct Deferred {
    inner: Shared<BoxFuture<'static, DeferredResult>>,
}

impl Deferred {
    /// Defer a projection lazily: resolution starts when the first
    /// waiter polls, and every waiter observes the same outcome.
    pub fn new(view: AdhocView, request: Option<Template>) -> Self {
        let inner = async move { view.project(request.as_ref()).await.map_err(Arc::new) }
            .boxed()
            .shared();
        Self { inner }
    }

    /// Defer a projection eagerly: resolution starts on a spawned task
    /// immediately, and `wait` joins it.
    pub fn spawn(view: AdhocView, request: Option<Template>) -> Self {
        tracing::debug!("spawning deferred projection");
        let handle = tokio::spawn(async move {
            view.project(request.as_ref()).await.map_err(Arc::new)
        });
        let inner = async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) => Err(Arc::new(Error::mapping(format!(
                    "projection task aborted: {join_error}"
                )))),
            }
        }
        .boxed()
        .shared();
        Self { inner }
    }

    /// Await the projection's memoized outcome.
    pub async fn wait(&self) -> DeferredResult {
        self.inner.clone().await
    }
}
