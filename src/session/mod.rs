//! Per-run context shared by every curation step.
//!
//! [`CatalogSession`] owns the catalog handle, the executor (and through
//! it the API call counter) and the authenticated user id. All remote
//! traffic goes through [`CatalogSession::call`].

mod lookup;
mod pager;
mod writer;

pub use pager::LIKED_SONGS;

use std::future::Future;
use std::sync::Arc;

use crate::catalog::{CatalogError, MusicCatalog};
use crate::remote::{RemoteCallExecutor, RemoteError, RetryPolicy};

/// Progress is reported per chunk of this many entities in fan-out lookups.
pub const FAN_OUT_CHUNK: usize = 20;

pub struct CatalogSession {
    catalog: Arc<dyn MusicCatalog>,
    executor: RemoteCallExecutor,
    user_id: String,
}

impl CatalogSession {
    /// Resolve the current user and build the session.
    pub async fn connect(
        catalog: Arc<dyn MusicCatalog>,
        policy: RetryPolicy,
    ) -> Result<Self, RemoteError> {
        let executor = RemoteCallExecutor::new(policy);
        let handle = catalog.clone();
        let user_id = executor
            .execute("current_user", move || {
                let catalog = handle.clone();
                async move { catalog.current_user_id().await }
            })
            .await?;

        log::info!("Catalog connection successful (user: {})", user_id);

        Ok(Self {
            catalog,
            executor,
            user_id,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Successful remote calls so far, including the user lookup.
    pub fn api_calls(&self) -> u64 {
        self.executor.counter().get()
    }

    pub fn reset_api_calls(&self) {
        self.executor.counter().reset();
    }

    /// Run one catalog operation through the executor.
    pub(crate) async fn call<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RemoteError>
    where
        F: FnMut(Arc<dyn MusicCatalog>) -> Fut,
        Fut: Future<Output = Result<T, CatalogError>> + Send + 'static,
        T: Send + 'static,
    {
        let catalog = &self.catalog;
        self.executor
            .execute(label, || op(catalog.clone()))
            .await
    }
}
