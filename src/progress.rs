use std::sync::Arc;

use chrono::Utc;

use crate::error::{CoreError, CoreResult};
use crate::models::{Completion, ModuleId, Progress, UserId};
use crate::store::{Catalog, ProgressStore};

#[derive(Clone)]
pub struct ProgressTracker {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn ProgressStore>,
}

impl ProgressTracker {
    pub fn new(catalog: Arc<dyn Catalog>, store: Arc<dyn ProgressStore>) -> Self {
        Self { catalog, store }
    }

    /// Sets the (user, module) completion, creating the row on first use.
    /// Marking incomplete drops the completion stamp.
    pub async fn set_completion(
        &self,
        user_id: UserId,
        module_id: ModuleId,
        completed: bool,
    ) -> CoreResult<Progress> {
        if self.catalog.get_module(module_id).await?.is_none() {
            return Err(CoreError::module(module_id));
        }
        let completion = Completion::from_flag(completed, Utc::now());
        self.store
            .upsert_progress(user_id, module_id, completion)
            .await
            .map_err(|e| CoreError::from_store(e, CoreError::module(module_id)))
    }
}
