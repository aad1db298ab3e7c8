// Data schedule step: one tick is one module fan-out

use std::sync::Arc;

use crate::core::modules::{ModuleName, ModulesUpdate};
use crate::error::Result;

use super::UpdateStep;

/// Forced data update. `None` (or an empty list) updates every module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    pub modules: Option<Vec<ModuleName>>,
}

impl UpdateRequest {
    pub fn all() -> Self {
        Self { modules: None }
    }

    pub fn only(modules: Vec<ModuleName>) -> Self {
        Self {
            modules: Some(modules),
        }
    }
}

pub struct DataUpdateStep {
    modules: Arc<ModulesUpdate>,
}

impl DataUpdateStep {
    pub fn new(modules: Arc<ModulesUpdate>) -> Self {
        Self { modules }
    }
}

impl UpdateStep for DataUpdateStep {
    type Params = UpdateRequest;

    async fn update(&mut self, params: Option<UpdateRequest>) -> Result<()> {
        let subset = params.and_then(|request| request.modules);
        self.modules.update_data(subset.as_deref()).await;
        Ok(())
    }
}
