//! Agent tools and the per-role tool sets.

pub mod plan;
pub mod query;

pub use plan::{OptimizationTool, PlanLookupTool};
pub use query::QueryTool;

use std::sync::Arc;

use crate::domain::models::SpecialistRole;
use crate::domain::ports::{OptimizationEngine, PlanDirectory, RecordStore, Tool};

/// Platform backends the tools call into.
#[derive(Clone)]
pub struct ToolBackends {
    /// Tenant records.
    pub records: Arc<dyn RecordStore>,
    /// Loading plans.
    pub plans: Arc<dyn PlanDirectory>,
    /// Sequencing engine.
    pub optimizer: Arc<dyn OptimizationEngine>,
    /// Entities the query tool may read.
    pub allowed_entities: Vec<String>,
}

impl ToolBackends {
    /// Use one object for every backend.
    pub fn single<P>(platform: Arc<P>, allowed_entities: Vec<String>) -> Self
    where
        P: RecordStore + PlanDirectory + OptimizationEngine + 'static,
    {
        Self {
            records: platform.clone(),
            plans: platform.clone(),
            optimizer: platform,
            allowed_entities,
        }
    }

    /// The tool subset granted to `role`.
    ///
    /// Analytics gets a read-only record tool; it can still publish artifacts.
    pub fn tools_for(&self, role: SpecialistRole) -> Vec<Arc<dyn Tool>> {
        match role {
            SpecialistRole::Helper => {
                let query = QueryTool::new(self.records.clone(), self.allowed_entities.clone());
                vec![Arc::new(query) as Arc<dyn Tool>]
            }
            SpecialistRole::Analytics => {
                let query = QueryTool::new(self.records.clone(), self.allowed_entities.clone())
                    .read_only();
                vec![Arc::new(query) as Arc<dyn Tool>]
            }
            SpecialistRole::Optimizer => vec![
                Arc::new(PlanLookupTool::new(self.plans.clone())) as Arc<dyn Tool>,
                Arc::new(OptimizationTool::new(self.optimizer.clone())) as Arc<dyn Tool>,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::platform::InMemoryPlatform;

    #[test]
    fn test_tool_names_match_role() {
        let backends = ToolBackends::single(Arc::new(InMemoryPlatform::new()), vec![]);
        for role in SpecialistRole::ALL {
            let names: Vec<String> = backends
                .tools_for(role)
                .iter()
                .map(|t| t.spec().name)
                .collect();
            let expected: Vec<String> = role.tool_names().iter().map(ToString::to_string).collect();
            assert_eq!(names, expected);
        }
    }
}
