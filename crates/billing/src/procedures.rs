//! Billing procedures.

use std::sync::Arc;

use async_trait::async_trait;

use tillwerk_pipeline::{Context, Contribution, Procedure, ProcedureOutcome, Request};
use tillwerk_providers::{BillingProvider, Plan};

/// Capability key under which the plan catalog is contributed.
pub const PLANS_KEY: &str = "plans";

/// Fetches the plan catalog from the payment provider and contributes it for
/// the handler (and any later procedure) to read.
pub struct LoadPlans {
    billing: Arc<dyn BillingProvider>,
}

impl LoadPlans {
    pub fn new(billing: Arc<dyn BillingProvider>) -> LoadPlans {
        LoadPlans { billing }
    }
}

#[async_trait]
impl Procedure for LoadPlans {
    fn name(&self) -> &str {
        "load_plans"
    }

    async fn run(&self, _request: &Request, _context: &Context) -> anyhow::Result<ProcedureOutcome> {
        let plans = self.billing.list_plans().await?;
        Ok(ProcedureOutcome::Contribute(
            Contribution::new().with(PLANS_KEY, plans),
        ))
    }
}

/// Typed read of the contributed plan catalog.
pub fn loaded_plans(context: &Context) -> Option<&Vec<Plan>> {
    context.get::<Vec<Plan>>(PLANS_KEY)
}
