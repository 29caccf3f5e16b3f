//! Payment/billing provider boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Subscription plan exposed by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub currency: String,
    pub interval: PlanInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanInterval {
    Month,
    Year,
}

/// Billing/payment provider boundary. Injected, never constructed by the
/// pipeline.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn list_plans(&self) -> anyhow::Result<Vec<Plan>>;
}

/// Fixed plan catalog for development and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticBillingProvider {
    plans: Vec<Plan>,
}

impl StaticBillingProvider {
    pub fn new(plans: Vec<Plan>) -> StaticBillingProvider {
        StaticBillingProvider { plans }
    }
}

#[async_trait]
impl BillingProvider for StaticBillingProvider {
    async fn list_plans(&self) -> anyhow::Result<Vec<Plan>> {
        Ok(self.plans.clone())
    }
}
