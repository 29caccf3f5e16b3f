//! HTTP application wiring (axum router over the pipeline dispatcher).
//!
//! Layout:
//! - `adapter.rs`: axum ⇄ pipeline conversion and envelope → HTTP mapping
//! - this module: provider wiring, controller registration, router assembly

pub mod adapter;

use std::sync::Arc;

use axum::{Router, routing::get};
use serde_json::json;

use tillwerk_pipeline::{ConfigError, Dispatcher};
use tillwerk_plugins::{InMemoryPluginState, PluginManifest, PluginRegistry, PluginStateStore};
use tillwerk_providers::{
    AuthProvider, BillingProvider, InMemoryAuthProvider, MailProvider, Plan, PlanInterval,
    RecordingMailProvider, Session, StaticBillingProvider,
};
use tillwerk_schema::{ObjectSchema, Schema};

/// Injected collaborators the route table is built from.
pub struct AppServices {
    pub auth: Arc<dyn AuthProvider>,
    pub billing: Arc<dyn BillingProvider>,
    pub mail: Arc<dyn MailProvider>,
    pub plugins: Arc<PluginRegistry>,
    pub plugin_state: Arc<dyn PluginStateStore>,
}

/// Development defaults: in-memory providers with one session seeded from
/// `dev_token`, a fixed plan catalog, a recording mail transport, and the
/// built-in plugin catalog.
pub fn dev_services(dev_token: &str) -> anyhow::Result<AppServices> {
    let auth = InMemoryAuthProvider::new();
    auth.insert_session(Session::new(dev_token, "dev"));

    let billing = StaticBillingProvider::new(vec![
        Plan {
            id: "starter".to_string(),
            name: "Starter".to_string(),
            description: "One register, one workshop bay".to_string(),
            price_cents: 900,
            currency: "EUR".to_string(),
            interval: PlanInterval::Month,
        },
        Plan {
            id: "pro".to_string(),
            name: "Pro".to_string(),
            description: "Unlimited registers and bays".to_string(),
            price_cents: 9900,
            currency: "EUR".to_string(),
            interval: PlanInterval::Year,
        },
    ]);

    Ok(AppServices {
        auth: Arc::new(auth),
        billing: Arc::new(billing),
        mail: Arc::new(RecordingMailProvider::new()),
        plugins: Arc::new(PluginRegistry::new(builtin_plugins())?),
        plugin_state: Arc::new(InMemoryPluginState::new()),
    })
}

/// Register every feature controller and flatten the result into the
/// dispatcher. A route collision anywhere is a fatal startup error.
pub fn build_dispatcher(services: &AppServices) -> Result<Dispatcher, ConfigError> {
    let controllers = vec![
        tillwerk_session::controller(services.auth.clone())?,
        tillwerk_billing::controller(
            services.auth.clone(),
            services.billing.clone(),
            services.mail.clone(),
        )?,
        tillwerk_plugins::controller(
            services.auth.clone(),
            services.plugins.clone(),
            services.plugin_state.clone(),
        )?,
    ];
    Dispatcher::new(controllers)
}

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(adapter::dispatch)
        .with_state(dispatcher)
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(json!({"status": "ok"}))
}

fn builtin_plugins() -> Vec<PluginManifest> {
    vec![
        PluginManifest {
            name: "low-stock-alerts".to_string(),
            version: "1.2.0".to_string(),
            description: "Email when an item's stock falls below a threshold".to_string(),
            config_schema: Schema::object(
                ObjectSchema::new()
                    .field("threshold", Schema::number().optional().default_value(5))
                    .field("notify", Schema::email().placeholder("owner@example.com"))
                    .field("channel", Schema::enumeration(["email", "sms"])),
            ),
            default_enabled: true,
        },
        PluginManifest {
            name: "receipt-printer".to_string(),
            version: "0.4.1".to_string(),
            description: "Forward finished sales to a network receipt printer".to_string(),
            config_schema: Schema::object(
                ObjectSchema::new()
                    .field(
                        "printer_url",
                        Schema::url().placeholder("http://printer.local:9100"),
                    )
                    .field("copies", Schema::number().optional().default_value(1))
                    .field("footer", Schema::string().optional()),
            ),
            default_enabled: false,
        },
    ]
}
