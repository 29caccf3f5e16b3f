//! Billing feature: plan catalog and receipt mail.

pub mod procedures;

pub use procedures::{LoadPlans, PLANS_KEY, loaded_plans};

use std::sync::Arc;

use serde_json::json;

use tillwerk_core::Envelope;
use tillwerk_pipeline::{Action, ConfigError, Controller, handler_fn};
use tillwerk_providers::{AuthProvider, BillingProvider, MailMessage, MailProvider};
use tillwerk_schema::{ObjectSchema, Schema};
use tillwerk_session::RequireSession;

/// Build the `/billing` controller.
pub fn controller(
    auth: Arc<dyn AuthProvider>,
    billing: Arc<dyn BillingProvider>,
    mail: Arc<dyn MailProvider>,
) -> Result<Controller, ConfigError> {
    Controller::new("billing", "/billing")
        .action(
            "plans",
            Action::query("/plans")
                .procedure(RequireSession::new(auth.clone()))
                .procedure(LoadPlans::new(billing))
                .handler(handler_fn(|input| async move {
                    let Some(plans) = loaded_plans(&input.context) else {
                        anyhow::bail!("plan catalog capability missing from context");
                    };
                    Ok(Envelope::success(json!({ "plans": plans })))
                })),
        )
        .action(
            "receipt",
            Action::mutation("/receipts")
                .input(receipt_schema())
                .procedure(RequireSession::new(auth))
                .handler(handler_fn(move |input| {
                    let mail = mail.clone();
                    async move {
                        let to = json_str(&input.input, "to")?;
                        let order = json_str(&input.input, "order")?;
                        let Some(total_cents) =
                            input.input.get("total_cents").and_then(|v| v.as_i64())
                        else {
                            // the number node admits fractions; receipts are
                            // denominated in whole cents
                            return Ok(Envelope::failure(
                                "total_cents must be a whole number of cents",
                                tillwerk_core::ErrorCode::ValidationError,
                                None,
                            ));
                        };

                        let total = format_cents(total_cents);
                        let message = MailMessage {
                            to: to.to_string(),
                            subject: format!("Receipt for order {order}"),
                            html: format!("<p>Order {order}: total {total}.</p>"),
                            text: format!("Order {order}: total {total}."),
                            scheduled_at: None,
                        };
                        let delivery = mail.send(message).await?;
                        Ok(Envelope::success(delivery))
                    }
                })),
        )
        .build()
}

fn receipt_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field("to", Schema::email().placeholder("customer@example.com"))
        .field("order", Schema::string())
        .field("total_cents", Schema::number())
}

fn json_str<'a>(value: &'a serde_json::Value, key: &str) -> anyhow::Result<&'a str> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("validated input is missing '{key}'"))
}

fn format_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, (cents % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tillwerk_core::ErrorCode;
    use tillwerk_pipeline::{Dispatcher, Method, Request};
    use tillwerk_providers::{
        InMemoryAuthProvider, Plan, PlanInterval, RecordingMailProvider, Session,
        StaticBillingProvider,
    };
    use tillwerk_session::SESSION_HEADER;

    fn starter_plan() -> Plan {
        Plan {
            id: "starter".to_string(),
            name: "Starter".to_string(),
            description: "One register, one workshop bay".to_string(),
            price_cents: 900,
            currency: "EUR".to_string(),
            interval: PlanInterval::Month,
        }
    }

    fn fixture() -> (Arc<InMemoryAuthProvider>, Arc<RecordingMailProvider>, Dispatcher) {
        let auth = Arc::new(InMemoryAuthProvider::new());
        auth.insert_session(Session::new("caller", "mia"));
        let billing = Arc::new(StaticBillingProvider::new(vec![starter_plan()]));
        let mail = Arc::new(RecordingMailProvider::new());

        let controller = controller(auth.clone(), billing, mail.clone()).unwrap();
        let dispatcher = Dispatcher::new(vec![controller]).unwrap();
        (auth, mail, dispatcher)
    }

    #[tokio::test]
    async fn plans_come_from_the_provider_via_the_context() {
        let (_auth, _mail, dispatcher) = fixture();

        let envelope = dispatcher
            .dispatch(
                Request::new(Method::Get, "/billing/plans").with_header(SESSION_HEADER, "caller"),
            )
            .await;

        match envelope {
            Envelope::Success { data } => {
                assert_eq!(data["plans"][0]["id"], "starter");
                assert_eq!(data["plans"][0]["interval"], "month");
            }
            Envelope::Failure { .. } => panic!("expected success"),
        }
    }

    #[tokio::test]
    async fn plans_without_session_never_reach_the_provider() {
        let (_auth, _mail, dispatcher) = fixture();

        let envelope = dispatcher
            .dispatch(Request::new(Method::Get, "/billing/plans"))
            .await;
        assert_eq!(envelope.code(), Some(ErrorCode::Unauthorized));
    }

    #[tokio::test]
    async fn receipt_mutation_sends_one_mail() {
        let (_auth, mail, dispatcher) = fixture();

        let envelope = dispatcher
            .dispatch(
                Request::new(Method::Post, "/billing/receipts")
                    .with_header(SESSION_HEADER, "caller")
                    .with_body(serde_json::json!({
                        "to": "customer@example.com",
                        "order": "WS-1042",
                        "total_cents": 12950,
                    })),
            )
            .await;

        assert!(envelope.is_success());
        let sent = mail.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "customer@example.com");
        assert_eq!(sent[0].subject, "Receipt for order WS-1042");
        assert!(sent[0].text.contains("129.50"));
    }

    #[tokio::test]
    async fn receipt_with_bad_email_is_rejected_before_any_mail() {
        let (_auth, mail, dispatcher) = fixture();

        let envelope = dispatcher
            .dispatch(
                Request::new(Method::Post, "/billing/receipts")
                    .with_header(SESSION_HEADER, "caller")
                    .with_body(serde_json::json!({
                        "to": "not-an-email",
                        "order": "WS-1042",
                        "total_cents": 100,
                    })),
            )
            .await;

        assert_eq!(envelope.code(), Some(ErrorCode::ValidationError));
        assert!(mail.sent().is_empty());
    }
}
