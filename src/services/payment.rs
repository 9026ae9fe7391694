//! Domain service for payment intents, webhook reconciliation and refunds.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::clients::stripe::{StripeClient, verify_webhook_signature};
use crate::db::{OrderError, OrderStatus, StatusChange, Store};
use crate::entities::{payments, refunds};

/// Errors specific to payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment provider is not configured")]
    NotConfigured,

    #[error("Order {0} not found")]
    OrderNotFound(i32),

    #[error("Order in status '{0}' cannot be paid")]
    NotPayable(String),

    #[error("Order in status '{0}' cannot be refunded")]
    NotRefundable(String),

    #[error("No succeeded payment found for order {0}")]
    NoSucceededPayment(i32),

    #[error("Webhook rejected: {0}")]
    InvalidWebhook(&'static str),

    #[error("Payment provider error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for PaymentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<OrderError> for PaymentError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::OrderNotFound(id) => Self::OrderNotFound(id),
            other => Self::Database(other.to_string()),
        }
    }
}

/// Provider webhook payload, reduced to the fields the service acts on.
#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    object: WebhookObject,
}

#[derive(Debug, Deserialize)]
struct WebhookObject {
    id: String,
}

/// Result of a successful intent creation, handed back to the client.
#[derive(Debug, Clone)]
pub struct CreatedIntent {
    pub payment: payments::Model,
    pub client_secret: String,
    pub publishable_key: String,
}

pub struct PaymentService {
    store: Store,
    stripe: Option<Arc<StripeClient>>,
    currency: String,
}

impl PaymentService {
    #[must_use]
    pub const fn new(store: Store, stripe: Option<Arc<StripeClient>>, currency: String) -> Self {
        Self {
            store,
            stripe,
            currency,
        }
    }

    fn stripe(&self) -> Result<&Arc<StripeClient>, PaymentError> {
        self.stripe.as_ref().ok_or(PaymentError::NotConfigured)
    }

    /// Create a provider intent for a pending order's total and persist the
    /// local payment row keyed by the intent id.
    pub async fn create_intent(&self, order_id: i32) -> Result<CreatedIntent, PaymentError> {
        let stripe = self.stripe()?;

        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(PaymentError::OrderNotFound(order_id))?;

        if order.status != OrderStatus::Pending.as_str() {
            return Err(PaymentError::NotPayable(order.status));
        }

        let intent = stripe
            .create_payment_intent(to_minor_units(order.total_amount), &self.currency, order.id)
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let payment = self
            .store
            .create_payment(
                order.id,
                order.total_amount,
                &self.currency,
                Some(&intent.id),
                "stripe",
            )
            .await?;

        info!(order_id, intent_id = %intent.id, "Payment intent created");

        Ok(CreatedIntent {
            payment,
            client_secret: intent.client_secret,
            publishable_key: stripe.publishable_key().to_string(),
        })
    }

    /// Verify and apply a provider webhook. A succeeded intent marks the
    /// payment succeeded and transitions a still-pending order to "paid";
    /// the pending check keeps duplicate deliveries to a single transition.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<(), PaymentError> {
        let stripe = self.stripe()?;

        verify_webhook_signature(payload, signature_header, stripe.webhook_secret())
            .map_err(PaymentError::InvalidWebhook)?;

        let event: WebhookEvent = serde_json::from_slice(payload)
            .map_err(|_| PaymentError::InvalidWebhook("Malformed event payload"))?;

        match event.event_type.as_str() {
            "payment_intent.succeeded" => {
                let intent_id = &event.data.object.id;
                let Some(payment) = self.store.get_payment_by_intent(intent_id).await? else {
                    warn!(intent_id = %intent_id, "Webhook for unknown payment intent");
                    return Ok(());
                };

                self.store.update_payment_status(payment.id, "succeeded").await?;

                let transitioned = self
                    .store
                    .mark_order_paid_if_pending(payment.order_id, "Payment received")
                    .await?;

                if transitioned {
                    info!(order_id = payment.order_id, "Order marked paid via webhook");
                }
            }
            "payment_intent.payment_failed" => {
                let intent_id = &event.data.object.id;
                if let Some(payment) = self.store.get_payment_by_intent(intent_id).await? {
                    self.store.update_payment_status(payment.id, "failed").await?;
                    info!(order_id = payment.order_id, "Payment marked failed via webhook");
                }
            }
            other => {
                tracing::debug!(event_type = %other, "Ignoring webhook event");
            }
        }

        Ok(())
    }

    /// Refund a paid order through the provider, persist the refund row and
    /// force the order into "refunded".
    pub async fn refund(
        &self,
        order_id: i32,
        amount: Decimal,
        reason: Option<&str>,
        actor_id: Option<i32>,
    ) -> Result<refunds::Model, PaymentError> {
        let stripe = self.stripe()?;

        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(PaymentError::OrderNotFound(order_id))?;

        let status: OrderStatus = order
            .status
            .parse()
            .map_err(|_| PaymentError::NotRefundable(order.status.clone()))?;
        if !status.is_refundable() {
            return Err(PaymentError::NotRefundable(order.status));
        }

        let payment = self
            .store
            .succeeded_payment_for_order(order_id)
            .await?
            .ok_or(PaymentError::NoSucceededPayment(order_id))?;

        let intent_id = payment
            .intent_id
            .as_deref()
            .ok_or(PaymentError::NoSucceededPayment(order_id))?;

        let provider_refund = stripe
            .create_refund(intent_id, to_minor_units(amount), reason)
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let refund_status = if provider_refund.status == "succeeded" {
            "succeeded"
        } else {
            "pending"
        };

        let refund = self
            .store
            .create_refund(
                payment.id,
                order_id,
                amount,
                reason,
                Some(&provider_refund.id),
                refund_status,
            )
            .await?;

        self.store
            .update_order_status(
                order_id,
                StatusChange {
                    status: OrderStatus::Refunded,
                    carrier: None,
                    tracking_number: None,
                    actor_id,
                },
            )
            .await?;

        info!(order_id, refund_id = %provider_refund.id, "Refund issued");

        Ok(refund)
    }
}

/// Convert a decimal amount to the provider's smallest currency unit.
fn to_minor_units(amount: Decimal) -> i64 {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(Decimal::new(30000, 2)), 30000);
        assert_eq!(to_minor_units(Decimal::new(1999, 2)), 1999);
        assert_eq!(to_minor_units(Decimal::from(5)), 500);
    }
}
