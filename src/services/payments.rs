use crate::{
    config::AppConfig,
    entities::{order, Order},
    errors::ServiceError,
    events::{Event, EventSender},
    services::notifications::NotificationService,
    services::orders::OrderService,
};
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// A checkout session created on the payment gateway.
#[derive(Debug, Clone)]
pub struct GatewaySession {
    pub id: String,
    pub url: String,
}

/// Terminal view of a gateway session's payment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewaySessionStatus {
    Paid,
    Unpaid,
    Cancelled,
}

/// External payment collaborator. The core only ever creates a session and
/// later asks for its status; everything else is the gateway's business.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, order: &order::Model) -> Result<GatewaySession, ServiceError>;
    async fn session_status(&self, session_id: &str)
        -> Result<GatewaySessionStatus, ServiceError>;
}

/// Stripe Checkout implementation of the gateway contract.
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    currency: String,
    success_url: String,
    cancel_url: String,
}

impl StripeGateway {
    pub fn new(secret_key: String, config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
            currency: config.default_currency.to_lowercase(),
            success_url: config.checkout_success_url.clone(),
            cancel_url: config.checkout_cancel_url.clone(),
        }
    }

    fn amount_in_minor_units(total: Decimal) -> Result<i64, ServiceError> {
        (total * Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
            .ok_or_else(|| {
                ServiceError::InvalidOperation(format!("Order total {} is not chargeable", total))
            })
    }
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(&self, order: &order::Model) -> Result<GatewaySession, ServiceError> {
        let amount = Self::amount_in_minor_units(order.total)?;
        let email = order.email.clone().unwrap_or_default();
        let params = [
            ("mode", "payment".to_string()),
            ("customer_email", email),
            (
                "line_items[0][price_data][currency]",
                self.currency.clone(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                format!("Order {}", order.oid),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                amount.to_string(),
            ),
            ("line_items[0][quantity]", "1".to_string()),
            (
                "success_url",
                self.success_url.replace("{order_oid}", &order.oid),
            ),
            (
                "cancel_url",
                self.cancel_url.replace("{order_oid}", &order.oid),
            ),
        ];

        let response = self
            .client
            .post(format!("{}/checkout/sessions", STRIPE_API_BASE))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("stripe: {}", e)))?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "stripe returned {}",
                response.status()
            )));
        }

        let session: StripeSession = response
            .json()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("stripe: {}", e)))?;

        Ok(GatewaySession {
            url: session.url.unwrap_or_default(),
            id: session.id,
        })
    }

    async fn session_status(
        &self,
        session_id: &str,
    ) -> Result<GatewaySessionStatus, ServiceError> {
        let response = self
            .client
            .get(format!(
                "{}/checkout/sessions/{}",
                STRIPE_API_BASE, session_id
            ))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("stripe: {}", e)))?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "stripe returned {}",
                response.status()
            )));
        }

        let session: StripeSession = response
            .json()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("stripe: {}", e)))?;

        Ok(match session.payment_status.as_deref() {
            Some("paid") => GatewaySessionStatus::Paid,
            _ if session.status.as_deref() == Some("expired") => GatewaySessionStatus::Cancelled,
            _ => GatewaySessionStatus::Unpaid,
        })
    }
}

/// Stand-in gateway used when no secret key is configured. Every call
/// reports the gateway as unavailable.
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn create_session(&self, _order: &order::Model) -> Result<GatewaySession, ServiceError> {
        Err(ServiceError::ExternalServiceError(
            "Payment gateway is not configured".to_string(),
        ))
    }

    async fn session_status(
        &self,
        _session_id: &str,
    ) -> Result<GatewaySessionStatus, ServiceError> {
        Err(ServiceError::ExternalServiceError(
            "Payment gateway is not configured".to_string(),
        ))
    }
}

/// Result of a payment confirmation. Terminal-but-unsuccessful gateway
/// states are informational, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Confirmed,
    AlreadyPaid,
    Unpaid,
    Cancelled,
}

impl PaymentOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Confirmed => "Payment successful",
            Self::AlreadyPaid => "Already paid",
            Self::Unpaid => "Payment is not complete",
            Self::Cancelled => "Payment was cancelled",
        }
    }
}

/// Payment bridge: drives the external gateway and owns the forward-only
/// payment-status transition.
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    gateway: Arc<dyn PaymentGateway>,
    orders: Arc<OrderService>,
    notifications: Arc<NotificationService>,
}

impl PaymentService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        gateway: Arc<dyn PaymentGateway>,
        orders: Arc<OrderService>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            db,
            event_sender,
            gateway,
            orders,
            notifications,
        }
    }

    /// Creates a gateway checkout session for the order, persists the
    /// gateway's session token on it, and returns the redirect URL.
    #[instrument(skip(self))]
    pub async fn begin_checkout(&self, order_oid: &str) -> Result<String, ServiceError> {
        let order = self.orders.get_order(order_oid).await?;
        let session = self.gateway.create_session(&order).await?;

        let mut active: order::ActiveModel = order.into();
        active.gateway_session_id = Set(Some(session.id.clone()));
        active.update(&*self.db).await?;

        info!(
            "Created gateway session {} for order {}",
            session.id, order_oid
        );
        Ok(session.url)
    }

    /// Queries the gateway for the session's status. On "paid", and only if
    /// the order is still pending, transitions payment_status to paid and
    /// fans out notifications; any other gateway state leaves the order
    /// untouched.
    #[instrument(skip(self))]
    pub async fn confirm_payment(
        &self,
        order_oid: &str,
        session_id: &str,
    ) -> Result<PaymentOutcome, ServiceError> {
        let order = self.orders.get_order(order_oid).await?;
        let status = self.gateway.session_status(session_id).await?;

        match status {
            GatewaySessionStatus::Paid => {
                if order.payment_status != order::PaymentStatus::Pending {
                    return Ok(PaymentOutcome::AlreadyPaid);
                }

                let txn = self.db.begin().await?;

                // Re-read inside the transaction so two concurrent confirms
                // cannot both observe "pending".
                let current = Order::find()
                    .filter(order::Column::Oid.eq(order_oid))
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Order {} not found", order_oid))
                    })?;
                if current.payment_status != order::PaymentStatus::Pending {
                    return Ok(PaymentOutcome::AlreadyPaid);
                }

                let order_id = current.id;
                let mut active: order::ActiveModel = current.into();
                active.payment_status = Set(order::PaymentStatus::Paid);
                let paid = active.update(&txn).await?;

                self.notifications.notify_order_paid(&txn, &paid).await?;

                txn.commit().await?;

                self.event_sender
                    .send_or_log(Event::PaymentConfirmed(order_id))
                    .await;

                info!("Order {} transitioned to paid", order_oid);
                Ok(PaymentOutcome::Confirmed)
            }
            GatewaySessionStatus::Unpaid => {
                warn!("Gateway reports session {} unpaid", session_id);
                Ok(PaymentOutcome::Unpaid)
            }
            GatewaySessionStatus::Cancelled => Ok(PaymentOutcome::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_in_minor_units() {
        assert_eq!(
            StripeGateway::amount_in_minor_units(dec!(230.20)).unwrap(),
            23020
        );
        assert_eq!(
            StripeGateway::amount_in_minor_units(dec!(0.01)).unwrap(),
            1
        );
        assert_eq!(StripeGateway::amount_in_minor_units(dec!(0)).unwrap(), 0);
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(PaymentOutcome::Confirmed.message(), "Payment successful");
        assert_eq!(PaymentOutcome::AlreadyPaid.message(), "Already paid");
        assert_eq!(
            PaymentOutcome::Unpaid.message(),
            "Payment is not complete"
        );
        assert_eq!(
            PaymentOutcome::Cancelled.message(),
            "Payment was cancelled"
        );
    }
}
