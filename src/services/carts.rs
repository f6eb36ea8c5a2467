use crate::{
    entities::{cart_line, CartLine, Product},
    errors::ServiceError,
    events::{Event, EventSender},
    services::pricing::PricingService,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Cart store: a keyed mutable collection of pending line items addressed by
/// an opaque session key (`cart_id`) and an optional owning identity.
///
/// Every mutation recomputes the line's derived monetary fields through the
/// pricing calculator; nothing derived is ever trusted from input.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    pricing: PricingService,
}

impl CartService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        pricing: PricingService,
    ) -> Self {
        Self {
            db,
            event_sender,
            pricing,
        }
    }

    /// Creates or replaces the cart line for (cart_id, product_id).
    ///
    /// An existing line is overwritten in place; the invariant of at most one
    /// line per (session key, product) pair never produces duplicates.
    ///
    /// # Errors
    ///
    /// * `ServiceError::NotFound` - unknown product reference
    /// * `ServiceError::InvalidInput` - non-positive quantity
    #[instrument(skip(self, input), fields(cart_id = %input.cart_id, product_id = %input.product_id))]
    pub async fn upsert_line(
        &self,
        input: UpsertLineInput,
    ) -> Result<cart_line::Model, ServiceError> {
        let txn = self.db.begin().await?;

        Product::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        let tax_rate = self
            .pricing
            .tax_rate_for_country(&txn, input.country.as_deref())
            .await?;
        let quote = self
            .pricing
            .quote_line(input.price, input.qty, input.shipping_amount, tax_rate)?
            .rounded();

        let existing = CartLine::find()
            .filter(cart_line::Column::CartId.eq(input.cart_id.as_str()))
            .filter(cart_line::Column::ProductId.eq(input.product_id))
            .one(&txn)
            .await?;

        let line = if let Some(line) = existing {
            let mut line: cart_line::ActiveModel = line.into();
            line.user_id = Set(input.user_id);
            line.qty = Set(input.qty);
            line.unit_price = Set(input.price);
            line.sub_total = Set(quote.sub_total);
            line.shipping_amount = Set(quote.shipping_amount);
            line.tax_fee = Set(quote.tax_fee);
            line.service_fee = Set(quote.service_fee);
            line.total = Set(quote.total);
            line.country = Set(input.country.clone());
            line.size = Set(input.size.clone());
            line.color = Set(input.color.clone());
            line.updated_at = Set(Utc::now());
            line.update(&txn).await?
        } else {
            let line = cart_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                cart_id: Set(input.cart_id.clone()),
                user_id: Set(input.user_id),
                product_id: Set(input.product_id),
                qty: Set(input.qty),
                unit_price: Set(input.price),
                sub_total: Set(quote.sub_total),
                shipping_amount: Set(quote.shipping_amount),
                tax_fee: Set(quote.tax_fee),
                service_fee: Set(quote.service_fee),
                total: Set(quote.total),
                country: Set(input.country.clone()),
                size: Set(input.size.clone()),
                color: Set(input.color.clone()),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
            };
            line.insert(&txn).await?
        };

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartLineUpserted {
                cart_id: input.cart_id.clone(),
                product_id: input.product_id,
            })
            .await;

        info!(
            "Upserted cart line {} in cart {}: qty {}",
            line.id, input.cart_id, input.qty
        );
        Ok(line)
    }

    /// Returns all lines for the session, optionally filtered to an owning
    /// identity.
    pub async fn list_lines(
        &self,
        cart_id: &str,
        user_id: Option<Uuid>,
    ) -> Result<Vec<cart_line::Model>, ServiceError> {
        let mut query = CartLine::find().filter(cart_line::Column::CartId.eq(cart_id));
        if let Some(user_id) = user_id {
            query = query.filter(cart_line::Column::UserId.eq(user_id));
        }

        Ok(query
            .order_by_asc(cart_line::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Returns every stored cart line across all sessions.
    pub async fn list_all_lines(&self) -> Result<Vec<cart_line::Model>, ServiceError> {
        Ok(CartLine::find()
            .order_by_asc(cart_line::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Single-line lookup. Fails NotFound if the line is absent or owned by a
    /// different identity.
    pub async fn get_line(
        &self,
        cart_id: &str,
        line_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<cart_line::Model, ServiceError> {
        let mut query = CartLine::find_by_id(line_id)
            .filter(cart_line::Column::CartId.eq(cart_id));
        if let Some(user_id) = user_id {
            query = query.filter(cart_line::Column::UserId.eq(user_id));
        }

        query.one(&*self.db).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("Cart line {} not found in cart {}", line_id, cart_id))
        })
    }

    /// Removes one line under the same ownership rule as `get_line`.
    #[instrument(skip(self))]
    pub async fn delete_line(
        &self,
        cart_id: &str,
        line_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let line = self.get_line(cart_id, line_id, user_id).await?;
        line.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartLineRemoved {
                cart_id: cart_id.to_string(),
                line_id,
            })
            .await;

        info!("Deleted cart line {} from cart {}", line_id, cart_id);
        Ok(())
    }

    /// Sums the monetary fields across all matching lines.
    ///
    /// An empty cart yields a zero-filled summary, not an error.
    pub async fn summarize(
        &self,
        cart_id: &str,
        user_id: Option<Uuid>,
    ) -> Result<CartSummary, ServiceError> {
        let lines = self.list_lines(cart_id, user_id).await?;

        let mut summary = CartSummary::default();
        for line in &lines {
            summary.sub_total += line.sub_total;
            summary.shipping_amount += line.shipping_amount;
            summary.tax_fee += line.tax_fee;
            summary.service_fee += line.service_fee;
            summary.total += line.total;
        }

        Ok(summary)
    }
}

/// Input for creating or replacing a cart line
#[derive(Debug, Deserialize)]
pub struct UpsertLineInput {
    pub cart_id: String,
    pub product_id: Uuid,
    pub user_id: Option<Uuid>,
    pub qty: i32,
    pub price: Decimal,
    pub shipping_amount: Decimal,
    pub country: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Aggregated totals across a cart's lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub sub_total: Decimal,
    pub shipping_amount: Decimal,
    pub tax_fee: Decimal,
    pub service_fee: Decimal,
    pub total: Decimal,
}
