use crate::{
    entities::{
        cart_line, order, order_item, order_vendor, CartLine, Order, OrderItem, OrderVendor,
        Product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    ids,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Order materializer: converts a cart's lines into an immutable order +
/// order-items snapshot.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Materializes an order from the cart identified by `input.cart_id`.
    ///
    /// Every cart line becomes one order item with its computed monetary
    /// fields copied verbatim (`initial_total` = total at copy time), tagged
    /// with the product's vendor; the vendor joins the order's vendor set.
    /// The copied fields accumulate into the order's aggregates, so
    /// immediately after creation the sum of item totals equals the order
    /// total. The whole sequence runs in one transaction.
    ///
    /// The cart's lines are left untouched; the cart is logically discarded
    /// by the caller.
    ///
    /// # Errors
    ///
    /// * `ServiceError::InvalidInput` - the cart has no lines
    /// * `ServiceError::InvalidOperation` - a cart product has no vendor
    #[instrument(skip(self, input), fields(cart_id = %input.cart_id))]
    pub async fn create_order(
        &self,
        input: CreateOrderInput,
    ) -> Result<order::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let lines = CartLine::find()
            .filter(cart_line::Column::CartId.eq(input.cart_id.as_str()))
            .order_by_asc(cart_line::Column::CreatedAt)
            .all(&txn)
            .await?;

        if lines.is_empty() {
            return Err(ServiceError::InvalidInput(format!(
                "Cart {} is empty",
                input.cart_id
            )));
        }

        let order_id = Uuid::new_v4();
        let oid = ids::public_id();

        let order = order::ActiveModel {
            id: Set(order_id),
            oid: Set(oid.clone()),
            buyer_id: Set(input.user_id),
            sub_total: Set(Decimal::ZERO),
            shipping_amount: Set(Decimal::ZERO),
            tax_fee: Set(Decimal::ZERO),
            service_fee: Set(Decimal::ZERO),
            total: Set(Decimal::ZERO),
            initial_total: Set(Decimal::ZERO),
            saved: Set(Decimal::ZERO),
            payment_status: Set(order::PaymentStatus::Pending),
            order_status: Set(order::OrderStatus::Pending),
            full_name: Set(Some(input.full_name)),
            email: Set(Some(input.email)),
            mobile: Set(Some(input.mobile)),
            address: Set(Some(input.address)),
            city: Set(Some(input.city)),
            state: Set(Some(input.state)),
            country: Set(Some(input.country)),
            gateway_session_id: Set(None),
            created_at: Set(Utc::now()),
        };
        order.insert(&txn).await?;

        let mut sub_total = Decimal::ZERO;
        let mut shipping_amount = Decimal::ZERO;
        let mut tax_fee = Decimal::ZERO;
        let mut service_fee = Decimal::ZERO;
        let mut total = Decimal::ZERO;
        let mut vendors: HashSet<Uuid> = HashSet::new();

        for line in &lines {
            let product = Product::find_by_id(line.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", line.product_id))
                })?;
            let vendor_id = product.vendor_id.ok_or_else(|| {
                ServiceError::InvalidOperation(format!(
                    "Product {} has no vendor and cannot be ordered",
                    product.id
                ))
            })?;

            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                oid: Set(ids::public_id()),
                order_id: Set(order_id),
                vendor_id: Set(vendor_id),
                product_id: Set(line.product_id),
                qty: Set(line.qty),
                unit_price: Set(line.unit_price),
                sub_total: Set(line.sub_total),
                shipping_amount: Set(line.shipping_amount),
                tax_fee: Set(line.tax_fee),
                service_fee: Set(line.service_fee),
                total: Set(line.total),
                initial_total: Set(line.total),
                saved: Set(Decimal::ZERO),
                country: Set(line.country.clone()),
                size: Set(line.size.clone()),
                color: Set(line.color.clone()),
                created_at: Set(Utc::now()),
            };
            item.insert(&txn).await?;

            sub_total += line.sub_total;
            shipping_amount += line.shipping_amount;
            tax_fee += line.tax_fee;
            service_fee += line.service_fee;
            total += line.total;
            vendors.insert(vendor_id);
        }

        for vendor_id in &vendors {
            let link = order_vendor::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                vendor_id: Set(*vendor_id),
            };
            link.insert(&txn).await?;
        }

        let mut order: order::ActiveModel = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or(ServiceError::InternalServerError)?
            .into();
        order.sub_total = Set(sub_total);
        order.shipping_amount = Set(shipping_amount);
        order.tax_fee = Set(tax_fee);
        order.service_fee = Set(service_fee);
        order.total = Set(total);
        order.initial_total = Set(total);
        let order = order.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;

        info!(
            "Created order {} from cart {}: {} items across {} vendors, total {}",
            oid,
            input.cart_id,
            lines.len(),
            vendors.len(),
            total
        );
        Ok(order)
    }

    /// Pure lookup by public order identifier.
    pub async fn get_order(&self, oid: &str) -> Result<order::Model, ServiceError> {
        Order::find()
            .filter(order::Column::Oid.eq(oid))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", oid)))
    }

    /// Order plus its item snapshots, for the checkout page.
    pub async fn get_order_with_items(&self, oid: &str) -> Result<OrderWithItems, ServiceError> {
        let order = self.get_order(oid).await?;
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(OrderWithItems { order, items })
    }

    /// Vendor ids participating in an order.
    pub async fn vendor_set(&self, order_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        let links = OrderVendor::find()
            .filter(order_vendor::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;
        Ok(links.into_iter().map(|l| l.vendor_id).collect())
    }

    /// Paid orders for a buyer, newest first.
    pub async fn list_paid_for_buyer(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<order::Model>, ServiceError> {
        Ok(Order::find()
            .filter(order::Column::BuyerId.eq(user_id))
            .filter(order::Column::PaymentStatus.eq(order::PaymentStatus::Paid))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Single paid order for a buyer, by public identifier.
    pub async fn get_paid_for_buyer(
        &self,
        user_id: Uuid,
        oid: &str,
    ) -> Result<order::Model, ServiceError> {
        Order::find()
            .filter(order::Column::BuyerId.eq(user_id))
            .filter(order::Column::PaymentStatus.eq(order::PaymentStatus::Paid))
            .filter(order::Column::Oid.eq(oid))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", oid)))
    }
}

/// Buyer snapshot captured at checkout time
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub cart_id: String,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

/// Order with its item snapshots
#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}
