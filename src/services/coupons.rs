use crate::{
    entities::{
        coupon, coupon_redemption, order, order_item, order_item_coupon, Coupon, CouponRedemption,
        Order, OrderItem, OrderItemCoupon, Vendor,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Result of a coupon application. All three outcomes are reported as 2xx
/// responses; only missing orders/coupons are errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApplyCouponOutcome {
    /// Discount applied to `items_discounted` qualifying items
    Applied {
        saved: Decimal,
        items_discounted: u32,
    },
    /// Every qualifying item already carries this coupon; nothing changed
    AlreadyActivated,
    /// The order has no items from the coupon's vendor; nothing changed
    NoMatchingItems,
}

impl ApplyCouponOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "Coupon activated",
            Self::AlreadyActivated => "Coupon already activated",
            Self::NoMatchingItems => "Order has no items from this coupon's vendor",
        }
    }
}

/// Coupon engine: applies a vendor-scoped percentage discount to qualifying
/// order items exactly once per (coupon, item).
#[derive(Clone)]
pub struct CouponService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CouponService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Applies the coupon identified by `code` (case-insensitively) to the
    /// order identified by `order_oid`.
    ///
    /// For every order item belonging to the coupon's vendor that does not
    /// already carry the coupon: discount = item.total x discount% is
    /// subtracted from the item's total and sub_total, added to its saved
    /// amount, and mirrored onto the order's aggregates. Item and order
    /// adjustments commit in one transaction; a partially discounted state is
    /// never visible to readers.
    ///
    /// Re-applying the same coupon reports `AlreadyActivated` without
    /// touching any state.
    ///
    /// # Errors
    ///
    /// * `ServiceError::NotFound` - unknown order, or no active coupon with
    ///   that code
    #[instrument(skip(self))]
    pub async fn apply_coupon(
        &self,
        order_oid: &str,
        code: &str,
        user_id: Option<Uuid>,
    ) -> Result<ApplyCouponOutcome, ServiceError> {
        let txn = self.db.begin().await?;

        let order = Order::find()
            .filter(order::Column::Oid.eq(order_oid))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_oid)))?;

        let coupon = Coupon::find()
            .filter(coupon::Column::Active.eq(true))
            .filter(
                Expr::expr(Func::lower(Expr::col(coupon::Column::Code)))
                    .eq(code.to_lowercase()),
            )
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Coupon does not exist".to_string()))?;

        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .filter(order_item::Column::VendorId.eq(coupon.vendor_id))
            .all(&txn)
            .await?;

        if items.is_empty() {
            return Ok(ApplyCouponOutcome::NoMatchingItems);
        }

        let already_applied: HashSet<Uuid> = OrderItemCoupon::find()
            .filter(order_item_coupon::Column::CouponId.eq(coupon.id))
            .filter(
                order_item_coupon::Column::OrderItemId
                    .is_in(items.iter().map(|i| i.id).collect::<Vec<_>>()),
            )
            .all(&txn)
            .await?
            .into_iter()
            .map(|link| link.order_item_id)
            .collect();

        let pending: Vec<_> = items
            .into_iter()
            .filter(|item| !already_applied.contains(&item.id))
            .collect();

        if pending.is_empty() {
            return Ok(ApplyCouponOutcome::AlreadyActivated);
        }

        let discount_percent = Decimal::from(coupon.discount);
        let mut total_saved = Decimal::ZERO;
        let items_discounted = pending.len() as u32;

        for item in pending {
            let discount = (item.total * discount_percent / Decimal::ONE_HUNDRED).round_dp(2);
            let item_id = item.id;
            let (item_total, item_sub_total, item_saved) =
                (item.total, item.sub_total, item.saved);

            let mut item: order_item::ActiveModel = item.into();
            item.total = Set(item_total - discount);
            item.sub_total = Set(item_sub_total - discount);
            item.saved = Set(item_saved + discount);
            item.update(&txn).await?;

            let link = order_item_coupon::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_item_id: Set(item_id),
                coupon_id: Set(coupon.id),
                applied_at: Set(Utc::now()),
            };
            link.insert(&txn).await?;

            total_saved += discount;
        }

        let buyer = user_id.or(order.buyer_id);
        let (order_total, order_sub_total, order_saved) =
            (order.total, order.sub_total, order.saved);
        let mut order: order::ActiveModel = order.into();
        order.total = Set(order_total - total_saved);
        order.sub_total = Set(order_sub_total - total_saved);
        order.saved = Set(order_saved + total_saved);
        let order = order.update(&txn).await?;

        if let Some(user_id) = buyer {
            self.record_redemption(&txn, coupon.id, user_id).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CouponApplied {
                order_id: order.id,
                coupon_id: coupon.id,
            })
            .await;

        info!(
            "Applied coupon {} to order {}: {} items, saved {}",
            coupon.code, order_oid, items_discounted, total_saved
        );
        Ok(ApplyCouponOutcome::Applied {
            saved: total_saved,
            items_discounted,
        })
    }

    async fn record_redemption(
        &self,
        conn: &impl sea_orm::ConnectionTrait,
        coupon_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ServiceError> {
        let existing = CouponRedemption::find()
            .filter(coupon_redemption::Column::CouponId.eq(coupon_id))
            .filter(coupon_redemption::Column::UserId.eq(user_id))
            .one(conn)
            .await?;

        if existing.is_none() {
            let redemption = coupon_redemption::ActiveModel {
                id: Set(Uuid::new_v4()),
                coupon_id: Set(coupon_id),
                user_id: Set(user_id),
                redeemed_at: Set(Utc::now()),
            };
            redemption.insert(conn).await?;
        }
        Ok(())
    }

    // ---- Vendor coupon administration ----

    /// Coupons belonging to a vendor, newest first.
    pub async fn list_for_vendor(
        &self,
        vendor_id: Uuid,
    ) -> Result<Vec<coupon::Model>, ServiceError> {
        Ok(Coupon::find()
            .filter(coupon::Column::VendorId.eq(vendor_id))
            .order_by_desc(coupon::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Creates a coupon for a vendor.
    ///
    /// # Errors
    ///
    /// * `ServiceError::NotFound` - unknown vendor
    /// * `ServiceError::InvalidInput` - discount outside 1..=100
    #[instrument(skip(self, input), fields(vendor_id = %input.vendor_id))]
    pub async fn create(&self, input: CreateCouponInput) -> Result<coupon::Model, ServiceError> {
        if !(1..=100).contains(&input.discount) {
            return Err(ServiceError::InvalidInput(format!(
                "discount must be between 1 and 100 percent, got {}",
                input.discount
            )));
        }

        Vendor::find_by_id(input.vendor_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Vendor {} not found", input.vendor_id))
            })?;

        let coupon = coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            vendor_id: Set(input.vendor_id),
            code: Set(input.code),
            discount: Set(input.discount),
            active: Set(input.active),
            created_at: Set(Utc::now()),
        };

        let coupon = coupon.insert(&*self.db).await?;
        info!("Created coupon {} for vendor {}", coupon.code, input.vendor_id);
        Ok(coupon)
    }

    /// Single coupon lookup scoped to its vendor.
    pub async fn get_for_vendor(
        &self,
        vendor_id: Uuid,
        coupon_id: Uuid,
    ) -> Result<coupon::Model, ServiceError> {
        Coupon::find_by_id(coupon_id)
            .filter(coupon::Column::VendorId.eq(vendor_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {} not found", coupon_id)))
    }

    /// Updates a vendor's coupon in place.
    pub async fn update(
        &self,
        vendor_id: Uuid,
        coupon_id: Uuid,
        input: UpdateCouponInput,
    ) -> Result<coupon::Model, ServiceError> {
        if let Some(discount) = input.discount {
            if !(1..=100).contains(&discount) {
                return Err(ServiceError::InvalidInput(format!(
                    "discount must be between 1 and 100 percent, got {}",
                    discount
                )));
            }
        }

        let coupon = self.get_for_vendor(vendor_id, coupon_id).await?;
        let mut coupon: coupon::ActiveModel = coupon.into();
        if let Some(code) = input.code {
            coupon.code = Set(code);
        }
        if let Some(discount) = input.discount {
            coupon.discount = Set(discount);
        }
        if let Some(active) = input.active {
            coupon.active = Set(active);
        }

        Ok(coupon.update(&*self.db).await?)
    }

    /// Deletes a vendor's coupon.
    pub async fn delete(&self, vendor_id: Uuid, coupon_id: Uuid) -> Result<(), ServiceError> {
        let coupon = self.get_for_vendor(vendor_id, coupon_id).await?;
        coupon.delete(&*self.db).await?;
        Ok(())
    }
}

/// Input for creating a coupon
#[derive(Debug, Deserialize)]
pub struct CreateCouponInput {
    pub vendor_id: Uuid,
    pub code: String,
    pub discount: i32,
    pub active: bool,
}

/// Input for updating a coupon; unset fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCouponInput {
    pub code: Option<String>,
    pub discount: Option<i32>,
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_outcome_messages() {
        assert_eq!(
            ApplyCouponOutcome::Applied {
                saved: dec!(46.04),
                items_discounted: 1
            }
            .message(),
            "Coupon activated"
        );
        assert_eq!(
            ApplyCouponOutcome::AlreadyActivated.message(),
            "Coupon already activated"
        );
        assert_eq!(
            ApplyCouponOutcome::NoMatchingItems.message(),
            "Order has no items from this coupon's vendor"
        );
    }

    #[test]
    fn test_discount_math_reference_scenario() {
        // 20% off an item totalling 230.20 saves 46.04
        let discount = (dec!(230.20) * Decimal::from(20) / Decimal::ONE_HUNDRED).round_dp(2);
        assert_eq!(discount, dec!(46.04));
        assert_eq!(dec!(230.20) - discount, dec!(184.16));
    }
}
