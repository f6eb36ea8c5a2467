use crate::{
    entities::{notification, order, order_item, Notification, OrderItem},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Notification fan-out and vendor notification feeds.
#[derive(Clone)]
pub struct NotificationService {
    db: Arc<DatabaseConnection>,
}

impl NotificationService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates one notification per order item for its vendor, plus one for
    /// the buyer when the order has a known buyer identity. Runs on the
    /// caller's connection so it joins the payment transaction.
    pub async fn notify_order_paid(
        &self,
        conn: &impl ConnectionTrait,
        order: &order::Model,
    ) -> Result<(), ServiceError> {
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(conn)
            .await?;

        for item in &items {
            let notification = notification::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(None),
                vendor_id: Set(Some(item.vendor_id)),
                order_id: Set(Some(order.id)),
                order_item_id: Set(Some(item.id)),
                seen: Set(false),
                created_at: Set(Utc::now()),
            };
            notification.insert(conn).await?;
        }

        if let Some(buyer_id) = order.buyer_id {
            let notification = notification::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(Some(buyer_id)),
                vendor_id: Set(None),
                order_id: Set(Some(order.id)),
                order_item_id: Set(None),
                seen: Set(false),
                created_at: Set(Utc::now()),
            };
            notification.insert(conn).await?;
        }

        Ok(())
    }

    /// A vendor's notifications filtered by seen flag, newest first.
    pub async fn list_for_vendor(
        &self,
        vendor_id: Uuid,
        seen: bool,
    ) -> Result<Vec<notification::Model>, ServiceError> {
        Ok(Notification::find()
            .filter(notification::Column::VendorId.eq(vendor_id))
            .filter(notification::Column::Seen.eq(seen))
            .order_by_desc(notification::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Marks one of a vendor's notifications as seen.
    #[instrument(skip(self))]
    pub async fn mark_seen(
        &self,
        vendor_id: Uuid,
        notification_id: Uuid,
    ) -> Result<notification::Model, ServiceError> {
        let notification = Notification::find_by_id(notification_id)
            .filter(notification::Column::VendorId.eq(vendor_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Notification {} not found", notification_id))
            })?;

        let mut notification: notification::ActiveModel = notification.into();
        notification.seen = Set(true);
        Ok(notification.update(&*self.db).await?)
    }
}
