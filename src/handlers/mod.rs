pub mod carts;
pub mod common;
pub mod coupons;
pub mod orders;
pub mod payments;
pub mod products;
pub mod vendors;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    CartService, CatalogService, CouponService, NotificationService, OrderService, PaymentGateway,
    PaymentService, PricingService,
};
use std::sync::Arc;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub order: Arc<OrderService>,
    pub coupon: Arc<CouponService>,
    pub payment: Arc<PaymentService>,
    pub notification: Arc<NotificationService>,
}

impl AppServices {
    /// Builds the service container shared by all handlers.
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let pricing = PricingService::new(config.service_fee_percent);

        let catalog = Arc::new(CatalogService::new(db.clone()));
        let cart = Arc::new(CartService::new(
            db.clone(),
            event_sender.clone(),
            pricing,
        ));
        let order = Arc::new(OrderService::new(db.clone(), event_sender.clone()));
        let coupon = Arc::new(CouponService::new(db.clone(), event_sender.clone()));
        let notification = Arc::new(NotificationService::new(db.clone()));
        let payment = Arc::new(PaymentService::new(
            db,
            event_sender,
            gateway,
            order.clone(),
            notification.clone(),
        ));

        Self {
            catalog,
            cart,
            order,
            coupon,
            payment,
            notification,
        }
    }
}
