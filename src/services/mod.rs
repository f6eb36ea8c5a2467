pub mod carts;
pub mod catalog;
pub mod coupons;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod pricing;

pub use carts::{CartService, CartSummary, UpsertLineInput};
pub use catalog::CatalogService;
pub use coupons::{ApplyCouponOutcome, CouponService, CreateCouponInput, UpdateCouponInput};
pub use notifications::NotificationService;
pub use orders::{CreateOrderInput, OrderService, OrderWithItems};
pub use payments::{
    DisabledGateway, GatewaySession, GatewaySessionStatus, PaymentGateway, PaymentOutcome,
    PaymentService, StripeGateway,
};
pub use pricing::{LineQuote, PricingService};
