use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable priced snapshot created from a cart at checkout.
///
/// The buyer fields are captured at order-creation time; payment_status
/// transitions forward only (pending -> paid) and never regresses.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Short random public identifier, distinct from the row id
    #[sea_orm(unique)]
    pub oid: String,
    #[sea_orm(nullable)]
    pub buyer_id: Option<Uuid>,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub sub_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub shipping_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub tax_fee: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub service_fee: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,
    /// Total before any coupon discount
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub initial_total: Decimal,
    /// Amount saved through coupon discounts
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub saved: Decimal,

    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,

    // Buyer snapshot
    #[sea_orm(nullable)]
    pub full_name: Option<String>,
    #[sea_orm(nullable)]
    pub email: Option<String>,
    #[sea_orm(nullable)]
    pub mobile: Option<String>,

    // Shipping address snapshot
    #[sea_orm(nullable)]
    pub address: Option<String>,
    #[sea_orm(nullable)]
    pub city: Option<String>,
    #[sea_orm(nullable)]
    pub state: Option<String>,
    #[sea_orm(nullable)]
    pub country: Option<String>,

    /// Payment-gateway checkout session token, set by beginCheckout
    #[sea_orm(nullable)]
    pub gateway_session_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::order_vendor::Entity")]
    OrderVendors,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::order_vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderVendors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Payment status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Fulfillment status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "fulfilled")]
    Fulfilled,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}
