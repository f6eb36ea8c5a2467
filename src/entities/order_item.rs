use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-vendor, per-product snapshot of a cart line at order-creation time.
///
/// A given coupon may be recorded against an item at most once; the
/// `order_item_coupons` join table enforces the pair uniqueness.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub oid: String,
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub product_id: Uuid,
    pub qty: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub unit_price: Decimal,
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
    /// Total at copy time, before any coupon discount
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub initial_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub saved: Decimal,
    #[sea_orm(nullable)]
    pub country: Option<String>,
    #[sea_orm(nullable)]
    pub size: Option<String>,
    #[sea_orm(nullable)]
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::vendor::Entity",
        from = "Column::VendorId",
        to = "super::vendor::Column::Id"
    )]
    Vendor,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(has_many = "super::order_item_coupon::Entity")]
    AppliedCoupons,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl Related<super::order_item_coupon::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AppliedCoupons.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
