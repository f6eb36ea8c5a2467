use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_cart_lines_table::Migration),
            Box::new(m20240101_000003_create_order_tables::Migration),
            Box::new(m20240101_000004_create_coupon_tables::Migration),
            Box::new(m20240101_000005_create_tax_rates_table::Migration),
            Box::new(m20240101_000006_create_notifications_table::Migration),
        ]
    }
}

// Migration implementations
//
// Referential integrity is explicit per relationship: CASCADE for
// composition (an order owns its items, a coupon belongs to its vendor),
// SET NULL for attribution (a product survives its vendor or category).

mod m20240101_000001_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Categories::Title).string().not_null())
                        .col(
                            ColumnDef::new(Categories::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Categories::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Categories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Vendors::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Vendors::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Vendors::UserId).uuid().null())
                        .col(ColumnDef::new(Vendors::Name).string().not_null())
                        .col(ColumnDef::new(Vendors::Email).string().null())
                        .col(ColumnDef::new(Vendors::Description).text().null())
                        .col(ColumnDef::new(Vendors::Mobile).string().null())
                        .col(
                            ColumnDef::new(Vendors::Active)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Vendors::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Vendors::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Products::Pid)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Title).string().not_null())
                        .col(ColumnDef::new(Products::Slug).string().not_null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(
                            ColumnDef::new(Products::Price)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::OldPrice)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::ShippingAmount)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::StockQty)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Products::InStock)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Products::Status).string().not_null())
                        .col(
                            ColumnDef::new(Products::Featured)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Products::VendorId).uuid().null())
                        .col(ColumnDef::new(Products::CategoryId).uuid().null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_vendor")
                                .from(Products::Table, Products::VendorId)
                                .to(Vendors::Table, Vendors::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_category")
                                .from(Products::Table, Products::CategoryId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_slug")
                        .table(Products::Table)
                        .col(Products::Slug)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_vendor_id")
                        .table(Products::Table)
                        .col(Products::VendorId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Vendors::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Categories {
        Table,
        Id,
        Title,
        Slug,
        Active,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Vendors {
        Table,
        Id,
        UserId,
        Name,
        Email,
        Description,
        Mobile,
        Active,
        Slug,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Pid,
        Title,
        Slug,
        Description,
        Price,
        OldPrice,
        ShippingAmount,
        StockQty,
        InStock,
        Status,
        Featured,
        VendorId,
        CategoryId,
        CreatedAt,
    }
}

mod m20240101_000002_create_cart_lines_table {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_catalog_tables::Products;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_cart_lines_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CartLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CartLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CartLines::CartId).string().not_null())
                        .col(ColumnDef::new(CartLines::UserId).uuid().null())
                        .col(ColumnDef::new(CartLines::ProductId).uuid().not_null())
                        .col(ColumnDef::new(CartLines::Qty).integer().not_null())
                        .col(
                            ColumnDef::new(CartLines::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CartLines::SubTotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CartLines::ShippingAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CartLines::TaxFee)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CartLines::ServiceFee)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CartLines::Total)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(CartLines::Country).string().null())
                        .col(ColumnDef::new(CartLines::Size).string().null())
                        .col(ColumnDef::new(CartLines::Color).string().null())
                        .col(
                            ColumnDef::new(CartLines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CartLines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cart_lines_product")
                                .from(CartLines::Table, CartLines::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // One line per (session key, product) pair
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("uq_cart_lines_cart_product")
                        .table(CartLines::Table)
                        .col(CartLines::CartId)
                        .col(CartLines::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CartLines::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum CartLines {
        Table,
        Id,
        CartId,
        UserId,
        ProductId,
        Qty,
        UnitPrice,
        SubTotal,
        ShippingAmount,
        TaxFee,
        ServiceFee,
        Total,
        Country,
        Size,
        Color,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_order_tables {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_catalog_tables::{Products, Vendors};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Orders::Oid)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::BuyerId).uuid().null())
                        .col(
                            ColumnDef::new(Orders::SubTotal)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::ShippingAmount)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::TaxFee)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::ServiceFee)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::Total)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::InitialTotal)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::Saved)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::PaymentStatus).string().not_null())
                        .col(ColumnDef::new(Orders::OrderStatus).string().not_null())
                        .col(ColumnDef::new(Orders::FullName).string().null())
                        .col(ColumnDef::new(Orders::Email).string().null())
                        .col(ColumnDef::new(Orders::Mobile).string().null())
                        .col(ColumnDef::new(Orders::Address).string().null())
                        .col(ColumnDef::new(Orders::City).string().null())
                        .col(ColumnDef::new(Orders::State).string().null())
                        .col(ColumnDef::new(Orders::Country).string().null())
                        .col(ColumnDef::new(Orders::GatewaySessionId).string().null())
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_buyer_id")
                        .table(Orders::Table)
                        .col(Orders::BuyerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::Oid)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::VendorId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::Qty).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::SubTotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::ShippingAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::TaxFee)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::ServiceFee)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::Total)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::InitialTotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::Saved)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(OrderItems::Country).string().null())
                        .col(ColumnDef::new(OrderItems::Size).string().null())
                        .col(ColumnDef::new(OrderItems::Color).string().null())
                        .col(
                            ColumnDef::new(OrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_vendor")
                                .from(OrderItems::Table, OrderItems::VendorId)
                                .to(Vendors::Table, Vendors::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_product")
                                .from(OrderItems::Table, OrderItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_vendor_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::VendorId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderVendors::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderVendors::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderVendors::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderVendors::VendorId).uuid().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_vendors_order")
                                .from(OrderVendors::Table, OrderVendors::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_vendors_vendor")
                                .from(OrderVendors::Table, OrderVendors::VendorId)
                                .to(Vendors::Table, Vendors::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("uq_order_vendors_order_vendor")
                        .table(OrderVendors::Table)
                        .col(OrderVendors::OrderId)
                        .col(OrderVendors::VendorId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderVendors::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Orders {
        Table,
        Id,
        Oid,
        BuyerId,
        SubTotal,
        ShippingAmount,
        TaxFee,
        ServiceFee,
        Total,
        InitialTotal,
        Saved,
        PaymentStatus,
        OrderStatus,
        FullName,
        Email,
        Mobile,
        Address,
        City,
        State,
        Country,
        GatewaySessionId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum OrderItems {
        Table,
        Id,
        Oid,
        OrderId,
        VendorId,
        ProductId,
        Qty,
        UnitPrice,
        SubTotal,
        ShippingAmount,
        TaxFee,
        ServiceFee,
        Total,
        InitialTotal,
        Saved,
        Country,
        Size,
        Color,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderVendors {
        Table,
        Id,
        OrderId,
        VendorId,
    }
}

mod m20240101_000004_create_coupon_tables {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_catalog_tables::Vendors;
    use super::m20240101_000003_create_order_tables::OrderItems;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_coupon_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Coupons::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Coupons::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Coupons::VendorId).uuid().not_null())
                        .col(ColumnDef::new(Coupons::Code).string().not_null())
                        .col(
                            ColumnDef::new(Coupons::Discount)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Coupons::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Coupons::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_coupons_vendor")
                                .from(Coupons::Table, Coupons::VendorId)
                                .to(Vendors::Table, Vendors::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_coupons_vendor_id")
                        .table(Coupons::Table)
                        .col(Coupons::VendorId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CouponRedemptions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CouponRedemptions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CouponRedemptions::CouponId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CouponRedemptions::UserId).uuid().not_null())
                        .col(
                            ColumnDef::new(CouponRedemptions::RedeemedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_coupon_redemptions_coupon")
                                .from(CouponRedemptions::Table, CouponRedemptions::CouponId)
                                .to(Coupons::Table, Coupons::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("uq_coupon_redemptions_coupon_user")
                        .table(CouponRedemptions::Table)
                        .col(CouponRedemptions::CouponId)
                        .col(CouponRedemptions::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItemCoupons::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItemCoupons::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItemCoupons::OrderItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItemCoupons::CouponId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItemCoupons::AppliedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_item_coupons_item")
                                .from(OrderItemCoupons::Table, OrderItemCoupons::OrderItemId)
                                .to(OrderItems::Table, OrderItems::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_item_coupons_coupon")
                                .from(OrderItemCoupons::Table, OrderItemCoupons::CouponId)
                                .to(Coupons::Table, Coupons::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Idempotent application: a coupon attaches to an item at most once
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("uq_order_item_coupons_item_coupon")
                        .table(OrderItemCoupons::Table)
                        .col(OrderItemCoupons::OrderItemId)
                        .col(OrderItemCoupons::CouponId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItemCoupons::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CouponRedemptions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Coupons::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Coupons {
        Table,
        Id,
        VendorId,
        Code,
        Discount,
        Active,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum CouponRedemptions {
        Table,
        Id,
        CouponId,
        UserId,
        RedeemedAt,
    }

    #[derive(DeriveIden)]
    enum OrderItemCoupons {
        Table,
        Id,
        OrderItemId,
        CouponId,
        AppliedAt,
    }
}

mod m20240101_000005_create_tax_rates_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_tax_rates_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(TaxRates::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TaxRates::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TaxRates::Country)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(TaxRates::Rate)
                                .integer()
                                .not_null()
                                .default(5),
                        )
                        .col(
                            ColumnDef::new(TaxRates::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(TaxRates::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TaxRates::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum TaxRates {
        Table,
        Id,
        Country,
        Rate,
        Active,
        CreatedAt,
    }
}

mod m20240101_000006_create_notifications_table {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_catalog_tables::Vendors;
    use super::m20240101_000003_create_order_tables::{OrderItems, Orders};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_notifications_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Notifications::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Notifications::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Notifications::UserId).uuid().null())
                        .col(ColumnDef::new(Notifications::VendorId).uuid().null())
                        .col(ColumnDef::new(Notifications::OrderId).uuid().null())
                        .col(ColumnDef::new(Notifications::OrderItemId).uuid().null())
                        .col(
                            ColumnDef::new(Notifications::Seen)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Notifications::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_notifications_vendor")
                                .from(Notifications::Table, Notifications::VendorId)
                                .to(Vendors::Table, Vendors::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_notifications_order")
                                .from(Notifications::Table, Notifications::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_notifications_order_item")
                                .from(Notifications::Table, Notifications::OrderItemId)
                                .to(OrderItems::Table, OrderItems::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_notifications_vendor_id")
                        .table(Notifications::Table)
                        .col(Notifications::VendorId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Notifications::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Notifications {
        Table,
        Id,
        UserId,
        VendorId,
        OrderId,
        OrderItemId,
        Seen,
        CreatedAt,
    }
}
