pub mod cart_line;
pub mod category;
pub mod coupon;
pub mod coupon_redemption;
pub mod notification;
pub mod order;
pub mod order_item;
pub mod order_item_coupon;
pub mod order_vendor;
pub mod product;
pub mod tax_rate;
pub mod vendor;

pub use cart_line::Entity as CartLine;
pub use cart_line::Model as CartLineModel;
pub use category::Entity as Category;
pub use category::Model as CategoryModel;
pub use coupon::Entity as Coupon;
pub use coupon::Model as CouponModel;
pub use coupon_redemption::Entity as CouponRedemption;
pub use notification::Entity as Notification;
pub use notification::Model as NotificationModel;
pub use order::Entity as Order;
pub use order::Model as OrderModel;
pub use order_item::Entity as OrderItem;
pub use order_item::Model as OrderItemModel;
pub use order_item_coupon::Entity as OrderItemCoupon;
pub use order_vendor::Entity as OrderVendor;
pub use product::Entity as Product;
pub use product::Model as ProductModel;
pub use tax_rate::Entity as TaxRate;
pub use vendor::Entity as Vendor;
pub use vendor::Model as VendorModel;
