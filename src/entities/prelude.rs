pub use super::addresses::Entity as Addresses;
pub use super::categories::Entity as Categories;
pub use super::inventory_movements::Entity as InventoryMovements;
pub use super::order_events::Entity as OrderEvents;
pub use super::order_items::Entity as OrderItems;
pub use super::orders::Entity as Orders;
pub use super::payments::Entity as Payments;
pub use super::product_images::Entity as ProductImages;
pub use super::product_variants::Entity as ProductVariants;
pub use super::products::Entity as Products;
pub use super::refunds::Entity as Refunds;
pub use super::users::Entity as Users;
