pub mod prelude;

pub mod addresses;
pub mod categories;
pub mod inventory_movements;
pub mod order_events;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod product_images;
pub mod product_variants;
pub mod products;
pub mod refunds;
pub mod users;
