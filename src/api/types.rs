use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::OrderDetails;
use crate::entities::{
    addresses, categories, inventory_movements, order_events, order_items, payments,
    product_images, product_variants, products, refunds,
};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Common pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    50
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::db::User> for UserDto {
    fn from(user: crate::db::User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            is_active: user.is_active,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<categories::Model> for CategoryDto {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub is_active: bool,
    pub category_id: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<products::Model> for ProductDto {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            stock: model.stock,
            is_active: model.is_active,
            category_id: model.category_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VariantDto {
    pub id: i32,
    pub product_id: i32,
    pub sku: Option<String>,
    pub name: String,
    pub attributes: Option<serde_json::Value>,
    pub price_override: Option<Decimal>,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<product_variants::Model> for VariantDto {
    fn from(model: product_variants::Model) -> Self {
        let attributes = model
            .attributes
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok());
        Self {
            id: model.id,
            product_id: model.product_id,
            sku: model.sku,
            name: model.name,
            attributes,
            price_override: model.price_override,
            stock: model.stock,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageDto {
    pub id: i32,
    pub product_id: Option<i32>,
    pub variant_id: Option<i32>,
    pub url: String,
    pub alt_text: Option<String>,
    pub is_primary: bool,
    pub sort_order: i32,
    pub created_at: String,
}

impl From<product_images::Model> for ImageDto {
    fn from(model: product_images::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            variant_id: model.variant_id,
            url: model.url,
            alt_text: model.alt_text,
            is_primary: model.is_primary,
            sort_order: model.sort_order,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddressDto {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub phone: Option<String>,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<addresses::Model> for AddressDto {
    fn from(model: addresses::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            phone: model.phone,
            line1: model.line1,
            line2: model.line2,
            city: model.city,
            state: model.state,
            postal_code: model.postal_code,
            country: model.country,
            is_default: model.is_default,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderItemDto {
    pub id: i32,
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub created_at: String,
}

impl From<order_items::Model> for OrderItemDto {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            variant_id: model.variant_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
            line_total: model.line_total,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderEventDto {
    pub id: i32,
    pub event_type: String,
    pub description: Option<String>,
    pub actor_id: Option<i32>,
    pub created_at: String,
}

impl From<order_events::Model> for OrderEventDto {
    fn from(model: order_events::Model) -> Self {
        Self {
            id: model.id,
            event_type: model.event_type,
            description: model.description,
            actor_id: model.actor_id,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderDto {
    pub id: i32,
    pub user_id: Option<i32>,
    pub status: String,
    pub total_amount: Decimal,
    pub shipping_address_id: Option<i32>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<String>,
    pub delivered_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemDto>,
    pub events: Vec<OrderEventDto>,
}

impl From<OrderDetails> for OrderDto {
    fn from(details: OrderDetails) -> Self {
        let order = details.order;
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total_amount: order.total_amount,
            shipping_address_id: order.shipping_address_id,
            carrier: order.carrier,
            tracking_number: order.tracking_number,
            shipped_at: order.shipped_at,
            delivered_at: order.delivered_at,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items: details.items.into_iter().map(OrderItemDto::from).collect(),
            events: details
                .events
                .into_iter()
                .map(OrderEventDto::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MovementDto {
    pub id: i32,
    pub product_id: Option<i32>,
    pub variant_id: Option<i32>,
    pub change: i32,
    pub reason: String,
    pub ref_order_id: Option<i32>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<inventory_movements::Model> for MovementDto {
    fn from(model: inventory_movements::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            variant_id: model.variant_id,
            change: model.change,
            reason: model.reason,
            ref_order_id: model.ref_order_id,
            notes: model.notes,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentDto {
    pub id: i32,
    pub order_id: i32,
    pub provider: String,
    pub intent_id: Option<String>,
    pub status: String,
    pub amount: Decimal,
    pub currency: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<payments::Model> for PaymentDto {
    fn from(model: payments::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            provider: model.provider,
            intent_id: model.intent_id,
            status: model.status,
            amount: model.amount,
            currency: model.currency,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefundDto {
    pub id: i32,
    pub payment_id: i32,
    pub order_id: i32,
    pub provider_refund_id: Option<String>,
    pub status: String,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub created_at: String,
}

impl From<refunds::Model> for RefundDto {
    fn from(model: refunds::Model) -> Self {
        Self {
            id: model.id,
            payment_id: model.payment_id,
            order_id: model.order_id,
            provider_refund_id: model.provider_refund_id,
            status: model.status,
            amount: model.amount,
            reason: model.reason,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub total_orders: u64,
    pub database_ok: bool,
    pub payments_enabled: bool,
}
