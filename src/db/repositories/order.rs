use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, LoaderTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use thiserror::Error;

use crate::entities::{
    inventory_movements, order_events, order_items, orders, product_variants, products,
};

/// Order lifecycle states. Stored as plain strings; no transition graph is
/// enforced beyond change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// Statuses from which a refund may be issued.
    #[must_use]
    pub const fn is_refundable(self) -> bool {
        matches!(self, Self::Paid | Self::Shipped | Self::Delivered)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            other => Err(OrderError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("An order needs at least one line")]
    EmptyOrder,

    #[error("Order {0} not found")]
    OrderNotFound(i32),

    #[error("Product {0} not found")]
    ProductNotFound(i32),

    #[error("Variant {0} not found")]
    VariantNotFound(i32),

    #[error("Variant {variant_id} does not belong to product {product_id}")]
    VariantMismatch { variant_id: i32, product_id: i32 },

    #[error("Product '{0}' is not active")]
    InactiveProduct(String),

    #[error("Variant '{0}' is not active")]
    InactiveVariant(String),

    #[error("Quantity must be greater than zero, got {0}")]
    InvalidQuantity(i32),

    #[error("Insufficient stock for '{name}': requested {requested}, available {available}")]
    InsufficientStock {
        name: String,
        requested: i32,
        available: i32,
    },

    #[error("Unknown order status '{0}'")]
    InvalidStatus(String),

    #[error(transparent)]
    Database(#[from] DbErr),
}

/// One requested line of a new order.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity: i32,
}

/// Input for the order-creation transaction.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<i32>,
    pub shipping_address_id: Option<i32>,
    pub lines: Vec<OrderLine>,
    pub actor_id: Option<i32>,
    /// When false (privileged actors), inactive products/variants are accepted.
    pub enforce_active: bool,
}

/// Fields accepted by a status transition.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub actor_id: Option<i32>,
}

/// An order together with its lines and timeline.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub order: orders::Model,
    pub items: Vec<order_items::Model>,
    pub events: Vec<order_events::Model>,
}

pub struct OrderRepository {
    conn: DatabaseConnection,
}

impl OrderRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create an order atomically: validate every line, snapshot unit prices,
    /// decrement stock, and write the order, its items, one inventory
    /// movement per line and the "created" timeline event in one transaction.
    /// Any failing line rolls the whole operation back.
    pub async fn create(&self, input: NewOrder) -> Result<OrderDetails, OrderError> {
        if input.lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let txn = self.conn.begin().await?;
        let now = chrono::Utc::now().to_rfc3339();

        let mut total_amount = Decimal::ZERO;
        let mut pending_items: Vec<order_items::ActiveModel> = Vec::new();
        let mut pending_movements: Vec<inventory_movements::ActiveModel> = Vec::new();

        for line in &input.lines {
            if line.quantity <= 0 {
                return Err(OrderError::InvalidQuantity(line.quantity));
            }

            let product = products::Entity::find_by_id(line.product_id)
                .one(&txn)
                .await?
                .ok_or(OrderError::ProductNotFound(line.product_id))?;

            if input.enforce_active && !product.is_active {
                return Err(OrderError::InactiveProduct(product.name));
            }

            let variant = match line.variant_id {
                Some(variant_id) => {
                    let variant = product_variants::Entity::find_by_id(variant_id)
                        .one(&txn)
                        .await?
                        .ok_or(OrderError::VariantNotFound(variant_id))?;

                    if variant.product_id != product.id {
                        return Err(OrderError::VariantMismatch {
                            variant_id,
                            product_id: product.id,
                        });
                    }
                    if input.enforce_active && !variant.is_active {
                        return Err(OrderError::InactiveVariant(variant.name));
                    }
                    Some(variant)
                }
                None => None,
            };

            let unit_price = variant
                .as_ref()
                .and_then(|v| v.price_override)
                .unwrap_or(product.price);

            let available = variant.as_ref().map_or(product.stock, |v| v.stock);
            if available < line.quantity {
                let name = variant.as_ref().map_or(product.name.clone(), |v| {
                    format!("{} / {}", product.name, v.name)
                });
                return Err(OrderError::InsufficientStock {
                    name,
                    requested: line.quantity,
                    available,
                });
            }

            let line_total = unit_price * Decimal::from(line.quantity);
            total_amount += line_total;

            // Decrement the stock field the availability check read from.
            if let Some(variant) = &variant {
                let mut active: product_variants::ActiveModel = variant.clone().into();
                active.stock = Set(variant.stock - line.quantity);
                active.updated_at = Set(now.clone());
                active.update(&txn).await?;
            } else {
                let mut active: products::ActiveModel = product.clone().into();
                active.stock = Set(product.stock - line.quantity);
                active.updated_at = Set(now.clone());
                active.update(&txn).await?;
            }

            pending_items.push(order_items::ActiveModel {
                product_id: Set(product.id),
                variant_id: Set(variant.as_ref().map(|v| v.id)),
                quantity: Set(line.quantity),
                unit_price: Set(unit_price),
                line_total: Set(line_total),
                created_at: Set(now.clone()),
                ..Default::default()
            });

            pending_movements.push(inventory_movements::ActiveModel {
                product_id: Set(Some(product.id)),
                variant_id: Set(variant.as_ref().map(|v| v.id)),
                change: Set(-line.quantity),
                reason: Set("order".to_string()),
                notes: Set(None),
                created_at: Set(now.clone()),
                ..Default::default()
            });
        }

        let order = orders::ActiveModel {
            user_id: Set(input.user_id),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            total_amount: Set(total_amount),
            shipping_address_id: Set(input.shipping_address_id),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for mut item in pending_items {
            item.order_id = Set(order.id);
            item.insert(&txn).await?;
        }

        for mut movement in pending_movements {
            movement.ref_order_id = Set(Some(order.id));
            movement.insert(&txn).await?;
        }

        order_events::ActiveModel {
            order_id: Set(order.id),
            event_type: Set("created".to_string()),
            description: Set(Some("Order created".to_string())),
            actor_id: Set(input.actor_id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        self.get_details(order.id)
            .await?
            .ok_or(OrderError::OrderNotFound(order.id))
    }

    /// Apply a status transition. A change of status appends exactly one
    /// timeline event; entering "shipped" or "delivered" for the first time
    /// stamps the corresponding timestamp.
    pub async fn update_status(
        &self,
        order_id: i32,
        change: StatusChange,
    ) -> Result<OrderDetails, OrderError> {
        let txn = self.conn.begin().await?;

        let order = orders::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        let previous_status = order.status.clone();
        let new_status = change.status.as_str();
        let now = chrono::Utc::now().to_rfc3339();

        let first_shipped =
            change.status == OrderStatus::Shipped && order.shipped_at.is_none();
        let first_delivered =
            change.status == OrderStatus::Delivered && order.delivered_at.is_none();

        let mut active: orders::ActiveModel = order.into();
        active.status = Set(new_status.to_string());
        if let Some(carrier) = change.carrier {
            active.carrier = Set(Some(carrier));
        }
        if let Some(tracking_number) = change.tracking_number {
            active.tracking_number = Set(Some(tracking_number));
        }
        if first_shipped {
            active.shipped_at = Set(Some(now.clone()));
        }
        if first_delivered {
            active.delivered_at = Set(Some(now.clone()));
        }
        active.updated_at = Set(now.clone());
        active.update(&txn).await?;

        if previous_status != new_status {
            order_events::ActiveModel {
                order_id: Set(order_id),
                event_type: Set(new_status.to_string()),
                description: Set(Some(format!(
                    "Status changed: {previous_status} -> {new_status}"
                ))),
                actor_id: Set(change.actor_id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        self.get_details(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    /// Transition a pending order to "paid" with a single "paid" event.
    /// Returns false without touching anything when the order is no longer
    /// pending, which keeps duplicate webhook deliveries to one transition.
    pub async fn mark_paid_if_pending(
        &self,
        order_id: i32,
        description: &str,
    ) -> Result<bool, OrderError> {
        let txn = self.conn.begin().await?;

        let Some(order) = orders::Entity::find_by_id(order_id).one(&txn).await? else {
            return Err(OrderError::OrderNotFound(order_id));
        };

        if order.status != OrderStatus::Pending.as_str() {
            return Ok(false);
        }

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: orders::ActiveModel = order.into();
        active.status = Set(OrderStatus::Paid.as_str().to_string());
        active.updated_at = Set(now.clone());
        active.update(&txn).await?;

        order_events::ActiveModel {
            order_id: Set(order_id),
            event_type: Set(OrderStatus::Paid.as_str().to_string()),
            description: Set(Some(description.to_string())),
            actor_id: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(true)
    }

    pub async fn get(&self, id: i32) -> Result<Option<orders::Model>, OrderError> {
        let order = orders::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(order)
    }

    pub async fn get_details(&self, id: i32) -> Result<Option<OrderDetails>, OrderError> {
        let Some(order) = orders::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let items = order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(id))
            .order_by_asc(order_items::Column::Id)
            .all(&self.conn)
            .await?;

        let events = order_events::Entity::find()
            .filter(order_events::Column::OrderId.eq(id))
            .order_by_asc(order_events::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(Some(OrderDetails {
            order,
            items,
            events,
        }))
    }

    pub async fn list(
        &self,
        user_id: Option<i32>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<OrderDetails>, OrderError> {
        let mut query = orders::Entity::find().order_by_desc(orders::Column::CreatedAt);
        if let Some(user_id) = user_id {
            query = query.filter(orders::Column::UserId.eq(user_id));
        }

        let order_models = query.offset(offset).limit(limit).all(&self.conn).await?;

        let items = order_models
            .load_many(order_items::Entity, &self.conn)
            .await?;
        let events = order_models
            .load_many(order_events::Entity, &self.conn)
            .await?;

        Ok(order_models
            .into_iter()
            .zip(items)
            .zip(events)
            .map(|((order, items), events)| OrderDetails {
                order,
                items,
                events,
            })
            .collect())
    }

    pub async fn list_events(&self, order_id: i32) -> Result<Vec<order_events::Model>, OrderError> {
        let events = order_events::Entity::find()
            .filter(order_events::Column::OrderId.eq(order_id))
            .order_by_asc(order_events::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(events)
    }

    pub async fn count(&self) -> Result<u64, OrderError> {
        let count = orders::Entity::find().count(&self.conn).await?;
        Ok(count)
    }
}
