use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use thiserror::Error;

use crate::entities::{inventory_movements, product_variants, products};

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Product {0} not found")]
    ProductNotFound(i32),

    #[error("Variant {0} not found")]
    VariantNotFound(i32),

    #[error("Adjustment of {change} would leave '{name}' with negative stock ({current} on hand)")]
    NegativeStock {
        name: String,
        current: i32,
        change: i32,
    },

    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Optional filters for the movement listing.
#[derive(Debug, Default, Clone, Copy)]
pub struct MovementFilter {
    pub product_id: Option<i32>,
    pub variant_id: Option<i32>,
}

pub struct InventoryRepository {
    conn: DatabaseConnection,
}

impl InventoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_movements(
        &self,
        filter: MovementFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<inventory_movements::Model>, InventoryError> {
        let mut query = inventory_movements::Entity::find()
            .order_by_desc(inventory_movements::Column::CreatedAt);

        if let Some(product_id) = filter.product_id {
            query = query.filter(inventory_movements::Column::ProductId.eq(product_id));
        }
        if let Some(variant_id) = filter.variant_id {
            query = query.filter(inventory_movements::Column::VariantId.eq(variant_id));
        }

        let rows = query.offset(offset).limit(limit).all(&self.conn).await?;
        Ok(rows)
    }

    pub async fn movements_for_order(
        &self,
        order_id: i32,
    ) -> Result<Vec<inventory_movements::Model>, InventoryError> {
        let rows = inventory_movements::Entity::find()
            .filter(inventory_movements::Column::RefOrderId.eq(order_id))
            .order_by_asc(inventory_movements::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn low_stock_products(
        &self,
        threshold: i32,
    ) -> Result<Vec<products::Model>, InventoryError> {
        let rows = products::Entity::find()
            .filter(products::Column::Stock.lte(threshold))
            .filter(products::Column::IsActive.eq(true))
            .order_by_asc(products::Column::Stock)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn low_stock_variants(
        &self,
        threshold: i32,
    ) -> Result<Vec<product_variants::Model>, InventoryError> {
        let rows = product_variants::Entity::find()
            .filter(product_variants::Column::Stock.lte(threshold))
            .filter(product_variants::Column::IsActive.eq(true))
            .order_by_asc(product_variants::Column::Stock)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    /// Apply a signed stock delta to a product and record the movement.
    /// Rejected when the resulting stock would be negative.
    pub async fn adjust_product_stock(
        &self,
        product_id: i32,
        change: i32,
        reason: &str,
        notes: Option<&str>,
    ) -> Result<inventory_movements::Model, InventoryError> {
        let txn = self.conn.begin().await?;

        let product = products::Entity::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or(InventoryError::ProductNotFound(product_id))?;

        let new_stock = product.stock + change;
        if new_stock < 0 {
            return Err(InventoryError::NegativeStock {
                name: product.name,
                current: product.stock,
                change,
            });
        }

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: products::ActiveModel = product.into();
        active.stock = Set(new_stock);
        active.updated_at = Set(now.clone());
        active.update(&txn).await?;

        let movement = inventory_movements::ActiveModel {
            product_id: Set(Some(product_id)),
            variant_id: Set(None),
            change: Set(change),
            reason: Set(reason.to_string()),
            ref_order_id: Set(None),
            notes: Set(notes.map(String::from)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(movement)
    }

    /// Variant counterpart of `adjust_product_stock`. The movement keeps the
    /// parent product id for ledger queries by product.
    pub async fn adjust_variant_stock(
        &self,
        variant_id: i32,
        change: i32,
        reason: &str,
        notes: Option<&str>,
    ) -> Result<inventory_movements::Model, InventoryError> {
        let txn = self.conn.begin().await?;

        let variant = product_variants::Entity::find_by_id(variant_id)
            .one(&txn)
            .await?
            .ok_or(InventoryError::VariantNotFound(variant_id))?;

        let new_stock = variant.stock + change;
        if new_stock < 0 {
            return Err(InventoryError::NegativeStock {
                name: variant.name,
                current: variant.stock,
                change,
            });
        }

        let now = chrono::Utc::now().to_rfc3339();
        let product_id = variant.product_id;

        let mut active: product_variants::ActiveModel = variant.into();
        active.stock = Set(new_stock);
        active.updated_at = Set(now.clone());
        active.update(&txn).await?;

        let movement = inventory_movements::ActiveModel {
            product_id: Set(Some(product_id)),
            variant_id: Set(Some(variant_id)),
            change: Set(change),
            reason: Set(reason.to_string()),
            ref_order_id: Set(None),
            notes: Set(notes.map(String::from)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(movement)
    }
}
