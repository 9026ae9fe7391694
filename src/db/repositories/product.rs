use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::products;

/// Fields accepted when creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub is_active: bool,
    pub category_id: Option<i32>,
}

/// Partial update; `None` leaves the current value untouched.
#[derive(Debug, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub category_id: Option<Option<i32>>,
}

pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<products::Model>> {
        let product = products::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query product")?;
        Ok(product)
    }

    pub async fn list(
        &self,
        offset: u64,
        limit: u64,
        active_only: bool,
    ) -> Result<Vec<products::Model>> {
        let mut query = products::Entity::find().order_by_asc(products::Column::Id);
        if active_only {
            query = query.filter(products::Column::IsActive.eq(true));
        }

        let rows = query
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list products")?;
        Ok(rows)
    }

    pub async fn count_active(&self) -> Result<u64> {
        let count = products::Entity::find()
            .filter(products::Column::IsActive.eq(true))
            .count(&self.conn)
            .await?;
        Ok(count)
    }

    pub async fn create(&self, input: NewProduct) -> Result<products::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = products::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            stock: Set(input.stock),
            is_active: Set(input.is_active),
            category_id: Set(input.category_id),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = model
            .insert(&self.conn)
            .await
            .context("Failed to insert product")?;
        Ok(created)
    }

    pub async fn update(&self, id: i32, update: ProductUpdate) -> Result<Option<products::Model>> {
        let Some(product) = products::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: products::ActiveModel = product.into();

        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(description) = update.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = update.price {
            active.price = Set(price);
        }
        if let Some(stock) = update.stock {
            active.stock = Set(stock);
        }
        if let Some(is_active) = update.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(category_id) = update.category_id {
            active.category_id = Set(category_id);
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let updated = active.update(&self.conn).await?;
        Ok(Some(updated))
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = products::Entity::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
