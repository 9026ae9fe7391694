use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{product_images, product_variants};

#[derive(Debug, Clone)]
pub struct NewVariant {
    pub product_id: i32,
    pub sku: Option<String>,
    pub name: String,
    pub attributes: Option<String>,
    pub price_override: Option<Decimal>,
    pub stock: i32,
    pub is_active: bool,
}

#[derive(Debug, Default)]
pub struct VariantUpdate {
    pub sku: Option<Option<String>>,
    pub name: Option<String>,
    pub attributes: Option<Option<String>>,
    pub price_override: Option<Option<Decimal>>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub product_id: Option<i32>,
    pub variant_id: Option<i32>,
    pub url: String,
    pub alt_text: Option<String>,
    pub is_primary: bool,
    pub sort_order: i32,
}

pub struct VariantRepository {
    conn: DatabaseConnection,
}

impl VariantRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<product_variants::Model>> {
        let variant = product_variants::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query variant")?;
        Ok(variant)
    }

    pub async fn list_for_product(&self, product_id: i32) -> Result<Vec<product_variants::Model>> {
        let rows = product_variants::Entity::find()
            .filter(product_variants::Column::ProductId.eq(product_id))
            .order_by_asc(product_variants::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list variants")?;
        Ok(rows)
    }

    pub async fn create(&self, input: NewVariant) -> Result<product_variants::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = product_variants::ActiveModel {
            product_id: Set(input.product_id),
            sku: Set(input.sku),
            name: Set(input.name),
            attributes: Set(input.attributes),
            price_override: Set(input.price_override),
            stock: Set(input.stock),
            is_active: Set(input.is_active),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = model
            .insert(&self.conn)
            .await
            .context("Failed to insert variant")?;
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i32,
        update: VariantUpdate,
    ) -> Result<Option<product_variants::Model>> {
        let Some(variant) = product_variants::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: product_variants::ActiveModel = variant.into();

        if let Some(sku) = update.sku {
            active.sku = Set(sku);
        }
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(attributes) = update.attributes {
            active.attributes = Set(attributes);
        }
        if let Some(price_override) = update.price_override {
            active.price_override = Set(price_override);
        }
        if let Some(stock) = update.stock {
            active.stock = Set(stock);
        }
        if let Some(is_active) = update.is_active {
            active.is_active = Set(is_active);
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let updated = active.update(&self.conn).await?;
        Ok(Some(updated))
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = product_variants::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn get_image(&self, id: i32) -> Result<Option<product_images::Model>> {
        let image = product_images::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(image)
    }

    pub async fn list_images_for_product(
        &self,
        product_id: i32,
    ) -> Result<Vec<product_images::Model>> {
        let rows = product_images::Entity::find()
            .filter(product_images::Column::ProductId.eq(product_id))
            .order_by_asc(product_images::Column::SortOrder)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn create_image(&self, input: NewImage) -> Result<product_images::Model> {
        let model = product_images::ActiveModel {
            product_id: Set(input.product_id),
            variant_id: Set(input.variant_id),
            url: Set(input.url),
            alt_text: Set(input.alt_text),
            is_primary: Set(input.is_primary),
            sort_order: Set(input.sort_order),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let created = model
            .insert(&self.conn)
            .await
            .context("Failed to insert product image")?;
        Ok(created)
    }

    pub async fn remove_image(&self, id: i32) -> Result<bool> {
        let result = product_images::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
