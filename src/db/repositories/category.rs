use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::categories;

pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<categories::Model>> {
        let category = categories::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query category")?;
        Ok(category)
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<categories::Model>> {
        let category = categories::Entity::find()
            .filter(categories::Column::Name.eq(name))
            .one(&self.conn)
            .await?;
        Ok(category)
    }

    pub async fn list(&self) -> Result<Vec<categories::Model>> {
        let rows = categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list categories")?;
        Ok(rows)
    }

    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<categories::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = categories::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description.map(String::from)),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = model
            .insert(&self.conn)
            .await
            .context("Failed to insert category")?;
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i32,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<categories::Model>> {
        let Some(category) = categories::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: categories::ActiveModel = category.into();
        if let Some(name) = name {
            active.name = Set(name.to_string());
        }
        if let Some(description) = description {
            active.description = Set(Some(description.to_string()));
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.conn).await?;
        Ok(Some(updated))
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = categories::Entity::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
