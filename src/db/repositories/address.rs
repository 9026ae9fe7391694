use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::addresses;

#[derive(Debug, Clone)]
pub struct NewAddress {
    pub name: String,
    pub phone: Option<String>,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}

#[derive(Debug, Default)]
pub struct AddressUpdate {
    pub name: Option<String>,
    pub phone: Option<Option<String>>,
    pub line1: Option<String>,
    pub line2: Option<Option<String>>,
    pub city: Option<String>,
    pub state: Option<Option<String>>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub is_default: Option<bool>,
}

pub struct AddressRepository {
    conn: DatabaseConnection,
}

impl AddressRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<addresses::Model>> {
        let address = addresses::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query address")?;
        Ok(address)
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<addresses::Model>> {
        let rows = addresses::Entity::find()
            .filter(addresses::Column::UserId.eq(user_id))
            .order_by_desc(addresses::Column::CreatedAt)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn list_all(&self, offset: u64, limit: u64) -> Result<Vec<addresses::Model>> {
        let rows = addresses::Entity::find()
            .order_by_asc(addresses::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn create(&self, user_id: i32, input: NewAddress) -> Result<addresses::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = addresses::ActiveModel {
            user_id: Set(user_id),
            name: Set(input.name),
            phone: Set(input.phone),
            line1: Set(input.line1),
            line2: Set(input.line2),
            city: Set(input.city),
            state: Set(input.state),
            postal_code: Set(input.postal_code),
            country: Set(input.country),
            is_default: Set(input.is_default),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = model
            .insert(&self.conn)
            .await
            .context("Failed to insert address")?;
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i32,
        update: AddressUpdate,
    ) -> Result<Option<addresses::Model>> {
        let Some(address) = addresses::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: addresses::ActiveModel = address.into();

        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(phone) = update.phone {
            active.phone = Set(phone);
        }
        if let Some(line1) = update.line1 {
            active.line1 = Set(line1);
        }
        if let Some(line2) = update.line2 {
            active.line2 = Set(line2);
        }
        if let Some(city) = update.city {
            active.city = Set(city);
        }
        if let Some(state) = update.state {
            active.state = Set(state);
        }
        if let Some(postal_code) = update.postal_code {
            active.postal_code = Set(postal_code);
        }
        if let Some(country) = update.country {
            active.country = Set(country);
        }
        if let Some(is_default) = update.is_default {
            active.is_default = Set(is_default);
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let updated = active.update(&self.conn).await?;
        Ok(Some(updated))
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = addresses::Entity::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
