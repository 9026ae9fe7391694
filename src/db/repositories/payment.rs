use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{payments, refunds};

pub struct PaymentRepository {
    conn: DatabaseConnection,
}

impl PaymentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<payments::Model>> {
        let payment = payments::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(payment)
    }

    pub async fn get_by_intent(&self, intent_id: &str) -> Result<Option<payments::Model>> {
        let payment = payments::Entity::find()
            .filter(payments::Column::IntentId.eq(intent_id))
            .one(&self.conn)
            .await
            .context("Failed to query payment by intent id")?;
        Ok(payment)
    }

    pub async fn list_for_order(&self, order_id: i32) -> Result<Vec<payments::Model>> {
        let rows = payments::Entity::find()
            .filter(payments::Column::OrderId.eq(order_id))
            .order_by_asc(payments::Column::CreatedAt)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn succeeded_for_order(&self, order_id: i32) -> Result<Option<payments::Model>> {
        let payment = payments::Entity::find()
            .filter(payments::Column::OrderId.eq(order_id))
            .filter(payments::Column::Status.eq("succeeded"))
            .one(&self.conn)
            .await?;
        Ok(payment)
    }

    pub async fn create(
        &self,
        order_id: i32,
        amount: Decimal,
        currency: &str,
        intent_id: Option<&str>,
        provider: &str,
    ) -> Result<payments::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = payments::ActiveModel {
            order_id: Set(order_id),
            provider: Set(provider.to_string()),
            intent_id: Set(intent_id.map(String::from)),
            status: Set("pending".to_string()),
            amount: Set(amount),
            currency: Set(currency.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = model
            .insert(&self.conn)
            .await
            .context("Failed to insert payment")?;
        Ok(created)
    }

    pub async fn update_status(&self, id: i32, status: &str) -> Result<payments::Model> {
        let payment = payments::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Payment {id} not found"))?;

        let mut active: payments::ActiveModel = payment.into();
        active.status = Set(status.to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.conn).await?;
        Ok(updated)
    }

    pub async fn list_refunds_for_order(&self, order_id: i32) -> Result<Vec<refunds::Model>> {
        let rows = refunds::Entity::find()
            .filter(refunds::Column::OrderId.eq(order_id))
            .order_by_asc(refunds::Column::CreatedAt)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_refund(
        &self,
        payment_id: i32,
        order_id: i32,
        amount: Decimal,
        reason: Option<&str>,
        provider_refund_id: Option<&str>,
        status: &str,
    ) -> Result<refunds::Model> {
        let model = refunds::ActiveModel {
            payment_id: Set(payment_id),
            order_id: Set(order_id),
            provider_refund_id: Set(provider_refund_id.map(String::from)),
            status: Set(status.to_string()),
            amount: Set(amount),
            reason: Set(reason.map(String::from)),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let created = model
            .insert(&self.conn)
            .await
            .context("Failed to insert refund")?;
        Ok(created)
    }
}
