use anyhow::Result;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{
    addresses, categories, inventory_movements, order_events, payments, product_images,
    product_variants, products, refunds,
};

pub mod migrator;
pub mod repositories;

pub use repositories::address::{AddressUpdate, NewAddress};
pub use repositories::inventory::{InventoryError, MovementFilter};
pub use repositories::order::{
    NewOrder, OrderDetails, OrderError, OrderLine, OrderStatus, StatusChange,
};
pub use repositories::product::{NewProduct, ProductUpdate};
pub use repositories::stats::{OverviewRow, SalesPoint, TopProductRow};
pub use repositories::user::{User, UserUpdate};
pub use repositories::variant::{NewImage, NewVariant, VariantUpdate};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn category_repo(&self) -> repositories::category::CategoryRepository {
        repositories::category::CategoryRepository::new(self.conn.clone())
    }

    fn product_repo(&self) -> repositories::product::ProductRepository {
        repositories::product::ProductRepository::new(self.conn.clone())
    }

    fn variant_repo(&self) -> repositories::variant::VariantRepository {
        repositories::variant::VariantRepository::new(self.conn.clone())
    }

    fn address_repo(&self) -> repositories::address::AddressRepository {
        repositories::address::AddressRepository::new(self.conn.clone())
    }

    fn order_repo(&self) -> repositories::order::OrderRepository {
        repositories::order::OrderRepository::new(self.conn.clone())
    }

    fn inventory_repo(&self) -> repositories::inventory::InventoryRepository {
        repositories::inventory::InventoryRepository::new(self.conn.clone())
    }

    fn payment_repo(&self) -> repositories::payment::PaymentRepository {
        repositories::payment::PaymentRepository::new(self.conn.clone())
    }

    fn stats_repo(&self) -> repositories::stats::StatsRepository {
        repositories::stats::StatsRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn list_users(&self, offset: u64, limit: u64) -> Result<Vec<User>> {
        self.user_repo().list(offset, limit).await
    }

    pub async fn create_user(
        &self,
        email: &str,
        full_name: Option<&str>,
        password: &str,
        is_admin: bool,
        config: Option<&crate::config::SecurityConfig>,
    ) -> Result<User> {
        self.user_repo()
            .create(email, full_name, password, is_admin, config)
            .await
    }

    pub async fn update_user(&self, id: i32, update: UserUpdate) -> Result<Option<User>> {
        self.user_repo().update(id, update).await
    }

    pub async fn remove_user(&self, id: i32) -> Result<bool> {
        self.user_repo().remove(id).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn update_user_password(
        &self,
        email: &str,
        new_password: &str,
        config: Option<&crate::config::SecurityConfig>,
    ) -> Result<()> {
        self.user_repo()
            .update_password(email, new_password, config)
            .await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn get_user_api_key(&self, email: &str) -> Result<Option<String>> {
        self.user_repo().get_api_key(email).await
    }

    pub async fn regenerate_user_api_key(&self, email: &str) -> Result<String> {
        self.user_repo().regenerate_api_key(email).await
    }

    // ========== Categories ==========

    pub async fn get_category(&self, id: i32) -> Result<Option<categories::Model>> {
        self.category_repo().get(id).await
    }

    pub async fn get_category_by_name(&self, name: &str) -> Result<Option<categories::Model>> {
        self.category_repo().get_by_name(name).await
    }

    pub async fn list_categories(&self) -> Result<Vec<categories::Model>> {
        self.category_repo().list().await
    }

    pub async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<categories::Model> {
        self.category_repo().create(name, description).await
    }

    pub async fn update_category(
        &self,
        id: i32,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<categories::Model>> {
        self.category_repo().update(id, name, description).await
    }

    pub async fn remove_category(&self, id: i32) -> Result<bool> {
        self.category_repo().remove(id).await
    }

    // ========== Products ==========

    pub async fn get_product(&self, id: i32) -> Result<Option<products::Model>> {
        self.product_repo().get(id).await
    }

    pub async fn list_products(
        &self,
        offset: u64,
        limit: u64,
        active_only: bool,
    ) -> Result<Vec<products::Model>> {
        self.product_repo().list(offset, limit, active_only).await
    }

    pub async fn create_product(&self, input: NewProduct) -> Result<products::Model> {
        self.product_repo().create(input).await
    }

    pub async fn update_product(
        &self,
        id: i32,
        update: ProductUpdate,
    ) -> Result<Option<products::Model>> {
        self.product_repo().update(id, update).await
    }

    pub async fn remove_product(&self, id: i32) -> Result<bool> {
        self.product_repo().remove(id).await
    }

    // ========== Variants & images ==========

    pub async fn get_variant(&self, id: i32) -> Result<Option<product_variants::Model>> {
        self.variant_repo().get(id).await
    }

    pub async fn list_variants_for_product(
        &self,
        product_id: i32,
    ) -> Result<Vec<product_variants::Model>> {
        self.variant_repo().list_for_product(product_id).await
    }

    pub async fn create_variant(&self, input: NewVariant) -> Result<product_variants::Model> {
        self.variant_repo().create(input).await
    }

    pub async fn update_variant(
        &self,
        id: i32,
        update: VariantUpdate,
    ) -> Result<Option<product_variants::Model>> {
        self.variant_repo().update(id, update).await
    }

    pub async fn remove_variant(&self, id: i32) -> Result<bool> {
        self.variant_repo().remove(id).await
    }

    pub async fn get_image(&self, id: i32) -> Result<Option<product_images::Model>> {
        self.variant_repo().get_image(id).await
    }

    pub async fn list_images_for_product(
        &self,
        product_id: i32,
    ) -> Result<Vec<product_images::Model>> {
        self.variant_repo().list_images_for_product(product_id).await
    }

    pub async fn create_image(&self, input: NewImage) -> Result<product_images::Model> {
        self.variant_repo().create_image(input).await
    }

    pub async fn remove_image(&self, id: i32) -> Result<bool> {
        self.variant_repo().remove_image(id).await
    }

    // ========== Addresses ==========

    pub async fn get_address(&self, id: i32) -> Result<Option<addresses::Model>> {
        self.address_repo().get(id).await
    }

    pub async fn list_addresses_for_user(&self, user_id: i32) -> Result<Vec<addresses::Model>> {
        self.address_repo().list_for_user(user_id).await
    }

    pub async fn list_all_addresses(&self, offset: u64, limit: u64) -> Result<Vec<addresses::Model>> {
        self.address_repo().list_all(offset, limit).await
    }

    pub async fn create_address(
        &self,
        user_id: i32,
        input: NewAddress,
    ) -> Result<addresses::Model> {
        self.address_repo().create(user_id, input).await
    }

    pub async fn update_address(
        &self,
        id: i32,
        update: AddressUpdate,
    ) -> Result<Option<addresses::Model>> {
        self.address_repo().update(id, update).await
    }

    pub async fn remove_address(&self, id: i32) -> Result<bool> {
        self.address_repo().remove(id).await
    }

    // ========== Orders ==========

    pub async fn create_order(&self, input: NewOrder) -> Result<OrderDetails, OrderError> {
        self.order_repo().create(input).await
    }

    pub async fn update_order_status(
        &self,
        order_id: i32,
        change: StatusChange,
    ) -> Result<OrderDetails, OrderError> {
        self.order_repo().update_status(order_id, change).await
    }

    pub async fn mark_order_paid_if_pending(
        &self,
        order_id: i32,
        description: &str,
    ) -> Result<bool, OrderError> {
        self.order_repo()
            .mark_paid_if_pending(order_id, description)
            .await
    }

    pub async fn get_order(&self, id: i32) -> Result<Option<crate::entities::orders::Model>, OrderError> {
        self.order_repo().get(id).await
    }

    pub async fn get_order_details(&self, id: i32) -> Result<Option<OrderDetails>, OrderError> {
        self.order_repo().get_details(id).await
    }

    pub async fn list_orders(
        &self,
        user_id: Option<i32>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<OrderDetails>, OrderError> {
        self.order_repo().list(user_id, offset, limit).await
    }

    pub async fn list_order_events(
        &self,
        order_id: i32,
    ) -> Result<Vec<order_events::Model>, OrderError> {
        self.order_repo().list_events(order_id).await
    }

    pub async fn count_orders(&self) -> Result<u64, OrderError> {
        self.order_repo().count().await
    }

    // ========== Inventory ==========

    pub async fn list_inventory_movements(
        &self,
        filter: MovementFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<inventory_movements::Model>, InventoryError> {
        self.inventory_repo()
            .list_movements(filter, offset, limit)
            .await
    }

    pub async fn inventory_movements_for_order(
        &self,
        order_id: i32,
    ) -> Result<Vec<inventory_movements::Model>, InventoryError> {
        self.inventory_repo().movements_for_order(order_id).await
    }

    pub async fn low_stock_products(
        &self,
        threshold: i32,
    ) -> Result<Vec<products::Model>, InventoryError> {
        self.inventory_repo().low_stock_products(threshold).await
    }

    pub async fn low_stock_variants(
        &self,
        threshold: i32,
    ) -> Result<Vec<product_variants::Model>, InventoryError> {
        self.inventory_repo().low_stock_variants(threshold).await
    }

    pub async fn adjust_product_stock(
        &self,
        product_id: i32,
        change: i32,
        reason: &str,
        notes: Option<&str>,
    ) -> Result<inventory_movements::Model, InventoryError> {
        self.inventory_repo()
            .adjust_product_stock(product_id, change, reason, notes)
            .await
    }

    pub async fn adjust_variant_stock(
        &self,
        variant_id: i32,
        change: i32,
        reason: &str,
        notes: Option<&str>,
    ) -> Result<inventory_movements::Model, InventoryError> {
        self.inventory_repo()
            .adjust_variant_stock(variant_id, change, reason, notes)
            .await
    }

    // ========== Payments & refunds ==========

    pub async fn get_payment_by_intent(&self, intent_id: &str) -> Result<Option<payments::Model>> {
        self.payment_repo().get_by_intent(intent_id).await
    }

    pub async fn list_payments_for_order(&self, order_id: i32) -> Result<Vec<payments::Model>> {
        self.payment_repo().list_for_order(order_id).await
    }

    pub async fn succeeded_payment_for_order(
        &self,
        order_id: i32,
    ) -> Result<Option<payments::Model>> {
        self.payment_repo().succeeded_for_order(order_id).await
    }

    pub async fn create_payment(
        &self,
        order_id: i32,
        amount: Decimal,
        currency: &str,
        intent_id: Option<&str>,
        provider: &str,
    ) -> Result<payments::Model> {
        self.payment_repo()
            .create(order_id, amount, currency, intent_id, provider)
            .await
    }

    pub async fn update_payment_status(&self, id: i32, status: &str) -> Result<payments::Model> {
        self.payment_repo().update_status(id, status).await
    }

    pub async fn list_refunds_for_order(&self, order_id: i32) -> Result<Vec<refunds::Model>> {
        self.payment_repo().list_refunds_for_order(order_id).await
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
        self.payment_repo()
            .create_refund(payment_id, order_id, amount, reason, provider_refund_id, status)
            .await
    }

    // ========== Stats ==========

    pub async fn stats_overview(&self) -> Result<OverviewRow> {
        self.stats_repo().overview().await
    }

    pub async fn sales_trend(&self, start_date: &str, end_date: &str) -> Result<Vec<SalesPoint>> {
        self.stats_repo().sales_trend(start_date, end_date).await
    }

    pub async fn top_products(&self, limit: u64) -> Result<Vec<TopProductRow>> {
        self.stats_repo().top_products(limit).await
    }
}
