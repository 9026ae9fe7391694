use anyhow::{Context, Result};
use sea_orm::{ConnectionTrait, DatabaseConnection, FromQueryResult, Statement};

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, FromQueryResult)]
pub struct OverviewRow {
    pub total_revenue: f64,
    pub total_orders: i64,
    pub active_users: i64,
    pub active_products: i64,
}

/// One bucket of the sales trend, grouped by calendar day.
#[derive(Debug, Clone, FromQueryResult)]
pub struct SalesPoint {
    pub date: String,
    pub revenue: f64,
    pub order_count: i64,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct TopProductRow {
    pub product_id: i32,
    pub product_name: String,
    pub total_revenue: f64,
    pub total_quantity: i64,
}

pub struct StatsRepository {
    conn: DatabaseConnection,
}

impl StatsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Cancelled and refunded orders are excluded from revenue figures.
    pub async fn overview(&self) -> Result<OverviewRow> {
        let backend = self.conn.get_database_backend();

        let row = OverviewRow::find_by_statement(Statement::from_string(
            backend,
            r"
            SELECT
                COALESCE((SELECT SUM(total_amount) FROM orders
                          WHERE status NOT IN ('cancelled', 'refunded')), 0.0) AS total_revenue,
                (SELECT COUNT(*) FROM orders) AS total_orders,
                (SELECT COUNT(*) FROM users WHERE is_active = TRUE) AS active_users,
                (SELECT COUNT(*) FROM products WHERE is_active = TRUE) AS active_products
            "
            .to_string(),
        ))
        .one(&self.conn)
        .await
        .context("Failed to query overview stats")?
        .ok_or_else(|| anyhow::anyhow!("Overview query returned no row"))?;

        Ok(row)
    }

    /// Daily revenue and order counts between two dates (inclusive,
    /// YYYY-MM-DD). RFC3339 timestamps truncate to the calendar day by
    /// prefix, which also sorts chronologically.
    pub async fn sales_trend(&self, start_date: &str, end_date: &str) -> Result<Vec<SalesPoint>> {
        let backend = self.conn.get_database_backend();

        let rows = SalesPoint::find_by_statement(Statement::from_sql_and_values(
            backend,
            r"
            SELECT
                substr(created_at, 1, 10) AS date,
                COALESCE(SUM(total_amount), 0.0) AS revenue,
                COUNT(id) AS order_count
            FROM orders
            WHERE substr(created_at, 1, 10) >= ?
              AND substr(created_at, 1, 10) <= ?
              AND status NOT IN ('cancelled', 'refunded')
            GROUP BY substr(created_at, 1, 10)
            ORDER BY substr(created_at, 1, 10)
            ",
            [start_date.into(), end_date.into()],
        ))
        .all(&self.conn)
        .await
        .context("Failed to query sales trend")?;

        Ok(rows)
    }

    pub async fn top_products(&self, limit: u64) -> Result<Vec<TopProductRow>> {
        let backend = self.conn.get_database_backend();

        let rows = TopProductRow::find_by_statement(Statement::from_sql_and_values(
            backend,
            r"
            SELECT
                p.id AS product_id,
                p.name AS product_name,
                COALESCE(SUM(oi.line_total), 0.0) AS total_revenue,
                COALESCE(SUM(oi.quantity), 0) AS total_quantity
            FROM products p
            JOIN order_items oi ON oi.product_id = p.id
            JOIN orders o ON o.id = oi.order_id
            WHERE o.status NOT IN ('cancelled', 'refunded')
            GROUP BY p.id, p.name
            ORDER BY SUM(oi.line_total) DESC
            LIMIT ?
            ",
            [limit.into()],
        ))
        .all(&self.conn)
        .await
        .context("Failed to query top products")?;

        Ok(rows)
    }
}
