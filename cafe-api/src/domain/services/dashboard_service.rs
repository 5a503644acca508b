use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, MySqlPool};
use strum::{Display, EnumString};

use crate::domain::models::order::OrderWithItems;
use crate::domain::models::product::Product;
use crate::domain::services::order_service::OrderService;
use crate::error::AppError;

const RECENT_ORDERS_LIMIT: u32 = 5;
const TOP_PRODUCTS_LIMIT: u32 = 5;
const TOP_PRODUCTS_WINDOW_DAYS: i64 = 30;
const DAILY_REVENUE_WINDOW_DAYS: i64 = 7;

/// 营收统计的时间窗口, 未识别的参数按 7 天处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
pub enum RevenuePeriod {
    #[strum(serialize = "24h")]
    Day,
    #[default]
    #[strum(serialize = "7d")]
    Week,
    #[strum(serialize = "30d")]
    Month,
    #[strum(serialize = "90d")]
    Quarter,
}

impl RevenuePeriod {
    pub fn parse(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            RevenuePeriod::Day => now - Duration::hours(24),
            RevenuePeriod::Week => now - Duration::days(7),
            RevenuePeriod::Month => now - Duration::days(30),
            RevenuePeriod::Quarter => now - Duration::days(90),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_orders: i64,
    pub today_orders: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    pub active_products: i64,
    pub recent_orders: Vec<OrderWithItems>,
    pub top_products: Vec<TopProductEntry>,
    pub daily_revenue: Vec<DailyRevenueEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProductEntry {
    pub product: Product,
    pub total_quantity: i64,
    pub order_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenueEntry {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub period: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    pub order_count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_order_value: Decimal,
    pub orders: Vec<RevenueOrderEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueOrderEntry {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct TopProductRow {
    product_id: u64,
    name: String,
    price: Decimal,
    category: String,
    description: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    total_quantity: i64,
    order_count: i64,
}

#[derive(Debug, FromRow)]
struct DailyRevenueRow {
    day: NaiveDate,
    revenue: Decimal,
}

#[derive(Debug, FromRow)]
struct RevenueOrderRow {
    total_amount: Decimal,
    created_at: DateTime<Utc>,
}

/// 只读统计, 按需计算, 不落任何中间表
pub struct DashboardService<'a> {
    pool: &'a MySqlPool,
}

impl<'a> DashboardService<'a> {
    pub fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        let total_orders: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM orders"#)
            .fetch_one(self.pool)
            .await?;

        let (today_start, today_end) = today_bounds()?;
        let today_orders: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM orders WHERE created_at >= ? AND created_at < ?"#,
        )
        .bind(today_start)
        .bind(today_end)
        .fetch_one(self.pool)
        .await?;

        // 直接累加冗余的 total_amount, 不回头重算行项目
        let total_revenue: Decimal = sqlx::query_scalar(
            r#"SELECT CAST(COALESCE(SUM(total_amount), 0) AS DECIMAL(14, 2)) FROM orders"#,
        )
        .fetch_one(self.pool)
        .await?;

        let active_products: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM products WHERE is_active = TRUE"#)
                .fetch_one(self.pool)
                .await?;

        let recent_orders = OrderService::new(self.pool)
            .recent_orders(RECENT_ORDERS_LIMIT)
            .await?;

        let top_products = self.top_products(TOP_PRODUCTS_WINDOW_DAYS).await?;
        let daily_revenue = self.daily_revenue(DAILY_REVENUE_WINDOW_DAYS).await?;

        Ok(DashboardStats {
            total_orders,
            today_orders,
            total_revenue,
            active_products,
            recent_orders,
            top_products,
            daily_revenue,
        })
    }

    /// 按销量取前 5 名, 商品信息取当前目录数据而非下单时的快照
    pub async fn top_products(&self, window_days: i64) -> Result<Vec<TopProductEntry>, AppError> {
        let since = Utc::now() - Duration::days(window_days);

        let rows = sqlx::query_as::<_, TopProductRow>(
            r#"
            SELECT p.id AS product_id, p.name, p.price, p.category, p.description,
                   p.is_active, p.created_at, p.updated_at,
                   CAST(SUM(oi.quantity) AS SIGNED) AS total_quantity,
                   COUNT(oi.id) AS order_count
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            JOIN products p ON p.id = oi.product_id
            WHERE o.created_at >= ?
            GROUP BY p.id, p.name, p.price, p.category, p.description,
                     p.is_active, p.created_at, p.updated_at
            ORDER BY total_quantity DESC
            LIMIT ?
            "#,
        )
        .bind(since)
        .bind(TOP_PRODUCTS_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TopProductEntry {
                product: Product {
                    id: row.product_id,
                    name: row.name,
                    price: row.price,
                    category: row.category,
                    description: row.description,
                    is_active: row.is_active,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                },
                total_quantity: row.total_quantity,
                order_count: row.order_count,
            })
            .collect())
    }

    /// 按自然日分组的营收, 日期升序
    pub async fn daily_revenue(&self, window_days: i64) -> Result<Vec<DailyRevenueEntry>, AppError> {
        let since = Utc::now() - Duration::days(window_days);

        let rows = sqlx::query_as::<_, DailyRevenueRow>(
            r#"
            SELECT DATE(created_at) AS day,
                   CAST(SUM(total_amount) AS DECIMAL(14, 2)) AS revenue
            FROM orders
            WHERE created_at >= ?
            GROUP BY DATE(created_at)
            ORDER BY day ASC
            "#,
        )
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| DailyRevenueEntry {
                date: row.day,
                revenue: row.revenue,
            })
            .collect())
    }

    pub async fn revenue_for_period(&self, period: RevenuePeriod) -> Result<RevenueReport, AppError> {
        let since = period.start(Utc::now());

        let rows = sqlx::query_as::<_, RevenueOrderRow>(
            r#"
            SELECT total_amount, created_at
            FROM orders
            WHERE created_at >= ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        let revenue = rows
            .iter()
            .fold(Decimal::ZERO, |acc, row| acc + row.total_amount);
        let order_count = rows.len() as i64;
        // 空窗口返回全零, 不触发除零
        let average_order_value = if order_count > 0 {
            (revenue / Decimal::from(order_count)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Ok(RevenueReport {
            period: period.to_string(),
            revenue,
            order_count,
            average_order_value,
            orders: rows
                .into_iter()
                .map(|row| RevenueOrderEntry {
                    amount: row.total_amount,
                    date: row.created_at,
                })
                .collect(),
        })
    }
}

/// 本地时区的今日边界: [当天 00:00, 次日 00:00), 换算成 UTC 比较
fn today_bounds() -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let midnight = NaiveDateTime::new(Local::now().date_naive(), NaiveTime::MIN);
    let start = midnight
        .and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AppError::Internal("local midnight is not representable".to_string()))?;

    Ok((start, start + Duration::days(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_periods_parse() {
        assert_eq!(RevenuePeriod::parse("24h"), RevenuePeriod::Day);
        assert_eq!(RevenuePeriod::parse("7d"), RevenuePeriod::Week);
        assert_eq!(RevenuePeriod::parse("30d"), RevenuePeriod::Month);
        assert_eq!(RevenuePeriod::parse("90d"), RevenuePeriod::Quarter);
    }

    #[test]
    fn unknown_period_falls_back_to_week() {
        assert_eq!(RevenuePeriod::parse("1y"), RevenuePeriod::Week);
        assert_eq!(RevenuePeriod::parse(""), RevenuePeriod::Week);
    }

    #[test]
    fn period_window_starts() {
        let now = Utc::now();
        assert_eq!(RevenuePeriod::Day.start(now), now - Duration::hours(24));
        assert_eq!(RevenuePeriod::Quarter.start(now), now - Duration::days(90));
    }

    #[test]
    fn period_round_trips_through_display() {
        assert_eq!(RevenuePeriod::Week.to_string(), "7d");
        assert_eq!(RevenuePeriod::parse(&RevenuePeriod::Month.to_string()), RevenuePeriod::Month);
    }

    #[test]
    fn today_bounds_span_one_day() {
        let (start, end) = today_bounds().unwrap();
        assert_eq!(end - start, Duration::days(1));
    }
}
