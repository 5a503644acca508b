use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool, QueryBuilder};

use crate::domain::models::order::{
    NewLineItem, Order, OrderItem, OrderItemWithProduct, OrderWithItems,
};
use crate::domain::models::product::Product;
use crate::domain::pricing;
use crate::error::AppError;

/// 行项目和商品的联查结果, 商品列加 p_ 前缀区分
#[derive(Debug, FromRow)]
struct ItemProductRow {
    id: u64,
    order_id: u64,
    product_id: u64,
    quantity: i32,
    price: Decimal,
    p_name: String,
    p_price: Decimal,
    p_category: String,
    p_description: String,
    p_is_active: bool,
    p_created_at: DateTime<Utc>,
    p_updated_at: DateTime<Utc>,
}

impl From<ItemProductRow> for OrderItemWithProduct {
    fn from(row: ItemProductRow) -> Self {
        OrderItemWithProduct {
            item: OrderItem {
                id: row.id,
                order_id: row.order_id,
                product_id: row.product_id,
                quantity: row.quantity,
                price: row.price,
            },
            product: Product {
                id: row.product_id,
                name: row.p_name,
                price: row.p_price,
                category: row.p_category,
                description: row.p_description,
                is_active: row.p_is_active,
                created_at: row.p_created_at,
                updated_at: row.p_updated_at,
            },
        }
    }
}

pub struct OrderService<'a> {
    pool: &'a MySqlPool,
}

impl<'a> OrderService<'a> {
    pub fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// 全部订单, 新单在前, 附带行项目和商品信息
    pub async fn list_orders(&self) -> Result<Vec<OrderWithItems>, AppError> {
        let orders = sqlx::query_as::<_, Order>(
            r#"SELECT * FROM orders ORDER BY created_at DESC, id DESC"#,
        )
        .fetch_all(self.pool)
        .await?;

        self.attach_items(orders).await
    }

    /// 最近 N 单, 给仪表盘用
    pub async fn recent_orders(&self, limit: u32) -> Result<Vec<OrderWithItems>, AppError> {
        let orders = sqlx::query_as::<_, Order>(
            r#"SELECT * FROM orders ORDER BY created_at DESC, id DESC LIMIT ?"#,
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(orders).await
    }

    pub async fn get_order(&self, id: u64) -> Result<OrderWithItems, AppError> {
        let order = self.get_order_header(id).await?;

        let mut with_items = self.attach_items(vec![order]).await?;
        with_items
            .pop()
            .ok_or_else(|| AppError::Internal("order vanished while attaching items".to_string()))
    }

    pub async fn create_order(
        &self,
        customer_name: &str,
        items: &[NewLineItem],
    ) -> Result<OrderWithItems, AppError> {
        let now = Utc::now();
        let total = pricing::order_total(items);

        // 订单头和行项目要么全部写入, 要么全不写入
        let mut tx = self.pool.begin().await?;

        let order_id = sqlx::query(
            r#"
            INSERT INTO orders (customer_name, total_amount, is_paid, created_at, updated_at)
            VALUES (?, ?, FALSE, ?, ?)
            "#,
        )
        .bind(customer_name)
        .bind(total)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_id();

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, price)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_order(order_id).await
    }

    /// 更新客户姓名 / 支付状态, 或整体替换行项目。只给姓名时金额不动;
    /// 给了行项目(哪怕是空列表)则在一个事务内删旧插新并重算 total_amount。
    pub async fn update_order(
        &self,
        id: u64,
        customer_name: Option<&str>,
        is_paid: Option<bool>,
        items: Option<&[NewLineItem]>,
    ) -> Result<OrderWithItems, AppError> {
        self.get_order_header(id).await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        if let Some(name) = customer_name {
            sqlx::query(r#"UPDATE orders SET customer_name = ?, updated_at = ? WHERE id = ?"#)
                .bind(name)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(paid) = is_paid {
            sqlx::query(r#"UPDATE orders SET is_paid = ?, updated_at = ? WHERE id = ?"#)
                .bind(paid)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(items) = items {
            sqlx::query(r#"DELETE FROM order_items WHERE order_id = ?"#)
                .bind(id)
                .execute(&mut *tx)
                .await?;

            for item in items {
                sqlx::query(
                    r#"
                    INSERT INTO order_items (order_id, product_id, quantity, price)
                    VALUES (?, ?, ?, ?)
                    "#,
                )
                .bind(id)
                .bind(item.product_id)
                .bind(item.quantity)
                .bind(item.price)
                .execute(&mut *tx)
                .await?;
            }

            let total = pricing::order_total(items);
            sqlx::query(r#"UPDATE orders SET total_amount = ?, updated_at = ? WHERE id = ?"#)
                .bind(total)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.get_order(id).await
    }

    pub async fn delete_order(&self, id: u64) -> Result<(), AppError> {
        // order_items 由外键级联删除
        let result = sqlx::query(r#"DELETE FROM orders WHERE id = ?"#)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Order with ID {} not found", id)));
        }

        Ok(())
    }

    pub async fn add_item(
        &self,
        order_id: u64,
        item: &NewLineItem,
    ) -> Result<OrderItemWithProduct, AppError> {
        self.get_order_header(order_id).await?;

        let now = Utc::now();
        let line_total = pricing::line_total(item.price, item.quantity);

        let mut tx = self.pool.begin().await?;

        let item_id = sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, price)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .execute(&mut *tx)
        .await?
        .last_insert_id();

        sqlx::query(
            r#"UPDATE orders SET total_amount = total_amount + ?, updated_at = ? WHERE id = ?"#,
        )
        .bind(line_total)
        .bind(now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_item(item_id).await
    }

    pub async fn update_item(
        &self,
        order_id: u64,
        item_id: u64,
        item: &NewLineItem,
    ) -> Result<OrderItemWithProduct, AppError> {
        let current = self.get_owned_item(order_id, item_id).await?;

        // 差量调整: 新行小计 - 旧行小计
        let difference = pricing::line_total(item.price, item.quantity)
            - pricing::line_total(current.price, current.quantity);
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"UPDATE order_items SET product_id = ?, quantity = ?, price = ? WHERE id = ?"#,
        )
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"UPDATE orders SET total_amount = total_amount + ?, updated_at = ? WHERE id = ?"#,
        )
        .bind(difference)
        .bind(now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_item(item_id).await
    }

    pub async fn remove_item(&self, order_id: u64, item_id: u64) -> Result<(), AppError> {
        let current = self.get_owned_item(order_id, item_id).await?;

        let reduction = pricing::line_total(current.price, current.quantity);
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(r#"DELETE FROM order_items WHERE id = ?"#)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"UPDATE orders SET total_amount = total_amount - ?, updated_at = ? WHERE id = ?"#,
        )
        .bind(reduction)
        .bind(now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn get_order_header(&self, id: u64) -> Result<Order, AppError> {
        sqlx::query_as::<_, Order>(r#"SELECT * FROM orders WHERE id = ?"#)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order with ID {} not found", id)))
    }

    /// 行项目必须属于指定订单, 拿别的订单的 item id 一律按不存在处理
    async fn get_owned_item(&self, order_id: u64, item_id: u64) -> Result<OrderItem, AppError> {
        sqlx::query_as::<_, OrderItem>(r#"SELECT * FROM order_items WHERE id = ?"#)
            .bind(item_id)
            .fetch_optional(self.pool)
            .await?
            .filter(|item| item.order_id == order_id)
            .ok_or_else(|| AppError::NotFound("Order item not found".to_string()))
    }

    async fn get_item(&self, item_id: u64) -> Result<OrderItemWithProduct, AppError> {
        let row = sqlx::query_as::<_, ItemProductRow>(
            r#"
            SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.price,
                   p.name AS p_name, p.price AS p_price, p.category AS p_category,
                   p.description AS p_description, p.is_active AS p_is_active,
                   p.created_at AS p_created_at, p.updated_at AS p_updated_at
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.id = ?
            "#,
        )
        .bind(item_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Order item not found".to_string()))?;

        Ok(row.into())
    }

    /// 一次联查取出所有订单的行项目, 避免每单一条查询
    async fn attach_items(&self, orders: Vec<Order>) -> Result<Vec<OrderWithItems>, AppError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<sqlx::MySql> = QueryBuilder::new(
            "SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.price, \
             p.name AS p_name, p.price AS p_price, p.category AS p_category, \
             p.description AS p_description, p.is_active AS p_is_active, \
             p.created_at AS p_created_at, p.updated_at AS p_updated_at \
             FROM order_items oi \
             JOIN products p ON p.id = oi.product_id \
             WHERE oi.order_id IN (",
        );

        let mut separated = builder.separated(", ");
        for order in &orders {
            separated.push_bind(order.id);
        }
        separated.push_unseparated(") ORDER BY oi.id ASC");

        let rows: Vec<ItemProductRow> = builder
            .build_query_as()
            .fetch_all(self.pool)
            .await?;

        let mut by_order: HashMap<u64, Vec<OrderItemWithProduct>> = HashMap::new();
        for row in rows {
            by_order
                .entry(row.order_id)
                .or_default()
                .push(row.into());
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let order_items = by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, order_items }
            })
            .collect())
    }
}
