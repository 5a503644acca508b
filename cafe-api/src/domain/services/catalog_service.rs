use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::domain::models::product::Product;
use crate::error::AppError;

pub struct CatalogService<'a> {
    pool: &'a MySqlPool,
}

impl<'a> CatalogService<'a> {
    pub fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// 在售商品列表, 按分类和名称排序, 便于前端分组展示
    pub async fn list_active_products(&self) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE is_active = TRUE
            ORDER BY category ASC, name ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    pub async fn get_product(&self, id: u64) -> Result<Product, AppError> {
        let product = sqlx::query_as::<_, Product>(r#"SELECT * FROM products WHERE id = ?"#)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found", id)))?;

        Ok(product)
    }

    pub async fn create_product(
        &self,
        name: &str,
        price: Decimal,
        category: &str,
        description: &str,
    ) -> Result<Product, AppError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO products (name, price, category, description, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, TRUE, ?, ?)
            "#,
        )
        .bind(name)
        .bind(price)
        .bind(category)
        .bind(description)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(Product {
            id: result.last_insert_id(),
            name: name.to_string(),
            price,
            category: category.to_string(),
            description: description.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn update_product(
        &self,
        id: u64,
        name: Option<String>,
        price: Option<Decimal>,
        category: Option<String>,
        description: Option<String>,
        is_active: Option<bool>,
    ) -> Result<Product, AppError> {
        // 先取出记录, 只覆盖调用方提供的字段
        let mut product = self.get_product(id).await?;

        if let Some(new_name) = name {
            product.name = new_name;
        }

        if let Some(new_price) = price {
            product.price = new_price;
        }

        if let Some(new_category) = category {
            product.category = new_category;
        }

        if let Some(new_description) = description {
            product.description = new_description;
        }

        if let Some(active) = is_active {
            product.is_active = active;
        }

        product.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE products
            SET name = ?, price = ?, category = ?, description = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.is_active)
        .bind(product.updated_at)
        .bind(product.id)
        .execute(self.pool)
        .await?;

        Ok(product)
    }

    /// 软删除: 从菜单下架, 历史订单不受影响
    pub async fn deactivate_product(&self, id: u64) -> Result<Product, AppError> {
        self.update_product(id, None, None, None, None, Some(false))
            .await
    }

    /// 硬删除: 仅允许删除从未被订单引用的商品
    pub async fn delete_product_hard(&self, id: u64) -> Result<(), AppError> {
        let references: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM order_items WHERE product_id = ?"#)
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        if references > 0 {
            return Err(AppError::Conflict(
                "Cannot delete product that is referenced in orders".to_string(),
            ));
        }

        let result = sqlx::query(r#"DELETE FROM products WHERE id = ?"#)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Product with ID {} not found",
                id
            )));
        }

        Ok(())
    }
}
