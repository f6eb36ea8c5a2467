use crate::{
    entities::{category, product, Category, Product},
    errors::ServiceError,
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;

/// Read-only product catalog.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Active categories ordered by title.
    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(Category::find()
            .filter(category::Column::Active.eq(true))
            .order_by_asc(category::Column::Title)
            .all(&*self.db)
            .await?)
    }

    /// Published products, newest first, with pagination.
    pub async fn list_products(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let paginator = Product::find()
            .filter(product::Column::Status.eq(product::ProductStatus::Published))
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((data, total))
    }

    /// Single product lookup by slug.
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<product::Model, ServiceError> {
        Product::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", slug)))
    }
}
