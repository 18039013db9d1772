//! Product Repository

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::{Product, ProductCreate, ProductUpdate, Review};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "product";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all products, optionally filtered by keyword and category
    pub async fn find_all(
        &self,
        keyword: Option<String>,
        category: Option<String>,
    ) -> RepoResult<Vec<Product>> {
        let keyword = keyword.map(|k| k.to_lowercase());
        let mut result = self
            .base
            .db()
            .query(
                r#"SELECT * FROM product
                    WHERE ($kw = NONE OR string::contains(string::lowercase(name), $kw))
                    AND ($category = NONE OR category = $category)
                    ORDER BY name"#,
            )
            .bind(("kw", keyword))
            .bind(("category", category))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        Ok(products)
    }

    /// Find product by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let thing = parse_id(id)?;
        let product: Option<Product> = self.base.db().select(thing).await?;
        Ok(product)
    }

    /// Create a new product
    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        let product = Product {
            id: None,
            name: data.name,
            description: data.description,
            price: data.price,
            image: data.image,
            category: data.category,
            brand: data.brand,
            count_in_stock: data.count_in_stock,
            rating: 0.0,
            num_reviews: 0,
            reviews: Vec::new(),
            created_at: chrono::Utc::now(),
        };

        let created: Option<Product> = self.base.db().create(TABLE).content(product).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Update product fields
    pub async fn update(&self, id: &str, data: ProductUpdate) -> RepoResult<Product> {
        let thing = parse_id(id)?;

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    name = $name OR name,
                    description = $description OR description,
                    price = IF $has_price THEN $price ELSE price END,
                    image = $image OR image,
                    category = $category OR category,
                    brand = $brand OR brand,
                    count_in_stock = IF $has_stock THEN $stock ELSE count_in_stock END
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("name", data.name))
            .bind(("description", data.description))
            .bind(("has_price", data.price.is_some()))
            .bind(("price", data.price))
            .bind(("image", data.image))
            .bind(("category", data.category))
            .bind(("brand", data.brand))
            .bind(("has_stock", data.count_in_stock.is_some()))
            .bind(("stock", data.count_in_stock))
            .await?;

        result
            .take::<Option<Product>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Hard delete a product
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing = parse_id(id)?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))?;

        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }

    /// Append a customer review and recompute rating aggregates
    ///
    /// Each user may review a product once.
    pub async fn add_review(&self, id: &str, review: Review) -> RepoResult<Product> {
        let thing = parse_id(id)?;
        let mut product = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))?;

        if product.has_review_from(&review.user) {
            return Err(RepoError::Duplicate(
                "Product already reviewed by this user".to_string(),
            ));
        }

        product.reviews.push(review);
        product.recalculate_rating();

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    reviews = $reviews,
                    rating = $rating,
                    num_reviews = $num_reviews
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("reviews", product.reviews))
            .bind(("rating", product.rating))
            .bind(("num_reviews", product.num_reviews))
            .await?;

        result
            .take::<Option<Product>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Atomically take stock for an order line
    ///
    /// The WHERE clause makes check and decrement a single statement,
    /// so two orders cannot both take the last unit.
    pub async fn take_stock(&self, id: &str, quantity: i32) -> RepoResult<Product> {
        let thing = parse_id(id)?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))?;

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing
                    SET count_in_stock = count_in_stock - $qty
                    WHERE count_in_stock >= $qty
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("qty", quantity))
            .await?;

        result.take::<Option<Product>>(0)?.ok_or_else(|| {
            RepoError::Validation(format!("Insufficient stock for product {}", id))
        })
    }
}
