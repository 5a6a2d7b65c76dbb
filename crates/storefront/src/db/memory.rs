//! In-memory implementation of the catalog and user stores.
//!
//! Mirrors the `PostgreSQL` schema constraints (unique slugs, one like per
//! owner and product, foreign keys) so service and router tests exercise the
//! same outcomes without a database. Each operation holds the lock for its
//! whole check-and-write, which is what makes concurrent duplicate likes
//! resolve to exactly one winner.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use catalog_core::{CategoryId, CommentId, LikeId, ProductId, Slug, UserId, Username};

use super::{CatalogStore, RepositoryError, UserStore};
use crate::models::{
    Category, CategorySummary, Comment, Like, NewCategory, NewProduct, Product, ProductFilter,
    Requester, User,
};

#[derive(Default)]
struct State {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, ProductRecord>,
    likes: Vec<Like>,
    like_keys: HashSet<(ProductId, Requester)>,
    comments: Vec<Comment>,
    users: Vec<(User, String)>,
    next_id: i64,
}

#[derive(Clone)]
struct ProductRecord {
    category_id: CategoryId,
    name: String,
    slug: Slug,
    price: catalog_core::Price,
    description: String,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn product(&self, id: ProductId) -> Option<Product> {
        let record = self.products.get(&id)?;
        let category = self.categories.get(&record.category_id)?;
        Some(Product {
            id,
            category_id: record.category_id,
            category_slug: category.slug.clone(),
            name: record.name.clone(),
            slug: record.slug.clone(),
            price: record.price,
            description: record.description.clone(),
        })
    }
}

/// Store holding everything in process memory.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn sort_products(products: &mut [Product]) {
    products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn category_summaries(&self) -> Result<Vec<CategorySummary>, RepositoryError> {
        let state = self.state();
        let mut summaries: Vec<CategorySummary> = state
            .categories
            .values()
            .map(|category| CategorySummary {
                category: category.clone(),
                product_count: state
                    .products
                    .values()
                    .filter(|p| p.category_id == category.id)
                    .count()
                    .try_into()
                    .unwrap_or(i64::MAX),
            })
            .collect();
        summaries.sort_by(|a, b| {
            a.category
                .name
                .cmp(&b.category.name)
                .then(a.category.id.cmp(&b.category.id))
        });
        Ok(summaries)
    }

    async fn category_by_slug(&self, slug: &Slug) -> Result<Option<Category>, RepositoryError> {
        Ok(self
            .state()
            .categories
            .values()
            .find(|c| &c.slug == slug)
            .cloned())
    }

    async fn product_in_category(
        &self,
        category_id: CategoryId,
        slug: &Slug,
    ) -> Result<Option<Product>, RepositoryError> {
        let state = self.state();
        Ok(state
            .products
            .iter()
            .find(|(_, p)| p.category_id == category_id && &p.slug == slug)
            .and_then(|(id, _)| state.product(*id)))
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.state().product(id))
    }

    async fn products_in_category(
        &self,
        category_id: CategoryId,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state();
        let mut products: Vec<Product> = state
            .products
            .iter()
            .filter(|(_, p)| p.category_id == category_id && filter.price_matches(p.price))
            .filter(|(id, _)| {
                filter
                    .liked_by
                    .is_none_or(|owner| state.like_keys.contains(&(**id, owner)))
            })
            .filter_map(|(id, _)| state.product(*id))
            .collect();
        sort_products(&mut products);
        Ok(products)
    }

    async fn insert_like(
        &self,
        product_id: ProductId,
        owner: Requester,
    ) -> Result<Like, RepositoryError> {
        let mut state = self.state();
        if !state.products.contains_key(&product_id) {
            return Err(RepositoryError::NotFound);
        }
        if !state.like_keys.insert((product_id, owner)) {
            return Err(RepositoryError::Conflict("product already liked".to_owned()));
        }

        let like = Like {
            id: LikeId::new(state.next_id()),
            product_id,
            owner,
            created_at: Utc::now(),
        };
        state.likes.push(like.clone());
        Ok(like)
    }

    async fn like_count(&self, product_id: ProductId) -> Result<i64, RepositoryError> {
        let count = self
            .state()
            .likes
            .iter()
            .filter(|l| l.product_id == product_id)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn has_liked(
        &self,
        product_id: ProductId,
        owner: Requester,
    ) -> Result<bool, RepositoryError> {
        Ok(self.state().like_keys.contains(&(product_id, owner)))
    }

    async fn comments_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let mut comments: Vec<Comment> = self
            .state()
            .comments
            .iter()
            .filter(|c| c.product_id == product_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(comments)
    }

    async fn insert_comment(
        &self,
        product_id: ProductId,
        body: &str,
    ) -> Result<Comment, RepositoryError> {
        let mut state = self.state();
        if !state.products.contains_key(&product_id) {
            return Err(RepositoryError::NotFound);
        }

        let comment = Comment {
            id: CommentId::new(state.next_id()),
            product_id,
            body: body.to_owned(),
            created_at: Utc::now(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn upsert_category(&self, category: &NewCategory) -> Result<Category, RepositoryError> {
        let mut state = self.state();
        if let Some(existing) = state
            .categories
            .values_mut()
            .find(|c| c.slug == category.slug)
        {
            existing.name.clone_from(&category.name);
            return Ok(existing.clone());
        }

        let created = Category {
            id: CategoryId::new(state.next_id()),
            name: category.name.clone(),
            slug: category.slug.clone(),
        };
        state.categories.insert(created.id, created.clone());
        Ok(created)
    }

    async fn upsert_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut state = self.state();
        if !state.categories.contains_key(&product.category_id) {
            return Err(RepositoryError::NotFound);
        }

        let record = ProductRecord {
            category_id: product.category_id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.price,
            description: product.description.clone(),
        };

        let existing = state
            .products
            .iter()
            .find(|(_, p)| p.category_id == product.category_id && p.slug == product.slug)
            .map(|(id, _)| *id);
        let id = match existing {
            Some(id) => id,
            None => ProductId::new(state.next_id()),
        };
        state.products.insert(id, record);

        state.product(id).ok_or(RepositoryError::NotFound)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut state = self.state();
        if state.users.iter().any(|(u, _)| &u.username == username) {
            return Err(RepositoryError::Conflict(
                "username already exists".to_owned(),
            ));
        }

        let user = User {
            id: UserId::new(state.next_id()),
            username: username.clone(),
            created_at: Utc::now(),
        };
        state.users.push((user.clone(), password_hash.to_owned()));
        Ok(user)
    }

    async fn user_with_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|(u, _)| &u.username == username)
            .cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    async fn seeded() -> (InMemoryStore, Category, Product) {
        let store = InMemoryStore::new();
        let category = store
            .upsert_category(&NewCategory {
                name: "Teapots".to_string(),
                slug: Slug::parse("teapots").unwrap(),
            })
            .await
            .unwrap();
        let product = store
            .upsert_product(&NewProduct {
                category_id: category.id,
                name: "Cast Iron".to_string(),
                slug: Slug::parse("cast-iron").unwrap(),
                price: "45.00".parse().unwrap(),
                description: String::new(),
            })
            .await
            .unwrap();
        (store, category, product)
    }

    #[tokio::test]
    async fn test_upsert_category_keeps_id_for_same_slug() {
        let (store, category, _) = seeded().await;
        let renamed = store
            .upsert_category(&NewCategory {
                name: "Tea Pots".to_string(),
                slug: category.slug.clone(),
            })
            .await
            .unwrap();
        assert_eq!(renamed.id, category.id);
        assert_eq!(renamed.name, "Tea Pots");
    }

    #[tokio::test]
    async fn test_upsert_product_requires_existing_category() {
        let store = InMemoryStore::new();
        let result = store
            .upsert_product(&NewProduct {
                category_id: CategoryId::new(99),
                name: "Orphan".to_string(),
                slug: Slug::parse("orphan").unwrap(),
                price: catalog_core::Price::ZERO,
                description: String::new(),
            })
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_insert_like_enforces_uniqueness_per_owner() {
        let (store, _, product) = seeded().await;
        let owner = Requester::Anonymous(IpAddr::V4(Ipv4Addr::LOCALHOST));

        store.insert_like(product.id, owner).await.unwrap();
        let second = store.insert_like(product.id, owner).await;
        assert!(matches!(second, Err(RepositoryError::Conflict(_))));

        // A different owner is unaffected.
        store
            .insert_like(product.id, Requester::User(UserId::new(1)))
            .await
            .unwrap();
        assert_eq!(store.like_count(product.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_like_on_missing_product() {
        let store = InMemoryStore::new();
        let result = store
            .insert_like(ProductId::new(1), Requester::User(UserId::new(1)))
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_username() {
        let store = InMemoryStore::new();
        let username = Username::parse("jane").unwrap();
        store.create_user(&username, "hash").await.unwrap();
        let again = store.create_user(&username, "hash").await;
        assert!(matches!(again, Err(RepositoryError::Conflict(_))));
    }
}
