//! Seed the catalog from a YAML file.
//!
//! Categories are keyed by slug and products by (category, slug), so
//! re-running a seed updates names, prices and descriptions in place.
//!
//! ```yaml
//! categories:
//!   - name: Teas
//!     products:
//!       - name: Sencha
//!         price: 8.50
//!         description: Steamed Japanese green tea.
//!   - name: Teapots
//!     slug: teapots
//! ```
//!
//! A missing `slug` is derived from the name.

use std::path::Path;

use serde::Deserialize;

use catalog_core::{Price, Slug};
use catalog_storefront::db::{CatalogStore, PgStore};
use catalog_storefront::models::{NewCategory, NewProduct};

use super::{CommandError, connect};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedFile {
    #[serde(default)]
    categories: Vec<SeedCategory>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedCategory {
    name: String,
    slug: Option<String>,
    #[serde(default)]
    products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedProduct {
    name: String,
    slug: Option<String>,
    price: Price,
    #[serde(default)]
    description: String,
}

/// Counts of upserted rows.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
}

/// Read, validate and upsert a seed file.
///
/// The whole file is validated before connecting, so a malformed entry is
/// rejected without touching the catalog. Rows are then upserted one at a
/// time; a database failure partway through keeps the rows already written,
/// and re-running the seed completes it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, an entry has an
/// invalid slug, or a database operation fails.
pub async fn run(path: &Path) -> Result<SeedSummary, CommandError> {
    tracing::info!(path = %path.display(), "Loading seed file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let plan = parse(&content)?;
    tracing::info!(categories = plan.len(), "Seed file validated");

    let store = PgStore::new(connect().await?);
    apply(&store, plan).await
}

/// One category and the products to upsert into it.
type CategoryPlan = (NewCategory, Vec<ProductPlan>);
type ProductPlan = (String, Slug, Price, String);

fn parse(content: &str) -> Result<Vec<CategoryPlan>, CommandError> {
    let file: SeedFile = serde_yaml::from_str(content)?;

    file.categories
        .into_iter()
        .map(|category| {
            let slug = resolve_slug(&category.name, category.slug.as_deref())?;
            let products = category
                .products
                .into_iter()
                .map(|product| {
                    let slug = resolve_slug(&product.name, product.slug.as_deref())?;
                    Ok((product.name, slug, product.price, product.description))
                })
                .collect::<Result<Vec<_>, CommandError>>()?;
            Ok((
                NewCategory {
                    name: category.name,
                    slug,
                },
                products,
            ))
        })
        .collect()
}

fn resolve_slug(name: &str, explicit: Option<&str>) -> Result<Slug, CommandError> {
    let result = match explicit {
        Some(slug) => Slug::parse(slug),
        None => Slug::slugify(name),
    };
    result.map_err(|e| CommandError::InvalidSeed(format!("{name}: {e}")))
}

async fn apply(
    store: &dyn CatalogStore,
    plan: Vec<CategoryPlan>,
) -> Result<SeedSummary, CommandError> {
    let mut summary = SeedSummary::default();

    for (new_category, products) in plan {
        let category = store.upsert_category(&new_category).await?;
        tracing::info!(slug = %category.slug, "Upserted category");
        summary.categories += 1;

        for (name, slug, price, description) in products {
            store
                .upsert_product(&NewProduct {
                    category_id: category.id,
                    name,
                    slug,
                    price,
                    description,
                })
                .await?;
            summary.products += 1;
        }
    }

    Ok(summary)
}
