//! Catalog seeding from YAML.
//!
//! ```yaml
//! suppliers:
//!   - name: Almarai
//! categories:
//!   - slug: dairy
//!     name: الألبان والبيض
//!     position: 1
//! products:
//!   - slug: fresh-milk-1l
//!     name: حليب طازج ١ لتر
//!     category: dairy
//!     supplier: Almarai
//!     price: "6.50"
//!     stock: 120
//! shifts:
//!   - name: الصباح
//!     start: "09:00"
//!     end: "12:00"
//! ```
//!
//! Rows are matched on category and product slug, supplier name and shift
//! name, so running the same file twice updates instead of duplicating.
//! The whole file is applied in one transaction.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{Postgres, Transaction};
use thiserror::Error;

use dukkan_admin::db;
use dukkan_admin::routes::is_valid_slug;
use dukkan_core::ShiftWindow;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{} problem(s) in the seed file:\n  - {}", .0.len(), .0.join("\n  - "))]
    Invalid(Vec<String>),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogFile {
    pub suppliers: Vec<SupplierSeed>,
    pub categories: Vec<CategorySeed>,
    pub products: Vec<ProductSeed>,
    pub shifts: Vec<ShiftSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupplierSeed {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySeed {
    pub slug: String,
    pub name: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
    pub slug: String,
    pub name: String,
    /// Category slug.
    pub category: String,
    /// Supplier name.
    pub supplier: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Quoted decimal, e.g. `"6.50"`.
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShiftSeed {
    pub name: String,
    /// `HH:MM`
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub position: i32,
}

impl ShiftSeed {
    fn window(&self) -> Option<ShiftWindow> {
        let start = NaiveTime::parse_from_str(&self.start, "%H:%M").ok()?;
        let end = NaiveTime::parse_from_str(&self.end, "%H:%M").ok()?;
        ShiftWindow::new(start, end).ok()
    }
}

/// Rows written per table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub suppliers: usize,
    pub categories: usize,
    pub products: usize,
    pub shifts: usize,
}

impl CatalogFile {
    /// Parse a seed file.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Yaml`] for malformed YAML or unknown fields.
    pub fn parse(content: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Check references and values without touching the database.
    ///
    /// Products may reference categories and suppliers that already exist
    /// in the database; those references are checked again on insert.
    #[must_use]
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let mut slugs = HashSet::new();
        for category in &self.categories {
            if !is_valid_slug(&category.slug) {
                problems.push(format!("category slug {:?} is not valid", category.slug));
            }
            if category.name.trim().is_empty() {
                problems.push(format!("category {:?} has no name", category.slug));
            }
            if !slugs.insert(category.slug.as_str()) {
                problems.push(format!("category {:?} is listed twice", category.slug));
            }
        }

        let mut slugs = HashSet::new();
        for product in &self.products {
            if !is_valid_slug(&product.slug) {
                problems.push(format!("product slug {:?} is not valid", product.slug));
            }
            if product.name.trim().is_empty() {
                problems.push(format!("product {:?} has no name", product.slug));
            }
            if product.price.is_sign_negative() || product.price.normalize().scale() > 2 {
                problems.push(format!(
                    "product {:?} price {} is not a valid amount",
                    product.slug, product.price
                ));
            }
            if product.stock < 0 {
                problems.push(format!("product {:?} has negative stock", product.slug));
            }
            if !slugs.insert(product.slug.as_str()) {
                problems.push(format!("product {:?} is listed twice", product.slug));
            }
        }

        for shift in &self.shifts {
            if shift.name.trim().is_empty() {
                problems.push("a shift has no name".to_string());
            }
            if shift.window().is_none() {
                problems.push(format!(
                    "shift {:?} needs HH:MM times with end after start",
                    shift.name
                ));
            }
        }

        problems
    }
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or a write fails.
/// Nothing is written unless every row succeeds.
pub async fn catalog(file_path: &str) -> Result<SeedSummary, SeedError> {
    let content = tokio::fs::read_to_string(Path::new(file_path))
        .await
        .map_err(|source| SeedError::Read {
            path: file_path.to_owned(),
            source,
        })?;
    let file = CatalogFile::parse(&content)?;

    let problems = file.problems();
    if !problems.is_empty() {
        return Err(SeedError::Invalid(problems));
    }

    let database_url = super::database_url().map_err(SeedError::MissingEnvVar)?;
    let pool = db::create_pool(&database_url).await?;
    tracing::info!(path = %file_path, "Seeding catalog");

    let mut tx = pool.begin().await?;
    let summary = apply(&mut tx, &file).await?;
    tx.commit().await?;

    Ok(summary)
}

async fn apply(
    tx: &mut Transaction<'_, Postgres>,
    file: &CatalogFile,
) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();

    for supplier in &file.suppliers {
        sqlx::query(
            "INSERT INTO dukkan.suppliers (name) VALUES ($1) ON CONFLICT (name) DO NOTHING",
        )
        .bind(supplier.name.trim())
        .execute(&mut **tx)
        .await?;
        summary.suppliers += 1;
    }

    for category in &file.categories {
        sqlx::query(
            r"
            INSERT INTO dukkan.categories (slug, name, image_url, position)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO UPDATE
                SET name = EXCLUDED.name,
                    image_url = EXCLUDED.image_url,
                    position = EXCLUDED.position
            ",
        )
        .bind(&category.slug)
        .bind(category.name.trim())
        .bind(&category.image_url)
        .bind(category.position)
        .execute(&mut **tx)
        .await?;
        summary.categories += 1;
    }

    let mut missing = Vec::new();
    for product in &file.products {
        let category_id: Option<i32> =
            sqlx::query_scalar("SELECT id FROM dukkan.categories WHERE slug = $1")
                .bind(&product.category)
                .fetch_optional(&mut **tx)
                .await?;
        let Some(category_id) = category_id else {
            missing.push(format!(
                "product {:?} references unknown category {:?}",
                product.slug, product.category
            ));
            continue;
        };

        let supplier_id: Option<i32> = match &product.supplier {
            Some(name) => {
                let id = sqlx::query_scalar("SELECT id FROM dukkan.suppliers WHERE name = $1")
                    .bind(name.trim())
                    .fetch_optional(&mut **tx)
                    .await?;
                if id.is_none() {
                    missing.push(format!(
                        "product {:?} references unknown supplier {name:?}",
                        product.slug
                    ));
                    continue;
                }
                id
            }
            None => None,
        };

        sqlx::query(
            r"
            INSERT INTO dukkan.products
                (category_id, supplier_id, slug, name, description, price, stock, image_url, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (slug) DO UPDATE
                SET category_id = EXCLUDED.category_id,
                    supplier_id = EXCLUDED.supplier_id,
                    name = EXCLUDED.name,
                    description = EXCLUDED.description,
                    price = EXCLUDED.price,
                    stock = EXCLUDED.stock,
                    image_url = EXCLUDED.image_url,
                    is_active = EXCLUDED.is_active,
                    updated_at = NOW()
            ",
        )
        .bind(category_id)
        .bind(supplier_id)
        .bind(&product.slug)
        .bind(product.name.trim())
        .bind(product.description.trim())
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(product.active)
        .execute(&mut **tx)
        .await?;
        summary.products += 1;
    }
    if !missing.is_empty() {
        return Err(SeedError::Invalid(missing));
    }

    for shift in &file.shifts {
        // Checked by `problems()` before the transaction started.
        let Some(window) = shift.window() else {
            continue;
        };
        let updated = sqlx::query(
            r"
            UPDATE dukkan.shifts
            SET start_time = $2, end_time = $3, position = $4
            WHERE name = $1
            ",
        )
        .bind(shift.name.trim())
        .bind(window.start)
        .bind(window.end)
        .bind(shift.position)
        .execute(&mut **tx)
        .await?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r"
                INSERT INTO dukkan.shifts (name, start_time, end_time, position)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(shift.name.trim())
            .bind(window.start)
            .bind(window.end)
            .bind(shift.position)
            .execute(&mut **tx)
            .await?;
        }
        summary.shifts += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
suppliers:
  - name: Almarai
categories:
  - slug: dairy
    name: الألبان والبيض
    position: 1
products:
  - slug: fresh-milk-1l
    name: حليب طازج
    category: dairy
    supplier: Almarai
    price: "6.50"
    stock: 120
shifts:
  - name: الصباح
    start: "09:00"
    end: "12:00"
"#;

    #[test]
    fn test_parse_sample() {
        let file = CatalogFile::parse(SAMPLE).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(file.suppliers.len(), 1);
        assert_eq!(file.products.len(), 1);
        assert!(file.products.iter().all(|p| p.active));
        assert_eq!(file.products.first().map(|p| p.price), Some(Decimal::new(650, 2)));
        assert!(file.problems().is_empty(), "{:?}", file.problems());
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let file = CatalogFile::parse("shifts: []").unwrap_or_else(|e| panic!("{e}"));
        assert!(file.categories.is_empty());
        assert!(file.problems().is_empty());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(CatalogFile::parse("products:\n  - slug: x\n    colour: red\n").is_err());
    }

    #[test]
    fn test_problems_are_collected() {
        let yaml = r#"
categories:
  - slug: Dairy
    name: ""
products:
  - slug: milk
    name: Milk
    category: dairy
    price: "1.999"
    stock: -1
  - slug: milk
    name: Milk
    category: dairy
    price: "2"
shifts:
  - name: Late
    start: "21:00"
    end: "18:00"
"#;
        let file = CatalogFile::parse(yaml).unwrap_or_else(|e| panic!("{e}"));
        let problems = file.problems();
        assert!(problems.iter().any(|p| p.contains("slug \"Dairy\"")));
        assert!(problems.iter().any(|p| p.contains("has no name")));
        assert!(problems.iter().any(|p| p.contains("price 1.999")));
        assert!(problems.iter().any(|p| p.contains("negative stock")));
        assert!(problems.iter().any(|p| p.contains("listed twice")));
        assert!(problems.iter().any(|p| p.contains("shift \"Late\"")));
    }
}
