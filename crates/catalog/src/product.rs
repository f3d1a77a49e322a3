use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainResult, ProductId};

use crate::validate;

/// Number of products returned by a search without a query.
pub const DEFAULT_SEARCH_LIMIT: usize = 6;

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub image: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Case-insensitive substring match on the title.
    pub fn matches_search(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(&query.to_lowercase())
    }

    pub fn apply(&mut self, update: &UpdateProduct, now: DateTime<Utc>) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(category) = &update.category {
            self.category = category.clone();
        }
        if let Some(brand) = &update.brand {
            self.brand = brand.clone();
        }
        if let Some(image) = &update.image {
            self.image = image.clone();
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        self.updated_at = now;
    }
}

/// Create-product request; also the insert payload once validated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateProduct {
    pub title: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub image: String,
    pub price: f64,
}

impl CreateProduct {
    pub fn validate(&self) -> DomainResult<()> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;
        validate_category(&self.category)?;
        validate_brand(&self.brand)?;
        validate_image(&self.image)?;
        validate_price(self.price)
    }
}

/// Partial product update.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpdateProduct {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub price: Option<f64>,
}

impl UpdateProduct {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(v) = &self.title {
            validate_title(v)?;
        }
        if let Some(v) = &self.description {
            validate_description(v)?;
        }
        if let Some(v) = &self.category {
            validate_category(v)?;
        }
        if let Some(v) = &self.brand {
            validate_brand(v)?;
        }
        if let Some(v) = &self.image {
            validate_image(v)?;
        }
        if let Some(v) = self.price {
            validate_price(v)?;
        }
        Ok(())
    }
}

fn validate_title(v: &str) -> DomainResult<()> {
    validate::length("title", v, 2, 50)
}

fn validate_description(v: &str) -> DomainResult<()> {
    validate::length("description", v, 10, 500)
}

fn validate_category(v: &str) -> DomainResult<()> {
    validate::length("category", v, 2, 10)
}

fn validate_brand(v: &str) -> DomainResult<()> {
    validate::length("brand", v, 2, 10)
}

fn validate_image(v: &str) -> DomainResult<()> {
    validate::min_length("image", v, 5)
}

fn validate_price(v: f64) -> DomainResult<()> {
    validate::min_value("price", v, 5.0)
}
