//! Read-only catalog client.
//!
//! Thin wrapper over the `{ "data": [...] }` catalog endpoints with an
//! in-memory `moka` cache (5-minute TTL). The catalog is browse-only; all
//! purchase state lives in the cart ledger.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};

use monarca_core::PriceTier;

use crate::api::{ApiClient, ApiError, Data};

/// Cache TTL for catalog reads.
const CACHE_TTL: Duration = Duration::from_secs(300);
/// Upper bound on cached entries (endpoints plus individual products).
const CACHE_CAPACITY: u64 = 1000;

/// A product category tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Catalog id.
    pub id: u64,
    /// Display title.
    pub title: String,
    /// Secondary line under the title.
    pub subtitle: String,
    /// Image URL.
    pub file: String,
}

/// A manufacturer/brand tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    /// Catalog id.
    pub id: u64,
    /// Brand display name.
    #[serde(rename = "ManufacturerName")]
    pub manufacturer_name: String,
    /// Logo image URL.
    pub file: String,
}

/// A home-page banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    /// Catalog id.
    pub id: u64,
    /// Image URL.
    pub file: String,
    /// Headline.
    pub title: String,
    /// Secondary line.
    pub subtitle: String,
    /// Accent color for the overlay text.
    pub color: String,
    /// Whether the banner spans the extra-large slot.
    pub is_xl: bool,
}

/// A featured product on the home page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    /// Catalog id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Star rating.
    pub stars: f64,
    /// Availability flag.
    pub in_stock: bool,
    /// Current price.
    pub price: f64,
    /// Pre-discount price.
    pub price_old: f64,
    /// Discount percentage.
    pub discount: f64,
    /// Review count.
    pub number_reviews: u64,
    /// Brand display name.
    pub brand: String,
    /// Image URL.
    pub file: String,
}

/// A selectable product color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductColor {
    /// Display name (e.g. "Rojo").
    pub name: String,
    /// Hex value used for the swatch.
    pub hex: String,
}

/// A catalog product with its volume-pricing tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Catalog id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Brand display name.
    pub brand: String,
    /// Optional vendor code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Long description.
    pub description: String,
    /// Main image URL.
    pub main_image: String,
    /// Available sizes in display order.
    pub sizes: Vec<String>,
    /// Weight description (e.g. "180 g/m2").
    pub weight: String,
    /// Fabric description.
    pub fabric: String,
    /// Composition description.
    pub composition: String,
    /// Available colors.
    pub colors: Vec<ProductColor>,
    /// Ordered volume-pricing tiers.
    pub prices: Vec<PriceTier>,
}

/// A downloadable catalog PDF with its cover image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog id.
    pub id: u64,
    /// Display title.
    pub title: String,
    /// PDF URL.
    pub file: String,
    /// Cover image URL.
    pub file_img: String,
}

#[derive(Clone)]
enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Brands(Arc<Vec<Brand>>),
    Banners(Arc<Vec<Banner>>),
    Products(Arc<Vec<Product>>),
    TopProducts(Arc<Vec<TopProduct>>),
    Catalogs(Arc<Vec<Catalog>>),
    Product(Arc<Product>),
}

/// Client for the read-only catalog endpoints.
///
/// Responses are cached for five minutes; cache entries are shared across
/// clones.
#[derive(Clone)]
pub struct CatalogClient {
    client: ApiClient,
    cache: Cache<String, CacheValue>,
}

impl CatalogClient {
    /// Create a catalog client over the shared API client.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();
        Self { client, cache }
    }

    /// Product categories.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the endpoint cannot be read.
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        if let Some(CacheValue::Categories(cached)) = self.cache.get("categories").await {
            return Ok(cached);
        }
        let data: Data<Vec<Category>> = self.client.get_json("categories").await?;
        let value = Arc::new(data.data);
        self.cache
            .insert("categories".to_owned(), CacheValue::Categories(value.clone()))
            .await;
        Ok(value)
    }

    /// Manufacturer brands.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the endpoint cannot be read.
    pub async fn brands(&self) -> Result<Arc<Vec<Brand>>, ApiError> {
        if let Some(CacheValue::Brands(cached)) = self.cache.get("brands").await {
            return Ok(cached);
        }
        let data: Data<Vec<Brand>> = self.client.get_json("brands").await?;
        let value = Arc::new(data.data);
        self.cache
            .insert("brands".to_owned(), CacheValue::Brands(value.clone()))
            .await;
        Ok(value)
    }

    /// Home-page banners.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the endpoint cannot be read.
    pub async fn banners(&self) -> Result<Arc<Vec<Banner>>, ApiError> {
        if let Some(CacheValue::Banners(cached)) = self.cache.get("banners").await {
            return Ok(cached);
        }
        let data: Data<Vec<Banner>> = self.client.get_json("banners").await?;
        let value = Arc::new(data.data);
        self.cache
            .insert("banners".to_owned(), CacheValue::Banners(value.clone()))
            .await;
        Ok(value)
    }

    /// A page of products.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the endpoint cannot be read.
    pub async fn products(&self, top: u32, skip: u32) -> Result<Arc<Vec<Product>>, ApiError> {
        let key = format!("products?top={top}&skip={skip}");
        if let Some(CacheValue::Products(cached)) = self.cache.get(&key).await {
            return Ok(cached);
        }
        let data: Data<Vec<Product>> = self.client.get_json(&key).await?;
        let value = Arc::new(data.data);
        self.cache
            .insert(key, CacheValue::Products(value.clone()))
            .await;
        Ok(value)
    }

    /// A single product by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown ids, or another `ApiError`
    /// if the endpoint cannot be read.
    pub async fn product(&self, id: &str) -> Result<Arc<Product>, ApiError> {
        let key = format!("products/{id}");
        if let Some(CacheValue::Product(cached)) = self.cache.get(&key).await {
            return Ok(cached);
        }
        let data: Data<Product> = self.client.get_json(&key).await?;
        let value = Arc::new(data.data);
        self.cache
            .insert(key, CacheValue::Product(value.clone()))
            .await;
        Ok(value)
    }

    /// Featured products for the home page.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the endpoint cannot be read.
    pub async fn top_products(&self) -> Result<Arc<Vec<TopProduct>>, ApiError> {
        if let Some(CacheValue::TopProducts(cached)) = self.cache.get("top-products").await {
            return Ok(cached);
        }
        let data: Data<Vec<TopProduct>> = self.client.get_json("top-products").await?;
        let value = Arc::new(data.data);
        self.cache
            .insert(
                "top-products".to_owned(),
                CacheValue::TopProducts(value.clone()),
            )
            .await;
        Ok(value)
    }

    /// Downloadable catalog PDFs.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the endpoint cannot be read.
    pub async fn catalogs(&self) -> Result<Arc<Vec<Catalog>>, ApiError> {
        if let Some(CacheValue::Catalogs(cached)) = self.cache.get("catalogs").await {
            return Ok(cached);
        }
        let data: Data<Vec<Catalog>> = self.client.get_json("catalogs").await?;
        let value = Arc::new(data.data);
        self.cache
            .insert("catalogs".to_owned(), CacheValue::Catalogs(value.clone()))
            .await;
        Ok(value)
    }
}
