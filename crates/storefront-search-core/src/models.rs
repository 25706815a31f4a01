//! Catalog data types shared by the aggregator, matcher, and listing code.
//!
//! The storefront REST API speaks camelCase JSON, calls the image field
//! `url`, and is inconsistent about whether ids are strings or numbers.
//! These types accept all of that on the way in and always hold ids as
//! strings.

use serde::{Deserialize, Deserializer, Serialize};

/// A product price as delivered by the API.
///
/// Some endpoints send a number, others a preformatted label such as
/// `"149,90 TL"`. Labels are displayed verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(f64),
    Label(String),
}

/// Category tag attached to a [`CatalogEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// A purchasable item exposed to search and listing.
///
/// Immutable once fetched; identity is [`id`](CatalogEntry::id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Price>,
    /// Routing key for the product detail page.
    pub slug: String,
    #[serde(
        default,
        rename = "url",
        alias = "imageUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
    /// Originating category. Set by the aggregator for every entry it
    /// produces; featured items carry whatever the API sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
}

impl CatalogEntry {
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }

    pub fn category_slug(&self) -> Option<&str> {
        self.category.as_ref().and_then(|c| c.slug.as_deref())
    }

    /// Returns a copy tagged with the given category.
    pub fn tagged(mut self, category: &CategoryEntry) -> Self {
        self.category = Some(CategoryRef {
            name: category.name.clone(),
            slug: Some(category.slug.clone()),
        });
        self
    }
}

/// A grouping of catalog entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEntry {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(
        default,
        rename = "url",
        alias = "imageUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_count: Option<u64>,
}

/// Expand a route template such as `/product-detail/{slug}` for an entry.
pub fn product_route(template: &str, entry: &CatalogEntry) -> String {
    template.replace("{slug}", &entry.slug)
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
