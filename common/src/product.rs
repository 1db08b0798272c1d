use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned product identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Listing tier of a product. The set is closed: the form only ever offers these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    None,
    Premium,
    Featured,
    Classic,
}

impl ProductCategory {
    /// Every category, in the order the choice control lists them.
    pub const ALL: [ProductCategory; 4] = [
        ProductCategory::None,
        ProductCategory::Premium,
        ProductCategory::Featured,
        ProductCategory::Classic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::None => "None",
            ProductCategory::Premium => "Premium",
            ProductCategory::Featured => "Featured",
            ProductCategory::Classic => "Classic",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a category string is outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown product category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for ProductCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A product as the catalog server describes it.
///
/// Every field is defaulted when a response omits it, so a sparse payload
/// still hydrates into a usable draft. The same type doubles as the local
/// draft while the product is being edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    /// Absent for a product that has never been saved.
    #[serde(alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    pub name: String,
    #[serde(deserialize_with = "price_from_number_or_text")]
    pub price: Option<f64>,
    pub model: String,
    pub location: String,
    #[serde(deserialize_with = "category_or_unset")]
    pub category: Option<ProductCategory>,
    pub is_featured: bool,
    #[serde(deserialize_with = "lines_or_empty")]
    pub description: Vec<String>,
}

impl Product {
    /// Whether this product still needs a create call.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

/// Some deployments echo the price back as the text the form posted.
fn price_from_number_or_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid price '{s}': {e}"))),
    }
}

/// An empty string means the category select was never touched.
fn category_or_unset<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ProductCategory>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn lines_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single image attached to a draft. Never persisted locally.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Format a price for display, e.g. `$20000.00`.
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("${p:.2}"),
        None => "-".to_string(),
    }
}

/// Text lines of the product detail card.
pub fn detail_lines(product: &Product) -> Vec<String> {
    let mut lines = vec![
        product.name.clone(),
        format!("Price: {}", format_price(product.price)),
        format!("Model: {}", product.model),
        format!("Location: {}", product.location),
        "Description:".to_string(),
    ];
    lines.extend(product.description.iter().map(|d| format!("- {d}")));
    lines.push(format!(
        "Category: {}",
        product.category.map(|c| c.as_str()).unwrap_or("")
    ));
    lines.push(format!(
        "Featured: {}",
        if product.is_featured { "Yes" } else { "No" }
    ));
    lines
}
