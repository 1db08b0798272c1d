use serde::Serialize;

use crate::product::{ImageFile, Product, ProductCategory, ProductId};

/// Errors from gateway operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The request never produced a response (connect, timeout, TLS, ...).
    Transport(String),
    /// The server answered with a non-success HTTP status.
    Status { status: u16, body: String },
    /// The response body did not have the expected shape.
    Decode(String),
    /// The server answered, but flagged the operation as unsuccessful.
    Rejected(String),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "gateway unreachable: {msg}"),
            Self::Status { status, body } => write!(f, "gateway returned HTTP {status}: {body}"),
            Self::Decode(msg) => write!(f, "unexpected gateway response: {msg}"),
            Self::Rejected(msg) => write!(f, "gateway rejected the request: {msg}"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// What the gateway reports back after a create or update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// Identifier of the saved product, when the server echoes one.
    pub id: Option<ProductId>,
    /// Free-form message from the server, if any.
    pub message: Option<String>,
}

/// A draft ready to be sent: every product field plus the pending image.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSubmission {
    pub product: Product,
    pub image: Option<ImageFile>,
}

impl ProductSubmission {
    pub fn new(product: Product, image: Option<ImageFile>) -> Self {
        Self { product, image }
    }

    /// Borrowed JSON body: all product fields, no attachment, no id.
    pub fn body(&self) -> SubmissionBody<'_> {
        SubmissionBody {
            name: &self.product.name,
            price: self.product.price,
            model: &self.product.model,
            location: &self.product.location,
            category: self.product.category,
            is_featured: self.product.is_featured,
            description: &self.product.description,
        }
    }

    /// Text parts of a multipart body, in field order.
    ///
    /// The description list travels as one JSON-encoded part.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let p = &self.product;
        vec![
            ("name", p.name.clone()),
            ("price", p.price.map(|v| v.to_string()).unwrap_or_default()),
            ("model", p.model.clone()),
            ("location", p.location.clone()),
            (
                "category",
                p.category.map(|c| c.as_str().to_string()).unwrap_or_default(),
            ),
            ("isFeatured", p.is_featured.to_string()),
            (
                "description",
                serde_json::to_string(&p.description).unwrap_or_else(|_| "[]".to_string()),
            ),
        ]
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionBody<'a> {
    pub name: &'a str,
    pub price: Option<f64>,
    pub model: &'a str,
    pub location: &'a str,
    pub category: Option<ProductCategory>,
    pub is_featured: bool,
    pub description: &'a [String],
}

/// Source of a bearer credential for authenticated deployments.
pub trait CredentialProvider {
    /// The token to attach, or `None` when no user is signed in.
    fn bearer_token(&self) -> Option<String>;
}

/// Abstraction over product persistence backends.
///
/// The wire shape (base path, envelope, body encoding) is supplied by each
/// implementation; callers only see these three operations.
#[allow(async_fn_in_trait)]
pub trait ProductGateway {
    /// Fetch a single product.
    async fn fetch_by_id(&self, id: &ProductId) -> Result<Product, GatewayError>;

    /// Create a new product.
    async fn create(&self, submission: &ProductSubmission) -> Result<SubmitReceipt, GatewayError>;

    /// Replace an existing product.
    async fn update(
        &self,
        id: &ProductId,
        submission: &ProductSubmission,
    ) -> Result<SubmitReceipt, GatewayError>;

    /// Human-readable backend name (e.g. "http", "mock").
    fn gateway_name(&self) -> &str;
}
