//! Per-deployment wire shape of the catalog gateway.
//!
//! Deployments disagree on base paths, response envelopes, success
//! signalling and body encoding, so none of it is hard-coded.

use std::time::Duration;

use clap::ValueEnum;

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:4000/api";
pub const DEFAULT_AUTH_URL: &str = "http://localhost:4200/api";
pub const DEFAULT_PRODUCTS_PATH: &str = "/products";
pub const DEFAULT_ENVELOPE_KEY: &str = "responseData";
pub const DEFAULT_SUCCESS_FIELD: &str = "success";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Body encoding for create/update requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SubmitEncoding {
    /// Multipart when an image is pending, JSON otherwise.
    #[default]
    Auto,
    Multipart,
    /// JSON only; a pending image is dropped.
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum UpdateMethod {
    #[default]
    Put,
    Patch,
}

/// Where the form sends the user after a successful save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AfterSubmit {
    #[default]
    ProductList,
    /// Detail page of the saved product, falling back to the list when
    /// the id is unknown.
    ProductDetail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Base URL of the catalog API, e.g. `http://localhost:4000/api`.
    pub base_url: String,
    /// Base URL of the login endpoint.
    pub auth_url: String,
    pub products_path: String,
    /// Response field wrapping the payload; `None` means the body is the payload.
    pub envelope_key: Option<String>,
    /// Boolean response field that must be `true`; `None` means HTTP status alone decides.
    pub success_field: Option<String>,
    pub create_encoding: SubmitEncoding,
    pub update_encoding: SubmitEncoding,
    pub update_method: UpdateMethod,
    pub after_submit: AfterSubmit,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            products_path: DEFAULT_PRODUCTS_PATH.to_string(),
            envelope_key: Some(DEFAULT_ENVELOPE_KEY.to_string()),
            success_field: Some(DEFAULT_SUCCESS_FIELD.to_string()),
            create_encoding: SubmitEncoding::Auto,
            update_encoding: SubmitEncoding::Json,
            update_method: UpdateMethod::Put,
            after_submit: AfterSubmit::ProductList,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GatewayConfig {
    /// Defaults pointed at a single base URL for both catalog and auth.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            auth_url: base_url.clone(),
            base_url,
            ..Default::default()
        }
    }

    pub fn products_url(&self) -> String {
        join_url(&self.base_url, &self.products_path)
    }

    pub fn login_url(&self) -> String {
        join_url(&self.auth_url, "/login")
    }

    pub fn register_url(&self) -> String {
        join_url(&self.base_url, "/auth/register")
    }
}

/// Treat an empty CLI/env value as "not configured".
pub fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
