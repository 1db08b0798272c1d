//! reqwest-backed catalog gateway.
//!
//! Talks to `{base}{products_path}` with the wire shape described by a
//! [`GatewayConfig`]: envelope key, success field, body encoding per
//! operation and update verb.

use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde_json::Value;
use tracing::{debug, warn};

use catalog_common::gateway::{
    CredentialProvider, GatewayError, ProductGateway, ProductSubmission, SubmitReceipt,
};
use catalog_common::product::{Product, ProductId};

use crate::config::{GatewayConfig, SubmitEncoding, UpdateMethod};

/// Body encoding actually used for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wire {
    Multipart,
    Json,
}

fn resolve_wire(encoding: SubmitEncoding, has_image: bool) -> Wire {
    match encoding {
        SubmitEncoding::Multipart => Wire::Multipart,
        SubmitEncoding::Json => Wire::Json,
        SubmitEncoding::Auto if has_image => Wire::Multipart,
        SubmitEncoding::Auto => Wire::Json,
    }
}

pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
    credentials: Option<Arc<dyn CredentialProvider + Send + Sync>>,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            credentials: None,
        })
    }

    /// Attach a bearer token from `provider` to every request, when it has one.
    pub fn with_credentials(mut self, provider: Arc<dyn CredentialProvider + Send + Sync>) -> Self {
        self.credentials = Some(provider);
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn product_url(&self, id: Option<&ProductId>) -> Result<Url, GatewayError> {
        let base = self.config.products_url();
        let mut url = Url::parse(&base)
            .map_err(|e| GatewayError::Transport(format!("invalid gateway URL '{base}': {e}")))?;
        if let Some(id) = id {
            url.path_segments_mut()
                .map_err(|_| GatewayError::Transport(format!("gateway URL '{base}' cannot take a path")))?
                .pop_if_empty()
                .push(id.as_str());
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.credentials.as_ref().and_then(|c| c.bearer_token()) {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_submission(
        &self,
        method: Method,
        url: Url,
        encoding: SubmitEncoding,
        submission: &ProductSubmission,
    ) -> Result<SubmitReceipt, GatewayError> {
        let wire = resolve_wire(encoding, submission.image.is_some());
        debug!(%method, %url, ?wire, "sending product");

        let builder = self.request(method, url);
        let builder = match wire {
            Wire::Json => {
                if let Some(image) = &submission.image {
                    warn!(file = %image.file_name, "JSON submission cannot carry the image; dropping it");
                }
                builder.json(&submission.body())
            }
            Wire::Multipart => builder.multipart(multipart_form(submission)?),
        };

        let response = builder.send().await.map_err(transport)?;
        let body = read_body(response).await?;
        self.check_success(&body)?;
        Ok(self.receipt(&body))
    }

    /// Payload inside the configured envelope.
    fn unwrap_envelope(&self, body: Value) -> Result<Value, GatewayError> {
        match &self.config.envelope_key {
            None => Ok(body),
            Some(key) => match body {
                Value::Object(mut map) => map
                    .remove(key)
                    .ok_or_else(|| GatewayError::Decode(format!("missing '{key}' field"))),
                other => Err(GatewayError::Decode(format!(
                    "expected an object with '{key}', got {other}"
                ))),
            },
        }
    }

    /// Enforce the configured success flag. An absent flag is only an
    /// error for submissions, where it is the documented signal.
    fn check_success(&self, body: &Value) -> Result<(), GatewayError> {
        let Some(field) = &self.config.success_field else {
            return Ok(());
        };
        match body.get(field).and_then(Value::as_bool) {
            Some(true) => Ok(()),
            _ => Err(GatewayError::Rejected(
                server_message(body).unwrap_or_else(|| format!("'{field}' was not true")),
            )),
        }
    }

    fn receipt(&self, body: &Value) -> SubmitReceipt {
        let payload = match &self.config.envelope_key {
            Some(key) => body.get(key).unwrap_or(body),
            None => body,
        };
        let id = ["id", "_id"]
            .iter()
            .find_map(|k| payload.get(*k))
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .map(ProductId);
        SubmitReceipt {
            id,
            message: server_message(body),
        }
    }
}

impl ProductGateway for HttpGateway {
    async fn fetch_by_id(&self, id: &ProductId) -> Result<Product, GatewayError> {
        let url = self.product_url(Some(id))?;
        debug!(%url, "fetching product");
        let response = self.request(Method::GET, url).send().await.map_err(transport)?;
        let body = read_body(response).await?;

        if let Some(field) = &self.config.success_field {
            if body.get(field).and_then(Value::as_bool) == Some(false) {
                return Err(GatewayError::Rejected(
                    server_message(&body).unwrap_or_else(|| format!("'{field}' was false")),
                ));
            }
        }

        let payload = self.unwrap_envelope(body)?;
        serde_json::from_value(payload).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn create(&self, submission: &ProductSubmission) -> Result<SubmitReceipt, GatewayError> {
        let url = self.product_url(None)?;
        self.send_submission(Method::POST, url, self.config.create_encoding, submission)
            .await
    }

    async fn update(
        &self,
        id: &ProductId,
        submission: &ProductSubmission,
    ) -> Result<SubmitReceipt, GatewayError> {
        let url = self.product_url(Some(id))?;
        let method = match self.config.update_method {
            UpdateMethod::Put => Method::PUT,
            UpdateMethod::Patch => Method::PATCH,
        };
        self.send_submission(method, url, self.config.update_encoding, submission)
            .await
    }

    fn gateway_name(&self) -> &str {
        "http"
    }
}

fn multipart_form(submission: &ProductSubmission) -> Result<Form, GatewayError> {
    let mut form = Form::new();
    for (name, value) in submission.text_fields() {
        form = form.text(name, value);
    }
    if let Some(image) = &submission.image {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| {
                GatewayError::Transport(format!("invalid content type '{}': {e}", image.content_type))
            })?;
        form = form.part("imageFile", part);
    }
    Ok(form)
}

fn transport(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

/// Check the HTTP status and parse the body as JSON. An empty body is `null`.
async fn read_body(response: Response) -> Result<Value, GatewayError> {
    let status = response.status();
    let text = response.text().await.map_err(transport)?;
    if !status.is_success() {
        return Err(GatewayError::Status {
            status: status.as_u16(),
            body: text,
        });
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| GatewayError::Decode(format!("invalid JSON: {e}")))
}

fn server_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}
