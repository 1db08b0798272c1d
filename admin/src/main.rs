//! Catalog admin CLI.
//!
//! Headless front end for the product form: load a product into the
//! form, apply field edits from the command line, save it, and manage
//! the signed-in session the gateway authenticates with.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use catalog_admin::auth::{self, AuthClient, RegisterForm, SignInForm};
use catalog_admin::config::{
    non_empty, AfterSubmit, GatewayConfig, SubmitEncoding, UpdateMethod, DEFAULT_AUTH_URL,
    DEFAULT_ENVELOPE_KEY, DEFAULT_GATEWAY_URL, DEFAULT_PRODUCTS_PATH, DEFAULT_SUCCESS_FIELD,
    DEFAULT_TIMEOUT_SECS,
};
use catalog_admin::form_controller::{ProductFormController, SubmitOutcome};
use catalog_admin::http_gateway::HttpGateway;
use catalog_admin::navigator::LogNavigator;
use catalog_admin::product_form::{LoadOutcome, ProductForm};
use catalog_admin::session::{default_session_path, SessionStore};
use catalog_common::gateway::ProductGateway;
use catalog_common::product::{detail_lines, ImageFile, ProductId};
use catalog_common::table::{product_columns, render_row};

#[derive(Parser)]
#[command(name = "catalog-admin", about = "Product catalog admin")]
struct Cli {
    #[command(flatten)]
    gateway: GatewayArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GatewayArgs {
    /// Base URL of the catalog API.
    #[arg(long, env = "CATALOG_GATEWAY_URL", default_value = DEFAULT_GATEWAY_URL)]
    gateway_url: String,

    /// Base URL of the login endpoint.
    #[arg(long, env = "CATALOG_AUTH_URL", default_value = DEFAULT_AUTH_URL)]
    auth_url: String,

    #[arg(long, default_value = DEFAULT_PRODUCTS_PATH)]
    products_path: String,

    /// Response field wrapping the payload. Empty for bare responses.
    #[arg(long, env = "CATALOG_ENVELOPE_KEY", default_value = DEFAULT_ENVELOPE_KEY)]
    envelope_key: String,

    /// Boolean response field that must be true. Empty to rely on HTTP status.
    #[arg(long, default_value = DEFAULT_SUCCESS_FIELD)]
    success_field: String,

    #[arg(long, value_enum, default_value_t = SubmitEncoding::Auto)]
    create_encoding: SubmitEncoding,

    #[arg(long, value_enum, default_value_t = SubmitEncoding::Json)]
    update_encoding: SubmitEncoding,

    #[arg(long, value_enum, default_value_t = UpdateMethod::Put)]
    update_method: UpdateMethod,

    /// Screen to go to after a successful save.
    #[arg(long, value_enum, default_value_t = AfterSubmit::ProductList)]
    after_submit: AfterSubmit,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Bearer token to use instead of the stored session.
    #[arg(long, env = "CATALOG_TOKEN")]
    token: Option<String>,

    /// Session file (default: <cache dir>/catalog-admin/session.json).
    #[arg(long)]
    session_file: Option<PathBuf>,
}

impl GatewayArgs {
    fn config(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.gateway_url.clone(),
            auth_url: self.auth_url.clone(),
            products_path: self.products_path.clone(),
            envelope_key: non_empty(self.envelope_key.clone()),
            success_field: non_empty(self.success_field.clone()),
            create_encoding: self.create_encoding,
            update_encoding: self.update_encoding,
            update_method: self.update_method,
            after_submit: self.after_submit,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    fn session(&self) -> Result<SessionStore> {
        if let Some(token) = &self.token {
            let store = SessionStore::in_memory();
            store.sign_in(token.clone())?;
            return Ok(store);
        }
        let path = self
            .session_file
            .clone()
            .unwrap_or_else(default_session_path);
        Ok(SessionStore::open(path)?)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print a product's detail card and listing row.
    Show { id: String },
    /// Create a product.
    Add(ProductArgs),
    /// Load a product, apply the given changes and save it.
    Edit {
        id: String,
        #[command(flatten)]
        fields: ProductArgs,
    },
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CATALOG_PASSWORD")]
        password: String,
    },
    SignOut,
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone_number: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
}

#[derive(Args)]
struct ProductArgs {
    #[arg(long)]
    name: Option<String>,
    /// Price as typed, e.g. "20000" or "19.99". Empty clears it.
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    location: Option<String>,
    /// None, Premium, Featured or Classic; empty to clear.
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    featured: Option<bool>,
    /// Description line to append. Repeatable.
    #[arg(long = "description")]
    descriptions: Vec<String>,
    /// Zero-based index of a description line to remove. Repeatable.
    #[arg(long = "remove-description")]
    remove_descriptions: Vec<usize>,
    /// Image file to upload with the product.
    #[arg(long)]
    image: Option<PathBuf>,
}

impl ProductArgs {
    fn apply(&self, form: &mut ProductForm) -> Result<()> {
        if let Some(name) = &self.name {
            form.set_name(name.clone());
        }
        if let Some(price) = &self.price {
            form.set_price_text(price)?;
        }
        if let Some(model) = &self.model {
            form.set_model(model.clone());
        }
        if let Some(location) = &self.location {
            form.set_location(location.clone());
        }
        if let Some(category) = &self.category {
            form.set_category_text(category)?;
        }
        if let Some(featured) = self.featured {
            form.set_featured(featured);
        }

        let count = form.draft().description.len();
        let mut removals = self.remove_descriptions.clone();
        removals.sort_unstable();
        removals.dedup();
        if let Some(&bad) = removals.iter().find(|&&i| i >= count) {
            bail!("no description line {bad} (the product has {count})");
        }
        // Highest first so earlier indices stay valid.
        for index in removals.into_iter().rev() {
            form.remove_description(index);
        }

        for line in &self.descriptions {
            if !form.add_description(line) {
                bail!("description lines cannot be blank");
            }
        }
        Ok(())
    }

    fn image(&self) -> Result<Option<ImageFile>> {
        let Some(path) = &self.image else {
            return Ok(None);
        };
        let bytes =
            std::fs::read(path).with_context(|| format!("reading image {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Some(ImageFile::new(file_name, content_type(path), bytes)))
    }
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn show(gateway: &HttpGateway, id: ProductId) -> Result<()> {
    let product = gateway
        .fetch_by_id(&id)
        .await
        .with_context(|| format!("loading product {id}"))?;
    for line in detail_lines(&product) {
        println!("{line}");
    }

    let columns = product_columns();
    let row = serde_json::to_value(&product)?;
    println!();
    for (column, cell) in columns.iter().zip(render_row(&columns, &row)) {
        println!("{:<10} {cell}", column.header);
    }
    Ok(())
}

async fn save(
    gateway: HttpGateway,
    after_submit: AfterSubmit,
    id: Option<ProductId>,
    fields: &ProductArgs,
) -> Result<()> {
    let controller =
        ProductFormController::new(gateway, LogNavigator).with_after_submit(after_submit);

    match controller.initialize(id).await {
        LoadOutcome::CreateMode | LoadOutcome::Hydrated | LoadOutcome::Skipped => {}
        LoadOutcome::Failed(e) => return Err(e).context("loading product"),
        LoadOutcome::Stale => bail!("product load was superseded"),
    }

    controller.edit(|form| fields.apply(form))?;
    controller.set_image(fields.image()?);

    match controller.submit().await {
        SubmitOutcome::Saved {
            receipt,
            destination,
        } => {
            let id = receipt
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("saved product {id}; next: {destination}");
            if let Some(message) = receipt.message {
                println!("{message}");
            }
            Ok(())
        }
        SubmitOutcome::Failed(e) => Err(e).context("saving product"),
        SubmitOutcome::Blocked(reason) => bail!("save refused: {reason}"),
    }
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.gateway.config();
    let session = Arc::new(cli.gateway.session()?);

    match cli.command {
        Command::Show { id } => {
            let gateway = HttpGateway::new(config)?.with_credentials(session);
            show(&gateway, ProductId::new(id)).await
        }
        Command::Add(fields) => {
            let after_submit = config.after_submit;
            let gateway = HttpGateway::new(config)?.with_credentials(session);
            save(gateway, after_submit, None, &fields).await
        }
        Command::Edit { id, fields } => {
            let after_submit = config.after_submit;
            let gateway = HttpGateway::new(config)?.with_credentials(session);
            save(gateway, after_submit, Some(ProductId::new(id)), &fields).await
        }
        Command::SignIn { email, password } => {
            let client = AuthClient::new(&config)?;
            let form = SignInForm { email, password };
            form.submit(&client, &session, &LogNavigator).await?;
            println!("signed in");
            Ok(())
        }
        Command::SignOut => {
            auth::sign_out(&session, &LogNavigator)?;
            println!("signed out");
            Ok(())
        }
        Command::Register {
            first_name,
            last_name,
            email,
            phone_number,
            password,
            confirm_password,
        } => {
            let client = AuthClient::new(&config)?;
            let form = RegisterForm {
                first_name,
                last_name,
                email,
                phone_number,
                password,
                confirm_password,
            };
            form.submit(&client, &LogNavigator).await?;
            println!("registered; sign in to continue");
            Ok(())
        }
    }
}
