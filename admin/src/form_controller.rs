//! Async driver of the product form.
//!
//! Wraps a [`ProductForm`] with the gateway it loads from and saves to and
//! the navigator it hands the user to after a save. The form lock is only
//! ever held between awaits, so overlapping `initialize` calls resolve by
//! generation rather than by arrival order.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use catalog_common::gateway::{GatewayError, ProductGateway, SubmitReceipt};
use catalog_common::product::{ImageFile, Product, ProductId};

use crate::config::AfterSubmit;
use crate::navigator::{Navigator, Route};
use crate::product_form::{FormPhase, LoadOutcome, LoadStart, ProductForm, SubmitBlocked};

/// Result of `submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Saved; the form was reset and the navigator sent to `destination`.
    Saved {
        receipt: SubmitReceipt,
        destination: Route,
    },
    /// The gateway call failed; the draft is intact.
    Failed(GatewayError),
    /// Refused before any request was made.
    Blocked(SubmitBlocked),
}

pub struct ProductFormController<G, N> {
    form: Mutex<ProductForm>,
    gateway: G,
    navigator: N,
    after_submit: AfterSubmit,
}

impl<G: ProductGateway, N: Navigator> ProductFormController<G, N> {
    pub fn new(gateway: G, navigator: N) -> Self {
        Self {
            form: Mutex::new(ProductForm::new()),
            gateway,
            navigator,
            after_submit: AfterSubmit::default(),
        }
    }

    pub fn with_after_submit(mut self, after_submit: AfterSubmit) -> Self {
        self.after_submit = after_submit;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    fn form(&self) -> MutexGuard<'_, ProductForm> {
        self.form.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current draft.
    pub fn draft(&self) -> Product {
        self.form().draft().clone()
    }

    pub fn phase(&self) -> FormPhase {
        self.form().phase()
    }

    /// Run a batch of field edits against the form.
    pub fn edit<R>(&self, f: impl FnOnce(&mut ProductForm) -> R) -> R {
        f(&mut self.form())
    }

    pub fn add_description(&self, line: &str) -> bool {
        self.form().add_description(line)
    }

    /// # Panics
    /// If `index` is out of range.
    pub fn remove_description(&self, index: usize) -> String {
        self.form().remove_description(index)
    }

    pub fn set_image(&self, image: Option<ImageFile>) {
        self.form().set_image(image)
    }

    /// Point the form at `id` (edit mode) or at a blank product (create mode).
    ///
    /// Fetches at most once per distinct id. A response that arrives after
    /// a newer `initialize` is dropped.
    pub async fn initialize(&self, id: Option<ProductId>) -> LoadOutcome {
        let start = self.form().begin_load(id);
        let ticket = match start {
            LoadStart::Done(outcome) => return outcome,
            LoadStart::Fetch(ticket) => ticket,
        };

        debug!(id = %ticket.id(), gateway = self.gateway.gateway_name(), "loading product");
        let result = self.gateway.fetch_by_id(ticket.id()).await;
        let id = ticket.id().clone();

        let outcome = self.form().finish_load(ticket, result);
        match &outcome {
            LoadOutcome::Hydrated => debug!(%id, "product loaded"),
            LoadOutcome::Stale => warn!(%id, "discarding response for superseded product"),
            LoadOutcome::Failed(e) => error!(%id, error = %e, "failed to load product"),
            LoadOutcome::CreateMode | LoadOutcome::Skipped => {}
        }
        outcome
    }

    /// Save the draft: create when new, update when editing.
    ///
    /// On success the form is reset and the navigator is sent on exactly
    /// once. On failure the draft is kept and the navigator is not touched.
    pub async fn submit(&self) -> SubmitOutcome {
        let begun = self.form().begin_submit();
        let ticket = match begun {
            Ok(ticket) => ticket,
            Err(blocked) => {
                warn!(reason = %blocked, "submit refused");
                return SubmitOutcome::Blocked(blocked);
            }
        };

        let result = match ticket.target() {
            Some(id) => {
                debug!(%id, "updating product");
                self.gateway.update(id, ticket.submission()).await
            }
            None => {
                debug!("creating product");
                self.gateway.create(ticket.submission()).await
            }
        };

        self.form().finish_submit(&ticket, &result);

        match result {
            Ok(receipt) => {
                let destination = self.destination(&receipt, ticket.target());
                info!(
                    name = %ticket.submission().product.name,
                    %destination,
                    "product saved"
                );
                self.navigator.go_to(destination.clone());
                SubmitOutcome::Saved {
                    receipt,
                    destination,
                }
            }
            Err(e) => {
                error!(error = %e, "failed to save product");
                SubmitOutcome::Failed(e)
            }
        }
    }

    /// Discard the draft. Anything still in flight no longer touches it.
    pub fn teardown(&self) {
        self.form().reset();
    }

    fn destination(&self, receipt: &SubmitReceipt, target: Option<&ProductId>) -> Route {
        match self.after_submit {
            AfterSubmit::ProductList => Route::ProductList,
            AfterSubmit::ProductDetail => match receipt.id.as_ref().or(target) {
                Some(id) => Route::ProductDetail { id: id.clone() },
                None => Route::ProductList,
            },
        }
    }
}
