//! Draft state of the product add/edit form.
//!
//! Pure state machine, no I/O. The async side (fetching, submitting,
//! navigating) lives in `form_controller`, which drives this type through
//! the `begin_*` / `finish_*` pairs.

use catalog_common::gateway::{GatewayError, ProductSubmission, SubmitReceipt};
use catalog_common::product::{ImageFile, Product, ProductCategory, ProductId, UnknownCategory};

/// Lifecycle of one draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    /// Nothing loaded yet, or just reset after a save.
    Empty,
    /// Waiting for the product being edited.
    Loading,
    /// Editable.
    Ready,
    /// A create/update is in flight.
    Submitting,
}

/// Invalid text typed into a form field. The draft is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("price must be a non-negative number, got '{0}'")]
    InvalidPrice(String),
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
}

/// Why a submit was refused before reaching the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitBlocked {
    #[error("the product is still loading")]
    StillLoading,
    /// Edit mode, but the product being edited was never loaded.
    #[error("the product being edited has not been loaded")]
    NotHydrated,
    #[error("a save is already in progress")]
    InProgress,
}

/// Result of `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No id: the draft was reset for a new product.
    CreateMode,
    /// The id is already the one being edited; nothing was fetched.
    Skipped,
    /// The draft now mirrors the fetched product.
    Hydrated,
    /// A newer `initialize` superseded this one; the response was dropped.
    Stale,
    /// The fetch failed; the draft kept its previous values.
    Failed(GatewayError),
}

/// What the caller must do after `begin_load`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStart {
    Fetch(LoadTicket),
    Done(LoadOutcome),
}

/// Tags an in-flight fetch with the generation it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    id: ProductId,
}

impl LoadTicket {
    pub fn id(&self) -> &ProductId {
        &self.id
    }
}

/// Snapshot taken when a submit starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTicket {
    generation: u64,
    target: Option<ProductId>,
    submission: ProductSubmission,
}

impl SubmitTicket {
    /// `None` means create, `Some` means update that product.
    pub fn target(&self) -> Option<&ProductId> {
        self.target.as_ref()
    }

    pub fn submission(&self) -> &ProductSubmission {
        &self.submission
    }
}

/// Coerce typed price text. Blank text clears the price.
pub fn parse_price(text: &str) -> Result<Option<f64>, FieldError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(p) if p.is_finite() && p >= 0.0 => Ok(Some(p)),
        _ => Err(FieldError::InvalidPrice(text.to_string())),
    }
}

#[derive(Debug, Clone)]
pub struct ProductForm {
    draft: Product,
    description_input: String,
    pending_image: Option<ImageFile>,
    phase: FormPhase,
    /// Bumped whenever in-flight responses must stop applying to the draft.
    generation: u64,
    /// Product being edited; `None` in create mode.
    current_id: Option<ProductId>,
    /// Whether `current_id` was fetched successfully into the draft.
    hydrated: bool,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductForm {
    pub fn new() -> Self {
        Self {
            draft: Product::default(),
            description_input: String::new(),
            pending_image: None,
            phase: FormPhase::Empty,
            generation: 0,
            current_id: None,
            hydrated: false,
        }
    }

    pub fn draft(&self) -> &Product {
        &self.draft
    }

    pub fn description_input(&self) -> &str {
        &self.description_input
    }

    pub fn pending_image(&self) -> Option<&ImageFile> {
        self.pending_image.as_ref()
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn current_id(&self) -> Option<&ProductId> {
        self.current_id.as_ref()
    }

    pub fn is_edit_mode(&self) -> bool {
        self.current_id.is_some()
    }

    // ─── Field edits ────────────────────────────────────────────────────────

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    pub fn set_price(&mut self, price: Option<f64>) {
        self.draft.price = price;
    }

    pub fn set_price_text(&mut self, text: &str) -> Result<(), FieldError> {
        self.draft.price = parse_price(text)?;
        Ok(())
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.draft.model = model.into();
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.draft.location = location.into();
    }

    pub fn set_category(&mut self, category: Option<ProductCategory>) {
        self.draft.category = category;
    }

    /// Set the category from the choice control's value; blank unsets it.
    pub fn set_category_text(&mut self, text: &str) -> Result<(), FieldError> {
        self.draft.category = if text.is_empty() {
            None
        } else {
            Some(text.parse()?)
        };
        Ok(())
    }

    pub fn set_featured(&mut self, featured: bool) {
        self.draft.is_featured = featured;
    }

    pub fn set_description_input(&mut self, text: impl Into<String>) {
        self.description_input = text.into();
    }

    /// Append a description line. Blank lines are ignored.
    ///
    /// Emptiness is judged on the trimmed text, but the line is stored as
    /// typed. Returns whether the list grew.
    pub fn add_description(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return false;
        }
        self.draft.description.push(line.to_string());
        self.description_input.clear();
        true
    }

    /// Append whatever is in the description input box.
    pub fn add_pending_description(&mut self) -> bool {
        let line = std::mem::take(&mut self.description_input);
        let added = self.add_description(&line);
        if !added {
            self.description_input = line;
        }
        added
    }

    /// Remove the description line at `index`.
    ///
    /// # Panics
    /// If `index` is out of range; the form never offers such an index.
    pub fn remove_description(&mut self, index: usize) -> String {
        let len = self.draft.description.len();
        assert!(
            index < len,
            "description index {index} out of range for {len} lines"
        );
        self.draft.description.remove(index)
    }

    pub fn set_image(&mut self, image: Option<ImageFile>) {
        self.pending_image = image;
    }

    // ─── Loading ────────────────────────────────────────────────────────────

    /// Switch the form to `id` (edit) or to a fresh draft (`None`, create).
    pub fn begin_load(&mut self, id: Option<ProductId>) -> LoadStart {
        match id {
            None => {
                self.generation += 1;
                self.current_id = None;
                self.hydrated = false;
                self.clear_draft();
                self.phase = FormPhase::Ready;
                LoadStart::Done(LoadOutcome::CreateMode)
            }
            Some(id) if self.current_id.as_ref() == Some(&id) => {
                LoadStart::Done(LoadOutcome::Skipped)
            }
            Some(id) => {
                self.generation += 1;
                self.current_id = Some(id.clone());
                self.hydrated = false;
                self.draft.id = Some(id.clone());
                self.phase = FormPhase::Loading;
                LoadStart::Fetch(LoadTicket {
                    generation: self.generation,
                    id,
                })
            }
        }
    }

    /// Apply a fetch result, unless a newer load or a reset superseded it.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Product, GatewayError>,
    ) -> LoadOutcome {
        if ticket.generation != self.generation {
            return LoadOutcome::Stale;
        }
        self.phase = FormPhase::Ready;
        match result {
            Ok(product) => {
                self.draft = Product {
                    id: Some(ticket.id),
                    ..product
                };
                self.hydrated = true;
                LoadOutcome::Hydrated
            }
            Err(e) => LoadOutcome::Failed(e),
        }
    }

    // ─── Submitting ─────────────────────────────────────────────────────────

    pub fn begin_submit(&mut self) -> Result<SubmitTicket, SubmitBlocked> {
        match self.phase {
            FormPhase::Loading => return Err(SubmitBlocked::StillLoading),
            FormPhase::Submitting => return Err(SubmitBlocked::InProgress),
            FormPhase::Empty | FormPhase::Ready => {}
        }
        if self.current_id.is_some() && !self.hydrated {
            return Err(SubmitBlocked::NotHydrated);
        }
        self.phase = FormPhase::Submitting;
        Ok(SubmitTicket {
            generation: self.generation,
            target: self.current_id.clone(),
            submission: ProductSubmission::new(self.draft.clone(), self.pending_image.clone()),
        })
    }

    /// Settle a submit. Success resets the whole form; failure keeps the
    /// draft for a retry. A form that was re-initialized or torn down
    /// while the request was in flight is left alone.
    pub fn finish_submit(
        &mut self,
        ticket: &SubmitTicket,
        result: &Result<SubmitReceipt, GatewayError>,
    ) {
        if ticket.generation != self.generation {
            return;
        }
        match result {
            Ok(_) => self.reset(),
            Err(_) => self.phase = FormPhase::Ready,
        }
    }

    /// Discard the draft and drop whatever is still in flight.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.current_id = None;
        self.hydrated = false;
        self.clear_draft();
        self.phase = FormPhase::Empty;
    }

    fn clear_draft(&mut self) {
        self.draft = Product::default();
        self.description_input.clear();
        self.pending_image = None;
    }
}
