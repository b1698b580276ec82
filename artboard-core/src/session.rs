//! Editor session: the explicitly owned document plus its interaction state.
//!
//! Every element moves through `idle -> selected -> transforming -> idle`.
//! Only one element can be selected or transformed at a time; selecting or
//! transforming another element detaches the previous one.

use serde::{Deserialize, Serialize};

use crate::schema::TemplateSnapshot;
use crate::store::{PublishReceipt, StoreError, TemplateStore};
use crate::transform::{constrain_bounds, reconcile, scale_between, BoundingBox, LiveTransform};
use crate::{ArtboardError, ArtboardResult, Element, ElementId, ElementKind, Template};

/// Interaction state of a single element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    /// Not selected.
    Idle,
    /// Selected, with handles attached.
    Selected,
    /// A handle drag is in progress.
    Transforming,
}

/// Interaction state of the whole session.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    /// Nothing selected.
    Idle,
    /// One element selected.
    Selected(ElementId),
    /// One element being resized, rotated or dragged.
    Transforming {
        /// Element under the gesture.
        id: ElementId,
        /// Bounding box when the gesture started.
        origin: BoundingBox,
        /// Last accepted bounding box.
        current: BoundingBox,
    },
}

/// Why a publish did not happen.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The template was rejected before reaching the store.
    #[error(transparent)]
    Rejected(#[from] ArtboardError),
    /// The store call failed; local state is unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An editing session over one template.
#[derive(Debug, Clone)]
pub struct EditorSession {
    template: Template,
    interaction: Interaction,
}

impl EditorSession {
    /// Start a session over an existing template.
    #[must_use]
    pub fn new(template: Template) -> Self {
        Self {
            template,
            interaction: Interaction::Idle,
        }
    }

    /// The document being edited.
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Current interaction state.
    #[must_use]
    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// The selected (or transforming) element, if any.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        match self.interaction {
            Interaction::Idle => None,
            Interaction::Selected(id) | Interaction::Transforming { id, .. } => Some(id),
        }
    }

    /// Interaction state of one element.
    #[must_use]
    pub fn element_state(&self, id: ElementId) -> ElementState {
        match self.interaction {
            Interaction::Selected(sel) if sel == id => ElementState::Selected,
            Interaction::Transforming { id: sel, .. } if sel == id => ElementState::Transforming,
            _ => ElementState::Idle,
        }
    }

    // -----------------------------------------------------------------------
    // Element CRUD
    // -----------------------------------------------------------------------

    /// Create an element of `kind` with default geometry at the artboard
    /// center and select it.
    ///
    /// # Errors
    ///
    /// Currently infallible but returns `Result` for API consistency.
    pub fn add_element(&mut self, kind: ElementKind) -> ArtboardResult<ElementId> {
        let (cx, cy) = self.template.center();
        self.insert_element(Element::with_kind(kind).with_position(cx, cy))
    }

    /// Insert a prepared element on top of the stack and select it.
    ///
    /// # Errors
    ///
    /// Returns [`ArtboardError::DuplicateElement`] if the id is already used.
    pub fn insert_element(&mut self, element: Element) -> ArtboardResult<ElementId> {
        let id = self.template.add_element(element)?;
        tracing::debug!("Added element {id}");
        self.interaction = Interaction::Selected(id);
        Ok(id)
    }

    /// Edit an element's attributes directly (property panel edits).
    ///
    /// The edit is applied to a copy and swapped in whole.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not found.
    pub fn update_element<F>(&mut self, id: ElementId, f: F) -> ArtboardResult<&Element>
    where
        F: FnOnce(&mut Element),
    {
        self.template.update_element(id, f)
    }

    /// Move an element's center (plain drag), rounding to whole units.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not found.
    pub fn move_element(&mut self, id: ElementId, x: f32, y: f32) -> ArtboardResult<&Element> {
        self.template.update_element(id, |el| {
            if x.is_finite() && y.is_finite() {
                el.x = x.round();
                el.y = y.round();
            }
        })
    }

    /// Delete an element, clearing any selection that references it.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not found.
    pub fn delete_element(&mut self, id: ElementId) -> ArtboardResult<Element> {
        let removed = self.template.remove_element(id)?;
        if self.selected() == Some(id) {
            self.interaction = Interaction::Idle;
        }
        tracing::debug!("Deleted element {id}");
        Ok(removed)
    }

    /// Rename the template.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.template.name = name.into();
    }

    /// Set the artboard background color.
    pub fn set_background_color(&mut self, color: impl Into<String>) {
        self.template.background_color = color.into();
    }

    /// Set or clear the artboard background image.
    pub fn set_background_image(&mut self, src: Option<String>) {
        self.template.background_image = src;
    }

    // -----------------------------------------------------------------------
    // Selection and gestures
    // -----------------------------------------------------------------------

    /// Select an element, detaching handles from any previous selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not found.
    pub fn select(&mut self, id: ElementId) -> ArtboardResult<()> {
        if self.template.get_element(id).is_none() {
            return Err(ArtboardError::ElementNotFound(id.to_string()));
        }
        self.interaction = Interaction::Selected(id);
        Ok(())
    }

    /// Handle a click on the artboard: select the topmost element under the
    /// pointer, or return to idle when the click hits empty canvas.
    pub fn click_at(&mut self, x: f32, y: f32) -> Option<ElementId> {
        match self.template.element_at(x, y) {
            Some(id) => {
                self.interaction = Interaction::Selected(id);
                Some(id)
            }
            None => {
                self.clear_selection();
                None
            }
        }
    }

    /// Return every element to idle (empty-canvas click or cancel key).
    ///
    /// An in-progress gesture is abandoned without touching the model.
    pub fn clear_selection(&mut self) {
        if let Interaction::Transforming { id, .. } = self.interaction {
            tracing::debug!("Abandoned transform of {id}");
        }
        self.interaction = Interaction::Idle;
    }

    /// Start a handle drag on an element.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not found.
    pub fn begin_transform(&mut self, id: ElementId) -> ArtboardResult<BoundingBox> {
        let element = self
            .template
            .get_element(id)
            .ok_or_else(|| ArtboardError::ElementNotFound(id.to_string()))?;
        if let Interaction::Transforming { id: previous, .. } = self.interaction {
            if previous != id {
                tracing::debug!("Detaching transform of {previous} for {id}");
            }
        }
        let origin = BoundingBox::of(element);
        self.interaction = Interaction::Transforming {
            id,
            origin,
            current: origin,
        };
        Ok(origin)
    }

    /// Offer a new bounding box from the handles mid-gesture.
    ///
    /// Returns the accepted box, which is the previous one when the proposal
    /// is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ArtboardError::InvalidOperation`] when no gesture is active.
    pub fn propose_bounds(&mut self, proposed: BoundingBox) -> ArtboardResult<BoundingBox> {
        let Interaction::Transforming { id, current, .. } = &mut self.interaction else {
            return Err(ArtboardError::InvalidOperation(
                "no transform in progress".to_string(),
            ));
        };
        let kind = self
            .template
            .get_element(*id)
            .map(Element::kind)
            .ok_or_else(|| ArtboardError::ElementNotFound(id.to_string()))?;
        *current = constrain_bounds(kind, *current, proposed);
        Ok(*current)
    }

    /// The live transform implied by the last accepted bounding box.
    #[must_use]
    pub fn live_transform(&self) -> Option<LiveTransform> {
        let Interaction::Transforming {
            origin, current, ..
        } = &self.interaction
        else {
            return None;
        };
        let (scale_x, scale_y) = scale_between(origin, current);
        Some(LiveTransform {
            x: current.x + current.width / 2.0,
            y: current.y + current.height / 2.0,
            rotation: current.rotation,
            scale_x,
            scale_y,
        })
    }

    /// Finish the gesture: reconcile the reported live transform into the
    /// element and return to `selected`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtboardError::InvalidOperation`] when no gesture is active.
    pub fn end_transform(&mut self, live: &LiveTransform) -> ArtboardResult<LiveTransform> {
        let Interaction::Transforming { id, .. } = self.interaction else {
            return Err(ArtboardError::InvalidOperation(
                "no transform in progress".to_string(),
            ));
        };
        let element = self
            .template
            .get_element(id)
            .ok_or_else(|| ArtboardError::ElementNotFound(id.to_string()))?;
        let reconciled = reconcile(element, live);
        self.template.replace_element(reconciled.element)?;
        self.interaction = Interaction::Selected(id);
        Ok(reconciled.live)
    }

    // -----------------------------------------------------------------------
    // Export / import / publish
    // -----------------------------------------------------------------------

    /// Snapshot the template for export, clearing selection UI first.
    #[must_use]
    pub fn export_snapshot(&mut self) -> TemplateSnapshot {
        self.clear_selection();
        TemplateSnapshot::from(&self.template)
    }

    /// Replace the document with an imported snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ArtboardError::MalformedImport`] if the snapshot is invalid;
    /// the document and selection are untouched in that case.
    pub fn import_snapshot(&mut self, snapshot: TemplateSnapshot) -> ArtboardResult<()> {
        snapshot.apply_to(&mut self.template)?;
        self.interaction = Interaction::Idle;
        tracing::debug!(
            "Imported template with {} elements",
            self.template.element_count()
        );
        Ok(())
    }

    /// Parse and import a template file.
    ///
    /// # Errors
    ///
    /// Returns [`ArtboardError::MalformedImport`] on unparseable input.
    pub fn import_json(&mut self, json: &str) -> ArtboardResult<()> {
        let snapshot = TemplateSnapshot::from_json(json)?;
        self.import_snapshot(snapshot)
    }

    /// Build the snapshot that would be published.
    ///
    /// # Errors
    ///
    /// Returns [`ArtboardError::EmptyTemplate`] when the artboard has no
    /// elements.
    pub fn prepare_publish(&mut self) -> ArtboardResult<TemplateSnapshot> {
        if self.template.is_empty() {
            return Err(ArtboardError::EmptyTemplate);
        }
        Ok(self.export_snapshot().without_preview_images())
    }

    /// Publish the template through `store`, recording the assigned slug.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Rejected`] for an empty template (the store is
    /// never called) and [`PublishError::Store`] when the store call fails.
    pub async fn publish<S>(&mut self, store: &S) -> Result<PublishReceipt, PublishError>
    where
        S: TemplateStore + ?Sized,
    {
        let snapshot = self.prepare_publish()?;
        let receipt = store.publish(snapshot).await?;
        self.template.slug = Some(receipt.slug.clone());
        Ok(receipt)
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(Template::default())
    }
}
