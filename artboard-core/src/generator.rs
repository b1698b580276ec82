//! Generator mode: the read-mostly replay of a published template.
//!
//! A generator view never exposes gestures. The only edits it accepts are
//! the user-supplied photo and replacement text content.

use crate::store::{StoreError, TemplateStore};
use crate::{ArtboardError, ArtboardResult, Element, ElementId, Shape, Template};

/// Result of loading a template by slug.
#[derive(Debug, Clone)]
pub enum GeneratorLoad {
    /// The template was found and is ready to be filled.
    Ready(GeneratorView),
    /// No usable template exists under the slug. Terminal: there is no retry.
    NotFound {
        /// The slug that was requested.
        slug: String,
    },
}

/// Fetch a published template and open it in generator mode.
///
/// Missing and malformed records both resolve to [`GeneratorLoad::NotFound`].
///
/// # Errors
///
/// Returns the store error for transport failures so the caller can offer a
/// manual retry.
pub async fn load_generator<S>(store: &S, slug: &str) -> Result<GeneratorLoad, StoreError>
where
    S: TemplateStore + ?Sized,
{
    let record = match store.fetch_by_slug(slug).await {
        Ok(record) => record,
        Err(StoreError::NotFound(_)) => {
            tracing::info!("No template published as {slug}");
            return Ok(GeneratorLoad::NotFound {
                slug: slug.to_string(),
            });
        }
        Err(e) => return Err(e),
    };
    match record.to_template() {
        Ok(template) => {
            tracing::info!(
                "Loaded template {slug} with {} elements",
                template.element_count()
            );
            Ok(GeneratorLoad::Ready(GeneratorView::new(template)))
        }
        Err(e) => {
            tracing::warn!("Template {slug} is malformed: {e}");
            Ok(GeneratorLoad::NotFound {
                slug: slug.to_string(),
            })
        }
    }
}

/// A published template opened for generation.
#[derive(Debug, Clone)]
pub struct GeneratorView {
    template: Template,
    photo: Option<String>,
    photo_decoded: bool,
}

impl GeneratorView {
    /// Open a template in generator mode.
    #[must_use]
    pub fn new(template: Template) -> Self {
        Self {
            template,
            photo: None,
            photo_decoded: false,
        }
    }

    /// The template being generated from.
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Elements in stacking order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        self.template.elements()
    }

    /// The user-supplied photo, if any.
    #[must_use]
    pub fn photo(&self) -> Option<&str> {
        self.photo.as_deref()
    }

    /// Supply or clear the photo that fills every placeholder.
    ///
    /// The photo counts as missing until its decode is reported through
    /// [`GeneratorView::set_photo_decoded`].
    pub fn set_photo(&mut self, src: Option<String>) {
        self.photo = src;
        self.photo_decoded = false;
    }

    /// Record whether the current photo decoded. A failed decode leaves the
    /// view exactly as if no photo was supplied.
    pub fn set_photo_decoded(&mut self, decoded: bool) {
        self.photo_decoded = decoded && self.photo.is_some();
    }

    /// Ids of the elements filled by the photo.
    #[must_use]
    pub fn photo_slots(&self) -> Vec<ElementId> {
        self.elements()
            .iter()
            .filter(|e| e.is_photo_slot())
            .map(|e| e.id)
            .collect()
    }

    /// Replace the content of a text element.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is missing or is not text.
    pub fn set_text(&mut self, id: ElementId, content: impl Into<String>) -> ArtboardResult<()> {
        let is_text = self
            .template
            .get_element(id)
            .ok_or_else(|| ArtboardError::ElementNotFound(id.to_string()))?
            .kind()
            == crate::ElementKind::Text;
        if !is_text {
            return Err(ArtboardError::InvalidOperation(format!(
                "element {id} is not text"
            )));
        }
        let content = content.into();
        self.template.update_element(id, move |el| {
            if let Shape::Text { text, .. } = &mut el.shape {
                *text = content;
            }
        })?;
        Ok(())
    }

    /// Whether the download action may be offered.
    ///
    /// A template with photo placeholders requires a decoded photo first.
    #[must_use]
    pub fn can_download(&self) -> bool {
        self.photo_decoded || self.photo_slots().is_empty()
    }
}
