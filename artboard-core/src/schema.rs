//! Canonical serialized representations of a template.
//!
//! [`TemplateSnapshot`] is the storage-safe export/import format used for
//! template files. [`TemplateRecord`] is the persisted row shape exchanged
//! with the template store.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ArtboardError, ArtboardResult, Element, Template};

/// Length of a generated slug.
pub const SLUG_LEN: usize = 8;

/// Slug alphabet: lowercase letters and digits without `0`, `1`, `i`, `l` or `o`.
pub const SLUG_ALPHABET: &[u8] = b"23456789abcdefghjkmnpqrstuvwxyz";

/// Export/import snapshot of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSnapshot {
    /// Display name.
    pub name: String,
    /// Artboard width.
    pub width: u32,
    /// Artboard height.
    pub height: u32,
    /// Elements in stacking order.
    pub elements: Vec<Element>,
    /// Background color.
    pub background_color: String,
    /// Optional background image.
    #[serde(default)]
    pub background_image: Option<String>,
}

impl From<&Template> for TemplateSnapshot {
    fn from(template: &Template) -> Self {
        Self {
            name: template.name.clone(),
            width: template.width,
            height: template.height,
            elements: template.elements().to_vec(),
            background_color: template.background_color.clone(),
            background_image: template.background_image.clone(),
        }
    }
}

impl TemplateSnapshot {
    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ArtboardResult<String> {
        serde_json::to_string_pretty(self).map_err(ArtboardError::Serialization)
    }

    /// Parse and validate a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ArtboardError::MalformedImport`] if the JSON does not describe
    /// a valid template (unknown element variants included).
    pub fn from_json(json: &str) -> ArtboardResult<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| ArtboardError::MalformedImport(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check structural validity without touching any document.
    ///
    /// # Errors
    ///
    /// Returns [`ArtboardError::MalformedImport`] on a zero-sized artboard or
    /// duplicate element ids.
    pub fn validate(&self) -> ArtboardResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ArtboardError::MalformedImport(format!(
                "artboard must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        let mut seen = HashSet::with_capacity(self.elements.len());
        for element in &self.elements {
            if !seen.insert(element.id) {
                return Err(ArtboardError::MalformedImport(format!(
                    "duplicate element id {}",
                    element.id
                )));
            }
        }
        Ok(())
    }

    /// Apply this snapshot to a template, replacing name, artboard,
    /// background and elements together.
    ///
    /// # Errors
    ///
    /// Returns [`ArtboardError::MalformedImport`] if validation fails; the
    /// template is untouched in that case.
    pub fn apply_to(self, template: &mut Template) -> ArtboardResult<()> {
        self.validate()?;
        let mut next = template.clone();
        next.name = self.name;
        next.width = self.width;
        next.height = self.height;
        next.background_color = self.background_color;
        next.background_image = self.background_image;
        next.set_elements(self.elements)
            .map_err(|e| ArtboardError::MalformedImport(e.to_string()))?;
        *template = next;
        Ok(())
    }

    /// Build a fresh template from this snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ArtboardError::MalformedImport`] if validation fails.
    pub fn into_template(self) -> ArtboardResult<Template> {
        let mut template = Template::new(self.name.clone(), self.width, self.height);
        self.apply_to(&mut template)?;
        Ok(template)
    }

    /// Drop editor-only placeholder preview images.
    ///
    /// Published templates are filled by the generator's own photo, so the
    /// preview bitmap and its manual zoom/offset are not carried along.
    #[must_use]
    pub fn without_preview_images(mut self) -> Self {
        for element in &mut self.elements {
            element.placeholder_image = None;
            element.image_offset = crate::ImageOffset::default();
            element.image_scale = 1.0;
        }
        self
    }
}

/// Persisted template row, keyed uniquely by `slug`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    /// Template identifier.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Public identifier.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Element list as raw JSON.
    pub elements: serde_json::Value,
    /// Background color.
    pub background_color: String,
    /// Optional background image.
    pub background_image: Option<String>,
    /// Artboard width.
    pub canvas_width: u32,
    /// Artboard height.
    pub canvas_height: u32,
    /// Optional thumbnail (data URI).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Creation time, Unix milliseconds.
    pub created_at: u64,
    /// Last update time, Unix milliseconds.
    pub updated_at: u64,
}

impl TemplateRecord {
    /// Build a record for a freshly published snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the elements cannot be encoded as JSON.
    pub fn from_snapshot(
        id: Uuid,
        slug: impl Into<String>,
        snapshot: &TemplateSnapshot,
        timestamp: u64,
    ) -> ArtboardResult<Self> {
        Ok(Self {
            id,
            slug: slug.into(),
            name: snapshot.name.clone(),
            elements: serde_json::to_value(&snapshot.elements)?,
            background_color: snapshot.background_color.clone(),
            background_image: snapshot.background_image.clone(),
            canvas_width: snapshot.width,
            canvas_height: snapshot.height,
            thumbnail: None,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Decode the record back into a validated snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ArtboardError::MalformedImport`] if the stored elements are
    /// not a valid element list.
    pub fn to_snapshot(&self) -> ArtboardResult<TemplateSnapshot> {
        let elements: Vec<Element> = serde_json::from_value(self.elements.clone())
            .map_err(|e| ArtboardError::MalformedImport(e.to_string()))?;
        let snapshot = TemplateSnapshot {
            name: self.name.clone(),
            width: self.canvas_width,
            height: self.canvas_height,
            elements,
            background_color: self.background_color.clone(),
            background_image: self.background_image.clone(),
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Materialize the record as a template carrying its id, slug and thumbnail.
    ///
    /// # Errors
    ///
    /// Returns [`ArtboardError::MalformedImport`] if the record is malformed.
    pub fn to_template(&self) -> ArtboardResult<Template> {
        let mut template = self.to_snapshot()?.into_template()?;
        template.id = self.id;
        template.slug = Some(self.slug.clone());
        template.thumbnail.clone_from(&self.thumbnail);
        Ok(template)
    }
}

/// Generate a random URL-safe slug of [`SLUG_LEN`] characters from [`SLUG_ALPHABET`].
#[must_use]
pub fn generate_slug() -> String {
    let random = Uuid::new_v4();
    random
        .as_bytes()
        .iter()
        .take(SLUG_LEN)
        .map(|b| char::from(SLUG_ALPHABET[usize::from(*b) % SLUG_ALPHABET.len()]))
        .collect()
}

/// Check whether a string has the shape of a generated slug.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    slug.len() == SLUG_LEN && slug.bytes().all(|b| SLUG_ALPHABET.contains(&b))
}
