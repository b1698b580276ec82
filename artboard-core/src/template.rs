//! The whole-document container: artboard, background and stacked elements.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ArtboardError, ArtboardResult, Element, ElementId};

/// Default artboard width in artboard units.
pub const DEFAULT_ARTBOARD_WIDTH: u32 = 1080;

/// Default artboard height in artboard units.
pub const DEFAULT_ARTBOARD_HEIGHT: u32 = 1080;

/// Default artboard background.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// A template: an artboard plus the elements stacked on it.
///
/// Element order is stacking order; later elements paint on top. Elements
/// are only ever replaced wholesale, so a reader never observes a
/// half-updated element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Template identifier.
    pub id: Uuid,
    /// Public identifier, present once published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Display name.
    pub name: String,
    /// Artboard width.
    pub width: u32,
    /// Artboard height.
    pub height: u32,
    /// Background color.
    pub background_color: String,
    /// Optional background image source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    /// Elements in stacking order.
    elements: Vec<Element>,
    /// Optional rendered thumbnail (data URI).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Template {
    /// Create an empty template with the given artboard size.
    #[must_use]
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug: None,
            name: name.into(),
            width: width.max(1),
            height: height.max(1),
            background_color: DEFAULT_BACKGROUND.to_string(),
            background_image: None,
            elements: Vec::new(),
            thumbnail: None,
        }
    }

    /// Append an element on top of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`ArtboardError::DuplicateElement`] if an element with the same
    /// id is already present.
    pub fn add_element(&mut self, mut element: Element) -> ArtboardResult<ElementId> {
        let id = element.id;
        if self.position(id).is_some() {
            return Err(ArtboardError::DuplicateElement(id.to_string()));
        }
        element.normalize();
        self.elements.push(element);
        Ok(id)
    }

    /// Remove an element.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not found.
    pub fn remove_element(&mut self, id: ElementId) -> ArtboardResult<Element> {
        let index = self
            .position(id)
            .ok_or_else(|| ArtboardError::ElementNotFound(id.to_string()))?;
        Ok(self.elements.remove(index))
    }

    /// Replace an element with a new version derived from a copy of the current one.
    ///
    /// The closure edits a clone; the result is normalized and swapped in
    /// whole. The element id cannot be changed this way.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not found.
    pub fn update_element<F>(&mut self, id: ElementId, f: F) -> ArtboardResult<&Element>
    where
        F: FnOnce(&mut Element),
    {
        let index = self
            .position(id)
            .ok_or_else(|| ArtboardError::ElementNotFound(id.to_string()))?;
        let mut next = self.elements[index].clone();
        f(&mut next);
        next.id = id;
        next.normalize();
        self.elements[index] = next;
        Ok(&self.elements[index])
    }

    /// Replace an element wholesale with an already-built version.
    ///
    /// # Errors
    ///
    /// Returns an error if no element with `element.id` exists.
    pub fn replace_element(&mut self, mut element: Element) -> ArtboardResult<()> {
        let index = self
            .position(element.id)
            .ok_or_else(|| ArtboardError::ElementNotFound(element.id.to_string()))?;
        element.normalize();
        self.elements[index] = element;
        Ok(())
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get_element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// All elements in stacking order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Replace the whole element list.
    ///
    /// # Errors
    ///
    /// Returns [`ArtboardError::DuplicateElement`] if two elements share an id;
    /// the template is left untouched in that case.
    pub fn set_elements(&mut self, elements: Vec<Element>) -> ArtboardResult<()> {
        let mut seen = std::collections::HashSet::with_capacity(elements.len());
        for element in &elements {
            if !seen.insert(element.id) {
                return Err(ArtboardError::DuplicateElement(element.id.to_string()));
            }
        }
        self.elements = elements
            .into_iter()
            .map(|mut e| {
                e.normalize();
                e
            })
            .collect();
        Ok(())
    }

    /// Find the topmost element under the given artboard coordinates.
    #[must_use]
    pub fn element_at(&self, x: f32, y: f32) -> Option<ElementId> {
        self.elements
            .iter()
            .rev()
            .find(|e| e.contains_point(x, y))
            .map(|e| e.id)
    }

    /// Artboard center in artboard coordinates.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Get the number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Check if the template has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn position(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::new("Untitled", DEFAULT_ARTBOARD_WIDTH, DEFAULT_ARTBOARD_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementKind, Shape};

    #[test]
    fn test_template_add_remove() {
        let mut template = Template::default();
        assert!(template.is_empty());

        let id = template
            .add_element(Element::with_kind(ElementKind::Circle))
            .expect("should add");
        assert_eq!(template.element_count(), 1);
        assert!(template.get_element(id).is_some());

        template.remove_element(id).expect("should remove");
        assert!(template.is_empty());
        assert!(matches!(
            template.remove_element(id),
            Err(ArtboardError::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut template = Template::default();
        let element = Element::with_kind(ElementKind::Rect);
        template.add_element(element.clone()).expect("first add");
        assert!(matches!(
            template.add_element(element.clone()),
            Err(ArtboardError::DuplicateElement(_))
        ));

        let before = template.clone();
        let result = template.set_elements(vec![element.clone(), element]);
        assert!(result.is_err());
        assert_eq!(template, before);
    }

    #[test]
    fn test_update_replaces_and_normalizes() {
        let mut template = Template::default();
        let id = template
            .add_element(Element::with_kind(ElementKind::Rect))
            .expect("add");

        let updated = template
            .update_element(id, |el| {
                el.shape = Shape::Rect {
                    width: 1.0,
                    height: 300.0,
                    corner_radius: 90.0,
                };
                el.id = ElementId::new();
            })
            .expect("update");

        assert_eq!(updated.id, id);
        assert_eq!(
            updated.shape,
            Shape::Rect {
                width: 20.0,
                height: 300.0,
                corner_radius: 10.0
            }
        );
    }

    #[test]
    fn test_element_at_prefers_topmost() {
        let mut template = Template::default();
        let bottom = template
            .add_element(Element::with_kind(ElementKind::Rect).with_position(100.0, 100.0))
            .expect("add");
        let top = template
            .add_element(Element::with_kind(ElementKind::Circle).with_position(120.0, 120.0))
            .expect("add");

        assert_eq!(template.element_at(110.0, 110.0), Some(top));
        assert_eq!(template.element_at(10.0, 10.0), Some(bottom));
        assert_eq!(template.element_at(900.0, 900.0), None);
    }
}
