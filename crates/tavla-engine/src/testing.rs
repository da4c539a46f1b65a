//! In-memory port doubles for the unit tests.

// Imports
use crate::element::{Element, ElementId, TextAlign};
use crate::ports::{
    CollabPort, ElementPatch, StoreError, StorePort, TextMetricsPort, TileMetricsPort,
};
use std::collections::HashSet;

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    pub elements: Vec<Element>,
    pub remotely_selected: HashSet<ElementId>,
    pub transform_count: usize,
    /// When set, every write is rejected.
    pub reject_writes: bool,
}

impl MemoryStore {
    pub fn with_elements(elements: Vec<Element>) -> Self {
        Self {
            elements,
            ..Default::default()
        }
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }
}

impl StorePort for MemoryStore {
    fn elements(&self) -> Vec<Element> {
        self.elements.clone()
    }

    fn remotely_selected_ids(&self) -> HashSet<ElementId> {
        self.remotely_selected.clone()
    }

    fn add(&mut self, element: Element) -> Result<(), StoreError> {
        if self.reject_writes {
            return Err(StoreError::Rejected("writes disabled".into()));
        }
        self.elements.push(element);
        Ok(())
    }

    fn update(&mut self, id: &str, patch: ElementPatch) -> Result<(), StoreError> {
        if self.reject_writes {
            return Err(StoreError::Rejected("writes disabled".into()));
        }
        let element = self
            .elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply_to(element);
        Ok(())
    }

    fn batch_update(&mut self, patches: Vec<(ElementId, ElementPatch)>) -> Result<(), StoreError> {
        for (id, patch) in patches {
            self.update(&id, patch)?;
        }
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        if self.reject_writes {
            return Err(StoreError::Rejected("writes disabled".into()));
        }
        self.elements.retain(|e| e.id != id);
        Ok(())
    }

    fn delete_many(&mut self, ids: &[ElementId]) -> Result<(), StoreError> {
        for id in ids {
            self.delete(id)?;
        }
        Ok(())
    }

    fn on_start_transform(&mut self) {
        self.transform_count += 1;
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingCollab {
    pub cursor_updates: Vec<na::Vector2<f64>>,
    pub selected_updates: Vec<Vec<ElementId>>,
    pub drawing_updates: usize,
}

impl CollabPort for RecordingCollab {
    fn update_cursor(&mut self, x: f64, y: f64) {
        self.cursor_updates.push(na::vector![x, y]);
    }

    fn update_selected(&mut self, ids: &[ElementId]) {
        self.selected_updates.push(ids.to_vec());
    }

    fn update_viewport(&mut self, _pan: na::Vector2<f64>, _zoom: f64) {}

    fn update_following_user(&mut self, _user_id: Option<&str>) {}

    fn update_drawing_element(&mut self, _element: Option<&Element>) {
        self.drawing_updates += 1;
    }
}

/// Fixed-ratio text metrics: every char is half the font size wide, lines stack.
#[derive(Debug, Default)]
pub(crate) struct FixedTextMetrics;

impl TextMetricsPort for FixedTextMetrics {
    fn min_single_char_width(
        &self,
        _text: &str,
        font_size: f64,
        _font_family: &str,
        letter_spacing: f64,
    ) -> f64 {
        font_size * 0.5 + letter_spacing
    }

    fn measure_wrapped_text_height(
        &self,
        text: &str,
        width: f64,
        font_size: f64,
        line_height: f64,
        _font_family: &str,
        letter_spacing: f64,
        _align: TextAlign,
    ) -> f64 {
        let char_width = font_size * 0.5 + letter_spacing;
        let chars_per_line = ((width / char_width).floor() as usize).max(1);
        let lines = text.chars().count().div_ceil(chars_per_line).max(1);
        lines as f64 * font_size * line_height
    }
}

#[derive(Debug, Default)]
pub(crate) struct FixedTileMetrics;

impl TileMetricsPort for FixedTileMetrics {
    fn min_tile_size(&self, _tile_type: &str) -> na::Vector2<f64> {
        na::vector![80.0, 60.0]
    }

    fn default_tile_size(&self, _tile_type: &str) -> na::Vector2<f64> {
        na::vector![240.0, 180.0]
    }
}
