/// Flags returned to the host that embeds the engine.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WidgetFlags {
    /// Needs surface redrawing.
    pub redraw: bool,
    /// Refresh the UI with the engine state.
    pub refresh_ui: bool,
    /// Indicates that the store was modified, i.e. elements inserted, modified or deleted.
    pub store_modified: bool,
    /// Indicates that the local selection set changed.
    pub selection_changed: bool,
    /// Update the current view offset and zoom.
    pub view_modified: bool,
    /// Indicates that the camera changed its zoom.
    pub zoomed: bool,
    /// Is Some when the pointer cursor label should be changed. Is None if it should not be changed.
    pub cursor: Option<&'static str>,
    /// Is Some when text editing should start for the given element id.
    pub edit_text: Option<String>,
    /// Is Some when label editing should start for the given frame id.
    pub edit_frame_label: Option<String>,
}

impl Default for WidgetFlags {
    fn default() -> Self {
        Self {
            redraw: false,
            refresh_ui: false,
            store_modified: false,
            selection_changed: false,
            view_modified: false,
            zoomed: false,
            cursor: None,
            edit_text: None,
            edit_frame_label: None,
        }
    }
}

impl std::ops::BitOr for WidgetFlags {
    type Output = Self;

    fn bitor(mut self, rhs: Self) -> Self::Output {
        self |= rhs;
        self
    }
}

impl std::ops::BitOrAssign for WidgetFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.redraw |= rhs.redraw;
        self.refresh_ui |= rhs.refresh_ui;
        self.store_modified |= rhs.store_modified;
        self.selection_changed |= rhs.selection_changed;
        self.view_modified |= rhs.view_modified;
        self.zoomed |= rhs.zoomed;
        if rhs.cursor.is_some() {
            self.cursor = rhs.cursor;
        }
        if rhs.edit_text.is_some() {
            self.edit_text = rhs.edit_text;
        }
        if rhs.edit_frame_label.is_some() {
            self.edit_frame_label = rhs.edit_frame_label;
        }
    }
}
