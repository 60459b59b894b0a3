//! Layered table state machine
//!
//! Pure state machine behind the table widget: cursor movement over a
//! filterable, layer-grouped row set, selection in four modes, and
//! identity-based reconciliation across full row-set replacements.
//!
//! The reconciliation in [`TableState::set_rows`] is the component's reason
//! to exist: a naive re-render loses cursor and selection continuity under
//! live updates. Selection is intersected with the new key set and the
//! cursor re-anchored by key.

use std::collections::BTreeSet;

use crate::{KeyInput, TableError, TableRow};

/// Selection mode for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectMode {
    /// Cursor movement only, no selection.
    None,
    /// Enter selects the cursor row, no persistent indicator.
    #[default]
    Single,
    /// Single selection with a persistent marker that follows Enter/Space.
    Radio,
    /// Space toggles rows, Enter confirms the set.
    Multi,
}

impl SelectMode {
    /// Whether this mode keeps at most one row selected.
    pub fn is_exclusive(self) -> bool {
        matches!(self, Self::Single | Self::Radio)
    }

    /// Whether this mode renders a per-row marker column.
    pub fn has_marker(self) -> bool {
        matches!(self, Self::Radio | Self::Multi)
    }
}

/// Policy for operations referencing an absent row key or column.
///
/// The original behavior was a fixed silent no-op; that hid typos in caller
/// code, so the choice is explicit now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingKey {
    /// Log at warn level and do nothing.
    #[default]
    Ignore,
    /// Return a [`TableError`].
    Error,
}

/// Events emitted by the table state machine for the host to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// Cursor moved to a row (`None` when the table emptied).
    Highlighted {
        /// Key of the newly highlighted row.
        row_key: Option<String>,
    },

    /// A row's selection was toggled (multi mode).
    Toggled {
        /// Key of the toggled row.
        row_key: String,
        /// New selection state.
        selected: bool,
    },

    /// A row was selected (single/radio/none modes).
    Selected {
        /// Key of the selected row.
        row_key: String,
    },

    /// The current selection was confirmed (Enter in multi mode).
    SelectionConfirmed {
        /// Selected keys in row order.
        row_keys: Vec<String>,
    },

    /// The filter text changed.
    FilterChanged {
        /// Rows matching the filter.
        matched: usize,
        /// Total rows before filtering.
        total: usize,
    },
}

/// One line of the composed grid: either a layer header pseudo-row or a
/// reference to a data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayLine {
    /// Layer header separator.
    LayerHeader(String),
    /// Index into the visible row set.
    Row {
        /// Index into [`TableState::rows`].
        index: usize,
    },
}

/// Selectable, filterable, layer-grouped table state.
#[derive(Debug, Clone)]
pub struct TableState {
    columns: Vec<String>,
    rows: Vec<TableRow>,
    /// Effective identity per row, parallel to `rows`.
    keys: Vec<String>,
    select_mode: SelectMode,
    missing_key: MissingKey,
    show_layers: bool,
    filterable: bool,
    selected: BTreeSet<String>,
    cursor: Option<String>,
    filter_text: String,
    filter_editing: bool,
}

impl TableState {
    /// Create a table over `columns` and an initial row set.
    pub fn new(
        columns: Vec<String>,
        rows: Vec<TableRow>,
        select_mode: SelectMode,
    ) -> Self {
        let keys = derive_keys(&rows);
        let mut state = Self {
            columns,
            rows,
            keys,
            select_mode,
            missing_key: MissingKey::default(),
            show_layers: true,
            filterable: false,
            selected: BTreeSet::new(),
            cursor: None,
            filter_text: String::new(),
            filter_editing: false,
        };
        state.cursor = state.first_visible_key();
        state
    }

    /// Enable the filter line (`/` key).
    #[must_use]
    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    /// Show or hide layer header pseudo-rows.
    #[must_use]
    pub fn show_layers(mut self, show: bool) -> Self {
        self.show_layers = show;
        self
    }

    /// Set the missing-key policy for [`TableState::update_cell`].
    #[must_use]
    pub fn missing_key(mut self, policy: MissingKey) -> Self {
        self.missing_key = policy;
        self
    }

    /// Declared column names, in display order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Current full row set, in row order.
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Selection mode.
    pub fn select_mode(&self) -> SelectMode {
        self.select_mode
    }

    /// Key of the row under the cursor.
    pub fn cursor_key(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Row under the cursor.
    pub fn cursor_row(&self) -> Option<&TableRow> {
        let cursor = self.cursor.as_deref()?;
        self.index_of(cursor).map(|i| &self.rows[i])
    }

    /// Layer of the row under the cursor.
    pub fn cursor_layer(&self) -> Option<&str> {
        self.cursor_row().and_then(TableRow::layer_name)
    }

    /// Selected row keys (unordered set).
    pub fn selected_keys(&self) -> &BTreeSet<String> {
        &self.selected
    }

    /// Whether `row_key` is currently selected.
    pub fn is_selected(&self, row_key: &str) -> bool {
        self.selected.contains(row_key)
    }

    /// Currently selected rows, in row order. Empty if none.
    pub fn selected_rows(&self) -> Vec<&TableRow> {
        self.keys
            .iter()
            .enumerate()
            .filter(|(_, key)| self.selected.contains(*key))
            .map(|(i, _)| &self.rows[i])
            .collect()
    }

    /// Active filter text, if any.
    pub fn filter_text(&self) -> Option<&str> {
        if self.filter_text.is_empty() { None } else { Some(&self.filter_text) }
    }

    /// Whether the filter line is accepting input.
    pub fn filter_editing(&self) -> bool {
        self.filter_editing
    }

    /// `(matched, total)` row counts under the current filter.
    pub fn match_count(&self) -> (usize, usize) {
        (self.visible_indices().len(), self.rows.len())
    }

    /// Indices of rows passing the current filter, in row order.
    pub fn visible_indices(&self) -> Vec<usize> {
        let needle = self.filter_text.to_lowercase();
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| needle.is_empty() || row.matches(&needle))
            .map(|(i, _)| i)
            .collect()
    }

    /// Compose the grid: one line per visible row, prefixed with a layer
    /// header whenever a row's layer differs from the previous row's.
    pub fn display_lines(&self) -> Vec<DisplayLine> {
        let mut lines = Vec::new();
        let mut previous_layer: Option<&str> = None;
        for index in self.visible_indices() {
            let layer = self.rows[index].layer_name();
            if self.show_layers
                && let Some(layer) = layer
                && previous_layer != Some(layer)
            {
                lines.push(DisplayLine::LayerHeader(layer.to_owned()));
            }
            previous_layer = layer;
            lines.push(DisplayLine::Row { index });
        }
        lines
    }

    /// Process a key event and return resulting table events.
    pub fn handle_key(&mut self, key: KeyInput) -> Vec<TableEvent> {
        if self.filter_editing {
            return self.handle_filter_key(key);
        }

        match key {
            KeyInput::Up => self.move_cursor(-1),
            KeyInput::Down => self.move_cursor(1),
            KeyInput::Home => self.move_cursor_to_edge(true),
            KeyInput::End => self.move_cursor_to_edge(false),
            KeyInput::Char(' ') => self.toggle_at_cursor(),
            KeyInput::Char('/') if self.filterable => {
                self.filter_editing = true;
                vec![]
            },
            KeyInput::Enter => self.handle_enter(),
            _ => vec![],
        }
    }

    /// Handle keys while the filter line has focus.
    fn handle_filter_key(&mut self, key: KeyInput) -> Vec<TableEvent> {
        match key {
            KeyInput::Char(c) => {
                self.filter_text.push(c);
                self.after_filter_change()
            },
            KeyInput::Backspace => {
                self.filter_text.pop();
                self.after_filter_change()
            },
            KeyInput::Esc => {
                self.filter_text.clear();
                self.filter_editing = false;
                self.after_filter_change()
            },
            KeyInput::Enter | KeyInput::Tab | KeyInput::Up | KeyInput::Down => {
                self.filter_editing = false;
                vec![]
            },
            _ => vec![],
        }
    }

    /// Re-anchor the cursor and report the new match count.
    fn after_filter_change(&mut self) -> Vec<TableEvent> {
        let mut events = Vec::new();
        if let Some(event) = self.reanchor_cursor() {
            events.push(event);
        }
        let (matched, total) = self.match_count();
        events.push(TableEvent::FilterChanged { matched, total });
        events
    }

    /// Move the cursor to the nearest visible row if it is filtered out.
    ///
    /// "Nearest" is the first visible row at or after the cursor's position
    /// in the full row set, falling back to the last visible row before it.
    fn reanchor_cursor(&mut self) -> Option<TableEvent> {
        let visible = self.visible_indices();
        let cursor_index = self.cursor.as_deref().and_then(|key| self.index_of(key));

        if let Some(index) = cursor_index
            && visible.contains(&index)
        {
            return None;
        }

        let anchor = cursor_index.unwrap_or(0);
        let new_index = visible
            .iter()
            .find(|&&i| i >= anchor)
            .or_else(|| visible.iter().rev().find(|&&i| i < anchor))
            .copied();

        self.cursor = new_index.map(|i| self.keys[i].clone());
        Some(TableEvent::Highlighted { row_key: self.cursor.clone() })
    }

    /// Move the cursor by `delta` visible rows, clamped at the boundaries.
    fn move_cursor(&mut self, delta: isize) -> Vec<TableEvent> {
        let visible = self.visible_indices();
        if visible.is_empty() {
            return vec![];
        }

        let position = self
            .cursor
            .as_deref()
            .and_then(|key| self.index_of(key))
            .and_then(|index| visible.iter().position(|&i| i == index));

        let next = match position {
            Some(p) => p.saturating_add_signed(delta).min(visible.len() - 1),
            None => 0,
        };

        let key = self.keys[visible[next]].clone();
        if self.cursor.as_deref() == Some(key.as_str()) {
            return vec![];
        }
        self.cursor = Some(key.clone());
        vec![TableEvent::Highlighted { row_key: Some(key) }]
    }

    fn move_cursor_to_edge(&mut self, first: bool) -> Vec<TableEvent> {
        let visible = self.visible_indices();
        let Some(&index) = (if first { visible.first() } else { visible.last() }) else {
            return vec![];
        };
        let key = self.keys[index].clone();
        if self.cursor.as_deref() == Some(key.as_str()) {
            return vec![];
        }
        self.cursor = Some(key.clone());
        vec![TableEvent::Highlighted { row_key: Some(key) }]
    }

    /// Toggle or move selection at the cursor (Space key).
    pub fn toggle_at_cursor(&mut self) -> Vec<TableEvent> {
        let Some(key) = self.cursor.clone() else {
            return vec![];
        };

        match self.select_mode {
            SelectMode::Multi => {
                let selected = if self.selected.remove(&key) {
                    false
                } else {
                    self.selected.insert(key.clone());
                    true
                };
                vec![TableEvent::Toggled { row_key: key, selected }]
            },
            SelectMode::Radio => {
                self.selected.clear();
                self.selected.insert(key.clone());
                vec![TableEvent::Selected { row_key: key }]
            },
            SelectMode::Single | SelectMode::None => vec![],
        }
    }

    /// Enter key: confirm in multi mode, select in the others.
    fn handle_enter(&mut self) -> Vec<TableEvent> {
        match self.select_mode {
            SelectMode::Multi => {
                let row_keys = self
                    .keys
                    .iter()
                    .filter(|key| self.selected.contains(*key))
                    .cloned()
                    .collect();
                vec![TableEvent::SelectionConfirmed { row_keys }]
            },
            SelectMode::Radio | SelectMode::Single => {
                let Some(key) = self.cursor.clone() else {
                    return vec![];
                };
                self.selected.clear();
                self.selected.insert(key.clone());
                vec![TableEvent::Selected { row_key: key }]
            },
            SelectMode::None => {
                let Some(key) = self.cursor.clone() else {
                    return vec![];
                };
                vec![TableEvent::Selected { row_key: key }]
            },
        }
    }

    /// Add every row sharing the cursor's layer to the selection.
    ///
    /// Multi mode only; the existing selection is kept.
    pub fn select_layer(&mut self) -> Vec<TableEvent> {
        if self.select_mode != SelectMode::Multi {
            return vec![];
        }
        let Some(layer) = self.cursor_layer().map(str::to_owned) else {
            return vec![];
        };

        let mut events = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            if row.layer_name() == Some(layer.as_str())
                && self.selected.insert(self.keys[i].clone())
            {
                events.push(TableEvent::Toggled { row_key: self.keys[i].clone(), selected: true });
            }
        }
        events
    }

    /// Toggle the cursor's layer: deselect it if fully selected, otherwise
    /// select every row in it. Other layers are untouched.
    pub fn toggle_layer(&mut self) -> Vec<TableEvent> {
        if self.select_mode != SelectMode::Multi {
            return vec![];
        }
        let Some(layer) = self.cursor_layer().map(str::to_owned) else {
            return vec![];
        };

        let layer_keys: Vec<String> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.layer_name() == Some(layer.as_str()))
            .map(|(i, _)| self.keys[i].clone())
            .collect();
        if layer_keys.is_empty() {
            return vec![];
        }

        let all_selected = layer_keys.iter().all(|key| self.selected.contains(key));
        let mut events = Vec::new();
        for key in layer_keys {
            let selected = if all_selected {
                self.selected.remove(&key);
                false
            } else {
                if !self.selected.insert(key.clone()) {
                    continue;
                }
                true
            };
            events.push(TableEvent::Toggled { row_key: key, selected });
        }
        events
    }

    /// Toggle between full selection and empty.
    pub fn toggle_all(&mut self) -> Vec<TableEvent> {
        if self.select_mode != SelectMode::Multi || self.rows.is_empty() {
            return vec![];
        }

        let all_selected = self.keys.iter().all(|key| self.selected.contains(key));
        let mut events = Vec::new();
        if all_selected {
            for key in self.keys.clone() {
                self.selected.remove(&key);
                events.push(TableEvent::Toggled { row_key: key, selected: false });
            }
        } else {
            for key in self.keys.clone() {
                if self.selected.insert(key.clone()) {
                    events.push(TableEvent::Toggled { row_key: key, selected: true });
                }
            }
        }
        events
    }

    /// Append a single row to the end of the row set.
    ///
    /// Selection and cursor are untouched; an empty table gains a cursor on
    /// the new row if it passes the filter.
    pub fn add_row(&mut self, row: TableRow) {
        let key = row.effective_key(self.rows.len());
        self.rows.push(row);
        self.keys.push(key);
        if self.cursor.is_none() {
            self.cursor = self.first_visible_key();
        }
    }

    /// Declare an additional column at the end of display order.
    ///
    /// Existing rows render blank cells until [`TableState::update_cell`]
    /// fills them in.
    pub fn add_column(&mut self, column: impl Into<String>) {
        self.columns.push(column.into());
    }

    /// Replace the full row set, preserving selection and cursor by identity.
    ///
    /// The new selection is the old selection intersected with the new key
    /// set; rows that disappeared drop out silently. The cursor stays on the
    /// row sharing its old key when present, otherwise it resets to the
    /// first selectable row. A surviving cursor whose new cell values fail
    /// the active filter re-anchors to the nearest visible row, as a filter
    /// edit would.
    pub fn set_rows(&mut self, new_rows: Vec<TableRow>) {
        let new_keys = derive_keys(&new_rows);
        let key_set: BTreeSet<&str> = new_keys.iter().map(String::as_str).collect();

        let before = self.selected.len();
        self.selected.retain(|key| key_set.contains(key.as_str()));
        if self.selected.len() != before {
            tracing::debug!(
                dropped = before - self.selected.len(),
                "selection pruned by row replacement"
            );
        }

        let cursor_survives =
            self.cursor.as_deref().is_some_and(|key| key_set.contains(key));

        self.rows = new_rows;
        self.keys = new_keys;
        if cursor_survives {
            // The surviving row's new cell values may fail the filter.
            let _ = self.reanchor_cursor();
        } else {
            self.cursor = self.first_visible_key();
        }
    }

    /// Update a single displayed cell without replacing the row set.
    ///
    /// Behavior on an absent key or undeclared column follows the
    /// [`MissingKey`] policy.
    pub fn update_cell(
        &mut self,
        row_key: &str,
        column: &str,
        value: impl Into<String>,
    ) -> Result<(), TableError> {
        if !self.columns.iter().any(|c| c == column) {
            return self.missing(TableError::UnknownColumn { column: column.to_owned() });
        }
        let Some(index) = self.index_of(row_key) else {
            return self.missing(TableError::UnknownRowKey { key: row_key.to_owned() });
        };
        self.rows[index].set_value(column, value.into());
        Ok(())
    }

    fn missing(&self, error: TableError) -> Result<(), TableError> {
        match self.missing_key {
            MissingKey::Ignore => {
                tracing::warn!(%error, "ignoring cell update");
                Ok(())
            },
            MissingKey::Error => Err(error),
        }
    }

    fn index_of(&self, row_key: &str) -> Option<usize> {
        self.keys.iter().position(|key| key == row_key)
    }

    fn first_visible_key(&self) -> Option<String> {
        self.visible_indices().first().map(|&i| self.keys[i].clone())
    }
}

fn derive_keys(rows: &[TableRow]) -> Vec<String> {
    rows.iter().enumerate().map(|(i, row)| row.effective_key(i)).collect()
}
