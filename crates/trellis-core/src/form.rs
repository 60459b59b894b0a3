//! Form screen state machine
//!
//! Compiles a declarative [`Field`] list into an interactive two-pane screen
//! state: text inputs, embedded tables, boolean toggles, conditional
//! visibility, required-field validation, and the review-then-confirm
//! submission protocol.
//!
//! Pure and I/O-free: keys go in, [`FormAction`]s come out, rendering reads
//! the exposed state.

use std::collections::BTreeMap;

use crate::{KeyInput, TableEvent, TableRow, TableState};

/// Predicate deciding whether a field is visible given current values.
pub type VisiblePredicate = Box<dyn Fn(&BTreeMap<String, FieldValue>) -> bool + Send>;

/// A collected field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text input contents.
    Text(String),
    /// Boolean toggle state.
    Bool(bool),
    /// Selected table rows, in row order.
    Rows(Vec<TableRow>),
}

impl FieldValue {
    /// Whether this value counts as empty for required-field validation.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Bool(_) => false,
            Self::Rows(rows) => rows.is_empty(),
        }
    }
}

/// Declarative field descriptor, consumed by [`FormState::new`].
///
/// `id` must be unique within a screen; duplicates silently overwrite each
/// other in the result map.
pub struct Field {
    id: String,
    label: String,
    kind: FieldKind,
    required: bool,
    initially_hidden: bool,
    visible_when: Option<VisiblePredicate>,
}

/// The kind of widget a [`Field`] compiles into.
pub enum FieldKind {
    /// Single-line text input.
    Text {
        /// Initial buffer contents.
        default: String,
        /// Placeholder shown while empty.
        placeholder: String,
    },
    /// Embedded layered table.
    Table {
        /// Pre-configured table state.
        table: TableState,
    },
    /// Yes/no toggle.
    Boolean {
        /// Initial state.
        default: bool,
    },
    /// Static, non-interactive text.
    Message {
        /// The text to display.
        text: String,
    },
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("id", &self.id)
            .field("required", &self.required)
            .field("initially_hidden", &self.initially_hidden)
            .field("conditional", &self.visible_when.is_some())
            .finish_non_exhaustive()
    }
}

impl Field {
    /// A text input field.
    pub fn text(id: impl Into<String>) -> Self {
        Self::with_kind(id, FieldKind::Text { default: String::new(), placeholder: String::new() })
    }

    /// A table selection field.
    pub fn table(id: impl Into<String>, table: TableState) -> Self {
        Self::with_kind(id, FieldKind::Table { table })
    }

    /// A boolean toggle field.
    pub fn boolean(id: impl Into<String>, default: bool) -> Self {
        Self::with_kind(id, FieldKind::Boolean { default })
    }

    /// A static message line.
    pub fn message(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_kind(id, FieldKind::Message { text: text.into() })
    }

    fn with_kind(id: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            kind,
            required: false,
            initially_hidden: false,
            visible_when: None,
        }
    }

    /// Set the display label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Mark the field required for submission.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Hide the field on initial render.
    #[must_use]
    pub fn initially_hidden(mut self, hidden: bool) -> Self {
        self.initially_hidden = hidden;
        self
    }

    /// Set the initial text value. Text fields only.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        if let FieldKind::Text { default, .. } = &mut self.kind {
            *default = value.into();
        }
        self
    }

    /// Set the placeholder. Text fields only.
    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        if let FieldKind::Text { placeholder: slot, .. } = &mut self.kind {
            *slot = placeholder.into();
        }
        self
    }

    /// Attach a visibility predicate, re-evaluated after every value change.
    ///
    /// A hidden required field is exempt from validation.
    #[must_use]
    pub fn visible_when(
        mut self,
        predicate: impl Fn(&BTreeMap<String, FieldValue>) -> bool + Send + 'static,
    ) -> Self {
        self.visible_when = Some(Box::new(predicate));
        self
    }
}

/// Return value of a completed screen, produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenResult {
    /// True on submit, false on cancellation.
    pub confirmed: bool,
    /// Field id to collected value. Partial on cancellation.
    pub values: BTreeMap<String, FieldValue>,
}

/// Actions produced by the form state machine for the shell to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    /// Redraw the screen.
    Render,
    /// The screen finished; deliver the result to the continuation.
    Complete(ScreenResult),
}

/// Compiled per-field runtime state.
pub struct FormField {
    id: String,
    label: String,
    required: bool,
    visible: bool,
    error: bool,
    widget: FieldWidget,
    visible_when: Option<VisiblePredicate>,
}

/// Widget state behind a compiled field, exposed for rendering.
#[derive(Debug, Clone)]
pub enum FieldWidget {
    /// Text input buffer and cursor.
    Text {
        /// Current contents.
        buffer: String,
        /// Cursor position within the buffer.
        cursor: usize,
        /// Placeholder shown while empty.
        placeholder: String,
    },
    /// Embedded table.
    Table(TableState),
    /// Boolean toggle.
    Boolean(bool),
    /// Static text.
    Message(String),
}

impl FormField {
    /// Field identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the field is required when visible.
    pub fn required(&self) -> bool {
        self.required
    }

    /// Whether the field is currently visible.
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Whether the field carries a validation error marker.
    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Widget state for rendering.
    pub fn widget(&self) -> &FieldWidget {
        &self.widget
    }

    fn interactive(&self) -> bool {
        !matches!(self.widget, FieldWidget::Message(_))
    }

    fn value(&self) -> Option<FieldValue> {
        match &self.widget {
            FieldWidget::Text { buffer, .. } => Some(FieldValue::Text(buffer.clone())),
            FieldWidget::Table(table) => {
                Some(FieldValue::Rows(table.selected_rows().into_iter().cloned().collect()))
            },
            FieldWidget::Boolean(value) => Some(FieldValue::Bool(*value)),
            FieldWidget::Message(_) => None,
        }
    }
}

/// Explanation pane content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelContent {
    /// Pane title.
    pub title: String,
    /// Main body text.
    pub content: String,
    /// Short hint line (key help and the like).
    pub hint: String,
}

/// Two-pane screen state: a field list plus an explanation pane, with a
/// confirm/cancel protocol.
///
/// Submission is confirm-twice: the first confirm renders a read-only
/// summary into the explanation pane and arms a pending flag; the second
/// finalizes. Any value edit disarms the flag.
pub struct FormState {
    title: String,
    fields: Vec<FormField>,
    focus: Option<usize>,
    review_pending: bool,
    finished: bool,
    explanation: PanelContent,
    original_explanation: PanelContent,
}

impl std::fmt::Debug for FormState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormState")
            .field("title", &self.title)
            .field("fields", &self.fields.iter().map(FormField::id).collect::<Vec<_>>())
            .field("focus", &self.focus)
            .field("review_pending", &self.review_pending)
            .field("finished", &self.finished)
            .finish()
    }
}

impl FormState {
    /// Compile a field list into screen state.
    ///
    /// Fields keep their declared order; hidden fields keep their position
    /// and state across hide/show transitions.
    pub fn new(title: impl Into<String>, fields: Vec<Field>) -> Self {
        let fields: Vec<FormField> = fields
            .into_iter()
            .map(|field| {
                let widget = match field.kind {
                    FieldKind::Text { default, placeholder } => FieldWidget::Text {
                        cursor: default.len(),
                        buffer: default,
                        placeholder,
                    },
                    FieldKind::Table { table } => FieldWidget::Table(table),
                    FieldKind::Boolean { default } => FieldWidget::Boolean(default),
                    FieldKind::Message { text } => FieldWidget::Message(text),
                };
                FormField {
                    id: field.id,
                    label: field.label,
                    required: field.required,
                    visible: !field.initially_hidden,
                    error: false,
                    widget,
                    visible_when: field.visible_when,
                }
            })
            .collect();

        let mut state = Self {
            title: title.into(),
            fields,
            focus: None,
            review_pending: false,
            finished: false,
            explanation: PanelContent::default(),
            original_explanation: PanelContent::default(),
        };
        state.apply_visibility();
        state.focus = state.next_focusable(None, 1);
        state
    }

    /// Set the explanation pane content.
    #[must_use]
    pub fn explanation(
        mut self,
        title: impl Into<String>,
        content: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        let panel =
            PanelContent { title: title.into(), content: content.into(), hint: hint.into() };
        self.explanation = panel.clone();
        self.original_explanation = panel;
        self
    }

    /// Screen title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Compiled fields in declared order.
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Index of the focused field, if any.
    pub fn focus(&self) -> Option<usize> {
        self.focus
    }

    /// Current explanation pane content.
    pub fn panel(&self) -> &PanelContent {
        &self.explanation
    }

    /// Whether a review summary is armed and the next confirm finalizes.
    pub fn review_pending(&self) -> bool {
        self.review_pending
    }

    /// Whether a result has already been produced.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Collected values for every interactive field.
    pub fn values(&self) -> BTreeMap<String, FieldValue> {
        self.fields
            .iter()
            .filter_map(|field| field.value().map(|value| (field.id.clone(), value)))
            .collect()
    }

    /// Process a key event.
    pub fn handle_key(&mut self, key: KeyInput) -> Vec<FormAction> {
        if self.finished {
            return vec![];
        }

        // A table editing its filter consumes keys before screen-level
        // handling; Esc there clears the filter rather than cancelling.
        if let Some(index) = self.focus
            && let FieldWidget::Table(table) = &self.fields[index].widget
            && table.filter_editing()
        {
            return self.forward_to_table(index, key);
        }

        match key {
            KeyInput::Tab => self.cycle_focus(1),
            KeyInput::BackTab => self.cycle_focus(-1),
            KeyInput::Enter => self.submit(),
            KeyInput::Esc => self.handle_esc(),
            other => self.forward_to_focused(other),
        }
    }

    /// Cancel the screen, yielding `confirmed: false` with partial values.
    pub fn cancel(&mut self) -> Vec<FormAction> {
        if self.finished {
            return vec![];
        }
        self.finished = true;
        vec![FormAction::Complete(ScreenResult { confirmed: false, values: self.values() })]
    }

    /// Attempt submission: validate, arm the review step, or finalize.
    pub fn submit(&mut self) -> Vec<FormAction> {
        if self.finished {
            return vec![];
        }

        if self.review_pending {
            self.finished = true;
            return vec![FormAction::Complete(ScreenResult {
                confirmed: true,
                values: self.values(),
            })];
        }

        let invalid = self.validate();
        if invalid.is_empty() {
            self.show_review();
            self.review_pending = true;
        } else {
            self.show_validation_errors(&invalid);
            self.focus = Some(invalid[0]);
        }
        vec![FormAction::Render]
    }

    /// Programmatically set a text field's value, with the same follow-up as
    /// an interactive edit.
    pub fn set_text(&mut self, field_id: &str, value: impl Into<String>) -> Vec<FormAction> {
        let Some(index) = self.fields.iter().position(|f| f.id == field_id) else {
            tracing::warn!(field_id, "set_text on unknown field");
            return vec![];
        };
        if let FieldWidget::Text { buffer, cursor, .. } = &mut self.fields[index].widget {
            *buffer = value.into();
            *cursor = buffer.len();
            return self.after_value_change(index);
        }
        vec![]
    }

    /// Show or hide a field that has no visibility predicate.
    pub fn set_field_visibility(&mut self, field_id: &str, visible: bool) -> Vec<FormAction> {
        let Some(index) = self.fields.iter().position(|f| f.id == field_id) else {
            tracing::warn!(field_id, "set_field_visibility on unknown field");
            return vec![];
        };
        if self.fields[index].visible_when.is_some() || self.fields[index].visible == visible {
            return vec![];
        }
        self.fields[index].visible = visible;
        self.ensure_focus_visible();
        vec![FormAction::Render]
    }

    /// Mutable access to an embedded table, for live updates from the host.
    pub fn table_mut(&mut self, field_id: &str) -> Option<&mut TableState> {
        self.fields.iter_mut().find(|f| f.id == field_id).and_then(|f| match &mut f.widget {
            FieldWidget::Table(table) => Some(table),
            _ => None,
        })
    }

    fn handle_esc(&mut self) -> Vec<FormAction> {
        if self.review_pending {
            // Back to editing; restore the original explanation.
            self.review_pending = false;
            self.explanation = self.original_explanation.clone();
            return vec![FormAction::Render];
        }
        self.cancel()
    }

    fn cycle_focus(&mut self, direction: isize) -> Vec<FormAction> {
        let next = self.next_focusable(self.focus, direction);
        if next == self.focus {
            return vec![];
        }
        self.focus = next;
        vec![FormAction::Render]
    }

    /// Next visible interactive field in `direction`, wrapping.
    fn next_focusable(&self, from: Option<usize>, direction: isize) -> Option<usize> {
        let count = self.fields.len();
        if count == 0 {
            return None;
        }

        let start = match from {
            Some(index) => index,
            None => {
                return self
                    .fields
                    .iter()
                    .position(|f| f.visible && f.interactive());
            },
        };

        let mut index = start;
        for _ in 0..count {
            index = index
                .checked_add_signed(direction)
                .map_or(count - 1, |i| if i >= count { 0 } else { i });
            if self.fields[index].visible && self.fields[index].interactive() {
                return Some(index);
            }
        }
        from
    }

    /// Run `operation` against the focused table field, with the same
    /// follow-up as an interactive edit when it changes the selection.
    ///
    /// No-op when focus is not on a table. This is the hook for bulk
    /// selection actions bound to screen-level keys.
    pub fn update_focused_table(
        &mut self,
        operation: impl FnOnce(&mut TableState) -> Vec<TableEvent>,
    ) -> Vec<FormAction> {
        let Some(index) = self.focus else {
            return vec![];
        };
        let FieldWidget::Table(table) = &mut self.fields[index].widget else {
            return vec![];
        };

        let events = operation(table);
        let selection_changed = events
            .iter()
            .any(|e| matches!(e, TableEvent::Toggled { .. } | TableEvent::Selected { .. }));

        if selection_changed {
            self.after_value_change(index)
        } else if events.is_empty() {
            vec![]
        } else {
            vec![FormAction::Render]
        }
    }

    fn forward_to_focused(&mut self, key: KeyInput) -> Vec<FormAction> {
        let Some(index) = self.focus else {
            return vec![];
        };

        match &mut self.fields[index].widget {
            FieldWidget::Text { .. } => self.handle_text_key(index, key),
            FieldWidget::Table(_) => self.forward_to_table(index, key),
            FieldWidget::Boolean(value) => {
                if key == KeyInput::Char(' ') {
                    *value = !*value;
                    return self.after_value_change(index);
                }
                vec![]
            },
            FieldWidget::Message(_) => vec![],
        }
    }

    fn handle_text_key(&mut self, index: usize, key: KeyInput) -> Vec<FormAction> {
        let FieldWidget::Text { buffer, cursor, .. } = &mut self.fields[index].widget else {
            return vec![];
        };

        let mut changed = false;
        match key {
            KeyInput::Char(c) => {
                buffer.insert(*cursor, c);
                *cursor = cursor.saturating_add(c.len_utf8());
                changed = true;
            },
            KeyInput::Backspace => {
                if *cursor > 0 {
                    let previous = buffer[..*cursor]
                        .char_indices()
                        .next_back()
                        .map_or(0, |(i, _)| i);
                    buffer.remove(previous);
                    *cursor = previous;
                    changed = true;
                }
            },
            KeyInput::Delete => {
                if *cursor < buffer.len() {
                    buffer.remove(*cursor);
                    changed = true;
                }
            },
            KeyInput::Left => {
                *cursor = buffer[..*cursor].char_indices().next_back().map_or(0, |(i, _)| i);
            },
            KeyInput::Right => {
                if *cursor < buffer.len() {
                    let step = buffer[*cursor..].chars().next().map_or(0, char::len_utf8);
                    *cursor = cursor.saturating_add(step);
                }
            },
            KeyInput::Home => *cursor = 0,
            KeyInput::End => *cursor = buffer.len(),
            _ => return vec![],
        }

        if changed {
            self.after_value_change(index)
        } else {
            vec![FormAction::Render]
        }
    }

    fn forward_to_table(&mut self, index: usize, key: KeyInput) -> Vec<FormAction> {
        let FieldWidget::Table(table) = &mut self.fields[index].widget else {
            return vec![];
        };
        let events = table.handle_key(key);
        let selection_changed = events
            .iter()
            .any(|e| matches!(e, TableEvent::Toggled { .. } | TableEvent::Selected { .. }));

        if selection_changed {
            self.after_value_change(index)
        } else if events.is_empty() {
            vec![]
        } else {
            vec![FormAction::Render]
        }
    }

    /// Follow-up common to every value edit: disarm the review step, clear
    /// the edited field's error marker, and re-evaluate visibility.
    fn after_value_change(&mut self, index: usize) -> Vec<FormAction> {
        if self.review_pending {
            self.review_pending = false;
            self.explanation = self.original_explanation.clone();
        }
        self.fields[index].error = false;
        self.apply_visibility();
        vec![FormAction::Render]
    }

    /// Re-evaluate every visibility predicate against current values.
    ///
    /// Fields transitioning hidden to visible reappear at their declared
    /// position; sibling field state is untouched.
    fn apply_visibility(&mut self) {
        let values = self.values();
        for field in &mut self.fields {
            if let Some(predicate) = &field.visible_when {
                field.visible = predicate(&values);
            }
        }
        self.ensure_focus_visible();
    }

    fn ensure_focus_visible(&mut self) {
        let focused_hidden = self
            .focus
            .is_some_and(|i| !self.fields[i].visible || !self.fields[i].interactive());
        if focused_hidden || self.focus.is_none() {
            self.focus = self.next_focusable(None, 1);
        }
    }

    /// Indices of visible required fields with empty values, in field order.
    fn validate(&mut self) -> Vec<usize> {
        let mut invalid = Vec::new();
        for (index, field) in self.fields.iter_mut().enumerate() {
            let failing = field.visible
                && field.required
                && field.value().is_none_or(|value| value.is_empty());
            field.error = failing;
            if failing {
                invalid.push(index);
            }
        }
        invalid
    }

    fn show_validation_errors(&mut self, invalid: &[usize]) {
        let bullets: Vec<String> = invalid
            .iter()
            .map(|&i| {
                let field = &self.fields[i];
                let name = if field.label.is_empty() { &field.id } else { &field.label };
                format!("- {name} is required")
            })
            .collect();

        self.explanation = PanelContent {
            title: "Validation error".to_owned(),
            content: bullets.join("\n"),
            hint: "Fix the marked fields and press Enter again".to_owned(),
        };
    }

    /// Render a read-only summary of current values into the explanation
    /// pane.
    fn show_review(&mut self) {
        let mut lines = Vec::new();
        for field in self.fields.iter().filter(|f| f.visible) {
            let Some(value) = field.value() else {
                continue;
            };
            let name = if field.label.is_empty() { &field.id } else { &field.label };
            let rendered = match value {
                FieldValue::Text(text) => {
                    if text.trim().is_empty() {
                        continue;
                    }
                    text
                },
                FieldValue::Bool(b) => if b { "yes" } else { "no" }.to_owned(),
                FieldValue::Rows(rows) => {
                    if rows.is_empty() {
                        continue;
                    }
                    rows.iter()
                        .map(|row| {
                            row.values().values().cloned().collect::<Vec<_>>().join(", ")
                        })
                        .collect::<Vec<_>>()
                        .join("; ")
                },
            };
            lines.push(format!("{name}: {rendered}"));
        }

        self.explanation = PanelContent {
            title: "Review your submission".to_owned(),
            content: lines.join("\n"),
            hint: "Press Enter to confirm, Esc to go back and edit".to_owned(),
        };
    }
}
