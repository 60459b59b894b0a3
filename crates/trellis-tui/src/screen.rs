//! Screen assembly.
//!
//! A [`Screen`] is a compiled form plus its key-binding table and an
//! optional custom-action handler. [`ScreenBuilder`] is the one way to put
//! those pieces together; there is no screen subclassing.

use trellis_core::{Field, FieldWidget, FormAction, FormState, KeyInput, TableState};

use crate::Bindings;
use crate::bindings::BindingError;

/// Handler for action identifiers the shell does not know.
pub type ActionHandler = Box<dyn FnMut(&str, &mut FormState) -> Vec<FormAction> + Send>;

/// Built-in action identifiers every screen understands.
mod builtin {
    pub const SUBMIT: &str = "submit";
    pub const CANCEL: &str = "cancel";
    pub const SELECT_LAYER: &str = "select-layer";
    pub const TOGGLE_LAYER: &str = "toggle-layer";
    pub const TOGGLE_ALL: &str = "toggle-all";
}

/// A form screen wired to its key bindings.
pub struct Screen {
    form: FormState,
    bindings: Bindings,
    handler: Option<ActionHandler>,
}

impl std::fmt::Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("form", &self.form)
            .field("bindings", &self.bindings)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl Screen {
    /// The underlying form state, for rendering.
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Mutable form state, for host-driven updates between renders.
    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    /// The screen's binding table.
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Process a key: bindings first, then the form's built-in handling.
    ///
    /// Editing keys are exempt from binding lookup while a text input or a
    /// table filter has focus, so a screen binding on `"a"` cannot steal
    /// typed characters.
    pub fn handle_key(&mut self, key: KeyInput) -> Vec<FormAction> {
        let shielded = self.text_entry_active() && is_editing_key(key);
        if !shielded
            && let Some(action) = self.bindings.lookup(key).map(str::to_owned)
        {
            return self.run_action(&action);
        }
        self.form.handle_key(key)
    }

    /// Run an action identifier: built-ins first, then the custom handler.
    pub fn run_action(&mut self, action: &str) -> Vec<FormAction> {
        match action {
            builtin::SUBMIT => self.form.submit(),
            builtin::CANCEL => self.form.cancel(),
            builtin::SELECT_LAYER => self.form.update_focused_table(TableState::select_layer),
            builtin::TOGGLE_LAYER => self.form.update_focused_table(TableState::toggle_layer),
            builtin::TOGGLE_ALL => self.form.update_focused_table(TableState::toggle_all),
            custom => match &mut self.handler {
                Some(handler) => handler(custom, &mut self.form),
                None => {
                    tracing::warn!(action = custom, "unhandled screen action");
                    vec![]
                },
            },
        }
    }

    fn text_entry_active(&self) -> bool {
        self.form.focus().is_some_and(|index| match self.form.fields()[index].widget() {
            FieldWidget::Text { .. } => true,
            FieldWidget::Table(table) => table.filter_editing(),
            FieldWidget::Boolean(_) | FieldWidget::Message(_) => false,
        })
    }
}

fn is_editing_key(key: KeyInput) -> bool {
    matches!(
        key,
        KeyInput::Char(_)
            | KeyInput::Backspace
            | KeyInput::Delete
            | KeyInput::Left
            | KeyInput::Right
            | KeyInput::Home
            | KeyInput::End
    )
}

/// Assembles a [`Screen`] from fields, explanation content, and bindings.
pub struct ScreenBuilder {
    title: String,
    fields: Vec<Field>,
    explanation: Option<(String, String, String)>,
    bindings: Bindings,
    handler: Option<ActionHandler>,
}

impl std::fmt::Debug for ScreenBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenBuilder")
            .field("title", &self.title)
            .field("fields", &self.fields.len())
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

impl ScreenBuilder {
    /// Start a screen with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
            explanation: None,
            bindings: Bindings::new(),
            handler: None,
        }
    }

    /// Append a field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the explanation pane content.
    #[must_use]
    pub fn explanation(
        mut self,
        title: impl Into<String>,
        content: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        self.explanation = Some((title.into(), content.into(), hint.into()));
        self
    }

    /// Bind a key name to an action identifier.
    pub fn bind(mut self, key: &str, action: &str) -> Result<Self, BindingError> {
        self.bindings.bind(key, action)?;
        Ok(self)
    }

    /// Install a handler for custom action identifiers.
    #[must_use]
    pub fn on_action(
        mut self,
        handler: impl FnMut(&str, &mut FormState) -> Vec<FormAction> + Send + 'static,
    ) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Compile the screen.
    pub fn build(self) -> Screen {
        let mut form = FormState::new(self.title, self.fields);
        if let Some((title, content, hint)) = self.explanation {
            form = form.explanation(title, content, hint);
        }
        Screen { form, bindings: self.bindings, handler: self.handler }
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::{FieldValue, SelectMode, TableRow};

    use super::*;

    fn layer_table() -> TableState {
        TableState::new(
            vec!["Service".into()],
            vec![
                TableRow::new([("Service", "auth")]).layer("Prod").key("auth"),
                TableRow::new([("Service", "api")]).layer("Prod").key("api"),
                TableRow::new([("Service", "scratch")]).layer("Dev").key("scratch"),
            ],
            SelectMode::Multi,
        )
    }

    #[test]
    fn bound_key_runs_builtin_table_action() {
        let mut screen = ScreenBuilder::new("Pick")
            .field(Field::table("services", layer_table()))
            .bind("ctrl+l", "select-layer")
            .unwrap()
            .build();

        let _ = screen.handle_key(KeyInput::Ctrl('l'));
        let values = screen.form().values();
        let Some(FieldValue::Rows(rows)) = values.get("services") else {
            panic!("expected rows value");
        };
        assert_eq!(rows.len(), 2); // the Prod layer
    }

    #[test]
    fn text_focus_shields_character_bindings() {
        let mut screen = ScreenBuilder::new("Edit")
            .field(Field::text("name"))
            .bind("a", "toggle-all")
            .unwrap()
            .build();

        let _ = screen.handle_key(KeyInput::Char('a'));
        assert_eq!(
            screen.form().values().get("name"),
            Some(&FieldValue::Text("a".to_owned()))
        );
    }

    #[test]
    fn custom_actions_reach_the_handler() {
        let mut screen = ScreenBuilder::new("Handled")
            .field(Field::text("name"))
            .bind("ctrl+r", "refresh")
            .unwrap()
            .on_action(|action, form| {
                if action == "refresh" {
                    return form.set_text("name", "refreshed");
                }
                vec![]
            })
            .build();

        let _ = screen.handle_key(KeyInput::Ctrl('r'));
        assert_eq!(
            screen.form().values().get("name"),
            Some(&FieldValue::Text("refreshed".to_owned()))
        );
    }

    #[test]
    fn unbound_keys_fall_through_to_the_form() {
        let mut screen =
            ScreenBuilder::new("Plain").field(Field::boolean("flag", false)).build();
        let _ = screen.handle_key(KeyInput::Char(' '));
        assert_eq!(screen.form().values().get("flag"), Some(&FieldValue::Bool(true)));
    }
}
