//! Field list
//!
//! Renders the visible fields of a form in declared order: text inputs
//! with cursor and error styling, boolean toggles, static messages, and
//! embedded tables.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use trellis_core::{FieldWidget, FormField, FormState};

use super::table;

const TEXT_FIELD_HEIGHT: u16 = 2;
const ONE_LINE: u16 = 1;
const PROMPT: &str = "  > ";
const FIELD_GAP: u16 = 1;

/// Render all visible fields into `area`.
pub fn render(frame: &mut Frame, form: &FormState, area: Rect) {
    let visible: Vec<(usize, &FormField)> =
        form.fields().iter().enumerate().filter(|(_, field)| field.visible()).collect();

    let mut constraints: Vec<Constraint> = Vec::with_capacity(visible.len() + 1);
    for (_, field) in &visible {
        constraints.push(Constraint::Length(field_height(field).saturating_add(FIELD_GAP)));
    }
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for ((index, field), chunk) in visible.iter().zip(chunks.iter()) {
        let focused = form.focus() == Some(*index);
        render_field(frame, field, focused, *chunk);
    }
}

fn field_height(field: &FormField) -> u16 {
    match field.widget() {
        FieldWidget::Text { .. } => TEXT_FIELD_HEIGHT,
        FieldWidget::Boolean(_) | FieldWidget::Message(_) => ONE_LINE,
        FieldWidget::Table(table) => {
            let filter = u16::from(table.filter_editing() || table.filter_text().is_some());
            // Label, column header, then one line per display line.
            2 + filter + table.display_lines().len() as u16
        },
    }
}

fn render_field(frame: &mut Frame, field: &FormField, focused: bool, area: Rect) {
    match field.widget() {
        FieldWidget::Text { buffer, cursor, placeholder } => {
            render_text(frame, field, focused, buffer, *cursor, placeholder, area);
        },
        FieldWidget::Boolean(value) => render_boolean(frame, field, focused, *value, area),
        FieldWidget::Message(text) => render_message(frame, text, area),
        FieldWidget::Table(state) => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(ONE_LINE), Constraint::Min(1)])
                .split(area);
            let [label_area, table_area] = chunks.as_ref() else {
                return;
            };
            frame.render_widget(label_line(field, focused), *label_area);
            table::render(frame, state, focused, *table_area);
        },
    }
}

fn render_text(
    frame: &mut Frame,
    field: &FormField,
    focused: bool,
    buffer: &str,
    cursor: usize,
    placeholder: &str,
    area: Rect,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(ONE_LINE), Constraint::Length(ONE_LINE)])
        .split(area);
    let [label_area, input_area] = chunks.as_ref() else {
        return;
    };

    frame.render_widget(label_line(field, focused), *label_area);

    let input = if buffer.is_empty() && !placeholder.is_empty() && !focused {
        Line::from(vec![
            Span::raw(PROMPT),
            Span::styled(placeholder.to_owned(), Style::default().fg(Color::DarkGray)),
        ])
    } else {
        Line::from(vec![Span::raw(PROMPT), Span::raw(buffer.to_owned())])
    };
    frame.render_widget(Paragraph::new(input), *input_area);

    if focused {
        let offset = buffer[..cursor.min(buffer.len())].chars().count() as u16;
        let max_x = input_area.x.saturating_add(input_area.width).saturating_sub(1);
        let cursor_x =
            input_area.x.saturating_add(PROMPT.len() as u16).saturating_add(offset).min(max_x);
        frame.set_cursor_position((cursor_x, input_area.y));
    }
}

fn render_boolean(frame: &mut Frame, field: &FormField, focused: bool, value: bool, area: Rect) {
    let marker = if value { "[x]" } else { "[ ]" };
    let line = Line::from(vec![
        Span::raw(format!("  {marker} ")),
        label_span(field, focused),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_message(frame: &mut Frame, text: &str, area: Rect) {
    let message = Paragraph::new(format!("  {text}"))
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
    frame.render_widget(message, area);
}

fn label_line(field: &FormField, focused: bool) -> Paragraph<'static> {
    Paragraph::new(Line::from(vec![Span::raw("  "), label_span(field, focused)]))
}

/// Field label with focus, error, and required styling.
fn label_span(field: &FormField, focused: bool) -> Span<'static> {
    let name = if field.label().is_empty() { field.id() } else { field.label() };
    let text =
        if field.required() { format!("{name} *") } else { name.to_owned() };

    let style = if field.has_error() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Span::styled(text, style)
}
