//! Status bar
//!
//! One-line footer with the key hints for the current screen state.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
};
use trellis_core::{FieldWidget, FormState};

/// Render the status bar.
pub fn render(frame: &mut Frame, form: &FormState, area: Rect) {
    let hints = if form.review_pending() {
        " Enter: confirm | Esc: back to edit"
    } else if filter_active(form) {
        " type to filter | Enter: keep | Esc: clear"
    } else {
        " Tab: next field | Space: toggle | Enter: submit | Esc: cancel"
    };

    let paragraph = Paragraph::new(hints)
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(paragraph, area);
}

fn filter_active(form: &FormState) -> bool {
    form.focus().is_some_and(|index| match form.fields()[index].widget() {
        FieldWidget::Table(table) => table.filter_editing(),
        _ => false,
    })
}
