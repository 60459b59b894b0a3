//! Explanation pane
//!
//! The right-hand pane: contextual help, validation errors, or the review
//! summary, depending on what the form last put there.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use trellis_core::PanelContent;

/// Render the explanation pane.
pub fn render(frame: &mut Frame, panel: &PanelContent, area: Rect) {
    let block =
        Block::default().borders(Borders::ALL).title(format!(" {} ", panel.title));

    let mut lines: Vec<Line> =
        panel.content.lines().map(|line| Line::from(line.to_owned())).collect();
    if !panel.hint.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            panel.hint.clone(),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
