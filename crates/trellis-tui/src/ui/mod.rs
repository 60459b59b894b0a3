//! UI rendering
//!
//! Rendering functions that convert screen state into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and
//! drawing into a frame.

mod fields;
mod panel;
mod status;
pub mod table;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::Paragraph,
};

use crate::Screen;

/// Render the entire screen.
pub fn render(frame: &mut Frame, screen: &Screen) {
    const TITLE_HEIGHT: u16 = 1;
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(TITLE_HEIGHT),
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [title_area, main_area, status_area] = chunks.as_ref() else {
        return;
    };

    render_title(frame, screen, *title_area);
    render_main_area(frame, screen, *main_area);
    status::render(frame, screen.form(), *status_area);
}

fn render_title(frame: &mut Frame, screen: &Screen, area: Rect) {
    let title = Paragraph::new(format!(" {}", screen.form().title()))
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));
    frame.render_widget(title, area);
}

/// Render the main area: field content beside the explanation pane, 3:2.
fn render_main_area(frame: &mut Frame, screen: &Screen, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(3, 5), Constraint::Ratio(2, 5)])
        .split(area);

    let [fields_area, panel_area] = chunks.as_ref() else {
        return;
    };

    fields::render(frame, screen.form(), *fields_area);
    panel::render(frame, screen.form().panel(), *panel_area);
}

#[cfg(test)]
pub(crate) mod test_support {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    /// Render a screen into a plain-text grid for assertions.
    pub fn render_to_text(screen: &Screen, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, screen)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut lines = Vec::with_capacity(usize::from(height));
        for y in 0..height {
            let mut line = String::new();
            for x in 0..width {
                let cell = buffer.cell((x, y)).expect("coordinate inside declared viewport");
                line.push_str(cell.symbol());
            }
            lines.push(line.trim_end().to_owned());
        }
        lines.join("\n")
    }
}
