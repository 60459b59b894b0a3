//! Table grid
//!
//! Renders a [`TableState`] as a column-aligned grid: optional filter line,
//! header row, layer header separators, and per-row selection markers for
//! the marker modes.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
};
use trellis_core::{DisplayLine, SelectMode, TableState};

const CURSOR_PREFIX: &str = "> ";
const PLAIN_PREFIX: &str = "  ";
const COLUMN_GAP: &str = "  ";
const FILTER_HEIGHT: u16 = 1;

/// Render a table grid into `area`.
pub fn render(frame: &mut Frame, table: &TableState, focused: bool, area: Rect) {
    let show_filter = table.filter_editing() || table.filter_text().is_some();
    let grid_area = if show_filter {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(FILTER_HEIGHT), Constraint::Min(1)])
            .split(area);
        let [filter_area, grid_area] = chunks.as_ref() else {
            return;
        };
        render_filter_line(frame, table, *filter_area);
        *grid_area
    } else {
        area
    };

    let widths = column_widths(table);
    let mut items = vec![header_item(table, &widths)];
    items.extend(table.display_lines().iter().map(|line| match line {
        DisplayLine::LayerHeader(layer) => layer_header_item(layer),
        DisplayLine::Row { index } => row_item(table, *index, &widths, focused),
    }));

    frame.render_widget(List::new(items), grid_area);
}

/// Filter line: the typed needle plus a live "N of M" count.
fn render_filter_line(frame: &mut Frame, table: &TableState, area: Rect) {
    let (matched, total) = table.match_count();
    let needle = table.filter_text().unwrap_or_default();

    let line = Line::from(vec![
        Span::styled(
            format!("{PLAIN_PREFIX}/{needle}"),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!("  {matched} of {total}"),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn header_item(table: &TableState, widths: &[usize]) -> ListItem<'static> {
    let mut text = String::from(PLAIN_PREFIX);
    text.push_str(marker_blank(table.select_mode()));
    for (column, width) in table.columns().iter().zip(widths.iter().copied()) {
        text.push_str(&format!("{column:<width$}{COLUMN_GAP}"));
    }
    ListItem::new(Line::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )))
}

fn layer_header_item(layer: &str) -> ListItem<'static> {
    ListItem::new(Line::from(Span::styled(
        format!("{PLAIN_PREFIX}— {layer} —"),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )))
}

fn row_item(table: &TableState, index: usize, widths: &[usize], focused: bool) -> ListItem<'static> {
    let row = &table.rows()[index];
    let key = row_key_at(table, index);
    let under_cursor = table.cursor_key() == Some(key.as_str());

    let mut text = String::new();
    text.push_str(if under_cursor { CURSOR_PREFIX } else { PLAIN_PREFIX });
    text.push_str(&marker(table, &key));
    for (column, width) in table.columns().iter().zip(widths.iter().copied()) {
        let value = row.value(column).unwrap_or_default();
        text.push_str(&format!("{value:<width$}{COLUMN_GAP}"));
    }

    let style = if under_cursor && focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else if table.is_selected(&key) {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    ListItem::new(Line::from(Span::styled(text, style)))
}

/// Selection marker for a row, sized to the table's mode.
fn marker(table: &TableState, key: &str) -> String {
    match table.select_mode() {
        SelectMode::Radio => {
            if table.is_selected(key) { "(*) ".to_owned() } else { "( ) ".to_owned() }
        },
        SelectMode::Multi => {
            if table.is_selected(key) { "[x] ".to_owned() } else { "[ ] ".to_owned() }
        },
        SelectMode::None | SelectMode::Single => String::new(),
    }
}

fn marker_blank(mode: SelectMode) -> &'static str {
    if mode.has_marker() { "    " } else { "" }
}

fn row_key_at(table: &TableState, index: usize) -> String {
    table.rows()[index]
        .row_key()
        .map_or_else(|| format!("row-{index}"), str::to_owned)
}

/// Widest cell per column, floored by the header width.
fn column_widths(table: &TableState) -> Vec<usize> {
    table
        .columns()
        .iter()
        .map(|column| {
            table
                .rows()
                .iter()
                .filter_map(|row| row.value(column))
                .map(str::len)
                .fold(column.len(), usize::max)
        })
        .collect()
}
