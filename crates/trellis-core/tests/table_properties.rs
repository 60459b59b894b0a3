//! Property-based tests for the table state machine.
//!
//! Tests verify that invariants hold under arbitrary key sequences and
//! arbitrary row-set replacements.

use std::collections::BTreeSet;

use proptest::prelude::*;
use trellis_core::{DisplayLine, KeyInput, SelectMode, TableRow, TableState};

/// Generate random table-relevant key events.
fn key_strategy() -> impl Strategy<Value = KeyInput> {
    prop_oneof![
        3 => Just(KeyInput::Up),
        3 => Just(KeyInput::Down),
        1 => Just(KeyInput::Home),
        1 => Just(KeyInput::End),
        3 => Just(KeyInput::Char(' ')),
        2 => Just(KeyInput::Enter),
        1 => Just(KeyInput::Char('/')),
        1 => Just(KeyInput::Esc),
        1 => Just(KeyInput::Backspace),
        2 => "[a-z]".prop_map(|s| KeyInput::Char(s.chars().next().unwrap_or('a'))),
    ]
}

/// Generate a row set with keys drawn from a small pool, so replacements
/// overlap the previous set often enough to exercise reconciliation.
fn rows_strategy() -> impl Strategy<Value = Vec<TableRow>> {
    prop::collection::btree_set(0u8..12, 0..8).prop_map(|ids| {
        ids.into_iter()
            .map(|id| {
                let status = if id % 2 == 0 { "Running" } else { "Stopped" };
                TableRow::new([
                    ("Service", format!("svc-{id}")),
                    ("Status", status.to_owned()),
                ])
                .layer(if id < 6 { "Prod" } else { "Dev" })
                .key(format!("key-{id}"))
            })
            .collect()
    })
}

fn mode_strategy() -> impl Strategy<Value = SelectMode> {
    prop_oneof![
        Just(SelectMode::None),
        Just(SelectMode::Single),
        Just(SelectMode::Radio),
        Just(SelectMode::Multi),
    ]
}

fn key_set(table: &TableState) -> BTreeSet<String> {
    table
        .rows()
        .iter()
        .filter_map(|row| row.row_key().map(str::to_owned))
        .collect()
}

/// Check every structural invariant of a table state.
fn check_invariants(table: &TableState) -> Result<(), TestCaseError> {
    let keys = key_set(table);

    // Selection only references rows that exist.
    for selected in table.selected_keys() {
        prop_assert!(keys.contains(selected), "selection references missing key {selected}");
    }

    // Exclusive modes keep at most one row selected.
    if table.select_mode().is_exclusive() {
        prop_assert!(table.selected_keys().len() <= 1);
    }
    if table.select_mode() == SelectMode::None {
        prop_assert!(table.selected_keys().is_empty());
    }

    // The cursor sits on an existing, visible row whenever one exists.
    let visible = table.visible_indices();
    if let Some(cursor) = table.cursor_key() {
        prop_assert!(keys.contains(cursor), "cursor on missing key {cursor}");
    } else {
        prop_assert!(visible.is_empty(), "cursor lost despite visible rows");
    }

    // Display lines reference exactly the visible rows, in order, and
    // headers appear only at layer changes.
    let line_rows: Vec<usize> = table
        .display_lines()
        .iter()
        .filter_map(|line| match line {
            DisplayLine::Row { index } => Some(*index),
            DisplayLine::LayerHeader(_) => None,
        })
        .collect();
    prop_assert_eq!(&line_rows, &visible);

    let mut previous_layer: Option<&str> = None;
    for line in &table.display_lines() {
        match line {
            DisplayLine::LayerHeader(header) => {
                prop_assert!(previous_layer != Some(header.as_str()), "duplicate header");
            },
            DisplayLine::Row { index } => {
                previous_layer = table.rows()[*index].layer_name();
            },
        }
    }

    Ok(())
}

proptest! {
    #[test]
    fn prop_invariants_hold_under_arbitrary_keys(
        mode in mode_strategy(),
        rows in rows_strategy(),
        keys in prop::collection::vec(key_strategy(), 0..60),
    ) {
        let mut table = TableState::new(
            vec!["Service".into(), "Status".into()],
            rows,
            mode,
        )
        .filterable(true);

        check_invariants(&table)?;
        for key in keys {
            let _ = table.handle_key(key);
            check_invariants(&table)?;
        }
    }

    #[test]
    fn prop_set_rows_preserves_selection_intersection(
        rows in rows_strategy(),
        replacement in rows_strategy(),
        keys in prop::collection::vec(key_strategy(), 0..30),
    ) {
        let mut table = TableState::new(
            vec!["Service".into(), "Status".into()],
            rows,
            SelectMode::Multi,
        );
        for key in keys {
            let _ = table.handle_key(key);
        }

        let before: BTreeSet<String> = table.selected_keys().clone();
        let new_keys: BTreeSet<String> = replacement
            .iter()
            .filter_map(|row| row.row_key().map(str::to_owned))
            .collect();
        table.set_rows(replacement);

        let expected: BTreeSet<String> =
            before.intersection(&new_keys).cloned().collect();
        prop_assert_eq!(table.selected_keys(), &expected);
        check_invariants(&table)?;
    }

    #[test]
    fn prop_cursor_survives_replacement_when_key_persists(
        rows in rows_strategy(),
        extra in rows_strategy(),
        keys in prop::collection::vec(key_strategy(), 0..30),
    ) {
        let mut table = TableState::new(
            vec!["Service".into(), "Status".into()],
            rows.clone(),
            SelectMode::Multi,
        );
        for key in keys {
            let _ = table.handle_key(key);
        }

        let cursor_before = table.cursor_key().map(str::to_owned);

        // Keep every old row, append new ones: the cursor must not move.
        let mut replacement = rows;
        let existing: BTreeSet<String> = replacement
            .iter()
            .filter_map(|row| row.row_key().map(str::to_owned))
            .collect();
        replacement.extend(extra.into_iter().filter(|row| {
            row.row_key().is_some_and(|key| !existing.contains(key))
        }));
        table.set_rows(replacement);

        if let Some(cursor) = cursor_before {
            // Filter text also persists, so the old cursor may have been
            // hidden only if it was already hidden before, which reanchor
            // rules out.
            prop_assert_eq!(table.cursor_key(), Some(cursor.as_str()));
        }
        check_invariants(&table)?;
    }
}
