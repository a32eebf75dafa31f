//! Keyed change lists between two row sequences.

use std::collections::HashSet;

use crate::row::DisplayRow;

/// One step of turning an old row list into a new one.
///
/// Indices refer to the list as it stands when the change is applied, so
/// changes must be applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowChange {
    Remove { index: usize },
    Insert { index: usize, row: DisplayRow },
    Move { from: usize, to: usize },
    /// Same identity, different contents.
    Update { index: usize, row: DisplayRow },
}

/// Compute the changes that turn `old` into `new`, matching rows by key.
///
/// Rows whose key is gone are removed first, from the back. The remaining
/// list is then walked against `new`: kept rows are moved into place and
/// updated if their contents changed, new keys are inserted.
pub fn diff_rows(old: &[DisplayRow], new: &[DisplayRow]) -> Vec<RowChange> {
    let new_keys: HashSet<String> = new.iter().map(DisplayRow::key).collect();
    let mut changes = Vec::new();

    let mut working: Vec<&DisplayRow> = Vec::with_capacity(old.len());
    let mut removed = Vec::new();
    for (index, row) in old.iter().enumerate() {
        if new_keys.contains(&row.key()) {
            working.push(row);
        } else {
            removed.push(index);
        }
    }
    changes.extend(
        removed
            .into_iter()
            .rev()
            .map(|index| RowChange::Remove { index }),
    );

    for (index, row) in new.iter().enumerate() {
        let key = row.key();
        let found = working[index..]
            .iter()
            .position(|r| r.key() == key)
            .map(|offset| index + offset);

        match found {
            Some(from) => {
                if from != index {
                    let moved = working.remove(from);
                    working.insert(index, moved);
                    changes.push(RowChange::Move { from, to: index });
                }
                if working[index] != row {
                    changes.push(RowChange::Update {
                        index,
                        row: row.clone(),
                    });
                }
            }
            None => {
                working.insert(index, row);
                changes.push(RowChange::Insert {
                    index,
                    row: row.clone(),
                });
            }
        }
    }

    changes
}

/// Apply `changes` to `rows` in order.
pub fn apply(rows: &mut Vec<DisplayRow>, changes: &[RowChange]) {
    for change in changes {
        match change {
            RowChange::Remove { index } => {
                rows.remove(*index);
            }
            RowChange::Insert { index, row } => rows.insert(*index, row.clone()),
            RowChange::Move { from, to } => {
                let row = rows.remove(*from);
                rows.insert(*to, row);
            }
            RowChange::Update { index, row } => rows[*index] = row.clone(),
        }
    }
}
