//! Materialized rows and the template-row -> rows maps built by the row-expansion engine.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A concrete (materialized) row, identified by its 0-based row number on the sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(u32);

impl Row {
    pub const fn new(row_num: u32) -> Self {
        Self(row_num)
    }

    pub const fn row_num(self) -> u32 {
        self.0
    }
}

/// Ordered mapping from a template row number to the rows it was materialized into.
///
/// Several maps can be active at once (nested repeating regions); see [`resolve_rows`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowExpansionMap {
    rows: BTreeMap<u32, Vec<Row>>,
}

impl RowExpansionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rows recorded for `template_row` verbatim.
    pub fn insert(&mut self, template_row: u32, rows: Vec<Row>) {
        if rows.is_empty() {
            self.rows.remove(&template_row);
        } else {
            self.rows.insert(template_row, rows);
        }
    }

    /// Record that `template_row` produced `row`. A row already listed for the template is not
    /// added twice.
    pub fn insert_row(&mut self, template_row: u32, row: Row) {
        let rows = self.rows.entry(template_row).or_default();
        if !rows.contains(&row) {
            rows.push(row);
        }
    }

    /// Forget that `template_row` produced `row`. Returns whether it was present.
    pub fn remove_row(&mut self, template_row: u32, row: Row) -> bool {
        let Some(rows) = self.rows.get_mut(&template_row) else {
            return false;
        };
        let before = rows.len();
        rows.retain(|r| *r != row);
        let removed = rows.len() != before;
        if rows.is_empty() {
            self.rows.remove(&template_row);
        }
        removed
    }

    /// Add every row of `other` with [`RowExpansionMap::insert_row`].
    pub fn merge(&mut self, other: &RowExpansionMap) {
        for (&template_row, rows) in &other.rows {
            for &row in rows {
                self.insert_row(template_row, row);
            }
        }
    }

    pub fn get(&self, template_row: u32) -> Option<&[Row]> {
        self.rows.get(&template_row).map(Vec::as_slice)
    }

    pub fn contains_template_row(&self, template_row: u32) -> bool {
        self.rows.contains_key(&template_row)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[Row])> + '_ {
        self.rows.iter().map(|(&k, v)| (k, v.as_slice()))
    }

    /// Number of template rows with an entry.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<(u32, Vec<Row>)> for RowExpansionMap {
    fn from_iter<I: IntoIterator<Item = (u32, Vec<Row>)>>(iter: I) -> Self {
        let mut map = RowExpansionMap::new();
        for (template_row, rows) in iter {
            map.insert(template_row, rows);
        }
        map
    }
}

/// Rows that `template_row` expands to across the active `maps`.
///
/// Maps are consulted in order. When exactly one map has an entry its list is returned as is
/// (borrowed, duplicates included). When several do, the first list is kept and rows from later
/// lists are appended unless already present. No entry at all yields an empty slice, which
/// callers treat as "leave the reference alone".
pub fn resolve_rows<'a>(template_row: u32, maps: &[&'a RowExpansionMap]) -> Cow<'a, [Row]> {
    let mut matches = maps.iter().copied().filter_map(|map| map.get(template_row));

    let Some(first) = matches.next() else {
        return Cow::Borrowed(&[]);
    };

    let mut merged: Option<Vec<Row>> = None;
    for rows in matches {
        let all = merged.get_or_insert_with(|| first.to_vec());
        for &row in rows {
            if !all.contains(&row) {
                all.push(row);
            }
        }
    }

    match merged {
        Some(all) => Cow::Owned(all),
        None => Cow::Borrowed(first),
    }
}
