//! Uniform tabular results.
//!
//! Every listing operation (processes here; directories, drives and ACLs in
//! other collaborators) hands its rows to the presentation layer as a [`Table`]:
//! an ordered list of records that each expose the same named columns in the
//! same declared order.

use std::fmt::Write as _;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A row type that can be rendered as a table
///
/// `COLUMNS` fixes the column names and their order; `values` must return one
/// value per column, in that order.
pub trait TabularRecord
{
    /// Column names, in display order
    const COLUMNS: &'static [&'static str];

    /// Column values, in the same order as [`Self::COLUMNS`]
    fn values(&self) -> Vec<String>;

    /// `(name, value)` pairs in declared order
    fn fields(&self) -> Vec<(&'static str, String)>
    {
        Self::COLUMNS.iter().copied().zip(self.values()).collect()
    }
}

/// An ordered collection of uniform records
///
/// Serializes as a sequence of maps whose keys follow the declared column
/// order, and renders as whitespace-aligned text for terminals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table
{
    columns: &'static [&'static str],
    rows: Vec<Vec<String>>,
}

impl Table
{
    /// Collect records into a table, preserving their order
    pub fn from_records<'a, R, I>(records: I) -> Self
    where
        R: TabularRecord + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        Self {
            columns: R::COLUMNS,
            rows: records.into_iter().map(TabularRecord::values).collect(),
        }
    }

    /// Column names
    #[must_use]
    pub fn columns(&self) -> &[&'static str]
    {
        self.columns
    }

    /// Row values, one `Vec` per record
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>]
    {
        &self.rows
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.rows.len()
    }

    /// Whether the table has no records
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.rows.is_empty()
    }

    /// Render as left-aligned text columns separated by two spaces
    #[must_use]
    pub fn render(&self) -> String
    {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (width, value) in widths.iter_mut().zip(row) {
                *width = (*width).max(value.chars().count());
            }
        }

        let mut out = String::new();
        let header: Vec<String> = self.columns.iter().map(|c| (*c).to_string()).collect();
        push_line(&mut out, &header, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &rule, &widths);
        for row in &self.rows {
            push_line(&mut out, row, &widths);
        }
        out
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize])
{
    let last = cells.len().saturating_sub(1);
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i == last {
            out.push_str(cell);
        } else {
            let _ = write!(out, "{cell:<width$}  ");
        }
    }
    // Trailing padding would only come from an empty last cell
    let trimmed = out.trim_end_matches(' ').len();
    out.truncate(trimmed);
    out.push('\n');
}

struct RowRef<'a>
{
    columns: &'a [&'static str],
    values: &'a [String],
}

impl Serialize for RowRef<'_>
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>
    {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for Table
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>
    {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&RowRef {
                columns: self.columns,
                values: row,
            })?;
        }
        seq.end()
    }
}
