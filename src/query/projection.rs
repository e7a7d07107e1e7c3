//! Select specification parsing and column projection
//!
//! A select specification is a comma-separated list of plain columns and
//! join expressions:
//!
//! ```text
//! id, ai_summary, post:posts (id, source, title)
//! ```

use std::sync::OnceLock;

use regex::Regex;

use crate::storage::Row;

/// `alias:table(col, ...)`, whitespace allowed before the parenthesis
const JOIN_PATTERN: &str = r"(\w+):(\w+)\s*\(([^)]+)\)";

static JOIN_REGEX: OnceLock<Regex> = OnceLock::new();

fn join_regex() -> &'static Regex {
    JOIN_REGEX.get_or_init(|| Regex::new(JOIN_PATTERN).expect("join pattern is a valid regex"))
}

/// One-level foreign-key join declared in a select specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    /// Key the related row is attached under; FK column is `<alias>_id`
    pub alias: String,
    /// Related table
    pub table: String,
    /// Columns projected from the related row
    pub columns: Vec<String>,
}

impl JoinSpec {
    /// Foreign key column on the source row
    pub fn foreign_key(&self) -> String {
        format!("{}_id", self.alias)
    }
}

/// Parsed select specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Plain columns; `["*"]` selects everything
    pub columns: Vec<String>,
    /// Joins, in declaration order
    pub joins: Vec<JoinSpec>,
}

impl Selection {
    /// Select every column, no joins
    pub fn all() -> Self {
        Self {
            columns: vec!["*".to_string()],
            joins: Vec::new(),
        }
    }

    /// Parse a select specification.
    ///
    /// Join expressions are extracted first; the remainder is split on
    /// commas, trimmed, and empty entries dropped. No plain columns left
    /// means `*`.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if spec.is_empty() || spec == "*" {
            return Self::all();
        }

        let mut joins = Vec::new();
        for caps in join_regex().captures_iter(spec) {
            joins.push(JoinSpec {
                alias: caps[1].to_string(),
                table: caps[2].to_string(),
                columns: split_columns(&caps[3]),
            });
        }

        let remainder = join_regex().replace_all(spec, "");
        let mut columns = split_columns(&remainder);
        if columns.is_empty() {
            columns.push("*".to_string());
        }

        Self { columns, joins }
    }
}

fn split_columns(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns a new row holding only the requested columns.
///
/// Unknown columns are omitted. An empty list, or one containing `*`,
/// copies the whole row.
pub fn pick_columns(row: &Row, columns: &[String]) -> Row {
    if columns.is_empty() || columns.iter().any(|c| c == "*") {
        return row.clone();
    }

    let mut picked = Row::new();
    for column in columns {
        if let Some(value) = row.get(column) {
            picked.insert(column.clone(), value.clone());
        }
    }
    picked
}
