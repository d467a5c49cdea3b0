//! Clause-level layout for statements.
//!
//! A statement is a sequence of `<keyword> <value>` clauses. In pretty mode
//! the keywords are right-aligned on a common "river":
//!
//! ```text
//! SELECT "model_num"
//!   FROM "phones" AS "p"
//!  WHERE "p"."release_date" > '2014-09-30'
//! ```

use crate::config::PrintOptions;

#[derive(Debug, Clone)]
enum Entry {
    Clause { keyword: String, value: String },
    Raw(String),
}

/// Collects clause entries and lays them out for a [`PrintOptions`].
#[derive(Debug, Clone, Default)]
pub struct StatementPrinter {
    entries: Vec<Entry>,
}

impl StatementPrinter {
    /// Creates an empty printer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `keyword value` clause.
    pub fn add_entry(&mut self, keyword: impl Into<String>, value: impl Into<String>) {
        self.entries.push(Entry::Clause {
            keyword: keyword.into(),
            value: value.into(),
        });
    }

    /// Adds a block emitted as-is, outside the river.
    pub fn add_raw(&mut self, block: impl Into<String>) {
        self.entries.push(Entry::Raw(block.into()));
    }

    /// Returns true if nothing was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lays out the collected entries.
    #[must_use]
    pub fn finish(&self, options: &PrintOptions) -> String {
        if !options.is_pretty() {
            let parts: Vec<String> = self
                .entries
                .iter()
                .map(|entry| match entry {
                    Entry::Clause { keyword, value } => format!("{keyword} {value}"),
                    Entry::Raw(block) => block.clone(),
                })
                .collect();
            return parts.join(" ");
        }

        let rpad = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Clause { keyword, .. } => Some(keyword.chars().count()),
                Entry::Raw(_) => None,
            })
            .max()
            .unwrap_or(0);
        let lines: Vec<String> = self
            .entries
            .iter()
            .map(|entry| match entry {
                Entry::Clause { keyword, value } => {
                    format!("{keyword:>rpad$} {}", pad(value, rpad + 1))
                }
                Entry::Raw(block) => block.clone(),
            })
            .collect();
        lines.join("\n")
    }
}

/// Indents every line after the first by `spaces` columns.
///
/// Newlines inside `'...'` strings and `"..."` identifiers are data and are
/// left alone. A doubled quote closes and reopens the span, so escapes need
/// no special case.
#[must_use]
pub fn pad(input: &str, spaces: usize) -> String {
    let indent = " ".repeat(spaces);
    let mut output = String::with_capacity(input.len());
    let mut quote: Option<char> = None;
    for c in input.chars() {
        output.push(c);
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(open), _) if c == open => quote = None,
            (None, '\n') => output.push_str(&indent),
            _ => {}
        }
    }
    output
}

/// Wraps `inner` in parentheses, shifting its continuation lines by one
/// column so they stay aligned under the opening parenthesis.
#[must_use]
pub fn parenthesize(inner: &str) -> String {
    format!("({})", pad(inner, 1))
}

/// Like [`parenthesize`], for a parenthesis that follows `prefix` on the
/// same line.
#[must_use]
pub fn parenthesize_after(prefix: &str, inner: &str) -> String {
    format!("{prefix}({})", pad(inner, prefix.chars().count() + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StatementPrinter {
        let mut printer = StatementPrinter::new();
        printer.add_entry("SELECT", "1, 2, 3");
        printer.add_entry("FROM", "t");
        printer.add_entry("WHERE", "x > y");
        printer.add_entry("ORDER", "BY x");
        printer.add_entry("LIMIT", "5");
        printer
    }

    #[test]
    fn test_default_layout() {
        assert_eq!(
            sample().finish(&PrintOptions::default()),
            "SELECT 1, 2, 3 FROM t WHERE x > y ORDER BY x LIMIT 5"
        );
    }

    #[test]
    fn test_pretty_layout() {
        assert_eq!(
            sample().finish(&PrintOptions::pretty()),
            "SELECT 1, 2, 3\n  FROM t\n WHERE x > y\n ORDER BY x\n LIMIT 5"
        );
    }

    #[test]
    fn test_continuation_lines_follow_river() {
        let mut printer = StatementPrinter::new();
        printer.add_entry("SELECT", "a");
        printer.add_entry("WHERE", "x\nAND y");
        assert_eq!(
            printer.finish(&PrintOptions::pretty()),
            "SELECT a\n WHERE x\n       AND y"
        );
    }

    #[test]
    fn test_raw_blocks_are_not_padded() {
        let mut printer = StatementPrinter::new();
        printer.add_raw("SELECT 1\nUNION\nSELECT 2");
        printer.add_entry("LIMIT", "1");
        assert_eq!(
            printer.finish(&PrintOptions::pretty()),
            "SELECT 1\nUNION\nSELECT 2\nLIMIT 1"
        );
    }

    #[test]
    fn test_pad_skips_quoted_newlines() {
        assert_eq!(pad("SELECT 'a\nb'\n  FROM t", 2), "SELECT 'a\nb'\n    FROM t");
        assert_eq!(pad("\"x\ny\"\nz", 1), "\"x\ny\"\n z");
        assert_eq!(pad("'it''s\n'\nx", 3), "'it''s\n'\n   x");
        assert_eq!(pad("\"a'b\"\n'c\"\nd'", 1), "\"a'b\"\n 'c\"\nd'");
    }

    #[test]
    fn test_quoted_newlines_survive_parenthesize() {
        assert_eq!(parenthesize("SELECT 'a\nb'"), "(SELECT 'a\nb')");
        assert_eq!(parenthesize(&parenthesize("SELECT 'a\nb'")), "((SELECT 'a\nb'))");
    }

    #[test]
    fn test_parenthesize_pads_one_column() {
        assert_eq!(parenthesize("SELECT 1\n  FROM t"), "(SELECT 1\n   FROM t)");
        assert_eq!(
            parenthesize_after("\"a\" AS ", "SELECT 1\n  FROM t"),
            "\"a\" AS (SELECT 1\n          FROM t)"
        );
    }
}
