use crate::codec::kinds::Table;
use crate::codec::span::Span;
use crate::error::{EngineError, Result};

use super::classify::{LineClass, LineKind};

/// Cell content spans of a table run, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTable {
    pub head: Option<Vec<Span>>,
    pub rows: Vec<Vec<Span>>,
}

fn cells(src: &str, line: Span) -> Vec<Span> {
    Table::split_cells(line.slice(src))
        .into_iter()
        .map(|(s, e)| Span::new(line.start + s, line.start + e).trim(src))
        .collect()
}

/// Builds a table from a run of row lines. A separator in second position
/// makes the first row the header; every row must have the same number of
/// cells.
pub fn assemble(src: &str, lines: &[LineClass]) -> Result<ParsedTable> {
    let has_head = lines
        .get(1)
        .is_some_and(|l| l.kind == LineKind::TableSeparator);

    let mut rows = Vec::with_capacity(lines.len());
    let mut expected = None;
    for (index, line) in lines.iter().enumerate() {
        if has_head && index == 1 {
            continue;
        }
        let row = cells(src, line.line);
        let want = *expected.get_or_insert(row.len());
        if row.len() != want {
            return Err(EngineError::TableShape {
                row: index,
                expected: want,
                found: row.len(),
            });
        }
        rows.push(row);
    }

    let head = if has_head && !rows.is_empty() {
        Some(rows.remove(0))
    } else {
        None
    };
    Ok(ParsedTable { head, rows })
}
