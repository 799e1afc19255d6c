use std::sync::OnceLock;

use regex::Regex;

use super::escape::Escape;

/// Pipe-delimited tables.
///
/// A table is a run of lines that start and end with `|`. When the second
/// line is a separator (`|---|---|`) the first line is the header row.
pub struct Table;

static SEPARATOR_REGEX: OnceLock<Regex> = OnceLock::new();

impl Table {
    pub const PIPE: char = '|';
    pub const ROW_OPEN: &'static str = "| ";
    pub const CELL_GAP: &'static str = " | ";
    pub const ROW_CLOSE: &'static str = " |\n";

    pub fn is_row(line: &str) -> bool {
        let t = line.trim_end();
        t.len() >= 2
            && t.starts_with(Self::PIPE)
            && t.ends_with(Self::PIPE)
            && !Escape::is_escaped(t, t.len() - 1)
    }

    pub fn is_separator(line: &str) -> bool {
        let regex = SEPARATOR_REGEX.get_or_init(|| {
            Regex::new(r"^\|(\s*:?-+:?\s*\|)+\s*$").expect("Invalid table separator regex")
        });
        regex.is_match(line)
    }

    /// Separator line for `columns` columns: `|-|-|`.
    pub fn separator(columns: usize) -> String {
        let mut out = String::from("|");
        for _ in 0..columns.max(1) {
            out.push_str("-|");
        }
        out.push('\n');
        out
    }

    /// Raw (untrimmed) cell ranges of a row, relative to `line`. Escaped
    /// pipes stay inside their cell.
    pub fn split_cells(line: &str) -> Vec<(usize, usize)> {
        let t = line.trim_end();
        if !Self::is_row(t) {
            return Vec::new();
        }
        let inner_end = t.len() - Self::PIPE.len_utf8();
        let mut cells = Vec::new();
        let mut start = Self::PIPE.len_utf8();
        for (i, ch) in t[..inner_end].char_indices().skip(1) {
            if ch == Self::PIPE && !Escape::is_escaped(t, i) {
                cells.push((start, i));
                start = i + ch.len_utf8();
            }
        }
        cells.push((start, inner_end));
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("|-|-|", true)]
    #[case("| --- | :---: |", true)]
    #[case("|---|", true)]
    #[case("| a | b |", false)]
    #[case("---", false)]
    fn separators(#[case] line: &str, #[case] expected: bool) {
        assert_eq!(Table::is_separator(line), expected);
    }

    #[test]
    fn separator_for_columns() {
        assert_eq!(Table::separator(3), "|-|-|-|\n");
    }

    #[test]
    fn split_cells_keeps_raw_ranges() {
        let line = "| a | bb |";
        let cells: Vec<&str> = Table::split_cells(line)
            .into_iter()
            .map(|(s, e)| &line[s..e])
            .collect();
        assert_eq!(cells, vec![" a ", " bb "]);
    }

    #[test]
    fn escaped_pipe_is_cell_content() {
        let line = r"| a \| b | c |";
        let cells: Vec<&str> = Table::split_cells(line)
            .into_iter()
            .map(|(s, e)| &line[s..e])
            .collect();
        assert_eq!(cells, vec![r" a \| b ", " c "]);
        assert!(!Table::is_row(r"| a \|"));
    }

    #[test]
    fn single_empty_cell() {
        assert_eq!(Table::split_cells("||"), vec![(1, 1)]);
    }

    #[test]
    fn not_a_row() {
        assert!(!Table::is_row("a | b"));
        assert!(!Table::is_row("|"));
        assert!(Table::split_cells("a | b").is_empty());
    }
}
