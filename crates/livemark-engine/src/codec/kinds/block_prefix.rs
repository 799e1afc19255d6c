//! Line prefixes that introduce single-line blocks.

use std::sync::OnceLock;

use regex::Regex;

/// `#`..`####` headings.
pub struct Heading;

static HEADING_REGEX: OnceLock<Regex> = OnceLock::new();

impl Heading {
    pub const MARK: char = '#';
    pub const MAX_LEVEL: usize = 4;

    pub fn prefix(level: usize) -> String {
        format!("{} ", Self::MARK.to_string().repeat(level))
    }

    /// `(level, content_offset)` when `line` is a heading.
    pub fn strip(line: &str) -> Option<(usize, usize)> {
        let regex = HEADING_REGEX
            .get_or_init(|| Regex::new(r"^(#{1,4}) ").expect("Invalid heading regex"));
        let caps = regex.captures(line)?;
        let level = caps.get(1)?.len();
        Some((level, caps.get(0)?.end()))
    }
}

/// Single-line `> ` quote.
pub struct BlockQuote;

impl BlockQuote {
    pub const PREFIX: &'static str = "> ";

    pub fn strip(line: &str) -> Option<usize> {
        line.starts_with(Self::PREFIX).then_some(Self::PREFIX.len())
    }
}

/// `* ` and `1. ` list items.
pub struct ListItem;

static ORDERED_REGEX: OnceLock<Regex> = OnceLock::new();

impl ListItem {
    pub const BULLET: &'static str = "* ";
    /// Emitted for every ordered item; any number is accepted on input.
    pub const ORDERED: &'static str = "1. ";

    pub fn prefix(ordered: bool) -> &'static str {
        if ordered { Self::ORDERED } else { Self::BULLET }
    }

    /// `(ordered, content_offset)` when `line` is a list item.
    pub fn strip(line: &str) -> Option<(bool, usize)> {
        if line.starts_with(Self::BULLET) {
            return Some((false, Self::BULLET.len()));
        }
        let regex = ORDERED_REGEX
            .get_or_init(|| Regex::new(r"^\d+\. ").expect("Invalid ordered list regex"));
        regex.find(line).map(|m| (true, m.end()))
    }
}
