use std::sync::OnceLock;

use regex::Regex;

/// Fenced code block with owned delimiter knowledge.
///
/// Only backtick fences are recognised. The opening fence may carry a
/// language tag; the closing fence is bare.
pub struct CodeFence;

static OPENER_REGEX: OnceLock<Regex> = OnceLock::new();

impl CodeFence {
    pub const BACKTICKS: &'static str = "```";

    /// If `line` opens a fence, the byte range of its language tag within
    /// `line` (empty when there is none).
    pub fn open(line: &str) -> Option<(usize, usize)> {
        let regex = OPENER_REGEX
            .get_or_init(|| Regex::new(r"^```\s*([^`\s]*)\s*$").expect("Invalid fence regex"));
        let lang = regex.captures(line)?.get(1)?;
        Some((lang.start(), lang.end()))
    }

    pub fn opener(lang: &str) -> String {
        format!("{}{lang}\n", Self::BACKTICKS)
    }

    pub fn closer() -> String {
        format!("\n{}\n", Self::BACKTICKS)
    }
}
