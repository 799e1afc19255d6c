use std::sync::OnceLock;

use regex::Regex;

/// `[text](href)` links and whole-line `![alt](src)` images.
pub struct Link;

impl Link {
    pub const OPEN: &'static str = "[";
    pub const MIDDLE: &'static str = "](";
    pub const CLOSE: &'static str = ")";

    pub fn suffix(href: &str) -> String {
        format!("{}{href}{}", Self::MIDDLE, Self::CLOSE)
    }
}

pub struct Image;

static IMAGE_LINE_REGEX: OnceLock<Regex> = OnceLock::new();

/// Byte ranges of an image line's parts, relative to the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLine {
    pub alt: (usize, usize),
    pub src: (usize, usize),
}

impl Image {
    pub const OPEN: &'static str = "![";

    pub fn suffix(src: &str) -> String {
        format!("{}{src}{}\n", Link::MIDDLE, Link::CLOSE)
    }

    pub fn parse_line(line: &str) -> Option<ImageLine> {
        let regex = IMAGE_LINE_REGEX.get_or_init(|| {
            Regex::new(r"^!\[(.*)\]\(([^()\s]*)\)\s*$").expect("Invalid image line regex")
        });
        let caps = regex.captures(line)?;
        let alt = caps.get(1)?;
        let src = caps.get(2)?;
        Some(ImageLine {
            alt: (alt.start(), alt.end()),
            src: (src.start(), src.end()),
        })
    }
}
