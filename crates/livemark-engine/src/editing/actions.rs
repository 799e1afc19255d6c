use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;
use crate::tree::{BlockTag, CosmeticTag};

/// A user-level editing action, as bound to a key or an edit-bar button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ChangeBlock(BlockTag),
    ToggleInline(CosmeticTag),
    ToggleMarkdown,
    SelectBlock,
    InsertImage,
}

impl Action {
    pub const MARKDOWN: &'static str = "markdown";
    pub const ALL: &'static str = "all";
    pub const IMG: &'static str = "img";

    pub fn name(self) -> &'static str {
        match self {
            Action::ChangeBlock(tag) => tag.name(),
            Action::ToggleInline(tag) => tag.name(),
            Action::ToggleMarkdown => Self::MARKDOWN,
            Action::SelectBlock => Self::ALL,
            Action::InsertImage => Self::IMG,
        }
    }

    /// Whether the action may run while the caret is in a markdown view.
    pub fn allowed_in_markdown_view(self) -> bool {
        matches!(self, Action::ToggleMarkdown | Action::SelectBlock)
    }
}

impl FromStr for Action {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::MARKDOWN => Ok(Action::ToggleMarkdown),
            Self::ALL => Ok(Action::SelectBlock),
            Self::IMG => Ok(Action::InsertImage),
            _ => BlockTag::from_name(s)
                .map(Action::ChangeBlock)
                .or_else(|| CosmeticTag::from_name(s).map(Action::ToggleInline))
                .ok_or_else(|| EngineError::UnknownAction(s.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
