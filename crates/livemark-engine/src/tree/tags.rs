//! Element tags.
//!
//! Tags are split by role: block tags occupy their own line region,
//! cosmetic tags wrap inline content, structural tags only ever appear
//! inside list and table containers.

use serde::Serialize;

/// A structural element occupying its own line/region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
    H1,
    H2,
    H3,
    H4,
    P,
    Ul,
    Ol,
    Pre,
    Blockquote,
    Table,
    Img,
}

impl BlockTag {
    pub const ALL: [BlockTag; 11] = [
        BlockTag::H1,
        BlockTag::H2,
        BlockTag::H3,
        BlockTag::H4,
        BlockTag::P,
        BlockTag::Ul,
        BlockTag::Ol,
        BlockTag::Pre,
        BlockTag::Blockquote,
        BlockTag::Table,
        BlockTag::Img,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BlockTag::H1 => "h1",
            BlockTag::H2 => "h2",
            BlockTag::H3 => "h3",
            BlockTag::H4 => "h4",
            BlockTag::P => "p",
            BlockTag::Ul => "ul",
            BlockTag::Ol => "ol",
            BlockTag::Pre => "pre",
            BlockTag::Blockquote => "blockquote",
            BlockTag::Table => "table",
            BlockTag::Img => "img",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Heading level for `h1..h4`.
    pub fn heading_level(self) -> Option<usize> {
        match self {
            BlockTag::H1 => Some(1),
            BlockTag::H2 => Some(2),
            BlockTag::H3 => Some(3),
            BlockTag::H4 => Some(4),
            _ => None,
        }
    }

    pub fn heading(level: usize) -> Option<Self> {
        match level {
            1 => Some(BlockTag::H1),
            2 => Some(BlockTag::H2),
            3 => Some(BlockTag::H3),
            4 => Some(BlockTag::H4),
            _ => None,
        }
    }

    pub fn is_list(self) -> bool {
        matches!(self, BlockTag::Ul | BlockTag::Ol)
    }
}

/// An inline formatting wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CosmeticTag {
    Strong,
    Em,
    Code,
    Del,
    A,
    Sup,
    Sub,
}

impl CosmeticTag {
    pub const ALL: [CosmeticTag; 7] = [
        CosmeticTag::Strong,
        CosmeticTag::Em,
        CosmeticTag::Code,
        CosmeticTag::Del,
        CosmeticTag::A,
        CosmeticTag::Sup,
        CosmeticTag::Sub,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CosmeticTag::Strong => "strong",
            CosmeticTag::Em => "em",
            CosmeticTag::Code => "code",
            CosmeticTag::Del => "del",
            CosmeticTag::A => "a",
            CosmeticTag::Sup => "sup",
            CosmeticTag::Sub => "sub",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// The tag that may not coexist with this one at a single point.
    pub fn exclusive_with(self) -> Option<Self> {
        match self {
            CosmeticTag::Sup => Some(CosmeticTag::Sub),
            CosmeticTag::Sub => Some(CosmeticTag::Sup),
            _ => None,
        }
    }
}

/// Interior of list and table containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StructuralTag {
    Li,
    Thead,
    Tbody,
    Tr,
    Th,
    Td,
}

impl StructuralTag {
    pub fn name(self) -> &'static str {
        match self {
            StructuralTag::Li => "li",
            StructuralTag::Thead => "thead",
            StructuralTag::Tbody => "tbody",
            StructuralTag::Tr => "tr",
            StructuralTag::Th => "th",
            StructuralTag::Td => "td",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Tag {
    Block(BlockTag),
    Cosmetic(CosmeticTag),
    Structural(StructuralTag),
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Tag::Block(t) => t.name(),
            Tag::Cosmetic(t) => t.name(),
            Tag::Structural(t) => t.name(),
        }
    }

    pub fn as_block(self) -> Option<BlockTag> {
        match self {
            Tag::Block(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_cosmetic(self) -> Option<CosmeticTag> {
        match self {
            Tag::Cosmetic(t) => Some(t),
            _ => None,
        }
    }
}

impl From<BlockTag> for Tag {
    fn from(t: BlockTag) -> Self {
        Tag::Block(t)
    }
}

impl From<CosmeticTag> for Tag {
    fn from(t: CosmeticTag) -> Self {
        Tag::Cosmetic(t)
    }
}

impl From<StructuralTag> for Tag {
    fn from(t: StructuralTag) -> Self {
        Tag::Structural(t)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_names_round_trip() {
        for tag in BlockTag::ALL {
            assert_eq!(BlockTag::from_name(tag.name()), Some(tag));
        }
        assert_eq!(BlockTag::from_name("h5"), None);
    }

    #[test]
    fn cosmetic_names_round_trip() {
        for tag in CosmeticTag::ALL {
            assert_eq!(CosmeticTag::from_name(tag.name()), Some(tag));
        }
    }

    #[test]
    fn heading_levels() {
        assert_eq!(BlockTag::heading(3), Some(BlockTag::H3));
        assert_eq!(BlockTag::heading(5), None);
        assert_eq!(BlockTag::H4.heading_level(), Some(4));
        assert_eq!(BlockTag::P.heading_level(), None);
    }

    #[test]
    fn sup_and_sub_exclude_each_other() {
        assert_eq!(CosmeticTag::Sup.exclusive_with(), Some(CosmeticTag::Sub));
        assert_eq!(CosmeticTag::Sub.exclusive_with(), Some(CosmeticTag::Sup));
        assert_eq!(CosmeticTag::Strong.exclusive_with(), None);
    }
}
