use crate::tree::CosmeticTag;

/// Inline markup enclosed by a fixed opener and closer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimited {
    pub tag: CosmeticTag,
    pub open: &'static str,
    pub close: &'static str,
}

impl Delimited {
    /// Recognised on input, in precedence order. `**` must precede `*`.
    pub const INPUT: [Delimited; 7] = [
        Delimited::new(CosmeticTag::Strong, "**", "**"),
        Delimited::new(CosmeticTag::Em, "*", "*"),
        Delimited::new(CosmeticTag::Em, "_", "_"),
        Delimited::new(CosmeticTag::Del, "~~", "~~"),
        Delimited::new(CosmeticTag::Del, "~", "~"),
        Delimited::new(CosmeticTag::Sup, "<sup>", "</sup>"),
        Delimited::new(CosmeticTag::Sub, "<sub>", "</sub>"),
    ];

    const fn new(tag: CosmeticTag, open: &'static str, close: &'static str) -> Self {
        Self { tag, open, close }
    }

    /// Delimiters the encoder emits for `tag`; `None` for code and links,
    /// whose syntax depends on content.
    pub fn output(tag: CosmeticTag) -> Option<Delimited> {
        let (open, close) = match tag {
            CosmeticTag::Strong => ("**", "**"),
            CosmeticTag::Em => ("_", "_"),
            CosmeticTag::Del => ("~", "~"),
            CosmeticTag::Sup => ("<sup>", "</sup>"),
            CosmeticTag::Sub => ("<sub>", "</sub>"),
            CosmeticTag::Code | CosmeticTag::A => return None,
        };
        Some(Self::new(tag, open, close))
    }

    /// A doubled single-char closer (`**` while looking for `*`) is not a
    /// closer.
    pub fn doubled(self) -> Option<String> {
        (self.close.len() == 1).then(|| self.close.repeat(2))
    }
}
