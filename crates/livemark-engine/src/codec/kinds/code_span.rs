/// Code span inline type with owned delimiter constants.
///
/// Code spans are raw zones: nothing inside them is parsed as markup.
pub struct CodeSpan;

impl CodeSpan {
    pub const TICK: &'static str = "`";
    /// Used when the code itself contains a backtick.
    pub const DOUBLE_TICK: &'static str = "``";

    /// Delimiter to emit around `content`.
    pub fn delimiter_for(content: &str) -> &'static str {
        if content.contains('`') {
            Self::DOUBLE_TICK
        } else {
            Self::TICK
        }
    }
}
