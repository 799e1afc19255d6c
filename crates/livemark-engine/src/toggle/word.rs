use unicode_segmentation::UnicodeSegmentation;

use crate::tree::{byte_index, char_len};

/// The word at `offset` (in `char`s) of `text`, as a `char` range.
///
/// Prefers a word containing the offset, then one ending at it, then one
/// starting at it. Segments without an alphanumeric character (spaces,
/// punctuation) are never words.
pub fn word_at(text: &str, offset: usize) -> Option<(usize, usize)> {
    let at = byte_index(text, offset);
    let words: Vec<(usize, usize)> = text
        .split_word_bound_indices()
        .filter(|(_, seg)| seg.chars().any(char::is_alphanumeric))
        .map(|(start, seg)| (start, start + seg.len()))
        .collect();

    let containing = words.iter().find(|(s, e)| *s < at && at < *e);
    let ending = words.iter().find(|(_, e)| *e == at);
    let starting = words.iter().find(|(s, _)| *s == at);

    containing
        .or(ending)
        .or(starting)
        .map(|&(s, e)| (char_len(&text[..s]), char_len(&text[..e])))
}
