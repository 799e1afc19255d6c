//! # Codec
//!
//! Converts between a block subtree and its flat text form, carrying the
//! caret both ways.
//!
//! - [`encode`] walks a subtree and reports the caret as a `char` offset.
//! - [`decode`] parses text into a fresh tree and relocates the caret onto
//!   a text leaf through each leaf's source span.

pub mod decode;
pub mod encode;
pub mod kinds;
pub mod span;

pub use decode::{Decoded, decode};
pub use encode::{Encoded, MARKDOWN_VIEW_ATTR, encode, to_markdown};
pub use span::Span;
