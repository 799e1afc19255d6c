//! # Syntax Kinds
//!
//! Each construct owns its delimiters. The encoder and decoder both call
//! these constants; neither hardcodes `**`, `` ` `` or `|`.
//!
//! - **`CodeSpan`**: `` ` `` / ``` `` ```, raw zone
//! - **`CodeFence`**: ```` ``` ```` plus optional language
//! - **`Heading`**, **`BlockQuote`**, **`ListItem`**: line prefixes
//! - **`Link`**, **`Image`**: `[text](href)`, `![alt](src)`
//! - **`Table`**: pipe rows and the `|-|` separator
//! - **`Delimited`**: strong, emphasis, strike, sup, sub
//! - **`Escape`**: backslash escapes for literal markup characters

pub mod block_prefix;
pub mod code_fence;
pub mod code_span;
pub mod delimited;
pub mod escape;
pub mod link;
pub mod table;

pub use block_prefix::{BlockQuote, Heading, ListItem};
pub use code_fence::CodeFence;
pub use code_span::CodeSpan;
pub use delimited::Delimited;
pub use escape::Escape;
pub use link::{Image, ImageLine, Link};
pub use table::Table;
