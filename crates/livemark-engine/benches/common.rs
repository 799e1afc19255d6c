// Shared by several bench targets; each one only uses part of it.
#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "# Title\n\n## Section\n\nParagraph with **some** _content_ and `code`.\n\n* Bullet point\n* Another [item](item.md)\n\n| a | b |\n|-|-|\n| 1 | 2 |\n\n```rust\nfn example() {\n    println!(\"Hello\");\n}\n```\n\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_long_paragraph(words: usize) -> String {
    (0..words)
        .map(|i| match i % 4 {
            0 => format!("**w{i}**"),
            1 => format!("_w{i}_"),
            _ => format!("w{i}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
