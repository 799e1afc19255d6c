use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use livemark_config::Config;
use livemark_engine::{
    CosmeticTag, Direction, Editor, Host, NodeId, Position, Selection, Tree, decode, encode,
    toggle_inline,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/livemark/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log engine decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a file and print its tree and the caret
    Parse {
        file: PathBuf,
        /// Caret as a character offset into the file
        #[arg(long, default_value_t = 0)]
        caret: usize,
        /// Print the tree as JSON instead of outline notation
        #[arg(long)]
        json: bool,
    },
    /// Decode then encode a file; fails if the text is not already canonical
    Roundtrip {
        file: PathBuf,
        #[arg(long, default_value_t = 0)]
        caret: usize,
    },
    /// Toggle a cosmetic tag at the caret and print the result
    Toggle {
        file: PathBuf,
        /// strong, em, code, del, a, sup or sub
        #[arg(long)]
        tag: String,
        #[arg(long)]
        caret: usize,
        /// Extend the selection by this many characters within the caret's text
        #[arg(long, default_value_t = 0)]
        extend: usize,
    },
    /// Replay key presses through the keymap and print the document
    Press {
        file: PathBuf,
        #[arg(long, default_value_t = 0)]
        caret: usize,
        /// Keys as named in the keymap, e.g. `b` or `ArrowUp`
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Print the effective keymap
    Keys,
}

/// Holds the selection for a scripted session.
#[derive(Default)]
struct ScriptHost {
    selection: Option<Selection>,
}

impl Host for ScriptHost {
    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    fn block_replaced(&mut self, old: NodeId, new_blocks: &[NodeId]) {
        log::debug!("block {old:?} replaced by {new_blocks:?}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    match cli.command {
        Commands::Parse { file, caret, json } => parse_command(&file, caret, json),
        Commands::Roundtrip { file, caret } => roundtrip_command(&file, caret),
        Commands::Toggle {
            file,
            tag,
            caret,
            extend,
        } => toggle_command(&file, &tag, caret, extend),
        Commands::Press { file, caret, keys } => press_command(cli.config, &file, caret, &keys),
        Commands::Keys => keys_command(cli.config),
    }
}

fn read(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(Config::config_path);
    log::info!("Config path: {}", path.display());
    Ok(Config::load_or_default(&path)?)
}

fn print_outline(tree: &Tree) {
    for block in tree.outline_children(tree.root()) {
        println!("{block}");
    }
}

fn describe(tree: &Tree, position: Position) -> String {
    let text = tree.text(position.node).unwrap_or_default();
    format!("{text:?} @ {}", position.offset)
}

fn outline_json(tree: &Tree) -> Result<String> {
    serde_json::to_string_pretty(&tree.outline_children(tree.root()))
        .context("serializing document tree")
}

fn parse_command(file: &Path, caret: usize, json: bool) -> Result<()> {
    let text = read(file)?;
    let decoded = decode(&text, caret);
    if json {
        println!("{}", outline_json(&decoded.tree)?);
    } else {
        print_outline(&decoded.tree);
    }
    println!("caret: {}", describe(&decoded.tree, decoded.position));
    for d in &decoded.diagnostics {
        eprintln!("warning: {d}");
    }
    Ok(())
}

fn roundtrip_command(file: &Path, caret: usize) -> Result<()> {
    let text = read(file)?;
    let decoded = decode(&text, caret);
    let encoded = encode(&decoded.tree, decoded.tree.root(), Some(decoded.position))
        .context("encoding decoded document")?;
    print!("{}", encoded.text);
    if let Some(c) = encoded.caret {
        println!("caret: {caret} -> {c}");
    }
    if encoded.text != text {
        bail!("{} is not in canonical form", file.display());
    }
    Ok(())
}

fn toggle_command(file: &Path, tag: &str, caret: usize, extend: usize) -> Result<()> {
    let tag = CosmeticTag::from_name(tag).with_context(|| format!("unknown tag `{tag}`"))?;
    let text = read(file)?;
    let mut decoded = decode(&text, caret);
    let anchor = decoded.position;
    let selection = Selection::new(
        anchor,
        Position::new(anchor.node, anchor.offset + extend),
        Direction::Forward,
    );
    let position = toggle_inline(&mut decoded.tree, tag, selection)
        .with_context(|| format!("toggling {}", tag.name()))?;
    let encoded = encode(&decoded.tree, decoded.tree.root(), Some(position))?;
    print!("{}", encoded.text);
    if let Some(c) = encoded.caret {
        println!("caret: {c}");
    }
    Ok(())
}

fn press_command(
    config: Option<PathBuf>,
    file: &Path,
    caret: usize,
    keys: &[String],
) -> Result<()> {
    let config = load_config(config)?;
    let keymap = config.keymap()?;
    let text = read(file)?;
    let mut editor = Editor::from_markdown(
        &text,
        caret,
        ScriptHost::default(),
        config.editor_options(),
    )?;
    for key in keys {
        if !editor
            .handle_key(&keymap, key)
            .with_context(|| format!("pressing `{key}`"))?
        {
            bail!("no action bound to `{key}`");
        }
    }
    editor.caret_moved()?;
    print!("{}", editor.to_markdown());
    if let Some(selection) = editor.host().selection() {
        println!("caret: {}", describe(editor.tree(), selection.head()));
    }
    Ok(())
}

fn keys_command(config: Option<PathBuf>) -> Result<()> {
    let keymap = load_config(config)?.keymap()?;
    for (key, action) in keymap.iter() {
        println!("{key}\t{action}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use livemark_engine::Outline;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_toggle_arguments() {
        let cli = Cli::parse_from(["livemark", "toggle", "a.md", "--tag", "em", "--caret", "3"]);
        assert!(matches!(
            cli.command,
            Commands::Toggle { caret: 3, extend: 0, ref tag, .. } if tag == "em"
        ));
    }

    #[test]
    fn outline_serializes_as_json() {
        let tree = decode("# a [b](u)", 0).tree;
        let json: serde_json::Value = serde_json::from_str(&outline_json(&tree).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"element": {"tag": "h1", "children": [
                    {"text": "a "},
                    {"element": {
                        "tag": "a",
                        "attributes": {"href": "u"},
                        "children": [{"text": "b"}]
                    }}
                ]}}
            ])
        );
    }

    #[test]
    fn outline_is_printable() {
        let tree = decode("a **b**", 0).tree;
        let blocks: Vec<String> = tree
            .outline_children(tree.root())
            .iter()
            .map(Outline::to_string)
            .collect();
        assert_eq!(blocks, vec![r#"p("a ", strong("b"))"#]);
    }
}
