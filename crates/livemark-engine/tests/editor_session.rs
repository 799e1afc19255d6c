use livemark_engine::{
    Action, BlockTag, CosmeticTag, Editor, EditorOptions, Host, Keymap, NodeId, Outline,
    Position, Selection, Tree, toggle_inline,
};
use pretty_assertions::assert_eq;

/// A surface with one selection and nothing else.
#[derive(Default)]
struct Surface {
    selection: Option<Selection>,
}

impl Host for Surface {
    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    fn block_replaced(&mut self, _old: NodeId, _new_blocks: &[NodeId]) {}
}

fn leaf(tree: &Tree, text: &str) -> NodeId {
    tree.text_leaves(tree.root())
        .into_iter()
        .find(|&l| tree.text(l) == Ok(text))
        .unwrap()
}

fn outline(tree: &Tree) -> String {
    tree.outline_children(tree.root())
        .iter()
        .map(Outline::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn toggling_strong_off_keeps_the_caret() {
    let mut tree = Tree::from_outlines(&[Outline::element(
        BlockTag::P,
        vec![Outline::element(CosmeticTag::Strong, vec![Outline::text("bold")])],
    )]);
    let bold = leaf(&tree, "bold");
    let caret = toggle_inline(
        &mut tree,
        CosmeticTag::Strong,
        Selection::caret(Position::new(bold, 2)),
    )
    .unwrap();
    assert_eq!(outline(&tree), r#"p("bold")"#);
    assert_eq!((tree.text(caret.node).unwrap(), caret.offset), ("bold", 2));
}

#[test]
fn sup_replaces_sub() {
    let mut tree = Tree::from_outlines(&[Outline::element(
        BlockTag::P,
        vec![Outline::element(CosmeticTag::Sub, vec![Outline::text("x")])],
    )]);
    let x = leaf(&tree, "x");
    toggle_inline(&mut tree, CosmeticTag::Sup, Selection::caret(Position::new(x, 0))).unwrap();
    assert_eq!(outline(&tree), r#"p(sup("x"))"#);
}

#[test]
fn toggling_twice_restores_the_tree() {
    let mut tree = livemark_engine::decode("one two three", 0).tree;
    let before = outline(&tree);
    let l = leaf(&tree, "one two three");
    let selection = Selection::new(
        Position::new(l, 4),
        Position::new(l, 7),
        livemark_engine::Direction::Forward,
    );
    let caret = toggle_inline(&mut tree, CosmeticTag::Em, selection).unwrap();
    assert_eq!(outline(&tree), r#"p("one ", em("two"), " three")"#);
    toggle_inline(&mut tree, CosmeticTag::Em, Selection::caret(caret)).unwrap();
    assert_eq!(outline(&tree), before);
}

#[test]
fn a_short_editing_session() {
    let mut ed = Editor::from_markdown(
        "intro\n\n* a\n* b",
        2,
        Surface::default(),
        EditorOptions::default(),
    )
    .unwrap();
    let keymap = Keymap::default();

    let intro = leaf(ed.tree(), "intro");
    assert_eq!(ed.host().selection, Some(Selection::caret(Position::new(intro, 2))));
    ed.handle_key(&keymap, "1").unwrap();
    ed.handle_key(&keymap, "i").unwrap();

    let b = leaf(ed.tree(), "b");
    ed.host_mut().selection = Some(Selection::caret(Position::new(b, 1)));
    ed.dispatch(Action::ChangeBlock(BlockTag::Ol)).unwrap();
    ed.dispatch(Action::ToggleMarkdown).unwrap();

    insta::assert_snapshot!(outline(ed.tree()), @r#"
    h1(em("intro"))
    pre[data-markdown="ol"]("1. a\n1. b")
    "#);

    let view_leaf = ed.host().selection.unwrap().head().node;
    ed.tree_mut().set_text(view_leaf, "1. a\n1. b\n1. c").unwrap();
    ed.host_mut().selection = Some(Selection::caret(Position::new(view_leaf, 14)));
    ed.dispatch(Action::ToggleMarkdown).unwrap();

    assert_eq!(ed.to_markdown(), "# _intro_\n\n1. a\n1. b\n1. c\n");
    let caret = ed.host().selection.unwrap().head();
    assert_eq!((ed.tree().text(caret.node).unwrap(), caret.offset), ("c", 1));
}

#[test]
fn custom_keymap_overrides_defaults() {
    let keymap = Keymap::with_overrides([("b", "del"), ("g", "img")]).unwrap();
    assert_eq!(keymap.lookup("b"), Some(Action::ToggleInline(CosmeticTag::Del)));
    assert_eq!(keymap.lookup("g"), Some(Action::InsertImage));
    assert_eq!(keymap.lookup("i"), Some(Action::ToggleInline(CosmeticTag::Em)));
    assert!(Keymap::with_overrides([("x", "bogus")]).is_err());
}

#[test]
fn selection_reported_against_offset_order() {
    let mut ed = Editor::from_markdown("hello", 0, Surface::default(), EditorOptions::default())
        .unwrap();
    let l = leaf(ed.tree(), "hello");
    ed.host_mut().selection = Some(Selection::new(
        Position::new(l, 4),
        Position::new(l, 1),
        livemark_engine::Direction::Forward,
    ));
    ed.toggle_inline(CosmeticTag::Strong).unwrap();
    assert_eq!(ed.to_markdown(), "h**ell**o\n");
    let caret = ed.host().selection.unwrap().head();
    assert_eq!((ed.tree().text(caret.node).unwrap(), caret.offset), ("ell", 3));
}
