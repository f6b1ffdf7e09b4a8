use larch_parse::parse_tree;
use larch_syntax::green::{GreenElement, GreenNode};
use larch_syntax::{
    CancellationToken, Cancelled, NodeOrToken, ParseOptions, ReparseError, SyntaxKind, SyntaxTree,
    TextChange, TextRange, TextSize, apply_changes,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn parse(text: &str) -> SyntaxTree {
    parse_tree(text, ParseOptions::default())
}

/// Top-level items of a compilation unit.
fn items(tree: &SyntaxTree) -> Vec<GreenNode> {
    match tree.green().slot(0) {
        Some(NodeOrToken::Node(node)) if node.is_list() => node
            .slots()
            .flatten()
            .filter_map(|element| element.as_node().cloned())
            .collect(),
        Some(NodeOrToken::Node(node)) => vec![node.clone()],
        _ => Vec::new(),
    }
}

fn dump(tree: &SyntaxTree) -> String {
    tree.green().debug_dump(TextSize::new(0))
}

/// Reparses `old` into `new_text` and checks the result against a parse from
/// scratch.
fn reparse(old: &SyntaxTree, new_text: &str) -> SyntaxTree {
    let new = old.with_changed_text(new_text, &CancellationToken::none()).unwrap();
    let fresh = parse(new_text);
    assert_eq!(new.text(), new_text);
    assert_eq!(dump(&new), dump(&fresh), "reparse of {new_text:?} differs from a full parse");
    assert_eq!(new.diagnostics().collect::<Vec<_>>(), fresh.diagnostics().collect::<Vec<_>>());
    assert!(new.is_equivalent_to(&fresh, false));
    new
}

fn numbered_statements(n: usize) -> String {
    (0..n).map(|i| format!("int v{i} = {i};\n")).collect()
}

#[test]
fn appending_reuses_the_prefix() {
    init_tracing();
    for (before, after) in [("int x;", "int x; int y;"), ("int a;\n", "int a;\nint b;\n")] {
        let old = parse(before);
        let new = reparse(&old, after);

        let (old_items, new_items) = (items(&old), items(&new));
        assert_eq!(new_items.len(), 2);
        assert!(new_items[0].ptr_eq(&old_items[0]));
        assert!(!new_items[1].ptr_eq(&old_items[0]));
    }
}

#[test]
fn renaming_one_statement_shares_its_siblings() {
    init_tracing();
    let text = numbered_statements(50);
    let old = parse(&text);
    let new = reparse(&old, &text.replacen("v25", "w25", 1));

    let (old_items, new_items) = (items(&old), items(&new));
    assert_eq!(new_items.len(), 50);
    for (index, (old, new)) in old_items.iter().zip(&new_items).enumerate() {
        assert_eq!(old.ptr_eq(new), index != 25, "item {index}");
    }
}

#[test]
fn renaming_inside_a_method_body_shares_sibling_statements() {
    let body: String = (0..50).map(|i| format!("        int v{i} = {i};\n")).collect();
    let text = format!("class C {{\n    void m() {{\n{body}    }}\n}}\n");
    let old = parse(&text);
    let new = reparse(&old, &text.replacen("v25", "w25", 1));

    let statements = |tree: &SyntaxTree| -> Vec<GreenNode> {
        tree.root()
            .descendants()
            .filter(|node| node.kind() == SyntaxKind::VARIABLE_DECL)
            .map(|node| node.green().clone())
            .collect()
    };
    let (old_statements, new_statements) = (statements(&old), statements(&new));
    assert_eq!(new_statements.len(), 50);
    for (index, (old, new)) in old_statements.iter().zip(&new_statements).enumerate() {
        assert_eq!(old.ptr_eq(new), index != 25, "statement {index}");
    }
    assert!(!items(&new)[0].ptr_eq(&items(&old)[0]));
}

#[test]
fn edits_inside_a_function_keep_other_functions() {
    let text = "int f() {\n    return 1;\n}\n\nint g() {\n    return 2;\n}\n";
    let old = parse(text);
    let new = reparse(&old, &text.replace("return 2", "return 2 + 3"));

    let (old_items, new_items) = (items(&old), items(&new));
    assert!(new_items[0].ptr_eq(&old_items[0]));
    assert!(!new_items[1].ptr_eq(&old_items[1]));
}

#[test]
fn reparse_matches_a_full_parse() {
    let base = "#define A\nint x = 1;\nclass C {\n    int y;\n    void m(int p) { p; }\n}\n\
                #if A\nint z;\n#endif\nwhile (x < 3) { x = x; }\n";
    let edits: &[(&str, &str)] = &[
        ("int x = 1;", "int x = 1"),
        ("int y;", "int y; int w;"),
        ("#define A\n", ""),
        ("#if A", "#if !A"),
        ("class C {", "class C"),
        ("{ p; }", "{ p; /* unfinished"),
        ("int z;\n", "int z;\n#else\nbroken (\n"),
        ("while", "while\n#undef A\n"),
        ("x < 3", "x <"),
        ("x = 1", "x = \"1"),
        ("int x", "int\nx"),
        ("1;", "1; ) ) "),
    ];
    let old = parse(base);
    for (from, to) in edits {
        let new_text = base.replacen(from, to, 1);
        reparse(&old, &new_text);
    }
}

#[test]
fn changes_between_versions_round_trip() {
    let text = numbered_statements(10);
    let old = parse(&text);
    let new = reparse(&old, &text.replace("v3 = 3", "v3 = 33").replace("v7", "seven"));

    let changes = new.get_changes(&old);
    assert!(!changes.is_empty());
    assert_eq!(apply_changes(old.text(), &changes), new.text());
    assert!(new.get_changes(&new).is_empty());
}

#[test]
fn text_changes_apply_in_old_coordinates() {
    let old = parse("int a;\nint b;\n");
    let changes = [
        TextChange::new(TextRange::at(TextSize::new(4), TextSize::new(1)), "first"),
        TextChange::insert(TextSize::new(14), "int c;\n"),
    ];
    let new = old.with_text_changes(&changes, &CancellationToken::none()).unwrap();
    assert_eq!(new.text(), "int first;\nint b;\nint c;\n");
    assert_eq!(dump(&new), dump(&parse(new.text())));
}

#[test]
fn unchanged_text_returns_the_same_tree() {
    let old = parse("int a;");
    let same = old.with_changed_text("int a;", &CancellationToken::none()).unwrap();
    assert_eq!(same, old);
}

#[test]
fn equivalence_ignores_bodies_at_top_level() {
    let a = parse("int f() { return 1; }\nint x;\n");
    let b = parse("int f() { return 2 * 3; }\nint x;\n");
    let c = parse("int f() { return 1; }\nint y;\n");

    assert!(a.is_equivalent_to(&b, true));
    assert!(!a.is_equivalent_to(&b, false));
    assert!(!a.is_equivalent_to(&c, true));
    assert!(a.is_equivalent_to(&parse(a.text()), false));
}

#[test]
fn cancelled_reparse_reports_cancellation() {
    let old = parse(&numbered_statements(5));
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = old.with_changed_text("int a;", &cancel);
    assert_eq!(result.err(), Some(ReparseError::Cancelled(Cancelled)));
}

#[test]
fn widths_add_up() {
    fn check(node: &GreenNode) {
        let sum: TextSize = node.slots().flatten().map(GreenElement::full_width).sum();
        assert_eq!(node.full_width(), sum, "{:?}", node.kind());
        for child in node.slots().flatten() {
            if let NodeOrToken::Node(child) = child {
                check(child);
            }
        }
    }

    let tree = parse("class A { int f(int a, bool b) { if (a) return 1; else { f(a, b); } } }\n");
    check(tree.green());
    assert_eq!(tree.green().full_width(), tree.source_text().len());
}
