use std::sync::Arc;

use larch_parse::{LarchParser, parse_tree};
use larch_syntax::green::{GreenNode, GreenToken, GreenTrivia, GreenTriviaList};
use larch_syntax::{
    CancellationToken, Cancelled, ErrorCode, ParseOptions, ReportState, SyntaxKind, SyntaxNode,
    SyntaxTree, TextSize, apply_changes,
};

fn parse(text: &str) -> SyntaxTree {
    parse_tree(text, ParseOptions::default())
}

fn name_expr(name: &str) -> GreenNode {
    let space = GreenTriviaList::new([GreenTrivia::new(SyntaxKind::WHITESPACE, " ")]);
    let token = GreenToken::new(space, SyntaxKind::NAME, name, GreenTriviaList::empty());
    GreenNode::new(SyntaxKind::NAME_EXPR, [Some(token.into())])
}

#[test]
fn insert_into_argument_list() {
    let tree = parse("f(a, b, c);");
    let b = tree
        .root()
        .descendants()
        .find(|node| node.kind() == SyntaxKind::NAME_EXPR && node.text() == "b")
        .unwrap();

    let root = tree.root().insert_before(&b, vec![name_expr("x")]).unwrap();
    assert_eq!(root.tree().text(), "f(a, x, b, c);");
    assert_eq!(root.tree().diagnostics().count(), 0);

    let changes = root.tree().get_changes(&tree);
    assert_eq!(apply_changes(tree.text(), &changes), root.tree().text());
}

#[test]
fn list_insertion_matches_a_fresh_parse() {
    let tree = parse("f(a);");
    let a = tree
        .root()
        .descendants()
        .find(|node| node.kind() == SyntaxKind::NAME_EXPR && node.text() == "a")
        .unwrap();
    let token = GreenToken::new(
        GreenTriviaList::empty(),
        SyntaxKind::NAME,
        "b",
        GreenTriviaList::empty(),
    );
    let b = GreenNode::new(SyntaxKind::NAME_EXPR, [Some(token.into())]);

    let root = tree.root().insert_after(&a, vec![b]).unwrap();
    assert_eq!(root.tree().text(), "f(a, b);");
    assert_eq!(root.debug_dump(), parse(root.tree().text()).root().debug_dump());
}

#[test]
fn replacing_a_token_shares_unchanged_statements() {
    let text: String = (0..50).map(|i| format!("int v{i} = {i};\n")).collect();
    let tree = parse(&text);
    let target = tree.root().descendant_tokens().find(|token| token.text() == "v25").unwrap();
    let renamed = GreenToken::new(
        target.green().leading().clone(),
        SyntaxKind::NAME,
        "w25",
        target.green().trailing().clone(),
    );

    let root = tree.root().replace_token(&target, renamed).unwrap();
    assert_eq!(root.tree().text(), text.replacen("v25", "w25", 1));

    let decls = |root: &SyntaxNode| -> Vec<SyntaxNode> {
        root.descendants().filter(|node| node.kind() == SyntaxKind::VARIABLE_DECL).collect()
    };
    let (old_items, new_items) = (decls(&tree.root()), decls(&root));
    assert_eq!(old_items.len(), new_items.len());
    for (index, (old, new)) in old_items.iter().zip(&new_items).enumerate() {
        assert_eq!(old.green().ptr_eq(new.green()), index != 25, "item {index}");
    }
}

#[test]
fn diagnostics_come_in_text_order() {
    let tree = parse("int x = ;\nclass { int y }\nvoid f(int a b) { return 1 +; }\n\"open\n");
    let diagnostics: Vec<_> = tree.diagnostics().collect();
    assert!(diagnostics.len() >= 5, "{diagnostics:?}");
    assert!(diagnostics.windows(2).all(|pair| pair[0].range().start() <= pair[1].range().start()));
    assert!(diagnostics.iter().any(|d| d.code() == ErrorCode::ExpressionExpected));
    assert!(diagnostics.iter().any(|d| d.code() == ErrorCode::IdentifierExpected));
    assert!(diagnostics.iter().any(|d| d.code() == ErrorCode::UnterminatedString));
}

#[test]
fn predefined_symbols_select_branches() {
    let text = "#if DEBUG\nint a;\n#else\nint b;\n#endif\n";
    let names = |tree: &SyntaxTree| -> Vec<String> {
        tree.root()
            .descendant_tokens()
            .filter(|token| token.kind() == SyntaxKind::NAME)
            .map(|token| token.text().to_owned())
            .collect()
    };

    let debug = parse_tree(text, ParseOptions::default().with_preprocessor_symbols(["DEBUG"]));
    assert_eq!(names(&debug), ["a"]);
    assert!(debug.is_preprocessor_symbol_defined("DEBUG", TextSize::new(0)));

    let release = parse(text);
    assert_eq!(names(&release), ["b"]);
    assert_eq!(release.diagnostics().count(), 0);
    assert!(!release.directive_stack_at(release.green().full_width()).has_unfinished_if());
}

#[test]
fn line_directives_remap_spans() {
    let tree = parse("int a;\n#line 100 \"gen.lr\"\nint b;\n#line default\nint c;\n")
        .with_path("main.lr");
    let span_of = |name: &str| {
        let token = tree.root().descendant_tokens().find(|token| token.text() == name).unwrap();
        tree.get_mapped_line_span(token.span())
    };

    assert_eq!(span_of("a").span.to_string(), "main.lr(1:5)-(1:6)");
    assert_eq!(span_of("b").span.to_string(), "gen.lr(100:5)-(100:6)");
    assert_eq!(span_of("c").span.to_string(), "main.lr(5:5)-(5:6)");
}

#[test]
fn pragmas_suppress_warnings() {
    let text = "int a;\n#pragma warning disable 1030\nint b;\n\
                #pragma warning restore 1030\nint c;\n";
    let tree = parse(text);
    let at = |name: &str| {
        let token = tree.root().descendant_tokens().find(|token| token.text() == name).unwrap();
        tree.pragma_warning_state(1030, token.span().start())
    };

    assert_eq!(at("a"), ReportState::Default);
    assert_eq!(at("b"), ReportState::Suppressed);
    assert_eq!(at("c"), ReportState::Default);
}

#[test]
fn warning_directives_are_not_errors() {
    let tree = parse("#warning check this\nint a;\n");
    let diagnostics: Vec<_> = tree.diagnostics().collect();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code(), ErrorCode::WarningDirective);
    assert!(!diagnostics[0].is_error());
}

#[test]
fn cancelled_parse_produces_no_tree() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result =
        SyntaxTree::parse("int a;", ParseOptions::default(), Arc::new(LarchParser), &cancel);
    assert_eq!(result.err(), Some(Cancelled));
}
