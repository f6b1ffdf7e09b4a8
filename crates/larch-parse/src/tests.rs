use std::fs;
use std::path::{Path, PathBuf};

use expect_test::expect;
use larch_syntax::{CancellationToken, Diagnostic, ParseOptions, SyntaxKind, SyntaxTree};

use crate::parse_tree;

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct TestCase {
    input: PathBuf,
    text: String,
}

impl TestCase {
    fn list() -> Vec<Self> {
        let test_data_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("test_data");

        let mut cases = fs::read_dir(&test_data_dir)
            .unwrap_or_else(|err| {
                panic!("Cannot read directory {}: {err}", test_data_dir.display())
            })
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension()? == "lr" {
                    let text = fs::read_to_string(&path).ok()?;
                    Some(Self { input: path, text })
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();

        cases.sort();
        cases
    }

    fn expects_errors(&self) -> bool {
        self.input.file_name().is_some_and(|name| name.to_string_lossy().starts_with("err_"))
    }
}

fn errors(tree: &SyntaxTree) -> Vec<Diagnostic> {
    tree.diagnostics().filter(Diagnostic::is_error).collect()
}

fn render(tree: &SyntaxTree) -> String {
    let diagnostics = tree
        .diagnostics()
        .map(|d| format!("  {:?}@{:?} {}", d.code(), d.range(), d.message()))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}Errors:\n{diagnostics}", tree.root().debug_dump())
}

#[test]
fn parse() {
    let cases = TestCase::list();
    assert!(!cases.is_empty());

    for case in cases {
        let tree = parse_tree(&case.text, ParseOptions::default());
        assert_eq!(tree.green().text(), case.text, "{}", case.input.display());
        assert_eq!(tree.green().full_width(), tree.source_text().len());

        let errors = errors(&tree);
        if case.expects_errors() {
            assert!(!errors.is_empty(), "{}", case.input.display());
        } else {
            assert!(errors.is_empty(), "{}: {errors:?}", case.input.display());
        }
    }
}

#[test]
fn variable_declaration() {
    let tree = parse_tree("int x = 1;\n", ParseOptions::default());
    expect![[r#"
        COMPILATION_UNIT@0..11
          VARIABLE_DECL@0..11
            PREDEFINED_TYPE@0..3
              INT_KW@0..3 "int"
            WHITESPACE@3..4 " "
            NAME@4..5 "x"
            WHITESPACE@5..6 " "
            EQ@6..7 "="
            LITERAL@7..9
              WHITESPACE@7..8 " "
              INT_NUMBER@8..9 "1"
            SEMICOLON@9..10 ";"
            NEWLINE@10..11 "\n"
          EOF@11..11 ""
        Errors:
    "#]]
    .assert_eq(&render(&tree));
}

#[test]
fn missing_semicolon() {
    let tree = parse_tree("x", ParseOptions::default());
    expect![[r#"
        COMPILATION_UNIT@0..1
          EXPR_STMT@0..1
            NAME_EXPR@0..1
              NAME@0..1 "x"
            SEMICOLON@1..1 missing
          EOF@1..1 ""
        Errors:
          TokenExpected@1..1 `;` expected"#]]
    .assert_eq(&render(&tree));
}

#[test]
fn skipped_tokens_lead_the_next_token() {
    let tree = parse_tree("a; ) b;", ParseOptions::default());
    expect![[r#"
        COMPILATION_UNIT@0..7
          LIST@0..7
            EXPR_STMT@0..2
              NAME_EXPR@0..1
                NAME@0..1 "a"
              SEMICOLON@1..2 ";"
            EXPR_STMT@2..7
              NAME_EXPR@2..6
                SKIPPED_TOKENS_TRIVIA@2..4
                  WHITESPACE@2..3 " "
                  RIGHT_PAREN@3..4 ")"
                WHITESPACE@4..5 " "
                NAME@5..6 "b"
              SEMICOLON@6..7 ";"
          EOF@7..7 ""
        Errors:
          UnexpectedToken@3..4 unexpected token `)`"#]]
    .assert_eq(&render(&tree));
}

#[test]
fn binary_precedence() {
    let tree = parse_tree("a || b && c == d < e + f * g;", ParseOptions::default());
    let shapes: Vec<String> = tree
        .root()
        .descendants()
        .filter(|node| node.kind() == SyntaxKind::BINARY_EXPR)
        .map(|node| node.text().to_owned())
        .collect();
    assert_eq!(shapes, [
        "a || b && c == d < e + f * g",
        "b && c == d < e + f * g",
        "c == d < e + f * g",
        "d < e + f * g",
        "e + f * g",
        "f * g",
    ]);
}

#[test]
fn functions_only_at_item_level() {
    let tree = parse_tree("void f() { int g() { } }", ParseOptions::default());
    let kinds: Vec<_> = tree.root().descendants().map(|node| node.kind()).collect();
    assert!(kinds.contains(&SyntaxKind::FUNCTION_DECL));
    assert_eq!(
        kinds.iter().filter(|&&kind| kind == SyntaxKind::FUNCTION_DECL).count(),
        1
    );
    assert!(!errors(&tree).is_empty());
}

#[test]
fn cancelled_parse_returns_no_tree() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = crate::parse("int x;", &ParseOptions::default(), &cancel);
    assert!(result.is_err());
}
