//! Rewriting a subtree by replacing located nodes, tokens and trivia.
//!
//! Only nodes whose full span touches a target are visited; every other
//! subtree is carried over by reference.

use rustc_hash::FxHashSet;
use text_size::TextRange;

use crate::green::{GreenElement, GreenNode, GreenToken, GreenTrivia, GreenTriviaList};
use crate::{EditError, NodeOrToken, SyntaxNode, SyntaxToken, SyntaxTree, SyntaxTrivia};

type NodeFn<'a> = &'a mut dyn FnMut(&SyntaxNode, GreenNode) -> GreenNode;
type TokenFn<'a> = &'a mut dyn FnMut(&SyntaxToken, GreenToken) -> GreenToken;
type TriviaFn<'a> = &'a mut dyn FnMut(&SyntaxTrivia, GreenTrivia) -> Vec<GreenTrivia>;

/// Disjoint, sorted full spans of the targets.
struct Spans(Vec<TextRange>);

impl Spans {
    fn new(mut spans: Vec<TextRange>) -> Self {
        spans.sort_by_key(|span| (span.start(), span.end()));
        let mut merged: Vec<TextRange> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last_mut() {
                Some(last) if span.start() <= last.end() => *last = last.cover(span),
                _ => merged.push(span),
            }
        }
        Self(merged)
    }

    /// Touching counts, so empty targets are still reached.
    fn touches(&self, range: TextRange) -> bool {
        let index = self.0.partition_point(|span| span.end() < range.start());
        self.0.get(index).is_some_and(|span| span.start() <= range.end())
    }
}

struct Replacer<'a> {
    nodes: FxHashSet<SyntaxNode>,
    tokens: FxHashSet<SyntaxToken>,
    trivia: FxHashSet<SyntaxTrivia>,
    spans: Spans,
    visit_trivia: bool,
    replace_node: NodeFn<'a>,
    replace_token: TokenFn<'a>,
    replace_trivia: TriviaFn<'a>,
}

impl Replacer<'_> {
    fn visit_node(&mut self, node: &SyntaxNode) -> GreenNode {
        let green = node.green();
        let mut slots: Option<Vec<Option<GreenElement>>> = None;
        for slot in 0..node.slot_count() {
            let Some(child) = node.child(slot) else { continue };
            if !self.spans.touches(child.full_span()) {
                continue;
            }
            let rewritten: GreenElement = match &child {
                NodeOrToken::Node(child) => self.visit_node(child).into(),
                NodeOrToken::Token(token) => self.visit_token(token).into(),
            };
            if green.slot(slot).is_some_and(|original| original.ptr_eq(&rewritten)) {
                continue;
            }
            let slots =
                slots.get_or_insert_with(|| green.slots().map(|slot| slot.cloned()).collect());
            slots[slot] = Some(rewritten);
        }
        let rebuilt = match slots {
            Some(slots) => green.with_slots(slots),
            None => green.clone(),
        };
        if self.nodes.contains(node) { (self.replace_node)(node, rebuilt) } else { rebuilt }
    }

    fn visit_token(&mut self, token: &SyntaxToken) -> GreenToken {
        let mut green = token.green().clone();
        if self.visit_trivia {
            if let Some(leading) = self.visit_trivia_list(token, true) {
                green = green.with_leading(leading);
            }
            if let Some(trailing) = self.visit_trivia_list(token, false) {
                green = green.with_trailing(trailing);
            }
        }
        if self.tokens.contains(token) { (self.replace_token)(token, green) } else { green }
    }

    /// The rewritten run, or `None` when nothing in it changed.
    fn visit_trivia_list(
        &mut self,
        token: &SyntaxToken,
        leading: bool,
    ) -> Option<GreenTriviaList> {
        let run: Vec<SyntaxTrivia> = if leading {
            token.leading_trivia().collect()
        } else {
            token.trailing_trivia().collect()
        };
        let mut pieces = Vec::with_capacity(run.len());
        let mut changed = false;
        for trivia in run {
            if !self.spans.touches(trivia.full_span()) {
                pieces.push(trivia.green().clone());
                continue;
            }
            let mut piece = trivia.green().clone();
            if let Some(structure) = trivia.structure() {
                let rewritten = self.visit_node(&structure);
                if !rewritten.ptr_eq(structure.green()) {
                    let diagnostics = piece.diagnostics().to_vec();
                    piece = GreenTrivia::structured(rewritten).with_diagnostics(diagnostics);
                    changed = true;
                }
            }
            if self.trivia.contains(&trivia) {
                pieces.extend((self.replace_trivia)(&trivia, piece));
                changed = true;
            } else {
                pieces.push(piece);
            }
        }
        changed.then(|| GreenTriviaList::new(pieces))
    }
}

/// Nodes from `node` up to the root of its tree, crossing out of structured
/// trivia into the token that carries it.
fn containing_nodes(node: &SyntaxNode) -> impl Iterator<Item = SyntaxNode> {
    std::iter::successors(Some(node.clone()), |node| {
        node.raw_parent().or_else(|| {
            let trivia = node.structured_trivia_parent()?;
            Some(trivia.token().raw_parent().clone())
        })
    })
}

impl SyntaxNode {
    fn contains_node(&self, node: &SyntaxNode) -> bool {
        node.tree() == self.tree()
            && self.full_span().contains_range(node.full_span())
            && containing_nodes(node).any(|ancestor| ancestor == *self)
    }

    /// Replaces the targets below this node with what the callbacks return.
    ///
    /// Callbacks receive the original element and its rewritten shape, in
    /// which replacements below it have already been made. The result is the
    /// root of a new tree when this node is a tree root, and a detached node
    /// otherwise.
    pub fn replace_syntax(
        &self,
        nodes: &[SyntaxNode],
        replace_node: NodeFn<'_>,
        tokens: &[SyntaxToken],
        replace_token: TokenFn<'_>,
        trivia: &[SyntaxTrivia],
        replace_trivia: TriviaFn<'_>,
    ) -> Result<SyntaxNode, EditError> {
        let mut spans = Vec::new();
        let mut in_structure = false;
        for node in nodes {
            if !self.contains_node(node) {
                return Err(EditError::NotInTree);
            }
            in_structure |= node.is_part_of_structured_trivia();
            spans.push(node.full_span());
        }
        for token in tokens {
            if !self.contains_node(token.raw_parent()) {
                return Err(EditError::NotInTree);
            }
            in_structure |= token.raw_parent().is_part_of_structured_trivia();
            spans.push(token.full_span());
        }
        for piece in trivia {
            if !self.contains_node(piece.token().raw_parent()) {
                return Err(EditError::NotInTree);
            }
            spans.push(piece.full_span());
        }
        if spans.is_empty() {
            return Ok(self.clone());
        }
        let mut replacer = Replacer {
            nodes: nodes.iter().cloned().collect(),
            tokens: tokens.iter().cloned().collect(),
            trivia: trivia.iter().cloned().collect(),
            spans: Spans::new(spans),
            visit_trivia: in_structure || !trivia.is_empty(),
            replace_node,
            replace_token,
            replace_trivia,
        };
        let green = replacer.visit_node(self);
        Ok(self.with_new_green(green))
    }

    fn with_new_green(&self, green: GreenNode) -> SyntaxNode {
        if green.ptr_eq(self.green()) {
            return self.clone();
        }
        let is_root = self.raw_parent().is_none() && !self.is_structured_trivia();
        if is_root {
            self.tree().with_green(green).root()
        } else {
            SyntaxTree::new(green, self.tree().options().clone()).root()
        }
    }

    pub fn replace_nodes(
        &self,
        targets: &[SyntaxNode],
        mut compute: impl FnMut(&SyntaxNode, GreenNode) -> GreenNode,
    ) -> Result<SyntaxNode, EditError> {
        self.replace_syntax(
            targets,
            &mut compute,
            &[],
            &mut |_, token| token,
            &[],
            &mut |_, piece| vec![piece],
        )
    }

    pub fn replace_node(
        &self,
        target: &SyntaxNode,
        replacement: GreenNode,
    ) -> Result<SyntaxNode, EditError> {
        let mut replacement = Some(replacement);
        self.replace_nodes(std::slice::from_ref(target), |_, rewritten| {
            replacement.take().unwrap_or(rewritten)
        })
    }

    pub fn replace_tokens(
        &self,
        targets: &[SyntaxToken],
        mut compute: impl FnMut(&SyntaxToken, GreenToken) -> GreenToken,
    ) -> Result<SyntaxNode, EditError> {
        self.replace_syntax(
            &[],
            &mut |_, node| node,
            targets,
            &mut compute,
            &[],
            &mut |_, piece| vec![piece],
        )
    }

    pub fn replace_token(
        &self,
        target: &SyntaxToken,
        replacement: GreenToken,
    ) -> Result<SyntaxNode, EditError> {
        let mut replacement = Some(replacement);
        self.replace_tokens(std::slice::from_ref(target), |_, rewritten| {
            replacement.take().unwrap_or(rewritten)
        })
    }

    /// Replaces each target trivia by zero or more pieces.
    pub fn replace_trivia(
        &self,
        targets: &[SyntaxTrivia],
        mut compute: impl FnMut(&SyntaxTrivia, GreenTrivia) -> Vec<GreenTrivia>,
    ) -> Result<SyntaxNode, EditError> {
        self.replace_syntax(
            &[],
            &mut |_, node| node,
            &[],
            &mut |_, token| token,
            targets,
            &mut compute,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParseOptions, SyntaxKind};

    fn name(text: &str) -> GreenToken {
        let trailing = GreenTriviaList::new([GreenTrivia::new(SyntaxKind::WHITESPACE, " ")]);
        GreenToken::new(GreenTriviaList::empty(), SyntaxKind::NAME, text, trailing)
    }

    fn stmt(text: &str) -> GreenElement {
        let expr = GreenNode::new(SyntaxKind::NAME_EXPR, [Some(name(text).into())]);
        let semicolon = GreenToken::fixed(SyntaxKind::SEMICOLON);
        GreenNode::new(SyntaxKind::EXPR_STMT, [Some(expr.into()), Some(semicolon.into())]).into()
    }

    fn tree(names: &[&str]) -> SyntaxTree {
        let comment = GreenTrivia::new(SyntaxKind::LINE_COMMENT, "// end");
        let eof = GreenToken::new(
            GreenTriviaList::new([comment]),
            SyntaxKind::EOF,
            "",
            GreenTriviaList::empty(),
        );
        let items = GreenNode::list(names.iter().map(|name| stmt(name)));
        let unit = GreenNode::new(SyntaxKind::COMPILATION_UNIT, [items, Some(eof.into())]);
        SyntaxTree::new(unit, ParseOptions::default())
    }

    fn green_items(root: &SyntaxNode) -> Vec<GreenElement> {
        let list = root.green().slot(0).and_then(|slot| slot.as_node()).unwrap();
        list.slots().map(|slot| slot.unwrap().clone()).collect()
    }

    #[test]
    fn replacing_a_token_shares_untouched_siblings() {
        let tree = tree(&["a", "b", "c"]);
        let root = tree.root();
        let target = root.descendant_tokens().find(|token| token.text() == "b").unwrap();

        let new_root = root.replace_token(&target, name("bee")).unwrap();
        assert_eq!(new_root.to_string(), "a ;bee ;c ;// end");
        assert_eq!(root.to_string(), "a ;b ;c ;// end");

        let (before, after) = (green_items(&root), green_items(&new_root));
        assert!(before[0].ptr_eq(&after[0]));
        assert!(!before[1].ptr_eq(&after[1]));
        assert!(before[2].ptr_eq(&after[2]));
        assert!(root.green().slot(1).unwrap().ptr_eq(new_root.green().slot(1).unwrap()));
    }

    #[test]
    fn node_callbacks_see_rewritten_descendants() {
        let tree = tree(&["a", "b"]);
        let root = tree.root();
        let stmts: Vec<SyntaxNode> = root.children().collect();
        let exprs: Vec<SyntaxNode> = stmts.iter().filter_map(|stmt| stmt.child_node(0)).collect();
        let targets: Vec<SyntaxNode> = stmts.iter().chain(&exprs).cloned().collect();

        let mut seen = Vec::new();
        let new_root = root
            .replace_nodes(&targets, |original, rewritten| {
                seen.push(original.kind());
                if original.kind() == SyntaxKind::NAME_EXPR {
                    GreenNode::new(SyntaxKind::NAME_EXPR, [Some(name("z").into())])
                } else {
                    rewritten
                }
            })
            .unwrap();
        assert_eq!(new_root.to_string(), "z ;z ;// end");
        assert_eq!(
            seen,
            [
                SyntaxKind::NAME_EXPR,
                SyntaxKind::EXPR_STMT,
                SyntaxKind::NAME_EXPR,
                SyntaxKind::EXPR_STMT,
            ]
        );
    }

    #[test]
    fn trivia_can_be_removed() {
        let tree = tree(&["a"]);
        let root = tree.root();
        let comment = root.last_token().unwrap().leading_trivia().next().unwrap();
        let new_root = root.replace_trivia(&[comment], |_, _| Vec::new()).unwrap();
        assert_eq!(new_root.to_string(), "a ;");
        assert_eq!(tree.text(), "a ;// end");
    }

    #[test]
    fn targets_from_other_trees_are_rejected() {
        let (first, second) = (tree(&["a"]), tree(&["a"]));
        let foreign = second.root().first_token().unwrap();
        assert_eq!(
            first.root().replace_token(&foreign, name("x")).err(),
            Some(EditError::NotInTree)
        );
    }

    #[test]
    fn no_targets_is_the_same_node() {
        let tree = tree(&["a"]);
        let root = tree.root();
        assert_eq!(root.replace_nodes(&[], |_, green| green).unwrap(), root);
    }
}
