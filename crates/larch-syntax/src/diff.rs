//! Tree differencing: a bounded edit script between two shape trees.
//!
//! Both trees are walked as stacks of pending elements. Identical heads are
//! skipped together; otherwise a short forward search decides whether to
//! expand a head into its children, record an insertion or deletion, or
//! replace one head by the other. Every step either pops or expands an
//! element, so the walk terminates.

use std::cmp::Reverse;

use rustc_hash::FxHashSet;
use text_size::{TextRange, TextSize};

use crate::green::{GreenElement, GreenNode, GreenToken};
use crate::text::{TextChange, TextChangeRange};
use crate::{NodeOrToken, SyntaxKind, SyntaxTree};

/// How many pending elements of the other side are searched for a match.
pub const MAX_SEARCH_LENGTH: usize = 8;
/// How far below a pending element the search looks.
const MAX_SEARCH_DEPTH: u8 = 2;

#[derive(Clone)]
struct Entry {
    element: GreenElement,
    offset: TextSize,
}

impl Entry {
    fn end(&self) -> TextSize {
        self.offset + self.element.full_width()
    }
}

/// Pending elements, next one on top.
struct Stack {
    entries: Vec<Entry>,
    end: TextSize,
}

impl Stack {
    fn new(root: &GreenNode) -> Self {
        Self {
            entries: vec![Entry {
                element: NodeOrToken::Node(root.clone()),
                offset: TextSize::new(0),
            }],
            end: root.full_width(),
        }
    }

    fn top(&self) -> Option<&Entry> {
        self.entries.last()
    }

    fn position(&self) -> TextSize {
        self.top().map_or(self.end, |entry| entry.offset)
    }

    /// Pops `count` elements and returns the range they covered.
    fn pop(&mut self, count: usize) -> TextRange {
        let start = self.position();
        let mut end = start;
        for _ in 0..count {
            if let Some(entry) = self.entries.pop() {
                end = entry.end();
            }
        }
        TextRange::new(start, end)
    }

    /// Replaces the top node by its children.
    fn reduce(&mut self) {
        let Some(Entry { element: NodeOrToken::Node(node), offset }) = self.entries.pop() else {
            return;
        };
        let mut children = Vec::with_capacity(node.slot_count());
        let mut child_offset = offset;
        for child in node.slots().flatten() {
            children.push(Entry { element: child.clone(), offset: child_offset });
            child_offset += child.full_width();
        }
        self.entries.extend(children.into_iter().rev());
    }

    /// The first `MAX_SEARCH_LENGTH` pending elements, nearest first.
    fn window(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().rev().take(MAX_SEARCH_LENGTH)
    }
}

fn same_token_text(left: &GreenToken, right: &GreenToken) -> bool {
    left.kind() == right.kind()
        && left.full_width() == right.full_width()
        && left.text() == right.text()
        && left.full_text() == right.full_text()
}

/// Same instance, or tokens spelled the same way.
fn are_identical(left: &GreenElement, right: &GreenElement) -> bool {
    match (left, right) {
        (NodeOrToken::Node(left), NodeOrToken::Node(right)) => left.ptr_eq(right),
        (NodeOrToken::Token(left), NodeOrToken::Token(right)) => {
            left.ptr_eq(right) || same_token_text(left, right)
        }
        _ => false,
    }
}

/// Width of what `left` and `right` visibly share: for tokens the token text
/// and identical trivia, for nodes the children that are the same instance or
/// tokens with the same text.
fn similarity(left: &GreenElement, right: &GreenElement) -> u32 {
    match (left, right) {
        (NodeOrToken::Token(left), NodeOrToken::Token(right)) => {
            let mut shared = 0;
            if left.text() == right.text() {
                shared += u32::from(left.width());
            }
            let pieces = |token: &GreenToken| {
                let (leading, trailing) = (token.leading().pieces(), token.trailing().pieces());
                leading.iter().chain(trailing).cloned().collect::<Vec<_>>()
            };
            let left_pieces = pieces(left);
            let texts: FxHashSet<_> = left_pieces
                .iter()
                .filter_map(|piece| Some((piece.kind(), piece.text()?)))
                .collect();
            for piece in pieces(right) {
                let same = left_pieces.iter().any(|other| other.ptr_eq(&piece))
                    || piece.text().is_some_and(|text| texts.contains(&(piece.kind(), text)));
                if same {
                    shared += u32::from(piece.full_width());
                }
            }
            shared
        }
        (NodeOrToken::Node(left), NodeOrToken::Node(right)) => {
            let mut nodes = FxHashSet::default();
            let mut texts = FxHashSet::default();
            for child in left.slots().flatten() {
                match child {
                    NodeOrToken::Node(node) => {
                        nodes.insert(node.clone());
                    }
                    NodeOrToken::Token(token) => {
                        texts.insert((token.kind(), token.text()));
                    }
                }
            }
            right
                .slots()
                .flatten()
                .map(|child| match child {
                    NodeOrToken::Node(node) if nodes.contains(node) => u32::from(node.full_width()),
                    NodeOrToken::Token(token) if texts.contains(&(token.kind(), token.text())) => {
                        u32::from(token.width())
                    }
                    _ => 0,
                })
                .sum()
        }
        _ => 0,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Match {
    /// Position in the searched window.
    index: usize,
    /// How far below that pending element the match sits.
    depth: u8,
    exact: bool,
    similarity: u32,
}

impl Match {
    /// Exact matches first, then by similarity, then the shallowest, then
    /// the nearest.
    fn beats(&self, other: &Self) -> bool {
        self.rank() > other.rank()
    }

    fn rank(&self) -> (bool, u32, Reverse<u8>, Reverse<usize>) {
        (self.exact, self.similarity, Reverse(self.depth), Reverse(self.index))
    }
}

fn consider(
    candidate: &GreenElement,
    target: &GreenElement,
    index: usize,
    depth: u8,
    best: &mut Option<Match>,
) -> bool {
    if are_identical(candidate, target) {
        let similarity = u32::from(target.full_width());
        *best = Some(Match { index, depth, exact: true, similarity });
        return true;
    }
    if candidate.kind() == target.kind() {
        let similarity = similarity(candidate, target);
        let found = Match { index, depth, exact: false, similarity };
        if similarity > 0 && best.is_none_or(|best| found.beats(&best)) {
            *best = Some(found);
        }
    }
    if depth < MAX_SEARCH_DEPTH
        && let NodeOrToken::Node(node) = candidate
    {
        for child in node.slots().flatten().take(MAX_SEARCH_LENGTH) {
            if consider(child, target, index, depth + 1, best) {
                return true;
            }
        }
    }
    false
}

/// The best place for `target` among the pending elements of `stack`.
fn find_best_match(stack: &Stack, target: &GreenElement) -> Option<Match> {
    let mut best = None;
    for (index, entry) in stack.window().enumerate() {
        if consider(&entry.element, target, index, 0, &mut best) {
            break;
        }
    }
    best
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    SkipBoth,
    ReduceOld,
    ReduceNew,
    ReduceBoth,
    InsertNew(usize),
    DeleteOld(usize),
    Replace,
}

fn is_node(element: &GreenElement) -> bool {
    matches!(element, NodeOrToken::Node(_))
}

/// What to do when the best match sits at the head of the other side.
fn head_action(old: &GreenElement, new: &GreenElement, found: Match, old_in_new: bool) -> Action {
    if found.depth > 0 {
        // The match lives inside the other head: open it up.
        if old_in_new { Action::ReduceNew } else { Action::ReduceOld }
    } else if is_node(old) && is_node(new) {
        Action::ReduceBoth
    } else {
        Action::Replace
    }
}

fn next_action(old: &Stack, new: &Stack) -> Action {
    let (Some(old_top), Some(new_top)) = (old.top(), new.top()) else { return Action::Replace };
    let (old_head, new_head) = (&old_top.element, &new_top.element);
    if are_identical(old_head, new_head) {
        return Action::SkipBoth;
    }
    let old_in_new = find_best_match(new, old_head);
    let new_in_old = find_best_match(old, new_head);
    let best = match (old_in_new, new_in_old) {
        (Some(left), Some(right)) => {
            if right.beats(&left) { Some((right, false)) } else { Some((left, true)) }
        }
        (Some(found), None) => Some((found, true)),
        (None, Some(found)) => Some((found, false)),
        (None, None) => None,
    };
    match best {
        Some((found, old_in_new)) if found.index == 0 => {
            head_action(old_head, new_head, found, old_in_new)
        }
        // The old head shows up further ahead: what comes before it is new.
        Some((found, true)) => Action::InsertNew(found.index),
        // The new head shows up further ahead: what comes before it is gone.
        Some((found, false)) => Action::DeleteOld(found.index),
        None if is_node(old_head) && old_head.kind() == new_head.kind() => Action::ReduceBoth,
        None => Action::Replace,
    }
}

/// A region of the old text replaced by a region of the new text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ChangeRecord {
    old: TextRange,
    new: TextRange,
}

fn record(records: &mut Vec<ChangeRecord>, change: ChangeRecord) {
    if let Some(last) = records.last_mut()
        && last.old.end() == change.old.start()
        && last.new.end() == change.new.start()
    {
        last.old = last.old.cover(change.old);
        last.new = last.new.cover(change.new);
        return;
    }
    records.push(change);
}

fn change_records(old_root: &GreenNode, new_root: &GreenNode) -> Vec<ChangeRecord> {
    let mut records = Vec::new();
    if old_root.ptr_eq(new_root) {
        return records;
    }
    let mut old = Stack::new(old_root);
    let mut new = Stack::new(new_root);
    let mut steps = 0usize;
    loop {
        steps += 1;
        let change = match (old.top().is_some(), new.top().is_some()) {
            (false, false) => break,
            (false, true) => ChangeRecord { old: old.pop(0), new: new.pop(new.entries.len()) },
            (true, false) => ChangeRecord { old: old.pop(old.entries.len()), new: new.pop(0) },
            (true, true) => match next_action(&old, &new) {
                Action::SkipBoth => {
                    old.pop(1);
                    new.pop(1);
                    continue;
                }
                Action::ReduceOld => {
                    old.reduce();
                    continue;
                }
                Action::ReduceNew => {
                    new.reduce();
                    continue;
                }
                Action::ReduceBoth => {
                    old.reduce();
                    new.reduce();
                    continue;
                }
                Action::InsertNew(count) => ChangeRecord { old: old.pop(0), new: new.pop(count) },
                Action::DeleteOld(count) => ChangeRecord { old: old.pop(count), new: new.pop(0) },
                Action::Replace => ChangeRecord { old: old.pop(1), new: new.pop(1) },
            },
        };
        record(&mut records, change);
    }
    tracing::debug!(records = records.len(), steps, "diffed syntax trees");
    records
}

/// The minimal text changes that turn `old` into `new`, in old coordinates.
pub(crate) fn text_changes(old: &SyntaxTree, new: &SyntaxTree) -> Vec<TextChange> {
    let (old_text, new_text) = (old.text(), new.text());
    change_records(old.green(), new.green())
        .into_iter()
        .filter_map(|record| {
            let inner = TextChangeRange::between(&old_text[record.old], &new_text[record.new])?;
            let old_range = inner.span + record.old.start();
            let new_range = TextRange::at(record.new.start() + inner.span.start(), inner.new_len);
            Some(TextChange::new(old_range, &new_text[new_range]))
        })
        .collect()
}

/// Ranges of `new` that may differ from `old`.
pub(crate) fn changed_spans(old: &SyntaxTree, new: &SyntaxTree) -> Vec<TextRange> {
    change_records(old.green(), new.green()).into_iter().map(|record| record.new).collect()
}

/// Slots skipped by a top-level comparison: bodies and initializers.
fn is_body_slot(kind: SyntaxKind, slot: usize) -> bool {
    matches!((kind, slot), (SyntaxKind::FUNCTION_DECL, 3) | (SyntaxKind::VARIABLE_DECL, 2 | 3))
}

/// Structural equality ignoring trivia. Shared subtrees are skipped without
/// descending.
pub(crate) fn are_equivalent(left: &GreenNode, right: &GreenNode, top_level: bool) -> bool {
    let mut stack: Vec<(GreenElement, GreenElement)> =
        vec![(NodeOrToken::Node(left.clone()), NodeOrToken::Node(right.clone()))];
    while let Some((left, right)) = stack.pop() {
        if left.ptr_eq(&right) {
            continue;
        }
        match (&left, &right) {
            (NodeOrToken::Token(left), NodeOrToken::Token(right)) => {
                if left.kind() != right.kind() || left.text() != right.text() {
                    return false;
                }
            }
            (NodeOrToken::Node(left), NodeOrToken::Node(right)) => {
                if left.kind() != right.kind() || left.slot_count() != right.slot_count() {
                    return false;
                }
                for (slot, (l, r)) in left.slots().zip(right.slots()).enumerate() {
                    if top_level && is_body_slot(left.kind(), slot) {
                        continue;
                    }
                    match (l, r) {
                        (None, None) => {}
                        (Some(l), Some(r)) => stack.push((l.clone(), r.clone())),
                        _ => return false,
                    }
                }
            }
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;
    use crate::green::{GreenTrivia, GreenTriviaList};
    use crate::text::apply_changes;
    use crate::ParseOptions;

    fn token(kind: SyntaxKind, text: &str) -> GreenElement {
        let trailing = GreenTriviaList::new([GreenTrivia::new(SyntaxKind::WHITESPACE, " ")]);
        GreenToken::new(GreenTriviaList::empty(), kind, text, trailing).into()
    }

    fn stmt(name: &str) -> GreenElement {
        let expr = GreenNode::new(SyntaxKind::NAME_EXPR, [Some(token(SyntaxKind::NAME, name))]);
        let semicolon = token(SyntaxKind::SEMICOLON, ";");
        GreenNode::new(SyntaxKind::EXPR_STMT, [Some(expr.into()), Some(semicolon)]).into()
    }

    fn unit(items: Vec<GreenElement>) -> SyntaxTree {
        let eof = GreenToken::fixed(SyntaxKind::EOF).into();
        let root =
            GreenNode::new(SyntaxKind::COMPILATION_UNIT, [GreenNode::list(items), Some(eof)]);
        SyntaxTree::new(root, ParseOptions::default())
    }

    fn check_round_trip(old: &SyntaxTree, new: &SyntaxTree) -> Vec<TextChange> {
        let changes = new.get_changes(old);
        assert_eq!(apply_changes(old.text(), &changes), new.text());
        changes
    }

    #[test]
    fn shared_items_produce_no_changes() {
        let (a, b) = (stmt("a"), stmt("b"));
        let old = unit(vec![a.clone(), b.clone()]);
        let new = unit(vec![a, b]);
        assert!(new.get_changes(&old).is_empty());
        assert!(new.get_changed_spans(&old).is_empty());
    }

    #[test]
    fn insertion_between_shared_items() {
        let (a, c) = (stmt("a"), stmt("c"));
        let old = unit(vec![a.clone(), c.clone()]);
        let new = unit(vec![a, stmt("b"), c]);
        let changes = check_round_trip(&old, &new);
        expect![[r#"
            [
                TextChange {
                    range: 4..4,
                    new_text: "b ; ",
                },
            ]
        "#]]
        .assert_debug_eq(&changes);
    }

    #[test]
    fn rename_is_trimmed_to_the_changed_characters() {
        let shared = stmt("first");
        let old = unit(vec![shared.clone(), stmt("value")]);
        let new = unit(vec![shared, stmt("values")]);
        let changes = check_round_trip(&old, &new);
        assert_eq!(changes, vec![TextChange::insert(TextSize::new(13), "s")]);
        assert_eq!(new.get_changed_spans(&old), vec![TextRange::new(8.into(), 15.into())]);
    }

    #[test]
    fn deletions_at_both_ends() {
        let items: Vec<_> = ["a", "b", "c", "d"].into_iter().map(stmt).collect();
        let old = unit(items.clone());
        let new = unit(items[1..3].to_vec());
        let changes = check_round_trip(&old, &new);
        assert_eq!(changes.len(), 2);
        check_round_trip(&new, &old);
        check_round_trip(&old, &unit(Vec::new()));
    }

    #[test]
    fn unrelated_trees_still_round_trip() {
        let old = unit(vec![stmt("x"), stmt("y")]);
        let new = unit((0..12).map(|index| stmt(&format!("v{index}"))).collect());
        check_round_trip(&old, &new);
        check_round_trip(&new, &old);
    }

    #[test]
    fn equivalence_ignores_sharing_and_trivia() {
        let old = unit(vec![stmt("a"), stmt("b")]);
        let new = unit(vec![stmt("a"), stmt("b")]);
        assert!(old.is_equivalent_to(&old, false));
        assert!(old.is_equivalent_to(&new, false));
        assert!(!old.is_equivalent_to(&unit(vec![stmt("a")]), false));
        assert!(!old.is_equivalent_to(&unit(vec![stmt("a"), stmt("c")]), false));
    }
}
