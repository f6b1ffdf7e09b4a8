//! Inserting into and removing from lists, and editing trivia runs.

use crate::green::{GreenElement, GreenNode, GreenToken, GreenTrivia, GreenTriviaList};
use crate::{EditError, ListShape, NodeOrToken, SyntaxKind, SyntaxList, SyntaxNode, SyntaxTrivia};

/// Where a list lives: the node owning the slot, the slot, and its elements.
struct ListSite {
    owner: SyntaxNode,
    slot: usize,
    shape: ListShape,
    elements: Vec<GreenElement>,
}

impl ListSite {
    fn of_list(list: &SyntaxList) -> Result<Self, EditError> {
        let owner = list.owner().clone();
        let shape = owner.kind().slot_list_shape(list.slot()).ok_or(EditError::NotInList)?;
        let elements = match owner.green().slot(list.slot()) {
            None => Vec::new(),
            Some(NodeOrToken::Node(node)) if node.is_list() => {
                node.slots().flatten().cloned().collect()
            }
            Some(element) => vec![element.clone()],
        };
        Ok(Self { owner, slot: list.slot(), shape, elements })
    }

    /// The list holding `element`, and the element's index among the items.
    fn of_element(element: &SyntaxNode) -> Result<(Self, usize), EditError> {
        let parent = element.raw_parent().ok_or(EditError::NotInList)?;
        let (list, position) = if parent.kind().is_list() {
            let owner = parent.raw_parent().ok_or(EditError::NotInList)?;
            (SyntaxList::new(owner, parent.index()), element.index())
        } else {
            (SyntaxList::new(parent, element.index()), 0)
        };
        let site = Self::of_list(&list)?;
        let index = match site.shape {
            ListShape::Plain => position,
            ListShape::Separated(_) if position % 2 == 0 => position / 2,
            ListShape::Separated(_) => return Err(EditError::NotInList),
        };
        Ok((site, index))
    }

    fn item_count(&self) -> usize {
        match self.shape {
            ListShape::Plain => self.elements.len(),
            ListShape::Separated(_) => self.elements.len().div_ceil(2),
        }
    }

    /// Replaces `remove` items starting at item `index` by `items`.
    fn splice(
        self,
        index: usize,
        remove: usize,
        items: Vec<GreenElement>,
    ) -> Result<(SyntaxNode, GreenNode), EditError> {
        let len = self.item_count();
        if index > len || index + remove > len {
            return Err(EditError::IndexOutOfRange { index: index + remove, len });
        }
        let elements = match self.shape {
            ListShape::Plain => {
                let mut elements = self.elements;
                elements.splice(index..index + remove, items);
                elements
            }
            ListShape::Separated(separator) => {
                splice_separated(self.elements, separator, index, remove, items)
            }
        };
        let green = self.owner.green().with_slot(self.slot, GreenNode::list(elements));
        Ok((self.owner, green))
    }
}

/// A separator for a new gap, modelled on the list's existing ones. Spacing
/// after a separator leads the next item, so a new one is bare.
fn fresh_separator(existing: &[GreenToken], kind: SyntaxKind) -> GreenToken {
    existing.first().cloned().unwrap_or_else(|| GreenToken::fixed(kind))
}

/// Rewrites the leading trivia of the first token of `element`. `map`
/// returning `None` leaves the element as it is.
fn map_leading(
    element: GreenElement,
    map: &dyn Fn(&GreenTriviaList) -> Option<GreenTriviaList>,
) -> GreenElement {
    match element {
        NodeOrToken::Token(token) => match map(token.leading()) {
            Some(leading) => token.with_leading(leading).into(),
            None => token.into(),
        },
        NodeOrToken::Node(node) => {
            let first = node.slots().enumerate().find_map(|(index, slot)| match slot? {
                NodeOrToken::Node(child) if child.first_token().is_none() => None,
                child => Some((index, child.clone())),
            });
            match first {
                Some((index, child)) => node.with_slot(index, Some(map_leading(child, map))).into(),
                None => node.into(),
            }
        }
    }
}

/// An item following a separator gets a space unless it brings its own trivia.
fn spaced(element: GreenElement) -> GreenElement {
    map_leading(element, &|leading: &GreenTriviaList| {
        let space = || GreenTriviaList::new([GreenTrivia::new(SyntaxKind::WHITESPACE, " ")]);
        leading.is_empty().then(space)
    })
}

/// A new first item drops the whitespace it had after a separator.
fn unspaced(element: GreenElement) -> GreenElement {
    map_leading(element, &|leading: &GreenTriviaList| {
        let pieces = leading.pieces();
        let blank = !pieces.is_empty()
            && pieces.iter().all(|piece| piece.kind() == SyntaxKind::WHITESPACE);
        blank.then(GreenTriviaList::empty)
    })
}

fn splice_separated(
    elements: Vec<GreenElement>,
    kind: SyntaxKind,
    index: usize,
    remove: usize,
    items: Vec<GreenElement>,
) -> Vec<GreenElement> {
    // Each item paired with the separator that follows it.
    let mut pairs: Vec<(GreenElement, Option<GreenToken>)> = Vec::new();
    let mut separators = Vec::new();
    let mut elements = elements.into_iter();
    while let Some(item) = elements.next() {
        let separator = elements.next().and_then(NodeOrToken::into_token);
        separators.extend(separator.clone());
        pairs.push((item, separator));
    }
    let trailing = pairs.last().and_then(|(_, separator)| separator.clone());
    let fresh = fresh_separator(&separators, kind);
    let inserted = items.len();
    let items = items.into_iter().enumerate().map(|(offset, item)| {
        let item = if index + offset > 0 { spaced(item) } else { item };
        (item, Some(fresh.clone()))
    });
    pairs.splice(index..index + remove, items);
    // The old item now at the front, or the one pushed behind new items.
    if index == 0 && inserted < pairs.len() {
        let (item, _) = &mut pairs[inserted];
        let old = item.clone();
        *item = if inserted == 0 { unspaced(old) } else { spaced(old) };
    }

    let last = pairs.len().saturating_sub(1);
    let mut rebuilt = Vec::with_capacity(pairs.len() * 2);
    for (position, (item, separator)) in pairs.into_iter().enumerate() {
        rebuilt.push(item);
        let separator =
            if position == last { trailing.clone() } else { separator.or(Some(fresh.clone())) };
        rebuilt.extend(separator.map(GreenElement::from));
    }
    rebuilt
}

impl SyntaxNode {
    fn apply_list_edit(
        &self,
        (owner, green): (SyntaxNode, GreenNode),
    ) -> Result<SyntaxNode, EditError> {
        self.replace_node(&owner, green)
    }

    /// Inserts `nodes` into `list` before item `index`. Separators are added
    /// as needed.
    pub fn insert_into_list(
        &self,
        list: &SyntaxList,
        index: usize,
        nodes: Vec<GreenNode>,
    ) -> Result<SyntaxNode, EditError> {
        let site = ListSite::of_list(list)?;
        let items = nodes.into_iter().map(GreenElement::from).collect();
        self.apply_list_edit(site.splice(index, 0, items)?)
    }

    pub fn insert_before(
        &self,
        anchor: &SyntaxNode,
        nodes: Vec<GreenNode>,
    ) -> Result<SyntaxNode, EditError> {
        let (site, index) = ListSite::of_element(anchor)?;
        let items = nodes.into_iter().map(GreenElement::from).collect();
        self.apply_list_edit(site.splice(index, 0, items)?)
    }

    pub fn insert_after(
        &self,
        anchor: &SyntaxNode,
        nodes: Vec<GreenNode>,
    ) -> Result<SyntaxNode, EditError> {
        let (site, index) = ListSite::of_element(anchor)?;
        let items = nodes.into_iter().map(GreenElement::from).collect();
        self.apply_list_edit(site.splice(index + 1, 0, items)?)
    }

    /// Replaces a list item by any number of nodes, none removing it.
    pub fn replace_in_list(
        &self,
        anchor: &SyntaxNode,
        nodes: Vec<GreenNode>,
    ) -> Result<SyntaxNode, EditError> {
        let (site, index) = ListSite::of_element(anchor)?;
        let items = nodes.into_iter().map(GreenElement::from).collect();
        self.apply_list_edit(site.splice(index, 1, items)?)
    }

    pub fn remove_from_list(&self, anchor: &SyntaxNode) -> Result<SyntaxNode, EditError> {
        self.replace_in_list(anchor, Vec::new())
    }

    fn splice_trivia(
        &self,
        anchor: &SyntaxTrivia,
        at: usize,
        pieces: Vec<GreenTrivia>,
    ) -> Result<SyntaxNode, EditError> {
        let token = anchor.token();
        let green = token.green();
        let run = if anchor.is_leading() { green.leading() } else { green.trailing() };
        let mut rebuilt = run.pieces().to_vec();
        rebuilt.splice(at..at, pieces);
        let rebuilt = GreenTriviaList::new(rebuilt);
        let new_token = if anchor.is_leading() {
            green.with_leading(rebuilt)
        } else {
            green.with_trailing(rebuilt)
        };
        self.replace_token(token, new_token)
    }

    pub fn insert_trivia_before(
        &self,
        anchor: &SyntaxTrivia,
        pieces: Vec<GreenTrivia>,
    ) -> Result<SyntaxNode, EditError> {
        self.splice_trivia(anchor, anchor.index(), pieces)
    }

    pub fn insert_trivia_after(
        &self,
        anchor: &SyntaxTrivia,
        pieces: Vec<GreenTrivia>,
    ) -> Result<SyntaxNode, EditError> {
        self.splice_trivia(anchor, anchor.index() + 1, pieces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParseOptions, SeparatedSyntaxList, SyntaxTree};

    fn name_expr(text: &str) -> GreenNode {
        let name = GreenToken::new(
            GreenTriviaList::empty(),
            SyntaxKind::NAME,
            text,
            GreenTriviaList::empty(),
        );
        GreenNode::new(SyntaxKind::NAME_EXPR, [Some(name.into())])
    }

    fn space() -> GreenTriviaList {
        GreenTriviaList::new([GreenTrivia::new(SyntaxKind::WHITESPACE, " ")])
    }

    /// `f(args)` as a statement, laid out the way the tokenizer splits trivia.
    fn call(args: &[&str]) -> SyntaxTree {
        let mut elements = Vec::new();
        for (index, arg) in args.iter().enumerate() {
            if index > 0 {
                elements.push(GreenToken::fixed(SyntaxKind::COMMA).into());
                elements.push(spaced(name_expr(arg).into()));
            } else {
                elements.push(name_expr(arg).into());
            }
        }
        let arg_list = GreenNode::new(
            SyntaxKind::ARG_LIST,
            [
                Some(GreenToken::fixed(SyntaxKind::LEFT_PAREN).into()),
                GreenNode::list(elements),
                Some(GreenToken::fixed(SyntaxKind::RIGHT_PAREN).into()),
            ],
        );
        let call = GreenNode::new(
            SyntaxKind::CALL_EXPR,
            [Some(name_expr("f").into()), Some(arg_list.into())],
        );
        let stmt = GreenNode::new(
            SyntaxKind::EXPR_STMT,
            [Some(call.into()), Some(GreenToken::fixed(SyntaxKind::SEMICOLON).into())],
        );
        let unit = GreenNode::new(
            SyntaxKind::COMPILATION_UNIT,
            [Some(stmt.into()), Some(GreenToken::fixed(SyntaxKind::EOF).into())],
        );
        SyntaxTree::new(unit, ParseOptions::default())
    }

    fn args(root: &SyntaxNode) -> SeparatedSyntaxList {
        let arg_list =
            root.descendants().find(|node| node.kind() == SyntaxKind::ARG_LIST).unwrap();
        SeparatedSyntaxList::new(SyntaxList::new(arg_list, 1))
    }

    fn item_greens(list: &SeparatedSyntaxList) -> Vec<GreenNode> {
        list.iter().map(|item| item.into_node().unwrap().green().clone()).collect()
    }

    #[test]
    fn insert_before_adds_a_separator() {
        let tree = call(&["a", "b", "c"]);
        let root = tree.root();
        let before = args(&root);
        let b = before.get(1).unwrap().into_node().unwrap();

        let new_root = root.insert_before(&b, vec![name_expr("x")]).unwrap();
        assert_eq!(new_root.to_string(), "f(a, x, b, c);");

        let after = args(&new_root);
        assert_eq!(after.len(), 4);
        assert_eq!(after.separator_count(), 3);
        let (old_items, new_items) = (item_greens(&before), item_greens(&after));
        assert!(old_items[0].ptr_eq(&new_items[0]));
        assert!(old_items[1].ptr_eq(&new_items[2]));
        assert!(old_items[2].ptr_eq(&new_items[3]));
    }

    #[test]
    fn insert_after_the_last_item() {
        let tree = call(&["a"]);
        let root = tree.root();
        let a = args(&root).get(0).unwrap().into_node().unwrap();
        let new_root = root.insert_after(&a, vec![name_expr("b"), name_expr("c")]).unwrap();
        assert_eq!(new_root.to_string(), "f(a, b, c);");
    }

    #[test]
    fn removing_items_keeps_the_list_well_formed() {
        let tree = call(&["a", "b", "c"]);
        let root = tree.root();
        let list = args(&root);
        let c = list.get(2).unwrap().into_node().unwrap();
        assert_eq!(root.remove_from_list(&c).unwrap().to_string(), "f(a, b);");
        let a = list.get(0).unwrap().into_node().unwrap();
        assert_eq!(root.remove_from_list(&a).unwrap().to_string(), "f(b, c);");
    }

    #[test]
    fn insert_into_an_empty_list() {
        let tree = call(&[]);
        let root = tree.root();
        let list = args(&root).list().clone();
        let new_root =
            root.insert_into_list(&list, 0, vec![name_expr("x"), name_expr("y")]).unwrap();
        assert_eq!(new_root.to_string(), "f(x, y);");
        assert_eq!(
            root.insert_into_list(&list, 1, vec![name_expr("x")]).err(),
            Some(EditError::IndexOutOfRange { index: 1, len: 0 })
        );
    }

    #[test]
    fn anchors_outside_lists_are_rejected() {
        let tree = call(&["a"]);
        let root = tree.root();
        let callee = root.descendants().find(|node| node.kind() == SyntaxKind::CALL_EXPR).unwrap();
        let callee = callee.child_node(0).unwrap();
        assert_eq!(
            root.insert_before(&callee, vec![name_expr("x")]).err(),
            Some(EditError::NotInList)
        );
    }

    #[test]
    fn trivia_insertion() {
        let tree = call(&["a"]);
        let root = tree.root();
        let first = root.first_token().unwrap();
        let new_root = root.replace_token(&first, first.green().with_leading(space())).unwrap();
        let space = new_root.first_token().unwrap().leading_trivia().next().unwrap();
        let comment = GreenTrivia::new(SyntaxKind::BLOCK_COMMENT, "/* call */");
        let new_root = new_root.insert_trivia_after(&space, vec![comment]).unwrap();
        assert_eq!(new_root.to_string(), " /* call */f(a);");
    }

    #[test]
    fn new_separators_leave_spacing_to_the_next_item() {
        let tree = call(&["a"]);
        let root = tree.root();
        let a = args(&root).get(0).unwrap().into_node().unwrap();
        let new_root = root.insert_after(&a, vec![name_expr("b")]).unwrap();
        assert_eq!(new_root.to_string(), "f(a, b);");

        let list = args(&new_root);
        let comma = list.separator(0).unwrap();
        assert_eq!(comma.trailing_trivia().len(), 0);
        let b = list.get(1).unwrap().into_node().unwrap();
        let leading: Vec<_> = b.first_token().unwrap().leading_trivia().collect();
        assert_eq!(format!("{leading:?}"), "[WHITESPACE@4..5]");
    }

    #[test]
    fn inserting_at_the_front_spaces_the_old_first_item() {
        let tree = call(&["a", "b"]);
        let root = tree.root();
        let list = args(&root).list().clone();
        let new_root = root.insert_into_list(&list, 0, vec![name_expr("x")]).unwrap();
        assert_eq!(new_root.to_string(), "f(x, a, b);");
        assert_eq!(new_root.debug_dump(), call(&["x", "a", "b"]).root().debug_dump());
    }

    #[test]
    fn items_keep_their_own_leading_trivia() {
        let tree = call(&["a"]);
        let root = tree.root();
        let list = args(&root).list().clone();
        let comment = GreenTrivia::new(SyntaxKind::BLOCK_COMMENT, "/**/");
        let name = GreenToken::new(
            GreenTriviaList::new([comment]),
            SyntaxKind::NAME,
            "b",
            GreenTriviaList::empty(),
        );
        let item = GreenNode::new(SyntaxKind::NAME_EXPR, [Some(name.into())]);
        let new_root = root.insert_into_list(&list, 1, vec![item]).unwrap();
        assert_eq!(new_root.to_string(), "f(a,/**/b);");
    }
}
