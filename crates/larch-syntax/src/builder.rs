//! Bottom-up construction of shape trees from parser events.

use larch_errors::ErrorCode;
use text_size::TextSize;

use crate::green::{GreenDiagnostic, GreenElement, GreenNode, GreenToken};
use crate::{NodeOrToken, SyntaxKind};

struct Opened {
    kind: Option<SyntaxKind>,
    /// A `None` entry is an empty slot of a fixed-layout node.
    children: Vec<Option<GreenElement>>,
    width: TextSize,
    diagnostics: Vec<GreenDiagnostic>,
}

/// Builds a `GreenNode` from a well-nested sequence of start and finish
/// calls. Lists are opened like nodes and collapse into a single slot of
/// their parent when finished.
pub struct GreenBuilder {
    opened: Vec<Opened>,
    children_pool: Vec<Vec<Option<GreenElement>>>,
    root: Option<GreenNode>,
}

impl Drop for GreenBuilder {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.opened.is_empty() {
            panic!("you should call `GreenBuilder::finish()`");
        }
    }
}

const DEFAULT_TREE_DEPTH: usize = 128;
const DEFAULT_CHILDREN_LEN: usize = 10;

impl Default for GreenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GreenBuilder {
    pub fn new() -> Self {
        Self {
            opened: Vec::with_capacity(DEFAULT_TREE_DEPTH),
            children_pool: Vec::with_capacity(DEFAULT_TREE_DEPTH),
            root: None,
        }
    }

    /// Retrieves a recycled children buffer or allocates a new one.
    fn new_children_vec(&mut self) -> Vec<Option<GreenElement>> {
        self.children_pool.pop().unwrap_or_else(|| Vec::with_capacity(DEFAULT_CHILDREN_LEN))
    }

    /// Returns a children buffer to the pool.
    fn recycle_children_vec(&mut self, mut vec: Vec<Option<GreenElement>>) {
        vec.clear();
        self.children_pool.push(vec);
    }

    fn open(&mut self, kind: Option<SyntaxKind>) {
        let children = self.new_children_vec();
        self.opened.push(Opened {
            kind,
            children,
            width: TextSize::new(0),
            diagnostics: Vec::new(),
        });
    }

    fn push(&mut self, element: Option<GreenElement>) {
        let width = element.as_ref().map_or(TextSize::new(0), GreenElement::full_width);
        match self.opened.last_mut() {
            Some(parent) => {
                parent.width += width;
                parent.children.push(element);
            }
            None => match element {
                Some(NodeOrToken::Node(node)) if self.root.is_none() => self.root = Some(node),
                _ => panic!("only a single root node can be built"),
            },
        }
    }

    /// Starts a new node of the given kind.
    pub fn start_node(&mut self, kind: SyntaxKind) {
        debug_assert!(!kind.is_list());
        self.open(Some(kind));
    }

    /// Finishes the most recently started node.
    #[track_caller]
    pub fn finish_node(&mut self) {
        let mut opened = self.opened.pop().expect("no opened nodes?");
        let Some(kind) = opened.kind else {
            panic!("expected an opened node, found an opened list");
        };
        let mut node = GreenNode::new(kind, opened.children.drain(..));
        if !opened.diagnostics.is_empty() {
            node = node.with_diagnostics(opened.diagnostics);
        }
        self.recycle_children_vec(opened.children);
        self.push(Some(NodeOrToken::Node(node)));
    }

    /// Starts a list occupying one slot of the current node.
    pub fn start_list(&mut self) {
        assert!(!self.opened.is_empty(), "a list needs an enclosing node");
        self.open(None);
    }

    /// Finishes the most recently started list.
    #[track_caller]
    pub fn finish_list(&mut self) {
        let mut opened = self.opened.pop().expect("no opened lists?");
        if opened.kind.is_some() {
            panic!("expected an opened list, found an opened node");
        }
        debug_assert!(opened.diagnostics.is_empty());
        let list = GreenNode::list(opened.children.drain(..).flatten());
        self.recycle_children_vec(opened.children);
        self.push(list);
    }

    /// Adds a token to the current node or list.
    pub fn token(&mut self, token: GreenToken) {
        self.push(Some(NodeOrToken::Token(token)));
    }

    /// Adds an already built node, typically one reused from an older tree.
    pub fn node(&mut self, node: GreenNode) {
        self.push(Some(NodeOrToken::Node(node)));
    }

    /// Leaves the next slot of the current node empty.
    pub fn absent(&mut self) {
        debug_assert!(self.opened.last().is_some_and(|opened| opened.kind.is_some()));
        self.push(None);
    }

    /// Attaches a zero-width diagnostic to the innermost open node at the
    /// current position.
    pub fn error(&mut self, code: ErrorCode, args: &[&str]) {
        let mut offset = TextSize::new(0);
        for opened in self.opened.iter_mut().rev() {
            offset += opened.width;
            if opened.kind.is_some() {
                opened.diagnostics.push(GreenDiagnostic::new(code, args, offset, 0.into()));
                return;
            }
        }
        panic!("no opened node to report an error on");
    }

    /// Finishes building and returns the root node.
    pub fn finish(mut self) -> GreenNode {
        assert!(self.opened.is_empty());
        self.root.take().expect("no root node was built")
    }
}
