use std::collections::VecDeque;

use drop_bomb::DropBomb;
use larch_syntax::green::{GreenDiagnostic, GreenNode, GreenToken, GreenTrivia, GreenTriviaList};
use larch_syntax::{
    CancellationToken, Cancelled, DirectiveStack, ErrorCode, GreenBuilder, ParseResult,
    SyntaxKind, SyntaxSet,
};
use larch_tokenizer::{Token, Tokenizer};
use text_size::TextSize;

use crate::incremental::Incremental;

pub(crate) struct Parser<'a> {
    text: &'a str,
    tokenizer: Tokenizer<'a>,
    lookahead: VecDeque<Token>,
    events: Vec<Event>,
    /// Skipped tokens waiting to lead the next consumed token.
    skipped: Vec<GreenTrivia>,
    cancel: &'a CancellationToken,
    cancelled: bool,
    incremental: Option<Incremental<'a>>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        text: &'a str,
        directives: DirectiveStack,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            text,
            tokenizer: Tokenizer::new(text, directives),
            lookahead: VecDeque::with_capacity(4),
            events: Vec::new(),
            skipped: Vec::new(),
            cancel,
            cancelled: false,
            incremental: None,
        }
    }

    pub(crate) fn with_incremental(mut self, incremental: Incremental<'a>) -> Self {
        self.incremental = Some(incremental);
        self
    }

    fn fill(&mut self, n: usize) {
        while self.lookahead.len() <= n {
            let token = self.tokenizer.next_token();
            self.lookahead.push_back(token);
        }
    }

    pub(crate) fn nth(&mut self, n: usize) -> SyntaxKind {
        self.fill(n);
        self.lookahead[n].kind()
    }

    pub(crate) fn peek_kind(&mut self) -> SyntaxKind {
        self.nth(0)
    }

    pub(crate) fn at(&mut self, kind: SyntaxKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn at_set(&mut self, set: &SyntaxSet) -> bool {
        let kind = self.peek_kind();
        set.contains(kind)
    }

    fn pop(&mut self) -> Token {
        self.fill(0);
        let token = self.lookahead.pop_front();
        token.unwrap_or_else(|| unreachable!("lookahead was just filled"))
    }

    pub(crate) fn advance(&mut self) {
        let token = self.pop();
        let mut green = token.green;
        if !self.skipped.is_empty() {
            let skipped = std::mem::take(&mut self.skipped);
            let shift: TextSize = skipped.iter().map(GreenTrivia::full_width).sum();
            let mut leading = skipped;
            leading.extend(green.leading().pieces().iter().cloned());
            let diagnostics = shifted(green.diagnostics(), shift);
            green = green.with_leading(GreenTriviaList::new(leading)).with_diagnostics(diagnostics);
        }
        self.events.push(Event::Token(green));
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a token of `kind`, or stands in a missing one and reports it.
    pub(crate) fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        match kind.fixed_text() {
            Some(text) => self.error(ErrorCode::TokenExpected, Some(text)),
            None => self.error(ErrorCode::IdentifierExpected, None),
        }
        self.missing(kind);
        false
    }

    pub(crate) fn missing(&mut self, kind: SyntaxKind) {
        self.events.push(Event::Token(GreenToken::missing(kind)));
    }

    pub(crate) fn absent(&mut self) {
        self.events.push(Event::Absent);
    }

    /// Reports `code` at the current position on the innermost open node.
    pub(crate) fn error(&mut self, code: ErrorCode, arg: Option<&'static str>) {
        self.events.push(Event::Error { code, arg });
    }

    /// Moves the current token into skipped-tokens trivia of the next one.
    pub(crate) fn skip(&mut self) {
        if self.at(SyntaxKind::EOF) {
            return;
        }
        let token = self.pop().green;
        let mut node = GreenNode::new(
            SyntaxKind::SKIPPED_TOKENS_TRIVIA,
            [GreenNode::list([token.clone().into()])],
        );
        if token.diagnostics().is_empty() {
            node = node.with_diagnostics(vec![GreenDiagnostic::new(
                ErrorCode::UnexpectedToken,
                &[token.text()],
                token.leading().full_width(),
                token.width(),
            )]);
        }
        self.skipped.push(GreenTrivia::structured(node));
    }

    pub(crate) fn start(&mut self) -> Marker {
        let pos = self.events.len() as u32;
        self.events.push(Event::TOMBSTONE);
        Marker::new(pos)
    }

    pub(crate) fn start_list(&mut self) {
        self.events.push(Event::StartList);
    }

    pub(crate) fn finish_list(&mut self) {
        self.events.push(Event::FinishList);
    }

    /// Records cancellation; once set, callers unwind without parsing further.
    pub(crate) fn cancelled(&mut self) -> bool {
        self.cancelled |= self.cancel.is_cancelled();
        self.cancelled
    }

    /// Splices in an old node of one of `kinds` if it starts at the current
    /// token and parses the same in the new text.
    pub(crate) fn try_reuse(&mut self, kinds: &SyntaxSet) -> bool {
        if !self.skipped.is_empty() {
            return false;
        }
        self.fill(0);
        let Some(incremental) = &mut self.incremental else { return false };
        let Some(reuse) = incremental.reuse(&self.lookahead[0], kinds) else { return false };
        self.lookahead.clear();
        self.tokenizer = Tokenizer::resume(self.text, reuse.resume_at, reuse.directives);
        self.events.push(Event::Reuse(reuse.node));
        true
    }

    pub(crate) fn finish(self) -> Result<ParseResult, Cancelled> {
        if self.cancelled {
            tracing::debug!(len = self.text.len(), "parse cancelled");
            return Err(Cancelled);
        }
        if let Some(incremental) = &self.incremental {
            incremental.report();
        }
        tracing::trace!(len = self.text.len(), events = self.events.len(), "parse finished");
        let directives = self.tokenizer.directives().clone();
        let root = build_tree(self.events);
        Ok(ParseResult { root, directives })
    }
}

fn shifted(diagnostics: &[GreenDiagnostic], by: TextSize) -> Vec<GreenDiagnostic> {
    diagnostics
        .iter()
        .map(|diagnostic| {
            let args: Vec<&str> = diagnostic.args().iter().map(|arg| &**arg).collect();
            GreenDiagnostic::new(
                diagnostic.code(),
                &args,
                diagnostic.offset() + by,
                diagnostic.width(),
            )
        })
        .collect()
}

fn build_tree(mut events: Vec<Event>) -> GreenNode {
    let mut builder = GreenBuilder::new();
    let mut forward_parents = Vec::new();

    for i in 0..events.len() {
        match std::mem::replace(&mut events[i], Event::TOMBSTONE) {
            Event::Start { kind, forward_parent } => {
                if kind == SyntaxKind::TOMBSTONE {
                    continue;
                }

                forward_parents.push(kind);
                let mut idx = i;
                let mut fp = forward_parent;
                while let Some(fwd) = fp {
                    idx += fwd as usize;

                    fp = match std::mem::replace(&mut events[idx], Event::TOMBSTONE) {
                        Event::Start { kind, forward_parent } => {
                            if kind != SyntaxKind::TOMBSTONE {
                                forward_parents.push(kind);
                            }
                            forward_parent
                        }
                        _ => unreachable!(),
                    };
                }

                for kind in forward_parents.drain(..).rev() {
                    builder.start_node(kind);
                }
            }
            Event::Finish => builder.finish_node(),
            Event::StartList => builder.start_list(),
            Event::FinishList => builder.finish_list(),
            Event::Token(token) => builder.token(token),
            Event::Absent => builder.absent(),
            Event::Error { code, arg } => builder.error(code, arg.as_slice()),
            Event::Reuse(node) => builder.node(node),
        }
    }

    builder.finish()
}

enum Event {
    Start { kind: SyntaxKind, forward_parent: Option<u32> },
    Finish,
    StartList,
    FinishList,
    Token(GreenToken),
    Absent,
    Error { code: ErrorCode, arg: Option<&'static str> },
    Reuse(GreenNode),
}

impl Event {
    const TOMBSTONE: Self = Self::Start { kind: SyntaxKind::TOMBSTONE, forward_parent: None };
}

pub(crate) struct Marker {
    position: u32,
    bomb: DropBomb,
}

impl Marker {
    fn new(pos: u32) -> Self {
        Self { position: pos, bomb: DropBomb::new("Marker must be completed") }
    }

    pub(crate) fn complete(mut self, p: &mut Parser<'_>, kind: SyntaxKind) -> CompletedMarker {
        self.bomb.defuse();

        match &mut p.events[self.position as usize] {
            Event::Start { kind: slot, .. } => {
                *slot = kind;
            }
            _ => unreachable!(),
        }

        p.events.push(Event::Finish);
        CompletedMarker::new(self.position)
    }
}

pub(crate) struct CompletedMarker {
    pos: u32,
}

impl CompletedMarker {
    fn new(pos: u32) -> Self {
        Self { pos }
    }

    pub(crate) fn precede(self, p: &mut Parser<'_>) -> Marker {
        let new_pos = p.start();

        match &mut p.events[self.pos as usize] {
            Event::Start { forward_parent, .. } => {
                *forward_parent = Some(new_pos.position - self.pos);
            }
            _ => unreachable!(),
        }

        new_pos
    }
}
