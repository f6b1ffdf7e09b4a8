//! Reuse of old nodes while parsing edited text.
//!
//! The new text is parsed from the start. At every item, member and
//! statement boundary the parser asks whether the old tree has a node of a
//! legal kind starting at the same place in the unchanged text around the
//! edit. Such a node is spliced in by reference when its tokens are bound to
//! lex and parse exactly as they did before.

use larch_syntax::green::GreenNode;
use larch_syntax::{DirectiveStack, SyntaxSet, SyntaxTree, TextChangeRange};
use larch_tokenizer::{Token, Tokenizer, at_line_start};
use text_size::TextSize;

pub(crate) struct Incremental<'a> {
    old: &'a SyntaxTree,
    change: TextChangeRange,
    new_text: &'a str,
    reused: usize,
    reused_width: TextSize,
}

pub(crate) struct Reuse {
    pub(crate) node: GreenNode,
    /// Where lexing continues in the new text.
    pub(crate) resume_at: TextSize,
    pub(crate) directives: DirectiveStack,
}

impl<'a> Incremental<'a> {
    pub(crate) fn new(old: &'a SyntaxTree, change: TextChangeRange, new_text: &'a str) -> Self {
        Self { old, change, new_text, reused: 0, reused_width: TextSize::new(0) }
    }

    /// The old position of new position `position`, unless it is inside the
    /// changed region.
    fn old_position(&self, position: TextSize) -> Option<TextSize> {
        let start = self.change.span.start();
        if position < start {
            return Some(position);
        }
        let new_end = start + self.change.new_len;
        (position >= new_end).then(|| position - new_end + self.change.span.end())
    }

    pub(crate) fn reuse(&mut self, token: &Token, kinds: &SyntaxSet) -> Option<Reuse> {
        let position = token.offset;
        let old_position = self.old_position(position)?;
        // Directives before the first token are lexed differently.
        if (old_position == TextSize::new(0)) != (position == TextSize::new(0)) {
            return None;
        }

        let old_token = self.old.root().find_token(old_position)?;
        if old_token.full_span().start() != old_position {
            return None;
        }
        let node = old_token
            .parent_ancestors()
            .take_while(|node| node.offset() == old_position)
            .filter(|node| kinds.contains(node.kind()))
            .last()?;
        let green = node.green();
        if !green.kind().is_self_delimiting() || green.contains_diagnostics() {
            return None;
        }
        if token.directives != self.old.directive_stack_at(old_position)
            || at_line_start(self.new_text, position)
                != at_line_start(self.old.text(), old_position)
        {
            return None;
        }

        let old_end = old_position + green.full_width();
        if old_end <= self.change.span.start() {
            // Text after the node may now extend its last token or trivia.
            let last = node.last_token()?;
            let start = last.span().start();
            let relexed =
                Tokenizer::resume(self.new_text, start, self.old.directive_stack_at(start));
            let relexed = &relexed.peek().green;
            if relexed.kind() != last.kind()
                || relexed.width() != last.green().width()
                || relexed.trailing().full_width() != last.green().trailing().full_width()
            {
                return None;
            }
        } else if old_position < self.change.span.end() {
            return None;
        }

        self.reused += 1;
        self.reused_width += green.full_width();
        Some(Reuse {
            node: green.clone(),
            resume_at: position + green.full_width(),
            directives: self.old.directive_stack_at(old_end),
        })
    }

    pub(crate) fn report(&self) {
        tracing::debug!(
            reused = self.reused,
            reused_width = u32::from(self.reused_width),
            change = ?self.change.span,
            new_len = u32::from(self.change.new_len),
            "incremental reparse"
        );
    }
}
