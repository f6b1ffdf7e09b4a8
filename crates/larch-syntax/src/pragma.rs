//! `#pragma warning` suppression state.

use rustc_hash::FxHashMap;
use text_size::TextSize;

use crate::directives::directive_trivia;
use crate::green::{GreenElement, GreenNode};
use crate::{NodeOrToken, SyntaxKind, SyntaxTree};

/// Whether a warning is reported at some position.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ReportState {
    #[default]
    Default,
    Suppressed,
}

#[derive(Clone, Debug, Default)]
struct State {
    general: ReportState,
    specific: FxHashMap<u16, ReportState>,
}

/// Suppression state after each `#pragma warning` directive.
pub(crate) struct PragmaMap {
    ends: Vec<TextSize>,
    states: Vec<State>,
}

/// Warning numbers named by a code token: `1030` or `LX1030`.
fn code_number(kind: SyntaxKind, text: &str) -> Option<u16> {
    match kind {
        SyntaxKind::INT_NUMBER => text.parse().ok(),
        SyntaxKind::NAME => text.strip_prefix("LX")?.parse().ok(),
        _ => None,
    }
}

fn codes(element: Option<&GreenElement>) -> Vec<u16> {
    let mut codes = Vec::new();
    let mut push = |element: &GreenElement| {
        if let NodeOrToken::Token(token) = element
            && let Some(code) = code_number(token.kind(), token.text())
        {
            codes.push(code);
        }
    };
    match element {
        Some(NodeOrToken::Node(list)) if list.is_list() => {
            list.slots().flatten().for_each(&mut push);
        }
        Some(element) => push(element),
        None => {}
    }
    codes
}

fn apply(state: &State, directive: &GreenNode) -> Option<State> {
    let action = match directive.slot(3)? {
        NodeOrToken::Token(token) if !token.is_missing() => token.kind(),
        _ => return None,
    };
    let report = match action {
        SyntaxKind::DISABLE_KW => ReportState::Suppressed,
        SyntaxKind::RESTORE_KW => ReportState::Default,
        _ => return None,
    };
    let codes = codes(directive.slot(4));
    if codes.is_empty() {
        return Some(State { general: report, specific: FxHashMap::default() });
    }
    let mut next = state.clone();
    next.specific.extend(codes.into_iter().map(|code| (code, report)));
    Some(next)
}

impl PragmaMap {
    pub(crate) fn build(tree: &SyntaxTree) -> Self {
        let mut ends = Vec::new();
        let mut states: Vec<State> = Vec::new();
        for (start, directive) in directive_trivia(tree.green()) {
            if directive.kind() != SyntaxKind::PRAGMA_WARNING_DIRECTIVE {
                continue;
            }
            let current = states.last().cloned().unwrap_or_default();
            if let Some(next) = apply(&current, &directive) {
                ends.push(start + directive.full_width());
                states.push(next);
            }
        }
        tracing::trace!(pragmas = states.len(), "built pragma map");
        Self { ends, states }
    }

    pub(crate) fn state(&self, code: u16, position: TextSize) -> ReportState {
        let index = self.ends.partition_point(|&end| end <= position);
        let Some(state) = index.checked_sub(1).map(|index| &self.states[index]) else {
            return ReportState::Default;
        };
        state.specific.get(&code).copied().unwrap_or(state.general)
    }
}
