//! `#line` remapping.

use camino::Utf8Path;
use text_size::{TextRange, TextSize};

use crate::directives::directive_trivia;
use crate::green::GreenNode;
use crate::text::{FileLinePositionSpan, LinePosition, MappedLineSpan, SourceText};
use crate::{NodeOrToken, SyntaxKind, SyntaxTree};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Mapping {
    Unmapped,
    /// Line `anchor` of the file is reported as `mapped_line`.
    Remapped { anchor: u32, mapped_line: u32, path: Option<Box<str>> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    /// First line the entry applies to.
    line: u32,
    mapping: Mapping,
    hidden: bool,
}

enum LineValue<'a> {
    Number(u32, Option<&'a str>),
    Default,
    Hidden,
}

fn token_slot(node: &GreenNode, slot: usize) -> Option<(SyntaxKind, &str)> {
    match node.slot(slot)? {
        NodeOrToken::Token(token) if !token.is_missing() => Some((token.kind(), token.text())),
        _ => None,
    }
}

fn line_value(directive: &GreenNode) -> Option<LineValue<'_>> {
    match token_slot(directive, 2)? {
        (SyntaxKind::DEFAULT_KW, _) => Some(LineValue::Default),
        (SyntaxKind::HIDDEN_KW, _) => Some(LineValue::Hidden),
        (SyntaxKind::INT_NUMBER, digits) => {
            let line = digits.parse::<u32>().ok().filter(|&line| line > 0)?;
            let path = match token_slot(directive, 3) {
                Some((SyntaxKind::STRING, quoted)) => {
                    Some(quoted.trim_start_matches('"').trim_end_matches('"'))
                }
                _ => None,
            };
            Some(LineValue::Number(line, path))
        }
        _ => None,
    }
}

/// Line mappings in effect from each `#line` directive on, by line.
pub(crate) struct LineMap {
    entries: Vec<Entry>,
}

impl LineMap {
    pub(crate) fn build(tree: &SyntaxTree) -> Self {
        let text = tree.source_text();
        let mut entries = vec![Entry { line: 0, mapping: Mapping::Unmapped, hidden: false }];
        for (start, directive) in directive_trivia(tree.green()) {
            if directive.kind() != SyntaxKind::LINE_DIRECTIVE {
                continue;
            }
            let Some(value) = line_value(&directive) else { continue };
            let end = start + directive.full_width();
            let line = next_line(text, end);
            let previous = entries.last().map_or(Mapping::Unmapped, |entry| entry.mapping.clone());
            let entry = match value {
                LineValue::Default => Entry { line, mapping: Mapping::Unmapped, hidden: false },
                LineValue::Hidden => Entry { line, mapping: previous, hidden: true },
                LineValue::Number(mapped, path) => {
                    let path = path.map(Box::from).or(match previous {
                        Mapping::Remapped { path, .. } => path,
                        Mapping::Unmapped => None,
                    });
                    let mapping =
                        Mapping::Remapped { anchor: line, mapped_line: mapped - 1, path };
                    Entry { line, mapping, hidden: false }
                }
            };
            // A later directive for the same line wins.
            if entries.last().is_some_and(|last| last.line == line) {
                entries.pop();
            }
            entries.push(entry);
        }
        tracing::trace!(entries = entries.len(), "built line map");
        Self { entries }
    }

    fn entry(&self, line: u32) -> &Entry {
        let index = self.entries.partition_point(|entry| entry.line <= line);
        &self.entries[index.saturating_sub(1)]
    }

    pub(crate) fn has_hidden_regions(&self) -> bool {
        self.entries.iter().any(|entry| entry.hidden)
    }

    pub(crate) fn map(
        &self,
        text: &SourceText,
        path: &Utf8Path,
        range: TextRange,
    ) -> MappedLineSpan {
        let start = text.line_position(range.start());
        let end = text.line_position(range.end());
        let entry = self.entry(start.line);
        let span = match &entry.mapping {
            Mapping::Unmapped => {
                FileLinePositionSpan { path: path.to_string(), start, end, has_mapped_path: false }
            }
            Mapping::Remapped { anchor, mapped_line, path: mapped_path } => {
                let remap = |position: LinePosition| LinePosition {
                    line: mapped_line + position.line.saturating_sub(*anchor),
                    column: position.column,
                };
                FileLinePositionSpan {
                    path: mapped_path.as_deref().map_or_else(|| path.to_string(), str::to_owned),
                    start: remap(start),
                    end: remap(end),
                    has_mapped_path: mapped_path.is_some(),
                }
            }
        };
        MappedLineSpan { span, is_hidden: entry.hidden }
    }
}

/// The first line starting at or after `offset`.
fn next_line(text: &SourceText, offset: TextSize) -> u32 {
    let position = text.line_position(offset);
    if position.column == 0 { position.line } else { position.line + 1 }
}
