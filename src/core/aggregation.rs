//! Sub-word aggregation for raw token-classifier output.
//!
//! Implements the "simple" strategy: contiguous tokens sharing an entity
//! type merge into one group, a `B-` tag opens a new group, `O` closes the
//! current one. The group score is the mean of its token scores.

use crate::domain::strip_bio_prefix;
use crate::engines::TokenPrediction;

use super::text::char_span_to_bytes;

/// Tag value for tokens outside any entity
const OUTSIDE: &str = "O";

/// Merge raw per-token predictions into entity groups.
///
/// Already-aggregated predictions pass through unchanged. `source` is the
/// analyzed text; when tokens carry character offsets the group word is
/// cut from it, otherwise token pieces are joined.
pub fn aggregate_simple(tokens: &[TokenPrediction], source: &str) -> Vec<TokenPrediction> {
    let mut groups = Vec::new();
    let mut current: Option<PendingGroup> = None;

    for token in tokens {
        let tag = token
            .entity_group
            .as_deref()
            .or(token.entity.as_deref())
            .unwrap_or(OUTSIDE)
            .trim();
        let (prefix, kind) = split_tag(tag);

        if kind.is_empty() || kind.eq_ignore_ascii_case(OUTSIDE) {
            flush(&mut current, &mut groups, source);
            continue;
        }

        let opens = matches!(prefix, Some('B') | Some('S') | Some('U')) || token.is_aggregated();
        match current {
            Some(ref mut group) if group.kind == kind && !opens => group.push(token),
            _ => {
                flush(&mut current, &mut groups, source);
                current = Some(PendingGroup::new(kind, token));
            }
        }

        // End-of-entity tags and pre-aggregated groups close immediately
        if matches!(prefix, Some('E') | Some('L') | Some('S') | Some('U')) || token.is_aggregated() {
            flush(&mut current, &mut groups, source);
        }
    }

    flush(&mut current, &mut groups, source);
    groups
}

fn split_tag(tag: &str) -> (Option<char>, &str) {
    let kind = strip_bio_prefix(tag);
    if kind.len() == tag.len() {
        (None, kind)
    } else {
        (tag.chars().next(), kind)
    }
}

fn flush(current: &mut Option<PendingGroup>, groups: &mut Vec<TokenPrediction>, source: &str) {
    if let Some(group) = current.take() {
        groups.push(group.finish(source));
    }
}

struct PendingGroup {
    kind: String,
    pieces: Vec<String>,
    scores: Vec<f32>,
    start: Option<usize>,
    end: Option<usize>,
}

impl PendingGroup {
    fn new(kind: &str, token: &TokenPrediction) -> Self {
        let mut group = Self {
            kind: kind.to_string(),
            pieces: Vec::new(),
            scores: Vec::new(),
            start: token.start,
            end: None,
        };
        group.push(token);
        group
    }

    fn push(&mut self, token: &TokenPrediction) {
        self.pieces.push(token.word.clone());
        self.scores.push(token.score);
        self.end = token.end;
    }

    fn finish(self, source: &str) -> TokenPrediction {
        let score = self.scores.iter().sum::<f32>() / self.scores.len().max(1) as f32;

        let word = match (self.start, self.end) {
            (Some(start), Some(end)) => char_span_to_bytes(source, start, end)
                .map(|(s, e)| source[s..e].to_string())
                .unwrap_or_else(|| join_pieces(&self.pieces)),
            _ => join_pieces(&self.pieces),
        };

        TokenPrediction {
            word,
            entity_group: Some(self.kind),
            entity: None,
            score,
            start: self.start,
            end: self.end,
        }
    }
}

/// Rebuild surface text from sub-word pieces.
///
/// SentencePiece/BPE vocabularies mark word starts (`▁`, `Ġ`) and glue
/// everything else; WordPiece marks continuations (`##`) and spaces
/// everything else.
fn join_pieces(pieces: &[String]) -> String {
    let marks_word_starts = pieces
        .iter()
        .any(|p| p.starts_with('▁') || p.starts_with('Ġ'));

    let mut out = String::new();
    for piece in pieces {
        if let Some(rest) = piece.strip_prefix('▁').or_else(|| piece.strip_prefix('Ġ')) {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(rest);
        } else if let Some(rest) = piece.strip_prefix("##") {
            out.push_str(rest);
        } else if marks_word_starts || out.is_empty() {
            out.push_str(piece);
        } else {
            out.push(' ');
            out.push_str(piece);
        }
    }

    out.trim().to_string()
}
