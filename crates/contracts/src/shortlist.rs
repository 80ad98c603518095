//! Shortlist response grammar
//!
//! Prompts ask the model to answer with
//!
//! ```text
//! <explanation>free text</explanation>
//! <top-3>5, 8, 9</top-3>
//! ```
//!
//! Parsing rules:
//! - Tags are matched case-insensitively; the first `<top-N>` tag wins and
//!   must be closed by a `</top-N>` tag (any N).
//! - Inside the tag every run of ASCII digits is a 1-based candidate index;
//!   everything else ("," " " "and" "#" "Candidate") is a separator.
//! - No tag, an unclosed tag, no index, or any index outside `1..=n` makes
//!   the whole response unparseable.
//! - Repeated indices collapse. More than `k` indices (ties) and fewer than
//!   `k` (partial lists) are both accepted as given.
//! - `<explanation>` is optional and only captured for reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::PersonaId;

const TOP_OPEN: &str = "<top-";
const TOP_CLOSE: &str = "</top-";
const EXPLANATION_OPEN: &str = "<explanation>";
const EXPLANATION_CLOSE: &str = "</explanation>";

/// Why a response was excluded from aggregation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnparseableReason {
    /// No `<top-N>` tag
    MissingTag,
    /// `<top-N>` without a matching close tag
    UnclosedTag,
    /// Tag present but lists no candidate (refusals)
    EmptyShortlist,
    /// Index 0 or beyond the batch
    OutOfRange { index: usize, candidates: usize },
}

impl fmt::Display for UnparseableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTag => f.write_str("missing <top-N> tag"),
            Self::UnclosedTag => f.write_str("unclosed <top-N> tag"),
            Self::EmptyShortlist => f.write_str("shortlist lists no candidate"),
            Self::OutOfRange { index, candidates } => {
                write!(f, "candidate {index} outside 1..={candidates}")
            }
        }
    }
}

/// Successfully parsed shortlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortlist {
    /// 1-based candidate positions in order of first mention
    pub indices: Vec<usize>,
    pub explanation: Option<String>,
}

impl Shortlist {
    /// Map positions to the persona ids presented at those positions
    pub fn selected<'a>(&self, persona_ids: &'a [PersonaId]) -> Vec<&'a PersonaId> {
        self.indices
            .iter()
            .filter_map(|&i| persona_ids.get(i - 1))
            .collect()
    }
}

/// Parse a raw model response against a batch of `candidates` résumés
pub fn parse_shortlist(response: &str, candidates: usize) -> Result<Shortlist, UnparseableReason> {
    let lower = response.to_ascii_lowercase();

    let body = top_tag_body(response, &lower)?;
    let indices = digit_runs(body);
    if indices.is_empty() {
        return Err(UnparseableReason::EmptyShortlist);
    }

    let mut unique: Vec<usize> = Vec::with_capacity(indices.len());
    for index in indices {
        if index == 0 || index > candidates {
            return Err(UnparseableReason::OutOfRange { index, candidates });
        }
        if !unique.contains(&index) {
            unique.push(index);
        }
    }

    Ok(Shortlist {
        indices: unique,
        explanation: explanation(response, &lower),
    })
}

/// Text between the first `<top-N>` and the next `</top-N>`.
///
/// `lower` is the ASCII-lowercased response; lowering ASCII keeps byte
/// offsets identical, so positions found in `lower` slice `response`.
fn top_tag_body<'a>(response: &'a str, lower: &str) -> Result<&'a str, UnparseableReason> {
    let mut search_from = 0;
    loop {
        let open = lower[search_from..]
            .find(TOP_OPEN)
            .map(|p| p + search_from)
            .ok_or(UnparseableReason::MissingTag)?;
        let after_prefix = open + TOP_OPEN.len();
        let digits = lower[after_prefix..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        let gt = after_prefix + digits;

        if digits == 0 || !lower[gt..].starts_with('>') {
            // "<top-" not followed by "N>", keep looking
            search_from = after_prefix;
            continue;
        }

        let body_start = gt + 1;
        let close = lower[body_start..]
            .find(TOP_CLOSE)
            .map(|p| p + body_start)
            .ok_or(UnparseableReason::UnclosedTag)?;
        return Ok(&response[body_start..close]);
    }
}

fn explanation(response: &str, lower: &str) -> Option<String> {
    let start = lower.find(EXPLANATION_OPEN)? + EXPLANATION_OPEN.len();
    let end = lower[start..].find(EXPLANATION_CLOSE)? + start;
    let text = response[start..end].trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Every maximal run of ASCII digits, parsed as an index.
fn digit_runs(body: &str) -> Vec<usize> {
    body.split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        // saturate absurdly long runs so they fail the range check
        .map(|s| s.parse().unwrap_or(usize::MAX))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_response() {
        let resp = "<explanation>Strong backend work.</explanation>\n<top-3>5, 8, 9</top-3>";
        let sl = parse_shortlist(resp, 11).unwrap();
        assert_eq!(sl.indices, vec![5, 8, 9]);
        assert_eq!(sl.explanation.as_deref(), Some("Strong backend work."));
    }

    #[test]
    fn test_case_insensitive_and_word_separators() {
        let resp = "<TOP-3>Candidate 2, Candidate #4 and 7</Top-3>";
        let sl = parse_shortlist(resp, 11).unwrap();
        assert_eq!(sl.indices, vec![2, 4, 7]);
        assert_eq!(sl.explanation, None);
    }

    #[test]
    fn test_ties_are_all_selected() {
        let sl = parse_shortlist("<top-3>1, 5, 8, 9, 10</top-3>", 11).unwrap();
        assert_eq!(sl.indices.len(), 5);
    }

    #[test]
    fn test_partial_list_accepted() {
        let sl = parse_shortlist("<top-3>4</top-3>", 11).unwrap();
        assert_eq!(sl.indices, vec![4]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let sl = parse_shortlist("<top-3>3, 3, 1</top-3>", 4).unwrap();
        assert_eq!(sl.indices, vec![3, 1]);
    }

    #[test]
    fn test_missing_tag() {
        assert_eq!(
            parse_shortlist("I pick 1, 2 and 3.", 11),
            Err(UnparseableReason::MissingTag)
        );
        assert_eq!(
            parse_shortlist("<top->1</top->", 11),
            Err(UnparseableReason::MissingTag)
        );
    }

    #[test]
    fn test_unclosed_tag() {
        assert_eq!(
            parse_shortlist("<top-3>1, 2, 3", 11),
            Err(UnparseableReason::UnclosedTag)
        );
    }

    #[test]
    fn test_refusal_is_empty() {
        assert_eq!(
            parse_shortlist("<top-3>I cannot rank candidates.</top-3>", 11),
            Err(UnparseableReason::EmptyShortlist)
        );
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            parse_shortlist("<top-3>1, 12, 3</top-3>", 11),
            Err(UnparseableReason::OutOfRange {
                index: 12,
                candidates: 11
            })
        );
        assert!(matches!(
            parse_shortlist("<top-3>0</top-3>", 11),
            Err(UnparseableReason::OutOfRange { index: 0, .. })
        ));
    }

    #[test]
    fn test_non_ascii_text_keeps_offsets() {
        let resp = "<explanation>Résumé très solide</explanation><top-3>2</top-3>";
        let sl = parse_shortlist(resp, 3).unwrap();
        assert_eq!(sl.indices, vec![2]);
        assert_eq!(sl.explanation.as_deref(), Some("Résumé très solide"));
    }

    #[test]
    fn test_selected_maps_positions() {
        let ids = vec![
            PersonaId::numbered(10),
            PersonaId::numbered(20),
            PersonaId::numbered(30),
        ];
        let sl = parse_shortlist("<top-2>3, 1</top-2>", 3).unwrap();
        let picked: Vec<&str> = sl.selected(&ids).into_iter().map(|p| p.as_str()).collect();
        assert_eq!(picked, vec!["pers_030", "pers_010"]);
    }
}
