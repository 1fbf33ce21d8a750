use crate::registry::CompiledTerm;
use serde::Serialize;

/// One accepted term occurrence. Offsets are byte offsets into the scanned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    pub length: usize,
    pub matched_text: String,
    pub definition_id: String,
}

/// All trigger occurrences in `text`, reduced to a non-overlapping,
/// start-ordered set. Earlier starts win; at equal starts the longer match
/// wins; remaining ties keep registration order.
pub fn find_matches(text: &str, terms: &[CompiledTerm]) -> Vec<Match> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut raw: Vec<Match> = Vec::new();
    for term in terms {
        for pattern in &term.patterns {
            for found in pattern.find_iter(text) {
                if found.end() <= found.start() {
                    continue;
                }
                raw.push(Match {
                    start: found.start(),
                    end: found.end(),
                    length: found.end() - found.start(),
                    matched_text: found.as_str().to_string(),
                    definition_id: term.definition.id.clone(),
                });
            }
        }
    }

    raw.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.length.cmp(&a.length)));

    let mut accepted = Vec::with_capacity(raw.len());
    let mut current_end = 0usize;
    for candidate in raw {
        if candidate.start >= current_end {
            current_end = candidate.end;
            accepted.push(candidate);
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TermRegistry;
    use proptest::prelude::*;
    use refdoc_protocol::{default_terms, TermDefinition};

    fn registry(defs: Vec<TermDefinition>) -> TermRegistry {
        TermRegistry::new(defs).expect("registry")
    }

    fn cpp_registry() -> TermRegistry {
        registry(vec![
            TermDefinition::new("move", &[r"\bmove\b"], "move", ""),
            TermDefinition::new("std-move", &[r"\bstd::move\b"], "std::move", ""),
        ])
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(cpp_registry().find_matches("").is_empty());
    }

    #[test]
    fn prefers_longer_match_at_same_position() {
        let matches = cpp_registry().find_matches("call std::move here");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].definition_id, "std-move");
        assert_eq!(matches[0].matched_text, "std::move");
        assert_eq!((matches[0].start, matches[0].end), (5, 14));
        assert_eq!(matches[0].length, 9);
    }

    #[test]
    fn earlier_start_wins_over_longer_later_overlap() {
        let reg = registry(vec![
            TermDefinition::new("ab", &["ab"], "ab", ""),
            TermDefinition::new("bcd", &["bcd"], "bcd", ""),
        ]);
        let matches = reg.find_matches("abcd");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].definition_id, "ab");
    }

    #[test]
    fn equal_spans_keep_registration_order() {
        let reg = registry(vec![
            TermDefinition::new("first", &["vector"], "first", ""),
            TermDefinition::new("second", &["vector"], "second", ""),
        ]);
        let matches = reg.find_matches("a vector");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].definition_id, "first");
    }

    #[test]
    fn finds_every_separate_occurrence_in_order() {
        let matches = cpp_registry().find_matches("move, then std::move, then move");
        let ids: Vec<_> = matches.iter().map(|m| m.definition_id.as_str()).collect();
        assert_eq!(ids, vec!["move", "std-move", "move"]);
    }

    #[test]
    fn offsets_respect_multibyte_text() {
        let matches = cpp_registry().find_matches("é move");
        assert_eq!(matches[0].start, 3);
        assert_eq!(&"é move"[matches[0].start..matches[0].end], "move");
    }

    proptest! {
        #[test]
        fn proptest_matches_never_overlap_and_are_sorted(
            text in "[a-z:_ ]{0,80}|(std::move|move|vector|std::vector| |RAII|rvalue){0,20}",
        ) {
            let reg = registry(default_terms());
            let matches = reg.find_matches(&text);
            for pair in matches.windows(2) {
                prop_assert!(pair[0].start < pair[1].start);
                prop_assert!(pair[0].end <= pair[1].start);
            }
            for m in &matches {
                prop_assert!(m.end > m.start);
                prop_assert_eq!(m.length, m.end - m.start);
                prop_assert_eq!(&text[m.start..m.end], m.matched_text.as_str());
            }
        }
    }
}
