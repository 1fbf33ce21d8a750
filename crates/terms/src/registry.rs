use crate::error::{Result, TermsError};
use crate::matcher::{find_matches, Match};
use refdoc_protocol::TermDefinition;
use regex::Regex;
use std::collections::HashMap;

/// A definition with its trigger patterns compiled.
#[derive(Debug, Clone)]
pub struct CompiledTerm {
    pub definition: TermDefinition,
    pub patterns: Vec<Regex>,
}

impl CompiledTerm {
    pub fn compile(definition: TermDefinition) -> Result<Self> {
        let mut patterns = Vec::with_capacity(definition.triggers.len());
        for trigger in &definition.triggers {
            let regex = Regex::new(trigger).map_err(|source| TermsError::InvalidPattern {
                id: definition.id.clone(),
                pattern: trigger.clone(),
                source,
            })?;
            if regex.is_match("") {
                return Err(TermsError::EmptyPattern {
                    id: definition.id.clone(),
                    pattern: trigger.clone(),
                });
            }
            patterns.push(regex);
        }
        Ok(Self {
            definition,
            patterns,
        })
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }
}

/// Ordered, immutable set of term definitions built once at startup.
#[derive(Debug, Clone, Default)]
pub struct TermRegistry {
    terms: Vec<CompiledTerm>,
    by_id: HashMap<String, usize>,
}

impl TermRegistry {
    pub fn new(definitions: Vec<TermDefinition>) -> Result<Self> {
        let mut terms = Vec::with_capacity(definitions.len());
        let mut by_id = HashMap::new();
        for definition in definitions {
            let compiled = CompiledTerm::compile(definition)?;
            if by_id.contains_key(compiled.id()) {
                log::debug!(
                    "term '{}' registered twice; lookups resolve to the first",
                    compiled.id()
                );
            } else {
                by_id.insert(compiled.id().to_string(), terms.len());
            }
            terms.push(compiled);
        }
        Ok(Self { terms, by_id })
    }

    /// First-registered definition with this id.
    pub fn get(&self, id: &str) -> Option<&TermDefinition> {
        self.by_id.get(id).map(|idx| &self.terms[*idx].definition)
    }

    pub fn terms(&self) -> &[CompiledTerm] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn find_matches(&self, text: &str) -> Vec<Match> {
        find_matches(text, &self.terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_ids_resolve_to_first_registration() {
        let registry = TermRegistry::new(vec![
            TermDefinition::new("dup", &["first"], "First", "<p>1</p>"),
            TermDefinition::new("dup", &["second"], "Second", "<p>2</p>"),
        ])
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("dup").map(|d| d.title.as_str()), Some("First"));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn rejects_invalid_and_empty_patterns() {
        let err = TermRegistry::new(vec![TermDefinition::new("bad", &["("], "Bad", "")])
            .unwrap_err();
        assert!(matches!(err, TermsError::InvalidPattern { .. }));

        let err = TermRegistry::new(vec![TermDefinition::new("empty", &["a*"], "Empty", "")])
            .unwrap_err();
        assert!(matches!(err, TermsError::EmptyPattern { .. }));
    }

    #[test]
    fn zero_triggers_is_allowed() {
        let registry =
            TermRegistry::new(vec![TermDefinition::new("silent", &[], "Silent", "")]).unwrap();
        assert!(registry.find_matches("silent text").is_empty());
        assert!(registry.get("silent").is_some());
    }
}
