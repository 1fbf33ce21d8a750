use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A glossary entry: trigger patterns plus the popover content shown for it.
///
/// Triggers are regular expressions in `regex` syntax and are tried in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TermDefinition {
    pub id: String,
    #[serde(default)]
    pub triggers: Vec<String>,
    pub title: String,
    pub body_html: String,
}

impl TermDefinition {
    pub fn new(
        id: impl Into<String>,
        triggers: &[&str],
        title: impl Into<String>,
        body_html: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            triggers: triggers.iter().map(|t| (*t).to_string()).collect(),
            title: title.into(),
            body_html: body_html.into(),
        }
    }
}

/// Built-in C++ glossary used when the config file does not declare terms.
pub fn default_terms() -> Vec<TermDefinition> {
    vec![
        TermDefinition::new(
            "std-move",
            &[r"\bstd::move\b"],
            "std::move",
            "<p>Casts its argument to an rvalue reference so that it can be moved from. \
             It does not move anything by itself.</p>",
        ),
        TermDefinition::new(
            "move",
            &[r"\bmove semantics\b", r"\bmove\b"],
            "Move semantics",
            "<p>Transferring the resources of an expiring object instead of copying them.</p>",
        ),
        TermDefinition::new(
            "vector",
            &[r"\bstd::vector\b", r"\bvector\b"],
            "std::vector",
            "<p>A contiguous, dynamically sized sequence container.</p>",
        ),
        TermDefinition::new(
            "unique-ptr",
            &[r"\bstd::unique_ptr\b", r"\bunique_ptr\b"],
            "std::unique_ptr",
            "<p>A smart pointer with exclusive ownership of the managed object.</p>",
        ),
        TermDefinition::new(
            "raii",
            &[r"\bRAII\b"],
            "RAII",
            "<p>Resource Acquisition Is Initialization: resource lifetime is bound to \
             object lifetime.</p>",
        ),
        TermDefinition::new(
            "iterator",
            &[r"\biterators?\b"],
            "Iterator",
            "<p>An object that points into a range and can be advanced over it.</p>",
        ),
        TermDefinition::new(
            "template",
            &[r"\btemplates?\b"],
            "Template",
            "<p>A family of classes or functions parameterized by types or values.</p>",
        ),
        TermDefinition::new(
            "constexpr",
            &[r"\bconstexpr\b"],
            "constexpr",
            "<p>Declares that a value or function can be evaluated at compile time.</p>",
        ),
        TermDefinition::new(
            "nullptr",
            &[r"\bnullptr\b"],
            "nullptr",
            "<p>The null pointer literal, of type <code>std::nullptr_t</code>.</p>",
        ),
        TermDefinition::new(
            "rvalue",
            &[r"\brvalue references?\b", r"\brvalues?\b"],
            "rvalue",
            "<p>An expression whose resources may be reused, such as a temporary.</p>",
        ),
        TermDefinition::new(
            "lvalue",
            &[r"\blvalues?\b"],
            "lvalue",
            "<p>An expression that designates an object with identity.</p>",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_terms_have_unique_ids_and_triggers() {
        let terms = default_terms();
        let ids: HashSet<_> = terms.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), terms.len());
        assert!(terms.iter().all(|t| !t.triggers.is_empty()));
    }
}
