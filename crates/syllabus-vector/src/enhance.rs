use syllabus_core::config::QueryExpansion;
use syllabus_core::error::Result;
use syllabus_core::keywords::KeywordMatcher;

/// Appends canonical expansion phrases to short queries that mention a known
/// abbreviation or term, widening their vocabulary overlap with long-form
/// passages.
#[derive(Debug, Clone)]
pub struct QueryEnhancer {
    matcher: KeywordMatcher,
    expansions: Vec<String>,
}

impl QueryEnhancer {
    pub fn new(expansions: &[QueryExpansion]) -> Result<Self> {
        let matcher = KeywordMatcher::new(expansions.iter().map(|e| e.term.as_str()))?;
        let expansions = expansions.iter().map(|e| e.expansion.clone()).collect();
        Ok(Self { matcher, expansions })
    }

    /// Every matching expansion is appended, in configured order.
    pub fn enhance(&self, query: &str) -> String {
        let mut enhanced = query.to_string();
        for i in self.matcher.matches(query) {
            enhanced.push(' ');
            enhanced.push_str(&self.expansions[i]);
        }
        enhanced
    }
}
