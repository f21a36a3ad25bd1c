//! Multi-keyword substring matching for the rule tables.
//!
//! Every rule in the classifier, the corrector and the query enhancer asks the
//! same question: which of these keywords occur anywhere in the lower-cased
//! text? A single Aho–Corasick pass with overlapping matches answers it for
//! the whole list, so `"transport layer"` reports both `"transport layer"` and
//! `"port"` when both are configured.

use aho_corasick::AhoCorasick;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
    automaton: AhoCorasick,
}

impl KeywordMatcher {
    /// Compile a keyword list. Keywords are lower-cased; empty keywords are
    /// rejected since they would match every input.
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords.into_iter().map(|k| k.as_ref().trim().to_lowercase()).collect();
        if let Some(pos) = keywords.iter().position(String::is_empty) {
            return Err(Error::InvalidConfig(format!("keyword #{pos} is empty")));
        }
        let automaton = AhoCorasick::new(&keywords)
            .map_err(|e| Error::InvalidConfig(format!("failed to compile keyword matcher: {e}")))?;
        Ok(Self { keywords, automaton })
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn keyword(&self, index: usize) -> &str {
        &self.keywords[index]
    }

    /// Indices of the keywords present in `text`, ascending and distinct.
    pub fn matches(&self, text: &str) -> Vec<usize> {
        if self.keywords.is_empty() {
            return Vec::new();
        }
        let lowered = text.to_lowercase();
        let mut seen = vec![false; self.keywords.len()];
        for m in self.automaton.find_overlapping_iter(&lowered) {
            seen[m.pattern().as_usize()] = true;
        }
        seen.iter().enumerate().filter_map(|(i, hit)| hit.then_some(i)).collect()
    }

    /// Matched keywords in configured order.
    pub fn matched_keywords(&self, text: &str) -> Vec<&str> {
        self.matches(text).into_iter().map(|i| self.keywords[i].as_str()).collect()
    }

    /// First configured keyword present in `text`, if any.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.matches(text).first().map(|&i| self.keywords[i].as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_overlapping_keywords_in_configured_order() {
        let m = KeywordMatcher::new(["transport layer", "port", "tcp"]).unwrap();
        assert_eq!(m.matched_keywords("Explain the Transport Layer"), vec!["transport layer", "port"]);
        assert_eq!(m.matches("nothing relevant"), Vec::<usize>::new());
    }

    #[test]
    fn substring_semantics_match_inside_words() {
        let m = KeywordMatcher::new(["ip"]).unwrap();
        assert_eq!(m.first_match("relationship"), Some("ip"));
    }

    #[test]
    fn keywords_are_case_folded() {
        let m = KeywordMatcher::new(["CSMA/CD"]).unwrap();
        assert_eq!(m.first_match("how does csma/cd work"), Some("csma/cd"));
    }

    #[test]
    fn repeated_occurrences_count_once() {
        let m = KeywordMatcher::new(["tcp", "udp"]).unwrap();
        assert_eq!(m.matches("tcp tcp tcp"), vec![0]);
    }

    #[test]
    fn empty_keyword_is_rejected() {
        assert!(matches!(KeywordMatcher::new(["ok", "  "]), Err(Error::InvalidConfig(_))));
        assert!(KeywordMatcher::new(Vec::<String>::new()).unwrap().matches("x").is_empty());
    }
}
