use fallo_core::{PartOfSpeech, Token};

/// Attribute constraints on a single token.
///
/// Every constraint that is set must hold; an empty `TokenAttrs` matches any
/// token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenAttrs {
    text: Option<String>,
    lower: Option<String>,
    lemma: Option<String>,
    pos: Option<PartOfSpeech>,
    dep: Option<String>,
}

impl TokenAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact surface text.
    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    /// Lowercase surface text; the argument is lowercased too.
    pub fn lower(mut self, lower: &str) -> Self {
        self.lower = Some(lower.to_lowercase());
        self
    }

    pub fn lemma(mut self, lemma: &str) -> Self {
        self.lemma = Some(lemma.to_string());
        self
    }

    pub fn pos(mut self, pos: PartOfSpeech) -> Self {
        self.pos = Some(pos);
        self
    }

    /// Dependency relation to the token's head.
    pub fn dep(mut self, dep: &str) -> Self {
        self.dep = Some(dep.to_string());
        self
    }

    pub fn matches(&self, token: &Token) -> bool {
        self.text.as_ref().is_none_or(|t| &token.text == t)
            && self.lower.as_ref().is_none_or(|l| &token.lower() == l)
            && self.lemma.as_ref().is_none_or(|l| &token.lemma == l)
            && self.pos.as_ref().is_none_or(|p| &token.pos == p)
            && self.dep.as_ref().is_none_or(|d| &token.dep == d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, lemma: &str, pos: PartOfSpeech, dep: &str) -> Token {
        Token {
            index: 0,
            text: text.to_string(),
            lemma: lemma.to_string(),
            pos,
            tag: None,
            dep: dep.to_string(),
            head: None,
            sentence: 0,
            space_after: " ".to_string(),
        }
    }

    #[test]
    fn empty_attrs_match_anything() {
        let t = token("Juzgado", "juzgado", PartOfSpeech::Noun, "nsubj");
        assert!(TokenAttrs::new().matches(&t));
    }

    #[test]
    fn lower_is_case_insensitive() {
        let t = token("JUZGADO", "juzgado", PartOfSpeech::Noun, "nsubj");
        assert!(TokenAttrs::new().lower("juzgado").matches(&t));
        assert!(TokenAttrs::new().lower("Juzgado").matches(&t));
        assert!(!TokenAttrs::new().text("Juzgado").matches(&t));
    }

    #[test]
    fn all_constraints_must_hold() {
        let t = token("declara", "declarar", PartOfSpeech::Verb, "root");
        let attrs = TokenAttrs::new().lemma("declarar").pos(PartOfSpeech::Verb);
        assert!(attrs.matches(&t));
        assert!(!attrs.clone().dep("aux").matches(&t));
        assert!(!TokenAttrs::new().lemma("declarar").pos(PartOfSpeech::Aux).matches(&t));
    }
}
