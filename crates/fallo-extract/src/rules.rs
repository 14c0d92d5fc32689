//! The fixed patterns behind each extracted fact.

use fallo_core::PartOfSpeech;
use fallo_matcher::{DependencyMatcher, PatternError, RelOp, TokenAttrs, TokenMatcher};

pub const SUBJECT_MATTER: &str = "subject_matter";
pub const RULING: &str = "ruling";
pub const DATE: &str = "date";

/// "Juzgado" + its `nmod` dependent + that dependent's `flat` continuation,
/// which must directly follow it: "Juzgado Contencioso Administrativo".
pub fn subject_matter() -> Result<DependencyMatcher, PatternError> {
    DependencyMatcher::builder(SUBJECT_MATTER)
        .anchor("court", TokenAttrs::new().lower("juzgado"))
        .node("branch", TokenAttrs::new().dep("nmod"), "court", RelOp::Head)
        .node(
            "branch_tail",
            TokenAttrs::new().dep("flat"),
            "branch",
            RelOp::Precedes,
        )
        .constrain("branch", RelOp::Head, "branch_tail")
        .build()
}

/// Any form of the verb "declarar" with an `adj` complement and an `aux`
/// dependent: "se declara admisible".
pub fn ruling() -> Result<DependencyMatcher, PatternError> {
    DependencyMatcher::builder(RULING)
        .anchor(
            "declare",
            TokenAttrs::new().lemma("declarar").pos(PartOfSpeech::Verb),
        )
        .node("complement", TokenAttrs::new().dep("adj"), "declare", RelOp::Head)
        .node("auxiliary", TokenAttrs::new().dep("aux"), "declare", RelOp::Head)
        .build()
}

/// Day, "de", month, "de", year: "17 de junio de 2021".
pub fn date() -> Result<TokenMatcher, PatternError> {
    TokenMatcher::new(
        DATE,
        vec![
            TokenAttrs::new().pos(PartOfSpeech::Num),
            TokenAttrs::new().lower("de"),
            TokenAttrs::new().pos(PartOfSpeech::Noun),
            TokenAttrs::new().lower("de"),
            TokenAttrs::new().pos(PartOfSpeech::Num),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_compile() {
        assert_eq!(
            subject_matter().unwrap().node_names(),
            vec!["court", "branch", "branch_tail"]
        );
        assert_eq!(ruling().unwrap().name(), RULING);
        assert_eq!(date().unwrap().name(), DATE);
    }
}
