use super::{ProjectWords, SpellCheck, dictionary_tags, expand_language, match_case, normalise};
use similar::TextDiff;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

pub(crate) const DICT_EXT: &str = "dict";
const PROVIDER: &str = "internal";
const MAX_SUGGESTIONS: usize = 10;
const CUTOFF: f32 = 0.75;

/// Word list spell checker with similarity-ranked suggestions
///
/// Reads `<dict_path>/<lang>.dict`, one word per line, `#` starting a
/// comment line. Slow on large lists, but needs nothing else.
#[derive(Debug)]
pub struct SimpleSpell {
    dict_path: PathBuf,
    language: Option<String>,
    words: HashSet<String>,
    project: ProjectWords,
}

impl SimpleSpell {
    pub fn new(dict_path: impl AsRef<Path>) -> Self {
        Self {
            dict_path: dict_path.as_ref().to_path_buf(),
            language: None,
            words: HashSet::new(),
            project: ProjectWords::default(),
        }
    }
}

impl SpellCheck for SimpleSpell {
    fn set_language(&mut self, lang: &str, project_dict: Option<&Path>) {
        self.words.clear();
        let file = self.dict_path.join(format!("{}.{}", lang, DICT_EXT));
        match fs::read_to_string(&file) {
            Ok(text) => {
                self.words = text
                    .lines()
                    .map(str::trim)
                    .filter(|w| !w.is_empty() && !w.starts_with('#'))
                    .map(str::to_lowercase)
                    .collect();
                debug!("Word list for language {} contains {} words", lang, self.words.len());
                self.language = Some(lang.to_string());
            }
            Err(e) => {
                error!("Failed to load word list for language {}: {}", lang, e);
                self.language = None;
            }
        }

        self.project = ProjectWords::load(project_dict);
        let extra: Vec<String> = self.project.words().map(|w| normalise(w)).collect();
        self.words.extend(extra);
    }

    fn check_word(&self, word: &str) -> bool {
        self.words.contains(&normalise(word))
    }

    fn suggest_words(&self, word: &str) -> Vec<String> {
        let word = word.trim();
        if word.is_empty() {
            return Vec::new();
        }
        let lower = normalise(word);

        let mut scored: Vec<(f32, &String)> = self
            .words
            .iter()
            .filter(|cand| !cand.is_empty())
            .map(|cand| (TextDiff::from_chars(lower.as_str(), cand.as_str()).ratio(), cand))
            .filter(|(ratio, _)| *ratio >= CUTOFF - f32::EPSILON)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));

        scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, cand)| match_case(word, cand))
            .collect()
    }

    fn add_word(&mut self, word: &str) {
        self.words.insert(normalise(word));
        self.project.add(word);
    }

    fn list_dictionaries(&self) -> Vec<(String, String)> {
        dictionary_tags(&self.dict_path, DICT_EXT)
            .into_iter()
            .map(|tag| {
                let name = format!("{} [{}]", expand_language(&tag), PROVIDER);
                (tag, name)
            })
            .collect()
    }

    fn describe_dict(&self) -> (String, String) {
        (self.language.clone().unwrap_or_default(), PROVIDER.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestions_keep_capitals() {
        let mut spell = SimpleSpell::new("/nonexistent");
        spell.add_word("word");
        spell.add_word("world");
        assert_eq!(spell.suggest_words("Wrod").first().map(String::as_str), Some("Word"));
        assert!(spell.suggest_words("   ").is_empty());
    }

    #[test]
    fn test_missing_dictionary_leaves_language_unset() {
        let mut spell = SimpleSpell::new("/nonexistent");
        spell.set_language("en", None);
        assert_eq!(spell.describe_dict(), (String::new(), PROVIDER.to_string()));
        assert!(!spell.check_word("word"));
    }
}
