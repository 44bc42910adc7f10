use super::{ProjectWords, SpellCheck, dictionary_tags, expand_language, match_case, normalise};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

pub(crate) const DIC_EXT: &str = "dic";
const PROVIDER: &str = "edit";
const MAX_SUGGESTIONS: usize = 10;

/// Spell checker for Hunspell-style `.dic` word lists
///
/// The first line may hold the word count. Affix flags after `/` are
/// ignored, so only the listed stems are known. Suggestions are the known
/// words one edit away: a deletion, transposition, replacement or insertion.
#[derive(Debug)]
pub struct EditSpell {
    dict_path: PathBuf,
    language: Option<String>,
    words: HashSet<String>,
    alphabet: BTreeSet<char>,
    project: ProjectWords,
}

impl EditSpell {
    pub fn new(dict_path: impl AsRef<Path>) -> Self {
        Self {
            dict_path: dict_path.as_ref().to_path_buf(),
            language: None,
            words: HashSet::new(),
            alphabet: ('a'..='z').collect(),
            project: ProjectWords::default(),
        }
    }

    fn insert(&mut self, word: &str) {
        let word = normalise(word);
        if word.is_empty() {
            return;
        }
        self.alphabet.extend(word.chars());
        self.words.insert(word);
    }

    fn edits(&self, word: &str) -> BTreeSet<String> {
        let chars: Vec<char> = word.chars().collect();
        let mut out = BTreeSet::new();
        for i in 0..=chars.len() {
            let (head, tail) = chars.split_at(i);
            if !tail.is_empty() {
                out.insert(head.iter().chain(&tail[1..]).collect());
                for c in &self.alphabet {
                    out.insert(head.iter().chain([c]).chain(&tail[1..]).collect());
                }
            }
            if tail.len() > 1 {
                out.insert(
                    head.iter()
                        .chain([&tail[1], &tail[0]])
                        .chain(&tail[2..])
                        .collect(),
                );
            }
            for c in &self.alphabet {
                out.insert(head.iter().chain([c]).chain(tail).collect());
            }
        }
        out.remove(word);
        out
    }
}

impl SpellCheck for EditSpell {
    fn set_language(&mut self, lang: &str, project_dict: Option<&Path>) {
        self.words.clear();
        let file = self.dict_path.join(format!("{}.{}", lang, DIC_EXT));
        match fs::read_to_string(&file) {
            Ok(text) => {
                let mut lines = text.lines().peekable();
                if lines
                    .peek()
                    .is_some_and(|first| first.trim().parse::<usize>().is_ok())
                {
                    lines.next();
                }
                for line in lines {
                    let stem = line.split('/').next().unwrap_or_default();
                    self.insert(stem);
                }
                debug!("Dictionary for language {} contains {} words", lang, self.words.len());
                self.language = Some(lang.to_string());
            }
            Err(e) => {
                error!("Failed to load dictionary for language {}: {}", lang, e);
                self.language = None;
            }
        }

        self.project = ProjectWords::load(project_dict);
        let extra: Vec<String> = self.project.words().cloned().collect();
        for word in extra {
            self.insert(&word);
        }
    }

    fn check_word(&self, word: &str) -> bool {
        self.words.contains(&normalise(word))
    }

    fn suggest_words(&self, word: &str) -> Vec<String> {
        let word = word.trim();
        if word.is_empty() {
            return Vec::new();
        }
        self.edits(&normalise(word))
            .into_iter()
            .filter(|cand| self.words.contains(cand))
            .take(MAX_SUGGESTIONS)
            .map(|cand| match_case(word, &cand))
            .collect()
    }

    fn add_word(&mut self, word: &str) {
        self.insert(word);
        self.project.add(word);
    }

    fn list_dictionaries(&self) -> Vec<(String, String)> {
        dictionary_tags(&self.dict_path, DIC_EXT)
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
