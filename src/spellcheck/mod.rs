//! Spell checking
//!
//! Two dictionary backends implement [`SpellCheck`]:
//! - [`SimpleSpell`]: plain `<lang>.dict` word lists, suggestions ranked by
//!   similarity ratio
//! - [`EditSpell`]: Hunspell-style `<lang>.dic` word lists, suggestions from
//!   single-edit candidates
//!
//! Both also accept the project word list, which collects words the user
//! added while writing.

mod edit;
mod simple;

pub use edit::EditSpell;
pub use simple::SimpleSpell;

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Common interface of the dictionary backends
pub trait SpellCheck {
    /// Load the dictionary for `lang` and the optional project word list
    fn set_language(&mut self, lang: &str, project_dict: Option<&Path>);

    /// True if the word is known
    fn check_word(&self, word: &str) -> bool;

    /// Known words close to `word`, best first
    fn suggest_words(&self, word: &str) -> Vec<String>;

    /// Accept a word and append it to the project word list
    fn add_word(&mut self, word: &str);

    /// Available dictionaries as (language tag, display name)
    fn list_dictionaries(&self) -> Vec<(String, String)>;

    /// Language tag and provider name of the loaded dictionary
    fn describe_dict(&self) -> (String, String);
}

/// Pick [`EditSpell`] when `.dic` dictionaries exist, [`SimpleSpell`] otherwise
pub fn select_backend(dict_path: &Path) -> Box<dyn SpellCheck> {
    if !dictionary_tags(dict_path, edit::DIC_EXT).is_empty() {
        debug!("Using edit distance spell checking");
        Box::new(EditSpell::new(dict_path))
    } else {
        debug!("Using simple spell checking");
        Box::new(SimpleSpell::new(dict_path))
    }
}

/// Language tags of the dictionary files with a given extension, sorted
pub(crate) fn dictionary_tags(dict_path: &Path, ext: &str) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dict_path) else {
        return Vec::new();
    };
    let mut tags: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == ext))
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    tags.sort();
    tags
}

/// Turn a tag such as `en_GB` into a readable name such as `English (GB)`
pub fn expand_language(tag: &str) -> String {
    let (lang, region) = match tag.split_once('_') {
        Some((lang, region)) => (lang, Some(region)),
        None => (tag, None),
    };
    let name = match lang {
        "da" => "Danish",
        "de" => "German",
        "en" => "English",
        "es" => "Spanish",
        "fi" => "Finnish",
        "fr" => "French",
        "it" => "Italian",
        "nb" => "Norwegian Bokmål",
        "nl" => "Dutch",
        "nn" => "Norwegian Nynorsk",
        "pl" => "Polish",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "sv" => "Swedish",
        other => other,
    };
    match region {
        Some(region) => format!("{} ({})", name, region),
        None => name.to_string(),
    }
}

/// Normalise typographic apostrophes and case for lookups
pub(crate) fn normalise(word: &str) -> String {
    word.trim().replace('\u{2019}', "'").to_lowercase()
}

/// Give a suggestion the capitalisation of the misspelt word
pub(crate) fn match_case(original: &str, suggestion: &str) -> String {
    let upper = original.chars().next().is_some_and(char::is_uppercase);
    let mut chars = suggestion.chars();
    match chars.next() {
        Some(first) if upper => first.to_uppercase().chain(chars).collect(),
        _ => suggestion.to_string(),
    }
}

/// Words the user added to one project
#[derive(Debug, Default)]
pub struct ProjectWords {
    path: Option<PathBuf>,
    words: HashSet<String>,
}

impl ProjectWords {
    /// Read the word list at `path`; a missing file gives an empty list
    pub fn load(path: Option<&Path>) -> Self {
        let mut list = ProjectWords {
            path: path.map(Path::to_path_buf),
            words: HashSet::new(),
        };
        let Some(path) = path else {
            return list;
        };
        if let Ok(text) = fs::read_to_string(path) {
            list.words = text
                .lines()
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect();
            debug!("Project word list contains {} words", list.words.len());
        }
        list
    }

    pub fn words(&self) -> impl Iterator<Item = &String> {
        self.words.iter()
    }

    /// Add a word and append it to the file
    ///
    /// # Returns
    /// `false` if the word was empty or already listed
    pub fn add(&mut self, word: &str) -> bool {
        let word = word.trim();
        if word.is_empty() || !self.words.insert(word.to_string()) {
            return false;
        }
        if let Some(path) = &self.path {
            let result = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| writeln!(file, "{}", word));
            if let Err(e) = result {
                error!("Failed to add word to project word list {}: {}", path.display(), e);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_expand_language() {
        assert_eq!(expand_language("en"), "English");
        assert_eq!(expand_language("en_GB"), "English (GB)");
        assert_eq!(expand_language("xx_YY"), "xx (YY)");
    }

    #[test]
    fn test_match_case() {
        assert_eq!(match_case("Wrod", "word"), "Word");
        assert_eq!(match_case("wrod", "word"), "word");
    }

    #[test]
    fn test_project_words_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wordlist.txt");
        fs::write(&path, "a_word\n\nb_word\n").unwrap();

        let mut list = ProjectWords::load(Some(&path));
        assert_eq!(list.words().count(), 2);
        assert!(list.add("c_word"));
        assert!(!list.add("a_word"));
        assert!(!list.add("  "));

        let reloaded = ProjectWords::load(Some(&path));
        assert_eq!(reloaded.words().count(), 3);
    }

    #[test]
    fn test_select_backend() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("en.dict"), "word\n").unwrap();
        assert_eq!(select_backend(dir.path()).describe_dict().1, "internal");

        fs::write(dir.path().join("en.dic"), "1\nword/S\n").unwrap();
        assert_eq!(select_backend(dir.path()).describe_dict().1, "edit");
    }
}
