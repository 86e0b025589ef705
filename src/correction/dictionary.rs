use std::collections::HashSet;
use std::fs;
use std::path::Path;

use symspell::{SymSpell, UnicodeStringStrategy, Verbosity};
use tracing::{debug, info};

use crate::constants::correction::{MIN_SPLIT_PART_LEN, SEED_WORDS};
use crate::errors::ValidationError;

/// Word-validity oracle consulted by the correction cache on a miss.
///
/// All methods receive lower-cased words.
pub trait SpellDictionary: Send + Sync {
    /// Returns `true` when `word` is in the vocabulary.
    fn is_known(&self, word: &str) -> bool;

    /// Closest vocabulary words within `max_distance` edits, best first.
    fn suggestions(&self, word: &str, max_distance: usize, limit: usize) -> Vec<String>;

    /// Split a merged token into two or more known words, if possible.
    fn split_compound(&self, word: &str) -> Option<Vec<String>> {
        segment_known(word, |part| self.is_known(part))
    }

    /// Number of vocabulary entries (for logging).
    fn vocabulary_size(&self) -> usize;
}

/// In-memory vocabulary scored with Levenshtein distance.
#[derive(Clone, Debug, Default)]
pub struct WordListDictionary {
    words: Vec<String>,
    index: HashSet<String>,
}

impl WordListDictionary {
    /// Build a dictionary from `words` (lower-cased, duplicates dropped).
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dictionary = Self::default();
        dictionary.extend(words);
        dictionary
    }

    /// Dictionary holding only the built-in domain seed vocabulary.
    pub fn seeded() -> Self {
        Self::from_words(SEED_WORDS)
    }

    /// Load a word list; the first whitespace-separated token of each line is the word.
    ///
    /// Accepts plain word lists as well as `word count` frequency files.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ValidationError> {
        let text = fs::read_to_string(path.as_ref())?;
        let dictionary = Self::from_words(
            text.lines()
                .filter_map(|line| line.split_whitespace().next()),
        );
        debug!(
            path = %path.as_ref().display(),
            words = dictionary.words.len(),
            "word list loaded"
        );
        Ok(dictionary)
    }

    /// Add more words to the vocabulary.
    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if word.is_empty() || self.index.contains(&word) {
                continue;
            }
            self.index.insert(word.clone());
            self.words.push(word);
        }
    }
}

impl SpellDictionary for WordListDictionary {
    fn is_known(&self, word: &str) -> bool {
        self.index.contains(word)
    }

    fn suggestions(&self, word: &str, max_distance: usize, limit: usize) -> Vec<String> {
        let mut scored: Vec<(usize, &String)> = self
            .words
            .iter()
            .filter_map(|candidate| {
                let distance = strsim::levenshtein(word, candidate);
                (distance <= max_distance).then_some((distance, candidate))
            })
            .collect();
        scored.sort();
        scored
            .into_iter()
            .take(limit)
            .map(|(_, candidate)| candidate.clone())
            .collect()
    }

    fn vocabulary_size(&self) -> usize {
        self.words.len()
    }
}

/// SymSpell-backed dictionary loaded from a frequency file (`word count` per line).
pub struct SymSpellDictionary {
    engine: SymSpell<UnicodeStringStrategy>,
    words: usize,
    has_bigrams: bool,
}

impl SymSpellDictionary {
    /// Load the unigram dictionary and, optionally, a bigram file (`word word count`).
    pub fn open(dictionary: &Path, bigrams: Option<&Path>) -> Result<Self, ValidationError> {
        if !dictionary.is_file() {
            return Err(ValidationError::Configuration(format!(
                "dictionary file not found: {}",
                dictionary.display()
            )));
        }
        let words = fs::read_to_string(dictionary)?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .count();
        if words == 0 {
            return Err(ValidationError::Configuration(format!(
                "dictionary file is empty: {}",
                dictionary.display()
            )));
        }
        let mut engine: SymSpell<UnicodeStringStrategy> = SymSpell::default();
        engine.load_dictionary(dictionary.to_string_lossy().as_ref(), 0, 1, " ");
        let mut has_bigrams = false;
        if let Some(bigrams) = bigrams {
            if !bigrams.is_file() {
                return Err(ValidationError::Configuration(format!(
                    "bigram file not found: {}",
                    bigrams.display()
                )));
            }
            engine.load_bigram_dictionary(bigrams.to_string_lossy().as_ref(), 0, 2, " ");
            has_bigrams = true;
        }
        info!(
            dictionary = %dictionary.display(),
            words,
            has_bigrams,
            "symspell dictionary loaded"
        );
        Ok(Self {
            engine,
            words,
            has_bigrams,
        })
    }
}

impl SpellDictionary for SymSpellDictionary {
    fn is_known(&self, word: &str) -> bool {
        self.engine
            .lookup(word, Verbosity::Top, 0)
            .first()
            .is_some_and(|suggestion| suggestion.distance == 0)
    }

    fn suggestions(&self, word: &str, max_distance: usize, limit: usize) -> Vec<String> {
        self.engine
            .lookup(word, Verbosity::Closest, max_distance as i64)
            .into_iter()
            .take(limit)
            .map(|suggestion| suggestion.term)
            .collect()
    }

    fn split_compound(&self, word: &str) -> Option<Vec<String>> {
        if self.has_bigrams {
            let compound = self.engine.lookup_compound(word, 2);
            if let Some(suggestion) = compound.first()
                && suggestion.term.contains(' ')
            {
                let parts: Vec<String> = suggestion
                    .term
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                if parts.concat() == word
                    && parts
                        .iter()
                        .all(|part| part.chars().count() >= MIN_SPLIT_PART_LEN)
                {
                    return Some(parts);
                }
            }
        }
        segment_known(word, |part| self.is_known(part))
    }

    fn vocabulary_size(&self) -> usize {
        self.words
    }
}

/// Segment `word` into the fewest known parts of at least `MIN_SPLIT_PART_LEN` chars.
///
/// Returns `None` unless at least two parts are found.
pub fn segment_known<F>(word: &str, is_known: F) -> Option<Vec<String>>
where
    F: Fn(&str) -> bool,
{
    let bounds: Vec<usize> = word
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(word.len()))
        .collect();
    let chars = bounds.len() - 1;
    if chars < MIN_SPLIT_PART_LEN * 2 {
        return None;
    }
    // best[i]: (parts, previous boundary) for the prefix ending at bounds[i]
    let mut best: Vec<Option<(usize, usize)>> = vec![None; bounds.len()];
    best[0] = Some((0, 0));
    for end in MIN_SPLIT_PART_LEN..=chars {
        for start in 0..=end - MIN_SPLIT_PART_LEN {
            let Some((parts, _)) = best[start] else {
                continue;
            };
            if !is_known(&word[bounds[start]..bounds[end]]) {
                continue;
            }
            let candidate = parts + 1;
            if best[end].is_none_or(|(current, _)| candidate < current) {
                best[end] = Some((candidate, start));
            }
        }
    }
    let (parts, _) = best[chars]?;
    if parts < 2 {
        return None;
    }
    let mut pieces = Vec::with_capacity(parts);
    let mut end = chars;
    while end > 0 {
        let (_, start) = best[end]?;
        pieces.push(word[bounds[start]..bounds[end]].to_string());
        end = start;
    }
    pieces.reverse();
    Some(pieces)
}
