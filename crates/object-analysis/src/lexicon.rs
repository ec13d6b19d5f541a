//! Object categories and the label lookup table
//!
//! Object models emit free-text labels. Everything downstream works on
//! [`ObjectCategory`]; the substring bridge from labels lives in
//! [`label_matches`] only.

use serde::{Deserialize, Serialize};

/// Labels treated as phones
pub const PHONE_TERMS: &[&str] = &[
    "cell phone",
    "cellphone",
    "mobile phone",
    "smartphone",
    "phone",
    "mobile",
    "telephone",
];

/// Labels an object model plausibly gives a phone by mistake
pub const LOOKALIKE_TERMS: &[&str] = &["remote", "book", "bottle", "cup"];

pub const PERSON_TERMS: &[&str] = &["person"];

/// Ordinary room furniture and clothing, known but irrelevant
pub const BACKGROUND_TERMS: &[&str] = &[
    "chair",
    "couch",
    "bed",
    "dining table",
    "tv",
    "keyboard",
    "mouse",
    "potted plant",
    "clock",
    "vase",
    "tie",
    "backpack",
];

/// Category of an object label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectCategory {
    Phone,
    /// Remote, book, bottle, cup
    Lookalike,
    Person,
    Background,
    /// Matches no lexicon
    Unrecognized,
}

impl ObjectCategory {
    /// Whether the label belongs to any lexicon
    pub fn is_known(&self) -> bool {
        !matches!(self, ObjectCategory::Unrecognized)
    }
}

/// Lowercase alphanumeric words of a label
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether `needle` occurs as a contiguous run of whole words in `haystack`
fn contains_words(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Case-insensitive whole-word match in either direction.
///
/// `"cell phone"` matches the term `"phone"` and the label `"phone"`
/// matches the term `"cell phone"`, but `"headphones"` and `"one"` match
/// neither.
pub fn label_matches(label: &str, term: &str) -> bool {
    let label = words(label);
    let term = words(term);
    contains_words(&label, &term) || contains_words(&term, &label)
}

/// Whether a label matches any term of a lexicon
pub fn matches_any<S: AsRef<str>>(label: &str, terms: &[S]) -> bool {
    terms.iter().any(|t| label_matches(label, t.as_ref()))
}

/// Map a model label to its category
pub fn classify(label: &str) -> ObjectCategory {
    if matches_any(label, PHONE_TERMS) {
        ObjectCategory::Phone
    } else if matches_any(label, LOOKALIKE_TERMS) {
        ObjectCategory::Lookalike
    } else if matches_any(label, PERSON_TERMS) {
        ObjectCategory::Person
    } else if matches_any(label, BACKGROUND_TERMS) {
        ObjectCategory::Background
    } else {
        ObjectCategory::Unrecognized
    }
}
