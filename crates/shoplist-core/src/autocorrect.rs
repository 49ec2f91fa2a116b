//! Item-name cleanup for dictated text
//!
//! Speech transcripts arrive with stray punctuation, filler words and the
//! occasional misheard grocery word. These helpers turn a transcript into
//! an item name and let callers detect names already on a list. The store
//! itself never applies them.

use crate::models::{Item, ShoppingList};

/// Commonly misheard words and what was meant
const CORRECTIONS: [(&str, &str); 6] = [
    ("serial", "cereal"),
    ("flower", "flour"),
    ("bred", "bread"),
    ("tomatos", "tomatoes"),
    ("bananna", "banana"),
    ("brockley", "broccoli"),
];

/// Maximum edit distance between a word and a misheard form
const MAX_DISTANCE: usize = 1;

/// Shorter words only match a misheard form exactly
const MIN_FUZZY_LEN: usize = 4;

/// Punctuation dictation tends to leave at the end of a phrase
const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Clean up a raw transcript into an item name
///
/// Trims, collapses runs of whitespace, strips trailing sentence
/// punctuation, drops a leading "add" command word and capitalizes the
/// first letter. Returns an empty string if nothing is left.
pub fn normalize_item_name(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches(TRAILING_PUNCTUATION);
    let mut words: Vec<&str> = trimmed.split_whitespace().collect();

    if words.len() > 1 && words[0].eq_ignore_ascii_case("add") {
        words.remove(0);
    }

    capitalize(&words.join(" "))
}

/// Character-level edit distance between two strings
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Look up the intended word for a possibly misheard one
///
/// Matching ignores case. Words spelled as an intended form, or as a plural
/// or singular of any word in the table, are left alone: "tomato" and
/// "flowers" are real words, not mishearings.
pub fn fuzzy_correct(word: &str) -> Option<&'static str> {
    let lower = word.to_lowercase();
    if let Some((_, intended)) = CORRECTIONS.iter().find(|(misheard, _)| *misheard == lower) {
        return Some(*intended);
    }
    if lower.chars().count() < MIN_FUZZY_LEN {
        return None;
    }
    let inflected = CORRECTIONS.iter().any(|(misheard, intended)| {
        same_stem(&lower, misheard) || same_stem(&lower, intended)
    });
    if inflected {
        return None;
    }

    CORRECTIONS
        .iter()
        .filter(|(misheard, _)| levenshtein(&lower, misheard) <= MAX_DISTANCE)
        .min_by_key(|(misheard, _)| levenshtein(&lower, misheard))
        .map(|(_, intended)| *intended)
}

/// Whether `a` and `b` differ at most by a plural "s" or "es" suffix
fn same_stem(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    match long.strip_prefix(short) {
        Some(suffix) => matches!(suffix, "" | "s" | "es"),
        None => false,
    }
}

/// Normalize a transcript and correct misheard words
pub fn autocorrect(raw: &str) -> String {
    let normalized = normalize_item_name(raw);
    let corrected: Vec<String> = normalized
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(|word| match fuzzy_correct(word) {
            Some(intended) if starts_uppercase(word) => capitalize(intended),
            Some(intended) => intended.to_string(),
            None => word.to_string(),
        })
        .collect();
    capitalize(&corrected.join(" "))
}

/// Find an item on `list` that `name` would duplicate
///
/// Names match ignoring case, either as typed or after autocorrection.
pub fn find_duplicate<'a>(list: &'a ShoppingList, name: &str) -> Option<&'a Item> {
    if let Some(item) = list.find_item_by_name(name) {
        return Some(item);
    }

    let corrected = autocorrect(name).to_lowercase();
    if corrected.is_empty() {
        return None;
    }
    list.items
        .iter()
        .find(|item| autocorrect(&item.name).to_lowercase() == corrected)
}

fn starts_uppercase(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
