//! Syllable-like segmentation of words
//!
//! Scan left to right and close the running fragment right after every
//! vowel. A trailing consonant run is glued onto the last fragment. Words
//! that yield fewer than two fragments are split at their midpoint
//! instead. Pure and deterministic: levels build both their slot targets
//! and their token pools from it.

/// Vowels that close a fragment (accented forms included)
pub const VOWELS: [char; 10] = ['a', 'e', 'i', 'o', 'u', 'á', 'é', 'í', 'ó', 'ú'];

#[inline]
pub fn is_vowel(c: char) -> bool {
    VOWELS.contains(&c)
}

/// Split a lowercase word into non-empty fragments whose concatenation
/// is the word itself
pub fn segment(word: &str) -> Vec<String> {
    let mut fragments: Vec<String> = Vec::new();
    let mut current = String::new();

    for c in word.chars() {
        current.push(c);
        if is_vowel(c) {
            fragments.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        match fragments.last_mut() {
            Some(last) => last.push_str(&current),
            None => fragments.push(current),
        }
    }

    if fragments.len() < 2 {
        return midpoint_split(word);
    }
    fragments
}

/// Split at the middle character (char-aware, so accents never break)
fn midpoint_split(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mid = chars.len() / 2;
    [&chars[..mid], &chars[mid..]]
        .into_iter()
        .filter(|half| !half.is_empty())
        .map(|half| half.iter().collect())
        .collect()
}
