//! Text normalization for evasion-resistant matching
//!
//! Accent-stripping and confusable folding are applied to candidate text
//! before comparison so that look-alike spellings ("ｂáԁ ᴡord") match the
//! plain form a moderator configured. Normalization only affects what is
//! compared, never what is logged or displayed.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Decompose to NFKD and drop combining marks, so "café" compares as "cafe".
pub fn strip_accents(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Fold common homoglyphs to their ASCII skeleton.
///
/// Covers the Cyrillic and Greek look-alikes seen in the wild plus a few
/// stylistic substitutes. Unknown characters pass through unchanged.
pub fn fold_confusables(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

/// Accent-strip then confusable-fold. Idempotent: normalizing normalized
/// text returns it unchanged.
pub fn normalize_text(text: &str) -> String {
    fold_confusables(&strip_accents(text))
}

/// Character count of the NFC-normalized text, used for length thresholds.
pub fn display_length(text: &str) -> usize {
    text.nfc().count()
}

fn fold_char(c: char) -> char {
    match c {
        // Cyrillic
        'а' | 'А' => 'a',
        'в' | 'В' => 'b',
        'с' | 'С' => 'c',
        'е' | 'Е' | 'ё' | 'Ё' => 'e',
        'н' | 'Н' => 'h',
        'і' | 'І' => 'i',
        'ј' | 'Ј' => 'j',
        'к' | 'К' => 'k',
        'м' | 'М' => 'm',
        'о' | 'О' => 'o',
        'р' | 'Р' => 'p',
        'ѕ' | 'Ѕ' => 's',
        'т' | 'Т' => 't',
        'у' | 'У' => 'y',
        'х' | 'Х' => 'x',
        // Greek
        'Α' => 'a',
        'Β' | 'β' => 'b',
        'Ε' | 'ε' => 'e',
        'Η' => 'h',
        'Ι' | 'ι' => 'i',
        'Κ' | 'κ' => 'k',
        'Μ' => 'm',
        'Ν' | 'ν' => 'n',
        'Ο' | 'ο' => 'o',
        'Ρ' | 'ρ' => 'p',
        'Τ' | 'τ' => 't',
        'Υ' | 'υ' => 'y',
        'Χ' | 'χ' => 'x',
        'ω' => 'w',
        // Stylistic substitutes
        '¡' => 'i',
        '$' => 's',
        '@' => 'a',
        '€' => 'e',
        '£' => 'l',
        _ => c,
    }
}
