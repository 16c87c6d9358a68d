//! Word normalization and scoring.
//!
//! Submissions are matched against the target list case-insensitively and
//! without diacritics, so a player typing `"chat"` claims `"CHAT"` and
//! `"ete"` claims `"ÉTÉ"`.

/// Points awarded per letter of a claimed word.
const POINTS_PER_LETTER: u32 = 10;

/// Fold a word to its canonical comparison form: uppercase, diacritics
/// stripped. Covers the accented Latin letters that appear in the word
/// packs (French/Spanish themes).
pub fn normalize(word: &str) -> String {
    word.trim()
        .chars()
        .flat_map(|c| c.to_uppercase())
        .map(fold_char)
        .collect()
}

/// Score for claiming `word`.
pub fn score_for(word: &str) -> u32 {
    word.chars().count() as u32 * POINTS_PER_LETTER
}

fn fold_char(c: char) -> char {
    match c {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'Ç' => 'C',
        'Ñ' => 'N',
        'Ý' => 'Y',
        other => other,
    }
}
