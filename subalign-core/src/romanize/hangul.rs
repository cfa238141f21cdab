//! Hangul syllable decomposition to romanized jamo.
//!
//! A precomposed syllable decomposes as
//! `codepoint = (lead * 21 + vowel) * 28 + tail + 0xAC00`.
//! The letter tables follow uroman's conventions.

/// Initial consonants (choseong), 19 jamo. Index 14 is `c`, not `ch`.
const LEADS: [&str; 19] = [
    "g", "gg", "n", "d", "dd", "r", "m", "b", "bb", "s", "ss", "", "j", "jj", "c", "k", "t", "p",
    "h",
];

/// Medial vowels (jungseong), 21 jamo. Index 10 is `wai`, not `wae`.
const VOWELS: [&str; 21] = [
    "a", "ae", "ya", "yae", "eo", "e", "yeo", "ye", "o", "wa", "wai", "oe", "yo", "u", "weo", "we",
    "wi", "yu", "eu", "yi", "i",
];

/// Final consonants (jongseong), 28 jamo including the empty tail.
/// Index 23 is `c`, not `ch`.
const TAILS: [&str; 28] = [
    "", "g", "gg", "gs", "n", "nj", "nh", "d", "l", "lg", "lm", "lb", "ls", "lt", "lp", "lh", "m",
    "b", "bs", "s", "ss", "ng", "j", "c", "k", "t", "p", "h",
];

const SYLLABLE_BASE: u32 = 0xAC00;
const SYLLABLE_LAST: u32 = 0xD7A3;

/// Whether `c` is a precomposed Hangul syllable (U+AC00..=U+D7A3).
pub fn is_hangul(c: char) -> bool {
    (SYLLABLE_BASE..=SYLLABLE_LAST).contains(&(c as u32))
}

/// Decompose one Hangul syllable into its romanized jamo sequence.
///
/// Returns `None` for anything outside the syllable block.
pub fn syllable_to_romaji(c: char) -> Option<String> {
    let cp = c as u32;
    if !(SYLLABLE_BASE..=SYLLABLE_LAST).contains(&cp) {
        return None;
    }

    let code = cp - SYLLABLE_BASE;
    let lead = (code / (28 * 21)) as usize;
    let vowel = ((code / 28) % 21) as usize;
    let tail = (code % 28) as usize;

    let mut out = String::with_capacity(6);
    out.push_str(LEADS[lead]);
    out.push_str(VOWELS[vowel]);
    out.push_str(TAILS[tail]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposes_common_syllables() {
        // 한 = h + a + n, 글 = g + eu + l
        assert_eq!(syllable_to_romaji('한').as_deref(), Some("han"));
        assert_eq!(syllable_to_romaji('글').as_deref(), Some("geul"));
    }

    #[test]
    fn silent_lead_produces_vowel_only() {
        // 안 has the silent ㅇ lead
        assert_eq!(syllable_to_romaji('안').as_deref(), Some("an"));
    }

    #[test]
    fn block_boundaries() {
        assert!(is_hangul('가')); // U+AC00
        assert!(is_hangul('힣')); // U+D7A3
        assert!(!is_hangul('ㄱ')); // bare jamo, not a syllable
        assert_eq!(syllable_to_romaji('a'), None);
    }
}
