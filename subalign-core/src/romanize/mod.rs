//! Deterministic romanization of non-Latin scripts.
//!
//! Reduces kana, kanji (via a loaded pinyin table) and Hangul to ASCII
//! letter sequences so transcripts in those scripts can be aligned
//! against a Latin-alphabet acoustic model. Lookup order per position:
//! two-codepoint kana combination, single kana, kanji via pinyin,
//! Hangul syllable decomposition; anything else passes through and is
//! left to the downstream normalizer.

pub mod hangul;
pub mod kana;
pub mod pinyin;

pub use pinyin::PinyinTable;

/// Romanize one text chunk.
///
/// Kanji without a pinyin reading (or with no table loaded) are kept
/// as-is; the tokenizer's normalization pass drops them later.
pub fn romanize(text: &str, pinyin: Option<&PinyinTable>) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() * 2);

    let mut i = 0;
    while i < chars.len() {
        if i + 1 < chars.len()
            && let Some(r) = kana::pair(chars[i], chars[i + 1])
        {
            out.push_str(r);
            i += 2;
            continue;
        }

        let c = chars[i];
        if let Some(r) = kana::single(c) {
            out.push_str(r);
        } else if kana::is_kanji(c) {
            match pinyin.and_then(|t| t.lookup(c)) {
                Some(reading) => out.push_str(reading),
                None => out.push(c),
            }
        } else if hangul::is_hangul(c) {
            if let Some(r) = hangul::syllable_to_romaji(c) {
                out.push_str(&r);
            }
        } else {
            out.push(c);
        }
        i += 1;
    }

    out
}
