//! Kanji/hanzi to pinyin lookup and tone stripping.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Character-to-pinyin table loaded once at startup and immutable
/// thereafter.
///
/// The on-disk format is one `character<TAB>reading [reading ...]` line
/// per entry; when several readings are listed only the first is kept.
#[derive(Debug, Default)]
pub struct PinyinTable {
    map: HashMap<char, String>,
}

impl PinyinTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::Vocab {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut map = HashMap::new();
        for line in content.lines() {
            if line.is_empty() {
                continue;
            }
            let Some((character, readings)) = line.split_once('\t') else {
                continue;
            };
            let Some(c) = character.chars().next() else {
                continue;
            };
            let reading = readings
                .split(' ')
                .next()
                .unwrap_or("")
                .trim_end_matches(['\r', ' ']);
            if !reading.is_empty() {
                map.insert(c, reading.to_string());
            }
        }

        if map.is_empty() {
            return Err(Error::Vocab {
                path: path.to_path_buf(),
                message: "no pinyin entries".to_string(),
            });
        }

        Ok(Self { map })
    }

    /// First-reading pinyin for a character, if the table knows it.
    pub fn lookup(&self, c: char) -> Option<&str> {
        self.map.get(&c).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: &[(char, &str)]) -> Self {
        Self {
            map: pairs
                .iter()
                .map(|(c, p)| (*c, p.to_string()))
                .collect(),
        }
    }
}

/// Strip pinyin tone diacritics down to base ASCII letters.
///
/// The pinyin `ü` family maps to `v` by convention. Non-tone characters
/// pass through unchanged.
pub fn strip_tones(s: &str) -> String {
    s.chars().map(strip_tone_char).collect()
}

fn strip_tone_char(c: char) -> char {
    match c {
        'ā' | 'á' | 'ǎ' | 'à' => 'a',
        'ē' | 'é' | 'ě' | 'è' => 'e',
        'ī' | 'í' | 'ǐ' | 'ì' => 'i',
        'ō' | 'ó' | 'ǒ' | 'ò' => 'o',
        'ū' | 'ú' | 'ǔ' | 'ù' => 'u',
        'ǖ' | 'ǘ' | 'ǚ' | 'ǜ' | 'ü' => 'v',
        'ń' | 'ň' | 'ǹ' => 'n',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn strips_all_tone_rows() {
        assert_eq!(strip_tones("jīn"), "jin");
        assert_eq!(strip_tones("fāng"), "fang");
        assert_eq!(strip_tones("lǜsè"), "lvse");
        assert_eq!(strip_tones("nǚ"), "nv");
        assert_eq!(strip_tones("hello"), "hello");
    }

    #[test]
    fn loads_table_first_reading_wins() {
        let path = std::env::temp_dir().join("subalign_pinyin.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "今\tjīn").unwrap();
        writeln!(f, "行\txíng háng").unwrap();
        writeln!(f).unwrap();
        drop(f);

        let table = PinyinTable::load(&path).unwrap();

        assert_eq!(table.lookup('今'), Some("jīn"));
        assert_eq!(table.lookup('行'), Some("xíng"));
        assert_eq!(table.lookup('天'), None);
        assert_eq!(table.len(), 2);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn rejects_table_without_entries() {
        let path = std::env::temp_dir().join("subalign_pinyin_empty.txt");
        std::fs::write(&path, "no tabs here\n").unwrap();

        assert!(matches!(
            PinyinTable::load(&path),
            Err(Error::Vocab { .. })
        ));

        std::fs::remove_file(path).ok();
    }
}
