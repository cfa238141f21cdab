//! Token vocabulary loading.
//!
//! Two on-disk formats share one in-memory structure:
//!
//! - `vocab.json` — a JSON object of `{token: id}` pairs. Small alphabet
//!   (MMS-style, ~31 ids); non-Latin scripts must be romanized first.
//! - `tokens.txt` — lines of `token id`. Large alphabet
//!   (Omnilingual-style, ~9812 ids) with native CJK tokens.
//!
//! Both loaders append a synthetic `<star>` token at `max_id + 1`; the
//! preprocessor branches on the format tag.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// The reserved catch-all token injected between transcript chunks.
pub const STAR_TOKEN: &str = "<star>";

/// Which on-disk format the vocabulary was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabFormat {
    /// `vocab.json`: small romanized alphabet
    Json,
    /// `tokens.txt`: large native-CJK alphabet
    Txt,
}

/// Immutable token <-> id table with an appended `<star>` entry.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    token_to_id: HashMap<String, i64>,
    id_to_token: HashMap<i64, String>,
    pub blank_id: i64,
    pub star_id: i64,
    pub format: VocabFormat,
}

impl Vocabulary {
    /// Load `vocab.json` (a JSON object of `{token: id}`).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::Vocab {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let table: HashMap<String, i64> =
            serde_json::from_str(&content).map_err(|e| Error::Vocab {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Self::from_table(table, VocabFormat::Json).map_err(|message| Error::Vocab {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Load `tokens.txt` (lines of `token id`).
    ///
    /// The token may itself contain spaces; the id starts after the last
    /// space on the line. CR/LF endings are both accepted.
    pub fn from_tokens_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::Vocab {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut table = HashMap::new();
        for line in content.lines() {
            if line.is_empty() {
                continue;
            }
            let Some(last_space) = line.rfind(' ') else {
                return Err(Error::Vocab {
                    path: path.to_path_buf(),
                    message: format!("malformed line {line:?}: expected `token id`"),
                });
            };
            if last_space == 0 {
                return Err(Error::Vocab {
                    path: path.to_path_buf(),
                    message: format!("malformed line {line:?}: empty token"),
                });
            }
            let token = &line[..last_space];
            let id: i64 = line[last_space + 1..].parse().map_err(|_| Error::Vocab {
                path: path.to_path_buf(),
                message: format!("malformed line {line:?}: id is not an integer"),
            })?;
            table.insert(token.to_string(), id);
        }

        Self::from_table(table, VocabFormat::Txt).map_err(|message| Error::Vocab {
            path: path.to_path_buf(),
            message,
        })
    }

    fn from_table(
        table: HashMap<String, i64>,
        format: VocabFormat,
    ) -> std::result::Result<Self, String> {
        if table.is_empty() {
            return Err("empty vocabulary".to_string());
        }

        let mut id_to_token = HashMap::with_capacity(table.len() + 1);
        let mut max_id = -1i64;
        for (token, &id) in &table {
            if id < 0 {
                return Err(format!("negative id {id} for token {token:?}"));
            }
            if let Some(dup) = id_to_token.insert(id, token.clone()) {
                return Err(format!("duplicate id {id} for tokens {dup:?} and {token:?}"));
            }
            max_id = max_id.max(id);
        }

        let star_id = max_id + 1;
        let mut token_to_id = table;
        token_to_id.insert(STAR_TOKEN.to_string(), star_id);
        id_to_token.insert(star_id, STAR_TOKEN.to_string());

        Ok(Self {
            token_to_id,
            id_to_token,
            blank_id: 0,
            star_id,
            format,
        })
    }

    pub fn id(&self, token: &str) -> Option<i64> {
        self.token_to_id.get(token).copied()
    }

    pub fn token(&self, id: i64) -> Option<&str> {
        self.id_to_token.get(&id).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// Number of classes including the appended `<star>` slot. Emission
    /// matrices must have exactly this many columns.
    pub fn size_with_star(&self) -> usize {
        (self.star_id + 1) as usize
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_json_vocab_and_appends_star() {
        let path = write_temp(
            "subalign_vocab.json",
            r#"{"<blank>": 0, "a": 1, "b": 2, "'": 3}"#,
        );

        let vocab = Vocabulary::from_json_file(&path).unwrap();

        assert_eq!(vocab.format, VocabFormat::Json);
        assert_eq!(vocab.blank_id, 0);
        assert_eq!(vocab.star_id, 4);
        assert_eq!(vocab.id("a"), Some(1));
        assert_eq!(vocab.id(STAR_TOKEN), Some(4));
        assert_eq!(vocab.token(2), Some("b"));
        assert_eq!(vocab.size_with_star(), 5);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn loads_tokens_txt_with_crlf() {
        let path = write_temp("subalign_tokens.txt", "<s> 0\r\n今 1\r\n天 2\r\n");

        let vocab = Vocabulary::from_tokens_file(&path).unwrap();

        assert_eq!(vocab.format, VocabFormat::Txt);
        assert_eq!(vocab.id("今"), Some(1));
        assert_eq!(vocab.star_id, 3);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn token_may_contain_spaces() {
        let path = write_temp("subalign_tokens_sp.txt", "<s> 0\na b 1\n");

        let vocab = Vocabulary::from_tokens_file(&path).unwrap();

        assert_eq!(vocab.id("a b"), Some(1));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn rejects_empty_vocab() {
        let path = write_temp("subalign_vocab_empty.json", "{}");

        let result = Vocabulary::from_json_file(&path);

        assert!(matches!(result, Err(Error::Vocab { .. })));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn rejects_duplicate_ids() {
        let path = write_temp("subalign_vocab_dup.json", r#"{"a": 1, "b": 1}"#);

        let result = Vocabulary::from_json_file(&path);

        assert!(matches!(result, Err(Error::Vocab { .. })));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn rejects_non_integer_id() {
        let path = write_temp("subalign_tokens_bad.txt", "a x\n");

        let result = Vocabulary::from_tokens_file(&path);

        assert!(matches!(result, Err(Error::Vocab { .. })));

        std::fs::remove_file(path).ok();
    }
}
