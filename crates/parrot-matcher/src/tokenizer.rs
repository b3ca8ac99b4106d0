//! Word segmentation for mixed Chinese/Latin text.

use jieba_rs::Jieba;
use std::sync::LazyLock;

/// Dictionary-backed segmenter, loaded on first use and shared read-only.
static JIEBA: LazyLock<Jieba> = LazyLock::new(Jieba::new);

/// Load the segmentation dictionary now instead of on the first message.
pub fn warm_up() {
    LazyLock::force(&JIEBA);
}

/// Split `text` into word-like tokens.
///
/// Whitespace and punctuation-only pieces are dropped. Calling this twice on
/// the same input yields the same sequence.
pub fn segment(text: &str) -> Vec<&str> {
    JIEBA
        .cut(text, true)
        .into_iter()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin_words_split_on_spaces() {
        assert_eq!(segment("hello world"), vec!["hello", "world"]);
    }

    #[test]
    fn test_punctuation_dropped() {
        assert_eq!(segment("hi, there!"), vec!["hi", "there"]);
        assert!(segment("?!  ...").is_empty());
    }

    #[test]
    fn test_chinese_tokens_cover_input() {
        let tokens = segment("新手攻略");
        assert!(!tokens.is_empty());
        assert_eq!(tokens.concat(), "新手攻略");
    }

    #[test]
    fn test_empty_input() {
        assert!(segment("").is_empty());
    }

    #[test]
    fn test_segment_is_restartable() {
        let text = "我想要一份地图 please";
        assert_eq!(segment(text), segment(text));
    }
}
