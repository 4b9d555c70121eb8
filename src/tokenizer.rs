//! Text normalization and segmentation.
//!
//! Produces the token stream every scorer consumes. ASCII runs become
//! lowercased word tokens; CJK text is segmented by forward maximum matching
//! against the lexicon vocabulary (longest known keyword wins), falling back
//! to single characters. That reproduces the one property scoring depends on:
//! lexicon keywords surface as whole tokens when present, so short CJK
//! keywords never match on accidental substring containment.

use crate::lexicon;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Cleared wholesale once the per-input cache reaches this many entries.
const CACHE_CAP: usize = 1024;

/// Longest vocabulary entry considered during maximum matching, in chars.
const MAX_MATCH_LEN: usize = 8;

pub struct Tokenizer {
    cache: Mutex<HashMap<String, Arc<Vec<String>>>>,
    vocab: HashSet<String>,
    max_word_len: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        let vocab: HashSet<String> = lexicon::all_keywords()
            .map(|w| w.to_lowercase())
            .collect();
        let max_word_len = vocab
            .iter()
            .map(|w| w.chars().count())
            .max()
            .unwrap_or(1)
            .min(MAX_MATCH_LEN);

        Self {
            cache: Mutex::new(HashMap::new()),
            vocab,
            max_word_len,
        }
    }

    /// Tokenize text into a normalized token sequence. Idempotent and cached
    /// by the exact input string.
    pub fn tokenize(&self, text: &str) -> Arc<Vec<String>> {
        if let Some(cached) = self.cache.lock().unwrap().get(text) {
            return Arc::clone(cached);
        }

        let tokens = Arc::new(self.segment(text));

        let mut cache = self.cache.lock().unwrap();
        if cache.len() >= CACHE_CAP {
            cache.clear();
        }
        cache.insert(text.to_string(), Arc::clone(&tokens));

        tokens
    }

    fn segment(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c.is_whitespace() || is_punctuation(c) {
                i += 1;
                continue;
            }

            if c.is_ascii_alphanumeric() {
                let mut run_end = i;
                while run_end < chars.len() && chars[run_end].is_ascii_alphanumeric() {
                    run_end += 1;
                }
                // A vocabulary entry may extend past the run (mixed-script
                // tokens like "i人"), but must never split it: that would
                // turn substrings of longer words into phantom tokens.
                let min_len = (run_end - i).max(2);
                if let Some(len) = self.longest_vocab_match(&chars, i, min_len) {
                    let word: String = chars[i..i + len].iter().collect();
                    tokens.push(word.to_lowercase());
                    i += len;
                } else {
                    let word: String = chars[i..run_end].iter().collect();
                    tokens.push(word.to_lowercase());
                    i = run_end;
                }
                continue;
            }

            // Longest vocabulary match for CJK text ("编程", "独处充电").
            if let Some(len) = self.longest_vocab_match(&chars, i, 2) {
                let word: String = chars[i..i + len].iter().collect();
                tokens.push(word.to_lowercase());
                i += len;
                continue;
            }

            // Unknown non-ASCII character: emit it on its own.
            tokens.push(c.to_string());
            i += 1;
        }

        tokens
    }

    fn longest_vocab_match(&self, chars: &[char], start: usize, min_len: usize) -> Option<usize> {
        let limit = self.max_word_len.min(chars.len() - start);
        if min_len > limit {
            return None;
        }
        for len in (min_len..=limit).rev() {
            let candidate: String = chars[start..start + len]
                .iter()
                .collect::<String>()
                .to_lowercase();
            if self.vocab.contains(&candidate) {
                return Some(len);
            }
        }
        None
    }

    /// Extract the most salient tokens with weights derived from frequency
    /// and token length.
    pub fn extract_keywords(&self, text: &str, top_k: usize) -> Vec<(String, f32)> {
        let tokens = self.tokenize(text);
        if tokens.is_empty() {
            return Vec::new();
        }

        let total = tokens.len() as f32;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in tokens.iter() {
            *counts.entry(token.as_str()).or_default() += 1;
        }

        let mut scored: Vec<(String, f32)> = counts
            .into_iter()
            .map(|(token, count)| {
                let tf = count as f32 / total;
                let length_factor = 1.0 + token.chars().count() as f32 * 0.1;
                (token.to_string(), tf * length_factor)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(top_k);
        scored
    }

    /// True iff `word` appears as a whole token of `text`, never as a mere
    /// substring of a longer token.
    pub fn is_complete_word(&self, text: &str, word: &str) -> bool {
        self.tokenize(text).iter().any(|t| t == word)
    }

    pub fn clear_cache(&self) {
        self.cache.lock().unwrap().clear();
    }

    #[cfg(test)]
    fn cache_len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(
            c,
            '。' | '，' | '！' | '？' | '；' | '：' | '、' | '「' | '」' | '『' | '』'
                | '（' | '）' | '《' | '》' | '“' | '”' | '‘' | '’' | '…' | '—' | '·'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_lexicon_keywords_out_of_cjk_text() {
        let tokenizer = Tokenizer::new();
        let tokens = tokenizer.tokenize("我喜欢编程和打篮球，还爱看番");
        assert!(tokens.iter().any(|t| t == "编程"));
        assert!(tokens.iter().any(|t| t == "篮球"));
        assert!(tokens.iter().any(|t| t == "看番"));
    }

    #[test]
    fn ascii_runs_are_single_lowercased_tokens() {
        let tokenizer = Tokenizer::new();
        let tokens = tokenizer.tokenize("玩Steam和FPS游戏");
        assert!(tokens.iter().any(|t| t == "steam"));
        assert!(tokens.iter().any(|t| t == "fps"));
        assert!(tokens.iter().any(|t| t == "游戏"));
    }

    #[test]
    fn complete_word_rejects_substrings_of_longer_tokens() {
        let tokenizer = Tokenizer::new();
        assert!(tokenizer.is_complete_word("we play fps games", "fps"));
        assert!(!tokenizer.is_complete_word("we play fpsxyz games", "fps"));
    }

    #[test]
    fn tokenize_is_cached_by_exact_input() {
        let tokenizer = Tokenizer::new();
        let a = tokenizer.tokenize("编程很有趣");
        let b = tokenizer.tokenize("编程很有趣");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(tokenizer.cache_len(), 1);
    }

    #[test]
    fn cache_is_bounded() {
        let tokenizer = Tokenizer::new();
        for i in 0..(CACHE_CAP + 10) {
            tokenizer.tokenize(&format!("text {}", i));
        }
        assert!(tokenizer.cache_len() <= CACHE_CAP);
    }

    #[test]
    fn keyword_extraction_ranks_by_frequency_and_length() {
        let tokenizer = Tokenizer::new();
        let keywords = tokenizer.extract_keywords("编程 编程 编程 音乐", 2);
        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords[0].0, "编程");
        assert!(keywords[0].1 > keywords[1].1);
    }

    #[test]
    fn mixed_script_vocab_entries_match() {
        let tokenizer = Tokenizer::new();
        let tokens = tokenizer.tokenize("我是i人");
        assert!(tokens.iter().any(|t| t == "i人"));
    }
}
