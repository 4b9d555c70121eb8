//! Lexical scoring: tag extraction, emotion analysis, topic extraction and
//! feedback classification.
//!
//! Everything here is synchronous and CPU-bound; scoring never errors and
//! never suspends. Confidence values are clamped to the category ceilings no
//! matter how many keywords match.

use crate::lexicon::{self, TagKeywords};
use crate::profile::{Tag, TagCategory};
use crate::tokenizer::Tokenizer;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Evidence excerpts are truncated to roughly this many characters.
const EVIDENCE_MAX_CHARS: usize = 100;

/// Scored categories with their (base, max) confidence parameters.
const SCORED_CATEGORIES: &[(TagCategory, f32, f32)] = &[
    (TagCategory::Interest, 0.3, 0.9),
    (TagCategory::Knowledge, 0.2, 0.8),
    (TagCategory::Personality, 0.2, 0.8),
    (TagCategory::Communication, 0.3, 0.9),
    (TagCategory::Emotion, 0.2, 0.8),
    (TagCategory::Value, 0.2, 0.8),
    (TagCategory::Subculture, 0.3, 0.9),
    (TagCategory::Topic, 0.3, 0.85),
];

const CONFIDENCE_MULTIPLIER: f32 = 0.7;

/// Session-wide document statistics backing the IDF proxy.
#[derive(Default)]
struct DocStats {
    word_frequency: HashMap<String, u32>,
    total_documents: u32,
}

/// Generic confidence-scored tag extraction over the lexicon.
pub struct TagScorer {
    tokenizer: Arc<Tokenizer>,
    stats: Mutex<DocStats>,
}

impl TagScorer {
    pub fn new(tokenizer: Arc<Tokenizer>) -> Self {
        Self {
            tokenizer,
            stats: Mutex::new(DocStats::default()),
        }
    }

    /// Extract tags for every scored category plus the MBTI tables from a
    /// batch of user messages.
    pub fn extract_tags_from_messages(&self, messages: &[&str]) -> Vec<Tag> {
        let content = messages.join(" ");
        self.extract_tags_from_text(&content)
    }

    pub fn extract_tags_from_text(&self, content: &str) -> Vec<Tag> {
        let lower = content.to_lowercase();
        let tokens = self.tokenizer.tokenize(&lower);

        // One document per extraction run for the IDF proxy.
        {
            let mut stats = self.stats.lock().unwrap();
            stats.total_documents += 1;
            for token in tokens.iter() {
                *stats.word_frequency.entry(token.clone()).or_default() += 1;
            }
        }

        let extracted: HashMap<String, f32> = self
            .tokenizer
            .extract_keywords(&lower, 30)
            .into_iter()
            .collect();

        let mut tags = Vec::new();
        for &(category, base, max) in SCORED_CATEGORIES {
            tags.extend(self.extract_category(content, &lower, &tokens, category, base, max, &extracted));
        }
        tags.extend(self.extract_mbti_tags(content, &lower, &tokens));
        tags
    }

    #[allow(clippy::too_many_arguments)]
    fn extract_category(
        &self,
        content: &str,
        lower: &str,
        tokens: &[String],
        category: TagCategory,
        base_confidence: f32,
        max_confidence: f32,
        extracted: &HashMap<String, f32>,
    ) -> Vec<Tag> {
        let mut tags = Vec::new();
        let token_set: HashSet<&str> = tokens.iter().map(|s| s.as_str()).collect();

        for (tag_name, keywords) in lexicon::keywords(category) {
            let mut match_count = 0u32;
            let mut weighted_score = 0.0f32;
            let mut matched: Vec<&str> = Vec::new();

            for keyword in keywords.iter() {
                let keyword_lower = keyword.to_lowercase();
                let is_match = token_set.contains(keyword_lower.as_str())
                    || self.tokenizer.is_complete_word(lower, &keyword_lower);
                if !is_match {
                    continue;
                }

                match_count += 1;
                matched.push(*keyword);
                weighted_score += self.keyword_weight(&keyword_lower, tokens, extracted);
            }

            if match_count > 0 {
                let normalized = weighted_score / keywords.len() as f32;
                let confidence =
                    (base_confidence + normalized * CONFIDENCE_MULTIPLIER).min(max_confidence);
                tags.push(Tag::new(
                    *tag_name,
                    category,
                    confidence,
                    extract_evidence(content, &matched),
                ));
            }
        }

        tags
    }

    /// Per-keyword weight: tripled salient-keyword weight when the tokenizer
    /// ranked it, otherwise a TF-IDF estimate with a length factor.
    fn keyword_weight(
        &self,
        keyword: &str,
        tokens: &[String],
        extracted: &HashMap<String, f32>,
    ) -> f32 {
        if let Some(weight) = extracted.get(keyword) {
            return weight * 3.0;
        }

        let tf = tokens.iter().filter(|t| t.as_str() == keyword).count() as f32
            / tokens.len().max(1) as f32;

        let stats = self.stats.lock().unwrap();
        let idf = match stats.word_frequency.get(keyword) {
            Some(&df) if df > 0 => (stats.total_documents as f32 / df as f32).log10(),
            _ => 1.0,
        };

        let length_factor = (1.0 + (keyword.chars().count() as f32 - 2.0) * 0.1).max(0.5);
        tf * idf * length_factor
    }

    /// MBTI extraction is stricter than the generic routine: a type or
    /// dimension is only emitted when at least two distinct keywords match,
    /// because single matches on short personality cues are too noisy.
    fn extract_mbti_tags(&self, content: &str, lower: &str, tokens: &[String]) -> Vec<Tag> {
        let mut tags = Vec::new();
        let token_set: HashSet<&str> = tokens.iter().map(|s| s.as_str()).collect();

        self.extract_mbti_table(
            content, lower, &token_set, lexicon::MBTI_TYPES, TagCategory::Mbti, 0.9, &mut tags,
        );
        self.extract_mbti_table(
            content, lower, &token_set, lexicon::MBTI_EI, TagCategory::MbtiEi, 0.85, &mut tags,
        );
        self.extract_mbti_table(
            content, lower, &token_set, lexicon::MBTI_SN, TagCategory::MbtiSn, 0.85, &mut tags,
        );
        self.extract_mbti_table(
            content, lower, &token_set, lexicon::MBTI_TF, TagCategory::MbtiTf, 0.85, &mut tags,
        );
        self.extract_mbti_table(
            content, lower, &token_set, lexicon::MBTI_JP, TagCategory::MbtiJp, 0.85, &mut tags,
        );

        tags
    }

    #[allow(clippy::too_many_arguments)]
    fn extract_mbti_table(
        &self,
        content: &str,
        lower: &str,
        token_set: &HashSet<&str>,
        table: &[TagKeywords],
        category: TagCategory,
        max_confidence: f32,
        tags: &mut Vec<Tag>,
    ) {
        for (name, keywords) in table {
            let mut matched: Vec<&str> = Vec::new();
            for keyword in keywords.iter() {
                let keyword_lower = keyword.to_lowercase();
                if token_set.contains(keyword_lower.as_str()) || lower.contains(&keyword_lower) {
                    matched.push(*keyword);
                }
            }

            if matched.len() >= 2 {
                let confidence = (0.3 + matched.len() as f32 * 0.05).min(max_confidence);
                tags.push(Tag::new(
                    *name,
                    category,
                    confidence,
                    extract_evidence(content, &matched),
                ));
            }
        }
    }
}

/// First sentence containing a matched keyword, trimmed to ~100 chars and
/// centered on the keyword when the sentence runs longer.
pub fn extract_evidence(content: &str, matched_keywords: &[&str]) -> String {
    for sentence in content.split(['.', '。', '!', '！', '?', '？', ';', '；', '\n']) {
        let trimmed = sentence.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lower = trimmed.to_lowercase();

        for keyword in matched_keywords {
            let keyword_lower = keyword.to_lowercase();
            let Some(byte_idx) = lower.find(&keyword_lower) else {
                continue;
            };

            let chars: Vec<char> = trimmed.chars().collect();
            if chars.len() <= EVIDENCE_MAX_CHARS {
                return trimmed.to_string();
            }

            let char_idx = lower[..byte_idx].chars().count();
            let keyword_len = keyword_lower.chars().count();
            let start = char_idx.saturating_sub(40);
            let end = (char_idx + keyword_len + 40).min(chars.len());
            let excerpt: String = chars[start..end].iter().collect();
            return format!("...{}...", excerpt);
        }
    }

    String::new()
}

/// Dominant-emotion analysis over the emotion lexicon and sentiment map.
pub struct EmotionAnalyzer {
    tokenizer: Arc<Tokenizer>,
}

impl EmotionAnalyzer {
    pub fn new(tokenizer: Arc<Tokenizer>) -> Self {
        Self { tokenizer }
    }

    /// The emotion label with the highest accumulated score, or `None` when
    /// nothing scored above zero.
    pub fn analyze(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        let tokens = self.tokenizer.tokenize(&lower);
        let keywords: Vec<String> = self
            .tokenizer
            .extract_keywords(&lower, 10)
            .into_iter()
            .map(|(token, _)| token)
            .collect();

        let all_tokens: HashSet<&str> = tokens
            .iter()
            .map(|s| s.as_str())
            .chain(keywords.iter().map(|s| s.as_str()))
            .collect();

        let mut scores: HashMap<&str, f32> = HashMap::new();

        for (emotion, emotion_keywords) in lexicon::EMOTION {
            let mut score = 0.0f32;
            for keyword in emotion_keywords.iter() {
                let keyword_lower = keyword.to_lowercase();
                if !all_tokens.contains(keyword_lower.as_str()) {
                    continue;
                }
                score += 0.3;

                for intensifier in lexicon::INTENSIFIERS {
                    if lower.contains(&format!("{}{}", intensifier, keyword_lower)) {
                        score += 0.2;
                        break;
                    }
                }
            }

            // Polarity alignment with the sentiment map.
            for word in &all_tokens {
                let Some(sentiment) = lexicon::sentiment(word) else {
                    continue;
                };
                let aligned = match *emotion {
                    "快乐" => sentiment > 0.5,
                    "忧郁" => sentiment < -0.5,
                    "愤怒" => sentiment < -0.6,
                    "焦虑" => sentiment < -0.4,
                    "平静" => sentiment.abs() < 0.4,
                    _ => false,
                };
                if aligned {
                    score += 0.2;
                }
            }

            if score > 0.0 {
                scores.insert(*emotion, score);
            }
        }

        let mut positive_score = 0.0f32;
        let mut negative_score = 0.0f32;
        for word in &all_tokens {
            if let Some(sentiment) = lexicon::sentiment(word) {
                if sentiment > 0.0 {
                    positive_score += sentiment;
                } else {
                    negative_score += sentiment.abs();
                }
            }
        }

        if positive_score > 0.5 && positive_score > negative_score * 1.5 {
            scores.insert("积极", positive_score);
        } else if negative_score > 0.5 && negative_score > positive_score * 1.5 {
            let bucket = if ["担心", "害怕", "紧张", "焦虑"].iter().any(|w| lower.contains(w)) {
                "焦虑"
            } else if ["生气", "愤怒", "烦躁", "不爽"].iter().any(|w| lower.contains(w)) {
                "愤怒"
            } else {
                "忧郁"
            };
            scores.insert(bucket, negative_score);
        }

        scores
            .into_iter()
            .max_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.0.cmp(a.0))
            })
            .map(|(emotion, _)| emotion.to_string())
    }
}

/// Ranked topic extraction.
pub struct TopicExtractor {
    tokenizer: Arc<Tokenizer>,
}

impl TopicExtractor {
    pub fn new(tokenizer: Arc<Tokenizer>) -> Self {
        Self { tokenizer }
    }

    /// Up to five topics with confidences, strongest first.
    pub fn extract(&self, text: &str) -> Vec<(String, f32)> {
        let lower = text.to_lowercase();
        let tokens = self.tokenizer.tokenize(&lower);
        let token_set: HashSet<&str> = tokens.iter().map(|s| s.as_str()).collect();
        let extracted: HashSet<String> = self
            .tokenizer
            .extract_keywords(&lower, 15)
            .into_iter()
            .map(|(token, _)| token)
            .collect();

        let mut topics: Vec<(String, f32)> = Vec::new();

        for (topic, keywords) in lexicon::TOPIC {
            let mut score = 0.0f32;
            let mut keyword_count = 0u32;

            for keyword in keywords.iter() {
                let keyword_lower = keyword.to_lowercase();
                let in_extracted = extracted.contains(keyword_lower.as_str());
                let in_tokens = token_set.contains(keyword_lower.as_str());
                if in_extracted || in_tokens {
                    keyword_count += 1;
                    score += if in_extracted { 2.0 } else { 1.0 };
                }
            }

            if keyword_count >= 2 || score >= 2.0 {
                let length_bonus = (text.chars().count() as f32 / 200.0).min(1.0) * 0.2;
                let coverage = keyword_count as f32 / keywords.len() as f32;
                let confidence = (0.3 + score * 0.1 + length_bonus + coverage * 0.2).min(0.9);
                topics.push((topic.to_string(), confidence));
            }
        }

        topics.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        topics.truncate(5);
        topics
    }
}

/// Polarity of a user turn read as feedback on the assistant's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackPolarity {
    Positive,
    Negative,
    Neutral,
}

/// A rhetorical negative question ("为什么…?", "什么…?") reads as criticism
/// even though question-damping lowered its confidence, so part of the damped
/// confidence is restored. Coefficients are empirical; the rule is kept
/// standalone so it can be retuned and tested in isolation.
pub fn rhetorical_question_restore(text: &str, polarity: FeedbackPolarity, confidence: f32) -> f32 {
    if polarity == FeedbackPolarity::Negative && (text.contains("什么") || text.contains("为什么")) {
        confidence * 1.2
    } else {
        confidence
    }
}

/// Sentiment-sum feedback classification with question damping.
pub struct FeedbackClassifier {
    tokenizer: Arc<Tokenizer>,
}

impl FeedbackClassifier {
    pub fn new(tokenizer: Arc<Tokenizer>) -> Self {
        Self { tokenizer }
    }

    /// Classify a user turn as positive/negative/neutral feedback with a
    /// confidence in [0, 1].
    pub fn classify(&self, text: &str) -> (FeedbackPolarity, f32) {
        let lower = text.to_lowercase();
        let tokens = self.tokenizer.tokenize(&lower);

        let mut sentiment_score = 0.0f32;
        let mut sentiment_words = 0u32;
        for token in tokens.iter() {
            if let Some(weight) = lexicon::sentiment(token) {
                sentiment_score += weight;
                sentiment_words += 1;
            }
        }

        let (mut polarity, mut confidence) = if sentiment_score > 0.3 {
            (FeedbackPolarity::Positive, sentiment_score * 0.8)
        } else if sentiment_score < -0.3 {
            (FeedbackPolarity::Negative, -sentiment_score * 0.8)
        } else {
            (FeedbackPolarity::Neutral, 0.2)
        };

        // More sentiment-bearing words, more certainty.
        confidence += (0.05 * sentiment_words as f32).min(0.3);

        // Short messages are more likely direct feedback.
        if tokens.len() < 5 && confidence > 0.3 {
            confidence += 0.1;
        }

        // Questions are usually not feedback, except rhetorical negatives.
        let trimmed = text.trim_end();
        if trimmed.ends_with('?') || trimmed.ends_with('？') {
            confidence *= 0.6;
            confidence = rhetorical_question_restore(text, polarity, confidence);
        }

        confidence = confidence.clamp(0.0, 1.0);
        if confidence < 0.3 {
            polarity = FeedbackPolarity::Neutral;
        }

        (polarity, confidence)
    }

    /// Extract bounded tag-confidence adjustments from a user turn:
    /// explicit communication-style requests, net-slang usage, interest and
    /// subculture reinforcement.
    pub fn extract_feedback_signals(&self, user_message: &str) -> Vec<(String, TagCategory, f32)> {
        let lower = user_message.to_lowercase();
        let tokens = self.tokenizer.tokenize(&lower);
        let token_set: HashSet<&str> = tokens.iter().map(|s| s.as_str()).collect();
        let extracted: HashSet<String> = self
            .tokenizer
            .extract_keywords(&lower, 10)
            .into_iter()
            .map(|(token, _)| token)
            .collect();

        let mut signals: Vec<(String, TagCategory, f32)> = Vec::new();

        for (pattern, tag, adjustment) in lexicon::COMM_PREFERENCES {
            if token_set.contains(pattern) || lower.contains(pattern) {
                signals.push((tag.to_string(), TagCategory::Communication, *adjustment));
            }
        }

        let slang_count = tokens
            .iter()
            .filter(|t| lexicon::NET_SLANG.contains(&t.as_str()))
            .count();
        if slang_count > 0 {
            signals.push(("网络用语".to_string(), TagCategory::Communication, 0.1));
        }

        for (interest, keywords) in lexicon::INTEREST {
            let mut match_count = 0u32;
            let mut total_weight = 0.0f32;
            for keyword in keywords.iter() {
                let keyword_lower = keyword.to_lowercase();
                let in_extracted = extracted.contains(keyword_lower.as_str());
                if in_extracted || token_set.contains(keyword_lower.as_str()) {
                    match_count += 1;
                    total_weight += if in_extracted { 1.5 } else { 1.0 };
                }
            }
            if match_count >= 2 || total_weight >= 2.0 {
                let adjustment = (0.1 + total_weight * 0.05).min(0.3);
                signals.push((interest.to_string(), TagCategory::Interest, adjustment));
            }
        }

        for (subculture, keywords) in lexicon::SUBCULTURE {
            let mut match_count = 0u32;
            let mut special_count = 0u32;
            for keyword in keywords.iter() {
                let keyword_lower = keyword.to_lowercase();
                let in_extracted = extracted.contains(keyword_lower.as_str());
                if in_extracted || token_set.contains(keyword_lower.as_str()) {
                    match_count += 1;
                    if keyword.chars().count() >= 3 || in_extracted {
                        special_count += 1;
                    }
                }
            }
            if match_count >= 2 || special_count >= 1 {
                let adjustment = (0.12 + special_count as f32 * 0.03).min(0.25);
                signals.push((subculture.to_string(), TagCategory::Subculture, adjustment));
            }
        }

        signals
    }
}
