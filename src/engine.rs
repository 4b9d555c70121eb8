//! Profile engine: drives tag extraction over dialogue turns, maintains the
//! per-chat profile and renders it for the conversation context.
//!
//! The engine is an injectable instance; the analysis cursors and turn
//! counters that were process-wide maps in earlier designs live behind its
//! own mutexes so tests can run isolated engines side by side.

use crate::api::{ChatMessage, CompletionApi, Role};
use crate::db::SqliteStore;
use crate::error::Result;
use crate::logging;
use crate::profile::{
    Tag, TagCategory, UserProfile, MIN_CONFIDENCE_THRESHOLD, UPDATE_THRESHOLD_HIGH,
    UPDATE_THRESHOLD_NORMAL,
};
use crate::scorer::{
    extract_evidence, EmotionAnalyzer, FeedbackClassifier, FeedbackPolarity, TagScorer,
    TopicExtractor,
};
use crate::tokenizer::Tokenizer;
use chrono::Utc;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

/// Negative feedback at or above this confidence suppresses interest and
/// subculture reinforcement for the turn.
const NEGATIVE_SUPPRESSION_THRESHOLD: f32 = 0.7;

/// Messages sent to summary generation are capped at this many.
const SUMMARY_MESSAGE_WINDOW: usize = 30;

pub struct ProfileEngine {
    store: Arc<SqliteStore>,
    client: Arc<dyn CompletionApi>,
    model: String,
    tokenizer: Arc<Tokenizer>,
    scorer: TagScorer,
    emotions: EmotionAnalyzer,
    topics: TopicExtractor,
    feedback: FeedbackClassifier,
    // chat id -> fingerprint of the last analyzed message
    last_analyzed: Mutex<HashMap<String, u64>>,
    // chat id -> dialogue turn counter
    turns: Mutex<HashMap<String, u32>>,
    // chat id -> turn number of the last applied update cycle
    last_update_turn: Mutex<HashMap<String, u32>>,
}

impl ProfileEngine {
    pub fn new(store: Arc<SqliteStore>, client: Arc<dyn CompletionApi>, model: &str) -> Self {
        let tokenizer = Arc::new(Tokenizer::new());
        Self {
            store,
            client,
            model: model.to_string(),
            scorer: TagScorer::new(Arc::clone(&tokenizer)),
            emotions: EmotionAnalyzer::new(Arc::clone(&tokenizer)),
            topics: TopicExtractor::new(Arc::clone(&tokenizer)),
            feedback: FeedbackClassifier::new(Arc::clone(&tokenizer)),
            tokenizer,
            last_analyzed: Mutex::new(HashMap::new()),
            turns: Mutex::new(HashMap::new()),
            last_update_turn: Mutex::new(HashMap::new()),
        }
    }

    /// Count one dialogue turn for a chat and return the new total.
    pub fn note_turn(&self, chat_id: &str) -> u32 {
        let mut turns = self.turns.lock().unwrap();
        let counter = turns.entry(chat_id.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Update cadence: young profiles (version < 3) refresh every 5 turns,
    /// mature ones every 10.
    fn update_threshold(&self, chat_id: &str) -> Result<u32> {
        let threshold = match self.store.load_profile(chat_id)? {
            Some(profile) if profile.version >= 3 => UPDATE_THRESHOLD_NORMAL,
            _ => UPDATE_THRESHOLD_HIGH,
        };
        Ok(threshold)
    }

    /// Run an update cycle when the turn count hits the cadence. Repeated
    /// invocations for the same turn count are no-ops (the turn is never
    /// double-counted); off-cadence calls just return the stored profile.
    pub async fn check_and_update_user_profile(
        &self,
        chat_id: &str,
        messages: &[ChatMessage],
        dialog_turns: u32,
        force_update: bool,
    ) -> Result<Option<UserProfile>> {
        let threshold = self.update_threshold(chat_id)?;

        if !force_update && dialog_turns % threshold != 0 {
            return Ok(self.store.load_profile(chat_id)?);
        }

        if !force_update {
            let already_processed = {
                let last = self.last_update_turn.lock().unwrap();
                last.get(chat_id) == Some(&dialog_turns)
            };
            if already_processed {
                return Ok(self.store.load_profile(chat_id)?);
            }
        }

        let profile = self.update_user_profile(chat_id, messages).await?;
        self.last_update_turn
            .lock()
            .unwrap()
            .insert(chat_id.to_string(), dialog_turns);
        Ok(Some(profile))
    }

    /// Analyze new user messages, merge the extracted tags into the profile
    /// and persist it.
    pub async fn update_user_profile(
        &self,
        chat_id: &str,
        messages: &[ChatMessage],
    ) -> Result<UserProfile> {
        let mut profile = self.store.load_profile(chat_id)?.unwrap_or_default();

        // Incremental analysis: skip everything up to the cursor.
        let cursor = self.last_analyzed.lock().unwrap().get(chat_id).copied();
        let to_analyze: &[ChatMessage] = match cursor {
            Some(fingerprint) => messages
                .iter()
                .position(|m| message_fingerprint(m) == fingerprint)
                .map(|idx| &messages[idx + 1..])
                .unwrap_or(messages),
            None => messages,
        };

        if to_analyze.is_empty() {
            return Ok(profile);
        }

        let user_texts: Vec<&str> = to_analyze
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .collect();
        if user_texts.is_empty() {
            return Ok(profile);
        }

        let new_tags = self.scorer.extract_tags_from_messages(&user_texts);
        logging::log_profile(
            Some(chat_id),
            &format!("extracted {} tags from {} user messages", new_tags.len(), user_texts.len()),
        );

        for tag in new_tags {
            match tag.category {
                TagCategory::Interest => profile.record_interest_trend(&tag.name, tag.confidence),
                TagCategory::Emotion => profile.record_emotion(&tag.name),
                _ => {}
            }
            profile.add_or_update_tag(tag);
        }

        if user_texts.len() >= 3 || profile.summary.is_empty() {
            if let Some(summary) = self.generate_profile_summary(chat_id, &user_texts, &profile).await {
                profile.summary = summary;
            }
        }

        profile.prune_by_confidence(MIN_CONFIDENCE_THRESHOLD);
        profile.version += 1;
        profile.updated_at = Utc::now();

        if let Some(last) = messages.last() {
            self.last_analyzed
                .lock()
                .unwrap()
                .insert(chat_id.to_string(), message_fingerprint(last));
        }

        self.store.save_profile(chat_id, &profile)?;
        self.store.replace_tags(chat_id, &profile.tags)?;
        logging::log_profile(
            Some(chat_id),
            &format!("profile saved, {} tags, version {}", profile.tags.len(), profile.version),
        );

        Ok(profile)
    }

    /// Ask the completion capability for a fresh profile summary. A failed
    /// call keeps the previous summary (returns `None`).
    async fn generate_profile_summary(
        &self,
        chat_id: &str,
        user_texts: &[&str],
        profile: &UserProfile,
    ) -> Option<String> {
        let recent: Vec<&str> = user_texts
            .iter()
            .rev()
            .take(SUMMARY_MESSAGE_WINDOW)
            .rev()
            .copied()
            .collect();

        let mut prompt = String::from(
            "You analyze conversations and produce a precise user profile. \
             Based on the messages and current tags below, write a profile summary.\n",
        );

        if !profile.tags.is_empty() {
            prompt.push_str("\nCurrent tags:\n");
            let mut by_category: HashMap<&str, Vec<String>> = HashMap::new();
            for tag in &profile.tags {
                by_category
                    .entry(tag.category.as_str())
                    .or_default()
                    .push(format!("{}({:.2})", tag.name, tag.confidence));
            }
            let mut categories: Vec<_> = by_category.into_iter().collect();
            categories.sort_by(|a, b| a.0.cmp(b.0));
            for (category, tags) in categories {
                prompt.push_str(&format!("{}: {}\n", category, tags.join(", ")));
            }
        }

        if let Some((emotion, share)) = profile.dominant_emotion() {
            prompt.push_str(&format!(
                "\nDominant recent emotion: {} ({}%)\n",
                emotion,
                (share * 100.0) as i32
            ));
        }

        let trends = profile.analyze_interest_trends();
        if !trends.is_empty() {
            let mut entries: Vec<String> = trends
                .iter()
                .map(|(name, trend)| format!("{}({})", name, trend.as_str()))
                .collect();
            entries.sort();
            prompt.push_str(&format!("Interest trends: {}\n", entries.join(", ")));
        }

        if !profile.summary.is_empty() {
            prompt.push_str(&format!("\nPrevious summary:\n{}\n", profile.summary));
        }

        prompt.push_str("\nRecent user messages:\n");
        for text in &recent {
            prompt.push_str(&format!("- {}\n", text));
        }

        prompt.push_str(
            "\nWrite a profile of at most 250 characters covering personality, \
             interests, communication style, knowledge background and needs. \
             Start your answer with \"User profile:\" and nothing else.",
        );

        let request = [ChatMessage::user(prompt)];
        match self.client.complete(&self.model, &request, 0.3).await {
            Ok(response) => {
                let summary = response
                    .trim()
                    .strip_prefix("User profile:")
                    .unwrap_or(response.trim())
                    .trim()
                    .to_string();
                if summary.is_empty() {
                    None
                } else {
                    Some(summary)
                }
            }
            Err(err) => {
                logging::log_error(Some(chat_id), &format!("summary generation failed: {}", err));
                None
            }
        }
    }

    /// Per-turn lightweight processing: feedback-driven confidence
    /// adjustments, emotion recording and topic tagging. Synchronous scoring
    /// only; store failures are the only errors.
    pub fn process_dialog_turn(
        &self,
        user_message: &str,
        ai_response: &str,
        chat_id: &str,
    ) -> Result<()> {
        let signals = self.feedback.extract_feedback_signals(user_message);

        let (polarity, mut confidence) = self.feedback.classify(user_message);
        if self.shares_content_tokens(user_message, ai_response) {
            // Feedback aimed at the reply is more credible.
            confidence = (confidence + 0.15).min(1.0);
        }
        let suppress_reinforcement =
            polarity == FeedbackPolarity::Negative && confidence >= NEGATIVE_SUPPRESSION_THRESHOLD;

        for (name, category, adjustment) in signals {
            if suppress_reinforcement
                && matches!(category, TagCategory::Interest | TagCategory::Subculture)
            {
                continue;
            }
            self.adjust_tag_confidence(chat_id, &name, category, adjustment)?;
        }

        if let Some(emotion) = self.emotions.analyze(user_message) {
            if let Some(mut profile) = self.store.load_profile(chat_id)? {
                profile.record_emotion(&emotion);
                self.store.save_profile(chat_id, &profile)?;
            }
        }

        let topics = self.topics.extract(user_message);
        if !topics.is_empty() {
            if let Some(mut profile) = self.store.load_profile(chat_id)? {
                for (topic, confidence) in topics {
                    let evidence = extract_evidence(user_message, &[topic.as_str()]);
                    profile.add_or_update_tag(Tag::new(
                        topic,
                        TagCategory::Topic,
                        confidence,
                        evidence,
                    ));
                }
                self.store.save_profile(chat_id, &profile)?;
                self.store.replace_tags(chat_id, &profile.tags)?;
            }
        }

        Ok(())
    }

    fn shares_content_tokens(&self, user_message: &str, ai_response: &str) -> bool {
        if ai_response.is_empty() {
            return false;
        }
        let user_tokens = self.tokenizer.tokenize(&user_message.to_lowercase());
        let ai_tokens = self.tokenizer.tokenize(&ai_response.to_lowercase());
        user_tokens
            .iter()
            .filter(|t| t.chars().count() >= 2)
            .any(|t| ai_tokens.contains(t))
    }

    /// Apply a bounded confidence delta to an existing tag. Unknown tags are
    /// ignored.
    pub fn adjust_tag_confidence(
        &self,
        chat_id: &str,
        tag_name: &str,
        category: TagCategory,
        adjustment: f32,
    ) -> Result<()> {
        let Some(mut profile) = self.store.load_profile(chat_id)? else {
            return Ok(());
        };

        let Some(index) = profile
            .tags
            .iter()
            .position(|t| t.name == tag_name && t.category == category)
        else {
            return Ok(());
        };

        profile.tags[index] = profile.tags[index].adjust_confidence(adjustment);
        if category == TagCategory::Interest {
            let confidence = profile.tags[index].confidence;
            profile.record_interest_trend(tag_name, confidence);
        }
        profile.updated_at = Utc::now();

        self.store.save_profile(chat_id, &profile)?;
        self.store.replace_tags(chat_id, &profile.tags)?;
        logging::log_profile(
            Some(chat_id),
            &format!("adjusted {}/{} by {:+.2}", category.as_str(), tag_name, adjustment),
        );
        Ok(())
    }

    /// Render the stored profile for injection into the conversation context.
    pub fn user_profile_prompt(&self, chat_id: &str) -> Result<String> {
        Ok(self
            .store
            .load_profile(chat_id)?
            .map(|p| p.to_system_prompt())
            .unwrap_or_default())
    }

    /// Drop in-memory cursors and counters for a chat; pair with
    /// `SqliteStore::delete_chat_data` when the chat is deleted.
    pub fn forget_chat(&self, chat_id: &str) {
        self.last_analyzed.lock().unwrap().remove(chat_id);
        self.turns.lock().unwrap().remove(chat_id);
        self.last_update_turn.lock().unwrap().remove(chat_id);
    }
}

fn message_fingerprint(message: &ChatMessage) -> u64 {
    let mut hasher = DefaultHasher::new();
    message.content.hash(&mut hasher);
    hasher.finish()
}
