//! User profile data model: confidence-scored tags, trend series, rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tags below this confidence are pruned from the profile and skipped when
/// rendering.
pub const MIN_CONFIDENCE_THRESHOLD: f32 = 0.35;

/// Profile update cadence in dialogue turns for mature profiles.
pub const UPDATE_THRESHOLD_NORMAL: u32 = 10;
/// Faster cadence while the profile is young (version < 3), so new users
/// converge quickly.
pub const UPDATE_THRESHOLD_HIGH: u32 = 5;

/// Interest trend series keep this many points.
const INTEREST_TREND_CAP: usize = 10;
/// Emotion trend keeps this many points.
const EMOTION_TREND_CAP: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    Interest,
    Knowledge,
    Personality,
    Emotion,
    Communication,
    Preference,
    Goal,
    Value,
    Subculture,
    Topic,
    Mbti,
    MbtiEi,
    MbtiSn,
    MbtiTf,
    MbtiJp,
}

impl TagCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagCategory::Interest => "interest",
            TagCategory::Knowledge => "knowledge",
            TagCategory::Personality => "personality",
            TagCategory::Emotion => "emotion",
            TagCategory::Communication => "communication",
            TagCategory::Preference => "preference",
            TagCategory::Goal => "goal",
            TagCategory::Value => "value",
            TagCategory::Subculture => "subculture",
            TagCategory::Topic => "topic",
            TagCategory::Mbti => "mbti",
            TagCategory::MbtiEi => "mbti_ei",
            TagCategory::MbtiSn => "mbti_sn",
            TagCategory::MbtiTf => "mbti_tf",
            TagCategory::MbtiJp => "mbti_jp",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "interest" => Some(TagCategory::Interest),
            "knowledge" => Some(TagCategory::Knowledge),
            "personality" => Some(TagCategory::Personality),
            "emotion" => Some(TagCategory::Emotion),
            "communication" => Some(TagCategory::Communication),
            "preference" => Some(TagCategory::Preference),
            "goal" => Some(TagCategory::Goal),
            "value" => Some(TagCategory::Value),
            "subculture" => Some(TagCategory::Subculture),
            "topic" => Some(TagCategory::Topic),
            "mbti" => Some(TagCategory::Mbti),
            "mbti_ei" => Some(TagCategory::MbtiEi),
            "mbti_sn" => Some(TagCategory::MbtiSn),
            "mbti_tf" => Some(TagCategory::MbtiTf),
            "mbti_jp" => Some(TagCategory::MbtiJp),
            _ => None,
        }
    }
}

/// A confidence-scored label attached to a profile, with the conversation
/// excerpt that supports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub category: TagCategory,
    pub confidence: f32,
    pub evidence: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(name: impl Into<String>, category: TagCategory, confidence: f32, evidence: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            category,
            confidence: confidence.clamp(0.0, 1.0),
            evidence: evidence.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge with another observation of the same tag: confidence takes the
    /// maximum, evidence the longer excerpt, timestamp the latest.
    pub fn merge(&self, other: &Tag) -> Tag {
        Tag {
            name: self.name.clone(),
            category: self.category,
            confidence: self.confidence.max(other.confidence),
            evidence: if self.evidence.len() >= other.evidence.len() {
                self.evidence.clone()
            } else {
                other.evidence.clone()
            },
            created_at: self.created_at.min(other.created_at),
            updated_at: self.updated_at.max(other.updated_at),
        }
    }

    /// Apply a bounded confidence delta; the result stays in [0, 1].
    pub fn adjust_confidence(&self, adjustment: f32) -> Tag {
        Tag {
            confidence: (self.confidence + adjustment).clamp(0.0, 1.0),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// Direction of an interest trend over its recorded window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Falling => "falling",
            Trend::Stable => "stable",
        }
    }
}

/// Aggregated profile of one conversation partner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub tags: Vec<Tag>,
    pub summary: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub interest_trends: HashMap<String, Vec<(DateTime<Utc>, f32)>>,
    pub emotion_trend: Vec<(DateTime<Utc>, String)>,
}

impl Default for UserProfile {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            tags: Vec::new(),
            summary: String::new(),
            version: 1,
            created_at: now,
            updated_at: now,
            interest_trends: HashMap::new(),
            emotion_trend: Vec::new(),
        }
    }
}

impl UserProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag, or merge it into the existing tag with the same
    /// (name, category) key.
    pub fn add_or_update_tag(&mut self, tag: Tag) {
        if let Some(existing) = self
            .tags
            .iter_mut()
            .find(|t| t.name == tag.name && t.category == tag.category)
        {
            *existing = existing.merge(&tag);
        } else {
            self.tags.push(tag);
        }
        self.updated_at = Utc::now();
    }

    /// Drop tags whose confidence fell below the threshold; called after each
    /// update cycle so stale low-evidence tags decay out.
    pub fn prune_by_confidence(&mut self, threshold: f32) {
        self.tags.retain(|t| t.confidence >= threshold);
    }

    pub fn tags_by_category(&self, category: TagCategory) -> Vec<&Tag> {
        self.tags.iter().filter(|t| t.category == category).collect()
    }

    pub fn top_tags(&self, n: usize) -> Vec<&Tag> {
        let mut sorted: Vec<&Tag> = self.tags.iter().collect();
        sorted.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
        sorted.truncate(n);
        sorted
    }

    /// Append an emotion observation, keeping the most recent 30.
    pub fn record_emotion(&mut self, emotion: &str) {
        self.emotion_trend.push((Utc::now(), emotion.to_string()));
        if self.emotion_trend.len() > EMOTION_TREND_CAP {
            let excess = self.emotion_trend.len() - EMOTION_TREND_CAP;
            self.emotion_trend.drain(..excess);
        }
    }

    /// Append an interest confidence observation, keeping the most recent 10
    /// per interest.
    pub fn record_interest_trend(&mut self, interest: &str, confidence: f32) {
        let series = self.interest_trends.entry(interest.to_string()).or_default();
        series.push((Utc::now(), confidence));
        if series.len() > INTEREST_TREND_CAP {
            let excess = series.len() - INTEREST_TREND_CAP;
            series.drain(..excess);
        }
    }

    /// Trend direction per interest with at least 3 recorded points.
    pub fn analyze_interest_trends(&self) -> HashMap<String, Trend> {
        let mut result = HashMap::new();

        for (interest, series) in &self.interest_trends {
            if series.len() < 3 {
                continue;
            }
            let delta = series.last().unwrap().1 - series.first().unwrap().1;
            let trend = if delta > 0.2 {
                Trend::Rising
            } else if delta < -0.2 {
                Trend::Falling
            } else {
                Trend::Stable
            };
            result.insert(interest.clone(), trend);
        }

        result
    }

    /// Most frequent emotion among the last 10 observations, with its share.
    pub fn dominant_emotion(&self) -> Option<(String, f32)> {
        if self.emotion_trend.is_empty() {
            return None;
        }

        let recent: Vec<&(DateTime<Utc>, String)> = self
            .emotion_trend
            .iter()
            .rev()
            .take(10)
            .collect();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for (_, label) in &recent {
            *counts.entry(label.as_str()).or_default() += 1;
        }

        counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(label, count)| (label.to_string(), count as f32 / recent.len() as f32))
    }

    fn sorted_filtered(&self, category: TagCategory) -> Vec<&Tag> {
        let mut tags: Vec<&Tag> = self
            .tags
            .iter()
            .filter(|t| t.category == category && t.confidence >= MIN_CONFIDENCE_THRESHOLD)
            .collect();
        tags.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        tags
    }

    fn best_dimension(&self, category: TagCategory) -> Option<&Tag> {
        self.sorted_filtered(category).into_iter().next()
    }

    /// Deterministic textual rendering for injection into the conversation
    /// context. Section order and captions are stable.
    pub fn to_system_prompt(&self) -> String {
        let mut out = String::from("User profile:\n");

        if !self.summary.is_empty() {
            out.push_str(&self.summary);
            out.push_str("\n\n");
        }

        if let Some(top_mbti) = self.best_dimension(TagCategory::Mbti) {
            out.push_str(&format!("MBTI type: {}\n", top_mbti.name));
        }

        let dims = [
            TagCategory::MbtiEi,
            TagCategory::MbtiSn,
            TagCategory::MbtiTf,
            TagCategory::MbtiJp,
        ];
        let dim_parts: Vec<String> = dims
            .iter()
            .map(|c| {
                self.best_dimension(*c)
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| "?".to_string())
            })
            .collect();
        let dim_string = dim_parts.join("/");
        if dim_string != "?/?/?/?" {
            out.push_str(&format!("MBTI tendency: {}\n", dim_string));
        }

        if let Some((emotion, share)) = self.dominant_emotion() {
            out.push_str(&format!(
                "Recent mood: {} ({}%)\n",
                emotion,
                (share * 100.0) as i32
            ));
        }

        let interests = self.sorted_filtered(TagCategory::Interest);
        if !interests.is_empty() {
            let trends = self.analyze_interest_trends();
            let rendered: Vec<String> = interests
                .iter()
                .map(|t| {
                    let strong = t.confidence > 0.7;
                    match (strong, trends.get(&t.name)) {
                        (true, Some(trend)) => format!("{}(strong, {})", t.name, trend.as_str()),
                        (false, Some(trend)) => format!("{}({})", t.name, trend.as_str()),
                        (true, None) => format!("{}(strong)", t.name),
                        (false, None) => t.name.clone(),
                    }
                })
                .collect();
            out.push_str(&format!("Interests: {}\n", rendered.join(", ")));
        }

        let knowledge = self.sorted_filtered(TagCategory::Knowledge);
        if !knowledge.is_empty() {
            let rendered: Vec<String> = knowledge
                .iter()
                .map(|t| {
                    if t.confidence > 0.7 {
                        format!("{}(expert)", t.name)
                    } else {
                        t.name.clone()
                    }
                })
                .collect();
            out.push_str(&format!("Knowledge background: {}\n", rendered.join(", ")));
        }

        let sections: [(&str, TagCategory, usize); 8] = [
            ("Personality: ", TagCategory::Personality, 5),
            ("Communication preferences: ", TagCategory::Communication, 3),
            ("Cultural preferences: ", TagCategory::Subculture, 3),
            ("Focus topics: ", TagCategory::Topic, 5),
            ("Values: ", TagCategory::Value, 3),
            ("Preferences: ", TagCategory::Preference, usize::MAX),
            ("Goals: ", TagCategory::Goal, usize::MAX),
            ("Emotional tendencies: ", TagCategory::Emotion, 3),
        ];
        for (caption, category, cap) in sections {
            let tags = self.sorted_filtered(category);
            if tags.is_empty() {
                continue;
            }
            let names: Vec<&str> = tags.iter().take(cap).map(|t| t.name.as_str()).collect();
            out.push_str(caption);
            out.push_str(&names.join(", "));
            out.push('\n');
        }

        out.push_str("\nAdapt your tone and content to the profile above, ");
        out.push_str("but never mention that you are using it; weave it in naturally.");

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str, category: TagCategory, confidence: f32) -> Tag {
        Tag::new(name, category, confidence, format!("evidence for {}", name))
    }

    #[test]
    fn merge_takes_max_confidence_and_longer_evidence() {
        let mut a = tag("技术", TagCategory::Interest, 0.5);
        a.evidence = "short".to_string();
        let mut b = tag("技术", TagCategory::Interest, 0.8);
        b.evidence = "a much longer excerpt".to_string();

        let merged = a.merge(&b);
        assert_eq!(merged.confidence, 0.8);
        assert_eq!(merged.evidence, "a much longer excerpt");

        // commutative for confidence and evidence-length selection
        let merged_rev = b.merge(&a);
        assert_eq!(merged_rev.confidence, merged.confidence);
        assert_eq!(merged_rev.evidence.len(), merged.evidence.len());
    }

    #[test]
    fn adjust_confidence_clamps_to_unit_interval() {
        let t = tag("技术", TagCategory::Interest, 0.8);
        assert_eq!(t.adjust_confidence(0.5).confidence, 1.0);
        assert_eq!(t.adjust_confidence(-1.5).confidence, 0.0);
    }

    #[test]
    fn add_or_update_merges_by_name_and_category() {
        let mut profile = UserProfile::new();
        profile.add_or_update_tag(tag("技术", TagCategory::Interest, 0.5));
        profile.add_or_update_tag(tag("技术", TagCategory::Interest, 0.7));
        profile.add_or_update_tag(tag("技术", TagCategory::Topic, 0.4));

        assert_eq!(profile.tags.len(), 2);
        let interest = profile.tags_by_category(TagCategory::Interest);
        assert_eq!(interest.len(), 1);
        assert_eq!(interest[0].confidence, 0.7);
    }

    #[test]
    fn prune_drops_low_confidence_tags() {
        let mut profile = UserProfile::new();
        profile.add_or_update_tag(tag("a", TagCategory::Interest, 0.2));
        profile.add_or_update_tag(tag("b", TagCategory::Interest, 0.6));
        profile.prune_by_confidence(MIN_CONFIDENCE_THRESHOLD);
        assert_eq!(profile.tags.len(), 1);
        assert_eq!(profile.tags[0].name, "b");
    }

    #[test]
    fn emotion_trend_caps_at_thirty() {
        let mut profile = UserProfile::new();
        for i in 0..40 {
            profile.record_emotion(if i % 2 == 0 { "快乐" } else { "平静" });
        }
        assert_eq!(profile.emotion_trend.len(), 30);
    }

    #[test]
    fn interest_trend_caps_at_ten_and_classifies_direction() {
        let mut profile = UserProfile::new();
        for i in 0..12 {
            profile.record_interest_trend("技术", 0.3 + i as f32 * 0.05);
        }
        assert_eq!(profile.interest_trends["技术"].len(), 10);

        let trends = profile.analyze_interest_trends();
        assert_eq!(trends["技术"], Trend::Rising);

        for _ in 0..5 {
            profile.record_interest_trend("阅读", 0.5);
        }
        assert_eq!(profile.analyze_interest_trends()["阅读"], Trend::Stable);
    }

    #[test]
    fn dominant_emotion_uses_last_ten() {
        let mut profile = UserProfile::new();
        for _ in 0..20 {
            profile.record_emotion("忧郁");
        }
        for _ in 0..7 {
            profile.record_emotion("快乐");
        }
        let (label, share) = profile.dominant_emotion().unwrap();
        assert_eq!(label, "快乐");
        assert!(share >= 0.69);
    }

    #[test]
    fn system_prompt_is_stable_and_filtered() {
        let mut profile = UserProfile::new();
        profile.summary = "A curious developer.".to_string();
        profile.add_or_update_tag(tag("技术", TagCategory::Interest, 0.8));
        profile.add_or_update_tag(tag("体育", TagCategory::Interest, 0.5));
        profile.add_or_update_tag(tag("below", TagCategory::Interest, 0.2));
        profile.add_or_update_tag(tag("INTJ", TagCategory::Mbti, 0.6));
        profile.add_or_update_tag(tag("内向", TagCategory::MbtiEi, 0.5));

        let rendered = profile.to_system_prompt();
        assert!(rendered.starts_with("User profile:\n"));
        assert!(rendered.contains("A curious developer."));
        assert!(rendered.contains("MBTI type: INTJ"));
        assert!(rendered.contains("MBTI tendency: 内向/?/?/?"));
        assert!(rendered.contains("Interests: 技术(strong), 体育"));
        assert!(!rendered.contains("below"));

        // deterministic
        assert_eq!(rendered, profile.to_system_prompt());
    }

    #[test]
    fn mbti_dimensions_omitted_when_all_unknown() {
        let profile = UserProfile::new();
        assert!(!profile.to_system_prompt().contains("MBTI tendency"));
    }
}
