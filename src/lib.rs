//! Rapport — user profiling and persona memory engine for conversational AI.
//!
//! Two cooperating pipelines share a SQLite store and a completion capability:
//!
//! - [`ProfileEngine`] scores user turns against a keyword lexicon to build a
//!   confidence-tagged profile (interests, knowledge, personality, MBTI,
//!   emotion and topic trends) and renders it for the conversation context.
//! - [`PersonaMemorySystem`] extracts short persona facts about the AI
//!   character through the completion capability, enforces a hard per-chat
//!   memory cap with importance-ranked eviction, and consolidates memories as
//!   they accumulate.
//!
//! Tag scoring is synchronous and pure; the only suspension points are the
//! completion calls (extraction, consolidation, profile summaries).

pub mod api;
pub mod db;
pub mod engine;
pub mod error;
pub mod lexicon;
pub mod logging;
pub mod persona;
pub mod profile;
pub mod scorer;
pub mod tokenizer;

pub use api::{ChatMessage, CompletionApi, OpenAiCompatClient, Role};
pub use db::SqliteStore;
pub use engine::ProfileEngine;
pub use error::{CompletionError, EngineError};
pub use persona::{
    ConsolidationOutcome, MemoryItem, MemoryType, ParsedResponse, PersonaMemory,
    PersonaMemorySystem, MAX_MEMORIES_PER_CHAT, MAX_RETRIES,
};
pub use profile::{Tag, TagCategory, Trend, UserProfile, MIN_CONFIDENCE_THRESHOLD};
pub use scorer::{EmotionAnalyzer, FeedbackClassifier, FeedbackPolarity, TagScorer, TopicExtractor};
pub use tokenizer::Tokenizer;
