//! Persona memory pipeline
//!
//! Extracts short facts about the AI character from conversation turns via the
//! completion capability, keeps the per-chat store under a hard cap with
//! importance-ranked eviction, and periodically consolidates memories.
//!
//! Failure policy: completion and parse failures are recovered locally (zero
//! items extracted, or the local dedup fallback) and never abort the
//! surrounding dialogue flow; only store failures propagate.

use crate::api::{ChatMessage, CompletionApi, Role};
use crate::db::SqliteStore;
use crate::error::{CompletionError, Result};
use crate::logging;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Hard cap on stored memories per chat.
pub const MAX_MEMORIES_PER_CHAT: usize = 40;

/// Retries after the first attempt; a permanently busy upstream is tried
/// `MAX_RETRIES + 1` times in total.
pub const MAX_RETRIES: u32 = 2;

const RETRY_DELAY_MS: u64 = 1000;
const INTER_BATCH_DELAY_MS: u64 = 1000;

/// Consolidation is skipped below this many stored memories.
const CONSOLIDATION_MIN_MEMORIES: usize = 5;

/// Accumulated import items above this count get an aggregation pass before
/// persistence.
const IMPORT_CONSOLIDATION_THRESHOLD: usize = 20;

/// Items kept by the local (non-LLM) consolidation fallback.
const LOCAL_FALLBACK_KEEP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryType {
    CharacterTrait,
    ImportedTrait,
    Consolidated,
}

impl MemoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::CharacterTrait => "character_trait",
            MemoryType::ImportedTrait => "imported_trait",
            MemoryType::Consolidated => "consolidated",
        }
    }

    /// Unknown strings from the model or old rows fall back to
    /// `character_trait` rather than failing.
    pub fn parse(s: &str) -> Self {
        match s {
            "imported_trait" => MemoryType::ImportedTrait,
            "consolidated" | "consolidated_trait" => MemoryType::Consolidated,
            _ => MemoryType::CharacterTrait,
        }
    }
}

/// A stored persona memory.
#[derive(Debug, Clone)]
pub struct PersonaMemory {
    pub id: Uuid,
    pub chat_id: String,
    pub content: String,
    pub importance: i32,
    pub memory_type: MemoryType,
    pub timestamp: DateTime<Utc>,
}

impl PersonaMemory {
    pub fn new(chat_id: &str, content: &str, importance: i32, memory_type: MemoryType) -> Self {
        Self {
            id: Uuid::new_v4(),
            chat_id: chat_id.to_string(),
            content: content.to_string(),
            importance: importance.clamp(1, 10),
            memory_type,
            timestamp: Utc::now(),
        }
    }
}

/// Parsed-but-not-yet-persisted memory item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryItem {
    pub content: String,
    pub importance: i32,
    pub memory_type: MemoryType,
}

/// Outcome of parsing a completion response.
///
/// Callers must treat `Empty` and `Malformed` identically (no new memories);
/// `Malformed` keeps the raw text for logging only.
#[derive(Debug, Clone)]
pub enum ParsedResponse {
    Parsed(Vec<MemoryItem>),
    Empty,
    Malformed(String),
}

impl ParsedResponse {
    pub fn into_items(self) -> Vec<MemoryItem> {
        match self {
            ParsedResponse::Parsed(items) => items,
            ParsedResponse::Empty | ParsedResponse::Malformed(_) => Vec::new(),
        }
    }
}

/// Strip markdown fences the model sometimes wraps around JSON.
fn strip_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Largest brace-balanced `{...}` substring that parses as JSON, if any.
/// String literals are respected so braces inside content do not confuse the
/// scan.
fn recover_json_object(raw: &str) -> Option<String> {
    let mut best: Option<(usize, usize)> = None;
    let mut start: Option<usize> = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in raw.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        let s = start.unwrap();
                        let e = i + c.len_utf8();
                        if best.map_or(true, |(bs, be)| e - s > be - bs) {
                            best = Some((s, e));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    let (s, e) = best?;
    let candidate = &raw[s..e];
    serde_json::from_str::<serde_json::Value>(candidate)
        .ok()
        .map(|_| candidate.to_string())
}

fn parse_json_lenient(raw: &str) -> Option<serde_json::Value> {
    let cleaned = strip_fences(raw);
    if let Ok(value) = serde_json::from_str(cleaned) {
        return Some(value);
    }
    let recovered = recover_json_object(raw)?;
    serde_json::from_str(&recovered).ok()
}

/// Parse a `{"<array_key>": [{content, importance, type}]}` response.
/// Individual malformed entries are skipped; duplicates are removed by a
/// normalized content-prefix + type key.
pub fn parse_memory_items(raw: &str, array_key: &str, max_items: usize) -> ParsedResponse {
    let Some(value) = parse_json_lenient(raw) else {
        return ParsedResponse::Malformed(raw.to_string());
    };

    let Some(array) = value.get(array_key).and_then(|v| v.as_array()) else {
        return ParsedResponse::Empty;
    };

    let mut items = Vec::new();
    for entry in array.iter().take(max_items) {
        let Some(content) = entry.get("content").and_then(|v| v.as_str()) else {
            continue;
        };
        if content.trim().is_empty() {
            continue;
        }
        let importance = entry
            .get("importance")
            .and_then(|v| v.as_i64())
            .unwrap_or(5)
            .clamp(1, 10) as i32;
        let memory_type = entry
            .get("type")
            .and_then(|v| v.as_str())
            .map(MemoryType::parse)
            .unwrap_or(MemoryType::CharacterTrait);

        items.push(MemoryItem {
            content: content.trim().to_string(),
            importance,
            memory_type,
        });
    }

    let items = dedupe_items(items);
    if items.is_empty() {
        ParsedResponse::Empty
    } else {
        ParsedResponse::Parsed(items)
    }
}

fn dedup_key(content: &str, memory_type: MemoryType) -> String {
    let prefix: String = content.chars().take(50).collect();
    format!("{}_{}", prefix.to_lowercase(), memory_type.as_str())
}

fn dedupe_items(items: Vec<MemoryItem>) -> Vec<MemoryItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(dedup_key(&item.content, item.memory_type)))
        .collect()
}

/// One merge group from a consolidation response.
#[derive(Debug, Clone)]
pub struct MergeGroup {
    pub ids: Vec<Uuid>,
    pub new_content: String,
    pub importance: i32,
    pub memory_type: MemoryType,
}

#[derive(Debug, Clone, Default)]
pub struct ConsolidationPlan {
    pub merges: Vec<MergeGroup>,
    pub remove_ids: Vec<Uuid>,
}

/// Parse a `{"consolidatedMemories": [...], "removeIds": [...]}` response.
/// Returns `None` when the envelope itself is unusable.
pub fn parse_consolidation_plan(raw: &str) -> Option<ConsolidationPlan> {
    let value = parse_json_lenient(raw)?;
    let mut plan = ConsolidationPlan::default();

    if let Some(groups) = value.get("consolidatedMemories").and_then(|v| v.as_array()) {
        for group in groups {
            let Some(ids) = group.get("ids").and_then(|v| v.as_array()) else {
                continue;
            };
            let ids: Vec<Uuid> = ids
                .iter()
                .filter_map(|v| v.as_str())
                .filter_map(|s| Uuid::parse_str(s).ok())
                .collect();
            let Some(new_content) = group.get("newContent").and_then(|v| v.as_str()) else {
                continue;
            };
            if ids.is_empty() || new_content.trim().is_empty() {
                continue;
            }

            plan.merges.push(MergeGroup {
                ids,
                new_content: new_content.trim().to_string(),
                importance: group
                    .get("importance")
                    .and_then(|v| v.as_i64())
                    .unwrap_or(5)
                    .clamp(1, 10) as i32,
                memory_type: group
                    .get("type")
                    .and_then(|v| v.as_str())
                    .map(MemoryType::parse)
                    .unwrap_or(MemoryType::Consolidated),
            });
        }
    }

    if let Some(ids) = value.get("removeIds").and_then(|v| v.as_array()) {
        plan.remove_ids = ids
            .iter()
            .filter_map(|v| v.as_str())
            .filter_map(|s| Uuid::parse_str(s).ok())
            .collect();
    }

    Some(plan)
}

/// Result of a consolidation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsolidationOutcome {
    /// Too few memories to bother.
    Skipped,
    /// Model-directed merge applied.
    Consolidated { merged: usize, removed: usize },
    /// Completion or parse failed; conservative local dedup applied instead.
    LocalFallback { kept: usize },
}

pub struct PersonaMemorySystem {
    store: Arc<SqliteStore>,
    client: Arc<dyn CompletionApi>,
    model: String,
    chat_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl PersonaMemorySystem {
    pub fn new(store: Arc<SqliteStore>, client: Arc<dyn CompletionApi>, model: &str) -> Self {
        Self {
            store,
            client,
            model: model.to_string(),
            chat_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Per-chat maintenance lock: read-then-delete on the memory set must not
    /// interleave for the same chat.
    fn lock_for(&self, chat_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.chat_locks.lock().unwrap();
        Arc::clone(locks.entry(chat_id.to_string()).or_default())
    }

    /// Insert one memory and re-enforce the cap.
    pub async fn insert_memory(&self, memory: PersonaMemory) -> Result<()> {
        let chat_id = memory.chat_id.clone();
        let lock = self.lock_for(&chat_id);
        let _guard = lock.lock().await;

        self.store.insert_memory(&memory)?;
        logging::log_memory(
            Some(&chat_id),
            &format!("inserted memory: {}", truncate_chars(&memory.content, 50)),
        );
        self.maintain_limit_locked(&chat_id)?;
        Ok(())
    }

    /// Enforce `MAX_MEMORIES_PER_CHAT`. This is the invariant-enforcing choke
    /// point, called after every insert and after consolidation.
    pub async fn maintain_limit(&self, chat_id: &str) -> Result<usize> {
        let lock = self.lock_for(chat_id);
        let _guard = lock.lock().await;
        self.maintain_limit_locked(chat_id)
    }

    fn maintain_limit_locked(&self, chat_id: &str) -> Result<usize> {
        let memories = self.store.list_memories(chat_id)?;
        if memories.len() <= MAX_MEMORIES_PER_CHAT {
            return Ok(0);
        }

        let excess = &memories[MAX_MEMORIES_PER_CHAT..];
        for memory in excess {
            self.store.delete_memory(&memory.id)?;
        }

        logging::log_memory(
            Some(chat_id),
            &format!(
                "evicted {} memories to hold the {} cap",
                excess.len(),
                MAX_MEMORIES_PER_CHAT
            ),
        );
        Ok(excess.len())
    }

    /// Bounded-retry completion call. Only transient ("service busy")
    /// failures retry; everything else aborts immediately.
    async fn complete_with_retry(
        &self,
        chat_id: &str,
        messages: &[ChatMessage],
    ) -> std::result::Result<String, CompletionError> {
        let mut attempt: u32 = 0;
        loop {
            match self.client.complete(&self.model, messages, 0.3).await {
                Ok(text) => return Ok(text),
                Err(err) if err.transient && attempt < MAX_RETRIES => {
                    attempt += 1;
                    let delay = RETRY_DELAY_MS * (1 << (attempt - 1));
                    logging::log_api(
                        Some(chat_id),
                        &format!("service busy, retrying in {}ms ({}/{})", delay, attempt, MAX_RETRIES),
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Analyze recent conversation turns and store extracted persona
    /// memories. Recovered failures return `Ok(0)`.
    pub async fn extract_from_conversation(
        &self,
        messages: &[ChatMessage],
        chat_id: &str,
    ) -> Result<usize> {
        if messages.len() < 4 {
            return Ok(0);
        }

        let transcript = messages
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            r#"Analyze the following conversation and extract important information about the AI character (at most 3-5 distinct findings):

{transcript}

Extract:
1. Personal details, preferences or backstory the character revealed
2. The relationship the character built with the user
3. Emotions or attitudes the character displayed

Only extract information about the character itself; ignore general knowledge.
Respond with ONLY valid JSON: {{"memories":[{{"content":"...", "importance":1-10, "type":"character_trait"}}]}}
Keep the output concise and avoid duplicates. Return an empty array if nothing qualifies."#
        );

        let request = [
            ChatMessage::system(
                "You are an analyst that extracts character traits from conversations. Answer concisely.",
            ),
            ChatMessage::user(prompt),
        ];

        let response = match self.complete_with_retry(chat_id, &request).await {
            Ok(text) => text,
            Err(err) => {
                logging::log_error(Some(chat_id), &format!("memory extraction failed: {}", err));
                return Ok(0);
            }
        };

        let items = match parse_memory_items(&response, "memories", 10) {
            ParsedResponse::Parsed(items) => items,
            ParsedResponse::Empty => {
                logging::log_memory(Some(chat_id), "no memories extracted from response");
                return Ok(0);
            }
            ParsedResponse::Malformed(raw) => {
                logging::log_error(
                    Some(chat_id),
                    &format!("unparseable extraction response: {}", truncate_chars(&raw, 200)),
                );
                return Ok(0);
            }
        };

        let count = items.len();
        for item in items {
            self.insert_memory(PersonaMemory::new(
                chat_id,
                &item.content,
                item.importance,
                item.memory_type,
            ))
            .await?;
        }

        logging::log_memory(Some(chat_id), &format!("extracted and saved {} memories", count));
        Ok(count)
    }

    /// Analyze an imported transcript for persona traits. Batches are
    /// processed serially with a fixed delay to respect upstream rate limits;
    /// a failed batch does not halt the rest.
    pub async fn import_transcript(&self, messages: &[ChatMessage], chat_id: &str) -> Result<usize> {
        let ai_messages: Vec<&ChatMessage> =
            messages.iter().filter(|m| m.role == Role::Assistant).collect();
        if ai_messages.is_empty() {
            logging::log_memory(Some(chat_id), "no assistant messages in import, skipping");
            return Ok(0);
        }

        let total = ai_messages.len();
        let batch_size = match total {
            n if n > 100 => 30,
            n if n > 50 => 20,
            _ => 15,
        };
        let batch_count = total.div_ceil(batch_size);
        logging::log_memory(
            Some(chat_id),
            &format!("importing {} assistant messages in {} batches of {}", total, batch_count, batch_size),
        );

        let mut all_items: Vec<MemoryItem> = Vec::new();
        for batch_index in 0..batch_count {
            let start = batch_index * batch_size;
            let end = (start + batch_size).min(total);
            let batch = &ai_messages[start..end];

            let items = self
                .analyze_import_batch(batch, batch_index, batch_count, chat_id)
                .await;
            if items.is_empty() {
                logging::log_memory(
                    Some(chat_id),
                    &format!("batch {}/{} yielded no traits", batch_index + 1, batch_count),
                );
            } else {
                all_items.extend(items);
            }

            if batch_index + 1 < batch_count {
                tokio::time::sleep(Duration::from_millis(INTER_BATCH_DELAY_MS)).await;
            }
        }

        if all_items.len() > IMPORT_CONSOLIDATION_THRESHOLD {
            logging::log_memory(
                Some(chat_id),
                &format!("{} raw traits, running aggregation", all_items.len()),
            );
            all_items = self.consolidate_items(all_items, chat_id).await;
        }

        if all_items.is_empty() {
            return Ok(0);
        }

        all_items.sort_by(|a, b| b.importance.cmp(&a.importance));
        all_items.truncate(MAX_MEMORIES_PER_CHAT);

        let lock = self.lock_for(chat_id);
        let _guard = lock.lock().await;
        let mut inserted = 0usize;
        for item in &all_items {
            let memory_type = match item.memory_type {
                MemoryType::Consolidated => MemoryType::Consolidated,
                _ => MemoryType::ImportedTrait,
            };
            self.store.insert_memory(&PersonaMemory::new(
                chat_id,
                &item.content,
                item.importance,
                memory_type,
            ))?;
            inserted += 1;
        }
        self.maintain_limit_locked(chat_id)?;

        logging::log_memory(Some(chat_id), &format!("import saved {} persona traits", inserted));
        Ok(inserted)
    }

    async fn analyze_import_batch(
        &self,
        batch: &[&ChatMessage],
        batch_index: usize,
        batch_count: usize,
        chat_id: &str,
    ) -> Vec<MemoryItem> {
        let replies = batch
            .iter()
            .map(|m| format!("AI: {}", m.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            r#"Analyze the following AI replies and extract the character traits, speaking style and personality they reveal:

{replies}

Extract:
1. Identity and backstory details
2. Personality traits and values
3. Expression style and verbal habits
4. Domains of expertise
5. How the character expresses emotion

This is batch {} of {}; extract only traits specific to this batch.
Respond with ONLY valid JSON: {{"persona_traits":[{{"content":"...", "importance":1-10, "type":"character_trait"}}]}}
Make each trait concrete, extract 5-10 of them, and return an empty array if there are none."#,
            batch_index + 1,
            batch_count
        );

        let request = [
            ChatMessage::system(
                "You are an analyst that captures character traits from dialogue. Return only the requested JSON, no commentary.",
            ),
            ChatMessage::user(prompt),
        ];

        match self.complete_with_retry(chat_id, &request).await {
            Ok(response) => parse_memory_items(&response, "persona_traits", 15).into_items(),
            Err(err) => {
                logging::log_error(
                    Some(chat_id),
                    &format!("batch {}/{} analysis failed: {}", batch_index + 1, batch_count, err),
                );
                Vec::new()
            }
        }
    }

    /// Reduce an oversized in-memory trait list, preferring the model's
    /// aggregation and falling back to local dedup + top-20.
    async fn consolidate_items(&self, items: Vec<MemoryItem>, chat_id: &str) -> Vec<MemoryItem> {
        if items.len() <= IMPORT_CONSOLIDATION_THRESHOLD {
            return items;
        }

        let listing = items
            .iter()
            .map(|item| format!("- {} (importance: {})", item.content, item.importance))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            r#"Merge similar entries in this character trait list, drop duplicates, and keep the most distinctive traits:

{listing}

Respond with ONLY valid JSON holding the 15-20 most important merged traits:
{{"consolidated_traits":[{{"content":"merged trait description", "importance":1-10}}]}}"#
        );

        let request = [
            ChatMessage::system(
                "You are an analyst that merges and deduplicates overlapping concepts. Return only the requested JSON.",
            ),
            ChatMessage::user(prompt),
        ];

        if let Ok(response) = self.complete_with_retry(chat_id, &request).await {
            let consolidated: Vec<MemoryItem> =
                parse_memory_items(&response, "consolidated_traits", 20)
                    .into_items()
                    .into_iter()
                    .map(|item| MemoryItem {
                        memory_type: MemoryType::Consolidated,
                        ..item
                    })
                    .collect();
            if !consolidated.is_empty() {
                logging::log_memory(
                    Some(chat_id),
                    &format!("aggregation reduced {} traits to {}", items.len(), consolidated.len()),
                );
                return consolidated;
            }
        }

        logging::log_memory(Some(chat_id), "aggregation failed, applying local dedup");
        let mut deduped = dedupe_items(items);
        deduped.sort_by(|a, b| b.importance.cmp(&a.importance));
        deduped.truncate(LOCAL_FALLBACK_KEEP);
        deduped
    }

    /// Merge and deduplicate stored memories for a chat. Never fails outward
    /// on completion/parse problems; falls back to a conservative local dedup
    /// instead.
    pub async fn consolidate(&self, chat_id: &str) -> Result<ConsolidationOutcome> {
        let memories = self.store.list_memories(chat_id)?;
        if memories.len() <= CONSOLIDATION_MIN_MEMORIES {
            return Ok(ConsolidationOutcome::Skipped);
        }

        let listing = memories
            .iter()
            .map(|m| format!("{}: {}", m.id, m.content))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            r#"Review these character memories and find duplicates, contradictions and entries that belong together:

{listing}

Merge related memories, resolve contradictions and drop redundant ones.
Respond with ONLY valid JSON:
{{"consolidatedMemories":[{{"ids":["id1","id2"], "newContent":"...", "importance":1-10, "type":"character_trait"}}], "removeIds":["id3"]}}"#
        );

        let request = [
            ChatMessage::system(
                "You are an assistant that organizes and optimizes character memory. Answer concisely.",
            ),
            ChatMessage::user(prompt),
        ];

        let plan = match self.complete_with_retry(chat_id, &request).await {
            Ok(response) => parse_consolidation_plan(&response),
            Err(err) => {
                logging::log_error(Some(chat_id), &format!("consolidation call failed: {}", err));
                None
            }
        };

        match plan {
            Some(plan) => self.apply_consolidation_plan(chat_id, plan).await,
            None => self.local_fallback(chat_id).await,
        }
    }

    async fn apply_consolidation_plan(
        &self,
        chat_id: &str,
        plan: ConsolidationPlan,
    ) -> Result<ConsolidationOutcome> {
        let lock = self.lock_for(chat_id);
        let _guard = lock.lock().await;

        let mut merged = 0usize;
        for group in &plan.merges {
            for id in &group.ids {
                self.store.delete_memory(id)?;
            }
            self.store.insert_memory(&PersonaMemory::new(
                chat_id,
                &group.new_content,
                group.importance,
                group.memory_type,
            ))?;
            merged += 1;
        }

        let mut removed = 0usize;
        for id in &plan.remove_ids {
            self.store.delete_memory(id)?;
            removed += 1;
        }

        self.maintain_limit_locked(chat_id)?;
        logging::log_memory(
            Some(chat_id),
            &format!("consolidation merged {} groups, removed {} memories", merged, removed),
        );
        Ok(ConsolidationOutcome::Consolidated { merged, removed })
    }

    /// Conservative fallback when the model cannot help: drop near-duplicates
    /// (same normalized content prefix and type) and keep the top entries by
    /// importance.
    async fn local_fallback(&self, chat_id: &str) -> Result<ConsolidationOutcome> {
        let lock = self.lock_for(chat_id);
        let _guard = lock.lock().await;

        let memories = self.store.list_memories(chat_id)?;
        let mut seen = HashSet::new();
        let mut kept = 0usize;

        // list_memories ranks by importance, so the first of each duplicate
        // group is the one worth keeping.
        for memory in &memories {
            let key = dedup_key(&memory.content, memory.memory_type);
            if kept < LOCAL_FALLBACK_KEEP && seen.insert(key) {
                kept += 1;
            } else {
                self.store.delete_memory(&memory.id)?;
            }
        }

        logging::log_memory(
            Some(chat_id),
            &format!("local consolidation fallback kept {} memories", kept),
        );
        Ok(ConsolidationOutcome::LocalFallback { kept })
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_extraction_json() {
        let raw = r#"{"memories":[
            {"content":"Speaks in a gentle tone","importance":7,"type":"character_trait"},
            {"content":"Grew up by the sea","importance":9}
        ]}"#;
        let items = parse_memory_items(raw, "memories", 10).into_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].importance, 7);
        assert_eq!(items[1].importance, 9);
        assert_eq!(items[1].memory_type, MemoryType::CharacterTrait);
    }

    #[test]
    fn recovers_json_embedded_in_prose() {
        let raw = r#"Sure! Here is the analysis you asked for:
        {"memories":[{"content":"Loves rainy days","importance":4}]}
        Let me know if you need anything else."#;
        let items = parse_memory_items(raw, "memories", 10).into_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, "Loves rainy days");
    }

    #[test]
    fn recovery_respects_braces_inside_strings() {
        let raw = r#"noise {"memories":[{"content":"Says {hello} a lot","importance":5}]} noise"#;
        let items = parse_memory_items(raw, "memories", 10).into_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, "Says {hello} a lot");
    }

    #[test]
    fn garbage_degrades_to_no_items() {
        for raw in ["complete garbage", "{not json at all", ""] {
            let parsed = parse_memory_items(raw, "memories", 10);
            assert!(parsed.into_items().is_empty());
        }
    }

    #[test]
    fn missing_or_empty_array_is_empty_not_malformed() {
        assert!(matches!(
            parse_memory_items(r#"{"memories":[]}"#, "memories", 10),
            ParsedResponse::Empty
        ));
        assert!(matches!(
            parse_memory_items(r#"{"other":[]}"#, "memories", 10),
            ParsedResponse::Empty
        ));
        assert!(matches!(
            parse_memory_items("not json", "memories", 10),
            ParsedResponse::Malformed(_)
        ));
    }

    #[test]
    fn importance_defaults_and_clamps() {
        let raw = r#"{"memories":[
            {"content":"a"},
            {"content":"b","importance":99},
            {"content":"c","importance":-3}
        ]}"#;
        let items = parse_memory_items(raw, "memories", 10).into_items();
        assert_eq!(items[0].importance, 5);
        assert_eq!(items[1].importance, 10);
        assert_eq!(items[2].importance, 1);
    }

    #[test]
    fn items_dedupe_by_content_prefix_and_type() {
        let raw = r#"{"memories":[
            {"content":"Enjoys tea ceremonies","importance":5},
            {"content":"ENJOYS TEA CEREMONIES","importance":7},
            {"content":"Enjoys tea ceremonies","importance":5,"type":"imported_trait"}
        ]}"#;
        let items = parse_memory_items(raw, "memories", 10).into_items();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn item_cap_is_enforced() {
        let entries: Vec<String> = (0..30)
            .map(|i| format!(r#"{{"content":"trait {}","importance":5}}"#, i))
            .collect();
        let raw = format!(r#"{{"memories":[{}]}}"#, entries.join(","));
        let items = parse_memory_items(&raw, "memories", 10).into_items();
        assert_eq!(items.len(), 10);
    }

    #[test]
    fn consolidation_plan_parses_and_skips_bad_groups() {
        let id_a = Uuid::new_v4();
        let id_b = Uuid::new_v4();
        let id_c = Uuid::new_v4();
        let raw = format!(
            r#"{{"consolidatedMemories":[
                {{"ids":["{id_a}","{id_b}"], "newContent":"merged", "importance":8}},
                {{"ids":[], "newContent":"dropped"}},
                {{"newContent":"no ids"}}
            ], "removeIds":["{id_c}", "not-a-uuid"]}}"#
        );

        let plan = parse_consolidation_plan(&raw).unwrap();
        assert_eq!(plan.merges.len(), 1);
        assert_eq!(plan.merges[0].ids, vec![id_a, id_b]);
        assert_eq!(plan.merges[0].importance, 8);
        assert_eq!(plan.merges[0].memory_type, MemoryType::Consolidated);
        assert_eq!(plan.remove_ids, vec![id_c]);
    }

    #[test]
    fn consolidation_plan_rejects_garbage() {
        assert!(parse_consolidation_plan("garbage").is_none());
    }

    #[test]
    fn unknown_memory_type_falls_back_to_character_trait() {
        assert_eq!(MemoryType::parse("something_new"), MemoryType::CharacterTrait);
        assert_eq!(MemoryType::parse("imported_trait"), MemoryType::ImportedTrait);
        assert_eq!(MemoryType::parse("consolidated_trait"), MemoryType::Consolidated);
    }
}
