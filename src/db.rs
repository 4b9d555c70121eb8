//! SQLite persistence for profiles, tags and persona memories.
//!
//! `SqliteStore` is an injectable instance (no process-wide connection
//! singleton) so tests can run against isolated in-memory databases. All
//! operations are chat-scoped; deleting a chat cascades across profile, tags
//! and memories.

use crate::logging;
use crate::persona::{MemoryType, PersonaMemory};
use crate::profile::{Tag, TagCategory, UserProfile};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::Path;
use std::sync::Mutex;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // ============ Profiles ============

    pub fn save_profile(&self, chat_id: &str, profile: &UserProfile) -> Result<()> {
        let interest_trends =
            serde_json::to_string(&profile.interest_trends).unwrap_or_else(|_| "{}".to_string());
        let emotion_trend =
            serde_json::to_string(&profile.emotion_trend).unwrap_or_else(|_| "[]".to_string());

        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE user_profiles
             SET summary = ?1, version = ?2, interest_trends = ?3, emotion_trend = ?4, updated_at = ?5
             WHERE chat_id = ?6",
            params![
                profile.summary,
                profile.version,
                interest_trends,
                emotion_trend,
                encode_time(&profile.updated_at),
                chat_id
            ],
        )?;

        if updated == 0 {
            conn.execute(
                "INSERT INTO user_profiles
                 (chat_id, summary, version, interest_trends, emotion_trend, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    chat_id,
                    profile.summary,
                    profile.version,
                    interest_trends,
                    emotion_trend,
                    encode_time(&profile.created_at),
                    encode_time(&profile.updated_at)
                ],
            )?;
        }

        logging::log_store(
            Some(chat_id),
            &format!("saved profile v{} ({} tags held separately)", profile.version, profile.tags.len()),
        );
        Ok(())
    }

    /// Load a profile and its tags; `None` when no profile exists yet.
    pub fn load_profile(&self, chat_id: &str) -> Result<Option<UserProfile>> {
        let row = {
            let conn = self.conn.lock().unwrap();
            conn.query_row(
                "SELECT summary, version, interest_trends, emotion_trend, created_at, updated_at
                 FROM user_profiles WHERE chat_id = ?1",
                params![chat_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?
        };

        let Some((summary, version, interest_trends, emotion_trend, created_at, updated_at)) = row
        else {
            return Ok(None);
        };

        let mut profile = UserProfile {
            summary,
            version,
            interest_trends: serde_json::from_str(&interest_trends).unwrap_or_default(),
            emotion_trend: serde_json::from_str(&emotion_trend).unwrap_or_default(),
            created_at: decode_time(&created_at),
            updated_at: decode_time(&updated_at),
            ..UserProfile::default()
        };
        profile.tags = self.load_tags(chat_id)?;

        Ok(Some(profile))
    }

    // ============ Tags ============

    pub fn load_tags(&self, chat_id: &str) -> Result<Vec<Tag>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT tag_name, category, confidence, evidence, created_at, updated_at
             FROM user_tags WHERE chat_id = ?1 ORDER BY confidence DESC",
        )?;

        let tags = stmt
            .query_map(params![chat_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .filter_map(|row| row.ok())
            .filter_map(|(name, category, confidence, evidence, created_at, updated_at)| {
                // Unknown categories in old rows are skipped, not fatal.
                let category = TagCategory::parse(&category)?;
                Some(Tag {
                    name,
                    category,
                    confidence: (confidence as f32).clamp(0.0, 1.0),
                    evidence,
                    created_at: decode_time(&created_at),
                    updated_at: decode_time(&updated_at),
                })
            })
            .collect();

        Ok(tags)
    }

    /// Replace the stored tag set for a chat with the given one.
    pub fn replace_tags(&self, chat_id: &str, tags: &[Tag]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM user_tags WHERE chat_id = ?1", params![chat_id])?;
        for tag in tags {
            tx.execute(
                "INSERT INTO user_tags
                 (chat_id, tag_name, category, confidence, evidence, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    chat_id,
                    tag.name,
                    tag.category.as_str(),
                    tag.confidence as f64,
                    tag.evidence,
                    encode_time(&tag.created_at),
                    encode_time(&tag.updated_at)
                ],
            )?;
        }

        tx.commit()
    }

    // ============ Persona memories ============

    pub fn insert_memory(&self, memory: &PersonaMemory) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO persona_memories
             (id, chat_id, content, importance, memory_type, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                memory.id.to_string(),
                memory.chat_id,
                memory.content,
                memory.importance,
                memory.memory_type.as_str(),
                encode_time(&memory.timestamp)
            ],
        )?;
        Ok(())
    }

    /// All memories for a chat, ranked by importance then recency.
    pub fn list_memories(&self, chat_id: &str) -> Result<Vec<PersonaMemory>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, chat_id, content, importance, memory_type, timestamp
             FROM persona_memories WHERE chat_id = ?1
             ORDER BY importance DESC, timestamp DESC",
        )?;

        let memories = stmt
            .query_map(params![chat_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i32>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .filter_map(|row| row.ok())
            .filter_map(|(id, chat_id, content, importance, memory_type, timestamp)| {
                Some(PersonaMemory {
                    id: uuid::Uuid::parse_str(&id).ok()?,
                    chat_id,
                    content,
                    importance: importance.clamp(1, 10),
                    memory_type: MemoryType::parse(&memory_type),
                    timestamp: decode_time(&timestamp),
                })
            })
            .collect();

        Ok(memories)
    }

    pub fn memory_count(&self, chat_id: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM persona_memories WHERE chat_id = ?1",
            params![chat_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn delete_memory(&self, id: &uuid::Uuid) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM persona_memories WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    pub fn delete_all_memories(&self, chat_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM persona_memories WHERE chat_id = ?1",
            params![chat_id],
        )?;
        Ok(())
    }

    // ============ Chat lifecycle ============

    /// Cascade removal of everything belonging to a chat.
    pub fn delete_chat_data(&self, chat_id: &str) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM user_profiles WHERE chat_id = ?1", params![chat_id])?;
        tx.execute("DELETE FROM user_tags WHERE chat_id = ?1", params![chat_id])?;
        tx.execute("DELETE FROM persona_memories WHERE chat_id = ?1", params![chat_id])?;
        tx.commit()?;

        logging::log_store(Some(chat_id), "deleted chat profile, tags and memories");
        Ok(())
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- One profile per chat; tags live in their own table
        CREATE TABLE IF NOT EXISTS user_profiles (
            chat_id TEXT PRIMARY KEY,
            summary TEXT NOT NULL DEFAULT '',
            version INTEGER NOT NULL DEFAULT 1,
            interest_trends TEXT NOT NULL DEFAULT '{}',
            emotion_trend TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        -- Confidence-scored tags keyed by (chat, name, category)
        CREATE TABLE IF NOT EXISTS user_tags (
            chat_id TEXT NOT NULL,
            tag_name TEXT NOT NULL,
            category TEXT NOT NULL,
            confidence REAL NOT NULL,
            evidence TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(chat_id, tag_name, category)
        );

        -- Persona memories, capped per chat by the limiter
        CREATE TABLE IF NOT EXISTS persona_memories (
            id TEXT PRIMARY KEY,
            chat_id TEXT NOT NULL,
            content TEXT NOT NULL,
            importance INTEGER NOT NULL DEFAULT 5,
            memory_type TEXT NOT NULL DEFAULT 'character_trait',
            timestamp TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_user_tags_chat ON user_tags(chat_id);
        CREATE INDEX IF NOT EXISTS idx_persona_memories_chat ON persona_memories(chat_id);
        ",
    )
}

/// Timestamps are stored as fixed-precision RFC 3339 so lexicographic ordering
/// in SQL matches chronological ordering.
fn encode_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_round_trip_preserves_tags_and_trends() {
        let store = SqliteStore::open_in_memory().unwrap();

        let mut profile = UserProfile::new();
        profile.summary = "likes rust".to_string();
        profile.version = 4;
        profile.add_or_update_tag(Tag::new("技术", TagCategory::Interest, 0.8, "我喜欢编程"));
        profile.record_interest_trend("技术", 0.8);
        profile.record_emotion("快乐");

        store.save_profile("chat-1", &profile).unwrap();
        store.replace_tags("chat-1", &profile.tags).unwrap();

        let loaded = store.load_profile("chat-1").unwrap().unwrap();
        assert_eq!(loaded.summary, "likes rust");
        assert_eq!(loaded.version, 4);
        assert_eq!(loaded.tags.len(), 1);
        assert_eq!(loaded.tags[0].name, "技术");
        assert_eq!(loaded.interest_trends["技术"].len(), 1);
        assert_eq!(loaded.emotion_trend.len(), 1);

        assert!(store.load_profile("missing").unwrap().is_none());
    }

    #[test]
    fn store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rapport.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            let mut profile = UserProfile::new();
            profile.summary = "persistent".to_string();
            store.save_profile("chat-1", &profile).unwrap();
            store
                .insert_memory(&PersonaMemory::new("chat-1", "m", 7, MemoryType::CharacterTrait))
                .unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(
            reopened.load_profile("chat-1").unwrap().unwrap().summary,
            "persistent"
        );
        assert_eq!(reopened.memory_count("chat-1").unwrap(), 1);
    }

    #[test]
    fn save_profile_updates_in_place() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut profile = UserProfile::new();
        store.save_profile("chat-1", &profile).unwrap();

        profile.summary = "updated".to_string();
        profile.version = 2;
        store.save_profile("chat-1", &profile).unwrap();

        let loaded = store.load_profile("chat-1").unwrap().unwrap();
        assert_eq!(loaded.summary, "updated");
        assert_eq!(loaded.version, 2);
    }

    #[test]
    fn memories_list_ranked_by_importance_then_recency() {
        let store = SqliteStore::open_in_memory().unwrap();

        for (content, importance) in [("low", 2), ("high", 9), ("mid", 5)] {
            store
                .insert_memory(&PersonaMemory::new("chat-1", content, importance, MemoryType::CharacterTrait))
                .unwrap();
        }

        let memories = store.list_memories("chat-1").unwrap();
        let contents: Vec<&str> = memories.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["high", "mid", "low"]);
    }

    #[test]
    fn delete_chat_data_cascades() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.save_profile("chat-1", &UserProfile::new()).unwrap();
        store
            .replace_tags("chat-1", &[Tag::new("技术", TagCategory::Interest, 0.5, "")])
            .unwrap();
        store
            .insert_memory(&PersonaMemory::new("chat-1", "m", 5, MemoryType::CharacterTrait))
            .unwrap();

        store
            .insert_memory(&PersonaMemory::new("chat-2", "other", 5, MemoryType::CharacterTrait))
            .unwrap();

        store.delete_chat_data("chat-1").unwrap();

        assert!(store.load_profile("chat-1").unwrap().is_none());
        assert!(store.load_tags("chat-1").unwrap().is_empty());
        assert_eq!(store.memory_count("chat-1").unwrap(), 0);
        assert_eq!(store.memory_count("chat-2").unwrap(), 1);

        store.delete_all_memories("chat-2").unwrap();
        assert_eq!(store.memory_count("chat-2").unwrap(), 0);
    }
}
