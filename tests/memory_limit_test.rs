mod helpers;

use chrono::{Duration, Utc};
use helpers::{test_store, PermanentFailureClient};
use rapport::{MemoryType, PersonaMemory, PersonaMemorySystem, MAX_MEMORIES_PER_CHAT};
use std::sync::Arc;

fn system_with_store() -> (PersonaMemorySystem, Arc<rapport::SqliteStore>) {
    let store = test_store();
    let system = PersonaMemorySystem::new(
        Arc::clone(&store),
        Arc::new(PermanentFailureClient::default()),
        "test-model",
    );
    (system, store)
}

#[tokio::test]
async fn cap_holds_across_single_inserts() {
    let (system, store) = system_with_store();
    let base = Utc::now();

    for i in 0..45i64 {
        let mut memory = PersonaMemory::new(
            "chat-1",
            &format!("memory-{}", i),
            ((i % 9) + 1) as i32,
            MemoryType::CharacterTrait,
        );
        memory.timestamp = base + Duration::seconds(i);
        system.insert_memory(memory).await.unwrap();
    }

    let remaining = store.list_memories("chat-1").unwrap();
    assert_eq!(remaining.len(), MAX_MEMORIES_PER_CHAT);

    // The survivors must be exactly the top 40 by (importance desc, recency desc).
    let mut expected: Vec<(i32, i64)> = (0..45i64).map(|i| (((i % 9) + 1) as i32, i)).collect();
    expected.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
    expected.truncate(MAX_MEMORIES_PER_CHAT);
    let expected_contents: std::collections::HashSet<String> =
        expected.iter().map(|(_, i)| format!("memory-{}", i)).collect();

    for memory in &remaining {
        assert!(
            expected_contents.contains(&memory.content),
            "{} should have been evicted",
            memory.content
        );
    }
}

#[tokio::test]
async fn eviction_drops_lowest_importance_first() {
    let (system, store) = system_with_store();

    for i in 0..MAX_MEMORIES_PER_CHAT {
        system
            .insert_memory(PersonaMemory::new(
                "chat-1",
                &format!("keep-{}", i),
                8,
                MemoryType::CharacterTrait,
            ))
            .await
            .unwrap();
    }

    system
        .insert_memory(PersonaMemory::new(
            "chat-1",
            "weak newcomer",
            1,
            MemoryType::CharacterTrait,
        ))
        .await
        .unwrap();

    let remaining = store.list_memories("chat-1").unwrap();
    assert_eq!(remaining.len(), MAX_MEMORIES_PER_CHAT);
    assert!(!remaining.iter().any(|m| m.content == "weak newcomer"));
}

#[tokio::test]
async fn caps_are_per_chat() {
    let (system, store) = system_with_store();

    for chat in ["chat-a", "chat-b"] {
        for i in 0..30 {
            system
                .insert_memory(PersonaMemory::new(
                    chat,
                    &format!("{}-{}", chat, i),
                    5,
                    MemoryType::CharacterTrait,
                ))
                .await
                .unwrap();
        }
    }

    assert_eq!(store.list_memories("chat-a").unwrap().len(), 30);
    assert_eq!(store.list_memories("chat-b").unwrap().len(), 30);
}

#[tokio::test]
async fn concurrent_inserts_never_leave_cap_violated() {
    let (system, store) = system_with_store();
    let system = Arc::new(system);

    let mut handles = Vec::new();
    for worker in 0..5 {
        let system = Arc::clone(&system);
        handles.push(tokio::spawn(async move {
            for i in 0..12 {
                system
                    .insert_memory(PersonaMemory::new(
                        "chat-1",
                        &format!("w{}-{}", worker, i),
                        (i % 10) + 1,
                        MemoryType::CharacterTrait,
                    ))
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(
        store.list_memories("chat-1").unwrap().len(),
        MAX_MEMORIES_PER_CHAT
    );
}
