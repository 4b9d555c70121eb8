mod helpers;

use helpers::{test_store, BusyClient, ScriptedClient};
use rapport::{ConsolidationOutcome, MemoryType, PersonaMemory, PersonaMemorySystem};
use std::sync::Arc;

async fn seed_memories(system: &PersonaMemorySystem, chat_id: &str, contents: &[&str]) {
    for (i, content) in contents.iter().enumerate() {
        system
            .insert_memory(PersonaMemory::new(
                chat_id,
                content,
                ((i % 5) + 3) as i32,
                MemoryType::CharacterTrait,
            ))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn consolidation_skipped_for_small_memory_sets() {
    let store = test_store();
    let client = Arc::new(BusyClient::default());
    let system = PersonaMemorySystem::new(Arc::clone(&store), client.clone(), "test-model");

    seed_memories(&system, "chat-1", &["a", "b", "c", "d", "e"]).await;

    let outcome = system.consolidate("chat-1").await.unwrap();
    assert_eq!(outcome, ConsolidationOutcome::Skipped);
    assert_eq!(client.call_count(), 0);
    assert_eq!(store.list_memories("chat-1").unwrap().len(), 5);
}

#[tokio::test]
async fn model_directed_merge_is_applied() {
    let store = test_store();

    // Seed first so we know the real ids to reference in the scripted plan.
    let seed_system = PersonaMemorySystem::new(
        Arc::clone(&store),
        Arc::new(BusyClient::default()),
        "test-model",
    );
    seed_memories(
        &seed_system,
        "chat-1",
        &[
            "likes tea",
            "enjoys drinking tea",
            "fond of tea ceremonies",
            "plays the violin",
            "grew up in the mountains",
            "afraid of the dark",
        ],
    )
    .await;

    let memories = store.list_memories("chat-1").unwrap();
    let tea_ids: Vec<String> = memories
        .iter()
        .filter(|m| m.content.contains("tea"))
        .map(|m| m.id.to_string())
        .collect();
    let remove_id = memories
        .iter()
        .find(|m| m.content == "afraid of the dark")
        .unwrap()
        .id
        .to_string();

    let plan = format!(
        r#"{{"consolidatedMemories":[{{"ids":{}, "newContent":"Deeply fond of tea", "importance":9}}], "removeIds":["{}"]}}"#,
        serde_json::to_string(&tea_ids).unwrap(),
        remove_id
    );

    let client = Arc::new(ScriptedClient::new(vec![Ok(plan)]));
    let system = PersonaMemorySystem::new(Arc::clone(&store), client, "test-model");

    let outcome = system.consolidate("chat-1").await.unwrap();
    assert_eq!(outcome, ConsolidationOutcome::Consolidated { merged: 1, removed: 1 });

    let remaining = store.list_memories("chat-1").unwrap();
    let contents: Vec<&str> = remaining.iter().map(|m| m.content.as_str()).collect();
    assert!(contents.contains(&"Deeply fond of tea"));
    assert!(contents.contains(&"plays the violin"));
    assert!(!contents.contains(&"likes tea"));
    assert!(contents.contains(&"grew up in the mountains"));
    assert!(!contents.contains(&"afraid of the dark"));
    assert_eq!(remaining.len(), 3);

    let merged = remaining
        .iter()
        .find(|m| m.content == "Deeply fond of tea")
        .unwrap();
    assert_eq!(merged.importance, 9);
    assert_eq!(merged.memory_type, MemoryType::Consolidated);
}

#[tokio::test]
async fn unparseable_plan_falls_back_to_local_dedup() {
    let store = test_store();
    let client = Arc::new(ScriptedClient::new(vec![Ok("not json".to_string())]));
    let system = PersonaMemorySystem::new(Arc::clone(&store), client, "test-model");

    // Two duplicates (same content prefix + type) among distinct memories.
    seed_memories(
        &system,
        "chat-1",
        &["likes tea", "likes tea", "plays violin", "hates rain", "sings", "dances"],
    )
    .await;

    let outcome = system.consolidate("chat-1").await.unwrap();
    match outcome {
        ConsolidationOutcome::LocalFallback { kept } => assert_eq!(kept, 5),
        other => panic!("expected local fallback, got {:?}", other),
    }

    let remaining = store.list_memories("chat-1").unwrap();
    assert_eq!(remaining.len(), 5);
    let tea_count = remaining.iter().filter(|m| m.content == "likes tea").count();
    assert_eq!(tea_count, 1, "duplicates collapse to one");
}

#[tokio::test(start_paused = true)]
async fn busy_consolidation_falls_back_after_retries() {
    let store = test_store();
    let client = Arc::new(BusyClient::default());
    let system = PersonaMemorySystem::new(Arc::clone(&store), client.clone(), "test-model");

    seed_memories(&system, "chat-1", &["a", "b", "c", "d", "e", "f", "g"]).await;

    let outcome = system.consolidate("chat-1").await.unwrap();
    assert!(matches!(outcome, ConsolidationOutcome::LocalFallback { .. }));
    assert_eq!(client.call_count(), 3, "busy call retried to the cap first");
    assert_eq!(store.list_memories("chat-1").unwrap().len(), 7);
}
