mod helpers;

use helpers::{test_store, ScriptedClient};
use rapport::{ChatMessage, CompletionError, MemoryType, PersonaMemorySystem, Role};
use std::sync::Arc;

fn transcript(assistant_turns: usize) -> Vec<ChatMessage> {
    let mut messages = Vec::new();
    for i in 0..assistant_turns {
        messages.push(ChatMessage::user(format!("问题 {}", i)));
        messages.push(ChatMessage::assistant(format!("带着旧日口癖的回答 {}", i)));
    }
    messages
}

fn traits_json(contents: &[&str]) -> String {
    let items: Vec<String> = contents
        .iter()
        .map(|c| format!(r#"{{"content":"{}","importance":6,"type":"character_trait"}}"#, c))
        .collect();
    format!(r#"{{"persona_traits":[{}]}}"#, items.join(","))
}

#[tokio::test(start_paused = true)]
async fn batches_run_serially_and_accumulate() {
    let store = test_store();
    // 20 assistant messages → batch size 15 → two batches.
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(traits_json(&["speaks formally", "uses old sayings"])),
        Ok(traits_json(&["fond of riddles"])),
    ]));
    let system = PersonaMemorySystem::new(Arc::clone(&store), client.clone(), "test-model");

    let inserted = system
        .import_transcript(&transcript(20), "chat-1")
        .await
        .unwrap();

    assert_eq!(client.call_count(), 2);
    assert_eq!(inserted, 3);

    let stored = store.list_memories("chat-1").unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|m| m.memory_type == MemoryType::ImportedTrait));
}

#[tokio::test(start_paused = true)]
async fn failed_batch_does_not_halt_the_rest() {
    let store = test_store();
    let client = Arc::new(ScriptedClient::new(vec![
        Err(CompletionError::from_status(400, "bad request".into())),
        Ok(traits_json(&["collects seashells"])),
    ]));
    let system = PersonaMemorySystem::new(Arc::clone(&store), client.clone(), "test-model");

    let inserted = system
        .import_transcript(&transcript(20), "chat-1")
        .await
        .unwrap();

    assert_eq!(client.call_count(), 2);
    assert_eq!(inserted, 1);
    assert_eq!(store.list_memories("chat-1").unwrap()[0].content, "collects seashells");
}

#[tokio::test]
async fn import_without_assistant_messages_is_a_noop() {
    let store = test_store();
    let client = Arc::new(ScriptedClient::new(vec![Ok(traits_json(&["unused"]))]));
    let system = PersonaMemorySystem::new(Arc::clone(&store), client.clone(), "test-model");

    let user_only: Vec<ChatMessage> = (0..6).map(|i| ChatMessage::user(format!("消息 {}", i))).collect();
    assert!(user_only.iter().all(|m| m.role == Role::User));

    let inserted = system.import_transcript(&user_only, "chat-1").await.unwrap();
    assert_eq!(inserted, 0);
    assert_eq!(client.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn oversized_import_consolidates_before_persisting() {
    let store = test_store();

    // Three batches of 10 traits each → 30 accumulated → aggregation pass →
    // scripted consolidation keeps 4.
    let batch: Vec<String> = (0..10).map(|i| format!("trait number {}", i)).collect();
    let batch_refs: Vec<&str> = batch.iter().map(|s| s.as_str()).collect();
    let shifted: Vec<String> = (10..20).map(|i| format!("trait number {}", i)).collect();
    let shifted_refs: Vec<&str> = shifted.iter().map(|s| s.as_str()).collect();
    let third: Vec<String> = (20..30).map(|i| format!("trait number {}", i)).collect();
    let third_refs: Vec<&str> = third.iter().map(|s| s.as_str()).collect();

    let consolidated = r#"{"consolidated_traits":[
        {"content":"distilled trait a","importance":9},
        {"content":"distilled trait b","importance":8},
        {"content":"distilled trait c","importance":7},
        {"content":"distilled trait d","importance":6}
    ]}"#;

    let client = Arc::new(ScriptedClient::new(vec![
        Ok(traits_json(&batch_refs)),
        Ok(traits_json(&shifted_refs)),
        Ok(traits_json(&third_refs)),
        Ok(consolidated.to_string()),
    ]));
    // 60 assistant messages → batch size 20 → three batches, then one
    // aggregation call.
    let system = PersonaMemorySystem::new(Arc::clone(&store), client.clone(), "test-model");

    let inserted = system
        .import_transcript(&transcript(60), "chat-1")
        .await
        .unwrap();

    assert_eq!(client.call_count(), 4);
    assert_eq!(inserted, 4);

    let stored = store.list_memories("chat-1").unwrap();
    assert_eq!(stored.len(), 4);
    assert!(stored.iter().all(|m| m.memory_type == MemoryType::Consolidated));
    assert!(stored.iter().any(|m| m.content == "distilled trait a"));
}
