use synapse_common::{SessionError, SessionId};

use super::*;
use crate::Role;

#[test]
fn initial_session_is_active_and_empty() {
    let store = SessionStore::with_initial_session();
    assert_eq!(store.len(), 1);
    let session = store.active().unwrap();
    assert_eq!(session.title(), PLACEHOLDER_TITLE);
    assert!(session.messages().is_empty());
    assert_eq!(session.summary().preview, EMPTY_PREVIEW);
}

#[test]
fn empty_store_has_no_active_session() {
    let store = SessionStore::new();
    assert!(store.is_empty());
    assert_eq!(store.active().unwrap_err(), SessionError::NoActiveSession);
}

#[test]
fn first_user_message_sets_title_once() {
    let mut store = SessionStore::with_initial_session();
    let id = store.active_id().unwrap().clone();

    store
        .append_message(&id, Role::User, "What is the capital of France?")
        .unwrap();
    store
        .append_message(&id, Role::User, "And of Germany?")
        .unwrap();

    assert_eq!(
        store.get(&id).unwrap().title(),
        "What is the capital of France?"
    );
}

#[test]
fn assistant_message_does_not_set_title() {
    let mut store = SessionStore::with_initial_session();
    let id = store.active_id().unwrap().clone();
    store
        .append_message(&id, Role::Assistant, "Hello there")
        .unwrap();
    assert_eq!(store.get(&id).unwrap().title(), PLACEHOLDER_TITLE);
}

#[test]
fn title_is_cut_to_sixty_characters() {
    let mut store = SessionStore::with_initial_session();
    let id = store.active_id().unwrap().clone();
    let long = "é".repeat(100);
    store.append_message(&id, Role::User, long).unwrap();

    let title = store.get(&id).unwrap().title().to_string();
    assert_eq!(title.chars().count(), TITLE_MAX_CHARS);
}

#[test]
fn preview_tracks_last_message() {
    let mut store = SessionStore::with_initial_session();
    let id = store.active_id().unwrap().clone();
    store.append_message(&id, Role::User, "hi").unwrap();
    store
        .append_message(&id, Role::Assistant, "x".repeat(200))
        .unwrap();

    let summary = store.get(&id).unwrap().summary();
    assert_eq!(summary.message_count, 2);
    assert_eq!(summary.preview.chars().count(), PREVIEW_MAX_CHARS);
}

#[test]
fn renamed_session_keeps_custom_title() {
    let mut store = SessionStore::with_initial_session();
    let id = store.active_id().unwrap().clone();
    store.rename_session(&id, "Trip planning").unwrap();
    store.append_message(&id, Role::User, "Book a hotel").unwrap();
    assert_eq!(store.get(&id).unwrap().title(), "Trip planning");
}

#[test]
fn rename_to_placeholder_text_still_counts_as_custom() {
    let mut store = SessionStore::with_initial_session();
    let id = store.active_id().unwrap().clone();
    let other = store.create_session();

    store.rename_session(&id, "").unwrap();
    store.append_message(&id, Role::User, "first question").unwrap();
    assert_eq!(store.get(&id).unwrap().title(), "");

    store.rename_session(&other, PLACEHOLDER_TITLE).unwrap();
    store.append_message(&other, Role::User, "second question").unwrap();
    assert_eq!(store.get(&other).unwrap().title(), PLACEHOLDER_TITLE);
    assert!(!store.get(&other).unwrap().has_placeholder_title());
}

#[test]
fn clearing_does_not_reopen_title() {
    let mut store = SessionStore::with_initial_session();
    let id = store.active_id().unwrap().clone();
    store.append_message(&id, Role::User, "original topic").unwrap();
    store.clear_messages(&id).unwrap();
    store.append_message(&id, Role::User, "new topic").unwrap();
    assert_eq!(store.get(&id).unwrap().title(), "original topic");
}

#[test]
fn remove_message_targets_exact_id() {
    let mut store = SessionStore::with_initial_session();
    let id = store.active_id().unwrap().clone();
    let first = store.append_message(&id, Role::Assistant, "same").unwrap();
    let second = store.append_message(&id, Role::Assistant, "same").unwrap();

    let removed = store.remove_message(&id, first.id).unwrap();
    assert_eq!(removed.map(|m| m.id), Some(first.id));

    let remaining = store.get(&id).unwrap().messages();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, second.id);

    assert!(store.remove_message(&id, first.id).unwrap().is_none());
}

#[test]
fn clear_keeps_id_and_title() {
    let mut store = SessionStore::with_initial_session();
    let id = store.active_id().unwrap().clone();
    store.append_message(&id, Role::User, "remember me").unwrap();
    store.clear_messages(&id).unwrap();

    let session = store.get(&id).unwrap();
    assert_eq!(session.id(), &id);
    assert_eq!(session.title(), "remember me");
    assert!(session.messages().is_empty());
}

#[test]
fn unknown_session_is_not_found() {
    let mut store = SessionStore::with_initial_session();
    let ghost = SessionId::from("c_0");
    assert_eq!(
        store.append_message(&ghost, Role::User, "hi").unwrap_err(),
        SessionError::NotFound(ghost.clone())
    );
    assert!(store.set_active(&ghost).is_err());
    assert!(store.clear_messages(&ghost).is_err());
}

#[test]
fn list_is_newest_first_and_create_switches_active() {
    let mut store = SessionStore::with_initial_session();
    let first = store.active_id().unwrap().clone();
    let second = store.create_session();
    assert_ne!(first, second);
    assert_eq!(store.active_id(), Some(&second));

    let ids: Vec<_> = store.list_sessions().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![second, first.clone()]);

    store.set_active(&first).unwrap();
    assert_eq!(store.active_id(), Some(&first));
}

#[test]
fn export_has_id_title_and_messages() {
    let mut store = SessionStore::with_initial_session();
    let id = store.active_id().unwrap().clone();
    store.append_message(&id, Role::User, "hello").unwrap();
    store.append_message(&id, Role::Assistant, "hi!").unwrap();

    let json: serde_json::Value = serde_json::from_str(&store.export_active().unwrap()).unwrap();
    assert_eq!(json["id"], id.as_str());
    assert_eq!(json["title"], "hello");
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["content"], "hi!");
    assert!(messages[0]["id"].is_string());
    assert!(messages[0]["timestamp"].is_string());
}
