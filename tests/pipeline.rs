// tests/pipeline.rs
//! Integration tests for inbound observation and membership events.

mod common;
use common::TestEngine;
use common::ids::*;
use roomwarden::model::Entity;
use roomwarden::opslog::OpsEvent;
use roomwarden::pipeline::{Flow, Interaction};
use roomwarden::platform::{Notice, RoomRole};

#[tokio::test]
async fn test_observation_records_participants_and_rooms() {
    let t = TestEngine::new().await;

    let interaction = Interaction::new(t.participant(BOB), TestEngine::room(ROOM))
        .with_message(1)
        .replying_to(Entity::Participant(t.participant(MALLORY)));
    assert_eq!(t.pipeline.run(&t.engine, &interaction).await, Flow::Continue);

    let store = t.store();
    let bob = store.find_participant(BOB).await.unwrap().expect("actor recorded");
    assert_eq!(bob.handle.as_deref(), Some("bob"));
    assert!(store.find_participant(MALLORY).await.unwrap().is_some());
    assert_eq!(
        store.find_by_handle("MALLORY").await.unwrap().map(|p| p.id),
        Some(MALLORY)
    );
    assert_eq!(store.list_rooms().await.unwrap(), vec![ROOM]);

    // Private conversations are not rooms.
    t.speak(BOB, BOB).await;
    assert_eq!(store.list_rooms().await.unwrap(), vec![ROOM]);
}

#[tokio::test]
async fn test_assistant_added_to_room() {
    let t = TestEngine::with_log_destination(Some(LOG_ROOM)).await;

    t.joined(THIRD_ROOM, &[ASSISTANT]).await;

    assert!(t.store().list_rooms().await.unwrap().contains(&THIRD_ROOM));
    let logged = t.platform.notices_to(LOG_ROOM);
    assert_eq!(logged.len(), 1);
    assert!(matches!(
        &logged[0],
        Notice::Ops { event: OpsEvent::AddedToRoom { room }, fallback: false } if room.id == THIRD_ROOM
    ));
    assert!(t.platform.notices_to(OWNER).is_empty());
}

#[tokio::test]
async fn test_log_falls_back_to_owner() {
    let t = TestEngine::with_log_destination(Some(LOG_ROOM)).await;
    t.platform.fail_destination(LOG_ROOM);

    t.joined(THIRD_ROOM, &[ASSISTANT]).await;

    let fallback = t.platform.notices_to(OWNER);
    assert_eq!(fallback.len(), 1);
    assert!(matches!(
        &fallback[0],
        Notice::Ops { event: OpsEvent::AddedToRoom { .. }, fallback: true }
    ));
}

#[tokio::test]
async fn test_owner_welcomed_on_join() {
    let t = TestEngine::new().await;

    t.joined(ROOM, &[OWNER]).await;
    assert_eq!(
        t.platform.notices_to(ROOM),
        vec![Notice::OwnerWelcome { owner: OWNER }]
    );
}

#[tokio::test]
async fn test_join_leaves_non_enforcing_room_alone() {
    let t = TestEngine::new().await;

    t.store()
        .add_global(MALLORY, OWNER, Some("spam"))
        .await
        .unwrap();
    t.store().set_enforced(ROOM, false).await.unwrap();

    t.joined(ROOM, &[MALLORY, OWNER]).await;
    assert_eq!(t.platform.role(ROOM, MALLORY), Some(RoomRole::Member));
    assert!(t.platform.notices_to(ROOM).is_empty());

    t.joined(OTHER_ROOM, &[MALLORY]).await;
    assert_eq!(t.platform.role(OTHER_ROOM, MALLORY), Some(RoomRole::Banned));
}

#[tokio::test]
async fn test_assistant_leaving_forgets_room() {
    let t = TestEngine::new().await;

    t.speak(BOB, ROOM).await;
    t.speak(BOB, OTHER_ROOM).await;
    t.store().set_enforced(ROOM, false).await.unwrap();

    // Other participants leaving changes nothing.
    t.left(ROOM, BOB).await;
    assert_eq!(t.store().list_rooms().await.unwrap().len(), 2);

    t.left(ROOM, ASSISTANT).await;
    assert_eq!(t.store().list_rooms().await.unwrap(), vec![OTHER_ROOM]);

    // Seen again: recorded again, with enforcement back on.
    t.speak(BOB, ROOM).await;
    assert!(t.store().list_rooms().await.unwrap().contains(&ROOM));
    assert!(t.store().is_enforced(ROOM).await.unwrap());
}

#[tokio::test]
async fn test_global_ban_guard_spares_privileged() {
    let t = TestEngine::new().await;

    t.store()
        .add_global(ALICE, OWNER, Some("old mistake"))
        .await
        .unwrap();
    t.make_operator(ALICE).await;

    assert_eq!(t.speak(ALICE, ROOM).await, Flow::Continue);
    assert_eq!(t.platform.role(ROOM, ALICE), Some(RoomRole::Member));

    t.store().revoke(ALICE).await.unwrap();
    assert_eq!(t.speak(ALICE, ROOM).await, Flow::Stop);
    assert_eq!(t.platform.role(ROOM, ALICE), Some(RoomRole::Banned));
}
