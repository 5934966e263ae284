use std::sync::Arc;
use std::time::Duration;

use noteverse::{
    blobs::EmbeddedBlobStore,
    clock::SystemClock,
    notify::{ChangeNotifier, KeyFilter, Resource},
    overrides::OverrideField,
    repository::ContentRepository,
    store::MemoryStore,
};

fn setup_repo() -> ContentRepository {
    ContentRepository::new(
        Arc::new(MemoryStore::new()),
        ChangeNotifier::new(16),
        Arc::new(EmbeddedBlobStore),
        Arc::new(SystemClock),
    )
}

#[tokio::test]
async fn test_other_context_sees_one_event_per_mutation() {
    let writer = setup_repo();
    let reader = writer.new_context();
    let mut sub = reader.subscribe(KeyFilter::keys(["semesters"]));

    writer.add_subject("sem1", "Thermodynamics").await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("timed out waiting for change")
        .expect("bus closed");
    assert_eq!(event.resource, Resource::Semesters);
    assert_eq!(event.origin, writer.context_id());
    assert!(event.keys.contains(&"semesters".to_string()));
    assert!(event.keys.contains(&"update-note-text".to_string()));

    assert!(sub.try_recv().is_none());
}

#[tokio::test]
async fn test_writer_does_not_hear_its_own_writes() {
    let writer = setup_repo();
    let mut own = writer.subscribe(KeyFilter::all());

    writer.set_announcement("Library closed on Friday.").await.unwrap();
    writer.set_font("Roboto").await.unwrap();

    assert!(own.try_recv().is_none());
}

#[tokio::test]
async fn test_subscribers_only_get_keys_they_asked_for() {
    let writer = setup_repo();
    let reader = writer.new_context();
    let mut fonts = reader.subscribe(KeyFilter::keys(["font"]));
    let mut overrides = reader.subscribe(KeyFilter::keys(["user-canChangeName-*"]));

    writer.add_subject("sem2", "Statics").await.unwrap();
    assert!(fonts.try_recv().is_none());
    assert!(overrides.try_recv().is_none());

    writer
        .set_user_override("admin", OverrideField::CanChangeName, "false")
        .await
        .unwrap();
    let event = overrides.try_recv().expect("override change");
    assert_eq!(event.resource, Resource::Users);
    assert_eq!(event.keys, vec!["user-canChangeName-admin".to_string()]);
    assert!(fonts.try_recv().is_none());
}

#[tokio::test]
async fn test_failed_mutation_publishes_nothing() {
    let writer = setup_repo();
    let reader = writer.new_context();
    let mut sub = reader.subscribe(KeyFilter::all());

    assert!(writer.add_subject("sem1", "   ").await.is_err());
    assert!(writer.delete_subject("sem1", "missing").await.is_err());

    assert!(sub.try_recv().is_none());
}

#[tokio::test]
async fn test_reader_reloads_after_notification() {
    let writer = setup_repo();
    let reader = writer.new_context();
    let mut sub = reader.subscribe(KeyFilter::keys(["semesters"]));
    let before = reader.semester("sem4").await.unwrap();

    let handle = tokio::spawn(async move {
        writer.add_subject("sem4", "Computer Networks").await.unwrap();
    });

    sub.recv().await.expect("change notification");
    let after = reader.semester("sem4").await.unwrap();
    assert_eq!(after.subjects.len(), before.subjects.len() + 1);
    assert_eq!(after.subjects.last().unwrap().name, "Computer Networks");

    handle.await.unwrap();
}
