use std::sync::{Arc, Mutex};
use themove_core::{
    sample_moves, Actor, ActorId, Comment, InMemoryMoveRepository, Move, MoveId, MovePatch,
    MoveRepository, MoveStatus, NewMove, RepoError, SqliteMoveRepository, StoreCapabilities,
};

fn host() -> Actor {
    Actor::new(ActorId::parse("host").unwrap(), "Host")
}

fn record(id: &str, created_at: i64) -> Move {
    Move::with_id(
        MoveId::parse(id).unwrap(),
        NewMove::new("Sunset Walk", "19:00 - 20:00", "Lakefront", "Bench by the pier"),
        &host(),
        created_at,
    )
    .unwrap()
}

fn with_delete() -> StoreCapabilities {
    StoreCapabilities {
        supports_delete: true,
        ..StoreCapabilities::default()
    }
}

fn stores(capabilities: StoreCapabilities) -> Vec<(&'static str, Box<dyn MoveRepository>)> {
    vec![
        (
            "memory",
            Box::new(InMemoryMoveRepository::new(capabilities)) as Box<dyn MoveRepository>,
        ),
        (
            "sqlite",
            Box::new(SqliteMoveRepository::open_in_memory(capabilities).unwrap()),
        ),
    ]
}

fn ids(moves: &[Move]) -> Vec<String> {
    moves.iter().map(|m| m.id.to_string()).collect()
}

#[test]
fn create_then_get_returns_the_same_record() {
    for (name, store) in stores(StoreCapabilities::default()) {
        let created = record("m1", 10);
        let id = store.create_move(&created).unwrap();

        assert_eq!(id, created.id, "{name}");
        assert_eq!(store.get_move(&id).unwrap(), Some(created), "{name}");
        assert_eq!(
            store.get_move(&MoveId::parse("missing").unwrap()).unwrap(),
            None,
            "{name}"
        );
    }
}

#[test]
fn list_is_newest_first_with_id_tiebreak() {
    for (name, store) in stores(StoreCapabilities::default()) {
        store.create_move(&record("b", 10)).unwrap();
        store.create_move(&record("c", 30)).unwrap();
        store.create_move(&record("a", 10)).unwrap();

        assert_eq!(ids(&store.list_moves().unwrap()), vec!["c", "b", "a"], "{name}");
    }
}

#[test]
fn duplicate_ids_are_rejected() {
    for (name, store) in stores(StoreCapabilities::default()) {
        store.create_move(&record("m1", 10)).unwrap();
        let err = store.create_move(&record("m1", 20)).unwrap_err();
        assert!(matches!(err, RepoError::DuplicateId(ref id) if id.as_str() == "m1"), "{name}");
        assert_eq!(store.list_moves().unwrap().len(), 1, "{name}");
    }
}

#[test]
fn invalid_records_never_reach_the_store() {
    for (name, store) in stores(StoreCapabilities::default()) {
        let mut invalid = record("m1", 10);
        invalid.participants = 0;
        let err = store.create_move(&invalid).unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)), "{name}");
        assert!(store.list_moves().unwrap().is_empty(), "{name}");
    }
}

#[test]
fn decoded_records_with_blank_actors_never_reach_the_store() {
    let wire = |host: &str, joined: &[&str]| {
        serde_json::json!({
            "id": "m9",
            "title": "Pickup",
            "category": "Sports",
            "status": "Upcoming",
            "timeRange": "18:00",
            "location": "Gym",
            "exactMeetingSpot": "Court 2",
            "participants": 2,
            "hostId": host,
            "joinedBy": joined,
            "createdAt": 5
        })
    };
    assert!(serde_json::from_value::<Move>(wire("", &[""])).is_err());
    assert!(serde_json::from_value::<Move>(wire("host", &["host", "  "])).is_err());

    for (name, store) in stores(StoreCapabilities::default()) {
        store.create_move(&record("m1", 10)).unwrap();
        let decoded = serde_json::from_value::<Move>(wire(" guest ", &["guest"])).unwrap();
        store.create_move(&decoded).unwrap();

        let listed = store.list_moves().unwrap();
        assert_eq!(ids(&listed), vec!["m1", "m9"], "{name}");
        assert_eq!(listed[1].host_id.as_str(), "guest", "{name}");
    }
}

#[test]
fn patch_updates_only_named_fields() {
    for (name, store) in stores(StoreCapabilities::default()) {
        let created = record("m1", 10);
        store.create_move(&created).unwrap();

        let guest = ActorId::parse("guest").unwrap();
        let patch = MovePatch {
            status: Some(MoveStatus::LiveNow),
            ..created.join_toggle_patch(&guest)
        };
        store.update_move(&created.id, &patch).unwrap();

        let updated = store.get_move(&created.id).unwrap().unwrap();
        assert_eq!(updated.status, MoveStatus::LiveNow, "{name}");
        assert_eq!(updated.participants, 2, "{name}");
        assert!(updated.is_joined_by(&guest), "{name}");
        assert_eq!(updated.title, created.title, "{name}");
        assert_eq!(updated.created_at, created.created_at, "{name}");
        assert!(updated.saved_by.is_empty(), "{name}");
    }
}

#[test]
fn rejected_patch_leaves_the_record_untouched() {
    for (name, store) in stores(StoreCapabilities::default()) {
        let created = record("m1", 10);
        store.create_move(&created).unwrap();

        let patch = MovePatch {
            participants: Some(0),
            ..MovePatch::default()
        };
        let err = store.update_move(&created.id, &patch).unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)), "{name}");
        assert_eq!(store.get_move(&created.id).unwrap(), Some(created), "{name}");
    }
}

#[test]
fn updating_a_missing_move_reports_not_found() {
    for (name, store) in stores(StoreCapabilities::default()) {
        let missing = MoveId::parse("ghost").unwrap();
        let err = store.update_move(&missing, &MovePatch::default()).unwrap_err();
        assert!(matches!(err, RepoError::NotFound(ref id) if id == &missing), "{name}");
    }
}

#[test]
fn comments_are_appended_in_order() {
    for (name, store) in stores(StoreCapabilities::default()) {
        let created = record("m1", 10);
        store.create_move(&created).unwrap();

        for (user, text) in [("Alex", "first"), ("Sam", "second"), ("Alex", "third")] {
            let patch = MovePatch {
                append_comment: Some(Comment {
                    user: user.to_string(),
                    text: text.to_string(),
                }),
                ..MovePatch::default()
            };
            store.update_move(&created.id, &patch).unwrap();
        }

        let texts = store
            .get_move(&created.id)
            .unwrap()
            .unwrap()
            .comments
            .into_iter()
            .map(|comment| comment.text)
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["first", "second", "third"], "{name}");
    }
}

#[test]
fn delete_requires_the_capability() {
    for (name, store) in stores(StoreCapabilities::default()) {
        let created = record("m1", 10);
        store.create_move(&created).unwrap();

        let err = store.delete_move(&created.id).unwrap_err();
        assert!(matches!(err, RepoError::Unsupported("delete")), "{name}");
        assert!(store.get_move(&created.id).unwrap().is_some(), "{name}");
    }
}

#[test]
fn delete_removes_record_and_its_children() {
    for (name, store) in stores(with_delete()) {
        let mut created = record("m1", 10);
        created.saved_by.insert(ActorId::parse("fan").unwrap());
        created.comments.push(Comment {
            user: "Fan".to_string(),
            text: "see you there".to_string(),
        });
        store.create_move(&created).unwrap();

        store.delete_move(&created.id).unwrap();
        assert_eq!(store.get_move(&created.id).unwrap(), None, "{name}");

        store.create_move(&record("m1", 20)).unwrap();
        let recreated = store.get_move(&created.id).unwrap().unwrap();
        assert!(recreated.saved_by.is_empty(), "{name}");
        assert!(recreated.comments.is_empty(), "{name}");

        let err = store
            .delete_move(&MoveId::parse("ghost").unwrap())
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)), "{name}");
    }
}

#[test]
fn subscribers_receive_a_snapshot_after_each_write() {
    for (name, store) in stores(with_delete()) {
        let received = Arc::new(Mutex::new(Vec::<Vec<String>>::new()));
        let sink = Arc::clone(&received);
        let subscription = store
            .subscribe(Box::new(move |snapshot: &[Move]| {
                sink.lock().unwrap().push(ids(snapshot));
            }))
            .unwrap();

        let first = record("m1", 10);
        store.create_move(&first).unwrap();
        store.create_move(&record("m2", 20)).unwrap();
        store
            .update_move(&first.id, &first.save_toggle_patch(&ActorId::parse("fan").unwrap()))
            .unwrap();
        store.delete_move(&first.id).unwrap();

        assert_eq!(
            *received.lock().unwrap(),
            vec![
                vec!["m1".to_string()],
                vec!["m2".to_string(), "m1".to_string()],
                vec!["m2".to_string(), "m1".to_string()],
                vec!["m2".to_string()],
            ],
            "{name}"
        );
        drop(subscription);
    }
}

#[test]
fn dropped_or_unsubscribed_handles_stop_delivery() {
    for (name, store) in stores(StoreCapabilities::default()) {
        let count = Arc::new(Mutex::new(0usize));

        let sink = Arc::clone(&count);
        let mut explicit = store
            .subscribe(Box::new(move |_: &[Move]| *sink.lock().unwrap() += 1))
            .unwrap();
        let sink = Arc::clone(&count);
        let dropped = store
            .subscribe(Box::new(move |_: &[Move]| *sink.lock().unwrap() += 1))
            .unwrap();

        store.create_move(&record("m1", 10)).unwrap();
        assert_eq!(*count.lock().unwrap(), 2, "{name}");

        assert!(explicit.unsubscribe(), "{name}");
        assert!(!explicit.unsubscribe(), "{name}");
        drop(dropped);

        store.create_move(&record("m2", 20)).unwrap();
        assert_eq!(*count.lock().unwrap(), 2, "{name}");
    }
}

#[test]
fn seeded_memory_store_lists_sample_moves() {
    let seeded =
        InMemoryMoveRepository::with_moves(StoreCapabilities::default(), sample_moves().unwrap())
            .unwrap();

    assert_eq!(seeded.len(), 4);
    assert_eq!(ids(&seeded.list_moves().unwrap()), vec!["m4", "m3", "m2", "m1"]);

    let tacos = seeded.get_move(&MoveId::parse("m3").unwrap()).unwrap().unwrap();
    assert_eq!(tacos.max_participants, None);
    assert_eq!(tacos.comments.len(), 2);
}

#[test]
fn seeding_rejects_duplicate_ids() {
    let result = InMemoryMoveRepository::with_moves(
        StoreCapabilities::default(),
        vec![record("m1", 10), record("m1", 20)],
    );
    assert!(matches!(result, Err(RepoError::DuplicateId(_))));
}

#[test]
fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("themove.sqlite3");

    let mut created = record("m1", 10);
    created.comments.push(Comment {
        user: "Host".to_string(),
        text: "bring water".to_string(),
    });
    {
        let store = SqliteMoveRepository::open(&path, StoreCapabilities::default()).unwrap();
        store.create_move(&created).unwrap();
    }

    let reopened = SqliteMoveRepository::open(&path, StoreCapabilities::default()).unwrap();
    assert_eq!(reopened.get_move(&created.id).unwrap(), Some(created));
}

#[test]
fn sqlite_store_rejects_unmigrated_connections() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let err = SqliteMoveRepository::try_new(conn, StoreCapabilities::default())
        .err()
        .unwrap();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn sqlite_reads_reject_corrupted_rows() {
    let store = SqliteMoveRepository::open_in_memory(StoreCapabilities::default()).unwrap();
    let created = record("m1", 10);
    store.create_move(&created).unwrap();

    store
        .connection()
        .execute("UPDATE moves SET participants = 0 WHERE id = 'm1';", [])
        .unwrap();

    let err = store.get_move(&created.id).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}
