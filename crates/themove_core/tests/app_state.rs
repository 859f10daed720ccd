use std::sync::Arc;
use themove_core::{
    sample_moves, ActionOutcome, Actor, ActorId, AppState, FilterToken, InMemoryMoveRepository,
    Move, MoveId, MoveRepository, MoveStatus, NewMove, SortOrder, StoreCapabilities, SyncMode,
    Tab,
};

fn viewer() -> Actor {
    Actor::new(ActorId::parse("you").unwrap(), "You")
}

fn seeded(capabilities: StoreCapabilities) -> InMemoryMoveRepository {
    InMemoryMoveRepository::with_moves(capabilities, sample_moves().unwrap()).unwrap()
}

fn m(id: &str) -> MoveId {
    MoveId::parse(id).unwrap()
}

fn draft(title: &str) -> NewMove {
    NewMove::new(title, "12:00 - 13:00", "Quad", "Under the oak tree")
}

fn card_ids(state: &AppState<InMemoryMoveRepository>) -> Vec<String> {
    state
        .projection()
        .into_iter()
        .map(|card| card.id.to_string())
        .collect()
}

#[test]
fn open_loads_the_initial_snapshot() {
    let state = AppState::open(
        seeded(StoreCapabilities::default()),
        viewer(),
        SyncMode::Immediate,
    )
    .unwrap();

    assert!(state.is_open());
    assert_eq!(state.moves().len(), 4);
    assert_eq!(card_ids(&state), vec!["m4", "m3", "m2", "m1"]);
}

#[test]
fn immediate_mode_reflects_writes_right_away() {
    let mut state = AppState::open(
        seeded(StoreCapabilities::default()),
        viewer(),
        SyncMode::Immediate,
    )
    .unwrap();

    assert_eq!(state.toggle_join(&m("m2")), ActionOutcome::Applied);

    let card = state.open_detail(&m("m2")).unwrap();
    assert!(card.is_joined);
    assert_eq!(card.participants, 5);
    assert_eq!(card.capacity_label, "5/6");
}

#[test]
fn deferred_mode_waits_for_sync() {
    let mut state = AppState::open(
        seeded(StoreCapabilities::default()),
        viewer(),
        SyncMode::Deferred,
    )
    .unwrap();

    assert_eq!(state.toggle_save(&m("m1")), ActionOutcome::Applied);
    assert_eq!(state.toggle_save(&m("m3")), ActionOutcome::Applied);
    assert!(state.moves().iter().all(|record| record.saved_by.is_empty()));

    assert_eq!(state.sync(), 2);
    assert_eq!(state.sync(), 0);

    state.set_tab(Tab::Saved);
    assert_eq!(card_ids(&state), vec!["m3", "m1"]);
}

#[test]
fn created_moves_appear_first_under_newest() {
    let mut state = AppState::open(
        seeded(StoreCapabilities::default()),
        viewer(),
        SyncMode::Immediate,
    )
    .unwrap();

    let id = state.create_move(draft("Picnic")).unwrap();

    let ids = card_ids(&state);
    assert_eq!(ids.first(), Some(&id.to_string()));

    state.set_tab(Tab::MyMoves);
    assert_eq!(card_ids(&state), vec![id.to_string()]);
    assert!(state.projection()[0].is_host);
}

#[test]
fn invalid_create_is_rejected() {
    let mut state = AppState::open(
        seeded(StoreCapabilities::default()),
        viewer(),
        SyncMode::Immediate,
    )
    .unwrap();

    assert_eq!(state.create_move(draft("   ")), None);
    assert_eq!(state.moves().len(), 4);
}

#[test]
fn blank_comment_is_rejected_and_real_comment_applied() {
    let mut state = AppState::open(
        seeded(StoreCapabilities::default()),
        viewer(),
        SyncMode::Immediate,
    )
    .unwrap();

    assert_eq!(state.add_comment(&m("m2"), "   "), ActionOutcome::Rejected);
    assert_eq!(state.add_comment(&m("m2"), " bringing snacks "), ActionOutcome::Applied);

    let card = state.open_detail(&m("m2")).unwrap();
    assert_eq!(card.comments.len(), 1);
    assert_eq!(card.comments[0].user, "You");
    assert_eq!(card.comments[0].text, "bringing snacks");
}

#[test]
fn store_failures_are_reported_as_failed() {
    let mut state = AppState::open(
        seeded(StoreCapabilities::default()),
        viewer(),
        SyncMode::Immediate,
    )
    .unwrap();

    assert_eq!(state.toggle_join(&m("ghost")), ActionOutcome::Failed);
    assert_eq!(state.moves().len(), 4);
}

#[test]
fn delete_clears_the_open_detail() {
    let mut state = AppState::open(
        seeded(StoreCapabilities {
            supports_delete: true,
            ..StoreCapabilities::default()
        }),
        viewer(),
        SyncMode::Immediate,
    )
    .unwrap();

    assert_eq!(state.delete_move(&m("m1")), ActionOutcome::Rejected);

    let id = state.create_move(draft("Frisbee")).unwrap();
    let card = state.open_detail(&id).unwrap();
    assert!(card.can_delete);

    assert_eq!(state.delete_move(&id), ActionOutcome::Applied);
    assert!(state.selected_detail().is_none());
    assert_eq!(state.moves().len(), 4);
}

#[test]
fn view_configuration_drives_the_projection() {
    let mut state = AppState::open(
        seeded(StoreCapabilities::default()),
        viewer(),
        SyncMode::Immediate,
    )
    .unwrap();

    state.toggle_filter(FilterToken::Status(MoveStatus::Upcoming));
    assert_eq!(card_ids(&state), vec!["m3", "m2"]);
    assert_eq!(state.view().filters.display_label(), "Upcoming");

    state.set_sort(SortOrder::Popular);
    assert_eq!(card_ids(&state), vec!["m3", "m2"]);

    state.set_search_term("LIBRARY");
    assert_eq!(card_ids(&state), vec!["m2"]);

    state.toggle_filter(FilterToken::All);
    state.set_search_term("");
    assert_eq!(card_ids(&state), vec!["m4", "m3", "m1", "m2"]);
}

#[test]
fn open_detail_of_unknown_move_selects_nothing() {
    let mut state = AppState::open(
        seeded(StoreCapabilities::default()),
        viewer(),
        SyncMode::Immediate,
    )
    .unwrap();

    assert!(state.open_detail(&m("ghost")).is_none());
    assert!(state.open_detail(&m("m1")).is_some());
    state.close_detail();
    assert!(state.selected_detail().is_none());
}

#[test]
fn close_tears_down_the_subscription_once() {
    let mut state = AppState::open(
        seeded(StoreCapabilities::default()),
        viewer(),
        SyncMode::Deferred,
    )
    .unwrap();

    assert!(state.close());
    assert!(!state.close());
    assert!(!state.is_open());

    assert_eq!(state.toggle_save(&m("m1")), ActionOutcome::Applied);
    assert_eq!(state.sync(), 0);
}

#[test]
fn other_writers_are_picked_up_on_sync() {
    let repo = Arc::new(seeded(StoreCapabilities::default()));
    let mut state = AppState::open(SharedRepo(Arc::clone(&repo)), viewer(), SyncMode::Deferred)
        .unwrap();

    let record = repo.get_move(&m("m4")).unwrap().unwrap();
    let patch = record.save_toggle_patch(&viewer().id);
    repo.update_move(&record.id, &patch).unwrap();

    assert_eq!(state.sync(), 1);
    assert!(state
        .moves()
        .iter()
        .any(|current| current.id == record.id && current.is_saved_by(&viewer().id)));
}

struct SharedRepo(Arc<InMemoryMoveRepository>);

impl MoveRepository for SharedRepo {
    fn capabilities(&self) -> StoreCapabilities {
        self.0.capabilities()
    }

    fn list_moves(&self) -> themove_core::RepoResult<Vec<Move>> {
        self.0.list_moves()
    }

    fn get_move(&self, id: &MoveId) -> themove_core::RepoResult<Option<Move>> {
        self.0.get_move(id)
    }

    fn create_move(&self, record: &Move) -> themove_core::RepoResult<MoveId> {
        self.0.create_move(record)
    }

    fn update_move(
        &self,
        id: &MoveId,
        patch: &themove_core::MovePatch,
    ) -> themove_core::RepoResult<()> {
        self.0.update_move(id, patch)
    }

    fn delete_move(&self, id: &MoveId) -> themove_core::RepoResult<()> {
        self.0.delete_move(id)
    }

    fn subscribe(
        &self,
        listener: themove_core::SnapshotListener,
    ) -> themove_core::RepoResult<themove_core::Subscription> {
        self.0.subscribe(listener)
    }
}
