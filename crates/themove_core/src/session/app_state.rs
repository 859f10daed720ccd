//! Application state owned by the presentation root.
//!
//! # Responsibility
//! - Hold the local move snapshot, the view configuration, the viewer and
//!   the open detail selection.
//! - Dispatch user intents to the service and apply pushed store snapshots.
//!
//! # Invariants
//! - Snapshots are applied in receipt order, each replacing the whole
//!   collection.
//! - The store subscription is torn down exactly once.
//! - Failed store writes are logged, not retried, and leave local state as-is.

use crate::model::actor::Actor;
use crate::model::move_record::{Move, MoveId, NewMove};
use crate::repo::feed::Subscription;
use crate::repo::move_repo::MoveRepository;
use crate::service::move_service::{MoveService, MoveServiceError};
use crate::view::card::MoveCard;
use crate::view::filter::{FilterSelection, FilterToken, SortOrder, Tab};
use crate::view::projection::{project, ViewConfig};
use log::{debug, info, warn};
use std::sync::mpsc::{channel, Receiver};

/// When pushed snapshots reach local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Apply the store's snapshot right after each local action.
    Immediate,
    /// Leave local state untouched until the host calls `AppState::sync`.
    Deferred,
}

/// Result of one dispatched user intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The store accepted the write.
    Applied,
    /// Input was rejected before reaching the store; nothing changed.
    Rejected,
    /// The store write failed; the failure was logged.
    Failed,
}

/// Session state for one viewer over one store.
pub struct AppState<R: MoveRepository> {
    service: MoveService<R>,
    viewer: Actor,
    mode: SyncMode,
    moves: Vec<Move>,
    view: ViewConfig,
    selected: Option<MoveId>,
    snapshots: Receiver<Vec<Move>>,
    subscription: Option<Subscription>,
}

impl<R: MoveRepository> AppState<R> {
    /// Loads the initial snapshot and subscribes to store updates.
    pub fn open(repo: R, viewer: Actor, mode: SyncMode) -> Result<Self, MoveServiceError> {
        let service = MoveService::new(repo);
        let moves = service.list_moves()?;
        let (sender, snapshots) = channel();
        let subscription = service.repo().subscribe(Box::new(move |snapshot: &[Move]| {
            // Receiver gone means the session closed; nothing to deliver.
            let _ = sender.send(snapshot.to_vec());
        }))?;

        info!(
            "event=session_open module=session status=ok moves={} mode={:?}",
            moves.len(),
            mode
        );
        Ok(Self {
            service,
            viewer,
            mode,
            moves,
            view: ViewConfig::default(),
            selected: None,
            snapshots,
            subscription: Some(subscription),
        })
    }

    pub fn viewer(&self) -> &Actor {
        &self.viewer
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn view(&self) -> &ViewConfig {
        &self.view
    }

    /// Local snapshot, newest first.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn service(&self) -> &MoveService<R> {
        &self.service
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.view.search_term = term.into();
    }

    pub fn toggle_filter(&mut self, token: FilterToken) {
        self.view.filters.toggle(token);
    }

    pub fn set_filters(&mut self, filters: FilterSelection) {
        self.view.filters = filters;
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.view.sort = sort;
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.view.tab = tab;
    }

    /// Render-ready feed for the current configuration.
    pub fn projection(&self) -> Vec<MoveCard> {
        let capabilities = self.service.repo().capabilities();
        project(&self.moves, &self.viewer.id, &self.view)
            .into_iter()
            .map(|record| MoveCard::for_viewer(record, &self.viewer.id, capabilities))
            .collect()
    }

    /// Creates a move hosted by the viewer. Returns its id when applied.
    pub fn create_move(&mut self, draft: NewMove) -> Option<MoveId> {
        let result = self.service.create_move(&self.viewer, draft);
        match result {
            Ok(created) => {
                self.after_write();
                Some(created.id)
            }
            Err(err) => {
                self.report("move_create", &err);
                None
            }
        }
    }

    pub fn toggle_join(&mut self, id: &MoveId) -> ActionOutcome {
        let result = self.service.toggle_join(id, &self.viewer).map(|_| ());
        self.finish("move_join", result)
    }

    pub fn toggle_save(&mut self, id: &MoveId) -> ActionOutcome {
        let result = self.service.toggle_save(id, &self.viewer).map(|_| ());
        self.finish("move_save", result)
    }

    /// Appends a comment as the viewer. Blank text is a no-op.
    pub fn add_comment(&mut self, id: &MoveId, text: &str) -> ActionOutcome {
        let result = self.service.add_comment(id, &self.viewer, text).map(|_| ());
        self.finish("move_comment", result)
    }

    pub fn delete_move(&mut self, id: &MoveId) -> ActionOutcome {
        let result = self.service.delete_move(id, &self.viewer);
        self.finish("move_delete", result)
    }

    /// Selects a move for the detail view. Returns its card when present locally.
    pub fn open_detail(&mut self, id: &MoveId) -> Option<MoveCard> {
        let found = self.moves.iter().any(|record| &record.id == id);
        self.selected = found.then(|| id.clone());
        self.selected_detail()
    }

    pub fn close_detail(&mut self) {
        self.selected = None;
    }

    pub fn selected_detail(&self) -> Option<MoveCard> {
        let id = self.selected.as_ref()?;
        let record = self.moves.iter().find(|record| &record.id == id)?;
        Some(MoveCard::for_viewer(
            record,
            &self.viewer.id,
            self.service.repo().capabilities(),
        ))
    }

    /// Applies every pending snapshot in receipt order.
    ///
    /// Returns how many snapshots were applied.
    pub fn sync(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(snapshot) = self.snapshots.try_recv() {
            self.moves = snapshot;
            applied += 1;
        }
        if applied > 0 {
            let selection_gone = self
                .selected
                .as_ref()
                .is_some_and(|id| !self.moves.iter().any(|record| &record.id == id));
            if selection_gone {
                self.selected = None;
            }
            debug!(
                "event=session_sync module=session status=ok snapshots={applied} moves={}",
                self.moves.len()
            );
        }
        applied
    }

    /// Tears down the store subscription. Returns `false` when already closed.
    pub fn close(&mut self) -> bool {
        match self.subscription.take() {
            Some(mut subscription) => {
                subscription.unsubscribe();
                info!("event=session_close module=session status=ok");
                true
            }
            None => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.subscription.is_some()
    }

    fn finish(&mut self, event: &str, result: Result<(), MoveServiceError>) -> ActionOutcome {
        match result {
            Ok(()) => {
                self.after_write();
                ActionOutcome::Applied
            }
            Err(err) => self.report(event, &err),
        }
    }

    fn after_write(&mut self) {
        if self.mode == SyncMode::Immediate {
            self.sync();
        }
    }

    fn report(&self, event: &str, err: &MoveServiceError) -> ActionOutcome {
        if err.is_rejected_input() {
            debug!("event={event} module=session status=rejected reason={err}");
            ActionOutcome::Rejected
        } else {
            warn!("event={event} module=session status=error error={err}");
            ActionOutcome::Failed
        }
    }
}
