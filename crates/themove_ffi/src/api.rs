//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Own the process-wide session (`AppState`) the UI drives.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - The session is opened lazily from `THEMOVE_*` environment variables.
//! - Every read applies pending store snapshots before projecting.

use log::{info, warn};
use std::sync::{Mutex, MutexGuard};
use themove_core::{
    comment_initial, core_version as core_version_inner, init_logging as init_logging_inner,
    ping as ping_inner, seed_if_empty, ActionOutcome, AppConfig, AppState, Category,
    FilterToken, MoveCard, MoveId, MoveStatus, NewMove, SortOrder, SqliteMoveRepository,
    SyncMode, Tab,
};

type Session = AppState<SqliteMoveRepository>;

static SESSION: Mutex<Option<Session>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Re-reads `THEMOVE_*` configuration and reopens the session.
///
/// The previous session's store subscription is torn down. Search, filter,
/// sort and tab reset to defaults.
///
/// # FFI contract
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn session_reload() -> String {
    let result = AppConfig::from_env()
        .map_err(|err| format!("config load failed: {err}"))
        .and_then(|config| install_session(&config));
    match result {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One comment as rendered in the detail thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentItem {
    pub user: String,
    pub text: String,
    /// Avatar badge letter.
    pub initial: String,
}

/// Render-ready move for the current viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveItem {
    pub move_id: String,
    pub title: String,
    /// `Sports|Study|Social|Food`.
    pub category: String,
    /// `Live Now|Upcoming|Past`.
    pub status: String,
    pub time_range: String,
    pub location: String,
    pub exact_meeting_spot: String,
    pub participants: u32,
    pub max_participants: Option<u32>,
    pub notes: Option<String>,
    pub comments: Vec<CommentItem>,
    pub is_joined: bool,
    pub is_saved: bool,
    pub is_host: bool,
    pub is_live: bool,
    pub is_full: bool,
    pub can_delete: bool,
    pub capacity_label: String,
    pub participants_label: String,
}

/// Feed envelope returned by every `feed_*` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    pub ok: bool,
    pub items: Vec<MoveItem>,
    /// Dropdown button text (`Filter by...`, `Live Now, Food`, `3 selected`).
    pub filter_label: String,
    /// Active filter tokens in kebab case.
    pub filters: Vec<String>,
    pub sort: String,
    pub tab: String,
    pub search_term: String,
    pub message: String,
}

impl FeedResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            filter_label: String::new(),
            filters: Vec::new(),
            sort: String::new(),
            tab: String::new(),
            search_term: String::new(),
            message: message.into(),
        }
    }
}

/// Generic action response envelope for move mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveActionResponse {
    /// Whether the store accepted the write.
    pub ok: bool,
    /// Target or created move ID.
    pub move_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl MoveActionResponse {
    fn success(message: impl Into<String>, move_id: String) -> Self {
        Self {
            ok: true,
            move_id: Some(move_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            move_id: None,
            message: message.into(),
        }
    }
}

/// Detail envelope for one move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDetailResponse {
    pub ok: bool,
    pub item: Option<MoveItem>,
    pub message: String,
}

/// Returns the feed for the current search, filter, sort and tab.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn feed_list() -> FeedResponse {
    feed_after("feed_list", |_| Ok(()))
}

/// Replaces the search term. The term is matched as typed (no trimming).
#[flutter_rust_bridge::frb(sync)]
pub fn feed_set_search(term: String) -> FeedResponse {
    feed_after("feed_set_search", |state| {
        state.set_search_term(term);
        Ok(())
    })
}

/// Applies one dropdown click for a kebab-case token (`all`, `live-now`, `food`, ...).
#[flutter_rust_bridge::frb(sync)]
pub fn feed_toggle_filter(token: String) -> FeedResponse {
    feed_after("feed_toggle_filter", |state| {
        let token = token.parse::<FilterToken>().map_err(|err| err.to_string())?;
        state.toggle_filter(token);
        Ok(())
    })
}

/// Sets the ordering: `newest` or `popular`.
#[flutter_rust_bridge::frb(sync)]
pub fn feed_set_sort(order: String) -> FeedResponse {
    feed_after("feed_set_sort", |state| {
        let order = order.parse::<SortOrder>().map_err(|err| err.to_string())?;
        state.set_sort(order);
        Ok(())
    })
}

/// Sets the tab: `explore`, `saved` or `my-moves`.
#[flutter_rust_bridge::frb(sync)]
pub fn feed_set_tab(tab: String) -> FeedResponse {
    feed_after("feed_set_tab", |state| {
        let tab = tab.parse::<Tab>().map_err(|err| err.to_string())?;
        state.set_tab(tab);
        Ok(())
    })
}

/// Creates a move hosted by the configured viewer.
///
/// Input semantics:
/// - `category`: `sports|study|social|food` (case-insensitive) or the
///   `MoveItem.category` label.
/// - `status`: `live-now|upcoming|past` (case-insensitive) or the
///   `MoveItem.status` label, e.g. `Live Now`.
/// - Text fields are trimmed; blank required fields are rejected.
#[allow(clippy::too_many_arguments)]
#[flutter_rust_bridge::frb(sync)]
pub fn move_create(
    title: String,
    category: String,
    status: String,
    time_range: String,
    location: String,
    exact_meeting_spot: String,
    max_participants: Option<u32>,
    notes: Option<String>,
) -> MoveActionResponse {
    let category = match parse_category(&category) {
        Some(category) => category,
        None => return MoveActionResponse::failure(format!("unknown category `{category}`")),
    };
    let status = match parse_status(&status) {
        Some(status) => status,
        None => return MoveActionResponse::failure(format!("unknown status `{status}`")),
    };
    let mut draft = NewMove::new(title, time_range, location, exact_meeting_spot);
    draft.category = category;
    draft.status = status;
    draft.max_participants = max_participants;
    draft.notes = notes.filter(|value| !value.trim().is_empty());

    match with_session(|state| state.create_move(draft)) {
        Ok(Some(id)) => MoveActionResponse::success("Move created.", id.to_string()),
        Ok(None) => MoveActionResponse::failure(
            "move_create rejected: title, time, location and meeting spot are required",
        ),
        Err(err) => MoveActionResponse::failure(format!("move_create failed: {err}")),
    }
}

/// Flips the viewer's join state on a move.
#[flutter_rust_bridge::frb(sync)]
pub fn move_toggle_join(move_id: String) -> MoveActionResponse {
    run_action("move_toggle_join", &move_id, |state, id| state.toggle_join(id))
}

/// Flips the viewer's saved state on a move.
#[flutter_rust_bridge::frb(sync)]
pub fn move_toggle_save(move_id: String) -> MoveActionResponse {
    run_action("move_toggle_save", &move_id, |state, id| state.toggle_save(id))
}

/// Appends a comment as the viewer. Blank text is rejected without a write.
#[flutter_rust_bridge::frb(sync)]
pub fn move_add_comment(move_id: String, text: String) -> MoveActionResponse {
    run_action("move_add_comment", &move_id, |state, id| {
        state.add_comment(id, &text)
    })
}

/// Deletes a move when the deployment allows it and the viewer hosts it.
#[flutter_rust_bridge::frb(sync)]
pub fn move_delete(move_id: String) -> MoveActionResponse {
    run_action("move_delete", &move_id, |state, id| state.delete_move(id))
}

/// Opens the detail view of one move.
#[flutter_rust_bridge::frb(sync)]
pub fn move_detail(move_id: String) -> MoveDetailResponse {
    let id = match MoveId::parse(&move_id) {
        Ok(id) => id,
        Err(err) => {
            return MoveDetailResponse {
                ok: false,
                item: None,
                message: format!("move_detail failed: {err}"),
            }
        }
    };
    let result = with_session(|state| {
        state.sync();
        state.open_detail(&id)
    });
    match result {
        Ok(Some(card)) => MoveDetailResponse {
            ok: true,
            item: Some(to_move_item(card)),
            message: String::new(),
        },
        Ok(None) => MoveDetailResponse {
            ok: false,
            item: None,
            message: format!("move not found: {id}"),
        },
        Err(err) => MoveDetailResponse {
            ok: false,
            item: None,
            message: format!("move_detail failed: {err}"),
        },
    }
}

fn feed_after(
    event: &str,
    update: impl FnOnce(&mut Session) -> Result<(), String>,
) -> FeedResponse {
    let result = with_session(|state| {
        update(state)?;
        state.sync();
        Ok(build_feed(state))
    });
    match result {
        Ok(Ok(feed)) => feed,
        Ok(Err(err)) | Err(err) => FeedResponse::failure(format!("{event} failed: {err}")),
    }
}

fn build_feed(state: &Session) -> FeedResponse {
    let view = state.view();
    let items = state
        .projection()
        .into_iter()
        .map(to_move_item)
        .collect::<Vec<_>>();
    let message = if items.is_empty() {
        "No moves.".to_string()
    } else {
        format!("Found {} move(s).", items.len())
    };
    FeedResponse {
        ok: true,
        items,
        filter_label: view.filters.display_label(),
        filters: view
            .filters
            .tokens()
            .iter()
            .map(|token| token.as_str().to_string())
            .collect(),
        sort: view.sort.as_str().to_string(),
        tab: view.tab.as_str().to_string(),
        search_term: view.search_term.clone(),
        message,
    }
}

fn run_action(
    event: &str,
    move_id: &str,
    action: impl FnOnce(&mut Session, &MoveId) -> ActionOutcome,
) -> MoveActionResponse {
    let id = match MoveId::parse(move_id) {
        Ok(id) => id,
        Err(err) => return MoveActionResponse::failure(format!("{event} failed: {err}")),
    };
    match with_session(|state| action(state, &id)) {
        Ok(ActionOutcome::Applied) => MoveActionResponse::success("Done.", id.to_string()),
        Ok(ActionOutcome::Rejected) => MoveActionResponse {
            ok: false,
            move_id: Some(id.to_string()),
            message: format!("{event} rejected"),
        },
        Ok(ActionOutcome::Failed) => MoveActionResponse {
            ok: false,
            move_id: Some(id.to_string()),
            message: format!("{event} failed; see logs"),
        },
        Err(err) => MoveActionResponse::failure(format!("{event} failed: {err}")),
    }
}

fn with_session<T>(f: impl FnOnce(&mut Session) -> T) -> Result<T, String> {
    let mut guard = lock_session();
    if guard.is_none() {
        let config = AppConfig::from_env().map_err(|err| format!("config load failed: {err}"))?;
        *guard = Some(open_session(&config)?);
    }
    match guard.as_mut() {
        Some(state) => Ok(f(state)),
        None => Err("session unavailable".to_string()),
    }
}

fn lock_session() -> MutexGuard<'static, Option<Session>> {
    SESSION
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn open_session(config: &AppConfig) -> Result<Session, String> {
    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging_inner(config.effective_log_level(), log_dir) {
            warn!("event=ffi_logging module=ffi status=error error={err}");
        }
    }

    let viewer = config.viewer().map_err(|err| err.to_string())?;
    let db_path = config.resolved_db_path();
    let repo = SqliteMoveRepository::open(&db_path, config.capabilities())
        .map_err(|err| format!("store open failed: {err}"))?;
    let seeded = seed_if_empty(&repo).map_err(|err| format!("store seed failed: {err}"))?;
    let state = AppState::open(repo, viewer, SyncMode::Immediate)
        .map_err(|err| format!("session open failed: {err}"))?;

    info!(
        "event=ffi_session_open module=ffi status=ok seeded={} moves={}",
        seeded,
        state.moves().len()
    );
    Ok(state)
}

/// Replaces the process session, closing the previous one.
fn install_session(config: &AppConfig) -> Result<(), String> {
    let next = open_session(config)?;
    let mut guard = lock_session();
    if let Some(mut previous) = guard.replace(next) {
        previous.close();
    }
    Ok(())
}

// Wire labels (`Live Now`) come first so items can be echoed back unchanged.
fn parse_category(raw: &str) -> Option<Category> {
    if let Some(category) = Category::from_label(raw.trim()) {
        return Some(category);
    }
    match raw.parse::<FilterToken>().ok()? {
        FilterToken::Category(category) => Some(category),
        FilterToken::All | FilterToken::Status(_) => None,
    }
}

fn parse_status(raw: &str) -> Option<MoveStatus> {
    if let Some(status) = MoveStatus::from_label(raw.trim()) {
        return Some(status);
    }
    match raw.parse::<FilterToken>().ok()? {
        FilterToken::Status(status) => Some(status),
        FilterToken::All | FilterToken::Category(_) => None,
    }
}

fn to_move_item(card: MoveCard) -> MoveItem {
    MoveItem {
        move_id: card.id.to_string(),
        title: card.title,
        category: card.category.label().to_string(),
        status: card.status.label().to_string(),
        time_range: card.time_range,
        location: card.location,
        exact_meeting_spot: card.exact_meeting_spot,
        participants: card.participants,
        max_participants: card.max_participants,
        notes: card.notes,
        comments: card
            .comments
            .into_iter()
            .map(|comment| CommentItem {
                initial: comment_initial(&comment.user).to_string(),
                user: comment.user,
                text: comment.text,
            })
            .collect(),
        is_joined: card.is_joined,
        is_saved: card.is_saved,
        is_host: card.is_host,
        is_live: card.is_live,
        is_full: card.is_full,
        can_delete: card.can_delete,
        capacity_label: card.capacity_label,
        participants_label: card.participants_label,
    }
}
