//! Feed projection: search, filter, sort and tab scoping.
//!
//! # Responsibility
//! - Derive the ordered list of moves to render from the full collection and
//!   the current view configuration.
//!
//! # Invariants
//! - Pure and deterministic; records are never mutated.
//! - Sorting is stable, so ties keep the underlying collection order.
//! - Absent or empty inputs mean "no constraint", never an error.

use crate::model::actor::ActorId;
use crate::model::move_record::Move;
use crate::view::filter::{FilterSelection, SortOrder, Tab};
use serde::{Deserialize, Serialize};

/// Everything the feed UI sends back on interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewConfig {
    pub search_term: String,
    pub filters: FilterSelection,
    pub sort: SortOrder,
    pub tab: Tab,
}

/// Projects `records` into the render-ready sequence for `viewer`.
///
/// Order of stages: search + filter, then sort, then tab scoping.
pub fn project<'a>(records: &'a [Move], viewer: &ActorId, config: &ViewConfig) -> Vec<&'a Move> {
    let needle = config.search_term.to_lowercase();
    let mut visible = records
        .iter()
        .filter(|record| matches_search(record, &needle) && matches_filters(record, &config.filters))
        .collect::<Vec<_>>();

    sort_moves(&mut visible, config.sort);

    visible.retain(|record| matches_tab(record, viewer, config.tab));
    visible
}

/// Case-insensitive substring match against title or location.
///
/// `needle` must already be lowercased. The empty needle matches everything.
pub fn matches_search(record: &Move, needle: &str) -> bool {
    needle.is_empty()
        || record.title.to_lowercase().contains(needle)
        || record.location.to_lowercase().contains(needle)
}

/// Status tokens OR together, category tokens OR together, groups AND.
pub fn matches_filters(record: &Move, filters: &FilterSelection) -> bool {
    if filters.is_unconstrained() {
        return true;
    }

    let mut statuses = filters.selected_statuses().peekable();
    let status_ok = statuses.peek().is_none() || statuses.any(|status| status == record.status);

    let mut categories = filters.selected_categories().peekable();
    let category_ok =
        categories.peek().is_none() || categories.any(|category| category == record.category);

    status_ok && category_ok
}

pub fn matches_tab(record: &Move, viewer: &ActorId, tab: Tab) -> bool {
    match tab {
        Tab::Explore => true,
        Tab::Saved => record.is_saved_by(viewer),
        Tab::MyMoves => record.is_joined_by(viewer),
    }
}

/// Stable in-place sort.
pub fn sort_moves(records: &mut [&Move], order: SortOrder) {
    match order {
        SortOrder::Newest => records.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Popular => records.sort_by(|a, b| b.participants.cmp(&a.participants)),
    }
}
