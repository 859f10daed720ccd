//! Filter tokens, sort orders and tabs selectable by the feed UI.
//!
//! # Invariants
//! - Status and category tokens form two disjoint groups plus the `all`
//!   sentinel.
//! - String forms are kebab-case (`live-now`, `my-moves`) and parse
//!   case-insensitively.

use crate::model::move_record::{Category, MoveStatus};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const FILTER_PLACEHOLDER_LABEL: &str = "Filter by...";
const MAX_JOINED_LABELS: usize = 2;

/// Parse error for view configuration tokens coming from the UI boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewTokenError {
    UnknownFilter(String),
    UnknownSortOrder(String),
    UnknownTab(String),
}

impl Display for ViewTokenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFilter(value) => write!(
                f,
                "unknown filter `{value}`; expected all|live-now|upcoming|past|sports|study|social|food"
            ),
            Self::UnknownSortOrder(value) => {
                write!(f, "unknown sort order `{value}`; expected newest|popular")
            }
            Self::UnknownTab(value) => {
                write!(f, "unknown tab `{value}`; expected explore|saved|my-moves")
            }
        }
    }
}

impl Error for ViewTokenError {}

/// One selectable filter option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterToken {
    All,
    Status(MoveStatus),
    Category(Category),
}

impl FilterToken {
    /// Selectable options in dropdown order (`all` excluded).
    pub const OPTIONS: [FilterToken; 7] = [
        Self::Status(MoveStatus::LiveNow),
        Self::Status(MoveStatus::Upcoming),
        Self::Status(MoveStatus::Past),
        Self::Category(Category::Sports),
        Self::Category(Category::Study),
        Self::Category(Category::Social),
        Self::Category(Category::Food),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Status(MoveStatus::LiveNow) => "live-now",
            Self::Status(MoveStatus::Upcoming) => "upcoming",
            Self::Status(MoveStatus::Past) => "past",
            Self::Category(Category::Sports) => "sports",
            Self::Category(Category::Study) => "study",
            Self::Category(Category::Social) => "social",
            Self::Category(Category::Food) => "food",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Status(status) => status.label(),
            Self::Category(category) => category.label(),
        }
    }
}

impl FromStr for FilterToken {
    type Err = ViewTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized == "all" {
            return Ok(Self::All);
        }
        Self::OPTIONS
            .into_iter()
            .find(|token| token.as_str() == normalized)
            .ok_or_else(|| ViewTokenError::UnknownFilter(s.trim().to_string()))
    }
}

impl Display for FilterToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FilterToken {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FilterToken {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered multi-selection of filter tokens.
///
/// Starts as `[all]`, matching the feed's initial state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSelection {
    tokens: Vec<FilterToken>,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            tokens: vec![FilterToken::All],
        }
    }
}

impl FilterSelection {
    /// Builds a selection from tokens, dropping duplicates.
    pub fn from_tokens(tokens: impl IntoIterator<Item = FilterToken>) -> Self {
        let mut deduped = Vec::new();
        for token in tokens {
            if !deduped.contains(&token) {
                deduped.push(token);
            }
        }
        Self { tokens: deduped }
    }

    /// Parses kebab-case token strings.
    pub fn parse<I, S>(values: I) -> Result<Self, ViewTokenError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = values
            .into_iter()
            .map(|value| value.as_ref().parse::<FilterToken>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_tokens(tokens))
    }

    pub fn tokens(&self) -> &[FilterToken] {
        &self.tokens
    }

    pub fn contains(&self, token: FilterToken) -> bool {
        self.tokens.contains(&token)
    }

    /// Empty or containing `all`: every record passes.
    pub fn is_unconstrained(&self) -> bool {
        self.tokens.is_empty() || self.contains(FilterToken::All)
    }

    /// Applies one dropdown click.
    ///
    /// - `all` resets to `[all]`.
    /// - A selected token is removed (and `all` with it).
    /// - An unselected token replaces `all` and is appended.
    pub fn toggle(&mut self, token: FilterToken) {
        if token == FilterToken::All {
            self.tokens = vec![FilterToken::All];
            return;
        }
        let was_selected = self.contains(token);
        self.tokens
            .retain(|current| *current != token && *current != FilterToken::All);
        if !was_selected {
            self.tokens.push(token);
        }
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// Short summary for the dropdown button.
    pub fn display_label(&self) -> String {
        if self.is_unconstrained() {
            return FILTER_PLACEHOLDER_LABEL.to_string();
        }
        let labels = FilterToken::OPTIONS
            .into_iter()
            .filter(|option| self.contains(*option))
            .map(FilterToken::label)
            .collect::<Vec<_>>();
        if labels.len() > MAX_JOINED_LABELS {
            format!("{} selected", labels.len())
        } else {
            labels.join(", ")
        }
    }

    pub(crate) fn selected_statuses(&self) -> impl Iterator<Item = MoveStatus> + '_ {
        self.tokens.iter().filter_map(|token| match token {
            FilterToken::Status(status) => Some(*status),
            _ => None,
        })
    }

    pub(crate) fn selected_categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.tokens.iter().filter_map(|token| match token {
            FilterToken::Category(category) => Some(*category),
            _ => None,
        })
    }
}

/// Feed ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Most recently created first.
    #[default]
    Newest,
    /// Most participants first.
    Popular,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Popular => "popular",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::Popular => "Most Popular",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ViewTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "popular" => Ok(Self::Popular),
            _ => Err(ViewTokenError::UnknownSortOrder(s.trim().to_string())),
        }
    }
}

/// Mutually exclusive view scopes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    #[default]
    Explore,
    Saved,
    MyMoves,
}

impl Tab {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Explore => "explore",
            Self::Saved => "saved",
            Self::MyMoves => "my-moves",
        }
    }
}

impl FromStr for Tab {
    type Err = ViewTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explore" => Ok(Self::Explore),
            "saved" => Ok(Self::Saved),
            "my-moves" => Ok(Self::MyMoves),
            _ => Err(ViewTokenError::UnknownTab(s.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterSelection, FilterToken, SortOrder, Tab, ViewTokenError};
    use crate::model::move_record::{Category, MoveStatus};

    #[test]
    fn tokens_parse_case_insensitively() {
        assert_eq!(
            " Live-Now ".parse::<FilterToken>().unwrap(),
            FilterToken::Status(MoveStatus::LiveNow)
        );
        assert_eq!(
            "FOOD".parse::<FilterToken>().unwrap(),
            FilterToken::Category(Category::Food)
        );
        assert_eq!(
            "nightlife".parse::<FilterToken>().unwrap_err(),
            ViewTokenError::UnknownFilter("nightlife".to_string())
        );
    }

    #[test]
    fn toggle_replaces_all_and_removes_selected_tokens() {
        let mut selection = FilterSelection::default();
        selection.toggle(FilterToken::Category(Category::Study));
        assert_eq!(
            selection.tokens(),
            &[FilterToken::Category(Category::Study)]
        );

        selection.toggle(FilterToken::Status(MoveStatus::Past));
        selection.toggle(FilterToken::Category(Category::Study));
        assert_eq!(selection.tokens(), &[FilterToken::Status(MoveStatus::Past)]);

        selection.toggle(FilterToken::All);
        assert_eq!(selection.tokens(), &[FilterToken::All]);
    }

    #[test]
    fn display_label_uses_canonical_order_and_collapses_long_lists() {
        let mut selection = FilterSelection::default();
        assert_eq!(selection.display_label(), "Filter by...");

        selection.toggle(FilterToken::Category(Category::Food));
        selection.toggle(FilterToken::Status(MoveStatus::LiveNow));
        assert_eq!(selection.display_label(), "Live Now, Food");

        selection.toggle(FilterToken::Category(Category::Sports));
        assert_eq!(selection.display_label(), "3 selected");

        selection.clear();
        assert_eq!(selection.display_label(), "Filter by...");
    }

    #[test]
    fn sort_and_tab_parse_kebab_case() {
        assert_eq!("popular".parse::<SortOrder>().unwrap(), SortOrder::Popular);
        assert_eq!("MY-MOVES".parse::<Tab>().unwrap(), Tab::MyMoves);
        assert!("hot".parse::<SortOrder>().is_err());
        assert_eq!(
            serde_json::to_value(Tab::MyMoves).unwrap(),
            serde_json::json!("my-moves")
        );
    }

    #[test]
    fn selection_serializes_as_token_strings() {
        let selection = FilterSelection::parse(["sports", "upcoming", "sports"]).unwrap();
        assert_eq!(selection.tokens().len(), 2);
        assert_eq!(
            serde_json::to_value(&selection).unwrap(),
            serde_json::json!(["sports", "upcoming"])
        );
    }
}
