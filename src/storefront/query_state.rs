// storefront/query_state.rs - Filter state <-> query string synchronization
//
// The serialized location (path plus a flat key -> string query) is the
// single source of truth for the filter values. `QueryState` holds the
// pure mapping rules; `FilterContext` is the shared handle that filter
// controls receive explicitly and write through.

use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::watch;
use url::form_urlencoded;

use crate::storefront::model::{FilterState, GenreGroup, Occasion, PriceBand, SortKey};

/// Recognized location keys
pub mod keys {
    pub const QUERY: &str = "q";
    pub const OCCASION: &str = "occasion";
    pub const PRICE_MIN: &str = "price_min";
    pub const PRICE_MAX: &str = "price_max";
    pub const GENRE_GROUP: &str = "genre_group";
    pub const SORT: &str = "sort";
    pub const OFFSET: &str = "offset";

    /// Declared default (string form) of a recognized key
    pub fn default_for(key: &str) -> Option<&'static str> {
        match key {
            QUERY | OCCASION | PRICE_MIN | PRICE_MAX | GENRE_GROUP => Some(""),
            SORT => Some("updated_at:desc"),
            OFFSET => Some("0"),
            _ => None,
        }
    }
}

/// One key of an atomic location write
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Update {
    key: String,
    value: Option<String>,
    default: Option<String>,
}

impl Update {
    /// Update with the declared default of `key` (if it is a recognized key)
    pub fn new(key: impl Into<String>, value: Option<impl ToString>) -> Self {
        let key = key.into();
        let default = keys::default_for(&key).map(str::to_string);
        Self {
            key,
            value: value.map(|v| v.to_string()),
            default,
        }
    }

    pub fn with_default(mut self, default: impl ToString) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn remove(key: impl Into<String>) -> Self {
        Self::new(key, None::<String>)
    }

    pub fn query(text: &str) -> Self {
        Self::new(keys::QUERY, Some(text))
    }

    pub fn occasion(occasion: Option<Occasion>) -> Self {
        Self::new(keys::OCCASION, occasion.map(|o| o.as_str()))
    }

    pub fn price_min(min: Option<u32>) -> Self {
        Self::new(keys::PRICE_MIN, min)
    }

    pub fn price_max(max: Option<u32>) -> Self {
        Self::new(keys::PRICE_MAX, max)
    }

    pub fn genre_group(genre: Option<GenreGroup>) -> Self {
        Self::new(keys::GENRE_GROUP, genre.map(|g| g.as_str()))
    }

    pub fn sort(sort: SortKey) -> Self {
        Self::new(keys::SORT, Some(sort.as_str()))
    }

    pub fn offset(offset: u32) -> Self {
        Self::new(keys::OFFSET, Some(offset))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The value to store, or `None` when the key must be dropped
    fn effective_value(&self) -> Option<&str> {
        match self.value.as_deref() {
            None | Some("") => None,
            Some(v) if self.default.as_deref() == Some(v) => None,
            Some(v) => Some(v),
        }
    }
}

/// Whether a location write should keep the current scroll position
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollBehavior {
    #[default]
    Preserve,
    Reset,
}

/// Serialized location: a path and ordered, unique query keys
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryState {
    path: String,
    params: Vec<(String, String)>,
}

impl QueryState {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    /// Parse `path?query#fragment`; the fragment is ignored and later
    /// duplicates of a key lose to the first occurrence
    pub fn parse(href: &str) -> Self {
        let href = href.split_once('#').map_or(href, |(before, _)| before);
        let (path, query) = href.split_once('?').unwrap_or((href, ""));
        Self::from_parts(path, query)
    }

    pub fn from_parts(path: &str, query: &str) -> Self {
        let mut state = Self::new(if path.is_empty() { "/" } else { path });
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if state.get(&key).is_none() {
                state.params.push((key.into_owned(), value.into_owned()));
            }
        }
        state
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Numeric read; absent or unparsable values fall back to `default`
    pub fn get_int<T: FromStr>(&self, key: &str, default: T) -> T {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Typed view of every recognized key; unknown codes and malformed
    /// numbers read as the default for that filter
    pub fn filter_state(&self) -> FilterState {
        FilterState {
            query: self.get_str(keys::QUERY, "").to_string(),
            occasion: self.get_parsed(keys::OCCASION),
            price_min: self.get_parsed(keys::PRICE_MIN),
            price_max: self.get_parsed(keys::PRICE_MAX),
            genre_group: self.get_parsed(keys::GENRE_GROUP),
            sort: self.get_parsed(keys::SORT).unwrap_or_default(),
            offset: self.get_int(keys::OFFSET, 0),
        }
        .normalized()
    }

    /// Apply a batch of updates atomically. Any non-pagination update also
    /// clears `offset` (an explicit offset in the same batch still applies).
    /// Returns whether the serialization changed.
    pub fn apply(&mut self, updates: &[Update]) -> bool {
        let before = self.params.clone();

        if updates.iter().any(|u| u.key != keys::OFFSET) {
            self.delete(keys::OFFSET);
        }
        for update in updates {
            match update.effective_value() {
                Some(value) => self.set(&update.key, value),
                None => self.delete(&update.key),
            }
        }

        self.params != before
    }

    fn set(&mut self, key: &str, value: &str) {
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.params.push((key.to_string(), value.to_string())),
        }
    }

    fn delete(&mut self, key: &str) {
        self.params.retain(|(k, _)| k != key);
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }

    /// `path?query`, or just the path when no key is set
    pub fn to_href(&self) -> String {
        if self.params.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.to_query_string())
        }
    }
}

impl std::fmt::Display for QueryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_href())
    }
}

/// How the current location came about
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LocationChange {
    /// A filter control wrote through the context
    #[default]
    Edit,
    /// Back/forward replaced the whole location
    Navigate,
}

/// Current location as published to subscribers
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub state: QueryState,
    pub scroll: ScrollBehavior,
    pub change: LocationChange,
}

/// Shared filter context handed to every filter control.
///
/// Cloning is cheap; all clones write the same location. Each write runs
/// under the channel's lock, so two controls updating different keys in
/// the same tick never lose each other's change.
#[derive(Clone, Debug)]
pub struct FilterContext {
    location: Arc<watch::Sender<Location>>,
}

impl FilterContext {
    pub fn new(state: QueryState) -> Self {
        let (tx, _rx) = watch::channel(Location {
            state,
            scroll: ScrollBehavior::Preserve,
            change: LocationChange::Edit,
        });
        Self {
            location: Arc::new(tx),
        }
    }

    pub fn parse(href: &str) -> Self {
        Self::new(QueryState::parse(href))
    }

    pub fn subscribe(&self) -> watch::Receiver<Location> {
        self.location.subscribe()
    }

    pub fn snapshot(&self) -> QueryState {
        self.location.borrow().state.clone()
    }

    pub fn filter_state(&self) -> FilterState {
        self.location.borrow().state.filter_state()
    }

    pub fn href(&self) -> String {
        self.location.borrow().state.to_href()
    }

    pub fn update(&self, updates: &[Update]) -> bool {
        self.update_with(updates, ScrollBehavior::Preserve)
    }

    /// Atomic multi-key write; subscribers are notified only on change
    pub fn update_with(&self, updates: &[Update], scroll: ScrollBehavior) -> bool {
        let changed = self.location.send_if_modified(|location| {
            let changed = location.state.apply(updates);
            if changed {
                location.scroll = scroll;
                location.change = LocationChange::Edit;
            }
            changed
        });
        self.trace_change(changed)
    }

    fn trace_change(&self, changed: bool) -> bool {
        if changed {
            tracing::debug!(href = %self.href(), "location updated");
        }
        changed
    }

    pub fn set_genre_group(&self, genre: Option<GenreGroup>) -> bool {
        self.update(&[Update::genre_group(genre)])
    }

    pub fn set_query(&self, text: &str) -> bool {
        self.update(&[Update::query(text)])
    }

    pub fn set_occasion(&self, occasion: Option<Occasion>) -> bool {
        self.update(&[Update::occasion(occasion)])
    }

    pub fn set_sort(&self, sort: SortKey) -> bool {
        self.update(&[Update::sort(sort)])
    }

    /// Writes both bounds together; inverted bounds are swapped
    pub fn set_price_range(&self, min: Option<u32>, max: Option<u32>) -> bool {
        let (min, max) = match (min, max) {
            (Some(lo), Some(hi)) if lo > hi => (Some(hi), Some(lo)),
            bounds => bounds,
        };
        self.update(&[Update::price_min(min), Update::price_max(max)])
    }

    /// Select `band`, or clear the price filter when it is already active.
    /// Returns whether the band is active afterwards.
    pub fn toggle_price_band(&self, band: &PriceBand) -> bool {
        let mut active = false;
        let changed = self.location.send_if_modified(|location| {
            let current = location.state.filter_state();
            let updates = if band.matches(current.price_min, current.price_max) {
                [Update::price_min(None), Update::price_max(None)]
            } else {
                active = true;
                [Update::price_min(band.min), Update::price_max(band.max)]
            };
            let changed = location.state.apply(&updates);
            if changed {
                location.scroll = ScrollBehavior::Preserve;
                location.change = LocationChange::Edit;
            }
            changed
        });
        self.trace_change(changed);
        active
    }

    /// Pagination write: keeps every other key and scrolls to the top
    pub fn set_offset(&self, offset: u32) -> bool {
        self.update_with(&[Update::offset(offset)], ScrollBehavior::Reset)
    }

    pub fn next_page(&self, limit: u32) -> bool {
        let offset = self.filter_state().offset;
        self.set_offset(offset.saturating_add(limit))
    }

    pub fn previous_page(&self, limit: u32) -> bool {
        let offset = self.filter_state().offset;
        self.set_offset(offset.saturating_sub(limit))
    }

    /// Drop keyword, occasion, price and genre filters; the sort order is kept
    pub fn clear(&self) -> bool {
        self.update(&[
            Update::query(""),
            Update::occasion(None),
            Update::price_min(None),
            Update::price_max(None),
            Update::genre_group(None),
        ])
    }

    /// Replace the whole location (back/forward navigation)
    pub fn navigate(&self, href: &str) -> bool {
        let next = QueryState::parse(href);
        let changed = self.location.send_if_modified(|location| {
            if location.state == next {
                return false;
            }
            location.state = next;
            location.scroll = ScrollBehavior::Preserve;
            location.change = LocationChange::Navigate;
            true
        });
        self.trace_change(changed)
    }
}

impl Default for FilterContext {
    fn default() -> Self {
        Self::new(QueryState::new("/search"))
    }
}
