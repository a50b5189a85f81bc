// storefront/model/mod.rs - Shared data models for the storefront
//
// These structs are used throughout the crate for type-safe communication
// between the filter controls, the search orchestrator and the backend.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 48;

/// Gift-giving context used as a filter dimension
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occasion {
    WeddingReturn, // 結婚内祝い
    BabyReturn,    // 出産内祝い
    FuneralReturn, // 香典返し
    NewHome,       // 新築内祝い
    Recovery,      // 快気祝い
}

impl Occasion {
    pub const ALL: [Occasion; 5] = [
        Occasion::WeddingReturn,
        Occasion::BabyReturn,
        Occasion::FuneralReturn,
        Occasion::NewHome,
        Occasion::Recovery,
    ];

    /// Wire code used in query strings and backend requests
    pub fn as_str(&self) -> &'static str {
        match self {
            Occasion::WeddingReturn => "wedding_return",
            Occasion::BabyReturn => "baby_return",
            Occasion::FuneralReturn => "funeral_return",
            Occasion::NewHome => "new_home",
            Occasion::Recovery => "recovery",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Occasion::WeddingReturn => "結婚内祝い",
            Occasion::BabyReturn => "出産内祝い",
            Occasion::FuneralReturn => "香典返し",
            Occasion::NewHome => "新築内祝い",
            Occasion::Recovery => "快気祝い",
        }
    }
}

impl std::fmt::Display for Occasion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a code is not part of a closed filter enum
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} code: {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: String,
}

impl FromStr for Occasion {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Occasion::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| UnknownCode {
                kind: "occasion",
                code: s.to_string(),
            })
    }
}

/// Product genre family used as the third filter row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenreGroup {
    Food,
    Drink,
    Home,
    Catalog,
    Craft,
}

impl GenreGroup {
    pub const ALL: [GenreGroup; 5] = [
        GenreGroup::Food,
        GenreGroup::Drink,
        GenreGroup::Home,
        GenreGroup::Catalog,
        GenreGroup::Craft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenreGroup::Food => "food",
            GenreGroup::Drink => "drink",
            GenreGroup::Home => "home",
            GenreGroup::Catalog => "catalog",
            GenreGroup::Craft => "craft",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GenreGroup::Food => "食品・スイーツ",
            GenreGroup::Drink => "飲料",
            GenreGroup::Home => "生活雑貨・日用品",
            GenreGroup::Catalog => "カタログギフト等",
            GenreGroup::Craft => "工芸・伝統雑貨",
        }
    }
}

impl std::fmt::Display for GenreGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenreGroup {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GenreGroup::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownCode {
                kind: "genre_group",
                code: s.to_string(),
            })
    }
}

/// Sort keys understood by the search backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    #[serde(rename = "updated_at:desc")]
    UpdatedDesc,
    #[serde(rename = "price:asc")]
    PriceAsc,
    #[serde(rename = "price:desc")]
    PriceDesc,
    #[serde(rename = "review_count:desc")]
    ReviewCountDesc,
    #[serde(rename = "review_average:desc")]
    ReviewAverageDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::UpdatedDesc,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::ReviewCountDesc,
        SortKey::ReviewAverageDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::UpdatedDesc => "updated_at:desc",
            SortKey::PriceAsc => "price:asc",
            SortKey::PriceDesc => "price:desc",
            SortKey::ReviewCountDesc => "review_count:desc",
            SortKey::ReviewAverageDesc => "review_average:desc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::UpdatedDesc => "新着順",
            SortKey::PriceAsc => "価格の安い順",
            SortKey::PriceDesc => "価格の高い順",
            SortKey::ReviewCountDesc => "レビュー件数順",
            SortKey::ReviewAverageDesc => "レビュー評価順",
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownCode {
                kind: "sort",
                code: s.to_string(),
            })
    }
}

/// A selectable price band (whole yen, bounds inclusive)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PriceBand {
    pub key: &'static str,
    pub label: &'static str,
    pub min: Option<u32>,
    pub max: Option<u32>,
}

pub static PRICE_BANDS: [PriceBand; 4] = [
    PriceBand {
        key: "under3000",
        label: "〜3,000円",
        min: None,
        max: Some(3000),
    },
    PriceBand {
        key: "3000-5000",
        label: "3,001〜5,000円",
        min: Some(3001),
        max: Some(5000),
    },
    PriceBand {
        key: "5000-10000",
        label: "5,001〜10,000円",
        min: Some(5001),
        max: Some(10000),
    },
    PriceBand {
        key: "over10000",
        label: "10,000円〜",
        min: Some(10000),
        max: None,
    },
];

impl PriceBand {
    pub fn find(key: &str) -> Option<&'static PriceBand> {
        PRICE_BANDS.iter().find(|band| band.key == key)
    }

    /// A band is active only when both bounds match exactly
    pub fn matches(&self, price_min: Option<u32>, price_max: Option<u32>) -> bool {
        self.min == price_min && self.max == price_max
    }

    /// The band describing the given bounds, if any
    pub fn active(price_min: Option<u32>, price_max: Option<u32>) -> Option<&'static PriceBand> {
        PRICE_BANDS
            .iter()
            .find(|band| band.matches(price_min, price_max))
    }
}

/// The set of named, independent filter values behind a search
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub query: String,
    pub occasion: Option<Occasion>,
    pub price_min: Option<u32>,
    pub price_max: Option<u32>,
    #[serde(default)]
    pub genre_group: Option<GenreGroup>,
    pub sort: SortKey,
    pub offset: u32,
}

impl FilterState {
    /// No keyword and no narrowing filter: nothing worth searching for
    pub fn is_trivial(&self) -> bool {
        self.query.trim().is_empty()
            && self.occasion.is_none()
            && self.price_min.is_none()
            && self.price_max.is_none()
            && self.genre_group.is_none()
    }

    /// Restores `price_min <= price_max` by swapping inverted bounds
    pub fn normalized(mut self) -> Self {
        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            if min > max {
                self.price_min = Some(max);
                self.price_max = Some(min);
            }
        }
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Backend request; a keyword search is always an exact phrase match
    pub fn to_request(&self, limit: u32) -> SearchRequest {
        let q = self.query.trim().to_string();
        SearchRequest {
            exact_match: !q.is_empty(),
            q,
            occasion: self.occasion,
            price_min: self.price_min,
            price_max: self.price_max,
            genre_group: self.genre_group,
            sort: self.sort,
            limit,
            offset: self.offset,
        }
    }
}

/// Parameters of one call to the search backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub q: String,
    pub occasion: Option<Occasion>,
    pub price_min: Option<u32>,
    pub price_max: Option<u32>,
    #[serde(default)]
    pub genre_group: Option<GenreGroup>,
    pub sort: SortKey,
    #[serde(default)]
    pub exact_match: bool,
    pub limit: u32,
    pub offset: u32,
}

impl SearchRequest {
    /// Query parameters in wire order; unset filters are omitted
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(9);
        if !self.q.is_empty() {
            pairs.push(("q", self.q.clone()));
        }
        if let Some(occasion) = self.occasion {
            pairs.push(("occasion", occasion.as_str().to_string()));
        }
        if let Some(min) = self.price_min {
            pairs.push(("price_min", min.to_string()));
        }
        if let Some(max) = self.price_max {
            pairs.push(("price_max", max.to_string()));
        }
        if let Some(genre) = self.genre_group {
            pairs.push(("genre_group", genre.as_str().to_string()));
        }
        pairs.push(("sort", self.sort.as_str().to_string()));
        if self.exact_match {
            pairs.push(("exact_match", "true".to_string()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("offset", self.offset.to_string()));
        pairs
    }
}

/// Gift product from the external catalog (read-only projection)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: u32,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub merchant: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub affiliate_url: String,
    #[serde(default)]
    pub occasion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occasions: Option<Vec<String>>,
    /// Unix timestamp in seconds
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_average: Option<f64>,
}

impl Product {
    /// Primary occasion followed by any extra tags, without duplicates
    pub fn occasion_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        let extra = self.occasions.iter().flatten().map(String::as_str);
        for tag in std::iter::once(self.occasion.as_str()).chain(extra) {
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    /// Outbound merchant link, preferring the affiliate URL
    pub fn link_out(&self) -> &str {
        if self.affiliate_url.is_empty() {
            &self.url
        } else {
            &self.affiliate_url
        }
    }
}

/// Response envelope of one search
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub total: u64,
    #[serde(rename = "hits")]
    pub items: Vec<Product>,
    #[serde(rename = "query", default)]
    pub applied_query: String,
    #[serde(default)]
    pub processing_time_ms: u64,
    pub limit: u32,
    pub offset: u32,
}

impl SearchResult {
    pub fn empty(query: impl Into<String>, limit: u32, offset: u32) -> Self {
        Self {
            total: 0,
            items: Vec::new(),
            applied_query: query.into(),
            processing_time_ms: 0,
            limit,
            offset,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_more(&self) -> bool {
        (self.offset as u64 + self.items.len() as u64) < self.total
    }

    pub fn next_offset(&self) -> Option<u32> {
        self.has_more()
            .then(|| self.offset.checked_add(self.limit))
            .flatten()
    }

    pub fn page_count(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit as u64)
    }
}

/// Body of an AI consultation request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AiRecommendRequest {
    pub user_input: String,
}

/// Product suggested by the AI collaborator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AiRecommendation {
    pub id: String,
    pub title: String,
    pub price: u32,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub merchant: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub affiliate_url: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub occasion: Option<String>,
    #[serde(default)]
    pub occasions: Option<Vec<String>>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub review_average: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

/// Intent the AI collaborator extracted from free text
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserIntent {
    pub occasion: Option<String>,
    pub target_age: Option<String>,
    pub target_relationship: Option<String>,
    pub budget_min: Option<u32>,
    pub budget_max: Option<u32>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub gender: Option<String>,
    pub urgency: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AiRecommendResponse {
    #[serde(default)]
    pub recommendations: Vec<AiRecommendation>,
    #[serde(default)]
    pub user_intent: Option<UserIntent>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub ai_response: Option<String>,
}
