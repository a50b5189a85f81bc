// storefront/api/handlers.rs - JSON storefront endpoints
//
// Thin actix-web layer over the library: the search endpoint reads the
// location exactly as the synchronizer does, and the location endpoint
// lets a client apply filter writes with the same canonicalization rules.

use std::collections::BTreeMap;
use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::GiftBackend;
use crate::storefront::format::{validate_price, validate_search_query, ValidationError};
use crate::storefront::model::{
    AiRecommendRequest, FilterState, GenreGroup, Occasion, PriceBand, SearchResult, SortKey, PRICE_BANDS,
};
use crate::storefront::orchestrator::SEARCH_FAILED_MESSAGE;
use crate::storefront::query_state::{keys, FilterContext, QueryState, Update};

/// Shared handler state
pub struct AppState {
    pub backend: Arc<dyn GiftBackend>,
    pub page_size: u32,
}

impl AppState {
    pub fn new(backend: Arc<dyn GiftBackend>, page_size: u32) -> Self {
        Self { backend, page_size }
    }
}

/// Register every storefront route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .service(
            web::scope("/api")
                .route("/search", web::get().to(search))
                .route("/location", web::post().to(location))
                .route("/ai/recommend", web::post().to(recommend))
                .route("/filters", web::get().to(filters)),
        );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn search(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let location = QueryState::from_parts(req.path(), req.query_string());
    let filters = location.filter_state();

    if filters.is_trivial() {
        tracing::debug!("Search without filters, returning empty envelope");
        return HttpResponse::Ok().json(SearchResult::empty("", state.page_size, filters.offset));
    }

    let request = filters.to_request(state.page_size);
    match state.backend.search(&request).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => {
            tracing::error!(error = %e, "Search endpoint failed");
            HttpResponse::BadGateway().json(json!({ "error": SEARCH_FAILED_MESSAGE }))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub href: String,
    #[serde(default)]
    pub updates: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub toggle_band: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LocationResponse {
    pub href: String,
    pub filters: FilterState,
    pub changed: bool,
    pub active_band: Option<String>,
}

async fn location(body: web::Json<LocationRequest>) -> HttpResponse {
    let body = body.into_inner();
    let context = FilterContext::parse(&body.href);

    let updates: Vec<Update> = body
        .updates
        .into_iter()
        .map(|(key, value)| {
            let value = sanitize(&key, value);
            Update::new(key, value)
        })
        .collect();
    let mut changed = context.update(&updates);

    if let Some(code) = body.toggle_band.as_deref() {
        let Some(band) = PriceBand::find(code) else {
            return HttpResponse::BadRequest()
                .json(json!({ "error": format!("unknown price band: {code}") }));
        };
        let before = context.href();
        context.toggle_price_band(band);
        changed |= context.href() != before;
    }

    let filters = context.filter_state();
    HttpResponse::Ok().json(LocationResponse {
        href: context.href(),
        active_band: PriceBand::active(filters.price_min, filters.price_max)
            .map(|band| band.key.to_string()),
        filters,
        changed,
    })
}

/// Invalid field input falls back to "unset" instead of failing the write
fn sanitize(key: &str, value: Option<String>) -> Option<String> {
    let value = value?;
    match key {
        keys::PRICE_MIN | keys::PRICE_MAX => match validate_price(&value) {
            Ok(price) => price.map(|p| p.to_string()),
            Err(e) => {
                tracing::debug!(key, value = %value, error = %e, "Dropping invalid price");
                None
            }
        },
        keys::QUERY => match validate_search_query(&value) {
            Err(ValidationError::ForbiddenPattern) => None,
            _ => Some(value),
        },
        _ => Some(value),
    }
}

async fn recommend(body: web::Json<AiRecommendRequest>, state: web::Data<AppState>) -> HttpResponse {
    let input = body.user_input.trim();
    if input.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "error": ValidationError::EmptyQuery.to_string() }));
    }
    HttpResponse::Ok().json(state.backend.recommend_or_empty(input).await)
}

#[derive(Debug, Serialize)]
struct Choice {
    code: &'static str,
    label: &'static str,
}

async fn filters() -> HttpResponse {
    let occasions: Vec<Choice> = Occasion::ALL
        .iter()
        .map(|o| Choice {
            code: o.as_str(),
            label: o.label(),
        })
        .collect();
    let sorts: Vec<Choice> = SortKey::ALL
        .iter()
        .map(|s| Choice {
            code: s.as_str(),
            label: s.label(),
        })
        .collect();
    let genre_groups: Vec<Choice> = GenreGroup::ALL
        .iter()
        .map(|g| Choice {
            code: g.as_str(),
            label: g.label(),
        })
        .collect();

    HttpResponse::Ok().json(json!({
        "occasions": occasions,
        "sorts": sorts,
        "genre_groups": genre_groups,
        "price_bands": PRICE_BANDS,
        "default_sort": SortKey::default().as_str(),
    }))
}
