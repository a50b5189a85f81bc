// orchestrator_tests.rs - Search state machine over the fixture catalog
//
// The orchestrator is driven by hand here: tickets are resolved in an
// explicit order to cover every arrival order of concurrent responses.

use uchigift::fixtures::sample_result;
use uchigift::storefront::api::ApiError;
use uchigift::storefront::model::{FilterState, Occasion, SortKey};
use uchigift::storefront::orchestrator::{SearchOrchestrator, SearchState, SEARCH_FAILED_MESSAGE};
use uchigift::storefront::query_state::QueryState;

fn filters(href: &str) -> FilterState {
    QueryState::parse(href).filter_state()
}

#[test]
fn test_keyword_search_succeeds() {
    let mut orchestrator = SearchOrchestrator::default();
    let ticket = orchestrator
        .submit(&filters("/search?q=タオル&sort=price%3Aasc"))
        .expect("non-trivial filters issue a request");

    assert_eq!(ticket.request.q, "タオル");
    assert_eq!(ticket.request.sort, SortKey::PriceAsc);
    assert_eq!(ticket.request.limit, 48);
    assert_eq!(ticket.request.offset, 0);
    assert!(orchestrator.state().is_loading());

    assert!(orchestrator.resolve(ticket.generation, Ok(sample_result(&ticket.request))));
    let result = orchestrator.state().result().unwrap();
    assert_eq!(result.total, 2);
    assert_eq!(result.applied_query, "タオル");
}

#[test]
fn test_occasion_only_search_is_issued() {
    let mut orchestrator = SearchOrchestrator::default();
    let ticket = orchestrator.submit(&filters("/search?occasion=funeral_return")).unwrap();
    assert_eq!(ticket.request.q, "");
    assert_eq!(ticket.request.occasion, Some(Occasion::FuneralReturn));
}

#[test]
fn test_latest_request_wins_when_older_response_arrives_last() {
    let mut orchestrator = SearchOrchestrator::default();
    let older = orchestrator.submit(&filters("/search?q=タオル")).unwrap();
    let newer = orchestrator.submit(&filters("/search?q=ソープ")).unwrap();

    assert!(orchestrator.resolve(newer.generation, Ok(sample_result(&newer.request))));
    assert!(!orchestrator.resolve(older.generation, Ok(sample_result(&older.request))));

    assert_eq!(orchestrator.state().result().unwrap().applied_query, "ソープ");
}

#[test]
fn test_latest_request_wins_when_older_response_arrives_first() {
    let mut orchestrator = SearchOrchestrator::default();
    let older = orchestrator.submit(&filters("/search?q=タオル")).unwrap();
    let newer = orchestrator.submit(&filters("/search?q=ソープ")).unwrap();

    assert!(!orchestrator.resolve(older.generation, Ok(sample_result(&older.request))));
    assert!(orchestrator.state().is_loading());

    assert!(orchestrator.resolve(newer.generation, Ok(sample_result(&newer.request))));
    assert_eq!(orchestrator.state().result().unwrap().applied_query, "ソープ");
}

#[test]
fn test_stale_failure_is_ignored() {
    let mut orchestrator = SearchOrchestrator::default();
    let older = orchestrator.submit(&filters("/search?q=タオル")).unwrap();
    let newer = orchestrator.submit(&filters("/search?q=ソープ")).unwrap();

    orchestrator.resolve(newer.generation, Ok(sample_result(&newer.request)));
    orchestrator.resolve(older.generation, Err(ApiError::Timeout));
    assert!(orchestrator.state().error().is_none());
}

#[test]
fn test_failure_then_retry_reissues_identical_request() {
    let mut orchestrator = SearchOrchestrator::default();
    let first = orchestrator.submit(&filters("/search?q=タオル&occasion=wedding_return")).unwrap();
    orchestrator.resolve(
        first.generation,
        Err(ApiError::Status {
            status: 500,
            body: "boom".to_string(),
        }),
    );
    assert_eq!(
        orchestrator.state(),
        &SearchState::Failed(SEARCH_FAILED_MESSAGE.to_string())
    );

    // Resubmitting the same filters does not retry on its own
    assert!(orchestrator
        .submit(&filters("/search?q=タオル&occasion=wedding_return"))
        .is_none());

    let retry = orchestrator.retry().unwrap();
    assert_eq!(retry.request, first.request);
    assert!(retry.generation > first.generation);
    assert!(orchestrator.resolve(retry.generation, Ok(sample_result(&retry.request))));
    assert_eq!(orchestrator.state().result().unwrap().total, 1);
}

#[test]
fn test_clearing_filters_abandons_in_flight_request() {
    let mut orchestrator = SearchOrchestrator::default();
    let ticket = orchestrator.submit(&filters("/search?q=タオル")).unwrap();

    assert!(orchestrator.submit(&filters("/search")).is_none());
    assert_eq!(orchestrator.state(), &SearchState::Idle);

    assert!(!orchestrator.resolve(ticket.generation, Ok(sample_result(&ticket.request))));
    assert_eq!(orchestrator.state(), &SearchState::Idle);

    // The same keyword again is a fresh request, not a duplicate
    assert!(orchestrator.submit(&filters("/search?q=タオル")).is_some());
}

#[test]
fn test_whitespace_query_is_trivial() {
    let mut orchestrator = SearchOrchestrator::default();
    assert!(orchestrator.submit(&filters("/search?q=+++")).is_none());
    assert_eq!(orchestrator.state(), &SearchState::Idle);
}

#[test]
fn test_pagination_issues_new_offset() {
    let mut orchestrator = SearchOrchestrator::new(2);
    let first = orchestrator.submit(&filters("/search?price_min=1000")).unwrap();
    orchestrator.resolve(first.generation, Ok(sample_result(&first.request)));
    let result = orchestrator.state().result().unwrap();
    assert_eq!(result.total, 6);
    assert_eq!(result.next_offset(), Some(2));

    let next = orchestrator.submit(&filters("/search?price_min=1000&offset=2")).unwrap();
    assert_eq!(next.request.offset, 2);
    assert_eq!(next.request.limit, 2);
}

#[test]
fn test_empty_result_is_success_with_notice() {
    let mut orchestrator = SearchOrchestrator::default();
    let ticket = orchestrator.submit(&filters("/search?q=存在しない商品")).unwrap();
    orchestrator.resolve(ticket.generation, Ok(sample_result(&ticket.request)));

    let state = orchestrator.state();
    assert!(state.result().unwrap().is_empty());
    assert!(state.error().is_none());
    assert!(state.notice().is_some());
}
