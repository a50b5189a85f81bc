// storefront/orchestrator.rs - Search state machine and its async driver
//
// `SearchOrchestrator` is the synchronous core: it decides when a filter
// change turns into a request and which completion may update the state.
// Every issued request gets a generation number; only a completion
// carrying the latest generation is applied, so the visible state always
// belongs to the most recent filter set whatever order responses arrive in.
//
// `SearchSession` wires a `FilterContext`, the query `Debouncer` and the
// orchestrator together on a tokio task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::storefront::api::{ApiError, GiftBackend};
use crate::storefront::debounce::{Debouncer, DEFAULT_SEARCH_DELAY};
use crate::storefront::model::{FilterState, SearchRequest, SearchResult, DEFAULT_PAGE_SIZE};
use crate::storefront::query_state::{FilterContext, Location, LocationChange};

/// Shown for every collaborator failure (transport, timeout, status, decode)
pub const SEARCH_FAILED_MESSAGE: &str = "検索中にエラーが発生しました。もう一度お試しください。";

/// Shown for a successful search without hits
pub const NO_RESULTS_MESSAGE: &str = "条件に一致する商品が見つかりませんでした。";

/// User-visible search state
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SearchState {
    /// Nothing to search for yet
    #[default]
    Idle,
    Loading {
        request: SearchRequest,
    },
    Succeeded(SearchResult),
    Failed(String),
}

impl SearchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SearchState::Loading { .. })
    }

    pub fn result(&self) -> Option<&SearchResult> {
        match self {
            SearchState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SearchState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Message for the results area, if the state calls for one
    pub fn notice(&self) -> Option<&str> {
        match self {
            SearchState::Succeeded(result) if result.is_empty() => Some(NO_RESULTS_MESSAGE),
            SearchState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// A request the caller must send; resolve it with its `generation`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchTicket {
    pub generation: u64,
    pub request: SearchRequest,
}

#[derive(Debug)]
pub struct SearchOrchestrator {
    state: SearchState,
    generation: u64,
    last_request: Option<SearchRequest>,
    page_size: u32,
}

impl SearchOrchestrator {
    pub fn new(page_size: u32) -> Self {
        Self {
            state: SearchState::Idle,
            generation: 0,
            last_request: None,
            page_size,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn last_request(&self) -> Option<&SearchRequest> {
        self.last_request.as_ref()
    }

    /// React to a new effective filter set.
    ///
    /// Returns a ticket when a request must be issued. An identical request
    /// that is already loading, shown or failed is not re-issued; failures
    /// are only retried through [`SearchOrchestrator::retry`].
    pub fn submit(&mut self, filters: &FilterState) -> Option<SearchTicket> {
        if filters.is_trivial() {
            if self.last_request.is_some() || self.state != SearchState::Idle {
                tracing::debug!("Filter set is empty, returning to idle");
            }
            self.abandon();
            return None;
        }

        let request = filters.to_request(self.page_size);
        if self.last_request.as_ref() == Some(&request) {
            return None;
        }
        Some(self.issue(request))
    }

    /// Re-issue the last request (user-initiated retry)
    pub fn retry(&mut self) -> Option<SearchTicket> {
        if matches!(self.state, SearchState::Idle) {
            return None;
        }
        let request = self.last_request.clone()?;
        Some(self.issue(request))
    }

    /// Apply a completion. Returns `false` (and changes nothing) when the
    /// ticket was superseded by a later request.
    pub fn resolve(&mut self, generation: u64, outcome: Result<SearchResult, ApiError>) -> bool {
        if generation != self.generation || !self.state.is_loading() {
            tracing::debug!(
                generation,
                current = self.generation,
                "Discarding stale search completion"
            );
            return false;
        }

        self.state = match outcome {
            Ok(result) => SearchState::Succeeded(result),
            Err(e) => {
                tracing::warn!(error = %e, "Search failed");
                SearchState::Failed(SEARCH_FAILED_MESSAGE.to_string())
            }
        };
        true
    }

    /// Lose interest in any in-flight request without reporting an error
    pub fn abandon(&mut self) {
        self.generation += 1;
        self.last_request = None;
        self.state = SearchState::Idle;
    }

    fn issue(&mut self, request: SearchRequest) -> SearchTicket {
        self.generation += 1;
        tracing::info!(
            generation = self.generation,
            q = %request.q,
            offset = request.offset,
            "Issuing search"
        );
        self.last_request = Some(request.clone());
        self.state = SearchState::Loading {
            request: request.clone(),
        };
        SearchTicket {
            generation: self.generation,
            request,
        }
    }
}

impl Default for SearchOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Timing and paging knobs of a session
#[derive(Clone, Copy, Debug)]
pub struct SessionOptions {
    pub debounce: Duration,
    pub page_size: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_SEARCH_DELAY,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug)]
enum SessionCommand {
    Retry,
    FlushQuery,
}

/// One page view's search: watches the filter context, debounces the
/// keyword and keeps at most one backend call alive.
pub struct SearchSession {
    context: FilterContext,
    state: watch::Receiver<SearchState>,
    commands: mpsc::UnboundedSender<SessionCommand>,
    cancel: CancellationToken,
    driver: Option<JoinHandle<()>>,
}

impl SearchSession {
    /// Spawn the driver task; must be called inside a tokio runtime
    pub fn spawn(context: FilterContext, backend: Arc<dyn GiftBackend>, options: SessionOptions) -> Self {
        let (state_tx, state_rx) = watch::channel(SearchState::Idle);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        // Subscribe before the task starts so no write can slip in unseen
        let location = context.subscribe();

        let driver = Driver {
            context: context.clone(),
            backend,
            debouncer: Debouncer::for_search(location.borrow().state.filter_state().query, options.debounce),
            orchestrator: SearchOrchestrator::new(options.page_size),
            state: state_tx,
            in_flight: None,
        };
        let handle = tokio::spawn(driver.run(location, commands_rx, cancel.clone()));

        Self {
            context,
            state: state_rx,
            commands: commands_tx,
            cancel,
            driver: Some(handle),
        }
    }

    pub fn context(&self) -> &FilterContext {
        &self.context
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.clone()
    }

    /// Re-issue the last search (e.g. the retry button after a failure)
    pub fn retry(&self) {
        let _ = self.commands.send(SessionCommand::Retry);
    }

    /// Search for the typed keyword now instead of after the quiet period
    pub fn submit_query(&self) {
        let _ = self.commands.send(SessionCommand::FlushQuery);
    }

    /// Stop the driver, dropping any in-flight request
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(driver) = self.driver.take() {
            let _ = driver.await;
        }
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

type Completion = (u64, Result<SearchResult, ApiError>);

struct Driver {
    context: FilterContext,
    backend: Arc<dyn GiftBackend>,
    debouncer: Debouncer<String>,
    orchestrator: SearchOrchestrator,
    state: watch::Sender<SearchState>,
    in_flight: Option<JoinHandle<()>>,
}

impl Driver {
    async fn run(
        mut self,
        mut location: watch::Receiver<Location>,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        cancel: CancellationToken,
    ) {
        let mut settled = self.debouncer.subscribe();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();

        // The location at mount time is the source of truth for the first search
        self.resubmit(&done_tx);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = location.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let (query, change) = {
                        let current = location.borrow_and_update();
                        (current.state.filter_state().query, current.change)
                    };
                    if change == LocationChange::Navigate {
                        // The restored location applies as a whole, keyword included
                        self.debouncer.set(query);
                        self.debouncer.flush();
                    } else {
                        let typed = self.debouncer.pending().unwrap_or_else(|| self.debouncer.settled());
                        // Other filters changing must not restart the quiet period
                        if query != typed {
                            self.debouncer.set(query);
                        }
                    }
                    self.resubmit(&done_tx);
                }
                changed = settled.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let _ = settled.borrow_and_update();
                    self.resubmit(&done_tx);
                }
                Some(command) = commands.recv() => match command {
                    SessionCommand::Retry => {
                        let ticket = self.orchestrator.retry();
                        self.dispatch(ticket, &done_tx);
                    }
                    SessionCommand::FlushQuery => {
                        // The location change carrying the text may not have been seen yet
                        self.debouncer.set(self.context.filter_state().query);
                        self.debouncer.flush();
                    }
                },
                Some((generation, outcome)) = done_rx.recv() => {
                    if self.orchestrator.resolve(generation, outcome) {
                        self.in_flight = None;
                    }
                }
            }
            self.publish();
        }

        self.debouncer.cancel();
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        self.orchestrator.abandon();
        tracing::debug!("Search session closed");
    }

    /// Debounced keyword plus the immediate value of every other filter
    fn effective_filters(&self) -> FilterState {
        self.context
            .filter_state()
            .with_query(self.debouncer.settled())
    }

    fn resubmit(&mut self, done_tx: &mpsc::UnboundedSender<Completion>) {
        let filters = self.effective_filters();
        let ticket = self.orchestrator.submit(&filters);
        if ticket.is_none() && !self.orchestrator.state().is_loading() {
            if let Some(task) = self.in_flight.take() {
                task.abort();
            }
        }
        self.dispatch(ticket, done_tx);
    }

    fn dispatch(&mut self, ticket: Option<SearchTicket>, done_tx: &mpsc::UnboundedSender<Completion>) {
        let Some(ticket) = ticket else {
            return;
        };
        // The superseded call could only produce a stale completion
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }

        let backend = Arc::clone(&self.backend);
        let done = done_tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = backend.search(&ticket.request).await;
            let _ = done.send((ticket.generation, outcome));
        }));
        self.publish();
    }

    fn publish(&self) {
        let next = self.orchestrator.state();
        self.state.send_if_modified(|current| {
            if *current == *next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
    }
}
