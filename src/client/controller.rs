use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use super::api::{ClientResult, DrugApi};
use super::state::{FetchRequest, TableState};
use crate::model::{SortDirection, SortField};

/// Drives a [`TableState`] against a [`DrugApi`].
///
/// The lock is only held while a transition runs, never across a fetch, so
/// several user actions can be in flight at once; the state's sequence guard
/// decides which response wins.
pub struct TableController<A: DrugApi> {
    api: A,
    state: Mutex<TableState>,
}

impl<A: DrugApi> TableController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Mutex::new(TableState::new()),
        }
    }

    pub fn snapshot(&self) -> TableState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn transition<R>(&self, f: impl FnOnce(TableState) -> (TableState, R)) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let current = std::mem::take(&mut *guard);
        let (next, output) = f(current);
        *guard = next;
        output
    }

    /// Load configuration and companies concurrently, then the first page
    pub async fn initialize(&self) -> ClientResult<()> {
        self.transition(|state| (state.reset(), ()));

        let loaded = tokio::try_join!(self.api.fetch_config(), self.api.fetch_companies());
        let (config, companies) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("Initial load failed: {}", e);
                self.transition(|state| (state.initial_load_failed(), ()));
                return Err(e);
            }
        };

        let request = self.transition(|state| state.configured(config, companies));
        self.run(request).await
    }

    pub async fn select_company(&self, company: Option<String>) -> ClientResult<()> {
        let request = self.transition(|state| state.select_company(company));
        self.run(request).await
    }

    /// Filter by the company of the visible row numbered `sequential_id`
    pub async fn filter_by_row(&self, sequential_id: u64) -> ClientResult<()> {
        let request = self.transition(|state| state.select_row_company(sequential_id));
        self.run(request).await
    }

    pub async fn clear_filter(&self) -> ClientResult<()> {
        let request = self.transition(TableState::clear_filter);
        self.run(request).await
    }

    pub async fn go_to_page(&self, page: u64) -> ClientResult<()> {
        let request = self.transition(|state| state.go_to_page(page));
        self.run(request).await
    }

    pub async fn next_page(&self) -> ClientResult<()> {
        let request = self.transition(TableState::next_page);
        self.run(request).await
    }

    pub async fn prev_page(&self) -> ClientResult<()> {
        let request = self.transition(TableState::prev_page);
        self.run(request).await
    }

    pub async fn change_page_size(&self, page_size: u64) -> ClientResult<()> {
        let request = self.transition(|state| state.change_page_size(page_size));
        self.run(request).await
    }

    pub async fn sort_by(&self, field: SortField, direction: SortDirection) -> ClientResult<()> {
        let request = self.transition(|state| state.sort_by(field, direction));
        self.run(request).await
    }

    pub async fn refresh(&self) -> ClientResult<()> {
        let request = self.transition(TableState::refresh);
        self.run(request).await
    }

    pub fn dismiss_error(&self) {
        self.transition(|state| (state.dismiss_error(), ()));
    }

    async fn run(&self, request: Option<FetchRequest>) -> ClientResult<()> {
        let Some(FetchRequest { seq, query }) = request else {
            return Ok(());
        };
        debug!("Fetching drugs #{}: {:?}", seq, query);

        match self.api.fetch_drugs(&query).await {
            Ok(page) => {
                self.transition(|state| (state.apply_page(seq, page), ()));
                Ok(())
            }
            Err(e) => {
                warn!("Drug fetch #{} failed: {}", seq, e);
                self.transition(|state| (state.apply_failure(seq), ()));
                Err(e)
            }
        }
    }
}
