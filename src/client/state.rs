//! Table view state
//!
//! [`TableState`] is an immutable value: every transition consumes the current
//! state and returns the next one, together with a [`FetchRequest`] whenever the
//! record list has to be reloaded. Each request carries a sequence number and
//! only the response to the most recently issued request is ever applied, so a
//! slow earlier response cannot overwrite a newer filter or page.

use crate::model::{DrugView, Pagination, SortDirection, SortField, SortSpec};
use crate::services::{DrugListParams, DrugPage, TableConfig};

pub const INITIAL_LOAD_FAILED: &str = "Failed to load initial data";
pub const REFRESH_FAILED: &str = "Failed to load drug data";

const FALLBACK_PAGE_SIZE: u64 = 50;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadPhase {
    /// Configuration, companies or the first page are still loading
    Loading,
    Ready,
    /// A refinement fetch is in flight; the previous rows stay on screen
    Filtering,
    Error(String),
}

/// What the list endpoint is asked for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrugQuery {
    pub company: Option<String>,
    pub page: u64,
    pub page_size: u64,
    pub sort: SortSpec,
}

impl Default for DrugQuery {
    fn default() -> Self {
        Self {
            company: None,
            page: 1,
            page_size: FALLBACK_PAGE_SIZE,
            sort: SortSpec::default(),
        }
    }
}

impl DrugQuery {
    pub fn to_params(&self) -> DrugListParams {
        DrugListParams {
            company: self.company.clone(),
            page: Some(self.page.to_string()),
            limit: Some(self.page_size.to_string()),
            sort_by: Some(self.sort.field.as_str().to_string()),
            sort_order: Some(self.sort.direction.as_str().to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub query: DrugQuery,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableState {
    phase: LoadPhase,
    config: Option<TableConfig>,
    companies: Vec<String>,
    query: DrugQuery,
    drugs: Vec<DrugView>,
    pagination: Option<Pagination>,
    latest_seq: u64,
    loaded: bool,
}

impl Default for TableState {
    fn default() -> Self {
        Self::new()
    }
}

impl TableState {
    pub fn new() -> Self {
        Self {
            phase: LoadPhase::Loading,
            config: None,
            companies: Vec::new(),
            query: DrugQuery::default(),
            drugs: Vec::new(),
            pagination: None,
            latest_seq: 0,
            loaded: false,
        }
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn config(&self) -> Option<&TableConfig> {
        self.config.as_ref()
    }

    pub fn companies(&self) -> &[String] {
        &self.companies
    }

    pub fn query(&self) -> &DrugQuery {
        &self.query
    }

    pub fn drugs(&self) -> &[DrugView] {
        &self.drugs
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            LoadPhase::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.phase, LoadPhase::Loading | LoadPhase::Filtering)
    }

    /// Sequence number of the most recently issued request
    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    fn issue(mut self, phase: LoadPhase) -> (Self, Option<FetchRequest>) {
        self.latest_seq += 1;
        self.phase = phase;
        let request = FetchRequest {
            seq: self.latest_seq,
            query: self.query.clone(),
        };
        (self, Some(request))
    }

    /// Refinement fetch; ignored until configuration has arrived
    fn refine(self) -> (Self, Option<FetchRequest>) {
        if self.config.is_none() {
            return (self, None);
        }
        let phase = if self.loaded {
            LoadPhase::Filtering
        } else {
            LoadPhase::Loading
        };
        self.issue(phase)
    }

    /// Back to `Loading`, dropping everything but the request counter
    pub fn reset(self) -> Self {
        Self {
            latest_seq: self.latest_seq,
            ..Self::new()
        }
    }

    /// Configuration and company directory arrived: request the first page
    /// with the configured defaults.
    pub fn configured(
        mut self,
        config: TableConfig,
        companies: Vec<String>,
    ) -> (Self, Option<FetchRequest>) {
        self.query = DrugQuery {
            company: None,
            page: 1,
            page_size: config.pagination.default_page_size.max(1),
            sort: SortSpec {
                field: config.sorting.default_field,
                direction: config.sorting.default_direction,
            },
        };
        self.config = Some(config);
        self.companies = companies;
        self.issue(LoadPhase::Loading)
    }

    /// Configuration or company directory could not be fetched
    pub fn initial_load_failed(mut self) -> Self {
        self.phase = LoadPhase::Error(INITIAL_LOAD_FAILED.to_string());
        self
    }

    /// Select a company (or `None` for all companies); always restarts at page 1
    pub fn select_company(mut self, company: Option<String>) -> (Self, Option<FetchRequest>) {
        let company = company
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self.query.company = company;
        self.query.page = 1;
        self.refine()
    }

    pub fn clear_filter(self) -> (Self, Option<FetchRequest>) {
        self.select_company(None)
    }

    /// Filter by the company shown in the row numbered `sequential_id`, as a
    /// click on its company cell would. Unknown rows, or a company column that
    /// is not clickable, leave the state untouched.
    pub fn select_row_company(self, sequential_id: u64) -> (Self, Option<FetchRequest>) {
        let clickable = self
            .config
            .as_ref()
            .and_then(|config| config.column("company"))
            .map(|column| column.clickable)
            .unwrap_or(false);
        let company = self
            .drugs
            .iter()
            .find(|drug| drug.sequential_id == Some(sequential_id))
            .map(|drug| drug.company.clone());
        match company {
            Some(company) if clickable => self.select_company(Some(company)),
            _ => (self, None),
        }
    }

    /// Jump to `page`. Pages below 1, or beyond the last known page, are ignored.
    pub fn go_to_page(mut self, page: u64) -> (Self, Option<FetchRequest>) {
        let beyond_end = self
            .pagination
            .map(|p| p.total_pages > 0 && page > p.total_pages)
            .unwrap_or(false);
        if page < 1 || beyond_end {
            return (self, None);
        }
        self.query.page = page;
        self.refine()
    }

    pub fn next_page(self) -> (Self, Option<FetchRequest>) {
        let has_next = self.pagination.map(|p| p.has_next_page).unwrap_or(false);
        if !has_next {
            return (self, None);
        }
        let page = self.query.page + 1;
        self.go_to_page(page)
    }

    pub fn prev_page(self) -> (Self, Option<FetchRequest>) {
        if self.query.page <= 1 {
            return (self, None);
        }
        let page = self.query.page - 1;
        self.go_to_page(page)
    }

    pub fn change_page_size(mut self, page_size: u64) -> (Self, Option<FetchRequest>) {
        if page_size == 0 {
            return (self, None);
        }
        self.query.page_size = page_size;
        self.query.page = 1;
        self.refine()
    }

    /// Sort by a sortable column; restarts at page 1
    pub fn sort_by(mut self, field: SortField, direction: SortDirection) -> (Self, Option<FetchRequest>) {
        let sortable = self
            .config
            .as_ref()
            .and_then(|c| c.column(field.as_str()))
            .map(|c| c.sortable)
            .unwrap_or(false);
        if !sortable {
            return (self, None);
        }
        self.query.sort = SortSpec { field, direction };
        self.query.page = 1;
        self.refine()
    }

    /// Re-issue the current query unchanged
    pub fn refresh(self) -> (Self, Option<FetchRequest>) {
        self.refine()
    }

    /// Apply a page of results. Responses to superseded requests are dropped.
    pub fn apply_page(mut self, seq: u64, page: DrugPage) -> Self {
        if seq != self.latest_seq {
            return self;
        }
        self.drugs = page.drugs;
        self.pagination = Some(page.pagination);
        self.phase = LoadPhase::Ready;
        self.loaded = true;
        self
    }

    /// Record a failed fetch. Rows and the selected filter stay as they are.
    pub fn apply_failure(mut self, seq: u64) -> Self {
        if seq != self.latest_seq {
            return self;
        }
        let message = if self.loaded {
            REFRESH_FAILED
        } else {
            INITIAL_LOAD_FAILED
        };
        self.phase = LoadPhase::Error(message.to_string());
        self
    }

    /// Close the error banner; only possible once data has been shown
    pub fn dismiss_error(mut self) -> Self {
        if matches!(self.phase, LoadPhase::Error(_)) && self.loaded {
            self.phase = LoadPhase::Ready;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Drug;
    use crate::services::table_config;
    use chrono::{TimeZone, Utc};

    fn page(codes: &[&str], current_page: u64, total_count: u64, page_size: u64) -> DrugPage {
        let skip = (current_page - 1) * page_size;
        let drugs = codes
            .iter()
            .enumerate()
            .map(|(i, code)| {
                DrugView::ranked(
                    Drug {
                        id: i as i32 + 1,
                        code: code.to_string(),
                        generic_name: "g".to_string(),
                        brand_name: "b".to_string(),
                        company: "A".to_string(),
                        launch_date: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
                    },
                    skip + i as u64 + 1,
                )
            })
            .collect();
        DrugPage {
            drugs,
            pagination: Pagination::compute(current_page, page_size, total_count),
        }
    }

    fn ready_state() -> TableState {
        let (state, request) = TableState::new().configured(table_config(), vec!["A".into(), "B".into()]);
        let request = request.unwrap();
        state.apply_page(request.seq, page(&["D1", "D2"], 1, 200, 50))
    }

    #[test]
    fn configured_requests_first_page_with_defaults() {
        let (state, request) = TableState::new().configured(table_config(), vec![]);
        let request = request.unwrap();
        assert_eq!(state.phase(), &LoadPhase::Loading);
        assert_eq!(request.query.page, 1);
        assert_eq!(request.query.page_size, 50);
        assert_eq!(request.query.sort, SortSpec::default());
        assert_eq!(request.query.company, None);
    }

    #[test]
    fn first_page_makes_state_ready() {
        let state = ready_state();
        assert_eq!(state.phase(), &LoadPhase::Ready);
        assert_eq!(state.drugs().len(), 2);
        assert_eq!(state.pagination().unwrap().total_pages, 4);
    }

    #[test]
    fn refinements_before_configuration_are_ignored() {
        let (state, request) = TableState::new().select_company(Some("A".into()));
        assert!(request.is_none());
        assert_eq!(state.phase(), &LoadPhase::Loading);
    }

    #[test]
    fn company_change_resets_page_to_one() {
        let state = ready_state();
        let (state, request) = state.go_to_page(3);
        let state = state.apply_page(request.unwrap().seq, page(&["D101"], 3, 200, 50));
        assert_eq!(state.query().page, 3);

        let (state, request) = state.select_company(Some("B".into()));
        let request = request.unwrap();
        assert_eq!(request.query.page, 1);
        assert_eq!(request.query.company.as_deref(), Some("B"));
        assert_eq!(state.phase(), &LoadPhase::Filtering);
        // previous rows stay visible while filtering
        assert_eq!(state.drugs()[0].code, "D101");
    }

    #[test]
    fn clearing_filter_selects_all_companies() {
        let (state, _) = ready_state().go_to_page(2);
        let (state, _) = state.select_company(Some("A".into()));
        let (state, request) = state.clear_filter();
        assert_eq!(request.unwrap().query.company, None);
        assert_eq!(state.query().page, 1);
    }

    #[test]
    fn row_company_filters_from_page_one() {
        let (state, request) = ready_state().go_to_page(2);
        let state = state.apply_page(request.unwrap().seq, page(&["D51", "D52"], 2, 200, 50));

        let (state, request) = state.select_row_company(52);
        let query = request.unwrap().query;
        assert_eq!(query.company.as_deref(), Some("A"));
        assert_eq!(query.page, 1);
        assert_eq!(state.phase(), &LoadPhase::Filtering);

        let (_, request) = ready_state().select_row_company(99);
        assert!(request.is_none());
    }

    #[test]
    fn blank_company_means_no_filter() {
        let (_, request) = ready_state().select_company(Some("   ".into()));
        assert_eq!(request.unwrap().query.company, None);
    }

    #[test]
    fn page_change_keeps_filter_and_sort() {
        let (state, request) = ready_state().select_company(Some("A".into()));
        let state = state.apply_page(request.unwrap().seq, page(&["D1"], 1, 120, 50));

        let (_, request) = state.next_page();
        let query = request.unwrap().query;
        assert_eq!(query.page, 2);
        assert_eq!(query.company.as_deref(), Some("A"));
        assert_eq!(query.sort, SortSpec::default());
    }

    #[test]
    fn stale_responses_are_ignored() {
        let state = ready_state();
        let (state, first) = state.select_company(Some("A".into()));
        let (state, second) = state.select_company(Some("B".into()));
        let (first, second) = (first.unwrap(), second.unwrap());
        assert!(second.seq > first.seq);

        let state = state.apply_page(second.seq, page(&["B1"], 1, 1, 50));
        let state = state.apply_page(first.seq, page(&["A1", "A2"], 1, 2, 50));
        assert_eq!(state.drugs().len(), 1);
        assert_eq!(state.drugs()[0].code, "B1");
        assert_eq!(state.query().company.as_deref(), Some("B"));

        // a stale failure does not flip the phase either
        let state = state.apply_failure(first.seq);
        assert_eq!(state.phase(), &LoadPhase::Ready);
    }

    #[test]
    fn refinement_failure_keeps_rows_and_selection() {
        let (state, request) = ready_state().select_company(Some("B".into()));
        let state = state.apply_failure(request.unwrap().seq);

        assert_eq!(state.error_message(), Some(REFRESH_FAILED));
        assert_eq!(state.drugs().len(), 2);
        assert_eq!(state.query().company.as_deref(), Some("B"));

        let state = state.dismiss_error();
        assert_eq!(state.phase(), &LoadPhase::Ready);
    }

    #[test]
    fn initial_failures_report_initial_message() {
        let state = TableState::new().initial_load_failed();
        assert_eq!(state.error_message(), Some(INITIAL_LOAD_FAILED));
        assert!(state.drugs().is_empty());
        // nothing to fall back to, so the banner stays
        assert_eq!(state.dismiss_error().error_message(), Some(INITIAL_LOAD_FAILED));

        let (state, request) = TableState::new().configured(table_config(), vec![]);
        let state = state.apply_failure(request.unwrap().seq);
        assert_eq!(state.error_message(), Some(INITIAL_LOAD_FAILED));
    }

    #[test]
    fn page_navigation_respects_bounds() {
        let state = ready_state();
        let (state, request) = state.prev_page();
        assert!(request.is_none());
        let (state, request) = state.go_to_page(0);
        assert!(request.is_none());
        let (state, request) = state.go_to_page(5);
        assert!(request.is_none());
        let (_, request) = state.go_to_page(4);
        assert_eq!(request.unwrap().query.page, 4);
    }

    #[test]
    fn last_page_has_no_next() {
        let (state, request) = ready_state().go_to_page(4);
        let state = state.apply_page(request.unwrap().seq, page(&["D151"], 4, 200, 50));
        let (state, request) = state.next_page();
        assert!(request.is_none());
        let (_, request) = state.prev_page();
        assert_eq!(request.unwrap().query.page, 3);
    }

    #[test]
    fn page_size_and_sort_changes_restart_at_page_one() {
        let (state, request) = ready_state().go_to_page(2);
        let state = state.apply_page(request.unwrap().seq, page(&["D51"], 2, 200, 50));

        let (state, request) = state.change_page_size(25);
        let query = request.unwrap().query;
        assert_eq!((query.page, query.page_size), (1, 25));

        let (state, request) = state.sort_by(SortField::Code, SortDirection::Asc);
        let query = request.unwrap().query;
        assert_eq!(query.page, 1);
        assert_eq!(query.sort.field, SortField::Code);

        // generic name is hidden but sortable; display name is not a sort field
        let (_, request) = state.sort_by(SortField::GenericName, SortDirection::Desc);
        assert!(request.is_some());
    }

    #[test]
    fn query_params_use_wire_names() {
        let query = DrugQuery {
            company: Some("Cipla".into()),
            page: 3,
            page_size: 25,
            sort: SortSpec {
                field: SortField::Company,
                direction: SortDirection::Asc,
            },
        };
        let params = query.to_params();
        assert_eq!(params.page.as_deref(), Some("3"));
        assert_eq!(params.limit.as_deref(), Some("25"));
        assert_eq!(params.sort_by.as_deref(), Some("company"));
        assert_eq!(params.sort_order.as_deref(), Some("asc"));
    }
}
