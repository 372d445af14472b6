//! Tests for incremental option loading.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rbac_api::ApiError;
use rbac_form::{
    DEFAULT_CREATE_VALUE, DynamicFormEngine, FieldDescriptor, FormMode, LoadError, LoadResponse,
    OptionLoader, OptionPage, PaginatedSelectConfig, PaginatedSelectState, SelectOutcome,
};
use rbac_model::SelectOption;
use serde_json::json;
use tokio::time::Instant;

type Call = (usize, usize, Option<String>);

/// Serves fixed pages and records every call.
#[derive(Default)]
struct FakeLoader {
    pages: HashMap<usize, OptionPage>,
    calls: Mutex<Vec<Call>>,
}

impl FakeLoader {
    fn with_page(mut self, page: usize, options: &[(&str, &str)], has_more: bool) -> Self {
        self.pages.insert(
            page,
            OptionPage {
                options: options
                    .iter()
                    .map(|(value, label)| SelectOption::new(*value, *label))
                    .collect(),
                has_more,
                total: None,
            },
        );
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OptionLoader for FakeLoader {
    async fn load_options(
        &self,
        page: usize,
        limit: usize,
        search: Option<&str>,
    ) -> Result<OptionPage, LoadError> {
        self.calls
            .lock()
            .unwrap()
            .push((page, limit, search.map(str::to_string)));
        Ok(self.pages.get(&page).cloned().unwrap_or_default())
    }
}

fn entity_loader() -> Arc<FakeLoader> {
    Arc::new(
        FakeLoader::default()
            .with_page(1, &[("A", "Alpha"), ("B", "Beta")], true)
            .with_page(2, &[("B", "Beta (renamed)"), ("C", "Gamma")], false),
    )
}

fn select_for(loader: Arc<FakeLoader>) -> PaginatedSelectState {
    let config = PaginatedSelectConfig::new(loader).allow_create("Create New Entity");
    PaginatedSelectState::new("entity_id", config)
}

fn values(state: &PaginatedSelectState) -> Vec<String> {
    state
        .options()
        .iter()
        .map(|o| o.value.as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn load_more_appends_without_duplicates() {
    let loader = entity_loader();
    let mut state = select_for(Arc::clone(&loader));

    let first = state.toggle(false).unwrap();
    assert_eq!((first.page, first.limit, first.search.clone()), (1, 10, None));
    assert!(state.is_loading());
    assert!(state.apply(first.execute(loader.as_ref()).await));
    assert!(state.has_more());
    assert_eq!(values(&state), ["A", "B"]);

    let second = state.load_more().unwrap();
    assert_eq!(second.page, 2);
    assert!(state.load_more().is_none(), "load_more while loading");
    assert!(state.apply(second.execute(loader.as_ref()).await));

    assert_eq!(values(&state), ["A", "B", "C"]);
    assert_eq!(state.options()[1].label, "Beta (renamed)");
    assert!(!state.has_more());
    assert!(state.load_more().is_none());
    assert_eq!(loader.calls(), vec![(1, 10, None), (2, 10, None)]);
}

#[tokio::test]
async fn stale_pages_are_discarded() {
    let loader = entity_loader();
    let mut state = select_for(Arc::clone(&loader));
    let start = Instant::now();

    let slow = state.toggle(false).unwrap();
    state.search_input("gam", start);
    let fresh = state.poll_search(start + Duration::from_millis(300)).unwrap();
    assert_eq!(fresh.search.as_deref(), Some("gam"));
    assert!(fresh.generation > slow.generation);

    let fresh_response = fresh.execute(loader.as_ref()).await;
    let slow_response = slow.execute(loader.as_ref()).await;
    assert!(state.apply(fresh_response));
    assert!(!state.apply(slow_response));
    assert_eq!(state.search_term(), "gam");
}

#[test]
fn search_restarts_only_for_settled_distinct_terms() {
    let mut state = select_for(entity_loader());
    let start = Instant::now();

    state.search_input("a", start);
    state.search_input("al", start + Duration::from_millis(200));
    assert!(state.poll_search(start + Duration::from_millis(300)).is_none());

    let request = state
        .poll_search(start + Duration::from_millis(500))
        .unwrap();
    assert_eq!((request.page, request.search.as_deref()), (1, Some("al")));

    state.search_input("al", start + Duration::from_secs(1));
    assert!(state.poll_search(start + Duration::from_secs(2)).is_none());
}

#[tokio::test(start_paused = true)]
async fn settled_search_waits_for_debounce() {
    let mut state = select_for(entity_loader());
    state.search_input("be", Instant::now());

    let request = state.settled_search().await.unwrap();
    assert_eq!(request.search.as_deref(), Some("be"));
}

#[test]
fn create_sentinel_never_becomes_the_value() {
    let mut state = select_for(entity_loader());
    state.seed(Some(json!("A")));

    assert_eq!(
        state.choose(&json!(DEFAULT_CREATE_VALUE)),
        SelectOutcome::CreateRequested
    );
    assert_eq!(state.selected(), Some(&json!("A")));
}

#[tokio::test]
async fn choosing_loaded_options() {
    let loader = Arc::new(FakeLoader::default().with_page(
        1,
        &[("A", "Alpha"), ("B", "Beta")],
        false,
    ));
    let mut state = select_for(Arc::clone(&loader));
    let request = state.toggle(false).unwrap();
    state.apply(request.execute(loader.as_ref()).await);

    assert_eq!(state.choose(&json!("Z")), SelectOutcome::Ignored);
    assert_eq!(state.choose(&json!("B")), SelectOutcome::Selected(json!("B")));
    assert_eq!(state.selected_label(), "Beta");
    assert!(!state.is_open());
}

#[tokio::test]
async fn unknown_injected_value_reloads_first_page() {
    let loader = entity_loader();
    let mut state = select_for(Arc::clone(&loader));
    let request = state.toggle(false).unwrap();
    state.apply(request.execute(loader.as_ref()).await);

    assert!(state.set_value(Some(json!("A"))).is_none());
    assert_eq!(state.selected_label(), "Alpha");

    let reload = state.set_value(Some(json!("Q"))).unwrap();
    assert_eq!(reload.page, 1);
    assert!(state.options().is_empty());
    assert_eq!(state.selected_label(), "Q");

    state.apply(reload.execute(loader.as_ref()).await);
    assert_eq!(state.selected_label(), "Q");
}

#[tokio::test]
async fn pinned_option_survives_first_page_reload() {
    let loader = entity_loader();
    let mut state = select_for(Arc::clone(&loader));

    let request = state
        .pin_created(SelectOption::new("N", "New Entity"))
        .unwrap();
    assert_eq!(values(&state), ["N"]);

    state.apply(request.execute(loader.as_ref()).await);
    assert_eq!(values(&state), ["N", "A", "B"]);
    assert_eq!(state.selected_label(), "New Entity");
    assert!(state.pinned().is_some());

    // Once the source lists it, the pin is released.
    let generation = state.generation();
    state.apply(LoadResponse {
        field: "entity_id".to_string(),
        generation,
        page: 1,
        result: Ok(OptionPage {
            options: vec![SelectOption::new("A", "Alpha"), SelectOption::new("N", "New Entity")],
            has_more: false,
            total: Some(2),
        }),
    });
    assert_eq!(values(&state), ["A", "N"]);
    assert!(state.pinned().is_none());
}

#[tokio::test]
async fn settled_search_releases_pinned_option() {
    let loader = entity_loader();
    let mut state = select_for(Arc::clone(&loader));
    let created = state
        .pin_created(SelectOption::new("N", "New Entity"))
        .unwrap();
    state.apply(created.execute(loader.as_ref()).await);
    assert_eq!(values(&state), ["N", "A", "B"]);

    let start = Instant::now();
    state.search_input("alp", start);
    let search = state.poll_search(start + Duration::from_millis(300)).unwrap();
    assert!(state.pinned().is_none());

    state.apply(search.execute(loader.as_ref()).await);
    assert_eq!(values(&state), ["A", "B"]);
    assert_eq!(state.selected(), Some(&json!("N")));
}

#[tokio::test]
async fn failed_load_keeps_options() {
    let loader = entity_loader();
    let mut state = select_for(Arc::clone(&loader));
    let request = state.toggle(false).unwrap();
    state.apply(request.execute(loader.as_ref()).await);

    let next = state.load_more().unwrap();
    let applied = state.apply(LoadResponse {
        field: next.field,
        generation: next.generation,
        page: next.page,
        result: Err(LoadError::Api(ApiError::network("connection reset"))),
    });
    assert!(applied);
    assert!(!state.is_loading());
    assert_eq!(values(&state), ["A", "B"]);
    assert!(state.load_more().is_some(), "retry is possible");
}

#[tokio::test]
async fn teardown_ignores_everything_after() {
    let loader = entity_loader();
    let mut state = select_for(Arc::clone(&loader));
    let request = state.toggle(false).unwrap();

    state.search_input("x", Instant::now());
    state.teardown();

    assert!(!state.apply(request.execute(loader.as_ref()).await));
    assert!(state.search_deadline().is_none());
    assert!(state.toggle(false).is_none());
    assert!(state.options().is_empty());
}

#[test]
fn disabled_select_does_not_open() {
    let mut state = select_for(entity_loader());
    assert!(state.toggle(true).is_none());
    assert!(!state.is_open());
}

#[test]
fn scrolling_near_bottom_loads_more() {
    let mut state = select_for(entity_loader());
    let generation = state.generation();
    state.apply(LoadResponse {
        field: "entity_id".to_string(),
        generation,
        page: 1,
        result: Ok(OptionPage {
            options: vec![SelectOption::new("A", "Alpha")],
            has_more: true,
            total: None,
        }),
    });

    assert!(state.on_scroll(120.0).is_none());
    assert_eq!(state.on_scroll(10.0).map(|r| r.page), Some(2));
}

#[tokio::test]
async fn disabled_form_ignores_paginated_choices() {
    let loader = entity_loader();
    let config = PaginatedSelectConfig::new(loader.clone());
    let initial = json!({"entity_id": "B"});
    let mut form = DynamicFormEngine::build(
        vec![FieldDescriptor::paginated_select("entity_id", "Entity", config)],
        Some(&initial),
        FormMode::Update,
    )
    .unwrap();
    for request in form.initial_loads() {
        let response = request.execute(loader.as_ref()).await;
        assert!(form.apply_options(response));
    }

    form.set_disabled_externally(true);
    assert_eq!(form.choose_paginated_option("entity_id", &json!("A")), None);
    assert_eq!(form.value("entity_id"), Some(&json!("B")));
    assert!(!form.control("entity_id").unwrap().is_touched());

    form.set_disabled_externally(false);
    assert_eq!(form.choose_paginated_option("entity_id", &json!("A")), None);
    assert_eq!(form.value("entity_id"), Some(&json!("A")));
}

#[tokio::test]
async fn form_routes_option_loads() {
    let loader = entity_loader();
    let config = PaginatedSelectConfig::new(loader.clone());
    let initial = json!({"entity_id": "B"});
    let mut form = DynamicFormEngine::build(
        vec![FieldDescriptor::paginated_select("entity_id", "Entity", config)],
        Some(&initial),
        FormMode::Update,
    )
    .unwrap();
    assert_eq!(form.select_state("entity_id").unwrap().selected_label(), "B");

    let requests = form.initial_loads();
    assert_eq!(requests.len(), 1);
    for request in requests {
        let loader = form.loader_for(&request.field).unwrap();
        let response = request.execute(loader.as_ref()).await;
        assert!(form.apply_options(response));
    }
    assert_eq!(form.select_state("entity_id").unwrap().selected_label(), "Beta");

    assert!(form.toggle_paginated("entity_id").is_none());
    assert!(form.select_state("entity_id").unwrap().is_open());
    assert_eq!(form.choose_paginated_option("entity_id", &json!("A")), None);
    assert_eq!(form.value("entity_id"), Some(&json!("A")));
    assert!(form.control("entity_id").unwrap().is_touched());
}
