//! Behaviour tests for the data-grid engine.

use rbac_grid::{
    ActionVariant, ColumnDescriptor, DataGridEngine, GridConfig, GridEvent, GridMessage, GridMode,
    SortDirection, SortIndicator, SortState, TableAction,
};
use rbac_model::{BadgeColor, DateFormat, Record, RowId};
use serde_json::{Value, json};

fn user(id: u32, name: &str, email: &str, role: &str) -> Record {
    json!({
        "id": format!("u{id}"),
        "name": name,
        "email_id": email,
        "role": { "name": role },
        "isActive": id % 2 == 1,
    })
}

fn users(count: u32) -> Vec<Record> {
    (1..=count)
        .map(|i| user(i, &format!("User {i:02}"), &format!("user{i}@acme.io"), "Admin"))
        .collect()
}

fn columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("name", "Name"),
        ColumnDescriptor::new("email_id", "Email"),
        ColumnDescriptor::new("role.name", "Role"),
    ]
}

fn client_grid(records: Vec<Record>) -> DataGridEngine {
    let mut grid = DataGridEngine::new(columns(), GridMode::Client);
    grid.set_records(records);
    grid
}

fn names(rows: &[&Record]) -> Vec<String> {
    rows.iter()
        .map(|r| r["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

// --- Paging ---

#[test]
fn pages_client_rows() {
    let mut grid = client_grid(users(25));

    assert_eq!(grid.total_pages(), 3);
    assert_eq!(grid.page_rows().len(), 10);
    assert_eq!((grid.start_index(), grid.end_index()), (1, 10));

    grid.set_page(3);
    assert_eq!(grid.page_rows().len(), 5);
    assert_eq!((grid.start_index(), grid.end_index()), (21, 25));
    assert_eq!(names(&grid.page_rows())[0], "User 21");
}

#[test]
fn empty_grid_has_no_pages() {
    let grid = client_grid(Vec::new());
    assert_eq!(grid.total_pages(), 0);
    assert_eq!(grid.start_index(), 0);
    assert_eq!(grid.end_index(), 0);
    assert!(grid.page_rows().is_empty());
    assert!(grid.page_numbers(10).is_empty());
}

#[test]
fn out_of_range_page_is_ignored() {
    let mut grid = client_grid(users(25));
    assert!(grid.set_page(0).is_empty());
    assert!(grid.set_page(4).is_empty());
    assert_eq!(grid.current_page(), 1);

    assert_eq!(grid.set_page(2), vec![GridEvent::PageChange(2)]);
    assert_eq!(grid.current_page(), 2);
}

#[test]
fn changing_page_size_returns_to_first_page() {
    let mut grid = client_grid(users(25));
    grid.set_page(3);

    let events = grid.set_items_per_page(20);
    assert_eq!(events, vec![GridEvent::ItemsPerPageChange(20)]);
    assert_eq!(grid.current_page(), 1);
    assert_eq!(grid.total_pages(), 2);

    assert!(grid.set_items_per_page(0).is_empty());
    assert_eq!(grid.items_per_page(), 20);
}

#[test]
fn set_records_returns_to_first_page_in_client_mode() {
    let mut grid = client_grid(users(25));
    grid.set_page(2);
    grid.set_records(users(30));
    assert_eq!(grid.current_page(), 1);
}

#[test]
fn configured_page_size_is_used() {
    let config = GridConfig {
        default_items_per_page: 5,
        ..GridConfig::default()
    };
    let mut grid = DataGridEngine::new(columns(), GridMode::Client).with_config(config);
    grid.set_records(users(12));
    assert_eq!(grid.items_per_page(), 5);
    assert_eq!(grid.total_pages(), 3);
}

#[test]
fn page_number_window_follows_current_page() {
    let mut grid = client_grid(users(200));
    assert_eq!(grid.page_numbers(10), (1..=10).collect::<Vec<_>>());

    grid.set_page(15);
    assert_eq!(grid.page_numbers(10), (10..=19).collect::<Vec<_>>());

    grid.set_page(20);
    assert_eq!(grid.page_numbers(10), (11..=20).collect::<Vec<_>>());
}

// --- Search ---

#[test]
fn search_matches_any_searchable_column_case_insensitively() {
    let mut grid = client_grid(vec![
        user(1, "Alice", "alice@acme.io", "Admin"),
        user(2, "Bob", "bob@other.org", "Viewer"),
        user(3, "Carol", "carol@acme.io", "Editor"),
    ]);

    let events = grid.set_search_term("ACME");
    assert_eq!(events, vec![GridEvent::SearchChange("ACME".to_string())]);
    assert_eq!(names(&grid.filtered_rows()), ["Alice", "Carol"]);

    grid.set_search_term("viewer");
    assert_eq!(names(&grid.filtered_rows()), ["Bob"]);

    grid.set_search_term("");
    assert_eq!(grid.filtered_rows().len(), 3);
}

#[test]
fn search_skips_non_searchable_columns() {
    let mut grid = DataGridEngine::new(
        vec![
            ColumnDescriptor::new("name", "Name"),
            ColumnDescriptor::new("email_id", "Email").searchable(false),
        ],
        GridMode::Client,
    );
    grid.set_records(vec![user(1, "Alice", "zed@acme.io", "Admin")]);

    grid.set_search_term("zed");
    assert!(grid.filtered_rows().is_empty());
}

#[test]
fn search_is_ignored_when_search_box_hidden() {
    let config = GridConfig {
        show_search: false,
        ..GridConfig::default()
    };
    let mut grid = DataGridEngine::new(columns(), GridMode::Client).with_config(config);
    grid.set_records(users(3));
    grid.set_search_term("nothing matches this");
    assert_eq!(grid.filtered_rows().len(), 3);
}

#[test]
fn search_uses_rendered_text() {
    let mut grid = DataGridEngine::new(
        vec![ColumnDescriptor::new("isActive", "Status").render(|r| {
            if r["isActive"].as_bool() == Some(true) {
                "Active".to_string()
            } else {
                "Inactive".to_string()
            }
        })],
        GridMode::Client,
    );
    grid.set_records(users(4));
    grid.set_search_term("inactive");
    assert_eq!(grid.filtered_rows().len(), 2);
}

#[test]
fn search_resets_to_first_page() {
    let mut grid = client_grid(users(25));
    grid.set_page(3);
    grid.set_search_term("user");
    assert_eq!(grid.current_page(), 1);
}

// --- Sort ---

fn scores(values: &[Value]) -> DataGridEngine {
    let records = values
        .iter()
        .enumerate()
        .map(|(i, v)| json!({"id": i, "score": v}))
        .collect();
    let mut grid = DataGridEngine::new(
        vec![ColumnDescriptor::new("score", "Score")],
        GridMode::Client,
    );
    grid.set_records(records);
    grid
}

fn score_column(grid: &DataGridEngine) -> Vec<Value> {
    grid.filtered_rows()
        .iter()
        .map(|r| r["score"].clone())
        .collect()
}

#[test]
fn nulls_sort_last_in_both_directions() {
    let mut grid = scores(&[json!(5), Value::Null, json!(1), Value::Null, json!(3)]);

    grid.toggle_sort("score");
    assert_eq!(
        score_column(&grid),
        [json!(1), json!(3), json!(5), Value::Null, Value::Null]
    );

    grid.toggle_sort("score");
    assert_eq!(
        score_column(&grid),
        [json!(5), json!(3), json!(1), Value::Null, Value::Null]
    );
}

#[test]
fn third_toggle_restores_original_order() {
    let original = [json!(2), json!(9), json!(4)];
    let mut grid = scores(&original);

    let events = grid.toggle_sort("score");
    assert_eq!(
        events,
        vec![GridEvent::SortChange(Some(SortState::new(
            "score",
            SortDirection::Asc
        )))]
    );
    assert_eq!(grid.sort_indicator("score"), SortIndicator::Asc);

    grid.toggle_sort("score");
    assert_eq!(grid.sort_indicator("score"), SortIndicator::Desc);

    let events = grid.toggle_sort("score");
    assert_eq!(events, vec![GridEvent::SortChange(None)]);
    assert_eq!(grid.sort_indicator("score"), SortIndicator::Both);
    assert_eq!(score_column(&grid), original);
}

#[test]
fn sorting_another_column_starts_ascending() {
    let mut grid = client_grid(vec![
        user(1, "Carol", "a@x.io", "Admin"),
        user(2, "Alice", "c@x.io", "Viewer"),
        user(3, "Bob", "b@x.io", "Editor"),
    ]);

    grid.toggle_sort("name");
    grid.toggle_sort("name");
    assert_eq!(names(&grid.filtered_rows()), ["Carol", "Bob", "Alice"]);

    grid.toggle_sort("email_id");
    assert_eq!(grid.sort(), Some(&SortState::new("email_id", SortDirection::Asc)));
    assert_eq!(grid.sort_indicator("name"), SortIndicator::Both);
    assert_eq!(names(&grid.filtered_rows()), ["Carol", "Bob", "Alice"]);
}

#[test]
fn sort_is_stable_for_equal_keys() {
    let mut grid = client_grid(vec![
        user(1, "First", "a@x.io", "Admin"),
        user(2, "Second", "b@x.io", "Admin"),
        user(3, "Third", "c@x.io", "Admin"),
    ]);
    grid.toggle_sort("role.name");
    assert_eq!(names(&grid.filtered_rows()), ["First", "Second", "Third"]);
}

#[test]
fn non_sortable_and_unknown_columns_ignore_toggles() {
    let mut grid = DataGridEngine::new(
        vec![ColumnDescriptor::new("name", "Name").sortable(false)],
        GridMode::Client,
    );
    grid.set_records(users(3));
    assert!(grid.toggle_sort("name").is_empty());
    assert!(grid.toggle_sort("missing").is_empty());
    assert_eq!(grid.sort(), None);
}

#[test]
fn numbers_sort_numerically() {
    let mut grid = scores(&[json!(10), json!(9), json!(100)]);
    grid.toggle_sort("score");
    assert_eq!(score_column(&grid), [json!(9), json!(10), json!(100)]);
}

// --- Selection ---

#[test]
fn select_all_only_touches_current_page() {
    let mut grid = client_grid(users(25));

    let events = grid.toggle_select_all(true);
    assert!(grid.is_select_all());
    match events.as_slice() {
        [GridEvent::SelectionChange(rows)] => assert_eq!(rows.len(), 10),
        other => panic!("unexpected events: {other:?}"),
    }

    grid.toggle_row_selection(&RowId::key("u5"), false);
    assert!(!grid.is_select_all());
    assert_eq!(grid.selected_rows().len(), 9);

    grid.toggle_row_selection(&RowId::key("u5"), true);
    assert!(grid.is_select_all());

    grid.toggle_select_all(false);
    assert!(grid.selected_rows().is_empty());
    assert!(!grid.is_select_all());
}

#[test]
fn changing_page_clears_selection() {
    let mut grid = client_grid(users(25));
    grid.toggle_select_all(true);

    let events = grid.set_page(2);
    assert_eq!(
        events,
        vec![
            GridEvent::PageChange(2),
            GridEvent::SelectionChange(Vec::new())
        ]
    );
    assert!(grid.selected_ids().is_empty());
    assert!(!grid.is_select_all());
}

#[test]
fn selection_survives_search() {
    let mut grid = client_grid(users(5));
    grid.toggle_row_selection(&RowId::key("u2"), true);

    grid.set_search_term("User 04");
    assert!(grid.is_selected(&RowId::key("u2")));
    grid.set_search_term("");
    assert_eq!(grid.selected_rows().len(), 1);
}

#[test]
fn unknown_row_ids_are_ignored() {
    let mut grid = client_grid(users(3));
    assert!(grid.toggle_row_selection(&RowId::key("nope"), true).is_empty());
    assert!(grid.selected_ids().is_empty());
}

#[test]
fn reload_prunes_missing_selections() {
    let mut grid = client_grid(users(5));
    grid.toggle_row_selection(&RowId::key("u1"), true);
    grid.toggle_row_selection(&RowId::key("u5"), true);

    grid.set_records(users(3));
    assert!(grid.is_selected(&RowId::key("u1")));
    assert!(!grid.is_selected(&RowId::key("u5")));
}

#[test]
fn selection_disabled_ignores_toggles() {
    let config = GridConfig {
        enable_selection: false,
        ..GridConfig::default()
    };
    let mut grid = DataGridEngine::new(columns(), GridMode::Client).with_config(config);
    grid.set_records(users(3));
    assert!(grid.toggle_select_all(true).is_empty());
    assert!(grid.toggle_row_selection(&RowId::key("u1"), true).is_empty());
}

#[test]
fn rows_without_ids_get_stable_synthetic_ids() {
    let mut grid = client_grid(vec![
        json!({"name": "No id"}),
        json!({"id": "a", "name": "Has id"}),
        json!({"id": "", "name": "Empty id"}),
    ]);

    assert_eq!(grid.row_id(0), Some(&RowId::Synthetic(0)));
    assert_eq!(grid.row_id(1), Some(&RowId::key("a")));
    assert_eq!(grid.row_id(2), Some(&RowId::Synthetic(2)));

    grid.toggle_sort("name");
    grid.toggle_row_selection(&RowId::Synthetic(0), true);
    assert_eq!(grid.selected_rows(), vec![json!({"name": "No id"})]);
}

#[test]
fn reload_drops_positional_selections() {
    let mut grid = DataGridEngine::new(columns(), GridMode::Server);
    grid.set_records(vec![json!({"name": "Alice"})]);
    grid.toggle_row_selection(&RowId::Synthetic(0), true);
    assert_eq!(grid.selected_rows().len(), 1);

    grid.set_records(vec![json!({"name": "Mallory"})]);
    assert!(grid.selected_rows().is_empty());
    assert!(!grid.is_selected(&RowId::Synthetic(0)));
}

#[test]
fn custom_id_key() {
    let mut grid = DataGridEngine::new(columns(), GridMode::Client).with_id_key("email_id");
    grid.set_records(users(2));
    assert_eq!(grid.row_id(0), Some(&RowId::key("user1@acme.io")));
}

// --- Server mode ---

#[test]
fn server_mode_shows_records_verbatim() {
    let mut grid = DataGridEngine::new(columns(), GridMode::Server);
    grid.set_records(users(10));
    grid.set_total_records(95);

    assert_eq!(grid.total_pages(), 10);
    assert_eq!(grid.page_rows().len(), 10);

    grid.set_search_term("nothing");
    assert_eq!(grid.page_rows().len(), 10);

    grid.toggle_sort("name");
    grid.toggle_sort("name");
    assert_eq!(names(&grid.page_rows())[0], "User 01");
}

#[test]
fn server_mode_emits_page_intents() {
    let mut grid = DataGridEngine::new(columns(), GridMode::Server);
    grid.set_records(users(10));
    grid.set_total_records(95);

    assert_eq!(grid.set_page(4), vec![GridEvent::PageChange(4)]);
    grid.set_current_page(4);
    grid.set_records(users(10));
    assert_eq!(grid.current_page(), 4);
    assert_eq!((grid.start_index(), grid.end_index()), (31, 40));

    assert_eq!(
        grid.set_items_per_page(50),
        vec![GridEvent::ItemsPerPageChange(50), GridEvent::PageChange(1)]
    );
}

// --- Actions and cells ---

#[test]
fn actions_respect_show_predicate() {
    let grid = DataGridEngine::new(columns(), GridMode::Client).with_actions(vec![
        TableAction::new("Edit").icon("pencil"),
        TableAction::new("Delete")
            .variant(ActionVariant::Error)
            .show_when(|r| r["isActive"].as_bool() == Some(false)),
    ]);
    let mut grid = grid;
    grid.set_records(users(2));

    let active = user(1, "User 01", "user1@acme.io", "Admin");
    let labels: Vec<_> = grid
        .visible_actions(&active)
        .iter()
        .map(|a| a.label.clone())
        .collect();
    assert_eq!(labels, ["Edit"]);

    assert!(grid.handle_action("Delete", &RowId::key("u1")).is_empty());
    let events = grid.handle_action("Delete", &RowId::key("u2"));
    assert!(matches!(
        events.as_slice(),
        [GridEvent::ActionClick { action, item }] if action == "Delete" && item["id"] == "u2"
    ));
}

#[test]
fn update_routes_messages() {
    let mut grid = client_grid(users(25)).with_actions(vec![TableAction::new("Edit")]);

    grid.update(GridMessage::SortToggled("name".to_string()));
    assert_eq!(grid.sort_indicator("name"), SortIndicator::Asc);

    grid.update(GridMessage::PageSelected(2));
    assert_eq!(grid.current_page(), 2);

    let events = grid.update(GridMessage::ActionClicked {
        action: "Edit".to_string(),
        row: RowId::key("u1"),
    });
    assert_eq!(events.len(), 1);

    assert_eq!(
        grid.update(GridMessage::DownloadClicked),
        vec![GridEvent::DownloadClick]
    );
}

#[test]
fn badge_colour_defaults_to_info() {
    let status = ColumnDescriptor::new("isActive", "Status").badge_color(|r| {
        if r["isActive"].as_bool() == Some(true) {
            BadgeColor::Success
        } else {
            BadgeColor::Error
        }
    });
    let plain = ColumnDescriptor::new("name", "Name");
    let grid = DataGridEngine::new(vec![status.clone(), plain.clone()], GridMode::Client);

    let record = user(1, "A", "a@x.io", "Admin");
    assert_eq!(grid.badge_color(&record, &status), BadgeColor::Success);
    assert_eq!(grid.badge_color(&record, &plain), BadgeColor::Info);
    assert_eq!(grid.cell_text(&record, &plain), "A");
}

#[test]
fn date_columns_display_formatted_and_sort_chronologically() {
    let created = ColumnDescriptor::new("createdAt", "Created").date(DateFormat::Date);
    let mut grid = DataGridEngine::new(
        vec![ColumnDescriptor::new("name", "Name"), created.clone()],
        GridMode::Client,
    );
    grid.set_records(vec![
        json!({"id": "a", "name": "April", "createdAt": "2024-04-02T08:00:00Z"}),
        json!({"id": "j", "name": "January", "createdAt": "2024-01-20T08:00:00Z"}),
        json!({"id": "n", "name": "Never", "createdAt": null}),
    ]);

    assert_eq!(grid.cell_text(&grid.records()[0], &created), "Apr 2, 2024");
    assert_eq!(grid.cell_text(&grid.records()[2], &created), "");

    grid.toggle_sort("createdAt");
    assert_eq!(names(&grid.filtered_rows()), ["January", "April", "Never"]);

    grid.set_search_term("jan 20");
    assert_eq!(names(&grid.filtered_rows()), ["January"]);
}

#[test]
fn set_columns_resets_view_state() {
    let mut grid = client_grid(users(25));
    grid.toggle_sort("name");
    grid.set_search_term("user");
    grid.set_page(2);
    grid.toggle_select_all(true);

    grid.set_columns(vec![ColumnDescriptor::new("email_id", "Email")]);
    assert_eq!(grid.sort(), None);
    assert_eq!(grid.search_term(), "");
    assert_eq!(grid.current_page(), 1);
    assert!(grid.selected_ids().is_empty());
}

#[test]
fn rendered_page_snapshot() {
    let mut grid = client_grid(vec![
        user(1, "Carol", "carol@acme.io", "Admin"),
        user(2, "Alice", "alice@acme.io", "Viewer"),
        json!({"id": "u3", "name": "Bob", "email_id": null, "role": {"name": "Editor"}}),
    ]);
    grid.toggle_sort("name");

    let text = grid
        .page_rows()
        .iter()
        .map(|record| {
            grid.columns()
                .iter()
                .map(|column| grid.cell_text(record, column))
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n");

    insta::assert_snapshot!(text, @r"
    Alice | alice@acme.io | Viewer
    Bob |  | Editor
    Carol | carol@acme.io | Admin
    ");
}
