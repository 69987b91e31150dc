//! Column board data model and the synchronization transformation.
//!
//! A user's board is stored as two TEXT blobs: `column_order` (a JSON list
//! of column ids, order significant) and `columns_config` (a JSON map of
//! column id to column metadata, key order irrelevant). The board keeps a
//! denormalized copy of each todo's `status`: every todo id appears in
//! exactly one column's `taskIds` list, and that column's id equals the
//! todo's status.
//!
//! Two parsing regimes apply to the blobs:
//! - reads of previously stored text are lenient: malformed JSON degrades
//!   to an empty structure with a warning, never a failed request;
//! - caller-submitted payloads are strict: malformed shapes are rejected
//!   with an error naming the failing field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Metadata for a single board column. `taskIds` ordering is significant
/// and preserved verbatim across round trips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub id: String,
    pub title: String,
    #[serde(rename = "taskIds", default)]
    pub task_ids: Vec<Uuid>,
}

impl ColumnConfig {
    pub fn empty(id: impl Into<String>, title: impl Into<String>) -> Self {
        ColumnConfig {
            id: id.into(),
            title: title.into(),
            task_ids: Vec::new(),
        }
    }
}

/// Validation failure for a caller-submitted settings payload.
///
/// `field` names the offending top-level field so the client can surface
/// it; no partial state is written when validation fails.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid JSON in {field}: {message}")]
pub struct BoardValidationError {
    pub field: &'static str,
    pub message: String,
}

impl BoardValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        BoardValidationError {
            field,
            message: message.into(),
        }
    }
}

/// A user's column board: ordered column ids plus per-column config.
///
/// `column_order` may list ids with no config entry and omit ids that have
/// one; both are preserved as-is. Columns with empty task lists are never
/// pruned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnBoard {
    pub column_order: Vec<String>,
    pub columns: BTreeMap<String, ColumnConfig>,
}

impl ColumnBoard {
    /// The default four-column layout seeded for users without settings.
    pub fn default_board() -> Self {
        let mut columns = BTreeMap::new();
        columns.insert("todo".to_string(), ColumnConfig::empty("todo", "To Do"));
        columns.insert(
            "inProgress".to_string(),
            ColumnConfig::empty("inProgress", "In Progress"),
        );
        columns.insert(
            "blocked".to_string(),
            ColumnConfig::empty("blocked", "Blocked"),
        );
        columns.insert("done".to_string(), ColumnConfig::empty("done", "Completed"));

        ColumnBoard {
            column_order: vec![
                "todo".to_string(),
                "inProgress".to_string(),
                "blocked".to_string(),
                "done".to_string(),
            ],
            columns,
        }
    }

    /// Parse stored blobs leniently. Each field is parsed independently;
    /// text that fails to parse degrades to an empty structure and is
    /// logged, so a corrupt row never fails the triggering request.
    pub fn from_stored(order_text: &str, config_text: &str) -> Self {
        let column_order = match serde_json::from_str::<Vec<String>>(order_text) {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!("Malformed stored column_order, treating as empty: {}", e);
                Vec::new()
            }
        };

        let columns = match serde_json::from_str::<BTreeMap<String, ColumnConfig>>(config_text) {
            Ok(columns) => columns,
            Err(e) => {
                tracing::warn!("Malformed stored columns_config, treating as empty: {}", e);
                BTreeMap::new()
            }
        };

        ColumnBoard {
            column_order,
            columns,
        }
    }

    /// Did either stored blob fail to parse? Used by the synchronizer to
    /// count recoveries.
    pub fn stored_is_malformed(order_text: &str, config_text: &str) -> bool {
        serde_json::from_str::<Vec<String>>(order_text).is_err()
            || serde_json::from_str::<BTreeMap<String, ColumnConfig>>(config_text).is_err()
    }

    /// Serialize back into the two TEXT blobs: (column_order, columns_config).
    pub fn to_stored(&self) -> (String, String) {
        // Vec and BTreeMap serialization cannot fail.
        let order = serde_json::to_string(&self.column_order).unwrap_or_else(|_| "[]".to_string());
        let config = serde_json::to_string(&self.columns).unwrap_or_else(|_| "{}".to_string());
        (order, config)
    }

    /// Scrub a task id from every column's task list.
    pub fn remove_task(&mut self, task: Uuid) {
        for column in self.columns.values_mut() {
            column.task_ids.retain(|id| *id != task);
        }
    }

    /// Place a task in the column named by `status`.
    ///
    /// The id is first scrubbed from all columns, then appended to exactly
    /// one, so repeated application with the same final state is a no-op
    /// and partial prior syncs cannot leave duplicates. An unknown status
    /// synthesizes a new column; the synthesized column is not added to
    /// `column_order` (order-driven UIs pick it up once the user saves an
    /// order containing it).
    pub fn place_task(&mut self, status: &str, task: Uuid) {
        self.remove_task(task);

        let column = self
            .columns
            .entry(status.to_string())
            .or_insert_with(|| ColumnConfig::empty(status, title_case(status)));

        if !column.task_ids.contains(&task) {
            column.task_ids.push(task);
        }
    }

    /// Total number of task ids across all columns.
    pub fn task_count(&self) -> usize {
        self.columns.values().map(|c| c.task_ids.len()).sum()
    }

    /// Ids of the columns currently holding `task` (should be at most one).
    pub fn columns_holding(&self, task: Uuid) -> Vec<&str> {
        self.columns
            .values()
            .filter(|c| c.task_ids.contains(&task))
            .map(|c| c.id.as_str())
            .collect()
    }
}

/// Display title for a synthesized column: first character uppercased,
/// remainder untouched ("custom-col" -> "Custom-col").
pub fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn unwrap_legacy_string(
    field: &'static str,
    value: &serde_json::Value,
) -> Result<serde_json::Value, BoardValidationError> {
    // Legacy clients submit the blob as a JSON-encoded string.
    if let serde_json::Value::String(text) = value {
        serde_json::from_str(text).map_err(|e| BoardValidationError::new(field, e.to_string()))
    } else {
        Ok(value.clone())
    }
}

/// Strictly validate a submitted `column_order`: must be a list of strings.
pub fn validate_column_order(
    value: &serde_json::Value,
) -> Result<Vec<String>, BoardValidationError> {
    let value = unwrap_legacy_string("column_order", value)?;
    serde_json::from_value(value)
        .map_err(|e| BoardValidationError::new("column_order", e.to_string()))
}

/// Strictly validate a submitted `columns_config`: must be a map of column
/// id to `{id, title, taskIds}` where `taskIds` is a list of task ids.
pub fn validate_columns_config(
    value: &serde_json::Value,
) -> Result<BTreeMap<String, ColumnConfig>, BoardValidationError> {
    let value = unwrap_legacy_string("columns_config", value)?;
    serde_json::from_value(value)
        .map_err(|e| BoardValidationError::new("columns_config", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn default_board_has_expected_layout() {
        let board = ColumnBoard::default_board();

        assert_eq!(board.column_order, ["todo", "inProgress", "blocked", "done"]);
        assert_eq!(board.columns.len(), 4);
        assert_eq!(board.columns["todo"].title, "To Do");
        assert_eq!(board.columns["inProgress"].title, "In Progress");
        assert_eq!(board.columns["blocked"].title, "Blocked");
        assert_eq!(board.columns["done"].title, "Completed");
        for column in board.columns.values() {
            assert!(column.task_ids.is_empty());
        }
    }

    #[test]
    fn place_task_appends_to_existing_column() {
        let mut board = ColumnBoard::default_board();
        let a = task();

        board.place_task("blocked", a);

        assert_eq!(board.columns["blocked"].task_ids, vec![a]);
        assert_eq!(board.columns_holding(a), vec!["blocked"]);
    }

    #[test]
    fn place_task_moves_between_columns() {
        let mut board = ColumnBoard::default_board();
        let a = task();

        board.place_task("blocked", a);
        board.place_task("inProgress", a);

        assert!(board.columns["blocked"].task_ids.is_empty());
        assert_eq!(board.columns["inProgress"].task_ids, vec![a]);
        assert_eq!(board.columns_holding(a), vec!["inProgress"]);
    }

    #[test]
    fn place_task_is_idempotent() {
        let mut board = ColumnBoard::default_board();
        let a = task();

        board.place_task("inProgress", a);
        let after_first = board.clone();
        board.place_task("inProgress", a);

        assert_eq!(board, after_first);
        assert_eq!(board.columns["inProgress"].task_ids.len(), 1);
    }

    #[test]
    fn each_task_lives_in_exactly_one_column() {
        let mut board = ColumnBoard::default_board();
        let tasks: Vec<Uuid> = (0..5).map(|_| task()).collect();
        let statuses = ["todo", "inProgress", "blocked", "done", "inProgress"];

        for (t, s) in tasks.iter().zip(statuses) {
            board.place_task(s, *t);
        }
        // Shuffle a couple of them to new columns.
        board.place_task("done", tasks[0]);
        board.place_task("todo", tasks[4]);

        for t in &tasks {
            assert_eq!(board.columns_holding(*t).len(), 1);
        }
        assert_eq!(board.task_count(), tasks.len());
    }

    #[test]
    fn unknown_status_synthesizes_column_without_touching_order() {
        let mut board = ColumnBoard::default_board();
        let a = task();

        board.place_task("custom-col", a);

        let synthesized = &board.columns["custom-col"];
        assert_eq!(synthesized.id, "custom-col");
        assert_eq!(synthesized.title, "Custom-col");
        assert_eq!(synthesized.task_ids, vec![a]);
        // Faithful to stored behavior: order is left alone.
        assert_eq!(board.column_order, ["todo", "inProgress", "blocked", "done"]);
    }

    #[test]
    fn empty_column_survives_task_lifecycle() {
        let mut board = ColumnBoard::default_board();
        board.column_order.push("empty-test".to_string());
        board
            .columns
            .insert("empty-test".to_string(), ColumnConfig::empty("empty-test", "Empty Test"));

        let a = task();
        board.place_task("inProgress", a);
        board.remove_task(a);

        assert_eq!(board.column_order[4], "empty-test");
        assert!(board.columns["empty-test"].task_ids.is_empty());
        assert_eq!(board.columns["empty-test"].title, "Empty Test");
    }

    #[test]
    fn remove_task_scrubs_all_columns() {
        let mut board = ColumnBoard::default_board();
        let a = task();
        // Simulate a stale duplicate left by a partially applied sync.
        board.columns.get_mut("todo").unwrap().task_ids.push(a);
        board.columns.get_mut("done").unwrap().task_ids.push(a);

        board.remove_task(a);

        assert_eq!(board.task_count(), 0);
    }

    #[test]
    fn stored_round_trip_preserves_ordering() {
        let mut board = ColumnBoard::default_board();
        let (a, b, c) = (task(), task(), task());
        board.place_task("todo", c);
        board.place_task("todo", a);
        board.place_task("todo", b);

        let (order, config) = board.to_stored();
        let reread = ColumnBoard::from_stored(&order, &config);

        assert_eq!(reread, board);
        assert_eq!(reread.columns["todo"].task_ids, vec![c, a, b]);
        let (order2, config2) = reread.to_stored();
        assert_eq!(order, order2);
        assert_eq!(config, config2);
    }

    #[test]
    fn malformed_stored_text_degrades_to_empty() {
        let board = ColumnBoard::from_stored("not json", "{\"todo\": 17}");

        assert!(board.column_order.is_empty());
        assert!(board.columns.is_empty());
        assert!(ColumnBoard::stored_is_malformed("not json", "{}"));
        assert!(!ColumnBoard::stored_is_malformed("[]", "{}"));
    }

    #[test]
    fn title_case_uppercases_first_char_only() {
        assert_eq!(title_case("custom-col"), "Custom-col");
        assert_eq!(title_case("inProgress"), "InProgress");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn validate_order_accepts_list_and_legacy_string() {
        let structured = json!(["todo", "done"]);
        assert_eq!(validate_column_order(&structured).unwrap(), ["todo", "done"]);

        let legacy = json!("[\"todo\",\"done\"]");
        assert_eq!(validate_column_order(&legacy).unwrap(), ["todo", "done"]);
    }

    #[test]
    fn validate_order_rejects_non_list_naming_field() {
        let err = validate_column_order(&json!({"oops": true})).unwrap_err();
        assert_eq!(err.field, "column_order");

        let err = validate_column_order(&json!("{not json")).unwrap_err();
        assert_eq!(err.field, "column_order");
    }

    #[test]
    fn validate_config_accepts_well_formed_map() {
        let a = task();
        let value = json!({
            "todo": {"id": "todo", "title": "To Do", "taskIds": [a]},
        });

        let config = validate_columns_config(&value).unwrap();
        assert_eq!(config["todo"].task_ids, vec![a]);
    }

    #[test]
    fn validate_config_rejects_bad_shapes_naming_field() {
        // taskIds must be a list
        let bad_tasks = json!({
            "todo": {"id": "todo", "title": "To Do", "taskIds": "nope"},
        });
        let err = validate_columns_config(&bad_tasks).unwrap_err();
        assert_eq!(err.field, "columns_config");

        // entries must be objects with id and title
        let bad_entry = json!({"todo": 42});
        let err = validate_columns_config(&bad_entry).unwrap_err();
        assert_eq!(err.field, "columns_config");
    }

    #[test]
    fn task_ids_default_to_empty_when_omitted() {
        let value = json!({
            "todo": {"id": "todo", "title": "To Do"},
        });
        let config = validate_columns_config(&value).unwrap();
        assert!(config["todo"].task_ids.is_empty());
    }
}
