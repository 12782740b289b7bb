//! Tests for ConfigService over an in-memory node store

use std::sync::Arc;

use configdb::application::services::ConfigService;
use configdb::application::{ApplicationError, Format};
use configdb::domain::{DomainError, NodeArena, Value};
use configdb::infrastructure::traits::{MemoryNodeStore, NodeStore};
use configdb::util::testing::{map_of, memory_service};

// ============================================================
// Read / write
// ============================================================

#[test]
fn given_json_document_when_put_then_get_returns_same_content() {
    // Arrange
    let (service, _store) = memory_service();
    let body = r#"{"db": {"host": "localhost", "port": 5432}, "debug": false}"#;

    // Act
    service.put("/app", Format::Json, body).unwrap();

    // Assert
    let value = service.read("app").unwrap();
    assert_eq!(
        value,
        map_of(vec![
            (
                "db",
                map_of(vec![
                    ("host", Value::from("localhost")),
                    ("port", Value::Int(5432)),
                ])
            ),
            ("debug", Value::Bool(false)),
        ])
    );
    assert_eq!(
        service.get("app/db/port", Format::Value).unwrap(),
        "5432".to_string()
    );
}

#[test]
fn given_properties_document_when_put_then_yaml_view_is_nested() {
    let (service, _store) = memory_service();
    let body = "server.name = \"alpha\"\nserver.ports.0 = 80\nserver.ports.1 = 443\n";

    service.put("", Format::Prop, body).unwrap();

    let yaml = service.get("server", Format::Yaml).unwrap();
    let value = Format::Yaml.decode(&yaml).unwrap();
    assert_eq!(
        value,
        map_of(vec![
            ("name", Value::from("alpha")),
            ("ports", Value::from(vec![80, 443])),
        ])
    );
}

#[test]
fn given_list_when_single_element_overwritten_then_list_keeps_other_elements() {
    let (service, _store) = memory_service();
    service
        .write("/foo/list", &Value::from(vec!["eins", "zwei", "drei"]))
        .unwrap();

    service.put("foo/list/2", Format::Value, "DREI").unwrap();

    assert_eq!(
        service.read("foo/list").unwrap(),
        Value::from(vec!["eins", "zwei", "DREI"])
    );
}

#[test]
fn given_existing_tree_when_partial_update_then_reuses_surviving_nodes() {
    let (service, store) = memory_service();
    service
        .write(
            "cfg",
            &map_of(vec![
                ("a", Value::Int(1)),
                ("b", map_of(vec![("x", Value::Int(1))])),
            ]),
        )
        .unwrap();
    let before = NodeArena::from_records(&store.fetch().unwrap()).unwrap();
    let record_id = |tree: &NodeArena, path: &str| {
        tree.get(tree.lookup(path).unwrap()).unwrap().record_id()
    };
    let bx_before = record_id(&before, "cfg/b/x");
    let b_before = record_id(&before, "cfg/b");

    service
        .write(
            "cfg",
            &map_of(vec![
                ("b", map_of(vec![("x", Value::Int(2)), ("y", Value::Int(3))])),
                ("c", Value::Int(4)),
            ]),
        )
        .unwrap();

    let value = service.read("cfg").unwrap();
    assert_eq!(
        value,
        map_of(vec![
            ("b", map_of(vec![("x", Value::Int(2)), ("y", Value::Int(3))])),
            ("c", Value::Int(4)),
        ])
    );
    // a removed, b/y and c added, b and b/x kept their rows
    let after = NodeArena::from_records(&store.fetch().unwrap()).unwrap();
    assert_eq!(after.len(), before.len() + 1);
    assert!(after.lookup("cfg/a").is_err());
    assert_eq!(record_id(&after, "cfg/b/x"), bx_before);
    assert_eq!(record_id(&after, "cfg/b"), b_before);
}

#[test]
fn given_dict_when_scalar_put_then_children_are_gone() {
    let (service, _store) = memory_service();
    service
        .put("svc", Format::Json, r#"{"a": 1, "b": {"c": 2}}"#)
        .unwrap();

    service.put("svc", Format::Value, "no").unwrap();

    assert_eq!(service.read("svc").unwrap(), Value::Bool(false));
    assert!(matches!(
        service.read("svc/a"),
        Err(ApplicationError::Domain(DomainError::InvalidPath { .. }))
    ));
}

#[test]
fn given_seeded_store_when_get_as_properties_then_emits_flat_keys() {
    // Arrange
    let mut tree = NodeArena::new();
    let node = tree.resolve("app/db", true).unwrap();
    tree.store(
        node,
        &map_of(vec![("host", Value::from("h")), ("port", Value::Int(1))]),
    )
    .unwrap();
    let store = Arc::new(MemoryNodeStore::with_records(tree.to_records()));
    let service = ConfigService::new(store as Arc<dyn NodeStore>);

    // Act
    let text = service.get("app", Format::Prop).unwrap();

    // Assert
    assert_eq!(text.trim_end(), "db.host = \"h\"\ndb.port = 1");
}

// ============================================================
// Errors
// ============================================================

#[test]
fn given_missing_path_when_get_then_fails_with_invalid_path() {
    let (service, _store) = memory_service();

    let result = service.get("/missing", Format::Json);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidPath { .. }))
    ));
}

#[test]
fn given_branch_when_get_as_value_then_type_mismatch() {
    let (service, _store) = memory_service();
    service.put("a", Format::Json, r#"{"b": 1}"#).unwrap();

    assert!(matches!(
        service.get("a", Format::Value),
        Err(ApplicationError::TypeMismatch { .. })
    ));
}

#[test]
fn given_malformed_body_when_put_then_decode_error_and_nothing_created() {
    let (service, store) = memory_service();

    let result = service.put("new/node", Format::Json, "{broken");

    assert!(matches!(result, Err(ApplicationError::Decode { .. })));
    assert!(store.fetch().unwrap().is_empty());
}

#[test]
fn given_properties_with_malformed_keys_when_put_then_only_valid_keys_are_stored() {
    let (service, _store) = memory_service();

    service
        .put("", Format::Prop, "a..b = 1\npath/like = 2\nkept = 3\n")
        .unwrap();

    assert_eq!(
        service.read("").unwrap(),
        map_of(vec![("kept", Value::Int(3))])
    );
}

#[test]
fn given_store_failure_midway_when_put_then_previous_state_is_kept() {
    // Arrange
    let (service, _store) = memory_service();
    service.write("", &map_of(vec![("keep", Value::Int(1))])).unwrap();

    // Act - the nested key is rejected after "keep" was already rewritten
    let result = service.write(
        "",
        &map_of(vec![
            ("keep", Value::Int(2)),
            ("nested", map_of(vec![("bad/key", Value::Int(1))])),
        ]),
    );

    // Assert
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::UnsupportedValue(_)))
    ));
    assert_eq!(
        service.read("").unwrap(),
        map_of(vec![("keep", Value::Int(1))])
    );
}

// ============================================================
// Delete
// ============================================================

#[test]
fn given_subtree_when_deleted_then_parent_no_longer_lists_it() {
    let (service, _store) = memory_service();
    service
        .put("", Format::Json, r#"{"a": {"b": {"c": 1}}, "d": 2}"#)
        .unwrap();

    service.delete("a/b").unwrap();

    assert_eq!(
        service.read("").unwrap(),
        map_of(vec![("a", Value::empty_map()), ("d", Value::Int(2))])
    );
}

#[test]
fn given_root_when_deleted_then_tree_is_emptied_but_root_remains() {
    let (service, store) = memory_service();
    service.put("", Format::Json, r#"{"a": 1, "b": [1, 2]}"#).unwrap();

    service.delete("/").unwrap();

    assert_eq!(service.read("").unwrap(), Value::empty_map());
    assert_eq!(store.fetch().unwrap().len(), 1);
}

#[test]
fn given_missing_path_when_deleted_then_fails_with_invalid_path() {
    let (service, _store) = memory_service();

    assert!(matches!(
        service.delete("ghost"),
        Err(ApplicationError::Domain(DomainError::InvalidPath { .. }))
    ));
}

// ============================================================
// Display
// ============================================================

#[test]
fn given_tree_when_rendered_then_shows_labels_types_and_values() {
    let (service, _store) = memory_service();
    service
        .put("", Format::Json, r#"{"app": {"name": "x", "ports": [80]}}"#)
        .unwrap();

    let rendered = service.tree("").unwrap().to_string();

    assert!(rendered.starts_with("/ (dict)"));
    assert!(rendered.contains("app (dict)"));
    assert!(rendered.contains("name = \"x\""));
    assert!(rendered.contains("ports (list)"));
    assert!(rendered.contains("0 = 80"));
}
