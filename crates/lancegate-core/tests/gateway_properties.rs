//! Integration tests for the Gateway.
//!
//! Runs the gateway end to end against the file-based backend in temporary
//! directories, plus one scenario against LanceDB.

use std::sync::Arc;
use std::thread;

use lancegate_core::{
    DatabaseErrorKind, Gateway, GatewayConfig, GatewayError, SearchQuery, TableConfig, VectorData,
};
use tempfile::TempDir;

/// Helper to create a connected gateway on the simple backend.
fn connected_gateway(temp: &TempDir) -> Gateway {
    let config = GatewayConfig::new(temp.path().join("vectors")).with_backend("simple");
    let gateway = Gateway::new(config);
    gateway.connect().expect("Failed to connect");
    gateway
}

fn unit(dimension: usize, axis: usize) -> Vec<f32> {
    let mut v = vec![0.0; dimension];
    v[axis % dimension] = 1.0;
    v
}

fn row_count(gateway: &Gateway, table: &str) -> usize {
    gateway.describe_table(table).unwrap().rows
}

fn assert_table_not_found(err: GatewayError) {
    assert!(!err.is_validation(), "expected database error, got {err}");
    assert_eq!(err.database_kind(), Some(DatabaseErrorKind::TableNotFound));
    assert_eq!(err.status_code(), 404);
}

// ============================================================================
// Table creation and listing
// ============================================================================

#[test]
fn test_created_table_is_listed_once() {
    let temp = TempDir::new().unwrap();
    let gateway = connected_gateway(&temp);

    for (name, dimension) in [("t", 3), ("docs", 384), ("a-b_c", 1), ("T9", 1536)] {
        gateway
            .create_table(&TableConfig::new(name, dimension))
            .unwrap();
        let tables = gateway.list_tables().unwrap();
        assert_eq!(
            tables.iter().filter(|t| t.as_str() == name).count(),
            1,
            "{name} should be listed exactly once in {tables:?}"
        );
    }
}

#[test]
fn test_list_tables_hides_bookkeeping_table() {
    let temp = TempDir::new().unwrap();
    let gateway = connected_gateway(&temp);

    assert!(gateway.list_tables().unwrap().is_empty());

    gateway.create_table(&TableConfig::new("zeta", 2)).unwrap();
    gateway.create_table(&TableConfig::new("alpha", 2)).unwrap();
    assert_eq!(gateway.list_tables().unwrap(), vec!["alpha", "zeta"]);
}

#[test]
fn test_create_table_rejects_bad_input() {
    let temp = TempDir::new().unwrap();
    let gateway = connected_gateway(&temp);

    for config in [
        TableConfig::new("t", 0),
        TableConfig::new("", 3),
        TableConfig::new("_init", 3),
        TableConfig::new("../escape", 3),
    ] {
        let err = gateway.create_table(&config).unwrap_err();
        assert!(err.is_validation(), "{config:?} should be rejected: {err}");
    }
    assert!(gateway.list_tables().unwrap().is_empty());
}

#[test]
fn test_create_table_overwrites() {
    let temp = TempDir::new().unwrap();
    let gateway = connected_gateway(&temp);

    gateway.create_table(&TableConfig::new("t", 3)).unwrap();
    gateway
        .add_vector("t", &VectorData::new(vec![1.0, 0.0, 0.0]).with_text("a"))
        .unwrap();
    assert_eq!(row_count(&gateway, "t"), 1);

    gateway.create_table(&TableConfig::new("t", 3)).unwrap();
    assert_eq!(row_count(&gateway, "t"), 0);
    assert_eq!(gateway.list_tables().unwrap(), vec!["t"]);

    // A different dimension replaces the schema too
    gateway.create_table(&TableConfig::new("t", 2)).unwrap();
    assert_eq!(gateway.describe_table("t").unwrap().dimension, 2);
}

// ============================================================================
// Add and search
// ============================================================================

#[test]
fn test_added_vector_is_found_first() {
    let temp = TempDir::new().unwrap();
    let gateway = connected_gateway(&temp);

    for dimension in [1, 3, 8] {
        let name = format!("dim{dimension}");
        gateway
            .create_table(&TableConfig::new(&name, dimension))
            .unwrap();

        for axis in 0..dimension {
            let text = format!("axis-{axis}");
            let vector = unit(dimension, axis);
            gateway
                .add_vector(&name, &VectorData::new(vector.clone()).with_text(&text))
                .unwrap();

            let hits = gateway
                .search_vectors(&name, &SearchQuery::new(vector).with_limit(1))
                .unwrap();
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].text.as_deref(), Some(text.as_str()));
        }
    }
}

#[test]
fn test_scenario_limit_one() {
    let temp = TempDir::new().unwrap();
    let gateway = connected_gateway(&temp);

    gateway.create_table(&TableConfig::new("t", 3)).unwrap();
    gateway
        .add_vector("t", &VectorData::new(vec![1.0, 0.0, 0.0]).with_text("a"))
        .unwrap();
    gateway
        .add_vector("t", &VectorData::new(vec![0.0, 1.0, 0.0]).with_text("b"))
        .unwrap();

    let hits = gateway
        .search_vectors("t", &SearchQuery::new(vec![1.0, 0.0, 0.0]).with_limit(1))
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text.as_deref(), Some("a"));
}

#[test]
fn test_scenario_limit_exceeds_rows() {
    let temp = TempDir::new().unwrap();
    let gateway = connected_gateway(&temp);

    gateway.create_table(&TableConfig::new("t", 3)).unwrap();
    gateway
        .add_vector("t", &VectorData::new(vec![1.0, 0.0, 0.0]).with_text("a"))
        .unwrap();
    gateway
        .add_vector("t", &VectorData::new(vec![0.0, 1.0, 0.0]).with_text("b"))
        .unwrap();

    let hits = gateway
        .search_vectors("t", &SearchQuery::new(vec![1.0, 0.0, 0.0]).with_limit(10))
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].text.as_deref(), Some("a"));
    assert_eq!(hits[1].text.as_deref(), Some("b"));
}

#[test]
fn test_search_empty_table() {
    let temp = TempDir::new().unwrap();
    let gateway = connected_gateway(&temp);

    gateway.create_table(&TableConfig::new("t", 3)).unwrap();
    let hits = gateway
        .search_vectors("t", &SearchQuery::new(vec![1.0, 0.0, 0.0]))
        .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn test_metadata_round_trips_through_search() {
    let temp = TempDir::new().unwrap();
    let gateway = connected_gateway(&temp);
    gateway.create_table(&TableConfig::new("t", 2)).unwrap();

    let mut metadata = serde_json::Map::new();
    metadata.insert("source".to_string(), serde_json::json!("test"));
    metadata.insert("page".to_string(), serde_json::json!(7));
    gateway
        .add_vector(
            "t",
            &VectorData::new(vec![1.0, 1.0])
                .with_text("meta")
                .with_metadata(metadata),
        )
        .unwrap();
    gateway
        .add_vector("t", &VectorData::new(vec![-1.0, -1.0]))
        .unwrap();

    let hits = gateway
        .search_vectors("t", &SearchQuery::new(vec![1.0, 1.0]))
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(
        hits[0].metadata,
        Some(serde_json::json!({"source": "test", "page": 7}))
    );
    assert_eq!(hits[1].text, None);
    assert_eq!(hits[1].metadata, None);
}

// ============================================================================
// Validation and missing tables
// ============================================================================

#[test]
fn test_dimension_mismatch_leaves_table_unchanged() {
    let temp = TempDir::new().unwrap();
    let gateway = connected_gateway(&temp);

    gateway.create_table(&TableConfig::new("t", 3)).unwrap();
    gateway
        .add_vector("t", &VectorData::new(vec![1.0, 0.0, 0.0]).with_text("a"))
        .unwrap();

    for bad in [vec![1.0], vec![1.0, 0.0], vec![1.0, 0.0, 0.0, 0.0]] {
        let err = gateway
            .add_vector("t", &VectorData::new(bad.clone()).with_text("bad"))
            .unwrap_err();
        assert!(err.is_validation(), "add {bad:?}: {err}");
        assert!(err.to_string().contains("expected 3"));

        let err = gateway
            .search_vectors("t", &SearchQuery::new(bad.clone()))
            .unwrap_err();
        assert!(err.is_validation(), "search {bad:?}: {err}");
        assert_eq!(err.status_code(), 400);

        assert_eq!(row_count(&gateway, "t"), 1);
    }
}

#[test]
fn test_invalid_record_is_rejected() {
    let temp = TempDir::new().unwrap();
    let gateway = connected_gateway(&temp);
    gateway.create_table(&TableConfig::new("t", 2)).unwrap();

    let err = gateway
        .add_vector("t", &VectorData::new(vec![f32::INFINITY, 0.0]))
        .unwrap_err();
    assert!(err.is_validation());

    let err = gateway
        .search_vectors("t", &SearchQuery::new(vec![1.0, 0.0]).with_limit(0))
        .unwrap_err();
    assert!(err.is_validation());

    assert_eq!(row_count(&gateway, "t"), 0);
}

#[test]
fn test_empty_text_is_stored_as_null() {
    let temp = TempDir::new().unwrap();
    let gateway = connected_gateway(&temp);
    gateway.create_table(&TableConfig::new("t", 2)).unwrap();

    gateway
        .add_vector("t", &VectorData::new(vec![1.0, 0.0]).with_text(""))
        .unwrap();

    let hits = gateway
        .search_vectors("t", &SearchQuery::new(vec![1.0, 0.0]))
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, None);
}

#[test]
fn test_oversized_dimension_is_rejected() {
    let temp = TempDir::new().unwrap();
    let gateway = connected_gateway(&temp);

    let err = gateway
        .create_table(&TableConfig::new("wide", 4_294_967_299))
        .unwrap_err();
    assert!(err.is_validation());
    assert!(gateway.list_tables().unwrap().is_empty());
}

#[test]
fn test_missing_table_is_distinguishable() {
    let temp = TempDir::new().unwrap();
    let gateway = connected_gateway(&temp);

    let err = gateway
        .add_vector("ghost", &VectorData::new(vec![1.0, 0.0, 0.0]))
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
    assert_table_not_found(err);

    let err = gateway
        .search_vectors("ghost", &SearchQuery::new(vec![1.0, 0.0, 0.0]))
        .unwrap_err();
    assert_table_not_found(err);

    let err = gateway.describe_table("ghost").unwrap_err();
    assert_table_not_found(err);
}

// ============================================================================
// Connection lifecycle
// ============================================================================

#[test]
fn test_operations_fail_after_disconnect() {
    let temp = TempDir::new().unwrap();
    let gateway = connected_gateway(&temp);
    gateway.create_table(&TableConfig::new("t", 3)).unwrap();
    gateway.disconnect().unwrap();

    let results = [
        gateway.list_tables().map(|_| ()),
        gateway.create_table(&TableConfig::new("u", 3)),
        gateway.add_vector("t", &VectorData::new(vec![1.0, 0.0, 0.0])),
        gateway
            .search_vectors("t", &SearchQuery::new(vec![1.0, 0.0, 0.0]))
            .map(|_| ()),
        gateway.describe_table("t").map(|_| ()),
    ];
    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.database_kind(), Some(DatabaseErrorKind::NotConnected));
        assert!(err.to_string().contains("not connected"));
    }
}

#[test]
fn test_reconnect_restores_operations_with_fresh_cache() {
    let temp = TempDir::new().unwrap();
    let config = GatewayConfig::new(temp.path().join("vectors"))
        .with_backend("simple")
        .with_preload_tables(false);
    let gateway = Gateway::new(config);
    gateway.connect().unwrap();

    gateway.create_table(&TableConfig::new("t", 3)).unwrap();
    gateway
        .add_vector("t", &VectorData::new(vec![1.0, 0.0, 0.0]).with_text("a"))
        .unwrap();
    assert_eq!(gateway.status().cached_tables, vec!["t"]);

    gateway.disconnect().unwrap();
    assert!(gateway.status().cached_tables.is_empty());

    gateway.connect().unwrap();
    assert!(gateway.status().cached_tables.is_empty());

    // Data persisted; the handle is reopened rather than reused
    let hits = gateway
        .search_vectors("t", &SearchQuery::new(vec![1.0, 0.0, 0.0]))
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(gateway.status().cached_tables, vec!["t"]);
}

#[test]
fn test_unknown_backend_fails_connect() {
    let temp = TempDir::new().unwrap();
    let gateway = Gateway::new(GatewayConfig::new(temp.path()).with_backend("nope"));

    let err = gateway.connect().unwrap_err();
    assert_eq!(err.database_kind(), Some(DatabaseErrorKind::Connect));
    assert!(!gateway.is_connected());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_adds_are_all_stored() {
    let temp = TempDir::new().unwrap();
    let gateway = Arc::new(connected_gateway(&temp));
    gateway.create_table(&TableConfig::new("t", 4)).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let gateway = Arc::clone(&gateway);
            thread::spawn(move || {
                for i in 0..10 {
                    let data = VectorData::new(unit(4, worker + i))
                        .with_text(format!("w{worker}-{i}"));
                    gateway.add_vector("t", &data).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(row_count(&gateway, "t"), 80);
    let hits = gateway
        .search_vectors("t", &SearchQuery::new(unit(4, 0)).with_limit(100))
        .unwrap();
    assert_eq!(hits.len(), 80);
}

// ============================================================================
// LanceDB
// ============================================================================

#[test]
fn test_lancedb_scenario() {
    let temp = TempDir::new().unwrap();
    let gateway = Gateway::new(GatewayConfig::new(temp.path().join("lance")));
    gateway.connect().unwrap();

    gateway.create_table(&TableConfig::new("t", 3)).unwrap();
    gateway
        .add_vector("t", &VectorData::new(vec![1.0, 0.0, 0.0]).with_text("a"))
        .unwrap();
    gateway
        .add_vector("t", &VectorData::new(vec![0.0, 1.0, 0.0]).with_text("b"))
        .unwrap();

    let hits = gateway
        .search_vectors("t", &SearchQuery::new(vec![1.0, 0.0, 0.0]).with_limit(1))
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text.as_deref(), Some("a"));

    let hits = gateway
        .search_vectors("t", &SearchQuery::new(vec![1.0, 0.0, 0.0]))
        .unwrap();
    assert_eq!(hits.len(), 2);

    assert_eq!(gateway.list_tables().unwrap(), vec!["t"]);

    let err = gateway
        .add_vector("t", &VectorData::new(vec![1.0, 0.0]))
        .unwrap_err();
    assert!(err.is_validation());

    gateway.disconnect().unwrap();
}
