//! Save/load laws at the workspace level: round-trip through the real
//! loader-built catalog, forward migration, and fail-closed behavior.

use pathways_core::amount::amount;
use pathways_core::command::Command;
use pathways_core::engine::{Engine, EngineConfig};
use pathways_core::save::{deserialize, serialize, SaveError, SAVE_VERSION};
use pathways_data::load_catalog;

const CONTENT: &str = r#"{
    "paths": [
        { "name": "warrior", "start_unlocked": true },
        { "name": "merchant", "unlock_cost": [{ "resource": "gold", "amount": "30" }] }
    ],
    "resources": [
        { "name": "gold", "path": "warrior", "initial": "200" },
        { "name": "iron", "path": "warrior", "initial": "0" },
        { "name": "reputation", "path": "warrior", "initial": "0" },
        { "name": "silk", "path": "merchant", "initial": "0" }
    ],
    "ownables": [
        {
            "name": "mine",
            "path": "warrior",
            "kind": "upgrade",
            "cost": [{ "resource": "gold", "amount": "15" }],
            "grants": [{
                "target": { "kind": "resource_rate", "resource": "iron" },
                "op": "additive",
                "magnitude": "0.5"
            }]
        },
        {
            "name": "iron_commission",
            "path": "warrior",
            "kind": "crafting_recipe",
            "requires": [{ "resource": "iron", "amount": "5" }],
            "reward": { "resource": "reputation", "amount": "1" }
        },
        {
            "name": "silk_road",
            "path": "merchant",
            "kind": "trade_route",
            "give": [{ "resource": "gold", "amount": "10" }],
            "receive": [{ "resource": "silk", "amount": "4" }],
            "transit": 50
        }
    ],
    "achievements": [
        {
            "name": "ironbound",
            "predicate": { "kind": "resource_at_least", "resource": "iron", "amount": "1" }
        }
    ]
}"#;

fn catalog() -> pathways_core::catalog::Catalog {
    load_catalog(CONTENT).unwrap()
}

fn busy_engine() -> Engine {
    let mut e = Engine::new(catalog(), EngineConfig::default());
    for name in ["mine", "iron_commission"] {
        let ownable = e.catalog().ownable_by_name(name).unwrap();
        e.execute(Command::PurchaseOwnable { ownable }).unwrap();
    }
    let merchant = e.catalog().path_by_name("merchant").unwrap();
    e.execute(Command::UnlockPath { path: merchant }).unwrap();
    let silk_road = e.catalog().ownable_by_name("silk_road").unwrap();
    e.execute(Command::PurchaseOwnable { ownable: silk_road }).unwrap();
    let recipe = e.catalog().ownable_by_name("iron_commission").unwrap();
    e.execute(Command::SubmitOrder {
        recipe,
        requester: e.catalog().path_by_name("warrior").unwrap(),
        expires_in: 500,
    })
    .unwrap();
    // Leaves a pending order, an in-flight shipment, a granted achievement,
    // fractional iron, and a sub-step remainder.
    e.advance(7_300);
    e
}

#[test]
fn round_trip_is_lossless_within_one_version() {
    let original = busy_engine();
    let text = serialize(&original, 123_456).unwrap();
    let (restored, saved_at) = deserialize(&text, catalog(), EngineConfig::default()).unwrap();

    assert_eq!(saved_at, 123_456);
    assert_eq!(restored.state().tick, original.state().tick);
    assert_eq!(restored.remainder_ms(), original.remainder_ms());
    assert_eq!(
        restored.state().ledger.snapshot(),
        original.state().ledger.snapshot()
    );
    assert_eq!(restored.state().owned, original.state().owned);
    assert_eq!(restored.state().granted, original.state().granted);
    assert_eq!(restored.state().orders, original.state().orders);
    assert_eq!(restored.state().shipments, original.state().shipments);

    // Serializing the restored engine reproduces the same document.
    assert_eq!(serialize(&restored, 123_456).unwrap(), text);
}

#[test]
fn restored_engine_continues_identically() {
    let mut original = busy_engine();
    let text = serialize(&original, 0).unwrap();
    let (mut restored, _) = deserialize(&text, catalog(), EngineConfig::default()).unwrap();

    let a = original.advance(60_000);
    let b = restored.advance(60_000);
    assert_eq!(a.net, b.net);
    assert_eq!(
        original.state().ledger.snapshot(),
        restored.state().ledger.snapshot()
    );
    assert_eq!(original.state().shipments, restored.state().shipments);
}

#[test]
fn v1_migration_equals_fresh_v1_semantics() {
    // A version-1 save: gold as a JSON integer, no reputation entry.
    let v1 = r#"{
        "version": 1,
        "saved_at_ms": 10,
        "tick": 40,
        "remainder_ms": 0,
        "ledger": { "gold": 170, "iron": 12, "silk": 0 },
        "unlocked_paths": ["warrior"],
        "owned": ["mine"],
        "golems": [],
        "orders": [],
        "shipments": [],
        "granted": [],
        "next_order": 0,
        "next_shipment": 0
    }"#;
    let (migrated, _) = deserialize(v1, catalog(), EngineConfig::default()).unwrap();

    // Equivalent current-version document, with reputation made explicit.
    let v2 = r#"{
        "version": 2,
        "saved_at_ms": 10,
        "tick": 40,
        "remainder_ms": 0,
        "ledger": { "gold": "170", "iron": "12", "reputation": "0", "silk": "0" },
        "unlocked_paths": ["warrior"],
        "owned": ["mine"],
        "golems": [],
        "orders": [],
        "shipments": [],
        "granted": [],
        "next_order": 0,
        "next_shipment": 0
    }"#;
    let (fresh, _) = deserialize(v2, catalog(), EngineConfig::default()).unwrap();

    assert_eq!(
        migrated.state().ledger.snapshot(),
        fresh.state().ledger.snapshot()
    );
    let gold = migrated.catalog().resource_by_name("gold").unwrap();
    let rep = migrated.catalog().resource_by_name("reputation").unwrap();
    assert_eq!(migrated.state().ledger.get(gold), amount(170));
    assert_eq!(migrated.state().ledger.get(rep), amount(0));
}

#[test]
fn future_versions_fail_closed() {
    let text = format!(r#"{{ "version": {} }}"#, SAVE_VERSION + 5);
    let err = deserialize(&text, catalog(), EngineConfig::default()).unwrap_err();
    assert_eq!(err, SaveError::UnsupportedVersion(SAVE_VERSION + 5));
}

#[test]
fn corrupt_documents_are_errors_not_panics() {
    for text in [
        "",
        "]",
        r#"{"version": 2}"#,
        r#"{"version": 2, "ledger": "not a map"}"#,
    ] {
        let err = deserialize(text, catalog(), EngineConfig::default()).unwrap_err();
        assert!(
            matches!(err, SaveError::Corruption(_)),
            "unexpected result for {text:?}: {err:?}"
        );
    }
}
