//! Property tests for the engine's core laws: ledger bounds, advance
//! associativity, grant idempotence, and atomic fulfillment.

use pathways_core::amount::amount;
use pathways_core::catalog::{Catalog, CatalogBuilder, CostEntry, ModifierSpec, OwnableKind};
use pathways_core::command::Command;
use pathways_core::engine::{Engine, EngineConfig};
use pathways_core::event::EventKind;
use pathways_core::id::{PathId, ResourceId};
use pathways_core::ledger::{ResourceDelta, ResourceLedger};
use pathways_core::modifier::{ModifierOp, ModifierTarget, Predicate};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn bounded_ledger() -> ResourceLedger {
    ResourceLedger::from_rows(vec![
        (amount(50), None, Some(amount(100))),
        (amount(10), Some(amount(40)), Some(amount(80))),
        (amount(0), None, None),
    ])
}

fn in_bounds(ledger: &ResourceLedger) -> bool {
    let caps = [Some(amount(100)), Some(amount(80)), None];
    ledger
        .snapshot()
        .iter()
        .zip(caps)
        .all(|(&v, cap)| v >= Decimal::ZERO && cap.map_or(true, |c| v <= c))
}

proptest! {
    /// Whatever sequence of deltas is thrown at it, the ledger never leaves
    /// `[0, hard cap]` at any observable point.
    #[test]
    fn ledger_amounts_stay_in_bounds(
        deltas in prop::collection::vec(
            prop::collection::vec((0u32..4, -120i64..120), 1..4),
            1..40,
        )
    ) {
        let mut ledger = bounded_ledger();
        for entries in deltas {
            let delta: ResourceDelta = entries
                .into_iter()
                .map(|(r, v)| (ResourceId(r), amount(v)))
                .collect();
            let _ = ledger.apply(&delta);
            prop_assert!(in_bounds(&ledger));
        }
    }

    /// Applying a delta either commits fully or not at all.
    #[test]
    fn ledger_apply_is_atomic(
        entries in prop::collection::vec((0u32..3, -120i64..120), 1..4)
    ) {
        let mut ledger = bounded_ledger();
        let before = ledger.snapshot();
        let delta: ResourceDelta = entries
            .into_iter()
            .map(|(r, v)| (ResourceId(r), amount(v)))
            .collect();
        match ledger.apply(&delta) {
            Ok(()) => {
                for (&r, &v) in delta.iter() {
                    prop_assert_eq!(ledger.get(r), before[r.0 as usize] + v);
                }
            }
            Err(_) => prop_assert_eq!(ledger.snapshot(), before),
        }
    }

    /// `advance(d1); advance(d2)` equals `advance(d1 + d2)` when no discrete
    /// boundary events fall inside either sub-window.
    #[test]
    fn advance_is_associative_on_steady_windows(split in 0u64..300, total in 0u64..300) {
        let (a, b) = (split.min(total), total - split.min(total));
        let mut split_engine = production_engine();
        let mut whole_engine = production_engine();
        split_engine.advance_steps(a);
        split_engine.advance_steps(b);
        whole_engine.advance_steps(total);
        prop_assert_eq!(
            split_engine.state().ledger.snapshot(),
            whole_engine.state().ledger.snapshot()
        );
        prop_assert_eq!(split_engine.state().tick, whole_engine.state().tick);
    }

    /// The sub-step remainder carries across arbitrary millisecond splits.
    #[test]
    fn elapsed_milliseconds_are_never_dropped(chunks in prop::collection::vec(0u64..5000, 1..20)) {
        let total: u64 = chunks.iter().sum();
        let mut piecewise = production_engine();
        for chunk in chunks {
            piecewise.advance(chunk);
        }
        let mut whole = production_engine();
        whole.advance(total);
        prop_assert_eq!(
            piecewise.state().ledger.snapshot(),
            whole.state().ledger.snapshot()
        );
        prop_assert_eq!(piecewise.remainder_ms(), whole.remainder_ms());
    }
}

fn production_engine() -> Engine {
    let mut b = CatalogBuilder::new();
    let p = b.add_path("gathering", true, vec![]).unwrap();
    let wood = b
        .add_resource("wood", p, amount(0), Some(amount(300)), Some(amount(500)))
        .unwrap();
    b.add_ownable(
        "axe",
        p,
        OwnableKind::Upgrade,
        vec![],
        vec![ModifierSpec {
            target: ModifierTarget::ResourceRate(wood),
            op: ModifierOp::Additive,
            magnitude: amount(3),
            predicate: None,
        }],
        vec![],
    )
    .unwrap();
    let catalog = b.build().unwrap();
    let mut e = Engine::new(catalog, EngineConfig::default());
    let axe = e.catalog().ownable_by_name("axe").unwrap();
    e.execute(Command::PurchaseOwnable { ownable: axe }).unwrap();
    e
}

fn achievement_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();
    let p = b.add_path("warrior", true, vec![]).unwrap();
    let gold = b.add_resource("gold", p, amount(100), None, None).unwrap();
    b.add_achievement(
        "rich",
        Predicate::ResourceAtLeast(gold, amount(50)),
        vec![ModifierSpec {
            target: ModifierTarget::ResourceRate(gold),
            op: ModifierOp::Additive,
            magnitude: amount(1),
            predicate: None,
        }],
    )
    .unwrap();
    b.build().unwrap()
}

#[test]
fn achievement_rewards_apply_exactly_once() {
    let mut e = Engine::new(achievement_catalog(), EngineConfig::default());
    let report = e.advance_steps(1);
    let grants = report
        .events
        .iter()
        .filter(|ev| ev.kind() == EventKind::AchievementGranted)
        .count();
    assert_eq!(grants, 1);
    // +1/step from the grant onward; many further evaluations, no stacking.
    let report = e.advance_steps(10);
    assert!(report
        .events
        .iter()
        .all(|ev| ev.kind() != EventKind::AchievementGranted));
    let gold = ResourceId(0);
    assert_eq!(e.state().ledger.get(gold), amount(110));
}

#[test]
fn crafting_fulfillment_is_all_or_nothing() {
    let mut b = CatalogBuilder::new();
    let p = b.add_path("warrior", true, vec![]).unwrap();
    let iron = b.add_resource("iron", p, amount(4), None, None).unwrap();
    let wood = b.add_resource("wood", p, amount(100), None, None).unwrap();
    let rep = b.add_resource("reputation", p, amount(0), None, None).unwrap();
    b.add_ownable(
        "armor_kit",
        p,
        OwnableKind::CraftingRecipe {
            requires: vec![
                CostEntry {
                    resource: iron,
                    amount: amount(5),
                },
                CostEntry {
                    resource: wood,
                    amount: amount(10),
                },
            ],
            reward: CostEntry {
                resource: rep,
                amount: amount(1),
            },
        },
        vec![],
        vec![],
        vec![],
    )
    .unwrap();
    let catalog = b.build().unwrap();
    let mut e = Engine::new(catalog, EngineConfig::default());
    let recipe = e.catalog().ownable_by_name("armor_kit").unwrap();
    e.execute(Command::PurchaseOwnable { ownable: recipe }).unwrap();
    e.execute(Command::SubmitOrder {
        recipe,
        requester: PathId(0),
        expires_in: 100,
    })
    .unwrap();

    // Wood is plentiful but iron is one short: nothing may be deducted.
    e.advance_steps(3);
    assert_eq!(e.state().ledger.get(iron), amount(4));
    assert_eq!(e.state().ledger.get(wood), amount(100));
    assert_eq!(e.state().ledger.get(rep), amount(0));
    assert_eq!(e.state().orders.len(), 1);
}
