//! End-to-end progression and effect scenarios driven through [`Engine`].
//!
//! Every test builds its own engine from scratch with a fixed clock, so the
//! suite is deterministic and needs no external services.

// Integration tests use unwrap extensively for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::too_many_lines
)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use reverie_core::{Engine, EngineConfig, JsonFileStore, MemoryStore, Snapshot, SnapshotStore};
use reverie_progression::{LevelingCurve, RepairWarning};
use reverie_types::{
    Companion, CompanionId, EffectId, EffectKind, EventCategory, Form, FormId, XpSource,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// =============================================================================
// Helpers
// =============================================================================

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 21, 3, 0, 0).unwrap()
}

fn empty_engine() -> Engine {
    Engine::new(EngineConfig::default())
}

fn companion(id: &str, forms: Vec<Form>, auto_evolve: bool) -> Companion {
    let mut c = Companion::new(CompanionId::new(id), id, forms);
    c.auto_evolve = auto_evolve;
    c
}

/// Four-stage chain unlocking at levels 1, 3, 7, and 12.
fn four_stage_chain() -> Vec<Form> {
    vec![
        Form::new(FormId::new("f1"), "Spark", 1),
        Form::new(FormId::new("f3"), "Flicker", 3),
        Form::new(FormId::new("f7"), "Flame", 7),
        Form::new(FormId::new("f12"), "Blaze", 12),
    ]
}

fn active_form(engine: &Engine, id: &str) -> FormId {
    engine
        .manager()
        .companion(&CompanionId::new(id))
        .unwrap()
        .active_form_id
        .clone()
}

// =============================================================================
// Leveling
// =============================================================================

#[test]
fn xp_stays_below_next_threshold_after_every_gain() {
    let mut engine = empty_engine();
    engine
        .add_companion(companion("lumen", four_stage_chain(), true))
        .unwrap();
    let id = CompanionId::new("lumen");
    let curve = LevelingCurve::default();

    let gains = [0_i64, 7, 40, 13, 250, 1, 999, 60, 3, 5_000];
    let mut last_level = 1;
    for gain in gains {
        engine.award_xp_amount(&id, gain, now()).unwrap();
        let c = engine.manager().companion(&id).unwrap();
        assert!(
            c.xp < curve.xp_required_for_level(c.level + 1),
            "xp {} not below threshold at level {}",
            c.xp,
            c.level
        );
        assert!(c.level >= last_level, "level regressed");
        last_level = c.level;
    }
}

#[test]
fn negative_gain_never_regresses() {
    let mut engine = empty_engine();
    engine
        .add_companion(companion("lumen", four_stage_chain(), true))
        .unwrap();
    let id = CompanionId::new("lumen");
    engine.award_xp_amount(&id, 55, now()).unwrap();
    let before = engine.manager().companion(&id).cloned().unwrap();

    let outcome = engine.award_xp_amount(&id, -500, now()).unwrap();
    assert_eq!(outcome.amount, 0);
    assert_eq!(engine.manager().companion(&id), Some(&before));
}

#[test]
fn only_reset_lowers_level() {
    let mut engine = empty_engine();
    engine
        .add_companion(companion("lumen", four_stage_chain(), true))
        .unwrap();
    let id = CompanionId::new("lumen");
    engine.award_xp_amount(&id, 400, now()).unwrap();
    assert!(engine.view(&id).unwrap().level > 1);

    assert!(engine.reset_evolution(&id));
    let view = engine.view(&id).unwrap();
    assert_eq!(view.level, 1);
    assert_eq!(view.xp, 0);
    assert_eq!(active_form(&engine, "lumen"), FormId::new("f1"));
}

// =============================================================================
// Evolution
// =============================================================================

#[test]
fn three_gains_of_thirty() {
    let mut engine = empty_engine();
    let forms = vec![
        Form::new(FormId::new("F0"), "Seed", 1),
        Form::new(FormId::new("F1"), "Sprout", 3).with_buff(EffectKind::XpMultiplier, dec!(1.25)),
    ];
    engine.add_companion(companion("e", forms, true)).unwrap();
    let id = CompanionId::new("e");

    engine.award_xp_amount(&id, 30, now()).unwrap();
    let view = engine.view(&id).unwrap();
    assert_eq!((view.level, view.xp), (1, 30));

    engine.award_xp_amount(&id, 30, now()).unwrap();
    let view = engine.view(&id).unwrap();
    assert_eq!((view.level, view.xp), (2, 20));
    assert_eq!(active_form(&engine, "e"), FormId::new("F0"));

    // 50 < 60, the level 3 threshold.
    engine.award_xp_amount(&id, 30, now()).unwrap();
    let view = engine.view(&id).unwrap();
    assert_eq!((view.level, view.xp), (2, 50));
    assert_eq!(active_form(&engine, "e"), FormId::new("F0"));
    assert_eq!(engine.multiplier(EventCategory::Xp, now()), Decimal::ONE);

    let outcome = engine.award_xp_amount(&id, 30, now()).unwrap();
    assert_eq!((outcome.level_before, outcome.level_after), (2, 3));
    assert_eq!(active_form(&engine, "e"), FormId::new("F1"));
    assert_eq!(engine.multiplier(EventCategory::Xp, now()), dec!(1.25));
}

#[test]
fn repeated_quests_visit_every_form_in_order() {
    let mut engine = empty_engine();
    engine
        .add_companion(companion("lumen", four_stage_chain(), true))
        .unwrap();
    let id = CompanionId::new("lumen");

    let mut visited = vec![active_form(&engine, "lumen")];
    for _ in 0..100 {
        let award = engine.award_xp(std::slice::from_ref(&id), XpSource::Quest, now());
        for record in award.evolutions() {
            assert_eq!(&record.from_form_id, visited.last().unwrap());
            visited.push(record.to_form_id.clone());
        }
        if engine.view(&id).unwrap().level >= 12 {
            break;
        }
    }

    let expected: Vec<FormId> = ["f1", "f3", "f7", "f12"].into_iter().map(FormId::new).collect();
    assert_eq!(visited, expected);
}

#[test]
fn large_jump_cascades_one_hop_at_a_time() {
    let mut engine = empty_engine();
    engine
        .add_companion(companion("lumen", four_stage_chain(), true))
        .unwrap();
    let id = CompanionId::new("lumen");
    engine.award_xp_amount(&id, 40, now()).unwrap();
    assert_eq!(engine.view(&id).unwrap().level, 2);

    // Thresholds for levels 3..=9 sum to 840.
    let outcome = engine.award_xp_amount(&id, 840, now()).unwrap();
    assert_eq!(outcome.level_after, 9);
    let hops: Vec<(&str, &str)> = outcome
        .evolutions
        .iter()
        .map(|r| (r.from_form_id.as_str(), r.to_form_id.as_str()))
        .collect();
    assert_eq!(hops, vec![("f1", "f3"), ("f3", "f7")]);
    assert!(outcome.evolutions.iter().all(|r| r.auto));
    assert_eq!(engine.manager().recent_evolutions().len(), 2);
}

#[test]
fn manual_evolution_when_auto_is_off() {
    let mut engine = empty_engine();
    engine
        .add_companion(companion("lumen", four_stage_chain(), false))
        .unwrap();
    let id = CompanionId::new("lumen");
    engine.award_xp_amount(&id, 1_000, now()).unwrap();
    assert_eq!(active_form(&engine, "lumen"), FormId::new("f1"));
    assert!(engine.view(&id).unwrap().evolution_ready);

    let record = engine.evolve_companion(&id, now()).unwrap();
    assert!(!record.auto);
    assert_eq!(active_form(&engine, "lumen"), FormId::new("f3"));

    let drained = engine.acknowledge_recent_evolutions();
    assert_eq!(drained, vec![record]);
    assert!(engine.manager().recent_evolutions().is_empty());
}

// =============================================================================
// Effects
// =============================================================================

#[test]
fn multipliers_compound() {
    let mut engine = empty_engine();
    for (id, value) in [("a", dec!(1.1)), ("b", dec!(1.2)), ("c", dec!(1.5))] {
        let form = Form::new(FormId::new("only"), "Only", 1).with_buff(EffectKind::XpMultiplier, value);
        engine.add_companion(companion(id, vec![form], false)).unwrap();
    }

    let outcome = engine.preview_event(EventCategory::Xp, dec!(100), now());
    assert_eq!(outcome.value, dec!(198));
    assert_eq!(outcome.applied.len(), 3);
    assert_eq!(engine.scale_reward(EventCategory::Xp, dec!(100), now()), dec!(198));
}

#[test]
fn expired_records_reported_even_when_inactive() {
    let mut engine = empty_engine();
    let forms = vec![
        Form::new(FormId::new("f1"), "Spark", 1),
        Form::new(FormId::new("f3"), "Flicker", 3).with_buff(EffectKind::TokenMultiplier, dec!(2)),
    ];
    engine.add_companion(companion("lumen", forms, false)).unwrap();
    let effect = EffectId::derive(
        &CompanionId::new("lumen"),
        &FormId::new("f3"),
        EffectKind::TokenMultiplier,
    );
    assert!(!engine.effects().get(&effect).unwrap().active);

    engine.set_effect_expiry(&effect, Some(now() - Duration::minutes(1)));
    let outcome = engine.preview_event(EventCategory::Tokens, dec!(10), now());
    assert_eq!(outcome.expired, vec![effect]);
    assert_eq!(outcome.value, dec!(10));
}

#[test]
fn active_form_switch_moves_effects() {
    let mut engine = empty_engine();
    let forms = vec![
        Form::new(FormId::new("f1"), "Spark", 1).with_buff(EffectKind::ObedienceGain, dec!(1.5)),
        Form::new(FormId::new("f3"), "Flicker", 3).with_buff(EffectKind::ClarityBoost, dec!(1.1)),
    ];
    engine.add_companion(companion("lumen", forms, false)).unwrap();
    let id = CompanionId::new("lumen");
    engine.award_xp_amount(&id, 100, now()).unwrap();

    assert!(engine.set_active_form(&id, &FormId::new("f3")));
    assert_eq!(engine.multiplier(EventCategory::Obedience, now()), Decimal::ONE);
    assert_eq!(
        engine.scale_reward(EventCategory::Clarity, dec!(1.5), now()),
        dec!(1.65)
    );
    assert!(!engine.set_active_form(&id, &FormId::new("missing")));
}

#[test]
fn removing_companion_removes_its_records() {
    let mut engine = empty_engine();
    let form = Form::new(FormId::new("only"), "Only", 1).with_buff(EffectKind::XpMultiplier, dec!(1.3));
    engine.add_companion(companion("a", vec![form.clone()], false)).unwrap();
    engine.add_companion(companion("b", vec![form], false)).unwrap();
    assert_eq!(engine.effects().len(), 2);

    engine.remove_companion(&CompanionId::new("a")).unwrap();
    assert_eq!(engine.effects().len(), 1);
    assert!(
        engine
            .effects()
            .records()
            .all(|r| r.source.0.starts_with("companion:b:"))
    );
}

#[test]
fn second_sync_is_a_noop() {
    let mut engine = empty_engine();
    engine
        .add_companion(companion("lumen", four_stage_chain(), true))
        .unwrap();
    engine
        .add_form(
            &CompanionId::new("lumen"),
            Form::new(FormId::new("f20"), "Nova", 20).with_buff(EffectKind::XpMultiplier, dec!(3)),
        )
        .unwrap();
    engine.sync();
    assert!(engine.sync().is_noop());
}

#[test]
fn removing_form_drops_its_records() {
    let mut engine = empty_engine();
    let forms = vec![
        Form::new(FormId::new("f1"), "Spark", 1),
        Form::new(FormId::new("f3"), "Flicker", 3).with_buff(EffectKind::XpMultiplier, dec!(1.2)),
    ];
    engine.add_companion(companion("lumen", forms, false)).unwrap();
    assert_eq!(engine.effects().len(), 1);

    let (removed, warnings) = engine
        .remove_form(&CompanionId::new("lumen"), &FormId::new("f3"))
        .unwrap();
    assert_eq!(removed.id, FormId::new("f3"));
    assert!(warnings.is_empty());
    assert!(engine.effects().is_empty());
}

#[test]
fn colon_bearing_ids_stack_independently() {
    let mut engine = empty_engine();
    let left = Form::new(FormId::new("b:c"), "Left", 1).with_buff(EffectKind::XpMultiplier, dec!(2));
    let right = Form::new(FormId::new("c"), "Right", 1).with_buff(EffectKind::XpMultiplier, dec!(3));
    engine.add_companion(companion("a", vec![left], false)).unwrap();
    engine.add_companion(companion("a:b", vec![right], false)).unwrap();

    assert_eq!(engine.effects().len(), 2);
    assert_eq!(engine.multiplier(EventCategory::Xp, now()), dec!(6));
    assert!(engine.sync().is_noop());
}

#[test]
fn enormous_award_keeps_threshold_invariant() {
    let mut engine = empty_engine();
    engine
        .add_companion(companion("lumen", four_stage_chain(), true))
        .unwrap();
    let id = CompanionId::new("lumen");

    let outcome = engine.award_xp_amount(&id, i64::MAX, now()).unwrap();
    let c = engine.manager().companion(&id).unwrap();
    assert!(c.xp < LevelingCurve::default().xp_required_for_level(c.level + 1));
    assert_eq!(outcome.level_after, c.level);
    assert_eq!(c.active_form_id, FormId::new("f12"));
    assert_eq!(outcome.evolutions.len(), 3);
    assert_eq!(engine.view(&id).unwrap().level, c.level);
}

// =============================================================================
// Persistence and repair
// =============================================================================

#[test]
fn corrupt_snapshot_is_repaired_on_load() {
    let json = r#"{
        "companions": [
            { "id": "ghost", "name": "Ghost", "forms": [], "active_form_id": "gone" },
            { "id": "moth", "name": "Moth", "level": 0, "xp": 9999,
              "active_form_id": "missing",
              "forms": [
                { "id": "wisp", "name": "Wisp", "unlock_level": 1,
                  "buff": { "XpMultiplier": "1.5" } }
              ] }
        ],
        "effects": [
            { "id": "companion:nobody:none:xpMultiplier", "name": "stale",
              "source": "companion:nobody:none", "kind": "XpMultiplier",
              "value": "9", "active": true }
        ]
    }"#;
    let snapshot = Snapshot::from_json(json).unwrap();
    let (engine, warnings) = Engine::load(EngineConfig::default(), snapshot);

    assert!(warnings.iter().any(|w| matches!(w, RepairWarning::SynthesizedForm { .. })));
    assert!(warnings.iter().any(|w| matches!(w, RepairWarning::LevelRaised { .. })));
    assert!(warnings.iter().any(|w| matches!(w, RepairWarning::XpClamped { .. })));
    assert!(warnings.iter().any(|w| matches!(w, RepairWarning::ActiveFormDangling { .. })));

    let ghost = engine.manager().companion(&CompanionId::new("ghost")).unwrap();
    assert_eq!(ghost.forms.len(), 1);
    assert_eq!(ghost.active_form_id, ghost.forms[0].id);

    let moth = engine.manager().companion(&CompanionId::new("moth")).unwrap();
    assert_eq!(moth.level, 1);
    assert_eq!(moth.active_form_id, FormId::new("wisp"));
    assert!(moth.xp < LevelingCurve::default().xp_required_for_level(2));

    assert_eq!(engine.effects().len(), 1);
    assert_eq!(engine.multiplier(EventCategory::Xp, now()), dec!(1.5));
}

#[test]
fn memory_store_round_trip_through_engine() {
    let mut store = MemoryStore::new();
    let (mut engine, _) = Engine::open(EngineConfig::default(), &store).unwrap();
    engine
        .add_companion(companion("lumen", four_stage_chain(), true))
        .unwrap();
    engine.award_xp(&[CompanionId::new("lumen")], XpSource::Ritual, now());
    engine.save(&mut store).unwrap();

    let (reopened, warnings) = Engine::open(EngineConfig::default(), &store).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(reopened.snapshot(), engine.snapshot());
    assert_eq!(reopened.manager().recent_xp().len(), 1);
}

#[test]
fn file_store_round_trip_through_engine() {
    let path = std::env::temp_dir().join(format!("reverie-{}.json", uuid::Uuid::now_v7()));
    let mut store = JsonFileStore::new(&path);
    assert!(store.load().unwrap().is_none());

    let mut engine = empty_engine();
    engine
        .add_companion(companion("lumen", four_stage_chain(), true))
        .unwrap();
    engine.save(&mut store).unwrap();

    let (reopened, _) = Engine::open(EngineConfig::default(), &store).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(reopened.snapshot(), engine.snapshot());
}

#[test]
fn configured_rewards_and_curve_apply() {
    let yaml = "leveling:\n  min_threshold: 10\n  per_level: 10\nxp_rewards:\n  dream: 25\n";
    let mut engine = Engine::new(EngineConfig::parse(yaml).unwrap());
    engine
        .add_companion(companion("lumen", four_stage_chain(), true))
        .unwrap();

    let award = engine.award_xp(&[CompanionId::new("lumen")], XpSource::Dream, now());
    let outcome = &award.outcomes[0];
    assert_eq!(outcome.amount, 25);
    // 20 for level 2, then 5 toward level 3's 30.
    assert_eq!(outcome.level_after, 2);
    assert_eq!(engine.view(&CompanionId::new("lumen")).unwrap().xp, 5);
}
