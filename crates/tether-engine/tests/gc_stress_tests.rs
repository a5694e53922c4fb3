//! Garbage Collection Stress Tests
//!
//! Validates collector correctness through the public engine API:
//! - Rooted values survive repeated collections
//! - Unrooted graphs (including cycles) are reclaimed
//! - Counted roots balance across clones and drops
//! - Stale handles are detected after slot reuse
//!
//! # Running Tests
//! ```bash
//! cargo test -p tether-engine --test gc_stress_tests
//! ```

use tether_engine::{Engine, EngineOptions, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

// ===== Rapid Allocation Tests =====

#[test]
fn test_rapid_allocation_and_collection() {
    init_tracing();
    let engine = Engine::default();

    for _ in 0..10_000 {
        engine.create_object().unwrap();
    }
    assert_eq!(engine.live_objects(), 10_000);

    let stats = engine.collect();
    assert_eq!(stats.collections, 1);
    assert_eq!(stats.last_freed_count, 10_000);
    assert_eq!(engine.live_objects(), 0);
}

#[test]
fn test_safepoint_collects_after_threshold() {
    let engine = Engine::new(EngineOptions::with_gc_threshold(100));
    let keep = engine.root(engine.create_object().unwrap());

    let mut collections = 0;
    for _ in 0..1_000 {
        engine.create_array(1).unwrap();
        if engine.safepoint() {
            collections += 1;
        }
    }

    assert_eq!(collections, 10);
    assert!(engine.is_alive(keep.value()));
}

// ===== Root Tests =====

#[test]
fn test_root_clones_are_counted() {
    init_tracing();
    let engine = Engine::default();
    let obj = engine.create_object().unwrap();

    let a = engine.root(obj.clone());
    let b = a.clone();
    assert_eq!(engine.protect_count(&obj), 2);

    drop(a);
    engine.collect();
    assert!(engine.is_alive(&obj));
    assert_eq!(engine.protect_count(&obj), 1);

    drop(b);
    assert_eq!(engine.protect_count(&obj), 0);
    engine.collect();
    assert!(!engine.is_alive(&obj));
}

#[test]
fn test_rooted_graph_survives_repeated_collections() {
    let engine = Engine::default();
    let root = engine.root(engine.create_object().unwrap());

    let mut current = root.value().clone();
    for depth in 0..100 {
        let child = engine.create_object().unwrap();
        engine.set(&current, "next", child.clone()).unwrap();
        engine.set(&child, "depth", Value::from(depth)).unwrap();
        current = child;
    }

    for _ in 0..5 {
        engine.collect();
    }

    assert_eq!(engine.live_objects(), 101);
    let mut walk = root.value().clone();
    for depth in 0..100 {
        walk = engine.get(&walk, "next").unwrap();
        assert_eq!(engine.get(&walk, "depth").unwrap(), Value::from(depth));
    }
}

// ===== Circular References =====

#[test]
fn test_unrooted_cycle_is_reclaimed() {
    let engine = Engine::default();
    let a = engine.create_object().unwrap();
    let b = engine.create_array_from(&[a.clone()]).unwrap();
    engine.set(&a, "b", b.clone()).unwrap();

    engine.collect();
    assert!(!engine.is_alive(&a));
    assert!(!engine.is_alive(&b));
}

#[test]
fn test_rooted_cycle_survives() {
    let engine = Engine::default();
    let a = engine.create_object().unwrap();
    let b = engine.create_object().unwrap();
    engine.set(&a, "b", b.clone()).unwrap();
    engine.set(&b, "a", a.clone()).unwrap();

    let _root = engine.root(b.clone());
    engine.collect();
    assert!(engine.is_alive(&a));
    assert!(engine.is_alive(&b));
}

// ===== Stale Handles =====

#[test]
fn test_stale_handle_after_reuse() {
    let engine = Engine::default();
    let old = engine.create_object().unwrap();
    engine.collect();

    let new = engine.create_object().unwrap();
    assert_eq!(old.as_handle().unwrap().index(), new.as_handle().unwrap().index());
    assert!(!engine.is_alive(&old));
    assert!(engine.is_alive(&new));
    assert!(engine.object_kind(&old).is_none());
    assert!(engine.get(&old, "x").is_err());
}

#[test]
fn test_heap_limit_is_enforced() {
    let engine = Engine::new(EngineOptions::with_heap_limit(3));
    for _ in 0..3 {
        engine.create_object().unwrap();
    }
    assert!(engine.create_object().is_err());

    engine.collect();
    assert!(engine.create_object().is_ok());
}
