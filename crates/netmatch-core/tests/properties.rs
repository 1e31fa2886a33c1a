//! Property-based tests over randomly generated circuits.

use netmatch_core::{Engine, MemorySink, VertexKind};
use proptest::prelude::*;

/// A randomly generated circuit: per device, a master index and the net
/// pool indices wired to its terminals.
#[derive(Debug, Clone)]
struct CircuitSpec {
    devices: Vec<(usize, Vec<usize>)>,
}

/// Masters available to generated circuits: name and pin labels. The
/// nand's two "in" pins share a terminal class.
const MASTERS: [(&str, &[&str]); 3] = [
    ("inv", &["in", "out"]),
    ("nand2", &["in", "in", "out"]),
    ("load", &["t"]),
];

fn circuit_strategy() -> impl Strategy<Value = CircuitSpec> {
    let device = (0usize..MASTERS.len()).prop_flat_map(|master| {
        let pins = MASTERS[master].1.len();
        proptest::collection::vec(0usize..6, pins).prop_map(move |nets| (master, nets))
    });
    proptest::collection::vec(device, 1..8).prop_map(|devices| CircuitSpec { devices })
}

fn build_engine(spec: &CircuitSpec) -> Engine {
    let mut engine = Engine::new();
    for (name, labels) in MASTERS {
        engine.define_device_master(name, labels).unwrap();
    }
    for graph in 0..2 {
        for (i, (master, nets)) in spec.devices.iter().enumerate() {
            let names: Vec<String> = nets.iter().map(|n| format!("n{}", n)).collect();
            let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
            engine
                .define_device_vertex(graph, MASTERS[*master].0, &format!("u{}", i), &name_refs)
                .unwrap();
        }
    }
    engine
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Reflexivity: a circuit always matches itself completely, with every
    // vertex paired to its own counterpart.
    #[test]
    fn any_circuit_matches_itself(spec in circuit_strategy()) {
        let mut engine = build_engine(&spec);
        let outcome = engine.execute().unwrap();
        prop_assert!(outcome.matched);
        prop_assert_eq!(outcome.errors, 0);
        prop_assert_eq!(outcome.vertices_left, [0, 0]);

        for (a, b) in engine.matched_pairs(VertexKind::Net) {
            prop_assert_eq!(a, b);
        }
        for (a, b) in engine.matched_pairs(VertexKind::Device) {
            prop_assert_eq!(a, b);
        }
    }

    // Determinism: the same circuit run twice produces identical event
    // sequences and outcomes.
    #[test]
    fn runs_are_reproducible(spec in circuit_strategy()) {
        let run = |spec: &CircuitSpec| {
            let sink = MemorySink::new();
            let mut engine = build_engine(spec);
            engine.set_sink(Box::new(sink.clone()));
            let outcome = engine.execute().unwrap();
            (outcome, sink.events())
        };
        let (outcome_a, events_a) = run(&spec);
        let (outcome_b, events_b) = run(&spec);
        prop_assert_eq!(outcome_a, outcome_b);
        prop_assert_eq!(events_a, events_b);
    }

    // Terminal classes depend only on the equality pattern of the pin
    // labels, so re-registering a master with consistently renamed labels
    // is accepted as identical.
    #[test]
    fn terminal_classes_follow_the_label_pattern(
        pattern in proptest::collection::vec(0usize..3, 1..6)
    ) {
        let first: Vec<String> = pattern.iter().map(|p| format!("pin{}", p)).collect();
        let renamed: Vec<String> = pattern.iter().map(|p| format!("t_{}", p)).collect();
        let first_refs: Vec<&str> = first.iter().map(String::as_str).collect();
        let renamed_refs: Vec<&str> = renamed.iter().map(String::as_str).collect();

        let mut engine = Engine::new();
        engine.define_device_master("mx", &first_refs).unwrap();
        prop_assert!(engine.define_device_master("mx", &renamed_refs).is_ok());
    }

    // Folding pin-label case never changes the registered shape.
    #[test]
    fn pin_label_case_is_insignificant(
        pattern in proptest::collection::vec(0usize..3, 1..6)
    ) {
        let lower: Vec<String> = pattern.iter().map(|p| format!("pin{}", p)).collect();
        let upper: Vec<String> = lower.iter().map(|s| s.to_ascii_uppercase()).collect();
        let lower_refs: Vec<&str> = lower.iter().map(String::as_str).collect();
        let upper_refs: Vec<&str> = upper.iter().map(String::as_str).collect();

        let mut engine = Engine::new();
        engine.define_device_master("mx", &lower_refs).unwrap();
        prop_assert!(engine.define_device_master("MX", &upper_refs).is_ok());
    }
}
