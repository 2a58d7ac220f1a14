// End-to-end tests: object graphs sized through the public API

use heaplens::engine::config::SizeConfig;
use heaplens::engine::descriptor::TypeKey;
use heaplens::engine::lengths::list_alloc;
use heaplens::engine::sizer::Sizer;
use heaplens::report;
use heaplens::runtime::heap::{ObjRef, ObjectHeap};
use heaplens::runtime::object::{BuiltinKind, ClassDef, Object};
use heaplens::runtime::widths::PrimitiveWidths;
use heaplens::track::Tracker;

fn default_sizer(heap: &ObjectHeap) -> Sizer {
    Sizer::new(heap, SizeConfig::default()).expect("default config is valid")
}

#[test]
fn total_decomposes_over_distinct_referents() {
    // tuple(int, float, str): no sharing, no cycles
    let mut heap = ObjectHeap::new();
    let a = heap.alloc(Object::Int(1));
    let b = heap.alloc(Object::Float(2.0));
    let c = heap.alloc(Object::Str("three".to_string()));
    let tuple = heap.alloc(Object::Tuple(vec![a, b, c]));

    let mut sizer = default_sizer(&heap);
    let total = sizer.total_of(&heap, &[tuple]).unwrap();

    let flat_tuple = sizer.flat_size(&heap, tuple).unwrap();
    let mut expected = flat_tuple;
    for r in [a, b, c] {
        expected += default_sizer(&heap).total_of(&heap, &[r]).unwrap();
    }
    assert_eq!(total, expected);
}

#[test]
fn shared_referent_counts_once_across_roots() {
    let mut heap = ObjectHeap::new();
    let shared = heap.alloc(Object::Str("both lists hold me".to_string()));
    let a = heap.alloc(Object::List(vec![shared]));
    let b = heap.alloc(Object::List(vec![shared]));

    let combined = default_sizer(&heap).total_of(&heap, &[a, b]).unwrap();
    let alone_a = default_sizer(&heap).total_of(&heap, &[a]).unwrap();
    let alone_b = default_sizer(&heap).total_of(&heap, &[b]).unwrap();
    assert!(combined < alone_a + alone_b);

    // independent roots with nothing shared are exactly additive
    let x = heap.alloc(Object::Int(1));
    let y = heap.alloc(Object::Int(2));
    let both = default_sizer(&heap).total_of(&heap, &[x, y]).unwrap();
    let each: usize = [x, y]
        .iter()
        .map(|&r| default_sizer(&heap).total_of(&heap, &[r]).unwrap())
        .sum();
    assert_eq!(both, each);
}

#[test]
fn self_referencing_container_terminates() {
    let mut heap = ObjectHeap::new();
    let list = heap.alloc(Object::List(Vec::new()));
    if let Some(Object::List(items)) = heap.get_mut(list) {
        items.push(list);
    }
    let mut sizer = default_sizer(&heap);
    let total = sizer.total_of(&heap, &[list]).unwrap();
    let flat = sizer.flat_size(&heap, list).unwrap();
    assert_eq!(total, flat, "the self reference must add nothing");
    assert_eq!(sizer.stats().sized, 1, "visited exactly once");
}

#[test]
fn two_node_cycle_scenario() {
    let mut heap = ObjectHeap::new();
    let a = heap.alloc(Object::List(Vec::new()));
    let b = heap.alloc(Object::List(vec![a]));
    if let Some(Object::List(items)) = heap.get_mut(a) {
        items.push(b);
    }
    let mut sizer = default_sizer(&heap);
    let flat_a = sizer.flat_size(&heap, a).unwrap();
    let flat_b = sizer.flat_size(&heap, b).unwrap();
    assert_eq!(sizer.total_of(&heap, &[a]).unwrap(), flat_a + flat_b);
    let stats = sizer.stats();
    assert_eq!(stats.missed, 0);
    assert_eq!(stats.max_depth, 1);
}

#[test]
fn root_reached_from_an_earlier_root_is_still_sized() {
    // a holds b; both are passed as roots
    let mut heap = ObjectHeap::new();
    let b = heap.alloc(Object::Str("held by the first root".to_string()));
    let a = heap.alloc(Object::List(vec![b]));

    let mut sizer = default_sizer(&heap);
    let sizes = sizer.each_of(&heap, &[a, b]).unwrap();
    let stats = sizer.stats();
    assert!(sizes[1] > 0, "the later root is sized at its own turn");
    assert_eq!(stats.total, sizes[0] + sizes[1]);
    assert_eq!(stats.duplicate, 0, "a referent hit is not a repeated argument");

    // b contributed nothing under a, so a's share is its flat size alone,
    // and b's share matches sizing it by itself
    let flat_a = sizer.flat_size(&heap, a).unwrap();
    assert_eq!(sizes[0], flat_a);
    let b_alone = default_sizer(&heap).total_of(&heap, &[b]).unwrap();
    assert_eq!(sizes[1], b_alone);
}

#[test]
fn sizing_the_same_root_twice_is_idempotent() {
    let mut heap = ObjectHeap::new();
    let item = heap.alloc(Object::Int(9));
    let list = heap.alloc(Object::List(vec![item]));
    let mut sizer = default_sizer(&heap);
    let sizes = sizer.each_of(&heap, &[list, list]).unwrap();
    assert_eq!(sizes[0], sizes[1]);
    assert_eq!(sizer.stats().duplicate, 1);
    assert_eq!(sizer.stats().total, sizes[0], "no double counting");
}

#[test]
fn over_allocation_scenario_for_a_ten_element_list() {
    // a 10-element growable sequence of 8-byte pointers
    let widths = PrimitiveWidths::host();
    assert_eq!(widths.pointer, 8);

    let mut heap = ObjectHeap::new();
    let items: Vec<ObjRef> = (0..10).map(|i| heap.alloc(Object::Int(i))).collect();
    let list = heap.alloc(Object::List(items));

    let mut sizer = default_sizer(&heap);
    let base = sizer.base_size(&heap, list).unwrap();
    let flat = sizer.flat_size(&heap, list).unwrap();

    let unaligned = base + list_alloc(10) * 8;
    let aligned = (unaligned + 7) & !7;
    assert_eq!(flat, aligned);
    assert_eq!(list_alloc(10), 17, "10 + 6 + 10/8 slots");
}

#[test]
fn alignment_law_holds_for_every_flat_size() {
    let mut heap = ObjectHeap::new();
    let objects = vec![
        heap.alloc(Object::None),
        heap.alloc(Object::Str("abcdefg".to_string())),
        heap.alloc(Object::Bytes(vec![1, 2, 3])),
        heap.alloc(Object::BigInt { digits: 9 }),
        heap.alloc(Object::Set(Vec::new())),
    ];
    for align in [2usize, 8, 64] {
        let config = SizeConfig {
            align,
            ..SizeConfig::default()
        };
        let mut aligned_sizer = Sizer::new(&heap, config).unwrap();
        let mut raw_sizer = Sizer::new(
            &heap,
            SizeConfig {
                align: 1,
                ..SizeConfig::default()
            },
        )
        .unwrap();
        for &r in &objects {
            let aligned = aligned_sizer.flat_size(&heap, r).unwrap();
            let raw = raw_sizer.flat_size(&heap, r).unwrap();
            assert_eq!(aligned % align, 0);
            assert!(aligned >= raw);
        }
    }
}

#[test]
fn excluding_a_type_removes_its_contribution_but_marks_it_seen() {
    let mut heap = ObjectHeap::new();
    let s1 = heap.alloc(Object::Str("one".to_string()));
    let s2 = heap.alloc(Object::Str("two".to_string()));
    let n = heap.alloc(Object::Int(3));
    let list = heap.alloc(Object::List(vec![s1, s2, n]));

    let mut sizer = default_sizer(&heap);
    sizer.exclude_types(&[TypeKey::Builtin(BuiltinKind::Str)]);
    let total = sizer.total_of(&heap, &[list]).unwrap();

    let flat_list = sizer.flat_size(&heap, list).unwrap();
    let flat_int = sizer.flat_size(&heap, n).unwrap();
    assert_eq!(total, flat_list + flat_int);
    assert_eq!(sizer.stats().excluded, 2);
    assert_eq!(sizer.stats().seen, 4, "strings are seen, not counted");
}

#[test]
fn excluded_ids_stop_referent_entry_but_not_explicit_roots() {
    let mut heap = ObjectHeap::new();
    let shared = heap.alloc(Object::Str("do not enter".to_string()));
    let list = heap.alloc(Object::List(vec![shared]));

    let mut sizer = default_sizer(&heap);
    sizer.exclude_refs(&[shared]);
    let total = sizer.total_of(&heap, &[list]).unwrap();
    let flat_list = sizer.flat_size(&heap, list).unwrap();
    assert_eq!(total, flat_list, "the excluded referent is not entered");

    // passed explicitly as a root, the same object is still sized
    let direct = sizer.total_of(&heap, &[shared]).unwrap();
    assert!(direct > 0);
}

#[test]
fn untouched_exclusions_do_not_inflate_the_seen_count() {
    let mut heap = ObjectHeap::new();
    let reached = heap.alloc(Object::Str("reached".to_string()));
    let untouched = heap.alloc(Object::Str("never reached".to_string()));
    let list = heap.alloc(Object::List(vec![reached]));

    let mut sizer = default_sizer(&heap);
    sizer.exclude_refs(&[reached, untouched]);
    sizer.total_of(&heap, &[list]).unwrap();
    assert_eq!(
        sizer.stats().seen,
        2,
        "the list and the contacted exclusion only"
    );
}

#[test]
fn a_branch_deeper_than_the_recursion_ceiling_is_abandoned() {
    // 600 nested lists with the configured limit above the ceiling
    let mut heap = ObjectHeap::new();
    let mut node = heap.alloc(Object::Int(7));
    for _ in 0..600 {
        node = heap.alloc(Object::List(vec![node]));
    }

    let config = SizeConfig {
        limit: 600,
        ..SizeConfig::default()
    };
    let mut sizer = Sizer::new(&heap, config).unwrap();
    let total = sizer.total_of(&heap, &[node]).unwrap();
    let stats = sizer.stats();
    assert!(total > 0, "the partial total is still returned");
    assert_eq!(stats.missed, 1, "exactly one branch was abandoned");
    assert_eq!(stats.sized, 512);
    assert_eq!(stats.max_depth, 511);
}

#[test]
fn oracle_sizes_supersede_computed_flat_sizes() {
    let mut heap = ObjectHeap::new();
    let s = heap.alloc(Object::Str("oracle".to_string()));
    let baseline = default_sizer(&heap).flat_size(&heap, s).unwrap();
    assert_ne!(baseline, 4096);

    heap.set_oracle(Box::new(|obj, fallback| match obj {
        Object::Str(_) => 4096,
        _ => fallback,
    }));
    let sized = default_sizer(&heap).flat_size(&heap, s).unwrap();
    assert_eq!(sized, 4096, "aligned oracle value replaces the estimate");
}

#[test]
fn detailed_records_attribute_size_to_structure() {
    let mut heap = ObjectHeap::new();
    let v = heap.alloc(Object::Int(7));
    let k = heap.alloc(Object::Str("answer".to_string()));
    let map = heap.alloc(Object::Map(vec![(k, v)]));

    let config = SizeConfig {
        detail: 2,
        ..SizeConfig::default()
    };
    let mut sizer = Sizer::new(&heap, config).unwrap();
    let records = sizer.detailed_of(&heap, &[map]).unwrap();
    assert_eq!(records.len(), 1);
    let root = &records[0];
    assert!(root.size >= root.flat);
    assert_eq!(root.refs.len(), 2, "key and value records");
    assert!(root.refs[0].name.starts_with("[K]"));
    assert!(root.refs[1].name.starts_with("[V]"));
    let children: usize = root.refs.iter().map(|r| r.size).sum();
    assert_eq!(root.size, root.flat + children);
}

#[test]
fn derived_instances_size_like_their_ancestor() {
    let mut heap = ObjectHeap::new();
    let object = heap.builtins().object;
    let base_class = heap.alloc(Object::Class(ClassDef {
        name: "Shape".to_string(),
        module: "demo".to_string(),
        bases: vec![object],
        attrs: Vec::new(),
        slots: None,
        builtin: None,
    }));
    let sub_class = heap.alloc(Object::Class(ClassDef {
        name: "Circle".to_string(),
        module: "demo".to_string(),
        bases: vec![base_class],
        attrs: Vec::new(),
        slots: None,
        builtin: None,
    }));
    let shape = heap.alloc(Object::Instance {
        class: base_class,
        attrs: Vec::new(),
    });
    let circle = heap.alloc(Object::Instance {
        class: sub_class,
        attrs: Vec::new(),
    });

    let config = SizeConfig {
        derive: true,
        ..SizeConfig::default()
    };
    let mut sizer = Sizer::new(&heap, config).unwrap();
    // registering the ancestor first makes it the single known candidate
    let shape_flat = sizer.flat_size(&heap, shape).unwrap();
    let circle_flat = sizer.flat_size(&heap, circle).unwrap();
    assert_eq!(shape_flat, circle_flat);
}

#[test]
fn tracker_records_growth_of_a_named_root() {
    let mut heap = ObjectHeap::new();
    let cache = heap.alloc(Object::Map(Vec::new()));
    let mut sizer = default_sizer(&heap);
    let mut tracker = Tracker::new(64 * 1024);
    tracker.track("cache", cache);

    tracker.record(&heap, &mut sizer).unwrap();
    for i in 0..10 {
        let k = heap.alloc(Object::Str(format!("key{}", i)));
        let v = heap.alloc(Object::Str("v".repeat(100)));
        if let Some(Object::Map(pairs)) = heap.get_mut(cache) {
            pairs.push((k, v));
        }
    }
    tracker.record(&heap, &mut sizer).unwrap();

    let series = tracker.series("cache");
    assert_eq!(series.len(), 2);
    assert!(series[1] > series[0]);
    assert!(tracker.delta("cache").unwrap() > 0);
    assert!(tracker.memory_usage() <= tracker.memory_limit());
}

#[test]
fn report_text_covers_summary_profiles_and_typedefs() {
    let mut heap = ObjectHeap::new();
    let s = heap.alloc(Object::Str("hello report".to_string()));
    let list = heap.alloc(Object::List(vec![s]));
    let mut sizer = default_sizer(&heap);
    sizer.total_of(&heap, &[list]).unwrap();

    let summary = report::summary(&sizer);
    assert!(summary.contains("2 sized"));
    assert!(summary.contains("total"));

    let table = report::profile_table(&heap, &sizer);
    assert!(table.contains("str"));
    assert!(table.contains("list"));

    let dump = report::typedefs(&heap, sizer.registry());
    assert!(dump.contains("registered type descriptors"));
    assert!(dump.contains("static"));
}

#[test]
fn profiles_point_at_the_largest_instance() {
    let mut heap = ObjectHeap::new();
    let small = heap.alloc(Object::Str("s".to_string()));
    let large = heap.alloc(Object::Str("L".repeat(500)));
    let list = heap.alloc(Object::List(vec![small, large]));
    let mut sizer = default_sizer(&heap);
    sizer.total_of(&heap, &[list]).unwrap();

    let profile = sizer
        .profiles()
        .get(TypeKey::Builtin(BuiltinKind::Str))
        .copied()
        .unwrap();
    assert_eq!(profile.count, 2);
    assert_eq!(profile.largest(&heap), Some(large));
}
