use netlist_core::library::PrimitiveLibrary;
use netlist_core::model::{JunctionId, PinPath, RawId, SegmentId};
use netlist_core::{Anchor, NetlistError, NetlistProject, Schematic, Wired};

fn schematic() -> Schematic {
    let project = NetlistProject::with_primitives("demo", &PrimitiveLibrary::builtin()).unwrap();
    let mut s = Schematic::new(project);
    s.add_block("main").unwrap();
    for pin in ["p1", "p2", "p3", "p4", "p5"] {
        s.add_pin("main", pin).unwrap();
    }
    s
}

fn pin(name: &str) -> Anchor {
    Anchor::pin("main", PinPath::port(name))
}

fn inst(instance: &str, name: &str) -> Anchor {
    Anchor::pin("main", PinPath::instance(instance, name))
}

fn junction(id: JunctionId) -> Anchor {
    Anchor::junction("main", id)
}

fn members(s: &Schematic, net: &str) -> Vec<String> {
    let mut out: Vec<String> =
        s.project().net_members("main", net).unwrap().iter().map(ToString::to_string).collect();
    out.sort();
    out
}

fn labelled_segments(s: &Schematic) -> usize {
    s.wiring("main").map(|g| g.segments().filter(|seg| seg.net.is_some()).count()).unwrap_or(0)
}

/// Two nets, each with a junction on its single segment.
fn two_tapped_nets(s: &mut Schematic) -> (Wired, JunctionId, Wired, JunctionId) {
    let a = s.finish_wire(&pin("p1"), &pin("p2"), Some("A")).unwrap();
    let ja = s.add_junction("main", a.segment).unwrap();
    let b = s.finish_wire(&pin("p3"), &pin("p4"), Some("B")).unwrap();
    let jb = s.add_junction("main", b.segment).unwrap();
    (a, ja, b, jb)
}

#[test]
fn pin_to_pin_creates_a_named_or_generated_net() {
    let mut s = schematic();
    let named = s.finish_wire(&pin("p1"), &pin("p2"), Some("clk")).unwrap();
    assert_eq!(named.net_name, "clk");
    assert_eq!(members(&s, "clk"), vec!["p1", "p2"]);

    let generated = s.finish_wire(&pin("p3"), &pin("p4"), None).unwrap();
    assert_eq!(generated.net_name, "net_1");
    assert_eq!(s.net_at("main", generated.segment).unwrap().as_deref(), Some("net_1"));
    assert_eq!(labelled_segments(&s), 2);
}

#[test]
fn pin_to_junction_joins_the_junction_net_with_an_anonymous_segment() {
    let mut s = schematic();
    let a = s.finish_wire(&pin("p1"), &pin("p2"), Some("A")).unwrap();
    let j = s.add_junction("main", a.segment).unwrap();

    let branch = s.finish_wire(&junction(j), &pin("p3"), None).unwrap();

    assert_eq!(branch.net_name, "A");
    assert_eq!(members(&s, "A"), vec!["p1", "p2", "p3"]);
    let graph = s.wiring("main").unwrap();
    assert_eq!(graph.segment(branch.segment).unwrap().net, None);
    assert_eq!(labelled_segments(&s), 1);
}

#[test]
fn junction_to_junction_merges_two_nets() {
    let mut s = schematic();
    let (_, ja, _, jb) = two_tapped_nets(&mut s);

    let bridge = s.finish_wire(&junction(ja), &junction(jb), None).unwrap();

    assert_eq!(bridge.net_name, "A");
    assert_eq!(bridge.merged.as_deref(), Some("B"));
    assert_eq!(members(&s, "A"), vec!["p1", "p2", "p3", "p4"]);
    assert!(s.project().block("main").unwrap().net("B").is_none());
    assert_eq!(labelled_segments(&s), 1);
}

#[test]
fn junction_to_junction_within_one_net_adds_a_loop() {
    let mut s = schematic();
    let a = s.finish_wire(&pin("p1"), &pin("p2"), Some("A")).unwrap();
    let j1 = s.add_junction("main", a.segment).unwrap();
    let j2 = s.add_junction("main", a.segment).unwrap();

    let looped = s.finish_wire(&junction(j1), &junction(j2), None).unwrap();

    assert_eq!(looped.merged, None);
    assert_eq!(members(&s, "A"), vec!["p1", "p2"]);
    assert_eq!(s.wiring("main").unwrap().segment_count(), 2);
}

#[test]
fn deleting_any_segment_removes_the_whole_component() {
    let mut s = schematic();
    let (_, ja, b, jb) = two_tapped_nets(&mut s);
    s.finish_wire(&junction(ja), &junction(jb), None).unwrap();
    let graph = s.wiring("main").unwrap();
    assert_eq!(graph.segment_count(), 3);
    assert_eq!(graph.junction_count(), 2);

    let removed = s.delete_net_at("main", b.segment).unwrap();

    assert_eq!(removed.as_deref(), Some("A"));
    let graph = s.wiring("main").unwrap();
    assert!(graph.is_empty());
    let block = s.project().block("main").unwrap();
    assert!(block.nets().is_empty());
    assert!(block.pins().values().all(|p| !p.port().is_connected()));
}

#[test]
fn deleting_a_junction_with_branches_takes_its_net() {
    let mut s = schematic();
    let a = s.finish_wire(&pin("p1"), &pin("p2"), Some("A")).unwrap();
    let j = s.add_junction("main", a.segment).unwrap();
    s.finish_wire(&junction(j), &pin("p3"), None).unwrap();

    let removed = s.delete_junction("main", j).unwrap();

    assert_eq!(removed.as_deref(), Some("A"));
    assert!(s.wiring("main").unwrap().is_empty());
    assert!(s.project().block("main").unwrap().net("A").is_none());
}

#[test]
fn deleting_a_bare_junction_leaves_the_net() {
    let mut s = schematic();
    let a = s.finish_wire(&pin("p1"), &pin("p2"), Some("A")).unwrap();
    let j = s.add_junction("main", a.segment).unwrap();

    assert_eq!(s.delete_junction("main", j).unwrap(), None);

    let graph = s.wiring("main").unwrap();
    assert_eq!(graph.junction_count(), 0);
    assert_eq!(graph.segment_count(), 1);
    assert_eq!(members(&s, "A"), vec!["p1", "p2"]);
}

#[test]
fn rename_through_any_segment_renames_the_component_net() {
    let mut s = schematic();
    let a = s.finish_wire(&pin("p1"), &pin("p2"), Some("A")).unwrap();
    let j = s.add_junction("main", a.segment).unwrap();
    let branch = s.finish_wire(&junction(j), &pin("p3"), None).unwrap();

    s.rename_net_at("main", branch.segment, "bus").unwrap();

    assert_eq!(members(&s, "bus"), vec!["p1", "p2", "p3"]);
    assert_eq!(s.net_at("main", a.segment).unwrap().as_deref(), Some("bus"));
}

#[test]
fn already_wired_terminals_are_rejected_before_mutation() {
    let mut s = schematic();
    s.finish_wire(&pin("p1"), &pin("p2"), Some("A")).unwrap();
    s.add_net("main", "loose").unwrap();
    s.connect_pin("main", "loose", &PinPath::port("p4")).unwrap();

    assert!(matches!(
        s.finish_wire(&pin("p1"), &pin("p3"), None),
        Err(NetlistError::AlreadyConnected { .. })
    ));
    assert!(matches!(
        s.finish_wire(&pin("p3"), &pin("p4"), None),
        Err(NetlistError::AlreadyConnected { .. })
    ));
    assert_eq!(s.wiring("main").unwrap().segment_count(), 1);
    assert_eq!(s.project().block("main").unwrap().nets().len(), 2);
}

#[test]
fn cross_block_and_self_wires_are_invalid() {
    let mut s = schematic();
    s.add_block("other").unwrap();
    s.add_pin("other", "q").unwrap();

    let err = s.finish_wire(&pin("p1"), &Anchor::pin("other", PinPath::port("q")), None).unwrap_err();
    assert!(matches!(err, NetlistError::InvalidConnection(_)));

    let err = s.finish_wire(&pin("p1"), &pin("p1"), None).unwrap_err();
    assert!(matches!(err, NetlistError::InvalidConnection(_)));

    assert!(s.wiring("main").map_or(true, |g| g.is_empty()));
    assert!(s.project().block("main").unwrap().nets().is_empty());
}

#[test]
fn wiring_inside_a_primitive_is_immutable() {
    let mut s = schematic();
    let err = s
        .finish_wire(
            &Anchor::pin("transistor", PinPath::port("a")),
            &Anchor::pin("transistor", PinPath::port("b")),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, NetlistError::ImmutableType { .. }));
}

#[test]
fn unknown_segments_and_junctions_are_not_found() {
    let mut s = schematic();
    assert!(matches!(s.add_junction("main", SegmentId::from_raw(7)), Err(NetlistError::NotFound { .. })));
    assert!(matches!(s.delete_junction("main", JunctionId::from_raw(3)), Err(NetlistError::NotFound { .. })));
    assert!(matches!(s.delete_net_at("main", SegmentId::from_raw(0)), Err(NetlistError::NotFound { .. })));
}

#[test]
fn removing_an_instance_drops_its_wires_but_keeps_the_other_members() {
    let mut s = schematic();
    s.add_instance("main", "transistor_1", "transistor").unwrap();
    s.finish_wire(&pin("p1"), &inst("transistor_1", "a"), Some("net1")).unwrap();

    s.remove_instance("main", "transistor_1").unwrap();

    assert!(s.wiring("main").unwrap().is_empty());
    assert_eq!(members(&s, "net1"), vec!["p1"]);
}

#[test]
fn removing_a_pin_rehosts_junctions_on_surviving_branches() {
    let mut s = schematic();
    let a = s.finish_wire(&pin("p1"), &pin("p2"), Some("A")).unwrap();
    let j = s.add_junction("main", a.segment).unwrap();
    let b3 = s.finish_wire(&junction(j), &pin("p3"), None).unwrap();
    s.finish_wire(&junction(j), &pin("p4"), None).unwrap();

    s.remove_pin("main", "p1").unwrap();

    let graph = s.wiring("main").unwrap();
    assert_eq!(graph.segment_count(), 2);
    let host = graph.junction(j).unwrap().host;
    assert_eq!(host, Some(b3.segment));
    assert_eq!(labelled_segments(&s), 1);
    assert_eq!(members(&s, "A"), vec!["p2", "p3", "p4"]);
}

#[test]
fn removing_a_net_removes_its_wiring() {
    let mut s = schematic();
    let a = s.finish_wire(&pin("p1"), &pin("p2"), Some("A")).unwrap();
    let j = s.add_junction("main", a.segment).unwrap();
    s.finish_wire(&junction(j), &pin("p3"), None).unwrap();
    s.finish_wire(&pin("p4"), &pin("p5"), Some("B")).unwrap();

    s.remove_net("main", "A").unwrap();

    let graph = s.wiring("main").unwrap();
    assert_eq!(graph.segment_count(), 1);
    assert_eq!(graph.junction_count(), 0);
    assert_eq!(members(&s, "B"), vec!["p4", "p5"]);
}

#[test]
fn disconnecting_a_wired_pin_drops_its_segment() {
    let mut s = schematic();
    let a = s.finish_wire(&pin("p1"), &pin("p2"), Some("A")).unwrap();
    let j = s.add_junction("main", a.segment).unwrap();
    s.finish_wire(&junction(j), &pin("p3"), None).unwrap();

    s.disconnect_pin("main", "A", &PinPath::port("p3")).unwrap();

    assert_eq!(members(&s, "A"), vec!["p1", "p2"]);
    let graph = s.wiring("main").unwrap();
    assert_eq!(graph.segment_count(), 1);
    // Still sits on the p1-p2 segment.
    assert_eq!(graph.junction(j).unwrap().host, Some(a.segment));
}

#[test]
fn removing_a_block_cleans_wiring_in_parents() {
    let mut s = schematic();
    s.add_instance("main", "t1", "transistor").unwrap();
    s.add_instance("main", "t2", "transistor").unwrap();
    s.finish_wire(&inst("t1", "a"), &inst("t2", "a"), Some("gate")).unwrap();
    s.finish_wire(&pin("p1"), &pin("p2"), Some("keep")).unwrap();

    s.remove_block("transistor").unwrap();

    let graph = s.wiring("main").unwrap();
    assert_eq!(graph.segment_count(), 1);
    assert!(s.project().block("main").unwrap().instances().is_empty());
    assert!(members(&s, "gate").is_empty());
    assert_eq!(members(&s, "keep"), vec!["p1", "p2"]);
}

#[test]
fn copy_block_carries_its_wiring() {
    let mut s = schematic();
    let a = s.finish_wire(&pin("p1"), &pin("p2"), Some("A")).unwrap();
    let j = s.add_junction("main", a.segment).unwrap();
    s.finish_wire(&junction(j), &pin("p3"), None).unwrap();

    s.copy_block("main", "main_copy").unwrap();

    let graph = s.wiring("main_copy").unwrap();
    assert_eq!(graph.segment_count(), 2);
    assert_eq!(graph.junction_count(), 1);
    let mut copied: Vec<String> =
        s.project().net_members("main_copy", "A").unwrap().iter().map(ToString::to_string).collect();
    copied.sort();
    assert_eq!(copied, vec!["p1", "p2", "p3"]);
}
