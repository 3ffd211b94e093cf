use netlist_core::library::PrimitiveLibrary;
use netlist_core::model::{Named, PinPath};
use netlist_core::{NetlistError, NetlistProject, ObjectKind};

fn project_with_transistor() -> NetlistProject {
    NetlistProject::with_primitives("demo", &PrimitiveLibrary::builtin()).expect("seed primitives")
}

fn pin_names(project: &NetlistProject, block: &str) -> Vec<String> {
    project.block(block).unwrap().pins().values().map(|p| p.name().to_string()).collect()
}

fn instance_pins(project: &NetlistProject, parent: &str, name: &str) -> Vec<(String, bool)> {
    let inst = project.instance(parent, name).unwrap();
    let ty = project.block_by_id(inst.type_id()).unwrap();
    inst.pins()
        .map(|r| (ty.pins().get(r.pin()).unwrap().name().to_string(), r.is_connected()))
        .collect()
}

#[test]
fn transistor_scenario_keeps_memberships_through_renames_and_removals() {
    let mut p = project_with_transistor();
    p.add_block("main").unwrap();
    p.add_pin_to_block("main", "pin_1").unwrap();
    p.add_pin_to_block("main", "pin_2").unwrap();
    p.add_instance_to_block("main", "t1", "transistor").unwrap();
    p.rename_instance_in_block("main", "t1", "transistor_1").unwrap();
    p.add_net_to_block("main", "net1").unwrap();
    p.connect_pin_to_net_in_block("main", "net1", &PinPath::port("pin_1")).unwrap();
    p.connect_pin_to_net_in_block("main", "net1", &PinPath::instance("transistor_1", "a")).unwrap();

    assert_eq!(
        p.net_members("main", "net1").unwrap(),
        vec![PinPath::port("pin_1"), PinPath::instance("transistor_1", "a")]
    );

    p.rename_pin_in_block("main", "pin_1", "pin_3").unwrap();
    assert_eq!(
        p.net_members("main", "net1").unwrap(),
        vec![PinPath::port("pin_3"), PinPath::instance("transistor_1", "a")]
    );

    p.remove_instance_from_block("main", "transistor_1").unwrap();
    assert_eq!(p.net_members("main", "net1").unwrap(), vec![PinPath::port("pin_3")]);
    assert!(p.instances_of("transistor").unwrap().is_empty());

    p.remove_pin_from_block("main", "pin_3").unwrap();
    assert!(p.net_members("main", "net1").unwrap().is_empty());
}

#[test]
fn adding_main_twice_fails_and_leaves_the_original_untouched() {
    let mut p = project_with_transistor();
    let id = p.add_block("main").unwrap();
    p.add_pin_to_block("main", "x").unwrap();

    let err = p.add_block("main").unwrap_err();
    assert!(matches!(err, NetlistError::DuplicateName { kind: ObjectKind::Block, .. }));
    assert_eq!(p.block_id("main").unwrap(), id);
    assert_eq!(pin_names(&p, "main"), vec!["x"]);
}

#[test]
fn duplicate_names_inside_a_block_are_rejected_without_change() {
    let mut p = project_with_transistor();
    p.add_block("main").unwrap();
    p.add_pin_to_block("main", "a").unwrap();
    p.add_net_to_block("main", "n").unwrap();
    p.add_instance_to_block("main", "t1", "transistor").unwrap();

    assert!(matches!(
        p.add_pin_to_block("main", "a"),
        Err(NetlistError::DuplicateName { kind: ObjectKind::Pin, .. })
    ));
    assert!(matches!(
        p.add_net_to_block("main", "n"),
        Err(NetlistError::DuplicateName { kind: ObjectKind::Net, .. })
    ));
    assert!(matches!(
        p.add_instance_to_block("main", "t1", "transistor"),
        Err(NetlistError::DuplicateName { kind: ObjectKind::Instance, .. })
    ));

    let block = p.block("main").unwrap();
    assert_eq!(block.pins().len(), 1);
    assert_eq!(block.nets().len(), 1);
    assert_eq!(block.instances().len(), 1);
    assert_eq!(p.instances_of("transistor").unwrap().len(), 1);
}

#[test]
fn renames_onto_taken_names_fail() {
    let mut p = project_with_transistor();
    p.add_block("main").unwrap();
    p.add_block("other").unwrap();
    p.add_pin_to_block("main", "a").unwrap();
    p.add_pin_to_block("main", "b").unwrap();

    assert!(matches!(p.rename_block("main", "transistor"), Err(NetlistError::DuplicateName { .. })));
    assert!(matches!(p.rename_pin_in_block("main", "a", "b"), Err(NetlistError::DuplicateName { .. })));
    assert_eq!(pin_names(&p, "main"), vec!["a", "b"]);
}

#[test]
fn renaming_to_the_current_name_is_a_no_op() {
    let mut p = project_with_transistor();
    p.add_block("main").unwrap();
    p.add_pin_to_block("main", "a").unwrap();
    p.add_instance_to_block("main", "t1", "transistor").unwrap();
    p.add_net_to_block("main", "n").unwrap();

    p.rename_block("main", "main").unwrap();
    p.rename_pin_in_block("main", "a", "a").unwrap();
    p.rename_instance_in_block("main", "t1", "t1").unwrap();
    p.rename_net_in_block("main", "n", "n").unwrap();
    assert_eq!(pin_names(&p, "main"), vec!["a"]);
    assert!(p.instance("main", "t1").is_ok());
}

#[test]
fn names_that_cannot_be_addressed_are_rejected() {
    let mut p = project_with_transistor();
    p.add_block("main").unwrap();
    p.add_pin_to_block("main", "z").unwrap();
    p.add_instance_to_block("main", "t1", "transistor").unwrap();

    let invalid = |r: Result<(), NetlistError>, kind: ObjectKind| {
        matches!(r, Err(NetlistError::InvalidName { kind: k, .. }) if k == kind)
    };
    assert!(invalid(p.add_pin_to_block("main", "x.y").map(|_| ()), ObjectKind::Pin));
    assert!(invalid(p.add_pin_to_block("main", "").map(|_| ()), ObjectKind::Pin));
    assert!(invalid(p.add_pin_to_block("main", " pad").map(|_| ()), ObjectKind::Pin));
    assert!(invalid(p.rename_pin_in_block("main", "z", "z.1"), ObjectKind::Pin));
    assert!(invalid(p.add_instance_to_block("main", "u.1", "transistor").map(|_| ()), ObjectKind::Instance));
    assert!(invalid(p.rename_instance_in_block("main", "t1", "t.1"), ObjectKind::Instance));
    assert!(invalid(p.add_net_to_block("main", "  ").map(|_| ()), ObjectKind::Net));
    assert!(invalid(p.add_block("").map(|_| ()), ObjectKind::Block));

    // Dots stay legal where no pin path is involved.
    p.add_net_to_block("main", "bus.0").unwrap();
    p.add_block("lib.cell").unwrap();

    assert_eq!(pin_names(&p, "main"), vec!["z"]);
    assert!(p.instance("main", "t1").is_ok());
}

#[test]
fn primitive_blocks_reject_every_mutation() {
    let mut p = project_with_transistor();
    p.add_block("main").unwrap();

    assert!(matches!(p.add_pin_to_block("transistor", "d"), Err(NetlistError::ImmutableType { .. })));
    assert!(matches!(p.remove_pin_from_block("transistor", "a"), Err(NetlistError::ImmutableType { .. })));
    assert!(matches!(p.rename_pin_in_block("transistor", "a", "z"), Err(NetlistError::ImmutableType { .. })));
    assert!(matches!(p.add_net_to_block("transistor", "n"), Err(NetlistError::ImmutableType { .. })));
    assert!(matches!(
        p.add_instance_to_block("transistor", "m", "main"),
        Err(NetlistError::ImmutableType { .. })
    ));
    assert!(matches!(
        p.create_net_with_pins("transistor", "n", &[PinPath::port("a")]),
        Err(NetlistError::ImmutableType { .. })
    ));

    assert_eq!(pin_names(&p, "transistor"), vec!["a", "b", "c"]);
}

#[test]
fn pins_added_to_a_type_reach_every_instance_unconnected() {
    let mut p = project_with_transistor();
    p.add_block("cell").unwrap();
    p.add_pin_to_block("cell", "in").unwrap();
    p.add_block("top").unwrap();
    p.add_block("side").unwrap();
    p.add_instance_to_block("top", "u1", "cell").unwrap();
    p.add_instance_to_block("side", "u2", "cell").unwrap();

    p.add_pin_to_block("cell", "out").unwrap();

    let expected = vec![("in".to_string(), false), ("out".to_string(), false)];
    assert_eq!(instance_pins(&p, "top", "u1"), expected);
    assert_eq!(instance_pins(&p, "side", "u2"), expected);
}

#[test]
fn removing_a_type_pin_drops_it_from_instances_and_their_nets() {
    let mut p = project_with_transistor();
    p.add_block("cell").unwrap();
    p.add_pin_to_block("cell", "in").unwrap();
    p.add_pin_to_block("cell", "out").unwrap();
    p.add_block("top").unwrap();
    p.add_pin_to_block("top", "x").unwrap();
    p.add_instance_to_block("top", "u1", "cell").unwrap();
    p.create_net_with_pins("top", "n", &[PinPath::port("x"), PinPath::instance("u1", "out")]).unwrap();

    p.remove_pin_from_block("cell", "out").unwrap();

    assert_eq!(instance_pins(&p, "top", "u1"), vec![("in".to_string(), false)]);
    assert_eq!(p.net_members("top", "n").unwrap(), vec![PinPath::port("x")]);
    assert!(matches!(
        p.connect_pin_to_net_in_block("top", "n", &PinPath::instance("u1", "out")),
        Err(NetlistError::NotFound { .. })
    ));
}

#[test]
fn connect_then_disconnect_round_trip_leaves_net_empty() {
    let mut p = project_with_transistor();
    p.add_block("main").unwrap();
    p.add_pin_to_block("main", "a").unwrap();
    p.add_instance_to_block("main", "t1", "transistor").unwrap();
    p.add_net_to_block("main", "n").unwrap();

    let port = PinPath::port("a");
    let inner = PinPath::instance("t1", "b");
    p.connect_pin_to_net_in_block("main", "n", &port).unwrap();
    p.connect_pin_to_net_in_block("main", "n", &inner).unwrap();
    p.disconnect_pin_from_net_in_block("main", "n", &port).unwrap();
    p.disconnect_pin_from_net_in_block("main", "n", &inner).unwrap();

    assert!(p.net_members("main", "n").unwrap().is_empty());
    let block = p.block("main").unwrap();
    let main_id = p.block_id("main").unwrap();
    for path in [&port, &inner] {
        let terminal = p.resolve(main_id, path).unwrap();
        assert_eq!(block.net_of(terminal), None);
    }
}

#[test]
fn connecting_a_bound_pin_reports_its_net() {
    let mut p = project_with_transistor();
    p.add_block("main").unwrap();
    p.add_pin_to_block("main", "a").unwrap();
    p.add_net_to_block("main", "n1").unwrap();
    p.add_net_to_block("main", "n2").unwrap();
    p.connect_pin_to_net_in_block("main", "n1", &PinPath::port("a")).unwrap();

    match p.connect_pin_to_net_in_block("main", "n2", &PinPath::port("a")) {
        Err(NetlistError::AlreadyConnected { terminal, net, .. }) => {
            assert_eq!(terminal, "a");
            assert_eq!(net, "n1");
        }
        other => panic!("expected AlreadyConnected, got {other:?}"),
    }
    assert!(p.net_members("main", "n2").unwrap().is_empty());
}

#[test]
fn disconnecting_from_the_wrong_net_is_not_found() {
    let mut p = project_with_transistor();
    p.add_block("main").unwrap();
    p.add_pin_to_block("main", "a").unwrap();
    p.add_net_to_block("main", "n1").unwrap();
    p.add_net_to_block("main", "n2").unwrap();
    p.connect_pin_to_net_in_block("main", "n1", &PinPath::port("a")).unwrap();

    let err = p.disconnect_pin_from_net_in_block("main", "n2", &PinPath::port("a")).unwrap_err();
    assert!(matches!(err, NetlistError::NotFound { kind: ObjectKind::Pin, .. }));
    assert_eq!(p.net_members("main", "n1").unwrap(), vec![PinPath::port("a")]);
}

#[test]
fn create_net_with_pins_changes_nothing_on_failure() {
    let mut p = project_with_transistor();
    p.add_block("main").unwrap();
    p.add_pin_to_block("main", "a").unwrap();
    p.add_pin_to_block("main", "b").unwrap();
    p.add_net_to_block("main", "taken").unwrap();
    p.connect_pin_to_net_in_block("main", "taken", &PinPath::port("b")).unwrap();

    let err = p
        .create_net_with_pins("main", "fresh", &[PinPath::port("a"), PinPath::port("b")])
        .unwrap_err();
    assert!(matches!(err, NetlistError::AlreadyConnected { .. }));

    let err = p
        .create_net_with_pins("main", "fresh", &[PinPath::port("a"), PinPath::port("missing")])
        .unwrap_err();
    assert!(matches!(err, NetlistError::NotFound { .. }));

    let err = p.create_net_with_pins("main", "fresh", &[PinPath::port("a"), PinPath::port("a")]).unwrap_err();
    assert!(matches!(err, NetlistError::InvalidConnection(_)));

    let block = p.block("main").unwrap();
    assert!(block.net("fresh").is_none());
    let a = p.resolve(p.block_id("main").unwrap(), &PinPath::port("a")).unwrap();
    assert_eq!(block.net_of(a), None);
}

#[test]
fn merge_nets_moves_members_and_drops_the_absorbed_net() {
    let mut p = project_with_transistor();
    p.add_block("main").unwrap();
    for pin in ["p1", "p2", "p3"] {
        p.add_pin_to_block("main", pin).unwrap();
    }
    p.create_net_with_pins("main", "a", &[PinPath::port("p1")]).unwrap();
    p.create_net_with_pins("main", "b", &[PinPath::port("p2"), PinPath::port("p3")]).unwrap();

    p.merge_nets("main", "a", "b").unwrap();

    assert!(p.block("main").unwrap().net("b").is_none());
    assert_eq!(
        p.net_members("main", "a").unwrap(),
        vec![PinPath::port("p1"), PinPath::port("p2"), PinPath::port("p3")]
    );
    assert!(matches!(p.merge_nets("main", "a", "a"), Err(NetlistError::InvalidConnection(_))));
}

#[test]
fn instantiation_cycles_are_rejected() {
    let mut p = project_with_transistor();
    p.add_block("a").unwrap();
    p.add_block("b").unwrap();
    p.add_instance_to_block("a", "ib", "b").unwrap();

    assert!(matches!(p.add_instance_to_block("a", "self", "a"), Err(NetlistError::InstantiationCycle { .. })));
    assert!(matches!(p.add_instance_to_block("b", "ia", "a"), Err(NetlistError::InstantiationCycle { .. })));
    assert!(p.block("b").unwrap().instances().is_empty());
}

#[test]
fn renaming_a_block_keeps_its_instances_indexed() {
    let mut p = project_with_transistor();
    p.add_block("main").unwrap();
    p.add_instance_to_block("main", "t1", "transistor").unwrap();

    p.rename_block("transistor", "nmos").unwrap();

    assert_eq!(p.instances_of("nmos").unwrap(), vec![("main".to_string(), "t1".to_string())]);
    let inst = p.instance("main", "t1").unwrap();
    assert_eq!(p.type_name(inst), "nmos");
    assert!(p.block_id("transistor").is_err());
}

#[test]
fn removing_a_block_removes_its_instances_everywhere() {
    let mut p = project_with_transistor();
    p.add_block("main").unwrap();
    p.add_pin_to_block("main", "x").unwrap();
    p.add_instance_to_block("main", "t1", "transistor").unwrap();
    p.create_net_with_pins("main", "n", &[PinPath::port("x"), PinPath::instance("t1", "c")]).unwrap();

    let removed = p.remove_block("transistor").unwrap();

    assert_eq!(removed.len(), 1);
    assert!(p.block("main").unwrap().instances().is_empty());
    assert_eq!(p.net_members("main", "n").unwrap(), vec![PinPath::port("x")]);
    assert!(matches!(
        p.add_instance_to_block("main", "t2", "transistor"),
        Err(NetlistError::NotFound { kind: ObjectKind::Block, .. })
    ));
}

#[test]
fn copy_block_duplicates_structure_and_memberships() {
    let mut p = project_with_transistor();
    p.add_block("cell").unwrap();
    p.add_pin_to_block("cell", "in").unwrap();
    p.add_instance_to_block("cell", "t1", "transistor").unwrap();
    p.create_net_with_pins("cell", "n", &[PinPath::port("in"), PinPath::instance("t1", "a")]).unwrap();

    p.copy_block("cell", "cell_copy").unwrap();

    assert_eq!(pin_names(&p, "cell_copy"), vec!["in"]);
    assert_eq!(
        p.net_members("cell_copy", "n").unwrap(),
        vec![PinPath::port("in"), PinPath::instance("t1", "a")]
    );
    assert_eq!(p.instances_of("transistor").unwrap().len(), 2);

    // The original is independent of the copy.
    p.rename_net_in_block("cell_copy", "n", "m").unwrap();
    assert!(p.block("cell").unwrap().net("n").is_some());

    assert!(matches!(p.copy_block("cell", "cell_copy"), Err(NetlistError::DuplicateName { .. })));
}

#[test]
fn copy_instance_places_an_unconnected_twin() {
    let mut p = project_with_transistor();
    p.add_block("main").unwrap();
    p.add_pin_to_block("main", "x").unwrap();
    p.add_instance_to_block("main", "t1", "transistor").unwrap();
    p.create_net_with_pins("main", "n", &[PinPath::port("x"), PinPath::instance("t1", "a")]).unwrap();

    p.copy_instance("main", "t1", "t2").unwrap();

    let pins = instance_pins(&p, "main", "t2");
    assert_eq!(pins.len(), 3);
    assert!(pins.iter().all(|(_, connected)| !connected));
    assert_eq!(p.type_name(p.instance("main", "t2").unwrap()), "transistor");
}

#[test]
fn generated_net_names_take_the_first_free_index() {
    let mut p = project_with_transistor();
    let id = p.add_block("main").unwrap();
    assert_eq!(p.next_net_name(id), "net_1");
    p.add_net_to_block("main", "net_1").unwrap();
    p.add_net_to_block("main", "net_3").unwrap();
    assert_eq!(p.next_net_name(id), "net_2");
}

#[test]
fn missing_lookups_are_not_found() {
    let mut p = project_with_transistor();
    p.add_block("main").unwrap();

    assert!(matches!(p.add_pin_to_block("nope", "a"), Err(NetlistError::NotFound { kind: ObjectKind::Block, .. })));
    assert!(matches!(p.remove_instance_from_block("main", "t9"), Err(NetlistError::NotFound { kind: ObjectKind::Instance, .. })));
    assert!(matches!(p.rename_net_in_block("main", "n", "m"), Err(NetlistError::NotFound { kind: ObjectKind::Net, .. })));
    assert!(matches!(
        p.connect_pin_to_net_in_block("main", "n", &PinPath::port("a")),
        Err(NetlistError::NotFound { kind: ObjectKind::Net, .. })
    ));
}
