use std::fs;
use std::path::Path;

use netlist_core::model::{JunctionId, PinPath, RawId};
use netlist_core::WireEnd;
use netlist_edit::commands::{parse_junction, parse_wire_end, split_pins};
use netlist_edit::{canonicalize_or_current, infer_project_name};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_returns_cwd_for_dot() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = canonicalize_or_current(".").expect("canonicalize").canonicalize().expect("canon");
    let expected = tmp.path().canonicalize().expect("canon tmp");
    assert_eq!(result, expected);

    std::env::set_current_dir(original).expect("restore cwd");
}

#[test]
fn canonicalize_or_current_keeps_missing_paths_under_cwd() {
    let tmp = tempdir().expect("tempdir");
    let nested = tmp.path().join("not-yet");
    let result = canonicalize_or_current(nested.to_str().unwrap()).expect("resolve");
    assert_eq!(result, nested);

    fs::create_dir_all(&nested).unwrap();
    let result = canonicalize_or_current(nested.to_str().unwrap()).expect("resolve");
    assert_eq!(result, nested.canonicalize().unwrap());
}

#[test]
fn infer_project_name_uses_last_path_component() {
    assert_eq!(infer_project_name(Path::new("/tmp/netlist-root")), "netlist-root");
    assert_eq!(infer_project_name(Path::new("/")), "unnamed-project");
}

#[test]
fn wire_ends_parse_as_pins_or_junctions() {
    assert_eq!(parse_wire_end("j3").unwrap(), WireEnd::Junction(JunctionId::from_raw(3)));
    assert_eq!(parse_wire_end("a").unwrap(), WireEnd::Pin(PinPath::port("a")));
    assert_eq!(parse_wire_end("t1.b").unwrap(), WireEnd::Pin(PinPath::instance("t1", "b")));
    // Not followed by digits, so a pin name.
    assert_eq!(parse_wire_end("jx").unwrap(), WireEnd::Pin(PinPath::port("jx")));
    assert!(parse_wire_end(".b").is_err());
}

#[test]
fn junction_ids_accept_both_spellings() {
    assert_eq!(parse_junction("j7").unwrap(), JunctionId::from_raw(7));
    assert_eq!(parse_junction("7").unwrap(), JunctionId::from_raw(7));
    assert!(parse_junction("junction").is_err());
}

#[test]
fn pin_lists_split_on_commas() {
    assert_eq!(split_pins("g,d, s"), vec!["g", "d", "s"]);
}
