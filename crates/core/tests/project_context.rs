use netlist_core::db::{save_project_config, ProjectConfig, ProjectContext, ProjectLayout};
use netlist_core::persist::{DesignStore, JsonDesignStore};

fn init(root: &std::path::Path, name: &str) -> ProjectLayout {
    let layout = ProjectLayout::new(root);
    let config = ProjectConfig::new(
        name,
        layout.relative_string(&layout.design_path),
        layout.relative_string(&layout.history_path),
    );
    save_project_config(&layout, &config).expect("save config");
    layout
}

#[test]
fn layout_paths_hang_off_the_root() {
    let layout = ProjectLayout::new("/tmp/proj");
    assert!(layout.meta_dir.ends_with(".netlist"));
    assert!(layout.project_config_path.ends_with(".netlist/project.json"));
    assert_eq!(layout.relative_string(&layout.history_path), ".netlist/history.db");
    assert_eq!(layout.relative_string(&layout.design_path), "design.json");
    assert_eq!(layout.resolve("/abs/design.json"), std::path::PathBuf::from("/abs/design.json"));
}

#[test]
fn project_context_loads_config_and_history() {
    let temp = tempfile::tempdir().unwrap();
    init(temp.path(), "CtxProject");

    let ctx = ProjectContext::from_root(temp.path()).expect("context");
    assert_eq!(ctx.config.name, "CtxProject");
    assert!(ctx.config.history.enabled);
    assert!(ctx.history_path.is_file());

    // No design yet: a fresh one seeded with the builtin primitives.
    let schematic = ctx.load_schematic().expect("schematic");
    assert_eq!(schematic.project().name(), "CtxProject");
    assert!(schematic.project().block("transistor").is_some());
}

#[test]
fn commit_saves_and_checkpoints_and_undo_restores() {
    let temp = tempfile::tempdir().unwrap();
    init(temp.path(), "Undo");
    let mut ctx = ProjectContext::from_root(temp.path()).unwrap();

    let mut schematic = ctx.load_schematic().unwrap();
    ctx.commit(&schematic, "Initialize project").unwrap().expect("first checkpoint");
    schematic.add_block("main").unwrap();
    ctx.commit(&schematic, "Add block main").unwrap().expect("second checkpoint");
    assert_eq!(ctx.commit(&schematic, "no-op").unwrap(), None);

    let on_disk = JsonDesignStore.load(&ctx.design_path).unwrap();
    assert!(on_disk.project().block("main").is_some());

    let restored = ctx.undo().unwrap();
    assert_eq!(restored.action, "Initialize project");
    assert!(ctx.load_schematic().unwrap().project().block("main").is_none());

    ctx.redo().unwrap();
    assert!(ctx.load_schematic().unwrap().project().block("main").is_some());
    assert!(ctx.redo().unwrap_err().to_string().contains("Nothing to redo"));
}

#[test]
fn disabled_history_still_saves_the_design() {
    let temp = tempfile::tempdir().unwrap();
    let layout = init(temp.path(), "NoHistory");
    let mut config = netlist_core::db::load_project_config(&layout).unwrap();
    config.history.enabled = false;
    save_project_config(&layout, &config).unwrap();

    let mut ctx = ProjectContext::from_root(temp.path()).unwrap();
    let schematic = ctx.load_schematic().unwrap();
    assert_eq!(ctx.commit(&schematic, "Initialize project").unwrap(), None);
    assert!(ctx.design_path.is_file());
    assert!(ctx.history.list().unwrap().is_empty());
}

#[test]
fn configured_primitive_library_seeds_new_designs() {
    let temp = tempfile::tempdir().unwrap();
    let layout = init(temp.path(), "Custom");
    std::fs::write(temp.path().join("prims.yaml"), "primitives:\n  - name: nmos\n    pins: [g, d, s]\n").unwrap();
    let mut config = netlist_core::db::load_project_config(&layout).unwrap();
    config.primitives = Some("prims.yaml".to_string());
    save_project_config(&layout, &config).unwrap();

    let ctx = ProjectContext::from_root(temp.path()).unwrap();
    let schematic = ctx.empty_schematic().unwrap();
    assert!(schematic.project().block("nmos").is_some());
    assert!(schematic.project().block("transistor").is_none());
}

#[test]
fn missing_config_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let err = ProjectContext::from_root(temp.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to read project config"));
}
