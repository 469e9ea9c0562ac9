use super::*;

#[derive(Clone, Default)]
struct Counters {
    activated: Rc<Cell<u32>>,
    deactivated: Rc<Cell<u32>>,
    reset: Rc<Cell<u32>>,
}

struct Probe(Counters);

impl Tool for Probe {
    fn activate(&mut self, setup: &mut ToolSetup<'_>) {
        self.0.activated.set(self.0.activated.get() + 1);
        setup.on_pointer_down(|_, _| CallbackStatus::Stop);
        setup.on_key_down(|_, _| CallbackStatus::Continue);
    }

    fn deactivate(&mut self) {
        self.0.deactivated.set(self.0.deactivated.get() + 1);
    }

    fn reset(&mut self) {
        self.0.reset.set(self.0.reset.get() + 1);
    }
}

fn probe(tools: &ToolRegistry, name: &str) -> (Counters, CallbackHandle) {
    let counters = Counters::default();
    let tool: Rc<RefCell<dyn Tool>> = Rc::new(RefCell::new(Probe(counters.clone())));
    let handle = tools.register(name, tool);
    (counters, handle)
}

#[test]
fn switching_tools_releases_the_old_handlers() {
    let tools = ToolRegistry::default();
    let handlers = InputHandlers::default();
    let config = EditorConfig::default();
    let (a, _ha) = probe(&tools, "a");
    let (b, _hb) = probe(&tools, "b");
    let mut manager = ToolManager::new();

    manager.activate("a", &tools, &handlers, &config).unwrap();
    assert_eq!(manager.active_name(), Some("a"));
    assert_eq!(manager.active_handle_count(), 2);
    assert_eq!(handlers.pointer_down.len(), 1);

    manager.activate("b", &tools, &handlers, &config).unwrap();
    assert_eq!(manager.active_name(), Some("b"));
    assert_eq!(manager.previous_name(), Some("a"));
    assert_eq!(a.deactivated.get(), 1);
    assert_eq!(b.activated.get(), 1);
    assert_eq!(handlers.pointer_down.len(), 1);
    assert_eq!(handlers.key_down.len(), 1);

    assert_eq!(manager.deactivate().as_deref(), Some("b"));
    assert!(handlers.pointer_down.is_empty());
    assert!(handlers.key_down.is_empty());
}

#[test]
fn reactivating_the_active_tool_is_a_noop() {
    let tools = ToolRegistry::default();
    let handlers = InputHandlers::default();
    let config = EditorConfig::default();
    let (a, _ha) = probe(&tools, "a");
    let mut manager = ToolManager::new();

    manager.activate("a", &tools, &handlers, &config).unwrap();
    manager.activate("a", &tools, &handlers, &config).unwrap();
    assert_eq!(a.activated.get(), 1);
    assert_eq!(a.deactivated.get(), 0);
    assert_eq!(handlers.pointer_down.len(), 1);
}

#[test]
fn unknown_tool_keeps_the_active_one() {
    let tools = ToolRegistry::default();
    let handlers = InputHandlers::default();
    let config = EditorConfig::default();
    let (_a, _ha) = probe(&tools, "a");
    let mut manager = ToolManager::new();

    manager.activate("a", &tools, &handlers, &config).unwrap();
    let err = manager.activate("nope", &tools, &handlers, &config).unwrap_err();
    assert!(err.to_string().contains("unknown tool nope"));
    assert_eq!(manager.active_name(), Some("a"));
    assert_eq!(handlers.pointer_down.len(), 1);
}

#[test]
fn previous_tool_swaps_back() {
    let tools = ToolRegistry::default();
    let handlers = InputHandlers::default();
    let config = EditorConfig::default();
    let (_a, _ha) = probe(&tools, "a");
    let (_b, _hb) = probe(&tools, "b");
    let mut manager = ToolManager::new();

    assert!(manager.activate_previous(&tools, &handlers, &config).is_err());
    manager.activate("a", &tools, &handlers, &config).unwrap();
    manager.activate("b", &tools, &handlers, &config).unwrap();
    manager.activate_previous(&tools, &handlers, &config).unwrap();
    assert_eq!(manager.active_name(), Some("a"));
    assert_eq!(manager.previous_name(), Some("b"));
}

#[test]
fn reset_reaches_only_the_active_tool() {
    let tools = ToolRegistry::default();
    let handlers = InputHandlers::default();
    let config = EditorConfig::default();
    let (a, _ha) = probe(&tools, "a");
    let mut manager = ToolManager::new();

    manager.reset_active();
    assert_eq!(a.reset.get(), 0);
    manager.activate("a", &tools, &handlers, &config).unwrap();
    manager.reset_active();
    assert_eq!(a.reset.get(), 1);
}

#[test]
fn unregistered_tool_is_dropped() {
    let tools = ToolRegistry::default();
    let handlers = InputHandlers::default();
    let config = EditorConfig::default();
    let (_a, _ha) = probe(&tools, "a");
    let (b, mut hb) = probe(&tools, "b");
    let mut manager = ToolManager::new();

    manager.activate("a", &tools, &handlers, &config).unwrap();
    manager.activate("b", &tools, &handlers, &config).unwrap();
    assert!(!manager.drop_unregistered(&tools));

    hb.release();
    assert!(manager.drop_unregistered(&tools));
    assert_eq!(manager.active_name(), None);
    assert_eq!(b.deactivated.get(), 1);
    assert!(handlers.pointer_down.is_empty());
    assert_eq!(manager.previous_name(), Some("a"));
}

#[test]
fn options_in_a_category_are_exclusive() {
    let options = ToolOptions::new();
    let _merge = options.register("merge", Some("bool"));
    let _subtract = options.register("subtract", Some("bool"));
    let _snap = options.register("snap", None);

    assert!(options.activate("merge"));
    assert!(options.activate("snap"));
    assert!(options.activate("subtract"));
    assert!(!options.is_active("merge"));
    assert!(options.is_active("snap"));
    assert_eq!(options.active_in("bool").as_deref(), Some("subtract"));

    options.deactivate_category("bool");
    assert_eq!(options.active_in("bool"), None);
    assert!(options.is_active("snap"));
    assert!(!options.activate("missing"));
}

#[test]
fn released_option_disappears() {
    let options = ToolOptions::new();
    let mut handle = options.register("merge", Some("bool"));
    assert!(options.contains("merge"));
    handle.release();
    assert!(!options.contains("merge"));
    assert!(!options.is_active("merge"));
}
