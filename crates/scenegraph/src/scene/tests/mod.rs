//! Traversal scenarios across several node types

use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::foundation::math::{multiply_matrices, Mat4};

type Log = Rc<RefCell<Vec<String>>>;

/// Records every lifecycle call it receives
struct Recorder {
    name: &'static str,
    log: Log,
    enabled: bool,
    visible: bool,
    seen: Option<Mat4>,
    depth_at_execute: usize,
}

impl Recorder {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: Rc::clone(log),
            enabled: true,
            visible: true,
            seen: None,
            depth_at_execute: 0,
        }
    }

    fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    fn record(&self, hook: &str) {
        self.log.borrow_mut().push(format!("{}.{}", self.name, hook));
    }
}

impl Node for Recorder {
    fn enabled(&self, _state: &State) -> bool {
        self.record("enabled");
        self.enabled
    }

    fn prepare(&mut self, _state: &mut State) {
        self.record("prepare");
    }

    fn update(&mut self, _state: &mut State) {
        self.record("update");
    }

    fn execute(&mut self, state: &mut State) {
        self.record("execute");
        self.seen = Some(*state.current_matrix());
        self.depth_at_execute = state.matrix_depth();
    }

    fn animate(&mut self, _state: &mut State) {
        self.record("animate");
    }

    fn visible(&self, _state: &State) -> bool {
        self.record("visible");
        self.visible
    }

    fn cleanup(&mut self, _state: &mut State) {
        self.record("cleanup");
    }
}

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

#[test]
fn test_nested_transformations_reach_leaf() {
    let log = new_log();
    let mut state = State::new();
    let mut tree = NodeTree::new();

    let root = tree.insert(Group, None).unwrap();
    let mut translate = Transformation::identity();
    translate.translate(1.0, 0.0, 0.0);
    let translate = tree.insert(translate, Some(root)).unwrap();
    let mut scale = Transformation::identity();
    scale.scale(2.0, 2.0, 2.0);
    let scale = tree.insert(scale, Some(translate)).unwrap();
    let leaf = tree.insert(Recorder::new("leaf", &log), Some(scale)).unwrap();

    let stats = state.execute(&mut tree, root).unwrap();

    let expected = multiply_matrices(
        &Transformation::translation_matrix(1.0, 0.0, 0.0),
        &Transformation::scale_matrix(2.0, 2.0, 2.0),
    );
    let recorder = tree.get::<Recorder>(leaf).unwrap();
    assert_eq!(recorder.seen, Some(expected));
    assert_eq!(recorder.depth_at_execute, 3);
    assert_eq!(state.matrix_depth(), 1);
    assert_eq!(*state.current_matrix(), Mat4::identity());
    assert_eq!(stats, TraversalStats { visited: 4, skipped: 0, max_depth: 3 });
}

#[test]
fn test_hooks_run_in_lifecycle_order() {
    let log = new_log();
    let mut state = State::new();
    let mut tree = NodeTree::new();

    let root = tree.insert(Recorder::new("root", &log), None).unwrap();
    tree.insert(Recorder::new("a", &log), Some(root)).unwrap();
    tree.insert(Recorder::new("b", &log), Some(root)).unwrap();

    state.execute(&mut tree, root).unwrap();

    let mut expected = Vec::new();
    let hooks = ["enabled", "prepare", "update", "execute", "animate", "visible"];
    expected.extend(hooks.iter().map(|hook| format!("root.{hook}")));
    for child in ["a", "b"] {
        expected.extend(hooks.iter().map(|hook| format!("{child}.{hook}")));
        expected.push(format!("{child}.cleanup"));
    }
    expected.push("root.cleanup".to_string());
    assert_eq!(entries(&log), expected);
}

#[test]
fn test_disabled_node_skips_whole_subtree() {
    let log = new_log();
    let mut state = State::new();
    let mut tree = NodeTree::new();

    let root = tree.insert(Group, None).unwrap();
    let off = tree.insert(Recorder::new("off", &log).disabled(), Some(root)).unwrap();
    tree.insert(Recorder::new("child", &log), Some(off)).unwrap();
    tree.insert(Recorder::new("sibling", &log), Some(root)).unwrap();

    let stats = state.execute(&mut tree, root).unwrap();

    let log = entries(&log);
    assert_eq!(log.first().map(String::as_str), Some("off.enabled"));
    assert!(log.iter().all(|entry| !entry.starts_with("off.") || entry == "off.enabled"));
    assert!(log.iter().all(|entry| !entry.starts_with("child.")));
    assert!(log.contains(&"sibling.execute".to_string()));
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.visited, 2);
}

#[test]
fn test_invisible_node_still_cleans_up() {
    let log = new_log();
    let mut state = State::new();
    let mut tree = NodeTree::new();

    let hidden = tree.insert(Recorder::new("hidden", &log).hidden(), None).unwrap();
    tree.insert(Recorder::new("child", &log), Some(hidden)).unwrap();

    state.execute(&mut tree, hidden).unwrap();

    let log = entries(&log);
    assert_eq!(log.last().map(String::as_str), Some("hidden.cleanup"));
    assert!(log.contains(&"hidden.execute".to_string()));
    assert!(log.iter().all(|entry| !entry.starts_with("child.")));
}

#[test]
fn test_sibling_does_not_inherit_transform() {
    let mut state = State::new();
    let mut tree = NodeTree::new();

    let root = tree.insert(Group, None).unwrap();
    let mut left = Transformation::identity();
    left.rotate(0.0, 1.0, 0.0, 0.25);
    let left = tree.insert(left, Some(root)).unwrap();
    tree.insert(Transformation::identity(), Some(left)).unwrap();

    let log = new_log();
    let sibling = tree.insert(Recorder::new("sibling", &log), Some(root)).unwrap();

    state.push_matrix();
    state.execute(&mut tree, root).unwrap();
    assert_eq!(state.matrix_depth(), 2);

    // The sibling sees none of the rotation applied inside `left`
    let recorder = tree.get::<Recorder>(sibling).unwrap();
    assert_eq!(recorder.seen, Some(Mat4::identity()));
    assert_eq!(recorder.depth_at_execute, 2);
}

#[test]
fn test_repeated_passes_are_identical() {
    let log = new_log();
    let mut state = State::new();
    state.set_perspective_projection_ex(1.0, 1.2, 0.1, 50.0);
    let mut tree = NodeTree::new();

    let mut spin = Transformation::identity();
    spin.rotate(1.0, 0.0, 0.0, 0.5).translate(0.0, 0.0, -3.0);
    let root = tree.insert(spin, None).unwrap();
    let leaf = tree.insert(Recorder::new("leaf", &log), Some(root)).unwrap();

    state.execute(&mut tree, root).unwrap();
    let first = tree.get::<Recorder>(leaf).unwrap().seen;
    state.execute(&mut tree, root).unwrap();
    let second = tree.get::<Recorder>(leaf).unwrap().seen;

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(state.matrix_depth(), 1);
}

#[test]
fn test_executing_destroyed_root_fails() {
    let mut state = State::new();
    let mut tree = NodeTree::new();
    let root = tree.insert(Group, None).unwrap();
    tree.destroy(root, state.rasterizer_mut()).unwrap();

    assert_eq!(state.execute(&mut tree, root), Err(SceneError::NodeNotFound(root)));
}

#[test]
fn test_subtree_root_traversal() {
    let log = new_log();
    let mut state = State::new();
    let mut tree = NodeTree::new();

    let root = tree.insert(Recorder::new("root", &log), None).unwrap();
    let branch = tree.insert(Recorder::new("branch", &log), Some(root)).unwrap();
    tree.insert(Recorder::new("leaf", &log), Some(branch)).unwrap();

    let stats = state.execute(&mut tree, branch).unwrap();

    assert!(entries(&log).iter().all(|entry| !entry.starts_with("root.")));
    assert_eq!(stats, TraversalStats { visited: 2, skipped: 0, max_depth: 1 });
}
