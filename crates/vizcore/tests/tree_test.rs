use std::collections::BTreeSet;

use vizcore::{
    Error, FlatNode, HierarchyData, Margin, NodeId, Orientation, TreeConfig, TreeLayout,
};

fn small_tree() -> TreeLayout {
    let root = HierarchyData::with_children(
        "R",
        vec![
            HierarchyData::with_children("A", vec![HierarchyData::leaf("A1")]),
            HierarchyData::leaf("B"),
        ],
    );
    TreeLayout::build(&root, TreeConfig::default()).expect("tree")
}

fn org_chart() -> TreeLayout {
    let data = HierarchyData::from_json(include_str!("fixtures/org_chart.json")).expect("fixture");
    TreeLayout::build(&data, TreeConfig::default()).expect("tree")
}

fn active_names(t: &TreeLayout) -> BTreeSet<String> {
    t.active_nodes().map(|n| n.name.clone()).collect()
}

fn id(t: &TreeLayout, name: &str) -> NodeId {
    t.find(name).unwrap_or_else(|| panic!("missing node {name}"))
}

#[test]
fn build_assigns_depths_and_starts_expanded() {
    let t = small_tree();
    assert_eq!(t.len(), 4);
    let depths: Vec<(String, usize)> = t
        .nodes()
        .iter()
        .map(|n| (n.name.clone(), n.depth))
        .collect();
    assert_eq!(
        depths,
        vec![
            ("R".to_string(), 0),
            ("A".to_string(), 1),
            ("A1".to_string(), 2),
            ("B".to_string(), 1),
        ]
    );
    assert!(t.nodes().iter().all(|n| !n.collapsed));
    assert_eq!(t.height(), 2);
}

#[test]
fn collapsing_hides_descendants_but_keeps_them_in_the_model() {
    let mut t = small_tree();
    t.layout(800.0, 400.0, 25.0).expect("layout");
    assert!(active_names(&t).contains("A1"));

    let a = id(&t, "A");
    t.toggle(a).expect("collapse");
    t.layout(800.0, 400.0, 25.0).expect("layout");
    assert!(!active_names(&t).contains("A1"));
    assert!(!t.is_active(id(&t, "A1")));
    assert_eq!(t.len(), 4);
    assert_eq!(t.children(a).expect("children"), &[id(&t, "A1")]);

    t.toggle(a).expect("expand");
    assert!(active_names(&t).contains("A1"));
    assert_eq!(t.node(id(&t, "A1")).expect("A1").depth, 2);
}

#[test]
fn double_toggle_emits_two_opposite_transitions() {
    let mut t = small_tree();
    t.layout(800.0, 400.0, 25.0).expect("layout");
    let visible_before = active_names(&t);
    let a1 = id(&t, "A1");

    let first = t.toggle_named("A").expect("first toggle");
    let second = t.toggle_named("A").expect("second toggle");

    assert_eq!(first.nodes.exiting.len(), 1);
    assert_eq!(first.nodes.exiting[0].id, a1);
    assert!(first.nodes.entering.is_empty());

    assert_eq!(second.nodes.entering.len(), 1);
    assert_eq!(second.nodes.entering[0].id, a1);
    assert!(second.nodes.exiting.is_empty());

    assert_eq!(active_names(&t), visible_before);
    assert_ne!(first, second);
}

#[test]
fn depth_spacing_uses_the_deepest_active_level() {
    let mut t = TreeLayout::build(
        &HierarchyData::from_json(include_str!("fixtures/org_chart.json")).expect("fixture"),
        TreeConfig {
            margin: Margin::ZERO,
            ..Default::default()
        },
    )
    .expect("tree");

    t.layout(400.0, 300.0, 25.0).expect("layout");
    let lead = t.node(id(&t, "Team Lead 1")).expect("lead").position;
    assert_eq!(lead.x, 2.0 * 400.0 / 4.0);

    t.collapse_below(0);
    t.layout(400.0, 300.0, 25.0).expect("layout");
    let manager = t.node(id(&t, "Manager A")).expect("manager").position;
    assert_eq!(manager.x, 400.0 / 2.0);
    assert_eq!(active_names(&t).len(), 4);
}

#[test]
fn siblings_are_spaced_along_the_breadth_axis() {
    let mut t = org_chart();
    t.collapse_below(0);
    t.layout(960.0, 500.0, 30.0).expect("layout");
    let ys: Vec<f64> = ["Manager A", "Manager B", "Manager C"]
        .iter()
        .map(|n| t.node(id(&t, n)).expect("node").position.y)
        .collect();
    assert_eq!(ys[1] - ys[0], 30.0);
    assert_eq!(ys[2] - ys[1], 30.0);
    let root = t.node(NodeId::ROOT).expect("root").position;
    assert_eq!(root.y, ys[1]);
}

#[test]
fn vertical_orientation_swaps_axes() {
    let mut t = TreeLayout::build(
        &HierarchyData::with_children(
            "R",
            vec![HierarchyData::leaf("A"), HierarchyData::leaf("B")],
        ),
        TreeConfig {
            orientation: Orientation::Vertical,
            margin: Margin::ZERO,
            node_spacing: 25.0,
        },
    )
    .expect("tree");
    t.resize(100.0, 200.0).expect("layout");
    let a = t.node(id(&t, "A")).expect("A").position;
    let b = t.node(id(&t, "B")).expect("B").position;
    assert_eq!(a.y, 100.0);
    assert_eq!(b.x - a.x, 25.0);
    assert_eq!(t.node(NodeId::ROOT).expect("R").position.x, 50.0);
}

#[test]
fn links_are_keyed_by_child() {
    let mut t = org_chart();
    let tr = t.resize(960.0, 500.0).expect("layout");
    assert_eq!(tr.links.entering.len(), t.len() - 1);

    let manager_b = id(&t, "Manager B");
    let tr = t.toggle(manager_b).expect("collapse");
    let gone: BTreeSet<String> = tr
        .links
        .exiting
        .iter()
        .map(|l| t.node(l.target).expect("target").name.clone())
        .collect();
    assert_eq!(
        gone,
        ["Team Lead 3", "Team Lead 4", "Dev 5"]
            .into_iter()
            .map(String::from)
            .collect::<BTreeSet<String>>()
    );
    assert!(tr.links.entering.is_empty());
}

#[test]
fn flat_records_reject_non_trees() {
    let two_parents = vec![
        FlatNode::new("R", ["A", "B"]),
        FlatNode::new("A", ["C"]),
        FlatNode::new("B", ["C"]),
        FlatNode::new("C", Vec::<String>::new()),
    ];
    let err = TreeLayout::build_flat(&two_parents, TreeConfig::default()).unwrap_err();
    assert!(matches!(err, Error::CyclicHierarchy { .. }), "{err}");

    let looped = vec![FlatNode::new("R", ["A"]), FlatNode::new("A", ["R"])];
    let err = TreeLayout::build_flat(&looped, TreeConfig::default()).unwrap_err();
    assert!(matches!(err, Error::CyclicHierarchy { .. }), "{err}");
}

#[test]
fn flat_records_json_round_into_the_same_layout_as_nested() {
    let flat: Vec<FlatNode> = serde_json::from_str(
        r#"[
            {"key": "r", "name": "R", "children": ["a", "b"]},
            {"key": "a", "name": "A", "children": ["a1"]},
            {"key": "a1", "name": "A1"},
            {"key": "b", "name": "B"}
        ]"#,
    )
    .expect("json");
    let mut from_flat = TreeLayout::build_flat(&flat, TreeConfig::default()).expect("tree");
    let mut nested = small_tree();

    from_flat.layout(800.0, 400.0, 25.0).expect("layout");
    nested.layout(800.0, 400.0, 25.0).expect("layout");
    assert_eq!(from_flat.nodes(), nested.nodes());
}
