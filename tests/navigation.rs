use ascm::exec::{Attribs, Command};
use ascm::nav::fit;
use ascm::{
    Activation, LabelStyle, LineUpdate, MenuEntry, MenuError, MenuTree, NavError, Navigator,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn cmd(label: &str) -> MenuEntry {
    MenuEntry::command(label, Command::new(format!("echo {label}"), Attribs::default()))
}

fn items(n: usize) -> Vec<MenuEntry> {
    (0..n).map(|i| cmd(&format!("item{i}"))).collect()
}

fn tree(entries: Vec<MenuEntry>) -> MenuTree {
    MenuTree::new("Test", entries, &LabelStyle::default()).expect("valid tree")
}

fn nav(entries: Vec<MenuEntry>, height: usize) -> Navigator {
    let mut nav = Navigator::new(tree(entries)).expect("non-empty menu");
    nav.resize(height, 80);
    nav
}

fn visible_labels(nav: &Navigator) -> Vec<String> {
    nav.visible_items()
        .iter()
        .map(|&id| nav.tree().node(id).label().to_string())
        .collect()
}

fn rows(updates: &[LineUpdate]) -> Vec<usize> {
    updates.iter().map(|u| u.row).collect()
}

/// A[A1, B[B1]], C
fn nested() -> Vec<MenuEntry> {
    vec![
        MenuEntry::submenu("A", vec![cmd("A1"), MenuEntry::submenu("B", vec![cmd("B1")])]),
        cmd("C"),
    ]
}

#[test]
fn flatten_skips_children_of_folded_submenus() {
    let mut t = tree(vec![MenuEntry::submenu("A", vec![cmd("A1"), cmd("A2")])]);
    let labels = |t: &MenuTree| -> Vec<String> {
        t.flatten(true).map(|id| t.node(id).label().to_string()).collect()
    };
    assert_eq!(labels(&t), vec!["A"]);

    let a = t.top_level()[0];
    t.set_unfolded(a, true, false).unwrap();
    assert_eq!(labels(&t), vec!["A", "A1", "A2"]);
}

#[test]
fn flatten_is_restartable_and_ignores_folds_when_asked() {
    let t = tree(nested());
    let first: Vec<_> = t.flatten(false).collect();
    let second: Vec<_> = t.flatten(false).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
    assert_eq!(t.flatten(true).count(), 2);
}

#[test]
fn depth_and_display_labels_follow_nesting() {
    let t = tree(vec![MenuEntry::submenu(
        "Sys",
        vec![cmd("top"), MenuEntry::Separator],
    )]);
    let all: Vec<_> = t.flatten(false).map(|id| t.node(id)).collect();
    assert_eq!(all[0].depth(), 1);
    assert_eq!(all[0].display_label(), "Sys...");
    assert_eq!(all[1].depth(), 2);
    assert_eq!(all[1].display_label(), "    top");
    assert_eq!(all[2].display_label(), format!("    {}", "-".repeat(16)));
    assert_eq!(all[2].label(), "");
    assert_eq!(t.max_label_width(), 20);
}

#[test]
fn recursive_unfold_opens_nested_submenus() {
    let mut nav = nav(nested(), 10);
    let updates = nav.unfold(true).unwrap();
    assert_eq!(updates.len(), 10);
    assert_eq!(visible_labels(&nav), vec!["A", "A1", "B", "B1", "C"]);
    let t = nav.tree();
    assert!(t.flatten(false).filter(|&id| t.node(id).is_submenu()).all(|id| t.node(id).is_unfolded()));

    nav.fold(true).unwrap();
    nav.unfold(false).unwrap();
    // B was folded along with A
    assert_eq!(visible_labels(&nav), vec!["A", "A1", "B", "C"]);
}

#[test]
fn fold_then_unfold_restores_visible_items() {
    let mut nav = nav(nested(), 10);
    nav.unfold(true).unwrap();
    let before = nav.visible_items().to_vec();

    nav.toggle_fold().unwrap();
    assert_eq!(visible_labels(&nav), vec!["A", "C"]);
    nav.toggle_fold().unwrap();
    assert_eq!(nav.visible_items(), before.as_slice());
}

#[test]
fn wrapping_full_cycle_returns_to_start() {
    let mut nav = nav(nested(), 3);
    nav.unfold(true).unwrap();
    nav.move_absolute(2);
    let n = nav.visible_items().len();
    for _ in 0..n {
        nav.move_relative(1, true);
    }
    assert_eq!(nav.cursor(), 2);
}

#[test]
fn single_steps_use_fast_path_until_the_window_scrolls() {
    let mut nav = nav(items(10), 5);
    let mut first_full = None;
    for step in 1..=9 {
        let updates = nav.move_relative(1, false);
        assert_eq!(nav.cursor(), step);
        if updates.len() == 5 {
            first_full.get_or_insert(step);
            assert_eq!(rows(&updates), vec![0, 1, 2, 3, 4]);
        } else {
            assert_eq!(updates.len(), 2);
            assert_eq!(rows(&updates), vec![step - 1, step]);
            assert!(!updates[0].is_cursor);
            assert!(updates[1].is_cursor);
        }
    }
    assert_eq!(first_full, Some(5));
    assert_eq!(nav.offset(), 5);
}

#[test]
fn end_scrolls_window_to_last_item() {
    let mut nav = nav(items(10), 3);
    let updates = nav.end();
    assert_eq!(nav.cursor(), 9);
    assert_eq!(nav.offset(), 7);
    assert_eq!(rows(&updates), vec![0, 1, 2]);
    assert!(updates[2].is_cursor);
    assert_eq!(updates[2].text.trim_end(), "item9");

    let updates = nav.home();
    assert_eq!((nav.cursor(), nav.offset()), (0, 0));
    assert_eq!(updates.len(), 3);
}

#[test]
fn moving_against_a_boundary_without_wrap_redraws_nothing() {
    let mut nav = nav(items(4), 5);
    assert!(nav.move_relative(-1, false).is_empty());
    nav.end();
    assert!(nav.move_relative(3, false).is_empty());
    assert_eq!(nav.cursor(), 3);
}

#[test]
fn wrapping_up_from_the_top_jumps_to_the_last_item() {
    let mut nav = nav(items(10), 5);
    let updates = nav.move_relative(-1, true);
    assert_eq!(nav.cursor(), 9);
    assert_eq!(nav.offset(), 5);
    assert_eq!(updates.len(), 5);

    nav.move_relative(1, true);
    assert_eq!((nav.cursor(), nav.offset()), (0, 0));
}

#[test]
fn half_pages_move_by_half_the_height() {
    let mut nav = nav(items(20), 7);
    nav.half_page_down();
    assert_eq!(nav.cursor(), 3);
    nav.half_page_down();
    assert_eq!(nav.cursor(), 6);
    nav.half_page_up();
    assert_eq!(nav.cursor(), 3);

    // one-row viewport still moves
    nav.resize(1, 80);
    nav.half_page_down();
    assert_eq!(nav.cursor(), 4);
    assert_eq!(nav.offset(), 4);
}

#[test]
fn rows_past_the_end_are_blank() {
    let mut nav = Navigator::new(tree(items(2))).unwrap();
    let updates = nav.resize(4, 80);
    assert_eq!(updates.len(), 4);
    assert_eq!(nav.width(), 5);
    assert_eq!(updates[0].text, "item0");
    assert!(updates[0].is_cursor);
    assert_eq!(updates[2].text, "     ");
    assert!(!updates[3].is_cursor);
}

#[test]
fn resize_clamps_width_to_widest_label() {
    let mut nav = Navigator::new(tree(nested())).unwrap();
    nav.resize(3, 200);
    assert_eq!(nav.width(), nav.tree().max_label_width());

    let updates = nav.resize(0, 3);
    assert_eq!(nav.height(), 1);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].text, "A..");
}

#[test]
fn fold_or_move_to_parent_on_folded_depth_two_submenu() {
    let mut nav = nav(vec![cmd("first")].into_iter().chain(nested()).collect(), 10);
    nav.move_absolute(1);
    nav.unfold(false).unwrap();
    assert_eq!(visible_labels(&nav), vec!["first", "A", "A1", "B", "C"]);

    nav.move_absolute(3);
    assert!(nav.current_item().is_submenu());
    assert!(!nav.current_item().is_unfolded());
    nav.fold_or_move_to_parent();
    assert_eq!(nav.cursor(), 1);
    assert_eq!(nav.current_item().label(), "A");
}

#[test]
fn fold_or_move_to_parent_folds_an_open_submenu_first() {
    let mut nav = nav(nested(), 10);
    nav.unfold(true).unwrap();
    nav.move_absolute(2);

    let updates = nav.fold_or_move_to_parent();
    assert_eq!(updates.len(), 10);
    assert_eq!(nav.cursor(), 2);
    assert_eq!(visible_labels(&nav), vec!["A", "A1", "B", "C"]);

    nav.fold_or_move_to_parent();
    assert_eq!(nav.cursor(), 0);
}

#[test]
fn move_to_parent_stops_at_nearest_shallower_row() {
    let mut nav = nav(nested(), 10);
    nav.unfold(true).unwrap();
    nav.move_absolute(3);
    assert_eq!(nav.current_item().label(), "B1");

    nav.move_to_parent();
    assert_eq!(nav.current_item().label(), "B");
    nav.move_to_parent();
    assert_eq!(nav.current_item().label(), "A");

    // top-level rows have no parent row; the cursor goes to the first row
    nav.move_absolute(4);
    nav.move_to_parent();
    assert_eq!(nav.cursor(), 0);
}

#[test]
fn fold_on_a_command_is_an_error() {
    let mut nav = nav(nested(), 10);
    nav.end();
    let expected = NavError::NotFoldable {
        label: "C".to_string(),
    };
    assert_eq!(nav.unfold(false), Err(expected.clone()));
    assert_eq!(nav.fold(true), Err(expected.clone()));
    assert_eq!(nav.toggle_fold(), Err(expected));
}

#[test]
fn empty_menus_are_rejected() {
    let err = MenuTree::new("Nothing", Vec::new(), &LabelStyle::default()).unwrap_err();
    assert!(matches!(err, MenuError::Empty(name) if name == "Nothing"));

    let err = MenuTree::new(
        "Menu",
        vec![MenuEntry::submenu("Hollow", Vec::new())],
        &LabelStyle::default(),
    )
    .unwrap_err();
    assert!(matches!(err, MenuError::EmptySubmenu(label) if label == "Hollow"));
}

#[test]
fn activate_toggles_submenus_and_hands_out_commands() {
    let entries = vec![
        MenuEntry::submenu("A", vec![cmd("A1")]),
        MenuEntry::Separator,
        MenuEntry::command("noop", Command::default()),
        cmd("run"),
    ];
    let mut nav = nav(entries, 10);

    assert!(matches!(nav.activate(), Activation::Redraw(lines) if lines.len() == 10));
    assert!(nav.current_item().is_unfolded());

    nav.move_absolute(2);
    assert_eq!(nav.activate(), Activation::Idle);
    nav.move_absolute(3);
    assert_eq!(nav.activate(), Activation::Idle);

    nav.home();
    assert!(matches!(nav.activate(), Activation::Redraw(_)));
    assert_eq!(visible_labels(&nav), vec!["A", "", "noop", "run"]);

    nav.end();
    match nav.activate() {
        Activation::Run { label, command } => {
            assert_eq!(label, "run");
            assert_eq!(command.cmd_str(), "echo run");
        }
        other => panic!("expected Run, got {other:?}"),
    }
}

#[test]
fn reload_resets_cursor_and_viewport() {
    let mut nav = nav(items(10), 3);
    nav.end();
    let updates = nav.reload(tree(nested())).unwrap();
    assert_eq!((nav.cursor(), nav.offset()), (0, 0));
    assert_eq!(updates.len(), 3);
    assert_eq!(visible_labels(&nav), vec!["A", "C"]);
}

#[test]
fn fit_pads_and_truncates_by_columns() {
    assert_eq!(fit("abc", 5), "abc  ");
    assert_eq!(fit("abcdef", 3), "abc");
    assert_eq!(fit("日本語", 5), "日本 ");
    assert_eq!(fit("", 2), "  ");
}

#[derive(Debug, Clone)]
enum Op {
    Relative(isize, bool),
    Absolute(usize),
    Home,
    End,
    PageDown,
    PageUp,
    Parent,
    Toggle,
    Resize(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-25isize..25, any::<bool>()).prop_map(|(d, w)| Op::Relative(d, w)),
        (0usize..60).prop_map(Op::Absolute),
        Just(Op::Home),
        Just(Op::End),
        Just(Op::PageDown),
        Just(Op::PageUp),
        Just(Op::Parent),
        Just(Op::Toggle),
        (0usize..15).prop_map(Op::Resize),
    ]
}

fn big_menu() -> Vec<MenuEntry> {
    vec![
        cmd("alpha"),
        MenuEntry::submenu(
            "tools",
            vec![
                cmd("t1"),
                cmd("t2"),
                MenuEntry::submenu("deep", vec![cmd("d1"), cmd("d2"), cmd("d3")]),
                MenuEntry::Separator,
            ],
        ),
        cmd("beta"),
        MenuEntry::Separator,
        MenuEntry::submenu("more", items(12)),
        cmd("gamma"),
    ]
}

proptest! {
    #[test]
    fn cursor_stays_inside_list_and_viewport(ops in proptest::collection::vec(op(), 1..80)) {
        let mut nav = nav(big_menu(), 4);
        for op in ops {
            let updates = match op {
                Op::Relative(d, w) => nav.move_relative(d, w),
                Op::Absolute(i) => nav.move_absolute(i),
                Op::Home => nav.home(),
                Op::End => nav.end(),
                Op::PageDown => nav.half_page_down(),
                Op::PageUp => nav.half_page_up(),
                Op::Parent => nav.fold_or_move_to_parent(),
                Op::Toggle if nav.current_item().is_submenu() => nav.toggle_fold().unwrap(),
                Op::Toggle => Vec::new(),
                Op::Resize(h) => nav.resize(h, 80),
            };
            let len = nav.visible_items().len();
            prop_assert!(nav.cursor() < len);
            prop_assert!(nav.offset() <= nav.cursor());
            prop_assert!(nav.cursor() < nav.offset() + nav.height());
            for u in &updates {
                prop_assert!(u.row < nav.height());
                prop_assert_eq!(u.text.chars().count(), nav.width());
                prop_assert_eq!(u.is_cursor, nav.offset() + u.row == nav.cursor());
            }
        }
    }
}
