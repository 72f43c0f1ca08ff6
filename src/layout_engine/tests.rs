use crate::common::config::LayoutSettings;
use crate::layout_engine::{
    LayoutCommand, LayoutEngine, LayoutError, LayoutEvent, ResizeCorner, ShiftDirection,
    TabLockMode,
};
use crate::model::{GroupEphemerality, GroupLayout, NodeId};
use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::headless::{HeadlessCompositor, HeadlessWorkspace};
use crate::sys::host::{Monitor, WindowId, WorkspaceId};

const WS: WorkspaceId = WorkspaceId(1);

fn w(id: u64) -> WindowId { WindowId(id) }

fn setup(settings: LayoutSettings, size: Size) -> (LayoutEngine, HeadlessCompositor) {
    (LayoutEngine::new(settings), HeadlessCompositor::with_workspace(WS, size))
}

fn open(engine: &mut LayoutEngine, host: &mut HeadlessCompositor, id: u64) -> NodeId {
    host.add_window(w(id), WS);
    let node = engine.add_window(host, w(id)).unwrap().unwrap();
    host.focused = Some(w(id));
    node
}

fn node(engine: &LayoutEngine, id: u64) -> NodeId { engine.find_by_window(w(id)).unwrap() }

/// Windows of each child of `group`; a nested group lists all its windows.
fn shape(engine: &LayoutEngine, group: NodeId) -> Vec<Vec<u64>> {
    group
        .children(engine.tree())
        .iter()
        .map(|&c| c.windows(engine.tree()).iter().map(|w| w.0).collect())
        .collect()
}

fn root(engine: &LayoutEngine) -> NodeId { engine.root_of(WS).unwrap() }

fn assert_valid(engine: &LayoutEngine) {
    let issues = engine.check_invariants();
    assert!(issues.is_empty(), "{issues:#?}\n{}", engine.draw_tree(WS));
}

fn command(engine: &mut LayoutEngine, host: &mut HeadlessCompositor, cmd: LayoutCommand) {
    engine.handle_command(host, WS, cmd).unwrap();
    assert_valid(engine);
}

fn shift(direction: ShiftDirection, once: bool, visible: bool) -> LayoutCommand {
    LayoutCommand::ShiftWindow { direction, once, visible }
}

mod insertion {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn first_window_creates_root_group() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        let root = root(&engine);
        assert_eq!(engine.tree().group(root).unwrap().layout, GroupLayout::SplitH);
        assert_eq!(shape(&engine, root), vec![vec![1]]);
        assert_eq!(host.frame(w(1)), Some(Rect::from_xywh(0.0, 0.0, 1000.0, 500.0)));
        assert_valid(&engine);
    }

    #[test]
    fn portrait_monitor_gets_vertical_root() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(500.0, 1000.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        assert_eq!(engine.tree().group(root(&engine)).unwrap().layout, GroupLayout::SplitV);
        assert_eq!(host.frame(w(2)), Some(Rect::from_xywh(0.0, 500.0, 500.0, 500.0)));
    }

    #[test]
    fn new_window_goes_after_focused_one() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1200.0, 600.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        engine.handle_event(&mut host, LayoutEvent::WindowFocused(w(1))).unwrap();
        open(&mut engine, &mut host, 3);
        assert_eq!(shape(&engine, root(&engine)), vec![vec![1], vec![3], vec![2]]);
        assert_eq!(engine.find_tiled_window_candidate(WS), Some(w(3)));
        assert_valid(&engine);
    }

    #[test]
    fn n_windows_tile_the_workspace_with_gaps() {
        let mut settings = LayoutSettings::default();
        settings.gaps.outer.top = 10.0;
        settings.gaps.outer.left = 10.0;
        settings.gaps.outer.bottom = 10.0;
        settings.gaps.outer.right = 10.0;
        settings.gaps.inner.horizontal = 8.0;
        let (mut engine, mut host) = setup(settings, Size::new(1000.0, 500.0));
        for id in 1..=4 {
            open(&mut engine, &mut host, id);
            assert_valid(&engine);
        }
        let frames: Vec<Rect> = (1..=4).map(|id| host.frame(w(id)).unwrap()).collect();
        assert_eq!(frames[0].origin, Point::new(10.0, 10.0));
        assert_eq!(frames[0].size.height, 480.0);
        assert_eq!(frames[3].max().x, 990.0);
        for pair in frames.windows(2) {
            assert_eq!(pair[1].origin.x - pair[0].max().x, 8.0);
        }
    }

    #[test]
    fn floating_windows_are_not_tiled() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        host.add_window(w(1), WS);
        host.windows.get_mut(&w(1)).unwrap().floating = true;
        assert_eq!(engine.add_window(&mut host, w(1)), Ok(None));
        assert!(engine.tree().is_empty());
    }

    #[test]
    fn rejected_insertions_leave_tree_untouched() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        let first = open(&mut engine, &mut host, 1);
        assert_eq!(
            engine.add_window(&mut host, w(1)),
            Err(LayoutError::WindowAlreadyTiled(w(1), first))
        );

        host.add_window(w(2), WorkspaceId(7));
        assert_eq!(
            engine.add_window(&mut host, w(2)),
            Err(LayoutError::InvalidWorkspace(WorkspaceId(7)))
        );

        host.workspaces.insert(WorkspaceId(3), HeadlessWorkspace::default());
        host.add_window(w(3), WorkspaceId(3));
        assert_eq!(
            engine.add_window(&mut host, w(3)),
            Err(LayoutError::NoMonitor(WorkspaceId(3)))
        );

        assert_eq!(engine.tree().len(), 2);
        assert_eq!(engine.find_by_window(w(2)), None);
        assert_valid(&engine);
    }

    #[test]
    fn unmapped_window_is_not_left_in_the_tree() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        host.add_window(w(3), WS);
        host.windows.get_mut(&w(3)).unwrap().mapped = false;

        assert_eq!(engine.add_window(&mut host, w(3)), Ok(None));
        assert_eq!(engine.find_by_window(w(3)), None);
        assert_eq!(shape(&engine, root(&engine)), vec![vec![1], vec![2]]);
        assert_eq!(host.frame(w(2)), Some(Rect::from_xywh(500.0, 0.0, 500.0, 500.0)));
        assert_eq!(host.notifications.len(), 1);
        assert_valid(&engine);
    }

    #[test]
    fn tab_first_window_nests_a_tab_group() {
        let settings = LayoutSettings { tab_first_window: true, ..Default::default() };
        let (mut engine, mut host) = setup(settings, Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        let root = root(&engine);
        let tabs = root.children(engine.tree())[0];
        assert_eq!(engine.tree().group(tabs).unwrap().layout, GroupLayout::Tabbed);
        assert_eq!(shape(&engine, tabs), vec![vec![1], vec![2]]);
        assert!(host.is_hidden(w(1)));
        assert!(!host.is_hidden(w(2)));
        assert_valid(&engine);
    }
}

mod autotile {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    fn settings(workspaces: &str) -> LayoutSettings {
        let mut settings = LayoutSettings::default();
        settings.autotile.enable = true;
        settings.autotile.trigger_width = 300;
        settings.autotile.workspaces = workspaces.to_owned();
        settings
    }

    #[test]
    fn fourth_window_splits_focused_slot() {
        let (mut engine, mut host) = setup(settings("all"), Size::new(900.0, 600.0));
        for id in 1..=4 {
            open(&mut engine, &mut host, id);
        }
        let root = root(&engine);
        assert_eq!(shape(&engine, root), vec![vec![1], vec![2], vec![3, 4]]);
        let sub = root.children(engine.tree())[2];
        let group = engine.tree().group(sub).unwrap();
        assert_eq!(group.layout, GroupLayout::SplitV);
        assert!(group.is_ephemeral());
        assert_eq!(host.frame(w(4)), Some(Rect::from_xywh(600.0, 300.0, 300.0, 300.0)));
        assert_valid(&engine);
    }

    #[test]
    fn excluded_workspace_keeps_flat_split() {
        let (mut engine, mut host) = setup(settings("not:1"), Size::new(900.0, 600.0));
        for id in 1..=4 {
            open(&mut engine, &mut host, id);
        }
        assert_eq!(shape(&engine, root(&engine)).len(), 4);
    }

    #[test]
    fn ephemeral_subgroup_dissolves_on_removal() {
        let (mut engine, mut host) = setup(settings("all"), Size::new(900.0, 600.0));
        for id in 1..=4 {
            open(&mut engine, &mut host, id);
        }
        engine.handle_event(&mut host, LayoutEvent::WindowRemoved(w(4))).unwrap();
        let root = root(&engine);
        assert_eq!(shape(&engine, root), vec![vec![1], vec![2], vec![3]]);
        assert_eq!(node(&engine, 3).parent(engine.tree()), Some(root));
        assert_valid(&engine);
    }
}

mod shifting {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    /// SplitH [1, 2, SplitV [3, 4]] with window 2 focused.
    fn nested() -> (LayoutEngine, HeadlessCompositor) {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1200.0, 600.0));
        for id in 1..=3 {
            open(&mut engine, &mut host, id);
        }
        engine.make_group(&mut host, WS, GroupLayout::SplitV, GroupEphemerality::Standard, false);
        open(&mut engine, &mut host, 4);
        engine.on_window_focus_change(&mut host, w(2));
        host.focused = Some(w(2));
        assert_valid(&engine);
        (engine, host)
    }

    #[test]
    fn insert_shift_remove_scenario() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        assert_eq!(shape(&engine, root(&engine)), vec![vec![1], vec![2]]);

        command(&mut engine, &mut host, shift(ShiftDirection::Left, false, false));
        assert_eq!(shape(&engine, root(&engine)), vec![vec![2], vec![1]]);
        assert_eq!(host.frame(w(2)), Some(Rect::from_xywh(0.0, 0.0, 500.0, 500.0)));

        engine.handle_event(&mut host, LayoutEvent::WindowRemoved(w(1))).unwrap();
        let root = root(&engine);
        assert_eq!(shape(&engine, root), vec![vec![2]]);
        assert_eq!(host.frame(w(2)), Some(Rect::from_xywh(0.0, 0.0, 1000.0, 500.0)));
        assert_valid(&engine);
    }

    #[test]
    fn shift_at_edge_wraps_root() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        for id in 1..=3 {
            open(&mut engine, &mut host, id);
        }
        let old_root = root(&engine);
        command(&mut engine, &mut host, shift(ShiftDirection::Up, false, false));
        let new_root = root(&engine);
        assert_ne!(new_root, old_root);
        assert_eq!(engine.tree().group(new_root).unwrap().layout, GroupLayout::SplitV);
        assert_eq!(shape(&engine, new_root), vec![vec![3], vec![1, 2]]);
        assert_eq!(host.frame(w(3)), Some(Rect::from_xywh(0.0, 0.0, 1000.0, 250.0)));
    }

    #[test]
    fn two_child_root_flips_instead_of_wrapping() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        let root_before = root(&engine);
        command(&mut engine, &mut host, shift(ShiftDirection::Down, false, false));
        assert_eq!(root(&engine), root_before);
        assert_eq!(engine.tree().group(root_before).unwrap().layout, GroupLayout::SplitV);
        assert_eq!(shape(&engine, root_before), vec![vec![1], vec![2]]);
    }

    #[test]
    fn once_moves_into_and_back_out_of_sibling_group() {
        let (mut engine, mut host) = nested();
        let root = root(&engine);
        let inner = node(&engine, 3).parent(engine.tree()).unwrap();

        command(&mut engine, &mut host, shift(ShiftDirection::Right, true, false));
        assert_eq!(shape(&engine, root), vec![vec![1], vec![3, 4, 2]]);
        assert_eq!(node(&engine, 2).parent(engine.tree()), Some(inner));

        command(&mut engine, &mut host, shift(ShiftDirection::Left, true, false));
        assert_eq!(shape(&engine, root), vec![vec![1], vec![2], vec![3, 4]]);
        assert_eq!(engine.find_tiled_window_candidate(WS), Some(w(2)));
    }

    #[test]
    fn without_once_a_window_descends_to_a_leaf() {
        let (mut engine, mut host) = nested();
        command(&mut engine, &mut host, shift(ShiftDirection::Right, false, false));
        let inner = node(&engine, 3).parent(engine.tree()).unwrap();
        assert_eq!(node(&engine, 2).parent(engine.tree()), Some(inner));
        assert_eq!(shape(&engine, inner), vec![vec![3], vec![4], vec![2]]);
    }

    #[test]
    fn once_on_only_child_dissolves_its_group() {
        let (mut engine, mut host) = nested();
        let inner = node(&engine, 3).parent(engine.tree()).unwrap();
        engine.on_window_focus_change(&mut host, w(4));
        command(&mut engine, &mut host, LayoutCommand::MakeGroup {
            layout: GroupLayout::SplitV,
            ephemerality: GroupEphemerality::Standard,
            toggle: false,
        });
        let wrapper = node(&engine, 4).parent(engine.tree()).unwrap();
        assert_eq!(wrapper.parent(engine.tree()), Some(inner));
        assert_eq!(shape(&engine, wrapper), vec![vec![4]]);

        command(&mut engine, &mut host, shift(ShiftDirection::Right, true, false));
        assert!(!engine.tree().contains(wrapper));
        assert_eq!(node(&engine, 4).parent(engine.tree()), Some(inner));
        assert_eq!(shape(&engine, inner), vec![vec![3], vec![4]]);
    }

    #[test]
    fn unmapped_window_is_evicted_after_moving_between_groups() {
        let (mut engine, mut host) = nested();
        let inner = node(&engine, 3).parent(engine.tree()).unwrap();
        host.windows.get_mut(&w(2)).unwrap().mapped = false;

        command(&mut engine, &mut host, shift(ShiftDirection::Right, false, false));
        assert_eq!(engine.find_by_window(w(2)), None);
        assert_eq!(shape(&engine, root(&engine)), vec![vec![1], vec![3, 4]]);
        assert_eq!(shape(&engine, inner), vec![vec![3], vec![4]]);
        assert_eq!(host.frame(w(1)), Some(Rect::from_xywh(0.0, 0.0, 600.0, 600.0)));
        assert_eq!(host.frame(w(3)), Some(Rect::from_xywh(600.0, 0.0, 600.0, 300.0)));
        assert_eq!(host.notifications.len(), 1);
    }

    #[test]
    fn visible_once_leaves_tab_group_and_keeps_it() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        command(&mut engine, &mut host, LayoutCommand::MakeGroup {
            layout: GroupLayout::Tabbed,
            ephemerality: GroupEphemerality::Standard,
            toggle: false,
        });
        open(&mut engine, &mut host, 3);
        let tabs = node(&engine, 3).parent(engine.tree()).unwrap();
        engine.on_window_focus_change(&mut host, w(2));

        command(&mut engine, &mut host, shift(ShiftDirection::Left, true, true));
        let root = root(&engine);
        assert_eq!(shape(&engine, root), vec![vec![1], vec![2], vec![3]]);
        assert_eq!(root.children(engine.tree())[2], tabs);
        assert_eq!(engine.tree().group(tabs).unwrap().layout, GroupLayout::Tabbed);
        assert!(!host.is_hidden(w(3)));
    }

    #[test]
    fn visible_movement_steps_over_tab_group() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        command(&mut engine, &mut host, LayoutCommand::ChangeGroup(GroupLayout::Tabbed));
        engine.on_window_focus_change(&mut host, w(1));

        // A tabbed group does not carry visible movement, so the root is
        // wrapped in a horizontal split instead of reordering the tabs.
        command(&mut engine, &mut host, shift(ShiftDirection::Right, false, true));
        let root = root(&engine);
        assert_eq!(engine.tree().group(root).unwrap().layout, GroupLayout::SplitH);
        assert_eq!(shape(&engine, root), vec![vec![2], vec![1]]);
    }

    #[test]
    fn locked_tab_group_survives_losing_all_but_one_tab() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        command(&mut engine, &mut host, LayoutCommand::MakeGroup {
            layout: GroupLayout::Tabbed,
            ephemerality: GroupEphemerality::ForceEphemeral,
            toggle: false,
        });
        open(&mut engine, &mut host, 3);
        let tabs = node(&engine, 3).parent(engine.tree()).unwrap();
        command(&mut engine, &mut host, LayoutCommand::SetTabLock(TabLockMode::Lock));

        engine.handle_event(&mut host, LayoutEvent::WindowRemoved(w(3))).unwrap();
        assert!(engine.tree().contains(tabs));
        assert_eq!(shape(&engine, tabs), vec![vec![2]]);
        assert_valid(&engine);
    }
}

mod focus {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn directional_focus_and_monitor_escape() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        let shift_focus = |direction| LayoutCommand::ShiftFocus { direction, visible: false };

        command(&mut engine, &mut host, shift_focus(ShiftDirection::Left));
        assert_eq!(host.focused, Some(w(1)));
        command(&mut engine, &mut host, shift_focus(ShiftDirection::Left));
        assert_eq!(host.focused, Some(w(1)));

        host.neighbor_monitor_window = Some(w(9));
        command(&mut engine, &mut host, shift_focus(ShiftDirection::Left));
        assert_eq!(host.focused, Some(w(9)));
    }

    #[test]
    fn focus_stays_put_while_fullscreen() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        host.windows.get_mut(&w(2)).unwrap().fullscreen = true;
        let cmd = LayoutCommand::ShiftFocus { direction: ShiftDirection::Left, visible: false };
        command(&mut engine, &mut host, cmd);
        assert_eq!(host.focused, Some(w(2)));
    }

    #[test]
    fn removing_focused_window_focuses_neighbour() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1200.0, 600.0));
        for id in 1..=3 {
            open(&mut engine, &mut host, id);
        }
        engine.on_window_focus_change(&mut host, w(2));
        engine.remove_window(&mut host, w(2));
        assert_eq!(engine.find_tiled_window_candidate(WS), Some(w(1)));

        engine.on_window_focus_change(&mut host, w(1));
        engine.remove_window(&mut host, w(1));
        assert_eq!(engine.find_tiled_window_candidate(WS), Some(w(3)));
        assert_valid(&engine);
    }
}

mod geometry {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn resize_trades_space_with_neighbour() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        engine.resize_window(&mut host, w(1), Point::new(100.0, 40.0), None);
        assert_eq!(host.frame(w(1)), Some(Rect::from_xywh(0.0, 0.0, 600.0, 500.0)));
        assert_eq!(host.frame(w(2)), Some(Rect::from_xywh(600.0, 0.0, 400.0, 500.0)));

        // A tile touching the right edge moves its left edge instead.
        engine.resize_window(&mut host, w(2), Point::new(100.0, 0.0), None);
        assert_eq!(host.frame(w(2)), Some(Rect::from_xywh(500.0, 0.0, 500.0, 500.0)));
        assert_valid(&engine);
    }

    #[test]
    fn resize_below_minimum_is_rejected() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        engine.resize_window(&mut host, w(1), Point::new(490.0, 0.0), None);
        assert_eq!(host.frame(w(1)), Some(Rect::from_xywh(0.0, 0.0, 500.0, 500.0)));
    }

    #[test]
    fn resize_with_corner_moves_that_edge() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        for id in 1..=3 {
            open(&mut engine, &mut host, id);
        }
        engine.on_window_focus_change(&mut host, w(2));
        host.focused = Some(w(2));
        let cmd = LayoutCommand::Resize {
            dx: -50.0,
            dy: 0.0,
            corner: Some(ResizeCorner::TopLeft),
        };
        command(&mut engine, &mut host, cmd);
        let frame = host.frame(w(2)).unwrap();
        assert_eq!(frame.origin.x.round(), 283.0);
        assert_eq!(frame.max().x.round(), 667.0);
    }

    #[test]
    fn lone_window_ignores_gaps_when_configured() {
        let mut settings = LayoutSettings { no_gaps_when_only: true, ..Default::default() };
        settings.gaps.outer.left = 20.0;
        settings.gaps.outer.top = 20.0;
        let (mut engine, mut host) = setup(settings, Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        assert_eq!(host.frame(w(1)), Some(Rect::from_xywh(0.0, 0.0, 1000.0, 500.0)));
        open(&mut engine, &mut host, 2);
        assert_eq!(host.frame(w(1)).unwrap().origin, Point::new(20.0, 20.0));
    }

    #[test]
    fn single_child_of_nested_group_is_inset() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        engine.make_group(&mut host, WS, GroupLayout::SplitV, GroupEphemerality::Standard, false);
        assert_eq!(host.frame(w(2)), Some(Rect::from_xywh(500.0, 0.0, 490.0, 500.0)));
        assert_valid(&engine);
    }

    #[test]
    fn unmapped_window_is_evicted_on_layout() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        host.windows.get_mut(&w(1)).unwrap().mapped = false;
        engine.handle_event(&mut host, LayoutEvent::WorkspaceChanged(WS)).unwrap();
        assert_eq!(engine.find_by_window(w(1)), None);
        assert_eq!(host.frame(w(2)), Some(Rect::from_xywh(0.0, 0.0, 1000.0, 500.0)));
        assert_eq!(host.notifications.len(), 1);
        assert_valid(&engine);
    }

    #[test]
    fn focus_change_evicts_unmapped_sibling() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        host.windows.get_mut(&w(2)).unwrap().mapped = false;

        engine.handle_event(&mut host, LayoutEvent::WindowFocused(w(1))).unwrap();
        assert_eq!(shape(&engine, root(&engine)), vec![vec![1]]);
        assert_eq!(host.frame(w(1)), Some(Rect::from_xywh(0.0, 0.0, 1000.0, 500.0)));
        assert_valid(&engine);
    }

    #[test]
    fn reserved_area_moves_the_root() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        let monitor = &mut host.workspaces.get_mut(&WS).unwrap().monitor;
        monitor.as_mut().unwrap().reserved.top = 30.0;
        engine.recalculate(&mut host, WS);
        assert_eq!(host.frame(w(1)), Some(Rect::from_xywh(0.0, 30.0, 1000.0, 470.0)));
    }
}

mod workspaces {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    const OTHER: WorkspaceId = WorkspaceId(2);

    fn two_workspaces() -> (LayoutEngine, HeadlessCompositor) {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        let monitor = Monitor::new(Point::new(1000.0, 0.0), Size::new(800.0, 600.0));
        host.add_workspace(OTHER, monitor);
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        (engine, host)
    }

    #[test]
    fn moving_a_node_re_homes_it() {
        let (mut engine, mut host) = two_workspaces();
        let cmd = LayoutCommand::MoveNodeToWorkspace { workspace: OTHER, follow: true };
        command(&mut engine, &mut host, cmd);

        assert_eq!(shape(&engine, root(&engine)), vec![vec![1]]);
        let other_root = engine.root_of(OTHER).unwrap();
        assert_eq!(shape(&engine, other_root), vec![vec![2]]);
        assert_eq!(host.windows[&w(2)].workspace, OTHER);
        assert_eq!(host.frame(w(2)), Some(Rect::from_xywh(1000.0, 0.0, 800.0, 600.0)));
        assert_eq!(host.active_workspace, Some(OTHER));
        assert_eq!(host.focused, Some(w(2)));
    }

    #[test]
    fn moving_to_an_unknown_workspace_fails_cleanly() {
        let (mut engine, mut host) = two_workspaces();
        let cmd = LayoutCommand::MoveNodeToWorkspace { workspace: WorkspaceId(9), follow: false };
        assert_eq!(
            engine.handle_command(&mut host, WS, cmd),
            Err(LayoutError::InvalidWorkspace(WorkspaceId(9)))
        );
        assert_eq!(shape(&engine, root(&engine)), vec![vec![1], vec![2]]);
        assert_valid(&engine);
    }

    #[test]
    fn floating_focus_is_handed_to_the_host() {
        let (mut engine, mut host) = two_workspaces();
        host.add_window(w(5), WS);
        host.windows.get_mut(&w(5)).unwrap().floating = true;
        host.focused = Some(w(5));
        let cmd = LayoutCommand::MoveNodeToWorkspace { workspace: OTHER, follow: false };
        command(&mut engine, &mut host, cmd);
        assert_eq!(host.windows[&w(5)].workspace, OTHER);
        assert_eq!(engine.root_of(OTHER), None);
    }

    #[test]
    fn instances_are_registered_per_workspace() {
        let (mut engine, _host) = two_workspaces();
        let default = engine.instance_of(OTHER);
        let attached = engine.attach_workspace(OTHER);
        assert_ne!(attached, default);
        assert_eq!(engine.attach_workspace(OTHER), attached);
        assert_eq!(engine.instance_of(WS), default);
        engine.detach_workspace(OTHER);
        assert_eq!(engine.instance_of(OTHER), default);
    }

    #[test]
    fn moving_an_unmapped_window_evicts_it_on_arrival() {
        let (mut engine, mut host) = two_workspaces();
        host.windows.get_mut(&w(2)).unwrap().mapped = false;
        let cmd = LayoutCommand::MoveNodeToWorkspace { workspace: OTHER, follow: true };
        command(&mut engine, &mut host, cmd);

        assert_eq!(engine.find_by_window(w(2)), None);
        assert_eq!(engine.root_of(OTHER), None);
        assert_eq!(shape(&engine, root(&engine)), vec![vec![1]]);
        assert_eq!(host.windows[&w(2)].workspace, OTHER);
        assert_eq!(host.notifications.len(), 1);
    }

    #[test]
    fn teardown_forgets_everything() {
        let (mut engine, _host) = two_workspaces();
        engine.teardown();
        assert!(engine.tree().is_empty());
        assert!(engine.tab_bars().is_empty());
        assert_eq!(engine.root_of(WS), None);
    }
}

mod debugging {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn draw_tree_marks_focus() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        let drawn = engine.draw_tree(WS);
        assert!(drawn.contains("split_h"), "{drawn}");
        assert!(drawn.contains("☐ window 1"), "{drawn}");
        assert!(drawn.contains("☒ window 2"), "{drawn}");
        assert_eq!(engine.draw_tree(WorkspaceId(5)), "");
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let (mut engine, mut host) = setup(LayoutSettings::default(), Size::new(1000.0, 500.0));
        open(&mut engine, &mut host, 1);
        open(&mut engine, &mut host, 2);
        let value = serde_json::to_value(engine.snapshot(WS).unwrap()).unwrap();
        assert_eq!(value["layout"], "split_h");
        assert_eq!(value["children"][1]["window"], 2);
        assert_eq!(value["children"][1]["focused"], true);
        assert_eq!(value["children"][0].get("focused"), None);
    }

    #[test]
    fn commands_parse_from_json() {
        let cmd: LayoutCommand =
            serde_json::from_str(r#"{"shift_window":{"direction":"left","once":true}}"#).unwrap();
        assert_eq!(cmd, shift(ShiftDirection::Left, true, false));
        let cmd: LayoutCommand = serde_json::from_str(r#""kill_active""#).unwrap();
        assert_eq!(cmd, LayoutCommand::KillActive);
        let event: LayoutEvent = serde_json::from_str(r#"{"window_added":3}"#).unwrap();
        assert_eq!(event, LayoutEvent::WindowAdded(w(3)));
    }
}
