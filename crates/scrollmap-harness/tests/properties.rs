#![forbid(unsafe_code)]

//! Property tests: one live primitive per annotation, no matter how store,
//! list, geometry and size changes interleave.

use proptest::prelude::*;
use scrollmap_core::{
    Annotation, ItemId, LayoutStrategy, ListAdapter, MarkerStyle, MinimapConfig, SelectionChange,
};
use scrollmap_harness::{FakeList, Fixture, RecordingSurface};

const ITEMS: u64 = 24;

#[derive(Debug, Clone)]
enum Op {
    Mark(u64),
    Select(u64),
    Unmark(u64),
    Search(Vec<u64>),
    PushItem,
    RemoveItem(u64),
    MoveItem(u64, usize),
    ResetList(u64),
    Materialize(u64),
    Virtualize(Vec<u64>),
    Resize(f64),
    SetHeight(u64, f64),
    ClearStore,
    Idle,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let id = 0..ITEMS + 8;
    let store_ops = prop_oneof![
        id.clone().prop_map(Op::Mark),
        id.clone().prop_map(Op::Select),
        id.clone().prop_map(Op::Unmark),
        prop::collection::vec(id.clone(), 0..6).prop_map(Op::Search),
        Just(Op::ClearStore),
        Just(Op::Idle),
    ];
    let list_ops = prop_oneof![
        Just(Op::PushItem),
        id.clone().prop_map(Op::RemoveItem),
        (id.clone(), 0usize..ITEMS as usize).prop_map(|(i, to)| Op::MoveItem(i, to)),
        (0u64..8).prop_map(Op::ResetList),
        id.clone().prop_map(Op::Materialize),
        prop::collection::vec(id.clone(), 0..8).prop_map(Op::Virtualize),
        (20.0f64..600.0).prop_map(Op::Resize),
        (id, 1.0f64..60.0).prop_map(|(i, h)| Op::SetHeight(i, h)),
    ];
    prop_oneof![store_ops, list_ops]
}

fn config_strategy() -> impl Strategy<Value = MinimapConfig> {
    (
        prop_oneof![Just(MarkerStyle::Line), Just(MarkerStyle::Region)],
        prop_oneof![Just(LayoutStrategy::Measured), Just(LayoutStrategy::Counted)],
    )
        .prop_map(|(style, layout)| MinimapConfig::new().style(style).layout(layout))
}

fn apply(fx: &mut Fixture, op: &Op, selected: &mut Option<ItemId>) {
    match op {
        Op::Mark(i) => {
            fx.add(&[Annotation::search(ItemId(*i))]);
        }
        Op::Select(i) => {
            let next = ItemId(*i);
            fx.select(&SelectionChange::replace(*selected, next));
            *selected = Some(next);
        }
        Op::Unmark(i) => {
            fx.remove(&[Annotation::search(ItemId(*i))]);
        }
        Op::Search(ids) => {
            let ids: Vec<ItemId> = ids.iter().copied().map(ItemId).collect();
            fx.search(&ids);
        }
        Op::PushItem => {
            let (_, change) = fx.list.push();
            fx.list_changed(&change);
        }
        Op::RemoveItem(i) => {
            let change = fx.list.remove(ItemId(*i));
            fx.list_changed(&change);
        }
        Op::MoveItem(i, to) => {
            let change = fx.list.move_item(ItemId(*i), *to);
            fx.list_changed(&change);
        }
        Op::ResetList(offset) => {
            let change = fx.list.reset((*offset..*offset + ITEMS).map(ItemId).collect());
            fx.list_changed(&change);
        }
        Op::Materialize(i) => {
            fx.list.materialize(ItemId(*i));
            fx.size_changed();
        }
        Op::Virtualize(visible) => {
            fx.list.materialize_only(visible.iter().copied().map(ItemId));
            fx.size_changed();
        }
        Op::Resize(h) => {
            fx.surface.height = *h;
            fx.size_changed();
        }
        Op::SetHeight(i, h) => {
            fx.list.set_height(ItemId(*i), *h);
            fx.size_changed();
        }
        Op::ClearStore => {
            fx.with_host(|m, host| m.reset(host));
            *selected = None;
        }
        Op::Idle => {
            fx.run_idle();
        }
    }
}

fn fixture(config: MinimapConfig) -> Fixture {
    Fixture::new(
        config,
        FakeList::uniform(ITEMS, 18.0),
        RecordingSurface::new(12.0, 240.0),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn live_primitives_match_store(
        config in config_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let mut fx = fixture(config);
        let mut selected = None;
        for op in &ops {
            apply(&mut fx, op, &mut selected);
            prop_assert_eq!(fx.check_bijection(), Ok(()), "after {:?}", op);
            for a in fx.minimap.store().iter() {
                prop_assert!(fx.list.contains(a.item), "stale {} after {:?}", a, op);
            }
        }
    }

    #[test]
    fn settled_state_reconciles_to_noop(
        config in config_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..30),
    ) {
        let mut fx = fixture(config);
        let mut selected = None;
        for op in &ops {
            apply(&mut fx, op, &mut selected);
        }
        fx.drain_idle();
        let mark = fx.surface.ops().len();
        let report = fx.reconcile();
        prop_assert!(report.is_noop(), "{:?}", report);
        prop_assert!(fx.surface.ops_since(mark).is_empty());
    }

    #[test]
    fn doubling_surface_doubles_marker_positions(
        style in prop_oneof![Just(MarkerStyle::Line), Just(MarkerStyle::Region)],
        heights in prop::collection::vec(1.0f64..50.0, ITEMS as usize),
        marked in prop::collection::btree_set(0..ITEMS, 1..8),
        surface in 50.0f64..400.0,
    ) {
        let mut list = FakeList::uniform(ITEMS, 10.0);
        for (i, h) in heights.iter().enumerate() {
            list.set_height(ItemId(i as u64), *h);
        }
        let mut fx = Fixture::new(
            MinimapConfig::new().style(style),
            list,
            RecordingSurface::new(12.0, surface),
        );
        let marks: Vec<Annotation> = marked.iter().map(|&i| Annotation::search(ItemId(i))).collect();
        fx.add(&marks);
        let before: Vec<f64> = marks
            .iter()
            .filter_map(|a| fx.primitive(a))
            .map(|p| p.shape.anchor())
            .collect();

        fx.surface.height = surface * 2.0;
        fx.size_changed();
        let after: Vec<f64> = marks
            .iter()
            .filter_map(|a| fx.primitive(a))
            .map(|p| p.shape.anchor())
            .collect();

        prop_assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            prop_assert!((a - 2.0 * b).abs() < 1e-9, "{} -> {}", b, a);
        }
    }
}
