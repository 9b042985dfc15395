#![forbid(unsafe_code)]

//! Search and selection producers feeding the store, plus store observers.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use scrollmap_core::{
    Annotation, AnnotationKind, ItemId, MinimapConfig, SearchQuery, Searchable, SelectionChange,
    StoreEventKind,
};
use scrollmap_harness::{Fixture, init_test_logging};

struct Headline {
    id: u64,
    title: &'static str,
    summary: &'static str,
}

impl Searchable for Headline {
    fn id(&self) -> ItemId {
        ItemId(self.id)
    }

    fn title(&self) -> &str {
        self.title
    }

    fn summary(&self) -> &str {
        self.summary
    }
}

fn headlines() -> Vec<Headline> {
    vec![
        Headline { id: 0, title: "Rust 1.90 released", summary: "Compiler news" },
        Headline { id: 1, title: "Weather", summary: "Rain over the weekend" },
        Headline { id: 2, title: "Trusting the borrow checker", summary: "" },
        Headline { id: 3, title: "Markets", summary: "Crude oil steady" },
        Headline { id: 4, title: "Sports", summary: "Cup final tonight" },
    ]
}

fn fixture() -> Fixture {
    init_test_logging();
    Fixture::uniform(MinimapConfig::default(), 5, 20.0, 100.0)
}

fn search_items(fx: &Fixture) -> Vec<ItemId> {
    let mut items: Vec<_> = fx
        .minimap
        .store()
        .of_kind(AnnotationKind::Search)
        .map(|a| a.item)
        .collect();
    items.sort();
    items
}

#[test]
fn search_query_drives_markers() {
    let mut fx = fixture();
    let feed = headlines();

    let hits = SearchQuery::new("RUST").matching_ids(&feed);
    assert_eq!(hits, vec![ItemId(0), ItemId(2)]);
    let reports = fx.search(&hits);
    assert_eq!(reports.len(), 1);
    assert_eq!(search_items(&fx), hits);

    // Narrowing keeps the surviving marker and drops the other.
    let survivor = fx
        .handle_of(&Annotation::search(ItemId(2)))
        .expect("marker drawn");
    let hits = SearchQuery::new("trust").matching_ids(&feed);
    let reports = fx.search(&hits);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].removed, 1);
    assert_eq!(search_items(&fx), vec![ItemId(2)]);
    assert_eq!(fx.handle_of(&Annotation::search(ItemId(2))), Some(survivor));

    // Switching runs one removal pass and one addition pass.
    let hits = SearchQuery::new("crude").matching_ids(&feed);
    let reports = fx.search(&hits);
    assert_eq!(reports.len(), 2);
    assert_eq!(search_items(&fx), vec![ItemId(3)]);
    fx.assert_bijection();
}

#[test]
fn short_query_clears_search_markers() {
    let mut fx = fixture();
    let feed = headlines();
    fx.search(&SearchQuery::new("the").matching_ids(&feed));
    assert!(!search_items(&fx).is_empty());

    let query = SearchQuery::new("th");
    assert!(!query.is_active());
    fx.search(&query.matching_ids(&feed));
    assert!(search_items(&fx).is_empty());
    assert!(fx.surface.live().is_empty());
}

#[test]
fn search_and_selection_share_an_item() {
    let mut fx = fixture();
    fx.search(&[ItemId(1)]);
    fx.select(&SelectionChange::replace(None, ItemId(1)));

    assert_eq!(fx.minimap.store().len(), 2);
    assert_eq!(fx.surface.live().len(), 2);

    fx.search(&[]);
    assert_eq!(fx.surface.live().len(), 1);
    assert!(fx.primitive(&Annotation::selection(ItemId(1))).is_some());
    fx.assert_bijection();
}

#[test]
fn multi_select_adds_and_removes() {
    let mut fx = fixture();
    let change = SelectionChange::new()
        .select(ItemId(0))
        .select(ItemId(2))
        .select(ItemId(4));
    fx.select(&change);
    assert_eq!(fx.surface.live().len(), 3);

    let change = SelectionChange::new().deselect(ItemId(2)).deselect(ItemId(4));
    let reports = fx.select(&change);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].removed, 2);
    assert_eq!(fx.surface.live().len(), 1);
}

#[test]
fn subscribers_see_each_store_operation() {
    let mut fx = fixture();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let subscription = fx
        .minimap
        .subscribe(move |event| sink.borrow_mut().push(event.kind()));

    fx.search(&[ItemId(0), ItemId(1)]);
    fx.search(&[ItemId(1), ItemId(3)]);
    let change = fx.list.remove(ItemId(3));
    fx.list_changed(&change);

    assert_eq!(
        *seen.borrow(),
        vec![
            StoreEventKind::Added,
            StoreEventKind::Removed,
            StoreEventKind::Added,
            StoreEventKind::Removed,
        ]
    );

    drop(subscription);
    fx.search(&[]);
    assert_eq!(seen.borrow().len(), 4);
}

#[test]
fn store_version_tracks_commits() {
    let mut fx = fixture();
    let v0 = fx.minimap.store().version();
    fx.search(&[ItemId(2)]);
    fx.search(&[ItemId(2)]);
    assert_eq!(fx.minimap.store().version(), v0 + 1);
}
