#![forbid(unsafe_code)]

//! Position calculator: item geometry to marker geometry.
//!
//! # Strategies
//!
//! - **Measured**: the item's own `(top, height)` in content coordinates,
//!   scaled by `surface_height / content_height`. Used whenever the target
//!   item is measurable.
//! - **Counted**: the extent is approximated from the cumulative sum of all
//!   *known* item heights before the item's index, scaled by
//!   `surface_height / sum(known heights)`. Unknown heights count as zero
//!   before the target; the target itself, when unmeasured, is given the
//!   average known height. With no known heights at all, items are spaced
//!   uniformly by index.
//!
//! The counted estimate is allowed to be wrong until more items are
//! measured; the result then carries `has_geometry == false`.
//!
//! # Memoization
//!
//! [`PassGeometry`] memoizes measurements, the index map and the
//! known-height prefix sums for a single reconciliation pass. It is rebuilt
//! for every pass and never outlives it.

use rustc_hash::FxHashMap;

use crate::annotation::ItemId;
use crate::config::{LayoutStrategy, MarkerStyle, MinimapConfig};
use crate::host::{GeometryProvider, ItemExtent, ListAdapter, Shape};

/// One item's measurement as seen during a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometrySample {
    pub top: f64,
    pub height: f64,
    /// False when the item's container was not measurable.
    pub known: bool,
}

impl GeometrySample {
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            top: 0.0,
            height: 0.0,
            known: false,
        }
    }
}

impl From<Option<ItemExtent>> for GeometrySample {
    fn from(extent: Option<ItemExtent>) -> Self {
        match extent {
            Some(e) => Self {
                top: e.top,
                height: e.height,
                known: true,
            },
            None => Self::unknown(),
        }
    }
}

/// Result of placing one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub shape: Shape,
    /// False whenever the item's own height was unknown: the placement is
    /// provisional and should be recomputed later.
    pub has_geometry: bool,
}

/// Cumulative known heights over the list, in display order.
#[derive(Debug, Clone)]
struct KnownHeights {
    /// `prefix[i]` = sum of known heights of items `0..i`.
    prefix: Vec<f64>,
    known_count: usize,
}

impl KnownHeights {
    fn total(&self) -> f64 {
        self.prefix.last().copied().unwrap_or(0.0)
    }

    fn average(&self) -> f64 {
        if self.known_count == 0 {
            0.0
        } else {
            self.total() / self.known_count as f64
        }
    }
}

/// Geometry view for one reconciliation pass.
pub struct PassGeometry<'a> {
    list: &'a dyn ListAdapter,
    geometry: &'a dyn GeometryProvider,
    surface_height: f64,
    samples: FxHashMap<ItemId, GeometrySample>,
    index: Option<FxHashMap<ItemId, usize>>,
    known: Option<KnownHeights>,
    measure_calls: usize,
}

impl<'a> PassGeometry<'a> {
    #[must_use]
    pub fn new(
        list: &'a dyn ListAdapter,
        geometry: &'a dyn GeometryProvider,
        surface_height: f64,
    ) -> Self {
        Self {
            list,
            geometry,
            surface_height: surface_height.max(0.0),
            samples: FxHashMap::default(),
            index: None,
            known: None,
            measure_calls: 0,
        }
    }

    #[must_use]
    pub fn surface_height(&self) -> f64 {
        self.surface_height
    }

    /// Number of distinct items measured so far in this pass.
    #[must_use]
    pub fn measure_calls(&self) -> usize {
        self.measure_calls
    }

    /// Display index of `item`, via an index map built on first use.
    pub fn index_of(&mut self, item: ItemId) -> Option<usize> {
        let list = self.list;
        self.index
            .get_or_insert_with(|| {
                list.items()
                    .iter()
                    .enumerate()
                    .map(|(i, &id)| (id, i))
                    .collect()
            })
            .get(&item)
            .copied()
    }

    pub fn contains(&mut self, item: ItemId) -> bool {
        self.index_of(item).is_some()
    }

    /// Memoized measurement of `item`.
    pub fn sample(&mut self, item: ItemId) -> GeometrySample {
        if let Some(s) = self.samples.get(&item) {
            return *s;
        }
        self.measure_calls += 1;
        let s = GeometrySample::from(self.geometry.measure(item));
        self.samples.insert(item, s);
        s
    }

    fn known_heights(&mut self) -> &KnownHeights {
        let known = match self.known.take() {
            Some(known) => known,
            None => self.build_known_heights(),
        };
        self.known.insert(known)
    }

    fn build_known_heights(&mut self) -> KnownHeights {
        let list = self.list;
        let mut prefix = Vec::with_capacity(list.len() + 1);
        let mut running = 0.0;
        let mut known_count = 0;
        prefix.push(running);
        for &item in list.items() {
            let s = self.sample(item);
            if s.known {
                running += s.height.max(0.0);
                known_count += 1;
            }
            prefix.push(running);
        }
        KnownHeights {
            prefix,
            known_count,
        }
    }

    fn content_height(&mut self) -> f64 {
        match self.geometry.content_height() {
            Some(h) if h > 0.0 => h,
            _ => self.known_heights().total(),
        }
    }

    /// Extent of `item` in overlay coordinates, and whether its own height
    /// was known. `None` if the item is not in the list.
    pub fn overlay_extent(
        &mut self,
        item: ItemId,
        layout: LayoutStrategy,
    ) -> Option<(ItemExtent, bool)> {
        let index = self.index_of(item)?;
        let sample = self.sample(item);
        let h = self.surface_height;

        if layout == LayoutStrategy::Measured && sample.known {
            let total = self.content_height();
            if total > 0.0 {
                let scale = h / total;
                return Some((
                    ItemExtent::new(sample.top * scale, sample.height.max(0.0) * scale),
                    true,
                ));
            }
        }

        let n = self.list.len().max(1) as f64;
        let known = self.known_heights();
        let total = known.total();
        let extent = if total > 0.0 {
            let scale = h / total;
            let own = if sample.known {
                sample.height.max(0.0)
            } else {
                known.average()
            };
            ItemExtent::new(known.prefix[index] * scale, own * scale)
        } else {
            ItemExtent::new(h * index as f64 / n, h / n)
        };
        Some((extent, sample.known))
    }

    /// Place a marker for `item` according to `config`.
    pub fn place(&mut self, item: ItemId, config: &MinimapConfig) -> Option<Placement> {
        let (extent, has_geometry) = self.overlay_extent(item, config.layout)?;
        let shape = shape_for(
            config.style,
            extent,
            self.surface_height,
            config.min_region_height,
        );
        Some(Placement {
            shape,
            has_geometry,
        })
    }
}

/// Turn an overlay-space extent into a marker shape.
///
/// Lines sit at the extent's midpoint, clamped to the track. Regions cover
/// the extent and are grown downward to `min_region_height`; their top is
/// only clamped at zero, so positions scale with the surface.
#[must_use]
pub fn shape_for(
    style: MarkerStyle,
    extent: ItemExtent,
    surface_height: f64,
    min_region_height: f64,
) -> Shape {
    match style {
        MarkerStyle::Line => Shape::Line {
            y: extent.center().clamp(0.0, surface_height.max(0.0)),
        },
        MarkerStyle::Region => {
            let height = extent.height.max(min_region_height);
            Shape::Region {
                top: extent.top.max(0.0),
                height,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Ids(Vec<ItemId>);

    impl ListAdapter for Ids {
        fn items(&self) -> &[ItemId] {
            &self.0
        }
    }

    struct Heights {
        extents: HashMap<ItemId, ItemExtent>,
        content: Option<f64>,
    }

    impl Heights {
        fn uniform(n: u64, h: f64) -> Self {
            let extents = (0..n)
                .map(|i| (ItemId(i), ItemExtent::new(i as f64 * h, h)))
                .collect();
            Self {
                extents,
                content: Some(n as f64 * h),
            }
        }
    }

    impl GeometryProvider for Heights {
        fn measure(&self, item: ItemId) -> Option<ItemExtent> {
            self.extents.get(&item).copied()
        }

        fn content_height(&self) -> Option<f64> {
            self.content
        }
    }

    fn ten_items() -> Ids {
        Ids((0..10).map(ItemId).collect())
    }

    #[test]
    fn line_at_item_center() {
        let list = ten_items();
        let geo = Heights::uniform(10, 20.0);
        let mut pass = PassGeometry::new(&list, &geo, 200.0);
        let p = pass.place(ItemId(5), &MinimapConfig::default()).unwrap();
        assert_eq!(p.shape, Shape::Line { y: 110.0 });
        assert!(p.has_geometry);
    }

    #[test]
    fn region_covers_extent() {
        let list = ten_items();
        let geo = Heights::uniform(10, 20.0);
        let mut pass = PassGeometry::new(&list, &geo, 200.0);
        let config = MinimapConfig::new().style(MarkerStyle::Region);
        let p = pass.place(ItemId(0), &config).unwrap();
        assert_eq!(p.shape, Shape::Region { top: 0.0, height: 20.0 });
    }

    #[test]
    fn scales_to_surface() {
        let list = ten_items();
        let geo = Heights::uniform(10, 20.0);
        let mut pass = PassGeometry::new(&list, &geo, 100.0);
        let p = pass.place(ItemId(5), &MinimapConfig::default()).unwrap();
        assert_eq!(p.shape, Shape::Line { y: 55.0 });
    }

    #[test]
    fn region_grows_to_minimum_without_shifting() {
        let shape = shape_for(
            MarkerStyle::Region,
            ItemExtent::new(199.5, 0.0),
            200.0,
            2.0,
        );
        assert_eq!(shape, Shape::Region { top: 199.5, height: 2.0 });
    }

    #[test]
    fn unknown_target_uses_known_prefix() {
        let list = ten_items();
        let mut geo = Heights::uniform(10, 20.0);
        geo.extents.remove(&ItemId(5));
        geo.content = None;
        let mut pass = PassGeometry::new(&list, &geo, 180.0);
        // Known total 180; items 0..5 contribute 100; own height = average 20.
        let (extent, known) = pass.overlay_extent(ItemId(5), LayoutStrategy::Measured).unwrap();
        assert!(!known);
        assert_eq!(extent, ItemExtent::new(100.0, 20.0));
    }

    #[test]
    fn nothing_known_spaces_uniformly() {
        let list = ten_items();
        let geo = Heights {
            extents: HashMap::new(),
            content: None,
        };
        let mut pass = PassGeometry::new(&list, &geo, 200.0);
        let p = pass.place(ItemId(3), &MinimapConfig::default()).unwrap();
        assert_eq!(p.shape, Shape::Line { y: 70.0 });
        assert!(!p.has_geometry);
    }

    #[test]
    fn counted_strategy_ignores_offsets() {
        let list = ten_items();
        let mut geo = Heights::uniform(10, 20.0);
        // Offsets lie; heights are right.
        for e in geo.extents.values_mut() {
            e.top += 1000.0;
        }
        let mut pass = PassGeometry::new(&list, &geo, 200.0);
        let config = MinimapConfig::new().layout(LayoutStrategy::Counted);
        let p = pass.place(ItemId(5), &config).unwrap();
        assert_eq!(p.shape, Shape::Line { y: 110.0 });
        assert!(p.has_geometry);
    }

    #[test]
    fn missing_item_is_none() {
        let list = ten_items();
        let geo = Heights::uniform(10, 20.0);
        let mut pass = PassGeometry::new(&list, &geo, 200.0);
        assert!(pass.place(ItemId(99), &MinimapConfig::default()).is_none());
        assert_eq!(pass.measure_calls(), 0);
    }

    #[test]
    fn measurements_are_memoized() {
        let list = ten_items();
        let geo = Heights::uniform(10, 20.0);
        let mut pass = PassGeometry::new(&list, &geo, 200.0);
        pass.sample(ItemId(1));
        pass.sample(ItemId(1));
        assert_eq!(pass.measure_calls(), 1);
    }
}
