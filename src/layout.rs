//! City Layout Engine
//!
//! Two passes:
//! 1. Per package: buildings sorted by size, packed into rows on a platform.
//! 2. Across packages: platforms ranked by mass and packed either into four
//!    quadrants around the heaviest group (`quadrant`) or into one wrapping
//!    grid (`grid`).
//!
//! Placements are recomputed from scratch on every call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::LayoutConfig;
use crate::model::{CityData, ClassRef, PackageRecord};
use crate::projection::Box3;

/// Footprint scale reference: a class of this size gets `base_width`
const REFERENCE_LOC: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStrategy {
    #[default]
    Quadrant,
    Grid,
}

impl LayoutStrategy {
    pub const ALL: [LayoutStrategy; 2] = [LayoutStrategy::Quadrant, LayoutStrategy::Grid];

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutStrategy::Quadrant => "quadrant",
            LayoutStrategy::Grid => "grid",
        }
    }
}

impl fmt::Display for LayoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quadrant" => Ok(LayoutStrategy::Quadrant),
            "grid" => Ok(LayoutStrategy::Grid),
            other => Err(format!("unknown layout strategy '{}' (expected quadrant or grid)", other)),
        }
    }
}

/// One class as a box standing on its package platform
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingPlacement {
    pub class: ClassRef,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl BuildingPlacement {
    pub fn as_box(&self) -> Box3 {
        Box3 {
            x: self.x,
            y: self.y,
            z: self.z,
            width: self.width,
            depth: self.depth,
            height: self.height,
        }
    }
}

/// One package platform with its buildings (building coordinates are absolute)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackagePlacement {
    pub package: usize,
    pub name: String,
    pub mass: u64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub buildings: Vec<BuildingPlacement>,
}

impl PackagePlacement {
    pub fn as_box(&self) -> Box3 {
        Box3 {
            x: self.x,
            y: self.y,
            z: 0.0,
            width: self.width,
            depth: self.depth,
            height: self.height,
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        for b in &mut self.buildings {
            b.x += dx;
            b.y += dy;
        }
    }
}

/// All placements for one dataset and strategy
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CityLayout {
    pub strategy: LayoutStrategy,
    pub packages: Vec<PackagePlacement>,
}

impl CityLayout {
    /// Lay out the whole city
    pub fn compute(data: &CityData, strategy: LayoutStrategy, cfg: &LayoutConfig) -> Self {
        let mut packages: Vec<PackagePlacement> = data
            .packages
            .iter()
            .enumerate()
            .map(|(index, package)| layout_package(index, package, cfg))
            .collect();

        // Stable: equal masses keep input order
        packages.sort_by(|a, b| b.mass.cmp(&a.mass));

        match strategy {
            LayoutStrategy::Quadrant => place_quadrants(&mut packages, cfg),
            LayoutStrategy::Grid => place_grid(&mut packages, cfg),
        }
        normalize_origin(&mut packages);

        tracing::debug!(
            "Layout '{}' computed: {} packages, {} buildings",
            strategy,
            packages.len(),
            packages.iter().map(|p| p.buildings.len()).sum::<usize>()
        );

        Self { strategy, packages }
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn building_count(&self) -> usize {
        self.packages.iter().map(|p| p.buildings.len()).sum()
    }

    pub fn building(&self, class: ClassRef) -> Option<&BuildingPlacement> {
        self.packages
            .iter()
            .filter(|p| p.package == class.package)
            .flat_map(|p| p.buildings.iter())
            .find(|b| b.class == class)
    }

    /// 3D bounding box of every platform and building
    pub fn bounds(&self) -> Option<Box3> {
        let mut boxes = self
            .packages
            .iter()
            .map(PackagePlacement::as_box)
            .chain(self.packages.iter().flat_map(|p| p.buildings.iter().map(BuildingPlacement::as_box)));

        let first = boxes.next()?;
        let mut min = [first.x, first.y, first.z];
        let mut max = [first.x + first.width, first.y + first.depth, first.z + first.height];
        for b in boxes {
            min[0] = min[0].min(b.x);
            min[1] = min[1].min(b.y);
            min[2] = min[2].min(b.z);
            max[0] = max[0].max(b.x + b.width);
            max[1] = max[1].max(b.y + b.depth);
            max[2] = max[2].max(b.z + b.height);
        }

        Some(Box3 {
            x: min[0],
            y: min[1],
            z: min[2],
            width: max[0] - min[0],
            depth: max[1] - min[1],
            height: max[2] - min[2],
        })
    }
}

/// Square-root footprint, clamped to the configured range
pub fn building_footprint(lines_of_code: u64, cfg: &LayoutConfig) -> f64 {
    (cfg.base_width * (lines_of_code as f64 / REFERENCE_LOC).sqrt()).clamp(cfg.min_width, cfg.max_width)
}

pub fn building_height(lines_of_code: u64, cfg: &LayoutConfig) -> f64 {
    (lines_of_code as f64 * cfg.height_scale).max(cfg.min_building_height)
}

/// Buildings per row: ceil(sqrt(n)), at most `max_per_row`
pub fn row_capacity(class_count: usize, cfg: &LayoutConfig) -> usize {
    ((class_count as f64).sqrt().ceil() as usize).clamp(1, cfg.max_per_row.max(1))
}

/// Pack one package's buildings in package-local coordinates
fn layout_package(index: usize, package: &PackageRecord, cfg: &LayoutConfig) -> PackagePlacement {
    let mut order: Vec<usize> = (0..package.classes.len()).collect();
    order.sort_by(|&a, &b| {
        package.classes[b]
            .lines_of_code
            .cmp(&package.classes[a].lines_of_code)
    });

    let per_row = row_capacity(order.len(), cfg);
    let pad = cfg.package_padding;
    let mut buildings = Vec::with_capacity(order.len());
    let (mut cursor_x, mut cursor_y) = (pad, pad);
    let mut row_depth: f64 = 0.0;
    let mut max_x = pad;

    for (slot, &class_index) in order.iter().enumerate() {
        if slot > 0 && slot % per_row == 0 {
            cursor_x = pad;
            cursor_y += row_depth + cfg.building_spacing;
            row_depth = 0.0;
        }

        let loc = package.classes[class_index].lines_of_code;
        let size = building_footprint(loc, cfg);
        buildings.push(BuildingPlacement {
            class: ClassRef::new(index, class_index),
            x: cursor_x,
            y: cursor_y,
            z: cfg.platform_height,
            width: size,
            depth: size,
            height: building_height(loc, cfg),
        });

        max_x = max_x.max(cursor_x + size);
        row_depth = row_depth.max(size);
        cursor_x += size + cfg.building_spacing;
    }

    let (width, depth) = if buildings.is_empty() {
        (2.0 * pad, 2.0 * pad)
    } else {
        (max_x + pad, cursor_y + row_depth + pad)
    };

    PackagePlacement {
        package: index,
        name: package.name.clone(),
        mass: package.mass(),
        x: 0.0,
        y: 0.0,
        width,
        depth,
        height: cfg.platform_height,
        buildings,
    }
}

/// Result of packing a group of platforms into wrapping rows
struct Block {
    positions: Vec<(f64, f64)>,
    width: f64,
    depth: f64,
}

/// Left-to-right rows, wrapping once a row would pass `target_width`
fn pack_rows(sizes: &[(f64, f64)], target_width: f64, gap: f64) -> Block {
    let mut positions = Vec::with_capacity(sizes.len());
    let (mut x, mut y) = (0.0f64, 0.0f64);
    let mut row_depth: f64 = 0.0;
    let mut width: f64 = 0.0;

    for &(w, d) in sizes {
        if x > 0.0 && x + w > target_width {
            y += row_depth + gap;
            x = 0.0;
            row_depth = 0.0;
        }
        positions.push((x, y));
        width = width.max(x + w);
        row_depth = row_depth.max(d);
        x += w + gap;
    }

    Block {
        positions,
        width,
        depth: if sizes.is_empty() { 0.0 } else { y + row_depth },
    }
}

fn target_width(count: usize, cfg: &LayoutConfig) -> f64 {
    (count as f64).sqrt().ceil() * cfg.estimated_package_size
}

fn pack_group(packages: &[PackagePlacement], cfg: &LayoutConfig) -> Block {
    let sizes: Vec<(f64, f64)> = packages.iter().map(|p| (p.width, p.depth)).collect();
    pack_rows(&sizes, target_width(packages.len(), cfg), cfg.package_spacing)
}

fn apply_block(packages: &mut [PackagePlacement], block: &Block, origin_x: f64, origin_y: f64) {
    for (package, &(x, y)) in packages.iter_mut().zip(&block.positions) {
        package.translate(origin_x + x, origin_y + y);
    }
}

fn place_grid(packages: &mut [PackagePlacement], cfg: &LayoutConfig) {
    let block = pack_group(packages, cfg);
    apply_block(packages, &block, 0.0, 0.0);
}

/// Split ranked packages into `min(n, 4)` contiguous groups whose sizes
/// differ by at most one, larger groups first
fn quartiles(packages: &mut [PackagePlacement]) -> Vec<&mut [PackagePlacement]> {
    let total = packages.len();
    let count = total.min(4);
    let mut groups = Vec::with_capacity(count);
    let mut rest = packages;
    for i in 0..count {
        let size = total / 4 + usize::from(i < total % 4);
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(size);
        groups.push(head);
        rest = tail;
    }
    groups
}

/// Quartile 0 (heaviest) is centered on the origin, quartile 1 sits east of it,
/// quartile 3 west, and quartile 2 south of all three.
fn place_quadrants(packages: &mut [PackagePlacement], cfg: &LayoutConfig) {
    if packages.is_empty() {
        return;
    }
    let gap = cfg.package_spacing;

    let mut groups = quartiles(packages);
    let blocks: Vec<Block> = groups.iter().map(|g| pack_group(g, cfg)).collect();

    let center = &blocks[0];
    let (cx, cy) = (-center.width / 2.0, -center.depth / 2.0);
    let mut origins = vec![(cx, cy)];
    let mut bottom = cy + center.depth;

    if let Some(east) = blocks.get(1) {
        origins.push((cx + center.width + gap, cy));
        bottom = bottom.max(cy + east.depth);
    }
    if let Some(west) = blocks.get(3) {
        bottom = bottom.max(cy + west.depth);
    }
    if let Some(south) = blocks.get(2) {
        origins.push((-south.width / 2.0, bottom + gap));
    }
    if let Some(west) = blocks.get(3) {
        origins.push((cx - gap - west.width, cy));
    }

    for ((group, block), &(ox, oy)) in groups.iter_mut().zip(&blocks).zip(&origins) {
        apply_block(group, block, ox, oy);
    }
}

/// Shift everything so the smallest world x and y are 0
fn normalize_origin(packages: &mut [PackagePlacement]) {
    let min_x = packages.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = packages.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    if !min_x.is_finite() || !min_y.is_finite() {
        return;
    }
    for package in packages {
        package.translate(-min_x, -min_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClassRecord;

    fn package(name: &str, locs: &[u64]) -> PackageRecord {
        PackageRecord {
            name: name.to_string(),
            classes: locs
                .iter()
                .enumerate()
                .map(|(i, &loc)| ClassRecord {
                    name: format!("C{}", i),
                    lines_of_code: loc,
                    git_metadata: None,
                })
                .collect(),
        }
    }

    fn overlaps(a: &Box3, b: &Box3) -> bool {
        a.x < b.x + b.width && b.x < a.x + a.width && a.y < b.y + b.depth && b.y < a.y + a.depth
    }

    fn assert_no_building_overlap(layout: &CityLayout) {
        for p in &layout.packages {
            for (i, a) in p.buildings.iter().enumerate() {
                for b in &p.buildings[i + 1..] {
                    assert!(!overlaps(&a.as_box(), &b.as_box()), "{:?} overlaps {:?}", a, b);
                }
                // Inside the platform
                assert!(a.x >= p.x && a.x + a.width <= p.x + p.width);
                assert!(a.y >= p.y && a.y + a.depth <= p.y + p.depth);
            }
        }
    }

    #[test]
    fn test_scenario_heights() {
        let data = CityData {
            packages: vec![PackageRecord {
                name: "a.b".into(),
                classes: vec![
                    ClassRecord { name: "X".into(), lines_of_code: 150, git_metadata: None },
                    ClassRecord { name: "Y".into(), lines_of_code: 85, git_metadata: None },
                ],
            }],
        };
        let layout = CityLayout::compute(&data, LayoutStrategy::Quadrant, &LayoutConfig::default());

        assert_eq!(layout.building_count(), 2);
        let x = layout.building(ClassRef::new(0, 0)).unwrap();
        let y = layout.building(ClassRef::new(0, 1)).unwrap();
        assert!((x.height - 120.0).abs() < 1e-9);
        assert!((y.height - 68.0).abs() < 1e-9);
        assert_eq!(x.z, 5.0);
        assert_eq!(layout.packages[0].height, 5.0);
    }

    #[test]
    fn test_footprint_and_height_clamps() {
        let cfg = LayoutConfig::default();
        assert_eq!(building_footprint(0, &cfg), cfg.min_width);
        assert_eq!(building_footprint(50, &cfg), 20.0);
        assert_eq!(building_footprint(1_000_000, &cfg), cfg.max_width);
        assert_eq!(building_height(0, &cfg), cfg.min_building_height);
    }

    #[test]
    fn test_row_capacity() {
        let cfg = LayoutConfig::default();
        assert_eq!(row_capacity(0, &cfg), 1);
        assert_eq!(row_capacity(1, &cfg), 1);
        assert_eq!(row_capacity(5, &cfg), 3);
        assert_eq!(row_capacity(16, &cfg), 4);
        assert_eq!(row_capacity(100, &cfg), 6);
    }

    #[test]
    fn test_buildings_sorted_by_size_with_stable_ties() {
        let data = CityData { packages: vec![package("p", &[10, 300, 10, 300])] };
        let layout = CityLayout::compute(&data, LayoutStrategy::Grid, &LayoutConfig::default());
        let order: Vec<usize> = layout.packages[0].buildings.iter().map(|b| b.class.class).collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_no_overlap_with_zero_and_outlier() {
        let mut outlier = vec![1u64; 40];
        outlier[17] = 100_000;
        let data = CityData {
            packages: vec![
                package("zeros", &[0; 13]),
                package("outlier", &outlier),
                package("mixed", &[5, 5000, 50, 0, 700, 1, 1, 250]),
            ],
        };
        for strategy in LayoutStrategy::ALL {
            let layout = CityLayout::compute(&data, strategy, &LayoutConfig::default());
            assert_no_building_overlap(&layout);
            for p in &layout.packages {
                for b in &p.buildings {
                    assert!(b.width > 0.0 && b.depth > 0.0 && b.height > 0.0);
                }
            }
        }
    }

    #[test]
    fn test_empty_package_gets_padding_footprint() {
        let data = CityData { packages: vec![package("empty", &[])] };
        let cfg = LayoutConfig::default();
        let layout = CityLayout::compute(&data, LayoutStrategy::Quadrant, &cfg);
        let p = &layout.packages[0];
        assert_eq!((p.width, p.depth), (2.0 * cfg.package_padding, 2.0 * cfg.package_padding));
        assert!(p.buildings.is_empty());
    }

    #[test]
    fn test_layout_is_deterministic() {
        let data = CityData {
            packages: (0..23)
                .map(|i| package(&format!("pkg{}", i), &[(i * 37 % 11) as u64 * 40, 12, 300]))
                .collect(),
        };
        let cfg = LayoutConfig::default();
        for strategy in LayoutStrategy::ALL {
            let a = CityLayout::compute(&data, strategy, &cfg);
            let b = CityLayout::compute(&data, strategy, &cfg);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_packages_never_overlap() {
        let data = CityData {
            packages: (0..37)
                .map(|i| {
                    let locs: Vec<u64> = (0..(i % 9)).map(|j| (j * 97 + i * 13) as u64 % 900).collect();
                    package(&format!("pkg{}", i), &locs)
                })
                .collect(),
        };
        for strategy in LayoutStrategy::ALL {
            let layout = CityLayout::compute(&data, strategy, &LayoutConfig::default());
            assert_eq!(layout.packages.len(), 37);
            for (i, a) in layout.packages.iter().enumerate() {
                for b in &layout.packages[i + 1..] {
                    assert!(
                        !overlaps(&a.as_box(), &b.as_box()),
                        "{} overlaps {} in {}",
                        a.name,
                        b.name,
                        strategy
                    );
                }
                assert!(a.x >= 0.0 && a.y >= 0.0);
            }
        }
    }

    #[test]
    fn test_quadrant_puts_heaviest_first_and_in_the_middle() {
        let data = CityData {
            packages: vec![
                package("light", &[10]),
                package("heavy", &[5000, 5000]),
                package("mid", &[400]),
                package("small", &[100]),
            ],
        };
        let layout = CityLayout::compute(&data, LayoutStrategy::Quadrant, &LayoutConfig::default());
        let names: Vec<&str> = layout.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["heavy", "mid", "small", "light"]);

        let heavy = &layout.packages[0];
        let east = &layout.packages[1];
        let south = &layout.packages[2];
        let west = &layout.packages[3];
        assert!(east.x >= heavy.x + heavy.width);
        assert!(west.x + west.width <= heavy.x);
        assert!(south.y >= heavy.y + heavy.depth);
    }

    #[test]
    fn test_quadrant_fills_all_four_quartiles() {
        let packages = (0..9u64)
            .map(|i| package(&format!("p{}", i), &[900 - i * 100]))
            .collect();
        let data = CityData { packages };
        let layout = CityLayout::compute(&data, LayoutStrategy::Quadrant, &LayoutConfig::default());
        let by_name = |name: &str| layout.packages.iter().find(|p| p.name == name).unwrap();

        // 9 packages split 3/2/2/2 in mass order
        let center: Vec<_> = ["p0", "p1", "p2"].into_iter().map(|n| by_name(n)).collect();
        let left = center.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let right = center.iter().map(|p| p.x + p.width).fold(f64::NEG_INFINITY, f64::max);
        let below = center.iter().map(|p| p.y + p.depth).fold(f64::NEG_INFINITY, f64::max);

        for name in ["p3", "p4"] {
            assert!(by_name(name).x >= right, "{} should be east", name);
        }
        for name in ["p5", "p6"] {
            assert!(by_name(name).y >= below, "{} should be south", name);
        }
        for name in ["p7", "p8"] {
            let west = by_name(name);
            assert!(west.x + west.width <= left, "{} should be west", name);
        }
    }

    #[test]
    fn test_quartile_sizes() {
        let sizes = |n: usize| {
            let data = CityData { packages: (0..n).map(|i| package(&i.to_string(), &[10])).collect() };
            let mut placements: Vec<PackagePlacement> = data
                .packages
                .iter()
                .enumerate()
                .map(|(i, p)| layout_package(i, p, &LayoutConfig::default()))
                .collect();
            quartiles(&mut placements).iter().map(|g| g.len()).collect::<Vec<_>>()
        };
        assert_eq!(sizes(2), vec![1, 1]);
        assert_eq!(sizes(5), vec![2, 1, 1, 1]);
        assert_eq!(sizes(6), vec![2, 2, 1, 1]);
        assert_eq!(sizes(9), vec![3, 2, 2, 2]);
        assert_eq!(sizes(13), vec![4, 3, 3, 3]);
    }

    #[test]
    fn test_bounds_include_heights() {
        let data = CityData { packages: vec![package("p", &[150])] };
        let layout = CityLayout::compute(&data, LayoutStrategy::Grid, &LayoutConfig::default());
        let bounds = layout.bounds().unwrap();
        assert_eq!(bounds.z, 0.0);
        assert!((bounds.height - 125.0).abs() < 1e-9);
        assert!(CityLayout::default().bounds().is_none());
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("Grid".parse::<LayoutStrategy>().unwrap(), LayoutStrategy::Grid);
        assert_eq!("quadrant".parse::<LayoutStrategy>().unwrap(), LayoutStrategy::Quadrant);
        assert!("spiral".parse::<LayoutStrategy>().is_err());
    }
}
