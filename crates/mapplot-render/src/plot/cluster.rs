//! Cluster mode: nearby points of an item grouped and outlined.

use super::{PlotContext, PlotSummary};
use crate::error::RenderResult;
use crate::progress::{Progress, STATUS_CLUSTERING};
use crate::raster::{stroke_circle, stroke_polygon};
use crate::text::TextBox;
use image::RgbaImage;
use mapplot_core::{ClusterSettings, Color, Legend, PlotIcon};
use std::collections::HashMap;

const WEIGHT_TEXT_COLOR: Color = Color::rgba(255, 255, 255, 180);

type Point = (f64, f64);

/// Disjoint sets over point indices, union by rank with path compression.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    fn find(&mut self, id: usize) -> usize {
        let mut root = id;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = id;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Less => self.parent[root_a] = root_b,
            std::cmp::Ordering::Greater => self.parent[root_b] = root_a,
            std::cmp::Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] += 1;
            }
        }
    }
}

/// Points linked by chains of neighbours no further apart than the range.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub members: Vec<Point>,
    pub weight: f64,
}

impl Cluster {
    pub fn centroid(&self) -> Point {
        let n = self.members.len().max(1) as f64;
        let (sx, sy) = self
            .members
            .iter()
            .fold((0.0_f64, 0.0_f64), |(ax, ay), (x, y)| (ax + x, ay + y));
        (sx / n, sy / n)
    }

    /// Distance from the centroid to the furthest member.
    pub fn radius(&self) -> f64 {
        let c = self.centroid();
        self.members
            .iter()
            .map(|p| distance(*p, c))
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClusterShape {
    Polygon(Vec<Point>),
    Circle { center: Point, radius: f64 },
}

impl ClusterShape {
    /// Polygon when the reduced hull is a real area, or the cluster is too
    /// spread out for a circle. Otherwise a circle no smaller than the minimum.
    pub fn for_cluster(cluster: &Cluster, settings: &ClusterSettings) -> Self {
        let hull = reduce_hull(
            convex_hull(&cluster.members),
            settings.polygon_point_reduction_range,
        );
        let radius = cluster.radius();
        if hull.len() >= 3
            && (polygon_area(&hull) >= settings.minimum_polygon_area
                || radius > settings.maximum_circle_radius)
        {
            ClusterShape::Polygon(hull)
        } else {
            ClusterShape::Circle {
                center: cluster.centroid(),
                radius: radius.max(settings.bounding_circle_min_radius),
            }
        }
    }
}

/// Single-linkage clusters of `(x, y, weight)` points, ordered by their
/// first member.
pub fn cluster_points(points: &[(f64, f64, f64)], range: f64) -> Vec<Cluster> {
    let range = range.max(f64::EPSILON);
    let key = |x: f64, y: f64| ((x / range).floor() as i64, (y / range).floor() as i64);

    let mut buckets: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, (x, y, _)) in points.iter().enumerate() {
        buckets.entry(key(*x, *y)).or_default().push(i);
    }

    let mut sets = UnionFind::new(points.len());
    for (i, (x, y, _)) in points.iter().enumerate() {
        let (bx, by) = key(*x, *y);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let Some(neighbours) = buckets.get(&(bx + dx, by + dy)) else {
                    continue;
                };
                for &j in neighbours {
                    if j > i && distance((*x, *y), (points[j].0, points[j].1)) <= range {
                        sets.union(i, j);
                    }
                }
            }
        }
    }

    let mut order: Vec<usize> = Vec::new();
    let mut by_root: HashMap<usize, Cluster> = HashMap::new();
    for (i, (x, y, w)) in points.iter().enumerate() {
        let root = sets.find(i);
        let cluster = by_root.entry(root).or_insert_with(|| {
            order.push(root);
            Cluster {
                members: Vec::new(),
                weight: 0.0,
            }
        });
        cluster.members.push((*x, *y));
        cluster.weight += w;
    }
    order
        .into_iter()
        .filter_map(|root| by_root.remove(&root))
        .collect()
}

/// Counter-clockwise convex hull without collinear points.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut sorted: Vec<Point> = points.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let cross = |o: Point, a: Point, b: Point| (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0);
    let mut hull: Vec<Point> = Vec::with_capacity(sorted.len() * 2);
    for pass in [sorted.clone(), sorted.into_iter().rev().collect()] {
        let start = hull.len();
        for p in pass {
            while hull.len() >= start + 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
                hull.pop();
            }
            hull.push(p);
        }
        hull.pop();
    }
    hull
}

/// Drop hull vertices closer than `range` to the previously kept one.
pub fn reduce_hull(hull: Vec<Point>, range: f64) -> Vec<Point> {
    let mut kept: Vec<Point> = Vec::with_capacity(hull.len());
    for p in hull {
        match kept.last() {
            Some(last) if distance(*last, p) < range => {}
            _ => kept.push(p),
        }
    }
    while kept.len() > 1 && distance(kept[0], kept[kept.len() - 1]) < range {
        kept.pop();
    }
    kept
}

/// Shoelace area, always non-negative.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0_f64;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        twice += a.0 * b.1 - b.0 * a.1;
    }
    twice.abs() / 2.0
}

fn distance(a: Point, b: Point) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

fn format_weight(weight: f64) -> String {
    if (weight - weight.round()).abs() < 1e-9 {
        format!("{}", weight.round() as i64)
    } else {
        format!("{weight:.2}")
    }
}

pub fn plot_clusters(
    image: &mut RgbaImage,
    legend: &Legend,
    ctx: &PlotContext<'_>,
    progress: &mut Progress<'_>,
) -> RenderResult<PlotSummary> {
    progress.status(STATUS_CLUSTERING);
    let settings = &ctx.settings.cluster;
    let transform = ctx.transform();
    let window = ctx.height_window();
    let thickness = settings.polygon_line_thickness.max(1) as f32;
    let mut summary = PlotSummary::default();

    for item in legend.items() {
        progress.check()?;
        let color = PlotIcon::for_group(item.legend_group, &ctx.settings.plot.icon).color;

        let mut placed = Vec::with_capacity(item.count());
        for (i, point) in item.points.iter().enumerate() {
            progress.check_every(i)?;
            match ctx.place(&transform, &window, point) {
                Some(p) => placed.push((p.x, p.y, point.weight)),
                None => summary.skipped += 1,
            }
        }
        summary.plotted += placed.len();

        let clusters = cluster_points(&placed, f64::from(settings.range));
        tracing::debug!("{}: {} points in {} clusters", item.editor_id, placed.len(), clusters.len());
        for cluster in &clusters {
            progress.check()?;
            let (cx, cy) = cluster.centroid();
            match ClusterShape::for_cluster(cluster, settings) {
                ClusterShape::Polygon(hull) => {
                    let outline: Vec<(f32, f32)> =
                        hull.iter().map(|(x, y)| (*x as f32, *y as f32)).collect();
                    stroke_polygon(image, &outline, thickness, color);
                }
                ClusterShape::Circle { center, radius } => {
                    stroke_circle(
                        image,
                        center.0 as f32,
                        center.1 as f32,
                        radius as f32 + thickness / 2.0,
                        thickness,
                        color,
                    );
                }
            }
            let label = ctx.geometry.font_size * 4.0;
            ctx.text.draw(
                image,
                &format_weight(cluster.weight),
                TextBox::centered(cx as f32, cy as f32, label, label),
                WEIGHT_TEXT_COLOR,
            );
        }
        summary.clusters += clusters.len();
        progress.advance(item.count());
    }
    Ok(summary)
}
