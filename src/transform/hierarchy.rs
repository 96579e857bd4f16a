// Pie, sunburst and treemap panels

use super::{Context, PanelContent};
use crate::chart::ChartType;
use crate::data::ColumnData;
use crate::ir::{Geometry, Rect, Tile, Wedge};
use crate::palette::Rgb;

const TREEMAP_PAD: f64 = 0.004;

struct Node {
    label: String,
    value: f64,
    children: Vec<Node>,
}

impl Node {
    fn depth(&self) -> usize {
        1 + self.children.iter().map(Node::depth).max().unwrap_or(0)
    }
}

/// Add `value` along the row's path; a missing level ends the path there.
fn insert_path(roots: &mut Vec<Node>, levels: &[&ColumnData], row: usize, value: f64) {
    let mut level = roots;
    for data in levels {
        let Some(label) = data.text_at(row) else {
            break;
        };
        let idx = match level.iter().position(|n| n.label == label) {
            Some(idx) => idx,
            None => {
                level.push(Node {
                    label,
                    value: 0.0,
                    children: Vec::new(),
                });
                level.len() - 1
            }
        };
        let node = &mut level[idx];
        node.value += value;
        level = &mut node.children;
    }
}

/// Largest first at every level, ties in order of appearance.
fn sort_nodes(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| b.value.total_cmp(&a.value));
    for node in nodes {
        sort_nodes(&mut node.children);
    }
}

fn shade(color: Rgb, depth: usize) -> Rgb {
    color.lerp(Rgb::WHITE, 0.25 * depth as f64)
}

impl Context<'_> {
    /// Slices summed by name, largest first; non-positive values are skipped.
    pub(super) fn pie(&self, rows: &[usize]) -> PanelContent {
        let mut content = PanelContent::default();
        let (Some(names), Some(values)) = (&self.names, &self.values) else {
            return content;
        };

        let mut slices: Vec<(usize, f64)> = Vec::new();
        for &i in rows {
            let v = values[i];
            if !v.is_finite() || v <= 0.0 {
                continue;
            }
            let key = names.of_row[i];
            match slices.iter_mut().find(|(k, _)| *k == key) {
                Some((_, total)) => *total += v,
                None => slices.push((key, v)),
            }
        }
        slices.sort_by(|a, b| b.1.total_cmp(&a.1));
        let total: f64 = slices.iter().map(|s| s.1).sum();
        if total <= 0.0 {
            return content;
        }

        let mut start = 0.0;
        let wedges: Vec<Wedge> = slices
            .into_iter()
            .map(|(k, v)| {
                let end = start + v / total;
                let wedge = Wedge {
                    label: names.labels[k].clone(),
                    value: v,
                    start,
                    end,
                    inner: 0.0,
                    outer: 1.0,
                    color: self.category_color(k),
                };
                start = end;
                wedge
            })
            .collect();
        let color = wedges.first().map_or(Rgb::BLACK, |w| w.color);
        content.push(None, color, Geometry::Wedges(wedges));
        content
    }

    pub(super) fn hierarchy(&self, rows: &[usize]) -> PanelContent {
        let mut content = PanelContent::default();
        let Some(values) = &self.values else {
            return content;
        };

        let mut roots: Vec<Node> = Vec::new();
        for &i in rows {
            let v = values[i];
            if v.is_finite() && v >= 0.0 {
                insert_path(&mut roots, &self.path, i, v);
            }
        }
        sort_nodes(&mut roots);

        let colors: Vec<Rgb> = roots
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let k = self
                    .names
                    .as_ref()
                    .and_then(|keys| keys.index_of(&node.label))
                    .unwrap_or(i);
                self.category_color(k)
            })
            .collect();
        let geometry = if self.spec.chart_type == ChartType::Sunburst {
            Geometry::Wedges(sunburst_wedges(&roots, &colors))
        } else {
            Geometry::Tiles(treemap_tiles(&roots, &colors))
        };
        let color = colors.first().copied().unwrap_or(Rgb::BLACK);
        content.push(None, color, geometry);
        content
    }
}

/// Concentric rings, one per depth; children share their parent's span in
/// proportion to value.
fn sunburst_wedges(roots: &[Node], colors: &[Rgb]) -> Vec<Wedge> {
    fn place(node: &Node, start: f64, span: f64, depth: usize, ring: f64, color: Rgb, out: &mut Vec<Wedge>) {
        out.push(Wedge {
            label: node.label.clone(),
            value: node.value,
            start,
            end: start + span,
            inner: depth as f64 * ring,
            outer: (depth + 1) as f64 * ring,
            color: shade(color, depth),
        });
        if node.value <= 0.0 {
            return;
        }
        let mut child_start = start;
        for child in &node.children {
            let child_span = span * child.value / node.value;
            place(child, child_start, child_span, depth + 1, ring, color, out);
            child_start += child_span;
        }
    }

    let mut wedges = Vec::new();
    let depth = roots.iter().map(Node::depth).max().unwrap_or(0);
    let total: f64 = roots.iter().map(|n| n.value).sum();
    if depth == 0 || total <= 0.0 {
        return wedges;
    }
    let ring = 1.0 / depth as f64;
    let mut start = 0.0;
    for (node, &color) in roots.iter().zip(colors) {
        let span = node.value / total;
        place(node, start, span, 0, ring, color, &mut wedges);
        start += span;
    }
    wedges
}

/// Slice-and-dice layout in the unit square, alternating direction by depth.
fn treemap_tiles(roots: &[Node], colors: &[Rgb]) -> Vec<Tile> {
    fn slice(rect: Rect, start: f64, end: f64, along_x: bool) -> Rect {
        if along_x {
            let w = rect.x1 - rect.x0;
            Rect {
                x0: rect.x0 + w * start,
                x1: rect.x0 + w * end,
                ..rect
            }
        } else {
            // Top to bottom
            let h = rect.y1 - rect.y0;
            Rect {
                y0: rect.y1 - h * end,
                y1: rect.y1 - h * start,
                ..rect
            }
        }
    }

    fn place(node: &Node, rect: Rect, depth: usize, color: Rgb, out: &mut Vec<Tile>) {
        out.push(Tile {
            label: node.label.clone(),
            value: node.value,
            depth,
            rect,
            color: shade(color, depth),
        });
        if node.value <= 0.0 || node.children.is_empty() {
            return;
        }
        let inner = Rect {
            x0: rect.x0 + TREEMAP_PAD,
            x1: (rect.x1 - TREEMAP_PAD).max(rect.x0 + TREEMAP_PAD),
            y0: rect.y0 + TREEMAP_PAD,
            y1: (rect.y1 - TREEMAP_PAD).max(rect.y0 + TREEMAP_PAD),
        };
        let along_x = depth % 2 == 1;
        let mut start = 0.0;
        for child in &node.children {
            let end = start + child.value / node.value;
            place(child, slice(inner, start, end, along_x), depth + 1, color, out);
            start = end;
        }
    }

    let mut tiles = Vec::new();
    let total: f64 = roots.iter().map(|n| n.value).sum();
    if total <= 0.0 {
        return tiles;
    }
    let unit = Rect {
        x0: 0.0,
        x1: 1.0,
        y0: 0.0,
        y1: 1.0,
    };
    let mut start = 0.0;
    for (node, &color) in roots.iter().zip(colors) {
        let end = start + node.value / total;
        place(node, slice(unit, start, end, true), 0, color, &mut tiles);
        start = end;
    }
    tiles
}
