use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::config::{GraphConfig, ZoomBounds};
use super::dispatch::FitTarget;
use super::error::RenderEngineInitError;
use super::style::ElementStyle;
use super::types::{Point, RenderableElement, Size, Target};

#[derive(Clone, Debug)]
pub struct NodeSlot {
	pub id: String,
	pub kind: String,
	pub label: String,
	pub x: f64,
	pub y: f64,
	pub style: ElementStyle,
	idx: DefaultNodeIdx,
}

#[derive(Clone, Debug)]
pub struct EdgeSlot {
	pub id: String,
	pub label: String,
	/// Index into `ForceLayout::nodes`.
	pub source: usize,
	pub target: usize,
	pub style: ElementStyle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Copy, Debug)]
enum Slot {
	Node(usize),
	Edge(usize),
}

/// Force-directed layout plus the viewport it is shown through.
pub struct ForceLayout {
	graph: ForceGraph<usize, ()>,
	pub nodes: Vec<NodeSlot>,
	pub edges: Vec<EdgeSlot>,
	lookup: HashMap<String, Slot>,
	pub transform: ViewTransform,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	ticks: u32,
	settle_ticks: u32,
	pub node_radius: f64,
	hit_radius: f64,
	edge_tolerance: f64,
}

fn simulation_parameters(config: &GraphConfig) -> SimulationParameters {
	SimulationParameters {
		force_charge: config.layout.force_charge,
		force_spring: config.layout.force_spring,
		force_max: config.layout.force_max,
		node_speed: config.layout.node_speed,
		damping_factor: config.layout.damping_factor,
	}
}

// distance from p to segment ab
fn point_segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
	let (abx, aby) = (b.0 - a.0, b.1 - a.1);
	let len2 = abx * abx + aby * aby;
	if len2 <= f64::EPSILON {
		return ((p.0 - a.0).powi(2) + (p.1 - a.1).powi(2)).sqrt();
	}
	let t = (((p.0 - a.0) * abx + (p.1 - a.1) * aby) / len2).clamp(0.0, 1.0);
	let (qx, qy) = (a.0 + abx * t, a.1 + aby * t);
	((p.0 - qx).powi(2) + (p.1 - qy).powi(2)).sqrt()
}

impl ForceLayout {
	pub fn new(
		elements: &[RenderableElement],
		size: Size,
		config: &GraphConfig,
	) -> Result<Self, RenderEngineInitError> {
		if !(size.width.is_finite() && size.height.is_finite()) {
			return Err(RenderEngineInitError::Unavailable(format!(
				"surface size {}x{} is not finite",
				size.width, size.height
			)));
		}
		let mut graph = ForceGraph::new(simulation_parameters(config));
		let mut nodes = Vec::new();
		let mut edges = Vec::new();
		let mut lookup = HashMap::new();

		let node_count = elements.iter().filter(|e| e.is_node()).count().max(1);
		let ring = (node_count as f64 * config.node_radius * 4.0 / (2.0 * PI)).max(100.0);

		for element in elements {
			let RenderableElement::Node(node) = element else {
				continue;
			};
			let i = nodes.len();
			let (x, y) = match node.position {
				Some(p) => (p.x, p.y),
				None => {
					let angle = (i as f64) * 2.0 * PI / node_count as f64;
					(ring * angle.cos(), ring * angle.sin())
				}
			};
			let idx = graph.add_node(NodeData {
				x: x as f32,
				y: y as f32,
				mass: config.layout.node_mass,
				is_anchor: false,
				user_data: i,
			});
			lookup.insert(node.id.clone(), Slot::Node(i));
			nodes.push(NodeSlot {
				id: node.id.clone(),
				kind: node.kind.clone(),
				label: node.display_label.clone(),
				x,
				y,
				style: ElementStyle::Default,
				idx,
			});
		}

		for element in elements {
			let RenderableElement::Edge(edge) = element else {
				continue;
			};
			let (Some(Slot::Node(source)), Some(Slot::Node(target))) =
				(lookup.get(&edge.source).copied(), lookup.get(&edge.target).copied())
			else {
				return Err(RenderEngineInitError::Failed(format!(
					"edge {:?} references a node outside the element set",
					edge.id
				)));
			};
			// self-loops are drawn but take no part in the simulation
			if source != target {
				graph.add_edge(nodes[source].idx, nodes[target].idx, EdgeData::default());
			}
			lookup.insert(edge.id.clone(), Slot::Edge(edges.len()));
			edges.push(EdgeSlot {
				id: edge.id.clone(),
				label: edge.display_label.clone(),
				source,
				target,
				style: ElementStyle::Default,
			});
		}

		Ok(Self {
			graph,
			nodes,
			edges,
			lookup,
			transform: ViewTransform {
				x: size.width / 2.0,
				y: size.height / 2.0,
				k: 1.0,
			},
			width: size.width,
			height: size.height,
			animation_running: true,
			ticks: 0,
			settle_ticks: config.layout.settle_ticks,
			node_radius: config.node_radius,
			hit_radius: config.hit_radius,
			edge_tolerance: config.edge_hit_tolerance,
		})
	}

	/// Advances the simulation one step until the settle budget is spent.
	pub fn tick(&mut self, dt: f32) {
		if !self.animation_running {
			return;
		}
		self.graph.update(dt);
		let nodes = &mut self.nodes;
		self.graph.visit_nodes(|node| {
			let (x, y) = (node.x() as f64, node.y() as f64);
			if let Some(slot) = nodes.get_mut(node.data.user_data)
				&& x.is_finite()
				&& y.is_finite()
			{
				slot.x = x;
				slot.y = y;
			}
		});
		self.ticks += 1;
		if self.ticks >= self.settle_ticks {
			self.animation_running = false;
		}
	}

	pub fn set_style(&mut self, id: &str, style: ElementStyle) -> bool {
		match self.lookup.get(id) {
			Some(Slot::Node(i)) => self.nodes[*i].style = style,
			Some(Slot::Edge(i)) => self.edges[*i].style = style,
			None => return false,
		}
		true
	}

	pub fn node_position(&self, id: &str) -> Option<(f64, f64)> {
		match self.lookup.get(id)? {
			Slot::Node(i) => Some((self.nodes[*i].x, self.nodes[*i].y)),
			Slot::Edge(_) => None,
		}
	}

	pub fn screen_to_graph(&self, at: Point) -> (f64, f64) {
		(
			(at.x - self.transform.x) / self.transform.k,
			(at.y - self.transform.y) / self.transform.k,
		)
	}

	#[cfg(test)]
	pub fn graph_to_screen(&self, x: f64, y: f64) -> Point {
		Point::new(
			x * self.transform.k + self.transform.x,
			y * self.transform.k + self.transform.y,
		)
	}

	/// Topmost visible node under `at`, else the nearest visible edge within
	/// tolerance, else the background.
	pub fn hit_test(&self, at: Point) -> Target {
		let (gx, gy) = self.screen_to_graph(at);
		let node = self
			.nodes
			.iter()
			.rev()
			.filter(|n| n.style != ElementStyle::Hidden)
			.find(|n| ((n.x - gx).powi(2) + (n.y - gy).powi(2)).sqrt() < self.hit_radius);
		if let Some(node) = node {
			return Target::Node(node.id.clone());
		}
		let tolerance = self.edge_tolerance / self.transform.k;
		self.edges
			.iter()
			.filter(|e| e.style != ElementStyle::Hidden)
			.map(|e| {
				let (a, b) = (&self.nodes[e.source], &self.nodes[e.target]);
				(e, point_segment_distance((gx, gy), (a.x, a.y), (b.x, b.y)))
			})
			.filter(|(_, d)| *d <= tolerance)
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(e, _)| Target::Edge(e.id.clone()))
			.unwrap_or(Target::Background)
	}

	pub fn resize(&mut self, size: Size) {
		self.width = size.width;
		self.height = size.height;
	}

	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.transform.x += dx;
		self.transform.y += dy;
	}

	/// Zooms keeping the graph point under `anchor` fixed on screen.
	pub fn zoom_at(&mut self, anchor: Point, factor: f64, bounds: ZoomBounds) {
		let new_k = bounds.clamp(self.transform.k * factor);
		let ratio = new_k / self.transform.k;
		self.transform.x = anchor.x - (anchor.x - self.transform.x) * ratio;
		self.transform.y = anchor.y - (anchor.y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn zoom_by(&mut self, factor: f64, bounds: ZoomBounds) {
		let center = Point::new(self.width / 2.0, self.height / 2.0);
		self.zoom_at(center, factor, bounds);
	}

	fn look_at(&mut self, cx: f64, cy: f64) {
		self.transform.x = self.width / 2.0 - cx * self.transform.k;
		self.transform.y = self.height / 2.0 - cy * self.transform.k;
	}

	fn visible_bounds<'a, I>(&'a self, nodes: I) -> Option<(f64, f64, f64, f64)>
	where
		I: Iterator<Item = &'a NodeSlot>,
	{
		let r = self.node_radius;
		nodes
			.filter(|n| n.style != ElementStyle::Hidden)
			.fold(None, |acc, n| {
				let (x0, y0, x1, y1) = (n.x - r, n.y - r, n.x + r, n.y + r);
				Some(match acc {
					None => (x0, y0, x1, y1),
					Some((a, b, c, d)) => (a.min(x0), b.min(y0), c.max(x1), d.max(y1)),
				})
			})
	}

	fn target_bounds(&self, target: &FitTarget) -> Option<(f64, f64, f64, f64)> {
		match target {
			FitTarget::All => self.visible_bounds(self.nodes.iter()),
			FitTarget::Elements(ids) => {
				let mut picked = Vec::new();
				for id in ids {
					match self.lookup.get(id) {
						Some(Slot::Node(i)) => picked.push(*i),
						Some(Slot::Edge(i)) => {
							picked.push(self.edges[*i].source);
							picked.push(self.edges[*i].target);
						}
						None => {}
					}
				}
				self.visible_bounds(picked.into_iter().map(|i| &self.nodes[i]))
			}
		}
	}

	/// Centers the visible graph without changing zoom.
	pub fn center(&mut self) {
		if let Some((x0, y0, x1, y1)) = self.target_bounds(&FitTarget::All) {
			self.look_at((x0 + x1) / 2.0, (y0 + y1) / 2.0);
		}
	}

	pub fn reset_zoom(&mut self) {
		self.transform.k = 1.0;
		self.center();
	}

	/// Frames the target with `padding` pixels on every side.
	pub fn fit(&mut self, target: &FitTarget, padding: f64, bounds: ZoomBounds) {
		let Some((x0, y0, x1, y1)) = self.target_bounds(target) else {
			return;
		};
		let usable_w = (self.width - 2.0 * padding).max(1.0);
		let usable_h = (self.height - 2.0 * padding).max(1.0);
		let k = (usable_w / (x1 - x0)).min(usable_h / (y1 - y0));
		self.transform.k = bounds.clamp(k);
		self.look_at((x0 + x1) / 2.0, (y0 + y1) / 2.0);
	}

	pub fn zoom_to_node(&mut self, id: &str, zoom: f64, bounds: ZoomBounds) -> bool {
		let Some((x, y)) = self.node_position(id) else {
			return false;
		};
		self.transform.k = bounds.clamp(self.transform.k.max(zoom));
		self.look_at(x, y);
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::ownership_graph::types::{GraphEdge, GraphNode, Position};
	use crate::components::ownership_graph::validate::validate_graph;

	fn layout() -> ForceLayout {
		let node = |id: &str, x: f64, y: f64| GraphNode {
			id: id.into(),
			kind: "user".into(),
			label: id.into(),
			position: Some(Position { x, y }),
			..Default::default()
		};
		let report = validate_graph(
			&[node("a", -100.0, 0.0), node("b", 100.0, 0.0), node("c", 0.0, 200.0)],
			&[GraphEdge {
				id: "ab".into(),
				source: "a".into(),
				target: "b".into(),
				kind: "owns".into(),
				label: String::new(),
			}],
		);
		ForceLayout::new(&report.elements, Size::new(800.0, 600.0), &GraphConfig::default())
			.expect("layout")
	}

	fn bounds() -> ZoomBounds {
		GraphConfig::default().zoom_bounds()
	}

	#[test]
	fn hit_test_prefers_nodes_then_edges() {
		let l = layout();
		let a = l.graph_to_screen(-100.0, 0.0);
		assert_eq!(l.hit_test(a), Target::Node("a".into()));
		let mid = l.graph_to_screen(0.0, 2.0);
		assert_eq!(l.hit_test(mid), Target::Edge("ab".into()));
		let empty = l.graph_to_screen(300.0, -250.0);
		assert_eq!(l.hit_test(empty), Target::Background);
	}

	#[test]
	fn hidden_elements_are_not_hit() {
		let mut l = layout();
		assert!(l.set_style("a", ElementStyle::Hidden));
		assert!(l.set_style("ab", ElementStyle::Hidden));
		assert_eq!(l.hit_test(l.graph_to_screen(-100.0, 0.0)), Target::Background);
		assert_eq!(l.hit_test(l.graph_to_screen(0.0, 0.0)), Target::Background);
		assert!(!l.set_style("nope", ElementStyle::Hidden));
	}

	#[test]
	fn zoom_is_clamped() {
		let mut l = layout();
		for _ in 0..100 {
			l.zoom_by(1.2, bounds());
		}
		assert_eq!(l.transform.k, 10.0);
		for _ in 0..100 {
			l.zoom_by(1.0 / 1.2, bounds());
		}
		assert_eq!(l.transform.k, 0.1);
	}

	#[test]
	fn fit_frames_all_nodes_inside_padding() {
		let mut l = layout();
		l.fit(&FitTarget::All, 50.0, bounds());
		for node in &l.nodes {
			let p = l.graph_to_screen(node.x, node.y);
			assert!(p.x >= 50.0 - 1e-6 && p.x <= 750.0 + 1e-6, "x {}", p.x);
			assert!(p.y >= 50.0 - 1e-6 && p.y <= 550.0 + 1e-6, "y {}", p.y);
		}
	}

	#[test]
	fn fit_on_edge_frames_its_endpoints() {
		let mut l = layout();
		l.fit(&FitTarget::Elements(vec!["ab".into()]), 80.0, bounds());
		let center = l.graph_to_screen(0.0, 0.0);
		assert!((center.x - 400.0).abs() < 1e-6);
		assert!((center.y - 300.0).abs() < 1e-6);
	}

	#[test]
	fn reset_zoom_recenters_at_unit_scale() {
		let mut l = layout();
		l.zoom_by(3.0, bounds());
		l.pan_by(120.0, -40.0);
		l.reset_zoom();
		assert_eq!(l.transform.k, 1.0);
		// bounding box spans x -106..106, y -6..206
		let c = l.graph_to_screen(0.0, 100.0);
		assert!((c.x - 400.0).abs() < 1e-6 && (c.y - 300.0).abs() < 1e-6);
	}

	#[test]
	fn zoom_to_node_centers_it() {
		let mut l = layout();
		assert!(l.zoom_to_node("c", 1.5, bounds()));
		assert_eq!(l.transform.k, 1.5);
		let p = l.graph_to_screen(0.0, 200.0);
		assert!((p.x - 400.0).abs() < 1e-6 && (p.y - 300.0).abs() < 1e-6);
		assert!(!l.zoom_to_node("ab", 1.5, bounds()));
	}

	#[test]
	fn simulation_stops_after_settle_budget() {
		let mut l = layout();
		l.settle_ticks = 3;
		for _ in 0..5 {
			l.tick(0.016);
		}
		assert!(!l.animation_running);
		assert_eq!(l.ticks, 3);
	}

	#[test]
	fn rejects_non_finite_surface() {
		let err = ForceLayout::new(&[], Size::new(f64::NAN, 10.0), &GraphConfig::default())
			.err()
			.expect("error");
		assert!(matches!(err, RenderEngineInitError::Unavailable(_)));
	}
}
