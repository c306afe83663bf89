use std::f64::consts::PI;

use log::debug;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::config::{GraphConfig, ZoomBounds};
use super::dispatch::FitTarget;
use super::engine::{EdgeSlot, ForceLayout, NodeSlot};
use super::error::RenderEngineInitError;
use super::style::ElementStyle;
use super::surface::{EngineFactory, RenderEngine};
use super::types::{Point, RenderableElement, Size, Target};

const BACKGROUND: &str = "#1a1a2e";

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Fill colour for a node type. Known ownership types get fixed colours,
/// anything else is hashed into the palette.
pub fn type_color(kind: &str) -> &'static str {
	match kind {
		"organization" => COLORS[0],
		"team" => COLORS[1],
		"user" => COLORS[2],
		"repository" => COLORS[9],
		_ => {
			let h = kind
				.bytes()
				.fold(0usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
			COLORS[h % COLORS.len()]
		}
	}
}

/// Canvas-backed engine: a force layout painted into a 2d context.
pub struct CanvasEngine {
	layout: ForceLayout,
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	flow_time: f64,
	destroyed: bool,
}

/// Builds [`CanvasEngine`]s on one canvas element.
pub struct CanvasEngineFactory {
	canvas: HtmlCanvasElement,
}

impl CanvasEngineFactory {
	/// Factory drawing into `canvas`.
	pub fn new(canvas: HtmlCanvasElement) -> Self {
		Self { canvas }
	}
}

impl EngineFactory for CanvasEngineFactory {
	type Engine = CanvasEngine;

	fn create(
		&mut self,
		elements: &[RenderableElement],
		size: Size,
		config: &GraphConfig,
	) -> Result<CanvasEngine, RenderEngineInitError> {
		let ctx = self
			.canvas
			.get_context("2d")
			.map_err(|e| RenderEngineInitError::Unavailable(format!("{e:?}")))?
			.ok_or_else(|| RenderEngineInitError::Unavailable("no 2d context".into()))?
			.dyn_into::<CanvasRenderingContext2d>()
			.map_err(|_| RenderEngineInitError::Failed("context is not 2d".into()))?;
		self.canvas.set_width(size.width as u32);
		self.canvas.set_height(size.height as u32);
		let layout = ForceLayout::new(elements, size, config)?;
		debug!(
			"canvas engine ready: {} nodes, {} edges",
			layout.nodes.len(),
			layout.edges.len()
		);
		Ok(CanvasEngine {
			layout,
			canvas: self.canvas.clone(),
			ctx,
			flow_time: 0.0,
			destroyed: false,
		})
	}
}

impl RenderEngine for CanvasEngine {
	fn apply_style(&mut self, id: &str, style: ElementStyle) {
		self.layout.set_style(id, style);
	}

	fn pan_by(&mut self, dx: f64, dy: f64) {
		self.layout.pan_by(dx, dy);
	}

	fn zoom_at(&mut self, anchor: Point, factor: f64, bounds: ZoomBounds) {
		self.layout.zoom_at(anchor, factor, bounds);
	}

	fn zoom_by(&mut self, factor: f64, bounds: ZoomBounds) {
		self.layout.zoom_by(factor, bounds);
	}

	fn reset_zoom(&mut self) {
		self.layout.reset_zoom();
	}

	fn fit(&mut self, target: &FitTarget, padding: f64, bounds: ZoomBounds) {
		self.layout.fit(target, padding, bounds);
	}

	fn center(&mut self) {
		self.layout.center();
	}

	fn zoom_to_node(&mut self, id: &str, zoom: f64, bounds: ZoomBounds) -> bool {
		self.layout.zoom_to_node(id, zoom, bounds)
	}

	fn resize(&mut self, size: Size) {
		self.canvas.set_width(size.width as u32);
		self.canvas.set_height(size.height as u32);
		self.layout.resize(size);
	}

	fn hit_test(&self, at: Point) -> Target {
		self.layout.hit_test(at)
	}

	fn frame(&mut self, dt: f32) {
		if self.destroyed {
			return;
		}
		self.layout.tick(dt);
		self.flow_time += dt as f64;
		paint(&self.layout, &self.ctx, self.flow_time);
	}

	fn destroy(&mut self) {
		self.destroyed = true;
		self.ctx
			.clear_rect(0.0, 0.0, self.layout.width, self.layout.height);
	}
}

fn paint(layout: &ForceLayout, ctx: &CanvasRenderingContext2d, flow_time: f64) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, layout.width, layout.height);
	ctx.save();
	let _ = ctx.translate(layout.transform.x, layout.transform.y);
	let _ = ctx.scale(layout.transform.k, layout.transform.k);
	for edge in &layout.edges {
		draw_edge(layout, edge, ctx, flow_time);
	}
	// emphasised nodes go on top
	for node in layout.nodes.iter().filter(|n| n.style == ElementStyle::Default) {
		draw_node(layout, node, ctx);
	}
	for node in layout.nodes.iter().filter(|n| n.style != ElementStyle::Default) {
		draw_node(layout, node, ctx);
	}
	ctx.restore();
}

fn draw_edge(layout: &ForceLayout, edge: &EdgeSlot, ctx: &CanvasRenderingContext2d, flow_time: f64) {
	if edge.style == ElementStyle::Hidden {
		return;
	}
	let (a, b) = (&layout.nodes[edge.source], &layout.nodes[edge.target]);
	if a.style == ElementStyle::Hidden || b.style == ElementStyle::Hidden {
		return;
	}
	let k = layout.transform.k;
	let r = layout.node_radius;
	let (line_width, arrow_size) = (1.5 / k, 8.0 / k);

	let (alpha, width, color) = match edge.style {
		ElementStyle::Highlighted => (0.95, line_width * 2.0, "255, 214, 102"),
		ElementStyle::Selected => (0.9, line_width * 1.6, "255, 255, 255"),
		ElementStyle::Hover => (0.9, line_width * 1.3, "140, 200, 255"),
		_ => (0.6, line_width, "100, 180, 255"),
	};
	ctx.set_stroke_style_str(&format!("rgba({color}, {alpha})"));
	ctx.set_fill_style_str(&format!("rgba({color}, {alpha})"));
	ctx.set_line_width(width);

	if edge.source == edge.target {
		ctx.begin_path();
		let _ = ctx.arc(a.x, a.y - r * 2.0, r * 1.5, 0.0, 2.0 * PI);
		ctx.stroke();
		return;
	}

	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}

	// highlighted edges flow towards their target
	if edge.style == ElementStyle::Highlighted {
		let (dash, gap) = (8.0 / k, 4.0 / k);
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(dash),
			&JsValue::from_f64(gap),
		));
		ctx.set_line_dash_offset(-(flow_time * 30.0) % (dash + gap));
	}

	let (ux, uy) = (dx / dist, dy / dist);
	ctx.begin_path();
	ctx.move_to(a.x + ux * r, a.y + uy * r);
	ctx.line_to(b.x - ux * (r + arrow_size), b.y - uy * (r + arrow_size));
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	let (tip_x, tip_y) = (b.x - ux * r, b.y - uy * r);
	let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
	let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();

	if matches!(edge.style, ElementStyle::Hover | ElementStyle::Selected) {
		ctx.set_font(&format!("{}px sans-serif", 9.0 / k.max(0.5)));
		let _ = ctx.fill_text(&edge.label, (a.x + b.x) / 2.0 + 3.0, (a.y + b.y) / 2.0 - 3.0);
	}
}

fn draw_node(layout: &ForceLayout, node: &NodeSlot, ctx: &CanvasRenderingContext2d) {
	if node.style == ElementStyle::Hidden {
		return;
	}
	let k = layout.transform.k;
	let (x, y) = (node.x, node.y);
	let base = layout.node_radius;
	let color = type_color(&node.kind);

	let (radius, glow_radius, label_alpha) = match node.style {
		ElementStyle::Highlighted => (base * 1.35, base * 3.0, 1.0),
		ElementStyle::Hover => (base * 1.2, base * 2.0, 1.0),
		ElementStyle::Selected => (base * 1.15, 0.0, 1.0),
		_ => (base, 0.0, 0.8),
	};

	if glow_radius > 0.0
		&& let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow_radius)
	{
		let alpha = if node.style == ElementStyle::Highlighted { 0.45 } else { 0.25 };
		let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {alpha})"));
		let _ = gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
		let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
		ctx.begin_path();
		let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
		#[allow(deprecated)]
		ctx.set_fill_style(&gradient);
		ctx.fill();
	}

	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(color);
	ctx.fill();

	if node.style == ElementStyle::Selected {
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius + 2.5 / k, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str("rgba(255, 214, 102, 0.95)");
		ctx.set_line_width(2.0 / k);
		ctx.stroke();
	} else if node.style == ElementStyle::Hover {
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str("rgba(255, 255, 255, 0.7)");
		ctx.set_line_width(1.5 / k);
		ctx.stroke();
	}

	ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {label_alpha})"));
	ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
	let _ = ctx.fill_text(&node.label, x + radius + 3.0, y + 3.0);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn known_types_have_fixed_colours() {
		assert_eq!(type_color("organization"), "#1f77b4");
		assert_eq!(type_color("repository"), "#17becf");
	}

	#[test]
	fn unknown_types_hash_stably() {
		assert_eq!(type_color("bot"), type_color("bot"));
		assert!(COLORS.contains(&type_color("something-else")));
	}
}
