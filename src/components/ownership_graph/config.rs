/// Force-directed layout constants handed to the simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	/// Repulsion between every pair of nodes.
	pub force_charge: f32,
	/// Spring strength pulling connected nodes together.
	pub force_spring: f32,
	/// Upper bound on the force applied to one node per step.
	pub force_max: f32,
	/// Velocity cap for a node.
	pub node_speed: f32,
	/// Velocity retained between steps.
	pub damping_factor: f32,
	/// Mass shared by every node.
	pub node_mass: f32,
	/// Simulation steps before the layout is frozen.
	pub settle_ticks: u32,
	/// Seconds advanced per simulation step.
	pub tick_seconds: f32,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
			node_mass: 10.0,
			settle_ticks: 600,
			tick_seconds: 0.016,
		}
	}
}

/// Fixed behaviour constants for one graph surface.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphConfig {
	/// Simulation constants.
	pub layout: LayoutConfig,
	/// Smallest allowed zoom level.
	pub min_zoom: f64,
	/// Largest allowed zoom level.
	pub max_zoom: f64,
	/// Multiplicative zoom factor for one keyboard step.
	pub zoom_step: f64,
	/// Pixels moved per arrow key press.
	pub pan_step: f64,
	/// Padding around the graph when fitting it to the surface.
	pub fit_padding: f64,
	/// Padding used when the expanded view fits its neighbourhood.
	pub modal_fit_padding: f64,
	/// Zoom level used when focusing a single node, unless already closer.
	pub focus_zoom: f64,
	/// How long a clicked element stays highlighted.
	pub highlight_ms: u64,
	/// Lifetime of a node or edge info panel.
	pub info_panel_ms: u64,
	/// Lifetime of the keyboard feedback toast.
	pub toast_ms: u64,
	/// Minimum gap between the context menu and the viewport edge.
	pub menu_margin: f64,
	/// Estimated context menu width, for clamping.
	pub menu_width: f64,
	/// Estimated height of one menu action.
	pub menu_item_height: f64,
	/// Estimated height of one menu separator.
	pub menu_separator_height: f64,
	/// Drawn node radius at zoom 1.
	pub node_radius: f64,
	/// Pointer distance, in graph units, that still hits a node.
	pub hit_radius: f64,
	/// Pointer distance, in graph units, that still hits an edge.
	pub edge_hit_tolerance: f64,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			layout: LayoutConfig::default(),
			min_zoom: 0.1,
			max_zoom: 10.0,
			zoom_step: 1.2,
			pan_step: 50.0,
			fit_padding: 50.0,
			modal_fit_padding: 80.0,
			focus_zoom: 1.5,
			highlight_ms: 800,
			info_panel_ms: 10_000,
			toast_ms: 1_500,
			menu_margin: 10.0,
			menu_width: 200.0,
			menu_item_height: 32.0,
			menu_separator_height: 9.0,
			node_radius: 6.0,
			hit_radius: 12.0,
			edge_hit_tolerance: 6.0,
		}
	}
}

impl GraphConfig {
	/// Zoom limits as one value.
	pub fn zoom_bounds(&self) -> ZoomBounds {
		ZoomBounds {
			min: self.min_zoom,
			max: self.max_zoom,
		}
	}
}

/// Inclusive zoom range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomBounds {
	/// Lower limit.
	pub min: f64,
	/// Upper limit.
	pub max: f64,
}

impl ZoomBounds {
	/// Clamps `k` into the range.
	pub fn clamp(self, k: f64) -> f64 {
		k.clamp(self.min, self.max)
	}
}
