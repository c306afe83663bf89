use super::config::GraphConfig;
use super::style::HiddenLedger;
use super::types::{Point, Size, Target};

/// Every entry a context menu can offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MenuAction {
	/// Open the expanded view of the node.
	ViewDetails,
	/// Centre and zoom on the node.
	ZoomToNode,
	/// Select the node, its edges and its neighbours.
	SelectConnected,
	/// Hide the node and every edge touching it.
	HideNode,
	/// Open the expanded view of the edge.
	ViewEdgeDetails,
	/// Select the edge's source and target.
	SelectEndpoints,
	/// Hide the edge alone.
	HideEdge,
	/// Fit every visible element.
	ZoomToFit,
	/// Centre the graph without zooming.
	CenterGraph,
	/// Empty the selection.
	ClearSelections,
	/// Restore every hidden element.
	ShowAll,
}

impl MenuAction {
	/// Human-readable text of the entry.
	pub fn label(self) -> &'static str {
		match self {
			MenuAction::ViewDetails => "View details",
			MenuAction::ZoomToNode => "Zoom to node",
			MenuAction::SelectConnected => "Select connected",
			MenuAction::HideNode => "Hide node",
			MenuAction::ViewEdgeDetails => "View edge details",
			MenuAction::SelectEndpoints => "Select source/target",
			MenuAction::HideEdge => "Hide edge",
			MenuAction::ZoomToFit => "Zoom to fit",
			MenuAction::CenterGraph => "Center graph",
			MenuAction::ClearSelections => "Clear selections",
			MenuAction::ShowAll => "Show all",
		}
	}

	/// Stable key used in logs and DOM ids.
	pub fn key(self) -> &'static str {
		match self {
			MenuAction::ViewDetails => "view-details",
			MenuAction::ZoomToNode => "zoom-to-node",
			MenuAction::SelectConnected => "select-connected",
			MenuAction::HideNode => "hide-node",
			MenuAction::ViewEdgeDetails => "view-edge-details",
			MenuAction::SelectEndpoints => "select-source-target",
			MenuAction::HideEdge => "hide-edge",
			MenuAction::ZoomToFit => "zoom-to-fit",
			MenuAction::CenterGraph => "center-graph",
			MenuAction::ClearSelections => "clear-selections",
			MenuAction::ShowAll => "show-all",
		}
	}
}

/// One row of a context menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuItem {
	/// A clickable entry; a disabled one is shown but dispatches nothing.
	Action {
		/// What the entry does.
		action: MenuAction,
		/// Greyed out, never dispatched.
		disabled: bool,
	},
	/// Visual divider between groups.
	Separator,
}

impl MenuItem {
	fn enabled(action: MenuAction) -> Self {
		MenuItem::Action {
			action,
			disabled: false,
		}
	}

	/// The action behind this row, if it is not a separator.
	pub fn action(&self) -> Option<MenuAction> {
		match self {
			MenuItem::Action { action, .. } => Some(*action),
			MenuItem::Separator => None,
		}
	}
}

/// An open context menu: what it was opened on, where, and its items.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextMenuState {
	/// Element (or background) the menu was opened on.
	pub target: Target,
	/// Top-left corner in viewport coordinates, already clamped.
	pub position: Point,
	/// Rows in display order.
	pub items: Vec<MenuItem>,
}

impl ContextMenuState {
	/// Whether `action` is listed and enabled.
	pub fn allows(&self, action: MenuAction) -> bool {
		self.items.iter().any(|item| {
			matches!(item, MenuItem::Action { action: a, disabled: false } if *a == action)
		})
	}
}

/// Menu rows for `target`. "Show all" is disabled while nothing is hidden.
pub fn build_menu(target: &Target, hidden: &HiddenLedger) -> Vec<MenuItem> {
	use MenuAction::*;
	match target {
		Target::Node(_) => vec![
			MenuItem::enabled(ViewDetails),
			MenuItem::Separator,
			MenuItem::enabled(ZoomToNode),
			MenuItem::enabled(SelectConnected),
			MenuItem::Separator,
			MenuItem::enabled(HideNode),
		],
		Target::Edge(_) => vec![
			MenuItem::enabled(ViewEdgeDetails),
			MenuItem::Separator,
			MenuItem::enabled(SelectEndpoints),
			MenuItem::Separator,
			MenuItem::enabled(HideEdge),
		],
		Target::Background => vec![
			MenuItem::enabled(ZoomToFit),
			MenuItem::enabled(CenterGraph),
			MenuItem::Separator,
			MenuItem::enabled(ClearSelections),
			MenuItem::Separator,
			MenuItem::Action {
				action: ShowAll,
				disabled: hidden.is_empty(),
			},
		],
	}
}

/// Rendered size of a menu, from the fixed row metrics.
pub fn menu_size(items: &[MenuItem], config: &GraphConfig) -> Size {
	let height: f64 = items
		.iter()
		.map(|item| match item {
			MenuItem::Action { .. } => config.menu_item_height,
			MenuItem::Separator => config.menu_separator_height,
		})
		.sum();
	Size::new(config.menu_width, height)
}

/// Shifts the menu inward on each axis where its far edge would leave the
/// viewport, by the overflow plus `margin`.
pub fn clamp_to_viewport(at: Point, menu: Size, viewport: Size, margin: f64) -> Point {
	fn axis(start: f64, extent: f64, limit: f64, margin: f64) -> f64 {
		let overflow = start + extent - limit;
		if overflow > 0.0 {
			start - overflow - margin
		} else {
			start
		}
	}
	Point::new(
		axis(at.x, menu.width, viewport.width, margin),
		axis(at.y, menu.height, viewport.height, margin),
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn actions(items: &[MenuItem]) -> Vec<Option<MenuAction>> {
		items.iter().map(MenuItem::action).collect()
	}

	#[test]
	fn node_menu_layout() {
		let items = build_menu(&Target::Node("a".into()), &HiddenLedger::default());
		assert_eq!(
			actions(&items),
			vec![
				Some(MenuAction::ViewDetails),
				None,
				Some(MenuAction::ZoomToNode),
				Some(MenuAction::SelectConnected),
				None,
				Some(MenuAction::HideNode),
			]
		);
	}

	#[test]
	fn edge_menu_layout() {
		let items = build_menu(&Target::Edge("e".into()), &HiddenLedger::default());
		assert_eq!(
			actions(&items),
			vec![
				Some(MenuAction::ViewEdgeDetails),
				None,
				Some(MenuAction::SelectEndpoints),
				None,
				Some(MenuAction::HideEdge),
			]
		);
	}

	#[test]
	fn show_all_disabled_only_when_nothing_hidden() {
		let mut hidden = HiddenLedger::default();
		let items = build_menu(&Target::Background, &hidden);
		assert_eq!(
			items.last(),
			Some(&MenuItem::Action {
				action: MenuAction::ShowAll,
				disabled: true
			})
		);
		hidden.hide(["a"]);
		let items = build_menu(&Target::Background, &hidden);
		assert_eq!(
			items.last(),
			Some(&MenuItem::Action {
				action: MenuAction::ShowAll,
				disabled: false
			})
		);
	}

	#[test]
	fn clamp_is_independent_per_axis() {
		let viewport = Size::new(800.0, 600.0);
		let menu = Size::new(200.0, 150.0);
		assert_eq!(
			clamp_to_viewport(Point::new(100.0, 100.0), menu, viewport, 10.0),
			Point::new(100.0, 100.0)
		);
		// x overflows by 50, y fits
		assert_eq!(
			clamp_to_viewport(Point::new(650.0, 100.0), menu, viewport, 10.0),
			Point::new(590.0, 100.0)
		);
		// y overflows by 30, x fits
		assert_eq!(
			clamp_to_viewport(Point::new(10.0, 480.0), menu, viewport, 10.0),
			Point::new(10.0, 440.0)
		);
	}

	#[test]
	fn menu_size_counts_separators() {
		let config = GraphConfig::default();
		let items = build_menu(&Target::Node("a".into()), &HiddenLedger::default());
		let size = menu_size(&items, &config);
		assert_eq!(size.width, config.menu_width);
		assert_eq!(
			size.height,
			4.0 * config.menu_item_height + 2.0 * config.menu_separator_height
		);
	}
}
