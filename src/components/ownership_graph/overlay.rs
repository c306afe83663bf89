use std::collections::BTreeMap;

use serde_json::Value;

use super::config::GraphConfig;
use super::context_menu::ContextMenuState;
use super::error::OverlaySurfaceUnavailable;

/// The five transient surface kinds; at most one of each is ever open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlayKind {
	/// Short-lived card for a clicked node.
	NodeInfo,
	/// Short-lived card for a clicked edge.
	EdgeInfo,
	/// Right-click menu.
	ContextMenu,
	/// Full details of one element and its neighbourhood.
	ExpandedModal,
	/// Feedback naming the shortcut just used.
	KeyboardToast,
}

impl OverlayKind {
	/// Every kind, in stacking order.
	pub const ALL: [OverlayKind; 5] = [
		OverlayKind::NodeInfo,
		OverlayKind::EdgeInfo,
		OverlayKind::ContextMenu,
		OverlayKind::ExpandedModal,
		OverlayKind::KeyboardToast,
	];

	/// Well-known DOM id of the surface.
	pub fn key(self) -> &'static str {
		match self {
			OverlayKind::NodeInfo => "graph-node-info",
			OverlayKind::EdgeInfo => "graph-edge-info",
			OverlayKind::ContextMenu => "graph-context-menu",
			OverlayKind::ExpandedModal => "graph-expanded-modal",
			OverlayKind::KeyboardToast => "graph-keyboard-toast",
		}
	}

	/// The kind that is closed whenever this one opens.
	fn excludes(self) -> Option<OverlayKind> {
		match self {
			OverlayKind::NodeInfo => Some(OverlayKind::EdgeInfo),
			OverlayKind::EdgeInfo => Some(OverlayKind::NodeInfo),
			_ => None,
		}
	}

	fn policy(self, opened_at: u64, config: &GraphConfig) -> DismissPolicy {
		match self {
			OverlayKind::NodeInfo | OverlayKind::EdgeInfo => DismissPolicy {
				expires_at: Some(opened_at + config.info_panel_ms),
				on_self_click: true,
				on_outside_click: true,
				on_escape: false,
			},
			OverlayKind::KeyboardToast => DismissPolicy {
				expires_at: Some(opened_at + config.toast_ms),
				on_self_click: true,
				on_outside_click: true,
				on_escape: false,
			},
			OverlayKind::ContextMenu => DismissPolicy {
				expires_at: None,
				on_self_click: true,
				on_outside_click: true,
				on_escape: true,
			},
			// clicks inside the dialog body keep it open; the backdrop counts as outside
			OverlayKind::ExpandedModal => DismissPolicy {
				expires_at: None,
				on_self_click: false,
				on_outside_click: true,
				on_escape: true,
			},
		}
	}
}

/// When a panel closes by itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DismissPolicy {
	/// Absolute deadline in milliseconds, if any.
	pub expires_at: Option<u64>,
	/// A click on the panel closes it.
	pub on_self_click: bool,
	/// The next click elsewhere closes it.
	pub on_outside_click: bool,
	/// Escape closes it.
	pub on_escape: bool,
}

/// Display fields of a node, as shown in the info panel and the modal.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDetails {
	/// Node id.
	pub id: String,
	/// Node type.
	pub kind: String,
	/// Display label.
	pub label: String,
	/// Free-form attributes, sorted by key.
	pub data: BTreeMap<String, Value>,
}

/// Display fields of an edge, with both endpoints resolved to labels.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeDetails {
	/// Edge id.
	pub id: String,
	/// Edge type.
	pub kind: String,
	/// Display label.
	pub label: String,
	/// Source node id.
	pub source: String,
	/// Source node label.
	pub source_label: String,
	/// Target node id.
	pub target: String,
	/// Target node label.
	pub target_label: String,
}

/// One connected edge as listed in the expanded modal.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSummary {
	/// Edge id.
	pub id: String,
	/// Edge label.
	pub label: String,
	/// The node on the far side of the edge.
	pub peer: String,
	/// Label of the peer node.
	pub peer_label: String,
}

/// Body of the expanded view.
#[derive(Clone, Debug, PartialEq)]
pub enum ModalContent {
	/// A node with its edges split by direction.
	Node {
		/// The node itself.
		details: NodeDetails,
		/// Edges pointing at the node.
		incoming: Vec<EdgeSummary>,
		/// Edges leaving the node.
		outgoing: Vec<EdgeSummary>,
	},
	/// A single edge.
	Edge {
		/// The edge itself.
		details: EdgeDetails,
	},
}

/// Content of an open panel; the variant decides its kind.
#[derive(Clone, Debug, PartialEq)]
pub enum OverlayPayload {
	/// Node info card.
	NodeInfo(NodeDetails),
	/// Edge info card.
	EdgeInfo(EdgeDetails),
	/// Context menu.
	ContextMenu(ContextMenuState),
	/// Expanded view.
	ExpandedModal(ModalContent),
	/// Toast text.
	KeyboardToast(String),
}

impl OverlayPayload {
	/// Kind of panel this payload opens.
	pub fn kind(&self) -> OverlayKind {
		match self {
			OverlayPayload::NodeInfo(_) => OverlayKind::NodeInfo,
			OverlayPayload::EdgeInfo(_) => OverlayKind::EdgeInfo,
			OverlayPayload::ContextMenu(_) => OverlayKind::ContextMenu,
			OverlayPayload::ExpandedModal(_) => OverlayKind::ExpandedModal,
			OverlayPayload::KeyboardToast(_) => OverlayKind::KeyboardToast,
		}
	}
}

/// One open panel.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayPanel {
	/// What it shows.
	pub payload: OverlayPayload,
	/// Open time in milliseconds.
	pub opened_at: u64,
	/// Its dismissal rules, fixed at open time.
	pub dismiss: DismissPolicy,
	/// Outside clicks only count once the opening action has finished.
	armed: bool,
}

impl OverlayPanel {
	/// Kind of this panel.
	pub fn kind(&self) -> OverlayKind {
		self.payload.kind()
	}
}

/// Owns every open overlay panel and enforces one live instance per kind.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayManager {
	panels: Vec<OverlayPanel>,
	surface_attached: bool,
}

impl Default for OverlayManager {
	fn default() -> Self {
		Self {
			panels: Vec::new(),
			surface_attached: true,
		}
	}
}

impl OverlayManager {
	/// Detaching the host surface also closes every panel.
	pub fn set_surface_attached(&mut self, attached: bool) {
		self.surface_attached = attached;
		if !attached {
			self.panels.clear();
		}
	}

	/// Whether panels can currently be shown.
	pub fn surface_attached(&self) -> bool {
		self.surface_attached
	}

	/// Opens `payload`, replacing any panel of the same kind. Opening one
	/// info panel closes the other.
	pub fn open(
		&mut self,
		payload: OverlayPayload,
		now: u64,
		config: &GraphConfig,
	) -> Result<(), OverlaySurfaceUnavailable> {
		if !self.surface_attached {
			return Err(OverlaySurfaceUnavailable);
		}
		let kind = payload.kind();
		self.close(kind);
		if let Some(other) = kind.excludes() {
			self.close(other);
		}
		self.panels.push(OverlayPanel {
			payload,
			opened_at: now,
			dismiss: kind.policy(now, config),
			armed: false,
		});
		Ok(())
	}

	/// Closes the panel of `kind`; returns whether one was open.
	pub fn close(&mut self, kind: OverlayKind) -> bool {
		let before = self.panels.len();
		self.panels.retain(|p| p.kind() != kind);
		self.panels.len() != before
	}

	/// The open panel of `kind`.
	pub fn get(&self, kind: OverlayKind) -> Option<&OverlayPanel> {
		self.panels.iter().find(|p| p.kind() == kind)
	}

	/// Whether a panel of `kind` is open.
	pub fn is_open(&self, kind: OverlayKind) -> bool {
		self.get(kind).is_some()
	}

	/// Open panels in the order they were opened.
	pub fn panels(&self) -> &[OverlayPanel] {
		&self.panels
	}

	/// Number of open panels.
	pub fn len(&self) -> usize {
		self.panels.len()
	}

	/// Whether nothing is open.
	pub fn is_empty(&self) -> bool {
		self.panels.is_empty()
	}

	/// Closes every panel whose auto-dismiss deadline has passed.
	pub fn expire(&mut self, now: u64) -> Vec<OverlayKind> {
		self.close_where(|p| p.dismiss.expires_at.is_some_and(|t| now >= t))
	}

	/// A click on the panel itself.
	pub fn self_click(&mut self, kind: OverlayKind) -> bool {
		match self.get(kind) {
			Some(panel) if panel.dismiss.on_self_click => self.close(kind),
			_ => false,
		}
	}

	/// A click that landed anywhere other than `except`. Each panel listens
	/// for one such click after it was armed.
	pub fn outside_click(&mut self, except: Option<OverlayKind>) -> Vec<OverlayKind> {
		self.close_where(|p| p.armed && p.dismiss.on_outside_click && Some(p.kind()) != except)
	}

	/// Closes every panel that Escape dismisses.
	pub fn escape(&mut self) -> Vec<OverlayKind> {
		self.close_where(|p| p.dismiss.on_escape)
	}

	/// Called once the triggering action is complete.
	pub fn arm(&mut self) {
		for panel in &mut self.panels {
			panel.armed = true;
		}
	}

	/// Closes everything.
	pub fn clear(&mut self) -> Vec<OverlayKind> {
		self.panels.drain(..).map(|p| p.kind()).collect()
	}

	/// Earliest auto-dismiss deadline.
	pub fn next_deadline(&self) -> Option<u64> {
		self.panels.iter().filter_map(|p| p.dismiss.expires_at).min()
	}

	fn close_where(&mut self, pred: impl Fn(&OverlayPanel) -> bool) -> Vec<OverlayKind> {
		let mut closed = Vec::new();
		self.panels.retain(|p| {
			if pred(p) {
				closed.push(p.kind());
				false
			} else {
				true
			}
		});
		closed
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node_info(id: &str) -> OverlayPayload {
		OverlayPayload::NodeInfo(NodeDetails {
			id: id.into(),
			kind: "user".into(),
			label: id.into(),
			data: BTreeMap::new(),
		})
	}

	fn edge_info(id: &str) -> OverlayPayload {
		OverlayPayload::EdgeInfo(EdgeDetails {
			id: id.into(),
			kind: "owns".into(),
			label: "owns".into(),
			source: "a".into(),
			source_label: "A".into(),
			target: "b".into(),
			target_label: "B".into(),
		})
	}

	#[test]
	fn reopening_replaces_instead_of_stacking() {
		let config = GraphConfig::default();
		let mut overlays = OverlayManager::default();
		overlays.open(node_info("a"), 0, &config).unwrap();
		overlays.open(node_info("b"), 10, &config).unwrap();
		assert_eq!(overlays.len(), 1);
		match &overlays.get(OverlayKind::NodeInfo).unwrap().payload {
			OverlayPayload::NodeInfo(details) => assert_eq!(details.id, "b"),
			other => panic!("unexpected payload {other:?}"),
		}
	}

	#[test]
	fn info_panels_exclude_each_other() {
		let config = GraphConfig::default();
		let mut overlays = OverlayManager::default();
		overlays.open(node_info("a"), 0, &config).unwrap();
		overlays.open(edge_info("e"), 0, &config).unwrap();
		assert!(!overlays.is_open(OverlayKind::NodeInfo));
		assert!(overlays.is_open(OverlayKind::EdgeInfo));
		overlays
			.open(OverlayPayload::KeyboardToast("Zoom in (+)".into()), 0, &config)
			.unwrap();
		assert_eq!(overlays.len(), 2);
	}

	#[test]
	fn auto_dismiss_deadlines() {
		let config = GraphConfig::default();
		let mut overlays = OverlayManager::default();
		overlays.open(node_info("a"), 1_000, &config).unwrap();
		overlays
			.open(OverlayPayload::KeyboardToast("x".into()), 1_000, &config)
			.unwrap();
		assert_eq!(overlays.next_deadline(), Some(2_500));
		assert!(overlays.expire(2_499).is_empty());
		assert_eq!(overlays.expire(2_500), vec![OverlayKind::KeyboardToast]);
		assert_eq!(overlays.expire(11_000), vec![OverlayKind::NodeInfo]);
		assert!(overlays.is_empty());
	}

	#[test]
	fn outside_click_waits_until_armed() {
		let config = GraphConfig::default();
		let mut overlays = OverlayManager::default();
		overlays.open(node_info("a"), 0, &config).unwrap();
		assert!(overlays.outside_click(None).is_empty());
		overlays.arm();
		assert_eq!(overlays.outside_click(None), vec![OverlayKind::NodeInfo]);
	}

	#[test]
	fn escape_closes_menu_and_modal_only() {
		let config = GraphConfig::default();
		let mut overlays = OverlayManager::default();
		overlays.open(node_info("a"), 0, &config).unwrap();
		overlays
			.open(
				OverlayPayload::ContextMenu(ContextMenuState {
					target: super::super::types::Target::Background,
					position: Default::default(),
					items: Vec::new(),
				}),
				0,
				&config,
			)
			.unwrap();
		assert_eq!(overlays.escape(), vec![OverlayKind::ContextMenu]);
		assert!(overlays.is_open(OverlayKind::NodeInfo));
	}

	#[test]
	fn modal_ignores_clicks_on_itself() {
		let config = GraphConfig::default();
		let mut overlays = OverlayManager::default();
		overlays
			.open(
				OverlayPayload::ExpandedModal(ModalContent::Edge {
					details: match edge_info("e") {
						OverlayPayload::EdgeInfo(d) => d,
						_ => unreachable!(),
					},
				}),
				0,
				&config,
			)
			.unwrap();
		assert!(!overlays.self_click(OverlayKind::ExpandedModal));
		assert!(!overlays.self_click(OverlayKind::ContextMenu));
		assert!(overlays.is_open(OverlayKind::ExpandedModal));
	}

	#[test]
	fn missing_surface_is_a_no_op() {
		let config = GraphConfig::default();
		let mut overlays = OverlayManager::default();
		overlays.set_surface_attached(false);
		assert_eq!(
			overlays.open(node_info("a"), 0, &config),
			Err(OverlaySurfaceUnavailable)
		);
		assert!(overlays.is_empty());
	}
}
