//! Pointer, key and overlay events reduced to the next interaction state plus
//! the commands the surface adapter runs against the rendering engine.

use std::collections::BTreeSet;
use std::fmt;

use log::debug;

use super::config::GraphConfig;
use super::context_menu::{self, ContextMenuState, MenuAction};
use super::keyboard::{self, KeyInput, Modifiers, Shortcut};
use super::overlay::{
	EdgeDetails, EdgeSummary, ModalContent, NodeDetails, OverlayKind, OverlayManager,
	OverlayPayload,
};
use super::selection::{Highlights, SelectionSet};
use super::style::{ElementStyle, HiddenLedger, VisualState, resolve_style};
use super::types::{Point, RenderableEdge, RenderableNode, Size, Target};
use super::validate::GraphIndex;

/// Input to the reducer, already translated from the DOM.
#[derive(Clone, Debug, PartialEq)]
pub enum InteractionEvent {
	/// Pointer moved onto an element.
	HoverEnter(Target),
	/// Pointer left an element.
	HoverLeave(Target),
	/// Primary click.
	Tap {
		/// Element under the pointer, or the background.
		target: Target,
		/// Keys held during the click.
		modifiers: Modifiers,
	},
	/// Context-menu trigger; `at` is in viewport coordinates.
	SecondaryTap {
		/// Element under the pointer, or the background.
		target: Target,
		/// Where the menu opens.
		at: Point,
	},
	/// Double click; opens the expanded view.
	DoubleTap(Target),
	/// Key press anywhere on the page.
	Key(KeyInput),
	/// A click inside an overlay panel.
	PanelClick(OverlayKind),
	/// Backdrop or close control of the expanded modal.
	DismissModal,
	/// A click on the page outside the canvas and every panel.
	OutsideClick,
	/// An enabled context menu entry was chosen.
	Menu(MenuAction),
	/// The visible viewport changed size.
	Resize(Size),
	/// Clock advance; expires highlights and panels.
	Tick,
}

/// What a fit should frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FitTarget {
	/// Every visible element.
	All,
	/// Only these ids.
	Elements(Vec<String>),
}

/// Side effect requested by the reducer.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
	/// Keep the triggering DOM event from bubbling further.
	StopPropagation,
	/// Suppress the browser's default action for the event.
	PreventDefault,
	/// Apply a freshly resolved style to one element.
	Restyle {
		/// Element to restyle.
		id: String,
		/// Its new style.
		style: ElementStyle,
	},
	/// Move the view by a screen-space offset.
	PanBy {
		/// Horizontal offset in pixels.
		dx: f64,
		/// Vertical offset in pixels.
		dy: f64,
	},
	/// Zoom about the surface centre, within the configured bounds.
	ZoomBy(f64),
	/// Back to zoom 1 with no offset.
	ResetZoom,
	/// Frame the given elements on the surface.
	Fit {
		/// Elements to frame.
		target: FitTarget,
		/// Margin kept around them.
		padding: f64,
	},
	/// Centre the graph at the current zoom.
	Center,
	/// Centre on one node at the focus zoom level.
	ZoomToNode(String),
	/// Structured record of the action, for the host's log.
	Log(ActionLog),
}

/// Structured record of one user action.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionLog {
	/// Stable action name such as `tap-node`.
	pub action: &'static str,
	/// Element acted on, if any.
	pub target: Option<String>,
	/// Selection size after the action.
	pub selected: usize,
}

impl fmt::Display for ActionLog {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"action={} target={} selected={}",
			self.action,
			self.target.as_deref().unwrap_or("-"),
			self.selected
		)
	}
}

/// Everything interaction-related that outlives a single event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractionState {
	/// Ordered set of selected element ids.
	pub selection: SelectionSet,
	/// Temporary highlights with their revert deadlines.
	pub highlights: Highlights,
	/// Element currently under the pointer.
	pub hovered: Option<String>,
	/// Elements hidden from the current set.
	pub hidden: HiddenLedger,
	/// Open panels and their dismissal rules.
	pub overlays: OverlayManager,
	/// Visible viewport, used to keep the context menu on screen.
	pub viewport: Size,
}

impl InteractionState {
	/// Empty state for a viewport of the given size.
	pub fn new(viewport: Size) -> Self {
		Self {
			viewport,
			..Default::default()
		}
	}

	/// Every style flag that applies to `id` at `now`.
	pub fn visual(&self, id: &str, now: u64) -> VisualState {
		VisualState {
			hidden: self.hidden.contains(id),
			highlighted: self.highlights.is_active(id, now),
			hovered: self.hovered.as_deref() == Some(id),
			selected: self.selection.contains(id),
		}
	}

	/// Resolved style of `id` at `now`.
	pub fn style_of(&self, id: &str, now: u64) -> ElementStyle {
		resolve_style(self.visual(id, now))
	}

	/// Forgets everything tied to the current element set.
	pub fn reset(&mut self) {
		self.selection.clear();
		self.highlights.clear();
		self.hovered = None;
		self.hidden = HiddenLedger::default();
		self.overlays.clear();
	}

	/// Earliest pending highlight revert or panel dismissal.
	pub fn next_deadline(&self) -> Option<u64> {
		match (self.highlights.next_deadline(), self.overlays.next_deadline()) {
			(Some(a), Some(b)) => Some(a.min(b)),
			(a, b) => a.or(b),
		}
	}
}

/// Result of one reducer step.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
	/// State to swap in.
	pub next: InteractionState,
	/// Commands to run, in order.
	pub commands: Vec<Command>,
}

/// Pure reducer: `state` is never mutated, the caller swaps in `next`.
///
/// For a click on an element the command order is fixed: stop-propagation,
/// restyles (highlight plus selection), then the log entry; overlay changes
/// land in `next` between the restyles and the log.
pub fn reduce(
	state: &InteractionState,
	graph: &GraphIndex,
	config: &GraphConfig,
	event: &InteractionEvent,
	now: u64,
) -> Transition {
	let mut reducer = Reducer {
		state: state.clone(),
		graph,
		config,
		now,
		commands: Vec::new(),
	};
	reducer.apply(event);
	Transition {
		next: reducer.state,
		commands: reducer.commands,
	}
}

struct Reducer<'a> {
	state: InteractionState,
	graph: &'a GraphIndex,
	config: &'a GraphConfig,
	now: u64,
	commands: Vec<Command>,
}

impl Reducer<'_> {
	fn apply(&mut self, event: &InteractionEvent) {
		match event {
			InteractionEvent::Tick => self.tick(),
			InteractionEvent::HoverEnter(target) => self.hover_enter(target),
			InteractionEvent::HoverLeave(target) => self.hover_leave(target),
			InteractionEvent::Tap { target, modifiers } => match target {
				Target::Background => self.background_tap(),
				_ => self.element_tap(target, *modifiers),
			},
			InteractionEvent::SecondaryTap { target, at } => self.secondary_tap(target, *at),
			InteractionEvent::DoubleTap(target) => self.double_tap(target),
			InteractionEvent::Key(input) => self.key(input),
			InteractionEvent::PanelClick(kind) => {
				self.state.overlays.self_click(*kind);
				self.state.overlays.outside_click(Some(*kind));
				self.state.overlays.arm();
			}
			InteractionEvent::DismissModal => {
				self.state.overlays.close(OverlayKind::ExpandedModal);
			}
			InteractionEvent::OutsideClick => {
				self.state.overlays.outside_click(None);
				self.state.overlays.arm();
			}
			InteractionEvent::Menu(action) => self.menu(*action),
			InteractionEvent::Resize(size) => self.state.viewport = *size,
		}
	}

	fn is_visible(&self, id: &str) -> bool {
		self.graph.get(id).is_some() && !self.state.hidden.contains(id)
	}

	fn visible_element<'t>(&self, target: &'t Target) -> Option<&'t str> {
		target.element_id().filter(|id| self.is_visible(id))
	}

	fn restyle<I, S>(&mut self, ids: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let ids: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
		for id in ids {
			if self.graph.get(&id).is_none() {
				continue;
			}
			let style = self.state.style_of(&id, self.now);
			self.commands.push(Command::Restyle { id, style });
		}
	}

	fn open(&mut self, payload: OverlayPayload) {
		let kind = payload.kind();
		// no attached surface: nothing to show, nothing to fail
		if let Err(err) = self.state.overlays.open(payload, self.now, self.config) {
			debug!("{:?} not shown: {}", kind, err);
		}
	}

	fn log(&mut self, action: &'static str, target: Option<&str>) {
		self.commands.push(Command::Log(ActionLog {
			action,
			target: target.map(str::to_string),
			selected: self.state.selection.len(),
		}));
	}

	fn tick(&mut self) {
		let expired = self.state.highlights.expire(self.now);
		self.restyle(expired);
		self.state.overlays.expire(self.now);
	}

	fn hover_enter(&mut self, target: &Target) {
		let Some(id) = self.visible_element(target) else {
			return;
		};
		let previous = self.state.hovered.replace(id.to_string());
		self.restyle(previous.into_iter().chain([id.to_string()]));
	}

	fn hover_leave(&mut self, target: &Target) {
		let Some(id) = target.element_id() else {
			return;
		};
		if self.state.hovered.as_deref() == Some(id) {
			self.state.hovered = None;
			self.restyle([id]);
		}
	}

	fn background_tap(&mut self) {
		let cleared = self.state.selection.clear();
		self.restyle(cleared);
		self.state.overlays.outside_click(None);
		self.state.overlays.close(OverlayKind::NodeInfo);
		self.state.overlays.close(OverlayKind::EdgeInfo);
		self.log("tap-background", None);
		self.state.overlays.arm();
	}

	fn element_tap(&mut self, target: &Target, modifiers: Modifiers) {
		let Some(id) = self.visible_element(target) else {
			return;
		};
		self.commands.push(Command::StopPropagation);
		self.state
			.highlights
			.start(id, self.now, self.config.highlight_ms);
		let mut changed = self.state.selection.click(id, modifiers.is_multi_select());
		changed.push(id.to_string());
		self.restyle(changed);
		self.state.overlays.outside_click(None);
		if let Some(payload) = self.info_payload(target) {
			self.open(payload);
		}
		let action = match target {
			Target::Node(_) => "tap-node",
			_ => "tap-edge",
		};
		self.log(action, Some(id));
		self.state.overlays.arm();
	}

	fn secondary_tap(&mut self, target: &Target, at: Point) {
		let target = match target.element_id() {
			Some(id) if !self.is_visible(id) => return,
			Some(_) => {
				self.commands.push(Command::StopPropagation);
				target.clone()
			}
			None => Target::Background,
		};
		self.commands.push(Command::PreventDefault);
		self.state.overlays.outside_click(None);
		let items = context_menu::build_menu(&target, &self.state.hidden);
		let size = context_menu::menu_size(&items, self.config);
		let position = context_menu::clamp_to_viewport(
			at,
			size,
			self.state.viewport,
			self.config.menu_margin,
		);
		let logged = target.element_id().map(str::to_string);
		self.open(OverlayPayload::ContextMenu(ContextMenuState {
			target,
			position,
			items,
		}));
		self.log("context-menu", logged.as_deref());
		self.state.overlays.arm();
	}

	fn double_tap(&mut self, target: &Target) {
		let Some(id) = self.visible_element(target) else {
			return;
		};
		self.commands.push(Command::StopPropagation);
		self.state.overlays.outside_click(None);
		let (content, focus) = match target {
			Target::Node(_) => {
				let Some(node) = self.graph.node(id) else {
					return;
				};
				let focus: Vec<String> = self
					.graph
					.neighborhood(id)
					.into_iter()
					.filter(|x| self.graph.node(x).is_some() && self.is_visible(x))
					.collect();
				(self.node_modal(node), focus)
			}
			_ => {
				let Some(edge) = self.graph.edge(id) else {
					return;
				};
				let details = self.edge_details(edge);
				let focus = vec![edge.source.clone(), edge.target.clone()];
				(ModalContent::Edge { details }, focus)
			}
		};
		self.open(OverlayPayload::ExpandedModal(content));
		self.commands.push(Command::Fit {
			target: FitTarget::Elements(focus),
			padding: self.config.modal_fit_padding,
		});
		self.log("expand", Some(id));
		self.state.overlays.arm();
	}

	fn key(&mut self, input: &KeyInput) {
		let Some(shortcut) = keyboard::route(input) else {
			return;
		};
		self.commands.push(Command::PreventDefault);
		match shortcut {
			Shortcut::Pan(direction) => {
				let (ux, uy) = direction.delta();
				self.commands.push(Command::PanBy {
					dx: ux * self.config.pan_step,
					dy: uy * self.config.pan_step,
				});
			}
			Shortcut::ZoomIn => self.commands.push(Command::ZoomBy(self.config.zoom_step)),
			Shortcut::ZoomOut => self
				.commands
				.push(Command::ZoomBy(1.0 / self.config.zoom_step)),
			Shortcut::ResetZoom => self.commands.push(Command::ResetZoom),
			Shortcut::FitAll => self.commands.push(Command::Fit {
				target: FitTarget::All,
				padding: self.config.fit_padding,
			}),
			Shortcut::ClearSelection => {
				let cleared = self.state.selection.clear();
				self.restyle(cleared);
				self.state.overlays.escape();
				self.state.overlays.close(OverlayKind::NodeInfo);
				self.state.overlays.close(OverlayKind::EdgeInfo);
			}
			Shortcut::SelectAll => {
				let all: Vec<String> = self
					.graph
					.ids()
					.filter(|id| !self.state.hidden.contains(id))
					.map(str::to_string)
					.collect();
				let changed = self.state.selection.replace(all);
				self.restyle(changed);
			}
		}
		self.open(OverlayPayload::KeyboardToast(keyboard::feedback_message(
			shortcut, input,
		)));
		self.log(shortcut.description(), None);
		self.state.overlays.arm();
	}

	fn menu(&mut self, action: MenuAction) {
		let menu = match self.state.overlays.get(OverlayKind::ContextMenu) {
			Some(panel) => match &panel.payload {
				OverlayPayload::ContextMenu(menu) => menu.clone(),
				_ => return,
			},
			None => return,
		};
		if !menu.allows(action) {
			return;
		}
		self.state.overlays.close(OverlayKind::ContextMenu);
		let target = menu.target;
		let id = target.element_id();
		match (action, id) {
			(MenuAction::ViewDetails | MenuAction::ViewEdgeDetails, Some(_)) => {
				if let Some(payload) = self.info_payload(&target) {
					self.open(payload);
				}
			}
			(MenuAction::ZoomToNode, Some(id)) => {
				self.commands.push(Command::ZoomToNode(id.to_string()));
			}
			(MenuAction::SelectConnected, Some(id)) => {
				let hood: Vec<String> = self
					.graph
					.neighborhood(id)
					.into_iter()
					.filter(|x| self.is_visible(x))
					.collect();
				let changed = self.state.selection.replace(hood);
				self.restyle(changed);
			}
			(MenuAction::SelectEndpoints, Some(id)) => {
				let Some(edge) = self.graph.edge(id) else {
					return;
				};
				let ends: Vec<String> = [edge.source.clone(), edge.target.clone()]
					.into_iter()
					.filter(|x| self.is_visible(x))
					.collect();
				let changed = self.state.selection.replace(ends);
				self.restyle(changed);
			}
			(MenuAction::HideNode, Some(id)) => {
				let mut ids = vec![id.to_string()];
				ids.extend(self.graph.connected_edges(id));
				self.hide(ids);
			}
			(MenuAction::HideEdge, Some(id)) => self.hide(vec![id.to_string()]),
			(MenuAction::ZoomToFit, None) => self.commands.push(Command::Fit {
				target: FitTarget::All,
				padding: self.config.fit_padding,
			}),
			(MenuAction::CenterGraph, None) => self.commands.push(Command::Center),
			(MenuAction::ClearSelections, None) => {
				let cleared = self.state.selection.clear();
				self.restyle(cleared);
			}
			(MenuAction::ShowAll, None) => {
				let restored = self.state.hidden.show_all();
				self.restyle(restored);
			}
			_ => return,
		}
		self.log(action.key(), id);
		self.state.overlays.arm();
	}

	fn hide(&mut self, ids: Vec<String>) {
		let newly = self.state.hidden.hide(ids);
		for id in &newly {
			self.state.selection.remove(id);
			if self.state.hovered.as_deref() == Some(id) {
				self.state.hovered = None;
			}
		}
		self.restyle(newly);
	}

	fn label_of(&self, id: &str) -> String {
		self.graph
			.get(id)
			.map(|e| e.display_label().to_string())
			.unwrap_or_default()
	}

	fn node_details(&self, node: &RenderableNode) -> NodeDetails {
		NodeDetails {
			id: node.id.clone(),
			kind: node.kind.clone(),
			label: node.display_label.clone(),
			data: node.data.clone(),
		}
	}

	fn edge_details(&self, edge: &RenderableEdge) -> EdgeDetails {
		EdgeDetails {
			id: edge.id.clone(),
			kind: edge.kind.clone(),
			label: edge.display_label.clone(),
			source: edge.source.clone(),
			source_label: self.label_of(&edge.source),
			target: edge.target.clone(),
			target_label: self.label_of(&edge.target),
		}
	}

	fn info_payload(&self, target: &Target) -> Option<OverlayPayload> {
		match target {
			Target::Node(id) => self
				.graph
				.node(id)
				.map(|n| OverlayPayload::NodeInfo(self.node_details(n))),
			Target::Edge(id) => self
				.graph
				.edge(id)
				.map(|e| OverlayPayload::EdgeInfo(self.edge_details(e))),
			Target::Background => None,
		}
	}

	fn node_modal(&self, node: &RenderableNode) -> ModalContent {
		let summarize = |edge_ids: &[String], incoming: bool| -> Vec<EdgeSummary> {
			edge_ids
				.iter()
				.filter_map(|eid| self.graph.edge(eid))
				.map(|edge| {
					let peer = if incoming { &edge.source } else { &edge.target };
					EdgeSummary {
						id: edge.id.clone(),
						label: edge.display_label.clone(),
						peer: peer.clone(),
						peer_label: self.label_of(peer),
					}
				})
				.collect()
		};
		ModalContent::Node {
			details: self.node_details(node),
			incoming: summarize(self.graph.incoming(&node.id), true),
			outgoing: summarize(self.graph.outgoing(&node.id), false),
		}
	}
}
