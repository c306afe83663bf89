//! Lifecycle of the rendering engine behind one mounted graph surface, and
//! the session that routes interaction events through the reducer into it.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use log::{debug, error, info};

use super::config::{GraphConfig, ZoomBounds};
use super::dispatch::{Command, FitTarget, InteractionEvent, InteractionState, reduce};
use super::error::{RenderEngineInitError, SurfaceError};
use super::overlay::OverlayManager;
use super::style::ElementStyle;
use super::types::{GraphData, Point, RenderableElement, Size, Target};
use super::validate::{GraphIndex, ValidationReport, validate_graph};

/// The operations the session needs from a concrete rendering engine.
pub trait RenderEngine {
	/// Repaints one element with `style`.
	fn apply_style(&mut self, id: &str, style: ElementStyle);
	/// Moves the view by a screen-space offset.
	fn pan_by(&mut self, dx: f64, dy: f64);
	/// Zooms by `factor` keeping `anchor` fixed on screen.
	fn zoom_at(&mut self, anchor: Point, factor: f64, bounds: ZoomBounds);
	/// Zooms by `factor` about the surface centre.
	fn zoom_by(&mut self, factor: f64, bounds: ZoomBounds);
	/// Zoom 1, no offset.
	fn reset_zoom(&mut self);
	/// Frames `target` with `padding` around it.
	fn fit(&mut self, target: &FitTarget, padding: f64, bounds: ZoomBounds);
	/// Centres the graph at the current zoom.
	fn center(&mut self);
	/// Centres on node `id`; false if it is not part of the layout.
	fn zoom_to_node(&mut self, id: &str, zoom: f64, bounds: ZoomBounds) -> bool;
	/// The drawing surface changed size.
	fn resize(&mut self, size: Size);
	/// Topmost visible element at a surface point.
	fn hit_test(&self, at: Point) -> Target;
	/// Advances layout and repaints.
	fn frame(&mut self, dt: f32);
	/// Releases everything the engine holds. Called exactly once.
	fn destroy(&mut self);
}

/// Builds engines; construction may fail or panic.
pub trait EngineFactory {
	/// The engine this factory builds.
	type Engine: RenderEngine;

	/// Builds an engine for `elements` on a surface of `size`.
	fn create(
		&mut self,
		elements: &[RenderableElement],
		size: Size,
		config: &GraphConfig,
	) -> Result<Self::Engine, RenderEngineInitError>;
}

/// Lifecycle state of a surface.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceStatus {
	/// Never mounted, or torn down.
	Unmounted,
	/// Mounted with zero elements: an empty canvas, not an error.
	Empty,
	/// An engine is alive.
	Ready,
	/// Construction failed; the surface shows the error instead.
	Failed {
		/// What went wrong.
		error: RenderEngineInitError,
		/// When it happened.
		at_ms: u64,
	},
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"unknown panic".to_string()
	}
}

/// Owns at most one engine instance at a time.
pub struct SurfaceAdapter<F: EngineFactory> {
	factory: F,
	engine: Option<F::Engine>,
	status: SurfaceStatus,
	generation: u64,
	size: Size,
}

impl<F: EngineFactory> SurfaceAdapter<F> {
	/// Adapter with no engine yet.
	pub fn new(factory: F, size: Size) -> Self {
		Self {
			factory,
			engine: None,
			status: SurfaceStatus::Unmounted,
			generation: 0,
			size,
		}
	}

	/// Destroys the current engine unconditionally, then builds a new one if
	/// there is anything to draw. Construction errors and panics come back
	/// as a typed error; nothing is retried.
	pub fn mount(
		&mut self,
		elements: &[RenderableElement],
		config: &GraphConfig,
		now: u64,
	) -> Result<(), RenderEngineInitError> {
		self.destroy_engine();
		self.generation += 1;
		if elements.is_empty() {
			self.status = SurfaceStatus::Empty;
			return Ok(());
		}
		let size = self.size;
		let factory = &mut self.factory;
		let built = panic::catch_unwind(AssertUnwindSafe(|| factory.create(elements, size, config)))
			.unwrap_or_else(|payload| Err(RenderEngineInitError::Panicked(panic_message(payload))));
		match built {
			Ok(engine) => {
				info!(
					"rendering engine mounted: {} elements, generation {}",
					elements.len(),
					self.generation
				);
				self.engine = Some(engine);
				self.status = SurfaceStatus::Ready;
				Ok(())
			}
			Err(err) => {
				error!("{}", err);
				self.status = SurfaceStatus::Failed {
					error: err.clone(),
					at_ms: now,
				};
				Err(err)
			}
		}
	}

	/// Destroys the engine and invalidates every pending callback.
	pub fn unmount(&mut self) {
		self.destroy_engine();
		self.generation += 1;
		self.status = SurfaceStatus::Unmounted;
	}

	fn destroy_engine(&mut self) {
		if let Some(mut engine) = self.engine.take() {
			engine.destroy();
			info!("rendering engine destroyed (generation {})", self.generation);
		}
	}

	/// Current lifecycle state.
	pub fn status(&self) -> &SurfaceStatus {
		&self.status
	}

	/// Bumped on every mount and unmount.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Rejects callbacks scheduled against an earlier element set.
	pub fn ensure_current(&self, token: u64) -> Result<(), SurfaceError> {
		if token != self.generation {
			return Err(SurfaceError::Stale {
				expected: self.generation,
				found: token,
			});
		}
		if self.engine.is_none() {
			return Err(SurfaceError::NotMounted);
		}
		Ok(())
	}

	/// The live engine.
	pub fn engine(&self) -> Option<&F::Engine> {
		self.engine.as_ref()
	}

	/// The live engine, mutably.
	pub fn engine_mut(&mut self) -> Option<&mut F::Engine> {
		self.engine.as_mut()
	}

	/// Current surface size.
	pub fn size(&self) -> Size {
		self.size
	}

	/// Records the new size and forwards it to the engine.
	pub fn resize(&mut self, size: Size) {
		self.size = size;
		if let Some(engine) = self.engine.as_mut() {
			engine.resize(size);
		}
	}
}

impl<F: EngineFactory> Drop for SurfaceAdapter<F> {
	fn drop(&mut self) {
		self.destroy_engine();
	}
}

/// Flags the host must apply to the DOM event that caused a dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
	/// Call `stopPropagation` on the event.
	pub stop_propagation: bool,
	/// Call `preventDefault` on the event.
	pub prevent_default: bool,
}

/// One mounted surface: validated graph, interaction state and engine.
pub struct Session<F: EngineFactory> {
	adapter: SurfaceAdapter<F>,
	index: GraphIndex,
	state: InteractionState,
	config: GraphConfig,
	report: ValidationReport,
}

impl<F: EngineFactory> Session<F> {
	/// Session with nothing loaded.
	pub fn new(factory: F, surface: Size, viewport: Size, config: GraphConfig) -> Self {
		Self {
			adapter: SurfaceAdapter::new(factory, surface),
			index: GraphIndex::default(),
			state: InteractionState::new(viewport),
			config,
			report: ValidationReport::default(),
		}
	}

	/// Replaces the whole element set. Selection, highlights, hidden ids and
	/// every overlay belong to the old set and are dropped with its engine.
	pub fn load(&mut self, data: &GraphData, now: u64) -> Result<(), RenderEngineInitError> {
		let report = validate_graph(&data.nodes, &data.edges);
		self.state.reset();
		self.index = GraphIndex::new(report.elements.clone());
		self.report = report;
		self.adapter
			.mount(self.index.elements(), &self.config, now)
	}

	/// Runs one event through the reducer and executes its commands.
	pub fn handle(&mut self, event: InteractionEvent, now: u64) -> Outcome {
		let transition = reduce(&self.state, &self.index, &self.config, &event, now);
		self.state = transition.next;
		self.execute(transition.commands)
	}

	fn execute(&mut self, commands: Vec<Command>) -> Outcome {
		let mut outcome = Outcome::default();
		let bounds = self.config.zoom_bounds();
		for command in commands {
			match command {
				Command::StopPropagation => outcome.stop_propagation = true,
				Command::PreventDefault => outcome.prevent_default = true,
				Command::Log(entry) => info!("{}", entry),
				other => {
					let Some(engine) = self.adapter.engine_mut() else {
						continue;
					};
					match other {
						Command::Restyle { id, style } => engine.apply_style(&id, style),
						Command::PanBy { dx, dy } => engine.pan_by(dx, dy),
						Command::ZoomBy(factor) => engine.zoom_by(factor, bounds),
						Command::ResetZoom => engine.reset_zoom(),
						Command::Fit { target, padding } => engine.fit(&target, padding, bounds),
						Command::Center => engine.center(),
						Command::ZoomToNode(id) => {
							engine.zoom_to_node(&id, self.config.focus_zoom, bounds);
						}
						Command::StopPropagation | Command::PreventDefault | Command::Log(_) => {}
					}
				}
			}
		}
		outcome
	}

	/// Animation-frame callback for the element set of generation `token`.
	/// Empty and failed surfaces still tick so panels and toasts expire.
	pub fn frame(&mut self, token: u64, now: u64) -> Result<(), SurfaceError> {
		match self.adapter.ensure_current(token) {
			Err(SurfaceError::NotMounted)
				if *self.adapter.status() != SurfaceStatus::Unmounted => {}
			other => other?,
		}
		self.handle(InteractionEvent::Tick, now);
		if let Some(engine) = self.adapter.engine_mut() {
			engine.frame(self.config.layout.tick_seconds);
		}
		Ok(())
	}

	/// Pointer moved over the surface: hover leaves the old element and
	/// enters the new one.
	pub fn pointer_move(&mut self, at: Point, now: u64) {
		let hit = self.hit_test(at);
		let current = self.state.hovered.as_deref().and_then(|id| {
			if self.index.node(id).is_some() {
				Some(Target::Node(id.to_string()))
			} else {
				self.index.edge(id).map(|_| Target::Edge(id.to_string()))
			}
		});
		if current.as_ref() == Some(&hit) {
			return;
		}
		if let Some(previous) = current {
			self.handle(InteractionEvent::HoverLeave(previous), now);
		}
		if hit != Target::Background {
			self.handle(InteractionEvent::HoverEnter(hit), now);
		}
	}

	/// Pointer left the surface.
	pub fn pointer_leave(&mut self, now: u64) {
		if let Some(id) = self.state.hovered.clone() {
			let target = if self.index.node(&id).is_some() {
				Target::Node(id)
			} else {
				Target::Edge(id)
			};
			self.handle(InteractionEvent::HoverLeave(target), now);
		}
	}

	/// What is under a surface point; background when nothing is mounted.
	pub fn hit_test(&self, at: Point) -> Target {
		self.adapter
			.engine()
			.map(|e| e.hit_test(at))
			.unwrap_or(Target::Background)
	}

	/// Drag-pan.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		if let Some(engine) = self.adapter.engine_mut() {
			engine.pan_by(dx, dy);
		}
	}

	/// Wheel zoom around the pointer.
	pub fn wheel_zoom(&mut self, anchor: Point, factor: f64) {
		let bounds = self.config.zoom_bounds();
		if let Some(engine) = self.adapter.engine_mut() {
			engine.zoom_at(anchor, factor, bounds);
		}
	}

	/// Surface and viewport changed size.
	pub fn resize(&mut self, surface: Size, viewport: Size, now: u64) {
		self.adapter.resize(surface);
		self.handle(InteractionEvent::Resize(viewport), now);
	}

	/// Fits every visible element.
	pub fn zoom_to_fit(&mut self) {
		let (padding, bounds) = (self.config.fit_padding, self.config.zoom_bounds());
		if let Some(engine) = self.adapter.engine_mut() {
			engine.fit(&FitTarget::All, padding, bounds);
		}
	}

	/// Centres the graph.
	pub fn center_graph(&mut self) {
		if let Some(engine) = self.adapter.engine_mut() {
			engine.center();
		}
	}

	/// Resets to zoom 1.
	pub fn reset_zoom(&mut self) {
		if let Some(engine) = self.adapter.engine_mut() {
			engine.reset_zoom();
		}
	}

	/// Focuses one visible node; false when hidden or unknown.
	pub fn zoom_to_node(&mut self, id: &str) -> bool {
		if self.state.hidden.contains(id) {
			return false;
		}
		let (zoom, bounds) = (self.config.focus_zoom, self.config.zoom_bounds());
		self.adapter
			.engine_mut()
			.is_some_and(|engine| engine.zoom_to_node(id, zoom, bounds))
	}

	/// Selected ids in selection order.
	pub fn selected_elements(&self) -> Vec<String> {
		self.state.selection.ids().to_vec()
	}

	/// Attaches or detaches the host surface for panels.
	pub fn set_overlay_surface(&mut self, attached: bool) {
		if !attached {
			debug!("no overlay surface attached, panels disabled");
		}
		self.state.overlays.set_surface_attached(attached);
	}

	/// Releases the engine and every timer and panel of this surface.
	pub fn unmount(&mut self) {
		self.adapter.unmount();
		self.state.reset();
	}

	/// Open panels.
	pub fn overlays(&self) -> &OverlayManager {
		&self.state.overlays
	}

	/// Full interaction state.
	pub fn state(&self) -> &InteractionState {
		&self.state
	}

	/// The validated element set.
	pub fn index(&self) -> &GraphIndex {
		&self.index
	}

	/// What validation kept and dropped.
	pub fn report(&self) -> &ValidationReport {
		&self.report
	}

	/// Surface lifecycle state.
	pub fn status(&self) -> &SurfaceStatus {
		self.adapter.status()
	}

	/// Current mount generation.
	pub fn generation(&self) -> u64 {
		self.adapter.generation()
	}

	/// The live engine.
	pub fn engine(&self) -> Option<&F::Engine> {
		self.adapter.engine()
	}
}

/// Imperative controls a parent can hold on to. Becomes inert once the
/// surface it was bound to is unmounted.
pub struct GraphHandle<F: EngineFactory> {
	slot: Rc<RefCell<Weak<RefCell<Option<Session<F>>>>>>,
}

impl<F: EngineFactory> Clone for GraphHandle<F> {
	fn clone(&self) -> Self {
		Self {
			slot: Rc::clone(&self.slot),
		}
	}
}

impl<F: EngineFactory> Default for GraphHandle<F> {
	fn default() -> Self {
		Self {
			slot: Rc::new(RefCell::new(Weak::new())),
		}
	}
}

impl<F: EngineFactory> GraphHandle<F> {
	/// An unbound handle; every call is a no-op until it is bound.
	pub fn new() -> Self {
		Self::default()
	}

	/// Points the handle at a live session.
	pub fn bind(&self, session: &Rc<RefCell<Option<Session<F>>>>) {
		*self.slot.borrow_mut() = Rc::downgrade(session);
	}

	fn with<R>(&self, f: impl FnOnce(&mut Session<F>) -> R) -> Option<R> {
		let session = self.slot.borrow().upgrade()?;
		let mut guard = session.try_borrow_mut().ok()?;
		guard.as_mut().map(f)
	}

	/// See [`Session::zoom_to_fit`].
	pub fn zoom_to_fit(&self) {
		self.with(Session::zoom_to_fit);
	}

	/// See [`Session::center_graph`].
	pub fn center_graph(&self) {
		self.with(Session::center_graph);
	}

	/// See [`Session::reset_zoom`].
	pub fn reset_zoom(&self) {
		self.with(Session::reset_zoom);
	}

	/// See [`Session::zoom_to_node`]; false when unbound.
	pub fn zoom_to_node(&self, id: &str) -> bool {
		self.with(|s| s.zoom_to_node(id)).unwrap_or(false)
	}

	/// See [`Session::selected_elements`]; empty when unbound.
	pub fn selected_elements(&self) -> Vec<String> {
		self.with(|s| s.selected_elements()).unwrap_or_default()
	}
}

#[cfg(test)]
pub(crate) mod fake {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;

	/// Records what the session asked the engine to do.
	#[derive(Debug, Default)]
	pub struct EngineLog {
		pub created: usize,
		pub destroyed: usize,
		pub live: usize,
		pub styles: Vec<(String, ElementStyle)>,
		pub calls: Vec<String>,
		pub frames: usize,
	}

	pub struct FakeEngine {
		log: Rc<RefCell<EngineLog>>,
		destroyed: bool,
		hit: Target,
	}

	impl RenderEngine for FakeEngine {
		fn apply_style(&mut self, id: &str, style: ElementStyle) {
			self.log.borrow_mut().styles.push((id.to_string(), style));
		}
		fn pan_by(&mut self, dx: f64, dy: f64) {
			self.log.borrow_mut().calls.push(format!("pan {dx} {dy}"));
		}
		fn zoom_at(&mut self, _: Point, factor: f64, _: ZoomBounds) {
			self.log.borrow_mut().calls.push(format!("zoom_at {factor}"));
		}
		fn zoom_by(&mut self, factor: f64, _: ZoomBounds) {
			self.log.borrow_mut().calls.push(format!("zoom {factor}"));
		}
		fn reset_zoom(&mut self) {
			self.log.borrow_mut().calls.push("reset".into());
		}
		fn fit(&mut self, target: &FitTarget, padding: f64, _: ZoomBounds) {
			self.log
				.borrow_mut()
				.calls
				.push(format!("fit {target:?} {padding}"));
		}
		fn center(&mut self) {
			self.log.borrow_mut().calls.push("center".into());
		}
		fn zoom_to_node(&mut self, id: &str, _: f64, _: ZoomBounds) -> bool {
			self.log.borrow_mut().calls.push(format!("zoom_to {id}"));
			true
		}
		fn resize(&mut self, size: Size) {
			self.log
				.borrow_mut()
				.calls
				.push(format!("resize {}x{}", size.width, size.height));
		}
		fn hit_test(&self, _: Point) -> Target {
			self.hit.clone()
		}
		fn frame(&mut self, _: f32) {
			self.log.borrow_mut().frames += 1;
		}
		fn destroy(&mut self) {
			if !self.destroyed {
				self.destroyed = true;
				let mut log = self.log.borrow_mut();
				log.destroyed += 1;
				log.live -= 1;
			}
		}
	}

	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	pub enum Mode {
		Ok,
		Fail,
		Panic,
	}

	pub struct FakeFactory {
		pub log: Rc<RefCell<EngineLog>>,
		pub mode: Rc<RefCell<Mode>>,
		pub hit: Rc<RefCell<Target>>,
	}

	impl FakeFactory {
		pub fn new() -> Self {
			Self {
				log: Rc::default(),
				mode: Rc::new(RefCell::new(Mode::Ok)),
				hit: Rc::new(RefCell::new(Target::Background)),
			}
		}

		pub fn share(&self) -> Self {
			Self {
				log: Rc::clone(&self.log),
				mode: Rc::clone(&self.mode),
				hit: Rc::clone(&self.hit),
			}
		}
	}

	impl EngineFactory for FakeFactory {
		type Engine = FakeEngine;

		fn create(
			&mut self,
			_: &[RenderableElement],
			_: Size,
			_: &GraphConfig,
		) -> Result<FakeEngine, RenderEngineInitError> {
			match *self.mode.borrow() {
				Mode::Ok => {}
				Mode::Fail => return Err(RenderEngineInitError::Failed("no context".into())),
				Mode::Panic => panic!("engine exploded"),
			}
			let mut log = self.log.borrow_mut();
			log.created += 1;
			log.live += 1;
			Ok(FakeEngine {
				log: Rc::clone(&self.log),
				destroyed: false,
				hit: self.hit.borrow().clone(),
			})
		}
	}
}

#[cfg(test)]
mod tests {
	use super::fake::{FakeFactory, Mode};
	use super::*;
	use crate::components::ownership_graph::keyboard::{KeyInput, Modifiers};
	use crate::components::ownership_graph::overlay::OverlayKind;
	use crate::components::ownership_graph::types::{GraphEdge, GraphNode};

	fn acme() -> GraphData {
		GraphData {
			nodes: vec![GraphNode {
				id: "org-1".into(),
				kind: "organization".into(),
				label: "Acme".into(),
				..Default::default()
			}],
			edges: vec![],
		}
	}

	fn two_nodes() -> GraphData {
		let mut data = acme();
		data.nodes.push(GraphNode {
			id: "repo-1".into(),
			kind: "repository".into(),
			label: String::new(),
			..Default::default()
		});
		data.edges.push(GraphEdge {
			id: "e1".into(),
			source: "org-1".into(),
			target: "repo-1".into(),
			kind: "owns".into(),
			label: "owns".into(),
		});
		data
	}

	fn session(factory: FakeFactory) -> Session<FakeFactory> {
		Session::new(
			factory,
			Size::new(800.0, 600.0),
			Size::new(1024.0, 768.0),
			GraphConfig::default(),
		)
	}

	#[test]
	fn single_node_mounts() {
		let factory = FakeFactory::new();
		let log = Rc::clone(&factory.log);
		let mut s = session(factory);
		assert!(s.load(&acme(), 0).is_ok());
		assert_eq!(s.index().elements().len(), 1);
		assert_eq!(*s.status(), SurfaceStatus::Ready);
		assert_eq!(log.borrow().live, 1);
	}

	#[test]
	fn empty_input_renders_empty_canvas_without_engine() {
		let factory = FakeFactory::new();
		let log = Rc::clone(&factory.log);
		let mut s = session(factory);
		let data = GraphData {
			nodes: vec![GraphNode {
				id: String::new(),
				kind: "user".into(),
				..Default::default()
			}],
			edges: vec![],
		};
		assert!(s.load(&data, 0).is_ok());
		assert_eq!(*s.status(), SurfaceStatus::Empty);
		assert_eq!(s.report().rejected.len(), 1);
		assert_eq!(log.borrow().created, 0);
	}

	#[test]
	fn reload_destroys_previous_engine_first() {
		let factory = FakeFactory::new();
		let log = Rc::clone(&factory.log);
		let mut s = session(factory);
		s.load(&acme(), 0).unwrap();
		s.load(&two_nodes(), 10).unwrap();
		s.load(&GraphData::default(), 20).unwrap();
		let log = log.borrow();
		assert_eq!(log.created, 2);
		assert_eq!(log.destroyed, 2);
		assert_eq!(log.live, 0);
	}

	#[test]
	fn construction_failure_is_typed_and_terminal() {
		let factory = FakeFactory::new();
		*factory.mode.borrow_mut() = Mode::Fail;
		let log = Rc::clone(&factory.log);
		let mut s = session(factory);
		let err = s.load(&acme(), 42).unwrap_err();
		assert_eq!(err, RenderEngineInitError::Failed("no context".into()));
		assert_eq!(
			*s.status(),
			SurfaceStatus::Failed {
				error: err,
				at_ms: 42
			}
		);
		assert_eq!(log.borrow().created, 0);
		s.unmount();
		assert_eq!(*s.status(), SurfaceStatus::Unmounted);
	}

	#[test]
	fn construction_panic_is_caught() {
		let factory = FakeFactory::new();
		*factory.mode.borrow_mut() = Mode::Panic;
		let mut s = session(factory);
		let err = s.load(&acme(), 0).unwrap_err();
		assert_eq!(err, RenderEngineInitError::Panicked("engine exploded".into()));
	}

	#[test]
	fn remount_after_failure_recovers() {
		let factory = FakeFactory::new();
		let mode = Rc::clone(&factory.mode);
		*mode.borrow_mut() = Mode::Fail;
		let mut s = session(factory);
		assert!(s.load(&acme(), 0).is_err());
		*mode.borrow_mut() = Mode::Ok;
		assert!(s.load(&acme(), 1).is_ok());
		assert_eq!(*s.status(), SurfaceStatus::Ready);
	}

	#[test]
	fn unmount_releases_engine_timers_and_overlays() {
		let factory = FakeFactory::new();
		let log = Rc::clone(&factory.log);
		let mut s = session(factory);
		s.load(&two_nodes(), 0).unwrap();
		s.handle(
			InteractionEvent::Tap {
				target: Target::Node("org-1".into()),
				modifiers: Modifiers::empty(),
			},
			0,
		);
		s.handle(
			InteractionEvent::Key(KeyInput::new("+", Modifiers::empty())),
			0,
		);
		assert!(s.state().next_deadline().is_some());
		s.unmount();
		assert_eq!(log.borrow().live, 0);
		assert!(s.overlays().is_empty());
		assert_eq!(s.state().next_deadline(), None);
		assert!(s.selected_elements().is_empty());
	}

	#[test]
	fn dropping_the_session_destroys_the_engine() {
		let factory = FakeFactory::new();
		let log = Rc::clone(&factory.log);
		{
			let mut s = session(factory);
			s.load(&acme(), 0).unwrap();
		}
		assert_eq!(log.borrow().destroyed, 1);
		assert_eq!(log.borrow().live, 0);
	}

	#[test]
	fn replacing_elements_clears_interaction_state() {
		let mut s = session(FakeFactory::new());
		s.load(&two_nodes(), 0).unwrap();
		s.handle(
			InteractionEvent::Tap {
				target: Target::Node("org-1".into()),
				modifiers: Modifiers::empty(),
			},
			0,
		);
		assert_eq!(s.selected_elements(), vec!["org-1"]);
		assert!(s.overlays().is_open(OverlayKind::NodeInfo));
		s.load(&two_nodes(), 5).unwrap();
		assert!(s.selected_elements().is_empty());
		assert!(s.overlays().is_empty());
	}

	#[test]
	fn stale_frames_are_rejected() {
		let factory = FakeFactory::new();
		let log = Rc::clone(&factory.log);
		let mut s = session(factory);
		s.load(&acme(), 0).unwrap();
		let old = s.generation();
		assert!(s.frame(old, 16).is_ok());
		s.load(&two_nodes(), 20).unwrap();
		assert_eq!(
			s.frame(old, 32),
			Err(SurfaceError::Stale {
				expected: s.generation(),
				found: old
			})
		);
		assert_eq!(log.borrow().frames, 1);
		s.unmount();
		let token = s.generation();
		assert_eq!(s.frame(token, 48), Err(SurfaceError::NotMounted));
	}

	#[test]
	fn empty_surface_still_expires_toasts() {
		let mut s = session(FakeFactory::new());
		s.load(&GraphData::default(), 0).unwrap();
		s.handle(
			InteractionEvent::Key(KeyInput::new("f", Modifiers::empty())),
			0,
		);
		assert!(s.overlays().is_open(OverlayKind::KeyboardToast));
		let token = s.generation();
		assert!(s.frame(token, 2_000).is_ok());
		assert!(s.overlays().is_empty());
	}

	#[test]
	fn detached_overlay_surface_is_a_silent_no_op() {
		let mut s = session(FakeFactory::new());
		s.load(&two_nodes(), 0).unwrap();
		s.set_overlay_surface(false);
		s.handle(
			InteractionEvent::Tap {
				target: Target::Node("org-1".into()),
				modifiers: Modifiers::empty(),
			},
			0,
		);
		assert_eq!(s.selected_elements(), vec!["org-1"]);
		assert!(s.overlays().is_empty());
	}

	#[test]
	fn commands_reach_the_engine() {
		let factory = FakeFactory::new();
		let log = Rc::clone(&factory.log);
		let mut s = session(factory);
		s.load(&two_nodes(), 0).unwrap();
		let outcome = s.handle(
			InteractionEvent::Tap {
				target: Target::Node("org-1".into()),
				modifiers: Modifiers::empty(),
			},
			0,
		);
		assert!(outcome.stop_propagation);
		assert!(
			log.borrow()
				.styles
				.contains(&("org-1".to_string(), ElementStyle::Highlighted))
		);
		let outcome = s.handle(
			InteractionEvent::Key(KeyInput::new("ArrowDown", Modifiers::empty())),
			0,
		);
		assert!(outcome.prevent_default);
		assert!(log.borrow().calls.contains(&"pan 0 50".to_string()));
	}

	#[test]
	fn pointer_move_emits_leave_then_enter() {
		let factory = FakeFactory::new();
		let hit = Rc::clone(&factory.hit);
		let log = Rc::clone(&factory.log);
		*hit.borrow_mut() = Target::Node("org-1".into());
		let mut s = session(factory);
		s.load(&two_nodes(), 0).unwrap();
		s.pointer_move(Point::default(), 0);
		assert_eq!(s.state().hovered.as_deref(), Some("org-1"));
		s.pointer_leave(0);
		assert_eq!(s.state().hovered, None);
		assert_eq!(
			log.borrow().styles.last(),
			Some(&("org-1".to_string(), ElementStyle::Default))
		);
	}

	#[test]
	fn handle_is_inert_after_unmount() {
		let factory = FakeFactory::new();
		let log = Rc::clone(&factory.log);
		let slot = Rc::new(RefCell::new(Some(session(factory.share()))));
		let handle: GraphHandle<FakeFactory> = GraphHandle::new();
		handle.bind(&slot);
		slot.borrow_mut().as_mut().unwrap().load(&two_nodes(), 0).unwrap();
		slot.borrow_mut().as_mut().unwrap().handle(
			InteractionEvent::Tap {
				target: Target::Node("repo-1".into()),
				modifiers: Modifiers::empty(),
			},
			0,
		);
		assert_eq!(handle.selected_elements(), vec!["repo-1"]);
		handle.zoom_to_fit();
		handle.reset_zoom();
		handle.center_graph();
		assert!(handle.zoom_to_node("org-1"));
		assert!(log.borrow().calls.iter().any(|c| c.starts_with("fit All")));

		drop(slot);
		assert_eq!(log.borrow().live, 0);
		assert!(handle.selected_elements().is_empty());
		assert!(!handle.zoom_to_node("org-1"));
	}
}
