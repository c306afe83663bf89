use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent, WheelEvent, Window};

use super::config::GraphConfig;
use super::dispatch::InteractionEvent;
use super::error::RenderEngineInitError;
use super::keyboard::{FocusTarget, KeyInput, Modifiers};
use super::overlay::OverlayPanel;
use super::panels::{GraphErrorPanel, OverlayLayer};
use super::render::CanvasEngineFactory;
use super::surface::{GraphHandle, Outcome, Session, SurfaceStatus};
use super::types::{GraphData, Point, Size, Target};

/// Imperative controls for an [`OwnershipGraph`] on a canvas.
pub type CanvasGraphHandle = GraphHandle<CanvasEngineFactory>;

type SharedSession = Rc<RefCell<Option<Session<CanvasEngineFactory>>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn now_ms() -> u64 {
	js_sys::Date::now() as u64
}

fn iso_timestamp(at_ms: u64) -> String {
	js_sys::Date::new(&JsValue::from_f64(at_ms as f64))
		.to_iso_string()
		.into()
}

fn viewport_size(window: &Window) -> Size {
	let dim = |v: Result<JsValue, JsValue>, fallback: f64| {
		v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	Size::new(dim(window.inner_width(), 800.0), dim(window.inner_height(), 600.0))
}

fn surface_size(
	canvas: &HtmlCanvasElement,
	window: &Window,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> Size {
	if fullscreen {
		return viewport_size(window);
	}
	Size::new(
		width.unwrap_or_else(|| {
			canvas
				.parent_element()
				.map(|p| p.client_width() as f64)
				.unwrap_or(800.0)
		}),
		height.unwrap_or_else(|| {
			canvas
				.parent_element()
				.map(|p| p.client_height() as f64)
				.unwrap_or(600.0)
		}),
	)
}

fn local_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> Point {
	let rect = canvas.get_bounding_client_rect();
	Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn mouse_modifiers(ev: &MouseEvent) -> Modifiers {
	Modifiers::from_flags(ev.shift_key(), ev.alt_key(), ev.ctrl_key(), ev.meta_key())
}

fn focus_target(window: &Window) -> FocusTarget {
	let Some(active) = window.document().and_then(|d| d.active_element()) else {
		return FocusTarget::Other;
	};
	let editable = active
		.dyn_ref::<HtmlElement>()
		.is_some_and(|el| el.is_content_editable());
	FocusTarget::from_element(&active.tag_name(), editable)
}

/// Publishes the session's open panels to the view, only when they changed.
fn sync_panels(session: &SharedSession, panels: RwSignal<Vec<OverlayPanel>>) {
	let Ok(guard) = session.try_borrow() else {
		return;
	};
	let current = guard.as_ref().map(|s| s.overlays().panels()).unwrap_or(&[]);
	if panels
		.try_with_untracked(|p| p.as_slice() != current)
		.unwrap_or(false)
	{
		let _ = panels.try_set(current.to_vec());
	}
}

#[derive(Clone, Copy, Debug, Default)]
struct PanState {
	active: bool,
	moved: bool,
	last: Point,
}

/// Everything the component holds outside the reactive graph. Dropping it
/// stops the frame loop, detaches DOM listeners and releases the engine.
struct Teardown {
	session: SharedSession,
	animate: FrameCallback,
	frame_id: Rc<Cell<Option<i32>>>,
	keydown: Option<Closure<dyn FnMut(KeyboardEvent)>>,
	resize: Option<Closure<dyn FnMut()>>,
	outside_click: Option<Closure<dyn FnMut(MouseEvent)>>,
}

impl Drop for Teardown {
	fn drop(&mut self) {
		let window = web_sys::window();
		if let (Some(window), Some(id)) = (&window, self.frame_id.take()) {
			let _ = window.cancel_animation_frame(id);
		}
		if let Some(window) = &window {
			if let Some(cb) = &self.keydown {
				let _ = window
					.remove_event_listener_with_callback("keydown", cb.as_ref().unchecked_ref());
			}
			if let Some(cb) = &self.resize {
				let _ =
					window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
			if let (Some(document), Some(cb)) = (window.document(), &self.outside_click) {
				let _ = document.remove_event_listener_with_callback_and_bool(
					"click",
					cb.as_ref().unchecked_ref(),
					true,
				);
			}
		}
		self.animate.borrow_mut().take();
		if let Ok(mut slot) = self.session.try_borrow_mut() {
			if let Some(session) = slot.as_mut() {
				session.unmount();
			}
			*slot = None;
		}
		debug!("ownership graph torn down");
	}
}

/// Starts the per-frame loop for generation `token`. The loop stops by
/// itself once a newer element set is mounted or the surface unmounts.
fn start_frame_loop(
	session: &SharedSession,
	animate: &FrameCallback,
	frame_id: &Rc<Cell<Option<i32>>>,
	panels: RwSignal<Vec<OverlayPanel>>,
	token: u64,
) {
	let Some(window) = web_sys::window() else {
		return;
	};
	if let Some(id) = frame_id.take() {
		let _ = window.cancel_animation_frame(id);
	}
	let (session_anim, animate_inner, frame_inner) =
		(session.clone(), animate.clone(), frame_id.clone());
	*animate.borrow_mut() = Some(Closure::new(move || {
		frame_inner.set(None);
		let result = session_anim
			.borrow_mut()
			.as_mut()
			.map(|s| s.frame(token, now_ms()));
		match result {
			Some(Ok(())) => {}
			Some(Err(err)) => {
				debug!("frame loop stopped: {}", err);
				return;
			}
			None => return,
		}
		sync_panels(&session_anim, panels);
		if let Some(ref cb) = *animate_inner.borrow()
			&& let Some(window) = web_sys::window()
		{
			frame_inner.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	}));
	if let Some(ref cb) = *animate.borrow() {
		frame_id.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
	}
}

/// Interactive ownership graph drawn on a canvas, with info panels, a
/// context menu, an expanded view and keyboard shortcuts.
#[component]
pub fn OwnershipGraph(
	/// Raw records; every change rebuilds the engine.
	#[prop(into)]
	data: Signal<GraphData>,
	/// Size the canvas to the window instead of its parent.
	#[prop(default = false)]
	fullscreen: bool,
	/// Fixed width in pixels; defaults to the parent's width.
	#[prop(default = None)]
	width: Option<f64>,
	/// Fixed height in pixels; defaults to the parent's height.
	#[prop(default = None)]
	height: Option<f64>,
	/// Behaviour constants.
	#[prop(optional)]
	config: Option<GraphConfig>,
	/// Bound to the live surface once it mounts.
	#[prop(optional)]
	handle: Option<CanvasGraphHandle>,
) -> impl IntoView {
	let config = config.unwrap_or_default();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let root_ref = NodeRef::<leptos::html::Div>::new();
	let session: SharedSession = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let frame_id = Rc::new(Cell::new(None));
	let pan = Rc::new(Cell::new(PanState::default()));

	let panels = RwSignal::new(Vec::<OverlayPanel>::new());
	let failure = RwSignal::new(None::<(RenderEngineInitError, String)>);
	let retry = RwSignal::new(0u32);

	let store = StoredValue::new_local(session.clone());
	let dispatch = move |event: InteractionEvent| -> Outcome {
		store
			.try_with_value(|session| {
				let outcome = session
					.try_borrow_mut()
					.ok()
					.and_then(|mut s| s.as_mut().map(|s| s.handle(event, now_ms())))
					.unwrap_or_default();
				sync_panels(session, panels);
				outcome
			})
			.unwrap_or_default()
	};
	let on_event = Callback::new(move |event: InteractionEvent| {
		dispatch(event);
	});
	let on_retry = Callback::new(move |_: ()| retry.update(|n| *n += 1));

	let (session_init, animate_init, frame_init) =
		(session.clone(), animate.clone(), frame_id.clone());
	Effect::new(move |_| {
		let graph = data.get();
		retry.track();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			warn!("no window; ownership graph not mounted");
			return;
		};
		let (surface, viewport) = (
			surface_size(&canvas, &window, fullscreen, width, height),
			viewport_size(&window),
		);
		let now = now_ms();

		let token = {
			let mut slot = session_init.borrow_mut();
			let s = slot.get_or_insert_with(|| {
				Session::new(
					CanvasEngineFactory::new(canvas.clone()),
					surface,
					viewport,
					config.clone(),
				)
			});
			s.resize(surface, viewport, now);
			match s.load(&graph, now) {
				Ok(()) => failure.set(None),
				Err(err) => {
					let at_ms = match s.status() {
						SurfaceStatus::Failed { at_ms, .. } => *at_ms,
						_ => now,
					};
					failure.set(Some((err, iso_timestamp(at_ms))));
				}
			}
			s.generation()
		};
		if let Some(handle) = &handle {
			handle.bind(&session_init);
		}
		sync_panels(&session_init, panels);
		start_frame_loop(&session_init, &animate_init, &frame_init, panels, token);
	});

	let mut teardown = Teardown {
		session: session.clone(),
		animate: animate.clone(),
		frame_id: frame_id.clone(),
		keydown: None,
		resize: None,
		outside_click: None,
	};
	if let Some(window) = web_sys::window() {
		let key_window = window.clone();
		let keydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |ev: KeyboardEvent| {
			let modifiers =
				Modifiers::from_flags(ev.shift_key(), ev.alt_key(), ev.ctrl_key(), ev.meta_key());
			let input = KeyInput::new(ev.key(), modifiers).focused(focus_target(&key_window));
			if dispatch(InteractionEvent::Key(input)).prevent_default {
				ev.prevent_default();
			}
		});
		let _ = window.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref());
		teardown.keydown = Some(keydown);

		let session_resize = session.clone();
		let resize = Closure::<dyn FnMut()>::new(move || {
			let (Some(win), Some(canvas)) = (web_sys::window(), canvas_ref.get_untracked()) else {
				return;
			};
			let canvas: HtmlCanvasElement = canvas.into();
			let (surface, viewport) = (
				surface_size(&canvas, &win, fullscreen, width, height),
				viewport_size(&win),
			);
			if let Some(s) = session_resize.borrow_mut().as_mut() {
				s.resize(surface, viewport, now_ms());
			}
		});
		let _ = window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref());
		teardown.resize = Some(resize);

		// capture phase, so toolbar handlers that stop propagation still count
		let outside_click = Closure::<dyn FnMut(MouseEvent)>::new(move |ev: MouseEvent| {
			let inside = match (root_ref.get_untracked(), ev.target()) {
				(Some(root), Some(target)) => target
					.dyn_ref::<web_sys::Node>()
					.is_some_and(|node| root.contains(Some(node))),
				_ => false,
			};
			if !inside {
				dispatch(InteractionEvent::OutsideClick);
			}
		});
		if let Some(document) = window.document() {
			let _ = document.add_event_listener_with_callback_and_bool(
				"click",
				outside_click.as_ref().unchecked_ref(),
				true,
			);
		}
		teardown.outside_click = Some(outside_click);
	}
	let teardown = StoredValue::new_local(teardown);
	on_cleanup(move || teardown.dispose());

	let (session_click, pan_click) = (session.clone(), pan.clone());
	let on_click = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		if pan_click.get().moved {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let target = session_click
			.borrow()
			.as_ref()
			.map(|s| s.hit_test(local_point(&canvas, &ev)))
			.unwrap_or(Target::Background);
		let outcome = dispatch(InteractionEvent::Tap {
			target,
			modifiers: mouse_modifiers(&ev),
		});
		if outcome.stop_propagation {
			ev.stop_propagation();
		}
	};

	let session_dbl = session.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let target = session_dbl
			.borrow()
			.as_ref()
			.map(|s| s.hit_test(local_point(&canvas, &ev)))
			.unwrap_or(Target::Background);
		if target == Target::Background {
			return;
		}
		if dispatch(InteractionEvent::DoubleTap(target)).stop_propagation {
			ev.stop_propagation();
		}
	};

	let session_ctx = session.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let target = session_ctx
			.borrow()
			.as_ref()
			.map(|s| s.hit_test(local_point(&canvas, &ev)))
			.unwrap_or(Target::Background);
		let at = Point::new(ev.client_x() as f64, ev.client_y() as f64);
		let outcome = dispatch(InteractionEvent::SecondaryTap { target, at });
		if outcome.prevent_default {
			ev.prevent_default();
		}
		if outcome.stop_propagation {
			ev.stop_propagation();
		}
	};

	let pan_md = pan.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		pan_md.set(PanState {
			active: true,
			moved: false,
			last: local_point(&canvas, &ev),
		});
	};

	let (session_mm, pan_mm) = (session.clone(), pan.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let p = local_point(&canvas, &ev);
		let mut state = pan_mm.get();
		if state.active {
			let (dx, dy) = (p.x - state.last.x, p.y - state.last.y);
			// small jitter while clicking is not a drag
			if state.moved || dx.abs() + dy.abs() > 3.0 {
				state.moved = true;
				state.last = p;
				pan_mm.set(state);
				if let Some(s) = session_mm.borrow_mut().as_mut() {
					s.pan_by(dx, dy);
				}
			}
			return;
		}
		if let Some(s) = session_mm.borrow_mut().as_mut() {
			s.pointer_move(p, now_ms());
		}
	};

	let pan_mu = pan.clone();
	let on_mouseup = move |_: MouseEvent| {
		let mut state = pan_mu.get();
		state.active = false;
		pan_mu.set(state);
	};

	let (session_ml, pan_ml) = (session.clone(), pan.clone());
	let on_mouseleave = move |_: MouseEvent| {
		pan_ml.set(PanState::default());
		if let Some(s) = session_ml.borrow_mut().as_mut() {
			s.pointer_leave(now_ms());
		}
	};

	let session_wh = session.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let p = local_point(&canvas, &ev);
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		if let Some(s) = session_wh.borrow_mut().as_mut() {
			s.wheel_zoom(p, factor);
		}
	};

	view! {
		<div class="ownership-graph" node_ref=root_ref>
			<canvas
				node_ref=canvas_ref
				class="ownership-graph-canvas"
				on:click=on_click
				on:dblclick=on_dblclick
				on:contextmenu=on_contextmenu
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			<OverlayLayer panels=panels on_event=on_event />
			{move || {
				failure
					.get()
					.map(|(error, timestamp)| {
						view! { <GraphErrorPanel error=error timestamp=timestamp on_retry=on_retry /> }
					})
			}}
		</div>
	}
}
