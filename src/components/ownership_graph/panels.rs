use leptos::prelude::*;
use serde_json::Value;

use super::context_menu::MenuItem;
use super::dispatch::InteractionEvent;
use super::error::RenderEngineInitError;
use super::overlay::{
	EdgeDetails, EdgeSummary, ModalContent, NodeDetails, OverlayKind, OverlayPanel, OverlayPayload,
};

fn value_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

fn node_info(details: NodeDetails) -> impl IntoView {
	let NodeDetails {
		id,
		kind,
		label,
		data,
	} = details;
	view! {
		<h3>{label}</h3>
		<p class="graph-panel-kind">{kind}</p>
		<table class="graph-panel-data">
			<tr>
				<th>"id"</th>
				<td>{id}</td>
			</tr>
			{data
				.into_iter()
				.map(|(k, v)| {
					view! {
						<tr>
							<th>{k}</th>
							<td>{value_text(&v)}</td>
						</tr>
					}
				})
				.collect_view()}
		</table>
	}
}

fn edge_info(details: EdgeDetails) -> impl IntoView {
	view! {
		<h3>{details.label}</h3>
		<p class="graph-panel-kind">{details.kind}</p>
		<p class="graph-panel-route">
			{details.source_label}
			" → "
			{details.target_label}
		</p>
	}
}

fn edge_list(title: &'static str, edges: Vec<EdgeSummary>) -> impl IntoView {
	let empty = edges.is_empty();
	view! {
		<section>
			<h4>{title} " (" {edges.len()} ")"</h4>
			{empty.then(|| view! { <p class="graph-panel-empty">"None"</p> })}
			<ul>
				{edges
					.into_iter()
					.map(|e| {
						view! {
							<li>
								<span class="graph-edge-label">{e.label}</span>
								" "
								<span class="graph-edge-peer">{e.peer_label}</span>
							</li>
						}
					})
					.collect_view()}
			</ul>
		</section>
	}
}

fn modal_body(content: ModalContent) -> AnyView {
	match content {
		ModalContent::Node {
			details,
			incoming,
			outgoing,
		} => view! {
			{node_info(details)}
			{edge_list("Incoming", incoming)}
			{edge_list("Outgoing", outgoing)}
		}
		.into_any(),
		ModalContent::Edge { details } => edge_info(details).into_any(),
	}
}

fn menu_items(items: Vec<MenuItem>, on_event: Callback<InteractionEvent>) -> impl IntoView {
	items
		.into_iter()
		.map(|item| match item {
			MenuItem::Separator => view! { <hr class="graph-menu-separator" /> }.into_any(),
			MenuItem::Action { action, disabled } => view! {
				<button
					class="graph-menu-item"
					id=format!("graph-menu-{}", action.key())
					disabled=disabled
					on:click=move |ev| {
						ev.stop_propagation();
						if !disabled {
							on_event.run(InteractionEvent::Menu(action));
						}
					}
				>
					{action.label()}
				</button>
			}
			.into_any(),
		})
		.collect_view()
}

fn panel_view(panel: OverlayPanel, on_event: Callback<InteractionEvent>) -> AnyView {
	let kind = panel.kind();
	let on_click = move |ev: leptos::ev::MouseEvent| {
		ev.stop_propagation();
		on_event.run(InteractionEvent::PanelClick(kind));
	};
	match panel.payload {
		OverlayPayload::NodeInfo(details) => view! {
			<aside id=kind.key() class="graph-panel graph-info" on:click=on_click>
				{node_info(details)}
			</aside>
		}
		.into_any(),
		OverlayPayload::EdgeInfo(details) => view! {
			<aside id=kind.key() class="graph-panel graph-info" on:click=on_click>
				{edge_info(details)}
			</aside>
		}
		.into_any(),
		OverlayPayload::ContextMenu(menu) => view! {
			<nav
				id=kind.key()
				class="graph-panel graph-context-menu"
				style=format!("left: {}px; top: {}px;", menu.position.x, menu.position.y)
				on:click=on_click
				on:contextmenu=|ev| ev.prevent_default()
			>
				{menu_items(menu.items, on_event)}
			</nav>
		}
		.into_any(),
		OverlayPayload::ExpandedModal(content) => view! {
			<div
				class="graph-modal-backdrop"
				on:click=move |ev| {
					ev.stop_propagation();
					on_event.run(InteractionEvent::DismissModal);
				}
			>
				<div id=kind.key() class="graph-panel graph-modal" role="dialog" on:click=on_click>
					<button
						class="graph-modal-close"
						aria-label="Close"
						on:click=move |ev| {
							ev.stop_propagation();
							on_event.run(InteractionEvent::DismissModal);
						}
					>
						"×"
					</button>
					{modal_body(content)}
				</div>
			</div>
		}
		.into_any(),
		OverlayPayload::KeyboardToast(message) => view! {
			<div id=kind.key() class="graph-panel graph-toast" role="status" on:click=on_click>
				{message}
			</div>
		}
		.into_any(),
	}
}

/// Renders every open overlay; one slot per kind so a replaced panel swaps
/// in place.
#[component]
pub fn OverlayLayer(
	/// Currently open panels.
	#[prop(into)]
	panels: Signal<Vec<OverlayPanel>>,
	/// Receives panel clicks and menu choices.
	on_event: Callback<InteractionEvent>,
) -> impl IntoView {
	OverlayKind::ALL
		.into_iter()
		.map(|kind| {
			move || {
				panels
					.with(|ps| ps.iter().find(|p| p.kind() == kind).cloned())
					.map(|panel| panel_view(panel, on_event))
			}
		})
		.collect_view()
}

/// Shown in place of the canvas when the engine could not be built.
#[component]
pub fn GraphErrorPanel(
	/// The construction failure.
	error: RenderEngineInitError,
	/// ISO-8601 time of the failure.
	timestamp: String,
	/// Rebuilds the engine from the same data.
	on_retry: Callback<()>,
) -> impl IntoView {
	view! {
		<div class="graph-error" role="alert">
			<h3>"Unable to render graph"</h3>
			<p class="graph-error-message">{error.to_string()}</p>
			<p class="graph-error-time">{timestamp}</p>
			<button class="graph-error-retry" on:click=move |_| on_retry.run(())>
				"Retry"
			</button>
		</div>
	}
}
