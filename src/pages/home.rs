use leptos::prelude::*;
use log::error;

use crate::components::ownership_graph::{CanvasGraphHandle, GraphData, OwnershipGraph};

const SAMPLE: &str = r#"{
	"nodes": [
		{ "id": "org-acme", "type": "organization", "label": "Acme", "data": { "plan": "enterprise", "seats": 120 } },
		{ "id": "team-platform", "type": "team", "label": "Platform", "data": { "slug": "platform" } },
		{ "id": "team-web", "type": "team", "label": "Web", "data": { "slug": "web" } },
		{ "id": "user-1f2e3d4c5b6a", "type": "user", "data": { "login": "mhartley" } },
		{ "id": "user-9a8b7c6d5e4f", "type": "user", "data": { "name": "Priya Raman", "login": "praman" } },
		{ "id": "user-0c1d2e3f4a5b", "type": "user", "data": { "login": "jokafor" } },
		{ "id": "user-77e1b0c3d9aa", "type": "user" },
		{ "id": "repo-api", "type": "repository", "label": "acme/api", "data": { "language": "Rust", "private": true } },
		{ "id": "repo-site", "type": "repository", "label": "acme/site", "data": { "language": "TypeScript", "private": false } },
		{ "id": "repo-infra", "type": "repository", "label": "acme/infra", "data": { "language": "HCL", "private": true } }
	],
	"edges": [
		{ "id": "e-org-platform", "source": "org-acme", "target": "team-platform", "type": "has_team" },
		{ "id": "e-org-web", "source": "org-acme", "target": "team-web", "type": "has_team" },
		{ "id": "e-platform-api", "source": "team-platform", "target": "repo-api", "type": "owns", "label": "maintains" },
		{ "id": "e-platform-infra", "source": "team-platform", "target": "repo-infra", "type": "owns" },
		{ "id": "e-web-site", "source": "team-web", "target": "repo-site", "type": "owns" },
		{ "id": "e-u1-platform", "source": "user-1f2e3d4c5b6a", "target": "team-platform", "type": "member_of" },
		{ "id": "e-u2-platform", "source": "user-9a8b7c6d5e4f", "target": "team-platform", "type": "member_of", "label": "lead" },
		{ "id": "e-u2-web", "source": "user-9a8b7c6d5e4f", "target": "team-web", "type": "member_of" },
		{ "id": "e-u3-web", "source": "user-0c1d2e3f4a5b", "target": "team-web", "type": "member_of" },
		{ "id": "e-u4-site", "source": "user-77e1b0c3d9aa", "target": "repo-site", "type": "contributor" },
		{ "id": "e-dangling", "source": "user-0c1d2e3f4a5b", "target": "repo-archived", "type": "contributor" }
	]
}"#;

/// Parses the embedded sample; a malformed sample renders an empty graph.
fn sample_data() -> GraphData {
	serde_json::from_str(SAMPLE).unwrap_or_else(|e| {
		error!("sample graph is not valid JSON: {}", e);
		GraphData::default()
	})
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph_data = RwSignal::new(sample_data());
	// the handle is Rc-based, so it lives in local storage
	let handle = StoredValue::new_local(CanvasGraphHandle::new());

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<OwnershipGraph data=graph_data fullscreen=true handle=handle.get_value() />
				<div class="graph-overlay">
					<h1>"Ownership Graph"</h1>
					<p class="subtitle">
						"Click to select, Ctrl/Cmd-click to multi-select, double-click to expand, right-click for actions."
					</p>
					<div class="graph-toolbar">
						<button on:click=move |_| handle.with_value(|h| h.zoom_to_fit())>"Fit"</button>
						<button on:click=move |_| handle.with_value(|h| h.center_graph())>"Center"</button>
						<button on:click=move |_| handle.with_value(|h| h.reset_zoom())>"1:1"</button>
						<button on:click=move |_| graph_data.set(sample_data())>"Reload"</button>
					</div>
				</div>
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn shareable<T: Send + Sync>() {}

	#[test]
	fn stored_handle_can_be_captured_by_boundary_children() {
		shareable::<StoredValue<CanvasGraphHandle, LocalStorage>>();
	}

	#[test]
	fn sample_parses_with_its_dangling_edge() {
		let data = sample_data();
		assert_eq!(data.nodes.len(), 10);
		assert_eq!(data.edges.len(), 11);
	}
}
