use leptos::prelude::*;
use log::warn;

use crate::components::mind_map::{MindMapConfig, MindMapEditor};

/// Read overrides from `<script id="mindmap-config" type="application/json">`,
/// if the host page provides one.
fn page_config() -> MindMapConfig {
	let raw = web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.get_element_by_id("mindmap-config"))
		.and_then(|el| el.text_content());
	match raw {
		Some(raw) => MindMapConfig::from_json(&raw).unwrap_or_else(|err| {
			warn!("ignoring invalid mind map config: {err}");
			MindMapConfig::default()
		}),
		None => MindMapConfig::default(),
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
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

			<div class="fullscreen-mindmap">
				<div class="mindmap-overlay">
					<h1>"Mind Map"</h1>
					<p class="subtitle">
						"Click to select. Drag nodes to move them. Double-click to edit a label. Scroll to zoom. Drag background to pan."
					</p>
				</div>
				<MindMapEditor config=page_config() />
			</div>
		</ErrorBoundary>
	}
}
