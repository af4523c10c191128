use std::fmt::Write;

use super::config::MindMapConfig;
use super::session::ViewTransform;
use super::store::GraphStore;
use super::types::NodeId;

pub const BACKGROUND: &str = "#1a1a2e";
pub const LINK_COLOR: &str = "rgba(100, 180, 255, 0.8)";
pub const NODE_FILL: &str = "#24304f";
pub const CENTRAL_FILL: &str = "#3d5a99";
pub const NODE_STROKE: &str = "#64b4ff";
pub const SELECTED_STROKE: &str = "#ffb347";
pub const TEXT_COLOR: &str = "#ffffff";
pub const CORNER_RADIUS: f64 = 10.0;

fn escape_xml(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			c => out.push(c),
		}
	}
	out
}

/// Standalone SVG document of the current frame, drawn with the same view
/// transform and palette as the canvas.
pub fn to_svg(
	store: &GraphStore,
	selected: Option<NodeId>,
	view: &ViewTransform,
	(width, height): (f64, f64),
	config: &MindMapConfig,
) -> String {
	let mut out = String::new();
	let _ = write!(
		&mut out,
		r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
	);
	let _ = write!(&mut out, r#"<rect width="100%" height="100%" fill="{BACKGROUND}"/>"#);
	let _ = write!(
		&mut out,
		r#"<g transform="translate({},{}) scale({})">"#,
		view.x, view.y, view.k
	);

	for (source, target) in store.resolved_links() {
		let _ = write!(
			&mut out,
			r#"<path class="link" d="M{},{} L{},{}" stroke="{LINK_COLOR}" stroke-width="1.5" fill="none"/>"#,
			source.x, source.y, target.x, target.y
		);
	}

	for node in store.nodes() {
		let fill = if node.is_central { CENTRAL_FILL } else { NODE_FILL };
		let (stroke, stroke_width) = if selected == Some(node.id) {
			(SELECTED_STROKE, 3.0)
		} else {
			(NODE_STROKE, 1.5)
		};
		let _ = write!(
			&mut out,
			r#"<g class="node" transform="translate({},{})"><rect x="{}" y="{}" width="{}" height="{}" rx="{CORNER_RADIUS}" fill="{fill}" stroke="{stroke}" stroke-width="{stroke_width}"/>"#,
			node.x,
			node.y,
			-node.width / 2.0,
			-node.height / 2.0,
			node.width,
			node.height,
		);
		let _ = write!(
			&mut out,
			r#"<text text-anchor="middle" dominant-baseline="central" fill="{TEXT_COLOR}" style="font: {}">{}</text></g>"#,
			escape_xml(&config.font),
			escape_xml(&node.text)
		);
	}

	out.push_str("</g></svg>");
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mind_map::layout::seed_radial;

	#[test]
	fn labels_are_escaped() {
		assert_eq!(escape_xml(r#"a<b>&"c'"#), "a&lt;b&gt;&amp;&quot;c&#39;");
	}

	#[test]
	fn snapshot_contains_every_node_and_link() {
		let config = MindMapConfig::default();
		let suggestions = vec!["R&D".to_string(), "<Ops>".to_string()];
		let mut store = GraphStore::new();
		store.reset_all(seed_radial("Plan", &suggestions, (100.0, 100.0), &config));
		let view = ViewTransform { x: 20.0, y: -10.0, k: 2.0 };

		let svg = to_svg(&store, Some(NodeId(2)), &view, (800.0, 600.0), &config);

		assert!(svg.starts_with("<svg"));
		assert!(svg.ends_with("</svg>"));
		assert!(svg.contains(r#"width="800" height="600""#));
		assert!(svg.contains("translate(20,-10) scale(2)"));
		assert_eq!(svg.matches(r#"class="link""#).count(), 2);
		assert_eq!(svg.matches(r#"class="node""#).count(), 3);
		assert_eq!(svg.matches(SELECTED_STROKE).count(), 1);
		assert_eq!(svg.matches(CENTRAL_FILL).count(), 1);
		assert!(svg.contains(">R&amp;D</text>"));
		assert!(svg.contains(">&lt;Ops&gt;</text>"));
	}
}
