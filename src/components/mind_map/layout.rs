use std::f64::consts::TAU;

use super::config::MindMapConfig;
use super::store::GraphStore;
use super::types::{GraphSnapshot, Link, Node, NodeId};

/// Measures the rendered width of a label in the current font.
pub trait TextMeasure {
	fn text_width(&self, text: &str) -> f64;
}

/// Build a fresh map: the topic at `center` and one child per suggestion,
/// evenly spaced on a circle of `config.radius`, each linked from the root.
pub fn seed_radial(topic: &str, suggestions: &[String], center: (f64, f64), config: &MindMapConfig) -> GraphSnapshot {
	let (cx, cy) = center;
	let root = Node::new(NodeId(1), topic, center, config.central_size).central();
	let mut nodes = Vec::with_capacity(suggestions.len() + 1);
	let mut links = Vec::with_capacity(suggestions.len());
	nodes.push(root);

	if !suggestions.is_empty() {
		let step = TAU / suggestions.len() as f64;
		for (i, suggestion) in suggestions.iter().enumerate() {
			let angle = i as f64 * step;
			let id = NodeId(i as u64 + 2);
			let position = (cx + config.radius * angle.cos(), cy + config.radius * angle.sin());
			nodes.push(Node::new(id, suggestion.as_str(), position, config.child_size));
			links.push(Link::new(NodeId(1), id));
		}
	}

	GraphSnapshot {
		node_id_counter: nodes.len() as u64,
		nodes,
		links,
	}
}

/// Bring every node's width in line with its current label. Height is fixed
/// at creation.
pub fn measure_nodes(store: &mut GraphStore, measure: &impl TextMeasure, padding: f64) {
	let widths: Vec<(NodeId, f64)> = store
		.nodes()
		.iter()
		.map(|n| (n.id, measure.text_width(&n.text) + padding))
		.collect();
	for (id, width) in widths {
		store.set_width(id, width);
	}
}
