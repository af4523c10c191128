use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node, unique for the lifetime of a graph session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	pub id: NodeId,
	pub text: String,
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
	#[serde(rename = "isCentral", default, skip_serializing_if = "is_false")]
	pub is_central: bool,
}

fn is_false(flag: &bool) -> bool {
	!*flag
}

impl Node {
	pub fn new(id: NodeId, text: impl Into<String>, (x, y): (f64, f64), (width, height): (f64, f64)) -> Self {
		Self {
			id,
			text: text.into(),
			x,
			y,
			width,
			height,
			is_central: false,
		}
	}

	pub fn central(mut self) -> Self {
		self.is_central = true;
		self
	}

	/// Whether a graph-space point falls inside the node's box.
	pub fn contains(&self, gx: f64, gy: f64) -> bool {
		(gx - self.x).abs() <= self.width / 2.0 && (gy - self.y).abs() <= self.height / 2.0
	}
}

/// Directed edge between two node ids. Endpoints are resolved against the
/// store's id index whenever positions are needed, so moving a node moves
/// its links without touching them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
	pub source: NodeId,
	pub target: NodeId,
}

impl Link {
	pub fn new(source: NodeId, target: NodeId) -> Self {
		Self { source, target }
	}
}

/// A complete, validated graph used to replace the store wholesale.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
	pub nodes: Vec<Node>,
	pub links: Vec<Link>,
	/// Last id handed out; the next allocation is `node_id_counter + 1`.
	pub node_id_counter: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn box_hit_test_is_centered() {
		let node = Node::new(NodeId(1), "a", (100.0, 50.0), (40.0, 20.0));
		assert!(node.contains(100.0, 50.0));
		assert!(node.contains(119.0, 59.0));
		assert!(!node.contains(121.0, 50.0));
		assert!(!node.contains(100.0, 61.0));
	}

	#[test]
	fn central_flag_only_serialized_when_set() {
		let child = Node::new(NodeId(2), "child", (0.0, 0.0), (140.0, 40.0));
		let json = serde_json::to_value(&child).unwrap();
		assert!(json.get("isCentral").is_none());

		let root = Node::new(NodeId(1), "root", (0.0, 0.0), (150.0, 50.0)).central();
		let json = serde_json::to_value(&root).unwrap();
		assert_eq!(json["isCentral"], serde_json::Value::Bool(true));
		assert_eq!(json["id"], serde_json::json!(1));
	}
}
