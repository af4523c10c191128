use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;
use thiserror::Error;

use super::types::{GraphSnapshot, Link, Node, NodeId};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
	#[error("node {0} does not exist")]
	UnknownNode(NodeId),
	#[error("node ids are exhausted")]
	IdsExhausted,
}

/// Emitted once after every successful mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
	NodeAdded(NodeId),
	NodesRemoved(Vec<NodeId>),
	TextChanged(NodeId),
	Moved(NodeId),
	Raised(NodeId),
	Reset,
}

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// Owns the nodes, links and id allocation of one mind map.
///
/// Node order doubles as z-order: later nodes are drawn on top.
#[derive(Default)]
pub struct GraphStore {
	nodes: Vec<Node>,
	links: Vec<Link>,
	index: HashMap<NodeId, usize>,
	node_id_counter: u64,
	listeners: Vec<Listener>,
}

impl GraphStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) {
		self.listeners.push(Box::new(listener));
	}

	fn emit(&mut self, event: StoreEvent) {
		for listener in &mut self.listeners {
			listener(&event);
		}
	}

	fn reindex(&mut self) {
		self.index = self
			.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| (node.id, i))
			.collect();
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn links(&self) -> &[Link] {
		&self.links
	}

	pub fn node_id_counter(&self) -> u64 {
		self.node_id_counter
	}

	pub fn node(&self, id: NodeId) -> Option<&Node> {
		self.index.get(&id).map(|&i| &self.nodes[i])
	}

	pub fn contains(&self, id: NodeId) -> bool {
		self.index.contains_key(&id)
	}

	pub fn central(&self) -> Option<&Node> {
		self.nodes.iter().find(|n| n.is_central)
	}

	/// Links with both endpoints resolved, in insertion order.
	pub fn resolved_links(&self) -> impl Iterator<Item = (&Node, &Node)> + '_ {
		self.links
			.iter()
			.filter_map(|link| Some((self.node(link.source)?, self.node(link.target)?)))
	}

	/// Topmost node whose box contains the graph-space point.
	pub fn node_at(&self, gx: f64, gy: f64) -> Option<NodeId> {
		self.nodes.iter().rev().find(|n| n.contains(gx, gy)).map(|n| n.id)
	}

	fn allocate_id(&mut self) -> Result<NodeId, StoreError> {
		let next = self
			.node_id_counter
			.checked_add(1)
			.ok_or(StoreError::IdsExhausted)?;
		self.node_id_counter = next;
		Ok(NodeId(next))
	}

	pub fn add_node(
		&mut self,
		parent: NodeId,
		label: impl Into<String>,
		position: (f64, f64),
		size: (f64, f64),
	) -> Result<NodeId, StoreError> {
		if !self.contains(parent) {
			return Err(StoreError::UnknownNode(parent));
		}
		let id = self.allocate_id()?;
		self.index.insert(id, self.nodes.len());
		self.nodes.push(Node::new(id, label, position, size));
		self.links.push(Link::new(parent, id));
		debug!("added node {id} under {parent}");
		self.emit(StoreEvent::NodeAdded(id));
		Ok(id)
	}

	/// The node plus everything reachable from it along source -> target links.
	pub fn forward_closure(&self, root: NodeId) -> HashSet<NodeId> {
		let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
		for link in &self.links {
			adjacency.entry(link.source).or_default().push(link.target);
		}

		let mut closure = HashSet::from([root]);
		let mut queue = VecDeque::from([root]);
		while let Some(current) = queue.pop_front() {
			for &next in adjacency.get(&current).into_iter().flatten() {
				if closure.insert(next) {
					queue.push_back(next);
				}
			}
		}
		closure
	}

	/// Remove `root` and its whole downstream closure, plus every link
	/// touching a removed node. Returns the removed ids in store order.
	pub fn delete_node(&mut self, root: NodeId) -> Result<Vec<NodeId>, StoreError> {
		if !self.contains(root) {
			return Err(StoreError::UnknownNode(root));
		}
		let closure = self.forward_closure(root);
		let removed: Vec<NodeId> = self
			.nodes
			.iter()
			.map(|n| n.id)
			.filter(|id| closure.contains(id))
			.collect();

		self.nodes.retain(|n| !closure.contains(&n.id));
		self.links
			.retain(|l| !closure.contains(&l.source) && !closure.contains(&l.target));
		self.reindex();
		debug!("deleted {} node(s) rooted at {root}", removed.len());
		self.emit(StoreEvent::NodesRemoved(removed.clone()));
		Ok(removed)
	}

	/// Replace the label. Width is re-measured by the layout pass.
	pub fn update_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), StoreError> {
		let i = *self.index.get(&id).ok_or(StoreError::UnknownNode(id))?;
		self.nodes[i].text = text.into();
		self.emit(StoreEvent::TextChanged(id));
		Ok(())
	}

	pub fn update_position(&mut self, id: NodeId, x: f64, y: f64) -> Result<(), StoreError> {
		let i = *self.index.get(&id).ok_or(StoreError::UnknownNode(id))?;
		let node = &mut self.nodes[i];
		node.x = x;
		node.y = y;
		self.emit(StoreEvent::Moved(id));
		Ok(())
	}

	/// Move a node to the top of the z-order.
	pub fn raise(&mut self, id: NodeId) -> Result<(), StoreError> {
		let i = *self.index.get(&id).ok_or(StoreError::UnknownNode(id))?;
		if i + 1 != self.nodes.len() {
			let node = self.nodes.remove(i);
			self.nodes.push(node);
			self.reindex();
		}
		self.emit(StoreEvent::Raised(id));
		Ok(())
	}

	/// Derived sizing; not a user mutation, so no event is emitted.
	pub(crate) fn set_width(&mut self, id: NodeId, width: f64) {
		if let Some(&i) = self.index.get(&id) {
			self.nodes[i].width = width;
		}
	}

	/// Replace the whole graph. The snapshot must already be valid: unique
	/// ids and no dangling links.
	pub fn reset_all(&mut self, snapshot: GraphSnapshot) {
		let GraphSnapshot {
			nodes,
			links,
			node_id_counter,
		} = snapshot;
		self.nodes = nodes;
		self.reindex();
		debug_assert_eq!(self.index.len(), self.nodes.len(), "duplicate node ids");
		debug_assert!(
			links
				.iter()
				.all(|l| self.contains(l.source) && self.contains(l.target)),
			"dangling link in snapshot"
		);
		self.links = links;
		self.node_id_counter = node_id_counter;
		debug!(
			"store reset: {} nodes, {} links",
			self.nodes.len(),
			self.links.len()
		);
		self.emit(StoreEvent::Reset);
	}

	pub fn snapshot(&self) -> GraphSnapshot {
		GraphSnapshot {
			nodes: self.nodes.clone(),
			links: self.links.clone(),
			node_id_counter: self.node_id_counter,
		}
	}
}
