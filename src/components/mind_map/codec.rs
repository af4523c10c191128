//! Flat JSON save format.
//!
//! Links are persisted as id pairs only; on load they are re-resolved against
//! the decoded node set. A file is either accepted whole or rejected whole.

use std::collections::HashSet;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::store::GraphStore;
use super::types::{GraphSnapshot, Link, Node, NodeId};

#[derive(Debug, Error)]
pub enum DecodeError {
	#[error("malformed mind map file: {0}")]
	Json(#[from] serde_json::Error),
	#[error("node id {0} appears more than once")]
	DuplicateNodeId(NodeId),
	#[error("link {from} -> {to} references a missing node")]
	DanglingLink { from: NodeId, to: NodeId },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedMapRef<'a> {
	nodes: &'a [Node],
	links: &'a [Link],
	node_id_counter: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedMap {
	nodes: Vec<Node>,
	links: Vec<Link>,
	node_id_counter: u64,
}

pub fn serialize(store: &GraphStore) -> Result<Vec<u8>, serde_json::Error> {
	serde_json::to_vec_pretty(&SavedMapRef {
		nodes: store.nodes(),
		links: store.links(),
		node_id_counter: store.node_id_counter(),
	})
}

pub fn deserialize(bytes: &[u8]) -> Result<GraphSnapshot, DecodeError> {
	let SavedMap {
		nodes,
		links,
		node_id_counter,
	} = serde_json::from_slice(bytes)?;

	let mut ids = HashSet::with_capacity(nodes.len());
	for node in &nodes {
		if !ids.insert(node.id) {
			return Err(DecodeError::DuplicateNodeId(node.id));
		}
	}
	if let Some(link) = links
		.iter()
		.find(|l| !ids.contains(&l.source) || !ids.contains(&l.target))
	{
		return Err(DecodeError::DanglingLink {
			from: link.source,
			to: link.target,
		});
	}

	let max_id = ids.iter().map(|id| id.0).max().unwrap_or(0);
	let node_id_counter = if node_id_counter < max_id {
		warn!("nodeIdCounter {node_id_counter} is below largest id {max_id}; raising it");
		max_id
	} else {
		node_id_counter
	};

	Ok(GraphSnapshot {
		nodes,
		links,
		node_id_counter,
	})
}
