use std::cell::Cell;
use std::rc::Rc;

use log::{debug, error, info, warn};

use super::codec;
use super::config::MindMapConfig;
use super::error::MindMapError;
use super::export;
use super::layout::{self, TextMeasure};
use super::store::GraphStore;
use super::suggest::{SuggestError, Topic};
use super::types::{GraphSnapshot, NodeId};

/// Screen movement (in pixels) below which a background press counts as a click.
const CLICK_SLOP: f64 = 3.0;

/// Graph -> screen mapping: `screen = graph * k + (x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl ViewTransform {
	pub fn to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	pub fn to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(gx * self.k + self.x, gy * self.k + self.y)
	}
}

#[derive(Clone, Debug, Default)]
struct DragState {
	node: Option<NodeId>,
	start_x: f64,
	start_y: f64,
	node_start_x: f64,
	node_start_y: f64,
}

#[derive(Clone, Debug, Default)]
struct PanState {
	active: bool,
	moved: bool,
	start_x: f64,
	start_y: f64,
	transform_start_x: f64,
	transform_start_y: f64,
}

/// An open inline label editor, positioned in screen pixels over its node.
#[derive(Clone, Debug, PartialEq)]
pub struct EditSession {
	pub node: NodeId,
	pub text: String,
	pub left: f64,
	pub top: f64,
	pub width: f64,
	pub height: f64,
}

/// What a primary press landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerTarget {
	Node(NodeId),
	Background,
}

/// One independent editing session: the graph plus all view and
/// interaction state around it.
pub struct MindMapSession {
	store: GraphStore,
	config: MindMapConfig,
	selected: Option<NodeId>,
	view: ViewTransform,
	drag: DragState,
	pan: PanState,
	editing: Option<EditSession>,
	/// Suggestion requests started but not yet finished.
	pending_generations: usize,
	width: f64,
	height: f64,
	redraw: Rc<Cell<bool>>,
}

impl MindMapSession {
	pub fn new(config: MindMapConfig, width: f64, height: f64) -> Self {
		let redraw = Rc::new(Cell::new(true));
		let mut store = GraphStore::new();
		let flag = redraw.clone();
		store.subscribe(move |_| flag.set(true));
		Self {
			store,
			config,
			selected: None,
			view: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			editing: None,
			pending_generations: 0,
			width,
			height,
			redraw,
		}
	}

	pub fn store(&self) -> &GraphStore {
		&self.store
	}

	pub fn config(&self) -> &MindMapConfig {
		&self.config
	}

	pub fn selected(&self) -> Option<NodeId> {
		self.selected
	}

	pub fn view(&self) -> &ViewTransform {
		&self.view
	}

	pub fn editing(&self) -> Option<&EditSession> {
		self.editing.as_ref()
	}

	pub fn is_loading(&self) -> bool {
		self.pending_generations > 0
	}

	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	pub fn request_redraw(&self) {
		self.redraw.set(true);
	}

	/// Consume the pending redraw request, if any.
	pub fn take_redraw(&self) -> bool {
		self.redraw.replace(false)
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.request_redraw();
	}

	/// Re-derive node widths from their labels before painting.
	pub fn measure_nodes(&mut self, measure: &impl TextMeasure) {
		layout::measure_nodes(&mut self.store, measure, self.config.text_padding);
	}

	/// Select a node, or clear the selection. Unknown ids clear it.
	pub fn select(&mut self, id: Option<NodeId>) {
		let next = id.filter(|&id| self.store.contains(id));
		if next != self.selected {
			self.selected = next;
			self.request_redraw();
		}
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64) -> PointerTarget {
		let (gx, gy) = self.view.to_graph(sx, sy);
		match self.store.node_at(gx, gy) {
			Some(id) => {
				self.select(Some(id));
				if let Some(node) = self.store.node(id) {
					self.drag = DragState {
						node: Some(id),
						start_x: sx,
						start_y: sy,
						node_start_x: node.x,
						node_start_y: node.y,
					};
				}
				let raised = self.store.raise(id);
				debug_assert!(raised.is_ok(), "hit-tested node {id} vanished before raise");
				PointerTarget::Node(id)
			}
			None => {
				self.pan = PanState {
					active: true,
					moved: false,
					start_x: sx,
					start_y: sy,
					transform_start_x: self.view.x,
					transform_start_y: self.view.y,
				};
				PointerTarget::Background
			}
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if let Some(id) = self.drag.node {
			let (dx, dy) = (
				(sx - self.drag.start_x) / self.view.k,
				(sy - self.drag.start_y) / self.view.k,
			);
			let (nx, ny) = (self.drag.node_start_x + dx, self.drag.node_start_y + dy);
			if self.store.update_position(id, nx, ny).is_err() {
				self.drag = DragState::default();
			}
		} else if self.pan.active {
			let (dx, dy) = (sx - self.pan.start_x, sy - self.pan.start_y);
			if dx.abs() > CLICK_SLOP || dy.abs() > CLICK_SLOP {
				self.pan.moved = true;
			}
			self.view.x = self.pan.transform_start_x + dx;
			self.view.y = self.pan.transform_start_y + dy;
			self.request_redraw();
		}
	}

	/// End any gesture. A background press that never moved clears selection.
	pub fn pointer_up(&mut self) {
		if self.pan.active && !self.pan.moved {
			self.select(None);
		}
		self.drag = DragState::default();
		self.pan = PanState::default();
	}

	pub fn pointer_leave(&mut self) {
		self.drag = DragState::default();
		self.pan = PanState::default();
	}

	/// Zoom around the cursor.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = self.config.clamp_zoom(self.view.k * factor);
		let ratio = new_k / self.view.k;
		self.view.x = sx - (sx - self.view.x) * ratio;
		self.view.y = sy - (sy - self.view.y) * ratio;
		self.view.k = new_k;
		self.request_redraw();
	}

	/// Open an editor over the node under the cursor.
	pub fn begin_edit(&mut self, sx: f64, sy: f64) -> Option<EditSession> {
		let (gx, gy) = self.view.to_graph(sx, sy);
		let node = self.store.node(self.store.node_at(gx, gy)?)?;
		let (left, top) = self
			.view
			.to_screen(node.x - node.width / 2.0, node.y - node.height / 2.0);
		let session = EditSession {
			node: node.id,
			text: node.text.clone(),
			left,
			top,
			width: node.width * self.view.k,
			height: node.height * self.view.k,
		};
		self.drag = DragState::default();
		self.editing = Some(session.clone());
		self.request_redraw();
		Some(session)
	}

	/// Commit the editor's value as the node's label and close the editor.
	/// Fails if the graph was replaced while the editor was open.
	pub fn commit_edit(&mut self, text: &str) -> Result<(), MindMapError> {
		let Some(edit) = self.editing.take() else {
			return Err(MindMapError::EditDiscarded);
		};
		self.request_redraw();
		self.store.update_text(edit.node, text)?;
		debug!("label of {} set to {text:?}", edit.node);
		Ok(())
	}

	pub fn add_child(&mut self) -> Result<NodeId, MindMapError> {
		let parent = self
			.selected
			.and_then(|id| self.store.node(id))
			.ok_or(MindMapError::NoParentSelected)?;
		let (ox, oy) = self.config.added_offset;
		let position = (parent.x + ox, parent.y + oy);
		let parent = parent.id;
		let id = self.store.add_node(
			parent,
			self.config.added_label.clone(),
			position,
			self.config.added_size,
		)?;
		Ok(id)
	}

	/// Delete a node's downstream closure; selection is cleared if it was inside it.
	pub fn delete_node(&mut self, id: NodeId) -> Result<Vec<NodeId>, MindMapError> {
		let removed = self.store.delete_node(id)?;
		if self.selected.is_some_and(|s| removed.contains(&s)) {
			self.selected = None;
		}
		if self.editing.as_ref().is_some_and(|e| removed.contains(&e.node)) {
			self.editing = None;
		}
		Ok(removed)
	}

	pub fn delete_selected(&mut self) -> Result<Vec<NodeId>, MindMapError> {
		let id = self.selected.ok_or(MindMapError::NoSelection)?;
		self.delete_node(id)
	}

	/// Validate the topic and enter the loading state. The store is untouched
	/// until `finish_generation`.
	pub fn begin_generation(&mut self, raw_topic: &str) -> Result<Topic, MindMapError> {
		let topic = Topic::parse(raw_topic)?;
		self.pending_generations += 1;
		info!("requesting suggestions for {:?}", topic.as_str());
		Ok(topic)
	}

	/// Apply a finished suggestion request. On failure the graph is left as is.
	/// Overlapping requests are not serialized: the last one to resolve wins,
	/// and loading only ends once every started request has finished.
	pub fn finish_generation(
		&mut self,
		topic: &Topic,
		result: Result<Vec<String>, SuggestError>,
	) -> Result<(), MindMapError> {
		let suggestions = result.inspect_err(|err| error!("suggestion request failed: {err}"));
		let outcome = suggestions.map(|suggestions| {
			let center = (self.width / 2.0, self.height / 2.0);
			let snapshot = layout::seed_radial(topic.as_str(), &suggestions, center, &self.config);
			self.replace_graph(snapshot);
			info!("generated map with {} suggestions", suggestions.len());
		});
		self.pending_generations = self.pending_generations.saturating_sub(1);
		self.request_redraw();
		Ok(outcome?)
	}

	pub fn save(&self) -> Result<Vec<u8>, MindMapError> {
		Ok(codec::serialize(&self.store)?)
	}

	/// Replace the graph from a saved file, or leave it intact if decoding fails.
	pub fn load(&mut self, bytes: &[u8]) -> Result<(), MindMapError> {
		let snapshot = codec::deserialize(bytes).inspect_err(|err| warn!("rejected load: {err}"))?;
		info!("loaded map with {} nodes", snapshot.nodes.len());
		self.replace_graph(snapshot);
		Ok(())
	}

	fn replace_graph(&mut self, snapshot: GraphSnapshot) {
		self.selected = None;
		self.editing = None;
		self.drag = DragState::default();
		self.store.reset_all(snapshot);
		self.reset_view();
	}

	/// Center the central node (or the viewport center) at scale 1.
	pub fn reset_view(&mut self) {
		let (focus_x, focus_y) = self
			.store
			.central()
			.map(|n| (n.x, n.y))
			.unwrap_or((self.width / 2.0, self.height / 2.0));
		self.view = ViewTransform {
			x: self.width / 2.0 - focus_x,
			y: self.height / 2.0 - focus_y,
			k: 1.0,
		};
		self.request_redraw();
	}

	pub fn export_svg(&self) -> String {
		export::to_svg(
			&self.store,
			self.selected,
			&self.view,
			(self.width, self.height),
			&self.config,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mind_map::layout::tests::Monospace;
	use crate::components::mind_map::store::StoreError;

	fn suggestions(labels: &[&str]) -> Result<Vec<String>, SuggestError> {
		Ok(labels.iter().map(|s| s.to_string()).collect())
	}

	fn generated(labels: &[&str]) -> MindMapSession {
		let mut session = MindMapSession::new(MindMapConfig::default(), 800.0, 600.0);
		let topic = session.begin_generation("Topic").unwrap();
		session.finish_generation(&topic, suggestions(labels)).unwrap();
		session
	}

	/// Screen position of a node's center.
	fn screen_of(session: &MindMapSession, id: NodeId) -> (f64, f64) {
		let node = session.store().node(id).unwrap();
		session.view().to_screen(node.x, node.y)
	}

	#[test]
	fn generation_seeds_and_centers_the_view() {
		let session = generated(&["a", "b", "c", "d"]);
		assert!(!session.is_loading());
		assert_eq!(session.store().nodes().len(), 5);
		assert_eq!(screen_of(&session, NodeId(1)), (400.0, 300.0));
		assert_eq!(session.selected(), None);
	}

	#[test]
	fn empty_topic_never_enters_loading() {
		let mut session = MindMapSession::new(MindMapConfig::default(), 800.0, 600.0);
		assert!(matches!(session.begin_generation("   "), Err(MindMapError::EmptyTopic)));
		assert!(!session.is_loading());
	}

	#[test]
	fn failed_generation_leaves_graph_untouched() {
		let mut session = generated(&["a", "b"]);
		session.select(Some(NodeId(2)));
		let before = session.store().snapshot();

		let topic = session.begin_generation("Other").unwrap();
		assert!(session.is_loading());
		let err = session
			.finish_generation(&topic, Err(SuggestError::Status(502)))
			.unwrap_err();

		assert!(matches!(err, MindMapError::Suggest(SuggestError::Status(502))));
		assert!(!session.is_loading());
		assert_eq!(session.store().snapshot(), before);
		assert_eq!(session.selected(), Some(NodeId(2)));
	}

	#[test]
	fn press_on_node_selects_and_background_click_clears() {
		let mut session = generated(&["a", "b"]);
		let (sx, sy) = screen_of(&session, NodeId(2));

		assert_eq!(session.pointer_down(sx, sy), PointerTarget::Node(NodeId(2)));
		session.pointer_up();
		assert_eq!(session.selected(), Some(NodeId(2)));

		assert_eq!(session.pointer_down(5.0, 5.0), PointerTarget::Background);
		session.pointer_up();
		assert_eq!(session.selected(), None);
	}

	#[test]
	fn panning_keeps_selection() {
		let mut session = generated(&["a"]);
		session.select(Some(NodeId(1)));
		let before = session.view().clone();

		session.pointer_down(5.0, 5.0);
		session.pointer_move(45.0, 25.0);
		session.pointer_up();

		assert_eq!(session.selected(), Some(NodeId(1)));
		assert_eq!(session.view().x, before.x + 40.0);
		assert_eq!(session.view().y, before.y + 20.0);
	}

	#[test]
	fn drag_moves_node_in_graph_space_and_raises_it() {
		let mut session = generated(&["a", "b"]);
		session.wheel(0.0, 0.0, -1.0);
		let k = session.view().k;
		let start = session.store().node(NodeId(2)).unwrap().clone();
		let (sx, sy) = screen_of(&session, NodeId(2));

		session.pointer_down(sx, sy);
		assert_eq!(session.store().nodes().last().unwrap().id, NodeId(2));
		session.pointer_move(sx + 22.0, sy - 11.0);
		session.pointer_up();

		let node = session.store().node(NodeId(2)).unwrap();
		assert!((node.x - (start.x + 22.0 / k)).abs() < 1e-9);
		assert!((node.y - (start.y - 11.0 / k)).abs() < 1e-9);
		let (_, target) = session.store().resolved_links().find(|(_, t)| t.id == NodeId(2)).unwrap();
		assert_eq!((target.x, target.y), (node.x, node.y));
	}

	#[test]
	fn wheel_zoom_is_clamped_and_keeps_cursor_fixed() {
		let mut session = generated(&[]);
		let anchor = session.view().to_graph(300.0, 200.0);
		session.wheel(300.0, 200.0, -1.0);
		let after = session.view().to_graph(300.0, 200.0);
		assert!((anchor.0 - after.0).abs() < 1e-9 && (anchor.1 - after.1).abs() < 1e-9);

		for _ in 0..100 {
			session.wheel(0.0, 0.0, 1.0);
		}
		assert_eq!(session.view().k, 0.1);
		for _ in 0..100 {
			session.wheel(0.0, 0.0, -1.0);
		}
		assert_eq!(session.view().k, 4.0);
	}

	#[test]
	fn edit_commit_renames_and_remeasures() {
		let mut session = generated(&["short"]);
		let (sx, sy) = screen_of(&session, NodeId(2));
		let edit = session.begin_edit(sx, sy).unwrap();
		assert_eq!(edit.node, NodeId(2));
		assert_eq!(edit.text, "short");
		assert_eq!((edit.width, edit.height), (140.0, 40.0));

		session.commit_edit("a considerably longer label").unwrap();
		assert!(session.editing().is_none());
		session.measure_nodes(&Monospace(8.0));
		let node = session.store().node(NodeId(2)).unwrap();
		assert_eq!(node.text, "a considerably longer label");
		assert_eq!(node.width, 27.0 * 8.0 + 25.0);
	}

	#[test]
	fn edit_on_background_opens_nothing() {
		let mut session = generated(&["a"]);
		assert!(session.begin_edit(1.0, 1.0).is_none());
		assert!(session.editing().is_none());
	}

	#[test]
	fn edit_overtaken_by_generation_is_reported() {
		let mut session = generated(&["a"]);
		let (sx, sy) = screen_of(&session, NodeId(2));
		session.begin_edit(sx, sy).unwrap();

		let topic = session.begin_generation("Fresh").unwrap();
		session.finish_generation(&topic, suggestions(&["x", "y"])).unwrap();
		assert!(session.editing().is_none());

		let err = session.commit_edit("typed").unwrap_err();
		assert!(matches!(err, MindMapError::EditDiscarded));
		assert!(session.store().nodes().iter().all(|n| n.text != "typed"));
	}

	#[test]
	fn loading_lasts_until_every_request_finishes() {
		let mut session = generated(&["a"]);
		let first = session.begin_generation("One").unwrap();
		let second = session.begin_generation("Two").unwrap();

		session.finish_generation(&first, suggestions(&["p"])).unwrap();
		assert!(session.is_loading());

		session
			.finish_generation(&second, Err(SuggestError::Network("offline".into())))
			.unwrap_err();
		assert!(!session.is_loading());
		assert_eq!(session.store().central().unwrap().text, "One");
	}

	#[test]
	fn add_after_exhausted_ids_fails_without_duplicates() {
		let mut session = MindMapSession::new(MindMapConfig::default(), 800.0, 600.0);
		let raw = br#"{
			"nodes": [
				{"id": 0, "text": "low", "x": 0, "y": 0, "width": 120, "height": 40},
				{"id": 18446744073709551615, "text": "high", "x": 300, "y": 0, "width": 120, "height": 40}
			],
			"links": [],
			"nodeIdCounter": 18446744073709551615
		}"#;
		session.load(raw).unwrap();
		session.select(Some(NodeId(0)));

		let err = session.add_child().unwrap_err();
		assert!(matches!(err, MindMapError::Store(StoreError::IdsExhausted)));
		let ids: Vec<_> = session.store().nodes().iter().map(|n| n.id).collect();
		assert_eq!(ids, vec![NodeId(0), NodeId(u64::MAX)]);
	}

	#[test]
	fn add_requires_a_selected_parent() {
		let mut session = generated(&["a"]);
		assert!(matches!(session.add_child(), Err(MindMapError::NoParentSelected)));
		assert_eq!(session.store().nodes().len(), 2);

		session.select(Some(NodeId(2)));
		let child = session.add_child().unwrap();
		assert_eq!(child, NodeId(3));
		let parent = session.store().node(NodeId(2)).unwrap().clone();
		let node = session.store().node(child).unwrap();
		assert_eq!((node.x, node.y), (parent.x + 100.0, parent.y + 100.0));
		assert_eq!(node.text, "New Node");
		assert_eq!((node.width, node.height), (120.0, 40.0));
	}

	#[test]
	fn delete_requires_selection_and_clears_it() {
		let mut session = generated(&["a", "b"]);
		assert!(matches!(session.delete_selected(), Err(MindMapError::NoSelection)));

		session.select(Some(NodeId(2)));
		assert_eq!(session.delete_selected().unwrap(), vec![NodeId(2)]);
		assert_eq!(session.selected(), None);
		assert_eq!(session.store().nodes().len(), 2);
	}

	#[test]
	fn deleting_unrelated_node_keeps_selection() {
		let mut session = generated(&["a", "b"]);
		session.select(Some(NodeId(3)));
		session.delete_node(NodeId(2)).unwrap();
		assert_eq!(session.selected(), Some(NodeId(3)));

		session.delete_node(NodeId(1)).unwrap();
		assert_eq!(session.selected(), None);
		assert!(session.store().nodes().is_empty());
	}

	#[test]
	fn selecting_unknown_id_clears() {
		let mut session = generated(&["a"]);
		session.select(Some(NodeId(1)));
		session.select(Some(NodeId(77)));
		assert_eq!(session.selected(), None);
	}

	#[test]
	fn save_then_load_restores_graph_and_counter() {
		let mut session = generated(&["a", "b"]);
		session.select(Some(NodeId(1)));
		session.add_child().unwrap();
		let bytes = session.save().unwrap();
		let saved = session.store().snapshot();

		let mut other = MindMapSession::new(MindMapConfig::default(), 800.0, 600.0);
		other.load(&bytes).unwrap();
		assert_eq!(other.store().snapshot(), saved);

		other.select(Some(NodeId(1)));
		assert_eq!(other.add_child().unwrap(), NodeId(5));
	}

	#[test]
	fn rejected_load_keeps_existing_graph_and_selection() {
		let mut session = generated(&["a"]);
		session.select(Some(NodeId(2)));
		let before = session.store().snapshot();
		let bad = br#"{"nodes": [], "links": [{"source": 1, "target": 2}], "nodeIdCounter": 0}"#;

		assert!(matches!(session.load(bad), Err(MindMapError::Decode(_))));
		assert_eq!(session.store().snapshot(), before);
		assert_eq!(session.selected(), Some(NodeId(2)));
	}

	#[test]
	fn store_mutations_request_redraw() {
		let mut session = generated(&["a"]);
		assert!(session.take_redraw());
		assert!(!session.take_redraw());

		session.select(Some(NodeId(1)));
		assert!(session.take_redraw());
		session.add_child().unwrap();
		assert!(session.take_redraw());
		session.measure_nodes(&Monospace(1.0));
		assert!(!session.take_redraw());
	}
}
