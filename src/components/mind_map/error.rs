use thiserror::Error;
use wasm_bindgen::JsValue;

use super::codec::DecodeError;
use super::store::StoreError;
use super::suggest::SuggestError;

/// Everything a user-triggered operation can fail with.
#[derive(Debug, Error)]
pub enum MindMapError {
	#[error("empty topic")]
	EmptyTopic,
	#[error("add requires a selected parent")]
	NoParentSelected,
	#[error("delete requires a selected node")]
	NoSelection,
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	Suggest(#[from] SuggestError),
	#[error(transparent)]
	Decode(#[from] DecodeError),
	#[error("could not encode mind map: {0}")]
	Encode(#[from] serde_json::Error),
	#[error("browser call failed: {0}")]
	Browser(String),
	#[error("label edit discarded: the map was replaced while editing")]
	EditDiscarded,
}

impl From<JsValue> for MindMapError {
	fn from(err: JsValue) -> Self {
		Self::Browser(format!("{err:?}"))
	}
}

impl MindMapError {
	/// Text for the blocking notice shown to the user.
	pub fn user_message(&self) -> String {
		match self {
			Self::EmptyTopic => "Please enter a central topic.".into(),
			Self::NoParentSelected => "Please select a parent node first.".into(),
			Self::NoSelection => "Please select a node to delete.".into(),
			Self::Suggest(_) => "Could not generate suggestions. Please try again.".into(),
			Self::Decode(err) => format!("Could not load mind map: {err}"),
			Self::Store(err) => format!("Operation failed: {err}"),
			Self::Encode(err) => format!("Could not save mind map: {err}"),
			Self::Browser(_) => "The browser could not complete the operation.".into(),
			Self::EditDiscarded => {
				"The map was replaced while you were editing, so your label change was not saved.".into()
			}
		}
	}

	/// Input problems the user can fix themselves.
	pub fn is_user_input(&self) -> bool {
		matches!(self, Self::EmptyTopic | Self::NoParentSelected | Self::NoSelection)
	}
}
