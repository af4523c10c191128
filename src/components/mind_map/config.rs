use serde::Deserialize;
use serde::de::Error as _;

/// Tunables for seeding, sizing, interaction and the suggestion endpoint.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MindMapConfig {
	/// Radius of the circle generated children are placed on.
	pub radius: f64,
	/// Horizontal padding added to a label's measured width.
	pub text_padding: f64,
	pub central_size: (f64, f64),
	pub child_size: (f64, f64),
	pub added_size: (f64, f64),
	/// Offset of a manually added child from its parent.
	pub added_offset: (f64, f64),
	pub added_label: String,
	pub suggest_endpoint: String,
	pub min_zoom: f64,
	pub max_zoom: f64,
	pub font: String,
}

impl Default for MindMapConfig {
	fn default() -> Self {
		Self {
			radius: 250.0,
			text_padding: 25.0,
			central_size: (150.0, 50.0),
			child_size: (140.0, 40.0),
			added_size: (120.0, 40.0),
			added_offset: (100.0, 100.0),
			added_label: "New Node".into(),
			suggest_endpoint: "/api/suggest".into(),
			min_zoom: 0.1,
			max_zoom: 4.0,
			font: "14px sans-serif".into(),
		}
	}
}

impl MindMapConfig {
	/// Parse a partial override; absent fields keep their defaults. The zoom
	/// extent must be finite, positive and ordered.
	pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
		let config: Self = serde_json::from_str(raw)?;
		let (min, max) = (config.min_zoom, config.max_zoom);
		if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
			return Err(serde_json::Error::custom(format!(
				"invalid zoom extent {min}..{max}"
			)));
		}
		Ok(config)
	}

	/// Never panics, even for a hand-built config with an inverted extent.
	pub fn clamp_zoom(&self, k: f64) -> f64 {
		k.max(self.min_zoom).min(self.max_zoom)
	}
}
