use log::{error, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, Document, File, HtmlAnchorElement, Url};

use super::error::MindMapError;

/// Log the error and show a blocking notice.
pub fn notify(err: &MindMapError) {
	if err.is_user_input() {
		warn!("{err}");
	} else {
		error!("{err}");
	}
	if let Some(window) = web_sys::window() {
		let _ = window.alert_with_message(&err.user_message());
	}
}

fn document() -> Result<Document, MindMapError> {
	web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| MindMapError::Browser("no document".into()))
}

fn click_link(href: &str, filename: &str) -> Result<(), MindMapError> {
	let anchor: HtmlAnchorElement = document()?
		.create_element("a")?
		.dyn_into()
		.map_err(|_| MindMapError::Browser("<a> is not an anchor element".into()))?;
	anchor.set_href(href);
	anchor.set_download(filename);
	anchor.click();
	Ok(())
}

/// Offer `contents` as a file download.
pub fn download(contents: &str, mime: &str, filename: &str) -> Result<(), MindMapError> {
	let parts = js_sys::Array::of1(&JsValue::from_str(contents));
	let options = BlobPropertyBag::new();
	options.set_type(mime);
	let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
	let url = Url::create_object_url_with_blob(&blob)?;
	let clicked = click_link(&url, filename);
	Url::revoke_object_url(&url)?;
	clicked
}

/// Offer an existing URL (e.g. a data URL) as a file download.
pub fn download_url(url: &str, filename: &str) -> Result<(), MindMapError> {
	click_link(url, filename)
}

/// Read a picked file completely into memory.
pub async fn read_file(file: &File) -> Result<String, MindMapError> {
	JsFuture::from(file.text())
		.await?
		.as_string()
		.ok_or_else(|| MindMapError::Browser("file contents are not text".into()))
}
