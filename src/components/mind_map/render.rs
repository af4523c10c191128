use web_sys::CanvasRenderingContext2d;

use super::export::{
	BACKGROUND, CENTRAL_FILL, CORNER_RADIUS, LINK_COLOR, NODE_FILL, NODE_STROKE, SELECTED_STROKE,
	TEXT_COLOR,
};
use super::layout::TextMeasure;
use super::session::MindMapSession;
use super::types::Node;

/// Canvas text metrics in the context's current font.
pub struct CanvasMeasure<'a>(pub &'a CanvasRenderingContext2d);

impl TextMeasure for CanvasMeasure<'_> {
	fn text_width(&self, text: &str) -> f64 {
		self.0.measure_text(text).map(|m| m.width()).unwrap_or(0.0)
	}
}

/// Re-measure labels, then paint links and nodes. Never mutates the graph
/// beyond derived widths.
pub fn render(session: &mut MindMapSession, ctx: &CanvasRenderingContext2d) {
	ctx.set_font(&session.config().font);
	session.measure_nodes(&CanvasMeasure(ctx));

	let (width, height) = session.size();
	let view = session.view().clone();
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);
	ctx.save();
	let _ = ctx.translate(view.x, view.y);
	let _ = ctx.scale(view.k, view.k);
	draw_links(session, ctx);
	draw_nodes(session, ctx);
	ctx.restore();
}

fn draw_links(session: &MindMapSession, ctx: &CanvasRenderingContext2d) {
	ctx.set_stroke_style_str(LINK_COLOR);
	ctx.set_line_width(1.5);
	for (source, target) in session.store().resolved_links() {
		ctx.begin_path();
		ctx.move_to(source.x, source.y);
		ctx.line_to(target.x, target.y);
		ctx.stroke();
	}
}

fn rounded_box(ctx: &CanvasRenderingContext2d, node: &Node) {
	let (x, y, w, h) = (
		node.x - node.width / 2.0,
		node.y - node.height / 2.0,
		node.width,
		node.height,
	);
	let r = CORNER_RADIUS.min(w / 2.0).min(h / 2.0);
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

fn draw_nodes(session: &MindMapSession, ctx: &CanvasRenderingContext2d) {
	let editing = session.editing().map(|e| e.node);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	for node in session.store().nodes() {
		rounded_box(ctx, node);
		ctx.set_fill_style_str(if node.is_central { CENTRAL_FILL } else { NODE_FILL });
		ctx.fill();
		if session.selected() == Some(node.id) {
			ctx.set_stroke_style_str(SELECTED_STROKE);
			ctx.set_line_width(3.0);
		} else {
			ctx.set_stroke_style_str(NODE_STROKE);
			ctx.set_line_width(1.5);
		}
		ctx.stroke();

		// The inline editor covers the label while it is open.
		if editing != Some(node.id) {
			ctx.set_fill_style_str(TEXT_COLOR);
			let _ = ctx.fill_text(&node.text, node.x, node.y);
		}
	}
}
