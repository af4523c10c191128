use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, info};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, CssStyleDeclaration, Event, FocusEvent, HtmlCanvasElement, HtmlElement,
	HtmlInputElement, KeyboardEvent, MouseEvent, WheelEvent,
};

use super::browser;
use super::config::MindMapConfig;
use super::error::MindMapError;
use super::render;
use super::session::{EditSession, MindMapSession};
use super::suggest::fetch_suggestions;

type Shared<T> = Rc<RefCell<T>>;

fn local_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Size the canvas to its container and tell the session.
fn fit_to_parent(canvas: &HtmlCanvasElement, session: &Shared<MindMapSession>) {
	let (w, h) = canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|&(w, h)| w > 0.0 && h > 0.0)
		.unwrap_or((800.0, 600.0));
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);
	session.borrow_mut().resize(w, h);
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}

// The leptos prelude's `ElementExt::style` shadows the DOM getter.
fn style_of(input: &HtmlInputElement) -> CssStyleDeclaration {
	HtmlElement::style(input)
}

fn show_editor(input: &HtmlInputElement, edit: &EditSession) {
	input.set_value(&edit.text);
	let style = style_of(input);
	let _ = style.set_property("left", &format!("{}px", edit.left));
	let _ = style.set_property("top", &format!("{}px", edit.top));
	let _ = style.set_property("width", &format!("{}px", edit.width));
	let _ = style.set_property("height", &format!("{}px", edit.height));
	let _ = style.set_property("display", "block");
	let _ = input.focus();
}

fn report(result: Result<(), MindMapError>) {
	if let Err(err) = result {
		browser::notify(&err);
	}
}

/// Blur an editor left open over a graph that has since been replaced, so its
/// blur handler reports the discarded text and hides it.
fn close_stale_editor(editor: Option<HtmlInputElement>, session: &Shared<MindMapSession>) {
	let Some(input) = editor else {
		return;
	};
	let visible = style_of(&input)
		.get_property_value("display")
		.is_ok_and(|display| display != "none");
	let stale = session.borrow().editing().is_none();
	if visible && stale {
		let _ = input.blur();
		let _ = style_of(&input).set_property("display", "none");
	}
}

/// Mind-map editor: toolbar, loader, canvas and the inline label editor.
#[component]
pub fn MindMapEditor(#[prop(optional)] config: Option<MindMapConfig>) -> impl IntoView {
	let config = config.unwrap_or_default();
	let endpoint = config.suggest_endpoint.clone();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let editor_ref = NodeRef::<leptos::html::Input>::new();
	let topic_ref = NodeRef::<leptos::html::Input>::new();
	let loading = RwSignal::new(false);

	let session: Shared<MindMapSession> = Rc::new(RefCell::new(MindMapSession::new(config, 800.0, 600.0)));
	let context: Shared<Option<CanvasRenderingContext2d>> = Rc::new(RefCell::new(None));
	let animate: Shared<Option<Closure<dyn FnMut()>>> = Rc::new(RefCell::new(None));
	let resize_cb: Shared<Option<Closure<dyn FnMut()>>> = Rc::new(RefCell::new(None));
	let (session_init, context_init, animate_init, resize_cb_init) = (
		session.clone(),
		context.clone(),
		animate.clone(),
		resize_cb.clone(),
	);

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(window) = web_sys::window() else {
			return;
		};
		fit_to_parent(&canvas, &session_init);
		let Some(ctx) = context_2d(&canvas) else {
			error!("canvas has no 2d context");
			return;
		};
		*context_init.borrow_mut() = Some(ctx.clone());
		session_init.borrow_mut().reset_view();

		let (session_resize, canvas_resize) = (session_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			fit_to_parent(&canvas_resize, &session_resize);
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (session_anim, animate_inner) = (session_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			{
				let mut s = session_anim.borrow_mut();
				if s.take_redraw() {
					render::render(&mut s, &ctx);
				}
			}
			if let (Some(window), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
		info!("mind map canvas ready");
	});

	let session_md = session.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		if let Some(canvas) = canvas_ref.get() {
			let (x, y) = local_point(&canvas, &ev);
			session_md.borrow_mut().pointer_down(x, y);
		}
	};

	let session_mm = session.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(canvas) = canvas_ref.get() {
			let (x, y) = local_point(&canvas, &ev);
			session_mm.borrow_mut().pointer_move(x, y);
		}
	};

	let session_mu = session.clone();
	let on_mouseup = move |_: MouseEvent| session_mu.borrow_mut().pointer_up();

	let session_ml = session.clone();
	let on_mouseleave = move |_: MouseEvent| session_ml.borrow_mut().pointer_leave();

	let session_wh = session.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some(canvas) = canvas_ref.get() {
			let (x, y) = local_point(&canvas, &ev);
			session_wh.borrow_mut().wheel(x, y, ev.delta_y());
		}
	};

	let session_dc = session.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let (Some(canvas), Some(input)) = (canvas_ref.get(), editor_ref.get()) else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);
		let edit = session_dc.borrow_mut().begin_edit(x, y);
		if let Some(edit) = edit {
			show_editor(&input, &edit);
		}
	};

	let session_blur = session.clone();
	let on_editor_blur = move |_: FocusEvent| {
		let Some(input) = editor_ref.get() else {
			return;
		};
		let _ = style_of(&input).set_property("display", "none");
		let committed = session_blur.borrow_mut().commit_edit(&input.value());
		report(committed);
	};

	let on_editor_keydown = move |ev: KeyboardEvent| {
		if ev.key() == "Enter" {
			ev.prevent_default();
			if let Some(input) = editor_ref.get() {
				let _ = input.blur();
			}
		}
	};

	let session_gen = session.clone();
	let on_generate = move |_: MouseEvent| {
		let raw = topic_ref.get().map(|input| input.value()).unwrap_or_default();
		let started = session_gen.borrow_mut().begin_generation(&raw);
		let topic = match started {
			Ok(topic) => topic,
			Err(err) => return browser::notify(&err),
		};
		loading.set(true);
		let (session, endpoint) = (session_gen.clone(), endpoint.clone());
		spawn_local(async move {
			let result = fetch_suggestions(&endpoint, &topic).await;
			let finished = session.borrow_mut().finish_generation(&topic, result);
			loading.set(session.borrow().is_loading());
			report(finished);
			close_stale_editor(editor_ref.get(), &session);
		});
	};

	let session_add = session.clone();
	let on_add = move |_: MouseEvent| {
		let added = session_add.borrow_mut().add_child();
		report(added.map(|_| ()));
	};

	let session_del = session.clone();
	let on_delete = move |_: MouseEvent| {
		let deleted = session_del.borrow_mut().delete_selected();
		report(deleted.map(|_| ()));
	};

	let session_save = session.clone();
	let on_save = move |_: MouseEvent| {
		let saved = session_save.borrow().save();
		report(saved.and_then(|bytes| {
			browser::download(&String::from_utf8_lossy(&bytes), "application/json", "mindmap.json")
		}));
	};

	let session_load = session.clone();
	let on_load = move |ev: Event| {
		let input = event_target::<HtmlInputElement>(&ev);
		let file = input.files().and_then(|files| files.get(0));
		// Allow picking the same file again.
		input.set_value("");
		let Some(file) = file else {
			return;
		};
		let session = session_load.clone();
		spawn_local(async move {
			let loaded = match browser::read_file(&file).await {
				Ok(text) => session.borrow_mut().load(text.as_bytes()),
				Err(err) => Err(err),
			};
			report(loaded);
			close_stale_editor(editor_ref.get(), &session);
		});
	};

	let session_svg = session.clone();
	let on_export_svg = move |_: MouseEvent| {
		let svg = session_svg.borrow().export_svg();
		report(browser::download(&svg, "image/svg+xml;charset=utf-8", "mindmap.svg"));
	};

	let (session_png, context_png) = (session.clone(), context.clone());
	let on_export_png = move |_: MouseEvent| {
		let (Some(canvas), Some(ctx)) = (canvas_ref.get(), context_png.borrow().clone()) else {
			return;
		};
		// Paint synchronously so the snapshot is never a stale frame.
		render::render(&mut session_png.borrow_mut(), &ctx);
		let exported = canvas
			.to_data_url_with_type("image/png")
			.map_err(MindMapError::from)
			.and_then(|url| browser::download_url(&url, "mindmap.png"));
		report(exported);
	};

	view! {
		<div class="mindmap-editor" style="display: flex; flex-direction: column; height: 100%;">
			<div class="toolbar">
				<input node_ref=topic_ref type="text" placeholder="Central topic" class="topic-input" />
				<button on:click=on_generate prop:disabled=move || loading.get()>"Generate"</button>
				<button on:click=on_add prop:disabled=move || loading.get()>"Add Node"</button>
				<button on:click=on_delete prop:disabled=move || loading.get()>"Delete Node"</button>
				<button on:click=on_save>"Save JSON"</button>
				<label class="file-button">
					"Load JSON"
					<input
						type="file"
						accept=".json,application/json"
						style="display: none;"
						on:change=on_load
						prop:disabled=move || loading.get()
					/>
				</label>
				<button on:click=on_export_png>"Export PNG"</button>
				<button on:click=on_export_svg>"Export SVG"</button>
				<div class="loader" class:hidden=move || !loading.get()>"Generating..."</div>
			</div>
			<div class="mindmap-container" style="position: relative; flex: 1; overflow: hidden;">
				<canvas
					node_ref=canvas_ref
					class="mindmap-canvas"
					on:mousedown=on_mousedown
					on:mousemove=on_mousemove
					on:mouseup=on_mouseup
					on:mouseleave=on_mouseleave
					on:wheel=on_wheel
					on:dblclick=on_dblclick
					style="display: block; cursor: grab;"
				/>
				<input
					node_ref=editor_ref
					type="text"
					class="node-text-editor"
					style="position: absolute; display: none; box-sizing: border-box; text-align: center;"
					on:blur=on_editor_blur
					on:keydown=on_editor_keydown
				/>
			</div>
		</div>
	}
}
