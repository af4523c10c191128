mod browser;
mod codec;
mod component;
mod config;
mod error;
mod export;
mod layout;
mod render;
mod session;
mod store;
mod suggest;
mod types;

pub use component::MindMapEditor;
pub use config::MindMapConfig;
