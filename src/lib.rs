//! Shotput - Paste selected text into chat clients as an image
//!
//! A global hotkey copies the current selection, renders it to a picture,
//! and pastes the picture back into the focused chat window. The library
//! exports the core modules for testing and potential reuse.

pub mod app;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod focus;
pub mod hotkey;
pub mod input;
pub mod logging;
pub mod pipeline;
pub mod render;
