//! # Fenestra
//!
//! A small cross-platform windowing layer: native windows with an OpenGL
//! context, driven by an explicit event pump.
//!
//! A [`Window`] is created hidden, configured, shown, then pumped:
//!
//! ```no_run
//! use fenestra::{ContextSettings, Size, Window};
//!
//! # fn main() -> Result<(), fenestra::Error> {
//! let mut window = Window::new("hello", Size::new(800, 600), ContextSettings::default())?;
//! window.set_on_resize_callback(|size| println!("resized to {size:?}"));
//! window.show();
//!
//! while !window.should_close() {
//!     window.process_events();
//!     window.context().swap_buffers();
//! }
//! # Ok(())
//! # }
//! ```
//!
//! All window methods must be called on the thread that created the window.
//! Callbacks fire synchronously from [`Window::process_events`].

mod callbacks;
mod context;
mod error;
mod geometry;
mod input;
mod os;
mod window;

pub use context::{Api, Context, ContextSettings, Version};
pub use error::Error;
pub use geometry::{CursorPosition, Position, ScrollOffset, Size};
pub use input::{KeyCode, Modifiers, MouseButton};
pub use window::{State, Window};

#[cfg(target_os = "linux")]
pub extern crate x11_dl;
