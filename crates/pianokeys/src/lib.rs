//! pianokeys - Virtual piano keyboard widget
//!
//! A piano keyboard drawn onto a [`Surface`] that turns mouse, touch and
//! computer keyboard input into note on/off events.
//! Features include:
//!
//! - Black-over-white hit-testing with `coordinate_to_note` / `note_to_rect`
//! - Mouse drag and multi-touch glissando (off for the old key, on for the new one)
//! - Separate "external" key state for showing notes from another source
//! - A terminal surface rendered with ratatui, and JACK MIDI output
//!
//! # Usage as a Library
//!
//! ```no_run
//! use pianokeys::{KeyboardWidget, TerminalSurface, WidgetOptions};
//!
//! let mut keyboard = KeyboardWidget::new(TerminalSurface::new(56, 8), WidgetOptions::default())
//!     .with_listener(|event| println!("{:?}", event));
//!
//! // Click the lowest key, then drag to the next white key
//! keyboard.mouse_down(2.0, 6.5);
//! keyboard.mouse_move(6.0, 6.5);
//! keyboard.mouse_up();
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod layout;
pub mod midi;
pub mod note;
pub mod surface;
pub mod ui;
pub mod widget;

// Re-export main types
pub use config::{Config, KeyboardLayout, Theme};
pub use error::{Error, Result};
pub use event::{NoteEvent, NoteEventKind};
pub use geometry::{KeyRect, KeyboardGeometry};
pub use layout::{KeyBinding, KeyBindings};
pub use midi::{JackNoteSink, LogNoteSink, NoteSink};
pub use note::{note_name, note_to_frequency, C3_MIDI};
pub use surface::{Surface, TerminalSurface};
pub use ui::KeyboardView;
pub use widget::{KeyboardWidget, Palette, PointerId, TouchPoint, WidgetOptions, MAX_TOUCHES};
