//! Keyboard widget
//!
//! Owns the drawing surface, the key-down state of every input source and the
//! note event listeners. All input handlers run synchronously: state is
//! updated, events are emitted, and the surface is redrawn before they return.
//!
//! Three kinds of input feed the "direct" key state:
//!
//! - the computer keyboard, one held note per physical key;
//! - the mouse, a single pointer that can be dragged across keys;
//! - touch points, up to [`MAX_TOUCHES`] independent pointers.
//!
//! [`KeyboardWidget::press_key`] and [`KeyboardWidget::release_key`] drive a
//! separate "external" state that is only rendered, never emitted.

use crate::event::{Listeners, NoteEvent};
use crate::geometry::{KeyRect, KeyboardGeometry};
use crate::layout::{normalize_key, KeyBindings};
use crate::note::{note_name, C3_MIDI, MAX_NOTE};
use crate::surface::Surface;
use ratatui::style::Color;
use std::collections::{BTreeSet, HashMap};

/// Maximum number of simultaneous touches that are tracked
pub const MAX_TOUCHES: usize = 5;

/// Default number of octaves shown
pub const DEFAULT_OCTAVES: u8 = 2;

/// Identity of a pointer holding a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerId {
    Mouse,
    Touch(u64),
}

/// A touch point in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub fn new(id: u64, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }
}

/// Colours used to draw the keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub white: Color,
    pub black: Color,
    pub white_pressed: Color,
    pub black_pressed: Color,
    pub outline: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            white: Color::White,
            black: Color::Rgb(0x22, 0x22, 0x22),
            white_pressed: Color::Red,
            black_pressed: Color::Red,
            outline: Color::Black,
        }
    }
}

/// Construction options for [`KeyboardWidget`]
#[derive(Debug, Clone)]
pub struct WidgetOptions {
    /// Number of octaves shown
    pub octaves: u8,
    /// Lowest note before `octave` is applied
    pub lowest_note: u8,
    /// Initial octave shift relative to `lowest_note`
    pub octave: Option<i32>,
    /// Whether computer keyboard input is accepted
    pub enable_keyboard_input: bool,
    /// Computer key bindings
    pub bindings: KeyBindings,
    /// Key colours
    pub palette: Palette,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            octaves: DEFAULT_OCTAVES,
            lowest_note: C3_MIDI,
            octave: None,
            enable_keyboard_input: false,
            bindings: KeyBindings::default(),
            palette: Palette::default(),
        }
    }
}

/// Virtual piano keyboard drawn on a [`Surface`]
#[derive(Debug)]
pub struct KeyboardWidget<S: Surface> {
    surface: S,
    geometry: KeyboardGeometry,
    palette: Palette,
    bindings: KeyBindings,
    enable_keyboard_input: bool,
    /// Notes held through the widget's own input handling
    keys_down: BTreeSet<u8>,
    /// Notes held by an outside source, only rendered
    external_keys_down: BTreeSet<u8>,
    /// Pointer -> note it currently holds
    pointers: HashMap<PointerId, u8>,
    /// Computer key -> note it currently holds
    held_keys: HashMap<char, u8>,
    /// Mouse button is down over the widget
    mouse_held: bool,
    listeners: Listeners,
}

impl<S: Surface> KeyboardWidget<S> {
    /// Create a widget drawing on `surface` and render it once
    pub fn new(surface: S, options: WidgetOptions) -> Self {
        let (width, height) = surface.size();
        let mut widget = Self {
            surface,
            geometry: KeyboardGeometry::new(width, height, options.octaves, options.lowest_note),
            palette: options.palette,
            bindings: options.bindings,
            enable_keyboard_input: options.enable_keyboard_input,
            keys_down: BTreeSet::new(),
            external_keys_down: BTreeSet::new(),
            pointers: HashMap::new(),
            held_keys: HashMap::new(),
            mouse_held: false,
            listeners: Listeners::new(),
        };
        if let Some(octave) = options.octave {
            widget.change_octave(octave);
        }
        widget.render();
        widget
    }

    /// Builder form of [`add_listener`](Self::add_listener)
    pub fn with_listener<F>(mut self, listener: F) -> Self
    where
        F: FnMut(&NoteEvent) + 'static,
    {
        self.add_listener(listener);
        self
    }

    /// Register a listener for note events
    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&NoteEvent) + 'static,
    {
        self.listeners.add(listener);
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn geometry(&self) -> &KeyboardGeometry {
        &self.geometry
    }

    pub fn lowest_note(&self) -> u8 {
        self.geometry.lowest_note()
    }

    pub fn octaves(&self) -> u8 {
        self.geometry.octaves()
    }

    /// Name of the lowest key, e.g. "C3"
    pub fn octave_name(&self) -> String {
        note_name(self.lowest_note())
    }

    pub fn keyboard_input_enabled(&self) -> bool {
        self.enable_keyboard_input
    }

    /// Notes held by keyboard, mouse or touch input, ascending
    pub fn pressed_notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.keys_down.iter().copied()
    }

    /// Notes held through [`press_key`](Self::press_key), ascending
    pub fn external_notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.external_keys_down.iter().copied()
    }

    /// Whether `note` is drawn as pressed
    pub fn is_note_down(&self, note: u8) -> bool {
        self.keys_down.contains(&note) || self.external_keys_down.contains(&note)
    }

    /// Note currently held by `pointer`
    pub fn pointer_note(&self, pointer: PointerId) -> Option<u8> {
        self.pointers.get(&pointer).copied()
    }

    pub fn coordinate_to_note(&self, x: f32, y: f32) -> Option<u8> {
        self.geometry.coordinate_to_note(x, y)
    }

    pub fn note_to_rect(&self, note: u8) -> Option<KeyRect> {
        self.geometry.note_to_rect(note)
    }

    /// Shift the keyboard by `delta` octaves
    pub fn change_octave(&mut self, delta: i32) {
        let target = self.lowest_note() as i32 + 12 * delta;
        let applied = self.geometry.set_lowest_note(target);
        log::debug!("lowest note {} -> {}", target, applied);
        self.render();
    }

    /// Make C of `octave` the lowest key (octave 3 is note 48)
    pub fn set_lowest_octave(&mut self, octave: i32) {
        let applied = self.geometry.set_lowest_note(12 + 12 * octave);
        log::debug!("lowest octave {} -> note {}", octave, applied);
        self.render();
    }

    /// Show `note` as pressed on behalf of an outside source. No event is emitted.
    pub fn press_key(&mut self, note: u8) {
        if note <= MAX_NOTE && self.external_keys_down.insert(note) {
            self.render();
        }
    }

    /// Undo [`press_key`](Self::press_key). No event is emitted.
    pub fn release_key(&mut self, note: u8) {
        if self.external_keys_down.remove(&note) {
            self.render();
        }
    }

    /// Resize the surface and redraw
    pub fn resize(&mut self, width: f32, height: f32) {
        self.surface.resize(width, height);
        let (width, height) = self.surface.size();
        self.geometry.set_size(width, height);
        self.render();
    }

    /// Computer key pressed. Repeats of a held key are ignored.
    pub fn key_down(&mut self, key: char) {
        if !self.enable_keyboard_input {
            return;
        }
        let key = normalize_key(key);
        if self.held_keys.contains_key(&key) {
            return;
        }
        let Some(offset) = self.bindings.offset_for(key) else {
            return;
        };
        let note = (self.lowest_note() as i16 + offset as i16).clamp(0, MAX_NOTE as i16) as u8;
        if self.keys_down.contains(&note) {
            return;
        }
        self.held_keys.insert(key, note);
        self.note_on(note);
        self.render();
    }

    /// Computer key released
    pub fn key_up(&mut self, key: char) {
        if !self.enable_keyboard_input {
            return;
        }
        if let Some(note) = self.held_keys.remove(&normalize_key(key)) {
            self.note_off(note);
            self.render();
        }
    }

    /// Mouse button pressed at (x, y)
    pub fn mouse_down(&mut self, x: f32, y: f32) {
        self.mouse_held = true;
        match self.coordinate_to_note(x, y) {
            Some(note) => self.move_pointer(PointerId::Mouse, note),
            // A press missed by an earlier up must not keep its note
            None => self.release_pointer(PointerId::Mouse),
        }
    }

    /// Mouse moved to (x, y); only acts while the button is held
    pub fn mouse_move(&mut self, x: f32, y: f32) {
        if !self.mouse_held {
            return;
        }
        if let Some(note) = self.coordinate_to_note(x, y) {
            self.move_pointer(PointerId::Mouse, note);
        }
    }

    /// Mouse button released
    pub fn mouse_up(&mut self) {
        self.mouse_held = false;
        self.release_pointer(PointerId::Mouse);
    }

    /// Mouse left the widget: the mouse-held note is released
    pub fn mouse_leave(&mut self) {
        self.mouse_held = false;
        self.release_pointer(PointerId::Mouse);
    }

    /// New touches; `active` is the total number of touches on the surface
    pub fn touch_start(&mut self, changed: &[TouchPoint], active: usize) {
        if active > MAX_TOUCHES {
            return;
        }
        for touch in changed {
            let id = PointerId::Touch(touch.id);
            match self.coordinate_to_note(touch.x, touch.y) {
                Some(note) => self.move_pointer(id, note),
                // A reused id drops whatever its previous touch held
                None => self.release_pointer(id),
            }
        }
    }

    /// Moved touches; `active` is the total number of touches on the surface
    pub fn touch_move(&mut self, changed: &[TouchPoint], active: usize) {
        if active > MAX_TOUCHES {
            return;
        }
        for touch in changed {
            if let Some(note) = self.coordinate_to_note(touch.x, touch.y) {
                self.move_pointer(PointerId::Touch(touch.id), note);
            }
        }
    }

    /// Ended touches; `remaining` is the number of touches still on the surface
    pub fn touch_end(&mut self, changed: &[TouchPoint], remaining: usize) {
        let mut dirty = false;
        for touch in changed {
            if let Some(note) = self.pointers.remove(&PointerId::Touch(touch.id)) {
                self.note_off(note);
                dirty = true;
            }
        }
        if dirty {
            self.render();
        }

        // Nothing touches the surface any more, so nothing should be sounding
        if remaining == 0 && !self.keys_down.is_empty() {
            log::warn!(
                "{} note(s) still held after the last touch ended, releasing",
                self.keys_down.len()
            );
            self.release_all_keys();
        }
    }

    /// Release every directly held note, emitting "off" for each in ascending order
    pub fn release_all_keys(&mut self) {
        let notes = std::mem::take(&mut self.keys_down);
        self.pointers.clear();
        self.held_keys.clear();
        self.mouse_held = false;
        for note in notes {
            self.listeners.emit(NoteEvent::off(note));
        }
        self.render();
    }

    /// Redraw the whole keyboard
    pub fn render(&mut self) {
        self.surface.clear();
        for (note, rect) in self.geometry.white_keys() {
            let color = if self.is_note_down(note) { self.palette.white_pressed } else { self.palette.white };
            self.surface.fill_rect(rect, color);
            self.surface.stroke_rect(rect, self.palette.outline);
        }
        for (note, rect) in self.geometry.black_keys() {
            let color = if self.is_note_down(note) { self.palette.black_pressed } else { self.palette.black };
            self.surface.fill_rect(rect, color);
        }
    }

    /// Move `pointer` onto `note`: "off" for the note it held, then "on" for the new one
    fn move_pointer(&mut self, pointer: PointerId, note: u8) {
        if self.pointers.get(&pointer) == Some(&note) {
            return;
        }
        if let Some(previous) = self.pointers.remove(&pointer) {
            self.note_off(previous);
        }
        if !self.keys_down.contains(&note) {
            self.pointers.insert(pointer, note);
            self.note_on(note);
        }
        self.render();
    }

    fn release_pointer(&mut self, pointer: PointerId) {
        if let Some(note) = self.pointers.remove(&pointer) {
            self.note_off(note);
            self.render();
        }
    }

    fn note_on(&mut self, note: u8) {
        self.keys_down.insert(note);
        self.listeners.emit(NoteEvent::on(note));
    }

    fn note_off(&mut self, note: u8) {
        self.keys_down.remove(&note);
        self.listeners.emit(NoteEvent::off(note));
    }
}
