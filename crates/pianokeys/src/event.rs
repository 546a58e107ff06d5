//! Note events and their synchronous broadcast

use std::fmt;

/// Whether a note starts or stops sounding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteEventKind {
    On,
    Off,
}

/// A note transition emitted by the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteEvent {
    pub note: u8,
    pub kind: NoteEventKind,
}

impl NoteEvent {
    pub fn on(note: u8) -> Self {
        Self { note, kind: NoteEventKind::On }
    }

    pub fn off(note: u8) -> Self {
        Self { note, kind: NoteEventKind::Off }
    }

    pub fn is_on(&self) -> bool {
        self.kind == NoteEventKind::On
    }
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            NoteEventKind::On => "on",
            NoteEventKind::Off => "off",
        };
        write!(f, "{} {}", kind, self.note)
    }
}

/// Listener callback invoked for every note event
pub type Listener = Box<dyn FnMut(&NoteEvent)>;

/// Registered listeners, called in registration order
#[derive(Default)]
pub struct Listeners {
    subs: Vec<Listener>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, listener: F)
    where
        F: FnMut(&NoteEvent) + 'static,
    {
        self.subs.push(Box::new(listener));
    }

    /// Deliver `event` to every listener immediately
    pub fn emit(&mut self, event: NoteEvent) {
        log::debug!("note {}", event);
        for sub in self.subs.iter_mut() {
            sub(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("count", &self.subs.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_emit_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::new();

        let first = log.clone();
        listeners.add(move |e| first.borrow_mut().push(("first", *e)));
        let second = log.clone();
        listeners.add(move |e| second.borrow_mut().push(("second", *e)));

        listeners.emit(NoteEvent::on(60));
        listeners.emit(NoteEvent::off(60));

        assert_eq!(
            *log.borrow(),
            vec![
                ("first", NoteEvent::on(60)),
                ("second", NoteEvent::on(60)),
                ("first", NoteEvent::off(60)),
                ("second", NoteEvent::off(60)),
            ]
        );
    }

    #[test]
    fn test_emit_without_listeners() {
        let mut listeners = Listeners::new();
        assert!(listeners.is_empty());
        listeners.emit(NoteEvent::on(1));
    }

    #[test]
    fn test_display() {
        assert_eq!(NoteEvent::on(48).to_string(), "on 48");
        assert_eq!(NoteEvent::off(71).to_string(), "off 71");
        assert!(NoteEvent::on(0).is_on());
    }
}
