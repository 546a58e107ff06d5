//! MIDI output for note events
//!
//! The widget only emits [`NoteEvent`]s. A [`NoteSink`] turns them into MIDI
//! messages; [`JackNoteSink`] writes them to a JACK MIDI output port.

use crate::config::MidiSettings;
use crate::error::{Error, Result};
use crate::event::{NoteEvent, NoteEventKind};
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Raw note message for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
}

impl MidiMessage {
    /// Message for a widget event
    pub fn from_event(event: &NoteEvent, channel: u8, velocity: u8) -> Self {
        match event.kind {
            NoteEventKind::On => MidiMessage::NoteOn { channel, note: event.note, velocity },
            NoteEventKind::Off => MidiMessage::NoteOff { channel, note: event.note },
        }
    }

    /// Convert to raw MIDI bytes
    pub fn to_bytes(&self) -> [u8; 3] {
        match self {
            MidiMessage::NoteOn { channel, note, velocity } => {
                [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::NoteOff { channel, note } => [0x80 | (channel & 0x0F), note & 0x7F, 0],
        }
    }
}

/// Destination for note events
pub trait NoteSink {
    /// Forward one event
    fn send(&self, event: &NoteEvent);

    /// Name shown in the UI
    fn port_name(&self) -> &str;

    /// Whether events reach a real MIDI port
    fn is_connected(&self) -> bool;
}

/// JACK MIDI output
pub struct JackNoteSink {
    tx: Sender<MidiMessage>,
    channel: u8,
    velocity: u8,
    port_name: String,
    client: jack::AsyncClient<(), JackMidiHandler>,
}

impl JackNoteSink {
    /// Register `client_name:port_name` with the running JACK server
    pub fn new(client_name: &str, port_name: &str, channel: u8, velocity: u8) -> Result<Self> {
        let (client, _status) = jack::Client::new(client_name, jack::ClientOptions::NO_START_SERVER)?;
        let midi_out = client.register_port(port_name, jack::MidiOut::default())?;
        let full_port_name = midi_out.name()?;

        let (tx, rx) = unbounded();
        let client = client.activate_async((), JackMidiHandler { midi_out, rx })?;
        log::info!("JACK MIDI output registered: {}", full_port_name);

        Ok(Self {
            tx,
            channel: channel & 0x0F,
            velocity: velocity.clamp(1, 127),
            port_name: full_port_name,
            client,
        })
    }

    /// Create from settings and connect to the configured destinations
    pub fn from_settings(settings: &MidiSettings, channel: u8, velocity: u8) -> Result<Self> {
        let sink = Self::new(&settings.client_name, &settings.port_name, channel, velocity)?;
        for dest in settings.auto_connect.iter().flatten() {
            if let Err(e) = sink.connect_to(dest) {
                log::warn!("Failed to auto-connect to {}: {}", dest, e);
            }
        }
        Ok(sink)
    }

    /// Connect the output port to a JACK MIDI input port
    pub fn connect_to(&self, destination: &str) -> Result<()> {
        self.client
            .as_client()
            .connect_ports_by_name(&self.port_name, destination)
            .map_err(|e| Error::Midi(format!("connecting {} -> {}: {}", self.port_name, destination, e)))?;
        log::info!("connected {} -> {}", self.port_name, destination);
        Ok(())
    }
}

impl NoteSink for JackNoteSink {
    fn send(&self, event: &NoteEvent) {
        let msg = MidiMessage::from_event(event, self.channel, self.velocity);
        if self.tx.send(msg).is_err() {
            log::warn!("JACK process handler gone, dropping {}", event);
        }
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }

    fn is_connected(&self) -> bool {
        true
    }
}

/// JACK process handler for MIDI output
struct JackMidiHandler {
    midi_out: jack::Port<jack::MidiOut>,
    rx: Receiver<MidiMessage>,
}

impl jack::ProcessHandler for JackMidiHandler {
    fn process(&mut self, _client: &jack::Client, ps: &jack::ProcessScope) -> jack::Control {
        let mut writer = self.midi_out.writer(ps);
        while let Ok(msg) = self.rx.try_recv() {
            let bytes = msg.to_bytes();
            let raw = jack::RawMidi { time: 0, bytes: &bytes };
            let _ = writer.write(&raw);
        }
        jack::Control::Continue
    }
}

/// Sink that only logs, used when JACK is unavailable
#[derive(Debug, Default)]
pub struct LogNoteSink;

impl NoteSink for LogNoteSink {
    fn send(&self, event: &NoteEvent) {
        log::debug!("MIDI {}", event);
    }

    fn port_name(&self) -> &str {
        "log"
    }

    fn is_connected(&self) -> bool {
        false
    }
}

/// Check if JACK is running
pub fn is_jack_running() -> bool {
    jack::Client::new("pianokeys-probe", jack::ClientOptions::NO_START_SERVER).is_ok()
}

/// List available JACK MIDI input ports
pub fn list_jack_midi_ports() -> Vec<String> {
    match jack::Client::new("pianokeys-list", jack::ClientOptions::NO_START_SERVER) {
        Ok((client, _)) => client.ports(None, Some("midi"), jack::PortFlags::IS_INPUT),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_message_bytes() {
        let note_on = MidiMessage::NoteOn { channel: 0, note: 60, velocity: 100 };
        assert_eq!(note_on.to_bytes(), [0x90, 60, 100]);

        let note_off = MidiMessage::NoteOff { channel: 1, note: 48 };
        assert_eq!(note_off.to_bytes(), [0x81, 48, 0]);
    }

    #[test]
    fn test_from_event() {
        assert_eq!(
            MidiMessage::from_event(&NoteEvent::on(71), 2, 90),
            MidiMessage::NoteOn { channel: 2, note: 71, velocity: 90 }
        );
        assert_eq!(MidiMessage::from_event(&NoteEvent::off(71), 2, 90), MidiMessage::NoteOff { channel: 2, note: 71 });
    }

    #[test]
    fn test_log_sink() {
        let sink = LogNoteSink;
        sink.send(&NoteEvent::on(60));
        sink.send(&NoteEvent::off(60));
        assert!(!sink.is_connected());
        assert_eq!(sink.port_name(), "log");
    }
}
