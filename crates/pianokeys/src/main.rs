//! pianokeys - Virtual piano keyboard in the terminal
//!
//! Play with the mouse or the computer keyboard; notes go to a JACK MIDI port.

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event, KeyCode,
        KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::collections::HashMap;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use pianokeys::{
    config::{Config, KeyboardLayout, Theme},
    midi::{is_jack_running, list_jack_midi_ports, JackNoteSink, LogNoteSink, NoteSink},
    surface::{Surface, TerminalSurface},
    ui::{self, KeyboardView},
    widget::KeyboardWidget,
};

#[derive(Parser)]
#[command(name = "pianokeys")]
#[command(author, version, about = "Virtual piano keyboard for the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path (default: ~/.config/pianokeys/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use US QWERTY layout instead of German QWERTZ
    #[arg(long)]
    us_layout: bool,

    /// JACK client name
    #[arg(long)]
    client_name: Option<String>,

    /// Octave of the lowest key (-1 to 9, 3 is C3)
    #[arg(short, long, allow_negative_numbers = true)]
    octave: Option<i32>,

    /// Number of octaves shown (1-10)
    #[arg(long)]
    octaves: Option<u8>,

    /// MIDI channel (0-15)
    #[arg(long)]
    channel: Option<u8>,

    /// Velocity (1-127)
    #[arg(long)]
    velocity: Option<u8>,

    /// Ignore the computer keyboard, play with the mouse only
    #[arg(long)]
    no_keyboard: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default configuration file
    Init,
    /// Show the configuration file path
    ConfigPath,
    /// List available JACK MIDI ports
    ListPorts,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => {
            let path = Config::create_default_config_file()?;
            println!("Created default config at: {}", path.display());
            return Ok(());
        }
        Some(Commands::ConfigPath) => {
            let path = Config::config_path()?;
            println!("{}", path.display());
            return Ok(());
        }
        Some(Commands::ListPorts) => {
            if !is_jack_running() {
                println!("JACK is not running");
                return Ok(());
            }
            let ports = list_jack_midi_ports();
            if ports.is_empty() {
                println!("No JACK MIDI input ports found");
            } else {
                println!("Available JACK MIDI input ports:");
                for port in ports {
                    println!("  {}", port);
                }
            }
            return Ok(());
        }
        None => {}
    }

    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load_or_default(),
    };

    // Apply CLI overrides
    if cli.us_layout {
        config.keyboard.layout = KeyboardLayout::Us;
    }
    if let Some(octave) = cli.octave {
        config.keyboard.octave = octave;
    }
    if let Some(octaves) = cli.octaves {
        config.keyboard.octaves = octaves;
    }
    if let Some(channel) = cli.channel {
        config.keyboard.channel = channel;
    }
    if let Some(velocity) = cli.velocity {
        config.keyboard.velocity = velocity;
    }
    if let Some(name) = cli.client_name {
        config.midi.client_name = name;
    }
    if cli.no_keyboard {
        config.keyboard.enable_keyboard_input = false;
    }
    config.validate()?;

    run_tui(config)
}

fn create_sink(config: &Config) -> Box<dyn NoteSink> {
    if !is_jack_running() {
        log::warn!("JACK is not running, MIDI output disabled");
        return Box::new(LogNoteSink);
    }
    match JackNoteSink::from_settings(&config.midi, config.keyboard.channel, config.keyboard.velocity) {
        Ok(sink) => Box::new(sink),
        Err(e) => {
            log::warn!("Failed to create JACK MIDI output: {}", e);
            Box::new(LogNoteSink)
        }
    }
}

fn run_tui(config: Config) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;

    let reports_releases = matches!(supports_keyboard_enhancement(), Ok(true));
    if reports_releases {
        execute!(stdout, PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES))?;
    } else {
        log::warn!(
            "terminal does not report key releases, notes are released {}ms after the last key repeat",
            config.keyboard.note_release_ms
        );
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let sink = create_sink(&config);
    let port_name = sink.is_connected().then(|| sink.port_name().to_string());
    let mut widget = KeyboardWidget::new(TerminalSurface::default(), config.to_widget_options())
        .with_listener(move |event| sink.send(event));

    let timeouts = (!reports_releases).then(|| KeyTimeouts::new(Duration::from_millis(config.keyboard.note_release_ms)));
    let mut app = App {
        widget: &mut widget,
        theme: &config.theme,
        port_name: port_name.as_deref(),
        keys_area: Rect::default(),
        mouse_inside: false,
        timeouts,
    };

    let result = app.run(&mut terminal);

    // Cleanup
    if reports_releases {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture, DisableFocusChange)?;

    result
}

/// Releases keys whose auto-repeat stopped, for terminals that never report key releases
struct KeyTimeouts {
    last_seen: HashMap<char, Instant>,
    timeout: Duration,
}

impl KeyTimeouts {
    fn new(timeout: Duration) -> Self {
        Self { last_seen: HashMap::new(), timeout }
    }

    fn touch(&mut self, key: char) {
        self.last_seen.insert(key, Instant::now());
    }

    fn expired(&mut self) -> Vec<char> {
        let now = Instant::now();
        let expired: Vec<char> = self
            .last_seen
            .iter()
            .filter(|(_, &seen)| now.duration_since(seen) > self.timeout)
            .map(|(&key, _)| key)
            .collect();
        for key in &expired {
            self.last_seen.remove(key);
        }
        expired
    }

    fn clear(&mut self) {
        self.last_seen.clear();
    }
}

struct App<'a> {
    widget: &'a mut KeyboardWidget<TerminalSurface>,
    theme: &'a Theme,
    port_name: Option<&'a str>,
    /// Where the keys were last drawn, for mapping mouse positions
    keys_area: Rect,
    mouse_inside: bool,
    timeouts: Option<KeyTimeouts>,
}

impl App<'_> {
    fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.draw(terminal)?;

            if let Some(timeouts) = self.timeouts.as_mut() {
                for key in timeouts.expired() {
                    self.widget.key_up(key);
                }
            }

            if !event::poll(Duration::from_millis(16))? {
                continue;
            }
            match event::read()? {
                Event::Key(key) => {
                    if !self.handle_key(key) {
                        self.release_all();
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => self.handle_mouse(mouse),
                Event::FocusLost => self.release_all(),
                _ => {}
            }
        }
    }

    fn draw(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        let widget = &mut *self.widget;
        let theme = self.theme;
        let port_name = self.port_name;
        let mut keys_area = self.keys_area;

        terminal.draw(|frame| {
            let area = frame.area();
            let keys = if ui::fits(area) { ui::keyboard_area(area) } else { Rect::default() };
            if widget.surface().size() != (keys.width as f32, keys.height as f32) {
                log::debug!("keyboard resized to {}x{}", keys.width, keys.height);
                widget.resize(keys.width as f32, keys.height as f32);
            }
            frame.render_widget(KeyboardView::new(widget, theme).port_name(port_name), area);
            keys_area = keys;
        })?;

        self.keys_area = keys_area;
        Ok(())
    }

    /// Returns false when the app should quit
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.kind {
            KeyEventKind::Press => {}
            KeyEventKind::Release => {
                if let KeyCode::Char(c) = key.code {
                    self.widget.key_up(c);
                }
                return true;
            }
            KeyEventKind::Repeat => return true,
        }

        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
            KeyCode::Char('<') | KeyCode::Left => self.widget.change_octave(-1),
            KeyCode::Char('>') | KeyCode::Right => self.widget.change_octave(1),
            KeyCode::Char(c) => {
                self.widget.key_down(c);
                if let Some(timeouts) = self.timeouts.as_mut() {
                    timeouts.touch(c);
                }
            }
            _ => {}
        }
        true
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let position = self.to_surface(mouse.column, mouse.row);
        match (mouse.kind, position) {
            (MouseEventKind::Down(MouseButton::Left), Some((x, y))) => {
                self.mouse_inside = true;
                self.widget.mouse_down(x, y);
            }
            (MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved, Some((x, y))) => {
                self.mouse_inside = true;
                self.widget.mouse_move(x, y);
            }
            (MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved, None) => {
                if self.mouse_inside {
                    self.mouse_inside = false;
                    self.widget.mouse_leave();
                }
            }
            (MouseEventKind::Up(MouseButton::Left), _) => self.widget.mouse_up(),
            _ => {}
        }
    }

    /// Terminal cell -> surface coordinates of the cell centre
    fn to_surface(&self, column: u16, row: u16) -> Option<(f32, f32)> {
        let area = self.keys_area;
        let inside = column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height;
        inside.then(|| ((column - area.x) as f32 + 0.5, (row - area.y) as f32 + 0.5))
    }

    fn release_all(&mut self) {
        self.widget.release_all_keys();
        self.mouse_inside = false;
        if let Some(timeouts) = self.timeouts.as_mut() {
            timeouts.clear();
        }
    }
}
