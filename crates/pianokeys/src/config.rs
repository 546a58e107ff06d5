//! Configuration file support for pianokeys
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/pianokeys/config.toml`
//! - macOS: `~/Library/Application Support/pianokeys/config.toml`
//! - Windows: `%APPDATA%\pianokeys\config.toml`

use crate::error::{Error, Result};
use crate::geometry::MAX_OCTAVES;
use crate::layout::{KeyBinding, KeyBindings};
use crate::widget::{Palette, WidgetOptions, DEFAULT_OCTAVES};
use directories::ProjectDirs;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default octave of the lowest key (C3 = note 48)
pub const DEFAULT_OCTAVE: i32 = 3;

/// Default velocity for note on messages
pub const DEFAULT_VELOCITY: u8 = 100;

/// Default auto-release timeout in milliseconds
/// Must be longer than the OS key repeat delay (typically 300-500ms)
pub const DEFAULT_NOTE_RELEASE_MS: u64 = 400;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keyboard configuration
    pub keyboard: KeyboardSettings,
    /// MIDI configuration
    pub midi: MidiSettings,
    /// Colour configuration
    pub theme: Theme,
}

impl Config {
    /// Load configuration from the default config file location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Err(Error::Config(format!("Config file not found at {:?}", path)))
        }
    }

    /// Load and validate configuration from `path`
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration or return default if not found
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("using default configuration: {}", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the default config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "pianokeys") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Err(Error::Config("Could not determine config directory".to_string()))
        }
    }

    /// Create a default config file with comments
    pub fn create_default_config_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, DEFAULT_CONFIG_FILE)?;
        Ok(path)
    }

    /// Reject values the widget or the MIDI encoder cannot represent
    pub fn validate(&self) -> Result<()> {
        let k = &self.keyboard;
        if k.octaves == 0 || k.octaves > MAX_OCTAVES {
            return Err(Error::Config(format!("octaves must be 1-{}, got {}", MAX_OCTAVES, k.octaves)));
        }
        if k.channel > 15 {
            return Err(Error::Config(format!("channel must be 0-15, got {}", k.channel)));
        }
        if k.velocity == 0 || k.velocity > 127 {
            return Err(Error::Config(format!("velocity must be 1-127, got {}", k.velocity)));
        }
        if k.layout == KeyboardLayout::Custom && k.custom_mappings.as_ref().map_or(true, |m| m.is_empty()) {
            return Err(Error::Config("layout = \"custom\" requires custom_mappings".to_string()));
        }
        Ok(())
    }

    /// Key bindings for the configured layout
    pub fn bindings(&self) -> KeyBindings {
        match self.keyboard.layout {
            KeyboardLayout::German => KeyBindings::german(),
            KeyboardLayout::Us => KeyBindings::us(),
            KeyboardLayout::Custom => match self.keyboard.custom_mappings {
                Some(ref mappings) => KeyBindings::new(mappings.iter().map(CustomKeyMapping::to_binding)),
                None => KeyBindings::german(),
            },
        }
    }

    /// Convert to construction options for the widget
    pub fn to_widget_options(&self) -> WidgetOptions {
        let octave = self.keyboard.octave.clamp(-1, 9);
        WidgetOptions {
            octaves: self.keyboard.octaves,
            lowest_note: (12 + 12 * octave) as u8,
            octave: None,
            enable_keyboard_input: self.keyboard.enable_keyboard_input,
            bindings: self.bindings(),
            palette: self.theme.palette(),
        }
    }
}

const DEFAULT_CONFIG_FILE: &str = r##"# pianokeys configuration file

[keyboard]
# Computer keyboard layout: "german", "us", or "custom"
layout = "german"

# Number of octaves shown (1-10)
octaves = 2

# Octave of the lowest key (3 = C3 = MIDI note 48)
octave = 3

# Play notes from the computer keyboard
enable_keyboard_input = true

# Velocity of note on messages (1-127)
velocity = 100

# MIDI channel (0-15)
channel = 0

# Auto-release timeout in milliseconds
# Only used when the terminal cannot report key releases
note_release_ms = 400

# Custom bindings (only used when layout = "custom"), offsets from the lowest key
# custom_mappings = [
#     { key = "a", offset = 0 },
#     { key = "w", offset = 1 },
# ]

[midi]
# JACK client name
client_name = "pianokeys"

# MIDI output port name
port_name = "midi_out"

# Connect to these JACK MIDI inputs on startup (optional)
# auto_connect = ["system:midi_playback_1"]

[theme]
# Key colours: names ("white", "dark_gray", ...) or "#rrggbb"
white_key_color = "white"
black_key_color = "#222222"
white_pressed_color = "red"
black_pressed_color = "red"
outline_color = "black"

# Frame around the keyboard
border_color = "cyan"

# Show keyboard shortcuts help
show_help = true
"##;

/// Computer keyboard layout preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyboardLayout {
    /// German QWERTZ layout
    #[default]
    German,
    /// US QWERTY layout
    Us,
    /// Custom layout (use custom_mappings)
    Custom,
}

/// Keyboard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardSettings {
    /// Computer keyboard layout preset
    pub layout: KeyboardLayout,
    /// Number of octaves shown
    pub octaves: u8,
    /// Octave of the lowest key
    pub octave: i32,
    /// Accept computer keyboard input
    pub enable_keyboard_input: bool,
    /// Velocity (1-127)
    pub velocity: u8,
    /// MIDI channel (0-15)
    pub channel: u8,
    /// Auto-release timeout for terminals that do not report key releases
    pub note_release_ms: u64,
    /// Custom key mappings (only used when layout = "custom")
    pub custom_mappings: Option<Vec<CustomKeyMapping>>,
}

impl Default for KeyboardSettings {
    fn default() -> Self {
        Self {
            layout: KeyboardLayout::German,
            octaves: DEFAULT_OCTAVES,
            octave: DEFAULT_OCTAVE,
            enable_keyboard_input: true,
            velocity: DEFAULT_VELOCITY,
            channel: 0,
            note_release_ms: DEFAULT_NOTE_RELEASE_MS,
            custom_mappings: None,
        }
    }
}

/// Custom key mapping for TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomKeyMapping {
    /// The key character
    pub key: char,
    /// Note offset from the lowest key
    pub offset: i8,
}

impl CustomKeyMapping {
    pub fn to_binding(&self) -> KeyBinding {
        KeyBinding::new(self.key, self.offset)
    }
}

/// MIDI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiSettings {
    /// JACK client name
    pub client_name: String,
    /// MIDI output port name
    pub port_name: String,
    /// Auto-connect to these JACK MIDI inputs
    pub auto_connect: Option<Vec<String>>,
}

impl Default for MidiSettings {
    fn default() -> Self {
        Self {
            client_name: "pianokeys".to_string(),
            port_name: "midi_out".to_string(),
            auto_connect: None,
        }
    }
}

/// Colour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub white_key_color: String,
    pub black_key_color: String,
    pub white_pressed_color: String,
    pub black_pressed_color: String,
    /// Outline between white keys
    pub outline_color: String,
    /// Frame around the keyboard
    pub border_color: String,
    /// Show help text
    pub show_help: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            white_key_color: "white".to_string(),
            black_key_color: "#222222".to_string(),
            white_pressed_color: "red".to_string(),
            black_pressed_color: "red".to_string(),
            outline_color: "black".to_string(),
            border_color: "cyan".to_string(),
            show_help: true,
        }
    }
}

impl Theme {
    /// Parse a colour name or `#rrggbb`; unknown values fall back to `fallback`
    pub fn parse_color(s: &str, fallback: Color) -> Color {
        match s.to_lowercase().as_str() {
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "magenta" => Color::Magenta,
            "cyan" => Color::Cyan,
            "gray" | "grey" => Color::Gray,
            "dark_gray" | "dark_grey" | "darkgray" | "darkgrey" => Color::DarkGray,
            "light_red" | "lightred" => Color::LightRed,
            "light_green" | "lightgreen" => Color::LightGreen,
            "light_yellow" | "lightyellow" => Color::LightYellow,
            "light_blue" | "lightblue" => Color::LightBlue,
            "light_magenta" | "lightmagenta" => Color::LightMagenta,
            "light_cyan" | "lightcyan" => Color::LightCyan,
            "white" => Color::White,
            s if s.starts_with('#') && s.len() == 7 && s.is_ascii() => {
                match (
                    u8::from_str_radix(&s[1..3], 16),
                    u8::from_str_radix(&s[3..5], 16),
                    u8::from_str_radix(&s[5..7], 16),
                ) {
                    (Ok(r), Ok(g), Ok(b)) => Color::Rgb(r, g, b),
                    _ => fallback,
                }
            }
            _ => {
                log::warn!("unknown colour {:?}", s);
                fallback
            }
        }
    }

    /// Key colours for the widget
    pub fn palette(&self) -> Palette {
        let defaults = Palette::default();
        Palette {
            white: Self::parse_color(&self.white_key_color, defaults.white),
            black: Self::parse_color(&self.black_key_color, defaults.black),
            white_pressed: Self::parse_color(&self.white_pressed_color, defaults.white_pressed),
            black_pressed: Self::parse_color(&self.black_pressed_color, defaults.black_pressed),
            outline: Self::parse_color(&self.outline_color, defaults.outline),
        }
    }

    /// Get border color
    pub fn border(&self) -> Color {
        Self::parse_color(&self.border_color, Color::Cyan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.keyboard.octaves, 2);
        assert_eq!(config.keyboard.octave, 3);
        assert_eq!(config.keyboard.velocity, 100);
        assert_eq!(config.keyboard.layout, KeyboardLayout::German);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_widget_options() {
        let options = Config::default().to_widget_options();
        assert_eq!(options.lowest_note, 48);
        assert_eq!(options.octaves, 2);
        assert!(options.enable_keyboard_input);
        assert_eq!(options.palette, Palette::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.keyboard.octave = 4;
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.keyboard.octave, 4);
        assert_eq!(parsed.midi.client_name, config.midi.client_name);
    }

    #[test]
    fn test_default_file_parses() {
        let parsed: Config = toml::from_str(DEFAULT_CONFIG_FILE).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.keyboard.octaves, 2);
        assert_eq!(parsed.theme.black_key_color, "#222222");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str("[keyboard]\noctaves = 4\n").unwrap();
        assert_eq!(parsed.keyboard.octaves, 4);
        assert_eq!(parsed.keyboard.octave, DEFAULT_OCTAVE);
        assert_eq!(parsed.midi.port_name, "midi_out");
    }

    #[test]
    fn test_save_and_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.keyboard.layout = KeyboardLayout::Us;
        config.keyboard.channel = 9;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.keyboard.layout, KeyboardLayout::Us);
        assert_eq!(loaded.keyboard.channel, 9);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[keyboard]\noctaves = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));

        fs::write(&path, "[keyboard\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::TomlParse(_))));
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        config.keyboard.channel = 16;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.keyboard.velocity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.keyboard.layout = KeyboardLayout::Custom;
        assert!(config.validate().is_err());
        config.keyboard.custom_mappings = Some(vec![CustomKeyMapping { key: 'a', offset: 0 }]);
        assert!(config.validate().is_ok());
        assert_eq!(config.bindings().offset_for('a'), Some(0));
    }

    #[test]
    fn test_color_parsing() {
        assert_eq!(Theme::parse_color("cyan", Color::White), Color::Cyan);
        assert_eq!(Theme::parse_color("White", Color::Red), Color::White);
        assert_eq!(Theme::parse_color("#ff0000", Color::White), Color::Rgb(255, 0, 0));
        assert_eq!(Theme::parse_color("#zz0000", Color::Green), Color::Green);
        assert_eq!(Theme::parse_color("mauve", Color::Blue), Color::Blue);
        // Seven bytes but not seven characters
        assert_eq!(Theme::parse_color("#aébcd", Color::White), Color::White);
    }
}
