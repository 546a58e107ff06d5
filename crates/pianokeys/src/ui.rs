//! TUI rendering for the keyboard widget
//!
//! The widget draws itself onto a [`TerminalSurface`]; [`KeyboardView`] frames
//! that surface with a title, a status line and a help line.

use crate::config::Theme;
use crate::note::note_name;
use crate::surface::TerminalSurface;
use crate::widget::KeyboardWidget;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Smallest keyboard area worth drawing
pub const MIN_KEYBOARD_WIDTH: u16 = 14;
pub const MIN_KEYBOARD_HEIGHT: u16 = 3;

/// Area left for the keys inside the frame drawn by [`KeyboardView`]
pub fn keyboard_area(area: Rect) -> Rect {
    let inner = Block::default().borders(Borders::ALL).inner(area);
    Rect {
        height: inner.height.saturating_sub(1),
        ..inner
    }
}

/// Whether `area` is large enough to show the keyboard
pub fn fits(area: Rect) -> bool {
    let keys = keyboard_area(area);
    keys.width >= MIN_KEYBOARD_WIDTH && keys.height >= MIN_KEYBOARD_HEIGHT
}

/// Frame, status line and keys of a terminal keyboard
pub struct KeyboardView<'a> {
    widget: &'a KeyboardWidget<TerminalSurface>,
    port_name: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> KeyboardView<'a> {
    pub fn new(widget: &'a KeyboardWidget<TerminalSurface>, theme: &'a Theme) -> Self {
        Self { widget, port_name: None, theme }
    }

    /// Set the MIDI port name to display
    pub fn port_name(mut self, name: Option<&'a str>) -> Self {
        self.port_name = name;
        self
    }

    fn title(&self) -> String {
        match self.port_name {
            Some(port) => format!(" Piano [{}] -> {} ", self.widget.octave_name(), port),
            None => format!(" Piano [{}] (MIDI not connected) ", self.widget.octave_name()),
        }
    }

    fn status_line(&self) -> Line<'static> {
        let mut notes: Vec<u8> = self.widget.pressed_notes().chain(self.widget.external_notes()).collect();
        notes.sort_unstable();
        notes.dedup();
        let playing = if notes.is_empty() {
            "-".to_string()
        } else {
            notes.iter().map(|n| note_name(*n)).collect::<Vec<_>>().join(" ")
        };
        Line::from(vec![
            Span::styled("Playing: ", Style::default().fg(Color::DarkGray)),
            Span::styled(playing, Style::default().fg(self.theme.border()).add_modifier(Modifier::BOLD)),
        ])
    }
}

impl Widget for KeyboardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut block = Block::default()
            .title(self.title())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border()));
        if self.theme.show_help {
            let help = if self.widget.keyboard_input_enabled() {
                " <> octave | keys/mouse play | Esc quit "
            } else {
                " <> octave | mouse plays | Esc quit "
            };
            block = block.title_bottom(help);
        }
        block.render(area, buf);

        if !fits(area) {
            return;
        }
        let keys = keyboard_area(area);
        self.widget.surface().render(keys, buf);

        let status = Rect { y: keys.y + keys.height, height: 1, ..keys };
        Paragraph::new(self.status_line()).render(status, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::WidgetOptions;

    #[test]
    fn test_keyboard_area() {
        let keys = keyboard_area(Rect::new(0, 0, 30, 10));
        assert_eq!(keys, Rect::new(1, 1, 28, 7));
        assert!(fits(Rect::new(0, 0, 30, 10)));
        assert!(!fits(Rect::new(0, 0, 10, 10)));
        assert!(!fits(Rect::new(0, 0, 30, 4)));
    }

    #[test]
    fn test_view_renders_keys_and_status() {
        let area = Rect::new(0, 0, 30, 10);
        let keys = keyboard_area(area);
        let mut widget = KeyboardWidget::new(TerminalSurface::new(keys.width, keys.height), WidgetOptions::default());
        widget.press_key(48);

        let theme = Theme::default();
        let mut buf = Buffer::empty(area);
        KeyboardView::new(&widget, &theme).port_name(Some("pianokeys:midi_out")).render(area, &mut buf);

        // 28 columns over 14 white keys: C is columns 0-1, bottom rows are below the black keys
        let c_bottom = buf.cell((keys.x + 1, keys.y + keys.height - 1)).unwrap();
        assert_eq!(c_bottom.bg, Color::Red);
        let d_bottom = buf.cell((keys.x + 3, keys.y + keys.height - 1)).unwrap();
        assert_eq!(d_bottom.bg, Color::White);

        let status: String = (keys.x..keys.x + 12)
            .map(|x| buf.cell((x, keys.y + keys.height)).unwrap().symbol().to_string())
            .collect();
        assert_eq!(status, "Playing: C3 ");

        let title: String = (1..12).map(|x| buf.cell((x, 0)).unwrap().symbol().to_string()).collect();
        assert_eq!(title, " Piano [C3]");
    }
}
