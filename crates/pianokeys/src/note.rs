//! Note numbers and the piano octave pattern

/// MIDI note number for C3, the default lowest key of the widget
pub const C3_MIDI: u8 = 48;

/// Highest valid MIDI note number
pub const MAX_NOTE: u8 = 127;

/// Semitone offsets of the seven white keys within an octave (C D E F G A B)
pub const WHITE_SEMITONES: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Semitone offsets of the five black keys within an octave (C# D# F# G# A#)
pub const BLACK_SEMITONES: [u8; 5] = [1, 3, 6, 8, 10];

/// Check if a semitone within the octave (0-11) is a black key
pub fn is_black_semitone(semitone: u8) -> bool {
    BLACK_SEMITONES.contains(&(semitone % 12))
}

/// Frequency in Hz of a note in twelve-tone equal temperament (A4 = 69 = 440 Hz)
pub fn note_to_frequency(note: u8) -> f32 {
    440.0 * 2.0f32.powf((note as f32 - 69.0) / 12.0)
}

/// Convert a MIDI note number to a note name
pub fn note_name(note: u8) -> String {
    let names = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
    let octave = (note / 12) as i8 - 1;
    let name = names[(note % 12) as usize];
    format!("{}{}", name, octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_name() {
        assert_eq!(note_name(48), "C3");
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(0), "C-1");
        assert_eq!(note_name(71), "B4");
    }

    #[test]
    fn test_note_to_frequency() {
        assert!((note_to_frequency(69) - 440.0).abs() < 1e-3);
        assert!((note_to_frequency(81) - 880.0).abs() < 1e-2);
        assert!((note_to_frequency(60) - 261.626).abs() < 1e-2);
    }

    #[test]
    fn test_octave_pattern() {
        let mut all: Vec<u8> = WHITE_SEMITONES.iter().chain(BLACK_SEMITONES.iter()).copied().collect();
        all.sort();
        assert_eq!(all, (0..12).collect::<Vec<u8>>());
        assert!(is_black_semitone(1));
        assert!(is_black_semitone(13));
        assert!(!is_black_semitone(4));
    }
}
