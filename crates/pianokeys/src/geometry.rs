//! Key rectangles and hit-testing
//!
//! White keys are equal-width columns spanning the full height. Black keys are
//! narrower and shorter, centred on the boundary between two white keys, and
//! are drawn (and hit-tested) on top of them.
//!
//! ```text
//!  w b w b w w b w b w b w
//!    0   1     2   3   4      black index
//!  0   1   2 3   4   5   6    white index
//!  0 1 2 3 4 5 6 7 8 9 A B    semitone
//! ```

use crate::note::{BLACK_SEMITONES, MAX_NOTE, WHITE_SEMITONES, is_black_semitone};

/// Black key width relative to a white key
pub const BLACK_KEY_WIDTH_RATIO: f32 = 0.8;

/// Black key height relative to the keyboard height
pub const BLACK_KEY_HEIGHT_RATIO: f32 = 0.5;

/// Largest number of octaves that fits in the MIDI note range
pub const MAX_OCTAVES: u8 = 10;

/// Boundary (in white key widths from the octave start) each black key is centred on
const BLACK_KEY_BOUNDARIES: [f32; 5] = [1.0, 2.0, 4.0, 5.0, 6.0];

/// Axis-aligned rectangle of a single key, in surface units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl KeyRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Strict containment: points on an edge are outside
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px > self.x && px < self.x + self.width && py > self.y && py < self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Layout of a keyboard of `octaves` octaves starting at `lowest_note`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyboardGeometry {
    width: f32,
    height: f32,
    octaves: u8,
    lowest_note: u8,
}

impl KeyboardGeometry {
    /// Create a layout; `octaves` is clamped to 1..=10 and `lowest_note` so
    /// that the highest key is still a valid MIDI note
    pub fn new(width: f32, height: f32, octaves: u8, lowest_note: u8) -> Self {
        let octaves = octaves.clamp(1, MAX_OCTAVES);
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            octaves,
            lowest_note: lowest_note.min(Self::max_lowest_note(octaves)),
        }
    }

    /// Highest lowest-note for which every key of `octaves` octaves is a valid MIDI note
    pub fn max_lowest_note(octaves: u8) -> u8 {
        let span = 12 * octaves.clamp(1, MAX_OCTAVES) as u16;
        (MAX_NOTE as u16 + 1 - span) as u8
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn octaves(&self) -> u8 {
        self.octaves
    }

    pub fn lowest_note(&self) -> u8 {
        self.lowest_note
    }

    /// Highest note shown on the keyboard
    pub fn highest_note(&self) -> u8 {
        self.lowest_note + 12 * self.octaves - 1
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    /// Set the lowest note, clamped to the valid range. Returns the value applied.
    pub fn set_lowest_note(&mut self, note: i32) -> u8 {
        let max = Self::max_lowest_note(self.octaves) as i32;
        self.lowest_note = note.clamp(0, max) as u8;
        self.lowest_note
    }

    pub fn white_key_count(&self) -> usize {
        self.octaves as usize * 7
    }

    pub fn white_key_width(&self) -> f32 {
        self.width / self.white_key_count() as f32
    }

    pub fn white_key_height(&self) -> f32 {
        self.height
    }

    pub fn black_key_width(&self) -> f32 {
        BLACK_KEY_WIDTH_RATIO * self.white_key_width()
    }

    pub fn black_key_height(&self) -> f32 {
        BLACK_KEY_HEIGHT_RATIO * self.height
    }

    /// Rectangle of the white key at `index`, counted from the left edge
    pub fn white_key_rect(&self, index: usize) -> KeyRect {
        let w = self.white_key_width();
        KeyRect::new(index as f32 * w, 0.0, w, self.white_key_height())
    }

    /// Rectangle of black key `index` (0..5) within `octave`
    pub fn black_key_rect(&self, octave: usize, index: usize) -> KeyRect {
        let ww = self.white_key_width();
        let bw = self.black_key_width();
        let octave_offset = octave as f32 * 7.0 * ww;
        KeyRect::new(
            octave_offset + BLACK_KEY_BOUNDARIES[index] * ww - 0.5 * bw,
            0.0,
            bw,
            self.black_key_height(),
        )
    }

    /// All white keys as (note, rect), left to right
    pub fn white_keys(&self) -> impl Iterator<Item = (u8, KeyRect)> + '_ {
        (0..self.white_key_count()).map(move |i| {
            let note = self.lowest_note + (i / 7) as u8 * 12 + WHITE_SEMITONES[i % 7];
            (note, self.white_key_rect(i))
        })
    }

    /// All black keys as (note, rect), left to right
    pub fn black_keys(&self) -> impl Iterator<Item = (u8, KeyRect)> + '_ {
        (0..self.octaves as usize).flat_map(move |octave| {
            (0..BLACK_SEMITONES.len()).map(move |j| {
                let note = self.lowest_note + octave as u8 * 12 + BLACK_SEMITONES[j];
                (note, self.black_key_rect(octave, j))
            })
        })
    }

    /// Note under the point (x, y), black keys first
    pub fn coordinate_to_note(&self, x: f32, y: f32) -> Option<u8> {
        self.black_keys()
            .chain(self.white_keys())
            .find(|(_, rect)| rect.contains(x, y))
            .map(|(note, _)| note)
    }

    /// Rectangle of `note`, or None when it is not on the keyboard
    pub fn note_to_rect(&self, note: u8) -> Option<KeyRect> {
        if note < self.lowest_note || note > self.highest_note() {
            return None;
        }
        let offset = (note - self.lowest_note) as usize;
        let octave = offset / 12;
        let semitone = (offset % 12) as u8;

        if is_black_semitone(semitone) {
            let index = BLACK_SEMITONES.iter().position(|&s| s == semitone)?;
            Some(self.black_key_rect(octave, index))
        } else {
            let index = WHITE_SEMITONES.iter().position(|&s| s == semitone)?;
            Some(self.white_key_rect(octave * 7 + index))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> KeyboardGeometry {
        KeyboardGeometry::new(700.0, 200.0, 2, 48)
    }

    #[test]
    fn test_white_key_examples() {
        let g = geometry();
        // White index 0 of octave 0
        let (x, _) = g.white_key_rect(0).center();
        assert_eq!(g.coordinate_to_note(x, 180.0), Some(48));

        // White index 6 of octave 1
        let (x, _) = g.white_key_rect(7 + 6).center();
        assert_eq!(g.coordinate_to_note(x, 180.0), Some(48 + 12 + 11));
    }

    #[test]
    fn test_black_keys_take_priority() {
        let g = geometry();
        let boundary = g.white_key_width();

        // Upper half on the C/D boundary is C#
        assert_eq!(g.coordinate_to_note(boundary + 1.0, 10.0), Some(49));
        // Lower half at the same x is a white key
        assert_eq!(g.coordinate_to_note(boundary + 1.0, 150.0), Some(50));
        assert_eq!(g.coordinate_to_note(boundary - 1.0, 150.0), Some(48));
    }

    #[test]
    fn test_outside_points() {
        let g = geometry();
        assert_eq!(g.coordinate_to_note(-5.0, 50.0), None);
        assert_eq!(g.coordinate_to_note(50.0, 250.0), None);
        assert_eq!(g.coordinate_to_note(701.0, 150.0), None);
        // Edges are not inside any key
        assert_eq!(g.coordinate_to_note(g.white_key_width(), 150.0), None);
        assert_eq!(g.coordinate_to_note(20.0, 0.0), None);
    }

    #[test]
    fn test_round_trip_all_layouts() {
        for octaves in 1..=MAX_OCTAVES {
            for lowest in [0u8, 12, 24, 48, KeyboardGeometry::max_lowest_note(octaves)] {
                let g = KeyboardGeometry::new(840.0, 120.0, octaves, lowest);
                for note in g.lowest_note()..=g.highest_note() {
                    let rect = g.note_to_rect(note).unwrap();
                    // Bottom of a white key, top of a black key
                    let x = rect.x + rect.width / 2.0;
                    let y = rect.y + rect.height * 0.75;
                    assert_eq!(g.coordinate_to_note(x, y), Some(note), "octaves={} lowest={}", octaves, lowest);
                }
            }
        }
    }

    #[test]
    fn test_note_to_rect_out_of_range() {
        let g = geometry();
        assert!(g.note_to_rect(47).is_none());
        assert!(g.note_to_rect(72).is_none());
        assert!(g.note_to_rect(71).is_some());
    }

    #[test]
    fn test_black_keys_within_neighbours() {
        for octaves in 1..=4 {
            let g = KeyboardGeometry::new(333.0, 90.0, octaves, 36);
            for octave in 0..octaves as usize {
                for (j, boundary) in BLACK_KEY_BOUNDARIES.iter().enumerate() {
                    let black = g.black_key_rect(octave, j);
                    let left = g.white_key_rect(octave * 7 + *boundary as usize - 1);
                    let right = g.white_key_rect(octave * 7 + *boundary as usize);
                    assert!(black.x >= left.x);
                    assert!(black.right() <= right.right());
                    assert!(black.bottom() <= left.bottom());
                }
            }
        }
    }

    #[test]
    fn test_key_iterators() {
        let g = geometry();
        let whites: Vec<u8> = g.white_keys().map(|(n, _)| n).collect();
        let blacks: Vec<u8> = g.black_keys().map(|(n, _)| n).collect();
        assert_eq!(whites.len(), 14);
        assert_eq!(blacks.len(), 10);
        assert_eq!(&whites[..7], &[48, 50, 52, 53, 55, 57, 59]);
        assert_eq!(&blacks[..5], &[49, 51, 54, 56, 58]);
    }

    #[test]
    fn test_lowest_note_clamping() {
        let mut g = geometry();
        assert_eq!(KeyboardGeometry::max_lowest_note(2), 104);
        assert_eq!(g.set_lowest_note(200), 104);
        assert_eq!(g.highest_note(), 127);
        assert_eq!(g.set_lowest_note(-12), 0);
        assert_eq!(KeyboardGeometry::new(10.0, 10.0, 10, 100).lowest_note(), 8);
    }
}
