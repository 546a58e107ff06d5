//! Computer keyboard bindings
//!
//! Maps physical keys to note offsets from the widget's lowest note, using the
//! usual tracker arrangement over two octaves:
//!
//! ```text
//!   2 3   5 6 7   9           (black keys, number row)
//!  Q W E R T Z U I            (white keys C..C, upper octave)
//!
//!   S D   G H J   L Ö         (black keys, home row)
//!  Y X C V B N M , . -        (white keys C..E, lower octave)
//! ```

/// Lowercase form of a key character, used for every binding lookup
pub(crate) fn normalize_key(key: char) -> char {
    key.to_lowercase().next().unwrap_or(key)
}

/// A single key binding: computer key -> note offset from the lowest note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    /// The character representing this key (lowercase)
    pub key: char,
    /// Note offset from the lowest note (can be negative)
    pub offset: i8,
}

impl KeyBinding {
    pub const fn new(key: char, offset: i8) -> Self {
        Self { key, offset }
    }
}

const GERMAN: [KeyBinding; 30] = [
    // Lower octave white keys (bottom row)
    KeyBinding::new('y', 0),
    KeyBinding::new('x', 2),
    KeyBinding::new('c', 4),
    KeyBinding::new('v', 5),
    KeyBinding::new('b', 7),
    KeyBinding::new('n', 9),
    KeyBinding::new('m', 11),
    KeyBinding::new(',', 12),
    KeyBinding::new('.', 14),
    KeyBinding::new('-', 16),
    // Lower octave black keys (home row)
    KeyBinding::new('s', 1),
    KeyBinding::new('d', 3),
    KeyBinding::new('g', 6),
    KeyBinding::new('h', 8),
    KeyBinding::new('j', 10),
    KeyBinding::new('l', 13),
    KeyBinding::new('ö', 15),
    // Upper octave white keys (QWERTZ row)
    KeyBinding::new('q', 12),
    KeyBinding::new('w', 14),
    KeyBinding::new('e', 16),
    KeyBinding::new('r', 17),
    KeyBinding::new('t', 19),
    KeyBinding::new('z', 21),
    KeyBinding::new('u', 23),
    KeyBinding::new('i', 24),
    // Upper octave black keys (number row)
    KeyBinding::new('2', 13),
    KeyBinding::new('3', 15),
    KeyBinding::new('5', 18),
    KeyBinding::new('6', 20),
    KeyBinding::new('7', 22),
];

/// Set of computer key bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    bindings: Vec<KeyBinding>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::german()
    }
}

impl KeyBindings {
    /// Build from arbitrary bindings; keys are lowercased
    pub fn new(bindings: impl IntoIterator<Item = KeyBinding>) -> Self {
        Self {
            bindings: bindings
                .into_iter()
                .map(|b| KeyBinding::new(normalize_key(b.key), b.offset))
                .collect(),
        }
    }

    /// German QWERTZ layout
    pub fn german() -> Self {
        Self::new(GERMAN)
    }

    /// US QWERTY layout: Y and Z swap places, `/` and `;` replace `-` and `ö`
    pub fn us() -> Self {
        let bindings = GERMAN.iter().map(|b| {
            let key = match b.key {
                'y' => 'z',
                'z' => 'y',
                '-' => '/',
                'ö' => ';',
                other => other,
            };
            KeyBinding::new(key, b.offset)
        });
        Self::new(bindings)
    }

    /// Note offset bound to `key`, case-insensitive
    pub fn offset_for(&self, key: char) -> Option<i8> {
        let key = normalize_key(key);
        self.bindings.iter().find(|b| b.key == key).map(|b| b.offset)
    }

    pub fn is_bound(&self, key: char) -> bool {
        self.offset_for(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyBinding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_german_layout() {
        let bindings = KeyBindings::german();
        assert_eq!(bindings.offset_for('y'), Some(0));
        assert_eq!(bindings.offset_for('s'), Some(1));
        assert_eq!(bindings.offset_for('m'), Some(11));
        assert_eq!(bindings.offset_for('q'), Some(12));
        assert_eq!(bindings.offset_for('i'), Some(24));
        assert_eq!(bindings.offset_for('f'), None);
    }

    #[test]
    fn test_us_layout() {
        let bindings = KeyBindings::us();
        assert_eq!(bindings.offset_for('z'), Some(0));
        assert_eq!(bindings.offset_for('y'), Some(21));
        assert_eq!(bindings.offset_for('/'), Some(16));
        assert_eq!(bindings.offset_for(';'), Some(15));
        assert!(!bindings.is_bound('-'));
        assert_eq!(bindings.len(), KeyBindings::german().len());
    }

    #[test]
    fn test_case_insensitive() {
        let bindings = KeyBindings::german();
        assert_eq!(bindings.offset_for('C'), bindings.offset_for('c'));
        assert_eq!(bindings.offset_for('Ö'), Some(15));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key('Q'), 'q');
        assert_eq!(normalize_key('Ö'), 'ö');
        assert_eq!(normalize_key(','), ',');
    }

    #[test]
    fn test_custom_bindings_lowercased() {
        let bindings = KeyBindings::new([KeyBinding::new('A', 0), KeyBinding::new('w', 1)]);
        assert_eq!(bindings.offset_for('a'), Some(0));
        assert_eq!(bindings.offset_for('W'), Some(1));
        assert_eq!(bindings.iter().count(), 2);
    }
}
