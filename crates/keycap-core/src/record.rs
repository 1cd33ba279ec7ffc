// Keycap Translation Records
// Trigger chords, output actions, and the record set decoded from one file

use std::fmt;
use std::ops::Range;

use smallvec::SmallVec;
use strum_macros::{EnumIter, IntoStaticStr};

use crate::{ModifierFlags, VirtualKey};

/// Position of a record within its [`RecordSet`] (file order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u32);

impl RecordId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The physical key + modifier combination that activates a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerChord {
    pub key: VirtualKey,
    pub modifiers: ModifierFlags,
}

impl TriggerChord {
    pub fn new(key: VirtualKey, modifiers: ModifierFlags) -> Self {
        Self { key, modifiers }
    }
}

impl fmt::Display for TriggerChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

/// Down/up intent of a key or mouse output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stroke {
    /// Down followed immediately by up
    Tap,
    Down,
    Up,
    /// Down on odd activations, up on even ones, driven by the record's toggle
    Toggle,
}

impl Stroke {
    /// Resolve a toggle stroke against the record's toggle state
    /// before this activation.
    pub fn resolve(self, was_toggled: bool) -> Stroke {
        match self {
            Stroke::Toggle if was_toggled => Stroke::Up,
            Stroke::Toggle => Stroke::Down,
            other => other,
        }
    }
}

/// Mouse buttons addressable from a translation file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[repr(u8)]
pub enum MouseButton {
    Left = 1,
    Right = 2,
    Middle = 3,
    Back = 4,
    Forward = 5,
}

impl MouseButton {
    /// Number of distinct buttons (for per-button history tables)
    pub const COUNT: usize = 5;

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(MouseButton::Left),
            2 => Some(MouseButton::Right),
            3 => Some(MouseButton::Middle),
            4 => Some(MouseButton::Back),
            5 => Some(MouseButton::Forward),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Zero-based slot for history tables
    pub fn slot(self) -> usize {
        self as usize - 1
    }
}

/// A synthesized key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyOutput {
    pub key: VirtualKey,
    pub modifiers: ModifierFlags,
    pub stroke: Stroke,
}

/// A synthesized mouse event: optional button plus relative motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseOutput {
    pub button: Option<MouseButton>,
    pub dx: i16,
    pub dy: i16,
    pub modifiers: ModifierFlags,
    pub stroke: Stroke,
}

impl MouseOutput {
    pub fn has_motion(&self) -> bool {
        self.dx != 0 || self.dy != 0
    }
}

/// One unit of synthesized output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputAction {
    Key(KeyOutput),
    Mouse(MouseOutput),
    /// Whole-second pause before the next action
    Delay { seconds: u8 },
    /// Deliberately do nothing (swallow the trigger)
    Nothing,
}

impl OutputAction {
    pub fn stroke(&self) -> Option<Stroke> {
        match self {
            OutputAction::Key(key) => Some(key.stroke),
            OutputAction::Mouse(mouse) => Some(mouse.stroke),
            OutputAction::Delay { .. } | OutputAction::Nothing => None,
        }
    }

    pub fn is_toggle(&self) -> bool {
        self.stroke() == Some(Stroke::Toggle)
    }
}

impl fmt::Display for OutputAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputAction::Key(key) => {
                if key.modifiers.is_empty() {
                    write!(f, "key {} {:?}", key.key, key.stroke)
                } else {
                    write!(f, "key {}+{} {:?}", key.modifiers, key.key, key.stroke)
                }
            }
            OutputAction::Mouse(mouse) => {
                let button: &'static str = mouse.button.map(Into::into).unwrap_or("none");
                write!(
                    f,
                    "mouse {} {:?} move=({}, {})",
                    button, mouse.stroke, mouse.dx, mouse.dy
                )
            }
            OutputAction::Delay { seconds } => write!(f, "delay {}s", seconds),
            OutputAction::Nothing => write!(f, "nothing"),
        }
    }
}

/// One trigger chord plus its ordered output sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRecord {
    pub id: RecordId,
    pub trigger: TriggerChord,
    pub outputs: SmallVec<[OutputAction; 2]>,
    /// Byte range of this record in the buffer it was decoded from
    pub span: Range<usize>,
}

impl TranslationRecord {
    /// A record whose first output is `Nothing` only swallows its trigger
    pub fn is_noop(&self) -> bool {
        matches!(self.outputs.first(), Some(OutputAction::Nothing))
    }

    /// Whether any output is toggle-driven
    pub fn owns_toggle(&self) -> bool {
        self.outputs.iter().any(OutputAction::is_toggle)
    }
}

impl fmt::Display for TranslationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} ->", self.id.0, self.trigger)?;
        for (i, output) in self.outputs.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, " {}", output)?;
        }
        Ok(())
    }
}

/// The decoded contents of one translation file.
///
/// Owns the raw bytes it was decoded from; records point back into them
/// through their spans.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    bytes: Box<[u8]>,
    records: Vec<TranslationRecord>,
}

impl RecordSet {
    pub(crate) fn new(bytes: Box<[u8]>, records: Vec<TranslationRecord>) -> Self {
        Self { bytes, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&TranslationRecord> {
        self.records.get(id.index())
    }

    pub fn records(&self) -> &[TranslationRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranslationRecord> {
        self.records.iter()
    }

    /// Total size of the source buffer
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Raw bytes a record was decoded from
    pub fn raw(&self, id: RecordId) -> Option<&[u8]> {
        self.get(id).map(|record| &self.bytes[record.span.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;
    use strum::IntoEnumIterator;

    fn key_out(code: u8, stroke: Stroke) -> OutputAction {
        OutputAction::Key(KeyOutput {
            key: VirtualKey(code),
            modifiers: ModifierFlags::empty(),
            stroke,
        })
    }

    fn record(outputs: SmallVec<[OutputAction; 2]>) -> TranslationRecord {
        TranslationRecord {
            id: RecordId(0),
            trigger: TriggerChord::new(VirtualKey(0x41), ModifierFlags::CONTROL),
            outputs,
            span: 0..16,
        }
    }

    #[test]
    fn test_stroke_resolve() {
        assert_eq!(Stroke::Toggle.resolve(false), Stroke::Down);
        assert_eq!(Stroke::Toggle.resolve(true), Stroke::Up);
        assert_eq!(Stroke::Tap.resolve(true), Stroke::Tap);
        assert_eq!(Stroke::Up.resolve(false), Stroke::Up);
    }

    #[test]
    fn test_mouse_button_codes() {
        for (slot, button) in MouseButton::iter().enumerate() {
            assert_eq!(MouseButton::from_code(button.code()), Some(button));
            assert_eq!(button.slot(), slot);
        }
        assert_eq!(MouseButton::iter().count(), MouseButton::COUNT);
        assert_eq!(MouseButton::from_code(0), None);
        assert_eq!(MouseButton::from_code(6), None);
    }

    #[test]
    fn test_record_flags() {
        let noop = record(smallvec![OutputAction::Nothing, key_out(0x42, Stroke::Tap)]);
        assert!(noop.is_noop());
        assert!(!noop.owns_toggle());

        let toggled = record(smallvec![
            OutputAction::Delay { seconds: 1 },
            key_out(0x42, Stroke::Toggle)
        ]);
        assert!(!toggled.is_noop());
        assert!(toggled.owns_toggle());
    }

    #[test]
    fn test_record_display() {
        let rec = record(smallvec![key_out(0x42, Stroke::Tap), OutputAction::Delay { seconds: 2 }]);
        assert_eq!(rec.to_string(), "#0 Ctrl+A -> key B Tap, delay 2s");
    }
}
