// Keycap Config Decoder
// Walks a translation file record by record with bounds-checked offsets

use smallvec::SmallVec;

use super::format::{read_u32, Block, FileFlags, BLOCK_SIZE, HEADER_SIZE, OUTPUT_SIZE};
use crate::record::{
    KeyOutput, MouseButton, MouseOutput, OutputAction, RecordId, RecordSet, TranslationRecord,
    TriggerChord,
};
use crate::VirtualKey;

/// Structural errors found while decoding a translation file
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Translation file is empty")]
    EmptyInput,

    #[error("Record at offset {offset} needs {needed} bytes but only {available} remain")]
    TruncatedRecord {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Record at offset {offset} declares zero outputs")]
    ZeroOutputCount { offset: usize },

    #[error("Output at offset {offset} selects more than one action kind (flags {flags:#05x})")]
    ConflictingActionKind { offset: usize, flags: u32 },

    #[error("Output at offset {offset} names unknown mouse button {button}")]
    UnknownMouseButton { offset: usize, button: u8 },
}

/// Decode a whole translation file.
///
/// The walk must land exactly on the end of the buffer; a record that would
/// run past it is a [`DecodeError::TruncatedRecord`]. The returned set owns
/// `bytes`.
pub fn decode(bytes: impl Into<Box<[u8]>>) -> Result<RecordSet, DecodeError> {
    let bytes: Box<[u8]> = bytes.into();
    if bytes.is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    let mut records = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let id = RecordId(records.len() as u32);
        let record = decode_record(&bytes, offset, id)?;
        log::trace!("Decoded {} ({} bytes)", record, record.span.len());
        offset = record.span.end;
        records.push(record);
    }
    debug_assert_eq!(offset, bytes.len());

    log::debug!(
        "Decoded {} translation record(s) from {} bytes",
        records.len(),
        bytes.len()
    );
    Ok(RecordSet::new(bytes, records))
}

/// Decode from a borrowed buffer (copies it into the record set)
pub fn decode_slice(bytes: &[u8]) -> Result<RecordSet, DecodeError> {
    decode(bytes.to_vec())
}

fn decode_record(bytes: &[u8], offset: usize, id: RecordId) -> Result<TranslationRecord, DecodeError> {
    let available = bytes.len() - offset;
    let truncated = |needed| DecodeError::TruncatedRecord {
        offset,
        needed,
        available,
    };

    let header = bytes
        .get(offset..offset + HEADER_SIZE)
        .ok_or_else(|| truncated(HEADER_SIZE))?;
    let trigger = Block::read(header);
    let count = read_u32(header, BLOCK_SIZE);
    if count == 0 {
        return Err(DecodeError::ZeroOutputCount { offset });
    }

    // Saturate so an absurd count reads as truncation rather than overflow
    let needed = (count as usize)
        .checked_mul(OUTPUT_SIZE)
        .and_then(|body| body.checked_add(HEADER_SIZE))
        .unwrap_or(usize::MAX);
    if needed > available {
        return Err(truncated(needed));
    }

    let body = &bytes[offset + HEADER_SIZE..offset + needed];
    let outputs = body
        .chunks_exact(OUTPUT_SIZE)
        .enumerate()
        .map(|(i, chunk)| {
            decode_output(Block::read(chunk), offset + HEADER_SIZE + i * OUTPUT_SIZE)
        })
        .collect::<Result<SmallVec<_>, _>>()?;

    Ok(TranslationRecord {
        id,
        trigger: TriggerChord::new(VirtualKey(trigger.key), trigger.flags.modifiers()),
        outputs,
        span: offset..offset + needed,
    })
}

fn decode_output(block: Block, offset: usize) -> Result<OutputAction, DecodeError> {
    let flags = block.flags;
    if flags.has_conflicting_kind() {
        return Err(DecodeError::ConflictingActionKind {
            offset,
            flags: flags.bits(),
        });
    }

    if flags.contains(FileFlags::DO_NOTHING) {
        return Ok(OutputAction::Nothing);
    }
    if flags.contains(FileFlags::DELAY) {
        return Ok(OutputAction::Delay { seconds: block.key });
    }
    if flags.contains(FileFlags::MOUSE_OUT) {
        let button = match block.key {
            0 => None,
            code => Some(MouseButton::from_code(code).ok_or(
                DecodeError::UnknownMouseButton {
                    offset,
                    button: code,
                },
            )?),
        };
        let (dx, dy) = block.motion();
        return Ok(OutputAction::Mouse(MouseOutput {
            button,
            dx,
            dy,
            modifiers: flags.modifiers(),
            stroke: flags.stroke(),
        }));
    }

    Ok(OutputAction::Key(KeyOutput {
        key: VirtualKey(block.key),
        modifiers: flags.modifiers(),
        stroke: flags.stroke(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::encoder::encode_record;
    use crate::record::Stroke;
    use crate::ModifierFlags;

    fn tap(code: u8) -> OutputAction {
        OutputAction::Key(KeyOutput {
            key: VirtualKey(code),
            modifiers: ModifierFlags::empty(),
            stroke: Stroke::Tap,
        })
    }

    fn chord(code: u8, modifiers: ModifierFlags) -> TriggerChord {
        TriggerChord::new(VirtualKey(code), modifiers)
    }

    /// Three records of different lengths
    fn sample() -> (Vec<u8>, Vec<usize>) {
        let mut bytes = Vec::new();
        let mut boundaries = vec![0];
        encode_record(&mut bytes, chord(0x41, ModifierFlags::empty()), &[tap(0x42)]);
        boundaries.push(bytes.len());
        encode_record(
            &mut bytes,
            chord(0x41, ModifierFlags::ALT),
            &[tap(0x43), OutputAction::Delay { seconds: 1 }, tap(0x44)],
        );
        boundaries.push(bytes.len());
        encode_record(&mut bytes, chord(0x70, ModifierFlags::SHIFT), &[OutputAction::Nothing]);
        boundaries.push(bytes.len());
        (bytes, boundaries)
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode(Vec::new()).unwrap_err(), DecodeError::EmptyInput);
    }

    #[test]
    fn test_decode_sample() {
        let (bytes, boundaries) = sample();
        let set = decode_slice(&bytes).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.byte_len(), bytes.len());

        let spans: Vec<_> = set.iter().map(|r| r.span.clone()).collect();
        assert_eq!(spans, vec![0..boundaries[1], boundaries[1]..boundaries[2], boundaries[2]..boundaries[3]]);
        assert_eq!(set.iter().last().unwrap().span.end, bytes.len());

        let second = set.get(RecordId(1)).unwrap();
        assert_eq!(second.trigger, chord(0x41, ModifierFlags::ALT));
        assert_eq!(second.outputs.len(), 3);
        assert_eq!(second.outputs[1], OutputAction::Delay { seconds: 1 });
        assert_eq!(set.raw(RecordId(1)).unwrap(), &bytes[boundaries[1]..boundaries[2]]);

        assert!(set.get(RecordId(2)).unwrap().is_noop());
    }

    #[test]
    fn test_truncation_at_every_offset() {
        let (bytes, boundaries) = sample();
        for cut in 1..bytes.len() {
            let result = decode_slice(&bytes[..cut]);
            if boundaries.contains(&cut) {
                assert!(result.is_ok(), "cut at record boundary {} should decode", cut);
            } else {
                assert!(
                    matches!(result, Err(DecodeError::TruncatedRecord { .. })),
                    "cut at {} should be truncated, got {:?}",
                    cut,
                    result
                );
            }
        }
    }

    #[test]
    fn test_trailing_garbage_is_truncation() {
        let (mut bytes, boundaries) = sample();
        bytes.extend_from_slice(&[0u8; 3]);
        assert_eq!(
            decode_slice(&bytes).unwrap_err(),
            DecodeError::TruncatedRecord {
                offset: boundaries[3],
                needed: HEADER_SIZE,
                available: 3,
            }
        );
    }

    #[test]
    fn test_zero_output_count() {
        let mut bytes = Vec::new();
        encode_record(&mut bytes, chord(0x41, ModifierFlags::empty()), &[tap(0x42)]);
        let second = bytes.len();
        encode_record(&mut bytes, chord(0x42, ModifierFlags::empty()), &[]);
        assert_eq!(
            decode_slice(&bytes).unwrap_err(),
            DecodeError::ZeroOutputCount { offset: second }
        );
    }

    #[test]
    fn test_huge_output_count_is_truncation() {
        let mut bytes = Vec::new();
        Block::default().write(&mut bytes);
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode_slice(&bytes),
            Err(DecodeError::TruncatedRecord { offset: 0, .. })
        ));
    }

    #[test]
    fn test_conflicting_kind_rejected() {
        let mut bytes = Vec::new();
        Block { key: 0x41, ..Block::default() }.write(&mut bytes);
        bytes.extend_from_slice(&1u32.to_le_bytes());
        Block {
            key: 2,
            flags: FileFlags::DELAY | FileFlags::MOUSE_OUT,
            parameter: 0,
        }
        .write(&mut bytes);
        assert_eq!(
            decode_slice(&bytes).unwrap_err(),
            DecodeError::ConflictingActionKind {
                offset: HEADER_SIZE,
                flags: 0x30,
            }
        );
    }

    #[test]
    fn test_mouse_outputs() {
        let mut bytes = Vec::new();
        Block { key: 0x41, ..Block::default() }.write(&mut bytes);
        bytes.extend_from_slice(&2u32.to_le_bytes());
        Block {
            key: 2,
            flags: FileFlags::MOUSE_OUT | FileFlags::DOWN,
            parameter: 0,
        }
        .write(&mut bytes);
        Block {
            key: 0,
            flags: FileFlags::MOUSE_OUT,
            parameter: Block::pack_motion(10, -20),
        }
        .write(&mut bytes);

        let set = decode_slice(&bytes).unwrap();
        let record = set.get(RecordId(0)).unwrap();
        match record.outputs[0] {
            OutputAction::Mouse(mouse) => {
                assert_eq!(mouse.button, Some(MouseButton::Right));
                assert_eq!(mouse.stroke, Stroke::Down);
                assert!(!mouse.has_motion());
            }
            other => panic!("Expected mouse output, got {:?}", other),
        }
        match record.outputs[1] {
            OutputAction::Mouse(mouse) => {
                assert_eq!(mouse.button, None);
                assert_eq!((mouse.dx, mouse.dy), (10, -20));
            }
            other => panic!("Expected mouse output, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_mouse_button() {
        let mut bytes = Vec::new();
        Block { key: 0x41, ..Block::default() }.write(&mut bytes);
        bytes.extend_from_slice(&1u32.to_le_bytes());
        Block {
            key: 9,
            flags: FileFlags::MOUSE_OUT,
            parameter: 0,
        }
        .write(&mut bytes);
        assert_eq!(
            decode_slice(&bytes).unwrap_err(),
            DecodeError::UnknownMouseButton {
                offset: HEADER_SIZE,
                button: 9,
            }
        );
    }

    #[test]
    fn test_trigger_ignores_non_modifier_flags() {
        let mut bytes = Vec::new();
        Block {
            key: 0x41,
            flags: FileFlags::CONTROL | FileFlags::TOGGLE | FileFlags::DOWN,
            parameter: 7,
        }
        .write(&mut bytes);
        bytes.extend_from_slice(&1u32.to_le_bytes());
        Block { key: 0x42, ..Block::default() }.write(&mut bytes);

        let set = decode_slice(&bytes).unwrap();
        assert_eq!(
            set.get(RecordId(0)).unwrap().trigger,
            chord(0x41, ModifierFlags::CONTROL)
        );
    }
}
