// Keycap Config Encoder
// Writes records in the binary translation-file layout

use super::format::{Block, FileFlags};
use crate::record::{OutputAction, TranslationRecord, TriggerChord};

/// Encode a full record list into translation-file bytes
pub fn encode(records: &[TranslationRecord]) -> Vec<u8> {
    let mut out = Vec::new();
    for record in records {
        encode_record(&mut out, record.trigger, &record.outputs);
    }
    out
}

/// Append one record to `out`.
///
/// An empty `outputs` slice still writes a record (with a zero count), which
/// the decoder rejects.
pub fn encode_record(out: &mut Vec<u8>, trigger: TriggerChord, outputs: &[OutputAction]) {
    Block {
        key: trigger.key.code(),
        flags: FileFlags::from_modifiers(trigger.modifiers),
        parameter: 0,
    }
    .write(out);
    out.extend_from_slice(&(outputs.len() as u32).to_le_bytes());
    for output in outputs {
        output_block(output).write(out);
    }
}

fn output_block(output: &OutputAction) -> Block {
    match *output {
        OutputAction::Key(key) => Block {
            key: key.key.code(),
            flags: FileFlags::from_modifiers(key.modifiers) | FileFlags::from_stroke(key.stroke),
            parameter: 0,
        },
        OutputAction::Mouse(mouse) => Block {
            key: mouse.button.map_or(0, |button| button.code()),
            flags: FileFlags::MOUSE_OUT
                | FileFlags::from_modifiers(mouse.modifiers)
                | FileFlags::from_stroke(mouse.stroke),
            parameter: Block::pack_motion(mouse.dx, mouse.dy),
        },
        OutputAction::Delay { seconds } => Block {
            key: seconds,
            flags: FileFlags::DELAY,
            parameter: 0,
        },
        OutputAction::Nothing => Block {
            key: 0,
            flags: FileFlags::DO_NOTHING,
            parameter: 0,
        },
    }
}
