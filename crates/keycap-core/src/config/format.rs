// Keycap File Format
// Fixed-size blocks and flag bits of the binary translation file
//
// Little-endian, packed, no padding. Triggers and outputs share one
// 12-byte block shape:
//
//   offset 0   u8   virtual-key code (delay: seconds, mouse: button code)
//   offset 1   3    reserved
//   offset 4   u32  flags
//   offset 8   u32  parameter (mouse: dx in the low i16, dy in the high i16)
//
// A record is a trigger block, a u32 output count, then that many output
// blocks. There is no header, magic or checksum.

use bitflags::bitflags;

use crate::record::Stroke;
use crate::ModifierFlags;

/// Size of one trigger or output block
pub const BLOCK_SIZE: usize = 12;

/// Size of the output count following the trigger block
pub const COUNT_SIZE: usize = 4;

/// Trigger block plus output count
pub const HEADER_SIZE: usize = BLOCK_SIZE + COUNT_SIZE;

/// Size of one output block
pub const OUTPUT_SIZE: usize = BLOCK_SIZE;

const KEY_OFFSET: usize = 0;
const FLAGS_OFFSET: usize = 4;
const PARAMETER_OFFSET: usize = 8;

bitflags! {
    /// Flags word of a trigger or output block
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileFlags: u32 {
        const ALT = 0x001;
        const CONTROL = 0x002;
        const SHIFT = 0x004;
        const DO_NOTHING = 0x008;
        const MOUSE_OUT = 0x010;
        const DELAY = 0x020;
        const TOGGLE = 0x040;
        const DOWN = 0x080;
        const UP = 0x100;
    }
}

impl Default for FileFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl FileFlags {
    /// Flags that each select an action kind; at most one may be set
    pub const KIND_MASK: FileFlags = FileFlags::DO_NOTHING
        .union(FileFlags::MOUSE_OUT)
        .union(FileFlags::DELAY);

    pub fn modifiers(self) -> ModifierFlags {
        ModifierFlags::from_bits_truncate((self.bits() & 0x7) as u8)
    }

    pub fn from_modifiers(modifiers: ModifierFlags) -> Self {
        FileFlags::from_bits_truncate(u32::from(modifiers.bits()))
    }

    /// More than one action kind selected
    pub fn has_conflicting_kind(self) -> bool {
        self.intersection(Self::KIND_MASK).bits().count_ones() > 1
    }

    /// Down/up intent encoded in the flags.
    ///
    /// Toggle wins over the explicit bits; neither DOWN nor UP means a tap,
    /// the same as both.
    pub fn stroke(self) -> Stroke {
        if self.contains(Self::TOGGLE) {
            return Stroke::Toggle;
        }
        match (self.contains(Self::DOWN), self.contains(Self::UP)) {
            (true, false) => Stroke::Down,
            (false, true) => Stroke::Up,
            _ => Stroke::Tap,
        }
    }

    pub fn from_stroke(stroke: Stroke) -> Self {
        match stroke {
            Stroke::Tap => Self::DOWN | Self::UP,
            Stroke::Down => Self::DOWN,
            Stroke::Up => Self::UP,
            Stroke::Toggle => Self::TOGGLE,
        }
    }
}

/// One 12-byte block as laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Block {
    pub key: u8,
    pub flags: FileFlags,
    pub parameter: u32,
}

impl Block {
    /// Read a block from the front of `bytes`, which must hold at least
    /// [`BLOCK_SIZE`] bytes.
    pub fn read(bytes: &[u8]) -> Self {
        Self {
            key: bytes[KEY_OFFSET],
            flags: FileFlags::from_bits_retain(read_u32(bytes, FLAGS_OFFSET)),
            parameter: read_u32(bytes, PARAMETER_OFFSET),
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.key);
        out.extend_from_slice(&[0; FLAGS_OFFSET - 1]);
        out.extend_from_slice(&self.flags.bits().to_le_bytes());
        out.extend_from_slice(&self.parameter.to_le_bytes());
    }

    /// Mouse motion packed into the parameter word
    pub fn motion(&self) -> (i16, i16) {
        let dx = (self.parameter & 0xFFFF) as u16 as i16;
        let dy = (self.parameter >> 16) as u16 as i16;
        (dx, dy)
    }

    pub fn pack_motion(dx: i16, dy: i16) -> u32 {
        u32::from(dx as u16) | (u32::from(dy as u16) << 16)
    }
}

pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}
