// Keycap Config Codec
// Binary translation-file layout, decoder and encoder

pub mod decoder;
pub mod encoder;
pub mod format;

pub use decoder::{decode, decode_slice, DecodeError};
pub use encoder::{encode, encode_record};
pub use format::{Block, FileFlags, BLOCK_SIZE, HEADER_SIZE, OUTPUT_SIZE};
