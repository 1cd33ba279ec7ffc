// Keycap Output Layer
// Action synthesis, job dispatch and the virtual output device

mod dispatch;
mod state;
mod synth;

#[cfg(feature = "pure-rust")]
mod uinput;

pub use dispatch::{Dispatcher, Job, SynthesisMode};
pub use state::PressedKeyState;
pub use synth::{SleepFn, Synthesizer};

#[cfg(feature = "pure-rust")]
pub use uinput::{UInputError, UinputOutput};
