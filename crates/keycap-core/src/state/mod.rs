// Keycap State
// Per-configuration toggle flags and event histories

mod toggle;

pub use toggle::ToggleStore;
