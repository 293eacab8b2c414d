//! Terminal control: raw-mode/alternate-screen lifecycle and signal-driven
//! resize/interrupt flags. Rendering and layout are outside this crate's
//! scope; this module only owns the terminal's on/off switch and the signals
//! that can flip it out from under the editor.

pub mod raw;
