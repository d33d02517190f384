//! Terminal prompt watch face core
//!
//! Everything here is hardware independent: the companion dictionary codec,
//! the weather model, clock formatting, the text layer model of the face,
//! long press detection and the typed prompt animation. The firmware crate wires these to the
//! PineTime peripherals.

#![cfg_attr(not(test), no_std)]

pub mod animation;
pub mod clock;
pub mod face;
pub mod gesture;
pub mod message;
pub mod text;
pub mod weather;

pub use animation::Typist;
pub use clock::{Clock, ClockStyle};
pub use face::{Layout, Section, Watchface};
pub use gesture::HoldLatch;
pub use message::{Dictionary, DictionaryWriter, Tuple, TupleValue};
pub use weather::Weather;
