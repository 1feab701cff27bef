//! Core types, constants, and collaborator traits.
//!
//! Nothing here needs an async runtime. These are the abstractions the
//! state machine is written against.

mod constants;
mod epoch;
mod error;
mod event;
mod traits;

pub use constants::*;
pub use epoch::*;
pub use error::*;
pub use event::*;
pub use traits::*;
