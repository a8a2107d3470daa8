mod automation;
mod client;
pub mod domain;
pub mod grid;
pub mod page;
mod reconcile;
mod sequencer;
mod writer;

pub use automation::*;
pub use client::*;
pub use reconcile::*;
pub use sequencer::*;
pub use writer::*;
