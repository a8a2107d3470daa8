mod cell_ref;
mod report;
mod time_entry;
mod update;

pub use cell_ref::*;
pub use report::*;
pub use time_entry::*;
pub use update::*;
