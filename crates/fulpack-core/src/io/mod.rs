//! I/O utilities for archive operations.

mod counting;
mod hashing;
mod output;

pub use counting::CountingWriter;
pub use hashing::HashingReader;
pub use output::PartialOutput;
