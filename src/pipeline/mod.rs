pub mod gate;
pub mod transaction;

pub use gate::ReentrancyGate;
pub use transaction::{ClipboardTransaction, Outcome, PipelineState, Timings};
