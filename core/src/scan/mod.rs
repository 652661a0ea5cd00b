pub mod assembler;
pub mod session;

pub use assembler::{AssembledScan, ScanAssembler};
pub use session::{RoiEntry, RoiOrigin, ScanSession, SlotState};
