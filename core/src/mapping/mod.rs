pub mod registration;
pub mod voltage;

pub use registration::AffineRegistration;
pub use voltage::VoltageMapper;
