pub mod validator;

pub use validator::{AxisDynamics, DynamicsValidator, ValidationReport};
