//! Device configuration management.
//!
//! - **`element`**: the software representation of one physical qubit and
//!   its calibration parameters.
//! - **`quantum_device`**: the registry tying elements, the hardware
//!   description, and the session utilities together, including the
//!   best-effort settings-hydration step.

pub mod element;
pub mod quantum_device;

pub use element::{TransmonElement, TransmonParams};
pub use quantum_device::{HydrationOutcome, HydrationReport, QuantumDevice};
