//! Pure decision policies over the shared types
//!
//! Both policies are side-effect free functions; the engine is the only
//! caller that turns their answers into enforcement.

pub mod confirmation;
pub mod license;

pub use confirmation::ConfirmationPolicy;
pub use license::LicensePolicy;
