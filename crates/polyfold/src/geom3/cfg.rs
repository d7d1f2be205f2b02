//! Tolerance defaults for 3D geometry (internal).
//!
//! Policy
//! - Fixed constants, same as the rest of the crate: call sites pass an explicit
//!   `eps` only where the caller is expected to tune it (collision queries).

/// Axis vectors shorter than this are treated as degenerate (rotation is a no-op).
pub(crate) const AXIS_EPS: f64 = 1e-10;
/// Normals shorter than this are left unnormalized.
pub(crate) const NORMAL_EPS: f64 = 1e-10;
/// Smallest rotation delta the solver bothers to apply.
pub(crate) const ANGLE_EPS: f64 = 1e-12;
