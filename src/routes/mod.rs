/// Router Module Index
///
/// Organizes the application's routing into access-segregated modules so that
/// the authentication layer is applied explicitly at the module level (via
/// Axum layers) rather than per-handler.

/// Read-only routes accessible to all users, anonymous included.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated user session.
pub mod authenticated;
