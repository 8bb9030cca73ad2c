/// Authentication and authorization utilities
///
/// - `jwt`: Access/refresh token creation and validation
/// - `oauth`: Authorization-code exchange against the external provider
/// - `middleware`: Per-request authentication context
/// - `authorization`: Role capability checks

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod oauth;
