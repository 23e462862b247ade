use crate::error::AppError;

/// Unknown routes still pass through the auth layers first, so an
/// unauthenticated caller gets 401 rather than learning which paths exist.
pub async fn not_found() -> AppError {
    AppError::not_found("route")
}
