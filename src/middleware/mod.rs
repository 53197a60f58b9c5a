pub mod auth;
pub mod response;

pub use auth::{protect, AuthUser};
pub use response::{ApiResponse, ApiResult};
