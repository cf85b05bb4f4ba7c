pub mod auth_service;
pub mod error;
pub mod jwt;
pub mod movie_service;
pub mod password;

pub use auth_service::AuthService;
pub use error::{ServiceError, ServiceResult};
pub use jwt::{AuthError, Claims, JwtManager};
pub use movie_service::{MovieImages, MovieService};
pub use password::PasswordHasher;
