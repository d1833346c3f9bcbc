pub mod input;
pub mod json_error;
pub mod jwt;
pub mod operation;
pub mod server_config;
pub mod user;

pub use self::input::{CreateUserData, InputError, SignInData};
pub use self::json_error::ErrorResponse;
pub use self::jwt::SessionClaims;
pub use self::operation::{
    Invocation, OperationErrorBody, OperationRequest, OperationResponse, duplicate_response_key,
};
pub use self::server_config::{
    AppConfig, AuthConfig, ConfigError, CorsConfig, DatabaseConfig, JWT_SECRET_ENV, ServerConfig,
};
pub use self::user::{NewUser, User, UserId, UserStatus};
