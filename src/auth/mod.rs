pub mod password;
pub mod service;
pub mod token;

pub use password::PasswordHasher;
pub use service::{AuthService, NewAccount};
pub use token::{Claims, TokenError, TokenService};
