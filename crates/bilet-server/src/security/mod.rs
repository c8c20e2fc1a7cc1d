pub mod jwt;
pub mod password;
pub mod ticket_code;

pub use jwt::{JWT_COOKIE, JwtKeys};
pub use password::{hash_password, verify_password};
pub use ticket_code::generate_ticket_code;
