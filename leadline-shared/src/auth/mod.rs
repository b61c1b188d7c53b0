/// Authentication utilities
///
/// - `jwt`: Token generation and validation (HS256)
/// - `password`: Argon2id password hashing and verification
/// - `middleware`: Axum middleware that authenticates bearer tokens

pub mod jwt;
pub mod middleware;
pub mod password;
