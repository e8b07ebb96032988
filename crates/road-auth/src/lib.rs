//! # road-auth
//!
//! Authentication and authorization for Roadtrack.
//!
//! Passwords are hashed with `bcrypt`. Sessions are stateless HS256 JWTs
//! (`jsonwebtoken`) carrying the user id, email, and role. Authorization is a
//! fixed role ladder (`admin > manager > engineer > viewer`) mapped onto four
//! coarse [`Permission`]s.

pub mod error;
pub mod jwt;
pub mod password;
pub mod permissions;

pub use error::AuthError;
pub use jwt::{Claims, IssuedToken, JwtConfig, extract_bearer};
pub use password::{
    hash_password, hash_password_with_cost, verify_against_unmatchable, verify_password,
};
pub use permissions::{Permission, authorize};
