pub mod access_token;
pub mod credentials;
pub mod user;

pub use access_token::AccessToken;
pub use credentials::Credentials;
pub use user::{PublicUser, User};
