pub mod claims;
pub mod extractors;
pub mod jwt;
pub mod policy;
pub mod role;

pub use extractors::AuthUser;
pub use policy::OwnerQuery;
