//! Services layer for the portal: token issuance and validation, and the
//! account directory backing credential checks.

mod directory;
mod token;

pub use directory::{Account, Directory, InMemoryDirectory, Password};
pub use token::{PortalClaims, TokenResponse, TokenService};
