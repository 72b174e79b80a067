mod credentials;
mod error;
mod host;
mod location;

pub use credentials::*;
pub use error::*;
pub use host::*;
pub use location::*;
