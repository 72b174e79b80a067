mod acquire;
mod device;
mod metadata;
mod reading;
pub mod usb;

pub use acquire::*;
pub use device::*;
pub use metadata::*;
pub use reading::*;
