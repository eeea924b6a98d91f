pub mod driver;
pub mod entries;
pub mod peaks;
pub mod profile;
pub mod quantiles;
pub mod types;

pub use driver::*;
pub use profile::*;
pub use types::*;
