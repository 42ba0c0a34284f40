//! Domain data shared by the Customer Service Platform service.

pub mod types;

pub use types::{RootMessage, ROOT_MESSAGE, SERVICE_TITLE};
