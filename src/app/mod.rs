pub mod context;
pub mod error;
pub mod session;

pub use context::{AppContext, BootstrapReport};
pub use error::{IslanderError, Result};
pub use session::Session;
