pub mod chess;
pub mod logging;
pub mod services;
pub mod session;
pub mod settings;

pub use chess::{CanonicalGame, NormalizeContext, RawGameSource};
pub use session::{ExportError, ImportSession, ValidationError};
pub use settings::Settings;
