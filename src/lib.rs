pub mod api;
pub mod app;
pub mod cli;
pub mod error;
pub mod form;
pub mod router;
pub mod session;
pub mod storage;
pub mod tabs;

pub use app::App;
pub use error::{ConsoleError, FormError, RouteError, SessionError, StorageError};
