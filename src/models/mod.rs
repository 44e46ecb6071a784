pub mod document;
pub mod messages;
pub mod api;
pub mod diagnostics;

pub use document::*;
pub use messages::*;
pub use api::*;
pub use diagnostics::*;
