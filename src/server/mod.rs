//! # Dashboard Server
//!
//! - [`poll`]: background loop feeding collection rounds into the snapshot store
//! - [`api`]: axum router serving the snapshot and the page
//! - [`ui`]: the HTML page

pub mod api;
pub mod poll;
pub mod ui;

pub use api::{router, AppState};
pub use poll::PollLoop;
pub use ui::UiPage;
