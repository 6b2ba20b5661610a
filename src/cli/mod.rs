//! Terminal front end

pub mod history;
pub mod refresh;
pub mod setup;
pub mod ui;
