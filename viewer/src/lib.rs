#![allow(
    clippy::collapsible_if,
    clippy::derivable_impls,
    clippy::too_many_arguments,
    clippy::type_complexity
)]

//! Bevy front end of the motion explorer: one source panel and a grid of
//! target panels sharing one timeline and one camera.

pub mod app;
pub mod composition;
pub mod grid_overlay;
pub mod infra;
pub mod settings;
pub mod ui;
pub mod viewport;

pub use app::bootstrap::run_explorer_app;
