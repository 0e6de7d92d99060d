//! Interactive filter and scatter viewer for transistor operating-point
//! tables.
//!
//! The [`data`] module holds everything that does not depend on a UI: the
//! table model and loaders, the condition engine and the plot/pick binding.
//! [`state::Session`] ties them together; [`app`] and [`ui`] render it with
//! egui.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod state;
pub mod ui;
