//! Paginated, searchable Pokémon catalog for the terminal.
//!
//! The binary wires these modules into a tui-dispatch runtime; they are
//! exposed here so the controller and views can be tested without a terminal.

pub mod action;
pub mod api;
pub mod effect;
pub mod grid;
pub mod history;
pub mod pagination;
pub mod reducer;
pub mod search_bar;
pub mod state;
pub mod ui;
