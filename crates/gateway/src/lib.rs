pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod messaging;
pub mod runtime;
pub mod state;
