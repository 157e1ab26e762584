pub mod analysis;
pub mod cli;
pub mod data_handling;
pub mod errors;
pub mod helper_functions;
pub mod models;
pub mod pipeline;
pub mod plots;
