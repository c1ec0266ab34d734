// Interface of the Peko lending pool
pub mod config;
pub mod msg;

// Pure math
pub mod amount;
pub mod views;

// Adapters
pub mod adapters;
