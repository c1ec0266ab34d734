// Chain access
pub mod ports;
pub mod queries;

// Transactions
pub mod actions;
pub mod client;
pub mod dialog;
pub mod pipeline;
pub mod step;

pub mod error;
pub mod helpers;
pub mod notify;

#[cfg(not(target_arch = "wasm32"))]
pub mod testing;


pub use crate::client::PoolClient;
pub use crate::dialog::Dialog;
pub use crate::error::ClientError;
