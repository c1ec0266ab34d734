mod asset;
mod pool;

pub use self::asset::*;
pub use self::pool::*;
