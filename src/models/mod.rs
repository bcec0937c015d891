pub mod config;
pub mod result;
pub mod time;
pub mod time_series;

pub use config::*;
pub use result::*;
pub use time::*;
pub use time_series::*;
