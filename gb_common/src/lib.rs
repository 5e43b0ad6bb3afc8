mod money;
mod rate;

pub mod helpers;
pub mod op;

pub use money::{Money, MoneyConversionError};
pub use rate::DividendRate;
