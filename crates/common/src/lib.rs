mod types;

pub use types::OrderId;
