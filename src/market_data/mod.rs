pub mod history;
pub mod mock;
pub mod validation;

pub use history::HistoryClient;
pub use mock::base_price;
