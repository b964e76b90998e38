//! Report delivery for the stockcard system.
//!
//! Builds Feishu interactive cards from analysis results and sends them
//! through the Feishu Open API.

pub mod card;
pub mod feishu;

pub use card::build_stock_card;
pub use feishu::FeishuClient;
