pub mod mock_rp_server;

pub use fixtures::*;
pub use mock_rp_server::{MockConfig, MockRpServer};
