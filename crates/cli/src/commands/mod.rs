pub mod ask;
pub mod config_cmd;
pub mod feedback;
pub mod mock_server;
pub mod provision_cms;
