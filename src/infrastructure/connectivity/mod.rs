pub mod monitor;

pub use monitor::ChannelConnectivity;
