pub mod ds;
pub mod gateway;
pub mod legacy;
pub mod settings;

pub const CHANNEL_ID: &str = "smartwateringsystem";
