pub mod live;
pub mod ports;
pub mod services;
