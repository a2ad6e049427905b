pub mod keepalive;
pub mod wait;
