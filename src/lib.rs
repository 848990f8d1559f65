#[macro_use]
extern crate lazy_static;

pub mod hw;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod session;

pub use server::StreamServer;
pub use session::Session;
