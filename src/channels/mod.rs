pub mod log;
pub mod traits;
pub mod whatsapp;

pub use log::LogChannel;
pub use traits::Channel;
pub use whatsapp::WhatsAppChannel;
