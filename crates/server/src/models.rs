mod channel;
mod queue;
mod video;

pub use channel::*;
pub use queue::*;
pub use video::*;
