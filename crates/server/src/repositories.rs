mod channel;
mod queue;
mod video;

pub use channel::ChannelRepository;
pub use queue::QueueRepository;
pub use video::VideoRepository;
