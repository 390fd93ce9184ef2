// # Event Source Implementations

pub mod channel;

pub use channel::ChannelEventSource;
