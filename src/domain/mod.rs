pub mod cdn;
pub mod channel;
pub mod forum;
pub mod identity;
pub mod thread;
pub mod wire;

pub use cdn::{select_best_cdn, CdnEndpoint};
pub use channel::TimelineChannel;
pub use forum::{Forum, ForumGroup, TIMELINE_FORUM_ID};
pub use identity::{Identity, IDENTITY_COOKIE_KEY};
pub use thread::Thread;
