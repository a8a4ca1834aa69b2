mod post;
mod user;

pub use post::{Attachment, Post, PostRecord, UpdatePost};
pub(crate) use post::sort_attachments;
pub use user::{UpdateUser, User};
