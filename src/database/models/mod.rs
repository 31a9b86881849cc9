pub mod blog_post;
pub mod generation;
pub mod subscription;
pub mod user;

pub use blog_post::BlogPost;
pub use generation::Generation;
pub use subscription::Subscription;
pub use user::User;
