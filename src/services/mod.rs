pub mod blog_service;
pub mod generation_service;
pub mod subscription_service;
pub mod user_service;

pub use blog_service::BlogService;
pub use generation_service::GenerationService;
pub use subscription_service::SubscriptionService;
pub use user_service::{QuotaClaim, UserService};
