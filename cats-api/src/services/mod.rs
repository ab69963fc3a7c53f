pub mod auth_service;
pub mod cat_match_service;
pub mod cat_service;
pub mod token_service;
pub mod user_service;

pub use cat_match_service::CatMatchService;
pub use cat_service::CatService;
pub use user_service::UserService;
