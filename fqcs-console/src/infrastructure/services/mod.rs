pub mod login;

pub use login::{HttpLoginClient, LoginClient};
