mod session;

pub use session::Session;
pub(crate) use session::extract_cookie_value;
