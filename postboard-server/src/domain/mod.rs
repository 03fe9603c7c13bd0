pub(crate) mod error;
pub(crate) mod post;
pub(crate) mod upload;
pub(crate) mod user;
