pub(crate) mod file_sink;
pub(crate) mod post_repository;
pub(crate) mod repositories;
pub(crate) mod user_repository;
