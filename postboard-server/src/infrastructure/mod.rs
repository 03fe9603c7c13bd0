pub(crate) mod database;
pub(crate) mod file_storage;
pub(crate) mod jwt;
pub(crate) mod logging;
pub(crate) mod settings;
