use std::sync::Arc;

use crate::application::post_service::PostService;
use crate::infrastructure::jwt::JwtService;

pub(crate) mod http;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) post_service: Arc<PostService>,
    pub(crate) jwt: Arc<JwtService>,
}

impl AppState {
    pub(crate) fn new(post_service: Arc<PostService>, jwt: Arc<JwtService>) -> Self {
        Self { post_service, jwt }
    }
}
