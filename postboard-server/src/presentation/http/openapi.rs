use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::http::handlers::posts::{
    CommentDto, CreateCommentDto, CreatePostDto, LikeDto, ListPostsQueryDto,
    ListPostsResponseDto, PageRefDto, PaginationDto, PhotoUploadForm, PostDto, UpdatePostDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::http::handlers::posts::list_posts,
        crate::presentation::http::handlers::posts::get_post,
        crate::presentation::http::handlers::posts::create_post,
        crate::presentation::http::handlers::posts::update_post,
        crate::presentation::http::handlers::posts::delete_post,
        crate::presentation::http::handlers::posts::like_post,
        crate::presentation::http::handlers::posts::unlike_post,
        crate::presentation::http::handlers::posts::add_comment,
        crate::presentation::http::handlers::posts::delete_comment,
        crate::presentation::http::handlers::posts::upload_photo
    ),
    components(
        schemas(
            CreatePostDto,
            UpdatePostDto,
            CreateCommentDto,
            ListPostsQueryDto,
            PhotoUploadForm,
            LikeDto,
            CommentDto,
            PostDto,
            PageRefDto,
            PaginationDto,
            ListPostsResponseDto
        )
    ),
    tags(
        (name = "posts", description = "Post endpoints"),
        (name = "comments", description = "Comment endpoints")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}
