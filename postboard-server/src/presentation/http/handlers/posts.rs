use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::application::post_service::{ListPostsResult, PageRef};
use crate::data::post_repository::{ListPostsQuery, Pagination, PostFilter, PostSort};
use crate::domain::post::{
    Comment, CreateCommentRequest, CreatePostRequest, Like, Post, UpdatePostRequest,
};
use crate::domain::upload::UploadedFile;
use crate::presentation::AppState;
use crate::presentation::http::app_error::{AppError, AppResult};
use crate::presentation::http::envelope::Envelope;
use crate::presentation::http::extract::{ApiJson, ApiPath, ApiQuery};
use crate::presentation::http::middleware::auth::AuthenticatedUser;

const DEFAULT_PAGE_LIMIT: u32 = 25;
const PHOTO_FIELD: &str = "file";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreatePostDto {
    #[validate(length(min = 1, max = 5000))]
    pub(crate) text: String,
}

/// Partial update; checked by the service once the caller is authorized.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct UpdatePostDto {
    pub(crate) text: Option<String>,
    pub(crate) photo: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreateCommentDto {
    #[validate(length(min = 1, max = 1000))]
    pub(crate) text: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct ListPostsQueryDto {
    #[validate(range(min = 1))]
    pub(crate) page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub(crate) limit: Option<u32>,
    pub(crate) author_id: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub(crate) search: Option<String>,
    #[schema(value_type = Option<String>, example = "newest")]
    pub(crate) sort: Option<PostSort>,
}

impl From<ListPostsQueryDto> for ListPostsQuery {
    fn from(dto: ListPostsQueryDto) -> Self {
        Self {
            filter: PostFilter {
                author_id: dto.author_id,
                search: dto.search,
            },
            sort: dto.sort.unwrap_or_default(),
            pagination: Pagination {
                page: dto.page.unwrap_or(1),
                limit: dto.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            },
        }
    }
}

/// Multipart body of the photo upload; documentation only.
#[allow(dead_code)]
#[derive(ToSchema)]
pub(crate) struct PhotoUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub(crate) file: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct LikeDto {
    pub(crate) user_id: i64,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CommentDto {
    pub(crate) id: Uuid,
    pub(crate) text: String,
    pub(crate) author_id: i64,
    pub(crate) author_name: String,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDto {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) author_id: i64,
    pub(crate) author_name: String,
    pub(crate) likes: Vec<LikeDto>,
    pub(crate) comments: Vec<CommentDto>,
    pub(crate) photo: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PageRefDto {
    pub(crate) page: u32,
    pub(crate) limit: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PaginationDto {
    pub(crate) next: Option<PageRefDto>,
    pub(crate) prev: Option<PageRefDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListPostsResponseDto {
    pub(crate) posts: Vec<PostDto>,
    pub(crate) total: i64,
    pub(crate) page: u32,
    pub(crate) limit: u32,
    pub(crate) pagination: PaginationDto,
}

impl From<Like> for LikeDto {
    fn from(like: Like) -> Self {
        Self {
            user_id: like.user_id,
            created_at: like.created_at,
        }
    }
}

impl From<Comment> for CommentDto {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            text: comment.text,
            author_id: comment.author_id,
            author_name: comment.author_name,
            created_at: comment.created_at,
        }
    }
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            text: post.text,
            author_id: post.author_id,
            author_name: post.author_name,
            likes: into_dtos(post.likes),
            comments: into_dtos(post.comments),
            photo: post.photo,
            created_at: post.created_at,
        }
    }
}

impl From<PageRef> for PageRefDto {
    fn from(page: PageRef) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
        }
    }
}

impl From<ListPostsResult> for ListPostsResponseDto {
    fn from(result: ListPostsResult) -> Self {
        Self {
            posts: into_dtos(result.posts),
            total: result.total,
            page: result.page,
            limit: result.limit,
            pagination: PaginationDto {
                next: result.next.map(PageRefDto::from),
                prev: result.prev.map(PageRefDto::from),
            },
        }
    }
}

fn into_dtos<T, D: From<T>>(items: Vec<T>) -> Vec<D> {
    items.into_iter().map(D::from).collect()
}

#[utoipa::path(
    get,
    path = "/api/v1/posts",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("page" = Option<u32>, Query, description = "Page number, starting at 1"),
        ("limit" = Option<u32>, Query, description = "Items per page (1..=100)"),
        ("author_id" = Option<i64>, Query, description = "Only posts by this author"),
        ("search" = Option<String>, Query, description = "Case-insensitive text match"),
        ("sort" = Option<String>, Query, description = "newest | oldest | most_liked | most_commented")
    ),
    responses(
        (status = 200, description = "Posts listed", body = ListPostsResponseDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_posts(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ListPostsQueryDto>,
) -> AppResult<Json<Envelope<ListPostsResponseDto>>> {
    query.validate()?;

    let result = state.post_service.list_posts(query.into()).await?;

    Ok(Envelope::ok(ListPostsResponseDto::from(result)))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post found", body = PostDto),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_post(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Envelope<PostDto>>> {
    let post = state.post_service.get_post(id).await?;

    Ok(Envelope::ok(PostDto::from(post)))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    request_body = CreatePostDto,
    responses(
        (status = 201, description = "Post created", body = PostDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Author not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiJson(dto): ApiJson<CreatePostDto>,
) -> AppResult<(StatusCode, Json<Envelope<PostDto>>)> {
    dto.validate()?;
    let req = CreatePostRequest { text: dto.text };

    let post = state.post_service.create_post(auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Envelope::ok(PostDto::from(post))))
}

#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = UpdatePostDto,
    responses(
        (status = 200, description = "Post updated", body = PostDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Neither author nor admin"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(dto): ApiJson<UpdatePostDto>,
) -> AppResult<Json<Envelope<PostDto>>> {
    let req = UpdatePostRequest {
        text: dto.text,
        photo: dto.photo,
    };

    let post = state
        .post_service
        .update_post(id, auth.actor(), req)
        .await?;
    Ok(Envelope::ok(PostDto::from(post)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Envelope<serde_json::Value>>> {
    state.post_service.delete_post(id, auth.user_id).await?;
    Ok(Envelope::ok(serde_json::json!({})))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/like",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Likes after the change", body = [LikeDto]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 409, description = "Post already liked"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn like_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Envelope<Vec<LikeDto>>>> {
    let likes = state.post_service.like_post(id, auth.user_id).await?;
    Ok(Envelope::ok(into_dtos(likes)))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/unlike",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Likes after the change", body = [LikeDto]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 409, description = "Post has not yet been liked"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn unlike_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Envelope<Vec<LikeDto>>>> {
    let likes = state.post_service.unlike_post(id, auth.user_id).await?;
    Ok(Envelope::ok(into_dtos(likes)))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/comments",
    tag = "comments",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = CreateCommentDto,
    responses(
        (status = 201, description = "Comments after the change", body = [CommentDto]),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post or user not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn add_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(dto): ApiJson<CreateCommentDto>,
) -> AppResult<(StatusCode, Json<Envelope<Vec<CommentDto>>>)> {
    dto.validate()?;
    let req = CreateCommentRequest { text: dto.text };

    let comments = state
        .post_service
        .add_comment(id, auth.user_id, req)
        .await?;
    Ok((StatusCode::CREATED, Envelope::ok(into_dtos(comments))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}/comments/{comment_id}",
    tag = "comments",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id"),
        ("comment_id" = Uuid, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Comments after the change", body = [CommentDto]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the comment author"),
        (status = 404, description = "Post or comment not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath((id, comment_id)): ApiPath<(i64, Uuid)>,
) -> AppResult<Json<Envelope<Vec<CommentDto>>>> {
    let comments = state
        .post_service
        .delete_comment(id, comment_id, auth.user_id)
        .await?;
    Ok(Envelope::ok(into_dtos(comments)))
}

#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}/photo",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body(content = PhotoUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Stored file name", body = String),
        (status = 400, description = "Missing, non-image or oversized file"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Problem with file upload")
    )
)]
pub(crate) async fn upload_photo(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<Envelope<String>>> {
    let mut multipart = multipart?;
    let file = read_photo_field(&mut multipart).await?;

    let file_name = state
        .post_service
        .attach_photo(id, auth.user_id, file)
        .await?;
    Ok(Envelope::ok(file_name))
}

async fn read_photo_field(multipart: &mut Multipart) -> AppResult<Option<UploadedFile>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(err.body_text()))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(err.body_text()))?;

        return Ok(Some(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}
