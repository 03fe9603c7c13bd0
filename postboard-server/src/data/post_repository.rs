use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::post::{Comment, Like, Post};

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) text: String,
    pub(crate) author_id: i64,
    pub(crate) author_name: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PostPatch {
    pub(crate) text: Option<String>,
    pub(crate) photo: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum PostSort {
    #[default]
    Newest,
    Oldest,
    MostLiked,
    MostCommented,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PostFilter {
    pub(crate) author_id: Option<i64>,
    pub(crate) search: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Pagination {
    pub(crate) page: u32,
    pub(crate) limit: u32,
}

impl Pagination {
    pub(crate) fn offset(self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ListPostsQuery {
    pub(crate) filter: PostFilter,
    pub(crate) sort: PostSort,
    pub(crate) pagination: Pagination,
}

/// Outcome of a store-side conditional update.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConditionalUpdate<T> {
    Applied(T),
    /// The post exists but the condition did not hold.
    Rejected,
    PostMissing,
}

/// Document-style access to posts with their embedded likes and comments.
///
/// The like/comment methods must check and mutate atomically so that
/// concurrent callers cannot both pass the same condition.
#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError>;
    async fn list_posts(&self, query: &ListPostsQuery) -> Result<Vec<Post>, DomainError>;
    async fn count_posts(&self, filter: &PostFilter) -> Result<i64, DomainError>;
    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError>;
    async fn delete_post(&self, id: i64) -> Result<bool, DomainError>;
    async fn set_photo(&self, id: i64, file_name: &str) -> Result<bool, DomainError>;

    /// Prepends `like` unless the same user already liked the post.
    async fn prepend_like_if_absent(
        &self,
        post_id: i64,
        like: Like,
    ) -> Result<ConditionalUpdate<Vec<Like>>, DomainError>;

    /// Removes the first like by `user_id`, rejecting when there is none.
    async fn remove_like(
        &self,
        post_id: i64,
        user_id: i64,
    ) -> Result<ConditionalUpdate<Vec<Like>>, DomainError>;

    /// Returns `None` when the post does not exist.
    async fn prepend_comment(
        &self,
        post_id: i64,
        comment: Comment,
    ) -> Result<Option<Vec<Comment>>, DomainError>;

    async fn remove_comment(
        &self,
        post_id: i64,
        comment_id: Uuid,
    ) -> Result<ConditionalUpdate<Vec<Comment>>, DomainError>;
}
