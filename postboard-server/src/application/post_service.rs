use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::data::file_sink::FileSink;
use crate::data::post_repository::{
    ConditionalUpdate, ListPostsQuery, NewPost, Pagination, PostPatch, PostRepository,
};
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::post::{
    Comment, CreateCommentRequest, CreatePostRequest, Like, Post, UpdatePostRequest,
};
use crate::domain::upload::UploadedFile;
use crate::domain::user::{Actor, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageRef {
    pub(crate) page: u32,
    pub(crate) limit: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct ListPostsResult {
    pub(crate) posts: Vec<Post>,
    pub(crate) total: i64,
    pub(crate) page: u32,
    pub(crate) limit: u32,
    pub(crate) next: Option<PageRef>,
    pub(crate) prev: Option<PageRef>,
}

impl ListPostsResult {
    fn new(posts: Vec<Post>, total: i64, pagination: Pagination) -> Self {
        let Pagination { page, limit } = pagination;
        let end = i64::from(page) * i64::from(limit);

        let next = (end < total).then_some(PageRef {
            page: page + 1,
            limit,
        });
        let prev = (page > 1).then_some(PageRef {
            page: page - 1,
            limit,
        });

        Self {
            posts,
            total,
            page,
            limit,
            next,
            prev,
        }
    }
}

/// All reads and writes of a post and its embedded likes and comments go
/// through here; ownership and uniqueness rules are enforced in this type.
pub(crate) struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    files: Arc<dyn FileSink>,
    max_upload_bytes: usize,
}

impl PostService {
    pub(crate) fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        files: Arc<dyn FileSink>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            posts,
            users,
            files,
            max_upload_bytes,
        }
    }

    pub(crate) async fn create_post(
        &self,
        author_id: i64,
        req: CreatePostRequest,
    ) -> Result<Post, DomainError> {
        let req = req.validate()?;
        let author = self.find_user(author_id).await?;

        let post = self
            .posts
            .create_post(NewPost {
                text: req.text,
                author_id,
                author_name: author.name,
            })
            .await?;

        info!(post_id = post.id, author_id, "post created");
        Ok(post)
    }

    pub(crate) async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .get_post(id)
            .await?
            .ok_or_else(|| post_not_found(id))
    }

    pub(crate) async fn list_posts(
        &self,
        query: ListPostsQuery,
    ) -> Result<ListPostsResult, DomainError> {
        let posts = self.posts.list_posts(&query).await?;
        let total = self.posts.count_posts(&query.filter).await?;

        Ok(ListPostsResult::new(posts, total, query.pagination))
    }

    pub(crate) async fn update_post(
        &self,
        post_id: i64,
        actor: Actor,
        req: UpdatePostRequest,
    ) -> Result<Post, DomainError> {
        let post = self.get_post(post_id).await?;
        if !post.can_be_updated_by(&actor) {
            return Err(DomainError::Forbidden);
        }

        let req = req.validate()?;
        let patch = PostPatch {
            text: req.text,
            photo: req.photo,
        };

        let updated = self
            .posts
            .update_post(post_id, patch)
            .await?
            .ok_or_else(|| post_not_found(post_id))?;

        info!(post_id, actor_id = actor.user_id, role = %actor.role, "post updated");
        Ok(updated)
    }

    /// Author only; admins cannot delete someone else's post.
    pub(crate) async fn delete_post(&self, post_id: i64, actor_id: i64) -> Result<(), DomainError> {
        let post = self.get_post(post_id).await?;
        if !post.is_owned_by(actor_id) {
            return Err(DomainError::Forbidden);
        }

        if !self.posts.delete_post(post_id).await? {
            return Err(post_not_found(post_id));
        }

        info!(post_id, actor_id, "post deleted");
        Ok(())
    }

    pub(crate) async fn like_post(&self, post_id: i64, user_id: i64) -> Result<Vec<Like>, DomainError> {
        let post = self.get_post(post_id).await?;
        if post.is_liked_by(user_id) {
            return Err(already_liked());
        }

        match self
            .posts
            .prepend_like_if_absent(post_id, Like::new(user_id))
            .await?
        {
            ConditionalUpdate::Applied(likes) => Ok(likes),
            ConditionalUpdate::Rejected => Err(already_liked()),
            ConditionalUpdate::PostMissing => Err(post_not_found(post_id)),
        }
    }

    pub(crate) async fn unlike_post(
        &self,
        post_id: i64,
        user_id: i64,
    ) -> Result<Vec<Like>, DomainError> {
        let post = self.get_post(post_id).await?;
        if !post.is_liked_by(user_id) {
            return Err(not_yet_liked());
        }

        match self.posts.remove_like(post_id, user_id).await? {
            ConditionalUpdate::Applied(likes) => Ok(likes),
            ConditionalUpdate::Rejected => Err(not_yet_liked()),
            ConditionalUpdate::PostMissing => Err(post_not_found(post_id)),
        }
    }

    /// A missing post is reported as `NotFound` by the store-side prepend.
    pub(crate) async fn add_comment(
        &self,
        post_id: i64,
        author_id: i64,
        req: CreateCommentRequest,
    ) -> Result<Vec<Comment>, DomainError> {
        let req = req.validate()?;
        let author = self.find_user(author_id).await?;
        let comment = Comment::new(req.text, &author);

        self.posts
            .prepend_comment(post_id, comment)
            .await?
            .ok_or_else(|| post_not_found(post_id))
    }

    pub(crate) async fn delete_comment(
        &self,
        post_id: i64,
        comment_id: Uuid,
        actor_id: i64,
    ) -> Result<Vec<Comment>, DomainError> {
        let post = self.get_post(post_id).await?;
        let comment = post
            .find_comment(comment_id)
            .ok_or_else(comment_not_found)?;

        if comment.author_id != actor_id {
            return Err(DomainError::Forbidden);
        }

        match self.posts.remove_comment(post_id, comment_id).await? {
            ConditionalUpdate::Applied(comments) => Ok(comments),
            ConditionalUpdate::Rejected => Err(comment_not_found()),
            ConditionalUpdate::PostMissing => Err(post_not_found(post_id)),
        }
    }

    /// Stores the image as `photo_<id><ext>` and records it on the post.
    pub(crate) async fn attach_photo(
        &self,
        post_id: i64,
        actor_id: i64,
        file: Option<UploadedFile>,
    ) -> Result<String, DomainError> {
        let post = self.get_post(post_id).await?;
        if !post.is_owned_by(actor_id) {
            return Err(DomainError::Forbidden);
        }

        let file =
            file.ok_or_else(|| DomainError::InvalidUpload("please upload a file".to_string()))?;
        file.ensure_image()?;
        file.ensure_size_within(self.max_upload_bytes)?;

        let file_name = file.photo_file_name(post_id);
        if let Err(err) = self.files.write_file(&file_name, &file.bytes).await {
            error!(post_id, file_name = %file_name, error = %err, "photo write failed");
            return Err(DomainError::Unexpected("problem with file upload".to_string()));
        }

        let recorded = match self.posts.set_photo(post_id, &file_name).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(post_not_found(post_id)),
            Err(err) => Err(err),
        };
        if let Err(err) = recorded {
            self.discard_file(post_id, &file_name).await;
            return Err(err);
        }

        info!(post_id, file_name = %file_name, "photo attached");
        Ok(file_name)
    }

    /// Drops a photo that was written but never recorded on its post.
    async fn discard_file(&self, post_id: i64, file_name: &str) {
        if let Err(err) = self.files.remove_file(file_name).await {
            warn!(post_id, file_name = %file_name, error = %err, "orphaned photo left on disk");
        }
    }

    async fn find_user(&self, user_id: i64) -> Result<User, DomainError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user id: {user_id}")))
    }
}

fn post_not_found(post_id: i64) -> DomainError {
    DomainError::NotFound(format!("post id: {post_id}"))
}

fn comment_not_found() -> DomainError {
    DomainError::NotFound("comment does not exist".to_string())
}

fn already_liked() -> DomainError {
    DomainError::Conflict("post already liked".to_string())
}

fn not_yet_liked() -> DomainError {
    DomainError::Conflict("post has not yet been liked".to_string())
}
