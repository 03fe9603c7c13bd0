use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::data::post_repository::{
    ConditionalUpdate, ListPostsQuery, NewPost, PostFilter, PostPatch, PostRepository, PostSort,
};
use crate::domain::error::DomainError;
use crate::domain::post::{Comment, Like, Post};

#[derive(Default)]
struct State {
    next_id: i64,
    posts: BTreeMap<i64, Post>,
    writes: usize,
}

/// Posts kept in a map behind one lock; every conditional update checks
/// and mutates under that lock.
#[derive(Clone, Default)]
pub(crate) struct InMemoryPostRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryPostRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of successful mutations so far.
    pub(crate) fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("posts mutex poisoned")
    }

    fn mutate<T>(
        &self,
        post_id: i64,
        mutate: impl FnOnce(&mut Post) -> Option<T>,
    ) -> ConditionalUpdate<T> {
        let mut state = self.lock();
        let Some(post) = state.posts.get_mut(&post_id) else {
            return ConditionalUpdate::PostMissing;
        };
        match mutate(post) {
            Some(output) => {
                state.writes += 1;
                ConditionalUpdate::Applied(output)
            }
            None => ConditionalUpdate::Rejected,
        }
    }
}

fn matches_filter(post: &Post, filter: &PostFilter) -> bool {
    let author_ok = filter.author_id.is_none_or(|id| post.author_id == id);
    let search_ok = filter.search.as_deref().is_none_or(|needle| {
        post.text
            .to_lowercase()
            .contains(&needle.to_lowercase())
    });
    author_ok && search_ok
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let mut state = self.lock();
        state.next_id += 1;
        let post = Post {
            id: state.next_id,
            text: input.text,
            author_id: input.author_id,
            author_name: input.author_name,
            likes: Vec::new(),
            comments: Vec::new(),
            photo: None,
            created_at: Utc::now(),
        };
        state.posts.insert(post.id, post.clone());
        state.writes += 1;
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        Ok(self.lock().posts.get(&id).cloned())
    }

    async fn list_posts(&self, query: &ListPostsQuery) -> Result<Vec<Post>, DomainError> {
        let state = self.lock();
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|post| matches_filter(post, &query.filter))
            .cloned()
            .collect();

        match query.sort {
            PostSort::Newest => posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id))),
            PostSort::Oldest => posts.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id))),
            PostSort::MostLiked => posts.sort_by(|a, b| {
                (b.likes.len(), b.created_at, b.id).cmp(&(a.likes.len(), a.created_at, a.id))
            }),
            PostSort::MostCommented => posts.sort_by(|a, b| {
                (b.comments.len(), b.created_at, b.id).cmp(&(a.comments.len(), a.created_at, a.id))
            }),
        }

        let offset = usize::try_from(query.pagination.offset()).unwrap_or(usize::MAX);
        Ok(posts
            .into_iter()
            .skip(offset)
            .take(query.pagination.limit as usize)
            .collect())
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<i64, DomainError> {
        let count = self
            .lock()
            .posts
            .values()
            .filter(|post| matches_filter(post, filter))
            .count();
        Ok(count as i64)
    }

    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        let outcome = self.mutate(id, |post| {
            if let Some(text) = patch.text {
                post.text = text;
            }
            if let Some(photo) = patch.photo {
                post.photo = Some(photo);
            }
            Some(post.clone())
        });
        match outcome {
            ConditionalUpdate::Applied(post) => Ok(Some(post)),
            _ => Ok(None),
        }
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        let mut state = self.lock();
        let removed = state.posts.remove(&id).is_some();
        if removed {
            state.writes += 1;
        }
        Ok(removed)
    }

    async fn set_photo(&self, id: i64, file_name: &str) -> Result<bool, DomainError> {
        let outcome = self.mutate(id, |post| {
            post.photo = Some(file_name.to_string());
            Some(())
        });
        Ok(matches!(outcome, ConditionalUpdate::Applied(())))
    }

    async fn prepend_like_if_absent(
        &self,
        post_id: i64,
        like: Like,
    ) -> Result<ConditionalUpdate<Vec<Like>>, DomainError> {
        Ok(self.mutate(post_id, |post| {
            post.prepend_like(like).then(|| post.likes.clone())
        }))
    }

    async fn remove_like(
        &self,
        post_id: i64,
        user_id: i64,
    ) -> Result<ConditionalUpdate<Vec<Like>>, DomainError> {
        Ok(self.mutate(post_id, |post| {
            post.remove_like(user_id).map(|_| post.likes.clone())
        }))
    }

    async fn prepend_comment(
        &self,
        post_id: i64,
        comment: Comment,
    ) -> Result<Option<Vec<Comment>>, DomainError> {
        let outcome = self.mutate(post_id, |post| {
            post.prepend_comment(comment);
            Some(post.comments.clone())
        });
        match outcome {
            ConditionalUpdate::Applied(comments) => Ok(Some(comments)),
            _ => Ok(None),
        }
    }

    async fn remove_comment(
        &self,
        post_id: i64,
        comment_id: Uuid,
    ) -> Result<ConditionalUpdate<Vec<Comment>>, DomainError> {
        Ok(self.mutate(post_id, |post| {
            post.remove_comment(comment_id)
                .map(|_| post.comments.clone())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryPostRepository;
    use crate::data::post_repository::{ConditionalUpdate, NewPost, PostRepository};
    use crate::domain::post::Like;

    #[tokio::test]
    async fn prepend_like_if_absent_rejects_second_like_from_same_user() {
        let repo = InMemoryPostRepository::new();
        let post = repo
            .create_post(NewPost {
                text: "hello".to_string(),
                author_id: 1,
                author_name: "Ann".to_string(),
            })
            .await
            .expect("create must succeed");

        let first = repo
            .prepend_like_if_absent(post.id, Like::new(2))
            .await
            .expect("like must succeed");
        assert!(matches!(first, ConditionalUpdate::Applied(ref likes) if likes.len() == 1));

        let second = repo
            .prepend_like_if_absent(post.id, Like::new(2))
            .await
            .expect("call must succeed");
        assert_eq!(second, ConditionalUpdate::Rejected);
        assert_eq!(repo.write_count(), 2);
    }

    #[tokio::test]
    async fn conditional_updates_report_missing_post() {
        let repo = InMemoryPostRepository::new();
        let outcome = repo.remove_like(42, 1).await.expect("call must succeed");
        assert_eq!(outcome, ConditionalUpdate::PostMissing);
    }
}
