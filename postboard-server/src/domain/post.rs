use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::DomainError;
use super::user::{Actor, User};

const POST_TEXT_MAX_CHARS: usize = 5000;
const COMMENT_TEXT_MAX_CHARS: usize = 1000;
const PHOTO_NAME_MAX_CHARS: usize = 255;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Like {
    pub(crate) user_id: i64,
    pub(crate) created_at: DateTime<Utc>,
}

impl Like {
    pub(crate) fn new(user_id: i64) -> Self {
        Self {
            user_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Comment {
    pub(crate) id: Uuid,
    pub(crate) text: String,
    pub(crate) author_id: i64,
    pub(crate) author_name: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl Comment {
    /// Builds a comment with a fresh id, freezing the author's current name.
    pub(crate) fn new(text: String, author: &User) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            author_id: author.id,
            author_name: author.name.clone(),
            created_at: Utc::now(),
        }
    }
}

/// A post together with its embedded likes and comments.
///
/// Both collections are kept newest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) author_id: i64,
    pub(crate) author_name: String,
    pub(crate) likes: Vec<Like>,
    pub(crate) comments: Vec<Comment>,
    pub(crate) photo: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
}

impl Post {
    pub(crate) fn is_owned_by(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }

    /// Authors and admins may edit; deletion stays author-only.
    pub(crate) fn can_be_updated_by(&self, actor: &Actor) -> bool {
        self.is_owned_by(actor.user_id) || actor.role.is_admin()
    }

    pub(crate) fn is_liked_by(&self, user_id: i64) -> bool {
        self.likes.iter().any(|like| like.user_id == user_id)
    }

    pub(crate) fn find_comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|comment| comment.id == comment_id)
    }

    /// Returns `false` without touching the likes when the user already liked the post.
    pub(crate) fn prepend_like(&mut self, like: Like) -> bool {
        if self.is_liked_by(like.user_id) {
            return false;
        }
        self.likes.insert(0, like);
        true
    }

    pub(crate) fn remove_like(&mut self, user_id: i64) -> Option<Like> {
        remove_first(&mut self.likes, |like| like.user_id == user_id)
    }

    pub(crate) fn prepend_comment(&mut self, comment: Comment) {
        self.comments.insert(0, comment);
    }

    pub(crate) fn remove_comment(&mut self, comment_id: Uuid) -> Option<Comment> {
        remove_first(&mut self.comments, |comment| comment.id == comment_id)
    }
}

/// Removes the first element matching `predicate`, keeping the order of the rest.
pub(crate) fn remove_first<T>(
    items: &mut Vec<T>,
    predicate: impl FnMut(&T) -> bool,
) -> Option<T> {
    let index = items.iter().position(predicate)?;
    Some(items.remove(index))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreatePostRequest {
    pub(crate) text: String,
}

impl CreatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            text: normalize_post_text(&self.text)?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct UpdatePostRequest {
    pub(crate) text: Option<String>,
    pub(crate) photo: Option<String>,
}

impl UpdatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        if self.text.is_none() && self.photo.is_none() {
            return Err(DomainError::Validation {
                field: "patch",
                message: "must set at least one of text, photo",
            });
        }

        Ok(Self {
            text: self.text.as_deref().map(normalize_post_text).transpose()?,
            photo: self.photo.as_deref().map(normalize_photo_name).transpose()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreateCommentRequest {
    pub(crate) text: String,
}

impl CreateCommentRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let text = self.text.trim();
        if text.is_empty() || text.chars().count() > COMMENT_TEXT_MAX_CHARS {
            return Err(DomainError::Validation {
                field: "text",
                message: "must be 1..1000 chars",
            });
        }
        Ok(Self {
            text: text.to_string(),
        })
    }
}

fn normalize_post_text(text: &str) -> Result<String, DomainError> {
    let text = text.trim();
    if text.is_empty() || text.chars().count() > POST_TEXT_MAX_CHARS {
        return Err(DomainError::Validation {
            field: "text",
            message: "must be 1..5000 chars",
        });
    }
    Ok(text.to_string())
}

fn normalize_photo_name(photo: &str) -> Result<String, DomainError> {
    let photo = photo.trim();
    if photo.is_empty()
        || photo.chars().count() > PHOTO_NAME_MAX_CHARS
        || photo.contains(['/', '\\'])
        || photo.contains("..")
    {
        return Err(DomainError::Validation {
            field: "photo",
            message: "must be a plain file name",
        });
    }
    Ok(photo.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{
        Comment, CreateCommentRequest, CreatePostRequest, DomainError, Like, Post,
        UpdatePostRequest, remove_first,
    };
    use crate::domain::user::{Actor, Role, User};

    #[test]
    fn remove_first_removes_only_first_match_and_keeps_order() {
        let mut items = vec![1, 2, 3, 2, 4];
        assert_eq!(remove_first(&mut items, |v| *v == 2), Some(2));
        assert_eq!(items, vec![1, 3, 2, 4]);
    }

    #[test]
    fn remove_first_signals_absence() {
        let mut items = vec![1, 3];
        assert_eq!(remove_first(&mut items, |v| *v == 2), None);
        assert_eq!(items, vec![1, 3]);
    }

    #[test]
    fn prepend_like_puts_newest_first_and_refuses_duplicates() {
        let mut post = sample_post(10);

        assert!(post.prepend_like(Like::new(1)));
        assert!(post.prepend_like(Like::new(2)));
        assert!(!post.prepend_like(Like::new(1)));

        let users: Vec<i64> = post.likes.iter().map(|like| like.user_id).collect();
        assert_eq!(users, vec![2, 1]);
    }

    #[test]
    fn remove_like_returns_none_when_not_liked() {
        let mut post = sample_post(10);
        post.prepend_like(Like::new(1));

        assert!(post.remove_like(2).is_none());
        assert!(post.remove_like(1).is_some());
        assert!(post.likes.is_empty());
    }

    #[test]
    fn remove_comment_keeps_relative_order_of_others() {
        let mut post = sample_post(10);
        let author = User::new(5, "Ann");
        let first = Comment::new("first".to_string(), &author);
        let second = Comment::new("second".to_string(), &author);
        let third = Comment::new("third".to_string(), &author);
        let second_id = second.id;

        post.prepend_comment(first);
        post.prepend_comment(second);
        post.prepend_comment(third);

        let removed = post.remove_comment(second_id).expect("comment must exist");
        assert_eq!(removed.text, "second");

        let texts: Vec<&str> = post.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["third", "first"]);
        assert!(post.remove_comment(Uuid::new_v4()).is_none());
    }

    #[test]
    fn update_permission_allows_owner_and_admin() {
        let post = sample_post(10);

        assert!(post.can_be_updated_by(&Actor::new(10, Role::User)));
        assert!(post.can_be_updated_by(&Actor::new(99, Role::Admin)));
        assert!(!post.can_be_updated_by(&Actor::new(99, Role::User)));
    }

    #[test]
    fn create_post_request_trims_and_rejects_blank() {
        let ok = CreatePostRequest {
            text: "  hello  ".to_string(),
        }
        .validate()
        .expect("must validate");
        assert_eq!(ok.text, "hello");

        let err = CreatePostRequest {
            text: "   ".to_string(),
        }
        .validate()
        .expect_err("blank text must be rejected");
        assert_validation_field(err, "text");
    }

    #[test]
    fn update_post_request_rejects_empty_patch() {
        let err = UpdatePostRequest::default()
            .validate()
            .expect_err("empty patch must be rejected");
        assert_validation_field(err, "patch");
    }

    #[test]
    fn update_post_request_rejects_path_like_photo() {
        let err = UpdatePostRequest {
            text: None,
            photo: Some("../etc/passwd".to_string()),
        }
        .validate()
        .expect_err("photo must be a plain name");
        assert_validation_field(err, "photo");
    }

    #[test]
    fn create_comment_request_enforces_length() {
        let err = CreateCommentRequest {
            text: "x".repeat(1001),
        }
        .validate()
        .expect_err("too long");
        assert_validation_field(err, "text");
    }

    fn sample_post(author_id: i64) -> Post {
        Post {
            id: 1,
            text: "hello".to_string(),
            author_id,
            author_name: "Author".to_string(),
            likes: Vec::new(),
            comments: Vec::new(),
            photo: None,
            created_at: Utc::now(),
        }
    }

    fn assert_validation_field(err: DomainError, expected_field: &'static str) {
        match err {
            DomainError::Validation { field, .. } => assert_eq!(field, expected_field),
            _ => panic!("expected DomainError::Validation"),
        }
    }
}
