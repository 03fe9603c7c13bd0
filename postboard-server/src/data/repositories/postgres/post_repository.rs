use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::data::post_repository::{
    ConditionalUpdate, ListPostsQuery, NewPost, PostFilter, PostPatch, PostRepository, PostSort,
};
use crate::domain::error::DomainError;
use crate::domain::post::{Comment, Like, Post};

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs `mutate` against the row while holding its lock and writes the
    /// embedded collections back only when it returns `Some`.
    async fn mutate_locked<T, F>(
        &self,
        post_id: i64,
        mutate: F,
    ) -> Result<ConditionalUpdate<T>, DomainError>
    where
        T: Send,
        F: FnOnce(&mut Post) -> Option<T> + Send,
    {
        let mut tx = self.pool.begin().await.map_err(map_post_db_error)?;

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, text, author_id, author_name, likes, comments, photo, created_at
            FROM posts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_post_db_error)?;

        let Some(row) = row else {
            return Ok(ConditionalUpdate::PostMissing);
        };

        let mut post = Post::from(row);
        let Some(output) = mutate(&mut post) else {
            return Ok(ConditionalUpdate::Rejected);
        };

        sqlx::query(
            r#"
            UPDATE posts
            SET likes = $2,
                comments = $3
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .bind(Json(&post.likes))
        .bind(Json(&post.comments))
        .execute(&mut *tx)
        .await
        .map_err(map_post_db_error)?;

        tx.commit().await.map_err(map_post_db_error)?;

        Ok(ConditionalUpdate::Applied(output))
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    text: String,
    author_id: i64,
    author_name: String,
    likes: Json<Vec<Like>>,
    comments: Json<Vec<Comment>>,
    photo: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            author_id: row.author_id,
            author_name: row.author_name,
            likes: row.likes.0,
            comments: row.comments.0,
            photo: row.photo,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (text, author_id, author_name)
            VALUES ($1, $2, $3)
            RETURNING id, text, author_id, author_name, likes, comments, photo, created_at
            "#,
        )
        .bind(input.text)
        .bind(input.author_id)
        .bind(input.author_name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(row.into())
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, text, author_id, author_name, likes, comments, photo, created_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(row.map(Post::from))
    }

    async fn list_posts(&self, query: &ListPostsQuery) -> Result<Vec<Post>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT id, text, author_id, author_name, likes, comments, photo, created_at FROM posts",
        );
        push_filter(&mut builder, &query.filter);
        builder
            .push(" ORDER BY ")
            .push(order_clause(query.sort))
            .push(" LIMIT ")
            .push_bind(i64::from(query.pagination.limit))
            .push(" OFFSET ")
            .push_bind(query.pagination.offset());

        let rows = builder
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<i64, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts");
        push_filter(&mut builder, filter);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(map_post_db_error)
    }

    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET text = COALESCE($2, text),
                photo = COALESCE($3, photo)
            WHERE id = $1
            RETURNING id, text, author_id, author_name, likes, comments, photo, created_at
            "#,
        )
        .bind(id)
        .bind(patch.text)
        .bind(patch.photo)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(row.map(Post::from))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_photo(&self, id: i64, file_name: &str) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET photo = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(file_name)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn prepend_like_if_absent(
        &self,
        post_id: i64,
        like: Like,
    ) -> Result<ConditionalUpdate<Vec<Like>>, DomainError> {
        self.mutate_locked(post_id, move |post| {
            post.prepend_like(like).then(|| post.likes.clone())
        })
        .await
    }

    async fn remove_like(
        &self,
        post_id: i64,
        user_id: i64,
    ) -> Result<ConditionalUpdate<Vec<Like>>, DomainError> {
        self.mutate_locked(post_id, move |post| {
            post.remove_like(user_id).map(|_| post.likes.clone())
        })
        .await
    }

    async fn prepend_comment(
        &self,
        post_id: i64,
        comment: Comment,
    ) -> Result<Option<Vec<Comment>>, DomainError> {
        let outcome = self
            .mutate_locked(post_id, move |post| {
                post.prepend_comment(comment);
                Some(post.comments.clone())
            })
            .await?;

        match outcome {
            ConditionalUpdate::Applied(comments) => Ok(Some(comments)),
            ConditionalUpdate::Rejected | ConditionalUpdate::PostMissing => Ok(None),
        }
    }

    async fn remove_comment(
        &self,
        post_id: i64,
        comment_id: Uuid,
    ) -> Result<ConditionalUpdate<Vec<Comment>>, DomainError> {
        self.mutate_locked(post_id, move |post| {
            post.remove_comment(comment_id)
                .map(|_| post.comments.clone())
        })
        .await
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    let mut separator = " WHERE ";

    if let Some(author_id) = filter.author_id {
        builder
            .push(separator)
            .push("author_id = ")
            .push_bind(author_id);
        separator = " AND ";
    }

    if let Some(search) = filter.search.as_deref() {
        builder
            .push(separator)
            .push("text ILIKE ")
            .push_bind(format!("%{}%", escape_like(search)));
    }
}

fn order_clause(sort: PostSort) -> &'static str {
    match sort {
        PostSort::Newest => "created_at DESC, id DESC",
        PostSort::Oldest => "created_at ASC, id ASC",
        PostSort::MostLiked => "jsonb_array_length(likes) DESC, created_at DESC, id DESC",
        PostSort::MostCommented => "jsonb_array_length(comments) DESC, created_at DESC, id DESC",
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23503")
    {
        return DomainError::NotFound("author".to_string());
    }
    DomainError::Unexpected(err.to_string())
}
