//! PostgreSQL post repository.
//!
//! A post and its attachments are written in one transaction and read in
//! one snapshot. Updates delete every attachment row of the post and insert
//! the new set.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use jiff_diesel::ToDiesel;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppResult, DatabaseErrorConverter};
use crate::models::{Attachment, Post, PostRecord, UpdatePost};
use crate::repositories::{PageRequest, PostRepository};
use crate::schema::{attachments, posts};

#[derive(Clone)]
pub struct PgPostRepository {
    pool: AsyncDbPool,
}

impl PgPostRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

async fn insert_attachments(
    conn: &mut AsyncPgConnection,
    rows: &[Attachment],
) -> QueryResult<usize> {
    if rows.is_empty() {
        return Ok(0);
    }
    diesel::insert_into(attachments::table)
        .values(rows)
        .execute(conn)
        .await
}

async fn load_post(conn: &mut AsyncPgConnection, post_id: Uuid) -> QueryResult<Option<Post>> {
    let Some(record) = posts::table
        .find(post_id)
        .select(PostRecord::as_select())
        .first(conn)
        .await
        .optional()?
    else {
        return Ok(None);
    };

    let children = Attachment::belonging_to(&record)
        .select(Attachment::as_select())
        .load(conn)
        .await?;

    Ok(Some(Post::from_records(record, children)))
}

async fn load_posts(
    conn: &mut AsyncPgConnection,
    page: Option<PageRequest>,
) -> QueryResult<Vec<Post>> {
    let mut query = posts::table
        .select(PostRecord::as_select())
        .order(posts::id.asc())
        .into_boxed();
    if let Some(page) = page {
        query = query.offset(page.offset()).limit(page.limit());
    }
    let records: Vec<PostRecord> = query.load(conn).await?;

    let children: Vec<Attachment> = Attachment::belonging_to(&records)
        .select(Attachment::as_select())
        .load(conn)
        .await?;
    let grouped = children.grouped_by(&records);

    Ok(records
        .into_iter()
        .zip(grouped)
        .map(|(record, children)| Post::from_records(record, children))
        .collect())
}

#[async_trait]
impl PostRepository for PgPostRepository {
    // Reads run in one repeatable-read snapshot so a post never pairs with
    // attachments from a concurrent update.
    async fn get_by_id(&self, post_id: Uuid) -> AppResult<Option<Post>> {
        let mut pooled = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        conn.build_transaction()
            .read_only()
            .repeatable_read()
            .run(|conn| async move { load_post(conn, post_id).await }.scope_boxed())
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "get post"))
    }

    async fn get_all(&self, page: Option<PageRequest>) -> AppResult<Vec<Post>> {
        let mut pooled = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        conn.build_transaction()
            .read_only()
            .repeatable_read()
            .run(|conn| async move { load_posts(conn, page).await }.scope_boxed())
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "list posts"))
    }

    async fn create(&self, post: Post) -> AppResult<Post> {
        let mut pooled = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        let record = post.to_record();

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                let record = diesel::insert_into(posts::table)
                    .values(&record)
                    .returning(PostRecord::as_returning())
                    .get_result(conn)
                    .await?;
                insert_attachments(conn, &post.attachments).await?;
                Ok(Post::from_records(record, post.attachments))
            }
            .scope_boxed()
        })
        .await
        .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "create post"))
    }

    async fn update(&self, post_id: Uuid, changes: UpdatePost) -> AppResult<Option<Post>> {
        let mut pooled = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                let Some(record) = diesel::update(posts::table.find(post_id))
                    .set((
                        posts::title.eq(&changes.title),
                        posts::body.eq(&changes.body),
                        posts::is_pinned.eq(changes.is_pinned),
                        posts::deletion_date.eq(changes.deletion_date.map(|d| d.to_diesel())),
                    ))
                    .returning(PostRecord::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?
                else {
                    return Ok(None);
                };

                diesel::delete(attachments::table.filter(attachments::post_id.eq(post_id)))
                    .execute(conn)
                    .await?;
                insert_attachments(conn, &changes.attachments).await?;

                Ok(Some(Post::from_records(record, changes.attachments)))
            }
            .scope_boxed()
        })
        .await
        .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "update post"))
    }

    async fn delete(&self, post_id: Uuid) -> AppResult<bool> {
        let mut pooled = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        let deleted = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    diesel::delete(attachments::table.filter(attachments::post_id.eq(post_id)))
                        .execute(conn)
                        .await?;
                    diesel::delete(posts::table.find(post_id)).execute(conn).await
                }
                .scope_boxed()
            })
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "delete post"))?;

        Ok(deleted > 0)
    }
}
