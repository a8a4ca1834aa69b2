//! Post service: DTO conversion, read-after-write and operation logging
//! over a [`PostRepository`].

use std::sync::Arc;

use jiff::Timestamp;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::dto::{CreatePostRequest, PostResponse, UpdatePostRequest};
use crate::error::{AppError, AppResult};
use crate::repositories::{PageRequest, PostRepository};

const ENTITY: &str = "Post";

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    /// Returns `None` when no post has this id.
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Option<PostResponse>> {
        info!(post_id = %id, "Fetching post");
        let post = self
            .repo
            .get_by_id(id)
            .await
            .inspect_err(|e| error!(post_id = %id, error = %e, "Failed to fetch post"))?;

        match post {
            Some(post) => {
                info!(post_id = %id, "Post fetched");
                Ok(Some(post.into()))
            }
            None => {
                warn!(post_id = %id, "Post not found");
                Ok(None)
            }
        }
    }

    /// One page of posts ordered by id.
    pub async fn get_all(&self, page: PageRequest) -> AppResult<Vec<PostResponse>> {
        info!(
            page_number = page.page_number,
            page_size = page.page_size,
            "Fetching posts"
        );
        let posts = self
            .repo
            .get_all(Some(page))
            .await
            .inspect_err(|e| error!(error = %e, "Failed to fetch posts"))?;

        info!(count = posts.len(), "Posts fetched");
        Ok(posts.into_iter().map(PostResponse::from).collect())
    }

    /// Stores a new post and its attachments; `creation_date` defaults to now.
    pub async fn create(&self, request: CreatePostRequest) -> AppResult<PostResponse> {
        let id = Uuid::new_v4();
        info!(post_id = %id, author_id = %request.author_id, "Creating post");

        self.repo
            .create(request.into_post(id, Timestamp::now()))
            .await
            .inspect_err(|e| error!(post_id = %id, error = %e, "Failed to create post"))?;

        let created = self.reload(id).await?;
        info!(post_id = %id, attachments = created.attachments.len(), "Post created");
        Ok(created)
    }

    /// Overwrites the post's fields and replaces its attachments.
    /// Returns `None` when no post has this id.
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdatePostRequest,
    ) -> AppResult<Option<PostResponse>> {
        info!(post_id = %id, "Updating post");
        let updated = self
            .repo
            .update(id, request.into_update(id))
            .await
            .inspect_err(|e| error!(post_id = %id, error = %e, "Failed to update post"))?;

        if updated.is_none() {
            warn!(post_id = %id, "Post not found for update");
            return Ok(None);
        }

        let post = self.reload(id).await?;
        info!(post_id = %id, attachments = post.attachments.len(), "Post updated");
        Ok(Some(post))
    }

    /// `false` when no post has this id.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        info!(post_id = %id, "Deleting post");
        let deleted = self
            .repo
            .delete(id)
            .await
            .inspect_err(|e| error!(post_id = %id, error = %e, "Failed to delete post"))?;

        if deleted {
            info!(post_id = %id, "Post deleted");
        } else {
            warn!(post_id = %id, "Post not found for delete");
        }
        Ok(deleted)
    }

    async fn reload(&self, id: Uuid) -> AppResult<PostResponse> {
        match self.repo.get_by_id(id).await {
            Ok(Some(post)) => Ok(post.into()),
            Ok(None) => {
                error!(post_id = %id, "Post missing after write");
                Err(AppError::not_found(ENTITY, id))
            }
            Err(e) => {
                error!(post_id = %id, error = %e, "Failed to re-read post");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dto::AttachmentRequest;
    use crate::repositories::MemoryStore;

    fn service() -> (PostService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (PostService::new(store.clone()), store)
    }

    fn attachments(names: &[&str]) -> Vec<AttachmentRequest> {
        names
            .iter()
            .map(|name| AttachmentRequest {
                file_name: name.to_string(),
            })
            .collect()
    }

    fn create_request(names: &[&str]) -> CreatePostRequest {
        CreatePostRequest {
            author_id: Uuid::new_v4(),
            title: "Release notes".to_string(),
            body: "Version one is out.".to_string(),
            is_pinned: true,
            creation_date: None,
            attachments: attachments(names),
        }
    }

    fn update_request(names: &[&str]) -> UpdatePostRequest {
        UpdatePostRequest {
            title: "Release notes (edited)".to_string(),
            body: "Version one is out, again.".to_string(),
            is_pinned: false,
            deletion_date: None,
            attachments: attachments(names),
        }
    }

    fn file_names(post: &PostResponse) -> Vec<&str> {
        post.attachments.iter().map(|a| a.file_name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_create_then_get_returns_same_post() {
        let (service, _) = service();

        let created = service.create(create_request(&["b.txt", "a.txt"])).await.unwrap();
        let fetched = service.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(created, fetched);
        assert_eq!(file_names(&fetched), vec!["a.txt", "b.txt"]);
        assert!(fetched.attachments.iter().all(|a| a.post_id == created.id));
    }

    #[tokio::test]
    async fn test_update_replaces_attachments_and_keeps_identity_fields() {
        let (service, _) = service();
        let created = service.create(create_request(&["a.txt", "b.txt"])).await.unwrap();

        let updated = service
            .update(created.id, update_request(&["c.txt"]))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(file_names(&updated), vec!["c.txt"]);
        assert_eq!(updated.author_id, created.author_id);
        assert_eq!(updated.creation_date, created.creation_date);
        assert!(!updated.is_pinned);
    }

    #[tokio::test]
    async fn test_get_all_pages_in_id_order() {
        let (service, _) = service();
        for _ in 0..5 {
            service.create(create_request(&[])).await.unwrap();
        }

        let all = service.get_all(PageRequest::new(1, 10)).await.unwrap();
        let second = service.get_all(PageRequest::new(2, 2)).await.unwrap();

        let ids: Vec<Uuid> = all.iter().map(|p| p.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(second.iter().map(|p| p.id).collect::<Vec<_>>(), sorted[2..4].to_vec());
    }

    #[tokio::test]
    async fn test_failed_update_leaves_post_unchanged() {
        let (service, store) = service();
        let created = service.create(create_request(&["a.txt"])).await.unwrap();

        store.fail_next_commit();
        let result = service.update(created.id, update_request(&["z.txt"])).await;

        assert!(matches!(result, Err(AppError::Database { .. })));
        let fetched = service.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }
}
