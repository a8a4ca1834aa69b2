use diesel::prelude::*;
use jiff::Timestamp;
use jiff_diesel::ToDiesel;
use uuid::Uuid;

/// Post aggregate: the post row plus the attachments it exclusively owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: Uuid,
    /// Back-reference to the author; not an owning relation.
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub is_pinned: bool,
    pub creation_date: Timestamp,
    /// Stored and returned, never consulted by any read.
    pub deletion_date: Option<Timestamp>,
    pub attachments: Vec<Attachment>,
}

/// File attached to a post.
#[derive(Debug, Queryable, Selectable, Identifiable, Insertable, Associations, Clone, PartialEq, Eq)]
#[diesel(belongs_to(PostRecord, foreign_key = post_id))]
#[diesel(table_name = crate::schema::attachments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Attachment {
    pub id: Uuid,
    pub file_name: String,
    pub post_id: Uuid,
}

/// Row shape of the `posts` table.
#[derive(Debug, Queryable, Selectable, Identifiable, Insertable, Clone)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostRecord {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub is_pinned: bool,
    pub creation_date: jiff_diesel::Timestamp,
    pub deletion_date: Option<jiff_diesel::Timestamp>,
}

/// Replacement data for an existing post.
///
/// The author and creation date are fixed at creation time; everything else
/// is overwritten and the attachment set is replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePost {
    pub title: String,
    pub body: String,
    pub is_pinned: bool,
    pub deletion_date: Option<Timestamp>,
    pub attachments: Vec<Attachment>,
}

impl Post {
    /// Assembles the aggregate from its row and the rows of its attachments.
    pub fn from_records(record: PostRecord, mut attachments: Vec<Attachment>) -> Self {
        sort_attachments(&mut attachments);
        Self {
            id: record.id,
            author_id: record.author_id,
            title: record.title,
            body: record.body,
            is_pinned: record.is_pinned,
            creation_date: record.creation_date.to_jiff(),
            deletion_date: record.deletion_date.map(|d| d.to_jiff()),
            attachments,
        }
    }

    /// Row representation of the post itself, without attachments.
    pub fn to_record(&self) -> PostRecord {
        PostRecord {
            id: self.id,
            author_id: self.author_id,
            title: self.title.clone(),
            body: self.body.clone(),
            is_pinned: self.is_pinned,
            creation_date: self.creation_date.to_diesel(),
            deletion_date: self.deletion_date.map(|d| d.to_diesel()),
        }
    }

    /// Overwrites the mutable fields and swaps in the new attachment set.
    pub fn apply(&mut self, update: UpdatePost) {
        self.title = update.title;
        self.body = update.body;
        self.is_pinned = update.is_pinned;
        self.deletion_date = update.deletion_date;
        self.attachments = update.attachments;
        sort_attachments(&mut self.attachments);
    }
}

/// Attachments are always presented ordered by file name, then id.
pub(crate) fn sort_attachments(attachments: &mut [Attachment]) {
    attachments.sort_by(|a, b| a.file_name.cmp(&b.file_name).then(a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(post_id: Uuid, name: &str) -> Attachment {
        Attachment {
            id: Uuid::new_v4(),
            file_name: name.to_string(),
            post_id,
        }
    }

    fn sample_post() -> Post {
        let id = Uuid::new_v4();
        Post {
            id,
            author_id: Uuid::new_v4(),
            title: "Hello".to_string(),
            body: "First post".to_string(),
            is_pinned: false,
            creation_date: Timestamp::from_second(1_715_000_000).unwrap(),
            deletion_date: None,
            attachments: vec![attachment(id, "b.png"), attachment(id, "a.png")],
        }
    }

    #[test]
    fn test_from_records_orders_attachments() {
        let post = sample_post();
        let record = post.to_record();
        let rebuilt = Post::from_records(record, post.attachments.clone());

        let names: Vec<&str> = rebuilt.attachments.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
        assert_eq!(rebuilt.creation_date, post.creation_date);
        assert_eq!(rebuilt.author_id, post.author_id);
    }

    #[test]
    fn test_apply_replaces_attachments_wholesale() {
        let mut post = sample_post();
        let author = post.author_id;
        let created = post.creation_date;
        let replacement = attachment(post.id, "c.txt");

        post.apply(UpdatePost {
            title: "Edited".to_string(),
            body: "New body".to_string(),
            is_pinned: true,
            deletion_date: None,
            attachments: vec![replacement.clone()],
        });

        assert_eq!(post.attachments, vec![replacement]);
        assert_eq!(post.title, "Edited");
        assert!(post.is_pinned);
        assert_eq!(post.author_id, author);
        assert_eq!(post.creation_date, created);
    }
}
