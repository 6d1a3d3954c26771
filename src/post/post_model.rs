use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::category::model::Category;
use crate::location::model::Location;
use crate::user::model::AuthorSummary;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub text: String,
    #[serde(with = "crate::utils::dates")]
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub author_id: ObjectId,
    #[serde(default)]
    pub category_id: Option<ObjectId>,
    #[serde(default)]
    pub location_id: Option<ObjectId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post joined with the records it references, as handed to the access
/// policy and to clients.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub author: Option<AuthorSummary>,
    pub comment_count: u64,
}

impl PostView {
    pub fn new(post: Post) -> Self {
        PostView {
            post,
            category: None,
            location: None,
            author: None,
            comment_count: 0,
        }
    }

    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }
}

/// Body of create and edit requests. Omitted fields keep their current
/// value on edit, and a blank `category_id` or `location_id` clears the
/// reference. On create `pub_date` defaults to now and `is_published` to
/// true.
#[derive(Debug, Deserialize, Default)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: Option<DateTime<Utc>>,
    pub is_published: Option<bool>,
    pub category_id: Option<String>,
    pub location_id: Option<String>,
}

/// `category_id`/`location_id` of a form after lookup. `None` leaves the
/// post's reference alone, `Some(None)` clears it.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct References {
    pub category_id: Option<Option<ObjectId>>,
    pub location_id: Option<Option<ObjectId>>,
}

impl Post {
    /// Merge an edit form into the stored post.
    pub fn apply_edit(&mut self, form: PostForm, refs: References) {
        self.title = form.title;
        self.text = form.text;
        if let Some(pub_date) = form.pub_date {
            self.pub_date = pub_date;
        }
        if let Some(is_published) = form.is_published {
            self.is_published = is_published;
        }
        if let Some(category_id) = refs.category_id {
            self.category_id = category_id;
        }
        if let Some(location_id) = refs.location_id {
            self.location_id = location_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stored_post() -> Post {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        Post {
            id: ObjectId::new(),
            title: "Old title".into(),
            text: "Old text".into(),
            pub_date: at,
            is_published: false,
            image: Some("https://img.example/a.png".into()),
            author_id: ObjectId::new(),
            category_id: Some(ObjectId::new()),
            location_id: Some(ObjectId::new()),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn edit_without_references_keeps_them() {
        let mut post = stored_post();
        let before = post.clone();
        let form: PostForm =
            serde_json::from_str(r#"{"title":"New title","text":"body"}"#).unwrap();

        post.apply_edit(form, References::default());

        assert_eq!(post.title, "New title");
        assert_eq!(post.text, "body");
        assert_eq!(post.category_id, before.category_id);
        assert_eq!(post.location_id, before.location_id);
        assert_eq!(post.pub_date, before.pub_date);
        assert!(!post.is_published);
        assert_eq!(post.image, before.image);
    }

    #[test]
    fn edit_replaces_or_clears_given_references() {
        let mut post = stored_post();
        let category = ObjectId::new();
        let form = PostForm {
            title: "t".into(),
            text: "x".into(),
            is_published: Some(true),
            ..PostForm::default()
        };

        post.apply_edit(
            form,
            References {
                category_id: Some(Some(category)),
                location_id: Some(None),
            },
        );

        assert_eq!(post.category_id, Some(category));
        assert_eq!(post.location_id, None);
        assert!(post.is_published);
    }

    #[test]
    fn stored_pub_date_is_fixed_width() {
        let doc = mongodb::bson::to_document(&stored_post()).unwrap();
        assert_eq!(doc.get_str("pub_date").unwrap(), "2024-05-01T09:00:00.000000Z");
    }
}
