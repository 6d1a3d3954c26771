use std::collections::{BTreeSet, HashMap};

use mongodb::bson::{Document, oid::ObjectId};

use crate::category::model::Category;
use crate::category::service::CategoryService;
use crate::comment::service::CommentService;
use crate::location::model::Location;
use crate::location::service::LocationService;
use crate::post::post_model::{Post, PostView};
use crate::post::post_service::PostService;
use crate::user::model::{AuthorSummary, User};
use crate::user::service::UserService;
use crate::utils::error::CustomError;
use crate::utils::pagination::{Page, PageWindow};

/// Records referenced by a batch of posts.
#[derive(Default)]
pub struct Relations {
    pub categories: HashMap<ObjectId, Category>,
    pub locations: HashMap<ObjectId, Location>,
    pub authors: HashMap<ObjectId, User>,
}

/// Join posts with their relations. A dangling reference leaves the
/// field empty.
pub fn assemble(posts: Vec<Post>, relations: &Relations) -> Vec<PostView> {
    posts
        .into_iter()
        .map(|post| {
            let category = post
                .category_id
                .and_then(|id| relations.categories.get(&id).cloned());
            let location = post
                .location_id
                .and_then(|id| relations.locations.get(&id).cloned());
            let author = relations.authors.get(&post.author_id).map(AuthorSummary::from);
            PostView {
                post,
                category,
                location,
                author,
                comment_count: 0,
            }
        })
        .collect()
}

/// Newest publication date first; ties keep their relative order.
pub fn newest_first(views: &mut [PostView]) {
    views.sort_by(|a, b| b.post.pub_date.cmp(&a.post.pub_date));
}

fn unique_ids<I: IntoIterator<Item = ObjectId>>(ids: I) -> Vec<ObjectId> {
    ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Loads what the access policy and clients need to see alongside posts.
pub struct PostFeed<'a> {
    pub categories: &'a CategoryService,
    pub locations: &'a LocationService,
    pub users: &'a UserService,
    pub comments: &'a CommentService,
}

impl PostFeed<'_> {
    pub async fn relations(&self, posts: &[Post]) -> Result<Relations, CustomError> {
        let category_ids = unique_ids(posts.iter().filter_map(|p| p.category_id));
        let location_ids = unique_ids(posts.iter().filter_map(|p| p.location_id));
        let author_ids = unique_ids(posts.iter().map(|p| p.author_id));

        Ok(Relations {
            categories: self.categories.find_by_ids(&category_ids).await?,
            locations: self.locations.find_by_ids(&location_ids).await?,
            authors: self.users.find_by_ids(&author_ids).await?,
        })
    }

    pub async fn views(&self, posts: Vec<Post>) -> Result<Vec<PostView>, CustomError> {
        let relations = self.relations(&posts).await?;
        Ok(assemble(posts, &relations))
    }

    pub async fn view(&self, post: Post) -> Result<PostView, CustomError> {
        let mut views = self.views(vec![post]).await?;
        views
            .pop()
            .ok_or_else(|| CustomError::InternalServerError("Failed to load post".to_string()))
    }

    /// Count and fetch one page of `filter` in storage, join it, then let
    /// `keep` apply the access policy before the final newest-first sort.
    pub async fn page<F>(
        &self,
        posts: &PostService,
        filter: Document,
        raw_page: Option<&str>,
        per_page: usize,
        keep: F,
    ) -> Result<Page<PostView>, CustomError>
    where
        F: FnOnce(Vec<PostView>, &HashMap<ObjectId, u64>) -> Vec<PostView>,
    {
        let count = posts.count_posts(filter.clone()).await?;
        let window = PageWindow::new(count, raw_page, per_page);

        let views = self.views(posts.find_page(filter, &window).await?).await?;
        let counts = self.comment_counts(&views).await?;
        let mut shown = keep(views, &counts);
        newest_first(&mut shown);

        Ok(window.into_page(shown))
    }

    pub async fn comment_counts(
        &self,
        views: &[PostView],
    ) -> Result<HashMap<ObjectId, u64>, CustomError> {
        let ids: Vec<ObjectId> = views.iter().map(|v| v.post.id).collect();
        self.comments.count_by_posts(&ids).await
    }
}
