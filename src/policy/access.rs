//! Post visibility and ownership rules.
//!
//! Every handler that reads or mutates a post or comment asks this module
//! first. The viewer and the current instant are always passed in; nothing
//! here touches storage or request state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use crate::comment::model::Comment;
use crate::post::post_model::PostView;

/// Who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(ObjectId),
}

impl Viewer {
    pub fn user_id(&self) -> Option<ObjectId> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Viewer::User(_))
    }

    fn is(&self, owner: &ObjectId) -> bool {
        self.user_id().as_ref() == Some(owner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    View,
    Edit,
    Delete,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAction {
    Edit,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Answered exactly like a missing record so hidden posts do not leak.
    NotFound,
    /// Answered with a redirect to the post's view.
    Forbidden,
    Unauthenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Access rules evaluated at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct PostAccessPolicy {
    now: DateTime<Utc>,
}

impl PostAccessPolicy {
    pub fn at(now: DateTime<Utc>) -> Self {
        PostAccessPolicy { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Published, not scheduled for later, and not in an unpublished category.
    pub fn is_visible(&self, view: &PostView) -> bool {
        view.post.is_published
            && view.post.pub_date <= self.now
            && view.category.as_ref().is_none_or(|c| c.is_published)
    }

    /// Keep visible posts in their given order, stamping each with its
    /// comment count.
    pub fn filter_visible<I>(&self, posts: I, comment_counts: &HashMap<ObjectId, u64>) -> Vec<PostView>
    where
        I: IntoIterator<Item = PostView>,
    {
        posts
            .into_iter()
            .filter(|view| self.is_visible(view))
            .map(|view| annotate(view, comment_counts))
            .collect()
    }

    /// Posts the viewer may open: everything they wrote plus whatever is
    /// visible. Used for profile listings.
    pub fn filter_viewable<I>(
        &self,
        viewer: &Viewer,
        posts: I,
        comment_counts: &HashMap<ObjectId, u64>,
    ) -> Vec<PostView>
    where
        I: IntoIterator<Item = PostView>,
    {
        posts
            .into_iter()
            .filter(|view| self.authorize(viewer, view, PostAction::View).is_allowed())
            .map(|view| annotate(view, comment_counts))
            .collect()
    }

    pub fn authorize(&self, viewer: &Viewer, view: &PostView, action: PostAction) -> Decision {
        let is_owner = viewer.is(&view.post.author_id);
        match action {
            PostAction::View if is_owner || self.is_visible(view) => Decision::Allow,
            PostAction::View => Decision::Deny(DenyReason::NotFound),
            PostAction::Edit | PostAction::Delete if is_owner => Decision::Allow,
            PostAction::Edit | PostAction::Delete => Decision::Deny(DenyReason::Forbidden),
            PostAction::Comment if viewer.is_authenticated() => Decision::Allow,
            PostAction::Comment => Decision::Deny(DenyReason::Unauthenticated),
        }
    }

    pub fn authorize_comment(&self, viewer: &Viewer, comment: &Comment, action: CommentAction) -> Decision {
        match action {
            CommentAction::Edit | CommentAction::Delete if viewer.is(&comment.author_id) => {
                Decision::Allow
            }
            CommentAction::Edit | CommentAction::Delete => Decision::Deny(DenyReason::Forbidden),
        }
    }
}

fn annotate(mut view: PostView, comment_counts: &HashMap<ObjectId, u64>) -> PostView {
    view.comment_count = comment_counts.get(&view.post.id).copied().unwrap_or(0);
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::model::Category;
    use crate::post::post_model::Post;
    use chrono::Duration;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[fixture]
    fn author() -> ObjectId {
        ObjectId::new()
    }

    fn category(is_published: bool) -> Category {
        Category {
            id: ObjectId::new(),
            title: "Travel".into(),
            description: String::new(),
            slug: "travel".into(),
            is_published,
            created_at: Utc::now(),
        }
    }

    fn post(author: ObjectId, is_published: bool, pub_date: DateTime<Utc>) -> PostView {
        PostView::new(Post {
            id: ObjectId::new(),
            title: "A walk in the park".into(),
            text: "It was sunny.".into(),
            pub_date,
            is_published,
            image: None,
            author_id: author,
            category_id: None,
            location_id: None,
            created_at: pub_date,
            updated_at: pub_date,
        })
    }

    fn hidden(author: ObjectId, now: DateTime<Utc>) -> PostView {
        post(author, false, now - Duration::days(1))
    }

    #[rstest]
    #[case(true, -1, None, true)]
    #[case(false, -1, None, false)]
    #[case(false, -1, Some(true), false)]
    #[case(true, 1, None, false)]
    #[case(true, -1, Some(false), false)]
    #[case(true, -1, Some(true), true)]
    fn visibility_rule(
        now: DateTime<Utc>,
        author: ObjectId,
        #[case] is_published: bool,
        #[case] offset_days: i64,
        #[case] category_published: Option<bool>,
        #[case] expected: bool,
    ) {
        let view = post(author, is_published, now + Duration::days(offset_days))
            .with_category(category_published.map(category));
        assert_eq!(PostAccessPolicy::at(now).is_visible(&view), expected);
    }

    #[rstest]
    fn publication_instant_is_inclusive(now: DateTime<Utc>, author: ObjectId) {
        let policy = PostAccessPolicy::at(now);
        assert!(policy.is_visible(&post(author, true, now)));
        assert!(!policy.is_visible(&post(author, true, now + Duration::nanoseconds(1))));
    }

    #[rstest]
    fn filter_of_nothing_is_nothing(now: DateTime<Utc>) {
        let visible = PostAccessPolicy::at(now).filter_visible(Vec::new(), &HashMap::new());
        assert!(visible.is_empty());
    }

    #[rstest]
    fn filter_keeps_order_and_counts_comments(now: DateTime<Utc>, author: ObjectId) {
        let policy = PostAccessPolicy::at(now);
        let first = post(author, true, now - Duration::hours(1));
        let scheduled = post(author, true, now + Duration::hours(1));
        let second = post(author, true, now - Duration::hours(3));
        let in_hidden_category =
            post(author, true, now - Duration::hours(2)).with_category(Some(category(false)));

        let mut counts = HashMap::new();
        counts.insert(first.post.id, 4);

        let visible = policy.filter_visible(
            vec![first.clone(), scheduled, in_hidden_category, second.clone()],
            &counts,
        );

        let ids: Vec<_> = visible.iter().map(|v| v.post.id).collect();
        assert_eq!(ids, vec![first.post.id, second.post.id]);
        assert_eq!(visible[0].comment_count, 4);
        assert_eq!(visible[1].comment_count, 0);
    }

    #[rstest]
    fn filter_is_idempotent(now: DateTime<Utc>, author: ObjectId) {
        let policy = PostAccessPolicy::at(now);
        let posts = vec![
            post(author, true, now - Duration::days(2)),
            hidden(author, now),
            post(author, true, now + Duration::days(2)),
        ];
        let mut counts = HashMap::new();
        counts.insert(posts[0].post.id, 2);

        let once = policy.filter_visible(posts, &counts);
        let twice = policy.filter_visible(once.clone(), &counts);
        assert_eq!(once, twice);
    }

    #[rstest]
    #[case(PostAction::Edit)]
    #[case(PostAction::Delete)]
    fn owner_may_mutate_hidden_and_scheduled_posts(
        now: DateTime<Utc>,
        author: ObjectId,
        #[case] action: PostAction,
    ) {
        let policy = PostAccessPolicy::at(now);
        let owner = Viewer::User(author);
        assert_eq!(policy.authorize(&owner, &hidden(author, now), action), Decision::Allow);
        let scheduled = post(author, true, now + Duration::days(3));
        assert_eq!(policy.authorize(&owner, &scheduled, action), Decision::Allow);
    }

    #[rstest]
    #[case(PostAction::Edit)]
    #[case(PostAction::Delete)]
    fn others_may_not_mutate_even_visible_posts(
        now: DateTime<Utc>,
        author: ObjectId,
        #[case] action: PostAction,
    ) {
        let policy = PostAccessPolicy::at(now);
        let visible = post(author, true, now - Duration::days(1));
        let forbidden = Decision::Deny(DenyReason::Forbidden);

        assert_eq!(policy.authorize(&Viewer::User(ObjectId::new()), &visible, action), forbidden);
        assert_eq!(policy.authorize(&Viewer::Anonymous, &visible, action), forbidden);
        assert_eq!(
            policy.authorize(&Viewer::User(ObjectId::new()), &hidden(author, now), action),
            forbidden
        );
    }

    #[rstest]
    fn hidden_posts_are_not_found_for_everyone_but_the_owner(now: DateTime<Utc>, author: ObjectId) {
        let policy = PostAccessPolicy::at(now);
        let view = hidden(author, now);
        let not_found = Decision::Deny(DenyReason::NotFound);

        assert_eq!(policy.authorize(&Viewer::Anonymous, &view, PostAction::View), not_found);
        assert_eq!(
            policy.authorize(&Viewer::User(ObjectId::new()), &view, PostAction::View),
            not_found
        );
        assert_eq!(policy.authorize(&Viewer::User(author), &view, PostAction::View), Decision::Allow);
    }

    #[rstest]
    fn live_post_in_live_category_is_public(now: DateTime<Utc>, author: ObjectId) {
        let policy = PostAccessPolicy::at(now);
        let view = post(author, true, now - Duration::days(1)).with_category(Some(category(true)));

        assert_eq!(policy.authorize(&Viewer::Anonymous, &view, PostAction::View), Decision::Allow);
        assert_eq!(policy.filter_visible(vec![view], &HashMap::new()).len(), 1);
    }

    #[rstest]
    fn scheduled_post_is_only_visible_to_its_author(now: DateTime<Utc>, author: ObjectId) {
        let policy = PostAccessPolicy::at(now);
        let view = post(author, true, now + Duration::days(1));

        assert_eq!(
            policy.authorize(&Viewer::Anonymous, &view, PostAction::View),
            Decision::Deny(DenyReason::NotFound)
        );
        assert_eq!(policy.authorize(&Viewer::User(author), &view, PostAction::View), Decision::Allow);
    }

    #[rstest]
    fn commenting_needs_a_login_only(now: DateTime<Utc>, author: ObjectId) {
        let policy = PostAccessPolicy::at(now);
        let view = post(author, true, now - Duration::days(1));

        assert_eq!(
            policy.authorize(&Viewer::User(ObjectId::new()), &view, PostAction::Comment),
            Decision::Allow
        );
        assert_eq!(
            policy.authorize(&Viewer::Anonymous, &view, PostAction::Comment),
            Decision::Deny(DenyReason::Unauthenticated)
        );
    }

    #[rstest]
    #[case(CommentAction::Edit)]
    #[case(CommentAction::Delete)]
    fn only_comment_author_may_change_it(now: DateTime<Utc>, #[case] action: CommentAction) {
        let policy = PostAccessPolicy::at(now);
        let u1 = ObjectId::new();
        let u2 = ObjectId::new();
        let comment = Comment {
            id: ObjectId::new(),
            post_id: ObjectId::new(),
            author_id: u1,
            text: "Nice photo".into(),
            created_at: now,
            updated_at: now,
        };

        assert_eq!(
            policy.authorize_comment(&Viewer::User(u2), &comment, action),
            Decision::Deny(DenyReason::Forbidden)
        );
        assert_eq!(policy.authorize_comment(&Viewer::User(u1), &comment, action), Decision::Allow);
        assert_eq!(
            policy.authorize_comment(&Viewer::Anonymous, &comment, action),
            Decision::Deny(DenyReason::Forbidden)
        );
    }

    #[rstest]
    fn profile_listing_shows_owner_everything(now: DateTime<Utc>, author: ObjectId) {
        let policy = PostAccessPolicy::at(now);
        let posts = vec![
            post(author, true, now - Duration::days(1)),
            hidden(author, now),
            post(author, true, now + Duration::days(1)),
        ];

        let own = policy.filter_viewable(&Viewer::User(author), posts.clone(), &HashMap::new());
        assert_eq!(own.len(), 3);

        let public = policy.filter_viewable(&Viewer::Anonymous, posts, &HashMap::new());
        assert_eq!(public.len(), 1);
    }
}
