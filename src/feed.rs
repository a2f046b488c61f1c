//! Derived views over post collections.
//!
//! Pure functions: no store access, no mutation. The stored comment and
//! post ordering is never written back by any of these.

use crate::records::PostRecord;

/// The post with the highest like count. Ties go to the earliest post in
/// the input (stable), matching the feed's creation ordering.
pub fn most_engaged(posts: &[PostRecord]) -> Option<&PostRecord> {
    let mut best: Option<&PostRecord> = None;
    for post in posts {
        match best {
            Some(current) if post.like_count <= current.like_count => {}
            _ => best = Some(post),
        }
    }
    best
}

/// Posts visible to `viewer`: private posts are dropped unless the viewer
/// is their author. `None` is an anonymous viewer.
pub fn visible_posts<'a>(posts: &'a [PostRecord], viewer: Option<&str>) -> Vec<&'a PostRecord> {
    posts
        .iter()
        .filter(|post| !post.is_private || viewer == Some(post.author_id.as_str()))
        .collect()
}

/// Home-feed ordering: descending like count, stable within equal counts.
pub fn ranked(posts: &[PostRecord]) -> Vec<&PostRecord> {
    let mut ordered: Vec<&PostRecord> = posts.iter().collect();
    ordered.sort_by(|a, b| b.like_count.cmp(&a.like_count));
    ordered
}

/// The profile-page view: only this author's posts, in input order.
pub fn posts_by_author<'a>(posts: &'a [PostRecord], author: &str) -> Vec<&'a PostRecord> {
    posts.iter().filter(|post| post.author_id == author).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(author: &str, title: &str, likes: u32, is_private: bool) -> PostRecord {
        let mut rec = PostRecord::new(author, format!("{author}@example.test"), title, None);
        for i in 0..likes {
            rec.liked_by.insert(format!("fan{i}"));
        }
        rec.sync_like_count();
        rec.is_private = is_private;
        rec
    }

    #[test]
    fn most_engaged_prefers_the_earliest_on_ties() {
        let posts = vec![
            post("a", "one", 2, false),
            post("b", "two", 5, false),
            post("c", "three", 5, false),
        ];
        assert_eq!(most_engaged(&posts).unwrap().title, "two");
        assert!(most_engaged(&[]).is_none());
    }

    #[test]
    fn visibility_hides_private_posts_from_others() {
        let posts = vec![
            post("a", "public", 0, false),
            post("a", "secret", 0, true),
            post("b", "other", 0, false),
        ];

        let anon: Vec<&str> = visible_posts(&posts, None)
            .iter()
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(anon, vec!["public", "other"]);

        let owner: Vec<&str> = visible_posts(&posts, Some("a"))
            .iter()
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(owner, vec!["public", "secret", "other"]);
    }

    #[test]
    fn ranking_is_stable_and_leaves_input_untouched() {
        let posts = vec![
            post("a", "low", 1, false),
            post("b", "high", 9, false),
            post("c", "mid-1", 4, false),
            post("d", "mid-2", 4, false),
        ];

        let titles: Vec<&str> = ranked(&posts).iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["high", "mid-1", "mid-2", "low"]);
        // Stored order untouched.
        assert_eq!(posts[0].title, "low");
    }

    #[test]
    fn author_filter_keeps_input_order() {
        let posts = vec![
            post("a", "first", 0, false),
            post("b", "noise", 0, false),
            post("a", "second", 0, false),
        ];
        let titles: Vec<&str> = posts_by_author(&posts, "a")
            .iter()
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(titles, vec!["first", "second"]);
    }
}
