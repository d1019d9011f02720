use crate::config::ClientConfig;

impl ClientConfig {
    pub fn post_path(&self, post_id: &str) -> String {
        join(&self.posts_root, post_id)
    }

    pub fn user_posts_path(&self, uid: &str) -> String {
        join(&self.user_posts_root, uid)
    }

    pub fn user_post_path(&self, uid: &str, post_id: &str) -> String {
        join(&self.user_posts_path(uid), post_id)
    }

    pub fn user_path(&self, uid: &str) -> String {
        join(&self.users_root, uid)
    }
}

pub fn join(parent: &str, child: &str) -> String {
    let parent = parent.trim_end_matches('/');
    let child = child.trim_start_matches('/');

    if parent.is_empty() {
        child.to_owned()
    } else {
        format!("{}/{}", parent, child)
    }
}

/// Non-empty path segments, so `/posts/a` and `posts/a/` address the same record.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// True when `path` is `prefix` itself or lies underneath it.
pub fn is_within(prefix: &str, path: &str) -> bool {
    let mut path = segments(path);
    segments(prefix).all(|segment| path.next() == Some(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_paths() {
        let config = ClientConfig::default();

        assert_eq!(config.post_path("-Na1"), "posts/-Na1");
        assert_eq!(config.user_posts_path("u1"), "user-posts/u1");
        assert_eq!(config.user_post_path("u1", "-Na1"), "user-posts/u1/-Na1");
        assert_eq!(config.user_path("u1"), "users/u1");
    }

    #[test]
    fn segments_ignore_stray_slashes() {
        assert_eq!(segments("/posts//a/").collect::<Vec<_>>(), vec!["posts", "a"]);
        assert_eq!(segments("/").count(), 0);
        assert_eq!(join("", "posts"), "posts");
        assert_eq!(join("posts/", "/a"), "posts/a");
    }

    #[test]
    fn within_matches_whole_segments() {
        assert!(is_within("posts", "posts"));
        assert!(is_within("posts", "/posts/a/title"));
        assert!(is_within("", "users/u1"));
        assert!(!is_within("posts", "user-posts/u1"));
        assert!(!is_within("post", "posts/a"));
        assert!(!is_within("posts/a", "posts"));
    }
}
