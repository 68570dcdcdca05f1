//! The shared post/category aggregate built during phase 1 of the pipeline.
//! All phase-1 workers mutate it concurrently through [`Store::add_post`];
//! once the phase barrier releases, it only ever gets read.

use crate::post::Post;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// The aggregate of parsed posts: the full post list plus the category
/// index. A single lock guards both collections, so an update is atomic
/// across the two and no reader can observe a post present in one but
/// missing from the other.
#[derive(Default)]
pub struct Store {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    posts: Vec<Post>,
    categories: HashMap<String, Vec<Post>>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Store {
        Store::default()
    }

    /// Appends `post` to the global list and to the list of every category
    /// it declares. Safe to call concurrently from any worker; posts are
    /// write-once and there is no removal or update operation.
    pub fn add_post(&self, post: Post) {
        let mut inner = self.lock();
        for category in &post.categories {
            inner
                .categories
                .entry(category.clone())
                .or_default()
                .push(post.clone());
        }
        inner.posts.push(post);
    }

    /// A snapshot of every post. Posts appear in completion order, which is
    /// unspecified under concurrency; treat the result as a set.
    pub fn posts(&self) -> Vec<Post> {
        self.lock().posts.clone()
    }

    /// A snapshot of one category's posts. Unknown categories are empty.
    pub fn category(&self, name: &str) -> Vec<Post> {
        self.lock().categories.get(name).cloned().unwrap_or_default()
    }

    /// The number of posts added so far.
    pub fn len(&self) -> usize {
        self.lock().posts.len()
    }

    /// Whether the store holds no posts.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("store lock poisoned")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn post(name: &str, categories: &[&str]) -> Post {
        Post {
            name: name.to_owned(),
            body: String::new(),
            categories: categories.iter().map(|c| (*c).to_owned()).collect(),
        }
    }

    #[test]
    fn test_add_post_updates_both_collections() {
        let store = Store::new();
        store.add_post(post("p1", &["a"]));
        store.add_post(post("p2", &[]));
        assert_eq!(store.len(), 2);
        assert_eq!(store.category("a").len(), 1);
        assert_eq!(store.category("a")[0].name, "p1");
        assert!(store.category("missing").is_empty());
    }

    #[test]
    fn test_concurrent_adds_lose_nothing() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 50;

        let store = Arc::new(Store::new());
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    let category = format!("cat-{}", t);
                    for i in 0..PER_THREAD {
                        store.add_post(post(&format!("post-{}-{}", t, i), &[&category]));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), THREADS * PER_THREAD);
        for t in 0..THREADS {
            assert_eq!(store.category(&format!("cat-{}", t)).len(), PER_THREAD);
        }
    }
}
