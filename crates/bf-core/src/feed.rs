//! # Feed Assembly
//!
//! Merges per-author post logs into one reverse-chronological page.
//!
//! Order is total: ordering key descending, then author identity ascending,
//! then post id descending. Both merge strategies below share that order and
//! therefore return identical pages for identical input.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::models::Post;

/// `Greater` means `a` is shown before `b`.
pub fn compare_recency(a: &Post, b: &Post) -> Ordering {
    a.key
        .cmp(&b.key)
        .then_with(|| b.author.cmp(&a.author))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorts a slice so the first element is the one shown first.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| compare_recency(b, a));
}

struct Ranked(Post);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_recency(&self.0, &other.0)
    }
}

/// Pushes every post into one heap and pops the `limit` most recent.
///
/// Input sequences may be in any order.
pub fn merge_naive(sequences: Vec<Vec<Post>>, limit: usize) -> Vec<Post> {
    if limit == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Ranked> = sequences.into_iter().flatten().map(Ranked).collect();
    let mut page = Vec::with_capacity(limit.min(heap.len()));
    while page.len() < limit {
        match heap.pop() {
            Some(Ranked(post)) => page.push(post),
            None => break,
        }
    }
    page
}

/// Current candidate of one author's log.
struct Head {
    post: Post,
    source: usize,
}

impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Head {}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Head {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_recency(&self.post, &other.post).then_with(|| other.source.cmp(&self.source))
    }
}

/// Bounded k-way merge holding one candidate per author.
///
/// Every sequence must already be newest first (see [`sort_newest_first`]).
/// The heap never grows beyond the number of sequences.
pub fn merge_streaming(sequences: Vec<Vec<Post>>, limit: usize) -> Vec<Post> {
    if limit == 0 {
        return Vec::new();
    }

    let mut logs: Vec<std::vec::IntoIter<Post>> =
        sequences.into_iter().map(Vec::into_iter).collect();
    let mut heap = BinaryHeap::with_capacity(logs.len());
    for (source, log) in logs.iter_mut().enumerate() {
        if let Some(post) = log.next() {
            heap.push(Head { post, source });
        }
    }

    let mut page = Vec::with_capacity(limit.min(16));
    while page.len() < limit {
        let Some(Head { post, source }) = heap.pop() else {
            break;
        };
        if let Some(next) = logs[source].next() {
            debug_assert!(compare_recency(&post, &next) != Ordering::Less);
            heap.push(Head { post: next, source });
        }
        page.push(post);
    }
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderingKey;
    use chrono::Utc;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn post(author: &str, key: u64, id: u128) -> Post {
        Post {
            id: Uuid::from_u128(id),
            author: author.to_string(),
            content: format!("{author}-{key}"),
            key: OrderingKey(key),
            created_at: Utc::now(),
        }
    }

    fn contents(page: &[Post]) -> Vec<&str> {
        page.iter().map(|p| p.content.as_str()).collect()
    }

    #[test]
    fn interleaves_authors_by_key() {
        let bob = vec![post("bob", 3, 3), post("bob", 1, 1)];
        let alice = vec![post("alice", 4, 4), post("alice", 2, 2)];

        let page = merge_streaming(vec![bob, alice], 10);
        assert_eq!(contents(&page), ["alice-4", "bob-3", "alice-2", "bob-1"]);
    }

    #[test]
    fn stops_at_limit() {
        let log: Vec<Post> = (1..=5).rev().map(|k| post("a", k, k as u128)).collect();
        assert_eq!(merge_streaming(vec![log.clone()], 2).len(), 2);
        assert_eq!(merge_naive(vec![log], 2).len(), 2);
    }

    #[test]
    fn zero_limit_is_empty() {
        let log = vec![post("a", 1, 1)];
        assert!(merge_streaming(vec![log.clone()], 0).is_empty());
        assert!(merge_naive(vec![log], 0).is_empty());
    }

    #[test]
    fn no_sequences_is_empty() {
        assert!(merge_streaming(Vec::new(), 10).is_empty());
        assert!(merge_streaming(vec![Vec::new(), Vec::new()], 10).is_empty());
    }

    #[test]
    fn equal_keys_break_ties_by_author_then_id() {
        let page = merge_naive(
            vec![
                vec![post("carol", 7, 1)],
                vec![post("alice", 7, 1), post("alice", 7, 9)],
                vec![post("bob", 7, 5)],
            ],
            10,
        );
        let order: Vec<(&str, u128)> = page.iter().map(|p| (p.author.as_str(), p.id.as_u128())).collect();
        assert_eq!(order, [("alice", 9), ("alice", 1), ("bob", 5), ("carol", 1)]);
    }

    #[test]
    fn naive_accepts_unsorted_logs() {
        let log = vec![post("a", 1, 1), post("a", 3, 3), post("a", 2, 2)];
        assert_eq!(contents(&merge_naive(vec![log], 3)), ["a-3", "a-2", "a-1"]);
    }

    fn arb_posts() -> impl Strategy<Value = Vec<(usize, u64, u128)>> {
        prop::collection::vec((0usize..5, 0u64..24, any::<u128>()), 0..60)
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

        #[test]
        fn streaming_matches_naive_and_full_sort(raw in arb_posts(), limit in 0usize..70) {
            let authors = ["ann", "ben", "cat", "dan", "eve"];
            let mut logs: Vec<Vec<Post>> = vec![Vec::new(); authors.len()];
            for (author, key, id) in raw {
                logs[author].push(post(authors[author], key, id));
            }

            let mut baseline: Vec<Post> = logs.iter().flatten().cloned().collect();
            sort_newest_first(&mut baseline);
            baseline.truncate(limit);

            let naive = merge_naive(logs.clone(), limit);

            let mut sorted_logs = logs;
            for log in &mut sorted_logs {
                sort_newest_first(log);
            }
            let streaming = merge_streaming(sorted_logs, limit);

            prop_assert_eq!(&naive, &baseline);
            prop_assert_eq!(&streaming, &baseline);
            prop_assert!(streaming.len() <= limit);
            for pair in streaming.windows(2) {
                prop_assert!(compare_recency(&pair[0], &pair[1]) != Ordering::Less);
            }
        }
    }
}
