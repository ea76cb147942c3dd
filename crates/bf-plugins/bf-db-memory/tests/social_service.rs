use std::sync::Arc;

use bf_auth_simple::{Params, SimpleAuthProvider};
use bf_core::{
    AccountRepo, AppError, AtomicClock, ClockScope, FollowRequest, LoginRequest, OrderingClock,
    SignupRequest, SocialService, TweetRequest,
};
use bf_db_memory::MemoryAccountRepo;

struct Harness {
    repo: Arc<MemoryAccountRepo>,
    clock: Arc<AtomicClock>,
    svc: SocialService,
}

fn harness(scope: ClockScope) -> Harness {
    let repo = Arc::new(MemoryAccountRepo::new());
    let clock = Arc::new(AtomicClock::new());
    let auth = Arc::new(
        SimpleAuthProvider::new("scenario-secret", 3600)
            .with_params(Params::new(1024, 1, 1, None).unwrap()),
    );
    let svc = SocialService::new(repo.clone(), clock.clone(), auth, scope);
    Harness { repo, clock, svc }
}

async fn signup(svc: &SocialService, name: &str) {
    svc.signup(SignupRequest {
        username: name.into(),
        email: format!("{name}@example.com"),
        password: "password123".into(),
    })
    .await
    .unwrap();
}

async fn tweet(svc: &SocialService, author: &str, content: &str) {
    svc.post(author, TweetRequest { content: content.into() })
        .await
        .unwrap();
}

fn follow(target: &str) -> FollowRequest {
    FollowRequest { target: target.into() }
}

async fn feed_contents(svc: &SocialService, who: &str, limit: usize) -> Vec<String> {
    svc.feed(who, limit)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.content)
        .collect()
}

async fn assert_symmetric(repo: &MemoryAccountRepo, a: &str, b: &str) {
    let a_acc = repo.get_account(a).await.unwrap().unwrap();
    let b_acc = repo.get_account(b).await.unwrap().unwrap();
    assert_eq!(b_acc.followers.contains(a), a_acc.following.contains(b));
    assert_eq!(a_acc.followers.contains(b), b_acc.following.contains(a));
}

#[tokio::test]
async fn alice_sees_own_post_then_bobs_in_reverse_order() {
    let h = harness(ClockScope::Posts);
    signup(&h.svc, "alice").await;
    signup(&h.svc, "bob").await;
    h.svc.follow("alice", follow("bob")).await.unwrap();

    tweet(&h.svc, "bob", "hello").await;
    tweet(&h.svc, "bob", "world").await;
    tweet(&h.svc, "alice", "hi").await;

    assert_eq!(feed_contents(&h.svc, "alice", 10).await, ["hi", "world", "hello"]);
    // bob does not follow alice
    assert_eq!(feed_contents(&h.svc, "bob", 10).await, ["world", "hello"]);
}

#[tokio::test]
async fn self_inclusion_with_empty_following() {
    let h = harness(ClockScope::Posts);
    signup(&h.svc, "carol").await;
    for i in 0..5 {
        tweet(&h.svc, "carol", &format!("c{i}")).await;
    }

    assert_eq!(feed_contents(&h.svc, "carol", 3).await, ["c4", "c3", "c2"]);
}

#[tokio::test]
async fn limit_zero_and_unknown_requester() {
    let h = harness(ClockScope::Posts);
    signup(&h.svc, "alice").await;
    tweet(&h.svc, "alice", "hi").await;

    assert!(h.svc.feed("alice", 0).await.unwrap().is_empty());
    assert!(matches!(
        h.svc.feed("nobody", 10).await,
        Err(AppError::NotFound(_, _))
    ));
}

#[tokio::test]
async fn no_visible_posts_is_empty_success() {
    let h = harness(ClockScope::Posts);
    signup(&h.svc, "alice").await;
    signup(&h.svc, "bob").await;
    h.svc.follow("alice", follow("bob")).await.unwrap();

    assert!(h.svc.feed("alice", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn double_follow_conflicts_and_leaves_state() {
    let h = harness(ClockScope::Posts);
    signup(&h.svc, "alice").await;
    signup(&h.svc, "bob").await;

    h.svc.follow("alice", follow("bob")).await.unwrap();
    let before = h.repo.get_account("alice").await.unwrap().unwrap();
    let err = h.svc.follow("alice", follow("bob")).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let after = h.repo.get_account("alice").await.unwrap().unwrap();
    assert_eq!(before.following, after.following);
    assert_symmetric(&h.repo, "alice", "bob").await;
}

#[tokio::test]
async fn unfollow_without_edge_is_invalid_state() {
    let h = harness(ClockScope::Posts);
    signup(&h.svc, "alice").await;
    signup(&h.svc, "bob").await;

    let err = h.svc.unfollow("alice", follow("bob")).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    let alice = h.repo.get_account("alice").await.unwrap().unwrap();
    assert!(alice.following.is_empty());
    assert_symmetric(&h.repo, "alice", "bob").await;
}

#[tokio::test]
async fn follow_then_unfollow_keeps_both_sides_in_step() {
    let h = harness(ClockScope::Posts);
    signup(&h.svc, "alice").await;
    signup(&h.svc, "bob").await;

    h.svc.follow("alice", follow("bob")).await.unwrap();
    assert!(h.repo.get_account("bob").await.unwrap().unwrap().followers.contains("alice"));
    assert_symmetric(&h.repo, "alice", "bob").await;

    h.svc.unfollow("alice", follow("bob")).await.unwrap();
    assert!(h.repo.get_account("bob").await.unwrap().unwrap().followers.is_empty());
    assert_symmetric(&h.repo, "alice", "bob").await;
}

#[tokio::test]
async fn unfollow_cleans_up_half_edge() {
    let h = harness(ClockScope::Posts);
    signup(&h.svc, "alice").await;
    signup(&h.svc, "bob").await;
    // Only the followers side was ever written.
    h.repo.add_follower("bob", "alice").await.unwrap();

    let err = h.svc.unfollow("alice", follow("bob")).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    assert_symmetric(&h.repo, "alice", "bob").await;
}

#[tokio::test]
async fn follow_rules() {
    let h = harness(ClockScope::Posts);
    signup(&h.svc, "alice").await;

    assert!(matches!(
        h.svc.follow("alice", follow("alice")).await,
        Err(AppError::ValidationError(_))
    ));
    assert!(matches!(
        h.svc.follow("alice", follow("ghost")).await,
        Err(AppError::NotFound(_, _))
    ));
}

#[tokio::test]
async fn unfollowed_author_drops_out_of_feed() {
    let h = harness(ClockScope::Posts);
    signup(&h.svc, "alice").await;
    signup(&h.svc, "bob").await;
    h.svc.follow("alice", follow("bob")).await.unwrap();
    tweet(&h.svc, "bob", "hello").await;
    assert_eq!(feed_contents(&h.svc, "alice", 10).await, ["hello"]);

    h.svc.unfollow("alice", follow("bob")).await.unwrap();
    assert!(feed_contents(&h.svc, "alice", 10).await.is_empty());
}

#[tokio::test]
async fn posts_scope_only_ticks_on_post() {
    let h = harness(ClockScope::Posts);
    signup(&h.svc, "alice").await;
    signup(&h.svc, "bob").await;
    h.svc.follow("alice", follow("bob")).await.unwrap();
    assert_eq!(h.clock.current().value(), 0);

    tweet(&h.svc, "alice", "hi").await;
    assert_eq!(h.clock.current().value(), 1);
}

#[tokio::test]
async fn all_mutations_scope_ticks_once_per_operation() {
    let h = harness(ClockScope::AllMutations);
    signup(&h.svc, "alice").await; // 1
    signup(&h.svc, "bob").await; // 2
    h.svc
        .login(LoginRequest {
            email: "alice@example.com".into(),
            password: "password123".into(),
        })
        .await
        .unwrap(); // 3
    h.svc.follow("alice", follow("bob")).await.unwrap(); // 4
    tweet(&h.svc, "bob", "hello").await; // 5
    h.svc.unfollow("alice", follow("bob")).await.unwrap(); // 6

    assert_eq!(h.clock.current().value(), 6);
}

#[tokio::test]
async fn keys_follow_submission_order_across_authors() {
    let h = harness(ClockScope::AllMutations);
    signup(&h.svc, "alice").await;
    signup(&h.svc, "bob").await;

    let first = h.svc.post("bob", TweetRequest { content: "a".into() }).await.unwrap();
    // an unrelated mutation between posts only perturbs the gap
    signup(&h.svc, "carol").await;
    let second = h.svc.post("alice", TweetRequest { content: "b".into() }).await.unwrap();
    assert!(first.key < second.key);
}

#[tokio::test]
async fn signup_conflicts_and_login_round_trip() {
    let h = harness(ClockScope::Posts);
    signup(&h.svc, "alice").await;

    let dup = h
        .svc
        .signup(SignupRequest {
            username: "alice".into(),
            email: "other@example.com".into(),
            password: "password123".into(),
        })
        .await;
    assert!(matches!(dup, Err(AppError::Conflict(_))));

    let token = h
        .svc
        .login(LoginRequest {
            email: "alice@example.com".into(),
            password: "password123".into(),
        })
        .await
        .unwrap();
    assert_eq!(h.svc.authenticate(&token).unwrap(), "alice");

    let bad = h
        .svc
        .login(LoginRequest {
            email: "alice@example.com".into(),
            password: "wrong-password".into(),
        })
        .await;
    assert!(matches!(bad, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn signup_validation() {
    let h = harness(ClockScope::Posts);
    let short_pw = h
        .svc
        .signup(SignupRequest {
            username: "dave".into(),
            email: "dave@example.com".into(),
            password: "short".into(),
        })
        .await;
    assert!(matches!(short_pw, Err(AppError::ValidationError(_))));

    let bad_email = h
        .svc
        .signup(SignupRequest {
            username: "dave".into(),
            email: "not-an-email".into(),
            password: "password123".into(),
        })
        .await;
    assert!(matches!(bad_email, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn profile_and_search() {
    let h = harness(ClockScope::Posts);
    for name in ["alice", "albert", "bob"] {
        signup(&h.svc, name).await;
    }
    h.svc.follow("alice", follow("bob")).await.unwrap();
    tweet(&h.svc, "alice", "hi").await;

    let profile = h.svc.profile("alice").await.unwrap();
    assert_eq!(profile.following, ["bob"]);
    assert!(profile.followers.is_empty());
    assert_eq!(profile.post_count, 1);

    assert_eq!(h.svc.search("al").await.unwrap(), ["albert", "alice"]);
    assert!(h.svc.search("").await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_posts_still_yield_ordered_feed() {
    let h = harness(ClockScope::Posts);
    let authors = ["a1", "a2", "a3", "a4"];
    signup(&h.svc, "reader").await;
    for author in authors {
        signup(&h.svc, author).await;
        h.svc.follow("reader", follow(author)).await.unwrap();
    }

    let mut tasks = Vec::new();
    for author in authors {
        let svc = h.svc.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..25 {
                svc.post(author, TweetRequest { content: format!("{author}-{i}") })
                    .await
                    .unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let page = h.svc.feed("reader", 40).await.unwrap();
    assert_eq!(page.len(), 40);

    // Ordering keys are hidden from views; fetch them back through the repo.
    let mut all = Vec::new();
    for author in authors {
        all.extend(h.repo.recent_posts(author, 100).await.unwrap());
    }
    bf_core::feed::sort_newest_first(&mut all);
    let expected: Vec<_> = all.iter().take(40).map(|p| p.id).collect();
    let got: Vec<_> = page.iter().map(|p| p.id).collect();
    assert_eq!(got, expected);
    assert_eq!(h.clock.next_key().await.unwrap().value(), 101);
}
