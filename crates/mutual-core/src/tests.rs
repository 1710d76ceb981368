//! Engine-level tests against [`MemoryStore`].

use std::sync::Arc;

use futures::TryStreamExt as _;
use uuid::Uuid;

use crate::{
  Error,
  actor::{Actor, NewActor, Role},
  analytics::Analytics,
  engine::{ChannelNotifier, MatchEngine, MatchOutcome},
  machine::PairState,
  memory::MemoryStore,
  record::{MatchStatus, PairKey},
  second_look::SecondLook,
  store::{Directory, SwipeStore},
  swipe::Decision::{self, Interested, NotInterested},
};

struct Fixture {
  store:  Arc<MemoryStore>,
  engine: MatchEngine<MemoryStore>,
}

fn fixture() -> Fixture {
  let store = Arc::new(MemoryStore::new());
  let engine = MatchEngine::new(store.clone());
  Fixture { store, engine }
}

impl Fixture {
  async fn actor(&self, role: Role, name: &str) -> Actor {
    self.store.register_actor(NewActor::new(role, name)).await.unwrap()
  }

  async fn seeker(&self) -> Actor { self.actor(Role::Jobseeker, "seeker").await }

  async fn employer(&self) -> Actor { self.actor(Role::Employer, "employer").await }

  async fn swipe(&self, from: &Actor, to: &Actor, decision: Decision) -> MatchOutcome {
    self
      .engine
      .submit_swipe(from.actor_id, to.actor_id, decision)
      .await
      .unwrap()
  }
}

// ─── Submit ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn mutual_interest_matches_in_either_order() {
  for seeker_first in [true, false] {
    let f = fixture();
    let (s, e) = (f.seeker().await, f.employer().await);

    let (first, second) = if seeker_first { (&s, &e) } else { (&e, &s) };
    let a = f.swipe(first, second, Interested).await;
    assert_eq!(a.status, MatchStatus::Pending);
    assert!(a.changed);

    let b = f.swipe(second, first, Interested).await;
    assert_eq!(b.status, MatchStatus::Matched);
    assert!(b.changed);
    assert_eq!(b.record.pair, PairKey::new(s.actor_id, e.actor_id));
  }
}

#[tokio::test]
async fn repeated_swipe_changes_only_once() {
  let f = fixture();
  let (s, e) = (f.seeker().await, f.employer().await);

  let outcomes = [
    f.swipe(&s, &e, NotInterested).await,
    f.swipe(&s, &e, NotInterested).await,
    f.swipe(&s, &e, NotInterested).await,
  ];

  assert!(outcomes[0].changed);
  assert!(outcomes.iter().skip(1).all(|o| !o.changed));
  assert!(outcomes.iter().all(|o| o.status == MatchStatus::Rejected));
  // Re-submission refreshes the intent without touching the record.
  assert_eq!(outcomes[2].intent.revision, 3);
  assert!(outcomes[2].intent.swiped_at >= outcomes[0].intent.swiped_at);
  assert_eq!(outcomes[2].record.version, 1);
}

#[tokio::test]
async fn matched_is_sticky() {
  let f = fixture();
  let (s, e) = (f.seeker().await, f.employer().await);
  f.swipe(&s, &e, Interested).await;
  f.swipe(&e, &s, Interested).await;

  let later = f.swipe(&e, &s, NotInterested).await;
  assert_eq!(later.status, MatchStatus::Matched);
  assert!(!later.changed);
  assert_eq!(later.intent.decision, NotInterested);

  let later = f.swipe(&s, &e, NotInterested).await;
  assert_eq!(later.status, MatchStatus::Matched);

  // The negative intents are still recorded.
  let intent = f.store.get_intent(s.actor_id, e.actor_id).await.unwrap().unwrap();
  assert_eq!(intent.decision, NotInterested);
}

#[tokio::test]
async fn same_role_swipe_is_rejected() {
  let f = fixture();
  let (a, b) = (f.seeker().await, f.seeker().await);
  let err = f
    .engine
    .submit_swipe(a.actor_id, b.actor_id, Interested)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidActorTarget { .. }));
  assert!(f.store.get_intent(a.actor_id, b.actor_id).await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_ids_are_reported_per_side() {
  let f = fixture();
  let s = f.seeker().await;
  let ghost = Uuid::new_v4();

  let err = f.engine.submit_swipe(ghost, s.actor_id, Interested).await.unwrap_err();
  assert!(matches!(err, Error::UnknownActor(id) if id == ghost));

  let err = f.engine.submit_swipe(s.actor_id, ghost, Interested).await.unwrap_err();
  assert!(matches!(err, Error::UnknownTarget(id) if id == ghost));
}

#[tokio::test]
async fn counterpart_lookup_is_symmetric() {
  let f = fixture();
  let (s, e) = (f.seeker().await, f.employer().await);
  f.swipe(&e, &s, NotInterested).await;

  let seen_from_seeker = f
    .store
    .get_counterpart_intent(e.actor_id, s.actor_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(seen_from_seeker.actor_id, e.actor_id);
  assert_eq!(seen_from_seeker.decision, NotInterested);
  assert!(f.store.get_counterpart_intent(s.actor_id, e.actor_id).await.unwrap().is_none());
}

#[tokio::test]
async fn notifier_fires_once_per_match() {
  let store = Arc::new(MemoryStore::new());
  let (notifier, mut rx) = ChannelNotifier::new();
  let engine = MatchEngine::new(store.clone()).with_notifier(Arc::new(notifier));
  let f = Fixture { store, engine };
  let (s, e) = (f.seeker().await, f.employer().await);

  f.swipe(&s, &e, Interested).await;
  assert!(rx.try_recv().is_err());

  f.swipe(&e, &s, Interested).await;
  f.swipe(&e, &s, Interested).await;
  f.swipe(&s, &e, NotInterested).await;

  let record = rx.try_recv().unwrap();
  assert_eq!(record.pair, PairKey::new(s.actor_id, e.actor_id));
  assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn record_always_matches_derivation() {
  let f = fixture();
  let (s, e) = (f.seeker().await, f.employer().await);
  let script = [
    (true, NotInterested),
    (false, Interested),
    (true, Interested),
    (false, NotInterested),
  ];
  let mut matched = false;
  for (from_seeker, decision) in script {
    let outcome = if from_seeker {
      f.swipe(&s, &e, decision).await
    } else {
      f.swipe(&e, &s, decision).await
    };
    let a = f.store.get_intent(s.actor_id, e.actor_id).await.unwrap().map(|i| i.decision);
    let b = f.store.get_intent(e.actor_id, s.actor_id).await.unwrap().map(|i| i.decision);
    matched |= PairState::derive(a, b) == PairState::Matched;
    let expected = if matched { PairState::Matched } else { PairState::derive(a, b) };
    assert_eq!(PairState::from(outcome.status), expected);
  }
  assert!(matched);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_swipes_converge_without_lost_updates() {
  let f = fixture();
  let (s, e) = (f.seeker().await, f.employer().await);
  let (sid, eid) = (s.actor_id, e.actor_id);

  let handles: Vec<_> = (0..100)
    .map(|i| {
      let engine = f.engine.clone();
      let decision = if i % 2 == 0 { Interested } else { NotInterested };
      tokio::spawn(async move { engine.submit_swipe(sid, eid, decision).await.unwrap() })
    })
    .collect();

  let mut outcomes = Vec::new();
  for h in handles {
    outcomes.push(h.await.unwrap());
  }

  let mut revisions: Vec<u64> = outcomes.iter().map(|o| o.intent.revision).collect();
  revisions.sort_unstable();
  assert_eq!(revisions, (1..=100).collect::<Vec<_>>());

  let last = outcomes.iter().max_by_key(|o| o.intent.revision).unwrap();
  let stored = f.store.get_intent(s.actor_id, e.actor_id).await.unwrap().unwrap();
  assert_eq!(stored.revision, 100);
  assert_eq!(stored.decision, last.intent.decision);

  let record = f.store.get_match(PairKey::new(s.actor_id, e.actor_id)).await.unwrap().unwrap();
  assert_eq!(
    PairState::from(record.status),
    PairState::derive(Some(stored.decision), None)
  );
  assert_eq!(f.store.swipe_history(s.actor_id, e.actor_id).await.unwrap().len(), 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mutual_interest_always_matches() {
  for _ in 0..20 {
    let f = fixture();
    let (sid, eid) = (f.seeker().await.actor_id, f.employer().await.actor_id);
    let (a, b) = (f.engine.clone(), f.engine.clone());
    let (x, y) = tokio::join!(
      tokio::spawn(async move { a.submit_swipe(sid, eid, Interested).await }),
      tokio::spawn(async move { b.submit_swipe(eid, sid, Interested).await }),
    );
    let (x, y) = (x.unwrap().unwrap(), y.unwrap().unwrap());
    assert!(x.changed && y.changed);
    assert_eq!(
      [x.status, y.status].iter().filter(|s| **s == MatchStatus::Matched).count(),
      1
    );
    assert_eq!(x.is_new_match() as u8 + y.is_new_match() as u8, 1);
  }
}

// ─── Second look ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_look_lists_only_open_rejections() {
  let f = fixture();
  let second_look = SecondLook::new(f.engine.clone()).with_page_size(2);
  let s = f.seeker().await;
  let mut employers = Vec::new();
  for _ in 0..5 {
    employers.push(f.employer().await);
  }

  // 0: rejected, counterpart silent
  f.swipe(&s, &employers[0], NotInterested).await;
  // 1: rejected, counterpart interested
  f.swipe(&employers[1], &s, Interested).await;
  f.swipe(&s, &employers[1], NotInterested).await;
  // 2: interested, not a candidate
  f.swipe(&s, &employers[2], Interested).await;
  // 3: matched, then rejected; sticky, not a candidate
  f.swipe(&s, &employers[3], Interested).await;
  f.swipe(&employers[3], &s, Interested).await;
  f.swipe(&s, &employers[3], NotInterested).await;
  // 4: rejected by both
  f.swipe(&employers[4], &s, NotInterested).await;
  f.swipe(&s, &employers[4], NotInterested).await;

  let mut expected: Vec<Uuid> =
    [0, 1, 4].iter().map(|&i| employers[i].actor_id).collect();
  expected.sort();

  let listed: Vec<Uuid> = second_look
    .list_reconsiderable(s.actor_id)
    .map_ok(|c| c.target_id)
    .try_collect()
    .await
    .unwrap();
  assert_eq!(listed, expected);

  // Restartable: a second scan yields the same sequence.
  let again = second_look.candidates(s.actor_id).await.unwrap();
  assert_eq!(again.iter().map(|c| c.target_id).collect::<Vec<_>>(), expected);

  let from_one = again.iter().find(|c| c.target_id == employers[1].actor_id).unwrap();
  assert_eq!(from_one.counterpart_decision, Some(Interested));
  assert_eq!(from_one.status, MatchStatus::Rejected);

  // The employers' own lists only hold their own rejections.
  let employer_view = second_look.candidates(employers[4].actor_id).await.unwrap();
  assert_eq!(employer_view.len(), 1);
  assert_eq!(employer_view[0].target_id, s.actor_id);
  assert!(second_look.candidates(employers[1].actor_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn revising_a_rejection_can_match() {
  let f = fixture();
  let second_look = SecondLook::new(f.engine.clone());
  let (s, e) = (f.seeker().await, f.employer().await);

  f.swipe(&s, &e, Interested).await;
  f.swipe(&e, &s, NotInterested).await;

  let outcome = second_look.revise_swipe(e.actor_id, s.actor_id).await.unwrap();
  assert_eq!(outcome.status, MatchStatus::Matched);
  assert!(outcome.changed);
  assert!(second_look.candidates(e.actor_id).await.unwrap().is_empty());

  // Revising again is a no-op.
  let again = second_look.revise_swipe(e.actor_id, s.actor_id).await.unwrap();
  assert_eq!(again.status, MatchStatus::Matched);
  assert!(!again.changed);
}

#[tokio::test]
async fn revising_toward_a_silent_counterpart_reopens_as_pending() {
  let f = fixture();
  let second_look = SecondLook::new(f.engine.clone());
  let (s, e) = (f.seeker().await, f.employer().await);

  f.swipe(&s, &e, NotInterested).await;
  let outcome = second_look.revise_swipe(s.actor_id, e.actor_id).await.unwrap();
  assert_eq!(outcome.status, MatchStatus::Pending);
  assert!(outcome.changed);
}

#[tokio::test]
async fn revising_outside_the_precondition_fails() {
  let f = fixture();
  let second_look = SecondLook::new(f.engine.clone());
  let (s, e) = (f.seeker().await, f.employer().await);

  // Never swiped.
  let err = second_look.revise_swipe(s.actor_id, e.actor_id).await.unwrap_err();
  assert!(matches!(err, Error::NotReconsiderable { .. }));

  // Already interested, not matched.
  f.swipe(&s, &e, Interested).await;
  let err = second_look.revise_swipe(s.actor_id, e.actor_id).await.unwrap_err();
  assert!(matches!(err, Error::NotReconsiderable { .. }));
}

// ─── Analytics ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn employer_stats_counts_inbound_swipes() {
  let f = fixture();
  let analytics = Analytics::new(f.store.clone());
  let e = f.employer().await;
  let mut seekers = Vec::new();
  for _ in 0..4 {
    seekers.push(f.seeker().await);
  }

  for s in &seekers[..3] {
    f.swipe(s, &e, Interested).await;
  }
  f.swipe(&seekers[3], &e, NotInterested).await;
  // The employer answers one of the three interested seekers.
  f.swipe(&e, &seekers[0], Interested).await;

  let stats = analytics.employer_stats(e.actor_id).await.unwrap();
  assert_eq!(stats.interested_count, 3);
  assert_eq!(stats.not_interested_count, 1);
  assert_eq!(stats.pending_count, 2);
  assert_eq!(stats.ratio, 3.0);
}

#[tokio::test]
async fn ratio_is_finite_without_rejections() {
  let f = fixture();
  let analytics = Analytics::new(f.store.clone());
  let e = f.employer().await;

  let empty = analytics.employer_stats(e.actor_id).await.unwrap();
  assert_eq!(empty.ratio, 0.0);

  let s = f.seeker().await;
  f.swipe(&s, &e, Interested).await;
  let stats = analytics.employer_stats(e.actor_id).await.unwrap();
  assert!(stats.ratio.is_finite());
  assert_eq!(stats.ratio, 1.0);
}

#[tokio::test]
async fn stats_require_the_right_role() {
  let f = fixture();
  let analytics = Analytics::new(f.store.clone());
  let s = f.seeker().await;
  let e = f.employer().await;
  f.swipe(&e, &s, Interested).await;

  let err = analytics.employer_stats(s.actor_id).await.unwrap_err();
  assert!(matches!(err, Error::InvalidActorTarget { .. }));

  let stats = analytics.seeker_stats(s.actor_id).await.unwrap();
  assert_eq!(stats.interested_count, 1);
  assert_eq!(stats.pending_count, 1);

  let err = analytics.employer_stats(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::UnknownActor(_)));
}

#[tokio::test]
async fn actor_stats_dispatches_on_role() {
  let f = fixture();
  let analytics = Analytics::new(f.store.clone());
  let s = f.seeker().await;
  let e = f.employer().await;
  f.swipe(&s, &e, NotInterested).await;

  let (role, stats) = analytics.actor_stats(e.actor_id).await.unwrap();
  assert_eq!(role, Role::Employer);
  assert_eq!(stats.not_interested_count, 1);
  assert_eq!(stats.ratio, 0.0);

  let (role, stats) = analytics.actor_stats(s.actor_id).await.unwrap();
  assert_eq!(role, Role::Jobseeker);
  assert_eq!(stats.interested_count + stats.not_interested_count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_swipes_on_distinct_pairs_all_match() {
  let f = fixture();
  let e = f.employer().await;
  let mut seekers = Vec::new();
  for _ in 0..32 {
    seekers.push(f.seeker().await.actor_id);
  }
  let eid = e.actor_id;

  let handles: Vec<_> = seekers
    .iter()
    .flat_map(|&sid| [(sid, eid), (eid, sid)])
    .map(|(from, to)| {
      let engine = f.engine.clone();
      tokio::spawn(async move { engine.submit_swipe(from, to, Interested).await.unwrap() })
    })
    .collect();

  let mut new_matches = 0;
  for h in handles {
    new_matches += h.await.unwrap().is_new_match() as usize;
  }
  assert_eq!(new_matches, seekers.len());

  let matched = f.store.list_matches(eid, Some(MatchStatus::Matched)).await.unwrap();
  assert_eq!(matched.len(), seekers.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn revise_racing_flips_keeps_record_derived() {
  let f = fixture();
  let second_look = SecondLook::new(f.engine.clone());
  let (s, e) = (f.seeker().await, f.employer().await);
  let (sid, eid) = (s.actor_id, e.actor_id);
  f.swipe(&e, &s, Interested).await;
  f.swipe(&s, &e, NotInterested).await;

  let flips: Vec<_> = (0..20)
    .map(|i| {
      let engine = f.engine.clone();
      let decision = if i % 2 == 0 { Interested } else { NotInterested };
      tokio::spawn(async move { engine.submit_swipe(sid, eid, decision).await })
    })
    .collect();
  let revisions: Vec<_> = (0..20)
    .map(|_| {
      let second_look = second_look.clone();
      tokio::spawn(async move { second_look.revise_swipe(sid, eid).await })
    })
    .collect();

  for h in flips {
    h.await.unwrap().unwrap();
  }
  for h in revisions {
    match h.await.unwrap() {
      Ok(_) | Err(Error::NotReconsiderable { .. }) => {}
      Err(other) => panic!("unexpected revise error: {other}"),
    }
  }

  let mine = f.store.get_intent(sid, eid).await.unwrap().map(|i| i.decision);
  let theirs = f.store.get_intent(eid, sid).await.unwrap().map(|i| i.decision);
  let record = f.store.get_match(PairKey::new(sid, eid)).await.unwrap().unwrap();
  let history = f.store.swipe_history(sid, eid).await.unwrap();
  let ever_interested = history.iter().any(|ev| ev.decision == Interested);
  let expected = if ever_interested {
    PairState::Matched
  } else {
    PairState::derive(mine, theirs)
  };
  assert_eq!(PairState::from(record.status), expected);
}

#[tokio::test]
async fn only_conflicts_are_retryable() {
  let f = fixture();
  let (s, e) = (f.seeker().await, f.employer().await);
  f.swipe(&s, &e, Interested).await;

  let err = SecondLook::new(f.engine.clone())
    .revise_swipe(s.actor_id, e.actor_id)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotReconsiderable { .. }));
  assert!(!err.is_retryable());

  assert!(Error::Conflict(PairKey::new(s.actor_id, e.actor_id)).is_retryable());
}
