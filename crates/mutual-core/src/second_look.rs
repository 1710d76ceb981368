//! Second look: reopening one's own rejections.

use chrono::{DateTime, Utc};
use futures::{Stream, TryStreamExt as _, stream};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  engine::{MatchEngine, MatchOutcome},
  record::{MatchRecord, MatchStatus, PairKey},
  store::SwipeStore,
  swipe::{Decision, SwipeIntent},
};

/// Candidates fetched per store round-trip.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// A pair the actor rejected that has not become a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondLookCandidate {
  pub target_id:            Uuid,
  pub status:               MatchStatus,
  /// What the other side thinks, if they have swiped at all.
  pub counterpart_decision: Option<Decision>,
  pub rejected_at:          DateTime<Utc>,
}

impl SecondLookCandidate {
  /// The candidate predicate: my intent is `NotInterested` and the pair is
  /// not matched.
  pub fn qualifies(mine: &SwipeIntent, record: &MatchRecord) -> bool {
    mine.decision == Decision::NotInterested && !record.is_matched()
  }
}

pub struct SecondLook<S> {
  engine:    MatchEngine<S>,
  page_size: usize,
}

impl<S> Clone for SecondLook<S> {
  fn clone(&self) -> Self {
    Self { engine: self.engine.clone(), page_size: self.page_size }
  }
}

impl<S: SwipeStore + 'static> SecondLook<S> {
  pub fn new(engine: MatchEngine<S>) -> Self {
    Self { engine, page_size: DEFAULT_PAGE_SIZE }
  }

  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.max(1);
    self
  }

  /// Lazily stream `actor_id`'s candidates in target-id order.
  ///
  /// Pages are fetched only as the stream is polled. Every call starts a
  /// fresh scan, and a scan ends after the first short page.
  pub fn list_reconsiderable(
    &self,
    actor_id: Uuid,
  ) -> impl Stream<Item = Result<SecondLookCandidate>> + Send + 'static {
    let store = self.engine.store().clone();
    let limit = self.page_size;

    stream::try_unfold(Some(None), move |cursor: Option<Option<Uuid>>| {
      let store = store.clone();
      async move {
        let Some(after) = cursor else { return Ok(None) };
        let page = store
          .reconsiderable_page(actor_id, after, limit)
          .await
          .map_err(Error::from_store)?;
        let next = if page.len() < limit {
          None
        } else {
          page.last().map(|c| Some(c.target_id))
        };
        Ok::<_, Error>(Some((stream::iter(page.into_iter().map(Ok::<_, Error>)), next)))
      }
    })
    .try_flatten()
  }

  /// Collect the whole candidate list.
  pub async fn candidates(&self, actor_id: Uuid) -> Result<Vec<SecondLookCandidate>> {
    self.list_reconsiderable(actor_id).try_collect().await
  }

  /// Turn a past rejection of `target_id` into interest.
  ///
  /// Goes through [`MatchEngine::submit_swipe`] like any other swipe, so the
  /// pair only matches if the other side is interested too. Re-revising an
  /// already matched, already interested pair is a no-op.
  ///
  /// The precondition is read from a snapshot taken before the commit. A
  /// concurrent swipe by the same actor on the same pair may land in between,
  /// so the classification (no-op, revision or `NotReconsiderable`) can be one
  /// write behind. The write itself still goes through the atomic commit, and
  /// the stored record always equals the derivation of the stored intents.
  pub async fn revise_swipe(
    &self,
    actor_id: Uuid,
    target_id: Uuid,
  ) -> Result<MatchOutcome> {
    let (actor, target) = self.engine.resolve_pair(actor_id, target_id).await?;
    let pair = PairKey::between(&actor, &target)?;
    let store = self.engine.store();

    let intent = store.get_intent(actor_id, target_id).await.map_err(Error::from_store)?;
    let record = store.get_match(pair).await.map_err(Error::from_store)?;

    match (intent, record) {
      (Some(intent), Some(record))
        if record.is_matched() && intent.decision.is_interested() =>
      {
        Ok(MatchOutcome { status: record.status, changed: false, record, intent })
      }
      (Some(intent), Some(record))
        if SecondLookCandidate::qualifies(&intent, &record) =>
      {
        self
          .engine
          .submit_resolved(&actor, &target, Decision::Interested)
          .await
      }
      _ => Err(Error::NotReconsiderable { actor: actor_id, target: target_id }),
    }
  }
}
