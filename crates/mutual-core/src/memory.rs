//! [`MemoryStore`], an in-process [`SwipeStore`] with one lock per pair.
//!
//! Each pair's two intents, its record and its audit trail live together in
//! a single mutex-guarded slot, so the read-settle-write of a swipe is atomic
//! per pair while swipes on different pairs never contend.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::{
  Error, Result,
  actor::{Actor, NewActor, Role},
  machine,
  record::{MatchRecord, MatchStatus, PairKey},
  second_look::SecondLookCandidate,
  store::{Directory, SwipeCommit, SwipeStore},
  swipe::{NewSwipe, SwipeEvent, SwipeIntent},
};

#[derive(Debug, Default)]
struct PairSlot {
  jobseeker: Option<SwipeIntent>,
  employer:  Option<SwipeIntent>,
  record:    Option<MatchRecord>,
  history:   Vec<SwipeEvent>,
}

impl PairSlot {
  fn intent(&self, role: Role) -> Option<&SwipeIntent> {
    match role {
      Role::Jobseeker => self.jobseeker.as_ref(),
      Role::Employer => self.employer.as_ref(),
    }
  }

  fn intent_mut(&mut self, role: Role) -> &mut Option<SwipeIntent> {
    match role {
      Role::Jobseeker => &mut self.jobseeker,
      Role::Employer => &mut self.employer,
    }
  }
}

type Slot = Arc<Mutex<PairSlot>>;

fn lock(slot: &Slot) -> MutexGuard<'_, PairSlot> {
  // A panic mid-commit leaves no partial write behind: every field is
  // assigned after the new state is fully computed.
  slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An in-memory store. Cloning is cheap and clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
  actors: Arc<DashMap<Uuid, Actor>>,
  pairs:  Arc<DashMap<PairKey, Slot>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn slot(&self, pair: PairKey) -> Slot {
    self.pairs.entry(pair).or_default().clone()
  }

  /// Snapshot the slots `actor_id` takes part in, together with the role it
  /// plays there. Slots are locked only after the map guard is released.
  fn slots_of(&self, actor_id: Uuid) -> Option<(Role, Vec<(PairKey, Slot)>)> {
    let role = self.actors.get(&actor_id)?.role;
    let slots = self
      .pairs
      .iter()
      .filter(|entry| entry.key().side(role) == actor_id)
      .map(|entry| (*entry.key(), entry.value().clone()))
      .collect();
    Some((role, slots))
  }

  fn insert_actor(&self, actor: Actor) -> Result<Actor> {
    use dashmap::mapref::entry::Entry;
    match self.actors.entry(actor.actor_id) {
      Entry::Occupied(_) => Err(Error::Store(
        format!("actor {} already registered", actor.actor_id).into(),
      )),
      Entry::Vacant(v) => Ok(v.insert(actor).clone()),
    }
  }

  fn commit(&self, swipe: NewSwipe) -> SwipeCommit {
    let pair = swipe.pair();
    let role = swipe.actor_role();
    let slot = self.slot(pair);
    let mut slot = lock(&slot);
    let now = Utc::now();

    let intent = SwipeIntent {
      actor_id:  swipe.actor_id(),
      target_id: swipe.target_id(),
      decision:  swipe.decision(),
      swiped_at: now,
      revision:  slot.intent(role).map_or(1, |i| i.revision + 1),
    };

    let counterpart = slot.intent(role.counterpart()).map(|i| i.decision);
    let transition = machine::settle(
      slot.record.as_ref().map(|r| r.status),
      intent.decision,
      counterpart,
    );

    let record = match slot.record.clone() {
      Some(mut record) if transition.changed() => {
        record.status = transition.status;
        record.version += 1;
        record.updated_at = now;
        record
      }
      Some(record) => record,
      None => MatchRecord {
        pair,
        status: transition.status,
        version: 1,
        created_at: now,
        updated_at: now,
      },
    };

    slot.history.push(SwipeEvent::from(&intent));
    *slot.intent_mut(role) = Some(intent.clone());
    slot.record = Some(record.clone());

    SwipeCommit { intent, transition, record }
  }
}

impl Directory for MemoryStore {
  type Error = Error;

  async fn register_actor(&self, input: NewActor) -> Result<Actor> {
    self.register_actor_with_id(Uuid::new_v4(), input).await
  }

  async fn register_actor_with_id(
    &self,
    id: Uuid,
    input: NewActor,
  ) -> Result<Actor> {
    self.insert_actor(Actor {
      actor_id:     id,
      role:         input.role,
      display_name: input.display_name,
      created_at:   Utc::now(),
    })
  }

  async fn get_actor(&self, id: Uuid) -> Result<Option<Actor>> {
    Ok(self.actors.get(&id).map(|a| a.clone()))
  }
}

impl SwipeStore for MemoryStore {
  async fn record_swipe(&self, swipe: NewSwipe) -> Result<SwipeCommit> {
    Ok(self.commit(swipe))
  }

  async fn get_intent(
    &self,
    actor_id: Uuid,
    target_id: Uuid,
  ) -> Result<Option<SwipeIntent>> {
    let Some(role) = self.actors.get(&actor_id).map(|a| a.role) else {
      return Ok(None);
    };
    let pair = PairKey::from_side(role, actor_id, target_id);
    let Some(slot) = self.pairs.get(&pair).map(|s| s.clone()) else {
      return Ok(None);
    };
    let intent = lock(&slot).intent(role).cloned();
    Ok(intent)
  }

  async fn get_match(&self, pair: PairKey) -> Result<Option<MatchRecord>> {
    let Some(slot) = self.pairs.get(&pair).map(|s| s.clone()) else {
      return Ok(None);
    };
    let record = lock(&slot).record.clone();
    Ok(record)
  }

  async fn list_matches(
    &self,
    actor_id: Uuid,
    status: Option<MatchStatus>,
  ) -> Result<Vec<MatchRecord>> {
    let Some((_, slots)) = self.slots_of(actor_id) else {
      return Ok(Vec::new());
    };
    let mut records: Vec<MatchRecord> = slots
      .iter()
      .filter_map(|(_, slot)| lock(slot).record.clone())
      .filter(|r| status.is_none_or(|s| r.status == s))
      .collect();
    records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.pair.cmp(&b.pair)));
    Ok(records)
  }

  async fn reconsiderable_page(
    &self,
    actor_id: Uuid,
    after: Option<Uuid>,
    limit: usize,
  ) -> Result<Vec<SecondLookCandidate>> {
    let Some((role, slots)) = self.slots_of(actor_id) else {
      return Ok(Vec::new());
    };
    let mut page: Vec<SecondLookCandidate> = slots
      .iter()
      .filter_map(|(pair, slot)| {
        let target_id = pair.side(role.counterpart());
        if after.is_some_and(|a| target_id <= a) {
          return None;
        }
        let slot = lock(slot);
        let mine = slot.intent(role)?;
        let record = slot.record.as_ref()?;
        SecondLookCandidate::qualifies(mine, record).then(|| SecondLookCandidate {
          target_id,
          status: record.status,
          counterpart_decision: slot.intent(role.counterpart()).map(|i| i.decision),
          rejected_at: mine.swiped_at,
        })
      })
      .collect();
    page.sort_by_key(|c| c.target_id);
    page.truncate(limit);
    Ok(page)
  }

  async fn inbound_intents(&self, target_id: Uuid) -> Result<Vec<SwipeIntent>> {
    let Some((role, slots)) = self.slots_of(target_id) else {
      return Ok(Vec::new());
    };
    Ok(
      slots
        .iter()
        .filter_map(|(_, slot)| lock(slot).intent(role.counterpart()).cloned())
        .collect(),
    )
  }

  async fn swipe_history(
    &self,
    actor_id: Uuid,
    target_id: Uuid,
  ) -> Result<Vec<SwipeEvent>> {
    let Some(role) = self.actors.get(&actor_id).map(|a| a.role) else {
      return Ok(Vec::new());
    };
    let pair = PairKey::from_side(role, actor_id, target_id);
    let Some(slot) = self.pairs.get(&pair).map(|s| s.clone()) else {
      return Ok(Vec::new());
    };
    let history = lock(&slot)
      .history
      .iter()
      .filter(|e| e.actor_id == actor_id)
      .cloned()
      .collect();
    Ok(history)
  }
}
