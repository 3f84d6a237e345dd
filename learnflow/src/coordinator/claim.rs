//! In-process claim on a learning space.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

/// Spaces with a run in flight in this process, keyed to the owning run.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    runs: DashMap<String, Uuid>,
}

impl InFlight {
    /// Claims `space_id` for `run_id`, or returns `None` if another run holds it.
    pub(crate) fn claim(&self, space_id: &str, run_id: Uuid) -> Option<Claim<'_>> {
        match self.runs.entry(space_id.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(run_id);
                Some(Claim {
                    owner: self,
                    space_id: space_id.to_string(),
                })
            }
        }
    }

    pub(crate) fn is_claimed(&self, space_id: &str) -> bool {
        self.runs.contains_key(space_id)
    }
}

/// Releases the claim when dropped.
#[derive(Debug)]
pub(crate) struct Claim<'a> {
    owner: &'a InFlight,
    space_id: String,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.owner.runs.remove(&self.space_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_claim_is_refused_until_release() {
        let in_flight = InFlight::default();
        let first = in_flight.claim("s1", Uuid::new_v4());
        assert!(first.is_some());
        assert!(in_flight.claim("s1", Uuid::new_v4()).is_none());
        assert!(in_flight.claim("s2", Uuid::new_v4()).is_some());

        drop(first);
        assert!(!in_flight.is_claimed("s1"));
        assert!(in_flight.claim("s1", Uuid::new_v4()).is_some());
    }
}
