//! Leaderboard ordering by distance covered.

use crate::projection::ProjectionState;

/// Anything that can be placed on a leaderboard.
pub trait Progress {
    fn has_started(&self) -> bool;
    fn distance_covered(&self) -> f64;
}

impl Progress for ProjectionState {
    fn has_started(&self) -> bool {
        self.has_started
    }

    fn distance_covered(&self) -> f64 {
        self.distance_covered
    }
}

/// One participant's place. Rank `0` means not started.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing<K, P> {
    pub id: K,
    pub progress: P,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Standings<K, P> {
    /// Started participants, leader first.
    pub ranked: Vec<Standing<K, P>>,
    /// Participants that have not started, in input order, all ranked `0`.
    pub waiting: Vec<Standing<K, P>>,
}

impl<K: PartialEq, P> Standings<K, P> {
    pub fn rank_of(&self, id: &K) -> Option<u32> {
        self.ranked
            .iter()
            .chain(&self.waiting)
            .find(|s| &s.id == id)
            .map(|s| s.rank)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Standing<K, P>> {
        self.ranked.iter().chain(&self.waiting)
    }
}

/// Ranks participants by distance covered, descending.
///
/// Ties keep their input order; there is no secondary key. Ranks are rebuilt
/// from scratch on every call.
pub fn rank<K, P, I>(entries: I) -> Standings<K, P>
where
    P: Progress,
    I: IntoIterator<Item = (K, P)>,
{
    let (mut started, not_started): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .map(|(id, progress)| Standing {
            id,
            progress,
            rank: 0,
        })
        .partition(|s| s.progress.has_started());

    // `sort_by` is stable, which is what keeps ties in input order.
    started.sort_by(|a, b| {
        b.progress
            .distance_covered()
            .total_cmp(&a.progress.distance_covered())
    });
    for (position, standing) in started.iter_mut().enumerate() {
        standing.rank = position as u32 + 1;
    }

    Standings {
        ranked: started,
        waiting: not_started,
    }
}
