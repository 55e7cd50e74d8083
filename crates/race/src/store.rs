//! Access to race data owned by the persistence layer.
//!
//! The engine only ever reads a [`RaceSnapshot`]; the recorded-time writes
//! exist for the officials' timing desk.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::{RecordedTime, UpsertOutcome},
    snapshot::RaceSnapshot,
};

pub type SharedStore = Arc<dyn RaceStore>;

#[async_trait]
pub trait RaceStore: Send + Sync {
    /// Loads everything needed to compute one race's live state.
    async fn load_snapshot(&self, template_id: Uuid) -> Result<RaceSnapshot, AppError>;

    /// Records a crossing, replacing any earlier time for the same athlete and checkpoint.
    async fn upsert_recorded_time(
        &self,
        template_id: Uuid,
        time: RecordedTime,
    ) -> Result<UpsertOutcome, AppError>;

    /// Removes a crossing. Returns whether one existed.
    async fn delete_recorded_time(
        &self,
        template_id: Uuid,
        athlete_id: Uuid,
        checkpoint_id: Uuid,
    ) -> Result<bool, AppError>;
}

/// Keeps races in process memory. Used by tests and local simulations.
#[derive(Clone, Default)]
pub struct MemoryStore {
    races: Arc<RwLock<HashMap<Uuid, RaceSnapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_race(&self, snapshot: RaceSnapshot) {
        self.races
            .write()
            .await
            .insert(snapshot.template.id, snapshot);
    }
}

#[async_trait]
impl RaceStore for MemoryStore {
    async fn load_snapshot(&self, template_id: Uuid) -> Result<RaceSnapshot, AppError> {
        self.races
            .read()
            .await
            .get(&template_id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn upsert_recorded_time(
        &self,
        template_id: Uuid,
        time: RecordedTime,
    ) -> Result<UpsertOutcome, AppError> {
        let mut races = self.races.write().await;
        let race = races.get_mut(&template_id).ok_or(AppError::NotFound)?;
        Ok(match race.recorded.upsert(time) {
            Some(_) => UpsertOutcome::Corrected,
            None => UpsertOutcome::Inserted,
        })
    }

    async fn delete_recorded_time(
        &self,
        template_id: Uuid,
        athlete_id: Uuid,
        checkpoint_id: Uuid,
    ) -> Result<bool, AppError> {
        let mut races = self.races.write().await;
        let race = races.get_mut(&template_id).ok_or(AppError::NotFound)?;
        Ok(race.recorded.remove(athlete_id, checkpoint_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{checkpoint::CheckpointType, snapshot::fixtures::*};
    use time::Duration;

    #[tokio::test]
    async fn test_memory_store_upsert_and_delete() {
        let store = MemoryStore::new();
        store.insert_race(snapshot(vec![athlete(1, "Ada")], vec![])).await;

        let first = crossing(1, CheckpointType::SwimStart, GUN);
        let again = crossing(1, CheckpointType::SwimStart, GUN + Duration::seconds(2));
        assert_eq!(
            store.upsert_recorded_time(template_id(), first).await.unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert_recorded_time(template_id(), again).await.unwrap(),
            UpsertOutcome::Corrected
        );

        let snap = store.load_snapshot(template_id()).await.unwrap();
        assert_eq!(snap.recorded.len(), 1);
        assert_eq!(
            snap.time_at(athlete_id(1), CheckpointType::SwimStart),
            Some(GUN + Duration::seconds(2))
        );

        let cp = checkpoint_id(CheckpointType::SwimStart);
        assert!(store.delete_recorded_time(template_id(), athlete_id(1), cp).await.unwrap());
        assert!(!store.delete_recorded_time(template_id(), athlete_id(1), cp).await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_unknown_race() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.load_snapshot(Uuid::nil()).await,
            Err(AppError::NotFound)
        ));
    }
}
