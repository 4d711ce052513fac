// Retention-bounded dataset store
// Datasets live here between upload and analysis; running jobs hold their own Arc

use super::table::Dataset;
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

struct StoredDataset {
    dataset: Arc<Dataset>,
    inserted_at: Instant,
}

pub struct DatasetStore {
    retention: Duration,
    datasets: RwLock<HashMap<String, StoredDataset>>,
}

impl DatasetStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            retention,
            datasets: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, dataset: Dataset) -> Arc<Dataset> {
        self.purge_expired();

        let dataset = Arc::new(dataset);
        self.datasets.write().insert(
            dataset.id().to_string(),
            StoredDataset {
                dataset: dataset.clone(),
                inserted_at: Instant::now(),
            },
        );
        debug!("Stored dataset {} ({})", dataset.id(), dataset.filename());
        dataset
    }

    pub fn get(&self, id: &str) -> Option<Arc<Dataset>> {
        self.purge_expired();
        self.datasets.read().get(id).map(|s| s.dataset.clone())
    }

    pub fn remove(&self, id: &str) -> bool {
        self.datasets.write().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.datasets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    /// Drop every dataset older than the retention window at `now`
    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut datasets = self.datasets.write();
        let before = datasets.len();
        datasets.retain(|_, stored| now.saturating_duration_since(stored.inserted_at) <= self.retention);
        let purged = before - datasets.len();

        if purged > 0 {
            info!("Purged {} expired dataset(s)", purged);
        }
        purged
    }

    /// Periodically purge expired datasets until the handle is aborted
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                match store.upgrade() {
                    Some(store) => {
                        store.purge_expired();
                    }
                    None => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::from_parts(
            vec!["a".to_string()],
            vec!["GATA3".to_string()],
            vec![1.0],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_insert_get_remove() {
        let store = DatasetStore::new(Duration::from_secs(60));
        let stored = store.insert(dataset());

        assert!(store.get(stored.id()).is_some());
        assert!(store.remove(stored.id()));
        assert!(!store.remove(stored.id()));
        assert!(store.get(stored.id()).is_none());
    }

    #[test]
    fn test_expired_datasets_are_purged() {
        let store = DatasetStore::new(Duration::from_secs(60));
        let stored = store.insert(dataset());

        assert_eq!(store.purge_expired_at(Instant::now()), 0);
        assert_eq!(
            store.purge_expired_at(Instant::now() + Duration::from_secs(61)),
            1
        );
        assert!(store.is_empty());
        // Holders of the Arc keep their data
        assert_eq!(stored.sample_count(), 1);
    }
}
