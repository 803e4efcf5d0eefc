//! User override records.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use subs_model::{CategoryConfig, Overrides, SubsConfig, SubsConfigKey};
use tokio::sync::watch;

use crate::error::Result;
use crate::records::RecordFile;

/// On-disk shape of the override store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideRecords {
    pub configs: Vec<SubsConfig>,
    pub categories: Vec<CategoryConfig>,
}

impl From<&Overrides> for OverrideRecords {
    fn from(overrides: &Overrides) -> Self {
        Self {
            configs: overrides.configs().cloned().collect(),
            categories: overrides.categories().cloned().collect(),
        }
    }
}

/// Store of group, app and category overrides.
#[derive(Debug)]
pub struct OverrideStore {
    file: RecordFile<OverrideRecords>,
    write: Mutex<()>,
    overrides: watch::Sender<Arc<Overrides>>,
}

impl OverrideStore {
    pub fn open(file: RecordFile<OverrideRecords>) -> Result<Self> {
        let records = file.load()?;
        let overrides = Overrides::from_records(records.configs, records.categories);
        tracing::debug!("Loaded {} override records", overrides.len());
        Ok(Self {
            file,
            write: Mutex::new(()),
            overrides: watch::Sender::new(Arc::new(overrides)),
        })
    }

    pub fn snapshot(&self) -> Arc<Overrides> {
        Arc::clone(&self.overrides.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Overrides>> {
        self.overrides.subscribe()
    }

    pub fn upsert_config(&self, config: SubsConfig) -> Result<()> {
        self.mutate(|o| {
            let next = config.clone();
            o.insert_config(config).as_ref() != Some(&next)
        })
        .map(|_| ())
    }

    pub fn remove_config(&self, key: &SubsConfigKey) -> Result<bool> {
        self.mutate(|o| o.remove_config(key).is_some())
    }

    pub fn upsert_category(&self, config: CategoryConfig) -> Result<()> {
        self.mutate(|o| {
            let next = config.clone();
            o.insert_category(config).as_ref() != Some(&next)
        })
        .map(|_| ())
    }

    pub fn remove_category(&self, subs_id: i64, category_key: i32) -> Result<bool> {
        self.mutate(|o| o.remove_category(subs_id, category_key).is_some())
    }

    /// Remove every override that belongs to a subscription.
    pub fn remove_subscription(&self, subs_id: i64) -> Result<usize> {
        let mut removed = 0;
        self.mutate(|o| {
            removed = o.remove_subscription(subs_id);
            removed > 0
        })?;
        Ok(removed)
    }

    fn mutate(&self, f: impl FnOnce(&mut Overrides) -> bool) -> Result<bool> {
        let _guard = self.write.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = self.snapshot().as_ref().clone();
        if !f(&mut next) {
            return Ok(false);
        }
        self.file.save(&OverrideRecords::from(&next))?;
        self.overrides.send_replace(Arc::new(next));
        Ok(true)
    }
}
