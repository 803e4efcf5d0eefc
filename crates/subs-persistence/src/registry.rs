//! Subscription install records.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use subs_model::SubsItem;
use tokio::sync::watch;

use crate::error::Result;
use crate::io::delete_subscription_file;
use crate::records::RecordFile;

/// Registry of installed subscriptions.
///
/// Items are kept sorted by `(order, id)`, which is the order subscriptions
/// are resolved in. Every mutation is written to disk before it is published.
#[derive(Debug)]
pub struct ItemRegistry {
    file: RecordFile<Vec<SubsItem>>,
    subscriptions_dir: PathBuf,
    write: Mutex<()>,
    items: watch::Sender<Arc<Vec<SubsItem>>>,
}

impl ItemRegistry {
    /// Load the registry from its record file.
    ///
    /// `subscriptions_dir` is where [`remove`](Self::remove) deletes documents.
    pub fn open(
        file: RecordFile<Vec<SubsItem>>,
        subscriptions_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let mut items = file.load()?;
        sort_items(&mut items);
        tracing::debug!("Loaded {} subscription items", items.len());
        Ok(Self {
            file,
            subscriptions_dir: subscriptions_dir.into(),
            write: Mutex::new(()),
            items: watch::Sender::new(Arc::new(items)),
        })
    }

    pub fn snapshot(&self) -> Arc<Vec<SubsItem>> {
        Arc::clone(&self.items.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<SubsItem>>> {
        self.items.subscribe()
    }

    pub fn get(&self, id: i64) -> Option<SubsItem> {
        self.items.borrow().iter().find(|i| i.id == id).cloned()
    }

    /// Display position one past the current last item.
    pub fn next_order(&self) -> i32 {
        self.items
            .borrow()
            .iter()
            .map(|i| i.order)
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Insert a record, replacing any existing record with the same id.
    pub fn insert(&self, item: SubsItem) -> Result<()> {
        self.mutate(|items| {
            items.retain(|i| i.id != item.id);
            items.push(item);
            true
        })
        .map(|_| ())
    }

    /// Replace an existing record. Returns `false` if no record has this id.
    pub fn update(&self, item: SubsItem) -> Result<bool> {
        let id = item.id;
        self.update_item(id, |current| *current = item)
    }

    pub fn set_enable(&self, id: i64, enable: bool) -> Result<bool> {
        self.update_item(id, |item| item.enable = enable)
    }

    pub fn set_enable_update(&self, id: i64, enable_update: bool) -> Result<bool> {
        self.update_item(id, |item| item.enable_update = enable_update)
    }

    pub fn set_update_url(&self, id: i64, update_url: Option<String>) -> Result<bool> {
        self.update_item(id, |item| item.update_url = update_url)
    }

    /// Record a successful update of the subscription's document.
    pub fn touch(&self, id: i64) -> Result<bool> {
        self.update_item(id, SubsItem::touch)
    }

    /// Assign display order by position in `ids`.
    ///
    /// Items not listed keep their relative order after the listed ones.
    pub fn reorder(&self, ids: &[i64]) -> Result<()> {
        self.mutate(|items| {
            let listed = ids.len() as i32;
            let mut rest = 0;
            for item in items.iter_mut() {
                item.order = match ids.iter().position(|id| *id == item.id) {
                    Some(position) => position as i32,
                    None => {
                        rest += 1;
                        listed + rest - 1
                    }
                };
            }
            true
        })
        .map(|_| ())
    }

    /// Remove a record and delete its subscription document file.
    ///
    /// Dependent overrides live in the override store and must be removed
    /// there.
    pub fn remove(&self, id: i64) -> Result<Option<SubsItem>> {
        let mut removed = None;
        self.mutate(|items| {
            let position = items.iter().position(|i| i.id == id);
            removed = position.map(|p| items.remove(p));
            removed.is_some()
        })?;
        delete_subscription_file(&self.subscriptions_dir, id)?;
        if removed.is_some() {
            tracing::info!(subs_id = id, "Removed subscription item");
        }
        Ok(removed)
    }

    fn update_item(&self, id: i64, f: impl FnOnce(&mut SubsItem)) -> Result<bool> {
        self.mutate(|items| match items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        })
    }

    /// Apply `f` to a copy of the items; persist and publish when it reports
    /// a change.
    fn mutate(&self, f: impl FnOnce(&mut Vec<SubsItem>) -> bool) -> Result<bool> {
        let _guard = self.write.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = self.snapshot().as_ref().clone();
        if !f(&mut next) {
            return Ok(false);
        }
        sort_items(&mut next);
        self.file.save(&next)?;
        self.items.send_replace(Arc::new(next));
        Ok(true)
    }
}

fn sort_items(items: &mut [SubsItem]) {
    items.sort_by_key(|i| (i.order, i.id));
}
