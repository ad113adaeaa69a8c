use chrono::{SubsecRound, Utc};
use reelnotes_config::ReviewsConfig;
use reelnotes_models::{fixture_reviews, NewReview, Review, ReviewPatch};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::id::{generator_for, IdGenerator, UuidIds};
use crate::slot::SlotStorage;

/// Construction options for [`ReviewStore`].
pub struct StoreOptions {
    pub slot_key: String,
    pub seed_fixtures: bool,
    pub ids: Box<dyn IdGenerator>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            slot_key: "movieReviews".to_string(),
            seed_fixtures: true,
            ids: Box::new(UuidIds),
        }
    }
}

impl From<&ReviewsConfig> for StoreOptions {
    fn from(config: &ReviewsConfig) -> Self {
        Self {
            slot_key: config.slot_key.clone(),
            seed_fixtures: config.seed_fixtures,
            ids: generator_for(config.id_strategy),
        }
    }
}

/// One element of the stored array. Records that do not read as a
/// [`Review`] are kept verbatim and written back in place.
enum Entry {
    Valid(Review),
    Unreadable(Value),
}

/// The slot contents as last read.
struct Collection {
    entries: Vec<Entry>,
    /// Raw slot text that was not a JSON array at all. Saved aside before
    /// the first write replaces it.
    corrupt: Option<String>,
}

impl Collection {
    fn decode(key: &str, raw: &str) -> Self {
        let records = match serde_json::from_str::<Vec<Value>>(raw) {
            Ok(records) => records,
            Err(e) => {
                warn!("Review slot {:?} is not a JSON array ({}), treating it as empty", key, e);
                return Self {
                    entries: Vec::new(),
                    corrupt: Some(raw.to_string()),
                };
            }
        };

        let entries = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| match serde_json::from_value::<Review>(record.clone()) {
                Ok(review) => Entry::Valid(review),
                Err(e) => {
                    warn!("Skipping unreadable review at index {} in slot {:?}: {}", index, key, e);
                    Entry::Unreadable(record)
                }
            })
            .collect();

        Self {
            entries,
            corrupt: None,
        }
    }

    fn reviews(&self) -> impl Iterator<Item = &Review> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Valid(review) => Some(review),
            Entry::Unreadable(_) => None,
        })
    }

    fn into_reviews(self) -> Vec<Review> {
        self.entries
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Valid(review) => Some(review),
                Entry::Unreadable(_) => None,
            })
            .collect()
    }

    /// Whether `id` is taken, counting unreadable records that still carry one.
    fn contains_id(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| match entry {
            Entry::Valid(review) => review.id == id,
            Entry::Unreadable(record) => record["id"].as_str() == Some(id),
        })
    }

    fn encode(&self) -> Result<String> {
        let records = self
            .entries
            .iter()
            .map(|entry| match entry {
                Entry::Valid(review) => serde_json::to_value(review),
                Entry::Unreadable(record) => Ok(record.clone()),
            })
            .collect::<serde_json::Result<Vec<Value>>>()?;
        Ok(serde_json::to_string(&records)?)
    }
}

/// The review collection, kept as one JSON array under a single slot key.
///
/// Nothing is cached between calls: every operation reads the slot, applies
/// one change and writes the whole collection back, so edits made to the slot
/// by someone else between calls are picked up. Mutations through the same
/// `ReviewStore` are serialized; separate processes sharing a slot are
/// last-writer-wins.
pub struct ReviewStore<S> {
    slot: S,
    key: String,
    ids: Box<dyn IdGenerator>,
    write_lock: Mutex<()>,
}

impl<S: SlotStorage> ReviewStore<S> {
    /// Open the store, seeding the fixture reviews if the collection is empty.
    pub async fn open(slot: S, options: StoreOptions) -> Result<Self> {
        let store = Self {
            slot,
            key: options.slot_key,
            ids: options.ids,
            write_lock: Mutex::new(()),
        };

        if options.seed_fixtures {
            let _guard = store.write_lock.lock().await;
            let mut collection = store.load().await?;
            if collection.entries.is_empty() {
                let fixtures = fixture_reviews();
                info!("Review collection {:?} is empty, seeding {} sample reviews", store.key, fixtures.len());
                collection.entries = fixtures.into_iter().map(Entry::Valid).collect();
                store.persist(&mut collection).await?;
            }
        }

        Ok(store)
    }

    pub fn slot_key(&self) -> &str {
        &self.key
    }

    /// Key under which an undecodable slot value is saved before being replaced.
    pub fn backup_key(&self) -> String {
        format!("{}.corrupt", self.key)
    }

    async fn load(&self) -> Result<Collection> {
        match self.slot.read(&self.key).await? {
            Some(raw) => Ok(Collection::decode(&self.key, &raw)),
            None => Ok(Collection {
                entries: Vec::new(),
                corrupt: None,
            }),
        }
    }

    async fn persist(&self, collection: &mut Collection) -> Result<()> {
        if let Some(raw) = collection.corrupt.take() {
            let backup = self.backup_key();
            self.slot.write(&backup, &raw).await?;
            warn!("Saved unreadable contents of slot {:?} to {:?}", self.key, backup);
        }

        let encoded = collection.encode()?;
        self.slot.write(&self.key, &encoded).await?;
        debug!("Persisted {} records to slot {:?}", collection.entries.len(), self.key);
        Ok(())
    }

    /// Every readable review, in creation order.
    pub async fn all(&self) -> Result<Vec<Review>> {
        Ok(self.load().await?.into_reviews())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Review>> {
        Ok(self.load().await?.into_reviews().into_iter().find(|r| r.id == id))
    }

    /// Append a new review with a fresh id and both timestamps set to now.
    ///
    /// No validation happens here; callers check rating and comment first.
    pub async fn create(&self, new: NewReview) -> Result<Review> {
        let _guard = self.write_lock.lock().await;
        let mut collection = self.load().await?;

        let id = loop {
            let candidate = self.ids.next_id();
            if !collection.contains_id(&candidate) {
                break candidate;
            }
            debug!("Generated id {} already in use, drawing another", candidate);
        };

        let review = Review::from_new(id, new, now());
        collection.entries.push(Entry::Valid(review.clone()));
        self.persist(&mut collection).await?;

        info!("Created review {} for movie {}", review.id, review.movie_id);
        Ok(review)
    }

    pub async fn list_by_movie(&self, movie_id: &str) -> Result<Vec<Review>> {
        let collection = self.load().await?;
        Ok(collection.reviews().filter(|r| r.movie_id == movie_id).cloned().collect())
    }

    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<Review>> {
        let collection = self.load().await?;
        Ok(collection.reviews().filter(|r| r.user_id == user_id).cloned().collect())
    }

    /// Merge `patch` over the review with `id` and refresh its `updated_at`.
    ///
    /// A missing id is not an error: nothing is written and `None` comes back.
    pub async fn update(&self, id: &str, patch: ReviewPatch) -> Result<Option<Review>> {
        let _guard = self.write_lock.lock().await;
        let mut collection = self.load().await?;

        let found = collection.entries.iter_mut().find_map(|entry| match entry {
            Entry::Valid(review) if review.id == id => Some(review),
            _ => None,
        });
        let Some(review) = found else {
            debug!("Update skipped, no review with id {}", id);
            return Ok(None);
        };
        review.apply(patch, now());
        let updated = review.clone();

        self.persist(&mut collection).await?;
        info!("Updated review {}", id);
        Ok(Some(updated))
    }

    /// Remove the review with `id`. Returns whether anything was removed;
    /// a missing id leaves the collection untouched and is not an error.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut collection = self.load().await?;

        let before = collection.entries.len();
        collection
            .entries
            .retain(|entry| !matches!(entry, Entry::Valid(review) if review.id == id));
        if collection.entries.len() == before {
            debug!("Delete skipped, no review with id {}", id);
            return Ok(false);
        }

        self.persist(&mut collection).await?;
        info!("Deleted review {}", id);
        Ok(true)
    }
}

/// Current time at the millisecond precision the slot format carries.
fn now() -> chrono::DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
