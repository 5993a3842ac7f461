use crate::demo;
use crate::error::Result;
use crate::models::{Collection, Item, ItemStatus};
use crate::qr;
use crate::storage::{read_list, try_read_list, write_list, KeyValueStore};
use log::{debug, info};

const HOME_FALLBACK_LEN: usize = 3;

// Read-modify-write is not atomic: two writers on one backend can lose updates.
pub struct ItemStore<S: KeyValueStore> {
    store: S,
}

#[derive(Debug, Default, PartialEq)]
pub struct HomeFeed {
    pub protected_found: Vec<Item>,
    pub found: Vec<Item>,
}

impl<S: KeyValueStore> ItemStore<S> {
    pub fn new(store: S) -> Self {
        ItemStore { store }
    }

    pub fn save_items(&self, items: &[Item], collection: Collection) -> Result<()> {
        debug!("Saving {} items to {}", items.len(), collection);
        write_list(&self.store, collection.storage_key(), items)
    }

    pub fn get_items(&self, collection: Collection) -> Vec<Item> {
        read_list(&self.store, collection.storage_key())
    }

    pub fn add_item(&self, item: Item, collection: Collection) -> Result<Vec<Item>> {
        let mut items: Vec<Item> = try_read_list(&self.store, collection.storage_key())?;
        info!("Adding item {} to {}", item.id, collection);
        items.push(item);
        self.save_items(&items, collection)?;
        Ok(items)
    }

    /// Protected shadows found, found shadows lost.
    pub fn get_item_by_id(&self, id: &str) -> Option<Item> {
        ItemStatus::ALL
            .iter()
            .find_map(|&c| self.get_items(c).into_iter().find(|item| item.id == id))
    }

    pub fn clear_all_items(&self) -> Result<()> {
        for collection in ItemStatus::ALL {
            self.store.remove(collection.storage_key())?;
        }
        info!("Cleared all item collections");
        Ok(())
    }

    // Copies of the item in other collections are left alone.
    pub fn delete_item(&self, id: &str, collection: Collection) -> Result<bool> {
        let items: Vec<Item> = try_read_list(&self.store, collection.storage_key())?;
        let before = items.len();
        let remaining: Vec<Item> = items.into_iter().filter(|item| item.id != id).collect();
        if remaining.len() == before {
            return Ok(false);
        }
        self.save_items(&remaining, collection)?;
        info!("Deleted item {} from {}", id, collection);
        Ok(true)
    }

    pub fn items_owned_by(&self, user_id: &str, collection: Collection) -> Vec<Item> {
        self.get_items(collection)
            .into_iter()
            .filter(|item| item.user_id == user_id)
            .collect()
    }

    pub fn all_items(&self) -> Vec<Item> {
        ItemStatus::ALL
            .iter()
            .flat_map(|&c| self.get_items(c))
            .collect()
    }

    pub fn similar_items(&self, item: &Item) -> Vec<Item> {
        let name = item.name.to_lowercase();
        self.all_items()
            .into_iter()
            .filter(|other| other.id != item.id && other.name.to_lowercase() == name)
            .collect()
    }

    /// Anonymous viewers get the first few found items.
    pub fn home_feed(&self, viewer_id: Option<&str>) -> HomeFeed {
        let found = self.get_items(ItemStatus::Found);
        let Some(viewer_id) = viewer_id else {
            return HomeFeed {
                protected_found: Vec::new(),
                found: found.into_iter().take(HOME_FALLBACK_LEN).collect(),
            };
        };
        let protected_found: Vec<Item> = self
            .get_items(ItemStatus::Protected)
            .into_iter()
            .filter(|item| {
                item.status == ItemStatus::Protected
                    && item.user_id != viewer_id
                    && found.iter().any(|f| f.id == item.id)
            })
            .collect();
        let others_found: Vec<Item> = found
            .iter()
            .filter(|item| item.user_id != viewer_id)
            .filter(|item| !protected_found.iter().any(|p| p.id == item.id))
            .cloned()
            .collect();

        if protected_found.is_empty() && others_found.is_empty() {
            return HomeFeed {
                protected_found,
                found: found.into_iter().take(HOME_FALLBACK_LEN).collect(),
            };
        }
        HomeFeed {
            protected_found,
            found: others_found,
        }
    }

    /// Reports carrying a QR token are copied into the protected collection as well.
    pub fn report_found(&self, item: Item) -> Result<Vec<Item>> {
        if item.has_qr_code() {
            self.add_item(item.clone(), ItemStatus::Protected)?;
        }
        self.add_item(item, ItemStatus::Found)
    }

    pub fn find_by_qr_token(&self, token: &str) -> Option<Item> {
        qr::item_id_from_token(token).and_then(|id| self.get_item_by_id(id))
    }

    pub fn seed_demo(&self) -> Result<bool> {
        for collection in ItemStatus::ALL {
            let existing: Vec<Item> = try_read_list(&self.store, collection.storage_key())?;
            if !existing.is_empty() {
                return Ok(false);
            }
        }
        for collection in ItemStatus::ALL {
            let items: Vec<Item> = demo::items()
                .into_iter()
                .filter(|item| item.status == collection)
                .collect();
            if !items.is_empty() {
                self.save_items(&items, collection)?;
            }
        }
        info!("Seeded demo items");
        Ok(true)
    }
}

#[derive(Debug, Default, Clone)]
pub struct ItemFilter {
    pub query: Option<String>,
    pub category: Option<String>,
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        let matches_query = match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => {
                let query = query.to_lowercase();
                item.name.to_lowercase().contains(&query)
                    || item.description.to_lowercase().contains(&query)
            }
        };
        let matches_category = match self.category.as_deref() {
            None | Some("") => true,
            Some(category) => item.category == category,
        };
        matches_query && matches_category
    }

    pub fn apply(&self, items: Vec<Item>) -> Vec<Item> {
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

pub fn categories(items: &[Item]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for item in items {
        if !seen.contains(&item.category) {
            seen.push(item.category.clone());
        }
    }
    seen
}
