//! Global Vendor List (GVL) document model and snapshot cache.
//!
//! The GVL is the IAB-published JSON registry mapping vendor ids to the
//! purposes and features each vendor declares. This crate consumes a parsed
//! document; how the JSON is obtained (HTTP fetch, bundled file) is the
//! caller's concern. The [`GvlCache`] is an explicit, injectable holder for
//! one snapshot with a time-to-live, replacing any notion of process-global
//! state.

use fnv::FnvHashMap;
use serde::Deserialize;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A parsed Global Vendor List document. Read-only once loaded.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GvlDocument {
    pub gvl_specification_version: u8,
    pub vendor_list_version: u16,
    pub tcf_policy_version: u8,
    pub last_updated: Option<String>,
    pub purposes: FnvHashMap<u16, Definition>,
    pub special_purposes: FnvHashMap<u16, Definition>,
    pub features: FnvHashMap<u16, Definition>,
    pub special_features: FnvHashMap<u16, Definition>,
    /// Keyed by vendor id (stringified integers in the JSON).
    pub vendors: FnvHashMap<u16, Vendor>,
}

impl GvlDocument {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn from_reader<R: Read>(r: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(r)
    }

    pub fn vendor(&self, id: u16) -> Option<&Vendor> {
        self.vendors.get(&id)
    }
}

/// A named purpose or feature definition from the GVL's global tables.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Definition {
    pub id: u16,
    pub name: String,
    pub description: String,
}

/// One vendor record: the ids it declares under each legal basis.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Vendor {
    pub id: u16,
    pub name: String,
    /// Purpose ids used under consent.
    pub purposes: Vec<u16>,
    /// Purpose ids used under legitimate interest.
    pub leg_int_purposes: Vec<u16>,
    /// Purpose ids the vendor can process under either basis.
    pub flexible_purposes: Vec<u16>,
    pub special_purposes: Vec<u16>,
    pub features: Vec<u16>,
    /// Special feature ids the vendor may request opt-in for.
    pub special_features: Vec<u16>,
    pub policy_url: Option<String>,
    /// Set once a vendor is scheduled for removal from the list.
    pub deleted_date: Option<String>,
}

/// Holds one GVL snapshot with a time-to-live.
///
/// Lifecycle: populate on first use via [`get_or_insert_with`], treat as
/// absent once the TTL elapses, clear explicitly when a caller wants a fresh
/// load. Safe to share behind an `Arc` across threads.
///
/// [`get_or_insert_with`]: GvlCache::get_or_insert_with
pub struct GvlCache {
    ttl: Duration,
    slot: Mutex<Option<Entry>>,
}

struct Entry {
    stored_at: Instant,
    doc: Arc<GvlDocument>,
}

impl GvlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// The current snapshot, or `None` if nothing is stored or the stored
    /// snapshot has outlived the TTL.
    pub fn get(&self) -> Option<Arc<GvlDocument>> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref()
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .map(|e| Arc::clone(&e.doc))
    }

    /// Stores a freshly loaded document, restarting the TTL, and returns the
    /// shared snapshot.
    pub fn put(&self, doc: GvlDocument) -> Arc<GvlDocument> {
        let doc = Arc::new(doc);
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Entry {
            stored_at: Instant::now(),
            doc: Arc::clone(&doc),
        });
        doc
    }

    /// Returns the cached snapshot, or runs `load` and stores its result.
    pub fn get_or_insert_with<F, E>(&self, load: F) -> Result<Arc<GvlDocument>, E>
    where
        F: FnOnce() -> Result<GvlDocument, E>,
    {
        if let Some(doc) = self.get() {
            return Ok(doc);
        }
        Ok(self.put(load()?))
    }

    pub fn clear(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GVL_JSON: &str = r#"{
        "gvlSpecificationVersion": 2,
        "vendorListVersion": 126,
        "tcfPolicyVersion": 2,
        "lastUpdated": "2021-05-27T16:05:20Z",
        "purposes": {
            "1": {"id": 1, "name": "Store and/or access information on a device", "description": "..."}
        },
        "specialFeatures": {
            "1": {"id": 1, "name": "Use precise geolocation data", "description": "..."}
        },
        "vendors": {
            "8": {
                "id": 8,
                "name": "Emerse Sverige AB",
                "purposes": [1, 3, 4],
                "legIntPurposes": [2, 7, 8, 9],
                "flexiblePurposes": [2, 9],
                "specialPurposes": [1, 2],
                "features": [1, 2],
                "specialFeatures": [],
                "policyUrl": "https://www.emerse.com/privacy-policy/"
            },
            "80": {
                "id": 80,
                "name": "Sharethrough, Inc",
                "purposes": [1, 2],
                "legIntPurposes": [],
                "specialFeatures": [1],
                "deletedDate": "2022-11-01T00:00:00Z"
            }
        }
    }"#;

    #[test]
    fn parse_document() {
        let gvl = GvlDocument::from_json(GVL_JSON).unwrap();

        assert_eq!(gvl.vendor_list_version, 126);
        assert_eq!(gvl.vendors.len(), 2);

        let vendor = gvl.vendor(8).unwrap();
        assert_eq!(vendor.name, "Emerse Sverige AB");
        assert_eq!(vendor.purposes, vec![1, 3, 4]);
        assert_eq!(vendor.leg_int_purposes, vec![2, 7, 8, 9]);
        assert_eq!(vendor.special_purposes, vec![1, 2]);
        assert!(vendor.special_features.is_empty());
        assert!(vendor.deleted_date.is_none());

        let deleted = gvl.vendor(80).unwrap();
        assert!(deleted.deleted_date.is_some());
        assert!(deleted.flexible_purposes.is_empty());

        assert!(gvl.vendor(9999).is_none());
        assert_eq!(
            gvl.purposes.get(&1).unwrap().name,
            "Store and/or access information on a device"
        );
    }

    #[test]
    fn parse_minimal_document() {
        let gvl = GvlDocument::from_json(r#"{"vendors": {}}"#).unwrap();
        assert!(gvl.vendors.is_empty());
        assert_eq!(gvl.vendor_list_version, 0);
    }

    #[test]
    fn reject_malformed_document() {
        assert!(GvlDocument::from_json(r#"{"vendors": [1, 2]}"#).is_err());
    }

    #[test]
    fn cache_hit_within_ttl() {
        let cache = GvlCache::new(Duration::from_secs(3600));
        assert!(cache.get().is_none());

        let stored = cache.put(GvlDocument::from_json(GVL_JSON).unwrap());
        let got = cache.get().expect("fresh snapshot");
        assert!(Arc::ptr_eq(&stored, &got));

        cache.clear();
        assert!(cache.get().is_none());
    }

    #[test]
    fn cache_expires_after_ttl() {
        let cache = GvlCache::new(Duration::ZERO);
        cache.put(GvlDocument::default());
        assert!(cache.get().is_none());
    }

    #[test]
    fn get_or_insert_loads_once() {
        let cache = GvlCache::new(Duration::from_secs(3600));
        let mut loads = 0;

        for _ in 0..3 {
            let doc: Result<_, serde_json::Error> = cache.get_or_insert_with(|| {
                loads += 1;
                GvlDocument::from_json(GVL_JSON)
            });
            assert_eq!(doc.unwrap().vendor_list_version, 126);
        }

        assert_eq!(loads, 1);
    }
}
