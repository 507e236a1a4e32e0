//! Catalog seed: the flat, serializable form of a whole catalog.
//!
//! Loaded by the in-memory store (JSON file or built in code). The seed is
//! only a carrier; `MemoryCatalogStore::from_seed` does the validation.

use serde::{Deserialize, Serialize};

use org_catalog_types::ACTIVITY_TAXONOMY;

use crate::types::{ActivityId, BuildingId, OrganizationId, MAX_ACTIVITY_LEVEL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSeed {
    pub id: BuildingId,
    pub address: String,
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySeed {
    pub id: ActivityId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<ActivityId>,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSeed {
    pub id: OrganizationId,
    pub name: String,
    pub building_id: BuildingId,
    #[serde(default)]
    pub activity_ids: Vec<ActivityId>,
    #[serde(default)]
    pub phones: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub buildings: Vec<BuildingSeed>,
    #[serde(default)]
    pub activities: Vec<ActivitySeed>,
    #[serde(default)]
    pub organizations: Vec<OrganizationSeed>,
}

impl CatalogSeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn building(mut self, id: BuildingId, address: &str, longitude: f64, latitude: f64) -> Self {
        self.buildings.push(BuildingSeed {
            id,
            address: address.into(),
            longitude,
            latitude,
        });
        self
    }

    /// Level is derived from the parent already present in the seed
    /// (roots are level 1). An unknown parent yields level 0, which the
    /// store rejects on load.
    pub fn activity(mut self, id: ActivityId, name: &str, parent_id: Option<ActivityId>) -> Self {
        let level = match parent_id {
            None => 1,
            Some(pid) => self
                .activities
                .iter()
                .find(|a| a.id == pid)
                .map(|p| p.level.saturating_add(1))
                .unwrap_or(0),
        };
        self.activities.push(ActivitySeed {
            id,
            name: name.into(),
            parent_id,
            level,
        });
        self
    }

    pub fn organization(
        mut self,
        id: OrganizationId,
        name: &str,
        building_id: BuildingId,
        activity_ids: &[ActivityId],
        phones: &[&str],
    ) -> Self {
        self.organizations.push(OrganizationSeed {
            id,
            name: name.into(),
            building_id,
            activity_ids: activity_ids.to_vec(),
            phones: phones.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    /// Activity rows for the standard taxonomy, ids assigned breadth first
    /// from 1 (roots, then children, then grandchildren).
    pub fn with_standard_taxonomy(mut self) -> Self {
        let mut next_id = self.activities.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let mut roots = Vec::new();
        for (root, _) in ACTIVITY_TAXONOMY {
            self = self.activity(next_id, root, None);
            roots.push(next_id);
            next_id += 1;
        }
        let mut grandchildren = Vec::new();
        for ((_, children), root_id) in ACTIVITY_TAXONOMY.iter().zip(roots) {
            for (child, below) in children.iter() {
                self = self.activity(next_id, child, Some(root_id));
                grandchildren.push((next_id, *below));
                next_id += 1;
            }
        }
        for (parent_id, names) in grandchildren {
            for name in names {
                self = self.activity(next_id, name, Some(parent_id));
                next_id += 1;
            }
        }
        debug_assert!(self.activities.iter().all(|a| a.level <= MAX_ACTIVITY_LEVEL));
        self
    }

    pub fn activity_id(&self, name: &str) -> Option<ActivityId> {
        self.activities
            .iter()
            .filter(|a| a.name == name)
            .map(|a| a.id)
            .min()
    }

    /// Small demo catalog around central Moscow with the standard taxonomy.
    pub fn demo() -> Self {
        let seed = Self::new()
            .with_standard_taxonomy()
            .building(1, "Москва, Тверская, д. 7", 37.6112, 55.7602)
            .building(2, "Москва, Арбат, д. 24", 37.5915, 55.7495)
            .building(3, "Химки, Ленинградская, д. 1", 37.4450, 55.8970);
        let id = |name: &str| seed.activity_id(name).unwrap_or_default();
        let (food, dairy, meat) = (id("Еда"), id("Молочная продукция"), id("Мясная продукция"));
        let (trucks, parts, repair) = (id("Грузовые"), id("Запчасти"), id("Ремонт"));
        seed.organization(1, "Рога и Копыта", 1, &[meat], &["2-222-222", "3-333-333"])
            .organization(2, "Молочный двор", 1, &[dairy], &["8-923-666-13-13"])
            .organization(3, "Гастроном №1", 2, &[food, dairy], &[])
            .organization(4, "ГрузСервис", 3, &[trucks, repair], &["+7 (495) 100-00-00"])
            .organization(5, "АвтоДеталь", 3, &[parts], &["+7 (495) 200-00-00"])
    }
}
