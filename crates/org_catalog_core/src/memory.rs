//! In-memory `CatalogStore`.
//!
//! Flat tables plus the activity arena behind a tokio `RwLock`. Reads take
//! the shared lock only; the cascade deletes take the exclusive one.
//! BTreeMap ordering gives the lowest-id tie-break for free.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::{
    activity_tree::{ActivityLoad, ActivityNode, ActivityTree, Children},
    error::{CatalogError, Result},
    geo::{Envelope, RadiusQuery},
    ports::CatalogStore,
    seeds::CatalogSeed,
    types::{
        Activity, ActivityId, Building, BuildingId, GeoPoint, Organization, OrganizationId,
        PhoneNumber, PhoneNumberId,
    },
};

#[derive(Debug, Clone)]
struct OrganizationRecord {
    name: String,
    building_id: BuildingId,
}

#[derive(Debug, Clone)]
struct PhoneRecord {
    number: String,
    organization_id: OrganizationId,
}

#[derive(Debug, Default)]
struct Tables {
    buildings: BTreeMap<BuildingId, Building>,
    organizations: BTreeMap<OrganizationId, OrganizationRecord>,
    phones: BTreeMap<PhoneNumberId, PhoneRecord>,
    /// `(organization_id, activity_id)`
    organization_activity: BTreeSet<(OrganizationId, ActivityId)>,
    activities: ActivityTree,
}

impl Tables {
    fn hydrate(&self, id: OrganizationId) -> Result<Option<Organization>> {
        let Some(record) = self.organizations.get(&id) else {
            return Ok(None);
        };
        let building = self
            .buildings
            .get(&record.building_id)
            .cloned()
            .ok_or_else(|| {
                CatalogError::Storage(anyhow::anyhow!(
                    "organization {id} references missing building {}",
                    record.building_id
                ))
            })?;
        let phones = self
            .phones
            .iter()
            .filter(|(_, p)| p.organization_id == id)
            .map(|(phone_id, p)| PhoneNumber {
                id: *phone_id,
                number: p.number.clone(),
            })
            .collect();
        let activities = self
            .organization_activity
            .range((id, ActivityId::MIN)..=(id, ActivityId::MAX))
            .filter_map(|(_, activity_id)| self.activities.get(*activity_id).cloned())
            .collect();
        Ok(Some(Organization {
            id,
            name: record.name.clone(),
            building,
            phones,
            activities,
        }))
    }

    fn hydrate_all(&self, ids: impl IntoIterator<Item = OrganizationId>) -> Result<Vec<Organization>> {
        let mut out = Vec::new();
        for id in ids {
            if let Some(org) = self.hydrate(id)? {
                out.push(org);
            }
        }
        Ok(out)
    }

    fn organizations_where(&self, pred: impl Fn(&Building) -> bool) -> Result<Vec<Organization>> {
        let ids: Vec<OrganizationId> = self
            .organizations
            .iter()
            .filter(|(_, record)| self.buildings.get(&record.building_id).is_some_and(&pred))
            .map(|(id, _)| *id)
            .collect();
        self.hydrate_all(ids)
    }

    fn organizations_of_activity(&self, activity_id: ActivityId) -> Result<Vec<Organization>> {
        let ids: Vec<OrganizationId> = self
            .organization_activity
            .iter()
            .filter(|(_, a)| *a == activity_id)
            .map(|(o, _)| *o)
            .collect();
        self.hydrate_all(ids)
    }

    fn resolve_node(&self, activity: &Activity, load: ActivityLoad) -> Result<ActivityNode> {
        let organizations = self.organizations_of_activity(activity.id)?;
        let children = match load {
            ActivityLoad::NodeOnly => Children::NotLoaded,
            ActivityLoad::WithDescendants => {
                let mut nodes = Vec::new();
                for child_id in self.activities.children_of(activity.id) {
                    if let Some(child) = self.activities.get(*child_id) {
                        nodes.push(self.resolve_node(child, load)?);
                    }
                }
                Children::Loaded(nodes)
            }
        };
        Ok(ActivityNode {
            activity: activity.clone(),
            organizations,
            children,
        })
    }
}

pub struct MemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl MemoryCatalogStore {
    pub fn empty() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Load and validate a seed: activity tree invariants, building
    /// references, activity references, unique ids.
    pub fn from_seed(seed: CatalogSeed) -> Result<Self> {
        let mut tables = Tables::default();

        for b in seed.buildings {
            let location = GeoPoint::new(b.longitude, b.latitude);
            if !(-180.0..=180.0).contains(&b.longitude) || !(-90.0..=90.0).contains(&b.latitude) {
                return Err(CatalogError::InvalidGeometry(format!(
                    "building {} location ({}, {}) is outside SRID 4326 bounds",
                    b.id, b.longitude, b.latitude
                )));
            }
            let building = Building {
                id: b.id,
                address: b.address,
                location,
            };
            if tables.buildings.insert(b.id, building).is_some() {
                return Err(CatalogError::InvalidInput(format!("duplicate building id {}", b.id)));
            }
        }

        tables.activities = ActivityTree::from_activities(
            seed.activities
                .into_iter()
                .map(|a| Activity {
                    id: a.id,
                    name: a.name,
                    parent_id: a.parent_id,
                    level: a.level,
                })
                .collect(),
        )?;

        let mut next_phone_id: PhoneNumberId = 1;
        for o in seed.organizations {
            if !tables.buildings.contains_key(&o.building_id) {
                return Err(CatalogError::InvalidInput(format!(
                    "organization {} references missing building {}",
                    o.id, o.building_id
                )));
            }
            if let Some(missing) = o
                .activity_ids
                .iter()
                .find(|a| tables.activities.get(**a).is_none())
            {
                return Err(CatalogError::InvalidInput(format!(
                    "organization {} references missing activity {missing}",
                    o.id
                )));
            }
            let record = OrganizationRecord {
                name: o.name,
                building_id: o.building_id,
            };
            if tables.organizations.insert(o.id, record).is_some() {
                return Err(CatalogError::InvalidInput(format!(
                    "duplicate organization id {}",
                    o.id
                )));
            }
            for activity_id in o.activity_ids {
                tables.organization_activity.insert((o.id, activity_id));
            }
            for number in o.phones {
                tables.phones.insert(
                    next_phone_id,
                    PhoneRecord {
                        number,
                        organization_id: o.id,
                    },
                );
                next_phone_id += 1;
            }
        }

        info!(
            buildings = tables.buildings.len(),
            organizations = tables.organizations.len(),
            activities = tables.activities.len(),
            "in-memory catalog loaded"
        );
        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    // ── Administrative cascades ─────────────────────────────────

    /// Delete an activity, its whole subtree, and their association rows.
    /// Returns the number of activities removed.
    pub async fn delete_activity(&self, id: ActivityId) -> usize {
        let mut tables = self.tables.write().await;
        let removed: BTreeSet<ActivityId> = tables.activities.remove_subtree(id).into_iter().collect();
        tables
            .organization_activity
            .retain(|(_, a)| !removed.contains(a));
        removed.len()
    }

    /// Delete an organization with its phones and association rows.
    pub async fn delete_organization(&self, id: OrganizationId) -> bool {
        let mut tables = self.tables.write().await;
        Self::cascade_organization(&mut tables, id)
    }

    /// Delete a building and every organization in it.
    /// Returns the number of organizations removed.
    pub async fn delete_building(&self, id: BuildingId) -> usize {
        let mut tables = self.tables.write().await;
        if tables.buildings.remove(&id).is_none() {
            return 0;
        }
        let org_ids: Vec<OrganizationId> = tables
            .organizations
            .iter()
            .filter(|(_, o)| o.building_id == id)
            .map(|(oid, _)| *oid)
            .collect();
        for oid in &org_ids {
            Self::cascade_organization(&mut tables, *oid);
        }
        org_ids.len()
    }

    fn cascade_organization(tables: &mut Tables, id: OrganizationId) -> bool {
        if tables.organizations.remove(&id).is_none() {
            return false;
        }
        tables.phones.retain(|_, p| p.organization_id != id);
        tables.organization_activity.retain(|(o, _)| *o != id);
        true
    }

    pub async fn phone_count(&self) -> usize {
        self.tables.read().await.phones.len()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn organization_by_id(&self, id: OrganizationId) -> Result<Option<Organization>> {
        self.tables.read().await.hydrate(id)
    }

    async fn organization_by_name(&self, name: &str) -> Result<Option<Organization>> {
        let tables = self.tables.read().await;
        match tables.organizations.iter().find(|(_, o)| o.name == name) {
            Some((id, _)) => tables.hydrate(*id),
            None => Ok(None),
        }
    }

    async fn organizations_by_building(
        &self,
        building_id: BuildingId,
    ) -> Result<Vec<Organization>> {
        self.tables
            .read()
            .await
            .organizations_where(|b| b.id == building_id)
    }

    async fn activity_by_name(
        &self,
        name: &str,
        load: ActivityLoad,
    ) -> Result<Option<ActivityNode>> {
        let tables = self.tables.read().await;
        match tables.activities.find_by_name(name) {
            Some(activity) => tables.resolve_node(activity, load).map(Some),
            None => Ok(None),
        }
    }

    async fn organizations_in_envelope(&self, envelope: &Envelope) -> Result<Vec<Organization>> {
        self.tables
            .read()
            .await
            .organizations_where(|b| envelope.covers(b.location))
    }

    async fn organizations_in_radius(&self, query: &RadiusQuery) -> Result<Vec<Organization>> {
        self.tables
            .read()
            .await
            .organizations_where(|b| query.contains(b.location))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> CatalogSeed {
        CatalogSeed::new()
            .building(1, "Москва, Ленина, д. 1", 37.6, 55.7)
            .building(2, "Москва, Мира, д. 2", 37.7, 55.8)
            .activity(1, "Еда", None)
            .activity(2, "Молочная продукция", Some(1))
            .activity(3, "Сыры", Some(2))
            .organization(10, "Молокозавод", 1, &[2], &["1-111", "2-222"])
            .organization(11, "Сыроварня", 2, &[3, 1], &[])
    }

    #[tokio::test]
    async fn hydrates_relations() {
        let store = MemoryCatalogStore::from_seed(seed()).unwrap();
        let org = store.organization_by_id(10).await.unwrap().unwrap();
        assert_eq!(org.building.id, 1);
        assert_eq!(org.phones.len(), 2);
        assert_eq!(org.activities.len(), 1);
        assert_eq!(org.activities[0].name, "Молочная продукция");

        let org = store.organization_by_id(11).await.unwrap().unwrap();
        let names: Vec<_> = org.activities.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Еда", "Сыры"]);
        assert!(org.phones.is_empty());
    }

    #[tokio::test]
    async fn rejects_dangling_references() {
        let bad = CatalogSeed::new()
            .building(1, "a", 0.0, 0.0)
            .organization(1, "x", 2, &[], &[]);
        assert!(MemoryCatalogStore::from_seed(bad).is_err());

        let bad = CatalogSeed::new()
            .building(1, "a", 0.0, 0.0)
            .organization(1, "x", 1, &[42], &[]);
        assert!(MemoryCatalogStore::from_seed(bad).is_err());

        let bad = CatalogSeed::new().building(1, "a", 200.0, 0.0);
        assert!(matches!(
            MemoryCatalogStore::from_seed(bad),
            Err(CatalogError::InvalidGeometry(_))
        ));
    }

    #[tokio::test]
    async fn deleting_activity_cascades_to_subtree_and_links() {
        let store = MemoryCatalogStore::from_seed(seed()).unwrap();
        assert_eq!(store.delete_activity(2).await, 2);

        let org = store.organization_by_id(11).await.unwrap().unwrap();
        let names: Vec<_> = org.activities.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Еда"]);
        assert!(store
            .activity_by_name("Сыры", ActivityLoad::NodeOnly)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn deleting_organization_cascades_to_phones() {
        let store = MemoryCatalogStore::from_seed(seed()).unwrap();
        assert_eq!(store.phone_count().await, 2);
        assert!(store.delete_organization(10).await);
        assert_eq!(store.phone_count().await, 0);
        assert!(store.organization_by_id(10).await.unwrap().is_none());
        assert!(!store.delete_organization(10).await);
    }

    #[tokio::test]
    async fn deleting_building_cascades_to_organizations() {
        let store = MemoryCatalogStore::from_seed(seed()).unwrap();
        assert_eq!(store.delete_building(1).await, 1);
        assert!(store.organization_by_id(10).await.unwrap().is_none());
        assert!(store.organization_by_id(11).await.unwrap().is_some());
        assert_eq!(store.phone_count().await, 0);
    }
}
