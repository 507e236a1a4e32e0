//! PostgreSQL/PostGIS implementation of `CatalogStore`.
//!
//! All SQL is runtime-checked (sqlx::query_as, not sqlx::query!) so the
//! crate builds without a live database. Every port call runs inside one
//! read-only transaction; the connection goes back to the pool when the
//! transaction is committed or dropped.

use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::debug;

use org_catalog_core::{
    geo::MAX_MERCATOR_LATITUDE, Activity, ActivityId, ActivityLoad, ActivityNode, BuildingId,
    CatalogStore, Children, Envelope, Organization, OrganizationId, PhoneNumber, RadiusQuery,
    Result,
};

use crate::sqlx_types::{
    ActivityOrganizationRow, ActivityRow, OrganizationActivityRow, OrganizationRow, PhoneRow,
};

const ORGANIZATION_SELECT: &str = r#"
    SELECT o.id, o.name, b.id AS building_id, b.address,
           ST_AsEWKB(b.location) AS location
    FROM organization o
    JOIN building b ON b.id = o.building_id
"#;

/// Web Mercator of a stored point, with latitude clamped to the projection band.
const BUILDING_MERCATOR: &str = r#"
    ST_Transform(
        ST_SetSRID(
            ST_MakePoint(
                ST_X(b.location),
                GREATEST(LEAST(ST_Y(b.location), $4), -$4)
            ),
            4326
        ),
        3857
    )
"#;

// ── PgCatalogStore ────────────────────────────────────────────

pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        tracing::info!("Closing database connection pool");
        self.pool.close().await;
    }

    async fn read_tx(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin read transaction")?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .context("Failed to mark transaction read-only")?;
        Ok(tx)
    }
}

async fn finish(tx: Transaction<'static, Postgres>) -> Result<()> {
    tx.commit()
        .await
        .context("Failed to close read transaction")?;
    Ok(())
}

/// Attach phones and activities to organization rows, preserving row order.
async fn hydrate(conn: &mut PgConnection, rows: Vec<OrganizationRow>) -> Result<Vec<Organization>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<OrganizationId> = rows.iter().map(|r| r.id).collect();

    let phone_rows = sqlx::query_as::<_, PhoneRow>(
        r#"
        SELECT id, number, organization_id
        FROM phone_number
        WHERE organization_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await
    .context("Failed to fetch phone numbers")?;

    let activity_rows = sqlx::query_as::<_, OrganizationActivityRow>(
        r#"
        SELECT oa.organization_id, a.id, a.name, a.parent_id, a.level
        FROM organization_activity oa
        JOIN activity a ON a.id = oa.activity_id
        WHERE oa.organization_id = ANY($1)
        ORDER BY a.id
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await
    .context("Failed to fetch organization activities")?;

    let mut phones: HashMap<OrganizationId, Vec<PhoneNumber>> = HashMap::new();
    for row in phone_rows {
        phones.entry(row.organization_id).or_default().push(row.into());
    }
    let mut activities: HashMap<OrganizationId, Vec<Activity>> = HashMap::new();
    for row in activity_rows {
        activities
            .entry(row.organization_id)
            .or_default()
            .push(Activity::try_from(row.activity)?);
    }

    rows.into_iter()
        .map(|row| {
            Ok(Organization {
                building: row.building()?,
                phones: phones.remove(&row.id).unwrap_or_default(),
                activities: activities.remove(&row.id).unwrap_or_default(),
                id: row.id,
                name: row.name,
            })
        })
        .collect()
}

/// Children of `root` and their children (two levels below), ordered by level then id.
async fn fetch_descendants(conn: &mut PgConnection, root: ActivityId) -> Result<Vec<Activity>> {
    let rows = sqlx::query_as::<_, ActivityRow>(
        r#"
        WITH RECURSIVE subtree AS (
            SELECT id, name, parent_id, level, 1 AS depth
            FROM activity
            WHERE parent_id = $1
            UNION ALL
            SELECT a.id, a.name, a.parent_id, a.level, s.depth + 1
            FROM activity a
            JOIN subtree s ON a.parent_id = s.id
            WHERE s.depth < 2
        )
        SELECT id, name, parent_id, level
        FROM subtree
        ORDER BY level, id
        "#,
    )
    .bind(root)
    .fetch_all(&mut *conn)
    .await
    .context("Failed to fetch activity subtree")?;
    rows.into_iter().map(Activity::try_from).collect()
}

/// Organizations attached to any of `activity_ids`, grouped by activity.
async fn organizations_by_activities(
    conn: &mut PgConnection,
    activity_ids: &[ActivityId],
) -> Result<HashMap<ActivityId, Vec<Organization>>> {
    let rows = sqlx::query_as::<_, ActivityOrganizationRow>(
        r#"
        SELECT oa.activity_id, o.id, o.name, b.id AS building_id, b.address,
               ST_AsEWKB(b.location) AS location
        FROM organization_activity oa
        JOIN organization o ON o.id = oa.organization_id
        JOIN building b ON b.id = o.building_id
        WHERE oa.activity_id = ANY($1)
        ORDER BY oa.activity_id, o.id
        "#,
    )
    .bind(activity_ids)
    .fetch_all(&mut *conn)
    .await
    .context("Failed to fetch organizations by activity")?;

    // Hydrate each organization once even when it hangs off several nodes.
    let mut links: Vec<(ActivityId, OrganizationId)> = Vec::with_capacity(rows.len());
    let mut unique: Vec<OrganizationRow> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for row in rows {
        links.push((row.activity_id, row.organization.id));
        if seen.insert(row.organization.id) {
            unique.push(row.organization);
        }
    }
    let by_id: HashMap<OrganizationId, Organization> = hydrate(conn, unique)
        .await?
        .into_iter()
        .map(|org| (org.id, org))
        .collect();

    let mut grouped: HashMap<ActivityId, Vec<Organization>> = HashMap::new();
    for (activity_id, org_id) in links {
        if let Some(org) = by_id.get(&org_id) {
            grouped.entry(activity_id).or_default().push(org.clone());
        }
    }
    Ok(grouped)
}

fn assemble_node(
    activity: Activity,
    load: ActivityLoad,
    children_of: &HashMap<ActivityId, Vec<Activity>>,
    organizations: &mut HashMap<ActivityId, Vec<Organization>>,
) -> ActivityNode {
    let own = organizations.remove(&activity.id).unwrap_or_default();
    let children = match load {
        ActivityLoad::NodeOnly => Children::NotLoaded,
        ActivityLoad::WithDescendants => Children::Loaded(
            children_of
                .get(&activity.id)
                .into_iter()
                .flatten()
                .cloned()
                .map(|child| assemble_node(child, load, children_of, organizations))
                .collect(),
        ),
    };
    ActivityNode {
        activity,
        organizations: own,
        children,
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn organization_by_id(&self, id: OrganizationId) -> Result<Option<Organization>> {
        let mut tx = self.read_tx().await?;
        let sql = format!("{ORGANIZATION_SELECT} WHERE o.id = $1");
        let rows = sqlx::query_as::<_, OrganizationRow>(&sql)
            .bind(id)
            .fetch_all(&mut *tx)
            .await
            .context("Failed to fetch organization by id")?;
        let found = hydrate(&mut tx, rows).await?.into_iter().next();
        finish(tx).await?;
        Ok(found)
    }

    async fn organization_by_name(&self, name: &str) -> Result<Option<Organization>> {
        let mut tx = self.read_tx().await?;
        let sql = format!("{ORGANIZATION_SELECT} WHERE o.name = $1 ORDER BY o.id LIMIT 1");
        let rows = sqlx::query_as::<_, OrganizationRow>(&sql)
            .bind(name)
            .fetch_all(&mut *tx)
            .await
            .context("Failed to fetch organization by name")?;
        let found = hydrate(&mut tx, rows).await?.into_iter().next();
        finish(tx).await?;
        Ok(found)
    }

    async fn organizations_by_building(
        &self,
        building_id: BuildingId,
    ) -> Result<Vec<Organization>> {
        let mut tx = self.read_tx().await?;
        let sql = format!("{ORGANIZATION_SELECT} WHERE b.id = $1 ORDER BY o.id");
        let rows = sqlx::query_as::<_, OrganizationRow>(&sql)
            .bind(building_id)
            .fetch_all(&mut *tx)
            .await
            .context("Failed to fetch organizations by building")?;
        let found = hydrate(&mut tx, rows).await?;
        finish(tx).await?;
        Ok(found)
    }

    async fn activity_by_name(
        &self,
        name: &str,
        load: ActivityLoad,
    ) -> Result<Option<ActivityNode>> {
        let mut tx = self.read_tx().await?;
        let root = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, name, parent_id, level
            FROM activity
            WHERE name = $1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to fetch activity by name")?;

        let Some(root) = root else {
            finish(tx).await?;
            return Ok(None);
        };
        let root = Activity::try_from(root)?;

        let descendants = match load {
            ActivityLoad::NodeOnly => Vec::new(),
            ActivityLoad::WithDescendants => fetch_descendants(&mut tx, root.id).await?,
        };
        let mut node_ids = vec![root.id];
        node_ids.extend(descendants.iter().map(|a| a.id));
        let mut organizations = organizations_by_activities(&mut tx, &node_ids).await?;
        finish(tx).await?;

        debug!(
            activity_id = root.id,
            descendants = descendants.len(),
            "loaded activity subtree"
        );

        let mut children_of: HashMap<ActivityId, Vec<Activity>> = HashMap::new();
        for activity in descendants {
            if let Some(parent_id) = activity.parent_id {
                children_of.entry(parent_id).or_default().push(activity);
            }
        }
        Ok(Some(assemble_node(
            root,
            load,
            &children_of,
            &mut organizations,
        )))
    }

    async fn organizations_in_envelope(&self, envelope: &Envelope) -> Result<Vec<Organization>> {
        let mut tx = self.read_tx().await?;
        let sql = format!(
            "{ORGANIZATION_SELECT} \
             WHERE ST_Covers(ST_MakeEnvelope($1, $2, $3, $4, 4326), b.location) \
             ORDER BY o.id"
        );
        let rows = sqlx::query_as::<_, OrganizationRow>(&sql)
            .bind(envelope.lon_min)
            .bind(envelope.lat_min)
            .bind(envelope.lon_max)
            .bind(envelope.lat_max)
            .fetch_all(&mut *tx)
            .await
            .context("Failed to fetch organizations in envelope")?;
        let found = hydrate(&mut tx, rows).await?;
        finish(tx).await?;
        Ok(found)
    }

    async fn organizations_in_radius(&self, query: &RadiusQuery) -> Result<Vec<Organization>> {
        let mut tx = self.read_tx().await?;
        let sql = format!(
            "{ORGANIZATION_SELECT} \
             WHERE ST_DWithin( \
                 {BUILDING_MERCATOR}, \
                 ST_Transform(ST_SetSRID(ST_MakePoint($1, $2), 4326), 3857), \
                 $3 \
             ) \
             ORDER BY o.id"
        );
        let center_lat = query
            .center
            .latitude
            .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
        let rows = sqlx::query_as::<_, OrganizationRow>(&sql)
            .bind(query.center.longitude)
            .bind(center_lat)
            .bind(query.radius_m)
            .bind(MAX_MERCATOR_LATITUDE)
            .fetch_all(&mut *tx)
            .await
            .context("Failed to fetch organizations in radius")?;
        let found = hydrate(&mut tx, rows).await?;
        finish(tx).await?;
        Ok(found)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
