//! PgCatalogStore against a live PostGIS database.
//!
//! Requires a PostgreSQL server with the postgis extension available.
//! Run with: DATABASE_URL="postgresql:///postgres" cargo test -p org_catalog_postgres --test pg_store -- --ignored

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use org_catalog_core::{
    ActivityLoad, CatalogError, CatalogService, CatalogServiceImpl, CatalogStore, Envelope,
    Organization, RadiusQuery,
};
use org_catalog_postgres::PgCatalogStore;
use sqlx::PgPool;

async fn seed(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(
        r#"
        INSERT INTO building (id, address, location) VALUES
            (1, 'corner ne', ST_GeomFromText('SRID=4326;POINT(1 1)')),
            (2, 'corner sw', ST_GeomFromText('SRID=4326;POINT(-1 -1)')),
            (3, 'center', ST_GeomFromText('SRID=4326;POINT(0 0)')),
            (4, '500 m east', ST_GeomFromText('SRID=4326;POINT(0.0045 0)')),
            (5, '2000 m east', ST_GeomFromText('SRID=4326;POINT(0.018 0)'));

        INSERT INTO activity (id, name, parent_id, level) VALUES
            (1, 'Еда', NULL, 1),
            (2, 'Молочная продукция', 1, 2),
            (3, 'Сыры', 2, 3),
            (4, 'Автомобили', NULL, 1),
            (5, 'Запчасти', 4, 2),
            (6, 'Запчасти', 4, 2);

        INSERT INTO organization (id, name, building_id) VALUES
            (1, 'Гастроном', 3),
            (2, 'Молочный двор', 1),
            (3, 'Сырная лавка', 2),
            (4, 'Ближний склад', 4),
            (5, 'Дальний склад', 5),
            (6, 'Молочный двор', 5);

        INSERT INTO organization_activity (organization_id, activity_id) VALUES
            (1, 1), (2, 2), (3, 3), (3, 2), (4, 5), (5, 6);

        INSERT INTO phone_number (id, number, organization_id) VALUES
            (1, '2-222-222', 2),
            (2, '3-333-333', 2),
            (3, '8-923-666-13-13', 1);
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

fn ids(orgs: &[Organization]) -> BTreeSet<i32> {
    orgs.iter().map(|o| o.id).collect()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostGIS"]
async fn organization_by_id_hydrates_relations(pool: PgPool) -> Result<()> {
    seed(&pool).await?;
    let store = PgCatalogStore::new(pool);

    let org = store.organization_by_id(2).await?.expect("organization 2 exists");
    assert_eq!(org.name, "Молочный двор");
    assert_eq!(org.building.location.as_lon_lat(), (1.0, 1.0));
    let phones: Vec<_> = org.phones.iter().map(|p| p.number.as_str()).collect();
    assert_eq!(phones, vec!["2-222-222", "3-333-333"]);
    assert_eq!(org.activities.len(), 1);

    assert!(store.organization_by_id(999).await?.is_none());
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostGIS"]
async fn duplicate_names_resolve_to_lowest_id(pool: PgPool) -> Result<()> {
    seed(&pool).await?;
    let store = PgCatalogStore::new(pool);

    let org = store.organization_by_name("Молочный двор").await?.expect("found");
    assert_eq!(org.id, 2);

    let node = store
        .activity_by_name("Запчасти", ActivityLoad::NodeOnly)
        .await?
        .expect("found");
    assert_eq!(node.activity.id, 5);
    assert!(node.children().is_none());
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostGIS"]
async fn activity_closure_spans_three_levels(pool: PgPool) -> Result<()> {
    seed(&pool).await?;
    let service = CatalogServiceImpl::new(Arc::new(PgCatalogStore::new(pool)));

    let node = service.get_activity("Еда", true).await?;
    let children = node.children().expect("loaded");
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].children().map(<[_]>::len), Some(1));

    let closure = service.organizations_by_activity_tree("Еда").await?;
    assert_eq!(closure.len(), 3);
    assert_eq!(ids(&closure), BTreeSet::from([1, 2, 3]));
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostGIS"]
async fn rectangle_and_radius_queries(pool: PgPool) -> Result<()> {
    seed(&pool).await?;
    let store = PgCatalogStore::new(pool);

    let env = Envelope::new(-1.0, -1.0, 1.0, 1.0)?;
    let inside = store.organizations_in_envelope(&env).await?;
    assert_eq!(ids(&inside), BTreeSet::from([1, 2, 3, 4, 5, 6]));

    let small = Envelope::new(-0.5, -0.5, 0.01, 0.5)?;
    assert_eq!(ids(&store.organizations_in_envelope(&small).await?), BTreeSet::from([1, 4]));

    let q = RadiusQuery::new(0.0, 0.0, 1000.0)?;
    assert_eq!(ids(&store.organizations_in_radius(&q).await?), BTreeSet::from([1, 4]));

    let polar = RadiusQuery::new(0.0, 90.0, 1000.0)?;
    assert!(store.organizations_in_radius(&polar).await?.is_empty());
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostGIS"]
async fn schema_enforces_tree_and_cascades(pool: PgPool) -> Result<()> {
    seed(&pool).await?;

    let too_deep = sqlx::query("INSERT INTO activity (id, name, parent_id, level) VALUES (7, 'Козьи', 3, 4)")
        .execute(&pool)
        .await;
    assert!(too_deep.is_err());

    let skipped = sqlx::query("INSERT INTO activity (id, name, parent_id, level) VALUES (8, 'x', 1, 3)")
        .execute(&pool)
        .await;
    assert!(skipped.is_err());

    sqlx::query("DELETE FROM activity WHERE id = 2").execute(&pool).await?;
    let (remaining,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM activity WHERE id IN (2, 3)")
        .fetch_one(&pool)
        .await?;
    assert_eq!(remaining, 0);

    sqlx::query("DELETE FROM organization WHERE id = 2").execute(&pool).await?;
    let (phones,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM phone_number WHERE organization_id = 2")
        .fetch_one(&pool)
        .await?;
    assert_eq!(phones, 0);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostGIS"]
async fn corrupt_geometry_surfaces_as_invalid_geometry(pool: PgPool) -> Result<()> {
    seed(&pool).await?;
    sqlx::query(
        "INSERT INTO building (id, address, location) VALUES (9, 'wrong srid', ST_GeomFromText('SRID=4326;POINT(0 0)'))",
    )
    .execute(&pool)
    .await?;
    // Force an SRID the extractor refuses, bypassing the column typmod.
    sqlx::query("ALTER TABLE building ALTER COLUMN location TYPE geometry USING location")
        .execute(&pool)
        .await?;
    sqlx::query("UPDATE building SET location = ST_SetSRID(location, 3857) WHERE id = 9")
        .execute(&pool)
        .await?;
    sqlx::query("INSERT INTO organization (id, name, building_id) VALUES (9, 'broken', 9)")
        .execute(&pool)
        .await?;

    let service = CatalogServiceImpl::new(Arc::new(PgCatalogStore::new(pool)));
    let err = service.get_by_id(9).await.unwrap_err();
    assert!(matches!(err, CatalogError::InvalidGeometry(_)));
    Ok(())
}
