//! Entity → response shape.

use org_catalog_core::Organization;
use org_catalog_types::{ActivityResponse, BuildingResponse, OrganizationResponse, PhoneResponse};

pub fn organization_response(org: &Organization) -> OrganizationResponse {
    OrganizationResponse {
        id: org.id,
        name: org.name.clone(),
        building: BuildingResponse {
            id: org.building.id,
            address: org.building.address.clone(),
            location: org.building.location.as_lon_lat(),
        },
        phones: org
            .phones
            .iter()
            .map(|p| PhoneResponse {
                phone: p.number.clone(),
            })
            .collect(),
        activity: org
            .activities
            .iter()
            .map(|a| ActivityResponse {
                name: a.name.clone(),
            })
            .collect(),
    }
}

pub fn organization_list(orgs: &[Organization]) -> Vec<OrganizationResponse> {
    orgs.iter().map(organization_response).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use org_catalog_core::{Activity, Building, GeoPoint, PhoneNumber};

    #[test]
    fn maps_all_relations() {
        let org = Organization {
            id: 1,
            name: "Verysell АО".into(),
            building: Building {
                id: 11,
                address: "Задонск, Братцевская, д. 95".into(),
                location: GeoPoint::new(-52.105232, -9.719463),
            },
            phones: vec![PhoneNumber {
                id: 3,
                number: "+7 (183) 468-16-28".into(),
            }],
            activities: vec![Activity {
                id: 1,
                name: "Еда".into(),
                parent_id: None,
                level: 1,
            }],
        };
        let resp = organization_response(&org);
        assert_eq!(resp.building.location, (-52.105232, -9.719463));
        assert_eq!(resp.phones[0].phone, "+7 (183) 468-16-28");
        assert_eq!(resp.activity[0].name, "Еда");

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["building"]["id"], 11);
        assert_eq!(json["activity"][0]["name"], "Еда");
    }

    #[test]
    fn empty_relations_stay_empty_lists() {
        let org = Organization {
            id: 2,
            name: "x".into(),
            building: Building {
                id: 1,
                address: "a".into(),
                location: GeoPoint::new(0.0, 0.0),
            },
            phones: vec![],
            activities: vec![],
        };
        let json = serde_json::to_value(organization_response(&org)).unwrap();
        assert_eq!(json["phones"], serde_json::json!([]));
        assert_eq!(json["activity"], serde_json::json!([]));
    }
}
