//! Sample data seeding.
//!
//! Clears every table and refills the directory with a deterministic data
//! set: seven buildings, a three-level activity tree, and ten organizations.
//! Used by the `populate_db` binary.

use std::collections::HashMap;
use tracing::info;

use crate::db::{Database, DbError, NewOrganization};

/// Counts of what was inserted.
#[derive(Debug, Clone, Copy)]
pub struct SeedSummary {
    pub buildings: usize,
    pub activities: usize,
    pub organizations: usize,
    pub phones: usize,
}

const BUILDINGS: &[(&str, f64, f64)] = &[
    ("221B Baker Street, London", 51.523_77, -0.158_54),
    ("10 Queen Street, London", 51.503_36, -0.127_59),
    ("1 Princes Street, Edinburgh", 55.953_25, -3.188_27),
    ("100 Market Street, Manchester", 53.483_07, -2.242_01),
    ("15 New Street, Birmingham", 52.481_42, -1.899_83),
    ("2 Castle Road, York", 53.959_01, -1.081_53),
    ("8 Harbour Lane, Bristol", 51.454_51, -2.587_91),
];

/// `(name, parent name)` pairs; roots have no parent. Order matters: parents
/// first.
const ACTIVITIES: &[(&str, Option<&str>)] = &[
    ("Food", None),
    ("Automotive", None),
    ("Education", None),
    ("Healthcare", None),
    ("Services", None),
    ("Meat products", Some("Food")),
    ("Dairy products", Some("Food")),
    ("Bakery", Some("Food")),
    ("Confectionery", Some("Food")),
    ("Trucks", Some("Automotive")),
    ("Passenger cars", Some("Automotive")),
    ("Motorcycles", Some("Automotive")),
    ("Schools", Some("Education")),
    ("Higher education", Some("Education")),
    ("Courses and training", Some("Education")),
    ("Dentistry", Some("Healthcare")),
    ("General practice", Some("Healthcare")),
    ("Surgery", Some("Healthcare")),
    ("Cleaning", Some("Services")),
    ("Repairs", Some("Services")),
    ("Consulting", Some("Services")),
    ("Spare parts", Some("Passenger cars")),
    ("Accessories", Some("Passenger cars")),
    ("Tyres", Some("Passenger cars")),
    ("Plumbing", Some("Repairs")),
    ("Electrical", Some("Repairs")),
    ("Finishing works", Some("Repairs")),
    ("Pediatric dentistry", Some("Dentistry")),
    ("Orthodontics", Some("Dentistry")),
    ("Implantology", Some("Dentistry")),
];

/// `(name, building index, phones, activity names)`.
#[allow(clippy::type_complexity)]
const ORGANIZATIONS: &[(&str, usize, &[&str], &[&str])] = &[
    (
        "Horn & Hoof Ltd",
        0,
        &["+44-20-7946-0101", "+44-20-7946-0102"],
        &["Meat products", "Dairy products"],
    ),
    (
        "Baker & Sons",
        1,
        &["+44-20-7946-0201"],
        &["Bakery"],
    ),
    (
        "AutoParts Plus",
        2,
        &["+44-131-496-0301", "+44-131-496-0302", "8-800-555-35-35"],
        &["Spare parts", "Accessories"],
    ),
    (
        "White Smile Dental Clinic",
        3,
        &["+44-161-496-0401"],
        &["Dentistry", "Pediatric dentistry", "Orthodontics"],
    ),
    (
        "Premium Motors",
        4,
        &["+44-121-496-0501", "+44-121-496-0502"],
        &["Passenger cars"],
    ),
    (
        "Knowledge Training Centre",
        5,
        &["+44-1904-496-0601"],
        &["Courses and training", "Consulting"],
    ),
    (
        "Sparkle Cleaning Company",
        6,
        &["+44-117-496-0701"],
        &["Cleaning"],
    ),
    (
        "BuildMaster Ltd",
        0,
        &["+44-20-7946-0801", "+44-20-7946-0802"],
        &["Repairs", "Plumbing", "Electrical", "Finishing works"],
    ),
    (
        "Health First Medical Centre",
        1,
        &["+44-20-7946-0901"],
        &["General practice", "Surgery"],
    ),
    (
        "Sweet Haven Confectionery",
        2,
        &["+44-131-496-1001"],
        &["Confectionery"],
    ),
];

/// Clear all tables and insert the sample data set.
pub async fn populate(db: &Database) -> Result<SeedSummary, DbError> {
    clear(db).await?;

    info!("Creating buildings");
    let mut building_ids = Vec::with_capacity(BUILDINGS.len());
    for (address, latitude, longitude) in BUILDINGS {
        let building = db.buildings().create(address, *latitude, *longitude).await?;
        building_ids.push(building.id);
    }
    info!(count = building_ids.len(), "Buildings created");

    info!("Creating activities");
    let mut activity_ids: HashMap<&str, i64> = HashMap::new();
    for (name, parent) in ACTIVITIES {
        let parent_id = parent.map(|p| activity_ids[p]);
        let record = db.activities().create(name, parent_id).await?;
        activity_ids.insert(*name, record.id);
    }
    info!(count = activity_ids.len(), "Activities created");

    info!("Creating organizations");
    let mut phones = 0;
    for (name, building_idx, phone_numbers, activity_names) in ORGANIZATIONS {
        phones += phone_numbers.len();
        db.organizations()
            .create(&NewOrganization {
                name: (*name).to_string(),
                building_id: building_ids[*building_idx],
                phone_numbers: phone_numbers.iter().map(|p| (*p).to_string()).collect(),
                activity_ids: activity_names.iter().map(|a| activity_ids[a]).collect(),
            })
            .await?;
    }
    info!(count = ORGANIZATIONS.len(), phones, "Organizations created");

    Ok(SeedSummary {
        buildings: building_ids.len(),
        activities: activity_ids.len(),
        organizations: ORGANIZATIONS.len(),
        phones,
    })
}

/// Delete all rows, children before parents.
async fn clear(db: &Database) -> Result<(), DbError> {
    info!("Clearing existing data");
    for table in [
        "organization_phones",
        "organization_activities",
        "organizations",
        "activities",
        "buildings",
    ] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(db.pool())
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_parents_precede_children() {
        let mut seen = std::collections::HashSet::new();
        for (name, parent) in ACTIVITIES {
            if let Some(parent) = parent {
                assert!(seen.contains(parent), "parent {parent} after child {name}");
            }
            seen.insert(*name);
        }
    }

    #[test]
    fn organizations_reference_known_activities_and_buildings() {
        let names: std::collections::HashSet<&str> =
            ACTIVITIES.iter().map(|(name, _)| *name).collect();
        for (org, building_idx, phone_numbers, activity_names) in ORGANIZATIONS {
            assert!(*building_idx < BUILDINGS.len(), "{org}: bad building index");
            assert!(!phone_numbers.is_empty(), "{org}: no phones");
            for activity in *activity_names {
                assert!(names.contains(activity), "{org}: unknown activity {activity}");
            }
        }
    }

    #[test]
    fn seed_phone_numbers_are_valid() {
        for (org, _, phone_numbers, _) in ORGANIZATIONS {
            for phone in *phone_numbers {
                assert!(
                    phone.starts_with('+') || phone.starts_with('8'),
                    "{org}: invalid phone {phone}"
                );
            }
        }
    }

    #[test]
    fn seed_coordinates_are_valid() {
        for (address, latitude, longitude) in BUILDINGS {
            assert!(
                crate::geo::valid_coordinates(*latitude, *longitude),
                "bad coordinates for {address}"
            );
        }
    }
}
