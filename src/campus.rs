//! Static campus hierarchy: campus, buildings, rooms.
//!
//! Used purely for lookup when aggregating or scoping; never mutated at
//! runtime. The room-to-building index is precomputed once at construction
//! so scope resolution is O(1) per sample instead of a linear scan of the
//! structure on every call.

use serde::Serialize;
use std::collections::HashMap;

/// A room with a metered circuit.
#[derive(Debug, Clone, Serialize)]
pub struct Room {
    pub id: String,
    pub name: String,
}

/// A building containing metered rooms.
#[derive(Debug, Clone, Serialize)]
pub struct Building {
    pub id: String,
    pub name: String,
    pub rooms: Vec<Room>,
}

/// The campus: a fixed hierarchy of buildings and rooms.
#[derive(Debug, Clone, Serialize)]
pub struct CampusStructure {
    pub name: String,
    pub buildings: Vec<Building>,

    /// room id -> building id, built once at construction.
    #[serde(skip)]
    room_to_building: HashMap<String, String>,
}

impl CampusStructure {
    /// Build a campus, precomputing the room-to-building index.
    pub fn new(name: impl Into<String>, buildings: Vec<Building>) -> Self {
        let mut room_to_building = HashMap::new();
        for building in &buildings {
            for room in &building.rooms {
                room_to_building.insert(room.id.clone(), building.id.clone());
            }
        }
        Self {
            name: name.into(),
            buildings,
            room_to_building,
        }
    }

    /// The building a room belongs to, if the room exists.
    pub fn building_of_room(&self, room_id: &str) -> Option<&Building> {
        let building_id = self.room_to_building.get(room_id)?;
        self.building_by_id(building_id)
    }

    /// Look up a building by id.
    pub fn building_by_id(&self, building_id: &str) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == building_id)
    }

    /// Look up a room by id across all buildings.
    pub fn room_by_id(&self, room_id: &str) -> Option<&Room> {
        self.buildings
            .iter()
            .flat_map(|b| b.rooms.iter())
            .find(|r| r.id == room_id)
    }

    /// Iterate over all rooms in structure order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.buildings.iter().flat_map(|b| b.rooms.iter())
    }

    /// Whether a room belongs to the given building.
    pub fn room_in_building(&self, room_id: &str, building_id: &str) -> bool {
        self.room_to_building
            .get(room_id)
            .is_some_and(|b| b == building_id)
    }
}

impl Default for CampusStructure {
    /// The reference campus used for generated data.
    fn default() -> Self {
        let building = |id: &str, name: &str, rooms: &[(&str, &str)]| Building {
            id: id.to_string(),
            name: name.to_string(),
            rooms: rooms
                .iter()
                .map(|(rid, rname)| Room {
                    id: rid.to_string(),
                    name: rname.to_string(),
                })
                .collect(),
        };

        CampusStructure::new(
            "Green Valley University",
            vec![
                building(
                    "engineering",
                    "Engineering Block",
                    &[
                        ("eng-lab1", "Computer Lab 1"),
                        ("eng-lab2", "Electronics Lab"),
                        ("eng-lecture1", "Lecture Hall A"),
                        ("eng-lecture2", "Lecture Hall B"),
                        ("eng-office", "Faculty Offices"),
                    ],
                ),
                building(
                    "library",
                    "Central Library",
                    &[
                        ("lib-reading1", "Reading Room 1"),
                        ("lib-reading2", "Reading Room 2"),
                        ("lib-computer", "Computer Zone"),
                        ("lib-admin", "Admin Office"),
                    ],
                ),
                building(
                    "hostel",
                    "Student Hostel A",
                    &[
                        ("hostel-floor1", "Floor 1 (20 rooms)"),
                        ("hostel-floor2", "Floor 2 (20 rooms)"),
                        ("hostel-floor3", "Floor 3 (20 rooms)"),
                        ("hostel-common", "Common Area"),
                    ],
                ),
                building(
                    "admin",
                    "Administration Building",
                    &[
                        ("admin-main", "Main Office"),
                        ("admin-hr", "HR Department"),
                        ("admin-finance", "Finance Department"),
                        ("admin-meeting", "Meeting Rooms"),
                    ],
                ),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_campus_shape() {
        let campus = CampusStructure::default();

        assert_eq!(campus.buildings.len(), 4);
        assert_eq!(campus.rooms().count(), 17);
    }

    #[test]
    fn test_room_to_building_index() {
        let campus = CampusStructure::default();

        let building = campus.building_of_room("lib-computer").unwrap();
        assert_eq!(building.id, "library");

        assert!(campus.building_of_room("no-such-room").is_none());
        assert!(campus.room_in_building("eng-lab1", "engineering"));
        assert!(!campus.room_in_building("eng-lab1", "library"));
    }

    #[test]
    fn test_room_lookup() {
        let campus = CampusStructure::default();

        assert_eq!(campus.room_by_id("admin-hr").unwrap().name, "HR Department");
        assert!(campus.room_by_id("missing").is_none());
    }
}
