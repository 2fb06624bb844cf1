//! Path selection for a vehicle.

use super::types::{SavedPath, Vehicle, Waypoint};

/// Fewest waypoints that still form one segment.
pub const MIN_PATH_LEN: usize = 2;

/// Pick the waypoints a vehicle should follow.
///
/// An inline path with at least two waypoints wins. Otherwise the first saved
/// path keyed by the vehicle's id is used if it has at least two waypoints.
/// `None` means the vehicle cannot be simulated this run.
pub fn resolve<'a>(vehicle: &'a Vehicle, saved_paths: &'a [SavedPath]) -> Option<&'a [Waypoint]> {
    if vehicle.path.len() >= MIN_PATH_LEN {
        return Some(&vehicle.path);
    }

    saved_paths
        .iter()
        .find(|saved| saved.vehicle_id == vehicle.id)
        .map(|saved| saved.path.as_slice())
        .filter(|path| path.len() >= MIN_PATH_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(id: &str, path: Vec<Waypoint>) -> Vehicle {
        Vehicle {
            id: id.to_string(),
            path,
            ip: None,
            port: None,
            target: None,
        }
    }

    fn saved(id: &str, path: Vec<Waypoint>) -> SavedPath {
        SavedPath {
            vehicle_id: id.to_string(),
            path,
            log_file: None,
        }
    }

    #[test]
    fn inline_path_beats_saved_path() {
        let v = vehicle("ambulance", vec![Waypoint::at(1.0, 1.0), Waypoint::at(2.0, 2.0)]);
        let saved = vec![saved("ambulance", vec![Waypoint::at(9.0, 9.0), Waypoint::at(8.0, 8.0)])];
        let path = resolve(&v, &saved).expect("path");
        assert_eq!(path[0].lat, 1.0);
    }

    #[test]
    fn falls_back_to_matching_saved_path() {
        let v = vehicle("bus", vec![Waypoint::at(1.0, 1.0)]);
        let saved = vec![
            saved("car", vec![Waypoint::at(5.0, 5.0), Waypoint::at(6.0, 6.0)]),
            saved("bus", vec![Waypoint::at(9.0, 9.0), Waypoint::at(8.0, 8.0), Waypoint::at(7.0, 7.0)]),
        ];
        let path = resolve(&v, &saved).expect("path");
        assert_eq!(path.len(), 3);
        assert_eq!(path[0].lat, 9.0);
    }

    #[test]
    fn no_path_without_usable_source() {
        let v = vehicle("truck", vec![Waypoint::at(1.0, 1.0)]);
        assert!(resolve(&v, &[]).is_none());

        let others = vec![saved("car", vec![Waypoint::at(5.0, 5.0), Waypoint::at(6.0, 6.0)])];
        assert!(resolve(&v, &others).is_none());

        let short = vec![saved("truck", vec![Waypoint::at(5.0, 5.0)])];
        assert!(resolve(&v, &short).is_none());
    }

    #[test]
    fn empty_inline_path_uses_saved_path() {
        let v = vehicle("taxi", Vec::new());
        let saved = vec![saved("taxi", vec![Waypoint::at(0.0, 0.0), Waypoint::at(0.1, 0.1)])];
        assert_eq!(resolve(&v, &saved).map(<[Waypoint]>::len), Some(2));
    }
}
