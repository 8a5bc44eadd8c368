use serde::{Deserialize, Serialize};

use crate::MarkerId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box in the host's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Edges count as inside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }

    pub fn area(&self) -> f64 {
        (self.right - self.left).max(0.0) * (self.bottom - self.top).max(0.0)
    }
}

/// On-screen bounds of one marker fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerBounds {
    pub marker_id: MarkerId,
    pub rect: Rect,
}

/// Picks the annotation a click was meant for.
///
/// Among candidates containing the point, the first one whose point lies
/// outside every candidate of a different marker wins. Failing that, the
/// smallest box wins, the earliest on ties.
pub fn resolve_click(point: Point, candidates: &[MarkerBounds]) -> Option<MarkerId> {
    let hits: Vec<&MarkerBounds> = candidates
        .iter()
        .filter(|candidate| candidate.rect.contains(point))
        .collect();

    match hits.as_slice() {
        [] => None,
        [only] => Some(only.marker_id.clone()),
        _ => {
            let unique = hits.iter().find(|hit| {
                hits.iter()
                    .filter(|other| other.marker_id != hit.marker_id)
                    .all(|other| !other.rect.contains(point))
            });
            let chosen = unique.or_else(|| {
                hits.iter().reduce(|best, hit| {
                    if hit.rect.area() < best.rect.area() {
                        hit
                    } else {
                        best
                    }
                })
            })?;
            Some(chosen.marker_id.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(id: &str, rect: Rect) -> MarkerBounds {
        MarkerBounds {
            marker_id: MarkerId::new(id),
            rect,
        }
    }

    #[test]
    fn miss_resolves_to_none() {
        let candidates = [bounds("a", Rect::new(0.0, 0.0, 10.0, 10.0))];
        assert_eq!(resolve_click(Point::new(20.0, 20.0), &candidates), None);
        assert_eq!(resolve_click(Point::new(0.0, 0.0), &[]), None);
    }

    #[test]
    fn single_hit_wins() {
        let candidates = [
            bounds("a", Rect::new(0.0, 0.0, 10.0, 10.0)),
            bounds("b", Rect::new(50.0, 0.0, 60.0, 10.0)),
        ];
        assert_eq!(
            resolve_click(Point::new(55.0, 5.0), &candidates),
            Some(MarkerId::new("b"))
        );
    }

    #[test]
    fn edges_are_inclusive() {
        let candidates = [bounds("a", Rect::new(0.0, 0.0, 10.0, 10.0))];
        assert_eq!(
            resolve_click(Point::new(10.0, 10.0), &candidates),
            Some(MarkerId::new("a"))
        );
    }

    #[test]
    fn intersection_picks_smaller_box() {
        let candidates = [
            bounds("wide", Rect::new(0.0, 0.0, 100.0, 20.0)),
            bounds("narrow", Rect::new(40.0, 0.0, 60.0, 20.0)),
        ];
        assert_eq!(
            resolve_click(Point::new(50.0, 10.0), &candidates),
            Some(MarkerId::new("narrow"))
        );
    }

    #[test]
    fn fragments_of_one_marker_do_not_compete() {
        // Two line boxes of one annotation overlap a third marker elsewhere
        let candidates = [
            bounds("a", Rect::new(0.0, 0.0, 100.0, 12.0)),
            bounds("a", Rect::new(0.0, 10.0, 40.0, 22.0)),
            bounds("b", Rect::new(80.0, 0.0, 120.0, 12.0)),
        ];
        assert_eq!(
            resolve_click(Point::new(20.0, 11.0), &candidates),
            Some(MarkerId::new("a"))
        );
    }

    #[test]
    fn equal_areas_tie_to_first() {
        let candidates = [
            bounds("first", Rect::new(0.0, 0.0, 10.0, 10.0)),
            bounds("second", Rect::new(0.0, 0.0, 10.0, 10.0)),
        ];
        assert_eq!(
            resolve_click(Point::new(5.0, 5.0), &candidates),
            Some(MarkerId::new("first"))
        );
    }
}
