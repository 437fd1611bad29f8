//! Board geometry: logical-to-pixel mapping, the mob path and placement cells.

use serde::{Deserialize, Serialize};

use crate::CellIndex;

/// Width of the board measured in pixels.
pub const BOARD_WIDTH: f32 = 1080.0;
/// Height of the board measured in pixels.
pub const BOARD_HEIGHT: f32 = 1920.0;
/// Pixel length of a single logical unit.
pub const UNIT_SIZE: f32 = 140.0;
/// Number of logical columns spanned by the board.
pub const BOARD_COLUMNS: f32 = 7.0;
/// Number of logical rows spanned by the board.
pub const BOARD_ROWS: f32 = 4.0;
/// Number of placement rows on the board.
pub const GRID_ROWS: u32 = 3;
/// Number of placement columns on the board.
pub const GRID_COLUMNS: u32 = 5;
/// Total number of placement cells.
pub const CELL_COUNT: usize = (GRID_ROWS * GRID_COLUMNS) as usize;
/// Fraction of a logical unit covered by a placement cell edge.
pub const CELL_FILL: f32 = 0.9;

const PATH_WAYPOINTS: [LogicalPoint; 4] = [
    LogicalPoint::new(0.5, 0.0),
    LogicalPoint::new(0.5, 3.5),
    LogicalPoint::new(6.5, 3.5),
    LogicalPoint::new(6.5, 0.0),
];

/// Point expressed in rational board units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogicalPoint {
    /// Horizontal coordinate, growing to the right.
    pub x: f32,
    /// Vertical coordinate, growing upward.
    pub y: f32,
}

impl LogicalPoint {
    /// Creates a new logical point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Point expressed in world pixels with the origin at the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal pixel coordinate.
    pub x: f32,
    /// Vertical pixel coordinate, growing downward.
    pub y: f32,
}

impl WorldPoint {
    /// Creates a new world point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: WorldPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Moves `step` pixels toward `target` without overshooting it.
    #[must_use]
    pub fn step_toward(self, target: WorldPoint, step: f32) -> WorldPoint {
        let distance = self.distance(target);
        if distance <= step || distance <= f32::EPSILON {
            return target;
        }
        let ratio = step / distance;
        WorldPoint::new(
            self.x + (target.x - self.x) * ratio,
            self.y + (target.y - self.y) * ratio,
        )
    }

    /// Returns the point displaced by the provided offset.
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> WorldPoint {
        WorldPoint::new(self.x + dx, self.y + dy)
    }
}

/// Linear transform from logical board units to world pixels.
///
/// The logical Y axis points upward while pixels grow downward, so the
/// vertical component is mirrored around the board height. Both axes stay
/// strictly monotonic, which keeps path waypoints and cell centers consistent
/// with each other. Coordinates outside the placement region are mapped
/// as-is; the path deliberately loops around the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridMapper {
    origin_x: f32,
    origin_y: f32,
    unit: f32,
    rows: f32,
}

impl GridMapper {
    /// Creates a mapper from an explicit origin offset, unit size and row span.
    #[must_use]
    pub const fn new(origin_x: f32, origin_y: f32, unit: f32, rows: f32) -> Self {
        Self {
            origin_x,
            origin_y,
            unit,
            rows,
        }
    }

    /// Mapper that centers a 7 x 4 unit board inside the 1080 x 1920 canvas.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(
            (BOARD_WIDTH - BOARD_COLUMNS * UNIT_SIZE) / 2.0,
            (BOARD_HEIGHT - BOARD_ROWS * UNIT_SIZE) / 2.0,
            UNIT_SIZE,
            BOARD_ROWS,
        )
    }

    /// Pixel length of one logical unit.
    #[must_use]
    pub const fn unit(&self) -> f32 {
        self.unit
    }

    /// Converts a logical point into world pixels.
    #[must_use]
    pub fn to_world(&self, point: LogicalPoint) -> WorldPoint {
        WorldPoint::new(
            self.origin_x + point.x * self.unit,
            self.origin_y + (self.rows - point.y) * self.unit,
        )
    }

    /// Converts world pixels back into logical units.
    #[must_use]
    pub fn to_logical(&self, point: WorldPoint) -> LogicalPoint {
        LogicalPoint::new(
            (point.x - self.origin_x) / self.unit,
            self.rows - (point.y - self.origin_y) / self.unit,
        )
    }
}

/// Ordered route walked by mobs from spawn to the defended line.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Path {
    waypoints: Vec<WorldPoint>,
}

impl Path {
    /// Creates a path from world waypoints, requiring at least two of them.
    #[must_use]
    pub fn new(waypoints: Vec<WorldPoint>) -> Option<Self> {
        if waypoints.len() < 2 {
            return None;
        }
        Some(Self { waypoints })
    }

    /// Fixed inverted-U route that wraps around the placement grid.
    #[must_use]
    pub fn standard(mapper: &GridMapper) -> Self {
        Self {
            waypoints: PATH_WAYPOINTS
                .iter()
                .map(|point| mapper.to_world(*point))
                .collect(),
        }
    }

    /// Waypoints in travel order.
    #[must_use]
    pub fn waypoints(&self) -> &[WorldPoint] {
        &self.waypoints
    }

    /// Spawn position of the path.
    #[must_use]
    pub fn start(&self) -> WorldPoint {
        self.waypoints[0]
    }

    /// Total travel distance from the first to the last waypoint.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }
}

/// Geometry of a single placement cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlacementCell {
    /// Stable index of the cell.
    pub index: CellIndex,
    /// Left edge in pixels.
    pub x: f32,
    /// Top edge in pixels.
    pub y: f32,
    /// Width in pixels.
    pub w: f32,
    /// Height in pixels.
    pub h: f32,
    /// Horizontal center, used as projectile origin.
    pub cx: f32,
    /// Vertical center, used as projectile origin.
    pub cy: f32,
}

impl PlacementCell {
    /// Center point of the cell.
    #[must_use]
    pub const fn center(&self) -> WorldPoint {
        WorldPoint::new(self.cx, self.cy)
    }

    /// Edge length of the (square) cell.
    #[must_use]
    pub const fn size(&self) -> f32 {
        self.w
    }
}

/// Immutable board geometry computed once per session.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardLayout {
    mapper: GridMapper,
    path: Path,
    cells: Vec<PlacementCell>,
}

impl BoardLayout {
    /// Standard board: inverted-U path around a 3 x 5 placement grid.
    #[must_use]
    pub fn standard() -> Self {
        let mapper = GridMapper::standard();
        let path = Path::standard(&mapper);
        let cell_size = mapper.unit() * CELL_FILL;
        let mut cells = Vec::with_capacity(CELL_COUNT);
        for row in 0..GRID_ROWS {
            for column in 0..GRID_COLUMNS {
                let center = mapper.to_world(LogicalPoint::new(
                    1.5 + column as f32,
                    0.5 + row as f32,
                ));
                cells.push(PlacementCell {
                    index: CellIndex::new(row * GRID_COLUMNS + column),
                    x: center.x - cell_size / 2.0,
                    y: center.y - cell_size / 2.0,
                    w: cell_size,
                    h: cell_size,
                    cx: center.x,
                    cy: center.y,
                });
            }
        }
        Self {
            mapper,
            path,
            cells,
        }
    }

    /// Coordinate mapper used to build the layout.
    #[must_use]
    pub const fn mapper(&self) -> &GridMapper {
        &self.mapper
    }

    /// Route walked by mobs.
    #[must_use]
    pub const fn path(&self) -> &Path {
        &self.path
    }

    /// Placement cells ordered by index.
    #[must_use]
    pub fn cells(&self) -> &[PlacementCell] {
        &self.cells
    }

    /// Geometry for the provided cell index, if it exists.
    #[must_use]
    pub fn cell(&self, index: CellIndex) -> Option<&PlacementCell> {
        self.cells.get(index.get() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_mapper_places_origin_offsets() {
        let mapper = GridMapper::standard();
        assert_eq!(
            mapper.to_world(LogicalPoint::new(0.0, 0.0)),
            WorldPoint::new(50.0, 1240.0)
        );
        assert_eq!(
            mapper.to_world(LogicalPoint::new(0.5, 3.5)),
            WorldPoint::new(120.0, 750.0)
        );
    }

    #[test]
    fn to_world_is_pure() {
        let mapper = GridMapper::standard();
        let point = LogicalPoint::new(3.25, 1.75);
        assert_eq!(mapper.to_world(point), mapper.to_world(point));
    }

    #[test]
    fn to_logical_inverts_to_world() {
        let mapper = GridMapper::standard();
        for point in [
            LogicalPoint::new(0.5, 0.0),
            LogicalPoint::new(6.5, 3.5),
            LogicalPoint::new(2.5, 1.5),
        ] {
            let restored = mapper.to_logical(mapper.to_world(point));
            assert!((restored.x - point.x).abs() < 1e-4);
            assert!((restored.y - point.y).abs() < 1e-4);
        }
    }

    #[test]
    fn transform_is_monotonic_per_axis() {
        let mapper = GridMapper::standard();
        let a = mapper.to_world(LogicalPoint::new(1.0, 1.0));
        let b = mapper.to_world(LogicalPoint::new(2.0, 2.0));
        assert!(b.x > a.x, "x must grow with logical x");
        assert!(b.y < a.y, "pixel y must shrink as logical y grows");
    }

    #[test]
    fn out_of_region_points_are_not_clamped() {
        let mapper = GridMapper::standard();
        let outside = mapper.to_world(LogicalPoint::new(-2.0, 9.0));
        assert_eq!(outside, WorldPoint::new(-230.0, -20.0));
    }

    #[test]
    fn standard_path_has_expected_waypoints() {
        let path = Path::standard(&GridMapper::standard());
        assert_eq!(
            path.waypoints(),
            &[
                WorldPoint::new(120.0, 1240.0),
                WorldPoint::new(120.0, 750.0),
                WorldPoint::new(960.0, 750.0),
                WorldPoint::new(960.0, 1240.0),
            ]
        );
        assert!((path.length() - 1820.0).abs() < 1e-3);
    }

    #[test]
    fn path_requires_two_waypoints() {
        assert!(Path::new(vec![WorldPoint::new(0.0, 0.0)]).is_none());
        assert!(Path::new(vec![WorldPoint::new(0.0, 0.0), WorldPoint::new(1.0, 0.0)]).is_some());
    }

    #[test]
    fn standard_layout_has_fifteen_ordered_cells() {
        let layout = BoardLayout::standard();
        assert_eq!(layout.cells().len(), CELL_COUNT);
        for (position, cell) in layout.cells().iter().enumerate() {
            assert_eq!(cell.index.get() as usize, position);
        }

        let first = layout.cell(CellIndex::new(0)).expect("first cell");
        assert_eq!(first.center(), WorldPoint::new(260.0, 1170.0));
        assert!((first.size() - 126.0).abs() < 1e-4);

        let last = layout.cell(CellIndex::new(14)).expect("last cell");
        assert_eq!(last.center(), WorldPoint::new(820.0, 890.0));
        assert!(layout.cell(CellIndex::new(15)).is_none());
    }

    #[test]
    fn step_toward_never_overshoots() {
        let from = WorldPoint::new(0.0, 0.0);
        let to = WorldPoint::new(10.0, 0.0);
        assert_eq!(from.step_toward(to, 4.0), WorldPoint::new(4.0, 0.0));
        assert_eq!(from.step_toward(to, 40.0), to);
    }
}
