use tile_explorer_core::{AdjacencyMode, CellMeta, TerrainKind, TileCoord};
use tile_explorer_world::{GridBounds, GridError, TerrainClassifier, WorldGrid};

#[test]
fn repeated_queries_hit_the_cache() {
    let mut grid = WorldGrid::unbounded(TerrainClassifier::with_seed(0));
    let coord = TileCoord::new(5, 5);

    let first = grid.cell(coord).expect("valid coordinate").meta();
    let live_after_first = grid.len();
    let second = grid.cell(coord).expect("valid coordinate").meta();

    assert_eq!(first, second);
    assert_eq!(live_after_first, 1);
    assert_eq!(grid.len(), 1, "second query must not create another cell");
}

#[test]
fn classification_survives_process_restarts() {
    let mut first = WorldGrid::unbounded(TerrainClassifier::with_seed(42));
    let mut second = WorldGrid::unbounded(TerrainClassifier::with_seed(42));

    for y in -15..15 {
        for x in -15..15 {
            let coord = TileCoord::new(x, y);
            assert_eq!(
                first.cell(coord).expect("cell").meta(),
                second.cell(coord).expect("cell").meta(),
                "terrain diverged at {coord}"
            );
        }
    }
}

#[test]
fn swap_exchanges_metadata_and_is_an_involution() {
    let mut grid = WorldGrid::unbounded(|coord: TileCoord| {
        if coord.x() == 0 {
            CellMeta::impassable()
        } else {
            CellMeta::hazard()
        }
    });
    let wall = TileCoord::new(0, 3);
    let floor = TileCoord::new(1, 3);

    grid.swap(wall, floor).expect("swap within unbounded grid");
    assert_eq!(grid.cell(wall).expect("cell").meta(), CellMeta::hazard());
    assert_eq!(grid.cell(floor).expect("cell").meta(), CellMeta::impassable());
    assert_eq!(grid.cell(wall).expect("cell").coord(), wall);

    grid.swap(wall, floor).expect("swap within unbounded grid");
    assert_eq!(grid.cell(wall).expect("cell").meta(), CellMeta::impassable());
    assert_eq!(grid.cell(floor).expect("cell").meta(), CellMeta::hazard());
}

#[test]
fn swap_accepts_non_adjacent_cells() {
    let mut grid = WorldGrid::unbounded(|coord: TileCoord| {
        if coord == TileCoord::new(-7, 2) {
            CellMeta::impassable()
        } else {
            CellMeta::normal()
        }
    });

    grid.swap(TileCoord::new(-7, 2), TileCoord::new(30, -30))
        .expect("swap is not restricted to neighbours");

    assert!(grid.cell(TileCoord::new(-7, 2)).expect("cell").is_passable());
    assert!(!grid.cell(TileCoord::new(30, -30)).expect("cell").is_passable());
}

#[test]
fn bounded_grid_rejects_out_of_range_queries() {
    let mut grid = WorldGrid::bounded(
        TerrainClassifier::with_seed(0),
        GridBounds::new(10, 8),
    );

    let error = grid
        .cell(TileCoord::new(10, 0))
        .expect_err("column 10 is outside a 10-column grid");
    assert_eq!(
        error,
        GridError::OutOfBounds {
            coord: TileCoord::new(10, 0),
            columns: 10,
            rows: 8,
        }
    );
    assert!(grid.cell(TileCoord::new(-1, 0)).is_err());
    assert!(grid.cell(TileCoord::new(9, 7)).is_ok());
}

#[test]
fn bounded_swap_fails_without_touching_either_cell() {
    let mut grid = WorldGrid::bounded(|_: TileCoord| CellMeta::impassable(), GridBounds::new(4, 4));
    let inside = TileCoord::new(3, 0);

    let result = grid.swap(inside, TileCoord::new(4, 0));

    assert!(matches!(result, Err(GridError::OutOfBounds { .. })));
    assert_eq!(grid.peek(inside), None);
}

#[test]
fn four_way_adjacency_is_clamped_to_bounds() {
    let mut grid = WorldGrid::bounded(|_: TileCoord| CellMeta::normal(), GridBounds::new(5, 5));

    let corner: Vec<TileCoord> = grid
        .adjacent(TileCoord::new(0, 0), AdjacencyMode::FourWay)
        .expect("corner is in bounds")
        .iter()
        .map(|cell| cell.coord())
        .collect();
    assert_eq!(corner, vec![TileCoord::new(1, 0), TileCoord::new(0, 1)]);

    let centre = grid
        .adjacent(TileCoord::new(2, 2), AdjacencyMode::FourWay)
        .expect("centre is in bounds");
    assert_eq!(centre.len(), 4);
}

#[test]
fn eight_way_adjacency_includes_diagonals() {
    let mut grid = WorldGrid::bounded(|_: TileCoord| CellMeta::normal(), GridBounds::new(5, 5));

    let corner = grid
        .adjacent(TileCoord::new(4, 4), AdjacencyMode::EightWay)
        .expect("corner is in bounds");
    assert_eq!(corner.len(), 3);
    assert!(corner.iter().any(|cell| cell.coord() == TileCoord::new(3, 3)));

    let centre = grid
        .adjacent(TileCoord::new(2, 2), AdjacencyMode::EightWay)
        .expect("centre is in bounds");
    assert_eq!(centre.len(), 8);
    assert!(centre.iter().all(|cell| cell.coord() != TileCoord::new(2, 2)));
}

#[test]
fn unbounded_adjacency_reaches_negative_coordinates() {
    let mut grid = WorldGrid::unbounded(TerrainClassifier::with_seed(9));

    let neighbours = grid
        .adjacent(TileCoord::new(0, 0), AdjacencyMode::EightWay)
        .expect("every coordinate is valid");

    assert_eq!(neighbours.len(), 8);
    assert!(neighbours
        .iter()
        .any(|cell| cell.coord() == TileCoord::new(-1, -1)));
    assert!(neighbours
        .iter()
        .all(|cell| matches!(
            cell.meta().terrain,
            TerrainKind::Normal | TerrainKind::Impassable | TerrainKind::Hazard
        )));
}
