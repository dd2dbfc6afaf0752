//! Property tests for conservation and boundary closure of terrain flow.

use popdyn::compute::{
    Canvases, CellSpace, Direction, FlowRule, Grid, Rule, ShiftMaps, TERRAIN, shifted, unshifted,
};
use proptest::prelude::*;

fn terrain_space(grid: Grid, flow_factor: f32) -> CellSpace {
    let canvases = Canvases::new([(TERRAIN, grid)]).unwrap();
    let rules: Vec<Box<dyn Rule>> = vec![Box::new(FlowRule::new(flow_factor).unwrap())];
    CellSpace::new(&canvases, rules).unwrap()
}

fn arb_grid() -> impl Strategy<Value = Grid> {
    (3usize..12, 3usize..12).prop_flat_map(|(h, w)| {
        prop::collection::vec(0.0f32..100.0, h * w)
            .prop_map(move |data| Grid::from_vec(h, w, data).unwrap())
    })
}

proptest! {
    #[test]
    fn flow_conserves_terrain(grid in arb_grid(), flow_factor in 0.0f32..0.99, steps in 1u64..30) {
        let initial = grid.sum();
        let mut space = terrain_space(grid, flow_factor);

        for _ in 0..steps {
            space.step().unwrap();
            let total = space.canvases().total(TERRAIN).unwrap();
            let tolerance = 1e-4 * initial.max(1.0);
            prop_assert!(
                (total - initial).abs() < tolerance,
                "terrain drifted: {} -> {}", initial, total
            );
        }
    }

    #[test]
    fn flow_keeps_non_negative_terrain(grid in arb_grid(), flow_factor in 0.0f32..0.99) {
        let mut space = terrain_space(grid, flow_factor);
        for _ in 0..10 {
            space.step().unwrap();
        }
        let min = space.canvas(TERRAIN).unwrap().min();
        prop_assert!(min >= -1e-4, "negative terrain {}", min);
    }

    #[test]
    fn unshift_never_crosses_the_edge(grid in arb_grid()) {
        let maps = ShiftMaps::new(grid.height(), grid.width()).unwrap();
        let sent: [Grid; 4] = std::array::from_fn(|_| grid.clone());
        let received = unshifted(&sent, &maps).unwrap();

        // Whatever arrives equals what was sent toward in-domain neighbours.
        for dir in Direction::ALL {
            let inside: f64 = grid
                .as_slice()
                .iter()
                .zip(maps.in_domain(dir))
                .filter(|(_, inside)| **inside)
                .map(|(v, _)| f64::from(*v))
                .sum();
            let arrived = received[dir.index()].sum();
            prop_assert!((inside - arrived).abs() < 1e-3);
        }
    }

    #[test]
    fn shifted_neighbours_match_direct_lookup(grid in arb_grid()) {
        let maps = ShiftMaps::new(grid.height(), grid.width()).unwrap();
        let views = shifted(&grid, &maps).unwrap();

        for row in 0..grid.height() {
            for col in 0..grid.width() {
                for dir in Direction::ALL {
                    let (dr, dc) = dir.offset();
                    let nr = row as isize + dr;
                    let nc = col as isize + dc;
                    let expected = if nr < 0 || nc < 0 {
                        0.0
                    } else {
                        grid.get(nr as usize, nc as usize).unwrap_or(0.0)
                    };
                    prop_assert_eq!(views[dir.index()].get(row, col), Some(expected));
                }
            }
        }
    }
}

#[test]
fn walled_peak_spreads_without_loss() {
    let mut grid = Grid::zeros(5, 5).unwrap();
    grid.set(0, 0, 100.0).unwrap();
    grid.set(4, 4, 50.0).unwrap();
    let mut space = terrain_space(grid, 0.5);

    space.flow(200, 50).unwrap();

    let total = space.canvases().total(TERRAIN).unwrap();
    assert!((total - 150.0).abs() < 1e-3, "total {}", total);
    assert_eq!(space.history().len(), 5);
    assert!(space.canvas(TERRAIN).unwrap().max() < 100.0);
}
