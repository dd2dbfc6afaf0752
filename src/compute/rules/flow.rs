//! Steepest-descent redistribution of a height layer.
//!
//! Each cell compares itself with its in-domain neighbours and sends a
//! fraction of the largest positive height difference to that single
//! neighbour. Outflow is subtracted locally and scattered back through the
//! unshift maps, so the layer total is conserved: with the zero border,
//! nothing is ever sent across the domain edge.

use log::debug;

use super::{Rule, RuleError, require_layer, with_layer};
use crate::compute::{Canvases, Direction, Grid, Lattice, ShiftMaps, unshifted};

/// Default layer moved by [`FlowRule`].
pub const TERRAIN: &str = "terrain";

/// Conservative downhill flow on one layer.
#[derive(Debug, Clone)]
pub struct FlowRule {
    key: String,
    flow_factor: f32,
}

impl FlowRule {
    /// Flow on the `terrain` layer.
    ///
    /// `flow_factor` must lie in `[0, 1)`; values of one or more make the
    /// field oscillate without bound.
    pub fn new(flow_factor: f32) -> Result<Self, RuleError> {
        if !(0.0..1.0).contains(&flow_factor) {
            return Err(RuleError::InvalidFlowFactor(flow_factor));
        }
        Ok(Self {
            key: TERRAIN.to_string(),
            flow_factor,
        })
    }

    /// Flow on another layer.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn flow_factor(&self) -> f32 {
        self.flow_factor
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Per-direction outgoing amounts, in [`Direction::ALL`] order.
    ///
    /// At most one direction per cell is non-zero: the steepest downhill
    /// in-domain neighbour. Ties go to the first direction in order.
    pub fn outflow(&self, height: &Grid, neighbours: &[Grid; 4], maps: &ShiftMaps) -> [Grid; 4] {
        let mut sent: [Grid; 4] = std::array::from_fn(|_| height.zeros_like());
        let local = height.as_slice();

        for (i, &h) in local.iter().enumerate() {
            let mut steepest: Option<(Direction, f32)> = None;
            for dir in Direction::ALL {
                if !maps.in_domain(dir)[i] {
                    continue;
                }
                let diff = h - neighbours[dir.index()].as_slice()[i];
                if diff > 0.0 && steepest.is_none_or(|(_, best)| diff > best) {
                    steepest = Some((dir, diff));
                }
            }

            if let Some((dir, diff)) = steepest {
                sent[dir.index()].as_mut_slice()[i] = diff * self.flow_factor;
            }
        }

        sent
    }

    /// Apply `sent` to `height`: subtract what leaves, add what arrives.
    pub fn redistribute(
        &self,
        height: &Grid,
        sent: &[Grid; 4],
        maps: &ShiftMaps,
    ) -> Result<Grid, RuleError> {
        let received = unshifted(sent, maps)?;
        let mut next = height.clone();

        for (i, v) in next.as_mut_slice().iter_mut().enumerate() {
            let out: f32 = sent.iter().map(|g| g.as_slice()[i]).sum();
            let inflow: f32 = received.iter().map(|g| g.as_slice()[i]).sum();
            *v = *v - out + inflow;
        }

        Ok(next)
    }
}

impl Rule for FlowRule {
    fn name(&self) -> &str {
        "flow"
    }

    fn reads(&self) -> Vec<&str> {
        vec![self.key.as_str()]
    }

    fn writes(&self) -> Vec<&str> {
        vec![self.key.as_str()]
    }

    fn evolve(&mut self, lattice: &Lattice) -> Result<Canvases, RuleError> {
        let height = require_layer(lattice, &self.key)?;
        let neighbours = lattice
            .shifted(&self.key)
            .ok_or_else(|| RuleError::MissingLayer(self.key.clone()))?;

        let sent = self.outflow(height, neighbours, lattice.maps());
        let moved: f64 = sent.iter().map(Grid::sum).sum();
        debug!("flow on '{}': moved {:.6}", self.key, moved);

        let next = self.redistribute(height, &sent, lattice.maps())?;
        with_layer(lattice, &self.key, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::CellSpace;

    fn space_with(rows: Vec<Vec<f32>>, flow_factor: f32) -> CellSpace {
        let canvases = Canvases::new([(TERRAIN, Grid::from_rows(rows).unwrap())]).unwrap();
        let rule = FlowRule::new(flow_factor).unwrap();
        CellSpace::new(&canvases, vec![Box::new(rule)]).unwrap()
    }

    #[test]
    fn test_flow_factor_validation() {
        assert!(matches!(
            FlowRule::new(1.0),
            Err(RuleError::InvalidFlowFactor(_))
        ));
        assert!(matches!(
            FlowRule::new(1.5),
            Err(RuleError::InvalidFlowFactor(_))
        ));
        assert!(FlowRule::new(-0.1).is_err());
        assert!(FlowRule::new(f32::NAN).is_err());
        assert!(FlowRule::new(0.5).is_ok());
        assert!(FlowRule::new(0.0).is_ok());
    }

    #[test]
    fn test_outflow_goes_to_steepest_neighbour_only() {
        let space = space_with(
            vec![
                vec![0.0, 1.0, 0.0],
                vec![3.0, 10.0, 4.0],
                vec![0.0, 2.0, 0.0],
            ],
            0.5,
        );
        let lattice = space.lattice();
        let height = lattice.canvas(TERRAIN).unwrap();
        let neighbours = lattice.shifted(TERRAIN).unwrap();

        let rule = FlowRule::new(0.5).unwrap();
        let sent = rule.outflow(height, neighbours, lattice.maps());

        let center = height.idx(1, 1);
        assert_eq!(sent[Direction::Up.index()].as_slice()[center], 4.5);
        assert_eq!(sent[Direction::Down.index()].as_slice()[center], 0.0);
        assert_eq!(sent[Direction::Left.index()].as_slice()[center], 0.0);
        assert_eq!(sent[Direction::Right.index()].as_slice()[center], 0.0);
    }

    #[test]
    fn test_no_flow_uphill_or_on_flat() {
        let space = space_with(vec![vec![2.0; 3]; 3], 0.5);
        let lattice = space.lattice();
        let rule = FlowRule::new(0.5).unwrap();
        let sent = rule.outflow(
            lattice.canvas(TERRAIN).unwrap(),
            lattice.shifted(TERRAIN).unwrap(),
            lattice.maps(),
        );
        for grid in &sent {
            assert_eq!(grid.sum(), 0.0);
        }
    }

    #[test]
    fn test_edge_cells_never_send_outward() {
        // A lone peak on the corner must only flow inward.
        let space = space_with(
            vec![
                vec![9.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0],
            ],
            0.5,
        );
        let lattice = space.lattice();
        let rule = FlowRule::new(0.5).unwrap();
        let sent = rule.outflow(
            lattice.canvas(TERRAIN).unwrap(),
            lattice.shifted(TERRAIN).unwrap(),
            lattice.maps(),
        );

        assert_eq!(sent[Direction::Up.index()].sum(), 0.0);
        assert_eq!(sent[Direction::Left.index()].sum(), 0.0);
        // Tie between Down and Right resolves to Down.
        assert_eq!(sent[Direction::Down.index()].as_slice()[0], 4.5);
        assert_eq!(sent[Direction::Right.index()].as_slice()[0], 0.0);
    }

    #[test]
    fn test_evolve_moves_mass_to_neighbour() {
        let mut space = space_with(
            vec![
                vec![0.0, 1.0, 0.0],
                vec![3.0, 10.0, 4.0],
                vec![0.0, 2.0, 0.0],
            ],
            0.5,
        );
        let before = space.canvases().total(TERRAIN).unwrap();
        space.step().unwrap();

        let terrain = space.canvas(TERRAIN).unwrap();
        assert_eq!(terrain.get(1, 1), Some(5.5));
        let after = terrain.sum();
        assert!((after - before).abs() < 1e-5, "{} -> {}", before, after);
    }

    #[test]
    fn test_declares_its_layer() {
        let rule = FlowRule::new(0.25).unwrap();
        assert_eq!(rule.key(), TERRAIN);

        let rule = rule.with_key("sand");
        assert_eq!(rule.key(), "sand");
        assert_eq!(rule.reads(), vec!["sand"]);
        assert_eq!(rule.writes(), vec!["sand"]);
        assert_eq!(rule.flow_factor(), 0.25);
    }
}
