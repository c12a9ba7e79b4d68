//! Uniform spatial grid for broad-phase collision queries
//!
//! Rebuilt every tick. One layer per entity class; entities are inserted into
//! every cell their bounding box overlaps, so a query only needs to look at the
//! cells under its own bounding box. Cell coordinates clamp to the grid edge,
//! which keeps off-screen entities findable by off-screen queries.

use glam::DVec2;

use super::asteroid::Asteroid;
use super::enemy::Enemy;
use super::pool::Poolable;
use super::powerup::Powerup;
use super::projectile::Projectile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLayer {
    Enemies = 0,
    Projectiles = 1,
    Powerups = 2,
    Asteroids = 3,
}

const LAYER_COUNT: usize = 4;

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cols: usize,
    rows: usize,
    /// `layers[layer][row * cols + col]` holds pool slot indices
    layers: [Vec<Vec<usize>>; LAYER_COUNT],
}

impl SpatialGrid {
    pub fn new(width: f64, height: f64, cell_size: f64) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 128.0 };
        let cols = (width.max(1.0) / cell_size).ceil() as usize + 1;
        let rows = (height.max(1.0) / cell_size).ceil() as usize + 1;
        let layers = std::array::from_fn(|_| vec![Vec::new(); cols * rows]);
        Self {
            cell_size,
            cols,
            rows,
            layers,
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Empty every cell (capacity is kept)
    pub fn clear(&mut self) {
        for layer in &mut self.layers {
            for cell in layer.iter_mut() {
                cell.clear();
            }
        }
    }

    fn axis_cell(&self, v: f64, cells: usize) -> usize {
        let c = (v / self.cell_size).floor();
        if c.is_nan() || c < 0.0 {
            0
        } else {
            (c as usize).min(cells - 1)
        }
    }

    /// Inclusive cell span covered by the circle's bounding box
    fn span(&self, pos: DVec2, radius: f64) -> (usize, usize, usize, usize) {
        let r = radius.max(0.0);
        (
            self.axis_cell(pos.x - r, self.cols),
            self.axis_cell(pos.x + r, self.cols),
            self.axis_cell(pos.y - r, self.rows),
            self.axis_cell(pos.y + r, self.rows),
        )
    }

    pub fn insert(&mut self, layer: GridLayer, index: usize, pos: DVec2, radius: f64) {
        let (x0, x1, y0, y1) = self.span(pos, radius);
        let cols = self.cols;
        let cells = &mut self.layers[layer as usize];
        for row in y0..=y1 {
            for col in x0..=x1 {
                cells[row * cols + col].push(index);
            }
        }
    }

    /// Deduplicated, sorted slot indices in cells overlapping the query's bounding box
    pub fn neighbors(&self, layer: GridLayer, pos: DVec2, radius: f64, out: &mut Vec<usize>) {
        out.clear();
        let (x0, x1, y0, y1) = self.span(pos, radius);
        let cells = &self.layers[layer as usize];
        for row in y0..=y1 {
            for col in x0..=x1 {
                out.extend_from_slice(&cells[row * self.cols + col]);
            }
        }
        out.sort_unstable();
        out.dedup();
    }

    pub fn insert_enemy(&mut self, index: usize, enemy: &Enemy) -> bool {
        if !enemy.is_active() {
            return false;
        }
        self.insert(GridLayer::Enemies, index, enemy.pos, enemy.radius);
        true
    }

    pub fn insert_projectile(&mut self, index: usize, projectile: &Projectile) -> bool {
        if !projectile.is_active() {
            return false;
        }
        // Beams cover their whole segment
        let (center, radius) = projectile.broad_phase_circle();
        self.insert(GridLayer::Projectiles, index, center, radius);
        true
    }

    pub fn insert_powerup(&mut self, index: usize, powerup: &Powerup) -> bool {
        if !powerup.is_active() {
            return false;
        }
        self.insert(GridLayer::Powerups, index, powerup.pos, powerup.radius);
        true
    }

    pub fn insert_asteroid(&mut self, index: usize, asteroid: &Asteroid) -> bool {
        if !asteroid.is_active() {
            return false;
        }
        self.insert(GridLayer::Asteroids, index, asteroid.pos, asteroid.radius);
        true
    }

    pub fn neighbors_enemies(&self, pos: DVec2, radius: f64, out: &mut Vec<usize>) {
        self.neighbors(GridLayer::Enemies, pos, radius, out);
    }

    pub fn neighbors_projectiles(&self, pos: DVec2, radius: f64, out: &mut Vec<usize>) {
        self.neighbors(GridLayer::Projectiles, pos, radius, out);
    }

    pub fn neighbors_powerups(&self, pos: DVec2, radius: f64, out: &mut Vec<usize>) {
        self.neighbors(GridLayer::Powerups, pos, radius, out);
    }

    pub fn neighbors_asteroids(&self, pos: DVec2, radius: f64, out: &mut Vec<usize>) {
        self.neighbors(GridLayer::Asteroids, pos, radius, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_follow_cell_size() {
        let grid = SpatialGrid::new(800.0, 600.0, 128.0);
        assert_eq!(grid.dimensions(), (8, 6));
    }

    #[test]
    fn test_entity_spanning_cells_found_from_either_side() {
        let mut grid = SpatialGrid::new(800.0, 600.0, 128.0);
        grid.insert(GridLayer::Enemies, 3, DVec2::new(128.0, 64.0), 20.0);
        let mut out = Vec::new();
        grid.neighbors(GridLayer::Enemies, DVec2::new(100.0, 64.0), 1.0, &mut out);
        assert_eq!(out, vec![3]);
        grid.neighbors(GridLayer::Enemies, DVec2::new(140.0, 64.0), 1.0, &mut out);
        assert_eq!(out, vec![3]);
    }

    #[test]
    fn test_results_are_deduplicated_and_sorted() {
        let mut grid = SpatialGrid::new(800.0, 600.0, 64.0);
        grid.insert(GridLayer::Asteroids, 9, DVec2::new(200.0, 200.0), 100.0);
        grid.insert(GridLayer::Asteroids, 2, DVec2::new(220.0, 220.0), 100.0);
        let mut out = Vec::new();
        grid.neighbors(GridLayer::Asteroids, DVec2::new(210.0, 210.0), 150.0, &mut out);
        assert_eq!(out, vec![2, 9]);
    }

    #[test]
    fn test_layers_are_independent() {
        let mut grid = SpatialGrid::new(800.0, 600.0, 128.0);
        grid.insert(GridLayer::Powerups, 1, DVec2::new(50.0, 50.0), 5.0);
        let mut out = Vec::new();
        grid.neighbors(GridLayer::Projectiles, DVec2::new(50.0, 50.0), 5.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_offscreen_entities_clamp_to_edge_cells() {
        let mut grid = SpatialGrid::new(800.0, 600.0, 128.0);
        grid.insert(GridLayer::Enemies, 4, DVec2::new(-60.0, -200.0), 10.0);
        let mut out = Vec::new();
        grid.neighbors(GridLayer::Enemies, DVec2::new(-55.0, -195.0), 1.0, &mut out);
        assert_eq!(out, vec![4]);
    }

    #[test]
    fn test_clear_empties_cells() {
        let mut grid = SpatialGrid::new(800.0, 600.0, 128.0);
        grid.insert(GridLayer::Enemies, 0, DVec2::new(10.0, 10.0), 5.0);
        grid.clear();
        let mut out = vec![99];
        grid.neighbors(GridLayer::Enemies, DVec2::new(10.0, 10.0), 5.0, &mut out);
        assert!(out.is_empty());
    }
}
