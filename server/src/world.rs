//! The grid map: a flat row-major tile buffer with a fixed, deterministic layout.

use shared::{
    EMPTY_TILE, GRID_HEIGHT, GRID_WIDTH, P1_BASE_TILE, P1_FLAG_TILE, P2_BASE_TILE, P2_FLAG_TILE,
    WALL_TILE,
};

pub const P1_BASE: (usize, usize) = (2, GRID_HEIGHT / 2);
pub const P1_FLAG_HOME: (usize, usize) = (3, GRID_HEIGHT / 2);
pub const P2_BASE: (usize, usize) = (GRID_WIDTH - 3, GRID_HEIGHT / 2);
pub const P2_FLAG_HOME: (usize, usize) = (GRID_WIDTH - 4, GRID_HEIGHT / 2);

/// Rows the internal wall column leaves open at the top and bottom.
const WALL_GAP: usize = 5;

/// The world map. Does no bounds checking of its own; callers keep
/// coordinates inside the playable interior `[1, W-2] x [1, H-2]`.
#[derive(Debug, Clone)]
pub struct World {
    tiles: Vec<u8>,
}

impl World {
    /// Builds the fixed layout: border walls, an internal wall column at
    /// `GRID_WIDTH / 2`, and the two base/flag placements.
    pub fn new() -> Self {
        let mut world = World {
            tiles: vec![EMPTY_TILE; GRID_WIDTH * GRID_HEIGHT],
        };

        for x in 0..GRID_WIDTH {
            world.set_tile(x, 0, WALL_TILE);
            world.set_tile(x, GRID_HEIGHT - 1, WALL_TILE);
        }
        for y in 0..GRID_HEIGHT {
            world.set_tile(0, y, WALL_TILE);
            world.set_tile(GRID_WIDTH - 1, y, WALL_TILE);
        }

        for y in WALL_GAP..GRID_HEIGHT - WALL_GAP {
            world.set_tile(GRID_WIDTH / 2, y, WALL_TILE);
        }

        world.set_tile(P1_BASE.0, P1_BASE.1, P1_BASE_TILE);
        world.set_tile(P1_FLAG_HOME.0, P1_FLAG_HOME.1, P1_FLAG_TILE);
        world.set_tile(P2_BASE.0, P2_BASE.1, P2_BASE_TILE);
        world.set_tile(P2_FLAG_HOME.0, P2_FLAG_HOME.1, P2_FLAG_TILE);

        world
    }

    pub fn tile_at(&self, x: usize, y: usize) -> u8 {
        self.tiles[y * GRID_WIDTH + x]
    }

    pub fn set_tile(&mut self, x: usize, y: usize, tile: u8) {
        self.tiles[y * GRID_WIDTH + x] = tile;
    }

    /// The whole grid in row order, exactly as it goes on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.tiles
    }
}

impl Default for World {
    fn default() -> Self {
        World::new()
    }
}
