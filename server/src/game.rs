//! Authoritative game state: player registry, movement rules, and the
//! broadcast payload.
//!
//! Everything in here is plain data mutated under a single lock held by the
//! caller. Cross-field invariants (map cell vs. player position vs. score)
//! only hold if each operation runs to completion before the next one starts,
//! which is why the whole aggregate sits behind one mutex rather than one per
//! field.

use crate::world::{World, P1_FLAG_HOME, P2_FLAG_HOME};
use log::info;
use shared::{
    Direction, PlayerId, EMPTY_TILE, GRID_HEIGHT, GRID_WIDTH, MAX_PLAYERS, P1_BASE_TILE,
    P1_FLAG_TILE, P1_TILE, P1_WITH_FLAG_TILE, P2_BASE_TILE, P2_FLAG_TILE, P2_TILE,
    P2_WITH_FLAG_TILE, WALL_TILE, WIN_SCORE,
};
use std::collections::HashMap;

/// One connected participant.
///
/// `tile_underneath` is the map value the player's marker is currently
/// covering; it is what gets written back when the player moves away or
/// disconnects.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub x: usize,
    pub y: usize,
    pub score: u32,
    pub carrying_flag: bool,
    pub tile: u8,
    pub carry_tile: u8,
    pub base_tile: u8,
    pub enemy_flag_tile: u8,
    pub tile_underneath: u8,
}

impl Player {
    /// Fixed per-slot spawn profile: position, marker tiles, and which flag
    /// the player is after.
    pub fn spawn(slot: PlayerId) -> Self {
        if slot == 0 {
            Player {
                id: 0,
                x: 2,
                y: GRID_HEIGHT / 2 - 2,
                score: 0,
                carrying_flag: false,
                tile: P1_TILE,
                carry_tile: P1_WITH_FLAG_TILE,
                base_tile: P1_BASE_TILE,
                enemy_flag_tile: P2_FLAG_TILE,
                tile_underneath: EMPTY_TILE,
            }
        } else {
            Player {
                id: slot,
                x: GRID_WIDTH - 3,
                y: GRID_HEIGHT / 2 + 2,
                score: 0,
                carrying_flag: false,
                tile: P2_TILE,
                carry_tile: P2_WITH_FLAG_TILE,
                base_tile: P2_BASE_TILE,
                enemy_flag_tile: P1_FLAG_TILE,
                tile_underneath: EMPTY_TILE,
            }
        }
    }

    pub fn display_tile(&self) -> u8 {
        if self.carrying_flag {
            self.carry_tile
        } else {
            self.tile
        }
    }
}

/// The shared aggregate: map, registry, and flag home coordinates.
///
/// All reads and mutations happen inside one critical section per operation;
/// callers wrap the whole state in a mutex and never mutate a sub-component
/// independently.
#[derive(Debug)]
pub struct GameState {
    pub world: World,
    pub players: HashMap<PlayerId, Player>,
    p1_flag_home: (usize, usize),
    p2_flag_home: (usize, usize),
}

impl GameState {
    pub fn new() -> Self {
        GameState {
            world: World::new(),
            players: HashMap::new(),
            p1_flag_home: P1_FLAG_HOME,
            p2_flag_home: P2_FLAG_HOME,
        }
    }

    /// First unoccupied slot, if the session has room.
    pub fn free_slot(&self) -> Option<PlayerId> {
        (0..MAX_PLAYERS as PlayerId).find(|slot| !self.players.contains_key(slot))
    }

    /// Admits a player into the first free slot and places their marker on
    /// the map. Returns `None` when the session is full.
    pub fn add_player(&mut self) -> Option<PlayerId> {
        let slot = self.free_slot()?;
        let mut player = Player::spawn(slot);
        player.tile_underneath = self.world.tile_at(player.x, player.y);
        self.world.set_tile(player.x, player.y, player.tile);
        info!("Player {} joined at ({}, {})", slot + 1, player.x, player.y);
        self.players.insert(slot, player);
        Some(slot)
    }

    /// Removes a player and restores the map cell they were covering.
    ///
    /// Invoked from the broadcast path when a write to the player's channel
    /// fails. A flag the player was carrying goes back to its home cell so
    /// exactly one instance of it exists afterwards.
    pub fn reconcile(&mut self, id: PlayerId) {
        let Some(player) = self.players.remove(&id) else {
            return;
        };
        self.world
            .set_tile(player.x, player.y, player.tile_underneath);
        if player.carrying_flag {
            let home = self.enemy_flag_home(id);
            self.world.set_tile(home.0, home.1, player.enemy_flag_tile);
        }
        info!("Player {} disconnected", id + 1);
    }

    /// Applies one drained movement command for one player.
    ///
    /// Illegal moves (out of the playable interior, into a wall, into a cell
    /// occupied by a different player) are rejected silently and leave the
    /// state untouched. Commands for players that disconnected between
    /// submission and drain are dropped.
    pub fn apply_command(&mut self, id: PlayerId, command: Direction) {
        let Some(player) = self.players.get(&id) else {
            return;
        };

        let (dx, dy) = command.offset();
        let candidate = (player.x as i32 + dx, player.y as i32 + dy);
        if !self.move_allowed(id, candidate) {
            return;
        }
        let (new_x, new_y) = (candidate.0 as usize, candidate.1 as usize);
        let target_tile = self.world.tile_at(new_x, new_y);
        let flag_home = self.enemy_flag_home(id);

        let Some(player) = self.players.get_mut(&id) else {
            return;
        };

        self.world
            .set_tile(player.x, player.y, player.tile_underneath);
        player.x = new_x;
        player.y = new_y;
        player.tile_underneath = target_tile;

        // Pickup lifts the flag off the map; the cell reads as empty once the
        // player moves on.
        if player.tile_underneath == player.enemy_flag_tile {
            player.carrying_flag = true;
            player.tile_underneath = EMPTY_TILE;
        }

        // Capture: score, drop the flag, and respawn it at its home cell.
        // The respawn write is unconditional, whatever the cell holds.
        if player.carrying_flag && player.tile_underneath == player.base_tile {
            player.score += 1;
            player.carrying_flag = false;
            self.world
                .set_tile(flag_home.0, flag_home.1, player.enemy_flag_tile);
        }

        self.world.set_tile(player.x, player.y, player.display_tile());
    }

    fn move_allowed(&self, id: PlayerId, (x, y): (i32, i32)) -> bool {
        if x < 1 || y < 1 || x > (GRID_WIDTH - 2) as i32 || y > (GRID_HEIGHT - 2) as i32 {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        if self.world.tile_at(x, y) == WALL_TILE {
            return false;
        }
        !self
            .players
            .values()
            .any(|other| other.id != id && other.x == x && other.y == y)
    }

    fn enemy_flag_home(&self, id: PlayerId) -> (usize, usize) {
        if id == 0 {
            self.p2_flag_home
        } else {
            self.p1_flag_home
        }
    }

    /// Serializes the broadcast payload: every map row in order, a newline
    /// delimiter, the score line, and a win banner per player at or past the
    /// winning score.
    pub fn render(&self) -> String {
        let p1_score = self.players.get(&0).map_or(0, |p| p.score);
        let p2_score = self.players.get(&1).map_or(0, |p| p.score);

        let mut payload = String::with_capacity(self.world.as_bytes().len() + 64);
        payload.push_str(&String::from_utf8_lossy(self.world.as_bytes()));
        payload.push('\n');
        payload.push_str(&format!(
            "Player 1 Score: {} | Player 2 Score: {}",
            p1_score, p2_score
        ));
        if p1_score >= WIN_SCORE {
            payload.push_str("\nPLAYER 1 WINS!");
        }
        if p2_score >= WIN_SCORE {
            payload.push_str("\nPLAYER 2 WINS!");
        }
        payload
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::P1_BASE;
    use shared::GRID_AREA;

    /// Teleports a player the way a sequence of legal moves would: restores
    /// the vacated cell, saves the new cell, writes the marker.
    fn place(state: &mut GameState, id: PlayerId, x: usize, y: usize) {
        let player = state.players.get_mut(&id).unwrap();
        let (old_x, old_y, underneath) = (player.x, player.y, player.tile_underneath);
        state.world.set_tile(old_x, old_y, underneath);
        let target = state.world.tile_at(x, y);
        let player = state.players.get_mut(&id).unwrap();
        player.x = x;
        player.y = y;
        player.tile_underneath = target;
        let display = player.display_tile();
        state.world.set_tile(x, y, display);
    }

    fn two_player_state() -> GameState {
        let mut state = GameState::new();
        assert_eq!(state.add_player(), Some(0));
        assert_eq!(state.add_player(), Some(1));
        state
    }

    #[test]
    fn test_spawn_profiles() {
        let p0 = Player::spawn(0);
        assert_eq!((p0.x, p0.y), (2, GRID_HEIGHT / 2 - 2));
        assert_eq!(p0.tile, P1_TILE);
        assert_eq!(p0.enemy_flag_tile, P2_FLAG_TILE);

        let p1 = Player::spawn(1);
        assert_eq!((p1.x, p1.y), (GRID_WIDTH - 3, GRID_HEIGHT / 2 + 2));
        assert_eq!(p1.tile, P2_TILE);
        assert_eq!(p1.enemy_flag_tile, P1_FLAG_TILE);
    }

    #[test]
    fn test_add_player_fills_slots_in_order() {
        let mut state = GameState::new();
        assert_eq!(state.add_player(), Some(0));
        assert_eq!(state.add_player(), Some(1));
        assert_eq!(state.add_player(), None);
    }

    #[test]
    fn test_slot_freed_after_reconcile() {
        let mut state = two_player_state();
        state.reconcile(0);
        assert_eq!(state.free_slot(), Some(0));
        assert_eq!(state.add_player(), Some(0));
    }

    #[test]
    fn test_add_player_writes_marker() {
        let mut state = GameState::new();
        state.add_player();
        let player = &state.players[&0];
        assert_eq!(state.world.tile_at(player.x, player.y), P1_TILE);
        assert_eq!(player.tile_underneath, EMPTY_TILE);
    }

    #[test]
    fn test_accepted_move_updates_map_and_position() {
        let mut state = two_player_state();
        let (x0, y0) = (state.players[&0].x, state.players[&0].y);

        state.apply_command(0, Direction::Right);

        let player = &state.players[&0];
        assert_eq!((player.x, player.y), (x0 + 1, y0));
        assert_eq!(state.world.tile_at(x0, y0), EMPTY_TILE);
        assert_eq!(state.world.tile_at(x0 + 1, y0), P1_TILE);
    }

    #[test]
    fn test_move_rejected_at_interior_bound() {
        let mut state = two_player_state();
        // Spawn is at x = 2; two steps left reaches the interior edge,
        // the third must be rejected.
        state.apply_command(0, Direction::Left);
        assert_eq!(state.players[&0].x, 1);
        state.apply_command(0, Direction::Left);
        assert_eq!(state.players[&0].x, 1);
    }

    #[test]
    fn test_move_rejected_into_wall() {
        let mut state = two_player_state();
        let wall_x = GRID_WIDTH / 2;
        // Walk right along the spawn row until the internal wall column.
        for _ in 0..GRID_WIDTH {
            state.apply_command(0, Direction::Right);
        }
        assert_eq!(state.players[&0].x, wall_x - 1);
        assert_eq!(state.players[&0].y, GRID_HEIGHT / 2 - 2);
    }

    #[test]
    fn test_move_rejected_into_occupied_cell() {
        let mut state = two_player_state();
        place(&mut state, 0, 5, 3);
        place(&mut state, 1, 7, 3);

        // Both target (6, 3); the first drained command wins the cell.
        state.apply_command(0, Direction::Right);
        state.apply_command(1, Direction::Left);

        assert_eq!((state.players[&0].x, state.players[&0].y), (6, 3));
        assert_eq!((state.players[&1].x, state.players[&1].y), (7, 3));
        assert_eq!(state.world.tile_at(6, 3), P1_TILE);
        assert_eq!(state.world.tile_at(7, 3), P2_TILE);
    }

    #[test]
    fn test_command_for_absent_player_is_noop() {
        let mut state = GameState::new();
        state.apply_command(0, Direction::Up);
        state.apply_command(7, Direction::Down);
        assert!(state.players.is_empty());
    }

    #[test]
    fn test_tile_underneath_restored_on_round_trip() {
        let mut state = two_player_state();
        let (base_x, base_y) = P1_BASE;
        place(&mut state, 0, base_x - 1, base_y);

        // Step onto the base, then back off: the base tile must survive.
        state.apply_command(0, Direction::Right);
        assert_eq!(state.players[&0].tile_underneath, P1_BASE_TILE);
        assert_eq!(state.world.tile_at(base_x, base_y), P1_TILE);

        state.apply_command(0, Direction::Left);
        assert_eq!(state.world.tile_at(base_x, base_y), P1_BASE_TILE);
        assert_eq!(state.players[&0].tile_underneath, EMPTY_TILE);
    }

    #[test]
    fn test_flag_pickup_lifts_flag() {
        let mut state = two_player_state();
        let (flag_x, flag_y) = P2_FLAG_HOME;
        place(&mut state, 0, flag_x - 1, flag_y);

        state.apply_command(0, Direction::Right);

        let player = &state.players[&0];
        assert!(player.carrying_flag);
        assert_eq!(player.tile_underneath, EMPTY_TILE);
        assert_eq!(state.world.tile_at(flag_x, flag_y), P1_WITH_FLAG_TILE);

        // Moving away leaves the flag cell empty, not duplicated.
        state.apply_command(0, Direction::Left);
        assert_eq!(state.world.tile_at(flag_x, flag_y), EMPTY_TILE);
    }

    #[test]
    fn test_capture_scores_and_respawns_flag() {
        let mut state = two_player_state();
        let (base_x, base_y) = P1_BASE;
        let (flag_x, flag_y) = P2_FLAG_HOME;

        // Lift the enemy flag, then walk the carrier next to home base.
        place(&mut state, 0, flag_x - 1, flag_y);
        state.apply_command(0, Direction::Right);
        assert!(state.players[&0].carrying_flag);
        place(&mut state, 0, base_x + 1, base_y);

        state.apply_command(0, Direction::Left);

        let player = &state.players[&0];
        assert_eq!(player.score, 1);
        assert!(!player.carrying_flag);
        assert_eq!(state.world.tile_at(flag_x, flag_y), P2_FLAG_TILE);
        // Standing on the base shows the plain marker again.
        assert_eq!(state.world.tile_at(base_x, base_y), P1_TILE);
        assert_eq!(player.tile_underneath, P1_BASE_TILE);

        // Leaving the base restores it.
        state.apply_command(0, Direction::Right);
        assert_eq!(state.world.tile_at(base_x, base_y), P1_BASE_TILE);
    }

    #[test]
    fn test_no_score_without_flag() {
        let mut state = two_player_state();
        let (base_x, base_y) = P1_BASE;
        place(&mut state, 0, base_x - 1, base_y);

        state.apply_command(0, Direction::Right);
        state.apply_command(0, Direction::Left);
        state.apply_command(0, Direction::Right);

        assert_eq!(state.players[&0].score, 0);
    }

    #[test]
    fn test_flag_conservation_across_pickup_and_capture() {
        let mut state = two_player_state();
        let count_flag = |state: &GameState| {
            let on_map = state
                .world
                .as_bytes()
                .iter()
                .filter(|&&t| t == P2_FLAG_TILE)
                .count();
            let held = state.players.values().filter(|p| p.carrying_flag && p.enemy_flag_tile == P2_FLAG_TILE).count();
            on_map + held
        };

        assert_eq!(count_flag(&state), 1);

        let (flag_x, flag_y) = P2_FLAG_HOME;
        place(&mut state, 0, flag_x - 1, flag_y);
        state.apply_command(0, Direction::Right);
        assert_eq!(count_flag(&state), 1);

        place(&mut state, 0, P1_BASE.0 + 1, P1_BASE.1);
        state.apply_command(0, Direction::Left);
        assert_eq!(count_flag(&state), 1);
    }

    #[test]
    fn test_reconcile_restores_cell_and_removes_player() {
        let mut state = two_player_state();
        let (base_x, base_y) = P1_BASE;
        place(&mut state, 0, base_x, base_y);

        state.reconcile(0);

        assert!(!state.players.contains_key(&0));
        assert_eq!(state.world.tile_at(base_x, base_y), P1_BASE_TILE);
    }

    #[test]
    fn test_reconcile_respawns_carried_flag() {
        let mut state = two_player_state();
        let (flag_x, flag_y) = P2_FLAG_HOME;
        place(&mut state, 0, flag_x - 1, flag_y);
        state.apply_command(0, Direction::Right);
        assert!(state.players[&0].carrying_flag);

        state.reconcile(0);

        assert_eq!(state.world.tile_at(flag_x, flag_y), P2_FLAG_TILE);
    }

    #[test]
    fn test_reconcile_unknown_player_is_noop() {
        let mut state = two_player_state();
        state.reconcile(5);
        assert_eq!(state.players.len(), 2);
    }

    #[test]
    fn test_bounds_and_occupancy_invariants_hold_under_random_walk() {
        let mut state = two_player_state();
        // A fixed pseudo-random-ish command sequence; invariants must hold
        // after every step.
        let commands = [
            Direction::Right,
            Direction::Down,
            Direction::Down,
            Direction::Left,
            Direction::Up,
            Direction::Right,
            Direction::Right,
            Direction::Up,
            Direction::Left,
            Direction::Down,
        ];
        for (step, &command) in commands.iter().cycle().take(200).enumerate() {
            let id = (step % 2) as PlayerId;
            state.apply_command(id, command);

            for player in state.players.values() {
                assert!(player.x >= 1 && player.x <= GRID_WIDTH - 2);
                assert!(player.y >= 1 && player.y <= GRID_HEIGHT - 2);
            }
            let p0 = &state.players[&0];
            let p1 = &state.players[&1];
            assert!((p0.x, p0.y) != (p1.x, p1.y));
        }
    }

    #[test]
    fn test_render_layout() {
        let state = two_player_state();
        let payload = state.render();
        let bytes = payload.as_bytes();

        assert_eq!(bytes[GRID_AREA], b'\n');
        assert!(!bytes[..GRID_AREA].contains(&b'\n'));
        assert_eq!(
            &payload[GRID_AREA + 1..],
            "Player 1 Score: 0 | Player 2 Score: 0"
        );
    }

    #[test]
    fn test_render_score_for_missing_player_is_zero() {
        let mut state = GameState::new();
        state.add_player();
        let payload = state.render();
        assert!(payload.ends_with("Player 1 Score: 0 | Player 2 Score: 0"));
    }

    #[test]
    fn test_render_win_banner() {
        let mut state = two_player_state();
        state.players.get_mut(&0).unwrap().score = WIN_SCORE;
        let payload = state.render();
        assert!(payload.ends_with("PLAYER 1 WINS!"));
        assert!(!payload.contains("PLAYER 2 WINS!"));

        state.players.get_mut(&1).unwrap().score = WIN_SCORE + 1;
        let payload = state.render();
        assert!(payload.contains("PLAYER 1 WINS!"));
        assert!(payload.ends_with("PLAYER 2 WINS!"));
    }
}
