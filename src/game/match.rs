//! Match state and the authoritative simulation step

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;
use tracing::debug;
use uuid::Uuid;

use crate::config::GameConfig;
use crate::util::time::as_millis;
use crate::ws::protocol::{ObstacleKind, Standing};

use super::collision::{CollisionOutcome, CollisionSystem};
use super::physics::{PhysicsSystem, Rect};
use super::{ARENA_HEIGHT, ARENA_WIDTH};

/// Tokens spawn this far from every arena edge
const TOKEN_MARGIN: f32 = 50.0;
/// Token value at spawn
const TOKEN_VALUE: u32 = 1;
/// Obstacle speed range in px per tick
const OBSTACLE_SPEED: std::ops::Range<f32> = 2.0..4.0;

/// Fixed obstacle layout: (id, kind, center x, center y, width, height)
const OBSTACLE_LAYOUT: [(u32, ObstacleKind, f32, f32, f32, f32); 3] = [
    (1, ObstacleKind::ToxicWaste, 200.0, 100.0, 40.0, 40.0),
    (2, ObstacleKind::SpinningTrash, 400.0, 200.0, 50.0, 50.0),
    (3, ObstacleKind::OilSpill, 300.0, 350.0, 80.0, 30.0),
];

/// Player state in a match (authoritative)
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    pub score: u32,
    /// Unix ms; the player is stunned while this is in the future
    pub stunned_until: u64,
}

impl PlayerState {
    pub fn new(id: Uuid, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            score: 0,
            stunned_until: 0,
        }
    }

    pub fn is_stunned(&self, now: u64) -> bool {
        self.stunned_until > now
    }
}

/// Collectible worth `value` points to the first player who claims it
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub value: u32,
    pub collected: bool,
}

/// Moving hazard bouncing around the arena
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    /// Center position
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Velocity in px per tick
    pub dx: f32,
    pub dy: f32,
}

impl Obstacle {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Move by one tick of velocity, reflecting off the arena walls
    pub fn advance(&mut self) {
        let (x, dx) = PhysicsSystem::bounce_axis(self.x, self.dx, self.width / 2.0, ARENA_WIDTH);
        let (y, dy) = PhysicsSystem::bounce_axis(self.y, self.dy, self.height / 2.0, ARENA_HEIGHT);
        self.x = x;
        self.dx = dx;
        self.y = y;
        self.dy = dy;
    }
}

/// Match state (owned by the game server while the match runs)
#[derive(Debug, Clone)]
pub struct MatchState {
    pub id: Uuid,
    pub seed: u64,
    pub tick: u64,
    /// Roster in join order; identities are unique
    pub players: Vec<PlayerState>,
    pub tokens: Vec<Token>,
    pub obstacles: Vec<Obstacle>,
    /// Unix ms
    pub start_time: u64,
}

impl MatchState {
    pub fn player(&self, id: &Uuid) -> Option<&PlayerState> {
        self.players.iter().find(|p| &p.id == id)
    }

    fn player_mut(&mut self, id: &Uuid) -> Option<&mut PlayerState> {
        self.players.iter_mut().find(|p| &p.id == id)
    }
}

/// The authoritative game match
pub struct GameMatch {
    state: MatchState,
    rules: GameConfig,
}

impl GameMatch {
    /// Create a match for `roster`, generating tokens and obstacles from `seed`
    pub fn new(id: Uuid, seed: u64, roster: &[Uuid], now: u64, rules: GameConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut players: Vec<PlayerState> = Vec::with_capacity(roster.len());
        for player_id in roster {
            if players.iter().any(|p| &p.id == player_id) {
                continue;
            }
            let (x, y) = spawn_position(players.len());
            players.push(PlayerState::new(*player_id, x, y));
        }

        let tokens = generate_tokens(&mut rng, players.len() * rules.tokens_per_player);
        let obstacles = generate_obstacles(&mut rng);

        Self {
            state: MatchState {
                id,
                seed,
                tick: 0,
                players,
                tokens,
                obstacles,
                start_time: now,
            },
            rules,
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn id(&self) -> Uuid {
        self.state.id
    }

    pub fn roster_len(&self) -> usize {
        self.state.players.len()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.state.player(id).is_some()
    }

    /// Player identities in roster order
    pub fn roster(&self) -> Vec<Uuid> {
        self.state.players.iter().map(|p| p.id).collect()
    }

    /// Run one simulation step: move obstacles, then resolve player collisions
    pub fn step(&mut self, now: u64) -> Vec<CollisionOutcome> {
        self.state.tick += 1;

        for obstacle in &mut self.state.obstacles {
            obstacle.advance();
        }

        let obstacles = &self.state.obstacles;
        let rules = &self.rules;
        self.state
            .players
            .iter_mut()
            .filter_map(|player| CollisionSystem::resolve(player, obstacles, rules, now))
            .collect()
    }

    /// Overwrite a player's position with client-reported coordinates.
    ///
    /// Positions are trusted as sent; nothing checks speed or bounds here.
    /// Returns false when the player is unknown or stunned.
    pub fn move_player(&mut self, id: &Uuid, x: f32, y: f32, now: u64) -> bool {
        let Some(player) = self.state.player_mut(id) else {
            return false;
        };
        if player.is_stunned(now) {
            return false;
        }
        player.x = x;
        player.y = y;
        true
    }

    /// Credit an uncollected token to a player. First collector wins.
    ///
    /// Returns the player's new score, or `None` if nothing changed.
    pub fn collect_token(&mut self, id: &Uuid, token_id: u32) -> Option<u32> {
        if !self.contains(id) {
            return None;
        }

        let token = self
            .state
            .tokens
            .iter_mut()
            .find(|t| t.id == token_id && !t.collected)?;
        token.collected = true;
        let value = token.value;

        let player = self.state.player_mut(id)?;
        player.score += value;
        Some(player.score)
    }

    /// Drop a player from the roster
    pub fn remove_player(&mut self, id: &Uuid) -> bool {
        let before = self.state.players.len();
        self.state.players.retain(|p| &p.id != id);
        let removed = self.state.players.len() != before;
        if removed {
            debug!(match_id = %self.state.id, player_id = %id, "Removed player from roster");
        }
        removed
    }

    /// Server-side duration limit reached (never true without a limit)
    pub fn is_expired(&self, now: u64) -> bool {
        self.rules
            .match_duration
            .map(|limit| now >= self.state.start_time.saturating_add(as_millis(limit)))
            .unwrap_or(false)
    }

    /// Ranking by score, ties keeping roster order
    pub fn standings(&self) -> Vec<Standing> {
        let mut players: Vec<&PlayerState> = self.state.players.iter().collect();
        players.sort_by(|a, b| b.score.cmp(&a.score));
        players
            .into_iter()
            .enumerate()
            .map(|(i, p)| Standing {
                rank: (i + 1) as u32,
                id: p.id,
                score: p.score,
            })
            .collect()
    }
}

/// Staggered start positions along the lower part of the arena
fn spawn_position(index: usize) -> (f32, f32) {
    (50.0 + index as f32 * 50.0, 300.0)
}

fn generate_tokens(rng: &mut ChaCha8Rng, count: usize) -> Vec<Token> {
    (0..count)
        .map(|i| Token {
            id: (i + 1) as u32,
            x: rng.gen_range(TOKEN_MARGIN..ARENA_WIDTH - TOKEN_MARGIN),
            y: rng.gen_range(TOKEN_MARGIN..ARENA_HEIGHT - TOKEN_MARGIN),
            value: TOKEN_VALUE,
            collected: false,
        })
        .collect()
}

fn generate_obstacles(rng: &mut ChaCha8Rng) -> Vec<Obstacle> {
    OBSTACLE_LAYOUT
        .iter()
        .map(|&(id, kind, x, y, width, height)| {
            let angle = rng.gen_range(0.0..TAU);
            let speed = rng.gen_range(OBSTACLE_SPEED);
            Obstacle {
                id,
                kind,
                x,
                y,
                width,
                height,
                dx: angle.cos() * speed,
                dy: angle.sin() * speed,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    fn new_match(players: usize) -> (GameMatch, Vec<Uuid>) {
        let roster: Vec<Uuid> = (0..players).map(|_| Uuid::new_v4()).collect();
        let game = GameMatch::new(Uuid::new_v4(), 42, &roster, 1_000, GameConfig::default());
        (game, roster)
    }

    /// Park obstacles in a corner so they cannot touch players during a test
    fn park_obstacles(game: &mut GameMatch) {
        for obs in &mut game.state.obstacles {
            obs.x = 700.0;
            obs.y = 60.0;
            obs.dx = 0.0;
            obs.dy = 0.0;
        }
    }

    #[test]
    fn initial_state_follows_roster() {
        let (game, roster) = new_match(2);
        let state = game.state();

        assert_eq!(state.players.len(), 2);
        assert_eq!(state.tokens.len(), 10);
        assert_eq!(state.obstacles.len(), 3);
        assert_eq!(state.start_time, 1_000);
        assert_eq!(state.players[0].id, roster[0]);
        assert_eq!((state.players[0].x, state.players[0].y), (50.0, 300.0));
        assert_eq!((state.players[1].x, state.players[1].y), (100.0, 300.0));
        assert!(state.players.iter().all(|p| p.score == 0 && p.stunned_until == 0));
    }

    #[test]
    fn duplicate_roster_entries_are_collapsed() {
        let id = Uuid::new_v4();
        let game = GameMatch::new(Uuid::new_v4(), 1, &[id, id], 0, GameConfig::default());
        assert_eq!(game.roster_len(), 1);
    }

    #[test]
    fn tokens_spawn_inside_margin_with_unique_ids() {
        let (game, _) = new_match(3);
        let ids: HashSet<u32> = game.state().tokens.iter().map(|t| t.id).collect();

        assert_eq!(ids.len(), 15);
        for token in &game.state().tokens {
            assert!((50.0..750.0).contains(&token.x));
            assert!((50.0..350.0).contains(&token.y));
            assert_eq!(token.value, 1);
            assert!(!token.collected);
        }
    }

    #[test]
    fn obstacles_use_fixed_layout_and_speed_range() {
        let (game, _) = new_match(2);
        let obstacles = &game.state().obstacles;

        assert_eq!(obstacles[0].kind, ObstacleKind::ToxicWaste);
        assert_eq!(obstacles[1].kind, ObstacleKind::SpinningTrash);
        assert_eq!(obstacles[2].kind, ObstacleKind::OilSpill);
        assert_eq!((obstacles[2].width, obstacles[2].height), (80.0, 30.0));

        for obs in obstacles {
            let speed = (obs.dx * obs.dx + obs.dy * obs.dy).sqrt();
            assert!(speed >= 1.999 && speed < 4.001, "speed {}", speed);
        }
    }

    #[test]
    fn same_seed_generates_same_match() {
        let roster = vec![Uuid::new_v4(), Uuid::new_v4()];
        let a = GameMatch::new(Uuid::new_v4(), 7, &roster, 0, GameConfig::default());
        let b = GameMatch::new(Uuid::new_v4(), 7, &roster, 0, GameConfig::default());
        assert_eq!(a.state().tokens, b.state().tokens);
        assert_eq!(a.state().obstacles, b.state().obstacles);
    }

    #[test]
    fn obstacles_stay_inside_arena() {
        let (mut game, _) = new_match(2);
        for _ in 0..5_000 {
            game.step(0);
            for obs in &game.state().obstacles {
                let rect = obs.rect();
                assert!(rect.left() >= 0.0 && rect.right() <= ARENA_WIDTH);
                assert!(rect.top() >= 0.0 && rect.bottom() <= ARENA_HEIGHT);
            }
        }
        assert_eq!(game.state().tick, 5_000);
    }

    #[test]
    fn obstacle_at_left_wall_bounces() {
        let (mut game, _) = new_match(2);
        park_obstacles(&mut game);
        let obs = &mut game.state.obstacles[0];
        obs.x = obs.width / 2.0;
        obs.dx = -3.0;

        game.step(0);

        assert!(game.state().obstacles[0].dx >= 0.0);
    }

    #[test]
    fn step_knocks_back_player_touching_toxic_waste() {
        let (mut game, roster) = new_match(2);
        park_obstacles(&mut game);
        {
            let obs = &mut game.state.obstacles[0];
            obs.x = 110.0;
            obs.y = 100.0;
        }
        {
            let player = game.state.player_mut(&roster[0]).unwrap();
            player.x = 100.0;
            player.y = 100.0;
            player.score = 2;
        }

        let outcomes = game.step(5_000);

        assert_eq!(outcomes.len(), 1);
        let player = game.state().player(&roster[0]).unwrap();
        assert_eq!((player.x, player.y), (60.0, 100.0));
        assert_eq!(player.score, 1);
        assert_eq!(player.stunned_until, 7_000);
    }

    #[test]
    fn stunned_player_cannot_move_until_stun_elapses() {
        let (mut game, roster) = new_match(2);
        game.state.player_mut(&roster[0]).unwrap().stunned_until = 3_000;

        assert!(!game.move_player(&roster[0], 10.0, 10.0, 2_999));
        assert_eq!(game.state().player(&roster[0]).unwrap().x, 50.0);

        assert!(game.move_player(&roster[0], 10.0, 10.0, 3_000));
        assert_eq!(game.state().player(&roster[0]).unwrap().x, 10.0);
    }

    #[test]
    fn move_trusts_client_coordinates() {
        let (mut game, roster) = new_match(2);
        assert!(game.move_player(&roster[1], 5_000.0, -20.0, 0));
        let player = game.state().player(&roster[1]).unwrap();
        assert_eq!((player.x, player.y), (5_000.0, -20.0));
    }

    #[test]
    fn move_for_unknown_player_is_ignored() {
        let (mut game, _) = new_match(2);
        assert!(!game.move_player(&Uuid::new_v4(), 10.0, 10.0, 0));
    }

    #[test]
    fn token_is_credited_exactly_once() {
        let (mut game, roster) = new_match(2);

        assert_eq!(game.collect_token(&roster[0], 3), Some(1));
        assert_eq!(game.collect_token(&roster[1], 3), None);
        assert_eq!(game.collect_token(&roster[0], 3), None);

        let total: u32 = game.state().players.iter().map(|p| p.score).sum();
        assert_eq!(total, 1);
        assert!(game.state().tokens.iter().find(|t| t.id == 3).unwrap().collected);
    }

    #[test]
    fn unknown_collector_or_token_changes_nothing() {
        let (mut game, roster) = new_match(2);

        assert_eq!(game.collect_token(&Uuid::new_v4(), 1), None);
        assert!(!game.state().tokens[0].collected);

        assert_eq!(game.collect_token(&roster[0], 999), None);
        assert_eq!(game.state().player(&roster[0]).unwrap().score, 0);
    }

    #[test]
    fn removing_player_shrinks_roster() {
        let (mut game, roster) = new_match(3);
        assert!(game.remove_player(&roster[1]));
        assert!(!game.remove_player(&roster[1]));
        assert_eq!(game.roster(), vec![roster[0], roster[2]]);
    }

    #[test]
    fn expiry_only_with_duration_limit() {
        let roster = vec![Uuid::new_v4(), Uuid::new_v4()];
        let unbounded = GameMatch::new(Uuid::new_v4(), 1, &roster, 0, GameConfig::default());
        assert!(!unbounded.is_expired(u64::MAX / 2));

        let rules = GameConfig {
            match_duration: Some(Duration::from_secs(60)),
            ..GameConfig::default()
        };
        let bounded = GameMatch::new(Uuid::new_v4(), 1, &roster, 1_000, rules);
        assert!(!bounded.is_expired(60_999));
        assert!(bounded.is_expired(61_000));
    }

    #[test]
    fn huge_duration_limit_never_expires() {
        let roster = vec![Uuid::new_v4()];
        let rules = GameConfig {
            match_duration: Some(Duration::from_millis(u64::MAX)),
            ..GameConfig::default()
        };
        let game = GameMatch::new(Uuid::new_v4(), 1, &roster, 1_700_000_000_000, rules);
        assert!(!game.is_expired(1_700_000_000_050));
        assert!(game.is_expired(u64::MAX));
    }

    #[test]
    fn standings_rank_by_score() {
        let (mut game, roster) = new_match(3);
        game.collect_token(&roster[2], 1);
        game.collect_token(&roster[2], 2);
        game.collect_token(&roster[1], 3);

        let standings = game.standings();
        assert_eq!(standings[0].id, roster[2]);
        assert_eq!(standings[0].score, 2);
        assert_eq!(standings[1].id, roster[1]);
        assert_eq!(standings[2].id, roster[0]);
        assert_eq!(standings[2].rank, 3);
    }
}
