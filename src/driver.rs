//! Game loop driver: game state, command queue, tick source.
//!
//! Ticks and key presses both become [`Command`]s on one queue. The driver handles one
//! command at a time and each runs to completion before the next is looked at.

use crate::GameConfig;
use crate::engine::{self, GravityStep};
use crate::grid::{Grid, GridError};
use crate::input::Action;
use crate::piece::{ActivePiece, random_definition};
use crate::render::ScoreDisplay;
use log::{debug, info};
use rand::rngs::StdRng;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A piece is falling and accepts input.
    Spawned,
    /// The last spawn overlapped locked cells; nothing moves any more.
    ToppedOut,
}

/// Everything a game session mutates.
#[derive(Debug, Clone)]
pub struct GameState {
    pub grid: Grid,
    pub score: u32,
    pub piece: ActivePiece,
    pub status: Status,
}

impl GameState {
    /// Empty grid with a freshly spawned piece.
    pub fn new(config: &GameConfig, rng: &mut StdRng) -> Self {
        let grid = Grid::new(config.rows, config.columns);
        let piece = ActivePiece::spawn(random_definition(rng), grid.columns());
        Self {
            grid,
            score: 0,
            piece,
            status: Status::Spawned,
        }
    }

    #[inline]
    pub fn is_topped_out(&self) -> bool {
        self.status == Status::ToppedOut
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Tick,
    Input(Action),
}

/// FIFO of pending commands.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    pub fn pop(&mut self) -> Option<Command> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Fixed-period wall-clock tick source. A slightly late poll keeps the period grid; a stall
/// longer than a period drops the missed ticks and restarts the grid from `now`.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next_due: Instant,
}

impl Ticker {
    pub fn new(period: Duration, start: Instant) -> Self {
        Self {
            period,
            next_due: start + period,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    /// Consume the tick due at `now`, if any. At most one tick fires per call.
    pub fn fire(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.next_due += self.period;
        if self.next_due <= now {
            debug!("tick {:?} behind, re-anchoring", now - self.next_due);
            self.next_due = now + self.period;
        }
        true
    }

    /// How long to wait for input before the next tick is due.
    pub fn timeout(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }
}

/// Side effects the front end should act on after handling commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Step {
    pub redraw: bool,
    pub locked: bool,
    pub score_changed: bool,
    /// The lock in this step left no room for the next piece.
    pub topped_out: bool,
}

impl Step {
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            redraw: self.redraw || other.redraw,
            locked: self.locked || other.locked,
            score_changed: self.score_changed || other.score_changed,
            topped_out: self.topped_out || other.topped_out,
        }
    }
}

pub struct Driver {
    state: GameState,
    rng: StdRng,
}

impl Driver {
    pub fn new(config: &GameConfig, mut rng: StdRng) -> Self {
        let state = GameState::new(config, &mut rng);
        info!(
            "new game {}x{}, first piece {:?}",
            config.columns, config.rows, state.piece.color
        );
        Self { state, rng }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Run one command to completion.
    pub fn handle<D: ScoreDisplay + ?Sized>(
        &mut self,
        command: Command,
        display: &mut D,
    ) -> Result<Step, GridError> {
        if self.state.is_topped_out() {
            return Ok(Step::default());
        }
        match command {
            Command::Tick => self.tick(display),
            Command::Input(action) => Ok(self.input(action)),
        }
    }

    /// Handle every queued command in order.
    pub fn drain<D: ScoreDisplay + ?Sized>(
        &mut self,
        queue: &mut CommandQueue,
        display: &mut D,
    ) -> Result<Step, GridError> {
        let mut step = Step::default();
        while let Some(command) = queue.pop() {
            step = step.merge(self.handle(command, display)?);
        }
        Ok(step)
    }

    fn tick<D: ScoreDisplay + ?Sized>(&mut self, display: &mut D) -> Result<Step, GridError> {
        let mut step = Step {
            redraw: true,
            ..Step::default()
        };
        if engine::apply_gravity_step(&self.state.grid, &mut self.state.piece) == GravityStep::Locked {
            let outcome = engine::lock_and_respawn(&mut self.state, &mut self.rng)?;
            step.locked = true;
            step.topped_out = outcome.topped_out;
            if outcome.lines_cleared > 0 {
                step.score_changed = true;
                display.show_score(self.state.score);
            }
        }
        Ok(step)
    }

    fn input(&mut self, action: Action) -> Step {
        let changed = match action {
            Action::MoveLeft => engine::try_move(&mut self.state, -1, 0),
            Action::MoveRight => engine::try_move(&mut self.state, 1, 0),
            Action::MoveDown => engine::try_move(&mut self.state, 0, 1),
            Action::Rotate => engine::try_rotate(&mut self.state),
            Action::Quit | Action::None => false,
        };
        if changed {
            debug!("{:?} -> ({}, {})", action, self.state.piece.pos.x, self.state.piece.pos.y);
        }
        Step {
            redraw: changed,
            ..Step::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::piece::{PieceColor, Position, Shape, catalog};
    use rand::SeedableRng;

    #[derive(Default)]
    struct Scores(Vec<u32>);

    impl ScoreDisplay for Scores {
        fn show_score(&mut self, score: u32) {
            self.0.push(score);
        }
    }

    fn prepared(piece: ActivePiece) -> Driver {
        let config = GameConfig::default();
        let state = GameState {
            grid: Grid::new(config.rows, config.columns),
            score: 0,
            piece,
            status: Status::Spawned,
        };
        Driver {
            state,
            rng: StdRng::seed_from_u64(42),
        }
    }

    fn o_piece(x: i32, y: i32) -> ActivePiece {
        let def = &catalog()[2];
        ActivePiece {
            shape: def.shape.clone(),
            color: def.color,
            pos: Position::new(x, y),
        }
    }

    #[test]
    fn test_new_game_spawns_piece_on_empty_grid() {
        let config = GameConfig::default();
        let driver = Driver::new(&config, StdRng::seed_from_u64(9));
        let state = driver.state();
        assert_eq!(state.score, 0);
        assert_eq!(state.status, Status::Spawned);
        assert_eq!(state.piece.pos.y, 0);
        assert_eq!(
            state.piece.pos.x,
            (config.columns / 2) as i32 - (state.piece.shape.width() / 2) as i32
        );
        assert!(state.grid.rows_iter().flatten().all(|c| *c == Cell::Empty));
    }

    #[test]
    fn test_same_seed_same_game() {
        let config = GameConfig::default();
        let mut a = Driver::new(&config, StdRng::seed_from_u64(5));
        let mut b = Driver::new(&config, StdRng::seed_from_u64(5));
        let mut sink = Scores::default();
        for _ in 0..100 {
            a.handle(Command::Tick, &mut sink).unwrap();
            b.handle(Command::Tick, &mut sink).unwrap();
        }
        assert_eq!(a.state().grid, b.state().grid);
        assert_eq!(a.state().piece, b.state().piece);
    }

    #[test]
    fn test_o_piece_locks_after_nineteen_ticks() {
        let mut driver = prepared(o_piece(4, 0));
        let mut sink = Scores::default();
        for _ in 0..18 {
            let step = driver.handle(Command::Tick, &mut sink).unwrap();
            assert!(step.redraw);
            assert!(!step.locked);
        }
        assert_eq!(driver.state().piece.pos, Position::new(4, 18));

        let step = driver.handle(Command::Tick, &mut sink).unwrap();
        assert!(step.locked && step.redraw && !step.score_changed);

        let grid = &driver.state().grid;
        for (x, y) in [(4, 18), (5, 18), (4, 19), (5, 19)] {
            assert_eq!(grid.get(x, y), Ok(Cell::Filled(PieceColor::Yellow)));
        }
        assert_eq!(grid.rows_iter().flatten().filter(|c| c.is_filled()).count(), 4);
        assert_eq!(driver.state().piece.pos.y, 0);
        assert!(sink.0.is_empty());
    }

    #[test]
    fn test_line_clear_updates_score_display() {
        let mut driver = prepared(ActivePiece {
            shape: Shape::from_rows(&[&[1]]),
            color: PieceColor::Cyan,
            pos: Position::new(5, 19),
        });
        for x in (0..10).filter(|&x| x != 5) {
            driver.state.grid.set(x, 19, PieceColor::Red).unwrap();
        }
        let mut sink = Scores::default();

        let step = driver.handle(Command::Tick, &mut sink).unwrap();

        assert!(step.locked && step.score_changed);
        assert_eq!(driver.state().score, 100);
        assert_eq!(sink.0, vec![100]);
        assert!(driver.state().grid.rows_iter().flatten().all(|c| !c.is_filled()));
    }

    #[test]
    fn test_inputs_move_and_rotate() {
        let mut driver = prepared(o_piece(4, 3));
        let mut sink = Scores::default();
        let mut queue = CommandQueue::new();
        queue.push(Command::Input(Action::MoveLeft));
        queue.push(Command::Input(Action::MoveLeft));
        queue.push(Command::Input(Action::MoveRight));
        queue.push(Command::Input(Action::MoveDown));
        assert_eq!(queue.len(), 4);

        let step = driver.drain(&mut queue, &mut sink).unwrap();

        assert!(queue.is_empty());
        assert!(step.redraw && !step.locked);
        assert_eq!(driver.state().piece.pos, Position::new(3, 4));
    }

    #[test]
    fn test_blocked_input_is_ignored() {
        let mut driver = prepared(o_piece(0, 18));
        let mut sink = Scores::default();
        for action in [Action::MoveLeft, Action::MoveDown, Action::Quit, Action::None] {
            let step = driver.handle(Command::Input(action), &mut sink).unwrap();
            assert_eq!(step, Step::default());
        }
        assert_eq!(driver.state().piece.pos, Position::new(0, 18));
        // soft drop never locks, even against the floor
        assert!(driver.state().grid.rows_iter().flatten().all(|c| !c.is_filled()));
    }

    #[test]
    fn test_rotate_input_discarded_when_blocked() {
        let mut driver = prepared(ActivePiece {
            shape: catalog()[0].shape.clone(),
            color: PieceColor::Cyan,
            pos: Position::new(6, 18),
        });
        let mut sink = Scores::default();
        let step = driver.handle(Command::Input(Action::Rotate), &mut sink).unwrap();
        assert!(!step.redraw);
        assert_eq!(driver.state().piece.shape, catalog()[0].shape);
    }

    #[test]
    fn test_topped_out_ignores_commands() {
        let mut driver = prepared(o_piece(4, 0));
        driver.state.status = Status::ToppedOut;
        let mut sink = Scores::default();
        for command in [Command::Tick, Command::Input(Action::MoveLeft)] {
            assert_eq!(driver.handle(command, &mut sink).unwrap(), Step::default());
        }
        assert_eq!(driver.state().piece.pos, Position::new(4, 0));
    }

    #[test]
    fn test_blocked_spawn_reports_topped_out_step() {
        let mut driver = prepared(o_piece(0, 18));
        for y in 0..2 {
            for x in 1..10 {
                driver.state.grid.set(x, y, PieceColor::Blue).unwrap();
            }
        }
        let mut sink = Scores::default();

        let step = driver.handle(Command::Tick, &mut sink).unwrap();

        assert!(step.locked && step.topped_out && step.redraw);
        assert!(driver.state().is_topped_out());
        assert_eq!(driver.handle(Command::Tick, &mut sink).unwrap(), Step::default());
    }

    #[test]
    fn test_game_eventually_tops_out() {
        let config = GameConfig::default();
        let mut driver = Driver::new(&config, StdRng::seed_from_u64(11));
        let mut sink = Scores::default();
        let mut ticks = 0;
        while !driver.state().is_topped_out() {
            let step = driver.handle(Command::Tick, &mut sink).unwrap();
            assert_eq!(step.topped_out, driver.state().is_topped_out());
            ticks += 1;
            assert!(ticks < 100_000);
        }
        assert_eq!(driver.handle(Command::Tick, &mut sink).unwrap(), Step::default());
    }

    #[test]
    fn test_ticker_fires_on_period_boundaries() {
        let start = Instant::now();
        let period = Duration::from_millis(500);
        let mut ticker = Ticker::new(period, start);

        assert!(!ticker.is_due(start));
        assert_eq!(ticker.timeout(start), period);
        assert!(!ticker.fire(start + Duration::from_millis(499)));
        assert!(ticker.fire(start + Duration::from_millis(500)));
        assert!(!ticker.fire(start + Duration::from_millis(700)));
        assert_eq!(
            ticker.timeout(start + Duration::from_millis(700)),
            Duration::from_millis(300)
        );
        // slightly late: next deadline stays on the period grid
        assert!(ticker.fire(start + Duration::from_millis(1100)));
        assert_eq!(
            ticker.timeout(start + Duration::from_millis(1100)),
            Duration::from_millis(400)
        );
    }

    #[test]
    fn test_ticker_long_stall_fires_once() {
        let start = Instant::now();
        let period = Duration::from_millis(500);
        let mut ticker = Ticker::new(period, start);
        let late = start + Duration::from_secs(30);

        assert!(ticker.fire(late));
        assert!(!ticker.fire(late));
        assert_eq!(ticker.timeout(late), period);
        assert!(!ticker.fire(late + Duration::from_millis(499)));
        assert!(ticker.fire(late + period));
    }
}
