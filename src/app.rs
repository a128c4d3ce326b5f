//! App: terminal init, main loop, tick and key handling.

use crate::GameConfig;
use crate::driver::{Command, CommandQueue, Driver, Step, Ticker};
use crate::input::{Action, key_to_action};
use crate::render::ScoreDisplay;
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event};
use log::{debug, info, trace};
use rand::rngs::StdRng;
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

/// Sidebar score readout; the driver pushes every new score into it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScorePanel {
    value: u32,
}

impl ScorePanel {
    pub fn value(&self) -> u32 {
        self.value
    }
}

impl ScoreDisplay for ScorePanel {
    fn show_score(&mut self, score: u32) {
        self.value = score;
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    driver: Driver,
    queue: CommandQueue,
    ticker: Ticker,
    score: ScorePanel,
    needs_redraw: bool,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, rng: StdRng) -> Self {
        let driver = Driver::new(&config, rng);
        let ticker = Ticker::new(config.tick_interval, Instant::now());
        Self {
            config,
            theme,
            driver,
            queue: CommandQueue::new(),
            ticker,
            score: ScorePanel::default(),
            needs_redraw: true,
        }
    }

    /// Queue a key action. Returns true when the player asked to quit.
    fn on_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::None => {}
            action => self.queue.push(Command::Input(action)),
        }
        false
    }

    /// Queue the tick due at `now`, if any. One per loop pass, so every tick gets a redraw.
    fn on_clock(&mut self, now: Instant) {
        if self.ticker.fire(now) {
            self.queue.push(Command::Tick);
        }
    }

    /// Run everything queued through the driver.
    fn flush(&mut self) -> Result<Step> {
        if self.queue.is_empty() {
            return Ok(Step::default());
        }
        trace!("draining {} command(s)", self.queue.len());
        let step = self.driver.drain(&mut self.queue, &mut self.score)?;
        if step.locked {
            debug!("piece locked, score {}", self.score.value());
        }
        if step.topped_out {
            info!("topped out with score {}", self.score.value());
        }
        self.needs_redraw |= step.redraw || step.score_changed || step.topped_out;
        Ok(step)
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            cursor::Show,
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen, Show)?;
        disable_raw_mode()?;

        info!(
            "game ended, score {}, topped out: {}",
            self.score.value(),
            self.driver.state().is_topped_out()
        );
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.ticker = Ticker::new(self.config.tick_interval, Instant::now());
        loop {
            if self.needs_redraw {
                let state = self.driver.state();
                let (theme, score, bs) = (&self.theme, self.score.value(), self.config.block_size);
                terminal.draw(|f| crate::ui::draw(f, state, theme, score, bs))?;
                self.needs_redraw = false;
            }

            let timeout = self.ticker.timeout(Instant::now());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) => {
                            if self.on_action(key_to_action(key)) {
                                return Ok(());
                            }
                        }
                        Event::Resize(..) => self.needs_redraw = true,
                        _ => {}
                    }
                }
            }

            self.on_clock(Instant::now());
            self.flush()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn app() -> App {
        App::new(
            GameConfig::default(),
            Theme::default(),
            StdRng::seed_from_u64(3),
        )
    }

    #[test]
    fn test_quit_and_ignored_keys() {
        let mut app = app();
        assert!(!app.on_action(Action::None));
        assert!(app.queue.is_empty());
        assert!(app.on_action(Action::Quit));
        assert!(app.queue.is_empty());
    }

    #[test]
    fn test_inputs_apply_on_flush() {
        let mut app = app();
        let start = app.driver.state().piece.pos;
        app.needs_redraw = false;
        assert!(!app.on_action(Action::MoveDown));
        assert_eq!(app.queue.len(), 1);

        let step = app.flush().unwrap();

        assert!(step.redraw);
        assert!(app.needs_redraw);
        assert!(app.queue.is_empty());
        assert_eq!(app.driver.state().piece.pos, start.offset(0, 1));
    }

    #[test]
    fn test_clock_queues_one_tick_per_pass() {
        let mut app = app();
        let t0 = Instant::now();
        let period = app.config.tick_interval;
        app.ticker = Ticker::new(period, t0);
        app.on_clock(t0 + period / 2);
        assert!(app.queue.is_empty());

        let y0 = app.driver.state().piece.pos.y;
        for n in 1..=3 {
            app.on_clock(t0 + period * n);
            assert_eq!(app.queue.len(), 1);
            app.flush().unwrap();
        }
        assert_eq!(app.driver.state().piece.pos.y, y0 + 3);
    }

    #[test]
    fn test_clock_after_long_stall_queues_single_tick() {
        let mut app = app();
        let t0 = Instant::now();
        app.ticker = Ticker::new(app.config.tick_interval, t0);
        let y0 = app.driver.state().piece.pos.y;

        app.on_clock(t0 + Duration::from_secs(30));
        assert_eq!(app.queue.len(), 1);
        let step = app.flush().unwrap();

        assert!(!step.locked);
        assert_eq!(app.driver.state().piece.pos.y, y0 + 1);
        assert!(app.driver.state().grid.rows_iter().flatten().all(|c| !c.is_filled()));
    }

    #[test]
    fn test_flush_empty_queue_is_noop() {
        let mut app = app();
        app.needs_redraw = false;
        assert_eq!(app.flush().unwrap(), Step::default());
        assert!(!app.needs_redraw);
        assert_eq!(app.score.value(), 0);
    }
}
