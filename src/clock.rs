// =============================================================================
// Wall-clock driver for the game clocks
//
// The game itself never reads the time. A `ClockDriver` thread wakes once per
// tick period, applies `Game::tick_clock_for` under the game lock, releases
// the lock and then notifies the host.
//
// Ownership: `SharedGame` is the single owner of the game and its driver.
// The clock thread and any `GameHandle` given to callbacks hold only weak
// references, so dropping the owner stops the thread and frees the game.
// Stopping is idempotent: the driver's channel is closed, the thread is
// joined, and the game's clock epoch is disarmed so a tick already in flight
// cannot land afterwards.
// =============================================================================

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::game::{ClockTick, Game};

type DriverSlot = Mutex<Option<ClockDriver>>;

fn stop_driver(game: &Mutex<Game>, slot: &DriverSlot) {
    let driver = slot.lock().take();
    game.lock().stop_clock();
    if let Some(mut driver) = driver {
        driver.stop();
    }
}

/// A game shared between the host and the clock thread. All access is
/// serialized through one lock. Dropping the owner stops the clock.
pub struct SharedGame {
    game: Arc<Mutex<Game>>,
    driver: Arc<DriverSlot>,
}

impl SharedGame {
    pub fn new(game: Game) -> Self {
        SharedGame {
            game: Arc::new(Mutex::new(game)),
            driver: Arc::new(Mutex::new(None)),
        }
    }

    /// A non-owning handle for clock callbacks and other observers.
    pub fn handle(&self) -> GameHandle {
        GameHandle {
            game: Arc::downgrade(&self.game),
            driver: Arc::downgrade(&self.driver),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&Game) -> R) -> R {
        f(&self.game.lock())
    }

    /// Run `f` with exclusive access. Do not call `stop_clock` or `reset`
    /// from inside `f`.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Game) -> R) -> R {
        f(&mut self.game.lock())
    }

    /// Start ticking the side to move once per configured period, calling
    /// `on_tick` after each tick. Replaces any running driver. A callback
    /// that needs the game should capture a `GameHandle`, not the owner.
    pub fn start_clock<F>(&self, on_tick: F) -> io::Result<()>
    where
        F: FnMut() + Send + 'static,
    {
        self.stop_clock();
        let driver = ClockDriver::start(self, on_tick)?;
        *self.driver.lock() = Some(driver);
        Ok(())
    }

    pub fn stop_clock(&self) {
        stop_driver(&self.game, &self.driver);
    }

    pub fn is_clock_running(&self) -> bool {
        self.with(Game::is_clock_running)
    }

    /// Stop the clock and return the game to its starting position.
    pub fn reset(&self) {
        self.stop_clock();
        self.game.lock().reset();
    }
}

impl Drop for SharedGame {
    fn drop(&mut self) {
        self.stop_clock();
    }
}

/// Weak view of a `SharedGame`. Every method is a no-op returning `None`
/// (or nothing) once the owner is gone.
#[derive(Clone)]
pub struct GameHandle {
    game: Weak<Mutex<Game>>,
    driver: Weak<DriverSlot>,
}

impl GameHandle {
    pub fn with<R>(&self, f: impl FnOnce(&Game) -> R) -> Option<R> {
        let game = self.game.upgrade()?;
        let guard = game.lock();
        Some(f(&guard))
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Game) -> R) -> Option<R> {
        let game = self.game.upgrade()?;
        let mut guard = game.lock();
        Some(f(&mut guard))
    }

    /// Stop the owner's clock. Safe to call from the clock callback.
    pub fn stop_clock(&self) {
        if let (Some(game), Some(slot)) = (self.game.upgrade(), self.driver.upgrade()) {
            stop_driver(&game, &slot);
        }
    }

    pub fn is_alive(&self) -> bool {
        self.game.strong_count() > 0
    }
}

/// Handle to a running clock thread. Dropping it stops the thread.
pub struct ClockDriver {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ClockDriver {
    /// Arm the game's clock and spawn the ticking thread. The thread exits on
    /// its own if the game is dropped.
    pub fn start<F>(shared: &SharedGame, mut on_tick: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (epoch, period) = shared.with_mut(|game| {
            let period = Duration::from_millis(game.config().tick_millis);
            (game.start_clock(), period)
        });
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let game = Arc::downgrade(&shared.game);

        let handle = thread::Builder::new()
            .name("game-clock".to_string())
            .spawn(move || {
                debug!(epoch, ?period, "clock started");
                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    let Some(game) = game.upgrade() else {
                        break;
                    };
                    let tick = game.lock().tick_clock_for(epoch);
                    drop(game);
                    match tick {
                        ClockTick::Running => on_tick(),
                        ClockTick::Expired => {
                            on_tick();
                            break;
                        }
                        ClockTick::Stopped => break,
                    }
                }
                debug!(epoch, "clock stopped");
            })?;

        Ok(ClockDriver {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop the thread and wait for it to exit. Safe to call more than once,
    /// and from the clock thread itself.
    pub fn stop(&mut self) {
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for ClockDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
