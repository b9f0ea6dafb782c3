// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Notification dispatcher - schedules, shows and dismisses tips
//!
//! Lifecycle: `Idle -> Scheduled -> Showing -> Idle`. At most one tip is
//! active at a time. Every transition is reported to the single registered
//! [`NotificationSubscriber`]; persisting what was shown is up to the caller.
//!
//! Timer callbacks carry a generation number. Cancelling or re-arming a
//! timer bumps the generation, so a callback that was already on its way
//! when it got cancelled is ignored instead of dismissing a newer tip.

use crate::catalog::Catalog;
use crate::clock::{Clock, SystemClock};
use crate::config::DispatcherConfig;
use crate::eligibility::{pick_for_tag, RateLimit};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::types::{Breakpoint, NotificationMessage, NotificationPrefs, RouteTag};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, trace};

/// Receives show (`Some`) and hide (`None`) transitions
pub trait NotificationSubscriber: Send + Sync {
    /// Called synchronously on every transition
    fn update_user_notifications(&self, notification: Option<&NotificationMessage>);
}

impl<F> NotificationSubscriber for F
where
    F: Fn(Option<&NotificationMessage>) + Send + Sync,
{
    fn update_user_notifications(&self, notification: Option<&NotificationMessage>) {
        self(notification);
    }
}

/// Where the dispatcher is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing scheduled, nothing shown
    Idle,
    /// Waiting for the start delay to elapse
    Scheduled,
    /// A tip is visible
    Showing,
}

#[derive(Debug, Default)]
struct State {
    active: Option<NotificationMessage>,
    start_timer: Option<TimerHandle>,
    dismiss_timer: Option<TimerHandle>,
    start_generation: u64,
    dismiss_generation: u64,
    breakpoint: Option<Breakpoint>,
    prefs: Option<NotificationPrefs>,
    route: Option<String>,
}

impl State {
    fn phase(&self) -> Phase {
        if self.active.is_some() {
            Phase::Showing
        } else if self.start_timer.is_some() {
            Phase::Scheduled
        } else {
            Phase::Idle
        }
    }

    fn cancel_start(&mut self) {
        self.start_generation += 1;
        if let Some(timer) = self.start_timer.take() {
            timer.cancel();
        }
    }

    fn cancel_dismiss(&mut self) {
        self.dismiss_generation += 1;
        if let Some(timer) = self.dismiss_timer.take() {
            timer.cancel();
        }
    }

    fn route_tag(&self) -> Option<RouteTag> {
        self.route.as_deref().and_then(RouteTag::from_path)
    }
}

struct Shared {
    catalog: Catalog,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    config: DispatcherConfig,
    rng: Mutex<Box<dyn RngCore + Send>>,
    state: Mutex<State>,
    subscriber: Mutex<Option<Arc<dyn NotificationSubscriber>>>,
}

/// Tip dispatcher for one page session.
///
/// Cloning is cheap; clones drive the same state.
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
}

/// Builder for [`Dispatcher`]
pub struct DispatcherBuilder {
    catalog: Catalog,
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
    rng: Box<dyn RngCore + Send>,
    config: DispatcherConfig,
}

impl DispatcherBuilder {
    /// Use a specific time source
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a specific random source
    #[must_use]
    pub fn rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Override timings and breakpoint rules
    #[must_use]
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            shared: Arc::new(Shared {
                catalog: self.catalog,
                clock: self.clock,
                scheduler: self.scheduler,
                config: self.config,
                rng: Mutex::new(self.rng),
                state: Mutex::new(State::default()),
                subscriber: Mutex::new(None),
            }),
        }
    }
}

impl Dispatcher {
    /// Start building a dispatcher over `catalog`, using `scheduler` for
    /// its timers. Defaults to the system clock and an entropy-seeded RNG.
    #[must_use]
    pub fn builder(catalog: Catalog, scheduler: Arc<dyn Scheduler>) -> DispatcherBuilder {
        DispatcherBuilder {
            catalog,
            scheduler,
            clock: Arc::new(SystemClock),
            rng: Box::new(StdRng::from_entropy()),
            config: DispatcherConfig::default(),
        }
    }

    /// Dispatcher with all defaults
    #[must_use]
    pub fn new(catalog: Catalog, scheduler: Arc<dyn Scheduler>) -> Self {
        Self::builder(catalog, scheduler).build()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn downgrade(&self) -> Weak<Shared> {
        Arc::downgrade(&self.shared)
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    /// Register the listener, replacing any previous one
    pub fn subscribe(&self, subscriber: Arc<dyn NotificationSubscriber>) {
        *self
            .shared
            .subscriber
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(subscriber);
    }

    /// Drop the registered listener
    pub fn unsubscribe(&self) {
        self.shared
            .subscriber
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn notify(&self, notification: Option<&NotificationMessage>) {
        let subscriber = self
            .shared
            .subscriber
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(subscriber) = subscriber {
            subscriber.update_user_notifications(notification);
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Begin a session: after the start delay, show a tip for `route`
    /// unless the device is small or the daily limit has been reached.
    pub fn start(&self, prefs: NotificationPrefs, breakpoint: Breakpoint, route: &str) {
        let generation = {
            let mut state = self.state();
            state.prefs = Some(prefs);
            state.breakpoint = Some(breakpoint);
            state.route = Some(route.to_string());
            state.cancel_start();
            state.start_generation
        };
        debug!("Scheduling tip pick in {:?} ({} on {})", self.shared.config.start_delay, route, breakpoint);

        let weak = self.downgrade();
        let handle = self.shared.scheduler.after(
            self.shared.config.start_delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Dispatcher { shared }.on_start_elapsed(generation);
                }
            }),
        );

        let mut state = self.state();
        if state.start_generation == generation {
            state.start_timer = Some(handle);
        } else {
            handle.cancel();
        }
    }

    fn on_start_elapsed(&self, generation: u64) {
        let (dismissed, picked) = {
            let mut state = self.state();
            if state.start_generation != generation {
                trace!("Ignoring stale start timer");
                return;
            }
            state.start_generation += 1;
            state.start_timer = None;
            state.cancel_dismiss();
            let dismissed = state.active.take();

            let picked = match state.breakpoint {
                Some(bp) if self.shared.config.suppresses(bp) => {
                    debug!("Skipping tip on small breakpoint {}", bp);
                    None
                }
                _ => {
                    let limit = RateLimit {
                        now: self.shared.clock.now(),
                        window: self.shared.config.rate_limit,
                    };
                    self.pick_locked(&state, Some(limit))
                }
            };
            (dismissed, picked)
        };

        if let Some(message) = dismissed {
            debug!("Replacing tip {}", message.id);
            self.notify(None);
        }
        match picked {
            Some(message) => self.show(message),
            None => debug!("No tip eligible at start"),
        }
    }

    fn pick_locked(&self, state: &State, limit: Option<RateLimit>) -> Option<NotificationMessage> {
        let mut rng = self.shared.rng.lock().unwrap_or_else(PoisonError::into_inner);
        pick_for_tag(
            &self.shared.catalog,
            state.prefs.as_ref(),
            state.route_tag(),
            limit,
            &mut **rng,
        )
        .cloned()
    }

    fn show(&self, message: NotificationMessage) {
        let generation = {
            let mut state = self.state();
            state.cancel_dismiss();
            state.active = Some(message.clone());
            state.dismiss_generation
        };
        debug!("Showing tip {}", message.id);
        self.notify(Some(&message));

        let weak = self.downgrade();
        let handle = self.shared.scheduler.after(
            self.shared.config.display_duration,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Dispatcher { shared }.on_dismiss_elapsed(generation);
                }
            }),
        );

        let mut state = self.state();
        if state.dismiss_generation == generation {
            state.dismiss_timer = Some(handle);
        } else {
            handle.cancel();
        }
    }

    fn on_dismiss_elapsed(&self, generation: u64) {
        let dismissed = {
            let mut state = self.state();
            if state.dismiss_generation != generation {
                trace!("Ignoring stale dismiss timer");
                return;
            }
            state.dismiss_generation += 1;
            state.dismiss_timer = None;
            state.active.take()
        };

        if let Some(message) = dismissed {
            debug!("Auto-dismissing tip {}", message.id);
            self.notify(None);
        }
    }

    /// Hide the current tip right away. `new_route` records where the user
    /// navigated to, for later picks. Does nothing visible when idle.
    pub fn dismiss_notification(&self, new_route: Option<&str>) {
        let dismissed = {
            let mut state = self.state();
            if let Some(route) = new_route {
                state.route = Some(route.to_string());
            }
            state.cancel_dismiss();
            state.active.take()
        };

        if let Some(message) = dismissed {
            debug!("Dismissed tip {}", message.id);
            self.notify(None);
        }
    }

    /// Replace the stored prefs without touching what is on screen
    pub fn update_settings(&self, prefs: NotificationPrefs) {
        self.state().prefs = Some(prefs);
    }

    /// Cancel all pending timers. The active tip, if any, stays recorded.
    pub fn close(&self) {
        let mut state = self.state();
        state.cancel_start();
        state.cancel_dismiss();
        debug!("Dispatcher closed");
    }

    /// Manually fetch the next tip, ignoring the daily limit. A visible tip
    /// is dismissed first.
    pub fn show_next(&self, route: Option<&str>) -> Option<NotificationMessage> {
        let (dismissed, picked) = {
            let mut state = self.state();
            if let Some(route) = route {
                state.route = Some(route.to_string());
            }
            state.cancel_dismiss();
            let dismissed = state.active.take();
            let picked = self.pick_locked(&state, None);
            (dismissed, picked)
        };

        if dismissed.is_some() {
            self.notify(None);
        }
        if let Some(message) = &picked {
            self.show(message.clone());
        }
        picked
    }

    /// Show a specific tip now. A visible tip is dismissed first.
    pub fn post_notification(&self, message: NotificationMessage) {
        let dismissed = {
            let mut state = self.state();
            state.cancel_dismiss();
            state.active.take()
        };

        if dismissed.is_some() {
            self.notify(None);
        }
        self.show(message);
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Tip currently on screen
    #[must_use]
    pub fn active(&self) -> Option<NotificationMessage> {
        self.state().active.clone()
    }

    /// Current lifecycle phase
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state().phase()
    }

    /// Last prefs supplied by the caller
    #[must_use]
    pub fn prefs(&self) -> Option<NotificationPrefs> {
        self.state().prefs.clone()
    }

    /// Last breakpoint supplied by the caller
    #[must_use]
    pub fn breakpoint(&self) -> Option<Breakpoint> {
        self.state().breakpoint
    }

    /// Last known route
    #[must_use]
    pub fn route(&self) -> Option<String> {
        self.state().route.clone()
    }

    /// The catalog tips are drawn from
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.shared.catalog
    }

    /// Active timings
    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.shared.config
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Dispatcher")
            .field("phase", &state.phase())
            .field("active", &state.active.as_ref().map(|m| &m.id))
            .field("route", &state.route)
            .field("catalog", &self.shared.catalog.len())
            .finish_non_exhaustive()
    }
}
