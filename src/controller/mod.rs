//! Main screen controller
//!
//! Polls the glucose cache on a fixed interval, evaluates the alarm rule,
//! drives the alarm sound and paints the [`Screen`] and chart. All state is
//! owned by one task; slow work (fresh loads, the snooze safety timer) runs
//! in spawned tasks that post a [`ControllerEvent`] back to it.
//!
//! Every tick paints twice: the cached reading is painted synchronously so a
//! stale value is visible at once, and the fresh load repaints when it
//! resolves. Loads carry the sequence number of the tick that started them
//! and a result older than one already applied is dropped.

mod gestures;
mod screen;
mod view;

#[cfg(test)]
mod tests;

pub use gestures::{swipe_velocity, GesturePhase, PanEvent, PanTracker, PinchEvent};
pub use screen::{raw_panel_visible, snooze_button_text, ErrorBanner, Label, RawPanel, Screen};
pub use view::MainView;

use anyhow::Result;
use chrono::{Local, Utc};
use glucowatch_core::{
    AlarmRule, CacheError, ChartScene, CompanionSync, DisplayControl, GlucoseCache,
    GuiStateRepository, LoadFuture, Reading, Series, SoundPlayer, MAX_SNOOZE_MINUTES, POLL_INTERVAL,
    SNOOZE_SAFETY_WINDOW, SWIPE_VELOCITY_THRESHOLD, WATCHDOG_INTERVAL,
};
use log::{debug, info, trace, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::ui::ColorScheme;

const SCREENLOCK_MESSAGE_TITLE: &str = "Keep the screen active";
const SCREENLOCK_MESSAGE: &str =
    "Turn this switch to disable the screenlock and prevent the app to get stopped!";

/// Timing and gesture settings
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub poll_interval: Duration,
    /// Period of the poll loop health check
    pub watchdog_interval: Duration,
    pub snooze_safety_window: Duration,
    pub swipe_velocity_threshold: f64,
    /// Widest chart canvas the display supports
    pub canvas_width: u32,
    /// Stop after this many poll cycles
    pub max_ticks: Option<u64>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            watchdog_interval: WATCHDOG_INTERVAL,
            snooze_safety_window: SNOOZE_SAFETY_WINDOW,
            swipe_velocity_threshold: SWIPE_VELOCITY_THRESHOLD,
            canvas_width: 1024,
            max_ticks: None,
        }
    }
}

/// Collaborators the controller works with
#[derive(Clone)]
pub struct Services {
    pub cache: Arc<dyn GlucoseCache>,
    pub alarm_rule: Arc<dyn AlarmRule>,
    pub sound: Arc<dyn SoundPlayer>,
    pub settings: Arc<dyn GuiStateRepository>,
    pub companion: Arc<dyn CompanionSync>,
    pub display: Arc<dyn DisplayControl>,
    pub colors: Arc<dyn ColorScheme>,
}

/// User input
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    /// Finger touched the chart
    TouchDown,
    Pan(PanEvent),
    Pinch(PinchEvent),
    ToggleSnooze,
    /// Answer of the snooze picker, in minutes
    SnoozeFor(i64),
    SetScreenlock(bool),
    /// App moved to the foreground (`true`) or background
    Foreground(bool),
    RepaintChart,
    Quit,
}

/// Results posted back by spawned work
#[derive(Debug)]
pub enum ControllerEvent {
    CurrentLoaded {
        seq: u64,
        result: Result<Reading, CacheError>,
    },
    TodayLoaded {
        seq: u64,
        result: Result<Series, CacheError>,
    },
    YesterdayLoaded {
        seq: u64,
        result: Result<Series, CacheError>,
    },
    SnoozeSafetyElapsed,
}

/// Newest tick sequence applied per fresh-load stream
#[derive(Debug, Default)]
struct AppliedLoads {
    current: u64,
    today: u64,
    yesterday: u64,
}

fn accept_seq(applied: &mut u64, seq: u64) -> bool {
    if seq < *applied {
        return false;
    }
    *applied = seq;
    true
}

/// Controller of the main screen
pub struct MainController {
    services: Services,
    config: ControllerConfig,
    chart: Box<dyn ChartScene>,
    view: Box<dyn MainView>,
    screen: Screen,
    pan: PanTracker,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
    tick_seq: u64,
    applied: AppliedLoads,
    foreground: bool,
    last_tick: Option<Instant>,
}

impl MainController {
    pub fn new(
        services: Services,
        config: ControllerConfig,
        chart: Box<dyn ChartScene>,
        view: Box<dyn MainView>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            services,
            config,
            chart,
            view,
            screen: Screen::default(),
            pan: PanTracker::default(),
            events_tx,
            events_rx,
            tick_seq: 0,
            applied: AppliedLoads::default(),
            foreground: true,
            last_tick: None,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Number of poll cycles run so far
    pub fn ticks(&self) -> u64 {
        self.tick_seq
    }

    /// Restore persisted GUI state and paint the cached reading
    pub fn start(&mut self) {
        let screenlock = self.services.settings.load_screenlock_state();
        self.apply_screenlock(screenlock);
        self.screen.screenlock_switch = self.services.display.is_idle_timer_disabled();

        let cached = self.services.cache.current_reading();
        self.paint_current(&cached);
        self.view.render(&self.screen);
    }

    /// One poll cycle
    pub fn tick(&mut self) {
        self.tick_seq += 1;
        self.last_tick = Some(Instant::now());
        trace!("Poll tick {}", self.tick_seq);

        self.evaluate_alarm();
        self.update_snooze_button();
        self.screen.paint_clock(Local::now());
        self.load_and_paint_current();
        self.load_and_paint_chart(false);

        self.view.render(&self.screen);
    }

    fn evaluate_alarm(&mut self) {
        let current = self.services.cache.current_reading();
        let today = self.services.cache.today_series();

        if self.services.alarm_rule.should_alarm(&current, &today) {
            if self.foreground {
                self.services.sound.play();
            } else {
                debug!("Alarm active while in background, sound not started");
            }
        } else {
            self.services.sound.stop();
        }
    }

    fn update_snooze_button(&mut self) {
        let rule = &self.services.alarm_rule;
        self.screen.snooze_button =
            snooze_button_text(rule.is_snoozed(), rule.remaining_snooze_minutes());
    }

    fn spawn_load<T, F>(&self, load: LoadFuture<T>, into_event: F)
    where
        T: Send + 'static,
        F: FnOnce(Result<T, CacheError>) -> ControllerEvent + Send + 'static,
    {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = load.await;
            // The receiver only goes away when the controller is dropped
            let _ = tx.send(into_event(result));
        });
    }

    fn load_and_paint_current(&mut self) {
        let seq = self.tick_seq;
        self.spawn_load(self.services.cache.load_current_reading(), move |result| {
            ControllerEvent::CurrentLoaded { seq, result }
        });

        // Shows old values right away when the server is slow or down
        let cached = self.services.cache.current_reading();
        self.paint_current(&cached);
    }

    fn paint_current(&mut self, reading: &Reading) {
        let settings = &self.services.settings;
        self.screen.paint_reading(
            reading,
            self.services.colors.as_ref(),
            settings.show_raw_bg(),
            settings.units(),
            Utc::now(),
        );
    }

    fn load_and_paint_chart(&mut self, force_repaint: bool) {
        let seq = self.tick_seq;
        let cache = &self.services.cache;
        self.spawn_load(cache.load_today_series(), move |result| {
            ControllerEvent::TodayLoaded { seq, result }
        });
        self.spawn_load(cache.load_yesterday_series(), move |result| {
            ControllerEvent::YesterdayLoaded { seq, result }
        });

        if force_repaint || cache.has_changed_since_last_check() {
            let today = cache.today_series();
            let yesterday = cache.yesterday_series();
            self.paint_chart(today, yesterday);
        }
    }

    fn paint_chart(&mut self, today: Series, yesterday: Series) {
        let max_y = self.services.settings.max_bg_displayed();
        self.chart
            .paint_chart(&[today, yesterday], self.config.canvas_width, max_y, true);
    }

    /// Apply a result posted by spawned work
    pub fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::CurrentLoaded { seq, result } => {
                if !accept_seq(&mut self.applied.current, seq) {
                    debug!("Discarding current reading of tick {} (newer applied)", seq);
                    return;
                }
                match result {
                    Ok(reading) => {
                        self.screen.hide_error();
                        self.paint_current(&reading);
                        self.services.companion.push_latest(&reading);
                    }
                    Err(e) => {
                        warn!("Loading current reading failed: {}", e);
                        self.screen.show_error(&e.to_string());
                    }
                }
                self.view.render(&self.screen);
            }
            ControllerEvent::TodayLoaded { seq, result } => {
                if !accept_seq(&mut self.applied.today, seq) {
                    debug!("Discarding today's series of tick {} (newer applied)", seq);
                    return;
                }
                match result {
                    Ok(today) => {
                        let yesterday = self.services.cache.yesterday_series();
                        self.paint_chart(today, yesterday);
                    }
                    Err(e) => warn!("Loading today's series failed: {}", e),
                }
            }
            ControllerEvent::YesterdayLoaded { seq, result } => {
                if !accept_seq(&mut self.applied.yesterday, seq) {
                    debug!("Discarding yesterday's series of tick {} (newer applied)", seq);
                    return;
                }
                match result {
                    Ok(yesterday) => {
                        let today = self.services.cache.today_series();
                        self.paint_chart(today, yesterday);
                    }
                    Err(e) => warn!("Loading yesterday's series failed: {}", e),
                }
            }
            ControllerEvent::SnoozeSafetyElapsed => {
                debug!("Snooze safety window over, unmuting alarm");
                self.services.sound.unmute_volume();
            }
        }
    }

    /// Wait for and apply the next posted event
    pub async fn handle_next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Apply all events already posted, returns how many were handled
    pub fn drain_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Apply a user command, returns `false` when the controller should stop
    pub fn handle_command(&mut self, command: UiCommand) -> bool {
        match command {
            UiCommand::TouchDown => self.chart.cancel_active_animation(),
            UiCommand::Pan(event) => self.handle_pan(event),
            UiCommand::Pinch(event) => {
                self.chart
                    .scale(event.scale, event.phase == GesturePhase::Ended);
            }
            UiCommand::ToggleSnooze => self.toggle_snooze(),
            UiCommand::SnoozeFor(minutes) => self.snooze_for(minutes),
            UiCommand::SetScreenlock(enabled) => {
                self.apply_screenlock(enabled);
                self.view.render(&self.screen);
            }
            UiCommand::Foreground(foreground) => {
                self.foreground = foreground;
                if foreground {
                    // Show the current time and start the alarm at once
                    self.tick();
                }
            }
            UiCommand::RepaintChart => self.load_and_paint_chart(true),
            UiCommand::Quit => return false,
        }
        true
    }

    fn handle_pan(&mut self, event: PanEvent) {
        if event.phase == GesturePhase::Began {
            self.pan.reset();
            self.chart.cancel_active_animation();
        }

        let delta = self.pan.advance(event.translation_x);
        self.chart.drag_by(delta);

        if event.phase == GesturePhase::Ended {
            if let Some(velocity) =
                swipe_velocity(event.velocity_x, self.config.swipe_velocity_threshold)
            {
                self.chart.swipe(velocity);
            }
        }
    }

    fn toggle_snooze(&mut self) {
        if self.services.alarm_rule.is_snoozed() {
            info!("Snooze cancelled");
            self.services.alarm_rule.disable_snooze();
            self.services.sound.unmute_volume();
        } else {
            // Silence at once, whatever is picked in the dialog
            self.services.sound.mute_volume();
            self.view.show_snooze_picker();
            self.schedule_snooze_safety_unmute();
        }
        self.update_snooze_button();
        self.view.render(&self.screen);
    }

    fn schedule_snooze_safety_unmute(&self) {
        let tx = self.events_tx.clone();
        let window = self.config.snooze_safety_window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = tx.send(ControllerEvent::SnoozeSafetyElapsed);
        });
    }

    fn snooze_for(&mut self, minutes: i64) {
        if minutes <= 0 {
            debug!("Ignoring snooze of {} minutes", minutes);
            return;
        }
        let minutes = if minutes > MAX_SNOOZE_MINUTES {
            warn!("Snooze of {} minutes capped at {}", minutes, MAX_SNOOZE_MINUTES);
            MAX_SNOOZE_MINUTES
        } else {
            minutes
        };
        info!("Snoozing alarm for {} minutes", minutes);
        self.services.alarm_rule.snooze(minutes);
        self.services.sound.stop();
        self.update_snooze_button();
        self.view.render(&self.screen);
    }

    fn apply_screenlock(&mut self, enabled: bool) {
        self.services.display.set_idle_timer_disabled(enabled);
        self.services.settings.store_screenlock_state(enabled);
        self.screen.screenlock_switch = enabled;

        if enabled && !self.services.settings.screenlock_message_shown() {
            self.view.show_message(SCREENLOCK_MESSAGE_TITLE, SCREENLOCK_MESSAGE);
            self.services.settings.mark_screenlock_message_shown();
        }
    }

    /// Whether the poll loop missed its last ticks
    fn poll_loop_stalled(&self) -> bool {
        self.last_tick
            .is_some_and(|last| last.elapsed() > self.config.poll_interval * 2)
    }

    /// Restart `poll` at once if it stopped ticking, returns whether it did
    fn check_poll_health(&self, poll: &mut Interval) -> bool {
        if !self.poll_loop_stalled() {
            return false;
        }
        warn!("Poll loop stalled, restarting it");
        poll.reset_immediately();
        true
    }

    /// Run until [`UiCommand::Quit`] or `max_ticks` poll cycles
    pub async fn run(mut self, mut commands: mpsc::Receiver<UiCommand>) -> Result<()> {
        self.start();

        let mut poll = tokio::time::interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let watchdog_period = self.config.watchdog_interval;
        let mut watchdog =
            tokio::time::interval_at(Instant::now() + watchdog_period, watchdog_period);
        let mut commands_open = true;

        info!("Polling every {:?}", self.config.poll_interval);

        loop {
            tokio::select! {
                _ = poll.tick() => {
                    if self.config.max_ticks.is_some_and(|max| self.tick_seq >= max) {
                        info!("Finished {} poll cycles", self.tick_seq);
                        break;
                    }
                    self.tick();
                }
                _ = watchdog.tick() => {
                    self.check_poll_health(&mut poll);
                }
                Some(event) = self.events_rx.recv() => self.handle_event(event),
                command = commands.recv(), if commands_open => match command {
                    Some(command) => {
                        if !self.handle_command(command) {
                            info!("Quit requested");
                            break;
                        }
                    }
                    None => {
                        debug!("Command channel closed");
                        commands_open = false;
                    }
                },
            }
        }

        self.services.sound.stop();
        Ok(())
    }
}
