use super::*;
use crate::ui::ThresholdColors;
use glucowatch_core::{BloodSugar, GuiState, MemoryGuiState};
use glucowatch_types::AlarmThresholds;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

fn reading(sgv: f64, rawbg: &str) -> Reading {
    Reading {
        sgv: format!("{}", sgv),
        sgv_value: sgv,
        delta: 2.0,
        delta_string: "+2.0".to_string(),
        delta_arrow: "→".to_string(),
        time: Some(Utc::now()),
        battery: "90%".to_string(),
        iob: "0.5U".to_string(),
        rawbg: rawbg.to_string(),
        noise: "Clean".to_string(),
    }
}

fn series(len: usize) -> Series {
    let now = Utc::now();
    (0..len)
        .map(|i| BloodSugar::new(110.0, now - chrono::Duration::minutes(5 * (len - i) as i64)))
        .collect()
}

/// Cache whose fresh current-reading loads stay pending until resolved
#[derive(Default)]
struct FakeCache {
    current: Mutex<Reading>,
    today: Mutex<Series>,
    yesterday: Mutex<Series>,
    changed: AtomicBool,
    pending: Mutex<Vec<Option<oneshot::Sender<Result<Reading, CacheError>>>>>,
}

impl FakeCache {
    fn set_current(&self, reading: Reading) {
        *self.current.lock().unwrap() = reading;
    }

    /// Complete the `index`th fresh load (in start order)
    fn resolve(&self, index: usize, result: Result<Reading, CacheError>) {
        let sender = self.pending.lock().unwrap()[index].take().unwrap();
        sender.send(result).unwrap();
    }
}

impl GlucoseCache for FakeCache {
    fn current_reading(&self) -> Reading {
        self.current.lock().unwrap().clone()
    }

    fn load_current_reading(&self) -> LoadFuture<Reading> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().push(Some(tx));
        Box::pin(async move { rx.await.unwrap_or(Err(CacheError::NoData)) })
    }

    fn today_series(&self) -> Series {
        self.today.lock().unwrap().clone()
    }

    fn load_today_series(&self) -> LoadFuture<Series> {
        let today = self.today_series();
        Box::pin(async move { Ok(today) })
    }

    fn yesterday_series(&self) -> Series {
        self.yesterday.lock().unwrap().clone()
    }

    fn load_yesterday_series(&self) -> LoadFuture<Series> {
        Box::pin(async move { Err(CacheError::Timeout) })
    }

    fn has_changed_since_last_check(&self) -> bool {
        self.changed.swap(false, Ordering::SeqCst)
    }
}

#[derive(Default)]
struct FakeRule {
    alarm: AtomicBool,
    snoozed_minutes: Mutex<Option<i64>>,
}

impl AlarmRule for FakeRule {
    fn should_alarm(&self, _current: &Reading, _today: &[BloodSugar]) -> bool {
        self.alarm.load(Ordering::SeqCst) && !self.is_snoozed()
    }

    fn is_snoozed(&self) -> bool {
        self.snoozed_minutes.lock().unwrap().is_some()
    }

    fn remaining_snooze_minutes(&self) -> i64 {
        self.snoozed_minutes.lock().unwrap().unwrap_or(0)
    }

    fn disable_snooze(&self) {
        *self.snoozed_minutes.lock().unwrap() = None;
    }

    fn snooze(&self, minutes: i64) {
        *self.snoozed_minutes.lock().unwrap() = Some(minutes);
    }
}

#[derive(Default)]
struct FakeSound {
    playing: AtomicBool,
    muted: AtomicBool,
}

impl SoundPlayer for FakeSound {
    fn play(&self) {
        self.playing.store(true, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    fn mute_volume(&self) {
        self.muted.store(true, Ordering::SeqCst);
    }

    fn unmute_volume(&self) {
        self.muted.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ChartCall {
    Paint {
        series: usize,
        canvas_width: u32,
        max_y: f64,
        move_to_latest: bool,
    },
    Drag(f64),
    Swipe(f64),
    Scale(f64, bool),
    Cancel,
}

#[derive(Clone, Default)]
struct FakeChart {
    calls: Arc<Mutex<Vec<ChartCall>>>,
}

impl FakeChart {
    fn take(&self) -> Vec<ChartCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }
}

impl ChartScene for FakeChart {
    fn paint_chart(&mut self, series: &[Series], canvas_width: u32, max_y: f64, move_to_latest: bool) {
        self.calls.lock().unwrap().push(ChartCall::Paint {
            series: series.len(),
            canvas_width,
            max_y,
            move_to_latest,
        });
    }

    fn drag_by(&mut self, delta_x: f64) {
        self.calls.lock().unwrap().push(ChartCall::Drag(delta_x));
    }

    fn swipe(&mut self, velocity_x: f64) {
        self.calls.lock().unwrap().push(ChartCall::Swipe(velocity_x));
    }

    fn scale(&mut self, factor: f64, commit: bool) {
        self.calls.lock().unwrap().push(ChartCall::Scale(factor, commit));
    }

    fn cancel_active_animation(&mut self) {
        self.calls.lock().unwrap().push(ChartCall::Cancel);
    }
}

#[derive(Default)]
struct ViewLog {
    renders: usize,
    messages: Vec<(String, String)>,
    pickers: usize,
}

#[derive(Clone, Default)]
struct FakeView {
    log: Arc<Mutex<ViewLog>>,
}

impl MainView for FakeView {
    fn render(&mut self, _screen: &Screen) {
        self.log.lock().unwrap().renders += 1;
    }

    fn show_message(&mut self, title: &str, message: &str) {
        self.log
            .lock()
            .unwrap()
            .messages
            .push((title.to_string(), message.to_string()));
    }

    fn show_snooze_picker(&mut self) {
        self.log.lock().unwrap().pickers += 1;
    }
}

#[derive(Default)]
struct FakeCompanion {
    pushed: Mutex<Vec<Reading>>,
}

impl CompanionSync for FakeCompanion {
    fn push_latest(&self, reading: &Reading) {
        self.pushed.lock().unwrap().push(reading.clone());
    }
}

#[derive(Default)]
struct FakeDisplay {
    idle_timer_disabled: AtomicBool,
}

impl DisplayControl for FakeDisplay {
    fn set_idle_timer_disabled(&self, disabled: bool) {
        self.idle_timer_disabled.store(disabled, Ordering::SeqCst);
    }

    fn is_idle_timer_disabled(&self) -> bool {
        self.idle_timer_disabled.load(Ordering::SeqCst)
    }
}

struct Harness {
    cache: Arc<FakeCache>,
    rule: Arc<FakeRule>,
    sound: Arc<FakeSound>,
    settings: Arc<MemoryGuiState>,
    companion: Arc<FakeCompanion>,
    display: Arc<FakeDisplay>,
    chart: FakeChart,
    view: FakeView,
}

impl Harness {
    fn new() -> Self {
        Self::with_settings(GuiState::default())
    }

    fn with_settings(state: GuiState) -> Self {
        Self {
            cache: Arc::new(FakeCache::default()),
            rule: Arc::new(FakeRule::default()),
            sound: Arc::new(FakeSound::default()),
            settings: Arc::new(MemoryGuiState::new(state)),
            companion: Arc::new(FakeCompanion::default()),
            display: Arc::new(FakeDisplay::default()),
            chart: FakeChart::default(),
            view: FakeView::default(),
        }
    }

    fn controller(&self, config: ControllerConfig) -> MainController {
        let services = Services {
            cache: self.cache.clone(),
            alarm_rule: self.rule.clone(),
            sound: self.sound.clone(),
            settings: self.settings.clone(),
            companion: self.companion.clone(),
            display: self.display.clone(),
            colors: Arc::new(ThresholdColors::new(AlarmThresholds::default())),
        };
        MainController::new(
            services,
            config,
            Box::new(self.chart.clone()),
            Box::new(self.view.clone()),
        )
    }

    fn muted(&self) -> bool {
        self.sound.muted.load(Ordering::SeqCst)
    }

    fn pushed(&self) -> usize {
        self.companion.pushed.lock().unwrap().len()
    }
}

/// Let spawned loads run, then apply whatever they posted
async fn settle(controller: &mut MainController) -> usize {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    controller.drain_events()
}

fn pan(phase: GesturePhase, translation_x: f64, velocity_x: f64) -> UiCommand {
    UiCommand::Pan(PanEvent {
        phase,
        translation_x,
        velocity_x,
    })
}

#[tokio::test]
async fn test_tick_paints_cached_then_fresh() {
    let h = Harness::new();
    h.cache.set_current(reading(100.0, ""));
    let mut controller = h.controller(ControllerConfig::default());

    controller.tick();
    assert_eq!(controller.screen().bg.text, "100");
    assert!(!controller.screen().clock.text.is_empty());

    h.cache.resolve(0, Ok(reading(140.0, "")));
    settle(&mut controller).await;

    assert_eq!(controller.screen().bg.text, "140");
    assert!(!controller.screen().error_banner.visible);
    assert_eq!(h.pushed(), 1);
    assert_eq!(h.companion.pushed.lock().unwrap()[0].sgv, "140");
}

#[tokio::test]
async fn test_fresh_error_keeps_stale_values_until_next_success() {
    let h = Harness::new();
    h.cache.set_current(reading(120.0, ""));
    let mut controller = h.controller(ControllerConfig::default());

    controller.tick();
    h.cache.resolve(0, Ok(reading(125.0, "")));
    settle(&mut controller).await;
    assert_eq!(controller.screen().bg.text, "125");

    controller.tick();
    h.cache.resolve(1, Err(CacheError::Timeout));
    settle(&mut controller).await;

    let screen = controller.screen();
    assert!(screen.error_banner.visible);
    assert_eq!(screen.error_banner.text, "❌ The request timed out");
    assert_eq!(screen.error_banner.color, glucowatch_types::Color::RED);
    // Cached value painted by the tick stays on screen
    assert_eq!(screen.bg.text, "120");
    assert_eq!(h.pushed(), 1);

    controller.tick();
    h.cache.resolve(2, Ok(reading(150.0, "")));
    settle(&mut controller).await;

    let screen = controller.screen();
    assert!(!screen.error_banner.visible);
    assert_eq!(screen.bg.text, "150");
    assert_eq!(h.pushed(), 2);
}

#[tokio::test]
async fn test_late_result_of_older_tick_is_discarded() {
    let h = Harness::new();
    let mut controller = h.controller(ControllerConfig::default());

    controller.tick();
    controller.tick();

    h.cache.resolve(1, Ok(reading(150.0, "")));
    settle(&mut controller).await;
    assert_eq!(controller.screen().bg.text, "150");

    h.cache.resolve(0, Ok(reading(90.0, "")));
    settle(&mut controller).await;
    assert_eq!(controller.screen().bg.text, "150");
    assert_eq!(h.pushed(), 1);
}

#[tokio::test]
async fn test_raw_panel_visibility() {
    let shown = Harness::with_settings(GuiState {
        show_raw_bg: true,
        ..GuiState::default()
    });
    let mut controller = shown.controller(ControllerConfig::default());

    shown.cache.set_current(reading(110.0, "0"));
    controller.tick();
    assert!(!controller.screen().raw_panel.visible);

    shown.cache.set_current(reading(110.0, "104"));
    controller.tick();
    assert!(controller.screen().raw_panel.visible);
    assert_eq!(controller.screen().raw_panel.rawbg, "104");

    let hidden = Harness::new();
    let mut controller = hidden.controller(ControllerConfig::default());
    hidden.cache.set_current(reading(110.0, "104"));
    controller.tick();
    assert!(!controller.screen().raw_panel.visible);
}

#[tokio::test]
async fn test_alarm_sound_follows_rule_and_foreground() {
    let h = Harness::new();
    let mut controller = h.controller(ControllerConfig::default());

    h.rule.alarm.store(true, Ordering::SeqCst);
    controller.tick();
    assert!(h.sound.playing.load(Ordering::SeqCst));

    h.rule.alarm.store(false, Ordering::SeqCst);
    controller.tick();
    assert!(!h.sound.playing.load(Ordering::SeqCst));

    controller.handle_command(UiCommand::Foreground(false));
    h.rule.alarm.store(true, Ordering::SeqCst);
    controller.tick();
    assert!(!h.sound.playing.load(Ordering::SeqCst));

    // Coming back runs a cycle at once
    controller.handle_command(UiCommand::Foreground(true));
    assert!(h.sound.playing.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_snooze_on_then_off_restores_audio() {
    let h = Harness::new();
    let mut controller = h.controller(ControllerConfig::default());

    controller.handle_command(UiCommand::ToggleSnooze);
    assert!(h.muted());
    assert_eq!(h.view.log.lock().unwrap().pickers, 1);

    controller.handle_command(UiCommand::SnoozeFor(30));
    assert_eq!(controller.screen().snooze_button, "Snoozed for 30min");

    controller.handle_command(UiCommand::ToggleSnooze);
    assert!(!h.muted());
    assert!(!h.rule.is_snoozed());
    assert_eq!(controller.screen().snooze_button, "Snooze");
}

#[tokio::test(start_paused = true)]
async fn test_snooze_safety_window_unmutes() {
    let h = Harness::new();
    let mut controller = h.controller(ControllerConfig::default());

    controller.handle_command(UiCommand::ToggleSnooze);
    assert!(h.muted());

    tokio::time::advance(Duration::from_secs(29)).await;
    assert_eq!(settle(&mut controller).await, 0);
    assert!(h.muted());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(settle(&mut controller).await, 1);
    assert!(!h.muted());
}

#[tokio::test]
async fn test_snooze_label_updates_on_tick() {
    let h = Harness::new();
    let mut controller = h.controller(ControllerConfig::default());

    h.rule.snooze(12);
    controller.tick();
    assert_eq!(controller.screen().snooze_button, "Snoozed for 12min");

    h.rule.disable_snooze();
    controller.tick();
    assert_eq!(controller.screen().snooze_button, "Snooze");
}

#[tokio::test]
async fn test_pan_forwards_deltas_and_swipes_past_threshold() {
    let h = Harness::new();
    let mut controller = h.controller(ControllerConfig::default());

    controller.handle_command(pan(GesturePhase::Began, 0.0, 0.0));
    controller.handle_command(pan(GesturePhase::Changed, 30.0, 80.0));
    controller.handle_command(pan(GesturePhase::Ended, 40.0, -150.0));
    assert_eq!(
        h.chart.take(),
        vec![
            ChartCall::Cancel,
            ChartCall::Drag(0.0),
            ChartCall::Drag(30.0),
            ChartCall::Drag(10.0),
            ChartCall::Swipe(-150.0),
        ]
    );

    controller.handle_command(pan(GesturePhase::Began, 5.0, 0.0));
    controller.handle_command(pan(GesturePhase::Ended, 5.0, 150.0));
    assert_eq!(
        h.chart.take(),
        vec![
            ChartCall::Cancel,
            ChartCall::Drag(5.0),
            ChartCall::Drag(0.0),
            ChartCall::Swipe(150.0),
        ]
    );

    for velocity in [-50.0, 50.0] {
        controller.handle_command(pan(GesturePhase::Began, 0.0, 0.0));
        controller.handle_command(pan(GesturePhase::Ended, 0.0, velocity));
        assert!(!h.chart.take().iter().any(|c| matches!(c, ChartCall::Swipe(_))));
    }
}

#[tokio::test]
async fn test_touch_and_pinch() {
    let h = Harness::new();
    let mut controller = h.controller(ControllerConfig::default());

    controller.handle_command(UiCommand::TouchDown);
    controller.handle_command(UiCommand::Pinch(PinchEvent {
        phase: GesturePhase::Changed,
        scale: 1.5,
    }));
    controller.handle_command(UiCommand::Pinch(PinchEvent {
        phase: GesturePhase::Ended,
        scale: 1.8,
    }));

    assert_eq!(
        h.chart.take(),
        vec![
            ChartCall::Cancel,
            ChartCall::Scale(1.5, false),
            ChartCall::Scale(1.8, true),
        ]
    );
}

#[tokio::test]
async fn test_chart_repaint_only_when_changed_or_forced() {
    let h = Harness::with_settings(GuiState {
        max_bg_displayed: 300.0,
        ..GuiState::default()
    });
    *h.cache.today.lock().unwrap() = series(12);
    let config = ControllerConfig {
        canvas_width: 2048,
        ..ControllerConfig::default()
    };
    let mut controller = h.controller(config);

    let expected = ChartCall::Paint {
        series: 2,
        canvas_width: 2048,
        max_y: 300.0,
        move_to_latest: true,
    };

    h.cache.changed.store(true, Ordering::SeqCst);
    controller.tick();
    assert_eq!(h.chart.take(), vec![expected.clone()]);

    controller.tick();
    assert!(h.chart.take().is_empty());

    controller.handle_command(UiCommand::RepaintChart);
    assert_eq!(h.chart.take(), vec![expected.clone()]);

    // Fresh today loads repaint; the failing yesterday loads only log
    settle(&mut controller).await;
    let calls = h.chart.take();
    assert!(!calls.is_empty());
    assert!(calls.iter().all(|c| *c == expected));
}

#[tokio::test]
async fn test_screenlock_message_shown_once() {
    let h = Harness::new();
    let mut controller = h.controller(ControllerConfig::default());
    controller.start();
    assert!(!controller.screen().screenlock_switch);

    controller.handle_command(UiCommand::SetScreenlock(true));
    assert!(h.display.is_idle_timer_disabled());
    assert!(h.settings.load_screenlock_state());
    assert!(controller.screen().screenlock_switch);
    {
        let log = h.view.log.lock().unwrap();
        assert_eq!(log.messages.len(), 1);
        assert_eq!(log.messages[0].0, "Keep the screen active");
    }

    controller.handle_command(UiCommand::SetScreenlock(false));
    assert!(!h.display.is_idle_timer_disabled());
    assert!(!h.settings.load_screenlock_state());

    controller.handle_command(UiCommand::SetScreenlock(true));
    assert_eq!(h.view.log.lock().unwrap().messages.len(), 1);
}

#[tokio::test]
async fn test_start_restores_screenlock_without_repeating_message() {
    let h = Harness::with_settings(GuiState {
        screenlock_enabled: true,
        screenlock_message_shown: true,
        ..GuiState::default()
    });
    let mut controller = h.controller(ControllerConfig::default());
    controller.start();

    assert!(h.display.is_idle_timer_disabled());
    assert!(controller.screen().screenlock_switch);
    assert!(h.view.log.lock().unwrap().messages.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_run_stops_after_max_ticks() {
    let h = Harness::new();
    let config = ControllerConfig {
        max_ticks: Some(2),
        ..ControllerConfig::default()
    };
    let controller = h.controller(config);
    let (_tx, rx) = mpsc::channel(8);

    let result = tokio::time::timeout(Duration::from_secs(300), controller.run(rx)).await;
    assert!(matches!(result, Ok(Ok(()))));
    assert_eq!(h.cache.pending.lock().unwrap().len(), 2);
    assert!(h.view.log.lock().unwrap().renders >= 3);
}

#[tokio::test]
async fn test_run_quits_on_command() {
    let h = Harness::new();
    let controller = h.controller(ControllerConfig::default());
    let (tx, rx) = mpsc::channel(8);
    tx.send(UiCommand::ToggleSnooze).await.unwrap();
    tx.send(UiCommand::Quit).await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), controller.run(rx)).await;
    assert!(matches!(result, Ok(Ok(()))));
    assert!(h.muted());
}

#[tokio::test]
async fn test_huge_snooze_is_capped() {
    let h = Harness::new();
    let mut controller = h.controller(ControllerConfig::default());

    assert!(controller.handle_command(UiCommand::SnoozeFor(200_000_000_000)));
    assert_eq!(h.rule.remaining_snooze_minutes(), MAX_SNOOZE_MINUTES);
    assert_eq!(
        controller.screen().snooze_button,
        format!("Snoozed for {}min", MAX_SNOOZE_MINUTES)
    );
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_leaves_healthy_poll_loop_alone() {
    let h = Harness::new();
    let mut controller = h.controller(ControllerConfig::default());
    let mut poll = tokio::time::interval(controller.config.poll_interval);
    poll.tick().await;

    // No tick yet: nothing to judge
    assert!(!controller.check_poll_health(&mut poll));

    controller.tick();
    tokio::time::advance(Duration::from_secs(59)).await;
    assert!(!controller.poll_loop_stalled());
    assert!(!controller.check_poll_health(&mut poll));
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_restarts_stalled_poll_loop() {
    let h = Harness::new();
    let mut controller = h.controller(ControllerConfig::default());
    let mut poll = tokio::time::interval(controller.config.poll_interval);
    poll.tick().await;
    controller.tick();

    // Next poll tick is still 30 s away
    let waited = tokio::time::timeout(Duration::from_secs(1), poll.tick()).await;
    assert!(waited.is_err());

    controller.last_tick = Some(Instant::now() - controller.config.poll_interval * 2 - Duration::from_secs(1));
    assert!(controller.poll_loop_stalled());
    assert!(controller.check_poll_health(&mut poll));

    // The restarted interval ticks without waiting
    let before = Instant::now();
    poll.tick().await;
    assert_eq!(Instant::now(), before);

    controller.tick();
    assert!(!controller.poll_loop_stalled());
    assert_eq!(controller.ticks(), 2);
}
