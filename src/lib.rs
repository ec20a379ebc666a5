#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use audio::{PlaybackError, Player};
use chime::{ChimeError, ToneRequest};
use config::{AlarmConfig, Config};
use eframe::egui::{
    self, CentralPanel, Color32, FontId, Frame, RichText, Sense, ViewportCommand,
};
use log::{error, info, warn};
use scheduler::AlertScheduler;
use settings::{SettingsAction, SettingsWindow};
use widgets::{format_countdown, CountdownRing};

pub mod audio;
pub mod chime;
pub mod communication;
pub mod config;
pub mod scheduler;
pub mod settings;
pub mod synth;
pub mod widgets;

/// How often the overlay repaints, and so how often the scheduler is polled.
pub const UI_TICK: Duration = Duration::from_millis(250);
/// How far "Snooze" pushes the next chime.
pub const SNOOZE: Duration = Duration::from_secs(5 * 60);
const TIME_FORMAT: &str = "%I:%M:%S %p";
/// the window has to sit still this long before a new position is written to disk
const MOVE_SETTLE: Duration = Duration::from_secs(1);

/// What saving the settings does to the running countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerUpdate {
    /// start counting a fresh interval from now
    Restart,
    Disable,
    Keep,
}

impl SchedulerUpdate {
    /// Turning chimes on starts a whole interval from the moment of saving.
    fn between(old: &AlarmConfig, new: &AlarmConfig) -> Self {
        let timing_changed = old.interval_secs != new.interval_secs
            || old.duration_secs.to_bits() != new.duration_secs.to_bits();
        if timing_changed || (new.enabled && !old.enabled) {
            Self::Restart
        } else if old.enabled && !new.enabled {
            Self::Disable
        } else {
            Self::Keep
        }
    }
}

pub struct Clock {
    config: Config,
    config_path: PathBuf,
    scheduler: AlertScheduler,
    player: Player,
    settings: Option<SettingsWindow>,
    moved_at: Option<Instant>,
}

impl Clock {
    #[must_use]
    pub fn new(config: Config, config_path: PathBuf, player: Player) -> Self {
        Self {
            scheduler: AlertScheduler::new(&config.alarm, Instant::now()),
            config,
            config_path,
            player,
            settings: None,
            moved_at: None,
        }
    }

    /// Fires the chime if one is due.
    fn poll_scheduler(&mut self, now: Instant) {
        if !self.scheduler.tick(now).due {
            return;
        }
        let request =
            ToneRequest::for_alert(&self.config.sound, &self.config.alarm, &mut rand::thread_rng());
        match self.player.chime(&request) {
            Ok(id) => {
                info!("alert fired as chime {id}");
                self.scheduler.acknowledge_fire(now);
            }
            // try again on the next tick
            Err(ChimeError::Playback(PlaybackError::Busy)) => {
                warn!("playback queue is full, holding the alert");
            }
            Err(e) => {
                error!("alert couldn't play: {e}");
                self.scheduler.acknowledge_fire(now);
            }
        }
    }

    fn test_sound(&mut self, sound: &config::SoundConfig) {
        let request = ToneRequest::for_test(sound, &mut rand::thread_rng());
        match self.player.chime(&request) {
            Ok(id) => info!("test sound playing as chime {id}"),
            Err(e) => warn!("test sound couldn't play: {e}"),
        }
    }

    fn apply_settings(&mut self, ctx: &egui::Context, new: Config, now: Instant) {
        let old = std::mem::replace(&mut self.config, new);
        // the window may have been dragged while the settings were open
        self.config.clock.position = old.clock.position;
        let alarm = self.config.alarm;
        match SchedulerUpdate::between(&old.alarm, &alarm) {
            SchedulerUpdate::Restart => self.scheduler.set_config(&alarm, now),
            SchedulerUpdate::Disable => self.scheduler.set_enabled(false),
            SchedulerUpdate::Keep => {}
        }
        if old.clock.size != self.config.clock.size {
            let [width, height] = self.config.clock.size;
            #[allow(clippy::cast_precision_loss)]
            let size = egui::vec2(width as f32, height as f32);
            ctx.send_viewport_cmd(ViewportCommand::InnerSize(size));
        }
        self.save();
        info!("settings saved");
    }

    /// Remembers where the window was dragged to, once it stops moving.
    fn track_position(&mut self, ctx: &egui::Context, now: Instant) {
        let Some(outer) = ctx.input(|i| i.viewport().outer_rect) else {
            return;
        };
        #[allow(clippy::cast_possible_truncation)]
        let position = [outer.min.x.round() as i32, outer.min.y.round() as i32];
        if position != self.config.clock.position {
            self.config.clock.position = position;
            self.moved_at = Some(now);
        } else if self
            .moved_at
            .is_some_and(|moved| now.duration_since(moved) >= MOVE_SETTLE)
        {
            self.moved_at = None;
            self.save();
        }
    }

    fn render_face(&mut self, ui: &mut egui::Ui, now: Instant) {
        let clock = &self.config.clock;
        let color = Color32::from(clock.color).gamma_multiply(clock.opacity);
        let font = FontId::new(clock.text_size, clock.font.into());
        let tick = self.scheduler.tick(now);

        ui.vertical_centered(|ui| {
            ui.label(
                RichText::new(chrono::Local::now().format(TIME_FORMAT).to_string())
                    .font(font.clone())
                    .color(color),
            );
            if self.scheduler.is_enabled() {
                ui.horizontal(|ui| {
                    ui.add(
                        CountdownRing::new(self.scheduler.progress(now))
                            .radius(Some(font.size / 5.))
                            .hand_color(Some(color))
                            .stroke(Some(egui::Stroke::new(1.5, color))),
                    );
                    ui.label(
                        RichText::new(format_countdown(tick.remaining))
                            .size(font.size / 2.5)
                            .color(color),
                    );
                });
            }
        });

        let response = ui.interact(ui.max_rect(), ui.id().with("face"), Sense::click_and_drag());
        if response.drag_started() && self.config.drag_to_move {
            ui.ctx().send_viewport_cmd(ViewportCommand::StartDrag);
        }
        response.context_menu(|ui| {
            if ui.button("Settings").clicked() {
                self.settings = Some(SettingsWindow::new(&self.config));
                ui.close_menu();
            }
            if ui.button("Test sound").clicked() {
                let sound = self.config.sound.clone();
                self.test_sound(&sound);
                ui.close_menu();
            }
            if self.scheduler.is_enabled() && ui.button("Snooze").clicked() {
                self.scheduler.snooze(Instant::now(), SNOOZE);
                info!("snoozed for {} minutes", SNOOZE.as_secs() / 60);
                ui.close_menu();
            }
            if ui.button("Stop sound").clicked() {
                self.player.stop();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Quit").clicked() {
                ui.ctx().send_viewport_cmd(ViewportCommand::Close);
            }
        });
    }

    fn save(&self) {
        if let Err(e) = self.config.save(&self.config_path) {
            error!("{e}");
        }
    }
}

impl eframe::App for Clock {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.poll_scheduler(now);
        self.track_position(ctx, now);

        let action = self
            .settings
            .as_mut()
            .map_or(SettingsAction::Editing, |settings| settings.render(ctx));
        match action {
            SettingsAction::Save(new) => {
                self.settings = None;
                self.apply_settings(ctx, new, now);
            }
            SettingsAction::TestSound(sound) => self.test_sound(&sound),
            SettingsAction::Cancelled => self.settings = None,
            SettingsAction::Editing => {}
        }

        CentralPanel::default()
            .frame(Frame::none())
            .show(ctx, |ui| self.render_face(ui, now));

        // keeps the clock ticking and the scheduler polled without any input
        ctx.request_repaint_after(UI_TICK);
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        egui::Rgba::TRANSPARENT.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alarm(enabled: bool, interval_secs: u32, duration_secs: f64) -> AlarmConfig {
        AlarmConfig {
            enabled,
            interval_secs,
            duration_secs,
        }
    }

    #[test]
    fn enabling_restarts_the_countdown() {
        let update = SchedulerUpdate::between(&alarm(false, 30, 3.0), &alarm(true, 30, 3.0));
        assert_eq!(update, SchedulerUpdate::Restart);

        // off since startup for far longer than one interval
        let start = Instant::now();
        let mut scheduler = AlertScheduler::new(&alarm(false, 30, 3.0), start);
        let saved = start + Duration::from_secs(600);
        scheduler.set_config(&alarm(true, 30, 3.0), saved);
        assert!(!scheduler.tick(saved).due);
        assert_eq!(scheduler.tick(saved).remaining, Duration::from_secs(30));
    }

    #[test]
    fn disabling_keeps_the_baseline() {
        assert_eq!(
            SchedulerUpdate::between(&alarm(true, 30, 3.0), &alarm(false, 30, 3.0)),
            SchedulerUpdate::Disable
        );
    }

    #[test]
    fn timing_changes_restart() {
        for new in [alarm(true, 60, 3.0), alarm(true, 30, 5.0), alarm(false, 45, 3.0)] {
            assert_eq!(
                SchedulerUpdate::between(&alarm(true, 30, 3.0), &new),
                SchedulerUpdate::Restart,
                "{new:?}"
            );
        }
    }

    #[test]
    fn unrelated_edits_leave_the_countdown_alone() {
        assert_eq!(
            SchedulerUpdate::between(&alarm(true, 30, 3.0), &alarm(true, 30, 3.0)),
            SchedulerUpdate::Keep
        );
        assert_eq!(
            SchedulerUpdate::between(&alarm(false, 30, 3.0), &alarm(false, 30, 3.0)),
            SchedulerUpdate::Keep
        );
    }
}
