use eframe::egui::{self, Color32, ComboBox, Slider, Window};

use crate::{
    config::{AlarmConfig, ClockConfig, ClockFont, Config, SoundConfig},
    synth::Waveform,
};

/// What the settings window wants done after a frame
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsAction {
    Editing,
    Save(Config),
    TestSound(SoundConfig),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Tab {
    #[default]
    Appearance,
    Alarm,
    Sound,
}

/// Edits a copy of the config, handing it back only when it validates
#[derive(Debug, Clone)]
pub struct SettingsWindow {
    draft: Config,
    tab: Tab,
    error: Option<String>,
}

impl SettingsWindow {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            draft: config.clone(),
            tab: Tab::default(),
            error: None,
        }
    }

    pub fn render(&mut self, ctx: &egui::Context) -> SettingsAction {
        let mut action = SettingsAction::Editing;
        let mut open = true;
        Window::new("settings ⚙")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.tab, Tab::Appearance, "Appearance");
                    ui.selectable_value(&mut self.tab, Tab::Alarm, "Alarm");
                    ui.selectable_value(&mut self.tab, Tab::Sound, "Sound");
                });
                ui.separator();
                match self.tab {
                    Tab::Appearance => {
                        Self::render_appearance(&mut self.draft.clock, ui);
                        ui.checkbox(&mut self.draft.drag_to_move, "Drag to move");
                    }
                    Tab::Alarm => Self::render_alarm(&mut self.draft.alarm, ui),
                    Tab::Sound => {
                        Self::render_sound(&mut self.draft.sound, ui);
                        if ui.button("Test Sound").clicked() {
                            action = SettingsAction::TestSound(self.draft.sound.clone());
                        }
                    }
                }
                ui.separator();
                if let Some(error) = &self.error {
                    ui.colored_label(Color32::RED, error);
                }
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        match self.draft.validate() {
                            Ok(()) => action = SettingsAction::Save(self.draft.clone()),
                            Err(e) => self.error = Some(e.to_string()),
                        }
                    }
                    if ui.button("Cancel").clicked() {
                        action = SettingsAction::Cancelled;
                    }
                });
            });
        if open {
            action
        } else {
            SettingsAction::Cancelled
        }
    }

    fn render_appearance(clock: &mut ClockConfig, ui: &mut egui::Ui) {
        ui.add(Slider::new(&mut clock.size[0], 100..=1000).suffix(" px").text("Width"));
        ui.add(Slider::new(&mut clock.size[1], 50..=500).suffix(" px").text("Height"));
        ui.horizontal(|ui| {
            ui.label("Font");
            ui.selectable_value(&mut clock.font, ClockFont::Proportional, "Proportional");
            ui.selectable_value(&mut clock.font, ClockFont::Monospace, "Monospace");
        });
        ui.add(Slider::new(&mut clock.text_size, 8.0..=144.0).text("Text size"));
        ui.add(Slider::new(&mut clock.opacity, ClockConfig::OPACITY_RANGE).text("Opacity"));
        ui.horizontal(|ui| {
            ui.label("Color");
            ui.color_edit_button_srgb(&mut clock.color.0);
        });
    }

    fn render_alarm(alarm: &mut AlarmConfig, ui: &mut egui::Ui) {
        ui.checkbox(&mut alarm.enabled, "Enable Alarm");
        ui.add(
            Slider::new(&mut alarm.duration_secs, AlarmConfig::DURATION_RANGE)
                .suffix(" sec")
                .text("Duration"),
        );
        ui.add(
            Slider::new(&mut alarm.interval_secs, AlarmConfig::INTERVAL_RANGE)
                .suffix(" sec")
                .text("Interval"),
        );
    }

    fn render_sound(sound: &mut SoundConfig, ui: &mut egui::Ui) {
        ComboBox::from_label("Waveform")
            .selected_text(sound.waveform.to_string())
            .show_ui(ui, |ui| {
                for waveform in Waveform::ALL {
                    ui.selectable_value(&mut sound.waveform, waveform, waveform.name());
                }
            });
        ui.checkbox(&mut sound.variety, "Random waveform and pitch")
            .on_hover_text("every chime picks one of the ticked waveforms and a steady pitch in the range");
        ui.add_enabled_ui(sound.variety, |ui| {
            ui.horizontal(|ui| {
                let mut picked = Waveform::ALL.map(|waveform| sound.waveforms.contains(&waveform));
                for (waveform, on) in Waveform::ALL.into_iter().zip(picked.iter_mut()) {
                    ui.checkbox(on, waveform.name());
                }
                sound.waveforms = Waveform::ALL
                    .into_iter()
                    .zip(picked)
                    .filter_map(|(waveform, on)| on.then_some(waveform))
                    .collect();
            });
        });
        ui.add(
            Slider::new(&mut sound.frequency_min, SoundConfig::MIN_FREQUENCY_RANGE)
                .suffix(" Hz")
                .text("Min Frequency"),
        );
        ui.add(
            Slider::new(&mut sound.frequency_max, SoundConfig::MAX_FREQUENCY_RANGE)
                .suffix(" Hz")
                .text("Max Frequency"),
        );
    }
}
