use std::time::Duration;

use eframe::egui::{Color32, Response, Sense, Stroke, Ui, Vec2, Widget};

/// A dial whose hand sweeps once around as the countdown to the next chime runs out.
pub struct CountdownRing {
    progress: f32,
    hand_color: Option<Color32>,
    fill: Option<Color32>,
    stroke: Option<Stroke>,
    radius: Option<f32>,
}

impl CountdownRing {
    /// `progress` is the elapsed fraction of the interval, clamped to `[0, 1]`
    #[must_use]
    pub fn new(progress: f32) -> Self {
        Self {
            progress: progress.clamp(0., 1.),
            hand_color: None,
            fill: None,
            stroke: None,
            radius: None,
        }
    }

    /// Set how big the ring should be
    #[must_use]
    pub const fn radius(mut self, radius: Option<f32>) -> Self {
        self.radius = radius;
        self
    }

    // set the outline of the ring
    #[must_use]
    pub const fn stroke(mut self, stroke: Option<Stroke>) -> Self {
        self.stroke = stroke;
        self
    }

    // set the background color of the ring
    #[must_use]
    pub const fn fill(mut self, fill: Option<Color32>) -> Self {
        self.fill = fill;
        self
    }

    // set the hand color of the ring
    #[must_use]
    pub const fn hand_color(mut self, hand_color: Option<Color32>) -> Self {
        self.hand_color = hand_color;
        self
    }
}

impl Widget for CountdownRing {
    fn ui(self, ui: &mut Ui) -> Response {
        let Self {
            progress,
            hand_color,
            fill,
            stroke,
            radius,
        } = self;

        let desired_radius = radius.unwrap_or_else(|| ui.spacing().interact_size.y / 2.);
        let (rect, response) = ui.allocate_exact_size(Vec2::splat(desired_radius * 2.), Sense::hover());
        let visuals = ui.visuals().widgets.noninteractive;
        ui.painter().circle_filled(
            rect.center(),
            desired_radius,
            fill.unwrap_or(Color32::TRANSPARENT),
        );
        let border_stroke = stroke.unwrap_or(visuals.fg_stroke);
        ui.painter()
            .circle_stroke(rect.center(), desired_radius, border_stroke);
        // a full turn per interval, starting from the top
        let angle = (360. * progress) - 90.;
        let mut hand_stroke = visuals.fg_stroke;
        if let Some(color) = hand_color {
            hand_stroke.color = color;
        }
        let tip = rect.center()
            + Vec2::angled(angle.to_radians()) * border_stroke.width.mul_add(-2., desired_radius);
        ui.painter().line_segment([rect.center(), tip], hand_stroke);
        ui.painter()
            .circle_filled(rect.center(), hand_stroke.width * 2., hand_stroke.color);
        response
    }
}

/// `MM:SS`, or `H:MM:SS` past an hour, rounding partial seconds up so the
/// countdown only shows zero once the chime is due
#[must_use]
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    let (hours, minutes, seconds) = (total / 3600, total / 60 % 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
