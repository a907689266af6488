use eframe::egui::{Response, Sense, Stroke, Ui, Vec2, Widget};

use crate::selector::WindowHours;

const NOTCHES: u8 = WindowHours::MAX - WindowHours::MIN + 1;

/// round dial for picking the alarm window, one notch per hour
pub struct HourDial<'a> {
    hours: &'a mut WindowHours,
}

impl<'a> HourDial<'a> {
    pub fn new(hours: &'a mut WindowHours) -> Self {
        Self { hours }
    }
}

impl Widget for HourDial<'_> {
    // partially from https://github.com/obsqrbtz/egui_knob
    fn ui(self, ui: &mut Ui) -> Response {
        let Self { hours } = self;

        let radius = ui.spacing().slider_width / 3.;
        let (rect, mut response) =
            ui.allocate_exact_size(Vec2::splat(radius * 2.), Sense::click_and_drag());
        // degrees per hour
        let part_angle = 360. / f32::from(NOTCHES);

        if response.dragged() || response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                // turn the pointer position back into a notch, with MIN at the top
                let angle = ((pointer - rect.center()).angle().to_degrees() + 90.).rem_euclid(360.);
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let notch = (angle / part_angle).floor() as u8;
                let picked = WindowHours::new(WindowHours::MIN + notch);
                if picked != *hours {
                    *hours = picked;
                    response.mark_changed();
                }
            }
        }

        let visuals = ui.style().interact(&response);
        let painter = ui.painter();
        painter.circle_filled(rect.center(), radius, visuals.bg_fill);
        painter.circle_stroke(rect.center(), radius, visuals.fg_stroke);

        // small ticks around the edge
        for notch in 0..NOTCHES {
            let angle = (part_angle * f32::from(notch) - 90.).to_radians();
            let outer = rect.center() + Vec2::angled(angle) * radius;
            let inner = rect.center() + Vec2::angled(angle) * radius * 0.9;
            painter.line_segment([inner, outer], Stroke::new(1., visuals.fg_stroke.color));
        }

        let angle = (part_angle * f32::from(hours.get() - WindowHours::MIN) - 90.).to_radians();
        let tip = rect.center() + Vec2::angled(angle) * radius * 0.8;
        let hand = visuals.fg_stroke.color;
        painter.line_segment([rect.center(), tip], Stroke::new(2., hand));
        painter.circle_filled(tip, 3., hand);

        response.on_hover_text(hours.to_string())
    }
}
