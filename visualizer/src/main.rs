use isscore::math::Vec3;
use isscore::scene::{SceneSnapshot, TextureSet};
use isscore::tracking::StatusReport;
use iced::{
    mouse, time,
    widget::{
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, row, scrollable, text, Column, Container,
    },
    Alignment, Color, Element, Length, Point, Rectangle, Renderer, Subscription, Task, Theme,
};
use log::warn;
use serde::Deserialize;
use std::time::Duration;

const BRIDGE_HOST: &str = "127.0.0.1:9000";
/// Radians the globe turns per animation frame.
const SPIN_STEP: f64 = 0.004;

fn main() -> iced::Result {
    env_logger::init();
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Track the International Space Station".into()
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    Subscription::batch([
        time::every(Duration::from_secs(1)).map(|_| Message::Tick),
        time::every(Duration::from_millis(33)).map(|_| Message::Spin),
    ])
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

#[derive(Debug)]
struct Visualizer {
    payload: Option<DashboardPayload>,
    rotation: f64,
    status: String,
    /// Learned from whether the bridge serves `/diagnostics` to this client.
    development: Option<bool>,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    Spin,
    PayloadFetched(Result<DashboardPayload, String>),
    DiagnosticsChecked(Result<bool, String>),
}

impl Visualizer {
    fn new() -> Self {
        Visualizer {
            payload: None,
            rotation: 0.0,
            status: "Waiting for tracker...".into(),
            development: None,
            history: Vec::new(),
        }
    }

    fn boot() -> (Self, Task<Message>) {
        let state = Self::new();
        let task = state.refresh();
        (state, task)
    }

    /// Fetches the dashboard model, and asks about `/diagnostics` until the
    /// bridge has answered once.
    fn refresh(&self) -> Task<Message> {
        let payload = Task::perform(fetch_payload(), Message::PayloadFetched);
        if self.development.is_some() {
            return payload;
        }
        Task::batch([
            payload,
            Task::perform(fetch_development_flag(), Message::DiagnosticsChecked),
        ])
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => state.refresh(),
            Message::Spin => {
                state.rotation = (state.rotation + SPIN_STEP) % std::f64::consts::TAU;
                Task::none()
            }
            Message::PayloadFetched(Ok(payload)) => {
                let previous_points = state
                    .payload
                    .as_ref()
                    .map(|p| p.status.trail_points)
                    .unwrap_or(0);
                if payload.status.trail_points != previous_points {
                    state.push_history(format!(
                        "ISS at {}, {} ({} trail points)",
                        payload.status.iss_latitude,
                        payload.status.iss_longitude,
                        payload.status.trail_points
                    ));
                }
                state.status = "Connected to tracker".into();
                state.payload = Some(payload);
                Task::none()
            }
            Message::PayloadFetched(Err(err)) => {
                warn!("tracker fetch failed: {err}");
                state.status = format!("Tracker unavailable: {err}");
                Task::none()
            }
            Message::DiagnosticsChecked(Ok(development)) => {
                state.development = Some(development);
                Task::none()
            }
            Message::DiagnosticsChecked(Err(err)) => {
                warn!("diagnostics check failed: {err}");
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let globe: Element<'_, Message> = match state.payload.as_ref() {
            Some(DashboardPayload {
                scene: Some(scene), ..
            }) => column![
                Canvas::new(Globe {
                    scene: scene.clone(),
                    rotation: state.rotation,
                })
                .width(Length::Fill)
                .height(Length::Fixed(520.0)),
                text(texture_caption(&scene.textures)).size(11),
            ]
            .spacing(4)
            .align_x(Alignment::Center)
            .into(),
            Some(DashboardPayload { fallback, .. }) => Container::new(
                text(fallback.clone().unwrap_or_else(|| {
                    "3D visualization not available. ISS position data is still shown below."
                        .into()
                }))
                .size(16),
            )
            .padding(24)
            .into(),
            None => Container::new(text("Loading Earth...").size(16))
                .padding(24)
                .into(),
        };

        let cards: Element<'_, Message> = match state.payload.as_ref() {
            Some(payload) => {
                let report = &payload.status;
                let mut cards = row![iss_card(report), location_card(report)].spacing(20);
                if state.development == Some(true) {
                    cards = cards.push(tracking_card(report));
                }
                cards.into()
            }
            None => text(&state.status).size(14).into(),
        };

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let layout = column![
            text("Track the International Space Station").size(32),
            globe,
            text("Rotate: automatic").size(12),
            cards,
            text(&state.status).size(12),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(90.0))).padding(6),
        ]
        .spacing(14)
        .padding(20)
        .align_x(Alignment::Center);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

fn iss_card(report: &StatusReport) -> Element<'_, Message> {
    Container::new(
        column![
            text("ISS Location").size(18),
            text(format!(
                "Lat: {}, Long: {}",
                report.iss_latitude, report.iss_longitude
            ))
            .size(14),
            text(format!("Last updated: {}", report.last_updated)).size(12),
            text("Data provided by: Open Notify API").size(11),
        ]
        .spacing(6),
    )
    .padding(12)
    .width(Length::FillPortion(1))
    .into()
}

fn location_card(report: &StatusReport) -> Element<'_, Message> {
    let body = if report.viewer_loading {
        Column::new().push(text("Detecting your location...").size(14))
    } else {
        let mut body = Column::new().spacing(4);
        if let Some(place) = &report.viewer_place {
            body = body.push(text(place.clone()).size(14));
        }
        body = body.push(
            text(format!(
                "Lat: {}, Long: {}",
                report.viewer_latitude, report.viewer_longitude
            ))
            .size(14),
        );
        if let Some(ip) = &report.viewer_ip {
            body = body.push(text(format!("IP Address: {ip}")).size(12));
        }
        body
    };

    Container::new(
        column![text("Your Location").size(18), body]
            .spacing(6),
    )
    .padding(12)
    .width(Length::FillPortion(1))
    .into()
}

fn tracking_card(report: &StatusReport) -> Element<'_, Message> {
    Container::new(
        column![
            text("Tracking Data (Development Only)").size(18),
            text(format!("Trail Points: {}", report.trail_points)).size(14),
            text(format!("Tracking Time: {}", report.tracking_time)).size(14),
            text("Environment: Development Server").size(14),
        ]
        .spacing(6),
    )
    .padding(12)
    .width(Length::FillPortion(1))
    .into()
}

fn texture_caption(textures: &TextureSet) -> String {
    if textures.is_remote() {
        "Textures: three-globe CDN".into()
    } else {
        format!("Textures: {}", textures.base())
    }
}

async fn fetch_development_flag() -> Result<bool, String> {
    let response = reqwest::get(format!("http://{BRIDGE_HOST}/diagnostics"))
        .await
        .map_err(|e| e.to_string())?;
    Ok(response.status().is_success())
}

async fn fetch_payload() -> Result<DashboardPayload, String> {
    let response = reqwest::get(format!("http://{BRIDGE_HOST}/state"))
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<DashboardPayload>()
        .await
        .map_err(|e| e.to_string())
}

#[derive(Debug, Clone, Deserialize)]
struct DashboardPayload {
    status: StatusReport,
    #[serde(default)]
    scene: Option<SceneSnapshot>,
    #[serde(default)]
    fallback: Option<String>,
}

/// Orthographic view of the globe with the camera on the +Z axis.
#[derive(Clone)]
struct Globe {
    scene: SceneSnapshot,
    rotation: f64,
}

impl Globe {
    fn to_screen(&self, point: Vec3, center: Point, scale: f32) -> Option<Point> {
        let rotated = point.rotate_y(self.rotation);
        let behind_earth = rotated.z < 0.0
            && rotated.x * rotated.x + rotated.y * rotated.y
                < self.scene.earth_radius * self.scene.earth_radius;
        if behind_earth {
            return None;
        }
        Some(Point::new(
            center.x + rotated.x as f32 * scale,
            center.y - rotated.y as f32 * scale,
        ))
    }
}

impl canvas::Program<Message> for Globe {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.03, 0.02, 0.12),
        );

        let center = Point::new(bounds.width / 2.0, bounds.height / 2.0);
        // Leave room for the orbit above the surface.
        let scale = (bounds.width.min(bounds.height) / 2.0 - 12.0) / 2.6;
        let earth_radius = self.scene.earth_radius as f32 * scale;

        let earth = Path::new(|builder| builder.circle(center, earth_radius));
        frame.fill(&earth, Color::from_rgb(0.08, 0.22, 0.45));
        let atmosphere = Path::new(|builder| builder.circle(center, earth_radius * 1.075));
        frame.stroke(
            &atmosphere,
            Stroke::default()
                .with_width(2.0)
                .with_color(Color::from_rgba(0.0, 0.53, 1.0, 0.35)),
        );

        let mut segment: Vec<Point> = Vec::new();
        let mut segments: Vec<Vec<Point>> = Vec::new();
        for point in &self.scene.trail {
            match self.to_screen(*point, center, scale) {
                Some(screen) => segment.push(screen),
                None => {
                    if segment.len() > 1 {
                        segments.push(std::mem::take(&mut segment));
                    } else {
                        segment.clear();
                    }
                }
            }
        }
        if segment.len() > 1 {
            segments.push(segment);
        }
        for points in &segments {
            let trail = Path::new(|builder| {
                builder.move_to(points[0]);
                for point in &points[1..] {
                    builder.line_to(*point);
                }
            });
            frame.stroke(
                &trail,
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgba(0.29, 0.61, 1.0, 0.8)),
            );
        }

        if let Some(marker) = self
            .scene
            .user_marker
            .and_then(|p| self.to_screen(p, center, scale))
        {
            let pin = Path::new(|builder| builder.circle(marker, 4.0));
            frame.fill(&pin, Color::from_rgb(1.0, 0.33, 0.33));
        }

        if let Some(iss) = self.to_screen(self.scene.iss, center, scale) {
            let halo = Path::new(|builder| builder.circle(iss, 9.0));
            frame.fill(&halo, Color::from_rgba(1.0, 0.85, 0.3, 0.25));
            let body = Path::new(|builder| builder.circle(iss, 4.5));
            frame.fill(&body, Color::from_rgb(1.0, 0.85, 0.3));
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn globe(rotation: f64) -> Globe {
        Globe {
            scene: SceneSnapshot {
                earth_radius: 2.0,
                iss: Vec3::new(0.0, 0.0, 2.3),
                trail: Vec::new(),
                user_marker: None,
                textures: TextureSet::remote(),
            },
            rotation,
        }
    }

    #[test]
    fn front_facing_points_are_drawn() {
        let screen = globe(0.0).to_screen(Vec3::new(1.0, 1.0, 1.5), Point::new(100.0, 100.0), 10.0);
        assert_eq!(screen, Some(Point::new(110.0, 90.0)));
    }

    #[test]
    fn points_behind_the_earth_are_hidden() {
        let center = Point::new(0.0, 0.0);
        let g = globe(0.0);
        assert_eq!(g.to_screen(Vec3::new(0.5, 0.0, -2.3), center, 1.0), None);
        // Outside the silhouette the far side stays visible.
        assert!(g.to_screen(Vec3::new(2.2, 0.0, -0.5), center, 1.0).is_some());
        // Half a turn brings the far side around.
        assert!(globe(std::f64::consts::PI)
            .to_screen(Vec3::new(0.5, 0.0, -2.3), center, 1.0)
            .is_some());
    }

    #[test]
    fn development_card_follows_diagnostics_answer() {
        let mut state = Visualizer::new();
        assert_eq!(state.development, None);

        let _ = Visualizer::update(
            &mut state,
            Message::DiagnosticsChecked(Err("connection refused".into())),
        );
        assert_eq!(state.development, None);

        let _ = Visualizer::update(&mut state, Message::DiagnosticsChecked(Ok(false)));
        assert_eq!(state.development, Some(false));
    }

    #[test]
    fn caption_names_texture_source() {
        assert_eq!(texture_caption(&TextureSet::remote()), "Textures: three-globe CDN");
        assert_eq!(
            texture_caption(&TextureSet::under("/srv/textures")),
            "Textures: /srv/textures"
        );
    }
}
