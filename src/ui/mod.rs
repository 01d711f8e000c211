//! Render loop.
//!
//! An eframe application running on the main thread at display cadence. Each
//! frame takes one relaxed snapshot of the shared haptic state, paints the
//! scene, and overlays the position and update-rate labels. Escape or `x`
//! quits; the haptic loop is stopped and the device closed in `on_exit`, so
//! the shutdown ordering holds no matter how the window goes away.

mod scene;

use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use egui::{Align2, Color32, FontId, Key};
use tracing::info;

use crate::config::AppConfig;
use crate::haptics::{HapticHandle, SharedDisplayState};
use scene::SceneRenderer;

/// Repaint cadence; the haptic overlay only needs display refresh rates.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub struct HapticboxApp {
    shared: Arc<SharedDisplayState>,
    haptic: Option<HapticHandle>,
    scene: SceneRenderer,
    device_attached: bool,
}

impl HapticboxApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        shared: Arc<SharedDisplayState>,
        haptic: HapticHandle,
        config: &AppConfig,
        device_attached: bool,
    ) -> Self {
        Self {
            shared,
            haptic: Some(haptic),
            scene: SceneRenderer::new(&cc.egui_ctx, config.wall.half_extent),
            device_attached,
        }
    }
}

impl eframe::App for HapticboxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(Key::Escape) || i.key_pressed(Key::X)) {
            info!("quit requested from keyboard");
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        let snapshot = self.shared.snapshot();

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                ctx.request_repaint_after(FRAME_INTERVAL);
                let rect = ui.max_rect();
                let painter = ui.painter();

                self.scene.paint(painter, rect, &snapshot, self.device_attached);

                let font = FontId::monospace(14.0);
                if self.device_attached {
                    let mm = snapshot.position * 1000.0;
                    painter.text(
                        egui::pos2(rect.left() + 8.0, rect.bottom() - 8.0),
                        Align2::LEFT_BOTTOM,
                        format!(
                            "device position: ({:.2}, {:.2}, {:.2}) mm",
                            mm.x, mm.y, mm.z
                        ),
                        font.clone(),
                        Color32::BLACK,
                    );
                }
                painter.text(
                    egui::pos2(rect.left() + 8.0, rect.bottom() - 24.0),
                    Align2::LEFT_BOTTOM,
                    format!("haptic rate: {} Hz", snapshot.rate_hz),
                    font,
                    Color32::BLACK,
                );
            });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(handle) = self.haptic.take() {
            handle.shutdown();
        }
    }
}
