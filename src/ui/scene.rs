//! Fixed-camera scene painter.
//!
//! Projects the 3D scene onto the egui painter with a small hand-rolled
//! perspective camera: eye at (0.2, 0, 0) looking at the origin, +Z up.
//! Drawn back to front: background, cube faces (checker texture, flat
//! shading, painter's algorithm), wall boundary lines, velocity vector,
//! cursor. Everything here is read-only display plumbing over a
//! [`DisplaySnapshot`]; nothing feeds back into the simulation.

use egui::epaint::Vertex;
use egui::{
    Color32, ColorImage, Context, Mesh, Painter, Pos2, Rect, Shape, Stroke, TextureHandle,
    TextureOptions,
};
use glam::DVec3;

use crate::haptics::DisplaySnapshot;

/// Camera position; looks at the origin with +Z up, exactly like the
/// original scene setup.
const EYE: DVec3 = DVec3::new(0.2, 0.0, 0.0);
/// Screen-space scale per unit of (lateral offset / depth).
const FOCAL: f32 = 0.9;

/// Half-size of the displayed cube, meters.
const CUBE_HALF: f64 = 0.05;
/// Wall boundary lines are drawn over this span of the unconstrained axes.
const WALL_LINE_SPAN: f64 = 0.06;
/// Cursor sphere radius, meters.
const CURSOR_RADIUS: f64 = 0.005;

/// Cursor colors: light orange normally, blue past the +Y wall. The recolor
/// mirrors the original demo's position heuristic and is cosmetic only.
const CURSOR_OFF: Color32 = Color32::from_rgb(255, 128, 0);
const CURSOR_ON: Color32 = Color32::from_rgb(77, 77, 204);

const BACKGROUND: Color32 = Color32::from_rgb(0, 255, 0);
const WALL_STROKE: Color32 = Color32::from_gray(230);

pub struct SceneRenderer {
    texture: TextureHandle,
    wall_half_extent: f64,
}

impl SceneRenderer {
    pub fn new(ctx: &Context, wall_half_extent: f64) -> Self {
        Self {
            texture: ctx.load_texture("cube-checker", checker_image(), TextureOptions::NEAREST),
            wall_half_extent,
        }
    }

    pub fn paint(
        &self,
        painter: &Painter,
        rect: Rect,
        snapshot: &DisplaySnapshot,
        device_attached: bool,
    ) {
        painter.rect_filled(rect, egui::CornerRadius::ZERO, BACKGROUND);
        self.paint_cube(painter, rect);
        self.paint_walls(painter, rect);
        if device_attached {
            self.paint_cursor(painter, rect, snapshot);
        }
    }

    /// Perspective projection into `rect`. Returns the screen point and the
    /// view depth, or `None` behind the camera.
    fn project(&self, point: DVec3, rect: &Rect) -> Option<(Pos2, f64)> {
        let rel = point - EYE;
        // Forward is -X; right is +Y; up is +Z.
        let depth = -rel.x;
        if depth <= 1e-4 {
            return None;
        }
        let scale = rect.width().min(rect.height()) * FOCAL;
        let x = rect.center().x + (rel.y / depth) as f32 * scale;
        let y = rect.center().y - (rel.z / depth) as f32 * scale;
        Some((Pos2::new(x, y), depth))
    }

    fn paint_cube(&self, painter: &Painter, rect: Rect) {
        let h = CUBE_HALF;
        // Each face: four corners counter-clockwise seen from outside, plus
        // the outward normal.
        let faces: [([DVec3; 4], DVec3); 6] = [
            (quad(h, [(-1, 1, -1), (-1, -1, -1), (-1, -1, 1), (-1, 1, 1)]), DVec3::NEG_X),
            (quad(h, [(1, -1, -1), (1, 1, -1), (1, 1, 1), (1, -1, 1)]), DVec3::X),
            (quad(h, [(-1, -1, -1), (1, -1, -1), (1, -1, 1), (-1, -1, 1)]), DVec3::NEG_Y),
            (quad(h, [(1, 1, -1), (-1, 1, -1), (-1, 1, 1), (1, 1, 1)]), DVec3::Y),
            (quad(h, [(-1, -1, -1), (-1, 1, -1), (1, 1, -1), (1, -1, -1)]), DVec3::NEG_Z),
            (quad(h, [(1, -1, 1), (1, 1, 1), (-1, 1, 1), (-1, -1, 1)]), DVec3::Z),
        ];

        let light = DVec3::new(2.0, 0.5, 1.0).normalize();

        // Visible faces, farthest first.
        let mut visible: Vec<(f64, [Pos2; 4], f32)> = Vec::with_capacity(3);
        for (corners, normal) in faces {
            let center = (corners[0] + corners[2]) * 0.5;
            if normal.dot(EYE - center) <= 0.0 {
                continue;
            }
            let mut screen = [Pos2::ZERO; 4];
            let mut depth_sum = 0.0;
            let mut clipped = false;
            for (i, corner) in corners.iter().enumerate() {
                match self.project(*corner, &rect) {
                    Some((pos, depth)) => {
                        screen[i] = pos;
                        depth_sum += depth;
                    }
                    None => {
                        clipped = true;
                        break;
                    }
                }
            }
            if clipped {
                continue;
            }
            let brightness = (0.35 + 0.65 * normal.dot(light).max(0.0)) as f32;
            visible.push((depth_sum / 4.0, screen, brightness));
        }
        visible.sort_by(|a, b| b.0.total_cmp(&a.0));

        let uv = [
            Pos2::new(0.0, 0.0),
            Pos2::new(1.0, 0.0),
            Pos2::new(1.0, 1.0),
            Pos2::new(0.0, 1.0),
        ];
        for (_, screen, brightness) in visible {
            let shade = Color32::from_gray((brightness * 255.0) as u8);
            let mut mesh = Mesh::with_texture(self.texture.id());
            let base = mesh.vertices.len() as u32;
            for i in 0..4 {
                mesh.vertices.push(Vertex {
                    pos: screen[i],
                    uv: uv[i],
                    color: shade,
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
            painter.add(Shape::mesh(mesh));
        }
    }

    /// The four wall boundary lines at y,z = +/- bound in the x = 0 plane.
    fn paint_walls(&self, painter: &Painter, rect: Rect) {
        let b = self.wall_half_extent;
        let s = WALL_LINE_SPAN;
        let lines = [
            (DVec3::new(0.0, b, s), DVec3::new(0.0, b, -s)),
            (DVec3::new(0.0, -b, s), DVec3::new(0.0, -b, -s)),
            (DVec3::new(0.0, -s, b), DVec3::new(0.0, s, b)),
            (DVec3::new(0.0, -s, -b), DVec3::new(0.0, s, -b)),
        ];
        let stroke = Stroke::new(1.0, WALL_STROKE);
        for (from, to) in lines {
            if let (Some((pa, _)), Some((pb, _))) =
                (self.project(from, &rect), self.project(to, &rect))
            {
                painter.line_segment([pa, pb], stroke);
            }
        }
    }

    fn paint_cursor(&self, painter: &Painter, rect: Rect, snapshot: &DisplaySnapshot) {
        let Some((pos, depth)) = self.project(snapshot.position, &rect) else {
            return;
        };

        // Velocity vector, tail at the cursor.
        let tip = snapshot.position + snapshot.velocity;
        if let Some((tip_pos, _)) = self.project(tip, &rect) {
            painter.line_segment([pos, tip_pos], Stroke::new(1.5, Color32::WHITE));
        }

        let scale = rect.width().min(rect.height()) * FOCAL;
        let radius = ((CURSOR_RADIUS / depth) as f32 * scale).max(2.0);
        let color = if snapshot.position.y > self.wall_half_extent {
            CURSOR_ON
        } else {
            CURSOR_OFF
        };
        painter.circle_filled(pos, radius, color);
    }
}

fn quad(h: f64, signs: [(i8, i8, i8); 4]) -> [DVec3; 4] {
    signs.map(|(x, y, z)| DVec3::new(f64::from(x) * h, f64::from(y) * h, f64::from(z) * h))
}

fn checker_image() -> ColorImage {
    const SIZE: usize = 64;
    const CELL: usize = 8;
    let mut image = ColorImage::new([SIZE, SIZE], Color32::WHITE);
    for y in 0..SIZE {
        for x in 0..SIZE {
            if (x / CELL + y / CELL) % 2 == 0 {
                image.pixels[y * SIZE + x] = Color32::from_gray(120);
            }
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checker_alternates_cells() {
        let image = checker_image();
        assert_eq!(image.pixels[0], Color32::from_gray(120));
        assert_eq!(image.pixels[8], Color32::WHITE);
        assert_eq!(image.pixels[8 * 64], Color32::WHITE);
    }
}
