use crate::config::ZoomConfig;
use crate::types::Point;

/// Pan offset and zoom factor mapping graph space to screen space:
/// `screen = world * zoom + pan`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pan: Point,
    zoom: f64,
    bounds: ZoomConfig,
}

impl Viewport {
    pub fn new(bounds: ZoomConfig) -> Self {
        Self {
            pan: Point::default(),
            zoom: 1.0_f64.clamp(bounds.min, bounds.max),
            bounds,
        }
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn bounds(&self) -> ZoomConfig {
        self.bounds
    }

    pub fn set_pan(&mut self, pan: Point) {
        self.pan = pan;
    }

    pub fn pan_by(&mut self, delta: Point) {
        self.pan = self.pan + delta;
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        (screen - self.pan) * (1.0 / self.zoom)
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        world * self.zoom + self.pan
    }

    /// Set the zoom keeping the world point under `cursor` visually fixed.
    pub fn set_zoom_at(&mut self, cursor: Point, zoom: f64) {
        let world = self.screen_to_world(cursor);
        let zoom = zoom.clamp(self.bounds.min, self.bounds.max);
        self.zoom = zoom;
        self.pan = cursor - world * zoom;
    }

    /// Multiply the zoom by `factor` around `cursor`.
    pub fn zoom_at(&mut self, cursor: Point, factor: f64) {
        self.set_zoom_at(cursor, self.zoom * factor);
    }

    /// Step the zoom by whole configured increments (negative zooms out).
    pub fn zoom_steps_at(&mut self, cursor: Point, steps: i32) {
        self.set_zoom_at(cursor, self.zoom + self.bounds.step * f64::from(steps));
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ZoomConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::Viewport;
    use crate::types::Point;

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn zoom_is_clamped() {
        let mut viewport = Viewport::default();
        viewport.zoom_at(Point::default(), 10.0);
        assert_eq!(viewport.zoom(), 1.4);
        viewport.zoom_at(Point::default(), 0.01);
        assert_eq!(viewport.zoom(), 0.6);
    }

    #[test]
    fn zoom_keeps_cursor_point_stationary() {
        let mut viewport = Viewport::default();
        viewport.set_pan(Point::new(35.0, -12.0));
        let cursor = Point::new(400.0, 300.0);
        let before = viewport.screen_to_world(cursor);
        viewport.zoom_at(cursor, 1.25);
        assert!(close(viewport.screen_to_world(cursor), before));
        assert_eq!(viewport.pan(), cursor - before * viewport.zoom());
    }

    #[test]
    fn screen_world_round_trip() {
        let mut viewport = Viewport::default();
        viewport.set_pan(Point::new(10.0, 20.0));
        viewport.set_zoom_at(Point::default(), 0.8);
        let world = Point::new(123.0, -45.0);
        assert!(close(
            viewport.screen_to_world(viewport.world_to_screen(world)),
            world
        ));
    }

    #[test]
    fn steps_use_configured_increment() {
        let mut viewport = Viewport::default();
        viewport.zoom_steps_at(Point::default(), 2);
        assert!((viewport.zoom() - 1.2).abs() < 1e-12);
    }
}
