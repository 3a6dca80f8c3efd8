//! Arena geometry: obstacle motion, circle-rectangle hits and knockback

use super::{ARENA_HEIGHT, ARENA_WIDTH};

/// Axis-aligned rectangle described by its center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f32 {
        self.center_x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.center_x + self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.center_y - self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.center_y + self.height / 2.0
    }
}

/// Stateless geometry helpers used by the match tick
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Closest point on (or inside) the rectangle to the given point
    pub fn closest_point(px: f32, py: f32, rect: &Rect) -> (f32, f32) {
        let cx = px.clamp(rect.left(), rect.right());
        let cy = py.clamp(rect.top(), rect.bottom());
        (cx, cy)
    }

    /// Euclidean distance from a point to a rectangle (0 when inside)
    pub fn distance_to_rect(px: f32, py: f32, rect: &Rect) -> f32 {
        let (cx, cy) = Self::closest_point(px, py, rect);
        let dx = px - cx;
        let dy = py - cy;
        (dx * dx + dy * dy).sqrt()
    }

    /// Circle of `radius` around the point overlaps the rectangle
    pub fn circle_hits_rect(px: f32, py: f32, radius: f32, rect: &Rect) -> bool {
        Self::distance_to_rect(px, py, rect) < radius
    }

    /// Advance one axis of a moving box and reflect it off the walls at `0` and `max`.
    ///
    /// Returns the new center coordinate and velocity. The box edge never ends up
    /// outside the wall: a box that would cross it is placed flush against it and
    /// its velocity is pointed back into the arena.
    pub fn bounce_axis(pos: f32, vel: f32, half_extent: f32, max: f32) -> (f32, f32) {
        let next = pos + vel;
        let low = half_extent;
        let high = max - half_extent;

        if high < low {
            // Box wider than the arena; pin it to the middle
            return (max / 2.0, -vel);
        }

        if next <= low {
            (low, vel.abs())
        } else if next >= high {
            (high, -vel.abs())
        } else {
            (next, vel)
        }
    }

    /// Push a point `distance` away from `(from_x, from_y)` and clamp it to the arena.
    ///
    /// A zero-length separation leaves the point where it is.
    pub fn knockback(px: f32, py: f32, from_x: f32, from_y: f32, distance: f32) -> (f32, f32) {
        let dx = px - from_x;
        let dy = py - from_y;
        let mut len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            len = 1.0;
        }

        Self::clamp_to_arena(px + dx / len * distance, py + dy / len * distance)
    }

    pub fn clamp_to_arena(x: f32, y: f32) -> (f32, f32) {
        (x.clamp(0.0, ARENA_WIDTH), y.clamp(0.0, ARENA_HEIGHT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_point_inside_rect_is_the_point() {
        let rect = Rect::new(110.0, 100.0, 40.0, 40.0);
        assert_eq!(PhysicsSystem::closest_point(100.0, 100.0, &rect), (100.0, 100.0));
        assert_eq!(PhysicsSystem::distance_to_rect(100.0, 100.0, &rect), 0.0);
    }

    #[test]
    fn distance_to_corner() {
        let rect = Rect::new(0.0, 0.0, 20.0, 20.0);
        // Corner at (10, 10), point 3-4-5 away
        let d = PhysicsSystem::distance_to_rect(13.0, 14.0, &rect);
        assert!((d - 5.0).abs() < 1e-5);
    }

    #[test]
    fn hit_is_strictly_inside_radius() {
        let rect = Rect::new(100.0, 100.0, 40.0, 40.0);
        // Right edge at x=120
        assert!(PhysicsSystem::circle_hits_rect(139.0, 100.0, 20.0, &rect));
        assert!(!PhysicsSystem::circle_hits_rect(140.0, 100.0, 20.0, &rect));
    }

    #[test]
    fn bounce_flips_negative_velocity_at_left_wall() {
        let (x, dx) = PhysicsSystem::bounce_axis(21.0, -3.0, 20.0, ARENA_WIDTH);
        assert!(dx >= 0.0);
        assert_eq!(x, 20.0);
    }

    #[test]
    fn bounce_flips_positive_velocity_at_right_wall() {
        let (x, dx) = PhysicsSystem::bounce_axis(778.0, 3.5, 25.0, ARENA_WIDTH);
        assert!(dx < 0.0);
        assert_eq!(x, 775.0);
    }

    #[test]
    fn free_motion_keeps_velocity() {
        assert_eq!(PhysicsSystem::bounce_axis(400.0, 2.5, 25.0, ARENA_WIDTH), (402.5, 2.5));
    }

    #[test]
    fn box_never_escapes_over_many_steps() {
        let half = 40.0;
        let (mut x, mut dx) = (300.0_f32, -3.7_f32);
        for _ in 0..10_000 {
            let (nx, ndx) = PhysicsSystem::bounce_axis(x, dx, half, ARENA_WIDTH);
            x = nx;
            dx = ndx;
            assert!(x - half >= 0.0 && x + half <= ARENA_WIDTH, "escaped at x={}", x);
        }
    }

    #[test]
    fn knockback_moves_away_from_center() {
        let (x, y) = PhysicsSystem::knockback(100.0, 100.0, 110.0, 100.0, 40.0);
        assert_eq!((x, y), (60.0, 100.0));
    }

    #[test]
    fn knockback_is_clamped_to_arena() {
        let (x, y) = PhysicsSystem::knockback(10.0, 390.0, 30.0, 370.0, 40.0);
        assert_eq!(x, 0.0);
        assert_eq!(y, ARENA_HEIGHT);
    }

    #[test]
    fn knockback_with_zero_separation_stays_put() {
        let (x, y) = PhysicsSystem::knockback(200.0, 100.0, 200.0, 100.0, 40.0);
        assert_eq!((x, y), (200.0, 100.0));
    }
}
