/// Pure geometry: playfield-space vectors, rectangles, and the
/// scale-and-offset transform between device and playfield coordinates.

use std::ops::{Add, Mul, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle, origin at the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn centered(center: Vec2, w: f32, h: f32) -> Self {
        Self::new(center.x - w / 2.0, center.y - h / 2.0, w, h)
    }

    /// Closed containment test: points on any edge count as inside.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Letterbox mapping of the logical playfield into a device viewport.
/// The scale preserves the aspect ratio; the offset centers the result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub offset: Vec2,
}

impl Viewport {
    pub fn fit(logical: Vec2, device: Vec2) -> Self {
        let scale = (device.x / logical.x).min(device.y / logical.y).max(f32::EPSILON);
        let offset = Vec2::new(
            (device.x - logical.x * scale) / 2.0,
            (device.y - logical.y * scale) / 2.0,
        );
        Self { scale, offset }
    }

    /// Device point (pointer position) to playfield coordinates.
    pub fn to_logical(&self, device: Vec2) -> Vec2 {
        (device - self.offset) * (1.0 / self.scale)
    }

    /// Playfield coordinates to device space.
    pub fn to_device(&self, logical: Vec2) -> Vec2 {
        logical * self.scale + self.offset
    }
}
