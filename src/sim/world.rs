//! Physics collaborator interface
//!
//! The rules layer never integrates motion or detects contacts itself. It
//! issues commands (create, remove, set velocity, apply torque/impulse) and
//! reads back state through [`PhysicsWorld`]. Any rigid-body engine can sit
//! behind it; [`super::MemoryWorld`] is the in-crate implementation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Label;

/// Opaque handle to a body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Opaque handle to a joint in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JointHandle(pub u32);

/// One rectangle of a compound shape, offset from the body origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectPart {
    pub offset: Vec2,
    pub width: f32,
    pub height: f32,
}

/// Collision geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rect { width: f32, height: f32 },
    Circle { radius: f32 },
    /// Rigid assembly of rectangles sharing one body
    Compound(Vec<RectPart>),
}

impl Shape {
    pub fn area(&self) -> f32 {
        match self {
            Shape::Rect { width, height } => width * height,
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Compound(parts) => parts.iter().map(|p| p.width * p.height).sum(),
        }
    }

    /// Moment of inertia about the body origin for the given mass
    pub fn inertia(&self, mass: f32) -> f32 {
        match self {
            Shape::Rect { width, height } => mass * (width * width + height * height) / 12.0,
            Shape::Circle { radius } => 0.5 * mass * radius * radius,
            Shape::Compound(parts) => {
                let area = self.area();
                if area <= 0.0 {
                    return 0.0;
                }
                parts
                    .iter()
                    .map(|p| {
                        let m = mass * (p.width * p.height) / area;
                        m * (p.width * p.width + p.height * p.height) / 12.0
                            + m * p.offset.length_squared()
                    })
                    .sum()
            }
        }
    }

    /// Radius of a circle enclosing the shape (used for broad-phase checks)
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Shape::Rect { width, height } => 0.5 * Vec2::new(*width, *height).length(),
            Shape::Circle { radius } => *radius,
            Shape::Compound(parts) => parts
                .iter()
                .map(|p| p.offset.length() + 0.5 * Vec2::new(p.width, p.height).length())
                .fold(0.0, f32::max),
        }
    }
}

/// Everything the physics world needs to create a body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub label: Label,
    pub shape: Shape,
    pub position: Vec2,
    pub angle: f32,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub is_static: bool,
    /// Bodies sharing the same negative group never collide with each other
    pub collision_group: i32,
}

impl BodyDesc {
    pub fn new(label: Label, shape: Shape, position: Vec2) -> Self {
        Self {
            label,
            shape,
            position,
            angle: 0.0,
            density: 0.001,
            friction: 0.1,
            restitution: 0.0,
            is_static: false,
            collision_group: 0,
        }
    }

    pub fn density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn collision_group(mut self, group: i32) -> Self {
        self.collision_group = group;
        self
    }

    pub fn mass(&self) -> f32 {
        self.density * self.shape.area()
    }
}

/// How a joint constrains its two bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JointKind {
    /// Shared anchor point, free relative rotation
    Pivot,
    /// Shared anchor point and locked relative rotation
    Weld,
}

/// Joint between two bodies, anchors expressed in each body's local frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointDesc {
    pub kind: JointKind,
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
}

/// Two bodies that started touching during a physics step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPair {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

impl ContactPair {
    pub fn new(a: BodyHandle, b: BodyHandle) -> Self {
        Self { a, b }
    }
}

/// The rigid-body engine as seen by the rules layer.
///
/// Mutations on a handle that is no longer in the world are silent no-ops and
/// queries return `None`; the rules layer relies on that to tolerate bodies
/// removed earlier in the same contact batch.
pub trait PhysicsWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;
    /// Returns false if the body was already gone
    fn remove_body(&mut self, handle: BodyHandle) -> bool;
    fn contains(&self, handle: BodyHandle) -> bool;
    /// All live bodies in ascending handle order
    fn body_handles(&self) -> Vec<BodyHandle>;

    fn position(&self, handle: BodyHandle) -> Option<Vec2>;
    fn velocity(&self, handle: BodyHandle) -> Option<Vec2>;
    fn angle(&self, handle: BodyHandle) -> Option<f32>;
    fn angular_velocity(&self, handle: BodyHandle) -> Option<f32>;
    fn inertia(&self, handle: BodyHandle) -> Option<f32>;
    fn mass(&self, handle: BodyHandle) -> Option<f32>;
    fn is_static(&self, handle: BodyHandle) -> bool;

    fn set_position(&mut self, handle: BodyHandle, position: Vec2);
    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2);
    fn set_angle(&mut self, handle: BodyHandle, angle: f32);
    fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: f32);
    /// Torque for the next step only; the world clears it after integrating
    fn apply_torque(&mut self, handle: BodyHandle, torque: f32);
    /// Instantaneous change of momentum
    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2);

    fn add_joint(&mut self, joint: JointDesc) -> JointHandle;

    /// Integrate one step and report the contact pairs that began during it
    fn step(&mut self, dt: f32) -> Vec<ContactPair>;
}
