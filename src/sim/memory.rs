//! In-memory physics world
//!
//! A small deterministic implementation of [`PhysicsWorld`]: explicit Euler
//! integration, joints solved by snapping the second body onto the first, and
//! bounding-circle contact detection. It has no collision response. It exists
//! so the rules layer can be exercised headless and in tests without a real
//! rigid-body engine.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

use super::world::{
    BodyDesc, BodyHandle, ContactPair, JointDesc, JointHandle, JointKind, PhysicsWorld,
};
use crate::consts::GRAVITY;
use crate::{normalize_angle, rotate};

/// Body record kept by [`MemoryWorld`]
#[derive(Debug, Clone)]
pub struct MemoryBody {
    pub desc: BodyDesc,
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub angular_vel: f32,
    pub mass: f32,
    pub inertia: f32,
    /// Torque queued for the next step
    pub torque: f32,
}

#[derive(Debug, Clone)]
pub struct MemoryWorld {
    bodies: BTreeMap<BodyHandle, MemoryBody>,
    joints: BTreeMap<JointHandle, JointDesc>,
    /// Pairs overlapping at the end of the previous step
    touching: BTreeSet<(BodyHandle, BodyHandle)>,
    pub gravity: Vec2,
    next_body: u32,
    next_joint: u32,
}

impl Default for MemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self {
            bodies: BTreeMap::new(),
            joints: BTreeMap::new(),
            touching: BTreeSet::new(),
            gravity: Vec2::new(0.0, GRAVITY),
            next_body: 1,
            next_joint: 1,
        }
    }

    /// World with gravity disabled, handy when a test wants bodies to stay put
    pub fn weightless() -> Self {
        Self {
            gravity: Vec2::ZERO,
            ..Self::new()
        }
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&MemoryBody> {
        self.bodies.get(&handle)
    }

    pub fn joint(&self, handle: JointHandle) -> Option<&JointDesc> {
        self.joints.get(&handle)
    }

    /// Torque queued on a body for the coming step
    pub fn pending_torque(&self, handle: BodyHandle) -> f32 {
        self.bodies.get(&handle).map_or(0.0, |b| b.torque)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Collision filter: a shared negative group never collides
    pub fn can_collide(&self, a: BodyHandle, b: BodyHandle) -> bool {
        match (self.bodies.get(&a), self.bodies.get(&b)) {
            (Some(a), Some(b)) => {
                let (ga, gb) = (a.desc.collision_group, b.desc.collision_group);
                !(ga < 0 && ga == gb) && !(a.desc.is_static && b.desc.is_static)
            }
            _ => false,
        }
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.values_mut() {
            if body.desc.is_static {
                body.torque = 0.0;
                continue;
            }
            body.vel += gravity * dt;
            body.pos += body.vel * dt;
            if body.inertia > 0.0 {
                body.angular_vel += body.torque / body.inertia * dt;
            }
            body.angle = normalize_angle(body.angle + body.angular_vel * dt);
            body.torque = 0.0;
        }
    }

    fn solve_joints(&mut self) {
        for joint in self.joints.values() {
            let Some(a) = self.bodies.get(&joint.body_a).cloned() else {
                continue;
            };
            let Some(b) = self.bodies.get_mut(&joint.body_b) else {
                continue;
            };
            let anchor = a.pos + rotate(joint.local_anchor_a, a.angle);
            if joint.kind == JointKind::Weld {
                b.angle = a.angle;
                b.angular_vel = a.angular_vel;
            }
            b.pos = anchor - rotate(joint.local_anchor_b, b.angle);
            b.vel = a.vel;
        }
    }

    fn detect_contacts(&mut self) -> Vec<ContactPair> {
        let handles: Vec<BodyHandle> = self.bodies.keys().copied().collect();
        let mut overlapping = BTreeSet::new();
        for (i, &a) in handles.iter().enumerate() {
            for &b in &handles[i + 1..] {
                if !self.can_collide(a, b) {
                    continue;
                }
                let (ba, bb) = (&self.bodies[&a], &self.bodies[&b]);
                let reach = ba.desc.shape.bounding_radius() + bb.desc.shape.bounding_radius();
                if ba.pos.distance_squared(bb.pos) < reach * reach {
                    overlapping.insert((a, b));
                }
            }
        }
        let started = overlapping
            .difference(&self.touching)
            .map(|&(a, b)| ContactPair::new(a, b))
            .collect();
        self.touching = overlapping;
        started
    }
}

impl PhysicsWorld for MemoryWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_body);
        self.next_body += 1;
        let mass = desc.mass();
        self.bodies.insert(
            handle,
            MemoryBody {
                pos: desc.position,
                vel: Vec2::ZERO,
                angle: desc.angle,
                angular_vel: 0.0,
                mass,
                inertia: desc.shape.inertia(mass),
                torque: 0.0,
                desc: desc.clone(),
            },
        );
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        if self.bodies.remove(&handle).is_none() {
            return false;
        }
        self.joints.retain(|_, j| j.body_a != handle && j.body_b != handle);
        self.touching.retain(|&(a, b)| a != handle && b != handle);
        true
    }

    fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(&handle)
    }

    fn body_handles(&self) -> Vec<BodyHandle> {
        self.bodies.keys().copied().collect()
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|b| b.pos)
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|b| b.vel)
    }

    fn angle(&self, handle: BodyHandle) -> Option<f32> {
        self.bodies.get(&handle).map(|b| b.angle)
    }

    fn angular_velocity(&self, handle: BodyHandle) -> Option<f32> {
        self.bodies.get(&handle).map(|b| b.angular_vel)
    }

    fn inertia(&self, handle: BodyHandle) -> Option<f32> {
        self.bodies.get(&handle).map(|b| b.inertia)
    }

    fn mass(&self, handle: BodyHandle) -> Option<f32> {
        self.bodies.get(&handle).map(|b| b.mass)
    }

    fn is_static(&self, handle: BodyHandle) -> bool {
        self.bodies.get(&handle).is_some_and(|b| b.desc.is_static)
    }

    fn set_position(&mut self, handle: BodyHandle, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.pos = position;
        }
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.vel = velocity;
        }
    }

    fn set_angle(&mut self, handle: BodyHandle, angle: f32) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.angle = angle;
        }
    }

    fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: f32) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.angular_vel = angular_velocity;
        }
    }

    fn apply_torque(&mut self, handle: BodyHandle, torque: f32) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.torque += torque;
        }
    }

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            if !body.desc.is_static && body.mass > 0.0 {
                body.vel += impulse / body.mass;
            }
        }
    }

    fn add_joint(&mut self, joint: JointDesc) -> JointHandle {
        let handle = JointHandle(self.next_joint);
        self.next_joint += 1;
        self.joints.insert(handle, joint);
        handle
    }

    fn step(&mut self, dt: f32) -> Vec<ContactPair> {
        self.integrate(dt);
        self.solve_joints();
        self.detect_contacts()
    }
}
