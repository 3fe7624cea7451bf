//! World assembly
//!
//! Builds the fixed rig once per run: the player base, the beam pivoted on top
//! of it, and one bucket welded to each beam end. Joint anchors are passed in
//! world coordinates and converted to body-local offsets here, so callers never
//! do center-of-mass math.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Entity, EntityRegistry, Label};
use super::world::{
    BodyDesc, BodyHandle, JointDesc, JointHandle, JointKind, PhysicsWorld, RectPart, Shape,
};
use crate::consts::*;
use crate::rotate;
use crate::tuning::Tuning;

/// Which end of the beam a bucket hangs from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// A fully assembled bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub body: BodyHandle,
    pub joint: JointHandle,
    pub side: Side,
}

/// Bodies that live for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rig {
    pub player: BodyHandle,
    pub beam: BodyHandle,
    pub pivot: JointHandle,
    pub buckets: [Bucket; 2],
}

/// Join two bodies at a shared world-space anchor
pub fn join_at(
    world: &mut dyn PhysicsWorld,
    kind: JointKind,
    body_a: BodyHandle,
    body_b: BodyHandle,
    anchor: Vec2,
) -> JointHandle {
    let local = |world: &dyn PhysicsWorld, body: BodyHandle| {
        let pos = world.position(body).unwrap_or(anchor);
        let angle = world.angle(body).unwrap_or(0.0);
        rotate(anchor - pos, -angle)
    };
    let local_anchor_a = local(&*world, body_a);
    let local_anchor_b = local(&*world, body_b);
    world.add_joint(JointDesc {
        kind,
        body_a,
        body_b,
        local_anchor_a,
        local_anchor_b,
    })
}

/// Open-topped bucket shape: floor plus two walls, origin at the center
pub fn bucket_shape() -> Shape {
    let wall_x = BUCKET_WIDTH / 2.0 - BUCKET_WALL / 2.0;
    Shape::Compound(vec![
        RectPart {
            offset: Vec2::new(0.0, BUCKET_HEIGHT / 2.0 - BUCKET_WALL / 2.0),
            width: BUCKET_WIDTH,
            height: BUCKET_WALL,
        },
        RectPart {
            offset: Vec2::new(-wall_x, 0.0),
            width: BUCKET_WALL,
            height: BUCKET_HEIGHT,
        },
        RectPart {
            offset: Vec2::new(wall_x, 0.0),
            width: BUCKET_WALL,
            height: BUCKET_HEIGHT,
        },
    ])
}

/// Create a bucket whose floor sits on `anchor` and weld it to `beam` there
pub fn build_bucket(
    world: &mut dyn PhysicsWorld,
    beam: BodyHandle,
    anchor: Vec2,
    side: Side,
) -> Bucket {
    let center = anchor - Vec2::new(0.0, BUCKET_HEIGHT / 2.0);
    let body = world.create_body(
        &BodyDesc::new(Label::Bucket, bucket_shape(), center)
            .density(BUCKET_DENSITY)
            .friction(0.8)
            .collision_group(RIG_COLLISION_GROUP),
    );
    let joint = join_at(world, JointKind::Weld, beam, body, anchor);
    Bucket { body, joint, side }
}

/// Create the player base, beam and buckets and register them
pub fn build_rig(
    world: &mut dyn PhysicsWorld,
    tuning: &Tuning,
    registry: &mut EntityRegistry,
) -> Rig {
    let center_x = tuning.viewport_width / 2.0;
    let player_pos = Vec2::new(center_x, tuning.player_rest_y());
    let player = world.create_body(
        &BodyDesc::new(
            Label::PlayerBase,
            Shape::Rect {
                width: PLAYER_WIDTH,
                height: PLAYER_HEIGHT,
            },
            player_pos,
        )
        .density(PLAYER_DENSITY)
        .friction(0.9)
        .collision_group(RIG_COLLISION_GROUP),
    );

    let pivot_point = player_pos - Vec2::new(0.0, PLAYER_HEIGHT / 2.0 + BEAM_HEIGHT / 2.0);
    let beam = world.create_body(
        &BodyDesc::new(
            Label::Beam,
            Shape::Rect {
                width: BEAM_WIDTH,
                height: BEAM_HEIGHT,
            },
            pivot_point,
        )
        .density(BEAM_DENSITY)
        .friction(0.6)
        .collision_group(RIG_COLLISION_GROUP),
    );
    let pivot = join_at(world, JointKind::Pivot, player, beam, pivot_point);

    let end_anchor = |side: Side| {
        pivot_point + Vec2::new(side.sign() * BEAM_WIDTH / 2.0, -BEAM_HEIGHT / 2.0)
    };
    let buckets = [
        build_bucket(world, beam, end_anchor(Side::Left), Side::Left),
        build_bucket(world, beam, end_anchor(Side::Right), Side::Right),
    ];

    registry.insert(player, Entity::tagged(Label::PlayerBase));
    registry.insert(beam, Entity::tagged(Label::Beam));
    for bucket in &buckets {
        registry.insert(bucket.body, Entity::tagged(Label::Bucket));
    }

    log::info!(
        "Rig built: player={:?} beam={:?} buckets={:?}/{:?}",
        player,
        beam,
        buckets[0].body,
        buckets[1].body
    );

    Rig {
        player,
        beam,
        pivot,
        buckets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::MemoryWorld;

    #[test]
    fn test_rig_layout() {
        let mut world = MemoryWorld::new();
        let mut registry = EntityRegistry::new();
        let tuning = Tuning::default();
        let rig = build_rig(&mut world, &tuning, &mut registry);

        let player = world.position(rig.player).unwrap();
        let beam = world.position(rig.beam).unwrap();
        assert_eq!(player, Vec2::new(400.0, tuning.player_rest_y()));
        assert!(beam.y < player.y, "beam sits on top of the player");
        assert_eq!(beam.x, player.x);

        let left = world.position(rig.buckets[0].body).unwrap();
        let right = world.position(rig.buckets[1].body).unwrap();
        assert!(left.x < beam.x && right.x > beam.x);
        assert!((left.x - (beam.x - BEAM_WIDTH / 2.0)).abs() < 1e-3);
        assert!(left.y < beam.y);
    }

    #[test]
    fn test_bucket_weld_uses_local_anchors() {
        let mut world = MemoryWorld::new();
        let mut registry = EntityRegistry::new();
        let rig = build_rig(&mut world, &Tuning::default(), &mut registry);

        let joint = world.joint(rig.buckets[1].joint).copied().unwrap();
        assert_eq!(joint.kind, JointKind::Weld);
        assert_eq!(joint.body_a, rig.beam);
        let beam_end = Vec2::new(BEAM_WIDTH / 2.0, -BEAM_HEIGHT / 2.0);
        assert!((joint.local_anchor_a - beam_end).length() < 1e-3);
        assert!((joint.local_anchor_b - Vec2::new(0.0, BUCKET_HEIGHT / 2.0)).length() < 1e-3);

        let pivot = world.joint(rig.pivot).copied().unwrap();
        assert_eq!(pivot.kind, JointKind::Pivot);
        assert_eq!(pivot.local_anchor_b, Vec2::ZERO);
    }

    #[test]
    fn test_rig_shares_collision_group() {
        let mut world = MemoryWorld::new();
        let mut registry = EntityRegistry::new();
        let rig = build_rig(&mut world, &Tuning::default(), &mut registry);
        assert!(!world.can_collide(rig.beam, rig.buckets[0].body));
        assert!(!world.can_collide(rig.player, rig.beam));
    }
}
