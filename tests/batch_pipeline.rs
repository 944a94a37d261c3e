//! Host-side behaviour of the batched geometry pipeline: encoding the demo
//! grid and deciding when the encoded batch is rebuilt or reused.
//!
//! No GPU is involved; `BatchUpdate::Rebuild` is what the renderer uploads.
//!
use std::sync::Arc;

use batched_deferred::renderer::{
    encode, BatchCache, BatchMode, BatchUpdate, CacheState, DrawCommand, RebuildReason,
};
use batched_deferred::scene::scene::grid_objects;
use batched_deferred::scene::{primitives, DrawableObject, Geometry, InstanceData, Scene};
use batched_deferred::settings::{GridSettings, RenderSettings};
use glam::Vec3;

fn grid(x: u32, y: u32, z: u32) -> GridSettings {
    GridSettings {
        x,
        y,
        z,
        spread: 2.0,
    }
}

fn rebuild_reason(update: BatchUpdate<'_>) -> Option<RebuildReason> {
    match update {
        BatchUpdate::Rebuild { reason, .. } => Some(reason),
        BatchUpdate::Reuse => None,
    }
}

#[test]
fn grid_batch_has_one_command_per_object_in_order() {
    let objects = grid_objects(&grid(4, 3, 2));
    let batch = encode(&objects);

    assert_eq!(batch.command_count() as usize, objects.len());
    let mut first_vertex = 0;
    for (i, (command, object)) in batch.commands.iter().zip(&objects).enumerate() {
        assert_eq!(command.vertex_count, object.vertex_count());
        assert_eq!(command.instance_count, 1);
        assert_eq!(command.first_vertex, first_vertex);
        assert_eq!(command.first_instance, i as u32);
        first_vertex += command.vertex_count;
    }
    assert_eq!(batch.total_vertices(), first_vertex);
}

#[test]
fn every_command_reads_back_its_object() {
    let objects = grid_objects(&grid(3, 2, 2));
    let batch = encode(&objects);

    for (i, object) in objects.iter().enumerate() {
        assert_eq!(batch.vertex_slice(i), Some(object.geometry().vertices()));

        let instance = &batch.instances[batch.commands[i].first_instance as usize];
        assert_eq!(instance.position, object.instance.position.to_array());
        assert_eq!(instance.color, object.instance.color.to_array());
    }
}

#[test]
fn indirect_bytes_are_four_packed_u32_per_command() {
    let objects = grid_objects(&grid(2, 1, 1));
    let batch = encode(&objects);
    let words: &[u32] = bytemuck::cast_slice(&batch.commands);

    assert_eq!(
        bytemuck::cast_slice::<DrawCommand, u8>(&batch.commands).len() as u64,
        DrawCommand::SIZE * 2
    );
    // Prism (24 vertices) then cube (36 vertices).
    assert_eq!(words, &[24, 1, 0, 0, 36, 1, 24, 1]);
}

#[test]
fn mixed_three_and_six_vertex_objects() {
    let tri = Arc::new(Geometry::from_floats(&[0.0; 18]).unwrap());
    let hex = Arc::new(Geometry::from_floats(&[0.0; 36]).unwrap());
    let objects = vec![
        DrawableObject::new(tri, InstanceData::new(Vec3::X, Vec3::ONE)),
        DrawableObject::new(hex, InstanceData::new(Vec3::Y, Vec3::ZERO)),
    ];

    let batch = encode(&objects);

    assert_eq!(batch.vertex_floats().len(), 54);
    assert_eq!(batch.instance_floats().len(), 12);
    assert_eq!(batch.commands[1].first_vertex, 3);
    assert_eq!(batch.commands[1].first_instance, 1);
}

#[test]
fn empty_scene_encodes_to_nothing_and_still_validates_cache() {
    let mut cache = BatchCache::new(BatchMode::StaticCached);

    match cache.prepare(&[]) {
        BatchUpdate::Rebuild { batch, reason } => {
            assert!(batch.is_empty());
            assert_eq!(batch.command_count(), 0);
            assert_eq!(reason, RebuildReason::FirstFrame);
        }
        BatchUpdate::Reuse => panic!("first frame must rebuild"),
    }
    assert_eq!(cache.state(), CacheState::Valid);
    assert!(!cache.prepare(&[]).is_rebuild());
}

#[test]
fn static_batch_keeps_stale_instance_data_until_invalidated() {
    let settings = RenderSettings {
        light_count: 0,
        grid: grid(2, 2, 2),
        ..RenderSettings::default()
    };
    let mut scene = Scene::from_settings(&settings);
    let mut cache = BatchCache::new(BatchMode::StaticCached);

    assert_eq!(
        rebuild_reason(cache.prepare(scene.objects())),
        Some(RebuildReason::FirstFrame)
    );

    let moved = Vec3::new(-5.0, -5.0, -5.0);
    scene.objects_mut()[0].set_position(moved);

    // Same shape, so the cache reuses the old upload.
    assert!(!cache.prepare(scene.objects()).is_rebuild());
    let stale = cache.batch().map(|b| b.instances[0].position);
    assert_ne!(stale, Some(moved.to_array()));

    cache.mark_dirty();
    match cache.prepare(scene.objects()) {
        BatchUpdate::Rebuild { batch, reason } => {
            assert_eq!(reason, RebuildReason::MarkedDirty);
            assert_eq!(batch.instances[0].position, moved.to_array());
        }
        BatchUpdate::Reuse => panic!("dirty cache must rebuild"),
    }
}

#[test]
fn static_batch_rebuilds_when_object_set_changes_shape() {
    let mut objects = grid_objects(&grid(2, 2, 1));
    let mut cache = BatchCache::new(BatchMode::StaticCached);
    cache.prepare(&objects);

    objects.push(DrawableObject::new(
        Arc::new(primitives::cube()),
        InstanceData::new(Vec3::ZERO, Vec3::ONE),
    ));

    match cache.prepare(&objects) {
        BatchUpdate::Rebuild { batch, reason } => {
            assert_eq!(reason, RebuildReason::ObjectSetChanged);
            assert_eq!(batch.command_count(), 5);
        }
        BatchUpdate::Reuse => panic!("changed object set must not render stale"),
    }
}

#[test]
fn always_rebuild_mode_tracks_instance_changes_every_frame() {
    let mut objects = grid_objects(&grid(1, 1, 2));
    let mut cache = BatchCache::new(BatchMode::AlwaysRebuild);

    for frame in 0..3 {
        let color = Vec3::splat(frame as f32 / 3.0);
        objects[1].set_color(color);

        match cache.prepare(&objects) {
            BatchUpdate::Rebuild { batch, .. } => {
                assert_eq!(batch.instances[1].color, color.to_array());
            }
            BatchUpdate::Reuse => panic!("always-rebuild mode reused a batch"),
        }
    }
}

#[test]
fn reencoding_unchanged_objects_is_byte_identical() {
    let objects = grid_objects(&grid(3, 3, 3));
    let mut cache = BatchCache::new(BatchMode::AlwaysRebuild);

    let first = match cache.prepare(&objects) {
        BatchUpdate::Rebuild { batch, .. } => batch.clone(),
        BatchUpdate::Reuse => panic!("first frame must rebuild"),
    };
    let second = match cache.prepare(&objects) {
        BatchUpdate::Rebuild { batch, .. } => batch.clone(),
        BatchUpdate::Reuse => panic!("always-rebuild mode reused a batch"),
    };

    assert_eq!(
        bytemuck::cast_slice::<_, u8>(&first.vertices),
        bytemuck::cast_slice::<_, u8>(&second.vertices)
    );
    assert_eq!(first.instance_floats(), second.instance_floats());
    assert_eq!(first.commands, second.commands);
}
