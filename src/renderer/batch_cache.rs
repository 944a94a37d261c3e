// renderer/batch_cache.rs
use serde::{Deserialize, Serialize};

use crate::renderer::{DrawCommandEncoder, EncodedBatch};
use crate::scene::DrawableObject;

/// How the aggregated buffers are kept in sync with the submitted objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// Encode and upload once, then reuse the GPU buffers. Instance data
    /// changed after the first frame is not picked up until `mark_dirty`.
    #[default]
    StaticCached,
    /// Encode and upload on every frame.
    AlwaysRebuild,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Uninitialized,
    Valid,
}

/// Shape of an object set: everything the command offsets depend on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSignature {
    vertex_counts: Vec<u32>,
}

impl BatchSignature {
    pub fn of(objects: &[DrawableObject]) -> Self {
        Self {
            vertex_counts: objects.iter().map(DrawableObject::vertex_count).collect(),
        }
    }

    fn matches(&self, objects: &[DrawableObject]) -> bool {
        self.vertex_counts.len() == objects.len()
            && self
                .vertex_counts
                .iter()
                .zip(objects)
                .all(|(&count, object)| count == object.vertex_count())
    }

    pub fn object_count(&self) -> usize {
        self.vertex_counts.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    FirstFrame,
    AlwaysRebuild,
    MarkedDirty,
    ObjectSetChanged,
}

#[derive(Debug)]
pub enum BatchUpdate<'a> {
    /// GPU buffers from the previous upload are still correct for this frame.
    Reuse,
    /// The batch was re-encoded and must be uploaded before drawing.
    Rebuild {
        batch: &'a EncodedBatch,
        reason: RebuildReason,
    },
}

impl BatchUpdate<'_> {
    pub fn is_rebuild(&self) -> bool {
        matches!(self, BatchUpdate::Rebuild { .. })
    }
}

/// Decides per frame whether the encoded batch can be reused.
pub struct BatchCache {
    mode: BatchMode,
    state: CacheState,
    dirty: bool,
    signature: BatchSignature,
    encoder: DrawCommandEncoder,
}

impl BatchCache {
    pub fn new(mode: BatchMode) -> Self {
        Self {
            mode,
            state: CacheState::Uninitialized,
            dirty: false,
            signature: BatchSignature::default(),
            encoder: DrawCommandEncoder::new(),
        }
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    pub fn is_valid(&self) -> bool {
        self.state == CacheState::Valid
    }

    /// Forces the next `prepare` to re-encode, e.g. after moving objects.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Reports that the batch returned by the last `prepare` never reached the
    /// GPU. The next `prepare` re-encodes even when the object set is unchanged.
    pub fn upload_failed(&mut self) {
        log::warn!("Batch upload failed; the next frame re-encodes");
        self.dirty = true;
    }

    /// The batch most recently handed out for upload.
    pub fn batch(&self) -> Option<&EncodedBatch> {
        self.is_valid().then(|| self.encoder.last())
    }

    pub fn prepare(&mut self, objects: &[DrawableObject]) -> BatchUpdate<'_> {
        let Some(reason) = self.rebuild_reason(objects) else {
            log::trace!("Reusing cached batch ({} objects)", objects.len());
            return BatchUpdate::Reuse;
        };

        match reason {
            RebuildReason::FirstFrame => log::info!(
                "Encoding initial batch: {} objects, mode {:?}",
                objects.len(),
                self.mode
            ),
            RebuildReason::ObjectSetChanged => log::warn!(
                "Object set changed while the static batch was valid ({} -> {} objects); re-encoding",
                self.signature.object_count(),
                objects.len()
            ),
            RebuildReason::MarkedDirty => {
                log::debug!("Batch marked dirty; re-encoding {} objects", objects.len())
            }
            RebuildReason::AlwaysRebuild => {}
        }

        if self.mode == BatchMode::StaticCached {
            self.signature = BatchSignature::of(objects);
        }
        self.state = CacheState::Valid;
        self.dirty = false;

        let batch = self.encoder.encode(objects);
        BatchUpdate::Rebuild { batch, reason }
    }

    fn rebuild_reason(&self, objects: &[DrawableObject]) -> Option<RebuildReason> {
        if self.state == CacheState::Uninitialized {
            return Some(RebuildReason::FirstFrame);
        }
        if self.mode == BatchMode::AlwaysRebuild {
            return Some(RebuildReason::AlwaysRebuild);
        }
        if self.dirty {
            return Some(RebuildReason::MarkedDirty);
        }
        if !self.signature.matches(objects) {
            return Some(RebuildReason::ObjectSetChanged);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{primitives, Geometry, InstanceData};
    use glam::Vec3;
    use std::sync::Arc;

    fn scene() -> Vec<DrawableObject> {
        let prism = Arc::new(primitives::triangle_prism());
        let cube = Arc::new(primitives::cube());
        vec![
            DrawableObject::new(prism, InstanceData::new(Vec3::ZERO, Vec3::X)),
            DrawableObject::new(cube, InstanceData::new(Vec3::ONE, Vec3::Y)),
        ]
    }

    #[test]
    fn first_prepare_rebuilds_and_validates() {
        let mut cache = BatchCache::new(BatchMode::StaticCached);
        assert_eq!(cache.state(), CacheState::Uninitialized);
        assert!(cache.batch().is_none());

        let update = cache.prepare(&scene());

        assert!(matches!(
            update,
            BatchUpdate::Rebuild {
                reason: RebuildReason::FirstFrame,
                ..
            }
        ));
        assert_eq!(cache.state(), CacheState::Valid);
        assert_eq!(cache.batch().map(EncodedBatch::command_count), Some(2));
    }

    #[test]
    fn static_mode_reuses_on_unchanged_object_set() {
        let objects = scene();
        let mut cache = BatchCache::new(BatchMode::StaticCached);
        cache.prepare(&objects);

        for _ in 0..3 {
            assert!(matches!(cache.prepare(&objects), BatchUpdate::Reuse));
        }
    }

    #[test]
    fn static_mode_keeps_pre_mutation_instance_data() {
        let mut objects = scene();
        let mut cache = BatchCache::new(BatchMode::StaticCached);
        cache.prepare(&objects);

        objects[0].set_color(Vec3::new(0.25, 0.5, 0.75));
        let update = cache.prepare(&objects);

        assert!(!update.is_rebuild());
        let cached = cache.batch().unwrap();
        assert_eq!(cached.instances[0].color, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn mark_dirty_picks_up_instance_changes() {
        let mut objects = scene();
        let mut cache = BatchCache::new(BatchMode::StaticCached);
        cache.prepare(&objects);

        objects[1].set_position(Vec3::new(5.0, 6.0, 7.0));
        cache.mark_dirty();

        match cache.prepare(&objects) {
            BatchUpdate::Rebuild { batch, reason } => {
                assert_eq!(reason, RebuildReason::MarkedDirty);
                assert_eq!(batch.instances[1].position, [5.0, 6.0, 7.0]);
            }
            BatchUpdate::Reuse => panic!("dirty cache must rebuild"),
        }
        assert!(matches!(cache.prepare(&objects), BatchUpdate::Reuse));
    }

    #[test]
    fn failed_upload_is_re_encoded_next_frame() {
        let objects = scene();
        let mut cache = BatchCache::new(BatchMode::StaticCached);

        assert!(cache.prepare(&objects).is_rebuild());
        cache.upload_failed();

        // Unchanged objects still rebuild: the GPU never received the batch.
        match cache.prepare(&objects) {
            BatchUpdate::Rebuild { batch, reason } => {
                assert_eq!(reason, RebuildReason::MarkedDirty);
                assert_eq!(batch.command_count(), 2);
                assert_eq!(batch.commands[1].first_vertex, 24);
            }
            BatchUpdate::Reuse => panic!("failed upload must not be reused"),
        }
        assert!(matches!(cache.prepare(&objects), BatchUpdate::Reuse));
    }

    #[test]
    fn failed_first_upload_still_rebuilds_empty_scene() {
        let mut cache = BatchCache::new(BatchMode::StaticCached);
        cache.prepare(&[]);
        cache.upload_failed();

        assert!(cache.prepare(&[]).is_rebuild());
    }

    #[test]
    fn changed_object_count_forces_rebuild() {
        let mut objects = scene();
        let mut cache = BatchCache::new(BatchMode::StaticCached);
        cache.prepare(&objects);

        objects.pop();

        match cache.prepare(&objects) {
            BatchUpdate::Rebuild { batch, reason } => {
                assert_eq!(reason, RebuildReason::ObjectSetChanged);
                assert_eq!(batch.command_count(), 1);
            }
            BatchUpdate::Reuse => panic!("stale offsets must not be reused"),
        }
    }

    #[test]
    fn changed_vertex_count_forces_rebuild() {
        let mut objects = scene();
        let mut cache = BatchCache::new(BatchMode::StaticCached);
        cache.prepare(&objects);

        let instance = objects[0].instance;
        objects[0] = DrawableObject::new(Arc::new(Geometry::new(Vec::new())), instance);

        let update = cache.prepare(&objects);
        assert!(matches!(
            update,
            BatchUpdate::Rebuild {
                reason: RebuildReason::ObjectSetChanged,
                ..
            }
        ));
    }

    #[test]
    fn always_rebuild_mode_encodes_every_frame() {
        let mut objects = scene();
        let mut cache = BatchCache::new(BatchMode::AlwaysRebuild);
        cache.prepare(&objects);

        objects[0].set_color(Vec3::Z);

        match cache.prepare(&objects) {
            BatchUpdate::Rebuild { batch, reason } => {
                assert_eq!(reason, RebuildReason::AlwaysRebuild);
                assert_eq!(batch.instances[0].color, [0.0, 0.0, 1.0]);
            }
            BatchUpdate::Reuse => panic!("always-rebuild mode never reuses"),
        }
    }

    #[test]
    fn always_rebuild_output_is_stable_for_unchanged_input() {
        let objects = scene();
        let mut cache = BatchCache::new(BatchMode::AlwaysRebuild);

        let first = match cache.prepare(&objects) {
            BatchUpdate::Rebuild { batch, .. } => batch.clone(),
            BatchUpdate::Reuse => unreachable!(),
        };
        let second = match cache.prepare(&objects) {
            BatchUpdate::Rebuild { batch, .. } => batch.clone(),
            BatchUpdate::Reuse => unreachable!(),
        };

        assert_eq!(first, second);
    }

    #[test]
    fn empty_object_set_is_valid_and_reused() {
        let mut cache = BatchCache::new(BatchMode::StaticCached);

        match cache.prepare(&[]) {
            BatchUpdate::Rebuild { batch, .. } => assert!(batch.is_empty()),
            BatchUpdate::Reuse => panic!("first frame always rebuilds"),
        }
        assert!(matches!(cache.prepare(&[]), BatchUpdate::Reuse));
    }

    #[test]
    fn batch_mode_parses_from_snake_case() {
        let mode: BatchMode = serde_json::from_str("\"always_rebuild\"").unwrap();
        assert_eq!(mode, BatchMode::AlwaysRebuild);
    }
}
