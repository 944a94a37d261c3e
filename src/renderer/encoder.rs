// renderer/encoder.rs
use bytemuck::{Pod, Zeroable};
use std::ops::Range;

use crate::renderer::{InstanceRecord, Vertex};
use crate::scene::DrawableObject;

/// Arguments of one non-indexed indirect sub-draw.
///
/// Field order matches what `wgpu::RenderPass::multi_draw_indirect` reads, so a
/// `&[DrawCommand]` can be uploaded verbatim.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct DrawCommand {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    /// Base instance; equals the object's slot in the instance buffer.
    pub first_instance: u32,
}

const _: () = assert!(std::mem::size_of::<DrawCommand>() == 16);

impl DrawCommand {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub const fn new(vertex_count: u32, first_vertex: u32, first_instance: u32) -> Self {
        Self {
            vertex_count,
            instance_count: 1,
            first_vertex,
            first_instance,
        }
    }

    pub fn vertex_range(&self) -> Range<usize> {
        let start = self.first_vertex as usize;
        start..start + self.vertex_count as usize
    }
}

/// Host-side aggregation of a frame's drawables, ready for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedBatch {
    pub vertices: Vec<Vertex>,
    pub instances: Vec<InstanceRecord>,
    pub commands: Vec<DrawCommand>,
}

impl EncodedBatch {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn command_count(&self) -> u32 {
        self.commands.len() as u32
    }

    pub fn total_vertices(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// The vertex buffer as the flat float array the GPU sees.
    pub fn vertex_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn instance_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.instances)
    }

    /// Vertices selected by command `index`, read back through its offsets.
    pub fn vertex_slice(&self, index: usize) -> Option<&[Vertex]> {
        let command = self.commands.get(index)?;
        self.vertices.get(command.vertex_range())
    }

    fn clear(&mut self) {
        self.vertices.clear();
        self.instances.clear();
        self.commands.clear();
    }
}

/// Builds the vertex, instance and indirect-command buffers in one pass.
///
/// Command `i`, instance slot `i` and input object `i` always refer to the
/// same object; nothing here reorders.
#[derive(Debug, Default)]
pub struct DrawCommandEncoder {
    scratch: EncodedBatch,
}

impl DrawCommandEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode(&mut self, objects: &[DrawableObject]) -> &EncodedBatch {
        self.scratch.clear();
        encode_into(&mut self.scratch, objects);
        &self.scratch
    }

    /// Result of the most recent `encode`.
    pub fn last(&self) -> &EncodedBatch {
        &self.scratch
    }
}

pub fn encode(objects: &[DrawableObject]) -> EncodedBatch {
    let mut batch = EncodedBatch::default();
    encode_into(&mut batch, objects);
    batch
}

/// Indirect draw arguments are `u32`: both the running vertex offset and the
/// instance slot must stay representable.
fn fits_draw_arguments(total_vertices: usize, object_count: usize) -> bool {
    u32::try_from(total_vertices).is_ok() && u32::try_from(object_count).is_ok()
}

fn encode_into(batch: &mut EncodedBatch, objects: &[DrawableObject]) {
    let total_vertices: usize = objects.iter().map(|o| o.vertex_count() as usize).sum();
    debug_assert!(
        fits_draw_arguments(total_vertices, objects.len()),
        "batch of {} objects / {} vertices exceeds u32 draw arguments",
        objects.len(),
        total_vertices
    );
    batch.vertices.reserve(total_vertices);
    batch.instances.reserve(objects.len());
    batch.commands.reserve(objects.len());

    let mut first_vertex = 0u32;
    for (slot, object) in objects.iter().enumerate() {
        let vertex_count = object.vertex_count();
        let first_instance = u32::try_from(slot).unwrap_or(u32::MAX);
        batch
            .commands
            .push(DrawCommand::new(vertex_count, first_vertex, first_instance));
        batch
            .vertices
            .extend_from_slice(object.geometry().vertices());
        batch
            .instances
            .push(InstanceRecord::from_instance(&object.instance));
        first_vertex = first_vertex.saturating_add(vertex_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{primitives, Geometry, InstanceData};
    use glam::Vec3;
    use std::sync::Arc;

    fn object(geometry: &Arc<Geometry>, x: f32, color: Vec3) -> DrawableObject {
        DrawableObject::new(
            geometry.clone(),
            InstanceData::new(Vec3::new(x, 0.0, 0.0), color),
        )
    }

    fn triangle() -> Arc<Geometry> {
        let data = [
            -0.5, -0.5, 0.0, 0.0, 0.0, -1.0, //
            0.0, 0.5, 0.0, 0.0, 0.0, -1.0, //
            0.5, -0.5, 0.0, 0.0, 0.0, -1.0,
        ];
        Arc::new(Geometry::from_floats(&data).unwrap())
    }

    fn quad() -> Arc<Geometry> {
        let mut data = Vec::new();
        for i in 0..6 {
            data.extend_from_slice(&[i as f32, 1.0, 2.0, 0.0, 1.0, 0.0]);
        }
        Arc::new(Geometry::from_floats(&data).unwrap())
    }

    #[test]
    fn empty_list_yields_empty_buffers() {
        let batch = encode(&[]);

        assert!(batch.is_empty());
        assert!(batch.vertices.is_empty());
        assert!(batch.instances.is_empty());
        assert_eq!(batch.command_count(), 0);
    }

    #[test]
    fn triangle_and_quad_produce_expected_commands() {
        let objects = [
            object(&triangle(), 0.0, Vec3::X),
            object(&quad(), 1.0, Vec3::Y),
        ];

        let batch = encode(&objects);

        assert_eq!(
            batch.commands,
            vec![
                DrawCommand {
                    vertex_count: 3,
                    instance_count: 1,
                    first_vertex: 0,
                    first_instance: 0,
                },
                DrawCommand {
                    vertex_count: 6,
                    instance_count: 1,
                    first_vertex: 3,
                    first_instance: 1,
                },
            ]
        );
        assert_eq!(batch.vertex_floats().len(), 54);
        assert_eq!(batch.instance_floats().len(), 12);
    }

    #[test]
    fn offsets_are_prefix_sums_and_base_instance_is_slot() {
        let tri = triangle();
        let cube = Arc::new(primitives::cube());
        let empty = Arc::new(Geometry::new(Vec::new()));
        let geometries = [&tri, &cube, &empty, &tri, &cube];
        let objects: Vec<_> = geometries
            .iter()
            .enumerate()
            .map(|(i, g)| object(g, i as f32, Vec3::ONE))
            .collect();

        let batch = encode(&objects);

        assert_eq!(batch.command_count() as usize, objects.len());
        let mut expected_first = 0u32;
        for (i, (command, object)) in batch.commands.iter().zip(&objects).enumerate() {
            assert_eq!(command.first_vertex, expected_first);
            assert_eq!(command.first_instance, i as u32);
            assert_eq!(command.instance_count, 1);
            assert_eq!(command.vertex_count, object.vertex_count());
            expected_first += object.vertex_count();
        }
        assert_eq!(batch.total_vertices(), expected_first);
    }

    #[test]
    fn vertex_slices_read_back_original_geometry() {
        let objects = [
            object(&quad(), 0.0, Vec3::X),
            object(&triangle(), 1.0, Vec3::Y),
            object(&Arc::new(primitives::triangle_prism()), 2.0, Vec3::Z),
        ];

        let batch = encode(&objects);

        for (i, object) in objects.iter().enumerate() {
            assert_eq!(batch.vertex_slice(i), Some(object.geometry().vertices()));
        }
        assert_eq!(batch.vertex_slice(objects.len()), None);
    }

    #[test]
    fn instance_slot_matches_object_order() {
        let tri = triangle();
        let objects = [
            object(&tri, 3.0, Vec3::new(1.0, 0.0, 0.0)),
            object(&tri, 7.0, Vec3::new(0.0, 0.0, 1.0)),
        ];

        let batch = encode(&objects);

        for command in &batch.commands {
            let record = batch.instances[command.first_instance as usize];
            let source = &objects[command.first_instance as usize].instance;
            assert_eq!(record.position, source.position.to_array());
            assert_eq!(record.color, source.color.to_array());
        }
    }

    #[test]
    fn encoding_twice_is_bit_identical() {
        let objects = [
            object(&triangle(), 0.5, Vec3::splat(0.3)),
            object(&quad(), -2.0, Vec3::splat(1.0)),
        ];
        let mut encoder = DrawCommandEncoder::new();

        let first = encoder.encode(&objects).clone();
        let second = encoder.encode(&objects).clone();

        assert_eq!(
            bytemuck::cast_slice::<_, u8>(&first.vertices),
            bytemuck::cast_slice::<_, u8>(&second.vertices)
        );
        assert_eq!(
            bytemuck::cast_slice::<_, u8>(&first.instances),
            bytemuck::cast_slice::<_, u8>(&second.instances)
        );
        assert_eq!(first.commands, second.commands);
    }

    #[test]
    fn reused_encoder_drops_previous_contents() {
        let mut encoder = DrawCommandEncoder::new();
        encoder.encode(&[object(&quad(), 0.0, Vec3::ONE)]);

        let batch = encoder.encode(&[]);

        assert!(batch.is_empty());
        assert!(batch.vertices.is_empty());
    }

    #[test]
    fn command_bytes_are_tightly_packed_u32s() {
        let command = DrawCommand::new(36, 12, 4);
        let words: &[u32] = bytemuck::cast_slice(std::slice::from_ref(&command));
        assert_eq!(words, &[36, 1, 12, 4]);
        assert_eq!(DrawCommand::SIZE, 16);
    }

    #[test]
    fn draw_argument_range_ends_at_u32_max() {
        let max = u32::MAX as usize;
        assert!(fits_draw_arguments(max, max));
        assert!(fits_draw_arguments(0, 0));
        if usize::BITS > 32 {
            assert!(!fits_draw_arguments(max + 1, 1));
            assert!(!fits_draw_arguments(1, max + 1));
        }
    }
}
