//! GPU upload of generated meshes.
//!
//! A [`GpuMesh`] keeps one vertex buffer per attribute the [`Mesh`] carries
//! plus the `u16` index buffer, keyed by [`BufferSlot`]. At draw time the
//! caller names the slots in shader location order, so slot `i` of the list
//! feeds `@location(i)`. Naming a slot the mesh lacks is a [`MissingBuffer`]
//! error.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::gpu::GpuContext;
use crate::mesh::Mesh;

/// The buffers a mesh can own on the GPU.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferSlot {
    Positions,
    Normals,
    TexCoords,
    Colors,
    Indices,
}

impl BufferSlot {
    pub const VERTEX_SLOTS: [BufferSlot; 4] = [
        BufferSlot::Positions,
        BufferSlot::Normals,
        BufferSlot::TexCoords,
        BufferSlot::Colors,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Positions => "Mesh Positions",
            Self::Normals => "Mesh Normals",
            Self::TexCoords => "Mesh TexCoords",
            Self::Colors => "Mesh Colors",
            Self::Indices => "Mesh Indices",
        }
    }

    fn usage(self) -> wgpu::BufferUsages {
        match self {
            Self::Indices => wgpu::BufferUsages::INDEX,
            _ => wgpu::BufferUsages::VERTEX,
        }
    }
}

/// A vertex input asked for a buffer the mesh does not carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("mesh has no {slot:?} buffer for vertex input {input}")]
pub struct MissingBuffer {
    pub slot: BufferSlot,
    pub input: u32,
}

/// First slot in `slots` that `has` rejects, tagged with its input index.
fn check_slots(slots: &[BufferSlot], has: impl Fn(BufferSlot) -> bool) -> Result<(), MissingBuffer> {
    match slots.iter().position(|&slot| !has(slot)) {
        Some(input) => Err(MissingBuffer {
            slot: slots[input],
            input: input as u32,
        }),
        None => Ok(()),
    }
}

/// A mesh uploaded to GPU memory.
#[derive(Debug)]
pub struct GpuMesh {
    buffers: HashMap<BufferSlot, wgpu::Buffer>,
    vertex_count: u32,
    index_count: u32,
}

impl GpuMesh {
    /// Uploads every array the mesh carries.
    pub fn upload(gpu: &GpuContext, mesh: &Mesh) -> Self {
        let arrays: [(BufferSlot, Option<&[u8]>); 5] = [
            (BufferSlot::Positions, mesh.positions_flat().map(bytemuck::cast_slice)),
            (BufferSlot::Normals, mesh.normals_flat().map(bytemuck::cast_slice)),
            (BufferSlot::TexCoords, mesh.tex_coords_flat().map(bytemuck::cast_slice)),
            (BufferSlot::Colors, mesh.colors_flat().map(bytemuck::cast_slice)),
            (BufferSlot::Indices, mesh.indices().map(bytemuck::cast_slice)),
        ];

        let buffers = arrays
            .into_iter()
            .filter_map(|(slot, bytes)| Some((slot, bytes?)))
            .map(|(slot, bytes)| {
                let buffer = gpu
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(slot.label()),
                        contents: bytes,
                        usage: slot.usage(),
                    });
                (slot, buffer)
            })
            .collect();

        Self {
            buffers,
            vertex_count: mesh.vertex_count(),
            index_count: mesh.index_count(),
        }
    }

    pub fn buffer(&self, slot: BufferSlot) -> Option<&wgpu::Buffer> {
        self.buffers.get(&slot)
    }

    pub fn has(&self, slot: BufferSlot) -> bool {
        self.buffers.contains_key(&slot)
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Checks that every slot in `slots` has a buffer.
    pub fn check_slots(&self, slots: &[BufferSlot]) -> Result<(), MissingBuffer> {
        check_slots(slots, |slot| self.has(slot))
    }

    /// Binds the vertex buffers named in `slots` to consecutive vertex buffer
    /// indices and draws.
    ///
    /// Uses the index buffer when the mesh has one, otherwise draws the
    /// vertices in order. A slot the mesh lacks fails the call before anything
    /// is recorded, so the pass never reaches wgpu's validation with an
    /// unbound vertex buffer.
    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        slots: &[BufferSlot],
    ) -> Result<(), MissingBuffer> {
        self.check_slots(slots)?;
        for (index, slot) in slots.iter().enumerate() {
            if let Some(buffer) = self.buffers.get(slot) {
                render_pass.set_vertex_buffer(index as u32, buffer.slice(..));
            }
        }

        match self.buffers.get(&BufferSlot::Indices) {
            Some(indices) => {
                render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..self.index_count, 0, 0..1);
            }
            None => render_pass.draw(0..self.vertex_count, 0..1),
        }
        Ok(())
    }
}
