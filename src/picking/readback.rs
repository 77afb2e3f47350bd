//! wgpu staging buffer backing the pick readback.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use super::transfer::{ReadbackSlot, SlotRead};
use super::PickId;

/// Staging buffer size. Texel copies are laid out with 256-byte row
/// alignment, so the single 2-byte texel still occupies a full row.
const STAGING_SIZE: u64 = 256;
/// Bytes of one `R16Uint` texel.
const TEXEL_BYTES: u64 = 2;
/// Mapped range. wgpu only maps multiples of `COPY_BUFFER_ALIGNMENT`, so
/// the texel is read out of a 4-byte window.
const MAP_BYTES: u64 = wgpu::COPY_BUFFER_ALIGNMENT;
const _: () = assert!(MAP_BYTES >= TEXEL_BYTES && MAP_BYTES <= STAGING_SIZE);

const MAP_IDLE: u8 = 0;
const MAP_WAITING: u8 = 1;
const MAP_DONE: u8 = 2;
const MAP_FAILED: u8 = 3;

/// The `R16Uint` value at the start of a mapped range. Ranges shorter than
/// a texel decode as the empty-pixel sentinel.
fn decode_texel(mapped: &[u8]) -> u16 {
    match mapped {
        [lo, hi, ..] => u16::from_le_bytes([*lo, *hi]),
        _ => PickId::NONE_RAW,
    }
}

/// Single-texel GPU→CPU staging buffer.
///
/// The `map_async` callback only flips an atomic status; the buffer is read
/// and unmapped on the render thread in [`ReadbackSlot::try_read`].
pub struct GpuReadback {
    device: wgpu::Device,
    buffer: wgpu::Buffer,
    /// Written by the map callback.
    map_status: Arc<AtomicU8>,
}

impl GpuReadback {
    /// Allocate the staging buffer.
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pick Staging Buffer"),
            size: STAGING_SIZE,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self {
            device: device.clone(),
            buffer,
            map_status: Arc::new(AtomicU8::new(MAP_IDLE)),
        }
    }

    /// Record the copy of texel `(0, 0)` of `texture` into the staging
    /// buffer.
    pub fn record_copy(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        texture: &wgpu::Texture,
    ) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(STAGING_SIZE as u32),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
    }
}

impl ReadbackSlot for GpuReadback {
    fn begin_read(&mut self) {
        self.map_status.store(MAP_WAITING, Ordering::SeqCst);
        let map_status = Arc::clone(&self.map_status);
        self.buffer.slice(..MAP_BYTES).map_async(
            wgpu::MapMode::Read,
            move |result| {
                let status = if result.is_ok() { MAP_DONE } else { MAP_FAILED };
                map_status.store(status, Ordering::SeqCst);
            },
        );
    }

    fn try_read(&mut self) -> SlotRead {
        // Poll without waiting - process callbacks
        if let Err(e) = self.device.poll(wgpu::PollType::Poll) {
            log::warn!("pick readback poll failed: {e}");
        }

        match self.map_status.load(Ordering::SeqCst) {
            MAP_DONE => {
                let raw = decode_texel(
                    &self.buffer.slice(..MAP_BYTES).get_mapped_range(),
                );
                self.buffer.unmap();
                self.map_status.store(MAP_IDLE, Ordering::SeqCst);
                SlotRead::Ready(raw)
            }
            MAP_FAILED => {
                self.map_status.store(MAP_IDLE, Ordering::SeqCst);
                SlotRead::Failed
            }
            _ => SlotRead::NotReady,
        }
    }
}
