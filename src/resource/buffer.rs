use anyhow::Result;
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use std::ptr;
#[cfg(feature = "log-lifetimes")]
use tracing::trace;

use crate::resource::traits::name_object;
use crate::sync;

/// A device-local buffer together with a view over the whole buffer.
///
/// The view only exists when the buffer was created with a texel-buffer usage
/// flag. Lifecycle is explicit: [`BufferAndView::create`] and
/// [`BufferAndView::destroy`] must pair up, and the device and allocator must
/// outlive the wrapper.
#[derive(Debug, Default)]
pub struct BufferAndView {
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    view: vk::BufferView,
    size: vk::DeviceSize,
}

/// Texel-buffer usages are the only ones that require a VkBufferView.
fn wants_texel_view(usage: vk::BufferUsageFlags) -> bool {
    usage.intersects(
        vk::BufferUsageFlags::STORAGE_TEXEL_BUFFER | vk::BufferUsageFlags::UNIFORM_TEXEL_BUFFER,
    )
}

impl BufferAndView {
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    pub fn view(&self) -> vk::BufferView {
        self.view
    }

    /// Size of the buffer in bytes.
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// Create a buffer and, for texel usages, a view with the given format.
    /// Memory is always device local and exclusively owned by one queue
    /// family.
    pub fn create(
        &mut self,
        device: &ash::Device,
        allocator: &mut Allocator,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        view_format: vk::Format,
    ) -> Result<()> {
        debug_assert!(
            self.buffer == vk::Buffer::null(),
            "destroy the buffer before recreating it"
        );

        let buffer = unsafe {
            device.create_buffer(
                &vk::BufferCreateInfo {
                    s_type: vk::StructureType::BUFFER_CREATE_INFO,
                    p_next: ptr::null(),
                    flags: vk::BufferCreateFlags::empty(),
                    size,
                    usage,
                    sharing_mode: vk::SharingMode::EXCLUSIVE,
                    queue_family_index_count: 0,
                    p_queue_family_indices: ptr::null(),
                    _marker: Default::default(),
                },
                None,
            )?
        };

        #[cfg(feature = "log-lifetimes")]
        trace!("Created VkBuffer {:?}", buffer);

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let allocation = allocator.allocate(&AllocationCreateDesc {
            name: "buffer",
            requirements,
            location: MemoryLocation::GpuOnly,
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;
        unsafe { device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset())? };

        if wants_texel_view(usage) {
            self.view = unsafe {
                device.create_buffer_view(
                    &vk::BufferViewCreateInfo {
                        s_type: vk::StructureType::BUFFER_VIEW_CREATE_INFO,
                        p_next: ptr::null(),
                        flags: vk::BufferViewCreateFlags::empty(),
                        buffer,
                        format: view_format,
                        offset: 0,
                        range: size,
                        _marker: Default::default(),
                    },
                    None,
                )?
            };
        }

        self.buffer = buffer;
        self.allocation = Some(allocation);
        self.size = size;
        Ok(())
    }

    /// Destroy the buffer, its view, and its memory. The wrapper may be
    /// recreated afterwards.
    pub fn destroy(&mut self, device: &ash::Device, allocator: &mut Allocator) -> Result<()> {
        if self.view != vk::BufferView::null() {
            unsafe { device.destroy_buffer_view(self.view, None) };
            self.view = vk::BufferView::null();
        }

        if self.buffer != vk::Buffer::null() {
            #[cfg(feature = "log-lifetimes")]
            trace!("Destroying VkBuffer {:?}", self.buffer);

            unsafe { device.destroy_buffer(self.buffer, None) };
            self.buffer = vk::Buffer::null();
            if let Some(allocation) = self.allocation.take() {
                allocator.free(allocation)?;
            }
        }

        self.size = 0;
        Ok(())
    }

    /// Record a barrier ordering prior accesses to the whole buffer before
    /// subsequent ones. Only appends to `cmd`; submission stays with the
    /// caller.
    pub fn memory_barrier(
        &self,
        device: &ash::Device,
        cmd: vk::CommandBuffer,
        src_stages: vk::PipelineStageFlags2,
        src_accesses: vk::AccessFlags2,
        dst_stages: vk::PipelineStageFlags2,
        dst_accesses: vk::AccessFlags2,
    ) {
        sync::cmd_buffer_memory_barrier(
            device,
            cmd,
            self.buffer,
            self.size,
            src_stages,
            src_accesses,
            dst_stages,
            dst_accesses,
        );
    }

    pub fn set_name(
        &self,
        debug_utils: &ash::ext::debug_utils::Device,
        name: &str,
    ) -> Result<()> {
        name_object(debug_utils, self.buffer, name)?;
        if self.view != vk::BufferView::null() {
            name_object(debug_utils, self.view, name)?;
        }
        Ok(())
    }
}

impl Drop for BufferAndView {
    fn drop(&mut self) {
        debug_assert!(
            self.buffer == vk::Buffer::null(),
            "BufferAndView dropped without destroy"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texel_usages_request_a_view() {
        assert!(wants_texel_view(vk::BufferUsageFlags::STORAGE_TEXEL_BUFFER));
        assert!(wants_texel_view(vk::BufferUsageFlags::UNIFORM_TEXEL_BUFFER));
        assert!(wants_texel_view(
            vk::BufferUsageFlags::STORAGE_BUFFER | vk::BufferUsageFlags::UNIFORM_TEXEL_BUFFER
        ));
    }

    #[test]
    fn plain_usages_do_not_request_a_view() {
        assert!(!wants_texel_view(vk::BufferUsageFlags::STORAGE_BUFFER));
        assert!(!wants_texel_view(
            vk::BufferUsageFlags::VERTEX_BUFFER
                | vk::BufferUsageFlags::INDEX_BUFFER
                | vk::BufferUsageFlags::TRANSFER_DST
        ));
        assert!(!wants_texel_view(vk::BufferUsageFlags::empty()));
    }

    #[test]
    fn default_wrapper_is_empty() {
        let buffer = BufferAndView::default();
        assert_eq!(buffer.handle(), vk::Buffer::null());
        assert_eq!(buffer.view(), vk::BufferView::null());
        assert_eq!(buffer.size(), 0);
    }
}
