use ash::vk;
use std::ptr;

/// Derive the aspect mask a layout transition should target from the
/// destination layout and the image format.
///
/// A depth-stencil destination selects the depth plane, plus the stencil plane
/// for the two combined depth/stencil formats. Every other destination layout
/// selects the color plane.
pub fn aspect_mask_for(dst_layout: vk::ImageLayout, format: vk::Format) -> vk::ImageAspectFlags {
    if dst_layout == vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL {
        let mut aspect_mask = vk::ImageAspectFlags::DEPTH;
        if format == vk::Format::D32_SFLOAT_S8_UINT || format == vk::Format::D24_UNORM_S8_UINT {
            aspect_mask |= vk::ImageAspectFlags::STENCIL;
        }
        aspect_mask
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

/// Record an image layout transition into `cmd`.
///
/// The barrier covers mip 0 and `layer_count` array layers and never transfers
/// queue family ownership. Nothing is submitted; the caller owns the recording.
#[allow(clippy::too_many_arguments)]
pub fn cmd_transition_image(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    image: vk::Image,
    aspect_mask: vk::ImageAspectFlags,
    src_layout: vk::ImageLayout,
    src_stages: vk::PipelineStageFlags2,
    src_accesses: vk::AccessFlags2,
    dst_layout: vk::ImageLayout,
    dst_stages: vk::PipelineStageFlags2,
    dst_accesses: vk::AccessFlags2,
    layer_count: u32,
) {
    let image_barrier = vk::ImageMemoryBarrier2 {
        s_type: vk::StructureType::IMAGE_MEMORY_BARRIER_2,
        p_next: ptr::null(),
        src_stage_mask: src_stages,
        src_access_mask: src_accesses,
        dst_stage_mask: dst_stages,
        dst_access_mask: dst_accesses,
        old_layout: src_layout,
        new_layout: dst_layout,
        src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
        dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
        image,
        subresource_range: vk::ImageSubresourceRange {
            aspect_mask,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count,
        },
        _marker: Default::default(),
    };
    let dependency_info = vk::DependencyInfo {
        s_type: vk::StructureType::DEPENDENCY_INFO,
        p_next: ptr::null(),
        dependency_flags: vk::DependencyFlags::empty(),
        memory_barrier_count: 0,
        p_memory_barriers: ptr::null(),
        buffer_memory_barrier_count: 0,
        p_buffer_memory_barriers: ptr::null(),
        image_memory_barrier_count: 1,
        p_image_memory_barriers: &image_barrier,
        _marker: Default::default(),
    };
    unsafe {
        device.cmd_pipeline_barrier2(cmd, &dependency_info);
    }
}

/// Record a memory barrier over `size` bytes of `buffer` into `cmd`.
///
/// Buffer barriers can target subranges, but the demo always depends on the
/// whole buffer.
#[allow(clippy::too_many_arguments)]
pub fn cmd_buffer_memory_barrier(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    buffer: vk::Buffer,
    size: vk::DeviceSize,
    src_stages: vk::PipelineStageFlags2,
    src_accesses: vk::AccessFlags2,
    dst_stages: vk::PipelineStageFlags2,
    dst_accesses: vk::AccessFlags2,
) {
    let buffer_barrier = vk::BufferMemoryBarrier2 {
        s_type: vk::StructureType::BUFFER_MEMORY_BARRIER_2,
        p_next: ptr::null(),
        src_stage_mask: src_stages,
        src_access_mask: src_accesses,
        dst_stage_mask: dst_stages,
        dst_access_mask: dst_accesses,
        src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
        dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
        buffer,
        offset: 0,
        size,
        _marker: Default::default(),
    };
    let dependency_info = vk::DependencyInfo {
        s_type: vk::StructureType::DEPENDENCY_INFO,
        p_next: ptr::null(),
        dependency_flags: vk::DependencyFlags::empty(),
        memory_barrier_count: 0,
        p_memory_barriers: ptr::null(),
        buffer_memory_barrier_count: 1,
        p_buffer_memory_barriers: &buffer_barrier,
        image_memory_barrier_count: 0,
        p_image_memory_barriers: ptr::null(),
        _marker: Default::default(),
    };
    unsafe {
        device.cmd_pipeline_barrier2(cmd, &dependency_info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_only_formats_get_depth_aspect() {
        for format in [
            vk::Format::D32_SFLOAT,
            vk::Format::D16_UNORM,
            vk::Format::X8_D24_UNORM_PACK32,
        ] {
            assert_eq!(
                aspect_mask_for(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL, format),
                vk::ImageAspectFlags::DEPTH,
            );
        }
    }

    #[test]
    fn combined_formats_get_depth_and_stencil_aspects() {
        for format in [vk::Format::D32_SFLOAT_S8_UINT, vk::Format::D24_UNORM_S8_UINT] {
            assert_eq!(
                aspect_mask_for(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL, format),
                vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
            );
        }
    }

    #[test]
    fn non_depth_stencil_layouts_get_color_aspect() {
        // The rule keys off the destination layout, so even a depth format
        // headed anywhere else selects the color plane.
        for layout in [
            vk::ImageLayout::GENERAL,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        ] {
            assert_eq!(
                aspect_mask_for(layout, vk::Format::R8G8B8A8_UNORM),
                vk::ImageAspectFlags::COLOR,
            );
            assert_eq!(
                aspect_mask_for(layout, vk::Format::D32_SFLOAT),
                vk::ImageAspectFlags::COLOR,
            );
        }
    }
}
