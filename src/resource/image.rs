use anyhow::Result;
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use std::ptr;
#[cfg(feature = "log-lifetimes")]
use tracing::trace;

use crate::resource::traits::name_object;
use crate::sync;

/// Allocate a simple device-local image: 1 mip, optimal tiling, undefined
/// initial layout, sampled usage (plus whatever else the caller asks for), and
/// exclusive queue family ownership.
#[allow(clippy::too_many_arguments)]
pub fn create_image_simple(
    device: &ash::Device,
    allocator: &mut Allocator,
    image_type: vk::ImageType,
    format: vk::Format,
    width: u32,
    height: u32,
    array_layers: u32,
    additional_usage: vk::ImageUsageFlags,
    samples: vk::SampleCountFlags,
) -> Result<(vk::Image, Allocation)> {
    let image = unsafe {
        device.create_image(
            &vk::ImageCreateInfo {
                s_type: vk::StructureType::IMAGE_CREATE_INFO,
                p_next: ptr::null(),
                flags: vk::ImageCreateFlags::empty(),
                image_type,
                format,
                extent: vk::Extent3D {
                    width,
                    height,
                    depth: 1,
                },
                mip_levels: 1,
                array_layers,
                samples,
                tiling: vk::ImageTiling::OPTIMAL,
                usage: vk::ImageUsageFlags::SAMPLED | additional_usage,
                sharing_mode: vk::SharingMode::EXCLUSIVE,
                queue_family_index_count: 0,
                p_queue_family_indices: ptr::null(),
                initial_layout: vk::ImageLayout::UNDEFINED,
                _marker: Default::default(),
            },
            None,
        )?
    };

    #[cfg(feature = "log-lifetimes")]
    trace!("Created VkImage {:?}", image);

    let requirements = unsafe { device.get_image_memory_requirements(image) };
    let allocation = allocator.allocate(&AllocationCreateDesc {
        name: "image",
        requirements,
        location: MemoryLocation::GpuOnly,
        linear: false,
        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
    })?;
    unsafe { device.bind_image_memory(image, allocation.memory(), allocation.offset())? };

    Ok((image, allocation))
}

/// An image together with a view over the whole image and the tracking needed
/// to compute layout transitions.
///
/// The tracked layout/stage/access triple must mirror the image's true state
/// on the device; transitioning the image outside [`ImageAndView::transition_to`]
/// or [`ImageAndView::assume_layout`] invalidates it.
#[derive(Debug)]
pub struct ImageAndView {
    image: vk::Image,
    allocation: Option<Allocation>,
    view: vk::ImageView,

    // Fixed at creation time.
    width: u32,
    height: u32,
    layers: u32,
    format: vk::Format,

    // Current synchronization state.
    layout: vk::ImageLayout,
    stages: vk::PipelineStageFlags2,
    accesses: vk::AccessFlags2,
}

impl Default for ImageAndView {
    fn default() -> Self {
        Self {
            image: vk::Image::null(),
            allocation: None,
            view: vk::ImageView::null(),
            width: 0,
            height: 0,
            layers: 0,
            format: vk::Format::UNDEFINED,
            layout: vk::ImageLayout::UNDEFINED,
            stages: vk::PipelineStageFlags2::TOP_OF_PIPE,
            accesses: vk::AccessFlags2::empty(),
        }
    }
}

impl ImageAndView {
    pub fn handle(&self) -> vk::Image {
        self.image
    }

    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// The layout the image currently holds on the device.
    pub fn layout(&self) -> vk::ImageLayout {
        self.layout
    }

    /// The stages the image may currently be bound to.
    pub fn stages(&self) -> vk::PipelineStageFlags2 {
        self.stages
    }

    /// The ways the image's memory may currently be accessed.
    pub fn accesses(&self) -> vk::AccessFlags2 {
        self.accesses
    }

    /// Create the image via [`create_image_simple`] and a view over all of its
    /// layers with the given aspect.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        device: &ash::Device,
        allocator: &mut Allocator,
        image_type: vk::ImageType,
        view_aspect: vk::ImageAspectFlags,
        format: vk::Format,
        width: u32,
        height: u32,
        array_layers: u32,
        additional_usage: vk::ImageUsageFlags,
        samples: vk::SampleCountFlags,
    ) -> Result<()> {
        debug_assert!(
            self.view == vk::ImageView::null(),
            "destroy the image before recreating it"
        );

        let (image, allocation) = create_image_simple(
            device,
            allocator,
            image_type,
            format,
            width,
            height,
            array_layers,
            additional_usage,
            samples,
        )?;
        let view = unsafe {
            device.create_image_view(
                &vk::ImageViewCreateInfo {
                    s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
                    p_next: ptr::null(),
                    flags: vk::ImageViewCreateFlags::empty(),
                    image,
                    view_type: view_type_for(array_layers),
                    format,
                    components: vk::ComponentMapping::default(),
                    subresource_range: vk::ImageSubresourceRange {
                        aspect_mask: view_aspect,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: array_layers,
                    },
                    _marker: Default::default(),
                },
                None,
            )?
        };

        self.image = image;
        self.allocation = Some(allocation);
        self.view = view;
        self.width = width;
        self.height = height;
        self.layers = array_layers;
        self.format = format;
        Ok(())
    }

    /// Destroy the view, image, and memory, and reset the tracked state so the
    /// wrapper can be recreated.
    pub fn destroy(&mut self, device: &ash::Device, allocator: &mut Allocator) -> Result<()> {
        if self.view != vk::ImageView::null() {
            #[cfg(feature = "log-lifetimes")]
            trace!("Destroying VkImage {:?}", self.image);

            unsafe {
                device.destroy_image_view(self.view, None);
                device.destroy_image(self.image, None);
            }
            if let Some(allocation) = self.allocation.take() {
                allocator.free(allocation)?;
            }

            self.view = vk::ImageView::null();
            self.image = vk::Image::null();
            self.width = 0;
            self.height = 0;
            self.layers = 0;
            self.format = vk::Format::UNDEFINED;
            self.layout = vk::ImageLayout::UNDEFINED;
            self.stages = vk::PipelineStageFlags2::TOP_OF_PIPE;
            self.accesses = vk::AccessFlags2::empty();
        }
        Ok(())
    }

    /// Record a transition from the tracked state to the destination state and
    /// update the tracking. The aspect mask is derived from the destination
    /// layout and the image format.
    pub fn transition_to(
        &mut self,
        device: &ash::Device,
        cmd: vk::CommandBuffer,
        dst_layout: vk::ImageLayout,
        dst_stages: vk::PipelineStageFlags2,
        dst_accesses: vk::AccessFlags2,
    ) {
        // Larger applications would batch barriers; one at a time is enough
        // for the demo.
        let aspect_mask = sync::aspect_mask_for(dst_layout, self.format);
        sync::cmd_transition_image(
            device,
            cmd,
            self.image,
            aspect_mask,
            self.layout,
            self.stages,
            self.accesses,
            dst_layout,
            dst_stages,
            dst_accesses,
            self.layers,
        );

        self.layout = dst_layout;
        self.stages = dst_stages;
        self.accesses = dst_accesses;
    }

    /// Overwrite the tracked layout without recording a barrier. Call this
    /// when a render pass transitioned the image implicitly.
    pub fn assume_layout(&mut self, dst_layout: vk::ImageLayout) {
        self.layout = dst_layout;
    }

    pub fn set_name(
        &self,
        debug_utils: &ash::ext::debug_utils::Device,
        name: &str,
    ) -> Result<()> {
        name_object(debug_utils, self.image, name)?;
        name_object(debug_utils, self.view, name)?;
        Ok(())
    }
}

fn view_type_for(array_layers: u32) -> vk::ImageViewType {
    if array_layers == 1 {
        vk::ImageViewType::TYPE_2D
    } else {
        vk::ImageViewType::TYPE_2D_ARRAY
    }
}

impl Drop for ImageAndView {
    fn drop(&mut self) {
        debug_assert!(
            self.view == vk::ImageView::null(),
            "ImageAndView dropped without destroy"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_matches_an_undefined_image() {
        let image = ImageAndView::default();
        assert_eq!(image.handle(), vk::Image::null());
        assert_eq!(image.view(), vk::ImageView::null());
        assert_eq!(image.format(), vk::Format::UNDEFINED);
        assert_eq!(image.layout(), vk::ImageLayout::UNDEFINED);
        assert_eq!(image.stages(), vk::PipelineStageFlags2::TOP_OF_PIPE);
        assert_eq!(image.accesses(), vk::AccessFlags2::empty());
    }

    #[test]
    fn single_layer_images_get_a_2d_view() {
        assert_eq!(view_type_for(1), vk::ImageViewType::TYPE_2D);
    }

    #[test]
    fn layered_images_get_an_array_view() {
        assert_eq!(view_type_for(2), vk::ImageViewType::TYPE_2D_ARRAY);
        assert_eq!(view_type_for(6), vk::ImageViewType::TYPE_2D_ARRAY);
    }

    #[test]
    fn assume_layout_only_touches_the_layout() {
        let mut image = ImageAndView::default();
        image.assume_layout(vk::ImageLayout::PRESENT_SRC_KHR);
        assert_eq!(image.layout(), vk::ImageLayout::PRESENT_SRC_KHR);
        assert_eq!(image.stages(), vk::PipelineStageFlags2::TOP_OF_PIPE);
        assert_eq!(image.accesses(), vk::AccessFlags2::empty());
    }
}
