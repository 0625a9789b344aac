use anyhow::Result;
use ash::vk;
use std::ffi::CString;
use std::ptr;

use crate::PrismError;

/// Attach a human-readable name to a Vulkan object through the debug utils
/// extension.
pub fn name_object<T: vk::Handle>(
    debug_utils: &ash::ext::debug_utils::Device,
    handle: T,
    name: &str,
) -> Result<()> {
    let name = CString::new(name).map_err(PrismError::from)?;
    let name_info = vk::DebugUtilsObjectNameInfoEXT {
        s_type: vk::StructureType::DEBUG_UTILS_OBJECT_NAME_INFO_EXT,
        p_next: ptr::null(),
        object_type: T::TYPE,
        object_handle: handle.as_raw(),
        p_object_name: name.as_ptr(),
        _marker: Default::default(),
    };
    unsafe {
        debug_utils
            .set_debug_utils_object_name(&name_info)
            .map_err(PrismError::from)?
    };
    Ok(())
}
