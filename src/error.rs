use ash::vk;
/// Possible errors
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrismError {
    #[error("String contains null byte")]
    StringContainsNull,

    #[error(transparent)]
    VkError(#[from] vk::Result),

    #[error(transparent)]
    AllocationError(#[from] gpu_allocator::AllocationError),
}

impl From<std::ffi::NulError> for PrismError {
    fn from(_: std::ffi::NulError) -> Self {
        PrismError::StringContainsNull
    }
}
