/// Represents the physical location a value is bound to.
///
/// Binary operations require both operands on the same device. In this build
/// every device keeps its elements in host memory: the tag records affinity and
/// is what device transfers (`to_device`) change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageDevice {
    /// Main system memory. This is the default device.
    #[default]
    CPU,
    /// Accelerator affinity.
    GPU,
}

impl StorageDevice {
    /// All devices known to this build, in a stable order.
    pub const ALL: [StorageDevice; 2] = [StorageDevice::CPU, StorageDevice::GPU];
}
