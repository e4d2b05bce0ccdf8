mod backend;
mod enumeration;
mod session;

pub use backend::{MonitorControl, OsdDisplay};
pub use enumeration::{DeviceAddress, find_devices};
pub use session::{ClaimedDevice, DeviceSession, UsbHandle, with_session};
