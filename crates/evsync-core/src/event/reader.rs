// Evsync Event Reader
// Nonblocking batched reads of input_event records and the device poll loop

use std::io::{self, Read};
use std::os::unix::io::RawFd;

use crate::error::ReadError;
use crate::input::{RawEvent, RECORD_SIZE};

#[cfg(feature = "device")]
use std::os::unix::fs::MetadataExt;
#[cfg(feature = "device")]
use std::os::unix::io::AsRawFd;
#[cfg(feature = "device")]
use std::path::PathBuf;

#[cfg(feature = "device")]
use crate::error::EventLoopError;
#[cfg(feature = "device")]
use crate::input::{is_virtual_device, matches_device_filter, DeviceCapabilities};

/// Records read per `read(2)` call
pub const READ_BATCH: usize = 16;

/// `io::Read` over a raw, caller-owned file descriptor
#[derive(Debug, Clone, Copy)]
pub struct FdReader {
    fd: RawFd,
}

impl FdReader {
    pub fn new(fd: RawFd) -> Self {
        Self { fd }
    }
}

impl Read for FdReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: buf is a valid writable slice of buf.len() bytes
        let rc = unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(rc as usize)
    }
}

/// Drain whole records from `source`, handing each to `handle`.
///
/// Reads up to [`READ_BATCH`] records at a time and keeps reading while a
/// full batch came back. Running dry after at least one record is not an
/// error. A length that is not a whole number of records aborts the batch
/// before any of it is handled.
///
/// Returns the number of records handled.
pub fn read_events<R, F>(source: &mut R, mut handle: F) -> Result<usize, ReadError>
where
    R: Read,
    F: FnMut(RawEvent),
{
    let mut buf = [0u8; RECORD_SIZE * READ_BATCH];
    let mut total = 0;

    loop {
        let len = match source.read(&mut buf) {
            Ok(len) => len,
            Err(err) => {
                let err = ReadError::from_io(err);
                if total > 0 && matches!(err, ReadError::Transient) {
                    break;
                }
                return Err(err);
            }
        };

        let events = RawEvent::decode_batch(&buf[..len]).map_err(|err| {
            log::error!("{}", err);
            err
        })?;
        total += events.len();
        for event in events {
            handle(event);
        }

        if len < buf.len() {
            break;
        }
    }

    Ok(total)
}

/// Device information for listing devices
#[cfg(feature = "device")]
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Device index
    pub index: usize,
    /// Device name
    pub name: String,
    /// Device path (if available)
    pub path: Option<String>,
}

/// An opened device node and what was probed from it
#[cfg(feature = "device")]
pub struct OpenedDevice {
    pub path: PathBuf,
    /// Device number, used for duplicate detection
    pub rdev: u64,
    pub caps: DeviceCapabilities,
    device: evdev::Device,
}

#[cfg(feature = "device")]
impl OpenedDevice {
    pub fn name(&self) -> &str {
        &self.caps.name
    }

    /// Read everything currently pending on the device
    pub fn read<F: FnMut(RawEvent)>(&mut self, handle: F) -> Result<usize, ReadError> {
        let mut reader = FdReader::new(self.device.as_raw_fd());
        read_events(&mut reader, handle)
    }
}

/// Poll loop over opened evdev nodes.
///
/// Devices are put in nonblocking mode and optionally grabbed. Dropping the
/// loop ungrabs everything.
#[cfg(feature = "device")]
pub struct EventLoop {
    devices: Vec<OpenedDevice>,
    poll_fds: Vec<libc::pollfd>,
    grabbed: bool,
}

#[cfg(feature = "device")]
impl EventLoop {
    /// Open every input device matching `filter_names` (all pointer, touch
    /// and key devices when empty)
    pub fn open(filter_names: &[String], grab: bool) -> Result<Self, EventLoopError> {
        let mut devices = Vec::new();

        for (path, device) in evdev::enumerate() {
            let device_name = device.name().unwrap_or("Unknown").to_string();
            let device_path = path.to_str().unwrap_or_default().to_string();
            if !matches_device_filter(
                &device_name,
                &device_path,
                filter_names,
                Self::has_input(&device),
                is_virtual_device(&device_name),
            ) {
                continue;
            }

            match Self::open_device(path, device, grab) {
                Ok(opened) => {
                    log::info!("{}: opened {}", opened.name(), opened.path.display());
                    devices.push(opened);
                }
                Err(err) => log::error!("{}: unable to open {}: {}", device_name, device_path, err),
            }
        }

        if devices.is_empty() {
            return Err(EventLoopError::DeviceNotFound("No input devices found".to_string()));
        }

        let poll_fds = Self::create_poll_fds(&devices);
        Ok(Self {
            devices,
            poll_fds,
            grabbed: grab,
        })
    }

    fn open_device(path: PathBuf, mut device: evdev::Device, grab: bool) -> Result<OpenedDevice, EventLoopError> {
        let rdev = std::fs::metadata(&path)?.rdev();
        let caps = DeviceCapabilities::from_device(&device)?;

        let fd = device.as_raw_fd();
        // SAFETY: fd belongs to the device we own for the duration of the call
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if flags < 0 || unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
            return Err(EventLoopError::Io(io::Error::last_os_error()));
        }

        if grab {
            // A previous instance may have died holding the grab
            let _ = device.ungrab();
            device.grab()?;
        }

        Ok(OpenedDevice {
            path,
            rdev,
            caps,
            device,
        })
    }

    fn has_input(device: &evdev::Device) -> bool {
        let events = device.supported_events();
        events.contains(evdev::EventType::KEY)
            || events.contains(evdev::EventType::RELATIVE)
            || events.contains(evdev::EventType::ABSOLUTE)
    }

    fn create_poll_fds(devices: &[OpenedDevice]) -> Vec<libc::pollfd> {
        devices
            .iter()
            .map(|d| libc::pollfd {
                fd: d.device.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            })
            .collect()
    }

    /// List all devices that report input events
    pub fn list_devices() -> Result<Vec<DeviceInfo>, EventLoopError> {
        let devices_info: Vec<DeviceInfo> = evdev::enumerate()
            .filter(|(_, device)| Self::has_input(device))
            .enumerate()
            .map(|(index, (path, device))| DeviceInfo {
                index,
                name: device.name().unwrap_or("Unknown").to_string(),
                path: path.to_str().map(|s| s.to_string()),
            })
            .collect();

        if devices_info.is_empty() {
            return Err(EventLoopError::DeviceNotFound("No input devices found".to_string()));
        }

        Ok(devices_info)
    }

    /// Wait for readable devices.
    ///
    /// Returns the indices of devices with data pending. A timeout or EINTR
    /// yields an empty list.
    pub fn poll_ready(&mut self, timeout_ms: i32) -> Result<Vec<usize>, EventLoopError> {
        // SAFETY: poll_fds is a valid array of poll_fds.len() entries
        let poll_result =
            unsafe { libc::poll(self.poll_fds.as_mut_ptr(), self.poll_fds.len() as libc::nfds_t, timeout_ms) };

        if poll_result < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                return Ok(Vec::new());
            }
            return Err(EventLoopError::Io(err));
        }

        Ok(self
            .poll_fds
            .iter()
            .enumerate()
            .filter(|(_, fd)| fd.revents & (libc::POLLIN | libc::POLLERR | libc::POLLHUP) != 0)
            .map(|(index, _)| index)
            .collect())
    }

    pub fn devices(&self) -> &[OpenedDevice] {
        &self.devices
    }

    pub fn device_mut(&mut self, index: usize) -> Option<&mut OpenedDevice> {
        self.devices.get_mut(index)
    }

    /// Stop polling a device, ungrabbing it
    pub fn remove(&mut self, index: usize) -> Option<OpenedDevice> {
        if index >= self.devices.len() {
            return None;
        }
        let mut opened = self.devices.remove(index);
        self.poll_fds.remove(index);
        if self.grabbed {
            let _ = opened.device.ungrab();
        }
        Some(opened)
    }

    /// Ungrab all devices (called on shutdown)
    pub fn ungrab_all(&mut self) {
        if self.grabbed {
            for opened in &mut self.devices {
                let _ = opened.device.ungrab();
            }
            self.grabbed = false;
        }
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

#[cfg(feature = "device")]
impl Drop for EventLoop {
    fn drop(&mut self) {
        self.ungrab_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::*;
    use std::io::Cursor;

    fn encode(events: &[RawEvent]) -> Vec<u8> {
        events.iter().flat_map(|event| event.encode()).collect()
    }

    /// Hands out queued chunks, then fails with the given errno
    struct ScriptedReader {
        chunks: Vec<Vec<u8>>,
        errno: i32,
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.chunks.is_empty() {
                return Err(io::Error::from_raw_os_error(self.errno));
            }
            let chunk = self.chunks.remove(0);
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn test_reads_short_batch() {
        let bytes = encode(&[RawEvent::new(EV_REL, REL_X, 5), RawEvent::new(EV_SYN, SYN_REPORT, 0)]);
        let mut seen = Vec::new();
        let count = read_events(&mut Cursor::new(bytes), |event| seen.push(event)).unwrap();
        assert_eq!(count, 2);
        assert_eq!(seen[0].value, 5);
        assert_eq!(seen[1].event_type, EV_SYN);
    }

    #[test]
    fn test_keeps_reading_full_batches() {
        let events: Vec<RawEvent> = (0..READ_BATCH as i32 + 3).map(|v| RawEvent::new(EV_REL, REL_X, v)).collect();
        let mut seen = Vec::new();
        let count = read_events(&mut Cursor::new(encode(&events)), |event| seen.push(event.value)).unwrap();
        assert_eq!(count, READ_BATCH + 3);
        assert_eq!(seen.last(), Some(&(READ_BATCH as i32 + 2)));
    }

    #[test]
    fn test_eagain_after_full_batch_is_ok() {
        let events: Vec<RawEvent> = (0..READ_BATCH as i32).map(|v| RawEvent::new(EV_REL, REL_Y, v)).collect();
        let mut reader = ScriptedReader {
            chunks: vec![encode(&events)],
            errno: libc::EAGAIN,
        };
        assert_eq!(read_events(&mut reader, |_| {}).unwrap(), READ_BATCH);
    }

    #[test]
    fn test_eagain_on_first_read_is_transient() {
        let mut reader = ScriptedReader {
            chunks: Vec::new(),
            errno: libc::EAGAIN,
        };
        assert!(matches!(read_events(&mut reader, |_| {}), Err(ReadError::Transient)));
    }

    #[test]
    fn test_enodev_is_removed() {
        let mut reader = ScriptedReader {
            chunks: Vec::new(),
            errno: libc::ENODEV,
        };
        let err = read_events(&mut reader, |_| {}).unwrap_err();
        assert!(err.is_removed());
    }

    #[test]
    fn test_partial_record_applies_nothing() {
        let mut bytes = encode(&[RawEvent::new(EV_KEY, BTN_LEFT, 1)]);
        bytes.extend_from_slice(&[0u8; 6]);
        let mut handled = 0;
        let err = read_events(&mut Cursor::new(bytes), |_| handled += 1).unwrap_err();
        assert!(matches!(err, ReadError::PartialRecord { len: 30 }));
        assert_eq!(handled, 0);
    }

    #[test]
    fn test_fd_reader_pipe() {
        let mut fds = [0; 2];
        // SAFETY: fds has room for the two descriptors pipe(2) writes
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let bytes = encode(&[RawEvent::new(EV_KEY, 30, 1)]);
        // SAFETY: bytes is a valid buffer and fds[1] is the open write end
        let written = unsafe { libc::write(fds[1], bytes.as_ptr() as *const libc::c_void, bytes.len()) };
        assert_eq!(written as usize, RECORD_SIZE);
        unsafe { libc::close(fds[1]) };

        let mut seen = Vec::new();
        let count = read_events(&mut FdReader::new(fds[0]), |event| seen.push(event.code)).unwrap();
        unsafe { libc::close(fds[0]) };
        assert_eq!(count, 1);
        assert_eq!(seen, vec![30]);
    }
}
