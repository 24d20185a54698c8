// Evsync Input Layer - Device Filtering
// Device selection for explicit matches and autodetection

/// Whether a device should be attached.
///
/// An explicit filter entry selects a device by full path, by node name
/// (`event3` for `/dev/input/event3`) or by exact device name, and may
/// select virtual devices. With no entries, every non-virtual device that
/// reports input is taken.
pub fn matches_device_filter(
    device_name: &str,
    device_path: &str,
    filter_names: &[String],
    has_input: bool,
    is_virtual: bool,
) -> bool {
    if filter_names.is_empty() {
        return has_input && !is_virtual;
    }
    let node = device_path.rsplit('/').next().unwrap_or(device_path);
    filter_names
        .iter()
        .map(String::as_str)
        .any(|entry| entry == device_path || entry == node || entry == device_name)
}

/// Check if a device name belongs to a virtual device
pub fn is_virtual_device(device_name: &str) -> bool {
    device_name.contains("(virtual)") || device_name.starts_with("uinput")
}
