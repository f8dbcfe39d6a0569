use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Threading::{
    OpenProcess, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
    QueryFullProcessImageNameW,
};
use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId};
use windows::core::PWSTR;

use super::lookup::{ForegroundInfo, ForegroundLookup};

/// Foreground lookup over the Win32 window and process APIs
/// Uses the sequence GetForegroundWindow -> GetWindowThreadProcessId ->
/// OpenProcess -> QueryFullProcessImageNameW, then extracts the file name
pub struct Win32Lookup;

impl ForegroundLookup for Win32Lookup {
    fn foreground(&self) -> ForegroundInfo {
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.0.is_null() {
                return ForegroundInfo::NoWindow;
            }

            let mut pid: u32 = 0;
            GetWindowThreadProcessId(hwnd, Some(&mut pid));
            if pid == 0 {
                return ForegroundInfo::NoProcess;
            }

            let handle = match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
                Ok(handle) => handle,
                Err(e) => {
                    log::debug!("OpenProcess({}) failed: {}", pid, e);
                    return ForegroundInfo::NoProcess;
                }
            };
            let info = match image_file_name(handle) {
                Some(name) => ForegroundInfo::Process(name),
                None => ForegroundInfo::NoProcess,
            };
            let _ = CloseHandle(handle);
            info
        }
    }
}

/// Executable file name for an open process handle
fn image_file_name(handle: HANDLE) -> Option<String> {
    let mut buf = [0u16; 512];
    let mut len = buf.len() as u32;
    let queried = unsafe {
        QueryFullProcessImageNameW(handle, PROCESS_NAME_WIN32, PWSTR(buf.as_mut_ptr()), &mut len)
    };
    if queried.is_err() || len == 0 {
        return None;
    }
    let full_path = String::from_utf16_lossy(&buf[..len as usize]);
    full_path
        .rsplit(['\\', '/'])
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
