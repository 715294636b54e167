// src/utils/elevation.rs

use crate::errors::RunnerError;

/// Checks if the current process is running with elevated (administrator) privileges.
///
/// # Returns
///
/// - `true` if the process is elevated.
/// - `false` otherwise, and always on non-Windows targets.
#[cfg(windows)]
pub fn is_elevated() -> bool {
    use windows::Win32::{
        Foundation::{CloseHandle, HANDLE},
        Security::{GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY},
        System::Threading::{GetCurrentProcess, OpenProcessToken},
    };

    let mut handle = HANDLE::default();
    if unsafe { OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut handle) }.is_err() {
        return false;
    }

    let mut elevation = TOKEN_ELEVATION::default();
    let mut returned = 0u32;
    let queried = unsafe {
        GetTokenInformation(
            handle,
            TokenElevation,
            Some(&mut elevation as *mut _ as *mut _),
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut returned,
        )
    };

    unsafe {
        let _ = CloseHandle(handle);
    }

    queried.is_ok() && elevation.TokenIsElevated != 0
}

#[cfg(not(windows))]
pub fn is_elevated() -> bool {
    false
}

/// Launches `program` with `parameters` through the shell using the `runas`
/// verb, hidden, and blocks until it exits.
///
/// # Returns
///
/// - `Ok(exit_code)` once the process has exited.
/// - `Err(RunnerError::Launch)` if no process was created, which includes the
///   user refusing elevation. Nothing is waited on in that case.
#[cfg(windows)]
pub fn run_elevated(program: &str, parameters: &str) -> Result<u32, RunnerError> {
    use widestring::U16CString;
    use windows::{
        core::PCWSTR,
        Win32::{
            Foundation::{CloseHandle, WAIT_OBJECT_0},
            System::Threading::{GetExitCodeProcess, WaitForSingleObject, INFINITE},
            UI::{
                Shell::{ShellExecuteExW, SEE_MASK_NOCLOSEPROCESS, SHELLEXECUTEINFOW},
                WindowsAndMessaging::SW_HIDE,
            },
        },
    };

    use crate::constants::ELEVATION_VERB;

    let wide = |s: &str| U16CString::from_str(s).map_err(|e| RunnerError::Launch(e.to_string()));
    let verb = wide(ELEVATION_VERB)?;
    let file = wide(program)?;
    let params = wide(parameters)?;

    let mut info = SHELLEXECUTEINFOW {
        cbSize: std::mem::size_of::<SHELLEXECUTEINFOW>() as u32,
        fMask: SEE_MASK_NOCLOSEPROCESS,
        lpVerb: PCWSTR(verb.as_ptr()),
        lpFile: PCWSTR(file.as_ptr()),
        lpParameters: PCWSTR(params.as_ptr()),
        nShow: SW_HIDE.0,
        ..Default::default()
    };

    unsafe { ShellExecuteExW(&mut info) }.map_err(|e| {
        tracing::error!("ShellExecuteExW failed for '{}': {}", program, e);
        RunnerError::Launch(e.to_string())
    })?;

    if info.hProcess.is_invalid() {
        return Err(RunnerError::Launch(
            "Shell did not return a process handle".to_string(),
        ));
    }

    let wait_result = unsafe { WaitForSingleObject(info.hProcess, INFINITE) };
    if wait_result != WAIT_OBJECT_0 {
        tracing::error!(
            "WaitForSingleObject failed with return value: {:?}",
            wait_result
        );
        unsafe {
            let _ = CloseHandle(info.hProcess);
        }
        return Err(RunnerError::Wait(format!(
            "unexpected wait result {:?}",
            wait_result
        )));
    }

    let mut exit_code = 0u32;
    let exit_result = unsafe { GetExitCodeProcess(info.hProcess, &mut exit_code) };
    unsafe {
        let _ = CloseHandle(info.hProcess);
    }
    exit_result.map_err(|e| RunnerError::Wait(e.to_string()))?;

    Ok(exit_code)
}

#[cfg(not(windows))]
pub fn run_elevated(program: &str, _parameters: &str) -> Result<u32, RunnerError> {
    tracing::error!("Cannot launch '{}' elevated on this platform.", program);
    Err(RunnerError::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_elevated() {
        let elevated = is_elevated();
        // This test should be run with appropriate privileges
        println!("Is elevated: {}", elevated);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_run_elevated_is_unsupported_off_windows() {
        assert!(matches!(
            run_elevated("cmd.exe", "/c exit 0"),
            Err(RunnerError::Unsupported)
        ));
    }
}
