//! FFI bindings for Synheart Insights
//!
//! This module provides C-compatible functions for calling the engine from the
//! host app. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `insights_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::engine::insights_report_json;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Build an insight report from activity records and metric samples.
///
/// # Safety
/// - `records_json`, `samples_json` and `today` must be valid null-terminated C strings.
/// - `config_json` may be NULL to use the default configuration.
/// - Returns a newly allocated string that must be freed with `insights_free_string`.
/// - Returns NULL on error; call `insights_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn insights_report(
    records_json: *const c_char,
    samples_json: *const c_char,
    config_json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(records) = cstr_to_string(records_json) else {
        set_last_error("Invalid records string pointer");
        return ptr::null_mut();
    };

    let Some(samples) = cstr_to_string(samples_json) else {
        set_last_error("Invalid samples string pointer");
        return ptr::null_mut();
    };

    let Some(today) = cstr_to_string(today) else {
        set_last_error("Invalid date string pointer");
        return ptr::null_mut();
    };

    let config = if config_json.is_null() {
        None
    } else {
        match cstr_to_string(config_json) {
            Some(s) => Some(s),
            None => {
                set_last_error("Invalid config string");
                return ptr::null_mut();
            }
        }
    };

    match insights_report_json(&records, &samples, config.as_deref(), &today) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a string returned by an `insights_*` function.
///
/// # Safety
/// - `ptr` must be a pointer returned by this library, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn insights_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next call into this library on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn insights_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn insights_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> CString {
        CString::new(
            r#"[
                {"habit": "cold_plunge", "timestamp": "2024-01-14T07:00:00Z"},
                {"habit": "cold_plunge", "timestamp": "2024-01-15T07:00:00Z"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_report() {
        let records = records();
        let samples = CString::new("[]").unwrap();
        let today = CString::new("2024-01-15").unwrap();

        unsafe {
            let result = insights_report(records.as_ptr(), samples.as_ptr(), ptr::null(), today.as_ptr());
            assert!(!result.is_null());

            let json = CStr::from_ptr(result).to_str().unwrap();
            assert!(json.contains("\"cold_plunge\""));
            assert!(insights_last_error().is_null());

            insights_free_string(result);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let invalid = CString::new("not json").unwrap();
        let samples = CString::new("[]").unwrap();
        let today = CString::new("2024-01-15").unwrap();

        unsafe {
            let result = insights_report(invalid.as_ptr(), samples.as_ptr(), ptr::null(), today.as_ptr());
            assert!(result.is_null());

            let error = insights_last_error();
            assert!(!error.is_null());
            assert!(!CStr::from_ptr(error).to_str().unwrap().is_empty());

            let result = insights_report(ptr::null(), samples.as_ptr(), ptr::null(), today.as_ptr());
            assert!(result.is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = insights_version();
            assert!(!version.is_null());
            assert_eq!(CStr::from_ptr(version).to_str().unwrap(), env!("CARGO_PKG_VERSION"));
        }
    }
}
