//! FFI bindings for the wellness engine
//!
//! This module provides C-compatible functions for calling the engine from app
//! shells. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `wellness_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::EngineError;
use crate::pipeline::{compute_baseline_json, scan_json, select_intervention_json, WellnessProcessor};
use crate::types::{MoodEntry, MoodScore};

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

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Turn a JSON result into an owned C string, recording any error
fn json_result(result: Result<String, EngineError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Compute a baseline from a JSON array of mood entries.
///
/// `window` <= 0 means the whole history.
///
/// # Safety
/// - `history_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_compute_baseline(
    history_json: *const c_char,
    window: i32,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(history_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let window = if window <= 0 {
        None
    } else {
        Some(window as usize)
    };

    json_result(compute_baseline_json(&json_str, window))
}

/// Scan text for crisis language and return the signal as JSON.
///
/// # Safety
/// - `text` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_scan(text: *const c_char) -> *mut c_char {
    clear_last_error();

    let text_str = match cstr_to_string(text) {
        Some(s) => s,
        None => {
            set_last_error("Invalid text string pointer");
            return ptr::null_mut();
        }
    };

    json_result(scan_json(&text_str))
}

/// Select an intervention from a JSON selection request.
///
/// # Safety
/// - `request_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_select_intervention(request_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(request_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    json_result(select_intervention_json(&json_str))
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a WellnessProcessor
pub struct WellnessProcessorHandle {
    processor: WellnessProcessor,
}

/// Create a new WellnessProcessor with the specified baseline window.
///
/// `baseline_window` <= 0 means the whole history.
///
/// # Safety
/// - Returns a pointer to a newly allocated WellnessProcessor.
/// - Must be freed with `wellness_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_new(baseline_window: i32) -> *mut WellnessProcessorHandle {
    clear_last_error();

    let processor = if baseline_window <= 0 {
        WellnessProcessor::new()
    } else {
        match WellnessProcessor::with_baseline_window(baseline_window as usize) {
            Ok(p) => p,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    Box::into_raw(Box::new(WellnessProcessorHandle { processor }))
}

/// Free a WellnessProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `wellness_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_free(processor: *mut WellnessProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Record one mood entry (JSON object) and return the check-in as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `wellness_processor_new`.
/// - `entry_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_record_mood(
    processor: *mut WellnessProcessorHandle,
    entry_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(entry_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let entry: MoodEntry = match serde_json::from_str(&json_str) {
        Ok(entry) => entry,
        Err(e) => {
            set_last_error(&EngineError::ParseError(e.to_string()).to_string());
            return ptr::null_mut();
        }
    };

    let check_in = handle.processor.record_mood(entry);
    json_result(serde_json::to_string(&check_in).map_err(EngineError::from))
}

/// Scan a chat message with the processor's lexicon.
///
/// Returns the full chat turn (signal, reply and resources) as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `wellness_processor_new`.
/// - `text` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_scan(
    processor: *mut WellnessProcessorHandle,
    text: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let text_str = match cstr_to_string(text) {
        Some(s) => s,
        None => {
            set_last_error("Invalid text string pointer");
            return ptr::null_mut();
        }
    };

    let turn = handle.processor.chat_turn(&text_str);
    json_result(serde_json::to_string(&turn).map_err(EngineError::from))
}

/// Select the next intervention for the current mood and record it.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `wellness_processor_new`.
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_next_intervention(
    processor: *mut WellnessProcessorHandle,
    current_mood: i32,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let result = MoodScore::new(current_mood as i64)
        .and_then(|mood| handle.processor.next_intervention(mood))
        .and_then(|module| serde_json::to_string(&module).map_err(EngineError::from));

    json_result(result)
}

/// Save processor state (history and recent interventions) to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `wellness_processor_new`.
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_save_state(
    processor: *mut WellnessProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;
    json_result(handle.processor.save_state())
}

/// Load processor state from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `wellness_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_load_state(
    processor: *mut WellnessProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.processor.load_state(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by engine functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an engine function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn wellness_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next engine call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn wellness_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the engine library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn wellness_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        wellness_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_compute_baseline() {
        let history = CString::new(
            r#"[
                {"mood": 2, "timestamp": "2024-03-01T08:00:00Z"},
                {"mood": 4, "timestamp": "2024-03-02T08:00:00Z"}
            ]"#,
        )
        .unwrap();

        unsafe {
            let result = take_string(wellness_compute_baseline(history.as_ptr(), 0));
            let value: serde_json::Value = serde_json::from_str(&result).unwrap();
            assert_eq!(value["rolling_mean"], 3.0);
            assert_eq!(value["sample_count"], 2);
        }
    }

    #[test]
    fn test_ffi_scan() {
        let text = CString::new("Everything feels hopeless").unwrap();

        unsafe {
            let result = take_string(wellness_scan(text.as_ptr()));
            assert!(result.contains(r#""severity":"watch""#));
        }
    }

    #[test]
    fn test_ffi_select_intervention() {
        let request = CString::new(r#"{"current_mood": 1}"#).unwrap();

        unsafe {
            let result = take_string(wellness_select_intervention(request.as_ptr()));
            assert!(result.contains("grounding_54321"));
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let processor = wellness_processor_new(7);
            assert!(!processor.is_null());

            let entry = CString::new(r#"{"mood": 2, "timestamp": "2024-03-01T08:00:00Z"}"#).unwrap();
            let check_in = take_string(wellness_processor_record_mood(processor, entry.as_ptr()));
            assert!(check_in.contains("\"building_baseline\":true"));

            let message = CString::new("I feel so anxious").unwrap();
            let turn = take_string(wellness_processor_scan(processor, message.as_ptr()));
            assert!(turn.contains("\"topic\":\"anxiety\""));

            let module = take_string(wellness_processor_next_intervention(processor, 2));
            assert!(module.contains("grounding_54321"));

            let state = wellness_processor_save_state(processor);
            assert!(!state.is_null());

            let processor2 = wellness_processor_new(0);
            assert_eq!(wellness_processor_load_state(processor2, state), 0);

            // grounding is now recent in the restored processor
            let next = take_string(wellness_processor_next_intervention(processor2, 2));
            assert!(!next.contains("grounding_54321"));

            wellness_free_string(state);
            wellness_processor_free(processor);
            wellness_processor_free(processor2);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = wellness_compute_baseline(invalid_json.as_ptr(), 0);
            assert!(result.is_null());

            let error = wellness_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());

            let processor = wellness_processor_new(0);
            assert!(wellness_processor_next_intervention(processor, 9).is_null());
            assert!(wellness_processor_next_intervention(ptr::null_mut(), 3).is_null());
            wellness_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = wellness_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
