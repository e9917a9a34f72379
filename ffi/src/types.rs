//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, a raw array instead of `Vec`, and
//! enums with explicit discriminants. Payloads cross the boundary as JSON
//! text so the host decodes them with its own JSON library. Conversion
//! helpers live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use sidehustle_core::{ApiClient, ApiError, HttpMethod, HttpRequest, HttpResponse, Payload};

/// Opaque handle to an `ApiClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiApiClient {
    pub(crate) inner: ApiClient,
}

/// Copy `value` into a heap C string owned by the caller. Interior NUL
/// bytes are dropped.
pub(crate) fn c_string(value: impl Into<Vec<u8>>) -> *mut c_char {
    let mut bytes = value.into();
    bytes.retain(|b| *b != 0);
    CString::new(bytes).unwrap_or_default().into_raw()
}

/// Borrow a caller-provided C string. Null and non-UTF-8 input read as `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Copy a caller-provided C string, replacing invalid UTF-8 with U+FFFD.
/// Null reads as empty.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn read_lossy(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

pub(crate) fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

#[repr(C)]
pub struct FfiHeader {
    pub name: *mut c_char,
    pub value: *mut c_char,
}

/// A fully built request. The host executes it and hands the response to
/// `sh_parse_response`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    /// Null when the request has no body.
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let body = match req.body {
            Some(body) => c_string(body),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(name, value)| FfiHeader {
                    name: c_string(name),
                    value: c_string(value),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
            body,
        }))
    }

    /// Release every allocation owned by the request, then the request.
    ///
    /// # Safety
    /// `ptr` must come from `from_core` and not have been freed.
    pub(crate) unsafe fn free(ptr: *mut Self) {
        let req = unsafe { Box::from_raw(ptr) };
        free_c_string(req.url);
        free_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize);
            let headers = unsafe { Box::from_raw(slice) };
            for header in headers.iter() {
                free_c_string(header.name);
                free_c_string(header.value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// The host's view of an HTTP response. The FFI layer reads but never frees
/// these fields; any of the strings may be null.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub status_text: *const c_char,
    /// Value of the `Content-Type` header, null when absent.
    pub content_type: *const c_char,
    pub body: *const c_char,
}

impl FfiHttpResponse {
    /// Text fields are decoded lossily, the way an HTTP client reads a body
    /// as text.
    ///
    /// # Safety
    /// Every non-null string field must be NUL-terminated.
    pub(crate) unsafe fn to_core(&self) -> HttpResponse {
        let headers = if self.content_type.is_null() {
            Vec::new()
        } else {
            let value = unsafe { read_lossy(self.content_type) };
            vec![("Content-Type".to_string(), value)]
        };
        HttpResponse {
            status: self.status,
            status_text: unsafe { read_lossy(self.status_text) },
            headers,
            body: unsafe { read_lossy(self.body) },
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One code per `ApiError` variant, plus the FFI-only failures.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Network = 1,
    MalformedResponse = 2,
    Transport = 3,
    Api = 4,
    Validation = 5,
    Deserialization = 6,
    Serialization = 7,
    Storage = 8,
    Panic = 9,
    NullArg = 10,
}

impl From<&ApiError> for FfiErrorCode {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::Network(_) => FfiErrorCode::Network,
            ApiError::MalformedResponse { .. } => FfiErrorCode::MalformedResponse,
            ApiError::Transport { .. } => FfiErrorCode::Transport,
            ApiError::Api { .. } => FfiErrorCode::Api,
            ApiError::Validation(_) => FfiErrorCode::Validation,
            ApiError::Deserialization(_) => FfiErrorCode::Deserialization,
            ApiError::Serialization(_) => FfiErrorCode::Serialization,
            ApiError::Storage(_) => FfiErrorCode::Storage,
        }
    }
}

/// What `FfiResult::payload` holds.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiPayloadTag {
    None = 0,
    /// Compact JSON text.
    Json = 1,
    /// The raw response body.
    Text = 2,
}

/// Result envelope of `sh_parse_response`.
///
/// On success `error_code` is `Ok`, `error_message` is null and `payload`
/// is tagged by `payload_tag`. On failure `error_message` is the
/// user-facing message, `http_status` is set when a response carried one,
/// and `payload` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub payload_tag: FfiPayloadTag,
    pub payload: *mut c_char,
}

impl FfiResult {
    fn boxed(self) -> *mut Self {
        Box::into_raw(Box::new(self))
    }

    pub(crate) fn ok(payload: Payload) -> *mut Self {
        let (payload_tag, payload) = match payload {
            Payload::Json(value) => (FfiPayloadTag::Json, c_string(value.to_string())),
            Payload::Text(text) => (FfiPayloadTag::Text, c_string(text)),
        };
        FfiResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            payload_tag,
            payload,
        }
        .boxed()
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        FfiResult {
            error_code: FfiErrorCode::from(&err),
            error_message: c_string(err.to_string()),
            http_status: err.status().unwrap_or(0),
            payload_tag: FfiPayloadTag::None,
            payload: std::ptr::null_mut(),
        }
        .boxed()
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg)
    }

    fn failure(error_code: FfiErrorCode, msg: &str) -> *mut Self {
        FfiResult {
            error_code,
            error_message: c_string(msg),
            http_status: 0,
            payload_tag: FfiPayloadTag::None,
            payload: std::ptr::null_mut(),
        }
        .boxed()
    }

    /// # Safety
    /// `ptr` must come from one of the constructors above and not have been
    /// freed.
    pub(crate) unsafe fn free(ptr: *mut Self) {
        let result = unsafe { Box::from_raw(ptr) };
        free_c_string(result.error_message);
        free_c_string(result.payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_string_drops_interior_nul() {
        let ptr = c_string("a\0b");
        assert_eq!(unsafe { read_str(ptr) }, Some("ab"));
        free_c_string(ptr);
    }

    #[test]
    fn response_without_content_type_has_no_headers() {
        let body = CString::new("ok").unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            status_text: std::ptr::null(),
            content_type: std::ptr::null(),
            body: body.as_ptr(),
        };
        let core = unsafe { resp.to_core() };
        assert!(core.headers.is_empty());
        assert_eq!(core.status_text, "");
        assert_eq!(core.body, "ok");
    }

    #[test]
    fn latin1_body_is_decoded_lossily() {
        let body = CString::new(vec![0x63, 0x61, 0x66, 0xE9]).unwrap();
        let status_text = CString::new(vec![0x4F, 0x4B, 0xFF]).unwrap();
        let content_type = CString::new("text/plain").unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            status_text: status_text.as_ptr(),
            content_type: content_type.as_ptr(),
            body: body.as_ptr(),
        };
        let core = unsafe { resp.to_core() };
        assert_eq!(core.body, "caf\u{FFFD}");
        assert_eq!(core.status_text, "OK\u{FFFD}");
        assert_eq!(core.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn error_code_follows_variant() {
        let err = ApiError::Api {
            status: 401,
            message: "Invalid credentials".to_string(),
        };
        assert_eq!(FfiErrorCode::from(&err), FfiErrorCode::Api);
        assert_eq!(
            FfiErrorCode::from(&ApiError::Network("refused".to_string())),
            FfiErrorCode::Network
        );
    }
}
