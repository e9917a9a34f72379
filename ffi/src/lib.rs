//! C-ABI wrapper around `sidehustle-core`.
//!
//! # Overview
//! Exposes the request pipeline through `extern "C"` functions so a native
//! host (Swift, Kotlin, C) can build sideHUSTLE API requests, run the HTTP
//! round-trip with its own networking stack, and hand the response back for
//! normalization. Session state and storage stay on the host side.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - One `sh_build_*` per endpoint, each taking an optional bearer token.
//! - A single `sh_parse_response` applies the core normalization rules and
//!   returns an `FfiResult` envelope; typed decoding is left to the host.
//! - The C caller owns all returned pointers and must call the matching
//!   `sh_free_*` function to release them.

pub mod types;

use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use sidehustle_core::{ApiCall, ApiClient, ClientConfig, Credentials, PostDraft};

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client bound to `base_url` (for example
/// `http://localhost:8000/api`). A null `auth_scheme` means `Token`.
///
/// Returns null if `base_url` is null or not UTF-8.
/// The caller must free the returned pointer with `sh_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn sh_client_new(
    base_url: *const c_char,
    auth_scheme: *const c_char,
) -> *mut FfiApiClient {
    catch_unwind(|| {
        let Some(url) = (unsafe { read_str(base_url) }) else {
            return std::ptr::null_mut();
        };
        let mut config = ClientConfig::new(url);
        if let Some(scheme) = unsafe { read_str(auth_scheme) } {
            config = config.with_auth_scheme(scheme);
        }
        let inner = ApiClient::from_config(&config);
        Box::into_raw(Box::new(FfiApiClient { inner }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `sh_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn sh_client_free(client: *mut FfiApiClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Shared body of the builders: resolve the client, describe the call, and
/// attach `token` when it is non-null and non-empty. Null on any failure.
fn build(
    client: *const FfiApiClient,
    token: *const c_char,
    call: impl FnOnce() -> Option<ApiCall>,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(call) = call() else {
            return std::ptr::null_mut();
        };
        let token = unsafe { read_str(token) };
        FfiHttpRequest::from_core(client.inner.build(call, token))
    }))
    .unwrap_or(std::ptr::null_mut())
}

fn parse_json<T: serde::de::DeserializeOwned>(json: *const c_char) -> Option<T> {
    serde_json::from_str(unsafe { read_str(json) }?).ok()
}

/// `POST /auth/login/`. Returns null if `email` or `password` is null.
#[unsafe(no_mangle)]
pub extern "C" fn sh_build_login(
    client: *const FfiApiClient,
    email: *const c_char,
    password: *const c_char,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, token, || {
        let credentials = Credentials {
            email: unsafe { read_str(email) }?.to_string(),
            password: unsafe { read_str(password) }?.to_string(),
        };
        ApiCall::login(&credentials).ok()
    })
}

/// `POST /auth/register/`. `registration_json` uses the server field
/// names (`username`, `email`, `password`, `ANumber`, `first_name`,
/// `last_name`). Returns null if the JSON does not have that shape.
#[unsafe(no_mangle)]
pub extern "C" fn sh_build_register(
    client: *const FfiApiClient,
    registration_json: *const c_char,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, token, || {
        ApiCall::register(&parse_json(registration_json)?).ok()
    })
}

/// `GET /auth/user/`.
#[unsafe(no_mangle)]
pub extern "C" fn sh_build_current_user(
    client: *const FfiApiClient,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, token, || Some(ApiCall::current_user()))
}

/// `GET /posts/published/`.
#[unsafe(no_mangle)]
pub extern "C" fn sh_build_list_published(
    client: *const FfiApiClient,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, token, || Some(ApiCall::published_posts()))
}

/// `GET /posts/my_posts/`.
#[unsafe(no_mangle)]
pub extern "C" fn sh_build_list_my_posts(
    client: *const FfiApiClient,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, token, || Some(ApiCall::my_posts()))
}

/// `GET /posts/{id}/`.
#[unsafe(no_mangle)]
pub extern "C" fn sh_build_get_post(
    client: *const FfiApiClient,
    id: i64,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, token, || Some(ApiCall::get_post(id)))
}

/// `POST /posts/`. `draft_json` uses the PascalCase post fields; missing
/// fields take their defaults.
#[unsafe(no_mangle)]
pub extern "C" fn sh_build_create_post(
    client: *const FfiApiClient,
    draft_json: *const c_char,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, token, || {
        let draft: PostDraft = parse_json(draft_json)?;
        ApiCall::create_post(&draft).ok()
    })
}

/// `PUT /posts/{id}/` with a full replacement draft.
#[unsafe(no_mangle)]
pub extern "C" fn sh_build_update_post(
    client: *const FfiApiClient,
    id: i64,
    draft_json: *const c_char,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, token, || {
        let draft: PostDraft = parse_json(draft_json)?;
        ApiCall::update_post(id, &draft).ok()
    })
}

/// `DELETE /posts/{id}/`.
#[unsafe(no_mangle)]
pub extern "C" fn sh_build_delete_post(
    client: *const FfiApiClient,
    id: i64,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, token, || Some(ApiCall::delete_post(id)))
}

/// `POST /posts/{id}/publish/`.
#[unsafe(no_mangle)]
pub extern "C" fn sh_build_publish_post(
    client: *const FfiApiClient,
    id: i64,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, token, || Some(ApiCall::publish_post(id)))
}

// ---------------------------------------------------------------------------
// Parse response
// ---------------------------------------------------------------------------

/// Normalize a response executed by the host.
///
/// JSON bodies come back tagged `Json` (re-serialized compactly), other
/// successful bodies tagged `Text`. Failures carry the error code, the
/// user-facing message and, when known, the HTTP status.
#[unsafe(no_mangle)]
pub extern "C" fn sh_parse_response(
    client: *const FfiApiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let response = unsafe { (*response).to_core() };
        match client.inner.parse_response(response) {
            Ok(payload) => FfiResult::ok(payload),
            Err(err) => FfiResult::from_error(err),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in sh_parse_response"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a request returned by any `sh_build_*` function. Safe to call with
/// null.
#[unsafe(no_mangle)]
pub extern "C" fn sh_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiHttpRequest::free(req) });
}

/// Free a result returned by `sh_parse_response`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn sh_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiResult::free(result) });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn sh_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
