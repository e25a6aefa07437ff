//! librclone binding for the embedded engine.
//!
//! Links against the C ABI exported by `librclone` (built from
//! `github.com/rclone/rclone/librclone` with `-buildmode=c-shared`).

#![allow(unsafe_code)]

use super::{Engine, RpcReply};
use std::ffi::{c_char, c_int, CStr, CString};

#[repr(C)]
struct RcloneRPCResult {
    output: *mut c_char,
    status: c_int,
}

#[link(name = "rclone")]
extern "C" {
    fn RcloneInitialize();
    fn RcloneFinalize();
    fn RcloneRPC(method: *mut c_char, input: *mut c_char) -> RcloneRPCResult;
    fn RcloneFreeString(s: *mut c_char);
}

/// The rclone engine linked as a shared library.
///
/// librclone keeps global state, so only one instance should be driven per process.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibRclone;

impl Engine for LibRclone {
    fn initialize(&self) -> crate::Result<()> {
        // SAFETY: takes no arguments; librclone tolerates being called from any thread.
        unsafe { RcloneInitialize() };
        Ok(())
    }

    fn rpc(&self, method: &str, params: &str) -> RpcReply {
        let (method, params) = match (CString::new(method), CString::new(params)) {
            (Ok(m), Ok(p)) => (m, p),
            _ => return RpcReply::failure("rc method or params contain a NUL byte"),
        };

        // SAFETY: both pointers come from live CStrings; librclone copies the
        // inputs and does not write through them.
        let result = unsafe { RcloneRPC(method.as_ptr() as *mut c_char, params.as_ptr() as *mut c_char) };

        if result.output.is_null() {
            return RpcReply::failure("librclone returned no output");
        }
        // SAFETY: librclone returns a NUL-terminated string it allocated; we
        // copy it out and hand it back to RcloneFreeString exactly once.
        let body = unsafe { CStr::from_ptr(result.output) }
            .to_string_lossy()
            .into_owned();
        unsafe { RcloneFreeString(result.output) };

        RpcReply::new(u16::try_from(result.status).unwrap_or(RpcReply::FAILURE), body)
    }

    fn finalize(&self) {
        // SAFETY: called once, after the last rpc, by EmbeddedTransport::close.
        unsafe { RcloneFinalize() };
    }
}
