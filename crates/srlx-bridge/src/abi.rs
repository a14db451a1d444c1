//! C ABI binding to a dynamically loaded pipeline library
//!
//! A pipeline shared library exports a single entry symbol,
//! [`ENTRY_SYMBOL`], returning a [`RawPipelineApi`] function table. This
//! module resolves that table through an [`IsolationLoader`] and wraps it in
//! the safe capability traits from [`crate::api`]. All handles keep the
//! loader alive through a shared binding, so the library is never unloaded
//! while an options or pipeline handle still points into it.
//!
//! Strings cross the boundary as NUL-terminated C strings and are always
//! released through the table's `release_string`, never through the host
//! allocator.

use crate::api::{Pipeline, PipelineApi, PipelineOptions};
use crate::errors::BridgeError;
use crate::loader::IsolationLoader;
use crate::sink::LogSink;
use srlx_logger as logger;
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::ptr;
use std::sync::Arc;

/// Entry symbol every pipeline archive must export
pub const ENTRY_SYMBOL: &[u8] = b"srlx_pipeline_api_v1\0";

/// ABI version this bridge speaks
pub const ABI_VERSION: u32 = 1;

/// Callback installed into the plugin for log chatter
pub type LogCallback =
    unsafe extern "C" fn(ctx: *mut c_void, level: c_int, message: *const c_char);

type EntryFn = unsafe extern "C" fn() -> *const RawPipelineApi;

/// Function table exported by a pipeline shared library
///
/// Handle ownership: `parse_options`, `build_pipeline` and `run_analysis`
/// return handles/strings owned by the caller, released through the matching
/// `release_*` function. `build_pipeline` does not consume the options
/// handle.
#[repr(C)]
pub struct RawPipelineApi {
    pub abi_version: u32,
    pub set_log_sink: unsafe extern "C" fn(callback: Option<LogCallback>, ctx: *mut c_void),
    pub parse_options: unsafe extern "C" fn(
        argc: c_int,
        argv: *const *const c_char,
        error_out: *mut *mut c_char,
    ) -> *mut c_void,
    pub verify_files: unsafe extern "C" fn(options: *const c_void) -> *mut c_char,
    pub build_pipeline:
        unsafe extern "C" fn(options: *const c_void, error_out: *mut *mut c_char) -> *mut c_void,
    pub run_analysis: unsafe extern "C" fn(
        pipeline: *mut c_void,
        sentence: *const c_char,
        error_out: *mut *mut c_char,
    ) -> *mut c_char,
    pub release_options: unsafe extern "C" fn(options: *mut c_void),
    pub release_pipeline: unsafe extern "C" fn(pipeline: *mut c_void),
    pub release_string: unsafe extern "C" fn(string: *mut c_char),
}

/// Shared state behind every handle produced by one binding
///
/// Owns the isolation loader (keeps the archives mapped) and the boxed log
/// sink whose address was handed to the plugin as the callback context.
struct ApiBinding {
    vtable: *const RawPipelineApi,
    _loader: IsolationLoader,
    _sink: Box<Box<dyn LogSink>>,
}

// The vtable is an immutable function table and the sink box is never moved
// after binding. Call-level serialization is the bridge's job (one lock per
// instance), not this type's.
unsafe impl Send for ApiBinding {}
unsafe impl Sync for ApiBinding {}

impl ApiBinding {
    fn vtable(&self) -> &RawPipelineApi {
        // Non-null checked at bind time; the loader keeps it mapped.
        unsafe { &*self.vtable }
    }

    /// Take ownership of a plugin-allocated string, releasing the original
    unsafe fn take_string(&self, ptr: *mut c_char) -> Option<String> {
        if ptr.is_null() {
            return None;
        }
        let text = CStr::from_ptr(ptr).to_string_lossy().into_owned();
        (self.vtable().release_string)(ptr);
        Some(text)
    }
}

unsafe extern "C" fn log_trampoline(ctx: *mut c_void, level: c_int, message: *const c_char) {
    if ctx.is_null() || message.is_null() {
        return;
    }
    let sink = &*ctx.cast::<Box<dyn LogSink>>();
    let text = CStr::from_ptr(message).to_string_lossy();
    let level = u8::try_from(level).unwrap_or(3);
    sink.line(level, &text);
}

/// Production [`PipelineApi`] backed by a loaded shared library
pub struct RawApi {
    binding: Arc<ApiBinding>,
}

impl RawApi {
    /// Bind the pipeline ABI out of an isolation scope
    ///
    /// Resolves the entry symbol, checks the ABI version and installs the
    /// log sink. The loader moves into the binding so the archives outlive
    /// every handle.
    pub fn bind(
        loader: IsolationLoader,
        sink: Box<dyn LogSink>,
    ) -> Result<Box<dyn PipelineApi>, BridgeError> {
        let vtable = {
            let entry = unsafe { loader.get::<EntryFn>(ENTRY_SYMBOL)? };
            let vtable = unsafe { entry() };
            if vtable.is_null() {
                return Err(BridgeError::Construction(
                    "pipeline entry point returned no API table".to_string(),
                ));
            }
            vtable
        };

        let abi_version = unsafe { (*vtable).abi_version };
        if abi_version != ABI_VERSION {
            return Err(BridgeError::AbiMismatch {
                expected: ABI_VERSION,
                actual: abi_version,
            });
        }

        // Double-boxed so the context pointer is a thin pointer to a stable
        // address that lives exactly as long as the binding.
        let sink: Box<Box<dyn LogSink>> = Box::new(sink);
        let ctx = (&*sink as *const Box<dyn LogSink>).cast_mut().cast::<c_void>();
        unsafe {
            ((*vtable).set_log_sink)(Some(log_trampoline), ctx);
        }

        logger::debug(&format!(
            "Bound pipeline ABI v{} from {} archive(s)",
            abi_version,
            loader.archives().len()
        ));

        Ok(Box::new(RawApi {
            binding: Arc::new(ApiBinding {
                vtable,
                _loader: loader,
                _sink: sink,
            }),
        }))
    }
}

impl PipelineApi for RawApi {
    fn parse_options(&self, args: &[String]) -> Result<Box<dyn PipelineOptions>, BridgeError> {
        let c_args: Vec<CString> = args
            .iter()
            .map(|a| {
                CString::new(a.as_str()).map_err(|_| {
                    BridgeError::InvalidOptions(format!("argument contains NUL byte: {:?}", a))
                })
            })
            .collect::<Result<_, _>>()?;
        let argv: Vec<*const c_char> = c_args.iter().map(|a| a.as_ptr()).collect();

        let mut error_out: *mut c_char = ptr::null_mut();
        let options = unsafe {
            (self.binding.vtable().parse_options)(
                c_int::try_from(argv.len()).map_err(|_| {
                    BridgeError::InvalidOptions("argument vector too long".to_string())
                })?,
                argv.as_ptr(),
                &mut error_out,
            )
        };
        let error = unsafe { self.binding.take_string(error_out) };

        if options.is_null() {
            return Err(BridgeError::InvalidOptions(
                error.unwrap_or_else(|| "option parser returned no options".to_string()),
            ));
        }
        Ok(Box::new(RawOptions {
            binding: Arc::clone(&self.binding),
            ptr: options,
        }))
    }
}

struct RawOptions {
    binding: Arc<ApiBinding>,
    ptr: *mut c_void,
}

unsafe impl Send for RawOptions {}

impl PipelineOptions for RawOptions {
    fn verify_files(&self) -> Option<String> {
        let message = unsafe { (self.binding.vtable().verify_files)(self.ptr) };
        unsafe { self.binding.take_string(message) }
    }

    fn build_pipeline(self: Box<Self>) -> Result<Box<dyn Pipeline>, BridgeError> {
        let mut error_out: *mut c_char = ptr::null_mut();
        let pipeline =
            unsafe { (self.binding.vtable().build_pipeline)(self.ptr, &mut error_out) };
        let error = unsafe { self.binding.take_string(error_out) };

        if pipeline.is_null() {
            return Err(BridgeError::Construction(
                error.unwrap_or_else(|| "pipeline factory returned no pipeline".to_string()),
            ));
        }
        Ok(Box::new(RawPipeline {
            binding: Arc::clone(&self.binding),
            ptr: pipeline,
        }))
        // self drops here and releases the options handle
    }
}

impl Drop for RawOptions {
    fn drop(&mut self) {
        unsafe { (self.binding.vtable().release_options)(self.ptr) };
    }
}

struct RawPipeline {
    binding: Arc<ApiBinding>,
    ptr: *mut c_void,
}

unsafe impl Send for RawPipeline {}

impl Pipeline for RawPipeline {
    fn analyze(&mut self, sentence: &str) -> Result<String, BridgeError> {
        let sentence = CString::new(sentence)
            .map_err(|_| BridgeError::Pipeline("sentence contains NUL byte".to_string()))?;

        let mut error_out: *mut c_char = ptr::null_mut();
        let result = unsafe {
            (self.binding.vtable().run_analysis)(self.ptr, sentence.as_ptr(), &mut error_out)
        };
        let error = unsafe { self.binding.take_string(error_out) };

        match unsafe { self.binding.take_string(result) } {
            Some(text) => Ok(text),
            None => Err(BridgeError::Pipeline(
                error.unwrap_or_else(|| "pipeline returned no result".to_string()),
            )),
        }
    }
}

impl Drop for RawPipeline {
    fn drop(&mut self) {
        unsafe { (self.binding.vtable().release_pipeline)(self.ptr) };
    }
}
