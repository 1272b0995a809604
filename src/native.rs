use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_float, c_int, c_uchar, c_void};
use std::path::Path;
use std::ptr;

use crate::config::ScwsHandle;
use crate::error::{Result, ScwsError};

/// Raw result record mirroring `struct scws_result` from `scws.h`.
///
/// The engine hands back a forward-linked list of these; `off`/`len` are
/// byte positions in the text fed through `scws_send_text`.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScwsResultRaw {
    pub(crate) off: c_int,
    pub(crate) idf: c_float,
    pub(crate) len: c_uchar,
    pub(crate) attr: [c_char; 3],
    pub(crate) next: *mut ScwsResultRaw,
}

type FnScwsNew = unsafe extern "C" fn() -> ScwsHandle;
type FnScwsFree = unsafe extern "C" fn(ScwsHandle);
type FnScwsSetCharset = unsafe extern "C" fn(ScwsHandle, *const c_char);
type FnScwsAddDict = unsafe extern "C" fn(ScwsHandle, *const c_char, c_int) -> c_int;
type FnScwsSetRule = unsafe extern "C" fn(ScwsHandle, *const c_char);
type FnScwsSetRuleJson = unsafe extern "C" fn(ScwsHandle, *const c_char, c_int);
type FnScwsSetIgnore = unsafe extern "C" fn(ScwsHandle, c_int);
type FnScwsSetStopword = unsafe extern "C" fn(ScwsHandle, c_int);
type FnScwsSetMulti = unsafe extern "C" fn(ScwsHandle, c_int);
type FnScwsSendText = unsafe extern "C" fn(ScwsHandle, *const c_char, c_int);
type FnScwsGetResult = unsafe extern "C" fn(ScwsHandle) -> *mut ScwsResultRaw;
type FnScwsFreeResult = unsafe extern "C" fn(*mut ScwsResultRaw);

#[derive(Clone, Copy)]
pub(crate) struct ScwsApi {
    pub(crate) scws_new: FnScwsNew,
    pub(crate) scws_free: FnScwsFree,
    pub(crate) scws_set_charset: FnScwsSetCharset,
    pub(crate) scws_add_dict: FnScwsAddDict,
    pub(crate) scws_set_rule: FnScwsSetRule,
    pub(crate) scws_set_rule_json: Option<FnScwsSetRuleJson>,
    pub(crate) scws_set_ignore: FnScwsSetIgnore,
    pub(crate) scws_set_stopword: FnScwsSetStopword,
    pub(crate) scws_set_multi: FnScwsSetMulti,
    pub(crate) scws_send_text: FnScwsSendText,
    pub(crate) scws_get_result: FnScwsGetResult,
    pub(crate) scws_free_result: FnScwsFreeResult,
}

impl ScwsApi {
    pub(crate) unsafe fn load(library: &DynamicLibrary) -> Result<Self> {
        Ok(Self {
            scws_new: library.load_symbol("scws_new")?,
            scws_free: library.load_symbol("scws_free")?,
            scws_set_charset: library.load_symbol("scws_set_charset")?,
            scws_add_dict: library.load_symbol("scws_add_dict")?,
            scws_set_rule: library.load_symbol("scws_set_rule")?,
            // Only fork builds of libscws export the JSON rule entry point.
            scws_set_rule_json: library.load_symbol_optional("scws_set_rule_json")?,
            scws_set_ignore: library.load_symbol("scws_set_ignore")?,
            scws_set_stopword: library.load_symbol("scws_set_stopword")?,
            scws_set_multi: library.load_symbol("scws_set_multi")?,
            scws_send_text: library.load_symbol("scws_send_text")?,
            scws_get_result: library.load_symbol("scws_get_result")?,
            scws_free_result: library.load_symbol("scws_free_result")?,
        })
    }
}

pub(crate) struct LoadedLibrary {
    pub(crate) _library: DynamicLibrary,
    pub(crate) api: ScwsApi,
}

#[derive(Debug)]
pub(crate) struct DynamicLibrary {
    handle: *mut c_void,
}

// The handle names a process-global library mapping; it is only used for
// symbol resolution and a single close. Engine instance handles are NOT
// shared this way and keep their types `!Send`.
unsafe impl Send for DynamicLibrary {}
unsafe impl Sync for DynamicLibrary {}

impl DynamicLibrary {
    pub(crate) fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_string = path.as_ref().to_string_lossy().to_string();
        let path_c = CString::new(path_string.clone())?;
        let handle = unsafe { platform_open(path_c.as_ptr()) };
        if handle.is_null() {
            return Err(ScwsError::LibraryLoad(format!(
                "{} ({})",
                path_string,
                platform_last_error()
            )));
        }
        Ok(Self { handle })
    }

    /// Placeholder library used by the in-crate engine stub. Never dlopened,
    /// so `Drop` sees a null handle and does nothing.
    #[cfg(test)]
    pub(crate) fn null() -> Self {
        Self {
            handle: ptr::null_mut(),
        }
    }

    pub(crate) unsafe fn load_symbol<T: Copy>(&self, symbol_name: &str) -> Result<T> {
        let symbol_c = CString::new(symbol_name)?;
        let symbol_ptr = platform_symbol(self.handle, symbol_c.as_ptr());
        if symbol_ptr.is_null() {
            return Err(ScwsError::SymbolLoad(format!(
                "{} ({})",
                symbol_name,
                platform_last_error()
            )));
        }
        Ok(std::mem::transmute_copy::<*mut c_void, T>(&symbol_ptr))
    }

    pub(crate) unsafe fn load_symbol_optional<T: Copy>(
        &self,
        symbol_name: &str,
    ) -> Result<Option<T>> {
        let symbol_c = CString::new(symbol_name)?;
        let symbol_ptr = platform_symbol(self.handle, symbol_c.as_ptr());
        if symbol_ptr.is_null() {
            return Ok(None);
        }
        Ok(Some(std::mem::transmute_copy::<*mut c_void, T>(
            &symbol_ptr,
        )))
    }
}

impl Drop for DynamicLibrary {
    fn drop(&mut self) {
        if self.handle.is_null() {
            return;
        }
        unsafe {
            platform_close(self.handle);
        }
        self.handle = ptr::null_mut();
    }
}

/// Decodes the fixed 3-byte attribute field of a result record. The engine
/// writes at most two attribute characters followed by a NUL.
pub(crate) fn attr_to_string(attr: &[c_char; 3]) -> String {
    let bytes: Vec<u8> = attr
        .iter()
        .map(|value| *value as u8)
        .take_while(|value| *value != 0)
        .collect();
    String::from_utf8_lossy(&bytes).to_string()
}

#[cfg(target_os = "windows")]
#[link(name = "kernel32")]
extern "system" {
    fn LoadLibraryA(lp_lib_file_name: *const c_char) -> *mut c_void;
    fn GetProcAddress(h_module: *mut c_void, lp_proc_name: *const c_char) -> *mut c_void;
    fn FreeLibrary(h_lib_module: *mut c_void) -> i32;
    fn GetLastError() -> u32;
}

#[cfg(target_os = "windows")]
unsafe fn platform_open(path: *const c_char) -> *mut c_void {
    LoadLibraryA(path)
}

#[cfg(target_os = "windows")]
unsafe fn platform_symbol(handle: *mut c_void, symbol: *const c_char) -> *mut c_void {
    GetProcAddress(handle, symbol)
}

#[cfg(target_os = "windows")]
unsafe fn platform_close(handle: *mut c_void) {
    let _ = FreeLibrary(handle);
}

#[cfg(target_os = "windows")]
fn platform_last_error() -> String {
    format!("GetLastError={}", unsafe { GetLastError() })
}

#[cfg(target_os = "linux")]
#[link(name = "dl")]
extern "C" {
    fn dlopen(filename: *const c_char, flags: c_int) -> *mut c_void;
    fn dlsym(handle: *mut c_void, symbol: *const c_char) -> *mut c_void;
    fn dlclose(handle: *mut c_void) -> c_int;
    fn dlerror() -> *const c_char;
}

#[cfg(target_os = "macos")]
extern "C" {
    fn dlopen(filename: *const c_char, flags: c_int) -> *mut c_void;
    fn dlsym(handle: *mut c_void, symbol: *const c_char) -> *mut c_void;
    fn dlclose(handle: *mut c_void) -> c_int;
    fn dlerror() -> *const c_char;
}

#[cfg(unix)]
unsafe fn platform_open(path: *const c_char) -> *mut c_void {
    const RTLD_NOW: c_int = 2;
    const RTLD_LOCAL: c_int = 0;
    dlopen(path, RTLD_NOW | RTLD_LOCAL)
}

#[cfg(unix)]
unsafe fn platform_symbol(handle: *mut c_void, symbol: *const c_char) -> *mut c_void {
    dlsym(handle, symbol)
}

#[cfg(unix)]
unsafe fn platform_close(handle: *mut c_void) {
    let _ = dlclose(handle);
}

#[cfg(unix)]
fn platform_last_error() -> String {
    let pointer = unsafe { dlerror() };
    if pointer.is_null() {
        "unknown error".to_string()
    } else {
        unsafe { CStr::from_ptr(pointer) }
            .to_string_lossy()
            .to_string()
    }
}
