use std::env;
use std::ffi::{CStr, OsString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::slice;
use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::config::ScwsHandle;
use crate::native::{ScwsApi, ScwsResultRaw};
use crate::runtime::ScwsLibrary;

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn set_env_var(key: &str, value: &str) {
    #[allow(unused_unsafe)]
    unsafe {
        env::set_var(key, value);
    }
}

fn remove_env_var(key: &str) {
    #[allow(unused_unsafe)]
    unsafe {
        env::remove_var(key);
    }
}

/// Runs a closure with one overridden environment variable.
pub(crate) fn with_env_var<T>(key: &str, value: &str, f: impl FnOnce() -> T) -> T {
    with_env_vars(&[(key, Some(value))], f)
}

/// Runs a closure while holding a global environment lock and applying overrides.
pub(crate) fn with_env_vars<T>(overrides: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
    let _guard = env_lock()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let backups: Vec<(&str, Option<OsString>)> = overrides
        .iter()
        .map(|(key, _)| (*key, env::var_os(key)))
        .collect();

    for (key, value) in overrides {
        match value {
            Some(value) => set_env_var(key, value),
            None => remove_env_var(key),
        }
    }

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

    for (key, value) in backups.into_iter().rev() {
        match value {
            Some(value) => {
                #[allow(unused_unsafe)]
                unsafe {
                    env::set_var(key, value);
                }
            }
            None => remove_env_var(key),
        }
    }

    match result {
        Ok(result) => result,
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

/// One preset result record served by the stub engine.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StubRecord {
    pub(crate) off: i32,
    pub(crate) len: u8,
    pub(crate) attr: &'static str,
    pub(crate) idf: f32,
}

struct ResultAllocation {
    head: usize,
    _nodes: Box<[ScwsResultRaw]>,
}

// The nodes only point into their own boxed slice, which lives exactly as
// long as the allocation entry.
unsafe impl Send for ResultAllocation {}

/// Recording state behind the stub engine's function table.
#[derive(Default)]
pub(crate) struct StubState {
    pub(crate) charsets: Vec<String>,
    pub(crate) dicts: Vec<(String, i32)>,
    pub(crate) rule_files: Vec<String>,
    pub(crate) json_rules: Vec<(String, i32)>,
    pub(crate) ignore_calls: Vec<i32>,
    pub(crate) stopword_calls: Vec<i32>,
    pub(crate) multi_calls: Vec<i32>,
    pub(crate) fed: Vec<Vec<u8>>,
    pub(crate) results: Vec<StubRecord>,
    pub(crate) fail_dicts: Vec<String>,
    pub(crate) created_handles: usize,
    pub(crate) freed_handles: usize,
    pub(crate) freed_result_lists: usize,
    pub(crate) calls: Vec<&'static str>,
    allocations: Vec<ResultAllocation>,
}

fn state() -> &'static Mutex<StubState> {
    static STATE: OnceLock<Mutex<StubState>> = OnceLock::new();
    STATE.get_or_init(|| Mutex::new(StubState::default()))
}

fn lock_state() -> MutexGuard<'static, StubState> {
    state()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn stub_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn cstr_lossy(pointer: *const c_char) -> String {
    if pointer.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(pointer) }
        .to_string_lossy()
        .to_string()
}

fn encode_attr(attr: &str) -> [c_char; 3] {
    let mut encoded = [0 as c_char; 3];
    for (slot, byte) in encoded.iter_mut().take(2).zip(attr.bytes()) {
        *slot = byte as c_char;
    }
    encoded
}

/// Builds a forward-linked list from preset records. The returned head
/// pointer stays valid for as long as the boxed slice is kept alive.
pub(crate) fn build_result_list(
    records: &[StubRecord],
) -> (*mut ScwsResultRaw, Box<[ScwsResultRaw]>) {
    let nodes: Vec<ScwsResultRaw> = records
        .iter()
        .map(|record| ScwsResultRaw {
            off: record.off,
            idf: record.idf,
            len: record.len,
            attr: encode_attr(record.attr),
            next: ptr::null_mut(),
        })
        .collect();
    let mut nodes = nodes.into_boxed_slice();

    let base = nodes.as_mut_ptr();
    for index in 1..nodes.len() {
        unsafe {
            (*base.add(index - 1)).next = base.add(index);
        }
    }

    let head = if nodes.is_empty() {
        ptr::null_mut()
    } else {
        base
    };
    (head, nodes)
}

unsafe extern "C" fn stub_new() -> ScwsHandle {
    let mut state = lock_state();
    state.calls.push("new");
    state.created_handles += 1;
    state.created_handles as ScwsHandle
}

unsafe extern "C" fn stub_free(_handle: ScwsHandle) {
    let mut state = lock_state();
    state.calls.push("free");
    state.freed_handles += 1;
}

unsafe extern "C" fn stub_set_charset(_handle: ScwsHandle, name: *const c_char) {
    let name = cstr_lossy(name);
    let mut state = lock_state();
    state.calls.push("set_charset");
    state.charsets.push(name);
}

unsafe extern "C" fn stub_add_dict(_handle: ScwsHandle, path: *const c_char, mode: c_int) -> c_int {
    let path = cstr_lossy(path);
    let mut state = lock_state();
    state.calls.push("add_dict");
    let failed = state.fail_dicts.contains(&path);
    state.dicts.push((path, mode));
    if failed {
        -1
    } else {
        0
    }
}

unsafe extern "C" fn stub_set_rule(_handle: ScwsHandle, path: *const c_char) {
    let path = cstr_lossy(path);
    let mut state = lock_state();
    state.calls.push("set_rule");
    state.rule_files.push(path);
}

unsafe extern "C" fn stub_set_rule_json(_handle: ScwsHandle, spec: *const c_char, kind: c_int) {
    let spec = cstr_lossy(spec);
    let mut state = lock_state();
    state.calls.push("set_rule_json");
    state.json_rules.push((spec, kind));
}

unsafe extern "C" fn stub_set_ignore(_handle: ScwsHandle, yes: c_int) {
    let mut state = lock_state();
    state.calls.push("set_ignore");
    state.ignore_calls.push(yes);
}

unsafe extern "C" fn stub_set_stopword(_handle: ScwsHandle, yes: c_int) {
    let mut state = lock_state();
    state.calls.push("set_stopword");
    state.stopword_calls.push(yes);
}

unsafe extern "C" fn stub_set_multi(_handle: ScwsHandle, mode: c_int) {
    let mut state = lock_state();
    state.calls.push("set_multi");
    state.multi_calls.push(mode);
}

unsafe extern "C" fn stub_send_text(_handle: ScwsHandle, text: *const c_char, length: c_int) {
    let bytes = if text.is_null() || length <= 0 {
        Vec::new()
    } else {
        slice::from_raw_parts(text as *const u8, length as usize).to_vec()
    };
    let mut state = lock_state();
    state.calls.push("send_text");
    state.fed.push(bytes);
}

unsafe extern "C" fn stub_get_result(_handle: ScwsHandle) -> *mut ScwsResultRaw {
    let mut state = lock_state();
    state.calls.push("get_result");
    if state.results.is_empty() {
        return ptr::null_mut();
    }
    let records = state.results.clone();
    let (head, nodes) = build_result_list(&records);
    state.allocations.push(ResultAllocation {
        head: head as usize,
        _nodes: nodes,
    });
    head
}

unsafe extern "C" fn stub_free_result(list: *mut ScwsResultRaw) {
    let mut state = lock_state();
    state.calls.push("free_result");
    let key = list as usize;
    let before = state.allocations.len();
    state.allocations.retain(|allocation| allocation.head != key);
    if state.allocations.len() < before {
        state.freed_result_lists += 1;
    }
}

fn stub_api() -> ScwsApi {
    ScwsApi {
        scws_new: stub_new,
        scws_free: stub_free,
        scws_set_charset: stub_set_charset,
        scws_add_dict: stub_add_dict,
        scws_set_rule: stub_set_rule,
        scws_set_rule_json: Some(stub_set_rule_json),
        scws_set_ignore: stub_set_ignore,
        scws_set_stopword: stub_set_stopword,
        scws_set_multi: stub_set_multi,
        scws_send_text: stub_send_text,
        scws_get_result: stub_get_result,
        scws_free_result: stub_free_result,
    }
}

/// Runs a closure against a freshly reset stub engine and returns the
/// closure result together with the final recorded state. Stub tests are
/// serialized on a global lock; create instances inside the closure so they
/// are dropped before the state snapshot is taken.
pub(crate) fn with_stub_engine<T>(
    setup: impl FnOnce(&mut StubState),
    run: impl FnOnce(ScwsLibrary) -> T,
) -> (T, StubState) {
    with_stub_api(stub_api(), setup, run)
}

/// Same as [`with_stub_engine`] but with a table lacking the optional
/// `scws_set_rule_json` entry point.
pub(crate) fn with_stub_engine_without_json_rules<T>(
    setup: impl FnOnce(&mut StubState),
    run: impl FnOnce(ScwsLibrary) -> T,
) -> (T, StubState) {
    let mut api = stub_api();
    api.scws_set_rule_json = None;
    with_stub_api(api, setup, run)
}

fn with_stub_api<T>(
    api: ScwsApi,
    setup: impl FnOnce(&mut StubState),
    run: impl FnOnce(ScwsLibrary) -> T,
) -> (T, StubState) {
    let _guard = stub_lock()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    {
        let mut state = lock_state();
        *state = StubState::default();
        setup(&mut state);
    }

    let library = ScwsLibrary::from_api(api);
    let result = run(library);

    let final_state = std::mem::take(&mut *lock_state());
    (result, final_state)
}
