use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::path::Path;
use std::ptr;
use std::sync::{Arc, Mutex};

use crate::config::ScwsHandle;
use crate::constants::{RESULT_MEM_STEP, SCWS_RULE_JSON_FILE, SCWS_RULE_JSON_STRING};
use crate::discovery::{
    default_library_candidates, discover_default_dict_path, discover_default_library_path,
    discover_default_rule_path,
};
use crate::error::{Result, ScwsError};
use crate::model::Word;
use crate::native::{attr_to_string, DynamicLibrary, LoadedLibrary, ScwsApi, ScwsResultRaw};
use crate::types::{Charset, DictSource, RuleSpec, ScwsConfig};

/// Handle to a loaded SCWS dynamic library plus resolved function table.
///
/// This type is useful when you want explicit control over which shared
/// library is loaded, or when many instances should share one mapping.
#[derive(Clone)]
pub struct ScwsLibrary {
    inner: Arc<LoadedLibrary>,
}

impl ScwsLibrary {
    /// Loads the SCWS dynamic library from an explicit path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let library = DynamicLibrary::open(path)?;
        Self::from_library(library)
    }

    /// Loads SCWS from common platform-specific locations and caches it.
    pub fn load_default() -> Result<Self> {
        static DEFAULT_LIBRARY: Mutex<Option<Arc<LoadedLibrary>>> = Mutex::new(None);

        let mut guard = DEFAULT_LIBRARY.lock().map_err(|_| {
            ScwsError::LibraryLoad("failed to lock default library cache".to_string())
        })?;

        if let Some(inner) = guard.as_ref() {
            return Ok(Self {
                inner: inner.clone(),
            });
        }

        let loaded = Self::load_default_internal()?;
        let inner = loaded.inner;
        *guard = Some(inner.clone());
        Ok(Self { inner })
    }

    fn load_default_internal() -> Result<Self> {
        let mut errors = Vec::new();

        if let Some(path) = discover_default_library_path() {
            match Self::load(&path) {
                Ok(loaded) => return Ok(loaded),
                Err(error) => errors.push(format!("{}: {}", path.display(), error)),
            }
        }

        for candidate in default_library_candidates() {
            let library = match DynamicLibrary::open(candidate) {
                Ok(library) => library,
                Err(error) => {
                    errors.push(format!("{candidate}: {error}"));
                    continue;
                }
            };

            match Self::from_library(library) {
                Ok(loaded) => return Ok(loaded),
                Err(error) => errors.push(format!("{candidate}: {error}")),
            }
        }

        Err(ScwsError::LibraryLoad(format!(
            "set SCWS_LIBRARY_PATH to the dynamic library path. tried: {}",
            errors.join(" | ")
        )))
    }

    /// Loads from `SCWS_LIBRARY_PATH` if set, otherwise falls back to
    /// [`Self::load_default`].
    pub fn load_from_env_or_default() -> Result<Self> {
        if let Some(path) = std::env::var_os("SCWS_LIBRARY_PATH") {
            return Self::load(std::path::PathBuf::from(path));
        }
        Self::load_default()
    }

    /// Returns whether the loaded library exports the JSON rule entry point
    /// (`scws_set_rule_json`, present only in fork builds).
    pub fn supports_json_rules(&self) -> bool {
        self.inner.api.scws_set_rule_json.is_some()
    }

    fn from_library(library: DynamicLibrary) -> Result<Self> {
        let api = unsafe { ScwsApi::load(&library)? };
        Ok(Self {
            inner: Arc::new(LoadedLibrary {
                _library: library,
                api,
            }),
        })
    }

    /// Builds a library handle directly from a function table. Used by the
    /// in-crate engine stub.
    #[cfg(test)]
    pub(crate) fn from_api(api: ScwsApi) -> Self {
        Self {
            inner: Arc::new(LoadedLibrary {
                _library: DynamicLibrary::null(),
                api,
            }),
        }
    }
}

/// One configured segmentation engine instance.
///
/// The instance owns exactly one engine handle. The handle is released by
/// [`Scws::destroy`] or on drop; after `destroy`, segmentation calls fail
/// with [`ScwsError::InvalidState`].
///
/// The raw handle makes this type neither `Send` nor `Sync`: the engine
/// mutates per-call state during segmentation with no synchronization, so
/// use one instance per worker.
pub struct Scws {
    inner: Arc<LoadedLibrary>,
    handle: ScwsHandle,
    debug: bool,
}

impl Scws {
    /// Creates an instance using [`ScwsConfig::default`].
    pub fn new() -> Result<Self> {
        Self::from_config(ScwsConfig::default())
    }

    /// Creates an instance from a full [`ScwsConfig`].
    ///
    /// Configuration is applied to the fresh engine handle exactly once, in
    /// fixed order: charset, dictionaries, rule, punctuation, stop-word,
    /// multi mode. Dictionary and rule problems are logged and tolerated;
    /// only library/handle failures surface as errors.
    ///
    /// # Examples
    /// ```no_run
    /// use scws_rs::{Scws, ScwsConfig};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = ScwsConfig::default()
    ///     .with_charset_name("utf8")
    ///     .with_dict_spec("/usr/local/scws/etc/dict.utf8.xdb")
    ///     .with_ignore_punct(true);
    /// let scws = Scws::from_config(config)?;
    /// let words = scws.segment("我是中国人")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_config(config: ScwsConfig) -> Result<Self> {
        let library = match config.library_path.as_ref() {
            Some(path) => ScwsLibrary::load(path)?,
            None => ScwsLibrary::load_from_env_or_default()?,
        };
        Self::with_library(&library, config)
    }

    /// Creates an instance against an already-loaded [`ScwsLibrary`].
    pub fn with_library(library: &ScwsLibrary, config: ScwsConfig) -> Result<Self> {
        let handle = unsafe { (library.inner.api.scws_new)() };
        if handle.is_null() {
            return Err(ScwsError::Api(
                "scws_new returned a null handle".to_string(),
            ));
        }

        let instance = Self {
            inner: library.inner.clone(),
            handle,
            debug: config.debug,
        };
        instance.configure(&config)?;
        Ok(instance)
    }

    fn configure(&self, config: &ScwsConfig) -> Result<()> {
        let api = &self.inner.api;

        let charset_c = CString::new(config.charset.name())?;
        if self.debug {
            tracing::debug!(charset = config.charset.name(), "setting charset");
        }
        unsafe {
            (api.scws_set_charset)(self.handle, charset_c.as_ptr());
        }

        if config.dicts.is_empty() {
            match discover_default_dict_path(config.charset) {
                Some(path) => self.add_dict(&DictSource::from_path(path.to_string_lossy())),
                None => tracing::warn!(
                    "no dictionary configured and no default dictionary found; \
                     set SCWS_DICT_PATH"
                ),
            }
        } else {
            for dict in &config.dicts {
                self.add_dict(dict);
            }
        }

        self.apply_rule(&config.rule, config.charset);

        if config.ignore_punct {
            unsafe {
                (api.scws_set_ignore)(self.handle, 1);
            }
        }

        // Stop-word filtering is pushed in both states rather than left as
        // the engine default.
        unsafe {
            (api.scws_set_stopword)(self.handle, if config.apply_stop_word { 1 } else { 0 });
        }

        match config.multi {
            Some(multi) => {
                if self.debug {
                    tracing::debug!(multi = multi.name(), "setting multi mode");
                }
                unsafe {
                    (api.scws_set_multi)(self.handle, multi.raw() as c_int);
                }
            }
            None => {
                if self.debug {
                    tracing::debug!("multi mode not set, keeping engine default");
                }
            }
        }

        Ok(())
    }

    fn add_dict(&self, dict: &DictSource) {
        let path_c = match CString::new(dict.path.as_str()) {
            Ok(path_c) => path_c,
            Err(_) => {
                tracing::warn!(path = %dict.path, "dictionary path contains a NUL byte, skipped");
                return;
            }
        };

        if self.debug {
            tracing::debug!(path = %dict.path, mode = ?dict.mode, "loading dictionary");
        }
        let status = unsafe {
            (self.inner.api.scws_add_dict)(self.handle, path_c.as_ptr(), dict.mode.raw() as c_int)
        };
        if status < 0 {
            tracing::warn!(path = %dict.path, "failed to load dictionary");
        }
    }

    fn apply_rule(&self, rule: &RuleSpec, charset: Charset) {
        match rule {
            RuleSpec::Default => match discover_default_rule_path(charset) {
                Some(path) => {
                    if self.debug {
                        tracing::debug!(path = %path.display(), "loading default rule file");
                    }
                    self.set_rule_file(path.to_string_lossy().as_ref());
                }
                None => tracing::warn!(
                    "no rule configured and no default rule file found; set SCWS_RULE_PATH"
                ),
            },
            RuleSpec::JsonFile(path) => self.set_rule_json(path, SCWS_RULE_JSON_FILE),
            RuleSpec::IniFile(path) => self.set_rule_file(path),
            RuleSpec::JsonInline(payload) => {
                if let Err(error) = serde_json::from_str::<serde_json::Value>(payload) {
                    tracing::warn!(%error, "inline JSON rule payload is not valid JSON, skipped");
                    return;
                }
                self.set_rule_json(payload, SCWS_RULE_JSON_STRING);
            }
        }
    }

    fn set_rule_file(&self, path: &str) {
        let path_c = match CString::new(path) {
            Ok(path_c) => path_c,
            Err(_) => {
                tracing::warn!(path = %path, "rule path contains a NUL byte, skipped");
                return;
            }
        };
        if self.debug {
            tracing::debug!(path = %path, "loading rule file");
        }
        unsafe {
            (self.inner.api.scws_set_rule)(self.handle, path_c.as_ptr());
        }
    }

    fn set_rule_json(&self, spec: &str, kind: i32) {
        let Some(set_rule_json) = self.inner.api.scws_set_rule_json else {
            tracing::warn!("this libscws build lacks scws_set_rule_json, JSON rule skipped");
            return;
        };
        let spec_c = match CString::new(spec) {
            Ok(spec_c) => spec_c,
            Err(_) => {
                tracing::warn!("JSON rule spec contains a NUL byte, skipped");
                return;
            }
        };
        if self.debug {
            tracing::debug!(kind, "loading JSON rule");
        }
        unsafe {
            set_rule_json(self.handle, spec_c.as_ptr(), kind as c_int);
        }
    }

    /// Segments a UTF-8 string into words.
    ///
    /// Offsets and lengths in the returned [`Word`]s are byte positions in
    /// `text`. The call is synchronous and runs to completion.
    pub fn segment(&self, text: &str) -> Result<Vec<Word>> {
        self.segment_bytes(text.as_bytes())
    }

    /// Segments a raw byte buffer. Use this for GBK-encoded input; the
    /// returned offsets and lengths index into `text`.
    pub fn segment_bytes(&self, text: &[u8]) -> Result<Vec<Word>> {
        self.segment_with_buffer(text, ResultBuffer::new())
    }

    pub(crate) fn segment_with_buffer(
        &self,
        text: &[u8],
        mut buffer: ResultBuffer,
    ) -> Result<Vec<Word>> {
        if self.handle.is_null() {
            return Err(ScwsError::InvalidState(
                "segment called after destroy".to_string(),
            ));
        }
        if text.len() > c_int::MAX as usize {
            return Err(ScwsError::InvalidArgument(format!(
                "input must be <= {} bytes",
                c_int::MAX
            )));
        }

        let api = &self.inner.api;
        unsafe {
            (api.scws_send_text)(
                self.handle,
                text.as_ptr() as *const c_char,
                text.len() as c_int,
            );
        }

        let head = unsafe { (api.scws_get_result)(self.handle) };
        let drained = drain_result_list(head, &mut buffer);
        if !head.is_null() {
            unsafe {
                (api.scws_free_result)(head);
            }
        }
        if !drained {
            // The handle stays usable; only this call's results are lost.
            tracing::error!("failed to grow the result buffer, returning no results");
            return Ok(Vec::new());
        }

        if self.debug {
            tracing::debug!(
                bytes = text.len(),
                words = buffer.len(),
                grows = buffer.growth_events(),
                "segmented input"
            );
        }
        Ok(words_from_records(buffer.records(), text))
    }

    /// Returns whether [`Scws::destroy`] has already released the handle.
    pub fn is_destroyed(&self) -> bool {
        self.handle.is_null()
    }

    /// Releases the engine handle. Idempotent: destroying an already
    /// destroyed instance is a no-op. Subsequent `segment` calls fail with
    /// [`ScwsError::InvalidState`].
    pub fn destroy(&mut self) {
        if self.handle.is_null() {
            return;
        }
        unsafe {
            (self.inner.api.scws_free)(self.handle);
        }
        self.handle = ptr::null_mut();
    }
}

impl Drop for Scws {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Growable buffer of raw result records.
///
/// Capacity starts at one step (500 records) and is extended one step at a
/// time; growth is arithmetic, not amortized doubling. Reservations go
/// through `try_reserve_exact`, so a failed reservation aborts the drain
/// instead of aborting the process.
pub(crate) struct ResultBuffer {
    records: Vec<ScwsResultRaw>,
    step: usize,
    steps: usize,
    growth_events: usize,
    #[cfg(test)]
    pub(crate) fail_grow_at: Option<usize>,
}

impl ResultBuffer {
    pub(crate) fn new() -> Self {
        Self::with_step(RESULT_MEM_STEP)
    }

    pub(crate) fn with_step(step: usize) -> Self {
        Self {
            records: Vec::with_capacity(step),
            step,
            steps: 1,
            growth_events: 0,
            #[cfg(test)]
            fail_grow_at: None,
        }
    }

    /// Copies one record into the buffer, growing capacity by one step when
    /// the current step is full. Returns false when the reservation fails.
    pub(crate) fn push(&mut self, record: ScwsResultRaw) -> bool {
        if self.records.len() == self.step * self.steps {
            if !self.grow() {
                return false;
            }
        }
        self.records.push(record);
        true
    }

    fn grow(&mut self) -> bool {
        #[cfg(test)]
        if self.fail_grow_at == Some(self.steps) {
            return false;
        }

        let target = self.step * (self.steps + 1);
        let additional = target - self.records.len();
        if self.records.try_reserve_exact(additional).is_err() {
            return false;
        }
        self.steps += 1;
        self.growth_events += 1;
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn records(&self) -> &[ScwsResultRaw] {
        &self.records
    }

    pub(crate) fn growth_events(&self) -> usize {
        self.growth_events
    }
}

/// Walks the engine's forward-linked result list, copying every record into
/// `buffer`. Returns false when the buffer could not grow; the caller still
/// owns the list and must release it either way.
pub(crate) fn drain_result_list(head: *const ScwsResultRaw, buffer: &mut ResultBuffer) -> bool {
    let mut node = head;
    while !node.is_null() {
        let record = unsafe { *node };
        if !buffer.push(record) {
            return false;
        }
        node = record.next as *const ScwsResultRaw;
    }
    true
}

/// Projects copied records into caller-visible words by slicing each
/// record's byte span out of the input. Records whose span falls outside the
/// input are skipped rather than sliced out of bounds.
pub(crate) fn words_from_records(records: &[ScwsResultRaw], text: &[u8]) -> Vec<Word> {
    let mut words = Vec::with_capacity(records.len());
    for record in records {
        let offset = record.off as usize;
        let length = record.len as usize;
        let Some(slice) = offset
            .checked_add(length)
            .and_then(|end| text.get(offset..end))
        else {
            tracing::warn!(offset, length, "result record points outside the input, skipped");
            continue;
        };
        words.push(Word {
            word: String::from_utf8_lossy(slice).into_owned(),
            offset,
            length,
            attr: attr_to_string(&record.attr),
            idf: record.idf,
        });
    }
    words
}
