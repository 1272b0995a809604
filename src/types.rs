use std::env;
use std::path::{Path, PathBuf};

use crate::constants::{
    MAX_DICT_PATH_LEN, SCWS_MULTI_DUALITY, SCWS_MULTI_SHORT, SCWS_MULTI_ZALL, SCWS_MULTI_ZMAIN,
    SCWS_XDICT_TXT, SCWS_XDICT_XDB,
};

/// Text encoding understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// UTF-8 encoded text (default).
    #[default]
    Utf8,
    /// GBK encoded text.
    Gbk,
}

impl Charset {
    /// Parses a charset name. Both `utf8` and `gbk` are accepted; anything
    /// else warns and falls back to UTF-8.
    pub fn parse(name: &str) -> Self {
        match name {
            "utf8" => Charset::Utf8,
            "gbk" => Charset::Gbk,
            other => {
                tracing::warn!(charset = %other, "unrecognized charset, defaulting to utf8");
                Charset::Utf8
            }
        }
    }

    /// Name passed to `scws_set_charset`.
    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "utf8",
            Charset::Gbk => "gbk",
        }
    }
}

/// Load mode of one dictionary source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictMode {
    /// Plain text dictionary file.
    Text,
    /// Indexed binary xdb dictionary file.
    IndexedBinary,
}

impl DictMode {
    /// Infers the mode from a path: anything containing `.txt` loads as
    /// text, everything else as indexed binary.
    pub fn infer(path: &str) -> Self {
        if path.contains(".txt") {
            DictMode::Text
        } else {
            DictMode::IndexedBinary
        }
    }

    pub(crate) fn raw(self) -> i32 {
        match self {
            DictMode::Text => SCWS_XDICT_TXT,
            DictMode::IndexedBinary => SCWS_XDICT_XDB,
        }
    }
}

/// One dictionary to load into the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictSource {
    /// Path handed to `scws_add_dict`.
    pub path: String,
    /// Load mode for this path.
    pub mode: DictMode,
}

impl DictSource {
    /// Creates a source with an explicit mode.
    pub fn new(path: impl Into<String>, mode: DictMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    /// Creates a source with the mode inferred from the path.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let mode = DictMode::infer(&path);
        Self { path, mode }
    }

    /// Splits a `:`-separated dictionary specification into sources, left to
    /// right. Empty segments are skipped (a trailing `:` yields no extra
    /// path) and segments longer than 1024 bytes are truncated at a UTF-8
    /// boundary with a warning.
    pub fn parse_spec(spec: &str) -> Vec<Self> {
        spec.split(':')
            .filter(|segment| !segment.is_empty())
            .map(|segment| Self::from_path(truncated_path_segment(segment)))
            .collect()
    }
}

fn truncated_path_segment(segment: &str) -> &str {
    if segment.len() <= MAX_DICT_PATH_LEN {
        return segment;
    }
    let mut end = MAX_DICT_PATH_LEN;
    while !segment.is_char_boundary(end) {
        end -= 1;
    }
    let truncated = &segment[..end];
    tracing::warn!(
        limit = MAX_DICT_PATH_LEN,
        path = %truncated,
        "dictionary path segment exceeds the length cap, truncated"
    );
    truncated
}

/// Segmentation rule source for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RuleSpec {
    /// Use the discovered default rule file.
    #[default]
    Default,
    /// JSON rule file path, loaded via `scws_set_rule_json`.
    JsonFile(String),
    /// INI rule file path, loaded via `scws_set_rule`.
    IniFile(String),
    /// Inline JSON rule payload.
    JsonInline(String),
}

impl RuleSpec {
    /// Classifies a loosely-typed rule string. Tested in order: a name
    /// containing `.json` is a JSON rule file; a name containing `.ini`
    /// (anywhere, including position 0) is an INI rule file; anything else
    /// is treated as an inline JSON payload.
    pub fn infer(spec: &str) -> Self {
        if spec.contains(".json") {
            RuleSpec::JsonFile(spec.to_string())
        } else if spec.contains(".ini") {
            RuleSpec::IniFile(spec.to_string())
        } else {
            RuleSpec::JsonInline(spec.to_string())
        }
    }
}

/// Strategy for secondary segmentation of ambiguous or compound words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiMode {
    /// Prefer short words.
    Short,
    /// Split into two-character duality words.
    Duality,
    /// Emit main single characters.
    Zmain,
    /// Emit all single characters.
    Zall,
}

impl MultiMode {
    /// Parses a multi-mode name. Unknown names warn and fall back to
    /// [`MultiMode::Short`]; leave the field unset to keep the engine
    /// default instead.
    pub fn parse(name: &str) -> Self {
        match name {
            "short" => MultiMode::Short,
            "duality" => MultiMode::Duality,
            "zmain" => MultiMode::Zmain,
            "zall" => MultiMode::Zall,
            other => {
                tracing::warn!(multi = %other, "unrecognized multi mode, defaulting to short");
                MultiMode::Short
            }
        }
    }

    /// Name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            MultiMode::Short => "short",
            MultiMode::Duality => "duality",
            MultiMode::Zmain => "zmain",
            MultiMode::Zall => "zall",
        }
    }

    pub(crate) fn raw(self) -> i32 {
        match self {
            MultiMode::Short => SCWS_MULTI_SHORT,
            MultiMode::Duality => SCWS_MULTI_DUALITY,
            MultiMode::Zmain => SCWS_MULTI_ZMAIN,
            MultiMode::Zall => SCWS_MULTI_ZALL,
        }
    }
}

/// Configuration consumed once by [`crate::Scws::from_config`].
///
/// All flags are typed `bool`; there is no host-truthiness coercion at this
/// boundary. Configuration is applied to the engine exactly once, in a fixed
/// order: charset, dictionaries, rule, punctuation, stop-word, multi mode.
#[derive(Debug, Clone)]
pub struct ScwsConfig {
    /// Explicit dynamic library path; `None` falls back to
    /// `SCWS_LIBRARY_PATH` and then the platform candidates.
    pub library_path: Option<PathBuf>,
    /// Per-instance diagnostics. When true, configuration steps and
    /// per-call statistics are emitted as `debug`-level tracing events.
    pub debug: bool,
    /// Text encoding; defaults to UTF-8.
    pub charset: Charset,
    /// Ordered dictionary sources. Empty means the discovered default
    /// dictionary for the configured charset.
    pub dicts: Vec<DictSource>,
    /// Segmentation rule source.
    pub rule: RuleSpec,
    /// Exclude punctuation from segmentation results.
    pub ignore_punct: bool,
    /// Filter stop-words from results. Pushed to the engine in both states,
    /// never left as the collaborator default.
    pub apply_stop_word: bool,
    /// Multi-segmentation strategy; `None` keeps the engine default.
    pub multi: Option<MultiMode>,
}

impl Default for ScwsConfig {
    fn default() -> Self {
        Self {
            library_path: env::var_os("SCWS_LIBRARY_PATH").map(PathBuf::from),
            debug: false,
            charset: Charset::default(),
            dicts: Vec::new(),
            rule: RuleSpec::default(),
            ignore_punct: false,
            apply_stop_word: false,
            multi: None,
        }
    }
}

impl ScwsConfig {
    /// Sets an explicit dynamic library path.
    pub fn with_library_path(mut self, library_path: impl AsRef<Path>) -> Self {
        self.library_path = Some(library_path.as_ref().to_path_buf());
        self
    }

    /// Enables per-instance debug diagnostics.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sets the text encoding.
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Sets the text encoding from a loosely-typed name, warning and
    /// defaulting to UTF-8 on unrecognized values.
    pub fn with_charset_name(self, name: &str) -> Self {
        let charset = Charset::parse(name);
        self.with_charset(charset)
    }

    /// Replaces the dictionary list with sources parsed from a
    /// `:`-separated specification string.
    pub fn with_dict_spec(mut self, spec: &str) -> Self {
        self.dicts = DictSource::parse_spec(spec);
        self
    }

    /// Appends one dictionary source.
    pub fn add_dict(mut self, path: impl Into<String>, mode: DictMode) -> Self {
        self.dicts.push(DictSource::new(path, mode));
        self
    }

    /// Sets the rule source explicitly.
    pub fn with_rule(mut self, rule: RuleSpec) -> Self {
        self.rule = rule;
        self
    }

    /// Sets the rule source from a loosely-typed string via
    /// [`RuleSpec::infer`].
    pub fn with_rule_spec(self, spec: &str) -> Self {
        let rule = RuleSpec::infer(spec);
        self.with_rule(rule)
    }

    /// Toggles punctuation filtering.
    pub fn with_ignore_punct(mut self, ignore_punct: bool) -> Self {
        self.ignore_punct = ignore_punct;
        self
    }

    /// Toggles stop-word filtering.
    pub fn with_apply_stop_word(mut self, apply_stop_word: bool) -> Self {
        self.apply_stop_word = apply_stop_word;
        self
    }

    /// Sets the multi-segmentation strategy.
    pub fn with_multi(mut self, multi: MultiMode) -> Self {
        self.multi = Some(multi);
        self
    }

    /// Sets the multi-segmentation strategy from a loosely-typed name via
    /// [`MultiMode::parse`].
    pub fn with_multi_name(self, name: &str) -> Self {
        let multi = MultiMode::parse(name);
        self.with_multi(multi)
    }
}
