//! Constants mirrored from SCWS C API option and flag values.

/// Dictionary mode: indexed binary xdb file.
pub const SCWS_XDICT_XDB: i32 = 1;
/// Dictionary mode: in-memory dictionary.
pub const SCWS_XDICT_MEM: i32 = 2;
/// Dictionary mode: plain text file.
pub const SCWS_XDICT_TXT: i32 = 4;

/// Multi-segmentation disabled.
pub const SCWS_MULTI_NONE: i32 = 0x00000;
/// Multi-segmentation: prefer short words.
pub const SCWS_MULTI_SHORT: i32 = 0x01000;
/// Multi-segmentation: split into two-character duality words.
pub const SCWS_MULTI_DUALITY: i32 = 0x02000;
/// Multi-segmentation: emit main single characters.
pub const SCWS_MULTI_ZMAIN: i32 = 0x04000;
/// Multi-segmentation: emit all single characters.
pub const SCWS_MULTI_ZALL: i32 = 0x08000;

/// JSON rule kind: the rule spec is a file path.
pub const SCWS_RULE_JSON_FILE: i32 = 1;
/// JSON rule kind: the rule spec is an inline JSON payload.
pub const SCWS_RULE_JSON_STRING: i32 = 2;

/// Result buffer growth step, in records.
pub(crate) const RESULT_MEM_STEP: usize = 500;
/// Maximum length of one dictionary path segment, in bytes.
pub(crate) const MAX_DICT_PATH_LEN: usize = 1024;
