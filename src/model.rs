/// One segmented word projected from an engine result record.
///
/// `offset` and `length` are byte positions in the exact byte sequence fed
/// to the engine for the producing `segment` call. For UTF-8 input `word` is
/// the exact substring; for GBK input passed through
/// [`crate::Scws::segment_bytes`] it is a lossy UTF-8 rendering and the
/// offsets against the caller's buffer are authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    /// Word text sliced from the input.
    pub word: String,
    /// Byte offset of the word in the input.
    pub offset: usize,
    /// Byte length of the word in the input.
    pub length: usize,
    /// Attribute tag reported by the engine (part-of-speech or dictionary
    /// class, e.g. `n`, `v`, `en`).
    pub attr: String,
    /// Inverse document frequency score reported by the engine.
    pub idf: f32,
}
