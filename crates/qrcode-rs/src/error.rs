use thiserror::Error;

/// The error type shared by the encoder and decoder pipelines.
///
/// The encoder surfaces `Encoding`, `SegmentTooLong` and `DataOverCapacity`
/// to the caller immediately. The decoder treats `NotFound`, `Format` and
/// `Uncorrectable` as soft failures internally and retries (inverted image,
/// mirrored matrix) before giving up; `Domain` and `EndOfStream` indicate a
/// bug or input that slipped past earlier validation and abort the call.
///
/// Ways to handle a capacity error include:
///
/// - Decrease the error correction level if it was greater than `CodeEcc::Low`.
/// - If `encode_segments_advanced()` was called, increase the maxversion
///   argument if it was less than `Version::MAX`.
/// - Change the text or binary data to be shorter, or to fit the character
///   set of a denser segment mode (e.g. alphanumeric).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum QrError {
    /// A character falls outside the chosen segment mode's alphabet, or a
    /// Kanji payload is not representable in Shift-JIS.
    #[error("not encodable in {mode} mode: {reason}")]
    Encoding { mode: &'static str, reason: String },

    /// A single segment has more characters than its count field can hold.
    #[error("segment too long")]
    SegmentTooLong,

    /// The payload does not fit any version in the requested range.
    #[error("data length = {datalen} bits, max capacity = {maxcapacity} bits")]
    DataOverCapacity { datalen: usize, maxcapacity: usize },

    /// log(0), inv(0), or a mis-sized coefficient array.
    #[error("GF(256) domain error: {0}")]
    Domain(&'static str),

    /// A bit-stream read past the available bits.
    #[error("bit stream exhausted: wanted {wanted} bits, {available} available")]
    EndOfStream { wanted: usize, available: usize },

    /// Format or version info beyond correctable Hamming distance, or an
    /// unknown mode indicator.
    #[error("format error: {0}")]
    Format(&'static str),

    /// Reed-Solomon failure: too many errors or an ambiguous key equation.
    #[error("uncorrectable block")]
    Uncorrectable,

    /// No finder triple located, module size under 1 pixel, or a
    /// non-invertible sampling transform.
    #[error("no QR symbol found")]
    NotFound,
}
