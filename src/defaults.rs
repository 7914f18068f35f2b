//! Default configuration constants for dca.
//!
//! Shared by the config layer, the CLI and the pipeline so every entry point
//! agrees on the same baseline.

/// Version digit of the DCA container format written after `"DCA"`.
pub const FORMAT_VERSION: i8 = 1;

/// Magic token at the start of a non-raw container.
pub const MAGIC: &[u8; 4] = b"DCA1";

/// Default Opus sample rate in Hz.
///
/// 48kHz is the only rate Discord consumes.
pub const SAMPLE_RATE: u32 = 48000;

/// Sample rates the Opus codec accepts.
pub const SUPPORTED_SAMPLE_RATES: [u32; 5] = [8000, 12000, 16000, 24000, 48000];

/// Default channel count (stereo).
pub const CHANNELS: u16 = 2;

/// Default frame size in samples per channel (20ms at 48kHz).
pub const FRAME_SIZE: usize = 960;

/// Legal Opus frame durations as multiples of 2.5ms (2.5ms to 60ms).
pub const FRAME_DURATION_MULTIPLES: [usize; 6] = [1, 2, 4, 8, 16, 24];

/// Default encoding bitrate in kb/s.
pub const BITRATE_KBPS: i32 = 64;

/// Lowest meaningful bitrate in kb/s.
pub const MIN_BITRATE_KBPS: i32 = 1;

/// Highest meaningful bitrate in kb/s.
pub const MAX_BITRATE_KBPS: i32 = 512;

/// Default application profile name.
pub const APPLICATION: &str = "audio";

/// Default ffmpeg volume scale (256 = unchanged).
pub const VOLUME: i32 = 256;

/// Default cover art format.
pub const COVER_FORMAT: &str = "jpeg";

/// Depth of each inter-stage queue.
///
/// Smooths short I/O stalls while bounding memory to a handful of frames.
pub const QUEUE_DEPTH: usize = 10;

/// Buffer size for buffered stdin/stdout I/O.
pub const IO_BUFFER_SIZE: usize = 16 * 1024;

/// Input name meaning "read from standard input".
pub const STDIN_INPUT: &str = "pipe:0";

/// Origin encoding reported for raw PCM read from a pipe.
pub const PIPE_ENCODING: &str = "pcm16/s16le";
