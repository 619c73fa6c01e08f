/// File extensions recognized as audio assets (compared case-insensitively).
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "aac", "aif", "aiff", "flac", "m4a", "mp3", "mp4", "ogg", "opus", "wav",
];

/// Default number of decoded assets an operator keeps in memory.
pub const DEFAULT_LRU_CACHE_SIZE: usize = 2;

/// RMS below this is treated as digital silence.
pub const SILENCE_RMS_THRESHOLD: f64 = 1e-9;

/// Default cache size for operators that mix many different sounds per run.
pub const SHORT_NOISES_LRU_CACHE_SIZE: usize = 64;
