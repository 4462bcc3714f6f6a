//! Central configuration constants for runtime limits and defaults.

/// Language codes the wizard offers as translation targets, plus the
/// default source language. Providers may support more; the wizard
/// treats this as the closed set.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "en", "es", "fr", "de", "pt", "it", "hi", "zh", "ja", "ko", "ar", "sw",
];

/// Default source (primary) language code.
pub const DEFAULT_SOURCE_LANGUAGE: &str = "en";

/// Combined cap on undo + redo snapshots per draft.
pub const MAX_HISTORY_SNAPSHOTS: usize = 50;

/// Seconds before an in-flight provider call is abandoned and the job
/// fails with a timeout.
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 120;

/// Default narration voice.
pub const DEFAULT_VOICE: &str = "narrator-1";

/// Default speech speed multiplier.
pub const DEFAULT_VOICE_SPEED: f32 = 1.0;

/// Minimum allowed speech speed multiplier.
pub const MIN_VOICE_SPEED: f32 = 0.5;

/// Maximum allowed speech speed multiplier.
pub const MAX_VOICE_SPEED: f32 = 2.0;

/// Convenience function to clamp a speed value into allowed range.
pub fn clamp_voice_speed(v: f32) -> f32 {
    v.clamp(MIN_VOICE_SPEED, MAX_VOICE_SPEED)
}

/// Whether a language code is one the wizard offers.
pub fn is_supported_language(code: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&code)
}
