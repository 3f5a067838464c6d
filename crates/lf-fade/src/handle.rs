//! Audio-Handle Seam
//!
//! The host audio engine owns decoding and mixing; the crossfade engine
//! only issues commands against this interface and reads playback state
//! back. Every operation is fire-and-forget: decode completion, playback
//! start, and fade completion are reported to the controller by the host.

/// Playback parameters for a single handle
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRequest {
    /// Target volume (0..1, already includes all multipliers)
    pub volume: f32,
    /// Whether playback loops at the end of the asset
    pub looping: bool,
    /// Fade-in duration in milliseconds, if any
    pub fade_ms: Option<u32>,
    /// Playback offset in seconds into the asset
    pub offset: Option<f64>,
}

impl PlaybackRequest {
    pub fn new(volume: f32, looping: bool) -> Self {
        Self {
            volume,
            looping,
            fade_ms: None,
            offset: None,
        }
    }

    /// Builder: set fade-in duration
    pub fn with_fade(mut self, fade_ms: u32) -> Self {
        self.fade_ms = Some(fade_ms);
        self
    }

    /// Builder: set playback offset
    pub fn with_offset(mut self, offset: Option<f64>) -> Self {
        self.offset = offset;
        self
    }
}

/// Load parameters for a single handle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadRequest {
    /// Playback to begin the instant decoding completes, if any
    pub autoplay: Option<PlaybackRequest>,
}

impl LoadRequest {
    /// Plain load with no autoplay (preloading)
    pub fn preload() -> Self {
        Self::default()
    }

    /// Load that starts playing as soon as the asset is decoded
    pub fn autoplay(request: PlaybackRequest) -> Self {
        Self {
            autoplay: Some(request),
        }
    }
}

/// One audio playback object bound to a single source path
pub trait AudioHandle {
    /// Source path this handle plays
    fn src(&self) -> &str;

    /// Whether the asset has finished decoding
    fn loaded(&self) -> bool;

    /// Whether the handle is currently playing
    fn playing(&self) -> bool;

    /// Whether decoding failed; a failed handle is excluded from targeting
    fn failed(&self) -> bool;

    /// Current loop flag
    fn looping(&self) -> bool;

    /// Current playback volume
    fn volume(&self) -> f32;

    /// Current playback position in seconds, if playing
    fn current_time(&self) -> Option<f64>;

    /// Asset duration in seconds, once known
    fn duration(&self) -> Option<f64>;

    /// Begin (or re-issue) decoding
    fn load(&mut self, request: LoadRequest);

    /// Begin playback
    fn play(&mut self, request: PlaybackRequest);

    /// Fade volume to a target over a duration
    fn fade(&mut self, target: f32, duration_ms: u32);

    /// Stop playback and release the voice
    fn stop(&mut self);
}

/// Host constructor seam for playback handles
pub trait HandleFactory {
    /// Create a fresh, unshared handle for a source path
    fn create(&mut self, src: &str) -> Box<dyn AudioHandle>;
}
