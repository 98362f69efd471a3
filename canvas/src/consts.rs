//! Shared numeric constants for the canvas crate.

// ── Transform ───────────────────────────────────────────────────

/// Multiplier applied by one discrete zoom-in step (divided on zoom-out).
pub const ZOOM_STEP: f64 = 1.2;

/// Controller zoom range.
pub const CONTROLLER_ZOOM_MIN: f64 = 0.1;
pub const CONTROLLER_ZOOM_MAX: f64 = 10.0;

/// Display and presenter zoom range.
pub const DISPLAY_ZOOM_MIN: f64 = 0.5;
pub const DISPLAY_ZOOM_MAX: f64 = 3.0;

// ── Stroke outline ──────────────────────────────────────────────

pub const THINNING: f64 = 0.5;
pub const SMOOTHING: f64 = 0.5;
pub const STREAMLINE: f64 = 0.5;

/// Rotation step count for round caps and sharp corners.
pub const CAP_STEPS: u32 = 13;

/// Rotation step count for the end cap.
pub const END_CAP_STEPS: u32 = 29;

/// Slightly more than π so rotated cap points never coincide.
pub const FIXED_PI: f64 = std::f64::consts::PI + 0.0001;

/// Minimum outline radius.
pub const MIN_RADIUS: f64 = 0.01;

/// Trailing stroke length (px) over which points are skipped, except the last.
pub const END_NOISE_THRESHOLD: f64 = 3.0;

/// Number of leading points used to seed simulated pressure.
pub const PRESSURE_SEED_POINTS: usize = 10;

/// Pressure change rate for simulated pressure.
pub const RATE_OF_PRESSURE_CHANGE: f64 = 0.275;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space eraser radius in pixels.
pub const HIT_RADIUS_PX: f64 = 20.0;

// ── Paint ───────────────────────────────────────────────────────

/// Highlighter fill alpha on the display and presenter.
pub const DISPLAY_HIGHLIGHTER_ALPHA: f64 = 0.3;

/// Highlighter fill alpha on the controller.
pub const CONTROLLER_HIGHLIGHTER_ALPHA: f64 = 0.5;

/// Laser glow blur radius in pixels.
pub const LASER_GLOW_PX: f64 = 15.0;

/// Translucent fill for the eraser preview circle.
pub const ERASER_PREVIEW_FILL: &str = "rgba(239, 68, 68, 0.1)";

// ── Decay ───────────────────────────────────────────────────────

/// Display laser decay: opacity step and tick interval.
pub const DISPLAY_DECAY_STEP: f64 = 0.02;
pub const DISPLAY_DECAY_INTERVAL_MS: u32 = 20;

/// Controller laser decay: opacity step and tick interval.
pub const CONTROLLER_DECAY_STEP: f64 = 0.05;
pub const CONTROLLER_DECAY_INTERVAL_MS: u32 = 30;

/// Float tolerance for the opacity-reaches-zero test.
pub const OPACITY_EPSILON: f64 = 1e-9;
