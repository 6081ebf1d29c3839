use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `couponwatch`.
///
/// Each pipeline stage defines its own error type. The scheduler matches on
/// these to decide whether a failure is per-record, per-message, per-run or
/// fatal; the binary edge uses `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum CouponError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Fetcher ─────────────────────────────────────────────────────────
    #[error("fetch: {0}")]
    Fetch(#[from] FetchError),

    // ── Parser ──────────────────────────────────────────────────────────
    #[error("parse: {0}")]
    Parse(#[from] ParseError),

    // ── Notifier / Channel ──────────────────────────────────────────────
    #[error("notify: {0}")]
    Notify(#[from] NotifierError),

    // ── Dedup store ─────────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("missing required environment variable {0}")]
    MissingEnv(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Fetcher errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("invalid url {0}")]
    InvalidUrl(String),
}

// ─── Parser errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("listing has no {0}")]
    MissingField(&'static str),

    #[error("listing link {href} is not a usable url: {reason}")]
    InvalidUrl { href: String, reason: String },
}

// ─── Notifier errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("channel {channel} rejected credentials (HTTP {status})")]
    Auth { channel: String, status: u16 },

    #[error("channel {channel} API error (HTTP {status}): {body}")]
    Api {
        channel: String,
        status: u16,
        body: String,
    },

    #[error("channel {channel} request failed: {message}")]
    Network { channel: String, message: String },

    #[error("message render failed: {0}")]
    Render(String),
}

// ─── Store errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize: {0}")]
    Serialize(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, CouponError>;
