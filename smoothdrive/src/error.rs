use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not open the config file")]
    Open(#[source] std::io::Error),
    #[error("could not write the default config")]
    Write(#[source] std::io::Error),
    #[error("parsing the config failed")]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("reading the profile directory failed")]
    ReadDirectory(#[source] std::io::Error),
    #[error("could not open profile file")]
    OpenFile(#[source] std::io::Error),
    #[error("parsing the profile failed")]
    Parse(#[from] serde_json::Error),
    #[error("profile lists no vehicle models")]
    NoModels,
    #[error("profile has no gear ratios")]
    NoRatios,
    #[error("gear ratio {0} is not a finite number")]
    BadRatio(usize),
    #[error("drive max flat velocity must be positive, got {0}")]
    BadDriveMaxFlatVelocity(f32),
    #[error("speed limiter must be a finite non-negative value, got {0}")]
    BadSpeedLimiter(f32),
}

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("reading from the stream failed")]
    Read(#[source] std::io::Error),
    #[error("writing to the stream failed")]
    Write(#[source] std::io::Error),
    #[error("frame of {0} bytes exceeds the limit")]
    TooLarge(usize),
    #[error("deserializing the frame failed")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("serializing the frame failed")]
    Encode(#[from] rmp_serde::encode::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    #[error("patch {0} was never located")]
    NotLocated(String),
    #[error("writing patch {0} failed: {1}")]
    Write(String, String),
}
