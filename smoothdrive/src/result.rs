use crate::error::*;
use crate::gear_profiles::GearProfile;

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type ProfileResult = Result<GearProfile, ProfileError>;
pub type ProfileListResult = Result<Vec<GearProfile>, ProfileError>;
pub type FrameResult<T> = Result<T, FrameError>;
