/// Prefix for environment variables that override [`crate::config::BuildConfig`].
pub const ENV_PREFIX: &str = "LMPCROSS_";

pub const DEFAULT_THIRDPARTY_URL: &str = "http://download.lammps.org/thirdparty";
pub const DEFAULT_SOURCE_URL: &str = "https://github.com/lammps/lammps/archive";

pub const EIGEN_VERSION: &str = "3.3.4";
pub const VORO_VERSION: &str = "0.4.6";

/// Name of the subdirectory next to the executable holding `<component>.patch` files.
pub const PATCH_DIR_NAME: &str = "patches";
