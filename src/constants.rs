// src/constants.rs

/// Command keyword of the only script line shape the core understands.
pub const REG_ADD_KEYWORD: &str = "REG ADD";

/// Comment markers recognised by the batch dialect.
pub const COMMENT_PREFIX: &str = "::";
pub const REM_KEYWORD: &str = "REM";

pub const VALUE_FLAG: &str = "/v";
pub const FORCE_FLAG: &str = "/f";

/// Separator between key path and value name in backup keys.
pub const PATH_SEPARATOR: char = '\\';

/// Line ending used when writing sanitized scripts.
pub const SCRIPT_LINE_ENDING: &str = "\r\n";

// Temporary script naming
pub const TEMP_SCRIPT_PREFIX: &str = "tweak_";
pub const TEMP_SCRIPT_SUFFIX: &str = ".bat";

// Elevated launch
pub const COMMAND_INTERPRETER: &str = "cmd.exe";
pub const ELEVATION_VERB: &str = "runas";

// Per-user storage
pub const APP_DATA_DIR_NAME: &str = "TweaksManager";
pub const STATE_FILE_NAME: &str = "tweak_states.json";
/// Appended to a state file that could not be parsed before it is set aside.
pub const CORRUPT_STATE_SUFFIX: &str = ".corrupt";
pub const TWEAKS_DIR_NAME: &str = "Tweaks";

pub const TWEAKS_DIR_ENV: &str = "TWEAKCTL_TWEAKS_DIR";
pub const STATE_FILE_ENV: &str = "TWEAKCTL_STATE_FILE";

pub const UNTITLED_TWEAK: &str = "Untitled tweak";
