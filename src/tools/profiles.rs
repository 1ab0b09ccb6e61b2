use crate::config::overrides::KNOWN_KEYS;

use super::format::format_profiles;
use super::response_types::ProfilesResponse;

pub fn execute() -> ProfilesResponse {
    format_profiles(KNOWN_KEYS.iter().map(|k| (*k).to_string()).collect())
}
