//! Encounter loading.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use horde_core::EncounterConfig;

const BUILT_IN_ENCOUNTER: &str = include_str!("../assets/encounter.toml");

/// Reads, parses and validates an encounter, falling back to the built-in one.
pub(crate) fn load(path: Option<&Path>) -> Result<EncounterConfig> {
    let (source, origin) = match path {
        Some(path) => (
            fs::read_to_string(path)
                .with_context(|| format!("failed to read encounter {}", path.display()))?,
            path.display().to_string(),
        ),
        None => (BUILT_IN_ENCOUNTER.to_owned(), "built-in encounter".to_owned()),
    };

    let config: EncounterConfig =
        toml::from_str(&source).with_context(|| format!("failed to parse {origin}"))?;
    config
        .validate()
        .with_context(|| format!("{origin} is invalid"))?;

    log::info!(
        "loaded {origin}: {} archetypes, {} waves, {} perks",
        config.archetypes.len(),
        config.waves.waves.len(),
        config.perks.len()
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_encounter_is_valid() {
        let config = load(None).expect("built-in encounter loads");
        assert!(config.waves.looping);
        assert_eq!(config.archetypes.len(), 4);
        assert!(!config.perks.is_empty());
    }

    #[test]
    fn missing_file_reports_path() {
        let error = load(Some(Path::new("/nonexistent/encounter.toml")))
            .expect_err("missing file fails");
        assert!(format!("{error:#}").contains("/nonexistent/encounter.toml"));
    }
}
