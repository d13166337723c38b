use std::path::Path;
use std::{env, fs};

use composer_bridge_core::BridgeConfig;
use miette::{IntoDiagnostic, Result, WrapErr};

/// Load a TOML configuration, substituting `$VAR` environment variables
/// first.
pub fn load(path: &Path) -> Result<BridgeConfig> {
    let raw = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("error reading config file {}", path.display()))?;
    let substituted = substitute_env(&raw, env::vars());
    let config = BridgeConfig::from_toml_str(&substituted)
        .wrap_err_with(|| format!("error loading config file {}", path.display()))?;
    tracing::debug!(target: "composer::cli", path = %path.display(), "loaded config");
    Ok(config)
}

/// Replace every `$NAME` with the value of `NAME`. Longer names go first so
/// `$HOME_DIR` is not clobbered by `$HOME`.
pub fn substitute_env(input: &str, vars: impl IntoIterator<Item = (String, String)>) -> String {
    let mut vars: Vec<_> = vars.into_iter().collect();
    vars.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));
    let mut out = input.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("${key}"), &value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitute_env() {
        let out = substitute_env(
            "ordered = \"$MARK\"\nbullet = \"$MARK_BULLET\"",
            vars(&[("MARK", "{n}) "), ("MARK_BULLET", "- ")]),
        );
        assert_eq!(out, "ordered = \"{n}) \"\nbullet = \"- \"");
    }

    #[test]
    fn test_unknown_variables_are_left_alone() {
        assert_eq!(substitute_env("x = \"$NOPE\"", vars(&[])), "x = \"$NOPE\"");
    }
}
