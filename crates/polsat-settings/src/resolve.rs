use crate::model::{PolsatConfigV1, SCHEMA_CONFIG_V1};
use crate::presets::{self, PROFILES};
use anyhow::Context;
use polsat_domain::policy::{AuthorizeOptions, SolverLimits};
use polsat_domain::solver::MAX_SUPPORTED_VARIABLES;

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub strict_access: Option<bool>,
    pub fetch_only: Option<bool>,
    pub log_final_report: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedConfig {
    pub profile: String,
    pub options: AuthorizeOptions,
    pub limits: SolverLimits,
}

pub fn resolve_config(cfg: PolsatConfigV1, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    if let Some(schema) = cfg.schema.as_deref()
        && schema != SCHEMA_CONFIG_V1
    {
        anyhow::bail!("unsupported config schema: {schema} (expected {SCHEMA_CONFIG_V1})");
    }

    let profile = overrides
        .profile
        .clone()
        .or(cfg.profile.clone())
        .unwrap_or_else(|| PROFILES[0].to_string());

    let mut options = presets::preset(&profile).with_context(|| {
        format!("unknown profile: {profile} (expected {})", PROFILES.join("|"))
    })?;
    let mut limits = SolverLimits::default();

    // config file
    if let Some(v) = cfg.strict_access {
        options.strict_access = v;
    }
    if let Some(v) = cfg.fetch_only {
        options.fetch_only = v;
    }
    if let Some(v) = cfg.log_final_report {
        options.log_final_report = v;
    }
    if let Some(v) = cfg.max_iterations {
        options.max_iterations = positive("max_iterations", v)?;
    }
    if let Some(v) = cfg.max_variables {
        limits.max_variables = positive("max_variables", v)?;
        if limits.max_variables > MAX_SUPPORTED_VARIABLES {
            anyhow::bail!("max_variables must be at most {MAX_SUPPORTED_VARIABLES}, got {v}");
        }
    }

    // CLI overrides
    if let Some(v) = overrides.strict_access {
        options.strict_access = v;
    }
    if let Some(v) = overrides.fetch_only {
        options.fetch_only = v;
    }
    if let Some(v) = overrides.log_final_report {
        options.log_final_report = v;
    }

    Ok(ResolvedConfig {
        profile,
        options,
        limits,
    })
}

fn positive(field: &str, value: u32) -> anyhow::Result<usize> {
    if value == 0 {
        anyhow::bail!("{field} must be at least 1");
    }
    Ok(value as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_config_toml;

    #[test]
    fn empty_config_resolves_to_strict() {
        let resolved = resolve_config(PolsatConfigV1::default(), Overrides::default()).unwrap();
        assert_eq!(resolved.profile, "strict");
        assert_eq!(resolved.options, AuthorizeOptions::default());
        assert_eq!(resolved.limits, SolverLimits::default());
    }

    #[test]
    fn config_file_overrides_preset_and_cli_overrides_config() {
        let cfg = parse_config_toml(
            r#"
profile = "lenient"
log_final_report = true
max_iterations = 8
max_variables = 12
"#,
        )
        .unwrap();
        let resolved = resolve_config(
            cfg,
            Overrides {
                strict_access: Some(true),
                ..Overrides::default()
            },
        )
        .unwrap();

        assert_eq!(resolved.profile, "lenient");
        assert!(resolved.options.strict_access);
        assert!(resolved.options.log_final_report);
        assert_eq!(resolved.options.max_iterations, 8);
        assert_eq!(resolved.limits.max_variables, 12);
    }

    #[test]
    fn cli_profile_wins_over_config_profile() {
        let cfg = parse_config_toml(r#"profile = "lenient""#).unwrap();
        let resolved = resolve_config(
            cfg,
            Overrides {
                profile: Some("fetch-only".into()),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert!(resolved.options.fetch_only);
        assert!(resolved.options.strict_access);
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let cfg = parse_config_toml(r#"profile = "yolo""#).unwrap();
        let err = resolve_config(cfg, Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("unknown profile: yolo"));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let cfg = parse_config_toml("max_iterations = 0").unwrap();
        assert!(resolve_config(cfg, Overrides::default()).is_err());
    }

    #[test]
    fn max_variables_is_capped_at_the_solver_mask_width() {
        let cfg = parse_config_toml("max_variables = 63").unwrap();
        let resolved = resolve_config(cfg, Overrides::default()).unwrap();
        assert_eq!(resolved.limits.max_variables, 63);

        let cfg = parse_config_toml("max_variables = 64").unwrap();
        let err = resolve_config(cfg, Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("at most 63"), "{err}");
    }

    #[test]
    fn foreign_schema_and_unknown_keys_are_rejected() {
        let cfg = parse_config_toml(r#"schema = "polsat.config.v0""#).unwrap();
        assert!(resolve_config(cfg, Overrides::default()).is_err());
        assert!(parse_config_toml("fail_on = \"error\"").is_err());
    }
}
