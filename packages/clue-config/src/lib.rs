mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Deployment, LogGroups, MAX_LOG_EVENTS_LIMIT, MAX_LOG_GROUPS_LIMIT, MAX_LOOKBACK_HOURS,
	ProviderConfig, Providers, Retry, Search, Service,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.deployment.name.trim().is_empty() {
		return Err(Error::Validation {
			message: "deployment.name must be non-empty.".to_string(),
		});
	}
	if cfg.search.error_pattern.trim().is_empty() {
		return Err(Error::Validation {
			message: "search.error_pattern must be non-empty.".to_string(),
		});
	}

	for (label, value, max) in [
		("search.max_log_events", cfg.search.max_log_events, MAX_LOG_EVENTS_LIMIT),
		("search.max_log_groups", cfg.search.max_log_groups, MAX_LOG_GROUPS_LIMIT),
		("search.lookback_hours", cfg.search.lookback_hours, MAX_LOOKBACK_HOURS),
	] {
		if value == 0 || value > max {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 1-{max}."),
			});
		}
	}

	if cfg.search.max_concurrent_queries == 0 {
		return Err(Error::Validation {
			message: "search.max_concurrent_queries must be greater than zero.".to_string(),
		});
	}
	if cfg.search.deadline_ms == 0 {
		return Err(Error::Validation {
			message: "search.deadline_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.search.case_identifier_containers == 0 || cfg.search.broad_fallback_containers == 0 {
		return Err(Error::Validation {
			message: "search.case_identifier_containers and search.broad_fallback_containers must be greater than zero."
				.to_string(),
		});
	}
	if cfg.search.failure_statuses.is_empty() {
		return Err(Error::Validation {
			message: "search.failure_statuses must be non-empty.".to_string(),
		});
	}
	if cfg.log_groups.min_prefix_len == 0 {
		return Err(Error::Validation {
			message: "log_groups.min_prefix_len must be greater than zero.".to_string(),
		});
	}
	if !cfg.log_groups.pattern_prefix.contains("{name}") {
		return Err(Error::Validation {
			message: "log_groups.pattern_prefix must contain {name}.".to_string(),
		});
	}
	if !cfg.log_groups.generic_prefix.contains("{deployment}") {
		return Err(Error::Validation {
			message: "log_groups.generic_prefix must contain {deployment}.".to_string(),
		});
	}
	if cfg.retry.max_attempts == 0 {
		return Err(Error::Validation {
			message: "retry.max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.retry.base_backoff_ms > cfg.retry.max_backoff_ms {
		return Err(Error::Validation {
			message: "retry.base_backoff_ms must not exceed retry.max_backoff_ms.".to_string(),
		});
	}

	for (label, provider) in [
		("tracking", &cfg.providers.tracking),
		("traces", &cfg.providers.traces),
		("logs", &cfg.providers.logs),
		("deployments", &cfg.providers.deployments),
	] {
		if provider.api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_base must be non-empty."),
			});
		}
		if provider.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
		if provider.timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.deployment.name = cfg.deployment.name.trim().to_string();
	cfg.search.failure_statuses.retain(|status| !status.trim().is_empty());

	for provider in [
		&mut cfg.providers.tracking,
		&mut cfg.providers.traces,
		&mut cfg.providers.logs,
		&mut cfg.providers.deployments,
	] {
		while provider.api_base.ends_with('/') {
			provider.api_base.pop();
		}
	}
}
