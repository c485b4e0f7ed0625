//! Configuration validation.
//!
//! Every check pushes onto a shared error list so a single
//! `ConfigError` reports all problems at once.

mod helpers;


use pplx_common::ConfigError;

use crate::schema::PplxConfig;
use helpers::validate_range;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &PplxConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_service(&mut errors, config);
    validate_chat(&mut errors, config);
    validate_jitter(&mut errors, config);
    validate_range(
        &mut errors,
        "events.capacity",
        config.events.capacity,
        16,
        65536,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_service(errors: &mut Vec<String>, config: &PplxConfig) {
    let base = &config.service.base_url;
    if !base.starts_with("http://") && !base.starts_with("https://") {
        errors.push(format!("service.base_url = {base:?} must start with http:// or https://"));
    }
    validate_range(
        errors,
        "service.connect_timeout_secs",
        config.service.connect_timeout_secs,
        1,
        60,
    );
    validate_range(
        errors,
        "service.request_timeout_secs",
        config.service.request_timeout_secs,
        10,
        600,
    );
}

fn validate_chat(errors: &mut Vec<String>, config: &PplxConfig) {
    if config.chat.model.trim().is_empty() {
        errors.push("chat.model must not be empty".into());
    }
    if config.chat.answer_usage.trim().is_empty() {
        errors.push("chat.answer_usage must not be empty".into());
    }
}

fn validate_jitter(errors: &mut Vec<String>, config: &PplxConfig) {
    validate_range(errors, "jitter.max_ms", config.jitter.max_ms, 0, 30_000);
    if config.jitter.min_ms > config.jitter.max_ms {
        errors.push(format!(
            "jitter.min_ms = {} exceeds jitter.max_ms = {}",
            config.jitter.min_ms, config.jitter.max_ms
        ));
    }
}
