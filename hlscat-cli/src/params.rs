use tracing::{debug, error};

use crate::error::AppError;

/// Parse `key=value` strings into query parameter pairs.
///
/// Splits at the first `=`, so values may themselves contain `=`.
pub fn parse_params(params: &[String]) -> Result<Vec<(String, String)>, AppError> {
    params
        .iter()
        .map(|param| {
            param
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, value)| {
                    debug!("Added parameter: key='{key}', value='{value}'");
                    (key.to_string(), value.to_string())
                })
                .ok_or_else(|| {
                    error!("Invalid param format: {param}");
                    AppError::InvalidInput(format!("Invalid param format: {param}"))
                })
        })
        .collect()
}

/// Parse `Name: value` header strings.
pub fn parse_headers(headers: &[String]) -> Result<Vec<(String, String)>, AppError> {
    headers
        .iter()
        .map(|header| {
            header
                .split_once(':')
                .map(|(name, value)| (name.trim(), value.trim()))
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .ok_or_else(|| {
                    AppError::InvalidInput(format!("Invalid header format: {header}"))
                })
        })
        .collect()
}
