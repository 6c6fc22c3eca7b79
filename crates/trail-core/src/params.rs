//! Request parameter parsing for the action-routed query endpoint.
//!
//! Parameters arrive as flat string maps (form body merged over the query
//! string). A blank value is treated the same as an absent one.

use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;

pub type Params = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("Invalid or missing action parameter")]
    InvalidAction,

    #[error("Missing required fields")]
    MissingFields,

    #[error("Missing id parameter")]
    MissingId,

    #[error("id must be a positive integer")]
    InvalidId,

    #[error("{field} must be a decimal number")]
    InvalidNumber { field: &'static str },

    #[error("{field} is out of range")]
    OutOfRange { field: &'static str },

    #[error("Invalid status value")]
    InvalidStatus,
}

/// Operation selected by the `action` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
        }
    }

    pub fn from_params(params: &Params) -> Result<Self, ParamError> {
        param(params, "action")
            .ok_or(ParamError::InvalidAction)?
            .parse()
    }
}

impl FromStr for Action {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "update" => Ok(Action::Update),
            _ => Err(ParamError::InvalidAction),
        }
    }
}

/// Returns the named parameter unless it is absent or blank.
pub fn param<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

pub fn parse_id(raw: &str) -> Result<i64, ParamError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ParamError::InvalidId),
    }
}

/// Parses the `id` parameter used by `read`.
pub fn id_from_params(params: &Params) -> Result<i64, ParamError> {
    parse_id(param(params, "id").ok_or(ParamError::MissingId)?)
}

pub(crate) fn parse_decimal(raw: &str, field: &'static str) -> Result<f64, ParamError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(ParamError::InvalidNumber { field })
}
