use thiserror::Error;

use crate::blocks::Pattern;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("invalid selector `{0}`")]
    Selector(String),
}

/// Matrix shapes the table builder refuses to render.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("table matrix has no rows")]
    Empty,
    #[error("header row must have exactly one cell, found {0}")]
    HeaderWidth(usize),
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{pattern} fragment has no `{selector}` element")]
    MissingRequired {
        pattern: Pattern,
        selector: &'static str,
    },
    #[error("{0} fragment is not attached to a document")]
    Detached(Pattern),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Table(#[from] TableError),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("invalid base url `{url}`: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
