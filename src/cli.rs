//! Command-line interface parsing for the RSCN content CLI
//!
//! This module handles parsing of CLI arguments using clap, including the
//! `key=value` query parameters accepted by the raw `get` command.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::data::{ParamValue, Params};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// A query parameter was not of the form `key=value`
    #[error("Invalid parameter: '{0}'. Expected key=value, e.g. per_page=10")]
    InvalidParam(String),
}

/// RSCN content CLI - read site content through the caching gateway
#[derive(Parser, Debug)]
#[command(name = "rscn")]
#[command(about = "Read RSCN site content from the CMS through the content cache")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file (defaults to the platform config dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Override the CMS API root, e.g. https://host/wp-json/wp/v2
    #[arg(long, value_name = "URL", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// What to fetch
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Raw read of any endpoint
    ///
    /// Examples:
    ///   rscn get /pages -p slug=about -p _embed=true
    ///   rscn get /media/42
    Get {
        /// Endpoint path relative to the API root
        endpoint: String,
        /// Query parameter as key=value (repeatable)
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// All pages
    Pages,
    /// A single page by slug
    Page { slug: String },
    /// The About page
    About,
    /// News posts
    News {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Restrict to a category ID
        #[arg(long)]
        category: Option<u64>,
    },
    /// A single news post by slug
    Post { slug: String },
    /// Projects
    Projects {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// A single project by slug
    Project { slug: String },
    /// Events
    Events {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// A single event by slug
    Event { slug: String },
    /// Reference sites for the map
    ReferenceSites,
    /// Resolve media IDs to image URLs
    Media {
        #[arg(required = true)]
        ids: Vec<u64>,
        /// Rewrite CMS upload URLs to site-relative proxy paths
        #[arg(long)]
        proxy: bool,
    },
}

/// Parses a `key=value` argument into a typed query parameter.
///
/// `true`/`false` become booleans, integers and other numbers become numbers,
/// and anything else is kept as a string.
///
/// # Returns
/// * `Ok((key, value))` for a well-formed pair
/// * `Err(CliError::InvalidParam)` if there is no `=` or the key is empty
pub fn parse_param_arg(s: &str) -> Result<(String, ParamValue), CliError> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| CliError::InvalidParam(s.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::InvalidParam(s.to_string()));
    }

    let value = match raw {
        "true" => ParamValue::Bool(true),
        "false" => ParamValue::Bool(false),
        _ => {
            if let Ok(int) = raw.parse::<i64>() {
                ParamValue::Int(int)
            } else if let Some(float) = raw.parse::<f64>().ok().filter(|f| f.is_finite()) {
                ParamValue::Float(float)
            } else {
                ParamValue::Str(raw.to_string())
            }
        }
    };

    Ok((key.to_string(), value))
}

/// Parses every `key=value` argument into one parameter set
pub fn parse_params(args: &[String]) -> Result<Params, CliError> {
    let mut params = Params::new();
    for arg in args {
        let (key, value) = parse_param_arg(arg)?;
        params.insert(key, value);
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param_arg_types() {
        assert_eq!(
            parse_param_arg("slug=about").unwrap(),
            ("slug".to_string(), ParamValue::Str("about".to_string()))
        );
        assert_eq!(
            parse_param_arg("per_page=10").unwrap(),
            ("per_page".to_string(), ParamValue::Int(10))
        );
        assert_eq!(
            parse_param_arg("_embed=true").unwrap(),
            ("_embed".to_string(), ParamValue::Bool(true))
        );
        assert_eq!(
            parse_param_arg("ratio=1.5").unwrap(),
            ("ratio".to_string(), ParamValue::Float(1.5))
        );
    }

    #[test]
    fn test_parse_param_arg_keeps_later_equals_in_value() {
        let (key, value) = parse_param_arg("_embed=wp:featuredmedia,author").unwrap();
        assert_eq!(key, "_embed");
        assert_eq!(value, ParamValue::Str("wp:featuredmedia,author".to_string()));

        let (_, value) = parse_param_arg("q=a=b").unwrap();
        assert_eq!(value, ParamValue::Str("a=b".to_string()));
    }

    #[test]
    fn test_parse_param_arg_empty_value_is_string() {
        assert_eq!(
            parse_param_arg("search=").unwrap().1,
            ParamValue::Str(String::new())
        );
    }

    #[test]
    fn test_parse_param_arg_invalid() {
        let err = parse_param_arg("per_page").unwrap_err();
        assert!(err.to_string().contains("Invalid parameter"));
        assert!(err.to_string().contains("per_page"));

        assert!(parse_param_arg("=10").is_err());
    }

    #[test]
    fn test_parse_params_later_wins() {
        let params = parse_params(&["page=1".to_string(), "page=2".to_string()]).unwrap();
        assert_eq!(params.get("page"), Some(&ParamValue::Int(2)));
    }

    #[test]
    fn test_cli_parse_get_with_params() {
        let cli = Cli::parse_from([
            "rscn", "get", "/pages", "-p", "slug=about", "--param", "_embed=true",
        ]);
        assert_eq!(
            cli.command,
            Command::Get {
                endpoint: "/pages".to_string(),
                params: vec!["slug=about".to_string(), "_embed=true".to_string()],
            }
        );
    }

    #[test]
    fn test_cli_parse_news_defaults_to_first_page() {
        let cli = Cli::parse_from(["rscn", "news"]);
        assert_eq!(cli.command, Command::News { page: 1, category: None });
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "rscn",
            "projects",
            "--page",
            "3",
            "--api-url",
            "https://cms.example/wp-json/wp/v2",
        ]);
        assert_eq!(cli.command, Command::Projects { page: 3 });
        assert_eq!(cli.api_url.as_deref(), Some("https://cms.example/wp-json/wp/v2"));
    }

    #[test]
    fn test_cli_parse_media_ids() {
        let cli = Cli::parse_from(["rscn", "media", "4", "8", "15"]);
        assert_eq!(
            cli.command,
            Command::Media {
                ids: vec![4, 8, 15],
                proxy: false
            }
        );
    }

    #[test]
    fn test_cli_parse_media_proxy_flag() {
        let cli = Cli::parse_from(["rscn", "media", "--proxy", "4"]);
        assert_eq!(
            cli.command,
            Command::Media {
                ids: vec![4],
                proxy: true
            }
        );
    }

    #[test]
    fn test_cli_media_requires_ids() {
        assert!(Cli::try_parse_from(["rscn", "media"]).is_err());
    }
}
