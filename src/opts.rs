use smart_default::SmartDefault;

use crate::constant::{CLIENT_REVISION, DEFAULT_MAX_STRING_SIZE};
use crate::error::Error;

/// Options for decoding a result stream
///
/// ```rs
/// let mut opts1 = Opts::default();
/// opts1.revision = 54420;
///
/// let opts2 = Opts::try_from("clickhouse://localhost:9000?revision=54213")?;
/// ```
#[derive(Debug, Clone, SmartDefault)]
pub struct Opts {
    /// Negotiated protocol revision. Decides which optional fields appear on the wire.
    #[default(CLIENT_REVISION)]
    pub revision: u64,

    /// Strings longer than this are rejected as malformed
    #[default(DEFAULT_MAX_STRING_SIZE)]
    pub max_string_size: usize,

    /// Compressed blocks are not supported. Setting this fails validation.
    pub compress: bool,
}

impl Opts {
    pub fn validate(&self) -> Result<(), Error> {
        if self.compress {
            return Err(Error::BadConfigError(
                "Compressed blocks are not supported".to_string(),
            ));
        }
        if self.max_string_size == 0 {
            return Err(Error::BadConfigError(
                "max_string_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl TryFrom<&str> for Opts {
    type Error = Error;

    /// Read decoder options from the query string of a DSN
    ///
    /// Host, credentials and other parameters belong to the connection layer and are ignored.
    fn try_from(dsn: &str) -> Result<Self, Self::Error> {
        let parsed = url::Url::parse(dsn)
            .map_err(|e| Error::BadConfigError(format!("Failed to parse DSN: {}", e)))?;

        let mut opts = Self::default();
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "revision" => {
                    opts.revision = value.parse().map_err(|e| {
                        Error::BadConfigError(format!("Invalid revision '{}': {}", value, e))
                    })?;
                }
                "max_string_size" => {
                    opts.max_string_size = value.parse().map_err(|e| {
                        Error::BadConfigError(format!("Invalid max_string_size '{}': {}", value, e))
                    })?;
                }
                "compress" => {
                    opts.compress = parse_bool(&value).ok_or_else(|| {
                        Error::BadConfigError(format!("Invalid compress '{}'", value))
                    })?;
                }
                _ => {}
            }
        }

        opts.validate()?;
        Ok(opts)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
