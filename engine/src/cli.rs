//! Utility module for the command line programs

use std::{error::Error, fmt, fmt::Display, str::FromStr};

/// An error struct to wrap simple static error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CliErr(pub &'static str);

impl Display for CliErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Error for CliErr {}

/// Next positional argument, or `CliErr(missing)`.
pub fn required_arg(args: &mut impl Iterator<Item = String>, missing: &'static str) -> Result<String, CliErr> {
    args.next().ok_or(CliErr(missing))
}

/// Parse the next positional argument if there is one.
pub fn optional_arg<T: FromStr>(args: &mut impl Iterator<Item = String>, invalid: &'static str) -> Result<Option<T>, CliErr> {
    args.next().map(|arg| arg.parse().map_err(|_| CliErr(invalid))).transpose()
}
