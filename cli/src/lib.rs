use std::ffi::OsStr;
use std::process::exit;

use nuggets::state::{ClientOpts, ServerOpts};

/// Parses the server command line: `server <map.txt> [<seed>]`.
pub fn parse_server(
    args: impl IntoIterator<Item = impl Into<std::ffi::OsString>>,
) -> Result<ServerOpts, Error> {
    let mut positionals = positionals(args, SERVER_HELP_MSG)?;

    if positionals.len() > 2 {
        return Err(Error::UnexpectedArg {
            value: positionals.swap_remove(2),
        });
    }
    let mut positionals = positionals.into_iter();
    let map = positionals
        .next()
        .ok_or(Error::MissingArg { arg: "map" })?
        .into();
    let seed = match positionals.next() {
        Some(text) => {
            let seed: u64 = text.parse()?;
            if seed == 0 {
                return Err(Error::NonPositiveSeed);
            }
            Some(seed)
        }
        None => None,
    };

    Ok(ServerOpts { map, seed })
}

/// Parses the client command line: `client <host> <port> [<name>]`.
/// Two arguments join as the spectator, three as a named player.
pub fn parse_client(
    args: impl IntoIterator<Item = impl Into<std::ffi::OsString>>,
) -> Result<ClientOpts, Error> {
    let mut positionals = positionals(args, CLIENT_HELP_MSG)?;

    if positionals.len() > 3 {
        return Err(Error::UnexpectedArg {
            value: positionals.swap_remove(3),
        });
    }
    let mut positionals = positionals.into_iter();
    let host = positionals.next().ok_or(Error::MissingArg { arg: "host" })?;
    let port = positionals
        .next()
        .ok_or(Error::MissingArg { arg: "port" })?
        .parse()?;
    let name = positionals.next();

    Ok(ClientOpts { host, port, name })
}

/// Walks the raw arguments, answering `-h`/`-v` on the spot and
/// collecting everything else as positional values.
fn positionals(
    args: impl IntoIterator<Item = impl Into<std::ffi::OsString>>,
    help: &str,
) -> Result<Vec<String>, Error> {
    let args = clap_lex::RawArgs::new(args);
    let mut cursor = args.cursor();
    args.next(&mut cursor); // skip bin

    let mut values = Vec::new();
    while let Some(arg) = args.next(&mut cursor) {
        if let Some((long, _)) = arg.to_long() {
            return Err(Error::UnknownLong {
                flag: long.unwrap_or_default().to_owned(),
            });
        }
        if let Some(mut s) = arg.to_short() {
            while let Some(Ok(flag)) = s.next() {
                match flag {
                    'v' => {
                        println!("nuggets");
                        exit(0)
                    }
                    'h' => {
                        println!("{help}");
                        exit(0)
                    }
                    f => return Err(Error::UnknownFlag { flag: f }),
                }
            }
            continue;
        }
        values.push(
            arg.to_value_os()
                .to_str()
                .ok_or_else(|| Error::from(arg.to_value_os()))?
                .to_owned(),
        );
    }

    Ok(values)
}

#[derive(Debug)]
pub enum Error {
    MissingArg {
        arg: &'static str,
    },
    InvalidIntValueFmt(std::num::ParseIntError),
    NonUnicodeValue {
        content: Box<OsStr>,
    },
    UnknownFlag {
        flag: char,
    },
    UnknownLong {
        flag: String,
    },
    UnexpectedArg {
        value: String,
    },
    /// The map seed must be a positive integer.
    NonPositiveSeed,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingArg { arg } => write!(f, "missing argument '{arg}'"),
            Error::InvalidIntValueFmt(err) => write!(f, "invalid integer formatting: {err}"),
            Error::NonUnicodeValue { content } => write!(f, "non-unicode value: {content:?}"),
            Error::UnknownFlag { flag } => write!(f, "unknown flag: {flag}"),
            Error::UnknownLong { flag } => write!(f, "unknown flag: {flag}"),
            Error::UnexpectedArg { value } => write!(f, "unexpected argument: {value}"),
            Error::NonPositiveSeed => write!(f, "seed should be a positive integer"),
        }
    }
}

impl<'a> From<&'a OsStr> for Error {
    #[inline]
    fn from(value: &'a OsStr) -> Self {
        Error::NonUnicodeValue {
            content: value.into(),
        }
    }
}

impl From<std::num::ParseIntError> for Error {
    #[inline]
    fn from(value: std::num::ParseIntError) -> Self {
        Error::InvalidIntValueFmt(value)
    }
}

impl std::error::Error for Error {}

/// The help message for the server binary.
pub const SERVER_HELP_MSG: &str = r#"nuggets server

Usage: server <map.txt> [<seed>]

  map.txt
    Path to a rectangular map file.

  seed
    Positive integer seeding the random generator; the process id is
    used when omitted.

On startup the server prints the port it waits on. The game ends when
the last gold pile is collected.

-v
  Display the version number

-h
  Display this help
"#;

/// The help message for the client binary.
pub const CLIENT_HELP_MSG: &str = r#"nuggets client

Usage: client <host> <port> [<playerName>]

With two arguments the client joins as the spectator; with three it
joins as a player under the given name.

-v
  Display the version number

-h
  Display this help
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_args_parse() {
        let opts = parse_server(["server", "maps/main.txt"]).unwrap();
        assert_eq!(opts.map.to_str(), Some("maps/main.txt"));
        assert_eq!(opts.seed, None);

        let opts = parse_server(["server", "maps/main.txt", "42"]).unwrap();
        assert_eq!(opts.seed, Some(42));
    }

    #[test]
    fn server_args_refuse_bad_seeds() {
        assert!(matches!(
            parse_server(["server", "m.txt", "0"]),
            Err(Error::NonPositiveSeed)
        ));
        assert!(matches!(
            parse_server(["server", "m.txt", "soon"]),
            Err(Error::InvalidIntValueFmt(_))
        ));
    }

    #[test]
    fn server_args_arity() {
        assert!(matches!(
            parse_server(["server"]),
            Err(Error::MissingArg { arg: "map" })
        ));
        assert!(matches!(
            parse_server(["server", "m.txt", "1", "extra"]),
            Err(Error::UnexpectedArg { .. })
        ));
    }

    #[test]
    fn client_args_parse() {
        let opts = parse_client(["client", "localhost", "19140"]).unwrap();
        assert_eq!(opts.host, "localhost");
        assert_eq!(opts.port, 19140);
        assert_eq!(opts.name, None);

        let opts = parse_client(["client", "plank", "4242", "Alice"]).unwrap();
        assert_eq!(opts.name.as_deref(), Some("Alice"));
    }

    #[test]
    fn client_args_refusals() {
        assert!(matches!(
            parse_client(["client", "host"]),
            Err(Error::MissingArg { arg: "port" })
        ));
        assert!(matches!(
            parse_client(["client", "host", "notaport"]),
            Err(Error::InvalidIntValueFmt(_))
        ));
        assert!(matches!(
            parse_client(["client", "-x", "1"]),
            Err(Error::UnknownFlag { flag: 'x' })
        ));
        assert!(matches!(
            parse_client(["client", "--wat", "1"]),
            Err(Error::UnknownLong { .. })
        ));
    }
}
