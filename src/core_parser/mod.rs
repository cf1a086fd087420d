use thiserror::Error;

/// The closed set of verbs the control channel understands. `GET` and `RETR`
/// are spelled differently on the wire but name the same operation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FtpVerb {
    USER,
    PASS,
    LIST,
    RETR,
    QUIT,
    PWD,
    LCD,
    SYST,
    PASV,
    EPSV,
    TYPE,
    ERROR,
}

/// One parsed control-channel line. Produced fresh per input line, never
/// mutated afterwards.
#[derive(Debug, Eq, PartialEq)]
pub struct Command {
    pub verb: FtpVerb,
    pub arg: String,
}

/// Parses one raw line from the control stream into a [`Command`].
///
/// The verb token (everything before the first space) is matched
/// case-insensitively; the argument keeps its case exactly as received.
/// A line with more than one space is malformed and yields `ERROR`, as does
/// any token that is not a recognized verb.
pub fn parse(line: &str) -> Command {
    let line = line.trim_end_matches(|c| c == '\r' || c == '\n');

    // At most one separator space is allowed anywhere in the line.
    if line.chars().filter(|c| *c == ' ').count() > 1 {
        return Command {
            verb: FtpVerb::ERROR,
            arg: String::new(),
        };
    }

    let (token, arg) = match line.split_once(' ') {
        Some((token, arg)) => (token, arg),
        None => (line, ""),
    };

    let verb = match token.to_ascii_uppercase().as_str() {
        "USER" => FtpVerb::USER,
        "PASS" => FtpVerb::PASS,
        "LIST" => FtpVerb::LIST,
        "GET" | "RETR" => FtpVerb::RETR,
        "QUIT" => FtpVerb::QUIT,
        "PWD" => FtpVerb::PWD,
        "LCD" => FtpVerb::LCD,
        "SYST" => FtpVerb::SYST,
        "PASV" => FtpVerb::PASV,
        "EPSV" => FtpVerb::EPSV,
        "TYPE" => FtpVerb::TYPE,
        _ => FtpVerb::ERROR,
    };

    Command {
        verb,
        arg: arg.to_string(),
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum AddressParseError {
    #[error("expected 6 comma-separated fields, got {0}")]
    FieldCount(usize),
    #[error("invalid field in address: {0}")]
    InvalidField(String),
}

/// Parses a legacy comma-separated address argument (`h1,h2,h3,h4,p1,p2`)
/// as issued by a peer requesting an active-mode transfer. Returns the
/// dotted-quad host and the port computed as `p1 * 256 + p2`.
///
/// This is for addresses received from a peer; the server's own 227 replies
/// are formatted by [`crate::core_network::pasv::format_pasv_reply`].
pub fn parse_address(arg: &str) -> Result<(String, u16), AddressParseError> {
    let parts: Vec<&str> = arg.split(',').collect();
    if parts.len() != 6 {
        return Err(AddressParseError::FieldCount(parts.len()));
    }

    let fields = parts
        .iter()
        .map(|part| {
            part.parse::<u8>()
                .map_err(|_| AddressParseError::InvalidField(part.to_string()))
        })
        .collect::<Result<Vec<u8>, _>>()?;

    let host = format!("{}.{}.{}.{}", fields[0], fields[1], fields[2], fields[3]);
    let port = u16::from(fields[4]) * 256 + u16::from(fields[5]);
    Ok((host, port))
}
