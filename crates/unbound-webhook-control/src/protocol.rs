//! unbound-control wire format
//!
//! Every exchange is a single line `UBCT1 <command>\n` followed by the
//! server's reply, which runs until the server closes the connection.

use unbound_webhook_core::record::ResourceRecord;
use unbound_webhook_core::{Error, Result};

/// Protocol version prefix sent before every command
pub const VERSION: &str = "UBCT1";

/// Frame a command for the wire
pub fn frame(command: &str) -> String {
    format!("{} {}\n", VERSION, command)
}

/// Command listing every local data record
pub fn list_command() -> &'static str {
    "list_local_data"
}

/// Command adding a single record
pub fn add_command(rr: &ResourceRecord) -> String {
    format!(
        "local_data {} {} IN {} {}",
        rr.name, rr.ttl, rr.record_type, rr.value
    )
}

/// Command dropping every record of `name`
pub fn remove_command(name: &str) -> String {
    format!("local_data_remove {}", name)
}

/// Decode a raw reply; rdata is never rewritten, so invalid UTF-8 is an error
pub fn decode_reply(reply: Vec<u8>) -> Result<String> {
    String::from_utf8(reply).map_err(|e| {
        Error::resolver(format!(
            "unbound-control reply is not valid UTF-8 at byte {}",
            e.utf8_error().valid_up_to()
        ))
    })
}

/// Check a mutation reply; anything other than `ok` is a rejection
pub fn check_reply(reply: &str) -> Result<()> {
    let reply = reply.trim();
    if reply == "ok" {
        Ok(())
    } else if reply.is_empty() {
        Err(Error::resolver("empty reply from unbound-control"))
    } else {
        Err(Error::resolver(reply))
    }
}

/// Parse a `list_local_data` reply
///
/// Each line reads `name ttl class type rdata`, whitespace separated, with
/// the rdata running to the end of the line. Lines that do not fit are
/// skipped.
pub fn parse_local_data(reply: &str) -> Result<Vec<ResourceRecord>> {
    if reply.trim_start().starts_with("error") {
        return Err(Error::resolver(reply.trim()));
    }

    let mut records = Vec::new();
    for line in reply.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(rr) => records.push(rr),
            None => tracing::warn!("Skipping unparsable local data line: {}", line),
        }
    }
    Ok(records)
}

fn parse_line(line: &str) -> Option<ResourceRecord> {
    let mut rest = line;
    let name = next_field(&mut rest)?;
    let ttl = next_field(&mut rest)?.parse::<u32>().ok()?;
    let class = next_field(&mut rest)?;
    let record_type = next_field(&mut rest)?;
    let value = rest.trim();

    if !class.eq_ignore_ascii_case("IN") || value.is_empty() {
        return None;
    }

    Some(ResourceRecord::new(name, record_type, ttl, value))
}

fn next_field<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let trimmed = rest.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let end = trimmed
        .find(char::is_whitespace)
        .unwrap_or(trimmed.len());
    let (field, tail) = trimmed.split_at(end);
    *rest = tail;
    Some(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame() {
        assert_eq!(frame(list_command()), "UBCT1 list_local_data\n");
    }

    #[test]
    fn test_mutation_commands() {
        let rr = ResourceRecord::new("test.lan", "A", 300, "192.168.1.1");
        assert_eq!(add_command(&rr), "local_data test.lan 300 IN A 192.168.1.1");
        assert_eq!(remove_command("test.lan"), "local_data_remove test.lan");

        let txt = ResourceRecord::new("txt.lan", "TXT", 60, "\"heritage=external-dns\"");
        assert_eq!(
            add_command(&txt),
            "local_data txt.lan 60 IN TXT \"heritage=external-dns\""
        );
    }

    #[test]
    fn test_decode_reply() {
        assert_eq!(decode_reply(b"ok\n".to_vec()).unwrap(), "ok\n");

        let err = decode_reply(b"bin.lan. 60 IN TXT \"\xff\"\n".to_vec()).unwrap_err();
        assert!(matches!(err, Error::Resolver(ref msg) if msg.contains("byte 20")));
    }

    #[test]
    fn test_check_reply() {
        assert!(check_reply("ok\n").is_ok());

        let err = check_reply("error parsing local-data\n").unwrap_err();
        assert!(matches!(err, Error::Resolver(ref msg) if msg == "error parsing local-data"));

        assert!(check_reply("").is_err());
    }

    #[test]
    fn test_parse_local_data() {
        let reply = "test.lan.\t300\tIN\tA\t192.168.1.1\n\
                     a.example.com.\t3600\tIN\tCNAME\tabc.def.\n\
                     \n\
                     txt.lan.\t60\tIN\tTXT\t\"heritage=external-dns,external-dns/owner=default\"\n\
                     _sip._tcp.lan.\t300\tIN\tSRV\t10 5 5060 sip.lan.\n";

        assert_eq!(
            parse_local_data(reply).unwrap(),
            vec![
                ResourceRecord::new("test.lan.", "A", 300, "192.168.1.1"),
                ResourceRecord::new("a.example.com.", "CNAME", 3600, "abc.def."),
                ResourceRecord::new(
                    "txt.lan.",
                    "TXT",
                    60,
                    "\"heritage=external-dns,external-dns/owner=default\""
                ),
                ResourceRecord::new("_sip._tcp.lan.", "SRV", 300, "10 5 5060 sip.lan."),
            ]
        );
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let reply = "garbage\n\
                     test.lan. notanumber IN A 192.168.1.1\n\
                     test.lan. 300 CH A 192.168.1.1\n\
                     test.lan. 300 IN A\n\
                     ok.lan. 300 IN A 10.0.0.1\n";

        assert_eq!(
            parse_local_data(reply).unwrap(),
            vec![ResourceRecord::new("ok.lan.", "A", 300, "10.0.0.1")]
        );
    }

    #[test]
    fn test_parse_empty_and_error_replies() {
        assert!(parse_local_data("").unwrap().is_empty());
        assert!(parse_local_data("error unknown command\n").is_err());
    }
}
