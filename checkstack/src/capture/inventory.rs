//! Stack member discovery from `show switch`.

use std::sync::LazyLock;

use log::{debug, info};
use regex::Regex;

use crate::channel::ShellIo;
use crate::error::Result;
use crate::session::JumpHostSession;

/// A member row: one marker column (`*` for the active unit), the unit
/// number, then a role ending in active, standby or member.
static MEMBER_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.([0-9]) .*(ctive|tandby|ember).*$").unwrap());

/// Member numbers in the order their rows appear.
pub fn parse_members(show_switch: &str) -> Vec<String> {
    show_switch
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter_map(|line| MEMBER_ROW.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Ask the switch for its stack members.
pub async fn stack_members<S: ShellIo>(session: &mut JumpHostSession<S>) -> Result<Vec<String>> {
    info!("gathering switch stack members");

    session.discover_prompt().await?;
    let output = session.run_command("show switch").await?;

    let members = parse_members(&output.before);
    debug!("stack members: {:?}", members);
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_SWITCH: &str = "show switch\r\n\
        Switch/Stack Mac Address : 0011.2233.4455 - Local Mac Address\r\n\
        Mac persistency wait time: Indefinite\r\n\
        \x20                                            H/W   Current\r\n\
        Switch#   Role    Mac Address     Priority Version  State\r\n\
        ------------------------------------------------------------\r\n\
        *1       Active   0011.2233.4455     15     V01     Ready\r\n\
        \x202       Standby  0011.2233.5566     14     V01     Ready\r\n\
        \x203       Member   0011.2233.6677     1      V01     Ready\r\n";

    #[test]
    fn test_members_in_output_order() {
        assert_eq!(parse_members(SHOW_SWITCH), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_row_without_role_is_ignored() {
        let text = " 4       Provisioned  0000.0000.0000  0  V01  Provisioned\n\
                    \x205       Master   0011.2233.7788     1      V01     Ready\n\
                    \x202       Member   0011.2233.5566     1      V01     Ready\n";
        assert_eq!(parse_members(text), vec!["2"]);
    }

    #[test]
    fn test_roles_are_case_sensitive_suffixes() {
        // Only the suffix is compared, so either capitalisation of the
        // first letter works, but an all-caps role does not
        let text = " 1       active   x\n 2       STANDBY  x\n";
        assert_eq!(parse_members(text), vec!["1"]);
    }

    #[test]
    fn test_unit_number_must_be_second_column() {
        assert!(parse_members(" 12      Member   x\n").is_empty());
        assert!(parse_members("Switch#   Role    Mac Address\n").is_empty());
    }
}
