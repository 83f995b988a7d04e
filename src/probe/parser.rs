use crate::Id;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag_no_case},
    character::complete::{digit1, space1},
    combinator::{all_consuming, map, map_res},
    sequence::separated_pair,
    Finish, IResult,
};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    On,
    Off,
}

fn counter_line(input: &str) -> IResult<&str, u64> {
    map_res(digit1, |x: &str| x.parse::<u64>())(input)
}

/// First line of a counter probe's stdout, e.g. the contents of
/// /sys/class/net/ppp0/statistics/rx_bytes. Anything non-numeric is None.
pub fn parse_counter_output(input: &str) -> Option<u64> {
    let line = input.lines().next()?.trim();
    all_consuming(counter_line)(line).finish().ok().map(|x| x.1)
}

fn switch_state(input: &str) -> IResult<&str, SwitchState> {
    alt((
        map(tag_no_case("off"), |_| SwitchState::Off),
        map(tag_no_case("on"), |_| SwitchState::On),
    ))(input)
}

fn switch_line(input: &str) -> IResult<&str, (Id, SwitchState)> {
    let p = separated_pair(is_not(" \t"), space1, switch_state);
    map(p, |(id, state): (&str, _)| (id.to_string(), state))(input)
}

/// One `<id> on|off` line per switch; returns the ids reported off.
/// Lines that cannot be parsed are ignored.
pub fn parse_switch_report(input: &str) -> BTreeSet<Id> {
    let mut off = BTreeSet::new();
    for line in input.lines() {
        if let Ok((_, (id, SwitchState::Off))) =
            all_consuming(switch_line)(line.trim()).finish()
        {
            off.insert(id);
        }
    }
    off
}

#[cfg(test)]
mod checks {
    use super::*;

    #[test]
    fn check_counter_output() {
        assert_eq!(parse_counter_output("48151623\n"), Some(48151623));
        assert_eq!(parse_counter_output("0"), Some(0));
    }

    #[test]
    fn check_counter_output_rejects_junk() {
        assert_eq!(parse_counter_output(""), None);
        assert_eq!(parse_counter_output("cat: no such file\n"), None);
        assert_eq!(parse_counter_output("123abc\n"), None);
        assert_eq!(parse_counter_output("-5\n"), None);
    }

    #[test]
    fn check_counter_output_first_line_only() {
        assert_eq!(parse_counter_output("42\ngarbage\n"), Some(42));
    }

    #[test]
    fn check_switch_line() {
        let (_, parsed) = switch_line("sw1 off").unwrap();
        assert_eq!(parsed, ("sw1".to_string(), SwitchState::Off));
        let (_, parsed) = switch_line("plug-7\tON").unwrap();
        assert_eq!(parsed, ("plug-7".to_string(), SwitchState::On));
    }

    #[test]
    fn check_switch_report_collects_off() {
        let report = "sw1 off\nsw2 on\nsw3 OFF\n";
        let off = parse_switch_report(report);
        assert_eq!(
            off.into_iter().collect::<Vec<_>>(),
            vec!["sw1".to_string(), "sw3".to_string()]
        );
    }

    #[test]
    fn check_switch_report_ignores_junk_lines() {
        let report = "# header\nsw1 off\nsw2 offline\n\nsw3\n";
        let off = parse_switch_report(report);
        assert_eq!(off.into_iter().collect::<Vec<_>>(), vec!["sw1".to_string()]);
    }
}
