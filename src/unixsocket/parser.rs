use crate::MonitorCommand;
use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{not_line_ending, space1},
    combinator::map,
    sequence::separated_pair,
    Finish, IResult,
};
use std::str::FromStr;

fn ack_cmd(input: &str) -> IResult<&str, MonitorCommand> {
    let p = separated_pair(tag_no_case("ack"), space1, not_line_ending);
    map(p, |(_, id): (_, &str)| {
        MonitorCommand::Ack(id.trim().to_string())
    })(input)
}

fn restore_cmd(input: &str) -> IResult<&str, MonitorCommand> {
    let p = separated_pair(tag_no_case("restore"), space1, not_line_ending);
    map(p, |(_, id): (_, &str)| {
        MonitorCommand::Restore(id.trim().to_string())
    })(input)
}

fn pause_cmd(input: &str) -> IResult<&str, MonitorCommand> {
    let p = tag_no_case("pause");
    map(p, |_| MonitorCommand::Pause)(input)
}

fn resume_cmd(input: &str) -> IResult<&str, MonitorCommand> {
    let p = tag_no_case("resume");
    map(p, |_| MonitorCommand::Resume)(input)
}

impl FromStr for MonitorCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cmds = alt((ack_cmd, restore_cmd, pause_cmd, resume_cmd));
        if let Ok((_, cmd)) = cmds(s).finish() {
            Ok(cmd)
        } else {
            Err(())
        }
    }
}

#[cfg(test)]
mod checks {
    use super::*;

    #[test]
    fn check_ack() {
        let input = "ack sw1\n";
        let cmd = MonitorCommand::Ack("sw1".into());
        assert_eq!(input.parse(), Ok(cmd));
    }

    #[test]
    fn check_restore() {
        let input = "Restore plug-7\n";
        let cmd = MonitorCommand::Restore("plug-7".into());
        assert_eq!(input.parse(), Ok(cmd));
    }

    #[test]
    fn check_pause() {
        let input = "Pause\n";
        let cmd = MonitorCommand::Pause;
        assert_eq!(input.parse(), Ok(cmd));
    }

    #[test]
    fn check_resume() {
        let input = "RESUME\n";
        let cmd = MonitorCommand::Resume;
        assert_eq!(input.parse(), Ok(cmd));
    }

    #[test]
    fn check_garbage_rejected() {
        assert_eq!("reboot now\n".parse::<MonitorCommand>(), Err(()));
        assert_eq!("".parse::<MonitorCommand>(), Err(()));
    }
}
